mod admission;
mod common;
mod progression;
