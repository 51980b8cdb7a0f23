pub mod headcount_plan;
pub mod recruitment;
