use crate::demo::{run_demo, run_headcount_import, DemoArgs, HeadcountImportArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use hr_recruit::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "HR Recruitment Engine",
    about = "Run the headcount admission and interview progression service from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Work with headcount plans
    Headcount {
        #[command(subcommand)]
        command: HeadcountCommand,
    },
    /// Walk through admission and interview progression end to end
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum HeadcountCommand {
    /// Validate a headcount plan CSV by loading it into a fresh ledger and printing the result
    Import(HeadcountImportArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Headcount plan CSV to approve at startup as the first configured approver
    #[arg(long)]
    pub(crate) headcount_plan: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Headcount {
            command: HeadcountCommand::Import(args),
        } => run_headcount_import(args),
        Command::Demo(args) => run_demo(args),
    }
}
