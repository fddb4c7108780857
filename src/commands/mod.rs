mod cut;
#[cfg(feature = "fetch-model")]
mod fetch_model;
mod process;
mod trace;
mod utils;

use crate::cli::{Cli, Commands, GlobalOptions};
use logotrace::PipelineResult;

/// The main function to run the command based on CLI input.
pub fn run(cli: Cli) -> PipelineResult<()> {
    let Cli { global, command } = cli;
    dispatch(&global, command)
}

fn dispatch(global: &GlobalOptions, command: Commands) -> PipelineResult<()> {
    match command {
        Commands::Process(cmd) => process::run(global, cmd),
        Commands::Cut(cmd) => cut::run(global, cmd),
        Commands::Trace(cmd) => trace::run(cmd),
        #[cfg(feature = "fetch-model")]
        Commands::FetchModel(cmd) => fetch_model::run(cmd),
    }
}
