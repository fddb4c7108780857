//! Handler for the `fetch-model` command.

use logotrace::PipelineResult;
use logotrace::model_fetch::{FetchOptions, default_model_cache_path, fetch_model};

use crate::cli::FetchModelCommand;

pub fn run(cmd: FetchModelCommand) -> PipelineResult<()> {
    let output = cmd.output.unwrap_or_else(default_model_cache_path);
    let options = FetchOptions::default()
        .with_output(output)
        .with_force(cmd.force);

    let saved = fetch_model(&options)?;
    println!("Model available at {}", saved.display());

    Ok(())
}
