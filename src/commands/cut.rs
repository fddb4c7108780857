use logotrace::{Pipeline, PipelinePaths, PipelineResult, VtracerVectorizer};

use crate::cli::{CutCommand, GlobalOptions};

use super::utils::build_remover;

/// Remove the background and write the transparent PNG. A missing input exits successfully.
pub fn run(global: &GlobalOptions, cmd: CutCommand) -> PipelineResult<()> {
    let remover = build_remover(global, &cmd.refinement);

    let mut paths = if cmd.in_place {
        PipelinePaths::in_place(&cmd.input)
    } else {
        PipelinePaths::beside(&cmd.input)
    };
    if let Some(png) = cmd.output {
        paths.output_png = png;
    }

    if let Some(png) = Pipeline::new(remover, VtracerVectorizer, paths).cut()? {
        println!("Transparent PNG saved to {}", png.display());
    }

    Ok(())
}
