use logotrace::{Pipeline, PipelineOutcome, PipelinePaths, PipelineResult, VtracerVectorizer};

use crate::cli::{GlobalOptions, ProcessCommand};

use super::utils::build_remover;

/// Run both stages. A missing input or a failed trace still exits successfully.
pub fn run(global: &GlobalOptions, cmd: ProcessCommand) -> PipelineResult<()> {
    let remover = build_remover(global, &cmd.refinement);

    let mut paths = if cmd.in_place {
        PipelinePaths::in_place(&cmd.input)
    } else {
        PipelinePaths::beside(&cmd.input)
    };
    if let Some(png) = cmd.png_output {
        paths.output_png = png;
    }
    if let Some(svg) = cmd.svg_output {
        paths.output_svg = svg;
    }

    let pipeline = Pipeline::new(remover, VtracerVectorizer, paths)
        .with_trace_options((&cmd.trace_options).into());

    match pipeline.run()? {
        PipelineOutcome::InputMissing { .. } => {}
        PipelineOutcome::Completed { png, svg } => {
            println!("Transparent PNG saved to {}", png.display());
            println!("SVG saved to {}", svg.display());
        }
        PipelineOutcome::VectorizationFailed { png, .. } => {
            println!("Transparent PNG saved to {}", png.display());
        }
    }

    Ok(())
}
