use logotrace::config::derive_svg_path;
use logotrace::{PipelineResult, TraceOptions, Vectorizer, VtracerVectorizer};

use crate::cli::TraceCommand;

/// Trace an image on disk into an SVG.
pub fn run(cmd: TraceCommand) -> PipelineResult<()> {
    let output_path = cmd
        .output
        .clone()
        .unwrap_or_else(|| derive_svg_path(&cmd.input));
    let options = TraceOptions::from(&cmd.trace_options);

    VtracerVectorizer.vectorize(&cmd.input, &output_path, &options)?;
    println!("SVG saved to {}", output_path.display());

    Ok(())
}
