use logotrace::PipelineError;

/// Print an error that ended the run, with remediation hints where there are any.
pub fn report_error(err: &PipelineError) {
    match err {
        PipelineError::ModelNotFound { path } => {
            eprintln!("Model file not found: {}", path.display());
            eprintln!();
            eprintln!("Please specify the model path:");
            eprintln!("  - Use --model <path>");
            eprintln!(
                "  - Or set environment variable {} to your model path",
                logotrace::ENV_MODEL_PATH
            );
            #[cfg(feature = "fetch-model")]
            {
                eprintln!();
                eprintln!("Or run `logotrace fetch-model` to download one.");
            }
        }
        _ => {
            eprintln!("Error: {err}");
        }
    }
}
