use std::path::PathBuf;

use logotrace::{InferenceSettings, MatteRefinement, OnnxBackgroundRemover, resolve_model_path};

use crate::cli::{GlobalOptions, RefinementArgs};

/// Build the ONNX background remover from the global options and refinement flags.
pub fn build_remover(global: &GlobalOptions, refinement: &RefinementArgs) -> OnnxBackgroundRemover {
    let settings = InferenceSettings::new(model_path(global))
        .with_input_resize_filter(global.input_resample_filter.into())
        .with_output_resize_filter(global.output_resample_filter.into())
        .with_intra_threads(global.intra_threads);
    OnnxBackgroundRemover::new(settings).with_refinement(MatteRefinement::from(refinement))
}

fn model_path(global: &GlobalOptions) -> PathBuf {
    resolve_model_path(global.model.as_deref(), cached_model_path().as_deref())
}

#[cfg(feature = "fetch-model")]
fn cached_model_path() -> Option<PathBuf> {
    Some(logotrace::model_fetch::default_model_cache_path())
}

#[cfg(not(feature = "fetch-model"))]
fn cached_model_path() -> Option<PathBuf> {
    None
}
