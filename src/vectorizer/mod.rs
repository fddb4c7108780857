use std::path::Path;

use crate::PipelineResult;
use crate::config::TraceOptions;

/// Converts a raster image on disk into an SVG file on disk.
pub trait Vectorizer {
    fn vectorize(&self, input: &Path, output: &Path, options: &TraceOptions)
    -> PipelineResult<()>;
}

impl<T: Vectorizer + ?Sized> Vectorizer for &T {
    fn vectorize(
        &self,
        input: &Path,
        output: &Path,
        options: &TraceOptions,
    ) -> PipelineResult<()> {
        (**self).vectorize(input, output, options)
    }
}

#[cfg(feature = "vectorizer-vtracer")]
pub mod vtracer;
