//! Strip the background from an image with an ONNX matting model and trace the
//! transparent result into an SVG.
//!
//! ```no_run
//! use logotrace::{
//!     InferenceSettings, OnnxBackgroundRemover, Pipeline, PipelinePaths, VtracerVectorizer,
//! };
//!
//! let remover = OnnxBackgroundRemover::new(InferenceSettings::new("model.onnx"));
//! let pipeline = Pipeline::new(remover, VtracerVectorizer, PipelinePaths::beside("logo.png"));
//! let outcome = pipeline.run()?;
//! println!("{outcome:?}");
//! # Ok::<(), logotrace::PipelineError>(())
//! ```

pub mod background;
pub mod config;
pub mod error;
pub mod inference;
pub mod matte;
#[cfg(feature = "fetch-model")]
pub mod model_fetch;
pub mod pipeline;
pub mod vectorizer;

pub use background::{BackgroundRemover, OnnxBackgroundRemover};
pub use config::{
    ColorMode, DEFAULT_MODEL_FILENAME, ENV_MODEL_PATH, Hierarchy, InferenceSettings,
    MatteRefinement, PathMode, PipelinePaths, TraceOptions, resolve_model_path,
};
pub use error::{PipelineError, PipelineResult};
pub use pipeline::{Pipeline, PipelineOutcome};
pub use vectorizer::Vectorizer;
#[cfg(feature = "vectorizer-vtracer")]
pub use vectorizer::vtracer::VtracerVectorizer;
