//! Two-stage run: background removal, then vectorization of the result.
//!
//! The stages are strictly sequential. A missing input ends the run cleanly,
//! a failed removal is returned as an error, and a failed vectorization is
//! logged and reported through [`PipelineOutcome::VectorizationFailed`].

use std::fs;
use std::path::PathBuf;

use tracing::{error, info, warn};

use crate::PipelineResult;
use crate::background::BackgroundRemover;
use crate::config::{PipelinePaths, TraceOptions};
use crate::error::PipelineError;
use crate::vectorizer::Vectorizer;

/// How a run ended, when it did not end with an error.
#[derive(Debug)]
pub enum PipelineOutcome {
    /// The input file does not exist; nothing was read or written.
    InputMissing { input: PathBuf },
    /// Both files were written.
    Completed { png: PathBuf, svg: PathBuf },
    /// The transparent PNG was written but tracing it failed.
    VectorizationFailed { png: PathBuf, error: PipelineError },
}

impl PipelineOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, PipelineOutcome::Completed { .. })
    }
}

pub struct Pipeline<R, V> {
    remover: R,
    vectorizer: V,
    paths: PipelinePaths,
    trace_options: TraceOptions,
}

impl<R, V> Pipeline<R, V>
where
    R: BackgroundRemover,
    V: Vectorizer,
{
    pub fn new(remover: R, vectorizer: V, paths: PipelinePaths) -> Self {
        Self {
            remover,
            vectorizer,
            paths,
            trace_options: TraceOptions::default(),
        }
    }

    /// Override the trace options used by the vectorization stage.
    pub fn with_trace_options(mut self, options: TraceOptions) -> Self {
        self.trace_options = options;
        self
    }

    pub fn paths(&self) -> &PipelinePaths {
        &self.paths
    }

    pub fn trace_options(&self) -> &TraceOptions {
        &self.trace_options
    }

    /// Run both stages against the configured paths.
    pub fn run(&self) -> PipelineResult<PipelineOutcome> {
        let paths = &self.paths;
        if !self.input_exists() {
            return Ok(PipelineOutcome::InputMissing {
                input: paths.input.clone(),
            });
        }

        self.remove_background()?;

        match self.vectorize() {
            Ok(()) => Ok(PipelineOutcome::Completed {
                png: paths.output_png.clone(),
                svg: paths.output_svg.clone(),
            }),
            Err(err) => {
                error!(error = %err, "vectorization failed");
                Ok(PipelineOutcome::VectorizationFailed {
                    png: paths.output_png.clone(),
                    error: err,
                })
            }
        }
    }

    /// Run stage one only. Returns the written PNG, or `None` when the input is missing.
    pub fn cut(&self) -> PipelineResult<Option<PathBuf>> {
        if !self.input_exists() {
            return Ok(None);
        }
        self.remove_background()?;
        Ok(Some(self.paths.output_png.clone()))
    }

    fn input_exists(&self) -> bool {
        let exists = self.paths.input.exists();
        if !exists {
            error!(input = %self.paths.input.display(), "input not found");
        }
        exists
    }

    /// Stage one: read the input, strip the background, write the PNG.
    pub fn remove_background(&self) -> PipelineResult<()> {
        let paths = &self.paths;
        info!(input = %paths.input.display(), "loading image");
        let input = fs::read(&paths.input)?;

        info!("removing background (the model may take a moment to load)");
        let output = self.remover.remove_background(&input)?;

        if paths.overwrites_input() {
            warn!(path = %paths.output_png.display(), "overwriting input with transparent PNG");
        }
        fs::write(&paths.output_png, output)?;
        info!(png = %paths.output_png.display(), "saved transparent PNG");
        Ok(())
    }

    /// Stage two: trace the PNG written by stage one into the SVG.
    pub fn vectorize(&self) -> PipelineResult<()> {
        let paths = &self.paths;
        info!("vectorizing to SVG");
        self.vectorizer
            .vectorize(&paths.output_png, &paths.output_svg, &self.trace_options)?;
        info!(svg = %paths.output_svg.display(), "saved SVG");
        Ok(())
    }
}
