use std::path::{Path, PathBuf};

use image::imageops::FilterType;

/// Environment variable that names the ONNX model, read by the CLI.
pub const ENV_MODEL_PATH: &str = "LOGOTRACE_MODEL_PATH";
/// Model file looked up in the working directory when none is named.
pub const DEFAULT_MODEL_FILENAME: &str = "model.onnx";

/// Pick the model file to load.
///
/// An explicit path always wins. Otherwise `./model.onnx` is used when present,
/// then the downloaded copy in the cache, and finally `./model.onnx` again so
/// the error names the conventional location.
pub fn resolve_model_path(explicit: Option<&Path>, cached: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    let local = PathBuf::from(DEFAULT_MODEL_FILENAME);
    if local.is_file() {
        return local;
    }
    match cached {
        Some(path) if path.is_file() => path.to_path_buf(),
        _ => local,
    }
}

/// Options for the model and input image.
#[derive(Debug, Clone)]
pub struct InferenceSettings {
    /// Path to the ONNX model file.
    pub model_path: PathBuf,
    /// Filter to use when resizing the input image for the model.
    pub input_resize_filter: FilterType,
    /// Filter to use when resizing the output matte to the original image size.
    pub output_resize_filter: FilterType,
    /// Number of intra-op threads for the inference.
    pub intra_threads: Option<usize>,
}

impl InferenceSettings {
    pub fn new(model_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            input_resize_filter: FilterType::Triangle,
            output_resize_filter: FilterType::Lanczos3,
            intra_threads: None,
        }
    }

    /// Set the filter used to resize the input image for the model.
    pub fn with_input_resize_filter(mut self, filter: FilterType) -> Self {
        self.input_resize_filter = filter;
        self
    }

    /// Set the filter used to resize the matte back to the source resolution.
    pub fn with_output_resize_filter(mut self, filter: FilterType) -> Self {
        self.output_resize_filter = filter;
        self
    }

    /// Set the number of intra-op threads for the inference.
    pub fn with_intra_threads(mut self, intra_threads: Option<usize>) -> Self {
        self.intra_threads = intra_threads;
        self
    }
}

/// Optional clean-up of the model matte before it becomes the alpha channel.
///
/// When enabled the matte is thresholded, opened (erode then dilate) to drop
/// thin spurs and isolated islands, smoothed, and thresholded again, which
/// leaves hard edges that trace into fewer stray paths.
#[derive(Debug, Clone, PartialEq)]
pub struct MatteRefinement {
    pub enabled: bool,
    pub threshold: u8,
    pub open_radius: f32,
    pub blur_sigma: f32,
}

impl Default for MatteRefinement {
    fn default() -> Self {
        Self {
            enabled: false,
            threshold: 127,
            open_radius: 2.0,
            blur_sigma: 2.0,
        }
    }
}

/// Clustering mode used by the tracer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    Color,
    Binary,
}

/// How color layers are stacked in the output SVG.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hierarchy {
    Stacked,
    Cutout,
}

/// Curve fitting mode for traced paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathMode {
    Pixel,
    Polygon,
    Spline,
}

/// Tuning values handed to the vectorizer.
///
/// The defaults are the fixed configuration every run uses unless the caller
/// overrides a field explicitly.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceOptions {
    pub color_mode: ColorMode,
    pub hierarchy: Hierarchy,
    pub mode: PathMode,
    /// Discard patches smaller than this many pixels.
    pub filter_speckle: usize,
    /// Significant bits per RGB channel.
    pub color_precision: i32,
    /// Color difference between gradient layers.
    pub layer_difference: i32,
    /// Minimum momentary angle (degrees) to be considered a corner.
    pub corner_threshold: i32,
    /// Segments shorter than this are not subdivided further.
    pub length_threshold: f64,
    pub max_iterations: usize,
    /// Minimum angle displacement (degrees) to splice a spline.
    pub splice_threshold: i32,
    /// Decimal places in path coordinates, `None` for the tracer's own default.
    pub path_precision: Option<u32>,
}

impl Default for TraceOptions {
    fn default() -> Self {
        Self {
            color_mode: ColorMode::Color,
            hierarchy: Hierarchy::Stacked,
            mode: PathMode::Spline,
            filter_speckle: 4,
            color_precision: 6,
            layer_difference: 16,
            corner_threshold: 60,
            length_threshold: 4.0,
            max_iterations: 10,
            splice_threshold: 45,
            path_precision: Some(3),
        }
    }
}

/// The three files a pipeline run touches.
///
/// `output_png` is both the background remover's output and the vectorizer's
/// input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelinePaths {
    pub input: PathBuf,
    pub output_png: PathBuf,
    pub output_svg: PathBuf,
}

impl PipelinePaths {
    pub fn new(
        input: impl Into<PathBuf>,
        output_png: impl Into<PathBuf>,
        output_svg: impl Into<PathBuf>,
    ) -> Self {
        Self {
            input: input.into(),
            output_png: output_png.into(),
            output_svg: output_svg.into(),
        }
    }

    /// Write the transparent PNG next to the input as `<stem>-nobg.png` and the
    /// SVG as `<stem>.svg`.
    pub fn beside(input: impl Into<PathBuf>) -> Self {
        let input = input.into();
        let output_png = derive_variant_path(&input, "nobg", "png");
        let output_svg = derive_svg_path(&input);
        Self {
            input,
            output_png,
            output_svg,
        }
    }

    /// Replace the input with the transparent PNG and write `<stem>.svg` next to it.
    pub fn in_place(input: impl Into<PathBuf>) -> Self {
        let input = input.into();
        let output_svg = derive_svg_path(&input);
        Self {
            output_png: input.clone(),
            input,
            output_svg,
        }
    }

    /// Whether the run overwrites its own input.
    pub fn overwrites_input(&self) -> bool {
        self.input == self.output_png
    }
}

/// Derive a variant file path by appending a suffix before the extension.
pub fn derive_variant_path(input: &Path, suffix: &str, extension: &str) -> PathBuf {
    let mut derived = input.to_path_buf();
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| suffix.to_string());
    derived.set_file_name(format!("{stem}-{suffix}.{extension}"));
    derived
}

/// Derive an SVG file path by changing the extension to "svg".
pub fn derive_svg_path(input: &Path) -> PathBuf {
    let mut path = input.to_path_buf();
    path.set_extension("svg");
    path
}
