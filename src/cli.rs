use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use image::imageops::FilterType;
use logotrace::{ColorMode, ENV_MODEL_PATH, Hierarchy, MatteRefinement, PathMode, TraceOptions};

/// Remove an image's background and trace it into an SVG.
#[derive(Parser, Debug)]
#[command(author, version, about, propagate_version = true)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOptions,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug)]
pub struct GlobalOptions {
    /// ONNX model path (defaults to ./model.onnx, then the downloaded model)
    #[arg(short = 'm', long, env = ENV_MODEL_PATH, global = true)]
    pub model: Option<PathBuf>,
    /// Intra-op thread count for ORT (None to let ORT decide)
    #[arg(long, global = true)]
    pub intra_threads: Option<usize>,
    /// Filter used when resizing the input before inference
    #[arg(long = "input-resample-filter", value_enum, default_value_t = ResampleFilter::Triangle, global = true)]
    pub input_resample_filter: ResampleFilter,
    /// Filter used when resizing the matte back to the original resolution
    #[arg(long = "output-resample-filter", value_enum, default_value_t = ResampleFilter::Lanczos3, global = true)]
    pub output_resample_filter: ResampleFilter,
    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Remove the background, then trace the transparent PNG into an SVG
    Process(ProcessCommand),
    /// Remove the background and export the transparent PNG only
    Cut(CutCommand),
    /// Trace an existing image into an SVG without touching its background
    Trace(TraceCommand),
    /// Download the default background-removal model
    #[cfg(feature = "fetch-model")]
    FetchModel(FetchModelCommand),
}

/// Resampling filters for image resizing.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ResampleFilter {
    Nearest,
    Triangle,
    CatmullRom,
    Gaussian,
    Lanczos3,
}

impl From<ResampleFilter> for FilterType {
    fn from(value: ResampleFilter) -> Self {
        match value {
            ResampleFilter::Nearest => FilterType::Nearest,
            ResampleFilter::Triangle => FilterType::Triangle,
            ResampleFilter::CatmullRom => FilterType::CatmullRom,
            ResampleFilter::Gaussian => FilterType::Gaussian,
            ResampleFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

#[derive(Args, Debug)]
pub struct ProcessCommand {
    /// Input image path
    pub input: PathBuf,
    /// Transparent PNG output path (defaults to `<name>-nobg.png`)
    #[arg(long = "png-output", conflicts_with = "in_place")]
    pub png_output: Option<PathBuf>,
    /// SVG output path (defaults to input name with `.svg`)
    #[arg(long = "svg-output")]
    pub svg_output: Option<PathBuf>,
    /// Overwrite the input image with the transparent PNG
    #[arg(long = "in-place")]
    pub in_place: bool,
    #[command(flatten)]
    pub refinement: RefinementArgs,
    #[command(flatten)]
    pub trace_options: TraceOptionsArgs,
}

#[derive(Args, Debug)]
pub struct CutCommand {
    /// Input image path
    pub input: PathBuf,
    /// Transparent PNG output path (defaults to `<name>-nobg.png`)
    #[arg(short, long, conflicts_with = "in_place")]
    pub output: Option<PathBuf>,
    /// Overwrite the input image with the transparent PNG
    #[arg(long = "in-place")]
    pub in_place: bool,
    #[command(flatten)]
    pub refinement: RefinementArgs,
}

#[derive(Args, Debug)]
pub struct TraceCommand {
    /// Input image path
    pub input: PathBuf,
    /// Output SVG path (defaults to input name with `.svg`)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    #[command(flatten)]
    pub trace_options: TraceOptionsArgs,
}

#[cfg(feature = "fetch-model")]
#[derive(Args, Debug)]
pub struct FetchModelCommand {
    /// Where to save the model (defaults to the cache directory)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Overwrite an existing model file
    #[arg(long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct RefinementArgs {
    /// Clean up the matte (threshold, open, smooth) before applying it
    #[arg(long)]
    pub refine: bool,
    /// Threshold applied when refining the matte (0-255 or 0.0-1.0)
    #[arg(long = "refine-threshold", default_value_t = 127, value_parser = parse_threshold)]
    pub refine_threshold: u8,
    /// Radius in pixels of the morphological opening
    #[arg(long = "open-radius", default_value_t = 2.0)]
    pub open_radius: f32,
    /// Sigma of the smoothing blur (0 disables it)
    #[arg(long = "refine-blur", default_value_t = 2.0)]
    pub refine_blur: f32,
}

impl From<&RefinementArgs> for MatteRefinement {
    fn from(args: &RefinementArgs) -> Self {
        Self {
            enabled: args.refine,
            threshold: args.refine_threshold,
            open_radius: args.open_radius,
            blur_sigma: args.refine_blur,
        }
    }
}

fn parse_threshold(value: &str) -> Result<u8, String> {
    if let Ok(int_value) = value.parse::<u8>() {
        return Ok(int_value);
    }

    let float_value = value
        .parse::<f32>()
        .map_err(|_| format!("threshold must be numeric (0-255 or 0.0-1.0), got `{value}`"))?;

    if (0.0..=1.0).contains(&float_value) {
        return Ok((float_value * 255.0).round().clamp(0.0, 255.0) as u8);
    }

    Err(format!(
        "threshold {value} is out of range; expected 0-255 or 0.0-1.0"
    ))
}

/// Tracing color modes for SVG vectorization.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum TracerColorMode {
    Color,
    Binary,
}

impl From<TracerColorMode> for ColorMode {
    fn from(value: TracerColorMode) -> Self {
        match value {
            TracerColorMode::Color => ColorMode::Color,
            TracerColorMode::Binary => ColorMode::Binary,
        }
    }
}

/// Hierarchical tracing modes for SVG vectorization.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum TracerHierarchy {
    Stacked,
    Cutout,
}

impl From<TracerHierarchy> for Hierarchy {
    fn from(value: TracerHierarchy) -> Self {
        match value {
            TracerHierarchy::Stacked => Hierarchy::Stacked,
            TracerHierarchy::Cutout => Hierarchy::Cutout,
        }
    }
}

/// Curve fitting modes for SVG vectorization.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum TracerMode {
    Pixel,
    Polygon,
    Spline,
}

impl From<TracerMode> for PathMode {
    fn from(value: TracerMode) -> Self {
        match value {
            TracerMode::Pixel => PathMode::Pixel,
            TracerMode::Polygon => PathMode::Polygon,
            TracerMode::Spline => PathMode::Spline,
        }
    }
}

#[derive(Args, Debug)]
pub struct TraceOptionsArgs {
    /// Tracing color mode
    #[arg(long = "color-mode", value_enum, default_value_t = TracerColorMode::Color)]
    pub color_mode: TracerColorMode,
    /// Hierarchical tracing mode
    #[arg(long = "hierarchy", value_enum, default_value_t = TracerHierarchy::Stacked)]
    pub hierarchy: TracerHierarchy,
    /// Curve fitting mode
    #[arg(long = "mode", value_enum, default_value_t = TracerMode::Spline)]
    pub mode: TracerMode,
    /// Discard patches smaller than this many pixels
    #[arg(long = "filter-speckle", default_value_t = 4)]
    pub filter_speckle: usize,
    /// Significant bits per RGB channel
    #[arg(long = "color-precision", default_value_t = 6)]
    pub color_precision: i32,
    /// Color difference between gradient layers
    #[arg(long = "layer-difference", default_value_t = 16)]
    pub layer_difference: i32,
    /// Corner threshold in degrees
    #[arg(long = "corner-threshold", default_value_t = 60)]
    pub corner_threshold: i32,
    /// Segment length threshold
    #[arg(long = "length-threshold", default_value_t = 4.0)]
    pub length_threshold: f64,
    /// Maximum curve fitting iterations
    #[arg(long = "max-iterations", default_value_t = 10)]
    pub max_iterations: usize,
    /// Splice threshold in degrees
    #[arg(long = "splice-threshold", default_value_t = 45)]
    pub splice_threshold: i32,
    /// Decimal places in path coordinates
    #[arg(long = "path-precision", default_value_t = 3, conflicts_with = "no_path_precision")]
    pub path_precision: u32,
    /// Leave path precision to the tracer's default
    #[arg(long = "no-path-precision")]
    pub no_path_precision: bool,
}

impl From<&TraceOptionsArgs> for TraceOptions {
    fn from(args: &TraceOptionsArgs) -> Self {
        Self {
            color_mode: args.color_mode.into(),
            hierarchy: args.hierarchy.into(),
            mode: args.mode.into(),
            filter_speckle: args.filter_speckle,
            color_precision: args.color_precision,
            layer_difference: args.layer_difference,
            corner_threshold: args.corner_threshold,
            length_threshold: args.length_threshold,
            max_iterations: args.max_iterations,
            splice_threshold: args.splice_threshold,
            path_precision: (!args.no_path_precision).then_some(args.path_precision),
        }
    }
}
