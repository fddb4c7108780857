use std::path::Path;

use tracing::debug;
use visioncortex::PathSimplifyMode;
use vtracer::{ColorMode as VtColorMode, Config, Hierarchical, convert_image_to_svg};

use crate::config::{ColorMode, Hierarchy, PathMode, TraceOptions};
use crate::{PipelineError, PipelineResult};

use super::Vectorizer;

/// VTracer-based SVG vectorizer.
#[derive(Debug, Clone, Copy, Default)]
pub struct VtracerVectorizer;

impl Vectorizer for VtracerVectorizer {
    fn vectorize(
        &self,
        input: &Path,
        output: &Path,
        options: &TraceOptions,
    ) -> PipelineResult<()> {
        let config = to_config(options);
        debug!(?options, input = %input.display(), "running vtracer");
        convert_image_to_svg(input, output, config).map_err(PipelineError::Trace)
    }
}

/// Map the trace options onto VTracer's configuration.
pub fn to_config(options: &TraceOptions) -> Config {
    Config {
        color_mode: match options.color_mode {
            ColorMode::Color => VtColorMode::Color,
            ColorMode::Binary => VtColorMode::Binary,
        },
        hierarchical: match options.hierarchy {
            Hierarchy::Stacked => Hierarchical::Stacked,
            Hierarchy::Cutout => Hierarchical::Cutout,
        },
        mode: match options.mode {
            PathMode::Pixel => PathSimplifyMode::None,
            PathMode::Polygon => PathSimplifyMode::Polygon,
            PathMode::Spline => PathSimplifyMode::Spline,
        },
        filter_speckle: options.filter_speckle,
        color_precision: options.color_precision,
        layer_difference: options.layer_difference,
        corner_threshold: options.corner_threshold,
        length_threshold: options.length_threshold,
        max_iterations: options.max_iterations,
        splice_threshold: options.splice_threshold,
        path_precision: options.path_precision,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn config_carries_every_option() {
        let options = TraceOptions {
            color_mode: ColorMode::Binary,
            hierarchy: Hierarchy::Cutout,
            mode: PathMode::Polygon,
            filter_speckle: 9,
            color_precision: 5,
            layer_difference: 8,
            corner_threshold: 30,
            length_threshold: 6.5,
            max_iterations: 3,
            splice_threshold: 20,
            path_precision: None,
        };

        let config = to_config(&options);
        assert!(matches!(config.color_mode, VtColorMode::Binary));
        assert!(matches!(config.hierarchical, Hierarchical::Cutout));
        assert!(matches!(config.mode, PathSimplifyMode::Polygon));
        assert_eq!(config.filter_speckle, 9);
        assert_eq!(config.color_precision, 5);
        assert_eq!(config.layer_difference, 8);
        assert_eq!(config.corner_threshold, 30);
        assert_eq!(config.length_threshold, 6.5);
        assert_eq!(config.max_iterations, 3);
        assert_eq!(config.splice_threshold, 20);
        assert_eq!(config.path_precision, None);
    }

    #[test]
    fn traces_png_into_svg_with_paths() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let input = dir.path().join("square.png");
        let output = dir.path().join("square.svg");

        let mut image = RgbaImage::from_pixel(32, 32, Rgba([0, 0, 0, 0]));
        for y in 8..24 {
            for x in 8..24 {
                image.put_pixel(x, y, Rgba([200, 30, 30, 255]));
            }
        }
        image.save(&input).expect("failed to write fixture");

        VtracerVectorizer
            .vectorize(&input, &output, &TraceOptions::default())
            .expect("tracing should succeed");

        let svg = std::fs::read_to_string(&output).expect("svg should exist");
        assert!(svg.contains("<svg"));
        assert!(svg.contains("<path"));
    }

    #[test]
    fn missing_input_is_a_trace_error() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let input = dir.path().join("absent.png");
        let output = dir.path().join("absent.svg");

        let err = VtracerVectorizer
            .vectorize(&input, &output, &TraceOptions::default())
            .unwrap_err();
        assert!(matches!(err, PipelineError::Trace(_)));
        assert!(!output.exists());
    }
}
