use std::io::Cursor;

use image::{DynamicImage, GrayImage, ImageDecoder, ImageFormat, ImageReader, RgbaImage};
use tracing::debug;

use crate::config::{InferenceSettings, MatteRefinement};
use crate::inference::estimate_matte;
use crate::matte::refine_matte;
use crate::{PipelineError, PipelineResult};

/// Turns an encoded image into an encoded PNG whose background pixels are transparent.
pub trait BackgroundRemover {
    fn remove_background(&self, image_bytes: &[u8]) -> PipelineResult<Vec<u8>>;
}

impl<T: BackgroundRemover + ?Sized> BackgroundRemover for &T {
    fn remove_background(&self, image_bytes: &[u8]) -> PipelineResult<Vec<u8>> {
        (**self).remove_background(image_bytes)
    }
}

/// Background remover backed by an ONNX salient-object model such as U2-Net or Silueta.
///
/// The session is created per call; a single run only ever removes one background.
#[derive(Debug, Clone)]
pub struct OnnxBackgroundRemover {
    settings: InferenceSettings,
    refinement: MatteRefinement,
}

impl OnnxBackgroundRemover {
    pub fn new(settings: InferenceSettings) -> Self {
        Self {
            settings,
            refinement: MatteRefinement::default(),
        }
    }

    pub fn with_refinement(mut self, refinement: MatteRefinement) -> Self {
        self.refinement = refinement;
        self
    }

    pub fn settings(&self) -> &InferenceSettings {
        &self.settings
    }

    /// Decode, segment and cut out an image, returning the RGBA result.
    pub fn cut_out(&self, image_bytes: &[u8]) -> PipelineResult<RgbaImage> {
        let source = decode_oriented(image_bytes)?;
        debug!(
            width = source.width(),
            height = source.height(),
            color = ?source.color(),
            "decoded input image"
        );

        let rgb = source.to_rgb8();
        let matte = estimate_matte(&self.settings, &rgb)?;
        let matte = refine_matte(&matte, &self.refinement);
        apply_matte(&source.into_rgba8(), &matte)
    }
}

impl BackgroundRemover for OnnxBackgroundRemover {
    fn remove_background(&self, image_bytes: &[u8]) -> PipelineResult<Vec<u8>> {
        let cutout = self.cut_out(image_bytes)?;
        encode_png(cutout)
    }
}

/// Decode an image and rotate or flip it upright according to its EXIF orientation.
pub fn decode_oriented(image_bytes: &[u8]) -> PipelineResult<DynamicImage> {
    let mut decoder = ImageReader::new(Cursor::new(image_bytes))
        .with_guessed_format()?
        .into_decoder()?;
    let orientation = decoder.orientation()?;
    let mut image = DynamicImage::from_decoder(decoder)?;
    image.apply_orientation(orientation);
    Ok(image)
}

/// Composite the image over transparent black through the matte.
///
/// Every channel is scaled by the matte, so fully keyed pixels become
/// `(0, 0, 0, 0)` and pixels that were already transparent in the source stay
/// transparent whatever the model says.
pub fn apply_matte(rgba: &RgbaImage, matte: &GrayImage) -> PipelineResult<RgbaImage> {
    let expected = rgba.dimensions();
    let found = matte.dimensions();
    if expected != found {
        return Err(PipelineError::AlphaMismatch { expected, found });
    }

    let mut out = rgba.clone();
    for (px, m) in out.pixels_mut().zip(matte.pixels()) {
        for channel in px.0.iter_mut() {
            let scaled = u16::from(*channel) * u16::from(m[0]);
            *channel = ((scaled + 127) / 255) as u8;
        }
    }
    Ok(out)
}

/// Encode an RGBA image as PNG bytes.
pub fn encode_png(image: RgbaImage) -> PipelineResult<Vec<u8>> {
    let mut bytes = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(image).write_to(&mut bytes, ImageFormat::Png)?;
    Ok(bytes.into_inner())
}
