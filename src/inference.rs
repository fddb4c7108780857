use std::convert::TryFrom;

use image::imageops::FilterType;
use image::{GrayImage, ImageBuffer, Luma, RgbImage};
use ndarray::{Array2, Array4, ArrayViewD, Axis, Ix2};
use ort::session::Session;
use ort::value::Tensor;
use tracing::debug;

use crate::config::InferenceSettings;
use crate::matte::{matte_to_gray, normalize_matte};
use crate::{PipelineError, PipelineResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelLayout {
    Nchw,
    Nhwc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelInputSpec {
    pub width: usize,
    pub height: usize,
    pub layout: ChannelLayout,
}

/// Input geometry of the rembg U2-Net family, used when the model leaves it dynamic.
pub const DEFAULT_MODEL_INPUT_SPEC: ModelInputSpec = ModelInputSpec {
    width: 320,
    height: 320,
    layout: ChannelLayout::Nchw,
};

const MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Load the model and estimate an 8-bit foreground matte at the image's own resolution.
pub fn estimate_matte(settings: &InferenceSettings, rgb: &RgbImage) -> PipelineResult<GrayImage> {
    if !settings.model_path.is_file() {
        return Err(PipelineError::ModelNotFound {
            path: settings.model_path.clone(),
        });
    }

    let mut session = open_session(settings)?;
    let spec = determine_model_input_spec(&session);
    debug!(?spec, model = %settings.model_path.display(), "model loaded");

    let tensor = preprocess_image_to_tensor(rgb, settings.input_resize_filter, spec)?;
    let outputs = session.run(ort::inputs![tensor])?;
    let raw = outputs[0].try_extract_array::<f32>()?;

    let mut matte = extract_matte_hw(raw)?;
    normalize_matte(&mut matte);
    let (w, h) = rgb.dimensions();
    let matte = resize_matte(&matte, w, h, settings.output_resize_filter);
    Ok(matte_to_gray(&matte))
}

fn open_session(settings: &InferenceSettings) -> ort::Result<Session> {
    let mut builder = Session::builder()?;
    if let Some(threads) = settings.intra_threads {
        builder = builder.with_intra_threads(threads)?;
    }
    builder.commit_from_file(&settings.model_path)
}

/// Tries to figure out the model input spec from the session and falls back to the default.
pub fn determine_model_input_spec(session: &Session) -> ModelInputSpec {
    infer_model_input_spec(session).unwrap_or(DEFAULT_MODEL_INPUT_SPEC)
}

fn infer_model_input_spec(session: &Session) -> Option<ModelInputSpec> {
    let input = session.inputs().first()?;
    let shape = input.dtype().tensor_shape()?;
    spec_from_dims(shape)
}

/// Reads an input spec from raw tensor dimensions, preferring NCHW.
fn spec_from_dims(dims: &[i64]) -> Option<ModelInputSpec> {
    if dims.len() < 4 {
        return None;
    }
    infer_layout(dims, ChannelLayout::Nchw).or_else(|| infer_layout(dims, ChannelLayout::Nhwc))
}

fn infer_layout(dims: &[i64], layout: ChannelLayout) -> Option<ModelInputSpec> {
    let (c, h, w) = match layout {
        ChannelLayout::Nchw => (1, 2, 3),
        ChannelLayout::Nhwc => (3, 1, 2),
    };
    let channels = *dims.get(c)?;
    if channels != 3 && channels != -1 {
        return None;
    }
    Some(ModelInputSpec {
        width: positive_dim_to_usize(*dims.get(w)?)?,
        height: positive_dim_to_usize(*dims.get(h)?)?,
        layout,
    })
}

fn positive_dim_to_usize(dim: i64) -> Option<usize> {
    if dim > 0 {
        usize::try_from(dim).ok()
    } else {
        None
    }
}

/// Resizes and normalizes the RGB image into a tensor that matches the model spec.
pub fn preprocess_image_to_tensor(
    rgb: &RgbImage,
    filter: FilterType,
    spec: ModelInputSpec,
) -> PipelineResult<Tensor<f32>> {
    let array = preprocess_image_to_array(rgb, filter, spec)?;
    Ok(Tensor::from_array(array)?)
}

fn preprocess_image_to_array(
    rgb: &RgbImage,
    filter: FilterType,
    spec: ModelInputSpec,
) -> PipelineResult<Array4<f32>> {
    let target_w = u32::try_from(spec.width)
        .map_err(|_| PipelineError::ModelOutput(format!("model width {} exceeds u32", spec.width)))?;
    let target_h = u32::try_from(spec.height).map_err(|_| {
        PipelineError::ModelOutput(format!("model height {} exceeds u32", spec.height))
    })?;

    let resized = image::imageops::resize(rgb, target_w, target_h, filter);
    let (w, h) = (spec.width, spec.height);
    let shape = match spec.layout {
        ChannelLayout::Nchw => (1, 3, h, w),
        ChannelLayout::Nhwc => (1, h, w, 3),
    };
    let mut array = Array4::<f32>::zeros(shape);
    for (x, y, pixel) in resized.enumerate_pixels() {
        let (x, y) = (x as usize, y as usize);
        for c in 0..3 {
            let value = (f32::from(pixel[c]) / 255.0 - MEAN[c]) / STD[c];
            match spec.layout {
                ChannelLayout::Nchw => array[[0, c, y, x]] = value,
                ChannelLayout::Nhwc => array[[0, y, x, c]] = value,
            }
        }
    }
    Ok(array)
}

/// Remove singleton axes to get the raw H×W matte from the model output.
pub fn extract_matte_hw(matte: ArrayViewD<f32>) -> PipelineResult<Array2<f32>> {
    let original_shape = matte.shape().to_vec();
    let mut view = matte;

    while view.ndim() > 2 {
        let axis = view
            .shape()
            .iter()
            .position(|&len| len == 1)
            .ok_or_else(|| {
                PipelineError::ModelOutput(format!(
                    "cannot infer H×W from output shape {original_shape:?}"
                ))
            })?;
        view = view.index_axis_move(Axis(axis), 0);
    }
    Ok(view.into_dimensionality::<Ix2>()?.to_owned())
}

/// Resamples the matte to the requested width and height with the chosen filter.
pub fn resize_matte(
    matte: &Array2<f32>,
    target_w: u32,
    target_h: u32,
    filter: FilterType,
) -> Array2<f32> {
    let (src_h, src_w) = matte.dim();
    let buffer = ImageBuffer::<Luma<f32>, Vec<f32>>::from_fn(src_w as u32, src_h as u32, |x, y| {
        Luma([matte[[y as usize, x as usize]]])
    });
    let resized = image::imageops::resize(&buffer, target_w, target_h, filter);
    let mut out = Array2::<f32>::zeros((target_h as usize, target_w as usize));
    for (x, y, pixel) in resized.enumerate_pixels() {
        out[[y as usize, x as usize]] = pixel[0];
    }
    out
}
