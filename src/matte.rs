use image::{GrayImage, Luma};
use imageproc::contrast::{ThresholdType, threshold};
use imageproc::distance_transform::euclidean_squared_distance_transform;
use imageproc::filter::gaussian_blur_f32;
use ndarray::Array2;

use crate::config::MatteRefinement;

/// Convert a 2D array of f32 values in [0.0, 1.0] to a grayscale image.
pub fn matte_to_gray(matte: &Array2<f32>) -> GrayImage {
    let (h, w) = matte.dim();
    GrayImage::from_fn(w as u32, h as u32, |x, y| {
        let value = matte[[y as usize, x as usize]].clamp(0.0, 1.0);
        Luma([(value * 255.0 + 0.5) as u8])
    })
}

/// Stretch the matte so its smallest value maps to 0.0 and its largest to 1.0.
///
/// A flat matte carries no information about the subject and is left as is.
pub fn normalize_matte(matte: &mut Array2<f32>) {
    let (min, max) = matte
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let range = max - min;
    if !range.is_finite() || range <= f32::EPSILON {
        return;
    }
    matte.mapv_inplace(|v| (v - min) / range);
}

/// Everything strictly above `value` becomes 255, the rest 0.
pub fn threshold_matte(matte: &GrayImage, value: u8) -> GrayImage {
    threshold(matte, value, ThresholdType::Binary)
}

/// Grow the white region of a binary mask by `radius` pixels.
pub fn dilate_euclidean(mask: &GrayImage, radius: f32) -> GrayImage {
    let d2 = euclidean_squared_distance_transform(mask);
    let r2 = f64::from(radius) * f64::from(radius);
    let (w, h) = mask.dimensions();
    let mut out = GrayImage::new(w, h);
    for (out_px, d2_px) in out.pixels_mut().zip(d2.pixels()) {
        *out_px = Luma([if d2_px[0] <= r2 { 255 } else { 0 }]);
    }
    out
}

/// Shrink the white region of a binary mask by `radius` pixels.
///
/// Pixels outside the image do not count as background.
pub fn erode_euclidean(mask: &GrayImage, radius: f32) -> GrayImage {
    let mut background = mask.clone();
    for px in background.pixels_mut() {
        px[0] = if px[0] == 0 { 255 } else { 0 };
    }
    if background.pixels().all(|px| px[0] == 0) {
        return mask.clone();
    }

    let d2 = euclidean_squared_distance_transform(&background);
    let r2 = f64::from(radius) * f64::from(radius);
    let (w, h) = mask.dimensions();
    let mut out = GrayImage::new(w, h);
    for (out_px, d2_px) in out.pixels_mut().zip(d2.pixels()) {
        *out_px = Luma([if d2_px[0] > r2 { 255 } else { 0 }]);
    }
    out
}

/// Morphological opening: erosion followed by dilation with the same radius.
pub fn open_mask(mask: &GrayImage, radius: f32) -> GrayImage {
    dilate_euclidean(&erode_euclidean(mask, radius), radius)
}

/// Apply the configured refinement to an 8-bit matte.
///
/// Returns the matte untouched when refinement is disabled.
pub fn refine_matte(matte: &GrayImage, refinement: &MatteRefinement) -> GrayImage {
    if !refinement.enabled {
        return matte.clone();
    }

    let binary = threshold_matte(matte, refinement.threshold);
    let opened = open_mask(&binary, refinement.open_radius);
    let smoothed = if refinement.blur_sigma > 0.0 {
        gaussian_blur_f32(&opened, refinement.blur_sigma)
    } else {
        opened
    };
    threshold_matte(&smoothed, refinement.threshold)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gray_image(w: u32, h: u32, value: u8) -> GrayImage {
        GrayImage::from_pixel(w, h, Luma([value]))
    }

    mod matte_to_gray {
        use super::*;

        mod unit {
            use super::*;

            #[test]
            fn zeros_are_black_and_ones_white() {
                let mut matte = Array2::<f32>::zeros((1, 2));
                matte[[0, 1]] = 1.0;

                let gray = matte_to_gray(&matte);
                assert_eq!(gray.get_pixel(0, 0)[0], 0);
                assert_eq!(gray.get_pixel(1, 0)[0], 255);
            }

            #[test]
            fn out_of_range_values_are_clamped() {
                let mut matte = Array2::<f32>::zeros((1, 2));
                matte[[0, 0]] = -3.0;
                matte[[0, 1]] = 7.0;

                let gray = matte_to_gray(&matte);
                assert_eq!(gray.get_pixel(0, 0)[0], 0);
                assert_eq!(gray.get_pixel(1, 0)[0], 255);
            }

            #[test]
            fn width_and_height_follow_array_axes() {
                let matte = Array2::<f32>::zeros((3, 5));
                assert_eq!(matte_to_gray(&matte).dimensions(), (5, 3));
            }
        }

        mod prop {
            use super::*;
            use proptest::prelude::*;

            proptest! {
                #[test]
                fn monotonic(a in 0.0f32..=1.0, b in 0.0f32..=1.0) {
                    let mut matte = Array2::<f32>::zeros((1, 2));
                    matte[[0, 0]] = a;
                    matte[[0, 1]] = b;
                    let gray = matte_to_gray(&matte);
                    if a <= b {
                        prop_assert!(gray.get_pixel(0, 0)[0] <= gray.get_pixel(1, 0)[0]);
                    } else {
                        prop_assert!(gray.get_pixel(0, 0)[0] >= gray.get_pixel(1, 0)[0]);
                    }
                }
            }
        }
    }

    mod normalize_matte {
        use super::*;

        #[test]
        fn stretches_to_unit_range() {
            let mut matte = Array2::from_shape_vec((1, 3), vec![0.2f32, 0.4, 0.6]).unwrap();
            normalize_matte(&mut matte);

            assert!((matte[[0, 0]] - 0.0).abs() < 1e-6);
            assert!((matte[[0, 1]] - 0.5).abs() < 1e-6);
            assert!((matte[[0, 2]] - 1.0).abs() < 1e-6);
        }

        #[test]
        fn flat_matte_is_unchanged() {
            let mut matte = Array2::from_elem((2, 2), 0.7f32);
            normalize_matte(&mut matte);
            assert!(matte.iter().all(|&v| (v - 0.7).abs() < 1e-6));
        }
    }

    mod morphology {
        use super::*;

        #[test]
        fn single_pixel_dilates_to_cross() {
            let mut mask = gray_image(5, 5, 0);
            mask.put_pixel(2, 2, Luma([255]));

            let result = dilate_euclidean(&mask, 1.0);
            assert_eq!(result.get_pixel(2, 1)[0], 255);
            assert_eq!(result.get_pixel(1, 2)[0], 255);
            assert_eq!(result.get_pixel(1, 1)[0], 0);
        }

        #[test]
        fn erosion_removes_isolated_pixel() {
            let mut mask = gray_image(5, 5, 0);
            mask.put_pixel(2, 2, Luma([255]));

            let result = erode_euclidean(&mask, 1.0);
            assert!(result.pixels().all(|px| px[0] == 0));
        }

        #[test]
        fn erosion_keeps_solid_white() {
            let mask = gray_image(4, 4, 255);
            let result = erode_euclidean(&mask, 2.0);
            assert!(result.pixels().all(|px| px[0] == 255));
        }

        #[test]
        fn erosion_shrinks_square_from_its_edges() {
            let mut mask = gray_image(7, 7, 0);
            for y in 1..6 {
                for x in 1..6 {
                    mask.put_pixel(x, y, Luma([255]));
                }
            }

            let result = erode_euclidean(&mask, 1.0);
            assert_eq!(result.get_pixel(1, 3)[0], 0);
            assert_eq!(result.get_pixel(3, 3)[0], 255);
            assert_eq!(result.get_pixel(2, 2)[0], 255);
        }

        #[test]
        fn opening_drops_speck_and_keeps_block() {
            let mut mask = gray_image(12, 12, 0);
            for y in 2..9 {
                for x in 2..9 {
                    mask.put_pixel(x, y, Luma([255]));
                }
            }
            mask.put_pixel(11, 11, Luma([255]));

            let result = open_mask(&mask, 1.0);
            assert_eq!(result.get_pixel(11, 11)[0], 0);
            assert_eq!(result.get_pixel(5, 5)[0], 255);
        }
    }

    mod refine_matte {
        use super::*;

        #[test]
        fn disabled_returns_input() {
            let mut matte = gray_image(3, 3, 40);
            matte.put_pixel(1, 1, Luma([200]));

            let result = refine_matte(&matte, &MatteRefinement::default());
            assert_eq!(result, matte);
        }

        #[test]
        fn enabled_output_is_binary() {
            let mut matte = gray_image(16, 16, 30);
            for y in 4..12 {
                for x in 4..12 {
                    matte.put_pixel(x, y, Luma([220]));
                }
            }
            let refinement = MatteRefinement {
                enabled: true,
                ..MatteRefinement::default()
            };

            let result = refine_matte(&matte, &refinement);
            assert!(result.pixels().all(|px| px[0] == 0 || px[0] == 255));
            assert_eq!(result.get_pixel(8, 8)[0], 255);
            assert_eq!(result.get_pixel(0, 0)[0], 0);
        }

        mod prop {
            use super::*;
            use proptest::prelude::*;

            proptest! {
                #[test]
                fn dimensions_preserved(
                    w in 1u32..16,
                    h in 1u32..16,
                    value in proptest::num::u8::ANY,
                    enabled in proptest::bool::ANY
                ) {
                    let matte = gray_image(w, h, value);
                    let refinement = MatteRefinement { enabled, ..MatteRefinement::default() };
                    prop_assert_eq!(refine_matte(&matte, &refinement).dimensions(), (w, h));
                }
            }
        }
    }
}
