use fast_image_resize::{images::Image, FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer};
use image::{imageops, RgbImage};

use crate::error::{Error, Result};

/// Relative difference below which two aspect ratios count as equal
const RATIO_TOLERANCE: f64 = 1e-9;

/// Absorbs float noise before flooring a cropped length
const LENGTH_EPSILON: f64 = 1e-6;

/// Turn a portrait image on its side so it is wider than tall.
///
/// The rotation is a quarter turn counter-clockwise. Square and landscape
/// images are returned unchanged.
pub fn orient_landscape(img: RgbImage) -> RgbImage {
    if img.width() < img.height() {
        imageops::rotate270(&img)
    } else {
        img
    }
}

/// Crop an image to `target_ratio` (width / height) by trimming the longer axis.
///
/// A too-wide image loses columns from the left and right, a too-tall image
/// loses rows from the top and bottom. Only one axis is ever trimmed. When the
/// leftover is odd, the extra pixel comes off the right or bottom edge.
pub fn crop_to_aspect(img: &RgbImage, target_ratio: f64) -> Result<RgbImage> {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return Err(Error::InvalidArgument(format!(
            "Cannot crop an empty {}x{} image",
            width, height
        )));
    }
    if !(target_ratio.is_finite() && target_ratio > 0.0) {
        return Err(Error::InvalidArgument(format!(
            "Invalid target aspect ratio {}",
            target_ratio
        )));
    }

    let current_ratio = width as f64 / height as f64;

    if (current_ratio - target_ratio).abs() <= RATIO_TOLERANCE * target_ratio {
        Ok(img.clone())
    } else if current_ratio > target_ratio {
        // Too wide - crop horizontally
        let new_width = ((height as f64 * target_ratio + LENGTH_EPSILON) as u32).clamp(1, width);
        let left = (width - new_width) / 2;
        crop_image(img, left, 0, new_width, height)
    } else {
        // Too tall - crop vertically
        let new_height = ((width as f64 / target_ratio + LENGTH_EPSILON) as u32).clamp(1, height);
        let top = (height - new_height) / 2;
        crop_image(img, 0, top, width, new_height)
    }
}

/// Crop an image to specified dimensions
fn crop_image(img: &RgbImage, x: u32, y: u32, width: u32, height: u32) -> Result<RgbImage> {
    let (img_width, img_height) = img.dimensions();

    if x + width > img_width || y + height > img_height {
        return Err(Error::InvalidArgument(format!(
            "Crop dimensions exceed image bounds: crop({},{},{}x{}) on {}x{} image",
            x, y, width, height, img_width, img_height
        )));
    }

    Ok(imageops::crop_imm(img, x, y, width, height).to_image())
}

/// Resize an image to exact dimensions with a Lanczos3 convolution
pub fn resize_image(img: &RgbImage, width: u32, height: u32) -> Result<RgbImage> {
    let (src_width, src_height) = img.dimensions();

    if src_width == width && src_height == height {
        return Ok(img.clone());
    }
    if src_width == 0 || src_height == 0 {
        return Err(Error::Resize("Source image is empty".to_string()));
    }
    if width == 0 || height == 0 {
        return Err(Error::Resize(format!(
            "Target size {}x{} is empty",
            width, height
        )));
    }

    let src_image = Image::from_vec_u8(src_width, src_height, img.as_raw().clone(), PixelType::U8x3)
        .map_err(|e| Error::Resize(e.to_string()))?;
    let mut dst_image = Image::new(width, height, PixelType::U8x3);

    let options = ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Lanczos3));
    let mut resizer = Resizer::new();
    resizer
        .resize(&src_image, &mut dst_image, Some(&options))
        .map_err(|e| Error::Resize(e.to_string()))?;

    RgbImage::from_raw(width, height, dst_image.into_vec())
        .ok_or_else(|| Error::Resize("Resized buffer has unexpected length".to_string()))
}

/// Crop to `target_ratio`, then resample to exactly `width` x `height`.
///
/// The ratio is the physical one (e.g. inches) rather than the rounded pixel
/// size, so an image already at that ratio is never cropped.
pub fn crop_and_resize(
    img: &RgbImage,
    target_ratio: f64,
    width: u32,
    height: u32,
) -> Result<RgbImage> {
    if width == 0 || height == 0 {
        return Err(Error::Resize(format!(
            "Target size {}x{} is empty",
            width, height
        )));
    }
    let cropped = crop_to_aspect(img, target_ratio)?;
    resize_image(&cropped, width, height)
}
