use image::{GrayImage, Luma, Rgb, RgbImage};
use itertools::iproduct;
use ndarray::ArrayView2;

pub const MASK_FOREGROUND: u8 = 255;

/// Applies a single global threshold to a float band, producing a binary
/// mask with one foreground value.
pub fn threshold_band(band: &ArrayView2<f32>, threshold: f64) -> GrayImage {
    let (height, width) = (band.shape()[0], band.shape()[1]);
    let mut mask = GrayImage::new(width as u32, height as u32);
    iproduct!(0..height, 0..width).for_each(|(y, x)| {
        if band[[y, x]] as f64 > threshold {
            mask.put_pixel(x as u32, y as u32, Luma([MASK_FOREGROUND]));
        }
    });
    mask
}

/// Blends a highlight color into one pixel of an annotation image.
pub fn tint_pixel(img: &mut RgbImage, x: u32, y: u32, color: Rgb<u8>) {
    let px = img.get_pixel_mut(x, y);
    for c in 0..3 {
        px.0[c] = ((px.0[c] as u16 + color.0[c] as u16) / 2) as u8;
    }
}
