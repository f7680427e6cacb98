use anyhow::{bail, Context, Result};
use image::RgbImage;
use ndarray::{Array2, Array3, Axis};
use rayon::prelude::*;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// One calibration artifact exists on disk per supported lens angle. A
/// missing artifact for a requested angle is a configuration error, not
/// something to recover from.
pub fn calibration_file_for_angle(lens_angle: u32) -> PathBuf {
    PathBuf::from(format!(
        "calibration_data/{}_calibration_data.yml",
        lens_angle
    ))
}

#[derive(Debug, Deserialize)]
struct MatrixEntry {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct CalibrationFile {
    camera_matrix: MatrixEntry,
    distortion_coefficients: MatrixEntry,
}

/// Pinhole intrinsics plus Brown-Conrady distortion coefficients
/// (k1, k2, p1, p2, k3), as produced by the camera calibration tooling.
#[derive(Debug, Clone, Copy)]
pub struct CameraCalibration {
    pub fx: f64,
    pub fy: f64,
    pub cx: f64,
    pub cy: f64,
    pub distortion: [f64; 5],
}

impl CameraCalibration {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref()).with_context(|| {
            format!("Failed to read calibration artifact {:?}", path.as_ref())
        })?;
        let file: CalibrationFile =
            serde_yaml::from_str(&text).context("Failed to parse calibration artifact")?;

        let m = &file.camera_matrix;
        if m.rows != 3 || m.cols != 3 || m.data.len() != 9 {
            bail!("Calibration camera matrix must be 3x3");
        }
        let d = &file.distortion_coefficients;
        if d.rows * d.cols != 5 || d.data.len() != 5 {
            bail!("Calibration must carry 5 distortion coefficients");
        }

        Ok(Self {
            fx: m.data[0],
            cx: m.data[2],
            fy: m.data[4],
            cy: m.data[5],
            distortion: [d.data[0], d.data[1], d.data[2], d.data[3], d.data[4]],
        })
    }

    pub fn load_for_angle(lens_angle: u32) -> Result<Self> {
        Self::load(calibration_file_for_angle(lens_angle))
    }

    /// Source-pixel coordinate feeding each destination pixel of the
    /// undistorted image: normalize, apply the forward distortion model,
    /// project back. One table serves every band of a cube.
    fn remap_table(&self, width: usize, height: usize) -> Vec<(f32, f32)> {
        let [k1, k2, p1, p2, k3] = self.distortion;
        let mut table = Vec::with_capacity(width * height);
        for v in 0..height {
            for u in 0..width {
                let x = (u as f64 - self.cx) / self.fx;
                let y = (v as f64 - self.cy) / self.fy;
                let r2 = x * x + y * y;
                let radial = 1.0 + k1 * r2 + k2 * r2 * r2 + k3 * r2 * r2 * r2;
                let x_d = x * radial + 2.0 * p1 * x * y + p2 * (r2 + 2.0 * x * x);
                let y_d = y * radial + p1 * (r2 + 2.0 * y * y) + 2.0 * p2 * x * y;
                table.push((
                    (self.fx * x_d + self.cx) as f32,
                    (self.fy * y_d + self.cy) as f32,
                ));
            }
        }
        table
    }

    /// Removes lens distortion from a full cube, band-parallel.
    pub fn undistort_cube(&self, cube: &Array3<f32>) -> Array3<f32> {
        let (height, width, bands) = (cube.shape()[0], cube.shape()[1], cube.shape()[2]);
        let table = self.remap_table(width, height);

        let remapped: Vec<Array2<f32>> = (0..bands)
            .into_par_iter()
            .map(|b| {
                let band = cube.index_axis(Axis(2), b);
                let mut out = Array2::zeros((height, width));
                for y in 0..height {
                    for x in 0..width {
                        let (src_x, src_y) = table[y * width + x];
                        out[[y, x]] = sample_bilinear(&band, src_x, src_y);
                    }
                }
                out
            })
            .collect();

        let mut out = Array3::zeros((height, width, bands));
        for (b, band) in remapped.into_iter().enumerate() {
            out.index_axis_mut(Axis(2), b).assign(&band);
        }
        out
    }

    /// Same remap applied to the pseudo-RGB preview image.
    pub fn undistort_rgb(&self, img: &RgbImage) -> RgbImage {
        let (width, height) = (img.width() as usize, img.height() as usize);
        let table = self.remap_table(width, height);

        let mut out = RgbImage::new(width as u32, height as u32);
        for y in 0..height {
            for x in 0..width {
                let (src_x, src_y) = table[y * width + x];
                let px = if src_x >= 0.0
                    && src_y >= 0.0
                    && (src_x as u32) < img.width()
                    && (src_y as u32) < img.height()
                {
                    *img.get_pixel(src_x as u32, src_y as u32)
                } else {
                    image::Rgb([0, 0, 0])
                };
                out.put_pixel(x as u32, y as u32, px);
            }
        }
        out
    }
}

fn sample_bilinear(band: &ndarray::ArrayView2<f32>, x: f32, y: f32) -> f32 {
    let (height, width) = (band.shape()[0], band.shape()[1]);
    if x < 0.0 || y < 0.0 || x > (width - 1) as f32 || y > (height - 1) as f32 {
        return 0.0;
    }
    let x0 = x.floor() as usize;
    let y0 = y.floor() as usize;
    let x1 = (x0 + 1).min(width - 1);
    let y1 = (y0 + 1).min(height - 1);
    let tx = x - x0 as f32;
    let ty = y - y0 as f32;

    let top = band[[y0, x0]] * (1.0 - tx) + band[[y0, x1]] * tx;
    let bottom = band[[y1, x0]] * (1.0 - tx) + band[[y1, x1]] * tx;
    top * (1.0 - ty) + bottom * ty
}
