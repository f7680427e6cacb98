use anyhow::{anyhow, bail, Context, Result};
use image::RgbImage;
use itertools::iproduct;
use ndarray::{Array3, ArrayView2, Axis};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Storage dtype of the cube as declared by the ENVI header. Only the
/// formats produced by the supported cameras are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceDtype {
    U8,
    U16,
    F32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Interleave {
    Bsq,
    Bil,
    Bip,
}

/// In-memory hyperspectral cube (height x width x band) plus the derived
/// pseudo-RGB preview and the wavelength-to-band lookup.
#[derive(Debug, Clone)]
pub struct SpectralArray {
    pub array_data: Array3<f32>,
    pub pseudo_rgb: RgbImage,
    pub wavelengths: Vec<f64>,
    pub wavelength_dict: BTreeMap<i64, usize>,
    pub d_type: SourceDtype,
    pub filename: String,
}

impl SpectralArray {
    pub fn new(
        array_data: Array3<f32>,
        wavelengths: Vec<f64>,
        d_type: SourceDtype,
        filename: &str,
    ) -> Result<Self> {
        if array_data.shape()[2] != wavelengths.len() {
            bail!(
                "Cube has {} bands but header lists {} wavelengths",
                array_data.shape()[2],
                wavelengths.len()
            );
        }
        let wavelength_dict = wavelengths
            .iter()
            .enumerate()
            .map(|(band, wl)| (wl.round() as i64, band))
            .collect();
        let pseudo_rgb = render_pseudo_rgb(&array_data, &wavelengths);
        Ok(Self {
            array_data,
            pseudo_rgb,
            wavelengths,
            wavelength_dict,
            d_type,
            filename: filename.to_owned(),
        })
    }

    /// Reads an ENVI image pair: `<base>.hdr` text header and `<base>` raw
    /// binary cube.
    pub fn read_envi<P: AsRef<Path>>(base: P) -> Result<Self> {
        let base = base.as_ref();
        let header_path = base.with_extension("hdr");
        let header_text = fs::read_to_string(&header_path)
            .with_context(|| format!("Failed to read ENVI header {:?}", header_path))?;
        let header = EnviHeader::parse(&header_text)?;

        let raw = fs::read(base).with_context(|| format!("Failed to read ENVI cube {:?}", base))?;
        let array_data = decode_cube(&raw, &header)?;

        Self::new(
            array_data,
            header.wavelengths,
            header.d_type,
            base.to_string_lossy().as_ref(),
        )
    }

    pub fn height(&self) -> usize {
        self.array_data.shape()[0]
    }

    pub fn width(&self) -> usize {
        self.array_data.shape()[1]
    }

    pub fn bands(&self) -> usize {
        self.array_data.shape()[2]
    }

    pub fn band(&self, index: usize) -> ArrayView2<'_, f32> {
        self.array_data.index_axis(Axis(2), index)
    }

    /// Band index for an exact (integer-rounded) wavelength, as selected by
    /// the mask wavelength dropdown.
    pub fn band_for_wavelength(&self, wavelength: i64) -> Option<usize> {
        self.wavelength_dict.get(&wavelength).copied()
    }

    /// Band whose wavelength is nearest to the requested one, if within
    /// `max_distance` nanometers. Used by the spectral-index functions.
    pub fn nearest_band(&self, wavelength: f64, max_distance: f64) -> Option<usize> {
        self.wavelengths
            .iter()
            .enumerate()
            .map(|(band, wl)| (band, (wl - wavelength).abs()))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .filter(|(_, distance)| *distance <= max_distance)
            .map(|(band, _)| band)
    }
}

// Nominal preview wavelengths, nearest available band wins.
const PSEUDO_RED_NM: f64 = 670.0;
const PSEUDO_GREEN_NM: f64 = 540.0;
const PSEUDO_BLUE_NM: f64 = 480.0;

fn nearest_band_unbounded(wavelengths: &[f64], target: f64) -> usize {
    wavelengths
        .iter()
        .enumerate()
        .min_by(|a, b| (a.1 - target).abs().total_cmp(&(b.1 - target).abs()))
        .map(|(band, _)| band)
        .unwrap_or(0)
}

fn render_pseudo_rgb(cube: &Array3<f32>, wavelengths: &[f64]) -> RgbImage {
    let (height, width, bands) = (cube.shape()[0], cube.shape()[1], cube.shape()[2]);

    let (r_band, g_band, b_band) = if bands >= 3 {
        (
            nearest_band_unbounded(wavelengths, PSEUDO_RED_NM),
            nearest_band_unbounded(wavelengths, PSEUDO_GREEN_NM),
            nearest_band_unbounded(wavelengths, PSEUDO_BLUE_NM),
        )
    } else {
        (0, 0, 0)
    };

    let max_value = cube.iter().fold(0.0_f32, |acc, v| acc.max(*v));
    let scale = if max_value > 0.0 { 255.0 / max_value } else { 0.0 };

    let mut rgb = RgbImage::new(width as u32, height as u32);
    iproduct!(0..height, 0..width).for_each(|(y, x)| {
        let px = image::Rgb([
            (cube[[y, x, r_band]] * scale) as u8,
            (cube[[y, x, g_band]] * scale) as u8,
            (cube[[y, x, b_band]] * scale) as u8,
        ]);
        rgb.put_pixel(x as u32, y as u32, px);
    });
    rgb
}

struct EnviHeader {
    samples: usize,
    lines: usize,
    bands: usize,
    d_type: SourceDtype,
    interleave: Interleave,
    wavelengths: Vec<f64>,
}

impl EnviHeader {
    fn parse(text: &str) -> Result<Self> {
        let mut fields: BTreeMap<String, String> = BTreeMap::new();

        // Header entries are `key = value`; brace-delimited values may span
        // multiple lines.
        let mut pending_key: Option<String> = None;
        let mut pending_value = String::new();
        for line in text.lines() {
            if let Some(key) = &pending_key {
                pending_value.push(' ');
                pending_value.push_str(line.trim());
                if line.contains('}') {
                    fields.insert(key.clone(), pending_value.trim().to_owned());
                    pending_key = None;
                    pending_value.clear();
                }
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                let key = key.trim().to_ascii_lowercase();
                let value = value.trim();
                if value.contains('{') && !value.contains('}') {
                    pending_key = Some(key);
                    pending_value = value.to_owned();
                } else {
                    fields.insert(key, value.to_owned());
                }
            }
        }

        let required = |key: &str| -> Result<&String> {
            fields
                .get(key)
                .ok_or_else(|| anyhow!("ENVI header is missing the '{}' field", key))
        };

        let samples: usize = required("samples")?.parse()?;
        let lines: usize = required("lines")?.parse()?;
        let bands: usize = required("bands")?.parse()?;

        let d_type = match required("data type")?.as_str() {
            "1" => SourceDtype::U8,
            "4" => SourceDtype::F32,
            "12" => SourceDtype::U16,
            other => bail!("Unsupported ENVI data type {}", other),
        };

        let interleave = match required("interleave")?.to_ascii_lowercase().as_str() {
            "bsq" => Interleave::Bsq,
            "bil" => Interleave::Bil,
            "bip" => Interleave::Bip,
            other => bail!("Unsupported ENVI interleave {}", other),
        };

        if let Some(order) = fields.get("byte order") {
            if order.trim() != "0" {
                bail!("Only little-endian (byte order = 0) ENVI cubes are supported");
            }
        }

        let wavelengths = match fields.get("wavelength") {
            Some(raw) => raw
                .trim_start_matches('{')
                .trim_end_matches('}')
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| s.parse::<f64>().context("Invalid wavelength entry"))
                .collect::<Result<Vec<f64>>>()?,
            // Band numbers stand in when no wavelength list is declared.
            None => (0..bands).map(|b| b as f64).collect(),
        };
        if wavelengths.len() != bands {
            bail!(
                "ENVI header declares {} bands but {} wavelengths",
                bands,
                wavelengths.len()
            );
        }

        Ok(Self {
            samples,
            lines,
            bands,
            d_type,
            interleave,
            wavelengths,
        })
    }
}

fn decode_cube(raw: &[u8], header: &EnviHeader) -> Result<Array3<f32>> {
    let (samples, lines, bands) = (header.samples, header.lines, header.bands);
    let value_count = samples * lines * bands;
    let value_size = match header.d_type {
        SourceDtype::U8 => 1,
        SourceDtype::U16 => 2,
        SourceDtype::F32 => 4,
    };
    if raw.len() < value_count * value_size {
        bail!(
            "ENVI cube is truncated: expected {} bytes, found {}",
            value_count * value_size,
            raw.len()
        );
    }

    let read_value = |index: usize| -> f32 {
        match header.d_type {
            SourceDtype::U8 => raw[index] as f32,
            SourceDtype::U16 => {
                let at = index * 2;
                u16::from_le_bytes([raw[at], raw[at + 1]]) as f32
            }
            SourceDtype::F32 => {
                let at = index * 4;
                f32::from_le_bytes([raw[at], raw[at + 1], raw[at + 2], raw[at + 3]])
            }
        }
    };

    let mut cube = Array3::zeros((lines, samples, bands));
    iproduct!(0..lines, 0..samples, 0..bands).for_each(|(y, x, b)| {
        let index = match header.interleave {
            Interleave::Bsq => b * lines * samples + y * samples + x,
            Interleave::Bil => y * bands * samples + b * samples + x,
            Interleave::Bip => y * samples * bands + x * bands + b,
        };
        cube[[y, x, b]] = read_value(index);
    });
    Ok(cube)
}
