use anyhow::{anyhow, Result};
use ndarray::{Array2, ArrayView2, Zip};

use crate::spectral::SpectralArray;

type IndexFn = fn(&SpectralArray, f64) -> Result<Array2<f32>>;

/// One entry of the spectral-index registry: internal name (as used in
/// settings), display name (as shown in UI dropdowns), the declared value
/// range driving slider limits, and the compute function.
pub struct SpectralIndexDef {
    pub name: &'static str,
    pub display_name: &'static str,
    pub min: f64,
    pub max: f64,
    compute: IndexFn,
}

impl SpectralIndexDef {
    /// Computes the per-pixel index image. `max_distance` bounds how far
    /// (in nm) the nearest available band may be from the nominal
    /// wavelength of the formula.
    pub fn compute(&self, spectral: &SpectralArray, max_distance: f64) -> Result<Array2<f32>> {
        (self.compute)(spectral, max_distance)
    }
}

lazy_static! {
    static ref INDEX_FUNCTIONS: Vec<SpectralIndexDef> = vec![
        SpectralIndexDef {
            name: "ndvi",
            display_name: "NDVI - Normalized Difference Vegetation Index",
            min: -1.0,
            max: 1.0,
            compute: ndvi,
        },
        SpectralIndexDef {
            name: "gndvi",
            display_name: "GNDVI - Green Normalized Difference Vegetation Index",
            min: -1.0,
            max: 1.0,
            compute: gndvi,
        },
        SpectralIndexDef {
            name: "savi",
            display_name: "SAVI - Soil Adjusted Vegetation Index",
            min: -1.2,
            max: 1.2,
            compute: savi,
        },
        SpectralIndexDef {
            name: "psri",
            display_name: "PSRI - Plant Senescence Reflectance Index",
            min: -1.0,
            max: 1.0,
            compute: psri,
        },
        SpectralIndexDef {
            name: "pri",
            display_name: "PRI - Photochemical Reflectance Index",
            min: -1.0,
            max: 1.0,
            compute: pri,
        },
        SpectralIndexDef {
            name: "ci_rededge",
            display_name: "CI Red Edge - Chlorophyll Index Red Edge",
            min: -1.0,
            max: 6.0,
            compute: ci_rededge,
        },
    ];
}

/// The registry of available spectral-index functions, in dropdown order.
pub fn index_functions() -> &'static [SpectralIndexDef] {
    &INDEX_FUNCTIONS
}

pub fn find_index(name: &str) -> Option<&'static SpectralIndexDef> {
    INDEX_FUNCTIONS.iter().find(|def| def.name == name)
}

fn band_at(
    spectral: &SpectralArray,
    wavelength: f64,
    max_distance: f64,
) -> Result<ArrayView2<'_, f32>> {
    spectral
        .nearest_band(wavelength, max_distance)
        .map(|band| spectral.band(band))
        .ok_or_else(|| {
            anyhow!(
                "No band within {} nm of {} nm in {}",
                max_distance,
                wavelength,
                spectral.filename
            )
        })
}

fn safe_ratio(numerator: f32, denominator: f32) -> f32 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

fn normalized_difference(
    spectral: &SpectralArray,
    high_nm: f64,
    low_nm: f64,
    max_distance: f64,
) -> Result<Array2<f32>> {
    let high = band_at(spectral, high_nm, max_distance)?;
    let low = band_at(spectral, low_nm, max_distance)?;
    Ok(Zip::from(&high)
        .and(&low)
        .map_collect(|h, l| safe_ratio(h - l, h + l)))
}

fn ndvi(spectral: &SpectralArray, max_distance: f64) -> Result<Array2<f32>> {
    normalized_difference(spectral, 800.0, 670.0, max_distance)
}

fn gndvi(spectral: &SpectralArray, max_distance: f64) -> Result<Array2<f32>> {
    normalized_difference(spectral, 800.0, 550.0, max_distance)
}

fn savi(spectral: &SpectralArray, max_distance: f64) -> Result<Array2<f32>> {
    let nir = band_at(spectral, 800.0, max_distance)?;
    let red = band_at(spectral, 670.0, max_distance)?;
    Ok(Zip::from(&nir)
        .and(&red)
        .map_collect(|n, r| 1.5 * safe_ratio(n - r, n + r + 0.5)))
}

fn psri(spectral: &SpectralArray, max_distance: f64) -> Result<Array2<f32>> {
    let red = band_at(spectral, 678.0, max_distance)?;
    let blue = band_at(spectral, 500.0, max_distance)?;
    let rededge = band_at(spectral, 750.0, max_distance)?;
    Ok(Zip::from(&red)
        .and(&blue)
        .and(&rededge)
        .map_collect(|r, b, re| safe_ratio(r - b, *re)))
}

fn pri(spectral: &SpectralArray, max_distance: f64) -> Result<Array2<f32>> {
    normalized_difference(spectral, 531.0, 570.0, max_distance)
}

fn ci_rededge(spectral: &SpectralArray, max_distance: f64) -> Result<Array2<f32>> {
    let nir = band_at(spectral, 800.0, max_distance)?;
    let rededge = band_at(spectral, 700.0, max_distance)?;
    Ok(Zip::from(&nir)
        .and(&rededge)
        .map_collect(|n, re| safe_ratio(*n, *re) - 1.0))
}
