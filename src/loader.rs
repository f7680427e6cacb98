use anyhow::Result;
use ndarray::{Array3, Axis};
use std::path::Path;

use crate::calibration::CameraCalibration;
use crate::settings::Settings;
use crate::spectral::{SourceDtype, SpectralArray};

/// Loads and prepares the hyper- or multispectral image named by the
/// settings.
///
/// `inputImage` must point at an ENVI `.hdr` header; anything else makes
/// processing impossible and returns `Ok(None)` after a warning, which the
/// caller treats as "abort this execution". A missing calibration artifact
/// for a requested lens angle is a configuration error and fails the run.
pub fn prepare_spectral_data(settings: &Settings) -> Result<Option<SpectralArray>> {
    let img_file = Path::new(&settings.input_image);
    let image_options = settings.image_options();

    let lens_angle = image_options.lens_angle;
    let dark_normalize = image_options.normalize;

    // The binary cube sits next to the header, named without the .hdr
    // suffix.
    if img_file.extension().map(|e| e.to_ascii_lowercase()) != Some("hdr".into()) {
        warn!("No header file provided. Processing not possible.");
        return Ok(None);
    }
    let cube_file = img_file.with_extension("");

    let mut spectral_data = SpectralArray::read_envi(&cube_file)?;

    // 8-bit storage is rescaled into the unit range expected by the
    // downstream threshold and index math.
    if spectral_data.d_type == SourceDtype::U8 {
        spectral_data.array_data.mapv_inplace(|v| v / 255.0);
    }

    if dark_normalize {
        dark_normalize_array_data(&mut spectral_data.array_data);
    }

    // Only undistort if an angle is selected.
    if lens_angle != 0 {
        let calibration = CameraCalibration::load_for_angle(lens_angle)?;
        spectral_data.array_data = calibration.undistort_cube(&spectral_data.array_data);
        spectral_data.pseudo_rgb = calibration.undistort_rgb(&spectral_data.pseudo_rgb);
    }

    Ok(Some(spectral_data))
}

/// Dark normalization with a reference derived from the cube itself: each
/// band's minimum stands in for the sensor dark level and is subtracted,
/// clamped at zero.
fn dark_normalize_array_data(cube: &mut Array3<f32>) {
    for mut band in cube.axis_iter_mut(Axis(2)) {
        let dark = band.iter().copied().fold(f32::INFINITY, f32::min);
        if dark.is_finite() && dark > 0.0 {
            band.mapv_inplace(|v| (v - dark).max(0.0));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    fn fixture_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("phenoflow-loader-{}-{}", tag, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    // 2x2x3 u8 cube, BIL interleave, bands at 670/550/800 nm.
    fn write_u8_cube(dir: &PathBuf) -> PathBuf {
        let base = dir.join("scan_007");
        let header = "ENVI\nsamples = 2\nlines = 2\nbands = 3\ndata type = 1\ninterleave = bil\nbyte order = 0\nwavelength = {670.0, 550.0, 800.0}\n";
        std::fs::write(base.with_extension("hdr"), header).unwrap();

        let mut raw: Vec<u8> = Vec::new();
        // line 0: band 0 samples, band 1 samples, band 2 samples
        raw.extend_from_slice(&[10, 20, 30, 40, 50, 60]);
        raw.extend_from_slice(&[70, 80, 90, 100, 110, 120]);
        let mut f = std::fs::File::create(&base).unwrap();
        f.write_all(&raw).unwrap();
        base
    }

    fn settings_for(base: &PathBuf, lens_angle: u32, normalize: bool) -> Settings {
        let mut settings = Settings::default();
        settings.input_image = base.with_extension("hdr").to_string_lossy().into_owned();
        settings.experiment_settings.image_options.lens_angle = lens_angle;
        settings.experiment_settings.image_options.normalize = normalize;
        settings
    }

    #[test]
    fn non_header_input_is_a_sentinel_not_an_error() {
        let mut settings = Settings::default();
        settings.input_image = "/data/scan_007.png".to_owned();
        assert!(prepare_spectral_data(&settings).unwrap().is_none());
    }

    #[test]
    fn u8_cube_is_rescaled_to_unit_range() {
        let dir = fixture_dir("rescale");
        let base = write_u8_cube(&dir);
        let spectral = prepare_spectral_data(&settings_for(&base, 0, false))
            .unwrap()
            .unwrap();
        assert_eq!(spectral.d_type, SourceDtype::U8);
        let max = spectral.array_data.iter().fold(0.0_f32, |a, v| a.max(*v));
        let min = spectral.array_data.iter().fold(1.0_f32, |a, v| a.min(*v));
        assert!(max <= 1.0);
        assert!(min >= 0.0);
        // first sample of band 0 was 10
        assert!((spectral.array_data[[0, 0, 0]] - 10.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn dark_normalization_zeroes_each_band_floor() {
        let dir = fixture_dir("dark");
        let base = write_u8_cube(&dir);
        let spectral = prepare_spectral_data(&settings_for(&base, 0, true))
            .unwrap()
            .unwrap();
        for b in 0..3 {
            let band = spectral.array_data.index_axis(Axis(2), b);
            let min = band.iter().copied().fold(f32::INFINITY, f32::min);
            assert_eq!(min, 0.0);
        }
    }

    #[test]
    fn missing_calibration_artifact_is_fatal() {
        let dir = fixture_dir("calib");
        let base = write_u8_cube(&dir);
        // no calibration_data/977_calibration_data.yml exists
        assert!(prepare_spectral_data(&settings_for(&base, 977, false)).is_err());
    }
}
