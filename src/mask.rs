use anyhow::{anyhow, Result};
use image::GrayImage;
use std::path::Path;

use crate::imageutil::threshold_band;
use crate::loader::prepare_spectral_data;
use crate::settings::Settings;
use crate::spectral::SpectralArray;

/// The mask-building step is the customization point of the workflow: any
/// provider with this capability can be selected for an execution in place
/// of the built-in wavelength threshold.
pub trait MaskProvider {
    /// Returns the prepared spectral array and the binary mask, or `None`
    /// when the input cannot be processed at all (missing header file).
    /// `mask_preview` writes the mask to the settings-provided output path
    /// for display in the UI's mask dialog.
    fn create_mask(
        &self,
        settings: &Settings,
        mask_preview: bool,
    ) -> Result<Option<(SpectralArray, GrayImage)>>;
}

/// Built-in mask workflow: select one wavelength band and apply a single
/// global threshold.
pub struct WavelengthThresholdMask;

impl MaskProvider for WavelengthThresholdMask {
    fn create_mask(
        &self,
        settings: &Settings,
        mask_preview: bool,
    ) -> Result<Option<(SpectralArray, GrayImage)>> {
        let mask_options = settings.mask_options();
        let value_wavelength_mask = &mask_options.wavelength_mask;
        let value_example_thresh_mask = mask_options.example_thresh_mask;

        let spectral_array = match prepare_spectral_data(settings)? {
            Some(spectral) => spectral,
            None => return Ok(None),
        };

        // Get data from the selected wavelength band.
        let selected_band = if value_wavelength_mask != "None" && !value_wavelength_mask.is_empty()
        {
            let wavelength: i64 = value_wavelength_mask
                .parse()
                .map_err(|_| anyhow!("Invalid mask wavelength '{}'", value_wavelength_mask))?;
            spectral_array.band_for_wavelength(wavelength).ok_or_else(|| {
                anyhow!(
                    "Wavelength {} nm is not present in {}",
                    wavelength,
                    spectral_array.filename
                )
            })?
        } else {
            warn!("No wavelength for mask selected. Defaulting to first in list");
            0
        };

        let binary_img = threshold_band(
            &spectral_array.band(selected_band),
            value_example_thresh_mask,
        );

        create_mask_preview(&binary_img, settings, mask_preview)?;

        Ok(Some((spectral_array, binary_img)))
    }
}

/// Writes the mask preview image to the settings-provided output path,
/// creating parent directories as needed.
pub fn create_mask_preview(
    mask: &GrayImage,
    settings: &Settings,
    create_preview: bool,
) -> Result<()> {
    if !create_preview {
        return Ok(());
    }
    let image_file_name = Path::new(&settings.output_image);
    if let Some(parent) = image_file_name.parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent)?;
            info!("created folder {}", parent.display());
        }
    }
    info!("Writing image to {}", image_file_name.display());
    mask.save(image_file_name)?;
    Ok(())
}
