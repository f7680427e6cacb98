use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One ROI descriptor as forwarded from the UI: (type, x, y, width, height).
/// Positions refer to the shape center for both supported types.
pub type RoiItem = (String, f64, f64, f64, f64);

#[derive(Debug, Default, Deserialize, Serialize, Clone)]
pub struct RoiInfo {
    #[serde(rename = "roiItems")]
    pub roi_items: Vec<RoiItem>,
}

#[derive(Debug, Default, Deserialize, Serialize, Clone)]
pub struct ImageOptions {
    #[serde(rename = "lensAngle")]
    pub lens_angle: u32,
    pub normalize: bool,
}

/// Masking options. The option names follow the `.conf` file the external
/// UI is driven by, which is why some of them carry the generic
/// `example_`/`custom_` prefixes of the template configuration.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MaskOptions {
    pub wavelength_mask: String,
    pub custom_dropdown_mask: String,
    pub dynamic_dropdown_mask: String,
    pub example_thresh_mask: f64,
    pub example_checkbox_mask: bool,
}

impl Default for MaskOptions {
    fn default() -> Self {
        Self {
            wavelength_mask: String::new(),
            custom_dropdown_mask: String::new(),
            dynamic_dropdown_mask: String::new(),
            example_thresh_mask: 0.5,
            example_checkbox_mask: false,
        }
    }
}

#[derive(Debug, Default, Deserialize, Serialize, Clone)]
pub struct ChartOptions {
    pub plot_selection: String,
}

#[derive(Debug, Default, Deserialize, Serialize, Clone)]
pub struct AnalysisOptions {
    #[serde(rename = "maskOptions")]
    pub mask_options: MaskOptions,
    #[serde(rename = "chartOptions")]
    pub chart_options: ChartOptions,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GeneralScriptOptions {
    pub custom_dropdown_script: String,
    pub dynamic_dropdown_script: String,
    pub example_thresh_script: f64,
    pub example_checkbox_script: bool,
}

impl Default for GeneralScriptOptions {
    fn default() -> Self {
        Self {
            custom_dropdown_script: String::new(),
            dynamic_dropdown_script: String::new(),
            example_thresh_script: 0.5,
            example_checkbox_script: false,
        }
    }
}

#[derive(Debug, Default, Deserialize, Serialize, Clone)]
pub struct ScriptOptions {
    pub general: GeneralScriptOptions,
}

#[derive(Debug, Default, Deserialize, Serialize, Clone)]
pub struct ExperimentSettings {
    #[serde(rename = "roiInfo")]
    pub roi_info: RoiInfo,
    #[serde(rename = "imageOptions")]
    pub image_options: ImageOptions,
    pub analysis: AnalysisOptions,
    #[serde(rename = "scriptOptions")]
    pub script_options: ScriptOptions,
}

/// Settings for one execution, parsed from the nested mapping the external
/// UI emits. Owned by the caller and immutable for the duration of a run.
#[derive(Debug, Default, Deserialize, Serialize, Clone)]
pub struct Settings {
    #[serde(rename = "inputImage")]
    pub input_image: String,
    #[serde(rename = "outputFolder")]
    pub output_folder: String,
    #[serde(rename = "outputImage")]
    pub output_image: String,
    #[serde(rename = "experimentSettings")]
    pub experiment_settings: ExperimentSettings,
}

impl Settings {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse settings mapping")
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read settings file {:?}", path.as_ref()))?;
        Self::from_json_str(&text)
    }

    pub fn mask_options(&self) -> &MaskOptions {
        &self.experiment_settings.analysis.mask_options
    }

    pub fn chart_options(&self) -> &ChartOptions {
        &self.experiment_settings.analysis.chart_options
    }

    pub fn script_options(&self) -> &GeneralScriptOptions {
        &self.experiment_settings.script_options.general
    }

    pub fn image_options(&self) -> &ImageOptions {
        &self.experiment_settings.image_options
    }

    pub fn roi_items(&self) -> &[RoiItem] {
        &self.experiment_settings.roi_info.roi_items
    }
}
