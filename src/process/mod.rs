use anyhow::{anyhow, Result};
use serde::Serialize;
use serde_json::json;
use std::path::Path;

use crate::analysis::{analyze_size, analyze_spectral_index, object_label, Observations};
use crate::feedback::{FeedbackMessage, FeedbackSink};
use crate::indices::find_index;
use crate::labeling::{create_labels, RoiType};
use crate::mask::{MaskProvider, WavelengthThresholdMask};
use crate::roi::translate_rois;
use crate::settings::Settings;

/// Wavelength tolerance (nm) when resolving index formula bands against the
/// cube's band list.
const INDEX_BAND_DISTANCE: f64 = 10.0;

const OBJECT_LABEL: &str = "plant";

/// One entry of the results payload, per analyzed object. Statistics the
/// current run did not produce serialize as null.
#[derive(Debug, Serialize)]
struct RoiRecord {
    roi: usize,
    area: Option<f64>,
    width: Option<f64>,
    height: Option<f64>,
    perimeter: Option<f64>,
    index: String,
    mean: Option<f64>,
    median: Option<f64>,
    std: Option<f64>,
    plot_value: Option<f64>,
}

/// Runs one analysis execution: mask, ROIs, labeling, the configured
/// analyses, preview image, results. Posts three messages to the feedback
/// queue along the way.
///
/// A caller-supplied mask provider replaces the built-in wavelength
/// threshold; `None` selects the internal mask.
pub fn execute(
    feedback_queue: &dyn FeedbackSink,
    script_name: &str,
    settings: &Settings,
    mask_provider: Option<&dyn MaskProvider>,
) -> Result<()> {
    info!("Execute: {}", script_name);

    let out_folder = &settings.output_folder;
    let roi_items = settings.roi_items();
    let script_options = settings.script_options();

    let value_custom_dropdown_script = &script_options.custom_dropdown_script;
    let value_dynamic_dropdown_script = &script_options.dynamic_dropdown_script;
    let value_example_checkbox_script = script_options.example_checkbox_script;

    let plot_selection = &settings.chart_options().plot_selection;

    // Determine the mask workflow for this execution.
    let internal = WavelengthThresholdMask;
    let create_function: &dyn MaskProvider = match mask_provider {
        Some(provider) => {
            info!("External mask provider used");
            provider
        }
        None => {
            info!("Internal mask used");
            &internal
        }
    };

    info!("Starting workflow");

    let (spectral_array, mask) = match create_function.create_mask(settings, false)? {
        Some(prepared) => prepared,
        None => {
            warn!("No spectral data available. Aborting this execution");
            return Ok(());
        }
    };

    let filename = spectral_array.filename.clone();
    let image_name = Path::new(&filename)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| filename.clone());

    // Signal which file is processed.
    feedback_queue.post(FeedbackMessage::Processing {
        script_name: script_name.to_owned(),
        filename: filename.clone(),
    });

    // Unaltered pseudo-RGB copies for plotting results onto later.
    let mut img_plant_labelled = spectral_array.pseudo_rgb.clone();
    let img_roi_labelled = spectral_array.pseudo_rgb.clone();

    // Process the ROI items forwarded from the UI.
    let rois = translate_rois(roi_items, &img_roi_labelled);

    // Identify objects in the ROIs.
    let (labeled_objects, n_obj) = create_labels(&mask, &rois, RoiType::Partial);

    let mut observations = Observations::default();

    if value_example_checkbox_script {
        // Analyze the spectral index selected via the dynamic dropdown.
        let index = find_index(value_dynamic_dropdown_script).ok_or_else(|| {
            anyhow!(
                "Unknown spectral index '{}' selected",
                value_dynamic_dropdown_script
            )
        })?;
        let index_array = index.compute(&spectral_array, INDEX_BAND_DISTANCE)?;
        analyze_spectral_index(
            &index_array,
            &labeled_objects,
            n_obj,
            OBJECT_LABEL,
            index.name,
            &mut observations,
        );
    }

    if value_custom_dropdown_script == "shape" {
        analyze_size(
            &mut img_plant_labelled,
            &labeled_objects,
            n_obj,
            OBJECT_LABEL,
            &mut observations,
        );
    }

    // Write the preview image.
    let image_file_name = Path::new(out_folder)
        .join("ProcessedImages")
        .join(format!("{}.png", image_name));
    if let Some(path) = image_file_name.parent() {
        if !path.exists() {
            std::fs::create_dir_all(path)?;
            info!("created folder {}", path.display());
        }
    }
    info!("Writing image to {}", image_file_name.display());
    img_plant_labelled.save(&image_file_name)?;

    let image_file_name = image_file_name.to_string_lossy().into_owned();
    feedback_queue.post(FeedbackMessage::Preview {
        script_name: script_name.to_owned(),
        image_file_name: image_file_name.clone(),
    });

    info!("Workflow done");

    // Project the observations into the results payload.
    let index_key = format!("index_{}", value_dynamic_dropdown_script);
    let selected_key = if plot_selection == "plot_index" {
        format!("mean_{}", index_key)
    } else {
        plot_selection.clone()
    };

    let mut results_list: Vec<RoiRecord> = Vec::new();
    for i in 1..=n_obj {
        let label = object_label(OBJECT_LABEL, i);
        // Objects the analyses never saw are omitted, not errored.
        if !observations.contains_label(&label) {
            continue;
        }
        results_list.push(RoiRecord {
            roi: i,
            area: observations.get(&label, "area"),
            width: observations.get(&label, "width"),
            height: observations.get(&label, "height"),
            perimeter: observations.get(&label, "perimeter"),
            index: value_dynamic_dropdown_script.clone(),
            mean: observations.get(&label, &format!("mean_{}", index_key)),
            median: observations.get(&label, &format!("med_{}", index_key)),
            std: observations.get(&label, &format!("std_{}", index_key)),
            plot_value: observations.get(&label, &selected_key),
        });
    }

    let signal = json!({
        "imageFileName": image_file_name,
        "dict": { "rois": results_list },
    });
    feedback_queue.post(FeedbackMessage::Results {
        script_name: script_name.to_owned(),
        signal,
    });

    Ok(())
}
