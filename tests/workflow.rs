use std::io::Write;
use std::path::PathBuf;
use std::sync::mpsc;

use phenoflow::feedback::FeedbackMessage;
use phenoflow::{execute, Settings};

fn fixture_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "phenoflow-workflow-{}-{}",
        tag,
        std::process::id()
    ));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// 6x6 cube with bands at 670 and 800 nm (f32, BIP). One 3x3 plant patch
/// with its top-left corner at (1,1): dark in the red band, bright in the
/// near infrared.
fn write_plant_cube(dir: &PathBuf) -> PathBuf {
    let base = dir.join("plant_scan");
    let header = "ENVI\nsamples = 6\nlines = 6\nbands = 2\ndata type = 4\ninterleave = bip\nbyte order = 0\nwavelength = {670.0, 800.0}\n";
    std::fs::write(base.with_extension("hdr"), header).unwrap();

    let mut raw: Vec<u8> = Vec::new();
    for y in 0..6u32 {
        for x in 0..6u32 {
            let plant = (1..4).contains(&x) && (1..4).contains(&y);
            let red: f32 = if plant { 0.1 } else { 0.4 };
            let nir: f32 = if plant { 0.9 } else { 0.4 };
            raw.extend_from_slice(&red.to_le_bytes());
            raw.extend_from_slice(&nir.to_le_bytes());
        }
    }
    let mut f = std::fs::File::create(&base).unwrap();
    f.write_all(&raw).unwrap();
    base
}

fn settings_for(dir: &PathBuf, base: &PathBuf) -> Settings {
    let mut settings = Settings::default();
    settings.input_image = base.with_extension("hdr").to_string_lossy().into_owned();
    settings.output_folder = dir.to_string_lossy().into_owned();
    settings.output_image = dir.join("mask.png").to_string_lossy().into_owned();

    // mask: threshold the NIR band so only the plant patch survives
    let mask = &mut settings.experiment_settings.analysis.mask_options;
    mask.wavelength_mask = "800".to_owned();
    mask.example_thresh_mask = 0.5;

    // one rectangular ROI fully covering the patch (center 2.5,2.5 size 4x4)
    settings.experiment_settings.roi_info.roi_items =
        vec![("Rectangle".to_owned(), 2.5, 2.5, 4.0, 4.0)];

    let script = &mut settings.experiment_settings.script_options.general;
    script.custom_dropdown_script = "shape".to_owned();
    script.dynamic_dropdown_script = "ndvi".to_owned();
    script.example_checkbox_script = false;

    settings
        .experiment_settings
        .analysis
        .chart_options
        .plot_selection = "area".to_owned();
    settings
}

fn run(settings: &Settings) -> Vec<FeedbackMessage> {
    let (tx, rx) = mpsc::channel();
    execute(&tx, "template_analysis", settings, None).unwrap();
    drop(tx);
    rx.iter().collect()
}

#[test]
fn shape_analysis_run_emits_three_messages_and_one_roi_record() {
    let dir = fixture_dir("shape");
    let base = write_plant_cube(&dir);
    let settings = settings_for(&dir, &base);

    let messages = run(&settings);
    assert_eq!(messages.len(), 3);

    // processing announcement comes first and names the source file
    let processing = messages[0].to_payload();
    assert_eq!(processing[0], "template_analysis");
    assert!(processing[1]
        .as_str()
        .unwrap()
        .starts_with("Processing: "));

    // preview message carries a path that was actually written
    let preview = messages[1].to_payload();
    assert_eq!(preview[1], "preview");
    let preview_path = PathBuf::from(preview[2].as_str().unwrap());
    assert!(preview_path.exists());
    assert!(preview_path
        .to_string_lossy()
        .contains("ProcessedImages"));

    // results payload: exactly one object, claimed by ROI 1
    let results = messages[2].to_payload();
    assert_eq!(results[1], "results");
    let signal = &results[2];
    assert_eq!(signal["imageFileName"], preview[2]);
    let rois = signal["dict"]["rois"].as_array().unwrap();
    assert_eq!(rois.len(), 1);

    let record = &rois[0];
    assert_eq!(record["roi"], 1);
    assert_eq!(record["area"], 9.0);
    assert_eq!(record["width"], 3.0);
    assert_eq!(record["height"], 3.0);
    assert_eq!(record["perimeter"], 8.0);
    assert_eq!(record["plot_value"], 9.0);
    // the spectral-index analysis did not run
    assert!(record["mean"].is_null());
    assert!(record["median"].is_null());
    assert!(record["std"].is_null());
}

#[test]
fn index_analysis_populates_spectral_statistics() {
    let dir = fixture_dir("index");
    let base = write_plant_cube(&dir);
    let mut settings = settings_for(&dir, &base);
    settings
        .experiment_settings
        .script_options
        .general
        .example_checkbox_script = true;
    settings
        .experiment_settings
        .analysis
        .chart_options
        .plot_selection = "plot_index".to_owned();

    let messages = run(&settings);
    let results = messages[2].to_payload();
    let record = &results[2]["dict"]["rois"][0];

    assert_eq!(record["index"], "ndvi");
    // NDVI of the uniform patch: (0.9 - 0.1) / (0.9 + 0.1) = 0.8
    let mean = record["mean"].as_f64().unwrap();
    assert!((mean - 0.8).abs() < 1e-5);
    let median = record["median"].as_f64().unwrap();
    assert!((median - 0.8).abs() < 1e-5);
    assert!(record["std"].as_f64().unwrap() < 1e-5);
    // plot_index selects the index mean as the plotted value
    assert_eq!(record["plot_value"], record["mean"]);
}

#[test]
fn missing_header_aborts_without_messages() {
    let dir = fixture_dir("abort");
    let mut settings = Settings::default();
    settings.input_image = dir.join("scan.png").to_string_lossy().into_owned();
    settings.output_folder = dir.to_string_lossy().into_owned();

    let (tx, rx) = mpsc::channel();
    execute(&tx, "template_analysis", &settings, None).unwrap();
    drop(tx);
    assert_eq!(rx.iter().count(), 0);
}
