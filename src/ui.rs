use crate::indices::{find_index, index_functions};
use crate::settings::Settings;

/// Fills a dynamic dropdown of the external configuration UI.
///
/// For the recognized setting names the registry of available spectral
/// indices is returned as (display names, internal names); anything else
/// yields `None`. The wavelength list is part of the provider contract but
/// the index dropdowns do not depend on it.
pub fn dropdown_values(
    setting: &str,
    _wavelengths: &[f64],
) -> Option<(Vec<String>, Vec<String>)> {
    match setting {
        "index_list" | "value_dynamic_dropdown_mask" => {
            let display_name_list = index_functions()
                .iter()
                .map(|def| def.display_name.to_owned())
                .collect();
            let name_list = index_functions()
                .iter()
                .map(|def| def.name.to_owned())
                .collect();
            Some((display_name_list, name_list))
        }
        _ => None,
    }
}

/// Slider range for a dynamic UI element: (minimum, maximum, steps,
/// default). The index-threshold slider takes its limits from the selected
/// index's declared range with the midpoint as default; everything else
/// gets fixed defaults.
pub fn range_values(setting: &str, name: &str, index: usize) -> (f64, f64, u32, f64) {
    debug!("range_values {} {} {}", setting, name, index);

    // defaults
    let mut value = 0.5;
    let mut minimum = 0.0;
    let mut maximum = 1.0;
    let mut steps = 10;

    if setting == "mask_index" {
        if let Some(def) = find_index(name) {
            minimum = def.min;
            maximum = def.max;
            value = (maximum - minimum) / 2.0 + minimum;
            steps = 500;
            debug!(
                "index settings: min {}, max {}, steps {}, value {}",
                minimum, maximum, steps, value
            );
        } else {
            warn!("Unknown index '{}' for slider range. Using defaults", name);
        }
    }

    (minimum, maximum, steps, value)
}

/// Chart title and y-axis label for the configured plot selection: index
/// plots take the index's display name, generic statistics get a templated
/// title.
pub fn get_display_name_for_chart(settings: &Settings) -> (String, String) {
    let plot_selection = &settings.chart_options().plot_selection;
    let value_dynamic_dropdown_script = &settings.script_options().dynamic_dropdown_script;

    if plot_selection == "plot_index" {
        let title = find_index(value_dynamic_dropdown_script)
            .map(|def| def.display_name.to_owned())
            .unwrap_or_else(|| value_dynamic_dropdown_script.clone());
        (title, "relative index value".to_owned())
    } else {
        (
            format!("Leaf {}", plot_selection),
            format!("Leaf {} [px]", plot_selection),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_dropdown_lists_the_registry() {
        let (display, names) = dropdown_values("index_list", &[]).unwrap();
        assert_eq!(display.len(), names.len());
        assert!(names.contains(&"ndvi".to_owned()));
        assert!(display.iter().any(|d| d.starts_with("NDVI")));
    }

    #[test]
    fn unrecognized_dropdown_setting_returns_none() {
        assert!(dropdown_values("unrelated_setting", &[]).is_none());
    }

    #[test]
    fn range_round_trips_registered_index_range() {
        let def = find_index("savi").unwrap();
        let (minimum, maximum, steps, value) = range_values("mask_index", "savi", 0);
        assert_eq!(minimum, def.min);
        assert_eq!(maximum, def.max);
        assert_eq!(steps, 500);
        assert_eq!(value, (def.max - def.min) / 2.0 + def.min);
    }

    #[test]
    fn unrecognized_range_setting_gets_fixed_defaults() {
        assert_eq!(range_values("other", "ndvi", 3), (0.0, 1.0, 10, 0.5));
    }

    #[test]
    fn chart_title_for_index_plot() {
        let mut settings = Settings::default();
        settings
            .experiment_settings
            .analysis
            .chart_options
            .plot_selection = "plot_index".to_owned();
        settings
            .experiment_settings
            .script_options
            .general
            .dynamic_dropdown_script = "ndvi".to_owned();

        let (title, y_label) = get_display_name_for_chart(&settings);
        assert!(title.starts_with("NDVI"));
        assert_eq!(y_label, "relative index value");
    }

    #[test]
    fn chart_title_for_generic_statistic() {
        let mut settings = Settings::default();
        settings
            .experiment_settings
            .analysis
            .chart_options
            .plot_selection = "area".to_owned();

        let (title, y_label) = get_display_name_for_chart(&settings);
        assert_eq!(title, "Leaf area");
        assert_eq!(y_label, "Leaf area [px]");
    }
}
