use ndarray::Array2;

use super::{object_label, Observations};
use crate::labeling::LabeledMask;

/// Per-object statistics of a spectral-index image: mean, median and
/// standard deviation over the pixels of each labeled object. Observation
/// names carry the index name so several indices can coexist in one run.
pub fn analyze_spectral_index(
    index_img: &Array2<f32>,
    labeled_mask: &LabeledMask,
    n_labels: usize,
    label: &str,
    index_name: &str,
    observations: &mut Observations,
) {
    let index_key = format!("index_{}", index_name);

    for id in 1..=n_labels {
        let object = id as u32;
        let mut values: Vec<f64> = Vec::new();
        for y in 0..labeled_mask.height() {
            for x in 0..labeled_mask.width() {
                if labeled_mask.label(x, y) == object {
                    values.push(index_img[[y as usize, x as usize]] as f64);
                }
            }
        }
        if values.is_empty() {
            continue;
        }

        let mean = values.iter().sum::<f64>() / values.len() as f64;
        let variance =
            values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / values.len() as f64;

        values.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let mid = values.len() / 2;
        let median = if values.len() % 2 == 0 {
            (values[mid - 1] + values[mid]) / 2.0
        } else {
            values[mid]
        };

        let name = object_label(label, id);
        observations.add(&name, &format!("mean_{}", index_key), mean);
        observations.add(&name, &format!("med_{}", index_key), median);
        observations.add(&name, &format!("std_{}", index_key), variance.sqrt());
    }
}
