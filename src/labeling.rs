use image::{GrayImage, ImageBuffer, Luma};
use imageproc::region_labelling::{connected_components, Connectivity};

use crate::roi::RoiCollection;

/// How objects relate to the ROI that claims them. Objects partially
/// overlapping an ROI are still counted in full.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RoiType {
    #[default]
    Partial,
}

/// Per-pixel object ids. 0 is background; object ids are the 1-based index
/// of the ROI that claimed the object.
pub struct LabeledMask {
    labels: ImageBuffer<Luma<u32>, Vec<u32>>,
}

impl LabeledMask {
    pub fn width(&self) -> u32 {
        self.labels.width()
    }

    pub fn height(&self) -> u32 {
        self.labels.height()
    }

    pub fn label(&self, x: u32, y: u32) -> u32 {
        self.labels.get_pixel(x, y).0[0]
    }
}

/// Labels connected foreground objects by the ROI they fall in.
///
/// Connected components are computed over the whole mask first; a component
/// touching ROI i's area is assigned object id i in its entirety (the
/// partial-overlap policy). A component claimed by an earlier ROI is not
/// relabeled by a later one. Returns the labeled mask and the object count,
/// which equals the ROI count; ROIs with no foreground simply yield no
/// labeled pixels.
pub fn create_labels(
    mask: &GrayImage,
    rois: &RoiCollection,
    _roi_type: RoiType,
) -> (LabeledMask, usize) {
    let components = connected_components(mask, Connectivity::Eight, Luma([0u8]));

    let max_component = components.pixels().map(|p| p.0[0]).max().unwrap_or(0) as usize;
    let mut component_to_object = vec![0u32; max_component + 1];

    for (index, roi) in rois.iter().enumerate() {
        let object_id = (index + 1) as u32;
        for (x, y, pixel) in components.enumerate_pixels() {
            let component = pixel.0[0];
            if component == 0 || component_to_object[component as usize] != 0 {
                continue;
            }
            if roi.mask.get_pixel(x, y).0[0] != 0 {
                component_to_object[component as usize] = object_id;
            }
        }
    }

    let mut labels = ImageBuffer::new(mask.width(), mask.height());
    for (x, y, pixel) in components.enumerate_pixels() {
        let object = component_to_object[pixel.0[0] as usize];
        labels.put_pixel(x, y, Luma([object]));
    }

    (LabeledMask { labels }, rois.len())
}
