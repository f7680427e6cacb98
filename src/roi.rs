use image::{GrayImage, Luma, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut};
use imageproc::rect::Rect;

use crate::settings::RoiItem;

pub const ROI_FOREGROUND: u8 = 255;

/// Library-native geometry of one translated ROI. Rectangle coordinates are
/// the top-left corner; the UI supplies center-anchored descriptors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoiGeometry {
    Circle { x: i32, y: i32, radius: i32 },
    Rectangle { x: i32, y: i32, width: i32, height: i32 },
}

/// One region of interest: its geometry plus the filled binary mask used by
/// object labeling.
pub struct Roi {
    pub geometry: RoiGeometry,
    pub mask: GrayImage,
}

/// Ordered accumulation of translated ROIs, consumed by the labeling step.
#[derive(Default)]
pub struct RoiCollection {
    rois: Vec<Roi>,
}

impl RoiCollection {
    pub fn append(&mut self, roi: Roi) {
        self.rois.push(roi);
    }

    pub fn len(&self) -> usize {
        self.rois.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rois.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Roi> {
        self.rois.iter()
    }
}

/// Translates the UI-supplied ROI descriptors into library-native ROIs.
/// The reference image only provides the target geometry.
///
/// An unrecognized shape type warns and stops processing the remaining
/// list, dropping later entries. That matches the behavior this workflow
/// has always had; see DESIGN.md before changing it.
pub fn translate_rois(roi_items: &[RoiItem], reference: &RgbImage) -> RoiCollection {
    let (width, height) = (reference.width(), reference.height());
    let mut rois = RoiCollection::default();

    for (roi_type, roi_x, roi_y, roi_width, roi_height) in roi_items {
        debug!(
            "RoiItem: {} {} {} {} {}",
            roi_type, roi_x, roi_y, roi_width, roi_height
        );

        let geometry = match roi_type.as_str() {
            "Circle" => RoiGeometry::Circle {
                x: *roi_x as i32,
                y: *roi_y as i32,
                radius: (roi_width / 2.0) as i32,
            },
            "Rectangle" => RoiGeometry::Rectangle {
                x: (roi_x - roi_width / 2.0) as i32,
                y: (roi_y - roi_height / 2.0) as i32,
                width: *roi_width as i32,
                height: *roi_height as i32,
            },
            _ => {
                warn!("Roi type is neither circle or rectangle");
                break;
            }
        };

        rois.append(Roi {
            geometry,
            mask: rasterize(geometry, width, height),
        });
    }

    rois
}

fn rasterize(geometry: RoiGeometry, width: u32, height: u32) -> GrayImage {
    let mut mask = GrayImage::new(width, height);
    match geometry {
        RoiGeometry::Circle { x, y, radius } => {
            draw_filled_circle_mut(&mut mask, (x, y), radius, Luma([ROI_FOREGROUND]));
        }
        RoiGeometry::Rectangle {
            x,
            y,
            width: w,
            height: h,
        } => {
            if w > 0 && h > 0 {
                draw_filled_rect_mut(
                    &mut mask,
                    Rect::at(x, y).of_size(w as u32, h as u32),
                    Luma([ROI_FOREGROUND]),
                );
            }
        }
    }
    mask
}
