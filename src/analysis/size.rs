use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use super::{object_label, Observations};
use crate::imageutil::tint_pixel;
use crate::labeling::LabeledMask;

const OBJECT_TINT: Rgb<u8> = Rgb([0, 255, 0]);
const BOX_COLOR: Rgb<u8> = Rgb([255, 0, 255]);

/// Shape/size analysis over every labeled object: pixel area, bounding-box
/// width and height, and boundary-pixel perimeter. Objects are tinted and
/// boxed on the preview image; objects with no pixels record nothing.
pub fn analyze_size(
    img: &mut RgbImage,
    labeled_mask: &LabeledMask,
    n_labels: usize,
    label: &str,
    observations: &mut Observations,
) {
    for id in 1..=n_labels {
        let object = id as u32;
        let mut area = 0u64;
        let mut perimeter = 0u64;
        let mut min_x = u32::MAX;
        let mut max_x = 0u32;
        let mut min_y = u32::MAX;
        let mut max_y = 0u32;

        for y in 0..labeled_mask.height() {
            for x in 0..labeled_mask.width() {
                if labeled_mask.label(x, y) != object {
                    continue;
                }
                area += 1;
                min_x = min_x.min(x);
                max_x = max_x.max(x);
                min_y = min_y.min(y);
                max_y = max_y.max(y);
                if is_boundary(labeled_mask, x, y, object) {
                    perimeter += 1;
                }
                tint_pixel(img, x, y, OBJECT_TINT);
            }
        }

        if area == 0 {
            continue;
        }

        let width = max_x - min_x + 1;
        let height = max_y - min_y + 1;
        draw_hollow_rect_mut(
            img,
            Rect::at(min_x as i32, min_y as i32).of_size(width, height),
            BOX_COLOR,
        );

        let name = object_label(label, id);
        observations.add(&name, "area", area as f64);
        observations.add(&name, "width", width as f64);
        observations.add(&name, "height", height as f64);
        observations.add(&name, "perimeter", perimeter as f64);
    }
}

fn is_boundary(labeled_mask: &LabeledMask, x: u32, y: u32, object: u32) -> bool {
    let neighbors = [
        (x.wrapping_sub(1), y),
        (x + 1, y),
        (x, y.wrapping_sub(1)),
        (x, y + 1),
    ];
    neighbors.iter().any(|&(nx, ny)| {
        nx >= labeled_mask.width()
            || ny >= labeled_mask.height()
            || labeled_mask.label(nx, ny) != object
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labeling::{create_labels, RoiType};
    use crate::roi::translate_rois;
    use image::{GrayImage, Luma};

    fn labeled_square() -> (LabeledMask, usize) {
        // 4x3 foreground block at (5,6)
        let mut mask = GrayImage::new(20, 20);
        for y in 6..9 {
            for x in 5..9 {
                mask.put_pixel(x, y, Luma([255]));
            }
        }
        let items = vec![("Rectangle".to_owned(), 7.0, 7.0, 12.0, 12.0)];
        let rois = translate_rois(&items, &RgbImage::new(20, 20));
        create_labels(&mask, &rois, RoiType::Partial)
    }

    #[test]
    fn measures_area_and_bounding_box() {
        let (labeled, n_obj) = labeled_square();
        let mut img = RgbImage::new(20, 20);
        let mut obs = Observations::default();
        analyze_size(&mut img, &labeled, n_obj, "plant", &mut obs);

        assert_eq!(obs.get("plant_1", "area"), Some(12.0));
        assert_eq!(obs.get("plant_1", "width"), Some(4.0));
        assert_eq!(obs.get("plant_1", "height"), Some(3.0));
        // every pixel of a 4x3 block touches the boundary except the two
        // interior ones
        assert_eq!(obs.get("plant_1", "perimeter"), Some(10.0));
    }

    #[test]
    fn annotates_the_preview_image() {
        let (labeled, n_obj) = labeled_square();
        let mut img = RgbImage::new(20, 20);
        let mut obs = Observations::default();
        analyze_size(&mut img, &labeled, n_obj, "plant", &mut obs);
        // tinted object pixel is no longer black
        assert_ne!(img.get_pixel(6, 7).0, [0, 0, 0]);
    }

    #[test]
    fn empty_object_records_nothing() {
        let mask = GrayImage::new(10, 10);
        let items = vec![("Rectangle".to_owned(), 5.0, 5.0, 4.0, 4.0)];
        let rois = translate_rois(&items, &RgbImage::new(10, 10));
        let (labeled, n_obj) = create_labels(&mask, &rois, RoiType::Partial);

        let mut img = RgbImage::new(10, 10);
        let mut obs = Observations::default();
        analyze_size(&mut img, &labeled, n_obj, "plant", &mut obs);
        assert!(obs.is_empty());
    }
}
