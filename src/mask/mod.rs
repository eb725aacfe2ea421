//! Region masks for localized edits.
//!
//! Users paint a translucent [`StrokeLayer`]; [`binarize`] turns any painted
//! surface into an opaque black/white [`RegionMask`] where white marks the
//! region to modify. Any pixel with non-zero alpha counts as selected.

mod stroke;

pub use stroke::{Stroke, StrokeLayer, Tool};

use crate::error::{AtomError, Result};
use crate::types::ImageBlob;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use rayon::prelude::*;
use std::io::Cursor;
use tracing::warn;

const SELECTED: Rgba<u8> = Rgba([255, 255, 255, 255]);
const UNSELECTED: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// A surface whose pixels are either painted or not
pub trait Coverage: Sync {
    fn dimensions(&self) -> (u32, u32);
    fn is_painted(&self, x: u32, y: u32) -> bool;
}

impl Coverage for StrokeLayer {
    fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    #[inline]
    fn is_painted(&self, x: u32, y: u32) -> bool {
        self.alpha_at(x, y) > 0
    }
}

/// A raw overlay: the alpha channel is the selection, colour is ignored
impl Coverage for RgbaImage {
    fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    #[inline]
    fn is_painted(&self, x: u32, y: u32) -> bool {
        self.get_pixel(x, y)[3] > 0
    }
}

/// An already binarized mask is its own coverage
impl Coverage for RegionMask {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[inline]
    fn is_painted(&self, x: u32, y: u32) -> bool {
        self.is_selected(x, y)
    }
}

/// Threshold a painted surface into a binary mask of the same dimensions
pub fn binarize<C: Coverage + ?Sized>(surface: &C) -> RegionMask {
    let (width, height) = surface.dimensions();
    let cells: Vec<bool> = (0..height)
        .into_par_iter()
        .flat_map_iter(|y| (0..width).map(move |x| surface.is_painted(x, y)))
        .collect();

    RegionMask {
        width,
        height,
        cells,
    }
}

/// Binarize an overlay painted for a base image of `base_size` pixels.
///
/// The overlay must match the base image exactly. An overlay with no
/// transparent pixel (e.g. a flattened JPEG) selects everything and is logged.
pub fn binarize_overlay(overlay: &RgbaImage, base_size: (u32, u32)) -> Result<RegionMask> {
    let overlay_size = (overlay.width(), overlay.height());
    if overlay_size != base_size {
        return Err(AtomError::invalid(format!(
            "mask is {}x{} but the image is {}x{}",
            overlay_size.0, overlay_size.1, base_size.0, base_size.1
        )));
    }

    let mask = binarize(overlay);
    if !mask.cells.is_empty() && mask.cells.par_iter().all(|&c| c) {
        warn!(width = mask.width, height = mask.height, "mask overlay is fully opaque, the whole image is selected");
    }
    Ok(mask)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionMask {
    width: u32,
    height: u32,
    cells: Vec<bool>,
}

impl RegionMask {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn is_selected(&self, x: u32, y: u32) -> bool {
        self.cells[(y as usize) * (self.width as usize) + x as usize]
    }

    pub fn selected_count(&self) -> usize {
        self.cells.par_iter().filter(|&&c| c).count()
    }

    /// No pixel selected; edits treat this as "no mask"
    pub fn is_empty(&self) -> bool {
        !self.cells.par_iter().any(|&c| c)
    }

    /// Opaque image: white where selected, black elsewhere
    pub fn to_rgba_image(&self) -> RgbaImage {
        RgbaImage::from_fn(self.width, self.height, |x, y| {
            if self.is_selected(x, y) {
                SELECTED
            } else {
                UNSELECTED
            }
        })
    }

    pub fn to_png(&self) -> Result<Vec<u8>> {
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(self.to_rgba_image()).write_to(&mut buf, ImageFormat::Png)?;
        Ok(buf.into_inner())
    }

    /// PNG blob ready to attach to an edit request
    pub fn to_blob(&self) -> Result<ImageBlob> {
        Ok(ImageBlob::new("image/png", self.to_png()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn painted_layer() -> StrokeLayer {
        let mut layer = StrokeLayer::new(40, 30);
        layer.paint(&Stroke::brush(8.0).line_to(5.0, 5.0).line_to(20.0, 5.0));
        layer
    }

    #[test]
    fn test_transparent_surface_is_all_black() {
        let layer = StrokeLayer::new(12, 7);
        let mask = binarize(&layer);

        assert_eq!((mask.width(), mask.height()), (12, 7));
        assert!(mask.is_empty());
        assert_eq!(mask.selected_count(), 0);

        let img = mask.to_rgba_image();
        assert_eq!(img.dimensions(), (12, 7));
        assert!(img.pixels().all(|p| *p == UNSELECTED));
    }

    #[test]
    fn test_any_alpha_selects_pixel() {
        let mut overlay = RgbaImage::new(4, 4);
        overlay.put_pixel(1, 2, Rgba([10, 20, 30, 1]));
        overlay.put_pixel(3, 0, Rgba([0, 0, 0, 255]));

        let mask = binarize(&overlay);
        assert!(mask.is_selected(1, 2));
        assert!(mask.is_selected(3, 0));
        assert!(!mask.is_selected(0, 0));
        assert_eq!(mask.selected_count(), 2);
        assert_eq!(mask.to_rgba_image().get_pixel(1, 2), &SELECTED);
    }

    #[test]
    fn test_brush_stroke_selects_region() {
        let mask = binarize(&painted_layer());
        assert!(!mask.is_empty());
        assert!(mask.is_selected(12, 5));
        assert!(!mask.is_selected(35, 25));
    }

    #[test]
    fn test_partially_erased_pixels_stay_selected() {
        let mut layer = StrokeLayer::new(32, 32);
        layer.paint(&Stroke::brush(20.0).line_to(16.0, 16.0));
        layer.paint(&Stroke::eraser(6.0).line_to(16.0, 16.0));

        let mask = binarize(&layer);
        assert!(!mask.is_selected(16, 16));
        assert!(mask.is_selected(16, 9));
        // Soft eraser edge: alpha reduced but not cleared
        assert!(layer.alpha_at(18, 16) > 0 && layer.alpha_at(18, 16) < 153);
        assert!(mask.is_selected(18, 16));
    }

    #[test]
    fn test_overlay_must_match_base_size() {
        let mut overlay = RgbaImage::new(8, 6);
        overlay.put_pixel(2, 3, Rgba([255, 0, 0, 200]));

        let mask = binarize_overlay(&overlay, (8, 6)).unwrap();
        assert_eq!(mask.selected_count(), 1);

        let err = binarize_overlay(&overlay, (16, 12)).unwrap_err();
        assert!(matches!(err, AtomError::InvalidInput { .. }));
        assert!(err.to_string().contains("8x6"));
    }

    #[test]
    fn test_opaque_overlay_selects_everything() {
        let overlay = RgbaImage::from_pixel(5, 4, Rgba([12, 34, 56, 255]));
        let mask = binarize_overlay(&overlay, (5, 4)).unwrap();
        assert_eq!(mask.selected_count(), 20);
    }

    #[test]
    fn test_binarize_is_idempotent() {
        let once = binarize(&painted_layer());
        let twice = binarize(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_png_output_is_pure_black_and_white() {
        let mask = binarize(&painted_layer());
        let png = mask.to_png().unwrap();

        let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (40, 30));
        assert!(decoded.pixels().all(|p| *p == SELECTED || *p == UNSELECTED));
        assert_eq!(
            decoded.pixels().filter(|p| **p == SELECTED).count(),
            mask.selected_count()
        );

        let blob = mask.to_blob().unwrap();
        assert_eq!(blob.mime_type, "image/png");
        assert_eq!(blob.data, png);
    }

    #[test]
    fn test_cleared_layer_yields_empty_mask() {
        let mut layer = painted_layer();
        layer.clear();
        assert!(binarize(&layer).is_empty());
    }
}
