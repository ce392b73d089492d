use image::RgbaImage;

use crate::ops::stroke::{BrushState, DrawingOverlay};

/// Owner of the decoded raster image.
///
/// The image is replaced wholesale when a new file is opened. Any
/// [`DrawingOverlay`] borrows it mutably, so an overlay can never survive a
/// replacement.
#[derive(Default)]
pub struct ImageStore {
    image: Option<RgbaImage>,
    /// Bumped on every mutation; lets the display side discard stale frames.
    generation: u64,
}

impl ImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }

    pub fn image(&self) -> Option<&RgbaImage> {
        self.image.as_ref()
    }

    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.image.as_ref().map(|img| img.dimensions())
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Install a freshly decoded image, dropping the previous one.
    pub fn replace(&mut self, image: RgbaImage) {
        self.image = Some(image);
        self.mark_dirty();
    }

    /// Mutable access to the pixels. The caller is expected to change them,
    /// so the generation is bumped up front.
    pub fn image_mut(&mut self) -> Option<&mut RgbaImage> {
        if self.image.is_some() {
            self.mark_dirty();
        }
        self.image.as_mut()
    }

    /// Drawing context bound to the current image, if any.
    pub fn overlay(&mut self, brush: BrushState) -> Option<DrawingOverlay<'_>> {
        self.image_mut().map(|img| DrawingOverlay::new(img, brush))
    }

    fn mark_dirty(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }
}
