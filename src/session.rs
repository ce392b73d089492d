use std::io::{Read, Write};

use crate::canvas::ImageStore;
use crate::error::EditorError;
use crate::io::{SaveFormat, decode_image, encode_image};
use crate::ops::filters;
use crate::ops::stroke::{BrushState, CursorTrail};

/// What the shell has to do after a handler ran.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Redraw {
    /// Nothing visible changed.
    None,
    /// Pixels changed; regenerate the display buffer.
    Canvas,
    /// A new image was installed; resize the canvas region, then regenerate.
    Resize { width: u32, height: u32 },
}

impl Redraw {
    pub fn needs_refresh(&self) -> bool {
        !matches!(self, Redraw::None)
    }
}

/// Pointer snapshot delivered by the GUI, in image pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerSample {
    pub pos: (f32, f32),
    pub primary_down: bool,
}

/// All state of one editing session: the image, the fixed brush and the
/// cursor trail of the current gesture.
pub struct EditSession {
    store: ImageStore,
    brush: BrushState,
    trail: CursorTrail,
}

impl Default for EditSession {
    fn default() -> Self {
        Self::new(BrushState::default())
    }
}

impl EditSession {
    pub fn new(brush: BrushState) -> Self {
        Self {
            store: ImageStore::new(),
            brush,
            trail: CursorTrail::default(),
        }
    }

    pub fn store(&self) -> &ImageStore {
        &self.store
    }

    pub fn brush(&self) -> BrushState {
        self.brush
    }

    pub fn trail(&self) -> CursorTrail {
        self.trail
    }

    /// Decode `reader` and make it the current image.
    ///
    /// On failure the previous image (if any) stays loaded, untouched.
    pub fn open(&mut self, reader: impl Read) -> Result<Redraw, EditorError> {
        let image = decode_image(reader)?;
        let (width, height) = image.dimensions();
        self.store.replace(image);
        self.trail.clear();
        log::info!("Loaded {}x{} image", width, height);
        Ok(Redraw::Resize { width, height })
    }

    /// Encode the current image into `writer`. Without an image nothing is
    /// written and `Ok(false)` is returned.
    pub fn save(&self, writer: &mut dyn Write, format: SaveFormat) -> Result<bool, EditorError> {
        let Some(image) = self.store.image() else {
            return Ok(false);
        };
        encode_image(image, writer, format)?;
        log::info!("Saved {}x{} image as {:?}", image.width(), image.height(), format);
        Ok(true)
    }

    pub fn apply_grayscale(&mut self) -> Redraw {
        match self.store.image_mut() {
            Some(image) => {
                filters::grayscale(image);
                Redraw::Canvas
            }
            None => Redraw::None,
        }
    }

    /// Start a gesture: remember the position, draw nothing.
    pub fn pointer_down(&mut self, pos: (f32, f32)) -> Redraw {
        self.trail.start(pos);
        Redraw::None
    }

    /// Extend the gesture with a straight segment from the last recorded
    /// position. Ignored without an image, without an active gesture, or when
    /// the primary button is not held.
    pub fn pointer_move(&mut self, sample: PointerSample) -> Redraw {
        if !sample.primary_down || !self.store.has_image() {
            return Redraw::None;
        }
        let Some((from, to)) = self.trail.advance(sample.pos) else {
            return Redraw::None;
        };
        match self.store.overlay(self.brush) {
            Some(mut overlay) => {
                overlay.draw_line(from, to);
                Redraw::Canvas
            }
            None => Redraw::None,
        }
    }

    pub fn pointer_up(&mut self) -> Redraw {
        self.trail.clear();
        Redraw::None
    }
}
