// ============================================================================
// PRESENTATION BRIDGE — raster image → display buffer → UI thread
// ============================================================================
//
// The raster image is straight-alpha RGBA. The display surface wants
// premultiplied BGRA. Conversion is always a full-buffer copy, and it may run
// on any thread; only the final texture assignment happens on the UI thread,
// which drains the one-slot `FrameSlot` below.

use std::sync::{Arc, Mutex};

use egui::{Color32, ColorImage};
use image::RgbaImage;
use rayon::prelude::*;

use crate::canvas::ImageStore;

/// Pixel grid in display layout: BGRA byte order, premultiplied alpha.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayBuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

#[inline]
fn premultiply(c: u8, a: u8) -> u8 {
    ((c as u32 * a as u32 + 127) / 255) as u8
}

impl DisplayBuffer {
    /// Full copy of `image`, converted to premultiplied BGRA.
    pub fn from_image(image: &RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        let stride = width as usize * 4;
        let src = image.as_raw();
        let mut pixels = vec![0u8; src.len()];

        if stride > 0 {
            pixels
                .par_chunks_mut(stride)
                .zip(src.par_chunks(stride))
                .for_each(|(row_out, row_in)| {
                    for (out, px) in row_out.chunks_exact_mut(4).zip(row_in.chunks_exact(4)) {
                        let a = px[3];
                        out[0] = premultiply(px[2], a);
                        out[1] = premultiply(px[1], a);
                        out[2] = premultiply(px[0], a);
                        out[3] = a;
                    }
                });
        }

        Self { width, height, pixels }
    }

    /// Wrap the buffer for egui, whose `Color32` is premultiplied RGBA.
    pub fn to_color_image(&self) -> ColorImage {
        let pixels = self
            .pixels
            .chunks_exact(4)
            .map(|p| Color32::from_rgba_premultiplied(p[2], p[1], p[0], p[3]))
            .collect();
        ColorImage {
            size: [self.width as usize, self.height as usize],
            pixels,
        }
    }
}

/// Regenerate the display buffer from the store. `None` when no image is loaded.
pub fn refresh(store: &ImageStore) -> Option<DisplayBuffer> {
    store.image().map(DisplayBuffer::from_image)
}

#[derive(Default)]
struct Slot {
    /// Newest generation ever published; older publishes are dropped.
    newest: Option<u64>,
    pending: Option<DisplayBuffer>,
}

/// One-slot pending-frame channel.
///
/// Producers publish the latest buffer; a frame that has not been taken yet
/// is simply replaced, so rapid updates coalesce instead of queueing.
#[derive(Clone, Default)]
pub struct FrameSlot {
    inner: Arc<Mutex<Slot>>,
    waker: Option<Arc<dyn Fn() + Send + Sync>>,
}

impl FrameSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slot that calls `waker` after every accepted publish (e.g. to request
    /// a repaint of the UI thread).
    pub fn with_waker(waker: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            inner: Arc::default(),
            waker: Some(Arc::new(waker)),
        }
    }

    /// Offer a frame. Returns `false` if a newer generation was already
    /// published and this frame was discarded.
    pub fn publish(&self, generation: u64, frame: DisplayBuffer) -> bool {
        {
            let Ok(mut slot) = self.inner.lock() else {
                log::warn!("Frame slot lock poisoned; dropping frame of generation {generation}");
                return false;
            };
            if slot.newest.is_some_and(|newest| newest > generation) {
                return false;
            }
            slot.newest = Some(generation);
            slot.pending = Some(frame);
        }
        if let Some(waker) = &self.waker {
            waker();
        }
        true
    }

    /// Take the pending frame, if any. Called by the single consumer.
    pub fn take(&self) -> Option<DisplayBuffer> {
        match self.inner.lock() {
            Ok(mut slot) => slot.pending.take(),
            Err(_) => {
                log::warn!("Frame slot lock poisoned; no frame to present");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn buffer(tag: u8) -> DisplayBuffer {
        DisplayBuffer { width: 1, height: 1, pixels: vec![tag, tag, tag, 255] }
    }

    #[test]
    fn converts_to_bgra_premultiplied() {
        let mut img = RgbaImage::new(3, 1);
        img.put_pixel(0, 0, Rgba([10, 20, 30, 255]));
        img.put_pixel(1, 0, Rgba([200, 100, 50, 128]));
        img.put_pixel(2, 0, Rgba([255, 255, 255, 0]));

        let buf = DisplayBuffer::from_image(&img);
        assert_eq!((buf.width, buf.height), (3, 1));
        assert_eq!(&buf.pixels[0..4], &[30, 20, 10, 255]);
        assert_eq!(&buf.pixels[4..8], &[25, 50, 100, 128]);
        assert_eq!(&buf.pixels[8..12], &[0, 0, 0, 0]);
    }

    #[test]
    fn color_image_matches_premultiplied_rgba() {
        let img = RgbaImage::from_pixel(2, 2, Rgba([200, 100, 50, 128]));
        let color = DisplayBuffer::from_image(&img).to_color_image();
        assert_eq!(color.size, [2, 2]);
        assert_eq!(color.pixels[3], Color32::from_rgba_premultiplied(100, 50, 25, 128));
    }

    #[test]
    fn refresh_without_image_is_noop() {
        assert!(refresh(&ImageStore::new()).is_none());
    }

    #[test]
    fn slot_coalesces_and_keeps_latest() {
        let slot = FrameSlot::new();
        assert!(slot.publish(1, buffer(1)));
        assert!(slot.publish(2, buffer(2)));
        assert_eq!(slot.take(), Some(buffer(2)));
        assert_eq!(slot.take(), None);
    }

    #[test]
    fn slot_drops_stale_generations() {
        let slot = FrameSlot::new();
        assert!(slot.publish(5, buffer(5)));
        assert_eq!(slot.take(), Some(buffer(5)));
        assert!(!slot.publish(4, buffer(4)));
        assert_eq!(slot.take(), None);
    }

    #[test]
    fn slot_wakes_consumer_across_threads() {
        let wakes = Arc::new(AtomicUsize::new(0));
        let counter = wakes.clone();
        let slot = FrameSlot::with_waker(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let producer = slot.clone();
        std::thread::spawn(move || {
            producer.publish(1, buffer(9));
        })
        .join()
        .unwrap();
        assert_eq!(wakes.load(Ordering::SeqCst), 1);
        assert_eq!(slot.take(), Some(buffer(9)));
    }

    #[test]
    fn poisoned_slot_drops_frames_without_panicking() {
        let slot = FrameSlot::new();
        let inner = slot.inner.clone();
        let _ = std::thread::spawn(move || {
            let _guard = inner.lock().unwrap();
            panic!("poison the slot");
        })
        .join();

        assert!(!slot.publish(1, buffer(1)));
        assert_eq!(slot.take(), None);
    }
}
