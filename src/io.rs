use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Cursor, Read, Write};
use std::path::{Path, PathBuf};

use image::codecs::bmp::BmpEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ColorType, DynamicImage, ImageEncoder, RgbaImage};
use rfd::FileDialog;

use crate::error::EditorError;

/// JPEG is written at maximum quality; no other lossy knob is exposed.
pub const JPEG_QUALITY: u8 = 100;

/// A named group of file extensions for the open/save dialogs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FileFilter {
    pub name: &'static str,
    pub extensions: &'static [&'static str],
}

/// Everything the Open dialog offers.
pub const OPEN_FILTER: FileFilter = FileFilter {
    name: "Images",
    extensions: &["bmp", "jpg", "jpeg", "png", "gif", "tiff", "ico"],
};

/// Save-as type choices, in dialog order.
pub const SAVE_CHOICES: &[FileFilter] = &[
    FileFilter { name: "PNG", extensions: &["png"] },
    FileFilter { name: "JPEG", extensions: &["jpg"] },
    FileFilter { name: "BMP", extensions: &["bmp"] },
    FileFilter { name: "GIF", extensions: &["gif"] },
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SaveFormat {
    #[default]
    Png,
    Jpeg,
    Bmp,
    Gif,
}

impl SaveFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            SaveFormat::Png => "png",
            SaveFormat::Jpeg => "jpg",
            SaveFormat::Bmp => "bmp",
            SaveFormat::Gif => "gif",
        }
    }

    /// Format for a bare extension (no dot, any case). Unknown → PNG.
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "jpg" | "jpeg" => SaveFormat::Jpeg,
            "bmp" => SaveFormat::Bmp,
            "gif" => SaveFormat::Gif,
            _ => SaveFormat::Png,
        }
    }

    pub fn from_path(path: &Path) -> Self {
        Self::from_extension(path.extension().and_then(|e| e.to_str()).unwrap_or(""))
    }
}

// ============================================================================
// DECODE / ENCODE
// ============================================================================

/// Read a whole stream and decode it to RGBA8. The format is sniffed from
/// content, not from any file name.
pub fn decode_image(mut reader: impl Read) -> Result<RgbaImage, EditorError> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    let img = image::io::Reader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .decode()
        .map_err(EditorError::Decode)?;
    Ok(img.to_rgba8())
}

/// Encode `image` verbatim into `writer`.
pub fn encode_image(
    image: &RgbaImage,
    writer: &mut dyn Write,
    format: SaveFormat,
) -> Result<(), EditorError> {
    let mut writer = BufWriter::new(writer);
    let (w, h) = image.dimensions();

    match format {
        SaveFormat::Png => {
            PngEncoder::new(&mut writer)
                .write_image(image.as_raw(), w, h, ColorType::Rgba8)
                .map_err(EditorError::Encode)?;
        }
        SaveFormat::Jpeg => {
            // JPEG doesn't support alpha, convert to RGB
            let rgb_image = DynamicImage::ImageRgba8(image.clone()).to_rgb8();
            JpegEncoder::new_with_quality(&mut writer, JPEG_QUALITY)
                .write_image(rgb_image.as_raw(), w, h, ColorType::Rgb8)
                .map_err(EditorError::Encode)?;
        }
        SaveFormat::Bmp => {
            BmpEncoder::new(&mut writer)
                .write_image(image.as_raw(), w, h, ColorType::Rgba8)
                .map_err(EditorError::Encode)?;
        }
        SaveFormat::Gif => encode_static_gif(image, &mut writer)?,
    }

    writer.flush()?;
    Ok(())
}

/// Encode a single static GIF frame.
fn encode_static_gif(image: &RgbaImage, writer: &mut impl Write) -> Result<(), EditorError> {
    let (width, height) = image.dimensions();
    if width > u16::MAX as u32 || height > u16::MAX as u32 {
        return Err(EditorError::GifTooLarge { width, height });
    }
    let (w, h) = (width as u16, height as u16);

    let indexed = exact_palette(image).unwrap_or_else(|| quantize_rgba(image, 256));

    let mut encoder = gif::Encoder::new(writer, w, h, &indexed.palette)?;
    let frame = gif::Frame {
        width: w,
        height: h,
        transparent: indexed.transparent,
        buffer: std::borrow::Cow::Borrowed(&indexed.indices),
        ..Default::default()
    };
    encoder.write_frame(&frame)?;
    Ok(())
}

/// Palette + per-pixel indices ready for the gif encoder.
struct IndexedImage {
    /// Flat `[R,G,B, R,G,B, ...]`
    palette: Vec<u8>,
    indices: Vec<u8>,
    transparent: Option<u8>,
}

/// Lossless palette when the image fits in 256 entries.
///
/// GIF has a single transparent index, so every fully transparent pixel must
/// carry the same RGB (decoders hand that RGB back with alpha 0). Partially
/// transparent pixels, or transparent pixels with differing RGB, can't be
/// represented and send the image through quantization instead.
fn exact_palette(image: &RgbaImage) -> Option<IndexedImage> {
    let mut lookup: HashMap<[u8; 4], u8> = HashMap::new();
    let mut palette = Vec::new();
    let mut indices = Vec::with_capacity((image.width() * image.height()) as usize);
    let mut transparent: Option<(u8, [u8; 4])> = None;

    for p in image.pixels() {
        let key = p.0;
        if key[3] != 0 && key[3] != 255 {
            return None;
        }
        let idx = match lookup.get(&key) {
            Some(&idx) => idx,
            None => {
                let next = lookup.len();
                if next >= 256 {
                    return None;
                }
                let idx = next as u8;
                if key[3] == 0 {
                    if transparent.is_some() {
                        return None;
                    }
                    transparent = Some((idx, key));
                }
                lookup.insert(key, idx);
                palette.extend_from_slice(&key[..3]);
                idx
            }
        };
        indices.push(idx);
    }
    let transparent = transparent.map(|(idx, _)| idx);

    if palette.is_empty() {
        palette.extend_from_slice(&[0, 0, 0]);
    }
    Some(IndexedImage { palette, indices, transparent })
}

/// Quantize an RGBA image to indexed color with NeuQuant.
fn quantize_rgba(image: &RgbaImage, max_colors: usize) -> IndexedImage {
    let nq = color_quant::NeuQuant::new(10, max_colors, image.as_raw());

    let mut palette = Vec::with_capacity(max_colors * 3);
    for i in 0..max_colors {
        match nq.lookup(i) {
            Some(color) => palette.extend_from_slice(&color[..3]),
            None => palette.extend_from_slice(&[0, 0, 0]),
        }
    }

    let indices = image.pixels().map(|p| nq.index_of(&p.0) as u8).collect();

    IndexedImage { palette, indices, transparent: None }
}

// ============================================================================
// STORAGE COLLABORATOR
// ============================================================================

/// A destination picked in the save dialog.
pub struct SaveTarget {
    pub path: PathBuf,
    pub writer: Box<dyn Write>,
}

/// File-picking and byte-stream access, kept behind a trait so the editor
/// logic runs without a windowing system.
///
/// `Ok(None)` means the user cancelled, which is not an error.
pub trait StorageAccess {
    fn open_file_picker(&mut self, filter: &FileFilter) -> Result<Option<Box<dyn Read>>, EditorError>;

    fn save_file_picker(
        &mut self,
        default_ext: &str,
        choices: &[FileFilter],
    ) -> Result<Option<SaveTarget>, EditorError>;
}

/// Native dialogs (rfd) backed by the local file system.
#[derive(Default)]
pub struct DialogStorage {
    /// Last file opened or saved; seeds the dialogs' directory and name.
    pub current_path: Option<PathBuf>,
}

impl DialogStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn dialog(&self, title: &str) -> FileDialog {
        let mut dialog = FileDialog::new().set_title(title);
        if let Some(dir) = self.current_path.as_ref().and_then(|p| p.parent()) {
            dialog = dialog.set_directory(dir);
        }
        dialog
    }
}

impl StorageAccess for DialogStorage {
    fn open_file_picker(&mut self, filter: &FileFilter) -> Result<Option<Box<dyn Read>>, EditorError> {
        let Some(path) = self
            .dialog("Open image")
            .add_filter(filter.name, filter.extensions)
            .pick_file()
        else {
            return Ok(None);
        };
        let file = File::open(&path)?;
        log::info!("Opening {}", path.display());
        self.current_path = Some(path);
        Ok(Some(Box::new(BufReader::new(file))))
    }

    fn save_file_picker(
        &mut self,
        default_ext: &str,
        choices: &[FileFilter],
    ) -> Result<Option<SaveTarget>, EditorError> {
        let stem = self
            .current_path
            .as_ref()
            .and_then(|p| p.file_stem())
            .and_then(|s| s.to_str())
            .unwrap_or("untitled")
            .to_string();
        let ext = default_ext.trim_start_matches('.');

        let mut dialog = self.dialog("Save as").set_file_name(&format!("{stem}.{ext}"));
        for choice in choices {
            dialog = dialog.add_filter(choice.name, choice.extensions);
        }
        let Some(mut path) = dialog.save_file() else {
            return Ok(None);
        };
        if path.extension().is_none() {
            path.set_extension(ext);
        }

        let file = File::create(&path)?;
        log::info!("Saving to {}", path.display());
        self.current_path = Some(path.clone());
        Ok(Some(SaveTarget { path, writer: Box::new(file) }))
    }
}
