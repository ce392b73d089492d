use thiserror::Error;

/// Errors surfaced by editor actions.
///
/// None of these are fatal: the session keeps its previous state and the
/// shell reports the message to the user.
#[derive(Debug, Error)]
pub enum EditorError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The opened stream is not an image we can decode.
    #[error("could not decode image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("could not encode image: {0}")]
    Encode(#[source] image::ImageError),

    #[error("GIF encode error: {0}")]
    GifEncode(#[from] gif::EncodingError),

    #[error("image is {width}x{height}, larger than GIF allows (65535x65535)")]
    GifTooLarge { width: u32, height: u32 },

    #[error("invalid stroke point '{0}' (expected \"x,y\")")]
    InvalidStroke(String),
}
