//! Frame iteration over image lists and video streams
//!
//! - [`ImageReader`]: lazy iteration over a list of image files, decoded
//!   one at a time
//! - [`VideoReader`]: lazy iteration over the frames of an uncompressed
//!   Y4M (YUV4MPEG2) stream
//! - [`frame_at`]: direct access to a single video frame by index
//!
//! Both readers are finite and restart by constructing a new reader over
//! the same source.

#![warn(missing_docs)]

pub mod images;
pub mod video;

pub use images::ImageReader;
pub use video::{frame_at, Colorspace, VideoFrame, VideoReader, Y4mHeader};

/// Result type for media operations
pub type Result<T> = std::result::Result<T, Error>;

/// Media errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Source path validation failed
    #[error(transparent)]
    Path(#[from] mlutils_path::Error),

    /// I/O error while reading a source
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Image decoding failed
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// The video stream header could not be parsed
    #[error("invalid Y4M header: {0}")]
    InvalidHeader(String),

    /// The requested frame index is past the end of the stream
    #[error("frame {index} not found in video")]
    FrameNotFound {
        /// Requested frame index
        index: usize,
    },
}
