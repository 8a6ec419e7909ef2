//! Lazy frame iteration over Y4M (YUV4MPEG2) video streams
//!
//! Y4M is the uncompressed interchange format: a plain-text stream header
//! followed by `FRAME` records of fixed size, which makes frame access a
//! matter of byte arithmetic rather than codec state.

use crate::{Error, Result};
use mlutils_path::{resolve_one, PathInput};
use std::fs::File;
use std::io::{BufRead, BufReader, Read};

const STREAM_MAGIC: &str = "YUV4MPEG2";
const FRAME_MAGIC: &str = "FRAME";

/// Chroma layout of a Y4M stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Colorspace {
    /// 4:2:0 chroma subsampling (including the jpeg/mpeg2/paldv variants)
    C420,
    /// 4:2:2 chroma subsampling
    C422,
    /// 4:4:4, full chroma
    C444,
    /// Luma only
    Mono,
}

impl Colorspace {
    fn parse(tag: &str) -> Result<Self> {
        match tag {
            "420" | "420jpeg" | "420mpeg2" | "420paldv" => Ok(Self::C420),
            "422" => Ok(Self::C422),
            "444" => Ok(Self::C444),
            "mono" => Ok(Self::Mono),
            other => Err(Error::InvalidHeader(format!(
                "unsupported colorspace C{other}"
            ))),
        }
    }

    /// Bytes per frame for the given dimensions
    pub fn frame_len(&self, width: u32, height: u32) -> usize {
        let luma = width as usize * height as usize;
        let half_w = width.div_ceil(2) as usize;
        let half_h = height.div_ceil(2) as usize;
        match self {
            Self::C420 => luma + 2 * half_w * half_h,
            Self::C422 => luma + 2 * half_w * height as usize,
            Self::C444 => 3 * luma,
            Self::Mono => luma,
        }
    }
}

/// Parsed Y4M stream header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Y4mHeader {
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Frame rate numerator
    pub fps_num: u32,
    /// Frame rate denominator
    pub fps_den: u32,
    /// Chroma layout
    pub colorspace: Colorspace,
}

impl Y4mHeader {
    fn parse(line: &str) -> Result<Self> {
        let mut tokens = line.split_ascii_whitespace();
        if tokens.next() != Some(STREAM_MAGIC) {
            return Err(Error::InvalidHeader(format!(
                "stream does not start with {STREAM_MAGIC}"
            )));
        }

        let mut width = None;
        let mut height = None;
        let mut fps = (25, 1);
        let mut colorspace = Colorspace::C420;
        for token in tokens {
            let mut chars = token.chars();
            let key = chars.next().expect("whitespace split yields non-empty tokens");
            let value = chars.as_str();
            match key {
                'W' => width = Some(Self::number(value)?),
                'H' => height = Some(Self::number(value)?),
                'F' => {
                    let (num, den) = value.split_once(':').ok_or_else(|| {
                        Error::InvalidHeader(format!("bad frame rate `{value}`"))
                    })?;
                    fps = (Self::number(num)?, Self::number(den)?);
                }
                'C' => colorspace = Colorspace::parse(value)?,
                // Interlacing, aspect ratio, and extensions don't affect
                // frame layout for our purposes.
                'I' | 'A' | 'X' => {}
                other => {
                    return Err(Error::InvalidHeader(format!(
                        "unknown header parameter `{other}`"
                    )))
                }
            }
        }

        let width = width.ok_or_else(|| Error::InvalidHeader("missing width".into()))?;
        let height = height.ok_or_else(|| Error::InvalidHeader("missing height".into()))?;
        if width == 0 || height == 0 {
            return Err(Error::InvalidHeader(format!(
                "degenerate dimensions {width}x{height}"
            )));
        }
        Ok(Self {
            width,
            height,
            fps_num: fps.0,
            fps_den: fps.1,
            colorspace,
        })
    }

    fn number(text: &str) -> Result<u32> {
        text.parse()
            .map_err(|_| Error::InvalidHeader(format!("bad number `{text}`")))
    }

    /// Bytes per frame payload
    pub fn frame_len(&self) -> usize {
        self.colorspace.frame_len(self.width, self.height)
    }
}

/// One decoded video frame: planar YUV (or luma-only) bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoFrame {
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Chroma layout of `data`
    pub colorspace: Colorspace,
    /// Planar pixel data, `colorspace.frame_len(width, height)` bytes
    pub data: Vec<u8>,
}

/// Iterates over the frames of a Y4M stream
///
/// Finite and forward-only; restart by reopening the source.
#[derive(Debug)]
pub struct VideoReader<R> {
    reader: R,
    header: Y4mHeader,
    limit: Option<usize>,
    yielded: usize,
}

impl VideoReader<BufReader<File>> {
    /// Open a Y4M file
    ///
    /// # Errors
    /// Path errors if the file is absent, I/O errors from opening it, or
    /// [`Error::InvalidHeader`] if it is not a Y4M stream.
    pub fn open(path: impl Into<PathInput>) -> Result<Self> {
        let path = resolve_one(path, true)?;
        Self::from_reader(BufReader::new(File::open(path)?))
    }
}

impl<R: BufRead> VideoReader<R> {
    /// Wrap an already-open Y4M stream, consuming its header
    ///
    /// # Errors
    /// [`Error::InvalidHeader`] if the stream header cannot be parsed.
    pub fn from_reader(mut reader: R) -> Result<Self> {
        let line = read_line(&mut reader)?
            .ok_or_else(|| Error::InvalidHeader("empty stream".into()))?;
        let header = Y4mHeader::parse(&line)?;
        Ok(Self {
            reader,
            header,
            limit: None,
            yielded: 0,
        })
    }

    /// Stop after at most `limit` frames
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// The parsed stream header
    pub fn header(&self) -> &Y4mHeader {
        &self.header
    }

    /// Skip `n` frames without decoding their payloads
    ///
    /// Returns how many frames were actually skipped; fewer than `n`
    /// means the stream ended first.
    pub fn skip_frames(&mut self, n: usize) -> Result<usize> {
        let mut skipped = 0;
        while skipped < n {
            if !self.enter_frame()? {
                break;
            }
            let len = self.header.frame_len() as u64;
            let copied = std::io::copy(&mut self.reader.by_ref().take(len), &mut std::io::sink())?;
            if copied < len {
                return Err(truncated());
            }
            skipped += 1;
        }
        Ok(skipped)
    }

    /// Consume the next `FRAME` marker; false at end of stream
    fn enter_frame(&mut self) -> Result<bool> {
        match read_line(&mut self.reader)? {
            None => Ok(false),
            Some(line) if line.split_ascii_whitespace().next() == Some(FRAME_MAGIC) => Ok(true),
            Some(line) => Err(Error::InvalidHeader(format!(
                "expected {FRAME_MAGIC} marker, got `{line}`"
            ))),
        }
    }

    fn read_frame(&mut self) -> Result<Option<VideoFrame>> {
        if let Some(limit) = self.limit {
            if self.yielded >= limit {
                return Ok(None);
            }
        }
        if !self.enter_frame()? {
            return Ok(None);
        }
        let mut data = vec![0u8; self.header.frame_len()];
        self.reader
            .read_exact(&mut data)
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::UnexpectedEof => truncated(),
                _ => Error::Io(e),
            })?;
        self.yielded += 1;
        Ok(Some(VideoFrame {
            width: self.header.width,
            height: self.header.height,
            colorspace: self.header.colorspace,
            data,
        }))
    }
}

impl<R: BufRead> Iterator for VideoReader<R> {
    type Item = Result<VideoFrame>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_frame().transpose()
    }
}

/// Read a single frame from a video file by index
///
/// Seeks past `index` frames without decoding them, then decodes one.
///
/// # Errors
/// [`Error::FrameNotFound`] if the stream holds `index` or fewer frames;
/// otherwise the same errors as [`VideoReader::open`].
pub fn frame_at(path: impl Into<PathInput>, index: usize) -> Result<VideoFrame> {
    let mut reader = VideoReader::open(path)?;
    if reader.skip_frames(index)? < index {
        return Err(Error::FrameNotFound { index });
    }
    match reader.read_frame()? {
        Some(frame) => Ok(frame),
        None => Err(Error::FrameNotFound { index }),
    }
}

fn read_line<R: BufRead>(reader: &mut R) -> Result<Option<String>> {
    let mut buf = Vec::new();
    let n = reader.read_until(b'\n', &mut buf)?;
    if n == 0 {
        return Ok(None);
    }
    if buf.last() == Some(&b'\n') {
        buf.pop();
    }
    String::from_utf8(buf)
        .map(Some)
        .map_err(|_| Error::InvalidHeader("non-UTF-8 header line".into()))
}

fn truncated() -> Error {
    Error::Io(std::io::Error::new(
        std::io::ErrorKind::UnexpectedEof,
        "truncated frame payload",
    ))
}
