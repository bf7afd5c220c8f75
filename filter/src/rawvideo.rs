use bytes::BytesMut;
use slideshow_common::frame::{FrameError, PixelFormat, VideoFrame};
use std::path::Path;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum RawVideoError {
    #[error("failed to open {0}: {1}")]
    Open(String, std::io::Error),
    #[error("failed to read frame data: {0}")]
    Read(std::io::Error),
    #[error("failed to write frame data: {0}")]
    Write(std::io::Error),
    #[error("input ended mid-frame: got {got} bytes, expected {expected}")]
    Truncated { got: usize, expected: usize },
    #[error(transparent)]
    Frame(#[from] FrameError),
}

/// Geometry shared by every frame in a raw stream.
#[derive(Debug, Clone, Copy)]
pub struct StreamLayout {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub fps: f64,
    frame_len: usize,
}

impl StreamLayout {
    pub fn new(width: u32, height: u32, format: PixelFormat, fps: f64) -> Result<Self, FrameError> {
        let frame_len = format
            .frame_len(width, height)
            .ok_or(FrameError::TooLarge { width, height })?;
        Ok(Self {
            width,
            height,
            format,
            fps,
            frame_len,
        })
    }

    pub fn frame_len(&self) -> usize {
        self.frame_len
    }

    /// Presentation time of the `seq`-th frame, rounded down to the millisecond.
    pub fn pts_ms(&self, seq: u64) -> i64 {
        (seq as f64 * 1000.0 / self.fps) as i64
    }
}

/// Splits a byte stream of packed frames into [`VideoFrame`]s.
pub struct RawFrameReader<R> {
    reader: R,
    layout: StreamLayout,
    buffer: BytesMut,
    seq: u64,
}

impl<R: AsyncRead + Unpin> RawFrameReader<R> {
    pub fn new(reader: R, layout: StreamLayout) -> Self {
        Self {
            reader,
            layout,
            buffer: BytesMut::with_capacity(layout.frame_len()),
            seq: 0,
        }
    }

    /// Read the next whole frame. `Ok(None)` at a clean end of input.
    pub async fn next_frame(&mut self) -> Result<Option<VideoFrame>, RawVideoError> {
        let frame_len = self.layout.frame_len();

        while self.buffer.len() < frame_len {
            self.buffer.reserve(frame_len - self.buffer.len());
            let n = self
                .reader
                .read_buf(&mut self.buffer)
                .await
                .map_err(RawVideoError::Read)?;
            if n == 0 {
                if self.buffer.is_empty() {
                    debug!(frames = self.seq, "end of raw video input");
                    return Ok(None);
                }
                return Err(RawVideoError::Truncated {
                    got: self.buffer.len(),
                    expected: frame_len,
                });
            }
        }

        let data = self.buffer.split_to(frame_len).to_vec();
        let seq = self.seq;
        self.seq += 1;

        let frame = VideoFrame::from_raw(
            data,
            self.layout.width,
            self.layout.height,
            self.layout.format,
            self.layout.pts_ms(seq),
            seq,
        )?;
        Ok(Some(frame))
    }

    pub fn frames_read(&self) -> u64 {
        self.seq
    }
}

/// Append one frame's pixel data to the output stream.
pub async fn write_frame<W: AsyncWrite + Unpin>(
    writer: &mut W,
    frame: &VideoFrame,
) -> Result<(), RawVideoError> {
    writer
        .write_all(&frame.data)
        .await
        .map_err(RawVideoError::Write)
}

/// Open the input stream; "-" means stdin.
pub async fn open_input(path: &str) -> Result<Box<dyn AsyncRead + Unpin + Send>, RawVideoError> {
    if path == "-" {
        return Ok(Box::new(tokio::io::stdin()));
    }
    let file = tokio::fs::File::open(Path::new(path))
        .await
        .map_err(|e| RawVideoError::Open(path.to_string(), e))?;
    Ok(Box::new(file))
}

/// Open the output stream; "-" means stdout.
pub async fn open_output(path: &str) -> Result<Box<dyn AsyncWrite + Unpin + Send>, RawVideoError> {
    if path == "-" {
        return Ok(Box::new(tokio::io::stdout()));
    }
    let file = tokio::fs::File::create(Path::new(path))
        .await
        .map_err(|e| RawVideoError::Open(path.to_string(), e))?;
    Ok(Box::new(file))
}
