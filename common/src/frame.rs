use std::fmt;
use std::str::FromStr;

/// Packed pixel layout of a decoded frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// 8-bit luma only (1 byte per pixel).
    Gray8,
    /// RGB 8-bit per channel (3 bytes per pixel).
    Rgb24,
    /// RGBA 8-bit per channel (4 bytes per pixel).
    Rgba,
    /// YUV 4:2:0 planar: full-size Y plane followed by quarter-size U and V planes.
    Yuv420p,
}

impl PixelFormat {
    /// Size in bytes of one packed frame at the given dimensions, or `None`
    /// if it does not fit in `usize`.
    pub fn frame_len(&self, width: u32, height: u32) -> Option<usize> {
        let (w, h) = (width as usize, height as usize);
        let pixels = w.checked_mul(h)?;
        match self {
            PixelFormat::Gray8 => Some(pixels),
            PixelFormat::Rgb24 => pixels.checked_mul(3),
            PixelFormat::Rgba => pixels.checked_mul(4),
            PixelFormat::Yuv420p => {
                let chroma = w.div_ceil(2).checked_mul(h.div_ceil(2))?;
                pixels.checked_add(chroma.checked_mul(2)?)
            }
        }
    }
}

impl FromStr for PixelFormat {
    type Err = FrameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gray" | "gray8" => Ok(PixelFormat::Gray8),
            "rgb24" => Ok(PixelFormat::Rgb24),
            "rgba" => Ok(PixelFormat::Rgba),
            "yuv420p" | "i420" => Ok(PixelFormat::Yuv420p),
            other => Err(FrameError::UnknownFormat(other.to_string())),
        }
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PixelFormat::Gray8 => "gray",
            PixelFormat::Rgb24 => "rgb24",
            PixelFormat::Rgba => "rgba",
            PixelFormat::Yuv420p => "yuv420p",
        };
        f.write_str(name)
    }
}

/// A decoded video frame with its presentation metadata.
///
/// The filter never looks inside `data`; it only moves, copies or drops
/// whole frames.
#[derive(Debug, PartialEq, Eq)]
pub struct VideoFrame {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    /// Presentation timestamp in milliseconds from stream start.
    pub pts_ms: i64,
    /// Position of the frame in the input stream.
    pub seq: u64,
}

impl VideoFrame {
    /// Wrap a raw pixel buffer, checking that its length matches the geometry.
    pub fn from_raw(
        data: Vec<u8>,
        width: u32,
        height: u32,
        format: PixelFormat,
        pts_ms: i64,
        seq: u64,
    ) -> Result<Self, FrameError> {
        let expected = format
            .frame_len(width, height)
            .ok_or(FrameError::TooLarge { width, height })?;
        if data.len() != expected {
            return Err(FrameError::SizeMismatch {
                got: data.len(),
                expected,
            });
        }
        Ok(Self {
            data,
            width,
            height,
            format,
            pts_ms,
            seq,
        })
    }

    pub fn payload_size(&self) -> usize {
        self.data.len()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("frame buffer has {got} bytes, expected {expected}")]
    SizeMismatch { got: usize, expected: usize },
    #[error("{width}x{height} frame size overflows")]
    TooLarge { width: u32, height: u32 },
    #[error("unknown pixel format: {0}")]
    UnknownFormat(String),
}
