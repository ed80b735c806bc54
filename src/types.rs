use serde::Serialize;
use std::collections::TryReserveError;
use std::fmt;
use std::str::FromStr;

/// Picture geometry recovered from a stream header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FrameGeometry {
    pub width: u32,
    pub height: u32,
    /// Pixel aspect ratio as (numerator, denominator)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pixel_aspect_ratio: Option<(u32, u32)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crop_width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crop_height: Option<u32>,
}

impl FrameGeometry {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixel_aspect_ratio: None,
            crop_width: None,
            crop_height: None,
        }
    }

    pub fn with_par(mut self, par: Option<(u32, u32)>) -> Self {
        self.pixel_aspect_ratio = par;
        self
    }

    pub fn with_crop(mut self, crop_width: u32, crop_height: u32) -> Self {
        self.crop_width = Some(crop_width);
        self.crop_height = Some(crop_height);
        self
    }

    /// Size announced downstream: the cropped size when one is known, else the coded size.
    pub fn display_size(&self) -> (u32, u32) {
        let w = self.crop_width.filter(|&w| w != 0).unwrap_or(self.width);
        let h = self.crop_height.filter(|&h| h != 0).unwrap_or(self.height);
        (w, h)
    }
}

/// Why a header could not be turned into a [`FrameGeometry`]
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// Consistent so far, but the buffer ends before the header does
    #[error("not enough data to complete the header")]
    InsufficientData,
    /// The bitstream violates the header syntax
    #[error("malformed header: {0}")]
    Malformed(&'static str),
    #[error("failed to allocate the unescaped payload")]
    Allocation(#[from] TryReserveError),
}

impl ParseError {
    /// Whether a longer buffer might parse where this one did not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ParseError::InsufficientData)
    }
}

/// Result of running one of the header parsers; `Ok` carries the geometry.
pub type ParseOutcome = Result<FrameGeometry, ParseError>;

/// Codec selector for the geometry parsers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Codec {
    H263,
    Mpeg4,
    H264,
}

impl Codec {
    /// Maps a stream media type (and its `mpegversion`/`divxversion` field, if any)
    /// onto a codec with a geometry parser.
    pub fn from_media_type(name: &str, version: Option<i32>) -> Option<Codec> {
        match (name, version) {
            ("video/x-h263", _) => Some(Codec::H263),
            ("video/x-h264", _) => Some(Codec::H264),
            ("video/mpeg", Some(4)) => Some(Codec::Mpeg4),
            ("video/x-divx", Some(4 | 5)) => Some(Codec::Mpeg4),
            ("video/x-xvid" | "video/x-3ivx", _) => Some(Codec::Mpeg4),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Codec::H263 => "h263",
            Codec::Mpeg4 => "mpeg4",
            Codec::H264 => "h264",
        }
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Codec {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "h263" | "h.263" => Ok(Codec::H263),
            "mpeg4" | "mpeg-4" | "m4v" => Ok(Codec::Mpeg4),
            "h264" | "h.264" | "avc" => Ok(Codec::H264),
            other => anyhow::bail!("unknown codec {other:?} (expected h263, mpeg4 or h264)"),
        }
    }
}

/// Outcome of a probe run (public API)
#[derive(Debug, Clone, Serialize)]
pub struct ProbeReport {
    pub codec: Codec,
    pub input_len: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geometry: Option<FrameGeometry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Set when the error says a longer buffer could still succeed
    pub retryable: bool,
}

impl ProbeReport {
    pub fn from_outcome(codec: Codec, input_len: usize, outcome: &ParseOutcome) -> Self {
        match outcome {
            Ok(geometry) => {
                let (w, h) = geometry.display_size();
                Self {
                    codec,
                    input_len,
                    geometry: Some(*geometry),
                    display_width: Some(w),
                    display_height: Some(h),
                    error: None,
                    retryable: false,
                }
            }
            Err(e) => Self {
                codec,
                input_len,
                geometry: None,
                display_width: None,
                display_height: None,
                error: Some(e.to_string()),
                retryable: e.is_retryable(),
            },
        }
    }
}
