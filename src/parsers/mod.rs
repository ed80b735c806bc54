//! Header parsers recovering picture geometry
//!
//! Each parser reads just enough of a codec's stream header (H.263 picture
//! header, MPEG-4 Visual VOL, H.264 SPS) to report frame size, pixel aspect
//! ratio and cropping.

pub mod bits;
mod h263;
mod h264;
mod mpeg4;
mod utils;

#[cfg(test)]
pub(crate) mod testing;

pub use h263::parse_h263_picture_header;
pub use h264::parse_h264_sps;
pub use mpeg4::parse_mpeg4_vol;
pub use utils::{remove_emulation_prevention, se, ue};

use crate::types::{Codec, ParseOutcome};

/// Parse picture geometry from codec data or the first chunk of an elementary stream
pub fn parse_video_codec(codec: Codec, data: &[u8]) -> ParseOutcome {
    match codec {
        Codec::H263 => parse_h263_picture_header(data),
        Codec::Mpeg4 => parse_mpeg4_vol(data),
        Codec::H264 => parse_h264_sps(data),
    }
}
