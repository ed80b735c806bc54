// src/lib.rs
pub mod probe {
    use std::path::PathBuf;

    use crate::types::{Codec, ProbeReport};

    pub struct Options {
        pub input: PathBuf,
        pub codec: Codec,
        /// Input file holds hex text instead of raw bytes
        pub hex: bool,
    }

    /// Reads the input and reports the geometry found in its header
    pub fn run(opts: Options) -> anyhow::Result<ProbeReport> {
        crate::core::run(&opts)
    }
}

mod constants;
mod core;
pub mod parsers;
mod types;

pub use parsers::{parse_h263_picture_header, parse_h264_sps, parse_mpeg4_vol, parse_video_codec};
pub use types::{Codec, FrameGeometry, ParseError, ParseOutcome, ProbeReport};
