use std::fs;

use anyhow::Context;
use tracing::{debug, info};

use crate::parsers::parse_video_codec;
use crate::types::ProbeReport;

/// Loads the input named in `opts`, runs the matching header parser and
/// summarises the outcome.
pub fn run(opts: &crate::probe::Options) -> anyhow::Result<ProbeReport> {
    let raw = fs::read(&opts.input)
        .with_context(|| format!("reading {}", opts.input.display()))?;
    let data = if opts.hex {
        let text = std::str::from_utf8(&raw).context("hex input is not UTF-8")?;
        decode_hex(text)?
    } else {
        raw
    };
    debug!(codec = %opts.codec, len = data.len(), "probing header");

    let outcome = parse_video_codec(opts.codec, &data);
    match &outcome {
        Ok(g) => info!(width = g.width, height = g.height, "geometry found"),
        Err(e) => info!(error = %e, retryable = e.is_retryable(), "no geometry"),
    }
    Ok(ProbeReport::from_outcome(opts.codec, data.len(), &outcome))
}

/// Hex text to bytes; whitespace is ignored.
pub fn decode_hex(text: &str) -> anyhow::Result<Vec<u8>> {
    let hex: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    hex::decode(&hex).context("decoding hex input")
}
