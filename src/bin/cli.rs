use std::path::PathBuf;

use anyhow::Context;
use bitstream_geometry::Codec;
use bitstream_geometry::probe::{Options, run};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
struct Opt {
    /// codec_data blob or start of an elementary stream
    input: PathBuf,

    /// Header syntax to parse: h263, mpeg4 or h264
    #[clap(long, conflicts_with = "media_type")]
    codec: Option<Codec>,

    /// Pick the codec from a media type instead, e.g. video/x-h264
    #[clap(long)]
    media_type: Option<String>,

    /// mpegversion / divxversion accompanying --media-type
    #[clap(long, requires = "media_type")]
    version: Option<i32>,

    /// Input file contains hex text
    #[clap(long, default_value_t = false)]
    hex: bool,

    /// Pretty-print the JSON report
    #[clap(long, default_value_t = false)]
    pretty: bool,

    /// Log parser decisions to stderr
    #[clap(short, long, default_value_t = false)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let opt = Opt::parse();

    let default_level = if opt.verbose { "trace" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let codec = match (opt.codec, opt.media_type.as_deref()) {
        (Some(codec), _) => codec,
        (None, Some(name)) => Codec::from_media_type(name, opt.version)
            .with_context(|| format!("no geometry parser for media type {name}"))?,
        (None, None) => anyhow::bail!("one of --codec or --media-type is required"),
    };

    let report = run(Options {
        input: opt.input,
        codec,
        hex: opt.hex,
    })?;

    let json = if opt.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{json}");
    Ok(())
}
