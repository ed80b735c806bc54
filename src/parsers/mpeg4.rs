//! MPEG-4 Visual VOS / VO / VOL headers

use tracing::{debug, trace};

use super::bits::BitReader;
use crate::constants::*;
use crate::types::{FrameGeometry, ParseError, ParseOutcome};

fn malformed(reason: &'static str) -> ParseError {
    debug!(reason, "mpeg4 visual header rejected");
    ParseError::Malformed(reason)
}

/// next_start_code(): a zero bit followed by one bits up to the byte boundary.
fn next_start_code(br: &mut BitReader<'_>) -> Result<(), ParseError> {
    br.require(8 - br.bit_position() % 8)?;
    if br.read_bit()? {
        return Err(malformed("stuffing does not start with a zero bit"));
    }
    while !br.is_byte_aligned() {
        if !br.read_bit()? {
            return Err(malformed("stuffing bit is not one"));
        }
    }
    Ok(())
}

/// Consumes any run of user_data() sections; `code` ends up holding the first
/// start code that is not user data.
fn skip_user_data(br: &mut BitReader<'_>, code: &mut u32) -> Result<(), ParseError> {
    while *code == MPEG4_USER_DATA_START {
        loop {
            br.require(8)?;
            *code = (*code << 8) | br.read_bits(8)?;
            if *code >> 8 == 1 {
                break;
            }
        }
    }
    Ok(())
}

/// Finds the first 32-bit window holding a video_object_start_code and returns a
/// reader anchored there.
fn find_video_object(data: &[u8]) -> Option<BitReader<'_>> {
    let mut code = u32::from_be_bytes([data[0], data[1], data[2], data[3]]);
    for i in 4..data.len() {
        if code <= MPEG4_VIDEO_OBJECT_MAX {
            trace!(offset = i - 4, "mpeg4 video object start code");
            return Some(BitReader::new(&data[i - 4..]));
        }
        code = (code << 8) | data[i] as u32;
    }
    None
}

/// VisualObjectSequence() up to and including the Visual Object header.
fn visual_object_sequence(br: &mut BitReader<'_>) -> Result<(), ParseError> {
    br.require(40)?;
    br.skip_bits(8)?; // profile_and_level_indication

    let mut code = br.read_bits(32)?;
    skip_user_data(br, &mut code)?;
    if code != MPEG4_VO_START {
        return Err(malformed("expected visual object start code"));
    }

    br.require(6)?;
    if br.read_bit()? {
        br.require(12)?;
        br.skip_bits(7)?; // visual_object_verid, visual_object_priority
    }
    if br.read_bits(4)? != MPEG4_VISUAL_OBJECT_VIDEO {
        return Err(malformed("visual object is not video"));
    }

    if br.read_bit()? {
        br.require(5)?;
        br.skip_bits(4)?; // video_format, video_range
        if br.read_bit()? {
            br.require(24)?;
            br.skip_bits(24)?; // colour_description
        }
    }

    next_start_code(br)
}

/// Recovers the rectangular frame size from MPEG-4 Visual configuration data or
/// the start of an elementary stream.
///
/// Buffers that begin with a Visual Object Sequence are walked header by header;
/// anything else is scanned for the first Video Object start code, so data that
/// starts mid-sequence still parses.
pub fn parse_mpeg4_vol(data: &[u8]) -> ParseOutcome {
    let mut br = BitReader::new(data);
    br.require(32)?;

    if br.peek_bits(32)? == MPEG4_VOS_START {
        br.skip_bits(32)?;
        visual_object_sequence(&mut br)?;
    } else {
        br = find_video_object(data).ok_or_else(|| {
            debug!("no mpeg4 video object start code in buffer");
            ParseError::InsufficientData
        })?;
    }

    video_object_layer(&mut br)
}

fn video_object_layer(br: &mut BitReader<'_>) -> ParseOutcome {
    br.require(32)?;
    let mut code = br.read_bits(32)?;
    skip_user_data(br, &mut code)?;
    if code > MPEG4_VIDEO_OBJECT_MAX {
        return Err(malformed("expected video object start code"));
    }

    br.require(47)?;
    let code = br.read_bits(32)?;
    if !(MPEG4_VOL_START_MIN..=MPEG4_VOL_START_MAX).contains(&code) {
        return Err(malformed("expected video object layer start code"));
    }

    br.skip_bits(9)?; // random_accessible_vol, video_object_type_indication
    if br.read_bit()? {
        br.require(12)?;
        br.skip_bits(7)?; // video_object_layer_verid, video_object_layer_priority
    }

    let mut par = None;
    match br.read_bits(4)? {
        0 => return Err(malformed("forbidden aspect ratio code")),
        MPEG4_EXTENDED_PAR => {
            br.require(17)?;
            let num = br.read_bits(8)?;
            let den = br.read_bits(8)?;
            if num != 0 && den != 0 {
                par = Some((num, den));
            }
        }
        ar if (ar as usize) < STANDARD_PARS.len() => par = Some(STANDARD_PARS[ar as usize]),
        _ => {}
    }

    if br.read_bit()? {
        br.require(4)?;
        br.skip_bits(3)?; // chroma_format, low_delay
        if br.read_bit()? {
            br.require(MPEG4_VBV_PARAMETERS_BITS as usize)?;
            br.skip_bits(MPEG4_VBV_PARAMETERS_BITS as usize)?;
        }
    }

    br.require(21)?;
    if br.read_bits(2)? != 0 {
        return Err(malformed("only rectangular video object layers are supported"));
    }
    marker(br)?;
    let time_increment_resolution = br.read_bits(16)?;
    marker(br)?;
    if br.read_bit()? {
        // fixed_vop_time_increment is as wide as the resolution itself
        let n = (u32::BITS - time_increment_resolution.leading_zeros()) as usize;
        br.require(n)?;
        br.skip_bits(n)?;
    }

    br.require(29)?;
    marker(br)?;
    let width = br.read_bits(13)?;
    if width == 0 {
        return Err(malformed("zero width"));
    }
    marker(br)?;
    let height = br.read_bits(13)?;
    if height == 0 {
        return Err(malformed("zero height"));
    }
    marker(br)?;

    trace!(width, height, ?par, "mpeg4 video object layer");
    Ok(FrameGeometry::new(width, height).with_par(par))
}

fn marker(br: &mut BitReader<'_>) -> Result<(), ParseError> {
    if !br.read_bit()? {
        return Err(malformed("marker bit not set"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::testing::BitBuilder;

    struct Vol {
        aspect: u32,
        fixed_rate: bool,
        tir: u32,
        width: u32,
        height: u32,
        markers: [bool; 5],
    }

    impl Default for Vol {
        fn default() -> Self {
            Self {
                aspect: 1,
                fixed_rate: false,
                tir: 30,
                width: 15,
                height: 15,
                markers: [true; 5],
            }
        }
    }

    fn visual_object_sequence(b: &mut BitBuilder) {
        b.bits(32, MPEG4_VOS_START).bits(8, 0x08);
        b.bits(32, MPEG4_VO_START);
        // no identifier, video type, no signal type, then 0 + one stuffing bit
        b.bit(false).bits(4, 1).bit(false).bit(false).bit(true);
    }

    fn video_object_layer(b: &mut BitBuilder, vol: &Vol) {
        b.bits(32, 0x100).bits(32, 0x120);
        b.bit(false).bits(8, 1).bit(false);
        b.bits(4, vol.aspect);
        if vol.aspect == 0xF {
            b.bits(8, 4).bits(8, 3);
        }
        b.bit(false); // vol_control_parameters
        let m = vol.markers;
        b.bits(2, 0).bit(m[0]).bits(16, vol.tir).bit(m[1]);
        b.bit(vol.fixed_rate);
        if vol.fixed_rate {
            let n = 32 - vol.tir.leading_zeros();
            b.bits(n, 1);
        }
        b.bit(m[2]).bits(13, vol.width).bit(m[3]).bits(13, vol.height).bit(m[4]);
    }

    fn full(vol: &Vol) -> Vec<u8> {
        let mut b = BitBuilder::new();
        visual_object_sequence(&mut b);
        video_object_layer(&mut b, vol);
        b.finish()
    }

    #[test]
    fn full_sequence() {
        let g = parse_mpeg4_vol(&full(&Vol::default())).unwrap();
        assert_eq!((g.width, g.height), (15, 15));
        assert_eq!(g.pixel_aspect_ratio, Some((1, 1)));
        assert_eq!(g.crop_width, None);
    }

    #[test]
    fn any_cleared_marker_is_malformed() {
        for i in 0..5 {
            let mut vol = Vol::default();
            vol.markers[i] = false;
            assert!(
                matches!(
                    parse_mpeg4_vol(&full(&vol)),
                    Err(ParseError::Malformed("marker bit not set"))
                ),
                "marker {i}"
            );
        }
    }

    #[test]
    fn fixed_rate_increment_is_skipped() {
        for tir in [1, 16, 25, 30000] {
            let vol = Vol {
                fixed_rate: true,
                tir,
                width: 720,
                height: 576,
                ..Vol::default()
            };
            let g = parse_mpeg4_vol(&full(&vol)).unwrap();
            assert_eq!((g.width, g.height), (720, 576), "tir {tir}");
        }
    }

    #[test]
    fn extended_par() {
        let vol = Vol {
            aspect: 0xF,
            ..Vol::default()
        };
        let g = parse_mpeg4_vol(&full(&vol)).unwrap();
        assert_eq!(g.pixel_aspect_ratio, Some((4, 3)));
    }

    #[test]
    fn reserved_aspect_code_leaves_par_unset() {
        let vol = Vol {
            aspect: 7,
            ..Vol::default()
        };
        let g = parse_mpeg4_vol(&full(&vol)).unwrap();
        assert_eq!(g.pixel_aspect_ratio, None);
    }

    #[test]
    fn forbidden_aspect_code() {
        let vol = Vol {
            aspect: 0,
            ..Vol::default()
        };
        assert!(matches!(
            parse_mpeg4_vol(&full(&vol)),
            Err(ParseError::Malformed(_))
        ));
    }

    #[test]
    fn zero_width_is_malformed() {
        let vol = Vol {
            width: 0,
            ..Vol::default()
        };
        assert!(matches!(
            parse_mpeg4_vol(&full(&vol)),
            Err(ParseError::Malformed(_))
        ));
    }

    #[test]
    fn starts_mid_stream() {
        let mut b = BitBuilder::new();
        video_object_layer(
            &mut b,
            &Vol {
                width: 352,
                height: 288,
                ..Vol::default()
            },
        );
        let vol = b.finish();
        let g = parse_mpeg4_vol(&vol).unwrap();
        assert_eq!((g.width, g.height), (352, 288));

        let mut prefixed = vec![0xFF, 0xFF];
        prefixed.extend_from_slice(&vol);
        let g = parse_mpeg4_vol(&prefixed).unwrap();
        assert_eq!((g.width, g.height), (352, 288));
    }

    #[test]
    fn user_data_is_skipped() {
        let mut b = BitBuilder::new();
        b.bits(32, MPEG4_VOS_START).bits(8, 0x08);
        b.bits(32, MPEG4_USER_DATA_START).bytes(b"encoder x");
        b.bits(32, MPEG4_VO_START);
        b.bit(false).bits(4, 1).bit(false).bit(false).bit(true);
        video_object_layer(&mut b, &Vol::default());
        let g = parse_mpeg4_vol(&b.finish()).unwrap();
        assert_eq!((g.width, g.height), (15, 15));
    }

    #[test]
    fn non_video_object_is_malformed() {
        let mut b = BitBuilder::new();
        b.bits(32, MPEG4_VOS_START).bits(8, 0x08);
        b.bits(32, MPEG4_VO_START);
        b.bit(false).bits(4, 2).bit(false).bit(false).bit(true);
        video_object_layer(&mut b, &Vol::default());
        assert!(matches!(
            parse_mpeg4_vol(&b.finish()),
            Err(ParseError::Malformed(_))
        ));
    }

    #[test]
    fn zero_stuffing_is_malformed() {
        let mut b = BitBuilder::new();
        b.bits(32, MPEG4_VOS_START).bits(8, 0x08);
        b.bits(32, MPEG4_VO_START);
        b.bit(false).bits(4, 1).bit(false).bit(false).bit(false);
        video_object_layer(&mut b, &Vol::default());
        assert!(matches!(
            parse_mpeg4_vol(&b.finish()),
            Err(ParseError::Malformed(_))
        ));
    }

    #[test]
    fn non_rectangular_shape_is_malformed() {
        let mut data = full(&Vol::default());
        // VOS(5) + VO(5) + VO start(4) + VOL start(4), then 9+1+4+1 bits before shape
        data[18 + 1] |= 0b0000_0001;
        assert!(matches!(
            parse_mpeg4_vol(&data),
            Err(ParseError::Malformed(_))
        ));
    }

    #[test]
    fn truncated_layer_needs_more_data() {
        let data = full(&Vol::default());
        for len in [0, 3, 12, 20, data.len() - 1] {
            assert!(
                matches!(parse_mpeg4_vol(&data[..len]), Err(ParseError::InsufficientData)),
                "len {len}"
            );
        }
    }

    #[test]
    fn no_start_code_found() {
        assert!(matches!(
            parse_mpeg4_vol(&[0xFF; 32]),
            Err(ParseError::InsufficientData)
        ));
    }
}
