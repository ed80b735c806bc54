//! H.264 Sequence Parameter Set geometry

use tracing::{debug, trace};

use super::bits::BitReader;
use super::utils::{remove_emulation_prevention, se, ue};
use crate::constants::*;
use crate::types::{FrameGeometry, ParseError, ParseOutcome};

fn malformed(reason: &'static str) -> ParseError {
    debug!(reason, "h264 sps rejected");
    ParseError::Malformed(reason)
}

/// Every field after seq_parameter_set_id must leave something behind.
fn more_data(br: &BitReader<'_>) -> Result<(), ParseError> {
    if br.bits_left() == 0 {
        return Err(ParseError::InsufficientData);
    }
    Ok(())
}

fn ue_checked(br: &mut BitReader<'_>) -> Result<u32, ParseError> {
    let v = ue(br);
    more_data(br)?;
    Ok(v)
}

fn se_checked(br: &mut BitReader<'_>) -> Result<i32, ParseError> {
    let v = se(br);
    more_data(br)?;
    Ok(v)
}

fn flag_checked(br: &mut BitReader<'_>) -> Result<bool, ParseError> {
    let v = br.read_bits_clamped(1) != 0;
    more_data(br)?;
    Ok(v)
}

/// Walks an avcC record header and leaves `br` on the first SPS NAL unit.
fn seek_avcc_sps(br: &mut BitReader<'_>, data: &[u8]) -> Result<(), ParseError> {
    br.require(32)?;
    if data[0] != 1 {
        return Err(malformed("unsupported avcC configuration version"));
    }
    if br.read_bits(8)? & 0xFC != 0xFC {
        return Err(malformed("avcC reserved bits not set"));
    }
    if br.read_bits(8)? & 0x1F == 0 {
        return Err(malformed("avcC carries no SPS"));
    }
    br.skip_bits(16) // sequenceParameterSetLength
}

/// Scans an Annex-B byte stream for an SPS start code and leaves `br` on its NAL header.
fn seek_annexb_sps<'a>(br: &mut BitReader<'a>, data: &'a [u8]) -> Result<(), ParseError> {
    *br = BitReader::new(data);
    while br.bits_left() >= 32 {
        let word = br.peek_bits(32)?;
        if word >> 8 == 1 && word & 0x1F == H264_NAL_SPS {
            trace!(offset = br.byte_position(), "h264 sps start code");
            return br.skip_bits(24);
        }
        br.skip_bits(8)?;
    }
    debug!("no h264 sps start code in buffer");
    Err(ParseError::InsufficientData)
}

/// Recovers coded size and cropping from an H.264 SPS.
///
/// `data` may be an avcC `codec_data` record or an Annex-B byte stream; the
/// framing is guessed from the first four bytes, and a record too short to hold
/// an SPS is retried as a byte stream.
pub fn parse_h264_sps(data: &[u8]) -> ParseOutcome {
    let mut br = BitReader::new(data);
    br.require(32)?;
    let word = br.read_bits(32)?;
    let mut avcc = word != 1 && word >> 8 != 1;

    loop {
        if avcc {
            seek_avcc_sps(&mut br, data)?;
        } else {
            seek_annexb_sps(&mut br, data)?;
        }
        if br.bits_left() >= 40 {
            break;
        }
        if !avcc {
            return Err(ParseError::InsufficientData);
        }
        trace!("avcC record too short, retrying as byte stream");
        avcc = false;
    }

    let nal = br.remaining_bytes();
    let rbsp = remove_emulation_prevention(nal)?;
    let mut br = match &rbsp {
        Some(unescaped) => BitReader::new(unescaped),
        None => br,
    };
    sps_geometry(&mut br)
}

fn sps_geometry(br: &mut BitReader<'_>) -> ParseOutcome {
    let header = br.read_bits(8)?;
    if header & 0x80 != 0 {
        return Err(malformed("forbidden_zero_bit set"));
    }
    if header & 0x1F != H264_NAL_SPS {
        return Err(malformed("NAL unit is not an SPS"));
    }

    let profile_idc = br.read_bits(8)?;
    br.require(16)?;
    br.skip_bits(16)?; // constraint_set flags, level_idc
    ue_checked(br)?; // seq_parameter_set_id

    let mut chroma_format_idc = 1;
    if H264_HIGH_PROFILES.contains(&profile_idc) {
        chroma_format_idc = ue_checked(br)?;
        let mut separate_colour_plane = false;
        if chroma_format_idc == 3 {
            separate_colour_plane = br.read_bit()?;
        }
        ue_checked(br)?; // bit_depth_luma_minus8
        ue_checked(br)?; // bit_depth_chroma_minus8

        br.require(2)?;
        br.skip_bits(1)?; // qpprime_y_zero_transform_bypass_flag
        if br.read_bit()? {
            let lists = if chroma_format_idc != 3 { 8 } else { 12 };
            for i in 0..lists {
                if br.read_bit()? {
                    skip_scaling_list(br, if i < 6 { 16 } else { 64 })?;
                }
            }
        }
        if separate_colour_plane {
            chroma_format_idc = 0;
        }
    }

    ue_checked(br)?; // log2_max_frame_num_minus4
    match ue_checked(br)? {
        0 => {
            ue_checked(br)?; // log2_max_pic_order_cnt_lsb_minus4
        }
        1 => {
            br.require(1)?;
            br.skip_bits(1)?; // delta_pic_order_always_zero_flag
            se_checked(br)?; // offset_for_non_ref_pic
            se_checked(br)?; // offset_for_top_to_bottom_field
            let cycle = ue_checked(br)?;
            for _ in 0..cycle {
                se_checked(br)?; // offset_for_ref_frame
            }
        }
        _ => {}
    }

    ue_checked(br)?; // max_num_ref_frames
    flag_checked(br)?; // gaps_in_frame_num_value_allowed_flag

    let pic_width_in_mbs_minus1 = ue(br);
    let pic_height_in_map_units_minus1 = ue_checked(br)?;
    let frame_mbs_only = flag_checked(br)?;
    if !frame_mbs_only {
        flag_checked(br)?; // mb_adaptive_frame_field_flag
    }
    flag_checked(br)?; // direct_8x8_inference_flag

    let (crop_l, crop_r, crop_t, crop_b) = if flag_checked(br)? {
        (
            ue_checked(br)?,
            ue_checked(br)?,
            ue_checked(br)?,
            ue_checked(br)?,
        )
    } else {
        (0, 0, 0, 0)
    };

    if chroma_format_idc > 3 {
        return Err(malformed("chroma_format_idc out of range"));
    }
    let field_factor = if frame_mbs_only { 1 } else { 2 };
    let width = (pic_width_in_mbs_minus1 as i64 + 1) * 16;
    let height = (pic_height_in_map_units_minus1 as i64 + 1) * 16 * field_factor;
    let sub_width = H264_SUBWIDTH_C[chroma_format_idc as usize] as i64;
    let sub_height = H264_SUBHEIGHT_C[chroma_format_idc as usize] as i64;
    let crop_width = width - (crop_l as i64 + crop_r as i64) * sub_width;
    let crop_height = height - (crop_t as i64 + crop_b as i64) * sub_height * field_factor;

    let dim = |v: i64, what: &'static str| u32::try_from(v).map_err(|_| malformed(what));
    let geometry = FrameGeometry::new(
        dim(width, "width out of range")?,
        dim(height, "height out of range")?,
    )
    .with_crop(
        dim(crop_width, "crop exceeds width")?,
        dim(crop_height, "crop exceeds height")?,
    );
    trace!(?geometry, profile_idc, chroma_format_idc, "h264 sps");
    Ok(geometry)
}

/// scaling_list(): only the bits matter, the coefficients are discarded.
fn skip_scaling_list(br: &mut BitReader<'_>, size: usize) -> Result<(), ParseError> {
    let mut last_scale = 8i64;
    let mut next_scale = 8i64;
    for _ in 0..size {
        if next_scale != 0 {
            let delta_scale = se_checked(br)? as i64;
            next_scale = (last_scale + delta_scale).rem_euclid(256);
        }
        if next_scale != 0 {
            last_scale = next_scale;
        }
    }
    Ok(())
}
