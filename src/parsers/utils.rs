//! Common parsing utilities

use std::collections::TryReserveError;

use super::bits::BitReader;
use crate::constants::EXP_GOLOMB_MAX_ZEROS;

/// Unsigned Exp-Golomb decoder.
///
/// Never fails: a code truncated by the end of the buffer decodes from whatever
/// bits are left, and an exhausted reader yields 0.
pub fn ue(br: &mut BitReader<'_>) -> u32 {
    let mut zeros = 0;
    while zeros < EXP_GOLOMB_MAX_ZEROS {
        if br.read_bits_clamped(1) != 0 || br.bits_left() == 0 {
            break;
        }
        zeros += 1;
    }
    let suffix = br.read_bits_clamped(zeros) as u64;
    let val = (1u64 << zeros) - 1 + suffix;
    u32::try_from(val).unwrap_or(u32::MAX)
}

/// Signed Exp-Golomb decoder
pub fn se(br: &mut BitReader<'_>) -> i32 {
    let k = ue(br) as i64;
    let v = if k & 1 == 1 { (k + 1) / 2 } else { -(k / 2) };
    // saturated codes keep their sign
    v.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

/// Removes emulation prevention bytes (0x000003) from a NAL payload.
///
/// The first `00 00 0x` (x <= 3) in the buffer decides: a start code means the
/// payload carries no escapes and `Ok(None)` is returned, as it is when no such
/// pattern exists at all. Otherwise a copy is made in which every `00 00 03` is
/// rewritten as `00 00`.
pub fn remove_emulation_prevention(data: &[u8]) -> Result<Option<Vec<u8>>, TryReserveError> {
    let first = data
        .windows(4)
        .position(|w| w[0] == 0 && w[1] == 0 && w[2] <= 3);
    let start = match first {
        Some(i) if data[i + 2] == 3 => i,
        _ => return Ok(None),
    };

    let mut v = Vec::new();
    v.try_reserve_exact(data.len())?;
    v.extend_from_slice(&data[..start]);
    let mut i = start;
    while i < data.len() {
        if i + 2 < data.len() && data[i] == 0 && data[i + 1] == 0 && data[i + 2] == 3 {
            v.extend_from_slice(&data[i..i + 2]);
            i += 3;
        } else {
            v.push(data[i]);
            i += 1;
        }
    }
    Ok(Some(v))
}
