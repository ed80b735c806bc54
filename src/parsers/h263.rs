//! H.263 picture header (PTYPE / PLUSPTYPE)

use tracing::{debug, trace};

use super::bits::BitReader;
use crate::constants::{H263_DEFAULT_PAR, H263_PSC, H263_SIZES, STANDARD_PARS};
use crate::types::{FrameGeometry, ParseError, ParseOutcome};

const SOURCE_FORMAT_EXTENDED: usize = 7;
const SOURCE_FORMAT_CUSTOM: usize = 6;
const PAR_EXTENDED: usize = 0xF;

fn malformed(reason: &'static str) -> ParseError {
    debug!(reason, "h263 picture header rejected");
    ParseError::Malformed(reason)
}

/// Recovers picture size and pixel aspect ratio from an H.263 picture header.
pub fn parse_h263_picture_header(data: &[u8]) -> ParseOutcome {
    let mut br = BitReader::new(data);
    let mut par = H263_DEFAULT_PAR;

    br.require(38)?;
    if br.read_bits(22)? != H263_PSC {
        return Err(malformed("missing picture start code"));
    }
    br.skip_bits(8)?; // temporal reference

    // PTYPE bits 1..=5 are markers and flags; the low 3 are the source format
    let source_format = (br.read_bits(8)? & 0x7) as usize;
    let (width, height) = match source_format {
        0 | SOURCE_FORMAT_CUSTOM => return Err(malformed("forbidden or reserved source format")),
        SOURCE_FORMAT_EXTENDED => {
            br.require(54)?;

            // UFEP must announce the full PLUSPTYPE
            if br.read_bits(3)? != 1 {
                return Err(malformed("PLUSPTYPE without full update"));
            }
            let format = (br.read_bits(18)? >> 15) as usize;
            match format {
                0 | 7 => return Err(malformed("reserved extended source format")),
                SOURCE_FORMAT_CUSTOM => {}
                _ => {
                    trace!(format, baseline = false, "h263 extended standard format");
                    return Ok(sized(H263_SIZES[format], par));
                }
            }

            br.skip_bits(9)?; // mandatory PLUSPTYPE part
            if br.read_bit()? {
                // CPM: PSBI follows
                br.require(25)?;
                br.skip_bits(2)?;
            }

            let pixel_format = br.read_bits(4)? as usize;
            let extended_par = pixel_format == PAR_EXTENDED;
            if (1..STANDARD_PARS.len()).contains(&pixel_format) {
                par = STANDARD_PARS[pixel_format];
            }

            // width code (9) | marker (1) | height code (9)
            let cpfmt = br.read_bits(19)?;
            let height = (cpfmt & 0x1FF) * 4;
            let width = (((cpfmt >> 10) & 0x1FF) + 1) * 4;

            if extended_par {
                br.require(16)?;
                let epar = br.read_bits(16)?;
                if epar != 0 {
                    // denominator comes from the low nibble only
                    par = (epar >> 8, epar & 0x0F);
                }
            }
            trace!(width, height, ?par, baseline = false, "h263 custom picture format");
            (width, height)
        }
        _ => {
            let size = H263_SIZES[source_format];
            br.require(11)?;
            let optional = br.read_bits(5)?;
            br.skip_bits(5)?; // PQUANT
            let cpm = br.read_bit()?;
            let baseline = optional & 1 == 0 && !cpm;
            trace!(source_format, baseline, "h263 standard format");
            size
        }
    };

    Ok(sized((width, height), par))
}

fn sized((width, height): (u32, u32), par: (u32, u32)) -> FrameGeometry {
    FrameGeometry::new(width, height).with_par(Some(par))
}
