//! Start codes and lookup tables shared by the header parsers

/// H.263 picture start code (22 bits)
pub const H263_PSC: u32 = 0x20;

/// H.263 standard source formats 1..=5 (sub-QCIF .. 16CIF); index 0 is forbidden
pub const H263_SIZES: [(u32, u32); 6] = [
    (0, 0),
    (128, 96),
    (176, 144),
    (352, 288),
    (704, 576),
    (1408, 1152),
];

/// Pixel aspect ratios shared by H.263 PAR codes and MPEG-4 aspect_ratio_info 1..=5
pub const STANDARD_PARS: [(u32, u32); 6] = [
    (0, 0),
    (1, 1),
    (12, 11),
    (10, 11),
    (16, 11),
    (40, 33),
];

/// H.263 default pixel aspect ratio (CIF family)
pub const H263_DEFAULT_PAR: (u32, u32) = (12, 11);

/// MPEG-4 Visual start codes (full 32-bit values)
pub const MPEG4_VOS_START: u32 = 0x1B0;
pub const MPEG4_USER_DATA_START: u32 = 0x1B2;
pub const MPEG4_VO_START: u32 = 0x1B5;
pub const MPEG4_VIDEO_OBJECT_MAX: u32 = 0x11F;
pub const MPEG4_VOL_START_MIN: u32 = 0x120;
pub const MPEG4_VOL_START_MAX: u32 = 0x12F;

/// visual_object_type for video
pub const MPEG4_VISUAL_OBJECT_VIDEO: u32 = 1;
/// aspect_ratio_info escape to explicit par_width/par_height
pub const MPEG4_EXTENDED_PAR: u32 = 0xF;
/// vbv_parameters() size in bits
pub const MPEG4_VBV_PARAMETERS_BITS: u32 = 79;

/// H.264 NAL unit type of a Sequence Parameter Set
pub const H264_NAL_SPS: u32 = 7;

/// Profiles whose SPS carries chroma_format_idc and scaling matrices
pub const H264_HIGH_PROFILES: &[u32] = &[100, 110, 122, 244, 44, 83, 86];

/// Crop unit multipliers indexed by chroma_format_idc
pub const H264_SUBWIDTH_C: [u32; 4] = [1, 2, 2, 1];
pub const H264_SUBHEIGHT_C: [u32; 4] = [1, 2, 1, 1];

/// Upper bound on leading zeros of an Exp-Golomb code
pub const EXP_GOLOMB_MAX_ZEROS: u32 = 32;
