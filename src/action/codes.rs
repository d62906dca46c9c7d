//! Action opcode tables: modern (1.2+) codes, the 1.0/1.1 legacy mappings and
//! capability bitmaps.

use std::collections::HashMap;
use std::fmt::{Display, Error, Formatter};

use once_cell::sync::Lazy;
use tracing::warn;

use crate::bits::{bit, test_bit};
use crate::config::CodecConfig;
use crate::error::{OfpError, Result};
use crate::ofp_header::StructType;
use crate::ofp_version::ProtocolVersion;
use crate::oxm::OxmBasicFieldType;

/// Action types, numbered by their 1.2+ wire code.
#[repr(u16)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ActionType {
    Output = 0,
    CopyTtlOut = 11,
    CopyTtlIn = 12,
    SetMplsTtl = 15,
    DecMplsTtl = 16,
    PushVlan = 17,
    PopVlan = 18,
    PushMpls = 19,
    PopMpls = 20,
    SetQueue = 21,
    Group = 22,
    SetNwTtl = 23,
    DecNwTtl = 24,
    SetField = 25,
    PushPbb = 26,
    PopPbb = 27,
    Experimenter = 0xffff,
}

use self::ActionType::*;

impl ActionType {
    pub const ALL: [ActionType; 17] = [
        Output, CopyTtlOut, CopyTtlIn, SetMplsTtl, DecMplsTtl, PushVlan, PopVlan, PushMpls,
        PopMpls, SetQueue, Group, SetNwTtl, DecNwTtl, SetField, PushPbb, PopPbb, Experimenter,
    ];

    /// Modern wire code.
    pub fn code(self) -> u16 {
        self as u16
    }

    /// Modern table lookup, ignoring versions.
    pub fn from_code(code: u16) -> Option<ActionType> {
        ActionType::ALL.iter().cloned().find(|t| t.code() == code)
    }

    /// Earliest version in which the action exists in some form.
    pub fn min_version(self) -> ProtocolVersion {
        match self {
            Output | PopVlan | SetQueue | SetField | Experimenter => ProtocolVersion::V1_0,
            PushPbb | PopPbb => ProtocolVersion::V1_3,
            _ => ProtocolVersion::V1_1,
        }
    }

    /// Decode a 1.2+ action code.
    pub fn decode(code: u16, pv: ProtocolVersion, at: usize) -> Result<ActionType> {
        if pv.is_legacy() {
            return Err(OfpError::mismatch(
                "modern action code table",
                ProtocolVersion::V1_2,
                pv,
            ));
        }
        let t = ActionType::from_code(code).ok_or_else(|| OfpError::HeaderParse {
            position: at,
            reason: format!("unknown action type {:#06x} for {}", code, pv),
        })?;
        pv.require(t.min_version(), t.name())?;
        Ok(t)
    }

    pub fn name(self) -> &'static str {
        match self {
            Output => "OUTPUT",
            CopyTtlOut => "COPY_TTL_OUT",
            CopyTtlIn => "COPY_TTL_IN",
            SetMplsTtl => "SET_MPLS_TTL",
            DecMplsTtl => "DEC_MPLS_TTL",
            PushVlan => "PUSH_VLAN",
            PopVlan => "POP_VLAN",
            PushMpls => "PUSH_MPLS",
            PopMpls => "POP_MPLS",
            SetQueue => "SET_QUEUE",
            Group => "GROUP",
            SetNwTtl => "SET_NW_TTL",
            DecNwTtl => "DEC_NW_TTL",
            SetField => "SET_FIELD",
            PushPbb => "PUSH_PBB",
            PopPbb => "POP_PBB",
            Experimenter => "EXPERIMENTER",
        }
    }

    /// Earliest version whose capability bitmap has a bit for this type.
    fn bitmap_version(self) -> Option<ProtocolVersion> {
        match self {
            Output => Some(ProtocolVersion::V1_0),
            SetField => Some(ProtocolVersion::V1_2),
            PushPbb | PopPbb => Some(ProtocolVersion::V1_3),
            Experimenter => None,
            _ => Some(ProtocolVersion::V1_1),
        }
    }
}

impl Display for ActionType {
    fn fmt(&self, f: &mut Formatter) -> std::result::Result<(), Error> {
        f.write_str(self.name())
    }
}

impl StructType for ActionType {
    fn decode(
        code: u16,
        pv: ProtocolVersion,
        at: usize,
    ) -> Result<(ActionType, Option<OxmBasicFieldType>)> {
        if pv.is_legacy() {
            legacy_table(pv)
                .decode
                .get(&code)
                .cloned()
                .ok_or_else(|| OfpError::HeaderParse {
                    position: at,
                    reason: format!("unknown action type {:#06x} for {}", code, pv),
                })
        } else {
            Ok((ActionType::decode(code, pv, at)?, None))
        }
    }

    fn encode(self, field_type: Option<OxmBasicFieldType>, pv: ProtocolVersion) -> Result<u16> {
        pv.require(self.min_version(), self.name())?;
        if !pv.is_legacy() {
            return Ok(self.code());
        }
        let key = match (self, field_type) {
            (SetField, Some(ft)) => (SetField, Some(collapse_port_field(ft))),
            (t, _) => (t, None),
        };
        legacy_table(pv).encode.get(&key).cloned().ok_or_else(|| {
            OfpError::Internal(format!(
                "no {} opcode for {}{}",
                pv,
                self,
                field_type.map(|ft| format!("/{}", ft)).unwrap_or_default()
            ))
        })
    }

    fn min_len(self, field_type: Option<OxmBasicFieldType>, pv: ProtocolVersion) -> usize {
        match (self, pv) {
            (Output, ProtocolVersion::V1_0) => OUTPUT_10_LEN,
            (Output, _) => OUTPUT_13_LEN,
            (SetQueue, ProtocolVersion::V1_0) => SET_QUEUE_10_LEN,
            (SetField, pv) if pv.is_legacy() => legacy_set_field_len(field_type),
            _ => ACT_MIN_LEN,
        }
    }
}

pub(crate) const ACT_MIN_LEN: usize = 8;
pub(crate) const OUTPUT_10_LEN: usize = 8;
pub(crate) const OUTPUT_13_LEN: usize = 16;
pub(crate) const SET_QUEUE_10_LEN: usize = 16;
pub(crate) const SET_QUEUE_13_LEN: usize = 8;
pub(crate) const SET_10_BASE_LEN: usize = 8;
pub(crate) const SET_10_DL_LEN: usize = 16;

/// Total length of a legacy SET_* action for the given field.
pub(crate) fn legacy_set_field_len(field_type: Option<OxmBasicFieldType>) -> usize {
    match field_type {
        Some(OxmBasicFieldType::EthSrc) | Some(OxmBasicFieldType::EthDst) => SET_10_DL_LEN,
        _ => SET_10_BASE_LEN,
    }
}

// Legacy SET_TP_SRC/SET_TP_DST rewrite whatever transport header the packet
// carries. UDP and SCTP ports therefore encode to the TCP opcodes, and a
// decode can only ever report TCP. The ambiguity is inherent to 1.0/1.1.
fn collapse_port_field(ft: OxmBasicFieldType) -> OxmBasicFieldType {
    use crate::oxm::OxmBasicFieldType::*;
    let collapsed = match ft {
        UdpSrc | SctpSrc => TcpSrc,
        UdpDst | SctpDst => TcpDst,
        other => other,
    };
    if collapsed != ft {
        warn!("legacy encoding maps {} onto {} opcode", ft, collapsed);
    }
    collapsed
}

type LegacyEntry = (u16, ActionType, Option<OxmBasicFieldType>);

/// OpenFlow 1.0 opcodes (`ofp_action_type`).
const LEGACY_1_0: &[LegacyEntry] = &[
    (0, Output, None),
    (1, SetField, Some(OxmBasicFieldType::VlanVid)),
    (2, SetField, Some(OxmBasicFieldType::VlanPcp)),
    (3, PopVlan, None),
    (4, SetField, Some(OxmBasicFieldType::EthSrc)),
    (5, SetField, Some(OxmBasicFieldType::EthDst)),
    (6, SetField, Some(OxmBasicFieldType::Ipv4Src)),
    (7, SetField, Some(OxmBasicFieldType::Ipv4Dst)),
    (8, SetField, Some(OxmBasicFieldType::IpDscp)),
    (9, SetField, Some(OxmBasicFieldType::TcpSrc)),
    (10, SetField, Some(OxmBasicFieldType::TcpDst)),
    (11, SetQueue, None),
    (0xffff, Experimenter, None),
];

/// OpenFlow 1.1 opcodes.
const LEGACY_1_1: &[LegacyEntry] = &[
    (0, Output, None),
    (1, SetField, Some(OxmBasicFieldType::VlanVid)),
    (2, SetField, Some(OxmBasicFieldType::VlanPcp)),
    (3, SetField, Some(OxmBasicFieldType::EthSrc)),
    (4, SetField, Some(OxmBasicFieldType::EthDst)),
    (5, SetField, Some(OxmBasicFieldType::Ipv4Src)),
    (6, SetField, Some(OxmBasicFieldType::Ipv4Dst)),
    (7, SetField, Some(OxmBasicFieldType::IpDscp)),
    (8, SetField, Some(OxmBasicFieldType::IpEcn)),
    (9, SetField, Some(OxmBasicFieldType::TcpSrc)),
    (10, SetField, Some(OxmBasicFieldType::TcpDst)),
    (11, CopyTtlOut, None),
    (12, CopyTtlIn, None),
    (13, SetField, Some(OxmBasicFieldType::MplsLabel)),
    (14, SetField, Some(OxmBasicFieldType::MplsTc)),
    (15, SetMplsTtl, None),
    (16, DecMplsTtl, None),
    (17, PushVlan, None),
    (18, PopVlan, None),
    (19, PushMpls, None),
    (20, PopMpls, None),
    (21, SetQueue, None),
    (22, Group, None),
    (23, SetNwTtl, None),
    (24, DecNwTtl, None),
    (0xffff, Experimenter, None),
];

pub(crate) struct LegacyTable {
    pub decode: HashMap<u16, (ActionType, Option<OxmBasicFieldType>)>,
    pub encode: HashMap<(ActionType, Option<OxmBasicFieldType>), u16>,
}

impl LegacyTable {
    fn build(entries: &[LegacyEntry]) -> LegacyTable {
        LegacyTable {
            decode: entries.iter().map(|&(c, t, ft)| (c, (t, ft))).collect(),
            encode: entries.iter().map(|&(c, t, ft)| ((t, ft), c)).collect(),
        }
    }
}

static TABLE_1_0: Lazy<LegacyTable> = Lazy::new(|| LegacyTable::build(LEGACY_1_0));
static TABLE_1_1: Lazy<LegacyTable> = Lazy::new(|| LegacyTable::build(LEGACY_1_1));

pub(crate) fn legacy_table(pv: ProtocolVersion) -> &'static LegacyTable {
    if pv == ProtocolVersion::V1_0 {
        &TABLE_1_0
    } else {
        &TABLE_1_1
    }
}

/// Legacy opcode for an action type (and set-field type) at 1.0/1.1,
/// or `None` where the version has no such opcode.
pub fn legacy_code(
    pv: ProtocolVersion,
    typ: ActionType,
    field_type: Option<OxmBasicFieldType>,
) -> Option<u16> {
    if !pv.is_legacy() {
        return None;
    }
    legacy_table(pv).encode.get(&(typ, field_type)).cloned()
}

/// Set-field types that have a discrete SET_* opcode at `pv`.
pub fn legacy_field_types(pv: ProtocolVersion) -> Vec<OxmBasicFieldType> {
    let entries = if pv == ProtocolVersion::V1_0 {
        LEGACY_1_0
    } else if pv == ProtocolVersion::V1_1 {
        LEGACY_1_1
    } else {
        return vec![];
    };
    entries.iter().filter_map(|&(_, _, ft)| ft).collect()
}

fn bitmap_valid(pv: ProtocolVersion, t: ActionType) -> bool {
    t.bitmap_version().map_or(false, |min| pv >= min)
}

/// Mask of the bits defined for the version's capability bitmap.
pub fn valid_flags(pv: ProtocolVersion) -> u32 {
    ActionType::ALL
        .iter()
        .filter(|t| bitmap_valid(pv, **t))
        .fold(0, |acc, t| bit(t.code(), acc, true))
}

/// Encode a set of action types as a capability bitmap.
pub fn encode_flags(pv: ProtocolVersion, types: &[ActionType]) -> Result<u32> {
    let mut bits = 0u32;
    for t in types {
        if !bitmap_valid(pv, *t) {
            return Err(match t.bitmap_version() {
                Some(min) => OfpError::mismatch(format!("{} in action bitmap", t), min, pv),
                None => OfpError::invalid(format!("{} has no capability bit", t)),
            });
        }
        bits = bit(t.code(), bits, true);
    }
    Ok(bits)
}

/// Decode a capability bitmap into the action types it names, in code order.
///
/// Bits undefined for `pv` are an error under strict parsing and ignored
/// otherwise.
pub fn decode_flags(pv: ProtocolVersion, bits: u32, cfg: &CodecConfig) -> Result<Vec<ActionType>> {
    let valid = valid_flags(pv);
    let bad = bits & !valid;
    if bad != 0 && cfg.strict_parsing {
        let required = crate::ofp_version::SUPPORTED_VERSIONS
            .iter()
            .cloned()
            .find(|v| bad & !valid_flags(*v) == 0)
            .unwrap_or(ProtocolVersion::V1_3);
        return Err(OfpError::mismatch(
            format!("action bitmap, Bad bits: {:#010x}", bad),
            required,
            pv,
        ));
    }
    Ok(ActionType::ALL
        .iter()
        .cloned()
        .filter(|t| bitmap_valid(pv, *t) && test_bit(t.code(), bits))
        .collect())
}
