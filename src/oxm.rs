//! OpenFlow extensible match (OXM) fields, as far as SET_FIELD actions need them.
//!
//! Only the OpenFlow-basic class (0x8000) is decoded into typed values; any
//! other class is carried as an opaque TLV.

use std::fmt::{Display, Error, Formatter};
use std::net::{Ipv4Addr, Ipv6Addr};

use crate::buffer::{OfpPacketReader, OfpPacketWriter};
use crate::error::{OfpError, Result};
use crate::ofp_version::ProtocolVersion;
use crate::types::MacAddress;

/// OXM class of the OpenFlow-basic match fields.
pub const OFPXMC_OPENFLOW_BASIC: u16 = 0x8000;

/// Length of the OXM TLV header (class, field/hasmask, length).
pub const OXM_HEADER_LEN: usize = 4;

/// Largest payload the one-byte OXM length can describe.
pub const OXM_MAX_PAYLOAD_LEN: usize = u8::max_value() as usize;
/// Largest field number that fits beside the has-mask bit.
const OXM_MAX_FIELD: u8 = 0x7f;

/// Shape of a field's value on the wire.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ValueKind {
    Int,
    Mac,
    Ipv4,
    Ipv6,
}

/// OpenFlow-basic match field types.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OxmBasicFieldType {
    InPort = 0,
    InPhyPort = 1,
    Metadata = 2,
    EthDst = 3,
    EthSrc = 4,
    EthType = 5,
    VlanVid = 6,
    VlanPcp = 7,
    IpDscp = 8,
    IpEcn = 9,
    IpProto = 10,
    Ipv4Src = 11,
    Ipv4Dst = 12,
    TcpSrc = 13,
    TcpDst = 14,
    UdpSrc = 15,
    UdpDst = 16,
    SctpSrc = 17,
    SctpDst = 18,
    Icmpv4Type = 19,
    Icmpv4Code = 20,
    ArpOp = 21,
    ArpSpa = 22,
    ArpTpa = 23,
    ArpSha = 24,
    ArpTha = 25,
    Ipv6Src = 26,
    Ipv6Dst = 27,
    Ipv6Flabel = 28,
    Icmpv6Type = 29,
    Icmpv6Code = 30,
    Ipv6NdTarget = 31,
    Ipv6NdSll = 32,
    Ipv6NdTll = 33,
    MplsLabel = 34,
    MplsTc = 35,
    MplsBos = 36,
    PbbIsid = 37,
    TunnelId = 38,
    Ipv6Exthdr = 39,
}

use self::OxmBasicFieldType::*;

impl OxmBasicFieldType {
    /// Every basic field type, in code order.
    pub const ALL: [OxmBasicFieldType; 40] = [
        InPort, InPhyPort, Metadata, EthDst, EthSrc, EthType, VlanVid, VlanPcp, IpDscp, IpEcn,
        IpProto, Ipv4Src, Ipv4Dst, TcpSrc, TcpDst, UdpSrc, UdpDst, SctpSrc, SctpDst, Icmpv4Type,
        Icmpv4Code, ArpOp, ArpSpa, ArpTpa, ArpSha, ArpTha, Ipv6Src, Ipv6Dst, Ipv6Flabel,
        Icmpv6Type, Icmpv6Code, Ipv6NdTarget, Ipv6NdSll, Ipv6NdTll, MplsLabel, MplsTc, MplsBos,
        PbbIsid, TunnelId, Ipv6Exthdr,
    ];

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<OxmBasicFieldType> {
        OxmBasicFieldType::ALL.get(code as usize).cloned()
    }

    /// Byte width of the (unmasked) value.
    pub fn payload_len(self) -> usize {
        match self {
            VlanPcp | IpDscp | IpEcn | IpProto | Icmpv4Type | Icmpv4Code | Icmpv6Type
            | Icmpv6Code | MplsTc | MplsBos => 1,
            EthType | VlanVid | TcpSrc | TcpDst | UdpSrc | UdpDst | SctpSrc | SctpDst | ArpOp
            | Ipv6Exthdr => 2,
            PbbIsid => 3,
            InPort | InPhyPort | Ipv4Src | Ipv4Dst | ArpSpa | ArpTpa | Ipv6Flabel | MplsLabel => 4,
            EthDst | EthSrc | ArpSha | ArpTha | Ipv6NdSll | Ipv6NdTll => 6,
            Metadata | TunnelId => 8,
            Ipv6Src | Ipv6Dst | Ipv6NdTarget => 16,
        }
    }

    pub fn value_kind(self) -> ValueKind {
        match self {
            EthDst | EthSrc | ArpSha | ArpTha | Ipv6NdSll | Ipv6NdTll => ValueKind::Mac,
            Ipv4Src | Ipv4Dst | ArpSpa | ArpTpa => ValueKind::Ipv4,
            Ipv6Src | Ipv6Dst | Ipv6NdTarget => ValueKind::Ipv6,
            _ => ValueKind::Int,
        }
    }

    /// Whether the field may carry a mask.
    pub fn maskable(self) -> bool {
        match self {
            Metadata | EthDst | EthSrc | VlanVid | Ipv4Src | Ipv4Dst | ArpSpa | ArpTpa
            | ArpSha | ArpTha | Ipv6Src | Ipv6Dst | Ipv6Flabel | PbbIsid | TunnelId
            | Ipv6Exthdr => true,
            _ => false,
        }
    }

    /// Earliest version defining the field as an OXM TLV.
    pub fn min_version(self) -> ProtocolVersion {
        match self {
            MplsBos | PbbIsid | TunnelId | Ipv6Exthdr => ProtocolVersion::V1_3,
            _ => ProtocolVersion::V1_2,
        }
    }

    /// Largest legal integer value, for `ValueKind::Int` fields.
    pub fn max_value(self) -> u64 {
        match self {
            VlanVid => 0x1fff,
            VlanPcp | MplsTc => 0x07,
            IpDscp => 0x3f,
            IpEcn => 0x03,
            MplsBos => 0x01,
            Ipv6Flabel | MplsLabel => 0x0f_ffff,
            Ipv6Exthdr => 0x01ff,
            _ => match self.payload_len() {
                n if n >= 8 => u64::max_value(),
                n => (1u64 << (8 * n)) - 1,
            },
        }
    }

    /// Protocol name, e.g. `VLAN_PCP`.
    pub fn name(self) -> &'static str {
        match self {
            InPort => "IN_PORT",
            InPhyPort => "IN_PHY_PORT",
            Metadata => "METADATA",
            EthDst => "ETH_DST",
            EthSrc => "ETH_SRC",
            EthType => "ETH_TYPE",
            VlanVid => "VLAN_VID",
            VlanPcp => "VLAN_PCP",
            IpDscp => "IP_DSCP",
            IpEcn => "IP_ECN",
            IpProto => "IP_PROTO",
            Ipv4Src => "IPV4_SRC",
            Ipv4Dst => "IPV4_DST",
            TcpSrc => "TCP_SRC",
            TcpDst => "TCP_DST",
            UdpSrc => "UDP_SRC",
            UdpDst => "UDP_DST",
            SctpSrc => "SCTP_SRC",
            SctpDst => "SCTP_DST",
            Icmpv4Type => "ICMPV4_TYPE",
            Icmpv4Code => "ICMPV4_CODE",
            ArpOp => "ARP_OP",
            ArpSpa => "ARP_SPA",
            ArpTpa => "ARP_TPA",
            ArpSha => "ARP_SHA",
            ArpTha => "ARP_THA",
            Ipv6Src => "IPV6_SRC",
            Ipv6Dst => "IPV6_DST",
            Ipv6Flabel => "IPV6_FLABEL",
            Icmpv6Type => "ICMPV6_TYPE",
            Icmpv6Code => "ICMPV6_CODE",
            Ipv6NdTarget => "IPV6_ND_TARGET",
            Ipv6NdSll => "IPV6_ND_SLL",
            Ipv6NdTll => "IPV6_ND_TLL",
            MplsLabel => "MPLS_LABEL",
            MplsTc => "MPLS_TC",
            MplsBos => "MPLS_BOS",
            PbbIsid => "PBB_ISID",
            TunnelId => "TUNNEL_ID",
            Ipv6Exthdr => "IPV6_EXTHDR",
        }
    }
}

impl Display for OxmBasicFieldType {
    fn fmt(&self, f: &mut Formatter) -> std::result::Result<(), Error> {
        f.write_str(self.name())
    }
}

/// Typed value (or mask) of a basic field.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FieldValue {
    Int(u64),
    Mac(MacAddress),
    Ipv4(Ipv4Addr),
    Ipv6(Ipv6Addr),
}

impl FieldValue {
    fn kind(&self) -> ValueKind {
        match *self {
            FieldValue::Int(_) => ValueKind::Int,
            FieldValue::Mac(_) => ValueKind::Mac,
            FieldValue::Ipv4(_) => ValueKind::Ipv4,
            FieldValue::Ipv6(_) => ValueKind::Ipv6,
        }
    }

    fn parse(ft: OxmBasicFieldType, pkt: &mut OfpPacketReader) -> Result<FieldValue> {
        Ok(match ft.value_kind() {
            ValueKind::Mac => FieldValue::Mac(pkt.read_mac()?),
            ValueKind::Ipv4 => FieldValue::Ipv4(pkt.read_ipv4()?),
            ValueKind::Ipv6 => FieldValue::Ipv6(pkt.read_ipv6()?),
            ValueKind::Int => FieldValue::Int(match ft.payload_len() {
                1 => pkt.read_u8()? as u64,
                2 => pkt.read_u16()? as u64,
                3 => pkt.read_u24()? as u64,
                4 => pkt.read_u32()? as u64,
                _ => pkt.read_u64()?,
            }),
        })
    }

    fn marshal(&self, ft: OxmBasicFieldType, pkt: &mut OfpPacketWriter) {
        match *self {
            FieldValue::Mac(mac) => pkt.write_mac(mac),
            FieldValue::Ipv4(ip) => pkt.write_ipv4(ip),
            FieldValue::Ipv6(ip) => pkt.write_ipv6(ip),
            FieldValue::Int(v) => match ft.payload_len() {
                1 => pkt.write_u8(v as u8),
                2 => pkt.write_u16(v as u16),
                3 => pkt.write_u24(v as u32),
                4 => pkt.write_u32(v as u32),
                _ => pkt.write_u64(v),
            },
        }
    }
}

impl Display for FieldValue {
    fn fmt(&self, f: &mut Formatter) -> std::result::Result<(), Error> {
        match *self {
            FieldValue::Int(v) => write!(f, "{}", v),
            FieldValue::Mac(m) => write!(f, "{}", m),
            FieldValue::Ipv4(ip) => write!(f, "{}", ip),
            FieldValue::Ipv6(ip) => write!(f, "{}", ip),
        }
    }
}

/// OpenFlow-basic match field with a typed value.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BasicField {
    field_type: OxmBasicFieldType,
    value: FieldValue,
    mask: Option<FieldValue>,
}

impl BasicField {
    /// Build an unmasked field, checking the value against the field's domain.
    pub fn new(ft: OxmBasicFieldType, value: FieldValue) -> Result<BasicField> {
        BasicField::check(ft, &value)?;
        Ok(BasicField {
            field_type: ft,
            value,
            mask: None,
        })
    }

    /// Build a masked field; the type must be maskable.
    pub fn with_mask(ft: OxmBasicFieldType, value: FieldValue, mask: FieldValue) -> Result<BasicField> {
        if !ft.maskable() {
            return Err(OfpError::invalid(format!("{} cannot be masked", ft)));
        }
        BasicField::check(ft, &value)?;
        BasicField::check(ft, &mask)?;
        Ok(BasicField {
            field_type: ft,
            value,
            mask: Some(mask),
        })
    }

    /// Integer-valued field.
    pub fn int(ft: OxmBasicFieldType, value: u64) -> Result<BasicField> {
        BasicField::new(ft, FieldValue::Int(value))
    }

    /// MAC-valued field.
    pub fn mac(ft: OxmBasicFieldType, mac: MacAddress) -> Result<BasicField> {
        BasicField::new(ft, FieldValue::Mac(mac))
    }

    /// IPv4-valued field.
    pub fn ipv4(ft: OxmBasicFieldType, ip: Ipv4Addr) -> Result<BasicField> {
        BasicField::new(ft, FieldValue::Ipv4(ip))
    }

    /// IPv6-valued field.
    pub fn ipv6(ft: OxmBasicFieldType, ip: Ipv6Addr) -> Result<BasicField> {
        BasicField::new(ft, FieldValue::Ipv6(ip))
    }

    /// Build without domain checks; decoders accept whatever the wire holds.
    pub(crate) fn decoded(ft: OxmBasicFieldType, value: FieldValue) -> BasicField {
        BasicField {
            field_type: ft,
            value,
            mask: None,
        }
    }

    fn check(ft: OxmBasicFieldType, value: &FieldValue) -> Result<()> {
        if value.kind() != ft.value_kind() {
            return Err(OfpError::invalid(format!(
                "{} expects a {:?} value, got {:?}",
                ft,
                ft.value_kind(),
                value
            )));
        }
        if let FieldValue::Int(v) = *value {
            if v > ft.max_value() {
                return Err(OfpError::invalid(format!(
                    "{} value {:#x} exceeds {:#x}",
                    ft,
                    v,
                    ft.max_value()
                )));
            }
        }
        Ok(())
    }

    pub fn field_type(&self) -> OxmBasicFieldType {
        self.field_type
    }

    pub fn value(&self) -> FieldValue {
        self.value
    }

    pub fn mask(&self) -> Option<FieldValue> {
        self.mask
    }

    /// Integer value, for `ValueKind::Int` fields.
    pub fn int_value(&self) -> Option<u64> {
        match self.value {
            FieldValue::Int(v) => Some(v),
            _ => None,
        }
    }
}

/// OXM TLV of a class other than OpenFlow-basic, kept opaque.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RawField {
    pub class: u16,
    pub field: u8,
    pub has_mask: bool,
    pub payload: Vec<u8>,
}

/// A single OXM TLV.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum MatchField {
    Basic(BasicField),
    Raw(RawField),
}

impl From<BasicField> for MatchField {
    fn from(f: BasicField) -> MatchField {
        MatchField::Basic(f)
    }
}

impl MatchField {
    /// Basic field type, if this is an OpenFlow-basic field.
    pub fn field_type(&self) -> Option<OxmBasicFieldType> {
        match *self {
            MatchField::Basic(ref b) => Some(b.field_type),
            MatchField::Raw(_) => None,
        }
    }

    pub fn is_masked(&self) -> bool {
        match *self {
            MatchField::Basic(ref b) => b.mask.is_some(),
            MatchField::Raw(ref r) => r.has_mask,
        }
    }

    /// Length of the payload following the OXM header.
    pub fn payload_len(&self) -> usize {
        match *self {
            MatchField::Basic(ref b) => {
                let w = b.field_type.payload_len();
                if b.mask.is_some() {
                    2 * w
                } else {
                    w
                }
            }
            MatchField::Raw(ref r) => r.payload.len(),
        }
    }

    /// Total TLV length, header included.
    pub fn size_of(&self) -> usize {
        OXM_HEADER_LEN + self.payload_len()
    }

    /// Decode one OXM TLV.
    pub fn parse(pv: ProtocolVersion, pkt: &mut OfpPacketReader) -> Result<MatchField> {
        let at = pkt.ri();
        let class = pkt.read_u16()?;
        let fh = pkt.read_u8()?;
        let len = pkt.read_u8()? as usize;
        let field = fh >> 1;
        let has_mask = fh & 1 == 1;

        let ft = match OxmBasicFieldType::from_code(field) {
            Some(ft) if class == OFPXMC_OPENFLOW_BASIC => ft,
            _ => {
                return Ok(MatchField::Raw(RawField {
                    class,
                    field,
                    has_mask,
                    payload: pkt.read_bytes(len)?,
                }))
            }
        };
        pv.require(ft.min_version(), ft.name())?;
        let expected = if has_mask {
            2 * ft.payload_len()
        } else {
            ft.payload_len()
        };
        if len != expected {
            return Err(OfpError::Decode {
                position: at,
                reason: format!("{} payload length {} (expected {})", ft, len, expected),
            });
        }
        let value = FieldValue::parse(ft, pkt)?;
        let mask = if has_mask {
            Some(FieldValue::parse(ft, pkt)?)
        } else {
            None
        };
        Ok(MatchField::Basic(BasicField {
            field_type: ft,
            value,
            mask,
        }))
    }

    /// Encode one OXM TLV.
    pub fn marshal(&self, pv: ProtocolVersion, pkt: &mut OfpPacketWriter) -> Result<()> {
        let len = self.payload_len();
        if len > OXM_MAX_PAYLOAD_LEN {
            return Err(OfpError::invalid(format!(
                "{} payload of {} bytes exceeds {}",
                self, len, OXM_MAX_PAYLOAD_LEN
            )));
        }
        match *self {
            MatchField::Basic(ref b) => {
                pv.require(b.field_type.min_version(), b.field_type.name())?;
                pkt.write_u16(OFPXMC_OPENFLOW_BASIC);
                pkt.write_u8(b.field_type.code() << 1 | b.mask.is_some() as u8);
                pkt.write_u8(len as u8);
                b.value.marshal(b.field_type, pkt);
                if let Some(ref m) = b.mask {
                    m.marshal(b.field_type, pkt);
                }
            }
            MatchField::Raw(ref r) => {
                if r.field > OXM_MAX_FIELD {
                    return Err(OfpError::invalid(format!("OXM field {} exceeds 7 bits", r.field)));
                }
                pkt.write_u16(r.class);
                pkt.write_u8(r.field << 1 | r.has_mask as u8);
                pkt.write_u8(len as u8);
                pkt.write_bytes(&r.payload);
            }
        }
        Ok(())
    }
}

impl Display for MatchField {
    fn fmt(&self, f: &mut Formatter) -> std::result::Result<(), Error> {
        match *self {
            MatchField::Basic(ref b) => {
                write!(f, "{}={}", b.field_type, b.value)?;
                if let Some(m) = b.mask {
                    write!(f, "/{}", m)?;
                }
                Ok(())
            }
            MatchField::Raw(ref r) => write!(
                f,
                "OXM[class={:#06x},field={},len={}]",
                r.class,
                r.field,
                r.payload.len()
            ),
        }
    }
}
