//! Decoding of actions and action lists.

use tracing::trace;

use crate::action::{Action, ActionHeader, ActionKind, ActionType};
use crate::buffer::OfpPacketReader;
use crate::config::CodecConfig;
use crate::error::{OfpError, Result};
use crate::ofp_header::{verify_target_ri, STRUCT_HEADER_LEN};
use crate::ofp_port::PortNumber;
use crate::ofp_version::ProtocolVersion;
use crate::oxm::{BasicField, FieldValue, MatchField, OxmBasicFieldType};
use crate::types::{EthernetType, GroupId, QueueId};

const EXP_ID_LEN: usize = 4;
const PAD_HEADER: usize = 4;
const PAD_TTL: usize = 3;
const PAD_ETH_TYPE: usize = 2;
const PAD_OUTPUT_13: usize = 6;
const PAD_SET_QUEUE_10: usize = 6;

const PAD_SET_VLAN_VID_10: usize = 2;
const PAD_SET_U8_10: usize = 3;
const PAD_SET_DL_ADDR_10: usize = 6;
const PAD_SET_TP_PORT_10: usize = 2;

/// Legacy SET_VLAN_VID value meaning "no VLAN".
pub(crate) const LEGACY_NO_VLAN: u16 = 0xffff;
/// OXM VLAN_VID flag marking a present VLAN tag.
pub(crate) const OFPVID_PRESENT: u16 = 0x1000;
/// Largest VLAN id a legacy SET_VLAN_VID carries.
const LEGACY_VID_MAX: u16 = 0x0fff;

/// Parse back-to-back actions until the reader reaches `target_ri`.
///
/// The final reader index must equal `target_ri`; any overrun is reported as
/// `OfpError::OffBy` with the signed difference.
pub fn parse_action_list(
    pv: ProtocolVersion,
    pkt: &mut OfpPacketReader,
    target_ri: usize,
) -> Result<Vec<Action>> {
    let mut v = vec![];
    while pkt.ri() < target_ri {
        v.push(parse_action(pv, pkt)?);
    }
    verify_target_ri(target_ri, pkt)?;
    Ok(v)
}

/// Parse a list of action header stubs, as found in table-features properties.
///
/// Experimenter elements keep their id and payload. Other elements are reduced
/// to their type; any bytes past the 4-byte header are skipped, or rejected
/// under strict parsing.
pub fn parse_action_headers(
    pv: ProtocolVersion,
    pkt: &mut OfpPacketReader,
    target_ri: usize,
    cfg: &CodecConfig,
) -> Result<Vec<Action>> {
    let mut v = vec![];
    while pkt.ri() < target_ri {
        v.push(parse_action_header(pv, pkt, cfg)?);
    }
    verify_target_ri(target_ri, pkt)?;
    Ok(v)
}

fn parse_action_header(
    pv: ProtocolVersion,
    pkt: &mut OfpPacketReader,
    cfg: &CodecConfig,
) -> Result<Action> {
    let at = pkt.ri();
    let header = ActionHeader::parse(pv, pkt)?;
    let length = header.length();
    let kind = match header.type_code() {
        ActionType::Experimenter => {
            if length % 8 != 0 {
                return Err(OfpError::Decode {
                    position: at,
                    reason: format!("experimenter header length {} not a multiple of 8", length),
                });
            }
            header.check_min_len(pv, at)?;
            experimenter(length, pkt)?
        }
        typ => {
            if cfg.strict_parsing && length != STRUCT_HEADER_LEN {
                return Err(OfpError::Decode {
                    position: at,
                    reason: format!("{} header length {} (expected 4)", typ, length),
                });
            }
            pkt.skip(length.saturating_sub(STRUCT_HEADER_LEN))?;
            ActionKind::Header {
                typ,
                field_type: header.field_type(),
            }
        }
    };
    trace!("parsed action header {:?} ({} bytes) at {}", kind, length, at);
    Ok(Action::with_length(pv, length as u16, kind))
}

/// Parse a single action.
pub fn parse_action(pv: ProtocolVersion, pkt: &mut OfpPacketReader) -> Result<Action> {
    let at = pkt.ri();
    let header = ActionHeader::parse(pv, pkt)?;
    header.check_min_len(pv, at)?;
    let kind = match header.type_code() {
        ActionType::Output => output(pv, pkt)?,
        ActionType::CopyTtlOut => header_only(pkt, ActionKind::CopyTtlOut)?,
        ActionType::CopyTtlIn => header_only(pkt, ActionKind::CopyTtlIn)?,
        ActionType::SetMplsTtl => ActionKind::SetMplsTtl(ttl(pkt)?),
        ActionType::DecMplsTtl => header_only(pkt, ActionKind::DecMplsTtl)?,
        ActionType::PushVlan => ActionKind::PushVlan(ether_type(pkt)?),
        ActionType::PopVlan => header_only(pkt, ActionKind::PopVlan)?,
        ActionType::PushMpls => ActionKind::PushMpls(ether_type(pkt)?),
        ActionType::PopMpls => ActionKind::PopMpls(ether_type(pkt)?),
        ActionType::SetQueue => set_queue(pv, pkt)?,
        ActionType::Group => ActionKind::Group(GroupId(pkt.read_u32()?)),
        ActionType::SetNwTtl => ActionKind::SetNwTtl(ttl(pkt)?),
        ActionType::DecNwTtl => header_only(pkt, ActionKind::DecNwTtl)?,
        ActionType::SetField => set_field(pv, &header, at, pkt)?,
        ActionType::PushPbb => ActionKind::PushPbb(ether_type(pkt)?),
        ActionType::PopPbb => header_only(pkt, ActionKind::PopPbb)?,
        ActionType::Experimenter => experimenter(header.length(), pkt)?,
    };
    trace!("parsed {:?} ({} bytes) at {}", kind, header.length(), at);
    Ok(Action::with_length(pv, header.length() as u16, kind))
}

fn header_only(pkt: &mut OfpPacketReader, kind: ActionKind) -> Result<ActionKind> {
    pkt.skip(PAD_HEADER)?;
    Ok(kind)
}

fn ttl(pkt: &mut OfpPacketReader) -> Result<u8> {
    let ttl = pkt.read_u8()?;
    pkt.skip(PAD_TTL)?;
    Ok(ttl)
}

fn ether_type(pkt: &mut OfpPacketReader) -> Result<EthernetType> {
    let et = pkt.read_u16()?;
    pkt.skip(PAD_ETH_TYPE)?;
    Ok(EthernetType(et))
}

fn output(pv: ProtocolVersion, pkt: &mut OfpPacketReader) -> Result<ActionKind> {
    let port = PortNumber::parse(pv, pkt)?;
    let max_len = pkt.read_u16()?;
    if pv > ProtocolVersion::V1_0 {
        pkt.skip(PAD_OUTPUT_13)?;
    }
    Ok(ActionKind::Output { port, max_len })
}

fn set_queue(pv: ProtocolVersion, pkt: &mut OfpPacketReader) -> Result<ActionKind> {
    if pv == ProtocolVersion::V1_0 {
        let port = PortNumber::parse(pv, pkt)?;
        pkt.skip(PAD_SET_QUEUE_10)?;
        let queue_id = QueueId(pkt.read_u32()?);
        Ok(ActionKind::SetQueue {
            queue_id,
            port: Some(port),
        })
    } else {
        Ok(ActionKind::SetQueue {
            queue_id: QueueId(pkt.read_u32()?),
            port: None,
        })
    }
}

fn experimenter(length: usize, pkt: &mut OfpPacketReader) -> Result<ActionKind> {
    let id = pkt.read_u32()?;
    let data = pkt.read_bytes(length - STRUCT_HEADER_LEN - EXP_ID_LEN)?;
    Ok(ActionKind::Experimenter { id, data })
}

fn set_field(
    pv: ProtocolVersion,
    header: &ActionHeader,
    at: usize,
    pkt: &mut OfpPacketReader,
) -> Result<ActionKind> {
    if pv.is_legacy() {
        return legacy_set_field(header, at, pkt);
    }
    let field = MatchField::parse(pv, pkt)?;
    let used = STRUCT_HEADER_LEN + field.size_of();
    if used > header.length() {
        return Err(OfpError::Decode {
            position: at,
            reason: format!(
                "SET_FIELD length {} shorter than its {} byte field",
                header.length(),
                field.size_of()
            ),
        });
    }
    pkt.skip(header.length() - used)?;
    Ok(ActionKind::SetField(field))
}

/// Read the fixed-shape payload of a 1.0/1.1 SET_* action.
fn legacy_set_field(header: &ActionHeader, at: usize, pkt: &mut OfpPacketReader) -> Result<ActionKind> {
    use crate::oxm::OxmBasicFieldType::*;
    let ft = header.field_type().ok_or_else(|| OfpError::Decode {
        position: at,
        reason: "legacy set-field opcode without a field type".to_string(),
    })?;
    let value = match ft {
        VlanVid => {
            let vid = pkt.read_u16()?;
            pkt.skip(PAD_SET_VLAN_VID_10)?;
            if vid == LEGACY_NO_VLAN {
                FieldValue::Int(0)
            } else if vid > LEGACY_VID_MAX {
                return Err(OfpError::Decode {
                    position: at,
                    reason: format!("SET_VLAN_VID value {:#06x} out of range", vid),
                });
            } else {
                FieldValue::Int((OFPVID_PRESENT | vid) as u64)
            }
        }
        VlanPcp | IpDscp | IpEcn | MplsTc => {
            let v = pkt.read_u8()?;
            pkt.skip(PAD_SET_U8_10)?;
            FieldValue::Int(v as u64)
        }
        EthSrc | EthDst => {
            let mac = pkt.read_mac()?;
            pkt.skip(PAD_SET_DL_ADDR_10)?;
            FieldValue::Mac(mac)
        }
        Ipv4Src | Ipv4Dst => FieldValue::Ipv4(pkt.read_ipv4()?),
        TcpSrc | TcpDst => {
            let port = pkt.read_u16()?;
            pkt.skip(PAD_SET_TP_PORT_10)?;
            FieldValue::Int(port as u64)
        }
        MplsLabel => FieldValue::Int(pkt.read_u32()? as u64),
        other => return Err(unmapped(other)),
    };
    Ok(ActionKind::SetField(MatchField::Basic(BasicField::decoded(ft, value))))
}

fn unmapped(ft: OxmBasicFieldType) -> OfpError {
    OfpError::Internal(format!("no legacy payload layout for {}", ft))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MacAddress;

    fn parse_one(pv: ProtocolVersion, bytes: &[u8]) -> Result<Action> {
        let mut pkt = OfpPacketReader::new(bytes);
        let a = parse_action(pv, &mut pkt)?;
        assert_eq!(pkt.ri(), a.length());
        Ok(a)
    }

    #[test]
    fn output_1_3() {
        let bytes = [0, 0, 0, 16, 0, 0, 0, 5, 0, 0, 0, 0, 0, 0, 0, 0];
        let a = parse_one(ProtocolVersion::V1_3, &bytes).unwrap();
        assert_eq!(
            a.kind(),
            &ActionKind::Output {
                port: PortNumber(5),
                max_len: 0
            }
        );
        assert_eq!(a.length(), 16);
    }

    #[test]
    fn output_1_0_controller() {
        let bytes = [0, 0, 0, 8, 0xff, 0xfd, 0, 0x80];
        let a = parse_one(ProtocolVersion::V1_0, &bytes).unwrap();
        assert_eq!(
            a.kind(),
            &ActionKind::Output {
                port: PortNumber::CONTROLLER,
                max_len: 128
            }
        );
    }

    #[test]
    fn legacy_vlan_pcp() {
        let bytes = [0x00, 0x02, 0x00, 0x08, 0x03, 0x00, 0x00, 0x00];
        let a = parse_one(ProtocolVersion::V1_0, &bytes).unwrap();
        assert_eq!(a.action_type(), ActionType::SetField);
        match a.kind() {
            ActionKind::SetField(MatchField::Basic(f)) => {
                assert_eq!(f.field_type(), OxmBasicFieldType::VlanPcp);
                assert_eq!(f.int_value(), Some(3));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn legacy_vlan_vid_none() {
        let bytes = [0x00, 0x01, 0x00, 0x08, 0xff, 0xff, 0x00, 0x00];
        let a = parse_one(ProtocolVersion::V1_0, &bytes).unwrap();
        assert_eq!(a.kind().field_type(), Some(OxmBasicFieldType::VlanVid));
        match a.kind() {
            ActionKind::SetField(MatchField::Basic(f)) => assert_eq!(f.int_value(), Some(0)),
            other => panic!("unexpected {:?}", other),
        }

        let bytes = [0x00, 0x01, 0x00, 0x08, 0x00, 0x2a, 0x00, 0x00];
        let a = parse_one(ProtocolVersion::V1_1, &bytes).unwrap();
        match a.kind() {
            ActionKind::SetField(MatchField::Basic(f)) => assert_eq!(f.int_value(), Some(0x102a)),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn legacy_vlan_vid_out_of_range() {
        for vid in &[0x1005u16, 0x1000, 0x8000, 0xfffe] {
            let bytes = [0, 1, 0, 8, (vid >> 8) as u8, *vid as u8, 0, 0];
            for pv in &[ProtocolVersion::V1_0, ProtocolVersion::V1_1] {
                let mut pkt = OfpPacketReader::new(&bytes);
                match parse_action(*pv, &mut pkt) {
                    Err(OfpError::Decode { position: 0, .. }) => {}
                    other => panic!("unexpected {:?} for {:#06x}", other, vid),
                }
            }
        }
        assert!(parse_one(ProtocolVersion::V1_0, &[0, 1, 0, 8, 0x0f, 0xff, 0, 0]).is_ok());
    }

    #[test]
    fn legacy_dl_dst_1_1() {
        let bytes = [0, 4, 0, 16, 1, 2, 3, 4, 5, 6, 0, 0, 0, 0, 0, 0];
        let a = parse_one(ProtocolVersion::V1_1, &bytes).unwrap();
        match a.kind() {
            ActionKind::SetField(MatchField::Basic(f)) => {
                assert_eq!(f.field_type(), OxmBasicFieldType::EthDst);
                assert_eq!(f.value(), FieldValue::Mac(MacAddress([1, 2, 3, 4, 5, 6])));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn enqueue_1_0() {
        let bytes = [0, 11, 0, 16, 0, 3, 0, 0, 0, 0, 0, 0, 0, 0, 0, 7];
        let a = parse_one(ProtocolVersion::V1_0, &bytes).unwrap();
        assert_eq!(
            a.kind(),
            &ActionKind::SetQueue {
                queue_id: QueueId(7),
                port: Some(PortNumber(3))
            }
        );
    }

    #[test]
    fn modern_set_field_padding() {
        // SET_FIELD, len 16, OXM VLAN_PCP=5, 3 bytes pad
        let bytes = [0, 25, 0, 16, 0x80, 0x00, 0x0e, 0x01, 0x05, 0, 0, 0, 0, 0, 0, 0];
        let a = parse_one(ProtocolVersion::V1_3, &bytes).unwrap();
        assert_eq!(a.kind().field_type(), Some(OxmBasicFieldType::VlanPcp));
    }

    #[test]
    fn too_short() {
        let bytes = [0, 0, 0, 8, 0, 0, 0, 5];
        let err = parse_one(ProtocolVersion::V1_3, &bytes).unwrap_err();
        match err {
            OfpError::HeaderParse { position, .. } => assert_eq!(position, 0),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn truncated_is_decode_failure() {
        let bytes = [0, 22, 0, 8, 0, 0];
        assert!(parse_one(ProtocolVersion::V1_3, &bytes).unwrap_err().is_decode_failure());
    }

    #[test]
    fn pbb_at_1_2() {
        let bytes = [0, 27, 0, 8, 0, 0, 0, 0];
        match parse_one(ProtocolVersion::V1_2, &bytes) {
            Err(OfpError::VersionMismatch { .. }) => {}
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn list_off_by() {
        // DEC_NW_TTL (8) followed by GROUP (8); target in the middle of the second
        let bytes = [0, 24, 0, 8, 0, 0, 0, 0, 0, 22, 0, 8, 0, 0, 0, 9];
        let mut pkt = OfpPacketReader::new(&bytes);
        assert_eq!(
            parse_action_list(ProtocolVersion::V1_3, &mut pkt, 12),
            Err(OfpError::OffBy {
                target: 12,
                delta: 4
            })
        );

        let mut pkt = OfpPacketReader::new(&bytes);
        let list = parse_action_list(ProtocolVersion::V1_3, &mut pkt, 16).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[1].kind(), &ActionKind::Group(GroupId(9)));
    }

    #[test]
    fn header_stubs() {
        let bytes = [
            0, 0, 0, 4, // OUTPUT
            0, 25, 0, 4, // SET_FIELD
            0xff, 0xff, 0, 16, 0, 0, 0x23, 0x20, 1, 2, 3, 4, 5, 6, 7, 8, // experimenter
            0, 22, 0, 8, 0, 0, 0, 0, // GROUP with a trailing pad
        ];
        let mut pkt = OfpPacketReader::new(&bytes);
        let list = parse_action_headers(
            ProtocolVersion::V1_3,
            &mut pkt,
            bytes.len(),
            &CodecConfig::default(),
        )
        .unwrap();
        assert_eq!(list.len(), 4);
        assert!(list[0].is_header_stub());
        assert_eq!(list[1].action_type(), ActionType::SetField);
        assert_eq!(
            list[2].kind(),
            &ActionKind::Experimenter {
                id: 0x2320,
                data: vec![1, 2, 3, 4, 5, 6, 7, 8]
            }
        );
        assert_eq!(list[3].length(), 8);

        let mut pkt = OfpPacketReader::new(&bytes);
        assert!(parse_action_headers(
            ProtocolVersion::V1_3,
            &mut pkt,
            bytes.len(),
            &CodecConfig::strict()
        )
        .unwrap_err()
        .is_decode_failure());
    }

    #[test]
    fn experimenter_stub_alignment() {
        let bytes = [0xff, 0xff, 0, 12, 0, 0, 0x23, 0x20, 1, 2, 3, 4];
        let mut pkt = OfpPacketReader::new(&bytes);
        assert!(parse_action_headers(
            ProtocolVersion::V1_3,
            &mut pkt,
            bytes.len(),
            &CodecConfig::default()
        )
        .unwrap_err()
        .is_decode_failure());
    }
}
