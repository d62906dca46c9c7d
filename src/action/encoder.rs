//! Encoding of actions and action lists.

use tracing::trace;

use crate::action::parser::{LEGACY_NO_VLAN, OFPVID_PRESENT};
use crate::action::{Action, ActionKind};
use crate::buffer::OfpPacketWriter;
use crate::error::{OfpError, Result};
use crate::ofp_header::STRUCT_HEADER_LEN;
use crate::ofp_version::ProtocolVersion;
use crate::oxm::{BasicField, FieldValue, MatchField};

/// Write a single action, in the encoding of the version it was built for.
pub fn encode_action(act: &Action, pkt: &mut OfpPacketWriter) -> Result<()> {
    let pv = act.version();
    let start = pkt.wi();
    act.header().marshal(pv, pkt)?;
    match *act.kind() {
        ActionKind::Output { port, max_len } => {
            port.marshal(pv, pkt)?;
            pkt.write_u16(max_len);
            if pv > ProtocolVersion::V1_0 {
                pkt.write_zeros(6);
            }
        }
        ActionKind::CopyTtlOut
        | ActionKind::CopyTtlIn
        | ActionKind::DecMplsTtl
        | ActionKind::PopVlan
        | ActionKind::DecNwTtl
        | ActionKind::PopPbb => pkt.write_zeros(4),
        ActionKind::SetMplsTtl(ttl) | ActionKind::SetNwTtl(ttl) => {
            pkt.write_u8(ttl);
            pkt.write_zeros(3);
        }
        ActionKind::PushVlan(et)
        | ActionKind::PushMpls(et)
        | ActionKind::PopMpls(et)
        | ActionKind::PushPbb(et) => {
            pkt.write_u16(et.0);
            pkt.write_zeros(2);
        }
        ActionKind::SetQueue { queue_id, port } => {
            if pv == ProtocolVersion::V1_0 {
                let port = port.ok_or_else(|| OfpError::invalid("1.0 ENQUEUE needs a port"))?;
                port.marshal(pv, pkt)?;
                pkt.write_zeros(6);
            }
            pkt.write_u32(queue_id.0);
        }
        ActionKind::Group(g) => pkt.write_u32(g.0),
        ActionKind::SetField(ref field) => {
            if pv.is_legacy() {
                legacy_set_field(pv, field, pkt)?;
            } else {
                field.marshal(pv, pkt)?;
                let pad = act.length().saturating_sub(STRUCT_HEADER_LEN + field.size_of());
                pkt.write_zeros(pad);
            }
        }
        ActionKind::Experimenter { id, ref data } => {
            pkt.write_u32(id);
            pkt.write_bytes(data);
        }
        ActionKind::Header { .. } => {
            pkt.write_zeros(act.length().saturating_sub(STRUCT_HEADER_LEN));
        }
    }
    trace!("encoded {} ({} bytes) at {}", act, pkt.wi() - start, start);
    Ok(())
}

/// Write actions back to back.
pub fn encode_action_list(actions: &[Action], pkt: &mut OfpPacketWriter) -> Result<()> {
    for act in actions {
        encode_action(act, pkt)?;
    }
    Ok(())
}

/// Encode actions into a fresh buffer.
pub fn encode_action_list_to_vec(actions: &[Action]) -> Result<Vec<u8>> {
    let mut pkt = OfpPacketWriter::new();
    encode_action_list(actions, &mut pkt)?;
    Ok(pkt.into_inner())
}

/// Write the fixed-shape payload of a 1.0/1.1 SET_* action.
fn legacy_set_field(pv: ProtocolVersion, field: &MatchField, pkt: &mut OfpPacketWriter) -> Result<()> {
    use crate::oxm::OxmBasicFieldType::*;
    let basic = match *field {
        MatchField::Basic(ref b) => b,
        MatchField::Raw(_) => {
            return Err(OfpError::Internal(format!(
                "non-basic field {} has no {} encoding",
                field, pv
            )))
        }
    };
    match basic.field_type() {
        VlanVid => {
            let v = int_of(basic)? as u16;
            if v & OFPVID_PRESENT == 0 {
                pkt.write_u16(LEGACY_NO_VLAN);
            } else {
                pkt.write_u16(v & 0x0fff);
            }
            pkt.write_zeros(2);
        }
        VlanPcp | IpDscp | IpEcn | MplsTc => {
            pkt.write_u8(int_of(basic)? as u8);
            pkt.write_zeros(3);
        }
        EthSrc | EthDst => match basic.value() {
            FieldValue::Mac(mac) => {
                pkt.write_mac(mac);
                pkt.write_zeros(6);
            }
            other => return Err(mistyped(basic, other)),
        },
        Ipv4Src | Ipv4Dst => match basic.value() {
            FieldValue::Ipv4(ip) => pkt.write_ipv4(ip),
            other => return Err(mistyped(basic, other)),
        },
        TcpSrc | TcpDst | UdpSrc | UdpDst | SctpSrc | SctpDst => {
            pkt.write_u16(int_of(basic)? as u16);
            pkt.write_zeros(2);
        }
        MplsLabel => pkt.write_u32(int_of(basic)? as u32),
        other => {
            return Err(OfpError::Internal(format!(
                "no {} set-field layout for {}",
                pv, other
            )))
        }
    }
    Ok(())
}

fn int_of(field: &BasicField) -> Result<u64> {
    match field.value() {
        FieldValue::Int(v) => Ok(v),
        other => Err(mistyped(field, other)),
    }
}

fn mistyped(field: &BasicField, value: FieldValue) -> OfpError {
    OfpError::Internal(format!("{} carries a {:?} value", field.field_type(), value))
}
