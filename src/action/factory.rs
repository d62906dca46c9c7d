//! Validated construction of actions.
//!
//! Every constructor checks the protocol version first, then the argument
//! domains, and computes the encoded length up front so the result can be
//! written without further checks.

use std::net::IpAddr;

use tracing::debug;

use crate::action::codes::ACT_MIN_LEN;
use crate::action::{Action, ActionKind, ActionType};
use crate::error::{OfpError, Result};
use crate::ofp_header::MAX_STRUCT_LEN;
use crate::ofp_port::PortNumber;
use crate::ofp_version::ProtocolVersion;
use crate::oxm::{BasicField, MatchField, OxmBasicFieldType};
use crate::types::{EthernetType, GroupId, MacAddress, QueueId};

/// Largest max-length that may be requested for packets sent to the controller.
pub const CONTROLLER_MAX: u16 = 0xffe5;
/// Max-length meaning "send the whole packet, do not buffer it".
pub const CONTROLLER_NO_BUFFER: u16 = 0xffff;

/// Action types permitted in 1.0 messages, in modern terms.
const V10_ACT_TYPES: [ActionType; 5] = [
    ActionType::Output,
    ActionType::PopVlan,
    ActionType::SetQueue,
    ActionType::SetField,
    ActionType::Experimenter,
];

/// Set-field types with a 1.0 SET_* opcode.
const V10_SET_FIELD_TYPES: [OxmBasicFieldType; 9] = [
    OxmBasicFieldType::VlanVid,
    OxmBasicFieldType::VlanPcp,
    OxmBasicFieldType::EthSrc,
    OxmBasicFieldType::EthDst,
    OxmBasicFieldType::Ipv4Src,
    OxmBasicFieldType::Ipv4Dst,
    OxmBasicFieldType::IpDscp,
    OxmBasicFieldType::TcpSrc,
    OxmBasicFieldType::TcpDst,
];

fn reject(msg: String) -> OfpError {
    debug!("rejected action: {}", msg);
    OfpError::InvalidArgument(msg)
}

fn unexpected(typ: ActionType) -> OfpError {
    reject(format!("unexpected action type {}", typ))
}

/// Create a header-only action (COPY_TTL_*, DEC_*_TTL, POP_VLAN, POP_PBB).
pub fn create_action(pv: ProtocolVersion, typ: ActionType) -> Result<Action> {
    let kind = match typ {
        ActionType::CopyTtlOut => ActionKind::CopyTtlOut,
        ActionType::CopyTtlIn => ActionKind::CopyTtlIn,
        ActionType::DecMplsTtl => ActionKind::DecMplsTtl,
        ActionType::DecNwTtl => ActionKind::DecNwTtl,
        ActionType::PopVlan => ActionKind::PopVlan,
        ActionType::PopPbb => ActionKind::PopPbb,
        other => return Err(unexpected(other)),
    };
    pv.require(typ.min_version(), typ.name())?;
    Action::new(pv, kind)
}

/// Create an OUTPUT action.
///
/// `max_len` only means something for the CONTROLLER port, where it is
/// 0..=`CONTROLLER_MAX` or `CONTROLLER_NO_BUFFER`. Any other port takes 0 or
/// `CONTROLLER_NO_BUFFER`.
pub fn create_output(pv: ProtocolVersion, port: PortNumber, max_len: u16) -> Result<Action> {
    if port != PortNumber::CONTROLLER && max_len != 0 && max_len != CONTROLLER_NO_BUFFER {
        return Err(reject(format!(
            "max_len {} given for non-controller port {}",
            max_len, port
        )));
    }
    if max_len != CONTROLLER_NO_BUFFER && max_len > CONTROLLER_MAX {
        return Err(reject(format!("max_len {:#x} out of bounds", max_len)));
    }
    port.validate(pv)?;
    Action::new(pv, ActionKind::Output { port, max_len })
}

/// Create an OUTPUT action with a zero max-length.
pub fn create_output_port(pv: ProtocolVersion, port: PortNumber) -> Result<Action> {
    create_output(pv, port, 0)
}

/// Create a GROUP action.
pub fn create_group(pv: ProtocolVersion, group_id: GroupId) -> Result<Action> {
    pv.require(ActionType::Group.min_version(), ActionType::Group.name())?;
    Action::new(pv, ActionKind::Group(group_id))
}

/// Create a 1.1+ SET_QUEUE action.
pub fn create_set_queue(pv: ProtocolVersion, queue_id: QueueId) -> Result<Action> {
    if pv == ProtocolVersion::V1_0 {
        return Err(reject("1.0 SET_QUEUE (ENQUEUE) needs a port".to_string()));
    }
    Action::new(pv, ActionKind::SetQueue { queue_id, port: None })
}

/// Create a 1.0 ENQUEUE action, which names the port owning the queue.
pub fn create_enqueue(pv: ProtocolVersion, queue_id: QueueId, port: PortNumber) -> Result<Action> {
    if pv != ProtocolVersion::V1_0 {
        return Err(reject(format!("{} SET_QUEUE takes no port", pv)));
    }
    port.validate(pv)?;
    Action::new(
        pv,
        ActionKind::SetQueue {
            queue_id,
            port: Some(port),
        },
    )
}

/// Create a SET_MPLS_TTL or SET_NW_TTL action.
pub fn create_ttl(pv: ProtocolVersion, typ: ActionType, ttl: u8) -> Result<Action> {
    let kind = match typ {
        ActionType::SetMplsTtl => ActionKind::SetMplsTtl(ttl),
        ActionType::SetNwTtl => ActionKind::SetNwTtl(ttl),
        other => return Err(unexpected(other)),
    };
    pv.require(typ.min_version(), typ.name())?;
    Action::new(pv, kind)
}

/// Create an EtherType-carrying action: PUSH_VLAN, PUSH_MPLS, POP_MPLS or PUSH_PBB.
pub fn create_ether(pv: ProtocolVersion, typ: ActionType, ether_type: EthernetType) -> Result<Action> {
    let (kind, ok) = match typ {
        ActionType::PushVlan => (
            ActionKind::PushVlan(ether_type),
            ether_type == EthernetType::VLAN || ether_type == EthernetType::PRV_BRDG,
        ),
        ActionType::PushMpls => (
            ActionKind::PushMpls(ether_type),
            ether_type == EthernetType::MPLS_U || ether_type == EthernetType::MPLS_M,
        ),
        ActionType::PushPbb => (ActionKind::PushPbb(ether_type), ether_type == EthernetType::PBB),
        ActionType::PopMpls => (ActionKind::PopMpls(ether_type), true),
        other => return Err(unexpected(other)),
    };
    pv.require(typ.min_version(), typ.name())?;
    if !ok {
        return Err(reject(format!("bad EtherType for {}: {}", typ, ether_type)));
    }
    Action::new(pv, kind)
}

/// Create an EXPERIMENTER action. The payload is copied and must be a multiple
/// of 8 bytes long.
pub fn create_experimenter(pv: ProtocolVersion, id: u32, data: &[u8]) -> Result<Action> {
    if data.len() % 8 != 0 {
        return Err(reject(format!(
            "experimenter data length {} not a multiple of 8",
            data.len()
        )));
    }
    if data.len() > MAX_STRUCT_LEN - ACT_MIN_LEN {
        return Err(reject(format!(
            "experimenter data length {} exceeds {}",
            data.len(),
            MAX_STRUCT_LEN - ACT_MIN_LEN
        )));
    }
    Action::new(
        pv,
        ActionKind::Experimenter {
            id,
            data: data.to_vec(),
        },
    )
}

/// Create a SET_FIELD action.
///
/// The field must be an unmasked basic field other than IN_PORT, IN_PHY_PORT
/// or METADATA, which are pipeline fields rather than packet headers.
pub fn create_set_field(pv: ProtocolVersion, field: MatchField) -> Result<Action> {
    let ft = match field.field_type() {
        Some(ft) => ft,
        None => return Err(reject(format!("not a basic match field: {}", field))),
    };
    if field.is_masked() {
        return Err(reject(format!("set-field cannot be masked: {}", field)));
    }
    match ft {
        OxmBasicFieldType::InPort | OxmBasicFieldType::InPhyPort | OxmBasicFieldType::Metadata => {
            return Err(reject(format!("unsupported set-field type {}", ft)))
        }
        _ => {}
    }
    if !pv.is_legacy() {
        pv.require(ft.min_version(), ft.name())?;
    }
    Action::new(pv, ActionKind::SetField(field))
}

/// Create a SET_FIELD action for a MAC-valued field.
pub fn create_set_field_mac(pv: ProtocolVersion, ft: OxmBasicFieldType, mac: MacAddress) -> Result<Action> {
    create_set_field(pv, BasicField::mac(ft, mac)?.into())
}

/// Create a SET_FIELD action for an IPv4- or IPv6-valued field.
pub fn create_set_field_ip(pv: ProtocolVersion, ft: OxmBasicFieldType, ip: IpAddr) -> Result<Action> {
    let field = match ip {
        IpAddr::V4(v4) => BasicField::ipv4(ft, v4)?,
        IpAddr::V6(v6) => BasicField::ipv6(ft, v6)?,
    };
    create_set_field(pv, field.into())
}

/// Create a SET_FIELD action for an integer-valued field.
pub fn create_set_field_int(pv: ProtocolVersion, ft: OxmBasicFieldType, value: u64) -> Result<Action> {
    create_set_field(pv, BasicField::int(ft, value)?.into())
}

/// Create header stubs for the given types, for table-features properties.
///
/// Experimenter entries carry an id, so they are built with
/// `create_experimenter` instead.
pub fn create_action_headers(pv: ProtocolVersion, types: &[ActionType]) -> Result<Vec<Action>> {
    types
        .iter()
        .map(|&typ| {
            pv.require(typ.min_version(), typ.name())?;
            if typ == ActionType::Experimenter {
                return Err(reject("experimenter header stubs need an id".to_string()));
            }
            if typ == ActionType::SetField && pv.is_legacy() {
                return Err(reject(format!("{} has no generic SET_FIELD opcode", pv)));
            }
            Action::new(pv, ActionKind::Header { typ, field_type: None })
        })
        .collect()
}

/// Check that an action may be carried in a `msg_type` message for `pv`.
///
/// Only 1.0 restricts anything: the action must have a 1.0 opcode, and a
/// set-field must set a 1.0 header field. Everything is accepted for 1.1+.
pub fn validate_action(pv: ProtocolVersion, act: &Action, msg_type: &str) -> Result<()> {
    if pv != ProtocolVersion::V1_0 {
        return Ok(());
    }
    let typ = act.action_type();
    if !V10_ACT_TYPES.contains(&typ) {
        return Err(reject(format!("invalid 1.0 action type for {}: {}", msg_type, act)));
    }
    if typ == ActionType::SetField {
        let ok = act
            .kind()
            .field_type()
            .map_or(false, |ft| V10_SET_FIELD_TYPES.contains(&ft));
        if !ok {
            return Err(reject(format!(
                "invalid 1.0 set-field type for {}: {}",
                msg_type, act
            )));
        }
    }
    Ok(())
}
