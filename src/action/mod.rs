//! Actions associated with flows, packets and groups.

use std::fmt::{Display, Error, Formatter};

use crate::error::Result;
use crate::ofp_header::{wire_length, StructHeader, STRUCT_HEADER_LEN};
use crate::ofp_port::PortNumber;
use crate::ofp_version::ProtocolVersion;
use crate::oxm::{MatchField, OxmBasicFieldType};
use crate::types::{EthernetType, GroupId, QueueId};

pub mod codes;
pub mod encoder;
pub mod factory;
pub mod parser;

pub use self::codes::ActionType;

/// Header of an action structure.
pub type ActionHeader = StructHeader<ActionType>;

/// Payload of an action.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Output { port: PortNumber, max_len: u16 },
    CopyTtlOut,
    CopyTtlIn,
    SetMplsTtl(u8),
    DecMplsTtl,
    PushVlan(EthernetType),
    PopVlan,
    PushMpls(EthernetType),
    /// EtherType of the payload left after the label is popped.
    PopMpls(EthernetType),
    /// `port` is present for the 1.0 ENQUEUE form only.
    SetQueue { queue_id: QueueId, port: Option<PortNumber> },
    Group(GroupId),
    SetNwTtl(u8),
    DecNwTtl,
    SetField(MatchField),
    PushPbb(EthernetType),
    PopPbb,
    Experimenter { id: u32, data: Vec<u8> },
    /// Type-only stub, as listed in table features.
    Header {
        typ: ActionType,
        field_type: Option<OxmBasicFieldType>,
    },
}

impl ActionKind {
    pub fn action_type(&self) -> ActionType {
        match *self {
            ActionKind::Output { .. } => ActionType::Output,
            ActionKind::CopyTtlOut => ActionType::CopyTtlOut,
            ActionKind::CopyTtlIn => ActionType::CopyTtlIn,
            ActionKind::SetMplsTtl(_) => ActionType::SetMplsTtl,
            ActionKind::DecMplsTtl => ActionType::DecMplsTtl,
            ActionKind::PushVlan(_) => ActionType::PushVlan,
            ActionKind::PopVlan => ActionType::PopVlan,
            ActionKind::PushMpls(_) => ActionType::PushMpls,
            ActionKind::PopMpls(_) => ActionType::PopMpls,
            ActionKind::SetQueue { .. } => ActionType::SetQueue,
            ActionKind::Group(_) => ActionType::Group,
            ActionKind::SetNwTtl(_) => ActionType::SetNwTtl,
            ActionKind::DecNwTtl => ActionType::DecNwTtl,
            ActionKind::SetField(_) => ActionType::SetField,
            ActionKind::PushPbb(_) => ActionType::PushPbb,
            ActionKind::PopPbb => ActionType::PopPbb,
            ActionKind::Experimenter { .. } => ActionType::Experimenter,
            ActionKind::Header { typ, .. } => typ,
        }
    }

    /// Basic field type of a set-field (or set-field stub).
    pub fn field_type(&self) -> Option<OxmBasicFieldType> {
        match *self {
            ActionKind::SetField(ref f) => f.field_type(),
            ActionKind::Header { field_type, .. } => field_type,
            _ => None,
        }
    }

    /// Return the byte-size the action occupies when encoded for `pv`.
    pub fn size_of(&self, pv: ProtocolVersion) -> usize {
        use self::codes::*;
        match *self {
            ActionKind::Header { .. } => STRUCT_HEADER_LEN,
            ActionKind::Output { .. } if pv == ProtocolVersion::V1_0 => OUTPUT_10_LEN,
            ActionKind::Output { .. } => OUTPUT_13_LEN,
            ActionKind::SetQueue { .. } if pv == ProtocolVersion::V1_0 => SET_QUEUE_10_LEN,
            ActionKind::SetQueue { .. } => SET_QUEUE_13_LEN,
            ActionKind::SetField(ref f) if pv.is_legacy() => legacy_set_field_len(f.field_type()),
            ActionKind::SetField(ref f) => round_up_8(STRUCT_HEADER_LEN + f.size_of()),
            ActionKind::Experimenter { ref data, .. } => ACT_MIN_LEN + data.len(),
            _ => ACT_MIN_LEN,
        }
    }
}

/// Round `n` up to the next multiple of 8.
pub(crate) fn round_up_8(n: usize) -> usize {
    (n + 7) & !7
}

/// An action, bound to the protocol version it was built or parsed for.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Action {
    version: ProtocolVersion,
    length: u16,
    kind: ActionKind,
}

impl Action {
    /// Wrap a payload, computing its encoded length for `pv`.
    pub(crate) fn new(pv: ProtocolVersion, kind: ActionKind) -> Result<Action> {
        let length = wire_length(kind.size_of(pv), &kind.action_type())?;
        Ok(Action {
            version: pv,
            length,
            kind,
        })
    }

    /// Wrap a decoded payload, keeping the length declared on the wire.
    pub(crate) fn with_length(pv: ProtocolVersion, length: u16, kind: ActionKind) -> Action {
        Action {
            version: pv,
            length,
            kind,
        }
    }

    pub fn version(&self) -> ProtocolVersion {
        self.version
    }

    /// Total length in bytes, header and padding included.
    pub fn length(&self) -> usize {
        self.length as usize
    }

    pub fn kind(&self) -> &ActionKind {
        &self.kind
    }

    pub fn into_kind(self) -> ActionKind {
        self.kind
    }

    pub fn action_type(&self) -> ActionType {
        self.kind.action_type()
    }

    /// Derived header value.
    pub fn header(&self) -> ActionHeader {
        StructHeader::new(self.action_type(), self.length, self.kind.field_type())
    }

    pub fn is_header_stub(&self) -> bool {
        match self.kind {
            ActionKind::Header { .. } => true,
            _ => false,
        }
    }

    /// Rendering with version, type and length, for logs.
    pub fn to_debug_string(&self) -> String {
        format!(
            "{{ofm:[V{},{},{}],{}}}",
            self.version,
            self.action_type(),
            self.length,
            self
        )
    }
}

/// Return the byte-size of a sequence of actions.
pub fn size_of_sequence(actions: &[Action]) -> usize {
    actions.iter().fold(0, |acc, x| x.length() + acc)
}

impl Display for Action {
    fn fmt(&self, f: &mut Formatter) -> std::result::Result<(), Error> {
        match self.kind {
            ActionKind::Output { port, max_len } => {
                write!(f, "OUTPUT:{}", port)?;
                if port == PortNumber::CONTROLLER {
                    write!(f, ",max_len={}", max_len)?;
                }
                Ok(())
            }
            ActionKind::SetMplsTtl(ttl) | ActionKind::SetNwTtl(ttl) => {
                write!(f, "{}:{}", self.action_type(), ttl)
            }
            ActionKind::PushVlan(et)
            | ActionKind::PushMpls(et)
            | ActionKind::PopMpls(et)
            | ActionKind::PushPbb(et) => write!(f, "{}:{}", self.action_type(), et),
            ActionKind::SetQueue { queue_id, port } => {
                write!(f, "SET_QUEUE:{}", queue_id.0)?;
                if let Some(p) = port {
                    write!(f, ",port={}", p)?;
                }
                Ok(())
            }
            ActionKind::Group(g) => write!(f, "GROUP:{}", g.0),
            ActionKind::SetField(ref field) => write!(f, "SET_FIELD:{}", field),
            ActionKind::Experimenter { id, ref data } => {
                write!(f, "EXPERIMENTER:{:#010x},{}b", id, data.len())
            }
            ActionKind::Header { typ, field_type } => match field_type {
                Some(ft) => write!(f, "{}({})", typ, ft),
                None => write!(f, "{}", typ),
            },
            _ => write!(f, "{}", self.action_type()),
        }
    }
}
