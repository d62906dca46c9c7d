//! Wire codec for OpenFlow 1.0 through 1.3 actions and instructions.
//!
//! Actions and instructions are immutable values bound to the protocol
//! version they were built for. They come either from the factories, which
//! validate arguments, or from the parsers, which validate bytes. The
//! encoders write them back in the encoding of that version, going through
//! the legacy SET_* opcodes for 1.0 and 1.1 set-field actions.
#![crate_name = "ofp_actions"]
#![crate_type = "lib"]

mod bits;
pub mod action;
pub mod buffer;
pub mod config;
pub mod error;
pub mod instruction;
pub mod ofp_header;
pub mod ofp_port;
pub mod ofp_version;
pub mod oxm;
pub mod types;

pub use crate::action::{Action, ActionKind, ActionType};
pub use crate::buffer::{OfpPacketReader, OfpPacketWriter};
pub use crate::config::CodecConfig;
pub use crate::error::{OfpError, Result};
pub use crate::instruction::{ActionListBuilder, Instruction, InstructionKind, InstructionType};
pub use crate::ofp_port::PortNumber;
pub use crate::ofp_version::ProtocolVersion;
pub use crate::oxm::{BasicField, FieldValue, MatchField, OxmBasicFieldType};
pub use crate::types::{EthernetType, GroupId, MacAddress, MeterId, QueueId, TableId};
