//! Decoding of instructions and instruction lists.

use tracing::trace;

use crate::action::parser::parse_action_list;
use crate::buffer::OfpPacketReader;
use crate::config::CodecConfig;
use crate::error::{OfpError, Result};
use crate::instruction::{Instruction, InstructionHeader, InstructionKind, InstructionType};
use crate::ofp_header::{verify_target_ri, STRUCT_HEADER_LEN};
use crate::ofp_version::ProtocolVersion;
use crate::types::{MeterId, TableId};

const EXP_ID_LEN: usize = 4;
const PAD_GOTO_TABLE: usize = 3;
const PAD_WR_META: usize = 4;
const PAD_ACTION: usize = 4;

/// Parse back-to-back instructions until the reader reaches `target_ri`.
pub fn parse_instruction_list(
    pv: ProtocolVersion,
    pkt: &mut OfpPacketReader,
    target_ri: usize,
) -> Result<Vec<Instruction>> {
    let mut v = vec![];
    while pkt.ri() < target_ri {
        v.push(parse_instruction(pv, pkt)?);
    }
    verify_target_ri(target_ri, pkt)?;
    Ok(v)
}

/// Parse a list of instruction header stubs, as found in table-features
/// properties. Same rules as for action header stubs.
pub fn parse_instruction_headers(
    pv: ProtocolVersion,
    pkt: &mut OfpPacketReader,
    target_ri: usize,
    cfg: &CodecConfig,
) -> Result<Vec<Instruction>> {
    let mut v = vec![];
    while pkt.ri() < target_ri {
        let at = pkt.ri();
        let header = InstructionHeader::parse(pv, pkt)?;
        let length = header.length();
        let kind = match header.type_code() {
            InstructionType::Experimenter => {
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
                InstructionKind::Header(typ)
            }
        };
        v.push(Instruction::with_length(pv, length as u16, kind));
    }
    verify_target_ri(target_ri, pkt)?;
    Ok(v)
}

/// Parse a single instruction, including any embedded action list.
pub fn parse_instruction(pv: ProtocolVersion, pkt: &mut OfpPacketReader) -> Result<Instruction> {
    let at = pkt.ri();
    let header = InstructionHeader::parse(pv, pkt)?;
    header.check_min_len(pv, at)?;
    let end = at + header.length();
    let kind = match header.type_code() {
        InstructionType::GotoTable => {
            let tid = pkt.read_u8()?;
            pkt.skip(PAD_GOTO_TABLE)?;
            InstructionKind::GotoTable(TableId(tid))
        }
        InstructionType::WriteMetadata => {
            pkt.skip(PAD_WR_META)?;
            let metadata = pkt.read_u64()?;
            let mask = pkt.read_u64()?;
            InstructionKind::WriteMetadata { metadata, mask }
        }
        InstructionType::WriteActions => {
            pkt.skip(PAD_ACTION)?;
            InstructionKind::WriteActions(parse_action_list(pv, pkt, end)?)
        }
        InstructionType::ApplyActions => {
            pkt.skip(PAD_ACTION)?;
            InstructionKind::ApplyActions(parse_action_list(pv, pkt, end)?)
        }
        InstructionType::ClearActions => {
            pkt.skip(PAD_ACTION)?;
            let acts = parse_action_list(pv, pkt, end)?;
            if !acts.is_empty() {
                return Err(OfpError::Decode {
                    position: at,
                    reason: format!("CLEAR_ACTIONS carries {} actions", acts.len()),
                });
            }
            InstructionKind::ClearActions
        }
        InstructionType::Meter => InstructionKind::Meter(MeterId(pkt.read_u32()?)),
        InstructionType::Experimenter => experimenter(header.length(), pkt)?,
    };
    trace!("parsed instruction {:?} ({} bytes) at {}", header.type_code(), header.length(), at);
    Ok(Instruction::with_length(pv, header.length() as u16, kind))
}

fn experimenter(length: usize, pkt: &mut OfpPacketReader) -> Result<InstructionKind> {
    let id = pkt.read_u32()?;
    let data = pkt.read_bytes(length - STRUCT_HEADER_LEN - EXP_ID_LEN)?;
    Ok(InstructionKind::Experimenter { id, data })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ActionKind;
    use crate::ofp_port::PortNumber;

    #[test]
    fn goto_and_metadata() {
        let bytes = [
            0, 1, 0, 8, 3, 0, 0, 0, // GOTO_TABLE 3
            0, 2, 0, 24, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0x0f, 0, 0, 0, 0, 0, 0, 0, 0xff,
        ];
        let mut pkt = OfpPacketReader::new(&bytes);
        let list = parse_instruction_list(ProtocolVersion::V1_3, &mut pkt, bytes.len()).unwrap();
        assert_eq!(list[0].kind(), &InstructionKind::GotoTable(TableId(3)));
        assert_eq!(
            list[1].kind(),
            &InstructionKind::WriteMetadata {
                metadata: 0x0f,
                mask: 0xff
            }
        );
    }

    #[test]
    fn apply_actions() {
        let bytes = [
            0, 4, 0, 24, 0, 0, 0, 0, // APPLY_ACTIONS, 24 bytes
            0, 0, 0, 16, 0, 0, 0, 2, 0, 0, 0, 0, 0, 0, 0, 0, // OUTPUT:2
        ];
        let mut pkt = OfpPacketReader::new(&bytes);
        let ins = parse_instruction(ProtocolVersion::V1_3, &mut pkt).unwrap();
        assert_eq!(ins.actions().len(), 1);
        assert_eq!(
            ins.actions()[0].kind(),
            &ActionKind::Output {
                port: PortNumber(2),
                max_len: 0
            }
        );
        assert_eq!(pkt.ri(), 24);
    }

    #[test]
    fn clear_actions_is_empty() {
        let bytes = [0, 5, 0, 8, 0, 0, 0, 0];
        let mut pkt = OfpPacketReader::new(&bytes);
        let ins = parse_instruction(ProtocolVersion::V1_1, &mut pkt).unwrap();
        assert_eq!(ins.kind(), &InstructionKind::ClearActions);
        assert!(ins.actions().is_empty());
    }

    #[test]
    fn clear_actions_with_actions() {
        let bytes = [
            0, 5, 0, 16, 0, 0, 0, 0, 0, 11, 0, 8, 0, 0, 0, 0, // CLEAR_ACTIONS [COPY_TTL_OUT]
        ];
        let mut pkt = OfpPacketReader::new(&bytes);
        match parse_instruction(ProtocolVersion::V1_3, &mut pkt) {
            Err(OfpError::Decode { position: 0, .. }) => {}
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn embedded_list_misaligned() {
        // APPLY_ACTIONS claims 20 bytes, but its OUTPUT runs to 24
        let bytes = [
            0, 4, 0, 20, 0, 0, 0, 0, 0, 0, 0, 16, 0, 0, 0, 2, 0, 0, 0, 0, 0, 0, 0, 0,
        ];
        let mut pkt = OfpPacketReader::new(&bytes);
        assert_eq!(
            parse_instruction(ProtocolVersion::V1_3, &mut pkt),
            Err(OfpError::OffBy {
                target: 20,
                delta: 4
            })
        );
    }

    #[test]
    fn version_gating() {
        let bytes = [0, 6, 0, 8, 0, 0, 0, 1];
        let mut pkt = OfpPacketReader::new(&bytes);
        match parse_instruction(ProtocolVersion::V1_2, &mut pkt) {
            Err(OfpError::VersionMismatch { .. }) => {}
            other => panic!("unexpected {:?}", other),
        }
        let mut pkt = OfpPacketReader::new(&bytes);
        match parse_instruction(ProtocolVersion::V1_0, &mut pkt) {
            Err(OfpError::VersionMismatch { .. }) => {}
            other => panic!("unexpected {:?}", other),
        }
        let mut pkt = OfpPacketReader::new(&bytes);
        assert_eq!(
            parse_instruction(ProtocolVersion::V1_3, &mut pkt).unwrap().kind(),
            &InstructionKind::Meter(MeterId(1))
        );
    }

    #[test]
    fn headers() {
        let bytes = [0, 1, 0, 4, 0, 4, 0, 4, 0xff, 0xff, 0, 8, 0, 0, 0, 1];
        let mut pkt = OfpPacketReader::new(&bytes);
        let list =
            parse_instruction_headers(ProtocolVersion::V1_3, &mut pkt, 16, &CodecConfig::strict())
                .unwrap();
        assert_eq!(list.len(), 3);
        assert_eq!(list[1].kind(), &InstructionKind::Header(InstructionType::ApplyActions));
        assert_eq!(
            list[2].kind(),
            &InstructionKind::Experimenter { id: 1, data: vec![] }
        );
    }
}
