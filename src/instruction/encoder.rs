//! Encoding of instructions and instruction lists.

use tracing::trace;

use crate::action::encoder::encode_action_list;
use crate::buffer::OfpPacketWriter;
use crate::error::{OfpError, Result};
use crate::instruction::{Instruction, InstructionKind};
use crate::ofp_header::STRUCT_HEADER_LEN;

/// Write a single instruction, embedded actions included.
pub fn encode_instruction(ins: &Instruction, pkt: &mut OfpPacketWriter) -> Result<()> {
    let pv = ins.version();
    let start = pkt.wi();
    ins.header().marshal(pv, pkt)?;
    match *ins.kind() {
        InstructionKind::GotoTable(tid) => {
            pkt.write_u8(tid.0);
            pkt.write_zeros(3);
        }
        InstructionKind::WriteMetadata { metadata, mask } => {
            pkt.write_zeros(4);
            pkt.write_u64(metadata);
            pkt.write_u64(mask);
        }
        InstructionKind::WriteActions(ref acts) | InstructionKind::ApplyActions(ref acts) => {
            if let Some(a) = acts.iter().find(|a| a.version() != pv) {
                return Err(OfpError::Internal(format!(
                    "{} action {} inside {} instruction",
                    a.version(),
                    a,
                    pv
                )));
            }
            pkt.write_zeros(4);
            encode_action_list(acts, pkt)?;
        }
        InstructionKind::ClearActions => pkt.write_zeros(4),
        InstructionKind::Meter(m) => pkt.write_u32(m.0),
        InstructionKind::Experimenter { id, ref data } => {
            pkt.write_u32(id);
            pkt.write_bytes(data);
        }
        InstructionKind::Header(_) => {
            pkt.write_zeros(ins.length().saturating_sub(STRUCT_HEADER_LEN));
        }
    }
    trace!("encoded {} ({} bytes) at {}", ins.instruction_type(), pkt.wi() - start, start);
    Ok(())
}

/// Write instructions back to back.
pub fn encode_instruction_list(instrs: &[Instruction], pkt: &mut OfpPacketWriter) -> Result<()> {
    for ins in instrs {
        encode_instruction(ins, pkt)?;
    }
    Ok(())
}

/// Encode instructions into a fresh buffer.
pub fn encode_instruction_list_to_vec(instrs: &[Instruction]) -> Result<Vec<u8>> {
    let mut pkt = OfpPacketWriter::new();
    encode_instruction_list(instrs, &mut pkt)?;
    Ok(pkt.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::factory::create_output_port;
    use crate::buffer::OfpPacketReader;
    use crate::instruction::factory::*;
    use crate::instruction::parser::parse_instruction_list;
    use crate::instruction::InstructionType;
    use crate::ofp_port::PortNumber;
    use crate::ofp_version::ProtocolVersion;
    use crate::types::{MeterId, TableId};

    const V13: ProtocolVersion = ProtocolVersion::V1_3;

    #[test]
    fn goto_table_bytes() {
        let ins = create_goto_table(V13, TableId(7)).unwrap();
        assert_eq!(
            encode_instruction_list_to_vec(&[ins]).unwrap(),
            vec![0, 1, 0, 8, 7, 0, 0, 0]
        );
    }

    #[test]
    fn write_metadata_bytes() {
        let ins = create_write_metadata(V13, 0x0102, 0xffff).unwrap();
        let bytes = encode_instruction_list_to_vec(&[ins]).unwrap();
        assert_eq!(bytes.len(), 24);
        assert_eq!(&bytes[..8], &[0, 2, 0, 24, 0, 0, 0, 0]);
        assert_eq!(&bytes[8..16], &[0, 0, 0, 0, 0, 0, 1, 2]);
        assert_eq!(&bytes[16..], &[0, 0, 0, 0, 0, 0, 0xff, 0xff]);
    }

    #[test]
    fn apply_actions_bytes() {
        let mut b = create_mutable_instruction(V13, InstructionType::ApplyActions).unwrap();
        b.add_action(create_output_port(V13, PortNumber(5)).unwrap()).unwrap();
        let ins = b.to_immutable().unwrap();
        assert_eq!(ins.length(), 24);
        let bytes = encode_instruction_list_to_vec(&[ins]).unwrap();
        assert_eq!(
            bytes,
            vec![
                0, 4, 0, 24, 0, 0, 0, 0, 0, 0, 0, 16, 0, 0, 0, 5, 0, 0, 0, 0, 0, 0, 0, 0
            ]
        );
    }

    #[test]
    fn list_round_trip() {
        let mut b = create_mutable_instruction(V13, InstructionType::WriteActions).unwrap();
        b.add_action(create_output_port(V13, PortNumber::CONTROLLER).unwrap())
            .unwrap();
        let list = vec![
            b.to_immutable().unwrap(),
            create_clear_actions(V13).unwrap(),
            create_meter(V13, MeterId(9)).unwrap(),
            create_instr_experimenter(V13, 0x2320, &[1; 8]).unwrap(),
            create_goto_table(V13, TableId(2)).unwrap(),
        ];
        let bytes = encode_instruction_list_to_vec(&list).unwrap();
        assert_eq!(bytes.len(), crate::instruction::size_of_sequence(&list));
        let mut pkt = OfpPacketReader::new(&bytes);
        assert_eq!(parse_instruction_list(V13, &mut pkt, bytes.len()).unwrap(), list);
    }

    #[test]
    fn header_stubs() {
        let stubs = create_instruction_headers(
            V13,
            &[InstructionType::GotoTable, InstructionType::Meter],
        )
        .unwrap();
        assert_eq!(
            encode_instruction_list_to_vec(&stubs).unwrap(),
            vec![0, 1, 0, 4, 0, 6, 0, 4]
        );
    }
}
