use std::fmt;

use crate::opcode::{Instruction, Opcode};

/// One line of a disassembly listing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Line {
    pub addr: u8,
    pub bytes: Vec<u8>,
    /// `None` for bytes which do not start a complete instruction.
    pub instr: Option<Instruction>,
}

/// Walk `program` from address 0, decoding one instruction after another.
///
/// Code and data are not distinguished: any byte that is not a known opcode, or whose operands
/// run past the end of the program, is listed as a single data byte.
pub fn disassemble(program: &[u8]) -> Vec<Line> {
    let mut lines = Vec::new();
    let mut addr = 0;
    while addr < program.len() {
        let width = Opcode::decode(program[addr])
            .map(|op| op.width() as usize)
            .filter(|width| addr + width <= program.len());
        let line = match width {
            Some(width) => {
                let bytes = &program[addr..addr + width];
                Line {
                    addr: addr as u8,
                    bytes: bytes.to_vec(),
                    instr: instruction(bytes),
                }
            }
            None => Line {
                addr: addr as u8,
                bytes: vec![program[addr]],
                instr: None,
            },
        };
        addr += line.bytes.len();
        lines.push(line);
    }
    lines
}

fn instruction(bytes: &[u8]) -> Option<Instruction> {
    let opcode = Opcode::decode(*bytes.first()?)?;
    Some(Instruction {
        opcode,
        a: bytes.get(1).copied().unwrap_or(0),
        b: bytes.get(2).copied().unwrap_or(0),
    })
}

impl fmt::Display for Line {
    /// `0x00  10000010 00000000 00001000  LDI R0,8`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02X} ", self.addr)?;
        for i in 0..3 {
            match self.bytes.get(i) {
                Some(byte) => write!(f, " {:08b}", byte)?,
                None => write!(f, "         ")?,
            }
        }
        match self.instr {
            Some(instr) => write!(f, "  {}", instr),
            None => write!(f, "  .byte 0x{:02X}", self.bytes[0]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_instructions() {
        let program = [0b1000_0010, 0, 8, 0b0100_0111, 0, 0b0000_0001];
        let listing: Vec<String> = disassemble(&program)
            .iter()
            .map(|line| line.to_string())
            .collect();
        assert_eq!(
            listing,
            vec![
                "0x00  10000010 00000000 00001000  LDI R0,8",
                "0x03  01000111 00000000           PRN R0",
                "0x05  00000001                    HLT",
            ]
        );
    }

    #[test]
    fn unknown_and_truncated_bytes_are_data() {
        let program = [0b1111_1111, 0b1010_0000, 0];
        let lines = disassemble(&program);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].instr, None);
        // ADD needs two operands, only one is left
        assert_eq!(lines[1].instr, None);
        assert_eq!(lines[1].to_string(), "0x01  10100000                    .byte 0xA0");
        assert_eq!(lines[2].to_string(), "0x02  00000000                    NOP");
    }

    #[test]
    fn empty_program() {
        assert!(disassemble(&[]).is_empty());
    }
}
