use std::fmt;

/// Every instruction understood by the LS-8.
///
/// The discriminant is the encoded opcode byte, laid out as `AABCDDDD`:
/// - `AA`: number of operand bytes following the opcode
/// - `B`: instruction is an ALU operation
/// - `C`: instruction sets the PC itself
/// - `DDDD`: instruction identifier
#[allow(clippy::upper_case_acronyms)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    NOP = 0b0000_0000,
    HLT = 0b0000_0001,
    RET = 0b0001_0001,
    IRET = 0b0001_0011,
    PUSH = 0b0100_0101,
    POP = 0b0100_0110,
    PRN = 0b0100_0111,
    PRA = 0b0100_1000,
    CALL = 0b0101_0000,
    INT = 0b0101_0010,
    JMP = 0b0101_0100,
    JEQ = 0b0101_0101,
    JNE = 0b0101_0110,
    JGT = 0b0101_0111,
    JLT = 0b0101_1000,
    JLE = 0b0101_1001,
    JGE = 0b0101_1010,
    INC = 0b0110_0101,
    DEC = 0b0110_0110,
    NOT = 0b0110_1001,
    LDI = 0b1000_0010,
    LD = 0b1000_0011,
    ST = 0b1000_0100,
    ADD = 0b1010_0000,
    SUB = 0b1010_0001,
    MUL = 0b1010_0010,
    DIV = 0b1010_0011,
    MOD = 0b1010_0100,
    CMP = 0b1010_0111,
    AND = 0b1010_1000,
    OR = 0b1010_1010,
    XOR = 0b1010_1011,
    SHL = 0b1010_1100,
    SHR = 0b1010_1101,
}

/// How the operand bytes of an instruction are read.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operands {
    None,
    /// `reg[A]`
    Reg,
    /// `reg[A]`, immediate byte
    RegImm,
    /// `reg[A]`, `reg[B]`
    RegReg,
}

impl Opcode {
    pub const ALL: [Opcode; 34] = [
        Self::NOP,
        Self::HLT,
        Self::RET,
        Self::IRET,
        Self::PUSH,
        Self::POP,
        Self::PRN,
        Self::PRA,
        Self::CALL,
        Self::INT,
        Self::JMP,
        Self::JEQ,
        Self::JNE,
        Self::JGT,
        Self::JLT,
        Self::JLE,
        Self::JGE,
        Self::INC,
        Self::DEC,
        Self::NOT,
        Self::LDI,
        Self::LD,
        Self::ST,
        Self::ADD,
        Self::SUB,
        Self::MUL,
        Self::DIV,
        Self::MOD,
        Self::CMP,
        Self::AND,
        Self::OR,
        Self::XOR,
        Self::SHL,
        Self::SHR,
    ];

    /// Raw opcode byte -> instruction. Unassigned bytes are `None`.
    const TABLE: [Option<Opcode>; 256] = {
        let mut table = [None; 256];
        let mut i = 0;
        while i < Self::ALL.len() {
            let op = Self::ALL[i];
            table[op as usize] = Some(op);
            i += 1;
        }
        table
    };

    #[inline]
    pub fn decode(byte: u8) -> Option<Opcode> {
        Self::TABLE[byte as usize]
    }

    #[inline]
    pub fn byte(self) -> u8 {
        self as u8
    }

    /// `AA`: amount of operand bytes following the opcode.
    #[inline]
    pub fn operand_count(self) -> u8 {
        self.byte() >> 6
    }

    /// `B`: instruction is handled by the ALU.
    #[inline]
    pub fn is_alu(self) -> bool {
        self.byte() & 0b0010_0000 != 0
    }

    /// `C`: instruction is responsible for the PC, so the generic advance is skipped.
    #[inline]
    pub fn sets_pc(self) -> bool {
        self.byte() & 0b0001_0000 != 0
    }

    /// Bytes taken up in memory, including the opcode.
    #[inline]
    pub fn width(self) -> u8 {
        1 + self.operand_count()
    }

    /// Only decoded when the `interrupts` feature is enabled.
    pub fn needs_interrupts(self) -> bool {
        matches!(self, Self::INT | Self::IRET)
    }

    pub fn operands(self) -> Operands {
        match self {
            Self::LDI => Operands::RegImm,
            _ => match self.operand_count() {
                0 => Operands::None,
                1 => Operands::Reg,
                _ => Operands::RegReg,
            },
        }
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Self::NOP => "NOP",
            Self::HLT => "HLT",
            Self::RET => "RET",
            Self::IRET => "IRET",
            Self::PUSH => "PUSH",
            Self::POP => "POP",
            Self::PRN => "PRN",
            Self::PRA => "PRA",
            Self::CALL => "CALL",
            Self::INT => "INT",
            Self::JMP => "JMP",
            Self::JEQ => "JEQ",
            Self::JNE => "JNE",
            Self::JGT => "JGT",
            Self::JLT => "JLT",
            Self::JLE => "JLE",
            Self::JGE => "JGE",
            Self::INC => "INC",
            Self::DEC => "DEC",
            Self::NOT => "NOT",
            Self::LDI => "LDI",
            Self::LD => "LD",
            Self::ST => "ST",
            Self::ADD => "ADD",
            Self::SUB => "SUB",
            Self::MUL => "MUL",
            Self::DIV => "DIV",
            Self::MOD => "MOD",
            Self::CMP => "CMP",
            Self::AND => "AND",
            Self::OR => "OR",
            Self::XOR => "XOR",
            Self::SHL => "SHL",
            Self::SHR => "SHR",
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// A decoded instruction together with its raw operand bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Instruction {
    pub opcode: Opcode,
    pub a: u8,
    pub b: u8,
}

impl fmt::Display for Instruction {
    /// Assembly-like form, eg. `LDI R0,8` or `ADD R0,R1`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.opcode.operands() {
            Operands::None => write!(f, "{}", self.opcode),
            Operands::Reg => write!(f, "{} R{}", self.opcode, self.a),
            Operands::RegImm => write!(f, "{} R{},{}", self.opcode, self.a, self.b),
            Operands::RegReg => write!(f, "{} R{},R{}", self.opcode, self.a, self.b),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_round_trips_every_opcode() {
        for op in Opcode::ALL {
            assert_eq!(Opcode::decode(op.byte()), Some(op), "{op}");
        }
        let assigned = (0..=u8::MAX).filter_map(Opcode::decode).count();
        assert_eq!(assigned, Opcode::ALL.len());
    }

    #[test]
    fn unassigned_bytes_do_not_decode() {
        for byte in [0b0000_0010, 0b1111_1111, 0b0101_0001, 0b1100_0000] {
            assert_eq!(Opcode::decode(byte), None, "0b{byte:08b}");
        }
    }

    #[test]
    fn header_bits() {
        assert_eq!(Opcode::HLT.operand_count(), 0);
        assert_eq!(Opcode::PRN.operand_count(), 1);
        assert_eq!(Opcode::LDI.operand_count(), 2);
        assert_eq!(Opcode::CALL.width(), 2);

        assert!(Opcode::ADD.is_alu());
        assert!(Opcode::NOT.is_alu());
        assert!(!Opcode::LD.is_alu());

        assert!(Opcode::JEQ.sets_pc());
        assert!(Opcode::RET.sets_pc());
        assert!(Opcode::INT.sets_pc());
        assert!(!Opcode::HLT.sets_pc());
        assert!(!Opcode::PUSH.sets_pc());
    }

    #[test]
    fn no_opcode_uses_three_operands() {
        assert!(Opcode::ALL.iter().all(|op| op.operand_count() <= 2));
    }

    #[test]
    fn formats_instructions() {
        let ldi = Instruction {
            opcode: Opcode::LDI,
            a: 0,
            b: 8,
        };
        assert_eq!(ldi.to_string(), "LDI R0,8");
        let mul = Instruction {
            opcode: Opcode::MUL,
            a: 0,
            b: 1,
        };
        assert_eq!(mul.to_string(), "MUL R0,R1");
        let prn = Instruction {
            opcode: Opcode::PRN,
            a: 2,
            b: 0,
        };
        assert_eq!(prn.to_string(), "PRN R2");
        let hlt = Instruction {
            opcode: Opcode::HLT,
            a: 0,
            b: 0,
        };
        assert_eq!(hlt.to_string(), "HLT");
    }
}
