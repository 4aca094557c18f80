use std::cmp::Ordering;

use crate::device::{Interrupt, InterruptSource, Printer};
use crate::error::MachineError;
use crate::features::Features;
use crate::opcode::{Instruction, Opcode};

/// LS-8 can address 256 bytes of memory.
pub const MEMORY_SIZE: usize = 0x100;
/// Interrupt mask register.
pub const IM: usize = 5;
/// Interrupt status register.
pub const IS: usize = 6;
/// Stack pointer register.
pub const SP: usize = 7;
/// Initial stack pointer. The stack grows down from here.
pub const STACK_TOP: u8 = 0xF4;
/// Where the keyboard interrupt leaves the last key pressed.
pub const KEY_ADDR: u8 = 0xF4;
/// Start of the 8-entry interrupt vector table.
pub const VECTOR_TABLE: u8 = 0xF8;

/// Result of the last `CMP`, as stored in `FL` (`00000LGE`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Flag {
    Equal = 0b001,
    Greater = 0b010,
    Less = 0b100,
}

impl From<Ordering> for Flag {
    fn from(value: Ordering) -> Self {
        match value {
            Ordering::Less => Flag::Less,
            Ordering::Equal => Flag::Equal,
            Ordering::Greater => Flag::Greater,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Running,
    Halted(Halt),
}

/// Why the machine stopped cleanly.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Halt {
    /// `HLT` was executed.
    Instruction,
    /// `DIV` or `MOD` with a zero divisor at `pc`. Nothing after it is executed.
    DivideByZero { pc: u8 },
}

/// Complete machine state. Owns memory and registers exclusively.
#[derive(Clone, Debug)]
pub struct Machine {
    mem: [u8; MEMORY_SIZE],
    reg: [u8; 8],
    /// Address of the instruction being fetched
    pc: u8,
    /// Copy of the last fetched opcode
    ir: u8,
    /// Flags, set by `CMP`
    fl: u8,
    /// Global interrupt latch, cleared while an interrupt is being serviced
    interrupts_enabled: bool,
    features: Features,
}

impl Machine {
    pub fn new(features: Features) -> Machine {
        let mut reg = [0; 8];
        reg[SP] = STACK_TOP;
        if features.interrupts {
            reg[IM] = 0xFF;
        }
        Machine {
            mem: [0; MEMORY_SIZE],
            reg,
            pc: 0,
            ir: 0,
            fl: 0,
            interrupts_enabled: true,
            features,
        }
    }

    /// Machine with `program` copied into memory from address 0.
    pub fn from_raw(program: &[u8], features: Features) -> Result<Machine, MachineError> {
        if program.len() > MEMORY_SIZE {
            return Err(MachineError::ProgramTooLarge {
                size: program.len(),
            });
        }
        let mut machine = Machine::new(features);
        machine.mem[..program.len()].copy_from_slice(program);
        Ok(machine)
    }

    pub fn pc(&self) -> u8 {
        self.pc
    }

    pub fn ir(&self) -> u8 {
        self.ir
    }

    pub fn flags(&self) -> u8 {
        self.fl
    }

    pub fn reg(&self, index: usize) -> u8 {
        self.reg[index]
    }

    pub fn registers(&self) -> &[u8; 8] {
        &self.reg
    }

    pub fn set_reg(&mut self, index: usize, value: u8) {
        self.reg[index] = value;
    }

    pub fn memory(&self) -> &[u8; MEMORY_SIZE] {
        &self.mem
    }

    pub fn read(&self, addr: u8) -> u8 {
        self.mem[addr as usize]
    }

    pub fn write(&mut self, addr: u8, value: u8) {
        self.mem[addr as usize] = value;
    }

    pub fn interrupts_enabled(&self) -> bool {
        self.interrupts_enabled
    }

    pub fn features(&self) -> Features {
        self.features
    }

    /// Record an interrupt request in `IS`. It is serviced on the next cycle if unmasked.
    pub fn raise(&mut self, interrupt: Interrupt) {
        if let Interrupt::Keyboard(key) = interrupt {
            self.write(KEY_ADDR, key);
        }
        self.reg[IS] |= 1 << interrupt.number();
    }

    /// Run until the program halts or faults.
    pub fn run(
        &mut self,
        printer: &mut dyn Printer,
        source: &mut dyn InterruptSource,
    ) -> Result<Halt, MachineError> {
        loop {
            if let Status::Halted(halt) = self.step(printer, source)? {
                return Ok(halt);
            }
        }
    }

    /// One full cycle: poll `source`, service a pending interrupt, then fetch, decode and
    /// execute one instruction.
    pub fn step(
        &mut self,
        printer: &mut dyn Printer,
        source: &mut dyn InterruptSource,
    ) -> Result<Status, MachineError> {
        if self.features.interrupts {
            if let Some(interrupt) = source.poll() {
                self.raise(interrupt);
            }
            self.service_interrupts()?;
        }

        self.ir = self.mem[self.pc as usize];
        let instr = self.fetch()?;
        let status = self.execute(instr, printer)?;
        if status == Status::Running && !instr.opcode.sets_pc() {
            self.advance(instr.opcode.width())?;
        }
        Ok(status)
    }

    /// Decode the instruction at PC without executing it.
    pub fn fetch(&self) -> Result<Instruction, MachineError> {
        let pc = self.pc;
        let byte = self.mem[pc as usize];
        let opcode = Opcode::decode(byte)
            .filter(|op| self.features.interrupts || !op.needs_interrupts())
            .ok_or(MachineError::UnknownOpcode { opcode: byte, pc })?;
        let count = opcode.operand_count();
        let a = if count >= 1 { self.operand(1)? } else { 0 };
        let b = if count >= 2 { self.operand(2)? } else { 0 };
        Ok(Instruction { opcode, a, b })
    }

    fn operand(&self, offset: usize) -> Result<u8, MachineError> {
        let address = self.pc as usize + offset;
        self.mem
            .get(address)
            .copied()
            .ok_or(MachineError::AddressOutOfRange {
                address,
                pc: self.pc,
            })
    }

    fn advance(&mut self, width: u8) -> Result<(), MachineError> {
        let pc = self.pc;
        let address = pc as usize + width as usize;
        self.pc = u8::try_from(address)
            .map_err(|_| MachineError::AddressOutOfRange { address, pc })?;
        Ok(())
    }

    fn execute(
        &mut self,
        instr: Instruction,
        printer: &mut dyn Printer,
    ) -> Result<Status, MachineError> {
        use Opcode::*;
        let Instruction { opcode, a, b } = instr;
        match opcode {
            NOP => {}
            HLT => return Ok(Status::Halted(Halt::Instruction)),

            LDI => {
                let dr = self.reg_index(a)?;
                self.reg[dr] = b;
            }
            LD => {
                let dr = self.reg_index(a)?;
                let addr = self.reg_val(b)?;
                self.reg[dr] = self.read(addr);
            }
            ST => {
                let addr = self.reg_val(a)?;
                let val = self.reg_val(b)?;
                self.write(addr, val);
            }
            PRN => printer.print_number(self.reg_val(a)?),
            PRA => printer.print_char(self.reg_val(a)?),

            ADD | SUB | MUL | DIV | MOD | AND | OR | XOR | SHL | SHR | INC | DEC | NOT => {
                return self.alu(instr);
            }
            CMP => {
                let ord = self.reg_val(a)?.cmp(&self.reg_val(b)?);
                self.fl = Flag::from(ord) as u8;
            }

            PUSH => {
                let val = self.reg_val(a)?;
                self.push_val(val)?;
            }
            POP => {
                let dr = self.reg_index(a)?;
                self.reg[dr] = self.pop_val()?;
            }
            CALL => {
                let target = self.reg_val(a)?;
                let ret = self.pc as usize + opcode.width() as usize;
                let ret = u8::try_from(ret).map_err(|_| MachineError::AddressOutOfRange {
                    address: ret,
                    pc: self.pc,
                })?;
                self.push_val(ret)?;
                self.pc = target;
            }
            RET => self.pc = self.pop_val()?,

            JMP => self.jump_if(true, instr)?,
            JEQ => self.jump_if(self.fl & 0b001 != 0, instr)?,
            JNE => self.jump_if(self.fl & 0b001 == 0, instr)?,
            JGT => self.jump_if(self.fl & 0b010 != 0, instr)?,
            JLT => self.jump_if(self.fl & 0b100 != 0, instr)?,
            JGE => self.jump_if(self.fl & 0b011 != 0, instr)?,
            JLE => self.jump_if(self.fl & 0b101 != 0, instr)?,

            INT => {
                let number = self.reg_val(a)?;
                if number >= 8 {
                    return Err(MachineError::InvalidInterrupt {
                        number,
                        pc: self.pc,
                    });
                }
                self.reg[IS] |= 1 << number;
                // PC-setting opcode, so step past it here
                self.advance(opcode.width())?;
            }
            IRET => {
                for r in (0..SP).rev() {
                    self.reg[r] = self.pop_val()?;
                }
                self.fl = self.pop_val()?;
                self.pc = self.pop_val()?;
                self.interrupts_enabled = true;
            }
        }
        Ok(Status::Running)
    }

    /// Arithmetic and bitwise ops. Results are stored in `reg[A]`, truncated to 8 bits.
    fn alu(&mut self, instr: Instruction) -> Result<Status, MachineError> {
        use Opcode::*;
        let dr = self.reg_index(instr.a)?;
        let x = self.reg[dr];

        let result = match instr.opcode {
            INC => x.wrapping_add(1),
            DEC => x.wrapping_sub(1),
            NOT => !x,
            op => {
                let y = self.reg_val(instr.b)?;
                match op {
                    ADD => x.wrapping_add(y),
                    SUB => x.wrapping_sub(y),
                    MUL => x.wrapping_mul(y),
                    DIV | MOD => {
                        let res = if op == DIV {
                            x.checked_div(y)
                        } else {
                            x.checked_rem(y)
                        };
                        match res {
                            Some(res) => res,
                            None => return Ok(Status::Halted(Halt::DivideByZero { pc: self.pc })),
                        }
                    }
                    AND => x & y,
                    OR => x | y,
                    XOR => x ^ y,
                    SHL => x.checked_shl(y as u32).unwrap_or(0),
                    SHR => x.checked_shr(y as u32).unwrap_or(0),
                    _ => unreachable!("{op} is not an ALU operation"),
                }
            }
        };
        self.reg[dr] = result;
        Ok(Status::Running)
    }

    /// Conditional jumps have the PC-set bit, so a jump not taken must step past itself.
    fn jump_if(&mut self, condition: bool, instr: Instruction) -> Result<(), MachineError> {
        let target = self.reg_val(instr.a)?;
        if condition {
            self.pc = target;
            Ok(())
        } else {
            self.advance(instr.opcode.width())
        }
    }

    /// Check `IM & IS` and divert to the lowest pending interrupt's handler.
    fn service_interrupts(&mut self) -> Result<(), MachineError> {
        if !self.interrupts_enabled {
            return Ok(());
        }
        let masked = self.reg[IM] & self.reg[IS];
        if masked == 0 {
            return Ok(());
        }
        let number = masked.trailing_zeros() as u8;

        self.interrupts_enabled = false;
        self.reg[IS] &= !(1 << number);
        self.push_val(self.pc)?;
        self.push_val(self.fl)?;
        for r in 0..SP {
            self.push_val(self.reg[r])?;
        }
        self.pc = self.read(VECTOR_TABLE + number);
        Ok(())
    }

    fn push_val(&mut self, val: u8) -> Result<(), MachineError> {
        // Decrement stack
        let sp = self.reg[SP]
            .checked_sub(1)
            .ok_or(MachineError::StackOverflow { pc: self.pc })?;
        self.reg[SP] = sp;
        self.write(sp, val);
        Ok(())
    }

    fn pop_val(&mut self) -> Result<u8, MachineError> {
        let sp = self.reg[SP];
        let val = self.read(sp);
        self.reg[SP] = sp
            .checked_add(1)
            .ok_or(MachineError::StackUnderflow { pc: self.pc })?;
        Ok(val)
    }

    fn reg_index(&self, operand: u8) -> Result<usize, MachineError> {
        let index = operand as usize;
        if index < self.reg.len() {
            Ok(index)
        } else {
            Err(MachineError::InvalidRegister {
                index: operand,
                pc: self.pc,
            })
        }
    }

    fn reg_val(&self, operand: u8) -> Result<u8, MachineError> {
        Ok(self.reg[self.reg_index(operand)?])
    }
}
