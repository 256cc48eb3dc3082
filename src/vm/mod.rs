//! Máquina virtual de acumulador de 8 bits.
//!
//! # Estado
//! Un acumulador, un contador de programa y dos banderas, todos de 8 bits
//! o menos, junto con la memoria de [`MEMORY_SIZE`] bytes donde conviven
//! datos e instrucciones.
//!
//! # Instrucciones
//! Cada instrucción ocupa 4 bytes: opcode, byte sin uso, índice de celda
//! y byte sin uso. La dirección efectiva de un operando es
//! `índice * 2 + HEADER_SIZE`. Un opcode desconocido se trata como `NOP`.
//!
//! # Ciclo
//! Antes de decodificar cada instrucción las banderas se recalculan a
//! partir del acumulador vigente, de modo que un salto condicional
//! observa el resultado de la instrucción anterior.

use std::fmt::{self, Display};

use bitflags::bitflags;
use tracing::{debug, trace};

mod image;

pub use image::{Image, ImageError, HEADER, HEADER_SIZE, MEMORY_SIZE};

/// Bytes por línea en un volcado de memoria.
const LINE_SIZE: usize = 16;

bitflags! {
    /// Banderas de condición derivadas del acumulador.
    pub struct Flags: u8 {
        /// El acumulador es cero.
        const ZERO = 0x01;

        /// El bit alto del acumulador está encendido.
        const NEGATIVE = 0x02;
    }
}

impl Flags {
    pub fn of(accumulator: u8) -> Self {
        let mut flags = Flags::empty();
        flags.set(Flags::ZERO, accumulator == 0);
        flags.set(Flags::NEGATIVE, accumulator & 0x80 != 0);

        flags
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Opcode {
    Nop,
    Store,
    Load,
    Add,
    Sub,
    Or,
    And,
    Not,
    Jump,
    JumpIfNegative,
    JumpIfZero,
    Halt,
}

impl Opcode {
    pub fn decode(byte: u8) -> Option<Opcode> {
        use Opcode::*;

        let opcode = match byte {
            0x00 => Nop,
            0x10 => Store,
            0x20 => Load,
            0x30 => Add,
            0x31 => Sub,
            0x40 => Or,
            0x50 => And,
            0x60 => Not,
            0x80 => Jump,
            0x90 => JumpIfNegative,
            0xA0 => JumpIfZero,
            0xF0 => Halt,
            _ => return None,
        };

        Some(opcode)
    }
}

/// Resultado de un ciclo.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Step {
    Running,
    Halted,
}

/// Registros finales reportados al detenerse.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Registers {
    pub accumulator: u8,
    pub pc: u8,
}

impl Display for Registers {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(fmt, "Final AC: 0x{:02X}", self.accumulator)?;
        writeln!(fmt, "Final PC: 0x{:02X}", self.pc)
    }
}

pub struct Machine {
    memory: [u8; MEMORY_SIZE],
    accumulator: u8,
    pc: u8,
    flags: Flags,
}

impl Default for Machine {
    fn default() -> Self {
        Machine {
            memory: [0; MEMORY_SIZE],
            accumulator: 0,
            pc: 0,
            flags: Flags::empty(),
        }
    }
}

impl Machine {
    pub fn new(image: Image) -> Self {
        Machine {
            memory: *image.memory(),
            ..Default::default()
        }
    }

    /// Reemplaza el programa cargado y reinicia los registros.
    ///
    /// Si la imagen es inválida, la máquina queda exactamente como estaba.
    pub fn load(&mut self, bytes: &[u8]) -> Result<(), ImageError> {
        let image = Image::from_bytes(bytes)?;
        *self = Machine::new(image);

        Ok(())
    }

    pub fn accumulator(&self) -> u8 {
        self.accumulator
    }

    pub fn pc(&self) -> u8 {
        self.pc
    }

    pub fn flags(&self) -> Flags {
        self.flags
    }

    pub fn memory(&self) -> &[u8; MEMORY_SIZE] {
        &self.memory
    }

    pub fn registers(&self) -> Registers {
        Registers {
            accumulator: self.accumulator,
            pc: self.pc,
        }
    }

    /// Ejecuta hasta encontrar `HLT` en el contador de programa.
    pub fn run(&mut self) -> Registers {
        let mut cycles = 0u64;
        while let Step::Running = self.step() {
            cycles += 1;
        }

        debug!(cycles, "machine halted");
        self.registers()
    }

    /// Ejecuta una sola instrucción.
    pub fn step(&mut self) -> Step {
        use Opcode::*;

        let pc = self.pc as usize;
        let opcode = Opcode::decode(self.memory[pc]);
        if opcode == Some(Halt) {
            return Step::Halted;
        }

        self.flags = Flags::of(self.accumulator);

        let address = self.memory[pc + 2] as usize * 2 + HEADER_SIZE;
        trace!(
            pc = self.pc,
            ac = self.accumulator,
            ?opcode,
            address,
            "cycle"
        );

        let operand = self.memory[address];
        let jump = match opcode {
            None | Some(Nop) | Some(Halt) => false,
            Some(Store) => {
                self.memory[address] = self.accumulator;
                false
            }

            Some(Load) => {
                self.accumulator = operand;
                false
            }

            Some(Add) => {
                self.accumulator = self.accumulator.wrapping_add(operand);
                false
            }

            Some(Sub) => {
                self.accumulator = self.accumulator.wrapping_sub(operand);
                false
            }

            Some(Or) => {
                self.accumulator |= operand;
                false
            }

            Some(And) => {
                self.accumulator &= operand;
                false
            }

            // Sin operando, avanza media instrucción
            Some(Not) => {
                self.accumulator = !self.accumulator;
                self.pc = self.pc.wrapping_add(2);

                return Step::Running;
            }

            Some(Jump) => true,
            Some(JumpIfNegative) => self.flags.contains(Flags::NEGATIVE),
            Some(JumpIfZero) => self.flags.contains(Flags::ZERO),
        };

        self.pc = if jump {
            address as u8
        } else {
            self.pc.wrapping_add(4)
        };

        Step::Running
    }

    pub fn dump(&self) -> MemoryDump<'_> {
        MemoryDump(&self.memory)
    }
}

/// Volcado hexadecimal de memoria, [`LINE_SIZE`] bytes por línea.
pub struct MemoryDump<'a>(&'a [u8]);

impl Display for MemoryDump<'_> {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, line) in self.0.chunks(LINE_SIZE).enumerate() {
            write!(fmt, "{:08x}:", index * LINE_SIZE)?;
            for byte in line {
                write!(fmt, " {:02x}", byte)?;
            }

            writeln!(fmt)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Celda base para datos, lejos del código.
    const DATA: u8 = 100;

    fn address(slot: u8) -> usize {
        slot as usize * 2 + HEADER_SIZE
    }

    /// Ensambla código a partir de la dirección 4 y datos por celda.
    fn machine(code: &[[u8; 4]], data: &[(u8, u8)]) -> Machine {
        let mut bytes = vec![0; MEMORY_SIZE];
        bytes[..HEADER_SIZE].copy_from_slice(&HEADER);

        for (index, instruction) in code.iter().enumerate() {
            let at = HEADER_SIZE + index * 4;
            bytes[at..at + 4].copy_from_slice(instruction);
        }

        for &(slot, value) in data {
            bytes[address(slot)] = value;
        }

        let mut machine = Machine::default();
        machine.load(&bytes).unwrap();
        machine
    }

    fn op(opcode: u8, slot: u8) -> [u8; 4] {
        [opcode, 0, slot, 0]
    }

    const HLT: [u8; 4] = [0xF0, 0, 0, 0];

    #[test]
    fn loads_adds_and_stores_with_wraparound() {
        let mut machine = machine(
            &[op(0x20, DATA), op(0x30, DATA + 1), op(0x10, DATA + 2), HLT],
            &[(DATA, 0xF0), (DATA + 1, 0x20)],
        );

        let registers = machine.run();
        assert_eq!(registers.accumulator, 0x10);
        assert_eq!(machine.memory()[address(DATA + 2)], 0x10);

        // PC 0 es un NOP en la zona del encabezado; HLT está en 16
        assert_eq!(registers.pc, 16);
    }

    #[test]
    fn subtracts_and_applies_bitwise_operations() {
        let mut machine = machine(
            &[op(0x20, DATA), op(0x31, DATA + 1), op(0x40, DATA + 2), op(0x50, DATA + 3), HLT],
            &[(DATA, 0x01), (DATA + 1, 0x02), (DATA + 2, 0x0F), (DATA + 3, 0x3C)],
        );

        // 1 - 2 = 0xFF, | 0x0F = 0xFF, & 0x3C = 0x3C
        assert_eq!(machine.run().accumulator, 0x3C);
    }

    #[test]
    fn negative_flag_takes_jump() {
        // Destino de salto: celda 8 => dirección 20
        let code = |jump: u8| {
            vec![
                op(0x20, DATA),
                op(jump, 8),
                op(0x20, DATA + 1),
                HLT,
                op(0x10, DATA + 2),
                HLT,
            ]
        };

        let data = [(DATA, 0x80), (DATA + 1, 0x01)];

        let mut taken = machine(&code(0x90), &data);
        let registers = taken.run();
        assert_eq!(registers, Registers { accumulator: 0x80, pc: 24 });
        assert_eq!(taken.memory()[address(DATA + 2)], 0x80);
        assert!(taken.flags().contains(Flags::NEGATIVE));

        let mut not_taken = machine(&code(0xA0), &data);
        assert_eq!(not_taken.run(), Registers { accumulator: 0x01, pc: 16 });
    }

    #[test]
    fn flags_come_from_previous_instruction() {
        let mut machine = machine(
            &[op(0x20, DATA), op(0x31, DATA), op(0xA0, 8), HLT, HLT],
            &[(DATA, 0x05)],
        );

        assert_eq!(machine.step(), Step::Running);
        assert_eq!(machine.step(), Step::Running);
        assert_eq!(machine.step(), Step::Running);
        assert_eq!(machine.step(), Step::Running);

        // SUB dejó el acumulador en cero antes del salto
        assert_eq!(machine.pc(), 20);
        assert_eq!(machine.step(), Step::Halted);
    }

    #[test]
    fn unconditional_jump() {
        let mut machine = machine(&[op(0x80, 4), HLT, op(0x20, DATA), HLT], &[(DATA, 9)]);
        assert_eq!(machine.run(), Registers { accumulator: 9, pc: 16 });
    }

    #[test]
    fn complement_advances_half_an_instruction() {
        let mut machine = machine(&[[0x60, 0, 0xF0, 0]], &[]);
        assert_eq!(machine.run(), Registers { accumulator: 0xFF, pc: 6 });
    }

    #[test]
    fn unknown_opcodes_are_skipped() {
        let mut machine = machine(&[op(0x77, DATA), op(0x20, DATA), HLT], &[(DATA, 3)]);
        assert_eq!(machine.run(), Registers { accumulator: 3, pc: 12 });
    }

    #[test]
    fn bad_header_leaves_state_untouched() {
        let mut machine = machine(&[op(0x20, DATA), HLT], &[(DATA, 0x42)]);
        machine.run();

        let before = (machine.registers(), *machine.memory());
        let mut bytes = vec![0; MEMORY_SIZE];
        bytes[..4].copy_from_slice(&[0x03, 0x4E, 0x44, 0x00]);

        assert!(matches!(machine.load(&bytes), Err(ImageError::BadHeader(_))));
        assert_eq!((machine.registers(), *machine.memory()), before);
    }

    #[test]
    fn memory_dump_format() {
        let machine = machine(&[HLT], &[]);
        let dump = machine.dump().to_string();
        let lines: Vec<_> = dump.lines().collect();

        assert_eq!(lines.len(), 33);
        assert_eq!(lines[0], format!("00000000: 00 00 00 00 f0{}", " 00".repeat(11)));
        assert_eq!(lines[32], "00000200: 00 00 00 00");
    }

    #[test]
    fn registers_report() {
        let registers = Registers { accumulator: 0x0A, pc: 0x1C };
        assert_eq!(registers.to_string(), "Final AC: 0x0A\nFinal PC: 0x1C\n");
    }
}
