//! UM32 Machine
//!
//! One call to [`Machine::execute`] runs exactly one fetch-decode-execute
//! cycle and reports its outcome as a [`Fault`].

use crate::error::Result;
use crate::heap::{Heap, DEFAULT_HEAP_LIMIT};
use crate::io::{ByteReader, ByteWriter};
use crate::segment::Segment;
use std::io::Read;
use um32_spec::{
    Fault, Instruction, Program, Register, Word, END_OF_INPUT, MAX_BYTE, NUM_REGISTERS,
};

/// Machine configuration
#[derive(Debug, Clone)]
pub struct MachineConfig {
    /// Maximum cycles per [`Machine::run`] call (`None` = unbounded)
    pub max_cycles: Option<u64>,

    /// Maximum heap segment size in words
    pub heap_limit: u32,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            max_cycles: None,
            heap_limit: DEFAULT_HEAP_LIMIT,
        }
    }
}

/// Why [`Machine::run`] returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// `execute` returned something other than [`Fault::None`]
    Fault(Fault),
    /// The configured cycle budget ran out
    CycleLimit,
}

impl StopReason {
    pub fn fault(self) -> Option<Fault> {
        match self {
            StopReason::Fault(fault) => Some(fault),
            StopReason::CycleLimit => None,
        }
    }

    /// The program ended by halting or running off its end
    pub fn is_clean(self) -> bool {
        matches!(self, StopReason::Fault(f) if f.is_stopped())
    }
}

/// Result of [`Machine::run`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionResult {
    /// Cycles executed during this run
    pub cycles: u64,

    pub stop: StopReason,
}

/// What a successful instruction did to the instruction pointer
enum Flow {
    Next,
    Jumped,
}

pub struct Machine {
    registers: [Word; NUM_REGISTERS],
    program: Segment,
    heap: Heap,
    instruction_pointer: Word,
    reader: Option<Box<dyn ByteReader>>,
    writer: Option<Box<dyn ByteWriter>>,
    config: MachineConfig,
    cycles: u64,
}

impl Machine {
    /// Create a machine with zeroed registers, an empty program, a fresh
    /// heap and no I/O installed.
    pub fn new(config: MachineConfig) -> Result<Self> {
        Ok(Self {
            registers: [0; NUM_REGISTERS],
            program: Segment::new()?,
            heap: Heap::with_limit(config.heap_limit)?,
            instruction_pointer: 0,
            reader: None,
            writer: None,
            config,
            cycles: 0,
        })
    }

    pub fn with_reader(mut self, reader: impl ByteReader + 'static) -> Self {
        self.reader = Some(Box::new(reader));
        self
    }

    pub fn with_writer(mut self, writer: impl ByteWriter + 'static) -> Self {
        self.writer = Some(Box::new(writer));
        self
    }

    pub fn set_reader(&mut self, reader: Option<Box<dyn ByteReader>>) {
        self.reader = reader;
    }

    pub fn set_writer(&mut self, writer: Option<Box<dyn ByteWriter>>) {
        self.writer = writer;
    }

    /// Append words to the program
    pub fn load(&mut self, words: &[Word]) -> Result<()> {
        self.program.add_range(words)?;
        tracing::debug!(words = words.len(), total = self.program.len(), "loaded program words");
        Ok(())
    }

    pub fn load_program(&mut self, program: &Program) -> Result<()> {
        self.load(&program.words)
    }

    /// Append a big-endian program stream. Returns the number of words read.
    pub fn load_from<R: Read>(&mut self, input: R) -> Result<usize> {
        let program = Program::read_from(input)?;
        self.load(&program.words)?;
        Ok(program.len())
    }

    /// Run one cycle
    pub fn execute(&mut self) -> Fault {
        let Some(word) = self.program.get(self.instruction_pointer as usize) else {
            return Fault::Terminated;
        };
        self.cycles += 1;

        let instr = match Instruction::decode(word) {
            Ok(instr) => instr,
            Err(_) => return Fault::InvalidInstruction,
        };
        tracing::trace!(ip = self.instruction_pointer, word, ?instr, "execute");

        match self.dispatch(instr) {
            Ok(Flow::Next) => {
                self.instruction_pointer = self.instruction_pointer.wrapping_add(1);
                Fault::None
            }
            Ok(Flow::Jumped) => Fault::None,
            Err(fault) => fault,
        }
    }

    /// Call [`execute`](Self::execute) until it reports anything but
    /// [`Fault::None`] or the cycle budget is spent.
    pub fn run(&mut self) -> ExecutionResult {
        let start = self.cycles;
        loop {
            let cycles = self.cycles - start;
            if self.config.max_cycles.is_some_and(|limit| cycles >= limit) {
                return ExecutionResult {
                    cycles,
                    stop: StopReason::CycleLimit,
                };
            }

            let fault = self.execute();
            if fault.is_none() {
                continue;
            }
            if fault.is_error() {
                tracing::warn!(ip = self.instruction_pointer, %fault, "machine fault");
            }
            return ExecutionResult {
                cycles: self.cycles - start,
                stop: StopReason::Fault(fault),
            };
        }
    }

    /// Flush the installed writer, if any
    pub fn flush(&mut self) {
        if let Some(writer) = self.writer.as_mut() {
            writer.flush();
        }
    }

    #[inline]
    fn reg(&self, r: Register) -> Word {
        self.registers[r.index()]
    }

    #[inline]
    fn set(&mut self, r: Register, value: Word) {
        self.registers[r.index()] = value;
    }

    fn dispatch(&mut self, instr: Instruction) -> std::result::Result<Flow, Fault> {
        match instr {
            Instruction::ConditionalMove { a, b, c } => {
                if self.reg(c) != 0 {
                    self.set(a, self.reg(b));
                }
            }

            Instruction::ArrayGet { a, b, c } => {
                let (address, offset) = (self.reg(b), self.reg(c));
                let value = if address == 0 {
                    self.program.get(offset as usize).ok_or(Fault::InvalidAddress)?
                } else {
                    self.heap.get(address, offset).map_err(|_| Fault::InvalidAddress)?
                };
                self.set(a, value);
            }

            Instruction::ArraySet { a, b, c } => {
                let (address, offset, value) = (self.reg(a), self.reg(b), self.reg(c));
                let slot = if address == 0 {
                    self.program.get_mut(offset as usize).ok_or(Fault::InvalidAddress)?
                } else {
                    self.heap.index(address, offset).map_err(|_| Fault::InvalidAddress)?.0
                };
                *slot = value;
            }

            Instruction::Add { a, b, c } => {
                self.set(a, self.reg(b).wrapping_add(self.reg(c)));
            }

            Instruction::Multiply { a, b, c } => {
                self.set(a, self.reg(b).wrapping_mul(self.reg(c)));
            }

            Instruction::Divide { a, b, c } => {
                let divisor = self.reg(c);
                if divisor == 0 {
                    return Err(Fault::DivisionByZero);
                }
                self.set(a, self.reg(b) / divisor);
            }

            Instruction::Nand { a, b, c } => {
                self.set(a, !(self.reg(b) & self.reg(c)));
            }

            Instruction::Halt => return Err(Fault::Halted),

            Instruction::Allocate { b, c } => {
                let address = self.heap.allocate(self.reg(c)).map_err(|e| {
                    tracing::debug!("allocation failed: {}", e);
                    Fault::OutOfMemory
                })?;
                self.set(b, address);
            }

            Instruction::Free { c } => {
                self.heap.free(self.reg(c)).map_err(|_| Fault::InvalidFree)?;
            }

            Instruction::Output { c } => {
                let value = self.reg(c);
                if value > MAX_BYTE {
                    return Err(Fault::InvalidByte);
                }
                let writer = self.writer.as_mut().ok_or(Fault::MissingWriter)?;
                writer.write_byte(value as u8);
            }

            Instruction::Input { c } => {
                if self.reader.is_none() {
                    return Err(Fault::MissingReader);
                }
                self.flush();
                let value = self
                    .reader
                    .as_mut()
                    .and_then(|reader| reader.read_byte())
                    .map_or(END_OF_INPUT, Word::from);
                self.set(c, value);
            }

            Instruction::LoadProgram { b, c } => {
                let (address, target) = (self.reg(b), self.reg(c));
                if address != 0 {
                    let payload = self.heap.payload(address).map_err(|_| Fault::InvalidAddress)?;
                    if target as usize >= payload.len() {
                        return Err(Fault::InvalidInstructionPointer);
                    }
                    self.program.replace_with(payload).map_err(|_| Fault::OutOfMemory)?;
                    tracing::debug!(address, words = self.program.len(), "replaced program");
                } else if target as usize >= self.program.len() {
                    return Err(Fault::InvalidInstructionPointer);
                }
                self.instruction_pointer = target;
                return Ok(Flow::Jumped);
            }

            Instruction::LoadImmediate { a, value } => {
                self.set(a, value);
            }
        }
        Ok(Flow::Next)
    }

    // ========== Introspection ==========

    pub fn registers(&self) -> &[Word; NUM_REGISTERS] {
        &self.registers
    }

    pub fn register(&self, r: Register) -> Word {
        self.reg(r)
    }

    pub fn set_register(&mut self, r: Register, value: Word) {
        self.set(r, value);
    }

    pub fn instruction_pointer(&self) -> Word {
        self.instruction_pointer
    }

    /// Word at the instruction pointer, if in bounds
    pub fn current_word(&self) -> Option<Word> {
        self.program.get(self.instruction_pointer as usize)
    }

    pub fn program(&self) -> &Segment {
        &self.program
    }

    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    /// Cycles executed since construction
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{ScriptedInput, SharedOutput};
    use um32_spec::Register::*;

    fn machine_with(instructions: &[Instruction]) -> Machine {
        let words: Vec<Word> = instructions.iter().map(Instruction::encode).collect();
        let mut machine = Machine::new(MachineConfig::default()).unwrap();
        machine.load(&words).unwrap();
        machine
    }

    fn li(a: Register, value: Word) -> Instruction {
        Instruction::LoadImmediate { a, value }
    }

    #[test]
    fn test_new_machine() {
        let machine = Machine::new(MachineConfig::default()).unwrap();
        assert_eq!(machine.registers(), &[0; NUM_REGISTERS]);
        assert_eq!(machine.instruction_pointer(), 0);
        assert!(machine.program().is_empty());
        assert!(machine.heap().is_empty());
    }

    #[test]
    fn test_empty_program_terminates() {
        let mut machine = machine_with(&[]);
        assert_eq!(machine.execute(), Fault::Terminated);
        assert_eq!(machine.execute(), Fault::Terminated);
        assert_eq!(machine.cycles(), 0);
    }

    #[test]
    fn test_halt_does_not_advance() {
        let mut machine = machine_with(&[Instruction::Halt]);
        assert_eq!(machine.execute(), Fault::Halted);
        assert_eq!(machine.instruction_pointer(), 0);
        assert_eq!(machine.execute(), Fault::Halted);
    }

    #[test]
    fn test_hello_byte() {
        let output = SharedOutput::new();
        let mut machine = machine_with(&[li(R0, 72), Instruction::Output { c: R0 }, Instruction::Halt])
            .with_writer(output.clone());

        assert_eq!(machine.execute(), Fault::None);
        assert_eq!(machine.execute(), Fault::None);
        assert_eq!(machine.execute(), Fault::Halted);
        assert_eq!(machine.instruction_pointer(), 2);
        assert_eq!(output.contents(), vec![0x48]);
    }

    #[test]
    fn test_runs_off_end() {
        let mut machine = machine_with(&[li(R1, 1)]);
        assert_eq!(machine.execute(), Fault::None);
        assert_eq!(machine.execute(), Fault::Terminated);
        assert_eq!(machine.instruction_pointer(), 1);
    }

    #[test]
    fn test_invalid_instruction_keeps_ip() {
        let mut machine = Machine::new(MachineConfig::default()).unwrap();
        machine.load(&[0xE000_0000]).unwrap();
        assert_eq!(machine.execute(), Fault::InvalidInstruction);
        assert_eq!(machine.instruction_pointer(), 0);
    }

    #[test]
    fn test_conditional_move() {
        let mut machine = machine_with(&[
            li(R1, 5),
            Instruction::ConditionalMove { a: R0, b: R1, c: R2 },
            li(R2, 1),
            Instruction::ConditionalMove { a: R3, b: R1, c: R2 },
        ]);
        machine.run();
        assert_eq!(machine.register(R0), 0);
        assert_eq!(machine.register(R3), 5);
    }

    #[test]
    fn test_add_wraps() {
        let mut machine = machine_with(&[Instruction::Add { a: R0, b: R1, c: R2 }]);
        machine.set_register(R1, 0xFFFF_FFFF);
        machine.set_register(R2, 1);
        assert_eq!(machine.execute(), Fault::None);
        assert_eq!(machine.register(R0), 0);
    }

    #[test]
    fn test_multiply_wraps() {
        let mut machine = machine_with(&[Instruction::Multiply { a: R0, b: R1, c: R2 }]);
        machine.set_register(R1, 0x1_0000);
        machine.set_register(R2, 0x1_0001);
        assert_eq!(machine.execute(), Fault::None);
        assert_eq!(machine.register(R0), 0x1_0000);
    }

    #[test]
    fn test_divide() {
        let mut machine = machine_with(&[Instruction::Divide { a: R0, b: R1, c: R2 }]);
        machine.set_register(R1, 0xFFFF_FFFF);
        machine.set_register(R2, 2);
        assert_eq!(machine.execute(), Fault::None);
        assert_eq!(machine.register(R0), 0x7FFF_FFFF);
    }

    #[test]
    fn test_divide_by_zero() {
        let mut machine = machine_with(&[Instruction::Divide { a: R0, b: R1, c: R2 }]);
        machine.set_register(R0, 99);
        machine.set_register(R1, 10);
        assert_eq!(machine.execute(), Fault::DivisionByZero);
        assert_eq!(machine.register(R0), 99);
        assert_eq!(machine.instruction_pointer(), 0);
    }

    #[test]
    fn test_nand() {
        let mut machine = machine_with(&[Instruction::Nand { a: R0, b: R1, c: R1 }]);
        machine.set_register(R1, 0x0F0F_0F0F);
        machine.execute();
        assert_eq!(machine.register(R0), 0xF0F0_F0F0);
    }

    #[test]
    fn test_program_array_access() {
        // the overwritten halt runs as a no-op conditional move
        let mut machine = machine_with(&[
            li(R2, 3),
            Instruction::ArrayGet { a: R0, b: R1, c: R2 },
            Instruction::ArraySet { a: R1, b: R2, c: R5 },
            Instruction::Halt,
        ]);
        machine.set_register(R5, 0x1234);
        assert_eq!(machine.run().stop, StopReason::Fault(Fault::Terminated));
        assert_eq!(machine.register(R0), Instruction::Halt.encode());
        assert_eq!(machine.program()[3], 0x1234);
    }

    #[test]
    fn test_program_array_out_of_bounds() {
        let mut machine = machine_with(&[Instruction::ArrayGet { a: R0, b: R1, c: R2 }]);
        machine.set_register(R2, 1);
        assert_eq!(machine.execute(), Fault::InvalidAddress);

        let mut machine = machine_with(&[Instruction::ArraySet { a: R1, b: R2, c: R3 }]);
        machine.set_register(R2, 1);
        assert_eq!(machine.execute(), Fault::InvalidAddress);
    }

    #[test]
    fn test_heap_roundtrip() {
        let mut machine = machine_with(&[
            li(R1, 4),
            Instruction::Allocate { b: R2, c: R1 },
            li(R3, 2),
            li(R4, 777),
            Instruction::ArraySet { a: R2, b: R3, c: R4 },
            Instruction::ArrayGet { a: R5, b: R2, c: R3 },
            Instruction::Free { c: R2 },
            Instruction::ArrayGet { a: R6, b: R2, c: R3 },
        ]);
        let result = machine.run();
        assert_eq!(result.stop, StopReason::Fault(Fault::InvalidAddress));
        assert_eq!(machine.register(R5), 777);
        assert_eq!(machine.register(R6), 0);
        assert_eq!(machine.instruction_pointer(), 7);
    }

    #[test]
    fn test_invalid_free() {
        let mut machine = machine_with(&[Instruction::Free { c: R0 }]);
        assert_eq!(machine.execute(), Fault::InvalidFree);
    }

    #[test]
    fn test_allocate_out_of_memory() {
        let config = MachineConfig {
            heap_limit: 64,
            ..MachineConfig::default()
        };
        let mut machine = Machine::new(config).unwrap();
        machine.load(&[Instruction::Allocate { b: R1, c: R2 }.encode()]).unwrap();
        machine.set_register(R2, 1000);
        machine.set_register(R1, 42);

        assert_eq!(machine.execute(), Fault::OutOfMemory);
        assert_eq!(machine.register(R1), 42);
        assert!(machine.heap().is_empty());
    }

    #[test]
    fn test_output_checks() {
        let mut machine = machine_with(&[Instruction::Output { c: R0 }]);
        assert_eq!(machine.execute(), Fault::MissingWriter);

        let mut machine = machine_with(&[Instruction::Output { c: R0 }]).with_writer(SharedOutput::new());
        machine.set_register(R0, 256);
        assert_eq!(machine.execute(), Fault::InvalidByte);

        // byte range is checked before the writer
        let mut machine = machine_with(&[Instruction::Output { c: R0 }]);
        machine.set_register(R0, 300);
        assert_eq!(machine.execute(), Fault::InvalidByte);
    }

    #[test]
    fn test_input() {
        let mut machine = machine_with(&[Instruction::Input { c: R3 }, Instruction::Input { c: R4 }])
            .with_reader(ScriptedInput::new(vec![b'A']));
        assert_eq!(machine.execute(), Fault::None);
        assert_eq!(machine.execute(), Fault::None);
        assert_eq!(machine.register(R3), 0x41);
        assert_eq!(machine.register(R4), END_OF_INPUT);
    }

    #[derive(Clone, Default)]
    struct CountingWriter {
        flushes: std::rc::Rc<std::cell::Cell<usize>>,
    }

    impl ByteWriter for CountingWriter {
        fn write_byte(&mut self, _: u8) {}

        fn flush(&mut self) {
            self.flushes.set(self.flushes.get() + 1);
        }
    }

    #[test]
    fn test_input_flushes_output_first() {
        let writer = CountingWriter::default();
        let mut machine = machine_with(&[Instruction::Input { c: R0 }, Instruction::Input { c: R0 }])
            .with_reader(ScriptedInput::default())
            .with_writer(writer.clone());
        machine.run();
        assert_eq!(writer.flushes.get(), 2);
    }

    #[test]
    fn test_detach_writer() {
        let output = SharedOutput::new();
        let mut machine = machine_with(&[li(R0, 1), Instruction::Output { c: R0 }, Instruction::Output { c: R0 }]);
        machine.set_writer(Some(Box::new(output.clone())));
        assert_eq!(machine.execute(), Fault::None);
        assert_eq!(machine.execute(), Fault::None);

        machine.set_writer(None);
        assert_eq!(machine.execute(), Fault::MissingWriter);
        assert_eq!(output.contents(), vec![1]);
    }

    #[test]
    fn test_missing_reader() {
        let mut machine = machine_with(&[Instruction::Input { c: R0 }]);
        assert_eq!(machine.execute(), Fault::MissingReader);
    }

    #[test]
    fn test_jump() {
        let mut machine = machine_with(&[
            li(R1, 3),
            Instruction::LoadProgram { b: R0, c: R1 },
            li(R7, 1),
            Instruction::Halt,
        ]);
        assert_eq!(machine.run().stop, StopReason::Fault(Fault::Halted));
        assert_eq!(machine.register(R7), 0);
        assert_eq!(machine.instruction_pointer(), 3);
    }

    #[test]
    fn test_jump_out_of_range() {
        let mut machine = machine_with(&[li(R1, 2), Instruction::LoadProgram { b: R0, c: R1 }]);
        assert_eq!(machine.run().stop, StopReason::Fault(Fault::InvalidInstructionPointer));
        assert_eq!(machine.instruction_pointer(), 1);
    }

    #[test]
    fn test_load_program_from_heap() {
        // Build [li r7, 9][halt] in a heap block, then swap it in.
        let words = [li(R7, 9).encode(), Instruction::Halt.encode()];
        let mut machine = machine_with(&[
            li(R1, 2),
            Instruction::Allocate { b: R2, c: R1 },
            li(R3, 0),
            li(R4, words[0] >> 16),
            li(R5, 0x1_0000),
            Instruction::Multiply { a: R4, b: R4, c: R5 },
            li(R5, words[0] & 0xFFFF),
            Instruction::Add { a: R4, b: R4, c: R5 },
            Instruction::ArraySet { a: R2, b: R3, c: R4 },
            li(R3, 1),
            li(R4, words[1] >> 16),
            li(R5, 0x1_0000),
            Instruction::Multiply { a: R4, b: R4, c: R5 },
            Instruction::ArraySet { a: R2, b: R3, c: R4 },
            li(R3, 0),
            Instruction::LoadProgram { b: R2, c: R3 },
        ]);

        let result = machine.run();
        assert_eq!(result.stop, StopReason::Fault(Fault::Halted));
        assert_eq!(machine.register(R7), 9);
        assert_eq!(machine.program().as_slice(), &words);
        assert_eq!(machine.instruction_pointer(), 1);
    }

    #[test]
    fn test_load_program_invalid_block() {
        let mut machine = machine_with(&[li(R2, 1234), Instruction::LoadProgram { b: R2, c: R0 }]);
        assert_eq!(machine.run().stop, StopReason::Fault(Fault::InvalidAddress));
        assert_eq!(machine.program().len(), 2);
    }

    #[test]
    fn test_load_program_target_beyond_block() {
        let mut machine = machine_with(&[
            li(R1, 2),
            Instruction::Allocate { b: R2, c: R1 },
            Instruction::LoadProgram { b: R2, c: R1 },
        ]);
        assert_eq!(
            machine.run().stop,
            StopReason::Fault(Fault::InvalidInstructionPointer)
        );
        assert_eq!(machine.program().len(), 3);
    }

    #[test]
    fn test_cycle_limit() {
        let config = MachineConfig {
            max_cycles: Some(10),
            ..MachineConfig::default()
        };
        let mut machine = Machine::new(config).unwrap();
        // jump to self forever
        machine.load(&[Instruction::LoadProgram { b: R0, c: R0 }.encode()]).unwrap();

        let result = machine.run();
        assert_eq!(result.stop, StopReason::CycleLimit);
        assert_eq!(result.cycles, 10);
        assert_eq!(machine.run().cycles, 10);
        assert_eq!(machine.cycles(), 20);
    }

    #[test]
    fn test_stop_reason_helpers() {
        assert!(StopReason::Fault(Fault::Halted).is_clean());
        assert!(!StopReason::Fault(Fault::InvalidFree).is_clean());
        assert!(!StopReason::CycleLimit.is_clean());
        assert_eq!(StopReason::CycleLimit.fault(), None);
    }
}
