//! Integration tests for the UM32 machine
//!
//! Programs are written in assembly and run to completion.

use um32_assembler::assemble;
use um32_runtime::{Machine, MachineConfig, ScriptedInput, SharedOutput, StopReason};
use um32_spec::{Fault, Register, END_OF_INPUT};

fn run_source(source: &str, input: &[u8]) -> (Machine, StopReason, Vec<u8>) {
    let program = assemble(source).unwrap();
    let output = SharedOutput::new();
    let mut machine = Machine::new(MachineConfig::default())
        .unwrap()
        .with_reader(ScriptedInput::new(input))
        .with_writer(output.clone());
    machine.load_program(&program).unwrap();
    let result = machine.run();
    (machine, result.stop, output.take())
}

// ============================================================================
// Output
// ============================================================================

#[test]
fn test_hello() {
    let source = r#"
        li r0 $0x48
        outb r0
        li r0 $0x69
        outb r0
        li r0 $0x0a
        outb r0
        halt
    "#;
    let (_, stop, output) = run_source(source, b"");
    assert_eq!(stop, StopReason::Fault(Fault::Halted));
    assert_eq!(output, b"Hi\n");
}

// ============================================================================
// Control Flow
// ============================================================================

#[test]
fn test_countdown_loop() {
    // Print '5' down to '1' using cmov to pick the jump target.
    let source = r#"
        li r1 $5          # counter
        li r2 $0x30       # '0'
        li r3 $1
        nand r3 r3 r3     # 0xfffffffe
        li r4 $1
        add r3 r3 r4      # 0xffffffff
        li r5 $7          # loop
    loop:
        add r0 r1 r2
        outb r0
        add r1 r1 r3      # counter - 1
        li r6 $13         # done
        cmov r6 r5 r1     # keep looping while counter != 0
        load r7 r6
    done:
        halt
    "#;
    let (machine, stop, output) = run_source(source, b"");
    assert_eq!(stop, StopReason::Fault(Fault::Halted));
    assert_eq!(output, b"54321");
    assert_eq!(machine.instruction_pointer(), 13);
}

// ============================================================================
// Input
// ============================================================================

#[test]
fn test_echo_until_end_of_input() {
    let source = r#"
        li r4 $1
    loop:
        inb r0
        add r1 r0 r4      # zero only at end of input
        li r6 $7          # done
        li r7 $8          # print
        cmov r6 r7 r1
        load r2 r6
    done:
        halt
    print:
        outb r0
        li r6 $1
        load r2 r6
    "#;
    let (machine, stop, output) = run_source(source, b"abc");
    assert_eq!(stop, StopReason::Fault(Fault::Halted));
    assert_eq!(output, b"abc");
    assert_eq!(machine.register(Register::R0), END_OF_INPUT);
}

#[test]
fn test_input_without_reader() {
    let program = assemble("inb r0").unwrap();
    let mut machine = Machine::new(MachineConfig::default()).unwrap();
    machine.load_program(&program).unwrap();
    assert_eq!(machine.run().stop, StopReason::Fault(Fault::MissingReader));
}

// ============================================================================
// Heap and Self-Modification
// ============================================================================

#[test]
fn test_copy_tail_to_heap_and_load() {
    let source = r#"
        li r1 $3
        alloc r2 r1       # block of 3 words
        li r1 $2
        nand r1 r1 r1     # -3
        li r3 $0          # i
        li r4 $1
    copy:
        li r5 $18         # tail
        add r6 r5 r3
        getp r7 r0 r6     # program[tail + i]
        setp r2 r3 r7     # block[i]
        add r3 r3 r4
        add r6 r3 r1      # i - 3
        li r5 $16         # done
        li r7 $6          # copy
        cmov r5 r7 r6
        load r0 r5
    done:
        li r6 $0
        load r2 r6
    tail:
        li r0 $0x21
        outb r0
        halt
    "#;
    let (machine, stop, output) = run_source(source, b"");
    assert_eq!(stop, StopReason::Fault(Fault::Halted));
    assert_eq!(output, b"!");
    assert_eq!(machine.program().len(), 3);
    assert_eq!(machine.instruction_pointer(), 2);
    assert_eq!(machine.heap().stats().live, 1);
}

#[test]
fn test_self_modifying_store() {
    // Overwrite the trailing halt with outb r1 (0xa0000001).
    let source = r#"
        li r1 $0x41
        li r2 $8          # index of the halt
        li r3 $0xa000
        li r4 $0x10000
        mul r3 r3 r4
        li r4 $1
        add r3 r3 r4
        setp r0 r2 r3
        halt
    "#;
    let (machine, stop, output) = run_source(source, b"");
    assert_eq!(stop, StopReason::Fault(Fault::Terminated));
    assert_eq!(output, b"A");
    assert_eq!(machine.program()[8], 0xA000_0001);
}

#[test]
fn test_load_program_replaces_code() {
    let source = r#"
        li r1 $2
        alloc r2 r1
        li r3 $0x7000
        li r4 $0x10000
        mul r3 r3 r4      # halt
        li r5 $1
        setp r2 r5 r3     # block = [cmov r0 r0 r0, halt]
        li r6 $0
        load r2 r6
    "#;
    let (machine, stop, _) = run_source(source, b"");
    assert_eq!(stop, StopReason::Fault(Fault::Halted));
    assert_eq!(machine.program().as_slice(), &[0x0000_0000, 0x7000_0000]);
    assert_eq!(machine.instruction_pointer(), 1);
}

#[test]
fn test_freed_block_is_unusable() {
    let source = r#"
        li r1 $4
        alloc r2 r1
        free r2
        free r2
    "#;
    let (machine, stop, _) = run_source(source, b"");
    assert_eq!(stop, StopReason::Fault(Fault::InvalidFree));
    assert_eq!(machine.instruction_pointer(), 3);
    assert_eq!(machine.heap().stats().free, 1);
}

// Writes a header-shaped [1, 1, 0xaa, 1] into a 6-word block and leaves
// r7 pointing two words in, where such a block would start.
const FAKE_HEADER_SETUP: &str = r#"
    li r1 $6
    alloc r2 r1
    li r3 $1
    setp r2 r0 r3
    setp r2 r3 r3
    li r4 $2
    li r5 $0xaa
    setp r2 r4 r5
    li r6 $3
    setp r2 r6 r3
    add r7 r2 r4
"#;

#[test]
fn test_header_in_payload_is_not_a_block() {
    let (machine, stop, _) = run_source(&format!("{FAKE_HEADER_SETUP}getp r5 r7 r0\n"), b"");
    assert_eq!(stop, StopReason::Fault(Fault::InvalidAddress));
    assert_eq!(machine.instruction_pointer(), 11);
    assert_eq!(machine.register(Register::R5), 0xaa);

    let (machine, stop, _) = run_source(&format!("{FAKE_HEADER_SETUP}free r7\n"), b"");
    assert_eq!(stop, StopReason::Fault(Fault::InvalidFree));
    let block = machine.register(Register::R2);
    assert_eq!(machine.heap().payload(block).unwrap(), &[1, 1, 0xaa, 1, 0, 0]);
    assert_eq!(machine.heap().stats().live, 1);
}

// ============================================================================
// Faults
// ============================================================================

#[test]
fn test_fault_leaves_state_inspectable() {
    let source = r#"
        li r1 $7
        div r2 r1 r0
    "#;
    let (mut machine, stop, _) = run_source(source, b"");
    assert_eq!(stop, StopReason::Fault(Fault::DivisionByZero));
    assert_eq!(machine.instruction_pointer(), 1);
    assert_eq!(machine.register(Register::R1), 7);

    // the host may patch state and continue
    machine.set_register(Register::R0, 7);
    assert_eq!(machine.run().stop, StopReason::Fault(Fault::Terminated));
    assert_eq!(machine.register(Register::R2), 1);
}

#[test]
fn test_invalid_byte() {
    let (_, stop, output) = run_source("li r0 $256\noutb r0", b"");
    assert_eq!(stop, StopReason::Fault(Fault::InvalidByte));
    assert!(output.is_empty());
}

#[test]
fn test_raw_invalid_opcode() {
    let (machine, stop, _) = run_source("li r0 $1\n.word 0xf0000000", b"");
    assert_eq!(stop, StopReason::Fault(Fault::InvalidInstruction));
    assert_eq!(machine.instruction_pointer(), 1);
}

#[test]
fn test_load_from_stream() {
    let program = assemble("li r0 $0x7a\noutb r0").unwrap();
    let bytes = program.to_bytes();

    let output = SharedOutput::new();
    let mut machine = Machine::new(MachineConfig::default())
        .unwrap()
        .with_writer(output.clone());
    assert_eq!(machine.load_from(bytes.as_slice()).unwrap(), 2);
    assert_eq!(machine.run().stop, StopReason::Fault(Fault::Terminated));
    assert_eq!(output.take(), b"z");
}

#[test]
fn test_load_from_rejects_trailing_bytes() {
    let mut machine = Machine::new(MachineConfig::default()).unwrap();
    assert!(machine.load_from(&[0x70u8, 0, 0, 0, 1][..]).is_err());
    assert!(machine.program().is_empty());
}
