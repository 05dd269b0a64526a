//! Machine state dump

use std::fmt;
use um32_disassembler::format_line;
use um32_runtime::Machine;

/// Program words shown in a dump
pub const PROGRAM_PREVIEW_WORDS: usize = 16;

/// Human-readable snapshot of a machine
pub struct StateDump<'a>(pub &'a Machine);

impl fmt::Display for StateDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let machine = self.0;
        let ip = machine.instruction_pointer();

        match machine.current_word() {
            Some(word) => writeln!(f, "ip     {}", format_line(ip as usize, word))?,
            None => writeln!(f, "ip     {:08x}: <end of program>", ip)?,
        }
        writeln!(f, "cycles {}", machine.cycles())?;

        writeln!(f, "registers")?;
        for (index, value) in machine.registers().iter().enumerate() {
            writeln!(f, "  r{}  0x{:08x}  {}", index, value, value)?;
        }

        let program = machine.program();
        writeln!(f, "program ({} words)", program.len())?;
        for (index, word) in program.as_slice().iter().take(PROGRAM_PREVIEW_WORDS).enumerate() {
            writeln!(f, "  {:08x}: 0x{:08x}", index, word)?;
        }
        if program.len() > PROGRAM_PREVIEW_WORDS {
            writeln!(f, "  ... {} more", program.len() - PROGRAM_PREVIEW_WORDS)?;
        }

        let heap = machine.heap();
        let stats = heap.stats();
        writeln!(
            f,
            "heap   {} words, {} blocks ({} live, {} free), {:.1}% fragmentation",
            heap.len(),
            stats.blocks,
            stats.live,
            stats.free,
            stats.fragmentation()
        )
    }
}
