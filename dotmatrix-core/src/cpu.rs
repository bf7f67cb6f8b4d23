pub(crate) mod instructions;
mod registers;

#[cfg(test)]
mod tests;

use crate::memory::ioregisters::IoRegister;
use crate::memory::AddressSpace;

pub use registers::{CpuRegister, CpuRegisterPair, CpuRegisters};

/// The five interrupt lines, in priority order (V-Blank strongest).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptType {
    VBlank,
    LcdStatus,
    Timer,
    Serial,
    Joypad,
}

impl InterruptType {
    pub const PRIORITY_ORDER: [Self; 5] =
        [Self::VBlank, Self::LcdStatus, Self::Timer, Self::Serial, Self::Joypad];

    pub fn handler_address(self) -> u16 {
        match self {
            Self::VBlank => 0x0040,
            Self::LcdStatus => 0x0048,
            Self::Timer => 0x0050,
            Self::Serial => 0x0058,
            Self::Joypad => 0x0060,
        }
    }

    pub fn flag_mask(self) -> u8 {
        match self {
            Self::VBlank => 0x01,
            Self::LcdStatus => 0x02,
            Self::Timer => 0x04,
            Self::Serial => 0x08,
            Self::Joypad => 0x10,
        }
    }
}

/// T-cycles consumed by an interrupt service dispatch (5 M-cycles).
pub const ISR_CYCLES_REQUIRED: u32 = 20;

/// The interrupt lines that are both enabled and requested.
pub fn pending_interrupts(address_space: &AddressSpace) -> u8 {
    let ie_value = address_space.get_ie_register();
    let if_value = address_space.get_io_registers().read_register(IoRegister::IF);
    ie_value & if_value & 0x1F
}

/// Whether the CPU should dispatch to an interrupt handler before the next
/// instruction. Requires IME, an enabled pending line, and no in-flight EI
/// delay.
pub fn interrupt_triggered(cpu_registers: &CpuRegisters, address_space: &AddressSpace) -> bool {
    cpu_registers.ime && !cpu_registers.interrupt_delay && pending_interrupts(address_space) != 0
}

/// Dispatch to the highest-priority pending interrupt handler: clear IME and
/// the serviced IF bit, push PC, and jump to the fixed vector.
pub fn execute_interrupt_service_routine(
    cpu_registers: &mut CpuRegisters,
    address_space: &mut AddressSpace,
) {
    let pending = pending_interrupts(address_space);
    let Some(interrupt_type) =
        InterruptType::PRIORITY_ORDER.into_iter().find(|it| pending & it.flag_mask() != 0)
    else {
        return;
    };

    log::trace!(
        "Servicing {interrupt_type:?} interrupt, jumping to 0x{:04X}",
        interrupt_type.handler_address()
    );

    cpu_registers.ime = false;
    cpu_registers.halted = false;
    address_space.get_io_registers_mut().interrupt_flags().clear(interrupt_type);

    cpu_registers.sp = cpu_registers.sp.wrapping_sub(2);
    address_space.write_address_u16(cpu_registers.sp, cpu_registers.pc);
    cpu_registers.pc = interrupt_type.handler_address();
}

/// Run one CPU step: an interrupt dispatch, a single instruction, or a 4-cycle
/// idle tick while halted. Returns the T-cycle cost of the step.
pub fn step(cpu_registers: &mut CpuRegisters, address_space: &mut AddressSpace) -> u32 {
    if interrupt_triggered(cpu_registers, address_space) {
        execute_interrupt_service_routine(cpu_registers, address_space);
        return ISR_CYCLES_REQUIRED;
    }

    // A pending-but-masked interrupt still ends HALT, it just isn't serviced
    if cpu_registers.halted && pending_interrupts(address_space) == 0 {
        return 4;
    }
    cpu_registers.halted = false;

    let halt_bug_triggered = cpu_registers.halt_bug_triggered;
    cpu_registers.halt_bug_triggered = false;

    let (instruction, pc) =
        instructions::parse_next_instruction(address_space, cpu_registers.pc, halt_bug_triggered);

    log::trace!(
        "Executing {instruction:02X?} at PC=0x{:04X}, registers: {cpu_registers:02X?}",
        cpu_registers.pc
    );

    cpu_registers.pc = pc;
    let cycles_required = instruction.cycles_required(cpu_registers);
    instruction.execute(address_space, cpu_registers);

    cycles_required
}
