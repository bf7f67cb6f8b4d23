use crate::cpu::InterruptType;
use crate::memory::ioregisters::{IoRegister, IoRegisters};

/// Free-running T-cycle counter backing the DIV and TIMA registers. Both
/// registers increment when the counter crosses a multiple of their period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerCounter(u64);

impl TimerCounter {
    pub fn new() -> Self {
        Self(0)
    }
}

// DIV increments every 256 T-cycles
const DIV_PERIOD: u64 = 256;

// TIMA period in T-cycles for each TAC clock select value
fn tima_period(timer_control: u8) -> u64 {
    match timer_control & 0x03 {
        0x00 => 1024,
        0x01 => 16,
        0x02 => 64,
        0x03 => 256,
        _ => unreachable!("two-bit value"),
    }
}

/// Read the TMA register. The scheduler captures this before executing an
/// instruction so that a TIMA overflow during the instruction reloads from
/// the pre-instruction modulo.
pub fn read_timer_modulo(io_registers: &IoRegisters) -> u8 {
    io_registers.read_register(IoRegister::TMA)
}

/// Advance the timer unit by the given number of T-cycles, updating DIV and
/// TIMA and requesting the timer interrupt on TIMA overflow.
///
/// # Panics
///
/// Panics if `cycles` exceeds 256, since more than one DIV increment per call
/// is not representable.
pub fn update_timer_registers(
    io_registers: &mut IoRegisters,
    counter: &mut TimerCounter,
    timer_modulo: u8,
    cycles: u64,
) {
    assert!(cycles <= DIV_PERIOD, "cycles must be <= {DIV_PERIOD}, was {cycles}");

    let old_cycles = counter.0;
    let new_cycles = old_cycles + cycles;
    counter.0 = new_cycles;

    if old_cycles / DIV_PERIOD != new_cycles / DIV_PERIOD {
        let old_div = io_registers.read_register(IoRegister::DIV);
        io_registers.write_register(IoRegister::DIV, old_div.wrapping_add(1));
    }

    let timer_control = io_registers.read_register(IoRegister::TAC);
    if timer_control & 0x04 == 0 {
        // TIMA updates are disabled
        return;
    }

    let period = tima_period(timer_control);
    let increments = new_cycles / period - old_cycles / period;

    // At most one increment per call for every period >= 16, so this loop
    // runs 0 or 1 times except at the fastest prescaler
    for _ in 0..increments {
        let old_tima = io_registers.read_register(IoRegister::TIMA);
        match old_tima.overflowing_add(1) {
            (new_tima, false) => {
                io_registers.write_register(IoRegister::TIMA, new_tima);
            }
            (_, true) => {
                io_registers.write_register(IoRegister::TIMA, timer_modulo);
                io_registers.interrupt_flags().set(InterruptType::Timer);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_timer_modulo_fn() {
        let mut io_registers = IoRegisters::new();

        io_registers.write_register(IoRegister::TMA, 0x3D);
        assert_eq!(0x3D, read_timer_modulo(&io_registers));
    }

    #[test]
    fn divider_register() {
        let mut io_registers = IoRegisters::new();
        let mut timer_counter = TimerCounter::new();

        // DIV should ignore the timer enabled bit
        io_registers.write_register(IoRegister::TAC, 0x00);

        update_timer_registers(&mut io_registers, &mut timer_counter, 0, 20);
        assert_eq!(0x00, io_registers.read_register(IoRegister::DIV));

        update_timer_registers(&mut io_registers, &mut timer_counter, 0, 235);
        assert_eq!(0x00, io_registers.read_register(IoRegister::DIV));

        update_timer_registers(&mut io_registers, &mut timer_counter, 0, 1);
        assert_eq!(0x01, io_registers.read_register(IoRegister::DIV));

        for _ in 0..254 {
            update_timer_registers(&mut io_registers, &mut timer_counter, 0, 256);
        }
        assert_eq!(0xFF, io_registers.read_register(IoRegister::DIV));

        // DIV wraps without any interrupt
        update_timer_registers(&mut io_registers, &mut timer_counter, 0, 256);
        assert_eq!(0x00, io_registers.read_register(IoRegister::DIV));
        assert!(!io_registers.interrupt_flags().get(InterruptType::Timer));
    }

    #[test]
    fn div_write_resets_register_only() {
        let mut io_registers = IoRegisters::new();
        let mut timer_counter = TimerCounter::new();

        update_timer_registers(&mut io_registers, &mut timer_counter, 0, 256);
        assert_eq!(0x01, io_registers.read_register(IoRegister::DIV));

        // All DIV writes reset the register regardless of value
        io_registers.write_address(0xFF04, 0x46);
        assert_eq!(0x00, io_registers.read_register(IoRegister::DIV));
    }

    #[test]
    fn tima_prescaler_16() {
        let mut io_registers = IoRegisters::new();
        let mut timer_counter = TimerCounter::new();

        let timer_modulo = 0x78;

        // Timer enabled, TIMA update frequency 16
        io_registers.write_register(IoRegister::TAC, 0x05);
        io_registers.write_register(IoRegister::TIMA, 0xE0);

        update_timer_registers(&mut io_registers, &mut timer_counter, timer_modulo, 15);
        assert_eq!(0xE0, io_registers.read_register(IoRegister::TIMA));

        update_timer_registers(&mut io_registers, &mut timer_counter, timer_modulo, 1);
        assert_eq!(0xE1, io_registers.read_register(IoRegister::TIMA));

        update_timer_registers(&mut io_registers, &mut timer_counter, timer_modulo, 40);
        assert_eq!(0xE3, io_registers.read_register(IoRegister::TIMA));

        update_timer_registers(&mut io_registers, &mut timer_counter, timer_modulo, 40);
        assert_eq!(0xE6, io_registers.read_register(IoRegister::TIMA));
    }

    #[test]
    fn tima_overflow_reloads_modulo_and_requests_interrupt() {
        let mut io_registers = IoRegisters::new();
        let mut timer_counter = TimerCounter::new();

        let timer_modulo = 0x78;

        io_registers.write_register(IoRegister::TAC, 0x05);
        io_registers.write_register(IoRegister::TIMA, 0xFE);

        update_timer_registers(&mut io_registers, &mut timer_counter, timer_modulo, 16);
        assert_eq!(0xFF, io_registers.read_register(IoRegister::TIMA));
        assert!(!io_registers.interrupt_flags().get(InterruptType::Timer));

        update_timer_registers(&mut io_registers, &mut timer_counter, timer_modulo, 16);
        assert_eq!(0x78, io_registers.read_register(IoRegister::TIMA));
        assert!(io_registers.interrupt_flags().get(InterruptType::Timer));
    }

    #[test]
    fn tima_prescaler_1024() {
        let mut io_registers = IoRegisters::new();
        let mut timer_counter = TimerCounter::new();

        // Timer enabled, slowest prescaler
        io_registers.write_register(IoRegister::TAC, 0x04);

        for _ in 0..3 {
            update_timer_registers(&mut io_registers, &mut timer_counter, 0, 256);
        }
        assert_eq!(0x00, io_registers.read_register(IoRegister::TIMA));

        update_timer_registers(&mut io_registers, &mut timer_counter, 0, 256);
        assert_eq!(0x01, io_registers.read_register(IoRegister::TIMA));
    }

    #[test]
    fn tima_disabled() {
        let mut io_registers = IoRegisters::new();
        let mut timer_counter = TimerCounter::new();

        // Prescaler bits set but enable bit clear
        io_registers.write_register(IoRegister::TAC, 0x01);

        for _ in 0..8 {
            update_timer_registers(&mut io_registers, &mut timer_counter, 0, 256);
        }
        assert_eq!(0x00, io_registers.read_register(IoRegister::TIMA));

        // DIV keeps counting regardless
        assert_eq!(0x08, io_registers.read_register(IoRegister::DIV));
    }

    #[test]
    #[should_panic(expected = "cycles must be <= 256")]
    fn cycle_limit() {
        let mut io_registers = IoRegisters::new();
        let mut timer_counter = TimerCounter::new();

        update_timer_registers(&mut io_registers, &mut timer_counter, 0, 257);
    }
}
