//! Host side of the serial port: a one-way byte sink fed by SC transfer
//! requests. There is no link-cable peer; the default sink turns the stream
//! into log lines, which is enough for test ROMs that print through the
//! serial port.

use crate::memory::ioregisters::IoRegisters;

pub trait SerialSink {
    fn write_byte(&mut self, byte: u8);
}

/// Collects serial output into lines and emits each completed line through
/// the logger. Non-printable bytes other than newline are shown as escapes.
pub struct LogSerialSink {
    line: String,
}

impl LogSerialSink {
    pub fn new() -> Self {
        Self { line: String::new() }
    }

    fn flush_line(&mut self) {
        if !self.line.is_empty() {
            log::info!("serial: {}", self.line);
            self.line.clear();
        }
    }
}

impl SerialSink for LogSerialSink {
    fn write_byte(&mut self, byte: u8) {
        match byte {
            b'\n' => self.flush_line(),
            0x20..=0x7E => self.line.push(char::from(byte)),
            _ => self.line.push_str(&format!("\\x{byte:02X}")),
        }
    }
}

impl Drop for LogSerialSink {
    fn drop(&mut self) {
        self.flush_line();
    }
}

/// Drain the bytes queued by SC writes into the host sink.
pub fn drain_serial_output(io_registers: &mut IoRegisters, sink: &mut dyn SerialSink) {
    while let Some(byte) = io_registers.pop_serial_byte() {
        sink.write_byte(byte);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct VecSink(Vec<u8>);

    impl SerialSink for VecSink {
        fn write_byte(&mut self, byte: u8) {
            self.0.push(byte);
        }
    }

    #[test]
    fn drains_queued_bytes_in_order() {
        let mut io_registers = IoRegisters::new();
        let mut sink = VecSink::default();

        for &byte in b"ok" {
            io_registers.write_address(0xFF01, byte);
            io_registers.write_address(0xFF02, 0x81);
        }

        drain_serial_output(&mut io_registers, &mut sink);
        assert_eq!(b"ok".to_vec(), sink.0);

        drain_serial_output(&mut io_registers, &mut sink);
        assert_eq!(b"ok".to_vec(), sink.0);
    }
}
