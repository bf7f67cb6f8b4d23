pub mod address;
pub mod ioregisters;

use crate::memory::ioregisters::{IoRegister, IoRegisters};
use std::path::Path;
use std::{fs, io};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CartridgeLoadError {
    #[error("ROM should be at least 336 bytes, was {rom_len} bytes")]
    HeaderTooShort { rom_len: usize },
    #[error("invalid ROM size code in cartridge header: {rom_size_code:02X}")]
    InvalidRomSize { rom_size_code: u8 },
    #[error("invalid RAM size code in cartridge header: {ram_size_code:02X}")]
    InvalidRamSize { ram_size_code: u8 },
    #[error("cartridge requires the color model (CGB flag {cgb_flag:02X})")]
    CgbOnly { cgb_flag: u8 },
    #[error("error reading data from {file_path}: {source}")]
    FileReadError {
        file_path: String,
        #[source]
        source: io::Error,
    },
}

/// Fields decoded from the cartridge header at 0x0100-0x014F.
#[derive(Debug, Clone)]
pub struct CartridgeHeader {
    pub title: String,
    pub mapper_byte: u8,
    pub rom_banks: usize,
    pub ram_size: usize,
    pub sgb_supported: bool,
    pub japanese: bool,
    pub version: u8,
}

impl CartridgeHeader {
    fn parse(rom: &[u8]) -> Result<Self, CartridgeLoadError> {
        if rom.len() < address::HEADER_LEN {
            return Err(CartridgeLoadError::HeaderTooShort { rom_len: rom.len() });
        }

        let cgb_flag = rom[address::CGB_FLAG as usize];
        if cgb_flag == 0xC0 {
            return Err(CartridgeLoadError::CgbOnly { cgb_flag });
        }

        let title_bytes = &rom[address::TITLE_START as usize..address::TITLE_START as usize + 16];
        let title: String = title_bytes
            .iter()
            .copied()
            .take_while(|&b| b != 0)
            .map(char::from)
            .collect();

        let rom_size_code = rom[address::ROM_SIZE as usize];
        let rom_banks: usize = match rom_size_code {
            0x00..=0x08 => 2 << rom_size_code,
            0x52 => 72,
            0x53 => 80,
            0x54 => 96,
            _ => return Err(CartridgeLoadError::InvalidRomSize { rom_size_code }),
        };

        let ram_size_code = rom[address::RAM_SIZE as usize];
        let ram_size: usize = match ram_size_code {
            0x00 => 0,
            0x01 => 2048,
            0x02 => 8192,
            0x03 => 32768,
            0x04 => 131072,
            0x05 => 65536,
            _ => return Err(CartridgeLoadError::InvalidRamSize { ram_size_code }),
        };

        Ok(Self {
            title,
            mapper_byte: rom[address::MAPPER as usize],
            rom_banks,
            ram_size,
            sgb_supported: rom[address::SGB_FLAG as usize] == 0x03,
            japanese: rom[address::DESTINATION as usize] == 0x00,
            version: rom[address::VERSION as usize],
        })
    }
}

/// Cartridge ROM and external RAM, organized as uniform bank arrays.
///
/// Only the bank indices of the mapper are modeled: writes into the ROM area
/// update the current ROM/RAM bank number and nothing else.
pub struct Cartridge {
    rom_banks: Vec<Vec<u8>>,
    ram_banks: Vec<Vec<u8>>,
    current_rom_bank: usize,
    current_ram_bank: usize,
    header: CartridgeHeader,
}

impl Cartridge {
    /// Create a new Cartridge value from the given ROM image.
    ///
    /// # `CartridgeLoadError`
    ///
    /// This function will return an error in the following scenarios:
    /// * The ROM is too short to contain a complete header
    /// * The ROM or RAM size code in the header is invalid
    /// * The cartridge only runs on the color model
    pub fn new(rom: Vec<u8>) -> Result<Self, CartridgeLoadError> {
        log::info!("Initializing cartridge from {} bytes of data", rom.len());

        let header = CartridgeHeader::parse(&rom)?;

        log::info!("----- Cartridge info -----");
        log::info!("Title:         {}", header.title);
        log::info!("Mapper byte:   0x{:02X}", header.mapper_byte);
        log::info!("ROM banks:     {}", header.rom_banks);
        log::info!("RAM size:      {} bytes", header.ram_size);
        log::info!("SGB supported: {}", header.sgb_supported);
        log::info!("Destination:   {}", if header.japanese { "Japan" } else { "EU/US" });
        log::info!("Game version:  {}", header.version);

        let mut rom_banks: Vec<Vec<u8>> = rom
            .chunks(address::ROM_BANK_LEN)
            .map(|chunk| {
                let mut bank = chunk.to_vec();
                bank.resize(address::ROM_BANK_LEN, 0x00);
                bank
            })
            .collect();
        let bank_count = header.rom_banks.max(2).max(rom_banks.len());
        rom_banks.resize(bank_count, vec![0x00; address::ROM_BANK_LEN]);

        let ram_bank_count =
            (header.ram_size + address::RAM_BANK_LEN - 1) / address::RAM_BANK_LEN;
        let ram_banks = vec![vec![0x00; address::RAM_BANK_LEN]; ram_bank_count];

        Ok(Self {
            rom_banks,
            ram_banks,
            current_rom_bank: 1,
            current_ram_bank: 0,
            header,
        })
    }

    pub fn from_file(file_path: &str) -> Result<Self, CartridgeLoadError> {
        log::info!("Loading cartridge from '{file_path}'");

        let rom =
            fs::read(Path::new(file_path)).map_err(|err| CartridgeLoadError::FileReadError {
                file_path: file_path.into(),
                source: err,
            })?;

        Self::new(rom)
    }

    pub fn header(&self) -> &CartridgeHeader {
        &self.header
    }

    /// Read a value from the given ROM address. Addresses below 0x4000 always
    /// map to bank 0; addresses in 0x4000-0x7FFF map to the current bank.
    pub fn read_rom_address(&self, address: u16) -> u8 {
        let (bank, offset) = if address < address::ROM_BANK_N_START {
            (0, address as usize)
        } else {
            (self.clamped_rom_bank(), (address - address::ROM_BANK_N_START) as usize)
        };
        self.rom_banks[bank][offset]
    }

    /// Handle a write into the ROM area. This only captures the mapper bank
    /// indices; there is no full MBC register protocol.
    pub fn write_rom_address(&mut self, address: u16, value: u8) {
        match address {
            // ROM bank select. Bank 0 in the switchable slot reads as bank 1,
            // matching the common mapper families.
            0x2000..=0x3FFF => {
                self.current_rom_bank = usize::from(value).max(1);
            }
            // RAM bank select
            0x4000..=0x5FFF => {
                self.current_ram_bank = usize::from(value);
            }
            _ => {}
        }
    }

    /// Read a value from the given cartridge RAM address. Returns 0xFF if the
    /// cartridge has no RAM.
    pub fn read_ram_address(&self, address: u16) -> u8 {
        let Some(bank) = self.clamped_ram_bank() else {
            return 0xFF;
        };
        let offset = (address - address::EXTERNAL_RAM_START) as usize;
        self.ram_banks[bank][offset]
    }

    /// Write a value to the given cartridge RAM address. Does nothing if the
    /// cartridge has no RAM.
    pub fn write_ram_address(&mut self, address: u16, value: u8) {
        let Some(bank) = self.clamped_ram_bank() else {
            return;
        };
        let offset = (address - address::EXTERNAL_RAM_START) as usize;
        self.ram_banks[bank][offset] = value;
    }

    fn clamped_rom_bank(&self) -> usize {
        debug_assert!(
            self.current_rom_bank < self.rom_banks.len(),
            "ROM bank index {} out of range ({} banks)",
            self.current_rom_bank,
            self.rom_banks.len()
        );
        if self.current_rom_bank >= self.rom_banks.len() {
            log::warn!(
                "ROM bank index {} out of range, clamping to {}",
                self.current_rom_bank,
                self.rom_banks.len() - 1
            );
            return self.rom_banks.len() - 1;
        }
        self.current_rom_bank
    }

    fn clamped_ram_bank(&self) -> Option<usize> {
        if self.ram_banks.is_empty() {
            return None;
        }
        debug_assert!(
            self.current_ram_bank < self.ram_banks.len(),
            "RAM bank index {} out of range ({} banks)",
            self.current_ram_bank,
            self.ram_banks.len()
        );
        Some(self.current_ram_bank.min(self.ram_banks.len() - 1))
    }
}

/// OAM DMA transfer state. While a transfer is active the bus is locked out:
/// program reads outside HRAM return 0xFF and writes outside HRAM are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OamDmaState {
    Idle,
    Active { source: u16, bytes_copied: u8 },
}

const OAM_DMA_LEN: u8 = 160;

/// The full 16-bit address space: cartridge, VRAM, work RAM, OAM, I/O
/// registers, HRAM, and the IE register, with region routing and the OAM DMA
/// engine.
pub struct AddressSpace {
    cartridge: Cartridge,
    vram: [u8; 8192],
    working_ram: [u8; 8192],
    oam: [u8; 160],
    io_registers: IoRegisters,
    hram: [u8; 127],
    ie_register: u8,
    oam_dma: OamDmaState,
}

impl AddressSpace {
    pub fn new(cartridge: Cartridge) -> Self {
        Self {
            cartridge,
            vram: [0; 8192],
            working_ram: [0; 8192],
            oam: [0; 160],
            io_registers: IoRegisters::new(),
            hram: [0; 127],
            ie_register: 0,
            oam_dma: OamDmaState::Idle,
        }
    }

    fn is_cpu_access_allowed(&self, address: u16) -> bool {
        // While an OAM DMA transfer is active, only HRAM is reachable
        self.oam_dma == OamDmaState::Idle
            || (address::HRAM_START..=address::HRAM_END).contains(&address)
    }

    /// Read the value at the given address from the perspective of a running
    /// program. Returns 0xFF for addresses locked out by an active OAM DMA
    /// transfer.
    pub fn read_address_u8(&self, address: u16) -> u8 {
        if !self.is_cpu_access_allowed(address) {
            return 0xFF;
        }

        self.read_address_u8_no_access_check(address)
    }

    /// Read the value at the given address without the DMA lockout. For use by
    /// debugging tools observing the bus from outside the emulated program.
    pub fn debug_read_address_u8(&self, address: u16) -> u8 {
        self.read_address_u8_no_access_check(address)
    }

    fn read_address_u8_no_access_check(&self, address: u16) -> u8 {
        match address {
            address @ address::ROM_START..=address::ROM_END => {
                self.cartridge.read_rom_address(address)
            }
            address @ address::VRAM_START..=address::VRAM_END => {
                self.vram[(address - address::VRAM_START) as usize]
            }
            address @ address::EXTERNAL_RAM_START..=address::EXTERNAL_RAM_END => {
                self.cartridge.read_ram_address(address)
            }
            address @ address::WORKING_RAM_START..=address::WORKING_RAM_END => {
                self.working_ram[(address - address::WORKING_RAM_START) as usize]
            }
            address @ address::ECHO_RAM_START..=address::ECHO_RAM_END => {
                // True alias of work RAM
                self.working_ram[(address - address::ECHO_RAM_START) as usize]
            }
            address @ address::OAM_START..=address::OAM_END => {
                self.oam[(address - address::OAM_START) as usize]
            }
            address::UNUSABLE_START..=address::UNUSABLE_END => 0x00,
            address @ address::IO_REGISTERS_START..=address::IO_REGISTERS_END => {
                self.io_registers.read_address(address)
            }
            address @ address::HRAM_START..=address::HRAM_END => {
                self.hram[(address - address::HRAM_START) as usize]
            }
            address::IE_REGISTER => self.ie_register,
        }
    }

    /// Read the value at the given address and the following address as a
    /// little-endian 16-bit value.
    pub fn read_address_u16(&self, address: u16) -> u16 {
        let lsb = self.read_address_u8(address);
        let msb = self.read_address_u8(address.wrapping_add(1));
        u16::from_le_bytes([lsb, msb])
    }

    /// Assign a value to the given address from the perspective of a running
    /// program. The write is dropped for addresses locked out by an active OAM
    /// DMA transfer.
    pub fn write_address_u8(&mut self, address: u16, value: u8) {
        if !self.is_cpu_access_allowed(address) {
            return;
        }

        self.write_address_u8_no_access_check(address, value);
    }

    fn write_address_u8_no_access_check(&mut self, address: u16, value: u8) {
        match address {
            address @ address::ROM_START..=address::ROM_END => {
                self.cartridge.write_rom_address(address, value);
            }
            address @ address::VRAM_START..=address::VRAM_END => {
                self.vram[(address - address::VRAM_START) as usize] = value;
            }
            address @ address::EXTERNAL_RAM_START..=address::EXTERNAL_RAM_END => {
                self.cartridge.write_ram_address(address, value);
            }
            address @ address::WORKING_RAM_START..=address::WORKING_RAM_END => {
                self.working_ram[(address - address::WORKING_RAM_START) as usize] = value;
            }
            address @ address::ECHO_RAM_START..=address::ECHO_RAM_END => {
                self.working_ram[(address - address::ECHO_RAM_START) as usize] = value;
            }
            address @ address::OAM_START..=address::OAM_END => {
                self.oam[(address - address::OAM_START) as usize] = value;
            }
            address::UNUSABLE_START..=address::UNUSABLE_END => {}
            address @ address::IO_REGISTERS_START..=address::IO_REGISTERS_END => {
                self.io_registers.write_address(address, value);
                if address == IoRegister::DMA.to_address() {
                    self.start_oam_dma(value);
                }
            }
            address @ address::HRAM_START..=address::HRAM_END => {
                self.hram[(address - address::HRAM_START) as usize] = value;
            }
            address::IE_REGISTER => {
                self.ie_register = value;
            }
        }
    }

    /// Assign a 16-bit value to the given address and the following address,
    /// using little-endian.
    pub fn write_address_u16(&mut self, address: u16, value: u16) {
        let [lsb, msb] = value.to_le_bytes();
        self.write_address_u8(address, lsb);
        self.write_address_u8(address.wrapping_add(1), msb);
    }

    fn start_oam_dma(&mut self, source_page: u8) {
        debug_assert!(
            source_page <= address::OAM_DMA_SOURCE_MAX,
            "OAM DMA source page {source_page:02X} above {:02X}",
            address::OAM_DMA_SOURCE_MAX
        );
        let source_page = if source_page > address::OAM_DMA_SOURCE_MAX {
            log::warn!(
                "OAM DMA source page {source_page:02X} above {:02X}, clamping",
                address::OAM_DMA_SOURCE_MAX
            );
            address::OAM_DMA_SOURCE_MAX
        } else {
            source_page
        };

        log::trace!("Starting OAM DMA transfer from page 0x{source_page:02X}00");
        self.oam_dma = OamDmaState::Active { source: u16::from(source_page) << 8, bytes_copied: 0 };
    }

    /// Advance an active OAM DMA transfer by one M-cycle, copying one byte
    /// into OAM. Does nothing when no transfer is active.
    pub fn tick_dma_m_cycle(&mut self) {
        let OamDmaState::Active { source, bytes_copied } = self.oam_dma else {
            return;
        };

        let offset = u16::from(bytes_copied);
        self.oam[bytes_copied as usize] = self.read_address_u8_no_access_check(source + offset);

        let bytes_copied = bytes_copied + 1;
        self.oam_dma = if bytes_copied == OAM_DMA_LEN {
            OamDmaState::Idle
        } else {
            OamDmaState::Active { source, bytes_copied }
        };
    }

    pub fn oam_dma_active(&self) -> bool {
        self.oam_dma != OamDmaState::Idle
    }

    /// Read the OAM/VRAM value at the given address from the perspective of
    /// the PPU, which is not subject to the DMA lockout.
    ///
    /// # Panics
    ///
    /// This method will panic if the address is not an OAM or VRAM address.
    pub fn ppu_read_address_u8(&self, address: u16) -> u8 {
        match address {
            address @ address::VRAM_START..=address::VRAM_END => {
                self.vram[(address - address::VRAM_START) as usize]
            }
            address @ address::OAM_START..=address::OAM_END => {
                self.oam[(address - address::OAM_START) as usize]
            }
            _ => panic!("PPU read method is only allowed to read OAM and VRAM"),
        }
    }

    pub fn get_io_registers(&self) -> &IoRegisters {
        &self.io_registers
    }

    pub fn get_io_registers_mut(&mut self) -> &mut IoRegisters {
        &mut self.io_registers
    }

    /// Retrieve the current value of the IE register (interrupts enabled).
    pub fn get_ie_register(&self) -> u8 {
        self.ie_register
    }
}

#[cfg(test)]
pub(crate) fn test_cartridge() -> Cartridge {
    // 64 KiB ROM (size code 0x01 => 4 banks), 8 KiB RAM
    let mut rom = vec![0x00; 4 * address::ROM_BANK_LEN];
    rom[address::ROM_SIZE as usize] = 0x01;
    rom[address::RAM_SIZE as usize] = 0x02;
    Cartridge::new(rom).expect("synthesized test ROM should be valid")
}
