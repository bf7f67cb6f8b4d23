//! Emulation core for the original monochrome handheld: CPU, memory bus, PPU,
//! timer, interrupt controller, and joypad, driven by an SDL2 front end.

mod config;
mod cpu;
mod eventloop;
mod graphics;
mod input;
mod memory;
mod ppu;
mod serial;
mod startup;
mod timer;

use std::error::Error;

pub use config::{HotkeyConfig, InputConfig, RunConfig};
pub use startup::StartupError;

/// Load the configured ROM, bring up the SDL2 window, and run the emulator
/// until the user quits.
pub fn run(run_config: RunConfig) -> Result<(), Box<dyn Error>> {
    let emulation_state = startup::init_emulation_state(&run_config)?;
    let sdl_state = startup::init_sdl_state(&run_config)?;

    eventloop::run(emulation_state, sdl_state, &run_config)?;

    Ok(())
}
