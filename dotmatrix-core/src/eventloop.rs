use crate::graphics::{self, GraphicsError};
use crate::input::{self, Hotkey, HotkeyMap, JoypadState, KeyMap, KeyMapError};
use crate::ppu::{self, PpuMode};
use crate::serial::{self, LogSerialSink};
use crate::startup::{EmulationState, SdlState};
use crate::timer::{self, TimerCounter};
use crate::{cpu, RunConfig};
use sdl2::event::Event;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RunError {
    #[error("rendering error: {source}")]
    Rendering {
        #[from]
        source: GraphicsError,
    },
    #[error("error processing input config: {source}")]
    InputConfig {
        #[from]
        source: KeyMapError,
    },
}

// One LCD frame is 154 scanlines of 456 T-cycles; host events are polled on
// this cadence
const CYCLES_PER_FRAME: u64 = 154 * 456;

/// Start and run the emulator until it terminates, either by closing it or
/// due to an error.
///
/// The CPU is the sequencer: each step yields a T-cycle cost, and the timer,
/// OAM DMA engine, and PPU are advanced by that cost before the next step.
pub fn run(
    emulation_state: EmulationState,
    sdl_state: SdlState,
    run_config: &RunConfig,
) -> Result<(), RunError> {
    log::info!("Running with config:\n{run_config}");

    let EmulationState { mut address_space, mut cpu_registers, mut ppu_state } = emulation_state;

    // Keep the context and subsystem handles alive until the function returns
    let SdlState { sdl: _sdl, video: _video, mut canvas, mut event_pump } = sdl_state;

    let texture_creator = canvas.texture_creator();
    let mut texture = graphics::create_frame_texture(&texture_creator)?;

    let key_map = KeyMap::from_config(&run_config.input_config)?;
    let hotkey_map = HotkeyMap::from_config(&run_config.hotkey_config)?;
    let mut joypad_state = JoypadState::new();
    let mut timer_counter = TimerCounter::new();
    let mut serial_sink = LogSerialSink::new();

    let mut total_cycles = 0_u64;

    loop {
        // Input is sampled at the start of every CPU step
        input::update_joyp_register(&mut joypad_state, address_space.get_io_registers_mut());

        // Read TMA before executing so that a TIMA overflow inside the
        // instruction reloads from the pre-instruction modulo
        let timer_modulo = timer::read_timer_modulo(address_space.get_io_registers());

        let cycles_required = cpu::step(&mut cpu_registers, &mut address_space);

        timer::update_timer_registers(
            address_space.get_io_registers_mut(),
            &mut timer_counter,
            timer_modulo,
            cycles_required.into(),
        );

        let prev_mode = ppu_state.mode();
        for _ in (0..cycles_required).step_by(4) {
            address_space.tick_dma_m_cycle();
            ppu::tick_t_cycles(&mut ppu_state, &mut address_space, 4);
        }

        // The PPU entering V-Blank means the frame is complete
        if prev_mode != PpuMode::VBlank && ppu_state.mode() == PpuMode::VBlank {
            graphics::render_frame(&ppu_state, &mut canvas, &mut texture, run_config)?;
        }

        // Process host events and drain serial output roughly once per frame
        if total_cycles / CYCLES_PER_FRAME
            != (total_cycles + u64::from(cycles_required)) / CYCLES_PER_FRAME
        {
            serial::drain_serial_output(address_space.get_io_registers_mut(), &mut serial_sink);

            for event in event_pump.poll_iter() {
                log::trace!("Received SDL event: {event:?}");
                match event {
                    Event::Quit { .. } => {
                        log::info!("Quit event received, exiting main loop");
                        return Ok(());
                    }
                    Event::KeyDown { keycode: Some(keycode), .. } => {
                        joypad_state.key_down(keycode, &key_map);

                        match input::check_for_hotkey(keycode, &hotkey_map) {
                            Some(Hotkey::Exit) => {
                                return Ok(());
                            }
                            Some(Hotkey::ToggleFullscreen) => {
                                graphics::toggle_fullscreen(&mut canvas, run_config)?;
                            }
                            None => {}
                        }
                    }
                    Event::KeyUp { keycode: Some(keycode), .. } => {
                        joypad_state.key_up(keycode, &key_map);
                    }
                    _ => {}
                }
            }
        }
        total_cycles += u64::from(cycles_required);
    }
}
