use clap::Parser;
use dotmatrix_core::{HotkeyConfig, InputConfig, RunConfig};
use std::process;

#[derive(Parser)]
#[command(about = "Emulator for the original monochrome handheld")]
struct Cli {
    /// Path to the ROM file to run
    rom_file_path: String,
    #[arg(long = "no-vsync", default_value_t = true, action = clap::ArgAction::SetFalse)]
    vsync_enabled: bool,
    #[arg(short = 'f', long = "fullscreen", default_value_t = false)]
    launch_fullscreen: bool,
    #[arg(long = "borderless-fullscreen", default_value_t = false)]
    borderless_fullscreen: bool,
    #[arg(long = "integer-scaling", default_value_t = false)]
    force_integer_scaling: bool,
    #[arg(short = 'w', long = "window-width", default_value_t = 640)]
    window_width: u32,
    #[arg(short = 'l', long = "window-height", default_value_t = 576)]
    window_height: u32,
}

fn main() {
    env_logger::init();

    let args = Cli::parse();

    let run_config = RunConfig {
        rom_file_path: args.rom_file_path,
        vsync_enabled: args.vsync_enabled,
        launch_fullscreen: args.launch_fullscreen,
        borderless_fullscreen: args.borderless_fullscreen,
        force_integer_scaling: args.force_integer_scaling,
        window_width: args.window_width,
        window_height: args.window_height,
        input_config: InputConfig::default(),
        hotkey_config: HotkeyConfig::default(),
    };

    if let Err(err) = dotmatrix_core::run(run_config) {
        log::error!("{err}");
        process::exit(1);
    }
}
