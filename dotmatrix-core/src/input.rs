use crate::config::{HotkeyConfig, InputConfig};
use crate::cpu::InterruptType;
use crate::memory::ioregisters::{IoRegister, IoRegisters};
use sdl2::keyboard::Keycode;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Button {
    Up,
    Down,
    Left,
    Right,
    A,
    B,
    Start,
    Select,
}

#[derive(Error, Debug)]
pub enum KeyMapError {
    #[error("invalid keycode in input config: {keycode}")]
    InvalidKeycode { keycode: String },
    #[error("keycode used for multiple buttons: {keycode}")]
    DuplicateKeycode { keycode: String },
}

fn try_parse_keycode(s: &str) -> Result<Keycode, KeyMapError> {
    Keycode::from_name(s).ok_or_else(|| KeyMapError::InvalidKeycode { keycode: s.into() })
}

macro_rules! build_key_map {
    ($($config_field:expr => $button:expr),+$(,)?) => {
        {
            let mut map = HashMap::new();

            $(
                let keycode = try_parse_keycode(&$config_field)?;
                if map.insert(keycode, $button).is_some() {
                    return Err(KeyMapError::DuplicateKeycode { keycode: keycode.name() });
                }
            )*

            map
        }
    }
}

#[derive(Debug, Clone)]
pub struct KeyMap(HashMap<Keycode, Button>);

impl KeyMap {
    pub fn from_config(input_config: &InputConfig) -> Result<Self, KeyMapError> {
        let map = build_key_map!(
            input_config.up => Button::Up,
            input_config.down => Button::Down,
            input_config.left => Button::Left,
            input_config.right => Button::Right,
            input_config.a => Button::A,
            input_config.b => Button::B,
            input_config.start => Button::Start,
            input_config.select => Button::Select,
        );

        Ok(Self(map))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hotkey {
    Exit,
    ToggleFullscreen,
}

macro_rules! build_hotkey_map {
    ($($config_field:expr => $hotkey:expr),+$(,)?) => {
        {
            let mut map = HashMap::new();

            $(
                if let Some(keycode) = $config_field.as_ref() {
                    let keycode = try_parse_keycode(keycode)?;
                    if map.insert(keycode, $hotkey).is_some() {
                        return Err(KeyMapError::DuplicateKeycode { keycode: keycode.name() });
                    }
                }
            )*

            map
        }
    }
}

#[derive(Debug, Clone)]
pub struct HotkeyMap(HashMap<Keycode, Hotkey>);

impl HotkeyMap {
    pub fn from_config(hotkey_config: &HotkeyConfig) -> Result<Self, KeyMapError> {
        let map = build_hotkey_map!(
            hotkey_config.exit => Hotkey::Exit,
            hotkey_config.toggle_fullscreen => Hotkey::ToggleFullscreen,
        );

        Ok(Self(map))
    }
}

#[must_use]
pub fn check_for_hotkey(key_down: Keycode, hotkey_map: &HotkeyMap) -> Option<Hotkey> {
    hotkey_map.0.get(&key_down).copied()
}

/// Debounced state of the eight buttons, with a latch recording that some
/// button went from released to pressed since the last JOYP refresh.
#[derive(Debug, Clone)]
pub struct JoypadState {
    up: bool,
    down: bool,
    left: bool,
    right: bool,
    a: bool,
    b: bool,
    start: bool,
    select: bool,
    press_edge: bool,
}

impl JoypadState {
    pub fn new() -> Self {
        Self {
            up: false,
            down: false,
            left: false,
            right: false,
            a: false,
            b: false,
            start: false,
            select: false,
            press_edge: false,
        }
    }

    fn get_field_mut(&mut self, button: Option<Button>) -> Option<&mut bool> {
        match button {
            Some(Button::Up) => Some(&mut self.up),
            Some(Button::Down) => Some(&mut self.down),
            Some(Button::Left) => Some(&mut self.left),
            Some(Button::Right) => Some(&mut self.right),
            Some(Button::A) => Some(&mut self.a),
            Some(Button::B) => Some(&mut self.b),
            Some(Button::Start) => Some(&mut self.start),
            Some(Button::Select) => Some(&mut self.select),
            None => None,
        }
    }

    pub fn key_down(&mut self, keycode: Keycode, key_map: &KeyMap) {
        if let Some(field) = self.get_field_mut(key_map.0.get(&keycode).copied()) {
            if !*field {
                *field = true;
                self.press_edge = true;
            }
        }
        log::debug!("Key pressed: {keycode}, current state: {self:?}");
    }

    pub fn key_up(&mut self, keycode: Keycode, key_map: &KeyMap) {
        if let Some(field) = self.get_field_mut(key_map.0.get(&keycode).copied()) {
            *field = false;
        }
        log::debug!("Key released: {keycode}, current state: {self:?}");
    }
}

/// Update the contents of the JOYP hardware register based on the current
/// joypad state, and request a joypad interrupt if any button has gone from
/// released to pressed since the previous refresh, regardless of which row is
/// currently selected.
///
/// This needs to be called before every CPU step because the program can
/// rewrite the JOYP selector bits at any time, and the same low-nibble bits
/// report either buttons or directions depending on the selection.
pub fn update_joyp_register(joypad_state: &mut JoypadState, io_registers: &mut IoRegisters) {
    let joyp = io_registers.read_register(IoRegister::JOYP);
    let actions_selected = joyp & 0x20 == 0;
    let directions_selected = joyp & 0x10 == 0;

    // Pressed buttons pull their line low
    let bit_3 =
        !((actions_selected && joypad_state.start) || (directions_selected && joypad_state.down));
    let bit_2 =
        !((actions_selected && joypad_state.select) || (directions_selected && joypad_state.up));
    let bit_1 = !((actions_selected && joypad_state.b) || (directions_selected && joypad_state.left));
    let bit_0 =
        !((actions_selected && joypad_state.a) || (directions_selected && joypad_state.right));

    let new_joyp = (joyp & 0x30)
        | (u8::from(bit_3) << 3)
        | (u8::from(bit_2) << 2)
        | (u8::from(bit_1) << 1)
        | u8::from(bit_0);
    io_registers.write_register(IoRegister::JOYP, new_joyp);

    if joypad_state.press_edge {
        joypad_state.press_edge = false;
        io_registers.interrupt_flags().set(InterruptType::Joypad);
    }
}
