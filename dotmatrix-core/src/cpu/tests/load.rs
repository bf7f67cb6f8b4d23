use super::{hash_map, run_test, set_in_state, ExpectedState, ALL_REGISTERS};

#[test]
fn load_register_immediate() {
    for r in ALL_REGISTERS {
        let load_opcode = 0x06 | (r.to_opcode_bits() << 3);

        let mut expected_state = ExpectedState::empty();
        set_in_state(&mut expected_state, r, 0x91);

        // LD <r>, 0x91
        run_test(&format!("{load_opcode:02x}91"), &expected_state);
    }
}

#[test]
fn load_register_register() {
    // LD B, 0x45; LD D, B; LD A, D
    run_test(
        "06455078",
        &ExpectedState {
            a: Some(0x45),
            b: Some(0x45),
            d: Some(0x45),
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn load_indirect_hl() {
    run_test(
        // LD HL, 0xC0A0; LD (HL), 0x42
        "21A0C03642",
        &ExpectedState {
            memory: hash_map!(0xC0A0: 0x42),
            ..ExpectedState::empty()
        },
    );

    run_test(
        // LD HL, 0xC0A0; LD (HL), 0x42; LD E, (HL)
        "21A0C036425E",
        &ExpectedState {
            e: Some(0x42),
            ..ExpectedState::empty()
        },
    );

    run_test(
        // LD B, 0x77; LD HL, 0xC0A0; LD (HL), B
        "067721A0C070",
        &ExpectedState {
            memory: hash_map!(0xC0A0: 0x77),
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn load_indirect_bc_de() {
    run_test(
        // LD BC, 0xC111; LD A, 0x35; LD (BC), A
        "0111C13E3502",
        &ExpectedState {
            memory: hash_map!(0xC111: 0x35),
            ..ExpectedState::empty()
        },
    );

    run_test(
        // LD DE, 0xC222; LD A, 0x36; LD (DE), A; LD A, 0x00; LD A, (DE)
        "1122C23E36123E001A",
        &ExpectedState {
            a: Some(0x36),
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn load_hl_increment_decrement() {
    run_test(
        // LD HL, 0xC0A0; LD A, 0x11; LD (HL+), A
        "21A0C03E1122",
        &ExpectedState {
            h: Some(0xC0),
            l: Some(0xA1),
            memory: hash_map!(0xC0A0: 0x11),
            ..ExpectedState::empty()
        },
    );

    run_test(
        // LD HL, 0xC0A0; LD A, 0x22; LD (HL-), A
        "21A0C03E2232",
        &ExpectedState {
            h: Some(0xC0),
            l: Some(0x9F),
            memory: hash_map!(0xC0A0: 0x22),
            ..ExpectedState::empty()
        },
    );

    run_test(
        // LD HL, 0xC0A0; LD (HL), 0x5D; LD A, (HL+)
        "21A0C0365D2A",
        &ExpectedState {
            a: Some(0x5D),
            h: Some(0xC0),
            l: Some(0xA1),
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn load_direct() {
    run_test(
        // LD A, 0x99; LD (0xC456), A; LD A, 0x00; LD A, (0xC456)
        "3E99EA56C43E00FA56C4",
        &ExpectedState {
            a: Some(0x99),
            memory: hash_map!(0xC456: 0x99),
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn load_ff_page() {
    run_test(
        // LD A, 0x77; LDH (0x80), A; LD A, 0x00; LDH A, (0x80)
        "3E77E0803E00F080",
        &ExpectedState {
            a: Some(0x77),
            memory: hash_map!(0xFF80: 0x77),
            ..ExpectedState::empty()
        },
    );

    run_test(
        // LD C, 0x81; LD A, 0x55; LD (C), A
        "0E813E55E2",
        &ExpectedState {
            memory: hash_map!(0xFF81: 0x55),
            ..ExpectedState::empty()
        },
    );

    run_test(
        // LD C, 0x82; LD A, 0x66; LD (C), A; LD A, 0x00; LD A, (C)
        "0E823E66E23E00F2",
        &ExpectedState {
            a: Some(0x66),
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn load_register_pair_immediate() {
    run_test(
        // LD BC, 0x1234; LD DE, 0x5678; LD HL, 0x9ABC; LD SP, 0xDFF0
        "01341211785621BC9A31F0DF",
        &ExpectedState {
            b: Some(0x12),
            c: Some(0x34),
            d: Some(0x56),
            e: Some(0x78),
            h: Some(0x9A),
            l: Some(0xBC),
            sp: Some(0xDFF0),
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn load_direct_stack_pointer() {
    run_test(
        // LD SP, 0xFFFE is the power-on value; LD (0xC034), SP
        "0834C0",
        &ExpectedState {
            memory: hash_map!(0xC034: 0xFE, 0xC035: 0xFF),
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn load_stack_pointer_hl() {
    run_test(
        // LD HL, 0x05AD; LD SP, HL
        "21AD05F9",
        &ExpectedState {
            sp: Some(0x05AD),
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn load_hl_stack_pointer_offset() {
    run_test(
        // LD SP, 0x00FF; LDHL SP, 0x01
        "31FF00F801",
        &ExpectedState {
            h: Some(0x01),
            l: Some(0x00),
            sp: Some(0x00FF),
            f: Some(0x30),
            ..ExpectedState::empty()
        },
    );

    run_test(
        // LD SP, 0xD005; LDHL SP, -2
        "3105D0F8FE",
        &ExpectedState {
            h: Some(0xD0),
            l: Some(0x03),
            f: Some(0x30),
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn push_pop_round_trip() {
    run_test(
        // LD BC, 0xCDAB; PUSH BC; POP HL
        "01ABCDC5E1",
        &ExpectedState {
            h: Some(0xCD),
            l: Some(0xAB),
            sp: Some(0xFFFE),
            memory: hash_map!(0xFFFC: 0xAB, 0xFFFD: 0xCD),
            ..ExpectedState::empty()
        },
    );

    run_test(
        // LD DE, 0x8001; PUSH DE; POP BC
        "110180D5C1",
        &ExpectedState {
            b: Some(0x80),
            c: Some(0x01),
            sp: Some(0xFFFE),
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn pop_af_masks_flag_low_bits() {
    run_test(
        // LD BC, 0xFFFF; PUSH BC; POP AF
        "01FFFFC5F1",
        &ExpectedState {
            a: Some(0xFF),
            f: Some(0xF0),
            sp: Some(0xFFFE),
            ..ExpectedState::empty()
        },
    );

    run_test(
        // LD BC, 0x120F; PUSH BC; POP AF
        "010F12C5F1",
        &ExpectedState {
            a: Some(0x12),
            f: Some(0x00),
            sp: Some(0xFFFE),
            ..ExpectedState::empty()
        },
    );
}
