use super::{hash_map, run_test, set_in_state, ExpectedState, ALL_REGISTERS};

use crate::cpu::registers::CpuRegister;

#[test]
fn and_immediate() {
    run_test(
        // LD A, 0x5A; AND 0x3F
        "3E5AE63F",
        &ExpectedState {
            a: Some(0x1A),
            f: Some(0x20),
            ..ExpectedState::empty()
        },
    );

    run_test(
        // LD A, 0xF0; AND 0x0F
        "3EF0E60F",
        &ExpectedState {
            a: Some(0x00),
            f: Some(0xA0),
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn and_register() {
    for r in ALL_REGISTERS {
        let load_opcode = 0x06 | (r.to_opcode_bits() << 3);
        let and_opcode = 0xA0 | r.to_opcode_bits();

        let (expected_a, expected_f) = match r {
            CpuRegister::A => (0x55, 0x20),
            _ => (0x11, 0x20),
        };

        run_test(
            // LD A, 0x33; LD <r>, 0x55; AND <r>
            &format!("3E33{load_opcode:02x}55{and_opcode:02x}"),
            &ExpectedState {
                a: Some(expected_a),
                f: Some(expected_f),
                ..ExpectedState::empty()
            },
        );
    }
}

#[test]
fn or_immediate() {
    run_test(
        // LD A, 0x5A; OR 0x03
        "3E5AF603",
        &ExpectedState {
            a: Some(0x5B),
            f: Some(0x00),
            ..ExpectedState::empty()
        },
    );

    run_test(
        // LD A, 0x00; OR 0x00
        "3E00F600",
        &ExpectedState {
            a: Some(0x00),
            f: Some(0x80),
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn xor_immediate() {
    run_test(
        // LD A, 0xFF; XOR 0x0F
        "3EFFEE0F",
        &ExpectedState {
            a: Some(0xF0),
            f: Some(0x00),
            ..ExpectedState::empty()
        },
    );

    // XOR A always zeroes the accumulator
    run_test(
        "AF",
        &ExpectedState {
            a: Some(0x00),
            f: Some(0x80),
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn logical_ops_indirect_hl() {
    run_test(
        // LD HL, 0xC880; LD (HL), 0x0F; LD A, 0x55; AND (HL)
        "2180C8360F3E55A6",
        &ExpectedState {
            a: Some(0x05),
            f: Some(0x20),
            ..ExpectedState::empty()
        },
    );

    run_test(
        // LD HL, 0xC880; LD (HL), 0x0F; LD A, 0x50; OR (HL)
        "2180C8360F3E50B6",
        &ExpectedState {
            a: Some(0x5F),
            f: Some(0x00),
            ..ExpectedState::empty()
        },
    );

    run_test(
        // LD HL, 0xC880; LD (HL), 0x0F; LD A, 0x5F; XOR (HL)
        "2180C8360F3E5FAE",
        &ExpectedState {
            a: Some(0x50),
            f: Some(0x00),
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn complement_accumulator() {
    run_test(
        // LD A, 0x35; OR A; CPL
        "3E35B72F",
        &ExpectedState {
            a: Some(0xCA),
            f: Some(0x60),
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn test_bit() {
    // LD H, 0xEF; SCF; BIT 4, H (bit 4 clear, carry preserved)
    run_test(
        "26EF37CB64",
        &ExpectedState {
            h: Some(0xEF),
            f: Some(0xB0),
            ..ExpectedState::empty()
        },
    );

    // LD H, 0xEF; OR A; BIT 5, H (bit 5 set, carry clear)
    run_test(
        "26EFB7CB6C",
        &ExpectedState {
            h: Some(0xEF),
            f: Some(0x20),
            ..ExpectedState::empty()
        },
    );

    // LD HL, 0xC944; LD (HL), 0x01; OR A; BIT 0, (HL)
    run_test(
        "2144C93601B7CB46",
        &ExpectedState {
            f: Some(0x20),
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn test_bit_all_registers() {
    for r in ALL_REGISTERS {
        let load_opcode = 0x06 | (r.to_opcode_bits() << 3);
        let bit_opcode = 0x40 | (0x07 << 3) | r.to_opcode_bits();

        let mut expected_state = ExpectedState {
            f: Some(0xB0),
            ..ExpectedState::empty()
        };
        set_in_state(&mut expected_state, r, 0x7F);

        run_test(
            // LD <r>, 0x7F; SCF; BIT 7, <r>
            &format!("{load_opcode:02x}7F37CB{bit_opcode:02x}"),
            &expected_state,
        );
    }
}

#[test]
fn set_bit() {
    run_test(
        // LD B, 0x00; SET 3, B
        "0600CBD8",
        &ExpectedState {
            b: Some(0x08),
            ..ExpectedState::empty()
        },
    );

    run_test(
        // LD HL, 0xC321; LD (HL), 0x00; SET 7, (HL)
        "2121C33600CBFE",
        &ExpectedState {
            memory: hash_map!(0xC321: 0x80),
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn reset_bit() {
    run_test(
        // LD B, 0xFF; RES 3, B
        "06FFCB98",
        &ExpectedState {
            b: Some(0xF7),
            ..ExpectedState::empty()
        },
    );

    run_test(
        // LD HL, 0xC321; LD (HL), 0xFF; RES 0, (HL)
        "2121C336FFCB86",
        &ExpectedState {
            memory: hash_map!(0xC321: 0xFE),
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn set_carry_flag() {
    // OR A; SCF
    run_test(
        "B737",
        &ExpectedState {
            f: Some(0x10),
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn complement_carry_flag() {
    // SCF; CCF
    run_test(
        "373F",
        &ExpectedState {
            f: Some(0x80),
            ..ExpectedState::empty()
        },
    );

    // OR A; CCF
    run_test(
        "B73F",
        &ExpectedState {
            f: Some(0x10),
            ..ExpectedState::empty()
        },
    );
}
