//! Recognize instructions that belong to the vector extension.
//!
//! Ref: "The RISC-V Instruction Set Manual: Volume I Version 20240411", chapter 31.

use crate::csrs::{CSR_VCSR, CSR_VL, CSR_VLENB, CSR_VSTART};

const INSN_OPCODE_MASK: u32 = 0x7f;
const INSN_LENGTH_MASK: u32 = 0b11;
const INSN_LENGTH_32: u32 = 0b11;

/// LOAD-FP major opcode (also vector loads).
pub const OPCODE_LOAD_FP: u32 = 0b000_0111;
/// STORE-FP major opcode (also vector stores).
pub const OPCODE_STORE_FP: u32 = 0b010_0111;
/// OP-V major opcode.
pub const OPCODE_VECTOR: u32 = 0b101_0111;
/// SYSTEM major opcode.
pub const OPCODE_SYSTEM: u32 = 0b111_0011;

/// `width` encodings of LOAD-FP/STORE-FP that select vector element widths.
pub mod lsfp_width {
    /// 8-bit elements
    pub const RVV_8: u32 = 0b000;
    /// 16-bit elements
    pub const RVV_16: u32 = 0b101;
    /// 32-bit elements
    pub const RVV_32: u32 = 0b110;
    /// 64-bit elements
    pub const RVV_64: u32 = 0b111;
}

/// Length in bytes: 2 for compressed encodings, 4 otherwise.
pub fn insn_length(insn: u32) -> usize {
    if insn & INSN_LENGTH_MASK == INSN_LENGTH_32 {
        4
    } else {
        2
    }
}

/// Major opcode, bits 6:0.
pub fn opcode(insn: u32) -> u32 {
    insn & INSN_OPCODE_MASK
}

/// `width` field of LOAD-FP/STORE-FP, bits 14:12.
pub fn load_store_fp_width(insn: u32) -> u32 {
    insn >> 12 & 0x7
}

/// CSR number of a SYSTEM instruction, bits 31:20.
pub fn system_csr(insn: u32) -> usize {
    (insn >> 20) as usize
}

/// Whether `insn` is a vector instruction, including vector CSR accesses.
///
/// Every such instruction is 4 bytes long.
pub fn is_vector(insn: u32) -> bool {
    if insn_length(insn) != 4 {
        return false;
    }

    match opcode(insn) {
        OPCODE_VECTOR => true,
        OPCODE_LOAD_FP | OPCODE_STORE_FP => matches!(
            load_store_fp_width(insn),
            lsfp_width::RVV_8 | lsfp_width::RVV_16 | lsfp_width::RVV_32 | lsfp_width::RVV_64
        ),
        OPCODE_SYSTEM => {
            let csr = system_csr(insn);
            (CSR_VSTART..=CSR_VCSR).contains(&csr) || (CSR_VL..=CSR_VLENB).contains(&csr)
        }
        _ => false,
    }
}
