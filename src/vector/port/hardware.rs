//! Vector unit of the current hart.

use super::{Transfer, VectorPort};
use crate::csrs::{sstatus_vs, vcsr, vl, vlenb, vstart, vtype, vxrm, vxsat};
use crate::csrs::{VectorCsr, NUM_VECTOR_REGS, SR_VS};

use core::arch::asm;
use riscv::register::sstatus;

/// Vector unit of the hart this code runs on.
///
/// Interrupts stay masked between `enable_access` and `disable_access` so that a trap can not
/// start another save/restore on this hart in the middle of a bracket.
#[derive(Debug)]
pub struct HardwarePort {
    saved_sie: bool,
}

impl HardwarePort {
    /// # Safety
    /// At most one `HardwarePort` may exist per hart.
    pub unsafe fn new() -> Self {
        HardwarePort { saved_sie: false }
    }
}

impl VectorPort for HardwarePort {
    fn read_csr(&mut self, csr: VectorCsr) -> usize {
        match csr {
            VectorCsr::Vstart => vstart::read().bits(),
            VectorCsr::Vxsat => vxsat::read().bits(),
            VectorCsr::Vxrm => vxrm::read().bits(),
            VectorCsr::Vcsr => vcsr::read().bits(),
            VectorCsr::Vl => vl::read().bits(),
            VectorCsr::Vtype => vtype::read().bits(),
            VectorCsr::Vlenb => vlenb::read().bits(),
        }
    }

    fn write_csr(&mut self, csr: VectorCsr, value: usize) {
        if csr.is_read_only() {
            log::warn!("ignoring write to read-only csr {:#x}", csr.number());
            return;
        }
        match csr {
            VectorCsr::Vstart => vstart::write(value),
            VectorCsr::Vxsat => vxsat::write(value),
            VectorCsr::Vxrm => vxrm::write(value),
            VectorCsr::Vcsr => vcsr::write(value),
            VectorCsr::Vl | VectorCsr::Vtype | VectorCsr::Vlenb => {}
        }
    }

    fn set_vl_vtype(&mut self, vl: usize, vtype: usize) {
        unsafe {
            asm!(
                ".option push",
                ".option arch, +v",
                "vsetvl x0, {vl}, {vtype}",
                ".option pop",
                vl = in(reg) vl,
                vtype = in(reg) vtype,
                options(nostack),
            );
        }
    }

    fn enable_access(&mut self) {
        self.saved_sie = sstatus::read().sie();
        unsafe {
            sstatus::clear_sie();
        }
        sstatus_vs::set(SR_VS);
    }

    fn disable_access(&mut self) {
        sstatus_vs::clear(SR_VS);
        if self.saved_sie {
            unsafe {
                sstatus::set_sie();
            }
        }
    }

    fn copy_registers(&mut self, transfer: Transfer, buffer: &mut [u8]) {
        assert!(
            buffer.len() >= vlenb::read().bits() * NUM_VECTOR_REGS,
            "register image too small"
        );

        let base = buffer.as_mut_ptr();
        match transfer {
            Transfer::Save => unsafe {
                asm!(
                    ".option push",
                    ".option arch, +v",
                    "vsetvli {stride}, x0, e8, m8, ta, ma",
                    "vse8.v v0, ({ptr})",
                    "add {ptr}, {ptr}, {stride}",
                    "vse8.v v8, ({ptr})",
                    "add {ptr}, {ptr}, {stride}",
                    "vse8.v v16, ({ptr})",
                    "add {ptr}, {ptr}, {stride}",
                    "vse8.v v24, ({ptr})",
                    ".option pop",
                    ptr = inout(reg) base => _,
                    stride = out(reg) _,
                    options(nostack),
                );
            },
            Transfer::Restore => unsafe {
                asm!(
                    ".option push",
                    ".option arch, +v",
                    "vsetvli {stride}, x0, e8, m8, ta, ma",
                    "vle8.v v0, ({ptr})",
                    "add {ptr}, {ptr}, {stride}",
                    "vle8.v v8, ({ptr})",
                    "add {ptr}, {ptr}, {stride}",
                    "vle8.v v16, ({ptr})",
                    "add {ptr}, {ptr}, {stride}",
                    "vle8.v v24, ({ptr})",
                    ".option pop",
                    ptr = inout(reg) base => _,
                    stride = out(reg) _,
                    options(nostack, readonly),
                );
            },
        }
    }
}
