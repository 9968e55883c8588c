//! Access to the vector unit of a hart.
//!
//! The state machine only talks to the vector unit through [`VectorPort`], so the same code
//! drives the real registers ([`hardware::HardwarePort`]) and the model used by tests
//! ([`simulated::SimulatedPort`]).

#[cfg(target_arch = "riscv64")]
pub mod hardware;
pub mod simulated;

use crate::csrs::VectorCsr;

/// Registers moved by one `vse8.v`/`vle8.v` under `e8, m8`.
pub const REGS_PER_CHUNK: usize = 8;
/// `vtype` of the bulk copy: e8, m8, tail agnostic, mask agnostic.
pub const CHUNK_VTYPE: usize = 0xc3;

/// Direction of a bulk register copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transfer {
    /// Registers to memory.
    Save,
    /// Memory to registers.
    Restore,
}

/// Trait for the vector unit of one hart.
///
/// Holding `&mut` to a port is what keeps two save/restore sequences from interleaving on
/// the same hart.
pub trait VectorPort {
    /// Read a vector CSR. Access must be enabled.
    fn read_csr(&mut self, csr: VectorCsr) -> usize;
    /// Write `vstart`, `vxsat`, `vxrm` or `vcsr`.
    fn write_csr(&mut self, csr: VectorCsr, value: usize);
    /// `vsetvl x0, vl, vtype`
    fn set_vl_vtype(&mut self, vl: usize, vtype: usize);
    /// Set `sstatus.VS` of the hart.
    fn enable_access(&mut self);
    /// Clear `sstatus.VS` of the hart.
    fn disable_access(&mut self);
    /// Copy `v0`..`v31` in order, `REGS_PER_CHUNK` registers at a time.
    ///
    /// The copy reprograms `vl` and `vtype` and leaves `vstart` zero.
    fn copy_registers(&mut self, transfer: Transfer, buffer: &mut [u8]);
}

/// Run `f` between `enable_access` and `disable_access`.
pub fn with_access<P: VectorPort + ?Sized, R>(port: &mut P, f: impl FnOnce(&mut P) -> R) -> R {
    port.enable_access();
    let result = f(port);
    port.disable_access();
    result
}
