//! Software model of a vector unit.

use super::{Transfer, VectorPort, CHUNK_VTYPE, REGS_PER_CHUNK};
use crate::context::Context;
use crate::csrs::{VectorCsr, VsStatus, NUM_VECTOR_REGS};
use crate::trap::TrapCause;
use crate::vector::vtype::VType;

use alloc::vec;
use alloc::vec::Vec;

/// Vector unit kept in memory.
///
/// Touching registers or CSRs with access disabled panics, the same way the hardware raises an
/// illegal instruction exception.
#[derive(Debug)]
pub struct SimulatedPort {
    vlenb: usize,
    registers: Vec<u8>,
    vstart: usize,
    vl: usize,
    vtype: usize,
    vcsr: usize,
    access: bool,
    bulk_copies: usize,
    chunk_log: Vec<(Transfer, usize)>,
}

impl SimulatedPort {
    /// Vector unit with `vlenb` bytes per register, all registers zero.
    pub fn new(vlenb: usize) -> Self {
        SimulatedPort {
            vlenb,
            registers: vec![0; vlenb * NUM_VECTOR_REGS],
            vstart: 0,
            vl: 0,
            vtype: VType::VILL_BIT,
            vcsr: 0,
            access: false,
            bulk_copies: 0,
            chunk_log: Vec::new(),
        }
    }

    pub fn vlenb(&self) -> usize {
        self.vlenb
    }

    /// Whether `sstatus.VS` of the hart is set.
    pub fn access_enabled(&self) -> bool {
        self.access
    }

    /// Number of `copy_registers` calls so far.
    pub fn bulk_copies(&self) -> usize {
        self.bulk_copies
    }

    /// First register of every chunk copied so far, oldest first.
    pub fn chunk_log(&self) -> &[(Transfer, usize)] {
        &self.chunk_log
    }

    /// Contents of register `index`.
    pub fn register(&self, index: usize) -> &[u8] {
        &self.registers[index * self.vlenb..(index + 1) * self.vlenb]
    }

    /// Whole register file.
    pub fn register_file(&self) -> &[u8] {
        &self.registers
    }

    /// Overwrite register `index`. Access must be enabled.
    pub fn write_register(&mut self, index: usize, bytes: &[u8]) {
        self.check_access();
        let vlenb = self.vlenb;
        self.registers[index * vlenb..(index + 1) * vlenb].copy_from_slice(bytes);
    }

    /// Run `op` as a vector instruction of `context`.
    ///
    /// Traps while the context has `VS = Off`; otherwise the context becomes `Dirty`.
    ///
    /// # Errors
    /// `TrapCause::IllegalInstruction` when vector use is off for the context.
    pub fn execute(
        &mut self,
        context: &mut Context,
        op: impl FnOnce(&mut SimulatedPort),
    ) -> Result<(), TrapCause> {
        if context.vs_status() == VsStatus::Off {
            return Err(TrapCause::IllegalInstruction);
        }

        let access = self.access;
        self.access = true;
        op(self);
        self.access = access;
        context.set_vs_status(VsStatus::Dirty);
        Ok(())
    }

    fn check_access(&self) {
        assert!(self.access, "vector unit used with sstatus.VS off");
    }
}

impl VectorPort for SimulatedPort {
    fn read_csr(&mut self, csr: VectorCsr) -> usize {
        self.check_access();
        match csr {
            VectorCsr::Vstart => self.vstart,
            VectorCsr::Vxsat => self.vcsr & 0x1,
            VectorCsr::Vxrm => self.vcsr >> 1 & 0x3,
            VectorCsr::Vcsr => self.vcsr,
            VectorCsr::Vl => self.vl,
            VectorCsr::Vtype => self.vtype,
            VectorCsr::Vlenb => self.vlenb,
        }
    }

    fn write_csr(&mut self, csr: VectorCsr, value: usize) {
        self.check_access();
        assert!(
            !csr.is_read_only(),
            "csrw to read-only csr {:#x}",
            csr.number()
        );
        match csr {
            VectorCsr::Vstart => self.vstart = value,
            VectorCsr::Vxsat => self.vcsr = (self.vcsr & !0x1) | (value & 0x1),
            VectorCsr::Vxrm => self.vcsr = (self.vcsr & !0x6) | (value & 0x3) << 1,
            VectorCsr::Vcsr => self.vcsr = value & 0x7,
            VectorCsr::Vl | VectorCsr::Vtype | VectorCsr::Vlenb => {}
        }
    }

    fn set_vl_vtype(&mut self, vl: usize, vtype: usize) {
        self.check_access();
        let decoded = VType::decode(vtype);
        if decoded.vill {
            self.vtype = VType::VILL_BIT;
            self.vl = 0;
        } else {
            self.vtype = vtype;
            self.vl = vl.min(decoded.vlmax(self.vlenb));
        }
    }

    fn enable_access(&mut self) {
        self.access = true;
    }

    fn disable_access(&mut self) {
        self.access = false;
    }

    fn copy_registers(&mut self, transfer: Transfer, buffer: &mut [u8]) {
        self.check_access();
        // vsetvli stride, x0, e8, m8, ta, ma
        self.set_vl_vtype(usize::MAX, CHUNK_VTYPE);
        let stride = self.vl;
        assert!(
            buffer.len() >= stride * (NUM_VECTOR_REGS / REGS_PER_CHUNK),
            "register image too small"
        );

        for (chunk_index, chunk) in buffer
            .chunks_mut(stride)
            .take(NUM_VECTOR_REGS / REGS_PER_CHUNK)
            .enumerate()
        {
            let registers = &mut self.registers[chunk_index * stride..(chunk_index + 1) * stride];
            match transfer {
                Transfer::Save => chunk.copy_from_slice(registers),
                Transfer::Restore => registers.copy_from_slice(chunk),
            }
            self.chunk_log.push((transfer, chunk_index * REGS_PER_CHUNK));
        }

        self.vstart = 0;
        self.bulk_copies += 1;
    }
}
