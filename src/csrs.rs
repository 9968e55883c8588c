//! CSRs of the vector extension and the `VS` field of `sstatus`.
//!
//! CSR numbers follow "The RISC-V Instruction Set Manual: Volume I Version 20240411"
//! (chapter 31, "V" Standard Extension for Vector Operations).

/// Vector start position.
pub const CSR_VSTART: usize = 0x008;
/// Fixed-Point Saturate Flag.
pub const CSR_VXSAT: usize = 0x009;
/// Fixed-Point Rounding Mode.
pub const CSR_VXRM: usize = 0x00a;
/// Vector control and status register.
pub const CSR_VCSR: usize = 0x00f;
/// Vector length.
pub const CSR_VL: usize = 0xc20;
/// Vector data type register.
pub const CSR_VTYPE: usize = 0xc21;
/// VLEN/8 (vector register length in bytes).
pub const CSR_VLENB: usize = 0xc22;

/// Mask of the `VS` field in `sstatus` (bits 10:9).
pub const SR_VS: usize = 0x600;

/// Number of architectural vector registers.
pub const NUM_VECTOR_REGS: usize = 32;

/// State of the `sstatus.VS` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VsStatus {
    /// Any vector instruction traps.
    Off = 0x000,
    /// Registers hold their reset value.
    Initial = 0x200,
    /// Registers match the last saved image.
    Clean = 0x400,
    /// Registers were modified since the last save.
    Dirty = 0x600,
}

impl VsStatus {
    /// Extract the field from a raw `sstatus` value.
    pub fn from_sstatus(sstatus: usize) -> Self {
        match sstatus & SR_VS {
            0x000 => VsStatus::Off,
            0x200 => VsStatus::Initial,
            0x400 => VsStatus::Clean,
            _ => VsStatus::Dirty,
        }
    }

    /// Return `sstatus` with the field replaced by `self`.
    pub fn apply(self, sstatus: usize) -> usize {
        (sstatus & !SR_VS) | self as usize
    }
}

/// Vector CSRs reachable through a [`VectorPort`](crate::vector::port::VectorPort).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorCsr {
    Vstart,
    Vxsat,
    Vxrm,
    Vcsr,
    Vl,
    Vtype,
    Vlenb,
}

impl VectorCsr {
    /// CSR number.
    pub fn number(self) -> usize {
        match self {
            VectorCsr::Vstart => CSR_VSTART,
            VectorCsr::Vxsat => CSR_VXSAT,
            VectorCsr::Vxrm => CSR_VXRM,
            VectorCsr::Vcsr => CSR_VCSR,
            VectorCsr::Vl => CSR_VL,
            VectorCsr::Vtype => CSR_VTYPE,
            VectorCsr::Vlenb => CSR_VLENB,
        }
    }

    /// `vl`, `vtype` and `vlenb` can not be written by `csrw`.
    pub fn is_read_only(self) -> bool {
        matches!(self, VectorCsr::Vl | VectorCsr::Vtype | VectorCsr::Vlenb)
    }
}

/// Implement bits for struct
#[macro_export]
macro_rules! impl_bits {
    ($register:ident) => {
        #[allow(dead_code)]
        impl $register {
            pub fn bits(&self) -> usize {
                self.0
            }
        }
    };
}

/// Implement reading CSR method to the struct.
#[macro_export]
macro_rules! read_csr_as {
    ($register:ident, $csr_number:literal) => {
        #[inline]
        #[allow(dead_code)]
        pub fn read() -> $register {
            let csr_out;
            unsafe {
                core::arch::asm!(concat!("csrrs {0}, ", stringify!($csr_number), ", x0"), out(reg) csr_out);
            }
            $register(csr_out)
        }
    };
}

/// Implement writing to CSR method to the struct.
#[macro_export]
macro_rules! write_csr_as {
    ($csr_number:literal) => {
        #[inline]
        pub fn write(bits: usize) {
            unsafe{
                core::arch::asm!(concat!("csrrw x0, ", stringify!($csr_number), ", {0}"), in(reg) bits);
            }
        }
    };
}

/// Implement setting to CSR method to the struct.
#[macro_export]
macro_rules! set_csr_as {
    ($csr_number:literal) => {
        #[inline]
        pub fn set(bits: usize) {
            unsafe{
                core::arch::asm!(concat!("csrrs x0, ", stringify!($csr_number), ", {0}"), in(reg) bits);
            }
        }
    };
}

/// Implement clearing CSR bits method to the struct.
#[macro_export]
macro_rules! clear_csr_as {
    ($csr_number:literal) => {
        #[inline]
        pub fn clear(bits: usize) {
            unsafe{
                core::arch::asm!(concat!("csrrc x0, ", stringify!($csr_number), ", {0}"), in(reg) bits);
            }
        }
    };
}

#[cfg(target_arch = "riscv64")]
pub mod vstart {
    //! Vector start position.

    /// Vector start position.
    pub struct Vstart(usize);

    impl_bits!(Vstart);
    read_csr_as!(Vstart, 0x008);
    write_csr_as!(0x008);
}

#[cfg(target_arch = "riscv64")]
pub mod vxsat {
    //! Fixed-Point Saturate Flag.

    /// Fixed-Point Saturate Flag.
    pub struct Vxsat(usize);

    impl_bits!(Vxsat);
    read_csr_as!(Vxsat, 0x009);
    write_csr_as!(0x009);
}

#[cfg(target_arch = "riscv64")]
pub mod vxrm {
    //! Fixed-Point Rounding Mode.

    /// Fixed-Point Rounding Mode.
    pub struct Vxrm(usize);

    impl_bits!(Vxrm);
    read_csr_as!(Vxrm, 0x00a);
    write_csr_as!(0x00a);
}

#[cfg(target_arch = "riscv64")]
pub mod vcsr {
    //! Vector control and status register.

    /// Vector control and status register.
    pub struct Vcsr(usize);

    impl_bits!(Vcsr);
    read_csr_as!(Vcsr, 0x00f);
    write_csr_as!(0x00f);
}

#[cfg(target_arch = "riscv64")]
pub mod vl {
    //! Vector length. Written only by `vset{i}vl{i}`.

    /// Vector length.
    pub struct Vl(usize);

    impl_bits!(Vl);
    read_csr_as!(Vl, 0xc20);
}

#[cfg(target_arch = "riscv64")]
pub mod vtype {
    //! Vector data type register. Written only by `vset{i}vl{i}`.

    /// Vector data type register.
    pub struct Vtype(usize);

    impl_bits!(Vtype);
    read_csr_as!(Vtype, 0xc21);
}

#[cfg(target_arch = "riscv64")]
pub mod vlenb {
    //! VLEN/8 (vector register length in bytes).

    /// VLEN/8.
    pub struct Vlenb(usize);

    impl_bits!(Vlenb);
    read_csr_as!(Vlenb, 0xc22);
}

#[cfg(target_arch = "riscv64")]
pub mod sstatus_vs {
    //! `VS` field of the current hart's `sstatus`.

    set_csr_as!(0x100);
    clear_csr_as!(0x100);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vs_status_field() {
        let sstatus = 0x8000_0000_0000_0122;
        assert_eq!(VsStatus::from_sstatus(sstatus), VsStatus::Off);

        let dirty = VsStatus::Dirty.apply(sstatus);
        assert_eq!(dirty, sstatus | SR_VS);
        assert_eq!(VsStatus::from_sstatus(dirty), VsStatus::Dirty);

        let clean = VsStatus::Clean.apply(dirty);
        assert_eq!(VsStatus::from_sstatus(clean), VsStatus::Clean);
        // other fields survive
        assert_eq!(clean & !SR_VS, sstatus);
    }

    #[test]
    fn read_only_csrs() {
        assert!(VectorCsr::Vl.is_read_only());
        assert!(VectorCsr::Vlenb.is_read_only());
        assert!(!VectorCsr::Vcsr.is_read_only());
        assert_eq!(VectorCsr::Vtype.number(), 0xc21);
    }
}
