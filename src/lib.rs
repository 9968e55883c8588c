//! Lazy context switching of the RISC-V vector register file.
//!
//! A task's vector registers are only saved when the task actually changed them and only
//! allocated once the task executes its first vector instruction:
//!
//! - [`vector::setup_vsize`] discovers the vector unit at boot.
//! - [`trap::handle_first_use`] turns the first vector instruction of a task into a register
//!   image and enables the unit for it.
//! - [`vector::on_switch_out`] / [`vector::on_switch_in`] save and restore around a context
//!   switch, skipping the copy whenever the `VS` state allows it.
//!
//! Hardware access goes through [`vector::port::VectorPort`]; on riscv64 the
//! [`vector::port::hardware::HardwarePort`] drives the real CSRs and registers.

#![cfg_attr(not(test), no_std)]

extern crate alloc;

#[cfg(target_arch = "riscv64")]
pub mod console;
pub mod context;
pub mod csrs;
pub mod trap;
pub mod vector;

pub use context::{Context, Signal, TrapFrame};
pub use csrs::VsStatus;
pub use trap::{handle_first_use, TrapCause, TrapOutcome};
pub use vector::{
    is_extension_present, on_switch_in, on_switch_out, setup_vsize, vector_support, vsize,
    VectorConfig, VectorSupport,
};
