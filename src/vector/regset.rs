//! Register-by-register access to a stopped task's vector state, for debuggers.

use super::port::VectorPort;
use super::VectorSupport;
use crate::context::Context;
use crate::csrs::{VsStatus, NUM_VECTOR_REGS};

use core::mem::size_of;

/// Addressable vector register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegId {
    Vstart,
    Vl,
    Vtype,
    Vcsr,
    /// `v0`..`v31`
    Vreg(usize),
}

/// Errors of register access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegAccessError {
    /// The harts have no vector unit.
    NotPresent,
    /// The task never used vectors, so it has no register image.
    NotAllocated,
    /// Vector use is off for the task; its image is wiped on the next first use.
    Disabled,
    /// Register number out of range.
    BadRegister,
    /// Buffer size does not match the register size.
    BadSize,
}

/// Size of register `id` in bytes.
///
/// # Errors
/// `NotPresent` without a vector unit, `BadRegister` for `Vreg(n)` with `n >= 32`.
pub fn reg_size(support: &VectorSupport, id: RegId) -> Result<usize, RegAccessError> {
    let config = support.config().ok_or(RegAccessError::NotPresent)?;
    match id {
        RegId::Vreg(index) if index >= NUM_VECTOR_REGS => Err(RegAccessError::BadRegister),
        RegId::Vreg(_) => Ok(config.vlenb()),
        RegId::Vstart | RegId::Vl | RegId::Vtype | RegId::Vcsr => Ok(size_of::<usize>()),
    }
}

fn scalar_mut(context: &mut Context, id: RegId) -> Option<&mut usize> {
    match id {
        RegId::Vstart => Some(&mut context.vstate.vstart),
        RegId::Vl => Some(&mut context.vstate.vl),
        RegId::Vtype => Some(&mut context.vstate.vtype),
        RegId::Vcsr => Some(&mut context.vstate.vcsr),
        RegId::Vreg(_) => None,
    }
}

fn vreg_mut<'a>(
    support: &VectorSupport,
    context: &'a mut Context,
    index: usize,
) -> Result<&'a mut [u8], RegAccessError> {
    let vlenb = reg_size(support, RegId::Vreg(index))?;
    context
        .vstate
        .data_mut()
        .ok_or(RegAccessError::NotAllocated)?
        .get_mut(index * vlenb..(index + 1) * vlenb)
        .ok_or(RegAccessError::BadRegister)
}

/// Copy register `id` of `context` into `out`.
///
/// Live registers are saved first so `out` reflects what the task last wrote. Scalar registers
/// are native-endian `usize`.
///
/// # Errors
/// See [`RegAccessError`].
pub fn read_reg<P: VectorPort + ?Sized>(
    support: &VectorSupport,
    context: &mut Context,
    port: &mut P,
    id: RegId,
    out: &mut [u8],
) -> Result<(), RegAccessError> {
    if out.len() != reg_size(support, id)? {
        return Err(RegAccessError::BadSize);
    }
    support.flush(context, port);

    if let RegId::Vreg(index) = id {
        out.copy_from_slice(vreg_mut(support, context, index)?);
    } else if let Some(value) = scalar_mut(context, id) {
        out.copy_from_slice(&value.to_ne_bytes());
    }
    Ok(())
}

/// Overwrite register `id` of `context` with `value`.
///
/// The new value reaches the hardware on the task's next restore.
///
/// # Errors
/// `Disabled` when `context` is `Off`, otherwise see [`RegAccessError`].
pub fn write_reg<P: VectorPort + ?Sized>(
    support: &VectorSupport,
    context: &mut Context,
    port: &mut P,
    id: RegId,
    value: &[u8],
) -> Result<(), RegAccessError> {
    if value.len() != reg_size(support, id)? {
        return Err(RegAccessError::BadSize);
    }
    if context.vs_status() == VsStatus::Off {
        return Err(RegAccessError::Disabled);
    }
    // a later save must not overwrite what we write here
    support.flush(context, port);

    if let RegId::Vreg(index) = id {
        vreg_mut(support, context, index)?.copy_from_slice(value);
    } else if let Some(scalar) = scalar_mut(context, id) {
        let mut bytes = [0u8; size_of::<usize>()];
        bytes.copy_from_slice(value);
        *scalar = usize::from_ne_bytes(bytes);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::port::simulated::SimulatedPort;
    use crate::vector::state::{GlobalAllocator, VectorAllocator};
    use crate::vector::VectorConfig;

    const VLENB: usize = 16;

    fn setup() -> (VectorSupport, Context, SimulatedPort) {
        let support = VectorSupport::Present(VectorConfig::new(VLENB).unwrap());
        let mut context = Context::new();
        context
            .vstate
            .install(GlobalAllocator.alloc_zeroed(VLENB * 32).unwrap());
        context.set_vs_status(VsStatus::Initial);
        (support, context, SimulatedPort::new(VLENB))
    }

    #[test]
    fn read_flushes_dirty_registers() {
        let (support, mut context, mut port) = setup();
        port.execute(&mut context, |port| port.write_register(31, &[0x5a; VLENB]))
            .unwrap();

        let mut out = [0u8; VLENB];
        read_reg(&support, &mut context, &mut port, RegId::Vreg(31), &mut out).unwrap();
        assert_eq!(out, [0x5a; VLENB]);
        assert_eq!(context.vs_status(), VsStatus::Clean);
    }

    #[test]
    fn write_then_restore_reaches_registers() {
        let (support, mut context, mut port) = setup();
        write_reg(&support, &mut context, &mut port, RegId::Vreg(2), &[0x11; VLENB]).unwrap();
        write_reg(
            &support,
            &mut context,
            &mut port,
            RegId::Vl,
            &3usize.to_ne_bytes(),
        )
        .unwrap();
        assert_eq!(context.vstate.vl, 3);

        support.restore(&mut context, &mut port);
        assert_eq!(port.register(2), &[0x11; VLENB]);
    }

    #[test]
    fn size_and_index_are_checked() {
        let (support, mut context, mut port) = setup();
        let mut short = [0u8; 4];
        assert_eq!(
            read_reg(&support, &mut context, &mut port, RegId::Vtype, &mut short),
            Err(RegAccessError::BadSize)
        );
        let mut out = [0u8; VLENB];
        assert_eq!(
            read_reg(&support, &mut context, &mut port, RegId::Vreg(32), &mut out),
            Err(RegAccessError::BadRegister)
        );
        assert_eq!(
            read_reg(&VectorSupport::Absent, &mut context, &mut port, RegId::Vl, &mut out),
            Err(RegAccessError::NotPresent)
        );
    }

    #[test]
    fn vector_registers_need_an_image() {
        let (support, _, mut port) = setup();
        let mut context = Context::new();
        let mut out = [0u8; VLENB];
        assert_eq!(
            read_reg(&support, &mut context, &mut port, RegId::Vreg(0), &mut out),
            Err(RegAccessError::NotAllocated)
        );

        let mut scalar = [0xffu8; size_of::<usize>()];
        read_reg(&support, &mut context, &mut port, RegId::Vstart, &mut scalar).unwrap();
        assert_eq!(scalar, [0u8; size_of::<usize>()]);
    }

    #[test]
    fn write_refused_while_off() {
        let (support, mut context, mut port) = setup();
        context.vstate.data_mut().unwrap().fill(0x44);
        support.disable(&mut context);

        assert_eq!(
            write_reg(&support, &mut context, &mut port, RegId::Vreg(1), &[0x11; VLENB]),
            Err(RegAccessError::Disabled)
        );
        assert_eq!(
            write_reg(&support, &mut context, &mut port, RegId::Vl, &1usize.to_ne_bytes()),
            Err(RegAccessError::Disabled)
        );
        assert_eq!(context.vstate.data().unwrap()[VLENB], 0x44);
        assert_eq!(context.vstate.vl, 0);
    }
}
