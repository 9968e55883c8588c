//! First use of the vector unit by a task.
//!
//! Tasks start with `VS = Off`, so their first vector instruction raises an illegal
//! instruction exception. If the faulting instruction is a vector instruction, the task gets a
//! zeroed register image, `VS = Initial`, and the instruction is retried.

use super::instruction::is_vector;
use crate::context::{Context, Signal};
use crate::csrs::VsStatus;
use crate::vector::state::VectorAllocator;
use crate::vector::VectorSupport;

/// Errors of fetching an instruction from task memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchError {
    /// Nothing is mapped at the address.
    Unmapped(usize),
}

/// Read access to the instruction memory of the faulting task.
pub trait InstructionFetch {
    /// Read 4 bytes at `addr`, little endian.
    ///
    /// # Errors
    /// `FetchError` when `addr..addr + 4` is not readable.
    fn fetch_u32(&self, addr: usize) -> Result<u32, FetchError>;
}

/// Code loaded at `base`.
#[derive(Debug, Clone, Copy)]
pub struct CodeImage<'a> {
    base: usize,
    bytes: &'a [u8],
}

impl<'a> CodeImage<'a> {
    pub fn new(base: usize, bytes: &'a [u8]) -> Self {
        CodeImage { base, bytes }
    }
}

impl InstructionFetch for CodeImage<'_> {
    fn fetch_u32(&self, addr: usize) -> Result<u32, FetchError> {
        let offset = addr.checked_sub(self.base).ok_or(FetchError::Unmapped(addr))?;
        let end = offset.checked_add(4).ok_or(FetchError::Unmapped(addr))?;
        let bytes = self
            .bytes
            .get(offset..end)
            .ok_or(FetchError::Unmapped(addr))?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }
}

/// Encoding of the faulting instruction: `stval` when the hart reported it, otherwise read
/// from `sepc`.
///
/// # Errors
/// Propagates the fetch error.
#[allow(clippy::cast_possible_truncation)]
pub fn faulting_insn<F: InstructionFetch + ?Sized>(
    context: &Context,
    fetch: &F,
) -> Result<u32, FetchError> {
    match context.stval() as u32 {
        0 => fetch.fetch_u32(context.sepc()),
        insn => Ok(insn),
    }
}

/// Handle a possible first-use trap of `context`.
///
/// Returns `true` if the trap was a first use: either the task can retry the instruction, or it
/// had to be killed because no memory was left for its register image. Returns `false` for
/// every other fault.
pub fn handle_first_use<F, A>(
    support: &VectorSupport,
    context: &mut Context,
    fetch: &F,
    alloc: &A,
) -> bool
where
    F: InstructionFetch + ?Sized,
    A: VectorAllocator + ?Sized,
{
    if !support.is_present() {
        return false;
    }
    // vector already on, so the fault is genuine
    if context.vs_status() != VsStatus::Off {
        return false;
    }

    let insn = match faulting_insn(context, fetch) {
        Ok(insn) => insn,
        Err(err) => {
            log::debug!("can not fetch faulting instruction: {err:?}");
            return false;
        }
    };
    if !is_vector(insn) {
        return false;
    }

    let vsize = support.vsize();
    if context.vstate.release().is_some() {
        log::warn!("first vector use with an image already present, replacing");
    }
    let Some(data) = alloc.alloc_zeroed(vsize) else {
        log::error!(
            "out of memory for {vsize} byte vector context at {:#x}, killing task",
            context.sepc()
        );
        context.force_signal(Signal::Kill);
        return true;
    };
    context.vstate.install(data);

    context.vstate.clear_scalars();
    support.enable(context);
    log::debug!("vector enabled for task at {:#x}", context.sepc());
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::TrapFrame;
    use crate::vector::state::GlobalAllocator;
    use crate::vector::VectorConfig;

    use alloc::boxed::Box;

    const VLENB: usize = 16;
    const VADD: u32 = 0x0221_80d7;
    const ADDI: u32 = 0x02a0_0093;

    struct NoMemory;

    impl VectorAllocator for NoMemory {
        fn alloc_zeroed(&self, _size: usize) -> Option<Box<[u8]>> {
            None
        }
    }

    fn support() -> VectorSupport {
        VectorSupport::Present(VectorConfig::new(VLENB).unwrap())
    }

    fn faulting(insn: u32) -> Context {
        Context::with_frame(TrapFrame {
            sepc: 0x1000,
            stval: insn as usize,
            sstatus: 0,
        })
    }

    #[test]
    fn allocates_and_enables() {
        let empty = CodeImage::new(0, &[]);
        let mut context = faulting(VADD);
        context.vstate.vl = 5;

        assert!(handle_first_use(&support(), &mut context, &empty, &GlobalAllocator));
        assert_eq!(context.vs_status(), VsStatus::Initial);
        assert_eq!(context.vstate.scalars(), (0, 0, 0, 0));
        let data = context.vstate.data().unwrap();
        assert_eq!(data.len(), VLENB * 32);
        assert!(data.iter().all(|&b| b == 0));
    }

    #[test]
    fn fetches_when_stval_is_zero() {
        let code = VADD.to_le_bytes();
        let image = CodeImage::new(0x1000, &code);
        let mut context = faulting(0);
        assert!(handle_first_use(&support(), &mut context, &image, &GlobalAllocator));
        assert!(context.vstate.is_allocated());
    }

    #[test]
    fn fetch_failure_is_not_handled() {
        let image = CodeImage::new(0x2000, &[0; 16]);
        let mut context = faulting(0);
        assert!(!handle_first_use(&support(), &mut context, &image, &GlobalAllocator));
        assert_eq!(context.vs_status(), VsStatus::Off);
        assert!(!context.vstate.is_allocated());
    }

    #[test]
    fn scalar_instruction_is_not_handled() {
        let empty = CodeImage::new(0, &[]);
        let mut context = faulting(ADDI);
        assert!(!handle_first_use(&support(), &mut context, &empty, &GlobalAllocator));
        assert!(!context.vstate.is_allocated());
    }

    #[test]
    fn vector_already_on_is_not_handled() {
        let empty = CodeImage::new(0, &[]);
        let mut context = faulting(VADD);
        context.set_vs_status(VsStatus::Clean);
        assert!(!handle_first_use(&support(), &mut context, &empty, &GlobalAllocator));
        assert_eq!(context.vs_status(), VsStatus::Clean);
    }

    #[test]
    fn no_vector_unit_is_not_handled() {
        let empty = CodeImage::new(0, &[]);
        let mut context = faulting(VADD);
        assert!(!handle_first_use(
            &VectorSupport::Absent,
            &mut context,
            &empty,
            &GlobalAllocator
        ));
    }

    #[test]
    fn out_of_memory_kills() {
        let empty = CodeImage::new(0, &[]);
        let mut context = faulting(VADD);
        assert!(handle_first_use(&support(), &mut context, &empty, &NoMemory));
        assert_eq!(context.pending_signal(), Some(Signal::Kill));
        assert_eq!(context.vs_status(), VsStatus::Off);
        assert!(!context.vstate.is_allocated());
    }

    #[test]
    fn stale_image_is_replaced() {
        let empty = CodeImage::new(0, &[]);
        let mut context = faulting(VADD);
        context
            .vstate
            .install(GlobalAllocator.alloc_zeroed(VLENB * 32).unwrap());
        context.vstate.data_mut().unwrap().fill(0x77);

        assert!(handle_first_use(&support(), &mut context, &empty, &GlobalAllocator));
        assert_eq!(context.pending_signal(), None);
        assert_eq!(context.vstate.data().map(<[u8]>::len), Some(VLENB * 32));
        assert!(context.vstate.data().unwrap().iter().all(|&b| b == 0));
        assert_eq!(context.vs_status(), VsStatus::Initial);
    }

    #[test]
    fn stale_image_is_dropped_on_oom() {
        let empty = CodeImage::new(0, &[]);
        let mut context = faulting(VADD);
        context
            .vstate
            .install(GlobalAllocator.alloc_zeroed(VLENB * 32).unwrap());

        assert!(handle_first_use(&support(), &mut context, &empty, &NoMemory));
        assert_eq!(context.pending_signal(), Some(Signal::Kill));
        assert!(!context.vstate.is_allocated());
        assert_eq!(context.vs_status(), VsStatus::Off);
    }

    #[test]
    fn code_image_bounds() {
        let code = [0x13, 0x00, 0x00, 0x00, 0x57];
        let image = CodeImage::new(0x100, &code);
        assert_eq!(image.fetch_u32(0x100), Ok(0x13));
        assert_eq!(image.fetch_u32(0x102), Err(FetchError::Unmapped(0x102)));
        assert_eq!(image.fetch_u32(0xfc), Err(FetchError::Unmapped(0xfc)));
        assert_eq!(image.fetch_u32(usize::MAX), Err(FetchError::Unmapped(usize::MAX)));
    }
}
