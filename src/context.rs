//! Execution context of a task.

use crate::csrs::VsStatus;
use crate::vector::state::VectorState;

/// Signals this crate can raise against a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// Terminate the task.
    Kill,
}

/// Registers saved on trap entry that this crate looks at.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TrapFrame {
    /// Program counter
    pub sepc: usize,
    /// Trap value (faulting instruction bits for illegal instruction traps, may be zero)
    pub stval: usize,
    /// Value of sstatus
    pub sstatus: usize,
}

/// Task context
///
/// Holds the trap frame and the vector state of one task.
#[derive(Debug, Default)]
pub struct Context {
    frame: TrapFrame,
    /// Vector register image of this task.
    pub vstate: VectorState,
    pending_signal: Option<Signal>,
}

impl Context {
    /// A new context starts with `sstatus.VS = Off` and no vector buffer.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_frame(frame: TrapFrame) -> Self {
        Context {
            frame,
            vstate: VectorState::default(),
            pending_signal: None,
        }
    }

    /// Return sepc value.
    pub fn sepc(&self) -> usize {
        self.frame.sepc
    }

    /// Return stval value.
    pub fn stval(&self) -> usize {
        self.frame.stval
    }

    /// Return sstatus value.
    pub fn sstatus(&self) -> usize {
        self.frame.sstatus
    }

    /// `VS` field of the saved sstatus.
    pub fn vs_status(&self) -> VsStatus {
        VsStatus::from_sstatus(self.frame.sstatus)
    }

    pub fn set_vs_status(&mut self, status: VsStatus) {
        self.frame.sstatus = status.apply(self.frame.sstatus);
    }

    /// Queue a signal for delivery on the way back to the task.
    pub fn force_signal(&mut self, signal: Signal) {
        self.pending_signal = Some(signal);
    }

    pub fn pending_signal(&self) -> Option<Signal> {
        self.pending_signal
    }

    /// Take the pending signal, leaving none.
    pub fn take_signal(&mut self) -> Option<Signal> {
        self.pending_signal.take()
    }

    /// Record sepc and stval of the trap being handled on this hart.
    #[cfg(target_arch = "riscv64")]
    pub fn capture_trap(&mut self) {
        use riscv::register::{sepc, stval};

        self.frame.sepc = sepc::read();
        self.frame.stval = stval::read();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csrs::SR_VS;

    #[test]
    fn new_context_is_off() {
        let context = Context::new();
        assert_eq!(context.vs_status(), VsStatus::Off);
        assert!(!context.vstate.is_allocated());
        assert_eq!(context.pending_signal(), None);
    }

    #[test]
    fn status_keeps_other_sstatus_bits() {
        let mut context = Context::with_frame(TrapFrame {
            sepc: 0x1_0000,
            stval: 0,
            sstatus: 0x2_0000_0120,
        });
        context.set_vs_status(VsStatus::Initial);
        assert_eq!(context.sstatus(), 0x2_0000_0320);
        context.set_vs_status(VsStatus::Off);
        assert_eq!(context.sstatus() & SR_VS, 0);
        assert_eq!(context.sstatus(), 0x2_0000_0120);
    }

    #[test]
    fn signal_is_taken_once() {
        let mut context = Context::new();
        context.force_signal(Signal::Kill);
        assert_eq!(context.take_signal(), Some(Signal::Kill));
        assert_eq!(context.take_signal(), None);
    }
}
