//! Exception handling for the vector extension.

pub mod first_use;
pub mod instruction;

use crate::context::{Context, Signal};
use crate::vector::port::VectorPort;
use crate::vector::state::VectorAllocator;
use crate::vector::{vector_support, VectorSupport};
use first_use::InstructionFetch;

use raki::{Decode, Isa::Rv64};

/// Exceptions the vector extension cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrapCause {
    /// Illegal instruction (cause = 2)
    IllegalInstruction,
    /// Any other exception, by `scause` code.
    Other(usize),
}

#[cfg(target_arch = "riscv64")]
impl TrapCause {
    /// Cause of the trap being handled on this hart.
    pub fn current() -> Self {
        use riscv::register::scause::{self, Exception, Trap};

        let scause = scause::read();
        match scause.cause() {
            Trap::Exception(Exception::IllegalInstruction) => TrapCause::IllegalInstruction,
            _ => TrapCause::Other(scause.code()),
        }
    }
}

/// What the trap handler should do with the task next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrapOutcome {
    /// Return to the task, re-executing the faulting instruction.
    Retry,
    /// The task has a kill signal pending.
    Killed,
    /// Not ours; report the fault the usual way.
    Forward,
}

/// Trap handler for exceptions.
///
/// On `Retry` the zeroed image of a first-use task is already loaded into `port`, so the
/// retried instruction never sees registers of the task that ran before.
pub fn handle_exception<F, A, P>(
    support: &VectorSupport,
    cause: TrapCause,
    context: &mut Context,
    port: &mut P,
    fetch: &F,
    alloc: &A,
) -> TrapOutcome
where
    F: InstructionFetch + ?Sized,
    A: VectorAllocator + ?Sized,
    P: VectorPort + ?Sized,
{
    match cause {
        TrapCause::IllegalInstruction => {
            if !first_use::handle_first_use(support, context, fetch, alloc) {
                report_illegal_instruction(context, fetch);
                return TrapOutcome::Forward;
            }
            match context.pending_signal() {
                Some(Signal::Kill) => TrapOutcome::Killed,
                None => {
                    support.restore(context, port);
                    TrapOutcome::Retry
                }
            }
        }
        TrapCause::Other(_) => TrapOutcome::Forward,
    }
}

/// [`first_use::handle_first_use`] with the published vector support.
pub fn handle_first_use<F, A>(context: &mut Context, fetch: &F, alloc: &A) -> bool
where
    F: InstructionFetch + ?Sized,
    A: VectorAllocator + ?Sized,
{
    first_use::handle_first_use(vector_support(), context, fetch, alloc)
}

fn report_illegal_instruction<F: InstructionFetch + ?Sized>(context: &Context, fetch: &F) {
    let Ok(insn) = first_use::faulting_insn(context, fetch) else {
        log::debug!("illegal instruction at {:#x}", context.sepc());
        return;
    };
    if instruction::insn_length(insn) != 4 {
        log::debug!(
            "illegal instruction {:#06x} at {:#x}",
            insn & 0xffff,
            context.sepc()
        );
        return;
    }
    match insn.decode(Rv64) {
        Ok(inst) => log::debug!("illegal instruction {inst:?} at {:#x}", context.sepc()),
        Err(_) => log::debug!("illegal instruction {insn:#010x} at {:#x}", context.sepc()),
    }
}
