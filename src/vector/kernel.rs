//! Vector use inside the supervisor.
//!
//! The supervisor may borrow the vector unit for bulk memory operations. The interrupted
//! task's registers are saved first if dirty and reloaded when the section ends.

use super::port::VectorPort;
use super::VectorSupport;
use crate::context::Context;

/// Default size above which the vector routines are used.
pub const DEFAULT_THRESHOLD: usize = 768;

/// Minimum lengths for the vector variants of the memory routines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    pub memcpy: usize,
    pub memset: usize,
    pub memmove: usize,
    pub usercopy: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Thresholds {
            memcpy: DEFAULT_THRESHOLD,
            memset: DEFAULT_THRESHOLD,
            memmove: DEFAULT_THRESHOLD,
            usercopy: DEFAULT_THRESHOLD,
        }
    }
}

/// An open kernel vector section. Closing it (drop or [`KernelVector::end`]) gives the unit
/// back to `context`.
///
/// The section borrows the port exclusively, so sections can not nest on one hart.
pub struct KernelVector<'a, P: VectorPort + ?Sized> {
    support: &'a VectorSupport,
    context: &'a mut Context,
    port: &'a mut P,
}

impl<'a, P: VectorPort + ?Sized> KernelVector<'a, P> {
    /// Open a section on behalf of the interrupted `context`.
    ///
    /// Returns `None` when there is no vector unit to borrow.
    pub fn begin(
        support: &'a VectorSupport,
        context: &'a mut Context,
        port: &'a mut P,
    ) -> Option<Self> {
        if !support.is_present() {
            return None;
        }
        support.save(context, port);
        port.enable_access();
        Some(KernelVector {
            support,
            context,
            port,
        })
    }

    /// Vector unit, with access enabled.
    pub fn port(&mut self) -> &mut P {
        &mut *self.port
    }

    /// Close the section.
    pub fn end(self) {}
}

impl<P: VectorPort + ?Sized> Drop for KernelVector<'_, P> {
    fn drop(&mut self) {
        self.port.disable_access();
        self.support.restore(&mut *self.context, &mut *self.port);
    }
}

/// Run `vector` inside a kernel vector section if `len` exceeds `threshold`, `scalar`
/// otherwise.
pub fn dispatch<P, R>(
    support: &VectorSupport,
    context: &mut Context,
    port: &mut P,
    len: usize,
    threshold: usize,
    vector: impl FnOnce(&mut P) -> R,
    scalar: impl FnOnce() -> R,
) -> R
where
    P: VectorPort + ?Sized,
{
    if len > threshold {
        if let Some(mut section) = KernelVector::begin(support, context, port) {
            return vector(section.port());
        }
    }
    scalar()
}

/// Copy `len` bytes to or from user memory.
///
/// Copies of at most `threshold` bytes go straight to `scalar`. Otherwise `vector` returns
/// the number of bytes it could not copy; those are handed to `scalar(offset, remaining)`,
/// which returns its own remainder. The result is the number of bytes left uncopied.
pub fn usercopy<P>(
    support: &VectorSupport,
    context: &mut Context,
    port: &mut P,
    len: usize,
    threshold: usize,
    vector: impl FnOnce(&mut P) -> usize,
    scalar: impl FnOnce(usize, usize) -> usize,
) -> usize
where
    P: VectorPort + ?Sized,
{
    if len <= threshold {
        return scalar(0, len);
    }
    let remain = match KernelVector::begin(support, context, port) {
        Some(mut section) => vector(section.port()),
        None => return scalar(0, len),
    };

    if remain == 0 {
        return 0;
    }
    if remain > len {
        log::warn!("vector usercopy left {remain} of {len} bytes, retrying all");
    }
    let remain = remain.min(len);
    scalar(len - remain, remain)
}
