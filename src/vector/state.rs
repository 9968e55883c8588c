//! Per-task image of the vector register file.

use alloc::boxed::Box;
use alloc::vec::Vec;

/// Vector state of one task.
///
/// `data` is the concatenation of `v0`..`v31` and is `None` until the task executes its
/// first vector instruction.
#[derive(Debug, Default)]
pub struct VectorState {
    /// `vstart`
    pub vstart: usize,
    /// `vtype`
    pub vtype: usize,
    /// `vl`
    pub vl: usize,
    /// `vcsr`
    pub vcsr: usize,
    data: Option<Box<[u8]>>,
}

impl VectorState {
    pub fn is_allocated(&self) -> bool {
        self.data.is_some()
    }

    /// Register image, if allocated.
    pub fn data(&self) -> Option<&[u8]> {
        self.data.as_deref()
    }

    pub fn data_mut(&mut self) -> Option<&mut [u8]> {
        self.data.as_deref_mut()
    }

    /// Install a freshly allocated register image.
    pub fn install(&mut self, data: Box<[u8]>) {
        self.data = Some(data);
    }

    /// Free the register image.
    pub fn release(&mut self) -> Option<Box<[u8]>> {
        self.data.take()
    }

    /// Zero every field except the register image.
    pub fn clear_scalars(&mut self) {
        self.vstart = 0;
        self.vtype = 0;
        self.vl = 0;
        self.vcsr = 0;
    }

    /// `(vstart, vtype, vl, vcsr)`
    pub fn scalars(&self) -> (usize, usize, usize, usize) {
        (self.vstart, self.vtype, self.vl, self.vcsr)
    }
}

/// Source of zero-filled register images.
pub trait VectorAllocator {
    /// Return `size` zeroed bytes, or `None` when memory is exhausted.
    fn alloc_zeroed(&self, size: usize) -> Option<Box<[u8]>>;
}

/// Allocate from the global heap without aborting on exhaustion.
#[derive(Debug, Default, Clone, Copy)]
pub struct GlobalAllocator;

impl VectorAllocator for GlobalAllocator {
    fn alloc_zeroed(&self, size: usize) -> Option<Box<[u8]>> {
        let mut buffer = Vec::new();
        buffer.try_reserve_exact(size).ok()?;
        buffer.resize(size, 0u8);
        Some(buffer.into_boxed_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_allocator_zeroes() {
        let buffer = GlobalAllocator.alloc_zeroed(512).unwrap();
        assert_eq!(buffer.len(), 512);
        assert!(buffer.iter().all(|&b| b == 0));
    }

    #[test]
    fn global_allocator_reports_exhaustion() {
        assert!(GlobalAllocator.alloc_zeroed(usize::MAX).is_none());
    }

    #[test]
    fn clear_scalars_keeps_data() {
        let mut state = VectorState {
            vstart: 1,
            vtype: 2,
            vl: 3,
            vcsr: 4,
            data: None,
        };
        state.install(GlobalAllocator.alloc_zeroed(64).unwrap());
        state.clear_scalars();
        assert_eq!(state.scalars(), (0, 0, 0, 0));
        assert_eq!(state.data().map(<[u8]>::len), Some(64));

        assert!(state.release().is_some());
        assert!(!state.is_allocated());
    }
}
