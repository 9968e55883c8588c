//! Lazy save/restore of the vector register file.
//!
//! Every task owns a [`VectorState`]. Whether the image in it or the live registers are
//! authoritative is tracked by the `VS` field of the task's saved `sstatus`:
//!
//! | VS      | registers                          | save      | restore   |
//! |---------|------------------------------------|-----------|-----------|
//! | Off     | unusable, first use traps          | no-op     | no-op     |
//! | Initial | zero                               | no-op     | reload    |
//! | Clean   | equal to the image                 | no-op     | reload    |
//! | Dirty   | newer than the image               | copy out  | reload    |
//!
//! The image is allocated by the first-use trap ([`crate::trap::first_use`]), never here.

pub mod kernel;
pub mod port;
pub mod regset;
pub mod state;
pub mod vtype;

use crate::context::Context;
use crate::csrs::{VectorCsr, VsStatus, NUM_VECTOR_REGS};
use port::{with_access, Transfer, VectorPort};
use vtype::VType;

use spin::Once;

/// Vector unit geometry discovered at boot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VectorConfig {
    vlenb: usize,
}

impl VectorConfig {
    /// `vlenb` must be a non-zero power of two.
    pub fn new(vlenb: usize) -> Option<Self> {
        vlenb.is_power_of_two().then_some(VectorConfig { vlenb })
    }

    /// Register length in bytes.
    pub fn vlenb(&self) -> usize {
        self.vlenb
    }

    /// Size of a whole register file image.
    pub fn vsize(&self) -> usize {
        self.vlenb * NUM_VECTOR_REGS
    }
}

/// Whether the harts implement the vector extension.
///
/// `Absent` turns every operation into a no-op so callers never check for the extension
/// themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorSupport {
    Absent,
    Present(VectorConfig),
}

impl VectorSupport {
    pub fn is_present(&self) -> bool {
        matches!(self, VectorSupport::Present(_))
    }

    pub fn config(&self) -> Option<&VectorConfig> {
        match self {
            VectorSupport::Present(config) => Some(config),
            VectorSupport::Absent => None,
        }
    }

    /// Size of a register file image, 0 without the extension.
    pub fn vsize(&self) -> usize {
        self.config().map_or(0, VectorConfig::vsize)
    }

    /// Current `VS` state of `context`.
    pub fn status(&self, context: &Context) -> VsStatus {
        context.vs_status()
    }

    /// `Off -> Initial`. Contexts already on are left alone.
    ///
    /// Refused (`false`) unless `context` holds a `vsize` byte image, since an `Initial`
    /// context without one would run on the previous task's registers.
    pub fn enable(&self, context: &mut Context) -> bool {
        if !self.is_present() {
            return false;
        }
        let vsize = self.vsize();
        if context.vstate.data().map(<[u8]>::len) != Some(vsize) {
            log::warn!("refusing to enable vector use without a {vsize} byte image");
            return false;
        }
        if context.vs_status() == VsStatus::Off {
            context.set_vs_status(VsStatus::Initial);
        }
        true
    }

    /// Any state `-> Off`. The next vector instruction goes through the first-use trap.
    pub fn disable(&self, context: &mut Context) {
        context.set_vs_status(VsStatus::Off);
    }

    /// Turn vector use off and wipe the image, e.g. on exec.
    pub fn reset(&self, context: &mut Context) {
        self.disable(context);
        context.vstate.clear_scalars();
        if let Some(data) = context.vstate.data_mut() {
            data.fill(0);
        }
    }

    /// Copy the live registers into the image if, and only if, `context` is `Dirty`.
    pub fn save<P: VectorPort + ?Sized>(&self, context: &mut Context, port: &mut P) {
        if !self.is_present() || context.vs_status() != VsStatus::Dirty {
            return;
        }
        let vsize = self.vsize();
        let Some(data) = context.vstate.data_mut().filter(|data| data.len() == vsize) else {
            log::warn!("dirty vector context without a {vsize} byte image, not saved");
            return;
        };

        let (vstart, vtype, vl, vcsr) = with_access(port, |port| {
            // read before the copy, which reprograms vl and vtype
            let vstart = port.read_csr(VectorCsr::Vstart);
            let vtype = port.read_csr(VectorCsr::Vtype);
            let vl = port.read_csr(VectorCsr::Vl);
            let vcsr = port.read_csr(VectorCsr::Vcsr);
            port.copy_registers(Transfer::Save, data);
            (vstart, vtype, vl, vcsr)
        });

        context.vstate.vstart = vstart;
        context.vstate.vtype = vtype;
        context.vstate.vl = vl;
        context.vstate.vcsr = vcsr;
        context.set_vs_status(VsStatus::Clean);
        log::trace!("saved vector state, {:?}, vl = {vl}", VType::decode(vtype));
    }

    /// Load the image into the registers unless `context` is `Off`.
    pub fn restore<P: VectorPort + ?Sized>(&self, context: &mut Context, port: &mut P) {
        if !self.is_present() || context.vs_status() == VsStatus::Off {
            return;
        }
        let vsize = self.vsize();
        if context.vstate.data().map(<[u8]>::len) != Some(vsize) {
            // turned off so the next vector instruction takes the first-use trap
            log::warn!("vector context without a {vsize} byte image, disabling");
            context.set_vs_status(VsStatus::Off);
            return;
        }
        let (vstart, vtype, vl, vcsr) = context.vstate.scalars();
        let Some(data) = context.vstate.data_mut() else {
            return;
        };

        with_access(port, |port| {
            port.copy_registers(Transfer::Restore, data);
            // after the copy, which reprograms vl and vtype
            port.set_vl_vtype(vl, vtype);
            port.write_csr(VectorCsr::Vstart, vstart);
            port.write_csr(VectorCsr::Vcsr, vcsr);
        });

        context.set_vs_status(VsStatus::Clean);
    }

    /// Bring the image up to date before exposing it, e.g. to a debugger.
    pub fn flush<P: VectorPort + ?Sized>(&self, context: &mut Context, port: &mut P) {
        self.save(context, port);
    }

    /// Called before `prev` gives up the hart.
    pub fn on_switch_out<P: VectorPort + ?Sized>(&self, prev: &mut Context, port: &mut P) {
        self.save(prev, port);
    }

    /// Called before `next` resumes on the hart.
    pub fn on_switch_in<P: VectorPort + ?Sized>(&self, next: &mut Context, port: &mut P) {
        self.restore(next, port);
    }
}

static VECTOR_SUPPORT: Once<VectorSupport> = Once::new();
static ABSENT: VectorSupport = VectorSupport::Absent;

/// Discover the vector unit and publish its geometry.
///
/// Runs once, after ISA discovery and before any task can take a first-use trap. Later calls
/// return the value published by the first one.
pub fn setup_vsize<P: VectorPort + ?Sized>(port: &mut P, has_vector: bool) -> &'static VectorSupport {
    VECTOR_SUPPORT.call_once(|| {
        if !has_vector {
            log::info!("vector extension not present");
            return VectorSupport::Absent;
        }

        let vlenb = with_access(port, |port| port.read_csr(VectorCsr::Vlenb));
        match VectorConfig::new(vlenb) {
            Some(config) => {
                log::info!(
                    "vector register width: {} bits, context size: {} bytes",
                    vlenb * 8,
                    config.vsize()
                );
                VectorSupport::Present(config)
            }
            None => {
                log::warn!("invalid vlenb {vlenb:#x}, vector extension disabled");
                VectorSupport::Absent
            }
        }
    })
}

/// Published vector support; `Absent` until [`setup_vsize`] ran.
pub fn vector_support() -> &'static VectorSupport {
    VECTOR_SUPPORT.get().unwrap_or(&ABSENT)
}

pub fn is_extension_present() -> bool {
    vector_support().is_present()
}

/// Size of a register file image in bytes.
pub fn vsize() -> usize {
    vector_support().vsize()
}

/// [`VectorSupport::on_switch_out`] with the published support.
pub fn on_switch_out<P: VectorPort + ?Sized>(prev: &mut Context, port: &mut P) {
    vector_support().on_switch_out(prev, port);
}

/// [`VectorSupport::on_switch_in`] with the published support.
pub fn on_switch_in<P: VectorPort + ?Sized>(next: &mut Context, port: &mut P) {
    vector_support().on_switch_in(next, port);
}
