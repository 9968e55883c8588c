use rvv_lazy::csrs::VectorCsr;
use rvv_lazy::vector::port::simulated::SimulatedPort;
use rvv_lazy::vector::port::VectorPort;
use rvv_lazy::{is_extension_present, setup_vsize, vector_support, vsize, VectorSupport};

#[test]
fn vsize_is_published_once() {
    assert!(!is_extension_present());
    assert_eq!(vsize(), 0);

    let mut port = SimulatedPort::new(32);
    let support = setup_vsize(&mut port, true);
    assert!(support.is_present());
    assert_eq!(vsize(), 32 * 32);
    assert!(!port.access_enabled());

    // a second call does not change what was published
    let mut wider = SimulatedPort::new(64);
    assert_eq!(setup_vsize(&mut wider, true), support);
    assert_eq!(setup_vsize(&mut wider, false), support);
    assert_eq!(vector_support().vsize(), 1024);
    assert!(matches!(vector_support(), VectorSupport::Present(config) if config.vlenb() == 32));

    port.enable_access();
    assert_eq!(port.read_csr(VectorCsr::Vlenb), 32);
}
