// Unit tests for the paging core.
//
// The tests run against a small `MockMmConfig` (8 frames, 4 entries per table) so
// that pool exhaustion and table reclamation are easy to reach.

extern crate alloc;

use test_support::mock::mm::{MOCK_MM_CONFIG, MockMmConfig};

use crate::config::MmConfig;
use crate::{AccessMode, Pfn, Pid, Vm, Vpn};

impl MmConfig for MockMmConfig {
    fn nr_pageframes(&self) -> usize {
        self.nr_pageframes
    }

    fn nr_ptes_per_page(&self) -> usize {
        self.nr_ptes_per_page
    }
}

fn new_vm() -> Vm {
    Vm::new(&MOCK_MM_CONFIG)
}

fn vm_with_frames(nr_pageframes: usize) -> Vm {
    Vm::new(&MockMmConfig::with_frames(nr_pageframes))
}

/// Allocate `vpn` in the current process and return the frame.
fn map_page(vm: &mut Vm, vpn: usize, rw: AccessMode) -> Pfn {
    vm.allocate_page(Vpn(vpn), rw).unwrap()
}

fn assert_consistent(vm: &Vm) {
    if let Err(mismatch) = vm.verify_mapcounts() {
        panic!("mapcount mismatch: {}", mismatch);
    }
}

mod alloc_page;
