//! 通过公开接口驱动的端到端场景

use pagesim::{
    AccessMode, DefaultMmConfig, FaultResolution, INIT_PID, MmConfig, PagingError, Pfn, Pid,
    SwitchOutcome, Vm, Vpn,
};

struct SmallConfig;

impl MmConfig for SmallConfig {
    fn nr_pageframes(&self) -> usize {
        4
    }

    fn nr_ptes_per_page(&self) -> usize {
        4
    }
}

#[test]
fn test_default_layout() {
    let vm = Vm::new(&DefaultMmConfig);
    assert_eq!(vm.layout().nr_pageframes, 128);
    assert_eq!(vm.layout().nr_ptes_per_page, 16);
    assert_eq!(vm.layout().nr_vpns(), 256);
    assert_eq!(vm.current_pid(), INIT_PID);
    assert_eq!(vm.frames().get_stats(), (128, 0, 128));
}

#[test]
fn test_fork_then_write_scenario() {
    let mut vm = Vm::new(&DefaultMmConfig);
    assert_eq!(vm.allocate_page(Vpn(3), AccessMode::RW), Ok(Pfn(0)));

    assert_eq!(vm.switch_or_fork(Pid(1)), SwitchOutcome::Forked);
    assert_eq!(vm.current_pid(), Pid(1));
    assert_eq!(vm.mapcount(Pfn(0)), 2);
    assert_eq!(vm.translate(Vpn(3), AccessMode::READ), Some(Pfn(0)));
    assert_eq!(vm.translate(Vpn(3), AccessMode::WRITE), None);

    assert!(vm.handle_page_fault(Vpn(3), AccessMode::WRITE));
    assert_eq!(vm.translate(Vpn(3), AccessMode::WRITE), Some(Pfn(1)));
    assert_eq!(vm.mapcount(Pfn(0)), 1);
    assert_eq!(vm.mapcount(Pfn(1)), 1);

    // 父进程仍指向原帧，写保护位由缺页处理恢复
    assert_eq!(vm.switch_or_fork(INIT_PID), SwitchOutcome::Switched);
    assert_eq!(vm.translate(Vpn(3), AccessMode::WRITE), None);
    assert_eq!(
        vm.resolve_fault(Vpn(3), AccessMode::WRITE),
        Ok(FaultResolution::Reused(Pfn(0)))
    );
    assert_eq!(vm.access(Vpn(3), AccessMode::WRITE), Ok(Pfn(0)));
    assert!(vm.verify_mapcounts().is_ok());
}

#[test]
fn test_read_only_page_stays_read_only() {
    let mut vm = Vm::new(&SmallConfig);
    vm.allocate_page(Vpn(5), AccessMode::READ).unwrap();

    assert_eq!(vm.access(Vpn(5), AccessMode::READ), Ok(Pfn(0)));
    assert!(!vm.handle_page_fault(Vpn(5), AccessMode::WRITE));
    assert_eq!(
        vm.access(Vpn(5), AccessMode::WRITE),
        Err(PagingError::ProtectionViolation)
    );
    assert_eq!(vm.stats().denied, 2);
}

#[test]
fn test_inner_table_reclaimed_after_last_free() {
    let mut vm = Vm::new(&SmallConfig);
    vm.allocate_page(Vpn(4), AccessMode::RW).unwrap();
    vm.allocate_page(Vpn(6), AccessMode::READ).unwrap();
    assert_eq!(vm.ptbr().nr_directories(), 1);

    vm.free_page(Vpn(4));
    assert_eq!(vm.ptbr().nr_directories(), 1);
    vm.free_page(Vpn(6));
    assert_eq!(vm.ptbr().nr_directories(), 0);
    assert_eq!(vm.frames().get_stats(), (4, 0, 4));
}

#[test]
fn test_exhaustion_and_smallest_frame_reuse() {
    let mut vm = Vm::new(&SmallConfig);
    for vpn in 0..4 {
        assert_eq!(vm.allocate_page(Vpn(vpn), AccessMode::RW), Ok(Pfn(vpn)));
    }
    assert_eq!(
        vm.allocate_page(Vpn(8), AccessMode::RW),
        Err(PagingError::OutOfMemory)
    );
    assert_eq!(vm.ptbr().nr_directories(), 1);

    vm.free_page(Vpn(2));
    vm.free_page(Vpn(1));
    assert_eq!(vm.allocate_page(Vpn(8), AccessMode::RW), Ok(Pfn(1)));
    assert_eq!(vm.allocate_page(Vpn(9), AccessMode::RW), Ok(Pfn(2)));
}

#[test]
fn test_cow_copy_fails_when_pool_is_full() {
    let mut vm = Vm::new(&SmallConfig);
    for vpn in 0..4 {
        vm.allocate_page(Vpn(vpn), AccessMode::RW).unwrap();
    }
    vm.switch_or_fork(Pid(7));

    assert_eq!(
        vm.resolve_fault(Vpn(0), AccessMode::WRITE),
        Err(PagingError::OutOfMemory)
    );
    let pte = vm.pte(Vpn(0)).unwrap();
    assert_eq!(pte.pfn(), Pfn(0));
    assert!(!pte.is_writable());
    assert!(vm.verify_mapcounts().is_ok());
}

#[test]
fn test_dump_lists_valid_mappings() {
    let mut vm = Vm::new(&SmallConfig);
    vm.allocate_page(Vpn(1), AccessMode::RW).unwrap();
    vm.allocate_page(Vpn(14), AccessMode::READ).unwrap();
    vm.switch_or_fork(Pid(1));

    assert_eq!(
        vm.ptbr().to_string(),
        "   1 -> pfn 0 r (rw)\n  14 -> pfn 1 r (r)\n"
    );
}
