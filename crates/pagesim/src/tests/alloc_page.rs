use super::*;
use crate::PagingError;

#[test]
fn test_smallest_frame_allocation_order() {
    let mut vm = new_vm();

    for vpn in 0..8 {
        assert_eq!(map_page(&mut vm, vpn, AccessMode::RW), Pfn(vpn));
    }
    assert_eq!(
        vm.allocate_page(Vpn(8), AccessMode::RW),
        Err(PagingError::OutOfMemory)
    );
    assert_eq!(vm.frames().get_stats(), (8, 8, 0));
}

#[test]
fn test_failed_allocation_leaves_no_table() {
    let mut vm = vm_with_frames(0);

    assert_eq!(
        vm.allocate_page(Vpn(9), AccessMode::RW),
        Err(PagingError::OutOfMemory)
    );
    assert_eq!(vm.ptbr().nr_directories(), 0);
    assert!(vm.pte(Vpn(9)).is_none());
}

#[test]
fn test_allocate_populates_entry() {
    let mut vm = new_vm();

    let pfn = map_page(&mut vm, 5, AccessMode::RW);
    let pte = vm.pte(Vpn(5)).unwrap();
    assert!(pte.is_valid());
    assert!(pte.is_writable());
    assert_eq!(pte.pfn(), pfn);
    assert_eq!(pte.private(), AccessMode::RW);
    assert_eq!(vm.mapcount(pfn), 1);
}

#[test]
fn test_allocate_read_only() {
    let mut vm = new_vm();

    map_page(&mut vm, 2, AccessMode::READ);
    let pte = vm.pte(Vpn(2)).unwrap();
    assert!(pte.is_valid());
    assert!(!pte.is_writable());
    assert_eq!(pte.private(), AccessMode::READ);
    assert!(vm.translate(Vpn(2), AccessMode::READ).is_some());
    assert!(vm.translate(Vpn(2), AccessMode::WRITE).is_none());
}

#[test]
fn test_inner_table_created_lazily() {
    let mut vm = new_vm();
    assert_eq!(vm.ptbr().nr_directories(), 0);

    map_page(&mut vm, 5, AccessMode::RW);
    assert_eq!(vm.ptbr().nr_directories(), 1);
    assert!(vm.ptbr().directory(1).is_some());

    map_page(&mut vm, 6, AccessMode::RW);
    assert_eq!(vm.ptbr().nr_directories(), 1);
}

#[test]
fn test_allocate_out_of_range() {
    let mut vm = new_vm();

    assert_eq!(
        vm.allocate_page(Vpn(16), AccessMode::RW),
        Err(PagingError::InvalidAddress)
    );
    assert_eq!(vm.frames().allocated_frames(), 0);
}

#[test]
fn test_allocate_already_mapped() {
    let mut vm = new_vm();

    let pfn = map_page(&mut vm, 3, AccessMode::RW);
    assert_eq!(
        vm.allocate_page(Vpn(3), AccessMode::READ),
        Err(PagingError::AlreadyMapped)
    );
    assert_eq!(vm.mapcount(pfn), 1);
    assert_eq!(vm.pte(Vpn(3)).unwrap().private(), AccessMode::RW);
    assert_consistent(&vm);
}

#[test]
fn test_allocation_is_per_process() {
    let mut vm = new_vm();

    map_page(&mut vm, 0, AccessMode::RW);
    vm.switch_or_fork(Pid(1));
    let pfn = map_page(&mut vm, 1, AccessMode::RW);

    assert_eq!(pfn, Pfn(1));
    assert!(vm.pte_of(Pid(0), Vpn(1)).is_some_and(|pte| !pte.is_valid()));
    assert_consistent(&vm);
}
