//! 两级页表结构
//!
//! ## 设计要点
//!
//! - 外层目录 [`PageTable`] 是定长的 `Option<Box<PteDirectory>>` 数组，
//!   由所属进程独占。
//! - 内层表 [`PteDirectory`] 在某个目录索引第一次被使用时才分配，
//!   当其中所有表项都失效时回收，目录槽位随之清空。
//! - 页表只记录映射关系，帧的引用计数由 [`crate::frame_allocator::FramePool`]
//!   维护，二者的同步由 [`crate::Vm`] 负责。

use alloc::boxed::Box;
use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use super::PageTableEntry;
use crate::address::{TableIndex, Vpn};
use crate::config::MmLayout;

/// 内层页表
#[derive(Debug, Clone)]
pub struct PteDirectory {
    ptes: Vec<PageTableEntry>,
}

impl PteDirectory {
    /// 创建全部表项无效的内层表
    pub fn new(nr_ptes: usize) -> Self {
        Self {
            ptes: vec![PageTableEntry::empty(); nr_ptes],
        }
    }

    /// 获取表项
    pub fn entry(&self, pte_index: usize) -> Option<&PageTableEntry> {
        self.ptes.get(pte_index)
    }

    pub(crate) fn entry_mut(&mut self, pte_index: usize) -> Option<&mut PageTableEntry> {
        self.ptes.get_mut(pte_index)
    }

    /// 所有表项是否都无效（完整线性扫描）
    pub fn is_empty(&self) -> bool {
        !self.ptes.iter().any(PageTableEntry::is_valid)
    }

    /// 有效表项数量
    pub fn valid_count(&self) -> usize {
        self.ptes.iter().filter(|pte| pte.is_valid()).count()
    }

    /// 遍历有效表项，产出（表内索引，表项）
    pub fn valid_entries(&self) -> impl Iterator<Item = (usize, &PageTableEntry)> {
        self.ptes.iter().enumerate().filter(|(_, pte)| pte.is_valid())
    }
}

/// 外层页目录，即一个进程的页表
#[derive(Debug)]
pub struct PageTable {
    outer_ptes: Vec<Option<Box<PteDirectory>>>,
    layout: MmLayout,
}

impl PageTable {
    /// 创建空页表，所有目录槽位都为空
    pub fn new(layout: &MmLayout) -> Self {
        let mut outer_ptes = Vec::with_capacity(layout.nr_ptes_per_page);
        outer_ptes.resize_with(layout.nr_ptes_per_page, || None);
        Self {
            outer_ptes,
            layout: *layout,
        }
    }

    /// 获取目录槽位对应的内层表
    pub fn directory(&self, pd_index: usize) -> Option<&PteDirectory> {
        self.outer_ptes.get(pd_index)?.as_deref()
    }

    /// 获取内层表，不存在时按需创建
    pub(crate) fn directory_or_create(&mut self, pd_index: usize) -> &mut PteDirectory {
        let nr_ptes = self.layout.nr_ptes_per_page;
        self.outer_ptes[pd_index].get_or_insert_with(|| {
            log::trace!("page table: create inner table for directory {}", pd_index);
            Box::new(PteDirectory::new(nr_ptes))
        })
    }

    /// 查找表项；目录槽位为空时返回 `None`
    pub fn entry(&self, index: TableIndex) -> Option<&PageTableEntry> {
        self.directory(index.pd_index)?.entry(index.pte_index)
    }

    pub(crate) fn entry_mut(&mut self, index: TableIndex) -> Option<&mut PageTableEntry> {
        self.outer_ptes
            .get_mut(index.pd_index)?
            .as_deref_mut()?
            .entry_mut(index.pte_index)
    }

    /// 若内层表已全部失效则回收它并清空目录槽位
    ///
    /// 返回是否发生了回收。
    pub(crate) fn release_if_empty(&mut self, pd_index: usize) -> bool {
        let Some(slot) = self.outer_ptes.get_mut(pd_index) else {
            return false;
        };
        match slot {
            Some(dir) if dir.is_empty() => {
                *slot = None;
                log::trace!("page table: release inner table for directory {}", pd_index);
                true
            }
            _ => false,
        }
    }

    /// 已分配的内层表数量
    pub fn nr_directories(&self) -> usize {
        self.outer_ptes.iter().filter(|slot| slot.is_some()).count()
    }

    /// 遍历所有有效表项，产出（虚拟页码，表项）
    pub fn valid_entries(&self) -> impl Iterator<Item = (Vpn, &PageTableEntry)> + '_ {
        let layout = self.layout;
        self.outer_ptes
            .iter()
            .enumerate()
            .filter_map(|(pd_index, slot)| slot.as_deref().map(|dir| (pd_index, dir)))
            .flat_map(move |(pd_index, dir)| {
                dir.valid_entries().map(move |(pte_index, pte)| {
                    let vpn = Vpn::from_index(
                        TableIndex {
                            pd_index,
                            pte_index,
                        },
                        &layout,
                    );
                    (vpn, pte)
                })
            })
    }

    /// 为 fork 复制页表结构并设置写时复制
    ///
    /// 子页表只包含父页表中存在的目录槽位与有效表项；
    /// 每个被复制的表项在父、子两侧都被清除可写位，原始权限保持不变。
    /// 帧引用计数不在此处修改。
    pub(crate) fn clone_for_fork(&mut self) -> PageTable {
        let mut child = PageTable::new(&self.layout);
        let nr_ptes = self.layout.nr_ptes_per_page;

        for (pd_index, slot) in self.outer_ptes.iter_mut().enumerate() {
            let Some(parent_dir) = slot.as_deref_mut() else {
                continue;
            };
            let mut child_dir = PteDirectory::new(nr_ptes);
            for (parent_pte, child_pte) in parent_dir.ptes.iter_mut().zip(child_dir.ptes.iter_mut())
            {
                if !parent_pte.is_valid() {
                    continue;
                }
                parent_pte.set_writable(false);
                *child_pte = *parent_pte;
            }
            child.outer_ptes[pd_index] = Some(Box::new(child_dir));
        }

        child
    }
}

impl fmt::Display for PageTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (vpn, pte) in self.valid_entries() {
            writeln!(f, "{:>4} -> {}", vpn, pte)?;
        }
        Ok(())
    }
}
