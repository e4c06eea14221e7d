//! 页表项
//!
//! 页表项记录有效位、可写位、映射的物理帧号，以及分配时的原始权限
//! （`private`）。写时复制通过清除可写位、保留原始权限实现：
//! 原始权限在分配后不再改变。

use bitflags::bitflags;
use core::fmt;

use crate::address::Pfn;

bitflags! {
    /// 访问模式 / 原始权限
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AccessMode: u8 {
        /// 读
        const READ = 0x01;
        /// 写
        const WRITE = 0x02;
        /// 读写
        const RW = Self::READ.bits() | Self::WRITE.bits();
    }
}

impl AccessMode {
    /// 是否包含写权限
    #[inline]
    pub fn is_write(self) -> bool {
        self.contains(AccessMode::WRITE)
    }
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_write() {
            f.write_str("rw")
        } else if self.contains(AccessMode::READ) {
            f.write_str("r")
        } else {
            f.write_str("-")
        }
    }
}

bitflags! {
    /// 页表项状态位
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub(crate) struct PteFlags: u8 {
        /// 有效
        const VALID = 1 << 0;
        /// 当前可写
        const WRITABLE = 1 << 1;
    }
}

/// 页表项
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageTableEntry {
    flags: PteFlags,
    pfn: Pfn,
    /// 分配时请求的权限
    private: AccessMode,
}

impl PageTableEntry {
    /// 空（无效）页表项：valid=false, writable=false, pfn=0, private 清空
    pub const fn empty() -> Self {
        Self {
            flags: PteFlags::empty(),
            pfn: Pfn(0),
            private: AccessMode::empty(),
        }
    }

    /// 是否有效
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.flags.contains(PteFlags::VALID)
    }

    /// 当前是否可写
    #[inline]
    pub fn is_writable(&self) -> bool {
        self.flags.contains(PteFlags::WRITABLE)
    }

    /// 映射的物理帧号
    #[inline]
    pub fn pfn(&self) -> Pfn {
        self.pfn
    }

    /// 原始权限
    #[inline]
    pub fn private(&self) -> AccessMode {
        self.private
    }

    /// 该表项是否已允许以 `rw` 方式访问
    pub fn permits(&self, rw: AccessMode) -> bool {
        self.is_valid() && (!rw.is_write() || self.is_writable())
    }

    /// 用新分配的帧填充表项
    pub(crate) fn populate(&mut self, pfn: Pfn, rw: AccessMode) {
        self.flags = PteFlags::VALID;
        self.flags.set(PteFlags::WRITABLE, rw.is_write());
        self.pfn = pfn;
        self.private = rw;
    }

    /// 清空表项
    pub(crate) fn clear(&mut self) {
        *self = Self::empty();
    }

    pub(crate) fn set_writable(&mut self, writable: bool) {
        self.flags.set(PteFlags::WRITABLE, writable);
    }

    /// 把表项指向新的帧，原始权限不变
    pub(crate) fn remap(&mut self, pfn: Pfn) {
        self.pfn = pfn;
    }
}

impl Default for PageTableEntry {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Display for PageTableEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_valid() {
            return f.write_str("invalid");
        }
        write!(
            f,
            "pfn {} {} ({})",
            self.pfn,
            if self.is_writable() { "rw" } else { "r" },
            self.private
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_populate_read_only() {
        let mut pte = PageTableEntry::empty();
        pte.populate(Pfn(3), AccessMode::READ);
        assert!(pte.is_valid());
        assert!(!pte.is_writable());
        assert_eq!(pte.pfn(), Pfn(3));
        assert_eq!(pte.private(), AccessMode::READ);
    }

    #[test]
    fn test_populate_read_write() {
        let mut pte = PageTableEntry::empty();
        pte.populate(Pfn(5), AccessMode::RW);
        assert!(pte.is_writable());
        assert!(pte.permits(AccessMode::WRITE));
    }

    #[test]
    fn test_clear_resets_all_fields() {
        let mut pte = PageTableEntry::empty();
        pte.populate(Pfn(7), AccessMode::RW);
        pte.clear();
        assert_eq!(pte, PageTableEntry::empty());
        assert_eq!(pte.pfn(), Pfn(0));
        assert!(pte.private().is_empty());
    }

    #[test]
    fn test_write_protect_keeps_private() {
        let mut pte = PageTableEntry::empty();
        pte.populate(Pfn(1), AccessMode::RW);
        pte.set_writable(false);
        assert!(!pte.permits(AccessMode::WRITE));
        assert!(pte.permits(AccessMode::READ));
        assert_eq!(pte.private(), AccessMode::RW);
    }
}
