//! 页表模块
//!
//! 本模块提供两级页表的数据结构：页表项 [`PageTableEntry`]、
//! 内层表 [`PteDirectory`] 与外层目录 [`PageTable`]，以及分页操作的错误类型。
mod page_table_entry;
mod table;

use core::fmt;

pub use page_table_entry::*;
pub use table::*;

/// 分页操作中可能发生的错误
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagingError {
    /// 帧池中没有空闲帧
    OutOfMemory,
    /// 以写方式访问一个原始权限为只读的页
    ProtectionViolation,
    /// 虚拟页没有有效的目录/表项链
    NotMapped,
    /// 虚拟页已有有效映射
    AlreadyMapped,
    /// 释放一个引用计数已为 0 的帧
    DegenerateFree,
    /// 虚拟页码超出可寻址范围
    InvalidAddress,
}

impl fmt::Display for PagingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            PagingError::OutOfMemory => "out of page frames",
            PagingError::ProtectionViolation => "write to a read-only page",
            PagingError::NotMapped => "page is not mapped",
            PagingError::AlreadyMapped => "page is already mapped",
            PagingError::DegenerateFree => "frame has no remaining mappings",
            PagingError::InvalidAddress => "virtual page number out of range",
        };
        f.write_str(msg)
    }
}

impl core::error::Error for PagingError {}

/// 分页操作的结果类型
pub type PagingResult<T> = Result<T, PagingError>;
