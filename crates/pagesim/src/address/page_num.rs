//! 页码抽象模块
//!
//! 此模块定义了虚拟页码 [`Vpn`] 与物理帧号 [`Pfn`]，
//! 以及虚拟页码到两级页表索引的固定基数分解。

use core::fmt;

use crate::config::MmLayout;

/// 在类型和 usize 之间进行转换的 Trait
pub trait UsizeConvert: Copy {
    /// 转换为 usize
    fn as_usize(&self) -> usize;

    /// 从 usize 构造
    fn from_usize(value: usize) -> Self;
}

/// `impl_page_num!` 宏
/// ---------------------
/// 为页码新类型实现 `UsizeConvert` 与 `Display`。
macro_rules! impl_page_num {
    ($type:ty) => {
        impl UsizeConvert for $type {
            fn as_usize(&self) -> usize {
                self.0
            }

            fn from_usize(value: usize) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $type {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

/// [Vpn] (Virtual Page Number)
/// ---------------------
/// 虚拟页码，由两级页表翻译。
#[repr(transparent)]
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub struct Vpn(pub usize);
impl_page_num!(Vpn);

/// [Pfn] (Page Frame Number)
/// ---------------------
/// 物理帧号，即帧池中的下标。
#[repr(transparent)]
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub struct Pfn(pub usize);
impl_page_num!(Pfn);

/// 虚拟页码分解后的两级索引
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct TableIndex {
    /// 外层目录索引（高位）
    pub pd_index: usize,
    /// 内层表索引（低位）
    pub pte_index: usize,
}

impl Vpn {
    /// 按布局把虚拟页码分解为（目录索引，表内索引）。
    ///
    /// 目录索引 = vpn ÷ 每表项数，表内索引 = vpn mod 每表项数。
    /// 超出可寻址范围的页码返回 `None`。
    pub fn split(self, layout: &MmLayout) -> Option<TableIndex> {
        if self.0 >= layout.nr_vpns() {
            return None;
        }
        Some(TableIndex {
            pd_index: self.0 / layout.nr_ptes_per_page,
            pte_index: self.0 % layout.nr_ptes_per_page,
        })
    }

    /// [`Vpn::split`] 的逆运算
    pub fn from_index(index: TableIndex, layout: &MmLayout) -> Self {
        Vpn(index.pd_index * layout.nr_ptes_per_page + index.pte_index)
    }
}
