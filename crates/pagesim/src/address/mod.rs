//! 地址模块
//!
//! 模拟器不建模页内偏移和页内容，因此只提供页码层面的抽象：
//!
//! - [`UsizeConvert`] - 在页码类型和 usize 之间进行转换
//! - [`Vpn`] - 虚拟页码（Virtual Page Number）
//! - [`Pfn`] - 物理帧号（Page Frame Number）
//! - [`TableIndex`] - 虚拟页码分解得到的（目录索引，表内索引）
pub mod page_num;

pub use page_num::{Pfn, TableIndex, UsizeConvert, Vpn};
