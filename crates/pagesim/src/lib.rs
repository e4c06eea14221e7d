//! 虚拟内存子系统模拟器
//!
//! 在用户态数据结构中模拟两级页表、共享物理帧池、按需分配、
//! 共享帧的引用计数，以及写时复制（COW）缺页处理与进程 fork。
//!
//! # 组成
//!
//! - [`frame_allocator`]: 帧池，每个物理帧一个映射计数
//! - [`page_table`]: 页表项与两级页表结构
//! - [`Vm`]: 执行上下文，提供分配/释放、翻译、缺页处理、切换/fork
//!
//! # 执行模型
//!
//! 单线程、协作式：同一时刻只有一个模拟进程在运行，所有操作同步执行到完成。
//! 因此帧池与页表不需要加锁，可变性由 `&mut Vm` 保证。
//!
//! 本 crate 不打印任何内容，只通过 `log` 门面记录事件，
//! 由调用方决定是否安装日志后端。

#![no_std]

extern crate alloc;

mod config;
mod fault;
mod vm;

pub mod address;
pub mod frame_allocator;
pub mod page_table;
pub mod task;

#[cfg(test)]
mod tests;

pub use config::{
    DefaultMmConfig, MAX_PAGEFRAMES, MAX_PTES_PER_PAGE, MmConfig, MmLayout, NR_PAGEFRAMES,
    NR_PTES_PER_PAGE,
};
pub use fault::{FaultResolution, FaultStats};
pub use vm::{INIT_PID, MapcountMismatch, Vm};

// Re-export 常用类型
pub use address::{Pfn, TableIndex, UsizeConvert, Vpn};
pub use frame_allocator::FramePool;
pub use page_table::{
    AccessMode, PageTable, PageTableEntry, PagingError, PagingResult, PteDirectory,
};
pub use task::{Pid, Process, ReadyQueue, SwitchOutcome};
