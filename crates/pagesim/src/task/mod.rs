//! 进程与就绪队列
//!
//! 调度策略不在本 crate 的范围内：这里的 [`ReadyQueue`] 只提供
//! 尾部插入、按序遍历与按 pid 线性查找，当前进程由 [`crate::Vm`] 以游标记录。

mod switch;

use alloc::vec::Vec;
use core::fmt;

pub use switch::SwitchOutcome;

use crate::page_table::PageTable;

/// 进程 ID
#[repr(transparent)]
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub struct Pid(pub u32);

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// 进程：pid 与其独占的页表
#[derive(Debug)]
pub struct Process {
    pid: Pid,
    page_table: PageTable,
}

impl Process {
    /// 创建进程
    pub fn new(pid: Pid, page_table: PageTable) -> Self {
        Self { pid, page_table }
    }

    /// 进程 ID
    pub fn pid(&self) -> Pid {
        self.pid
    }

    /// 进程的页表
    pub fn page_table(&self) -> &PageTable {
        &self.page_table
    }

    pub(crate) fn page_table_mut(&mut self) -> &mut PageTable {
        &mut self.page_table
    }
}

/// 就绪队列，按创建顺序保存所有进程
#[derive(Debug, Default)]
pub struct ReadyQueue {
    processes: Vec<Process>,
}

impl ReadyQueue {
    /// 创建空队列
    pub fn new() -> Self {
        Self {
            processes: Vec::new(),
        }
    }

    /// 在队尾插入进程，返回其下标
    pub fn push_back(&mut self, process: Process) -> usize {
        self.processes.push(process);
        self.processes.len() - 1
    }

    /// 线性查找 pid，返回下标
    pub fn position(&self, pid: Pid) -> Option<usize> {
        self.processes.iter().position(|p| p.pid == pid)
    }

    /// 按 pid 查找进程
    pub fn find(&self, pid: Pid) -> Option<&Process> {
        self.processes.iter().find(|p| p.pid == pid)
    }

    /// 按下标获取进程，下标必须有效
    pub(crate) fn at(&self, index: usize) -> &Process {
        &self.processes[index]
    }

    pub(crate) fn at_mut(&mut self, index: usize) -> &mut Process {
        &mut self.processes[index]
    }

    /// 按队列顺序遍历
    pub fn iter(&self) -> impl Iterator<Item = &Process> {
        self.processes.iter()
    }

    /// 进程数量
    pub fn len(&self) -> usize {
        self.processes.len()
    }

    /// 队列是否为空
    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }
}
