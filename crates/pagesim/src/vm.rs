//! 执行上下文
//!
//! [`Vm`] 把帧池、就绪队列和"当前进程"收拢到一个显式传递的值中，
//! 所有操作都以 `&mut Vm` 为接收者，不存在全局可变状态。
//!
//! 页表基址寄存器（ptbr）不单独存储，而是由当前进程游标导出，
//! 因此二者不可能分叉。

use core::fmt;

use crate::address::{Pfn, UsizeConvert, Vpn};
use crate::config::{MmConfig, MmLayout};
use crate::fault::FaultStats;
use crate::frame_allocator::FramePool;
use crate::page_table::{AccessMode, PageTable, PageTableEntry, PagingError, PagingResult};
use crate::task::{Pid, Process, ReadyQueue};
use alloc::vec;

/// 初始进程的 pid
pub const INIT_PID: Pid = Pid(0);

/// 模拟的虚拟内存子系统
#[derive(Debug)]
pub struct Vm {
    pub(crate) layout: MmLayout,
    pub(crate) frames: FramePool,
    pub(crate) processes: ReadyQueue,
    /// 当前进程在就绪队列中的下标
    pub(crate) current: usize,
    pub(crate) stats: FaultStats,
}

impl Vm {
    /// 按配置创建子系统，并以 [`INIT_PID`] 作为当前进程
    pub fn new(config: &dyn MmConfig) -> Self {
        let layout = MmLayout::from_config(config);
        let mut processes = ReadyQueue::new();
        let current = processes.push_back(Process::new(INIT_PID, PageTable::new(&layout)));
        Self {
            layout,
            frames: FramePool::new(layout.nr_pageframes),
            processes,
            current,
            stats: FaultStats::default(),
        }
    }

    /// 内存布局
    pub fn layout(&self) -> &MmLayout {
        &self.layout
    }

    /// 帧池
    pub fn frames(&self) -> &FramePool {
        &self.frames
    }

    /// 帧的映射计数
    pub fn mapcount(&self, pfn: Pfn) -> u32 {
        self.frames.mapcount(pfn)
    }

    /// 就绪队列
    pub fn processes(&self) -> &ReadyQueue {
        &self.processes
    }

    /// 当前进程
    pub fn current(&self) -> &Process {
        self.processes.at(self.current)
    }

    /// 当前进程的 pid
    pub fn current_pid(&self) -> Pid {
        self.current().pid()
    }

    /// 页表基址寄存器指向的页表，恒为当前进程的页表
    pub fn ptbr(&self) -> &PageTable {
        self.current().page_table()
    }

    /// 缺页处理统计
    pub fn stats(&self) -> &FaultStats {
        &self.stats
    }

    pub(crate) fn current_process_mut(&mut self) -> &mut Process {
        self.processes.at_mut(self.current)
    }

    pub(crate) fn set_current(&mut self, index: usize) {
        self.current = index;
    }

    /// 当前进程中 `vpn` 的页表项（目录槽位为空时返回 `None`）
    pub fn pte(&self, vpn: Vpn) -> Option<PageTableEntry> {
        let index = vpn.split(&self.layout)?;
        self.ptbr().entry(index).copied()
    }

    /// 指定进程中 `vpn` 的页表项
    pub fn pte_of(&self, pid: Pid, vpn: Vpn) -> Option<PageTableEntry> {
        let index = vpn.split(&self.layout)?;
        self.processes
            .find(pid)?
            .page_table()
            .entry(index)
            .copied()
    }

    /// 为当前进程分配一个空闲帧并映射到 `vpn`。
    ///
    /// 总是选择帧号最小的空闲帧。以 [`AccessMode::WRITE`] 分配的页可写，
    /// 只读分配的页之后不允许写访问。
    ///
    /// # 错误
    /// - [`PagingError::InvalidAddress`]：`vpn` 超出可寻址范围
    /// - [`PagingError::AlreadyMapped`]：`vpn` 已有有效映射
    /// - [`PagingError::OutOfMemory`]：所有帧都已被占用
    pub fn allocate_page(&mut self, vpn: Vpn, rw: AccessMode) -> PagingResult<Pfn> {
        let index = vpn.split(&self.layout).ok_or(PagingError::InvalidAddress)?;

        let table = self.processes.at_mut(self.current).page_table_mut();
        if table.entry(index).is_some_and(PageTableEntry::is_valid) {
            return Err(PagingError::AlreadyMapped);
        }

        let Some(pfn) = self.frames.find_free_frame() else {
            log::warn!("alloc: no free frame for vpn {}", vpn);
            return Err(PagingError::OutOfMemory);
        };

        let dir = table.directory_or_create(index.pd_index);
        self.frames.increment(pfn);
        if let Some(pte) = dir.entry_mut(index.pte_index) {
            pte.populate(pfn, rw);
        }
        log::trace!("alloc: vpn {} -> pfn {} ({})", vpn, pfn, rw);
        Ok(pfn)
    }

    /// 从当前进程释放 `vpn` 的映射。
    ///
    /// 帧计数已为 0、页未映射或 `vpn` 越界时静默返回。
    pub fn free_page(&mut self, vpn: Vpn) {
        if let Err(err) = self.try_free_page(vpn) {
            log::debug!("free: vpn {} ignored: {}", vpn, err);
        }
    }

    /// [`Vm::free_page`] 的严格版本，返回被解除映射的帧号。
    ///
    /// 先减少帧计数再清空页表项；若所在内层表因此全部失效，
    /// 则回收该内层表并清空目录槽位。
    ///
    /// # 错误
    /// - [`PagingError::InvalidAddress`]：`vpn` 超出可寻址范围
    /// - [`PagingError::NotMapped`]：目录槽位为空或页表项无效
    /// - [`PagingError::DegenerateFree`]：页表项指向的帧计数已为 0
    pub fn try_free_page(&mut self, vpn: Vpn) -> PagingResult<Pfn> {
        let index = vpn.split(&self.layout).ok_or(PagingError::InvalidAddress)?;

        let table = self.processes.at_mut(self.current).page_table_mut();
        let pte = table.entry_mut(index).ok_or(PagingError::NotMapped)?;
        if !pte.is_valid() {
            return Err(PagingError::NotMapped);
        }

        let pfn = pte.pfn();
        if self.frames.mapcount(pfn) == 0 {
            return Err(PagingError::DegenerateFree);
        }

        let remaining = self.frames.decrement(pfn);
        pte.clear();
        table.release_if_empty(index.pd_index);
        log::trace!(
            "free: vpn {} unmapped from pfn {} ({} mapping(s) left)",
            vpn,
            pfn,
            remaining
        );
        Ok(pfn)
    }

    /// 使用页表基址寄存器翻译 `vpn`。
    ///
    /// 表项有效且（写访问时）可写才成功。
    pub fn translate(&self, vpn: Vpn, rw: AccessMode) -> Option<Pfn> {
        self.pte(vpn)
            .filter(|pte| pte.permits(rw))
            .map(|pte| pte.pfn())
    }

    /// 以 `rw` 方式访问 `vpn`：翻译失败时调用缺页处理并重试一次。
    pub fn access(&mut self, vpn: Vpn, rw: AccessMode) -> PagingResult<Pfn> {
        if let Some(pfn) = self.translate(vpn, rw) {
            return Ok(pfn);
        }
        self.resolve_fault(vpn, rw)?;
        self.translate(vpn, rw).ok_or(PagingError::NotMapped)
    }

    /// 根据所有进程的页表重新统计映射数，并与帧池记录比较。
    ///
    /// 返回第一个不一致的帧。
    pub fn verify_mapcounts(&self) -> Result<(), MapcountMismatch> {
        let mut counted = vec![0u32; self.frames.total_frames()];
        for process in self.processes.iter() {
            for (_, pte) in process.page_table().valid_entries() {
                if let Some(count) = counted.get_mut(pte.pfn().as_usize()) {
                    *count += 1;
                }
            }
        }

        for (pfn, (&recorded, &mapped)) in self.frames.mapcounts().iter().zip(&counted).enumerate() {
            if recorded != mapped {
                return Err(MapcountMismatch {
                    pfn: Pfn(pfn),
                    recorded,
                    mapped,
                });
            }
        }
        Ok(())
    }
}

/// 帧池计数与页表实际映射数不一致
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapcountMismatch {
    /// 帧号
    pub pfn: Pfn,
    /// 帧池记录的计数
    pub recorded: u32,
    /// 页表中指向该帧的有效表项数
    pub mapped: u32,
}

impl fmt::Display for MapcountMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "pfn {}: mapcount {} but {} valid mapping(s)",
            self.pfn, self.recorded, self.mapped
        )
    }
}
