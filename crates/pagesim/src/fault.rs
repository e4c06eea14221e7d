//! 缺页处理与写时复制
//!
//! 翻译失败后，处理器自行重新诊断失败原因（调用方不提供原因码）：
//!
//! 1. 目录槽位为空或表项无效：非法访问，拒绝
//! 2. 表项已允许本次访问：伪缺页，直接成功
//! 3. 原始权限为只读却请求写：保护违例，拒绝
//! 4. 原始权限可写但表项被写保护：写时复制
//!    - 帧只有一条映射：直接恢复可写位
//!    - 帧被共享：分配新帧，本表项改指新帧并恢复可写，旧帧计数减一
//!
//! 处理器只修改当前进程的表项，不触碰其他进程的页表。

use crate::address::{Pfn, Vpn};
use crate::page_table::{AccessMode, PagingError, PagingResult};
use crate::vm::Vm;

/// 缺页被成功处理的方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultResolution {
    /// 表项已允许本次访问，无需改动
    Spurious,
    /// 帧只被当前表项映射，恢复了可写位
    Reused(Pfn),
    /// 帧被共享，当前表项迁移到了新帧
    Copied {
        /// 原共享帧
        from: Pfn,
        /// 新的独占帧
        to: Pfn,
    },
}

/// 缺页处理统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FaultStats {
    /// 分配新帧完成的写时复制次数
    pub cow_copies: usize,
    /// 直接恢复可写位的写时复制次数
    pub cow_reuses: usize,
    /// 伪缺页次数
    pub spurious: usize,
    /// 被拒绝的缺页次数
    pub denied: usize,
}

impl FaultStats {
    /// 总的缺页次数
    pub fn total(&self) -> usize {
        self.cow_copies + self.cow_reuses + self.spurious + self.denied
    }
}

impl Vm {
    /// 处理以 `rw` 方式访问 `vpn` 时发生的缺页。
    ///
    /// # 返回值
    /// `true` 表示重试该访问必然成功；`false` 表示访问被永久拒绝，
    /// 由调用方负责终止进程或报告错误。
    pub fn handle_page_fault(&mut self, vpn: Vpn, rw: AccessMode) -> bool {
        self.resolve_fault(vpn, rw).is_ok()
    }

    /// [`Vm::handle_page_fault`] 的详细版本，返回处理方式或拒绝原因。
    ///
    /// # 错误
    /// - [`PagingError::InvalidAddress`] / [`PagingError::NotMapped`]：非法映射
    /// - [`PagingError::ProtectionViolation`]：写原始只读页
    /// - [`PagingError::OutOfMemory`]：写时复制找不到空闲帧
    pub fn resolve_fault(&mut self, vpn: Vpn, rw: AccessMode) -> PagingResult<FaultResolution> {
        let result = self.do_resolve_fault(vpn, rw);
        match result {
            Ok(FaultResolution::Spurious) => self.stats.spurious += 1,
            Ok(FaultResolution::Reused(_)) => self.stats.cow_reuses += 1,
            Ok(FaultResolution::Copied { .. }) => self.stats.cow_copies += 1,
            Err(err) => {
                self.stats.denied += 1;
                log::debug!(
                    "fault: pid {} vpn {} ({}) denied: {}",
                    self.current_pid(),
                    vpn,
                    rw,
                    err
                );
            }
        }
        result
    }

    fn do_resolve_fault(&mut self, vpn: Vpn, rw: AccessMode) -> PagingResult<FaultResolution> {
        let index = vpn.split(&self.layout).ok_or(PagingError::InvalidAddress)?;

        let pte = self
            .processes
            .at_mut(self.current)
            .page_table_mut()
            .entry_mut(index)
            .ok_or(PagingError::NotMapped)?;
        if !pte.is_valid() {
            return Err(PagingError::NotMapped);
        }
        if pte.permits(rw) {
            return Ok(FaultResolution::Spurious);
        }
        if !pte.private().is_write() {
            return Err(PagingError::ProtectionViolation);
        }

        let pfn = pte.pfn();
        match self.frames.mapcount(pfn) {
            // 有效表项却没有计数，帧池与页表已不一致
            0 => Err(PagingError::NotMapped),
            1 => {
                pte.set_writable(true);
                log::trace!("fault: vpn {} reuses exclusive pfn {}", vpn, pfn);
                Ok(FaultResolution::Reused(pfn))
            }
            _ => {
                let Some(new_pfn) = self.frames.alloc_frame() else {
                    log::warn!("fault: no free frame to copy pfn {} for vpn {}", pfn, vpn);
                    return Err(PagingError::OutOfMemory);
                };
                self.frames.decrement(pfn);
                pte.remap(new_pfn);
                pte.set_writable(true);
                log::trace!("fault: vpn {} copied pfn {} -> pfn {}", vpn, pfn, new_pfn);
                Ok(FaultResolution::Copied {
                    from: pfn,
                    to: new_pfn,
                })
            }
        }
    }
}
