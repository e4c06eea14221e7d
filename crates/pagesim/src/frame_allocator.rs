//! 帧池模块
//!
//! 本模块维护每个物理帧的映射计数（mapcount）。
//!
//! ## 分配策略（最小帧号优先）
//!
//! - **mapcounts**：每个物理帧一个计数，表示所有进程中指向该帧的有效页表项数量
//! - 计数为 0 的帧即为空闲帧，这是判断空闲的唯一依据
//!
//! 查找空闲帧时从帧号 0 开始线性扫描，返回第一个计数为 0 的帧，
//! 因此分配顺序是确定的，便于测试复现。
//!
//! 帧内容不被建模：写时复制只复制映射归属，不复制数据。

use alloc::vec;
use alloc::vec::Vec;

use crate::address::{Pfn, UsizeConvert};

/// 物理帧池
#[derive(Debug, Clone)]
pub struct FramePool {
    /// 每个帧的映射计数
    mapcounts: Vec<u32>,
    /// 计数非零的帧数（用于快速统计）
    allocated_count: usize,
}

impl FramePool {
    /// 创建一个全部空闲的帧池
    pub fn new(nr_pageframes: usize) -> Self {
        FramePool {
            mapcounts: vec![0; nr_pageframes],
            allocated_count: 0,
        }
    }

    /// 返回帧号最小的空闲帧，全部占用时返回 `None`
    pub fn find_free_frame(&self) -> Option<Pfn> {
        self.mapcounts
            .iter()
            .position(|&count| count == 0)
            .map(Pfn::from_usize)
    }

    /// 查找空闲帧并记录第一条映射
    pub fn alloc_frame(&mut self) -> Option<Pfn> {
        let pfn = self.find_free_frame()?;
        self.increment(pfn);
        Some(pfn)
    }

    /// 映射计数加一
    pub fn increment(&mut self, pfn: Pfn) {
        let count = &mut self.mapcounts[pfn.as_usize()];
        if *count == 0 {
            self.allocated_count += 1;
        }
        *count += 1;
    }

    /// 映射计数减一，返回减后的计数
    ///
    /// 计数已为 0 时保持不变，不会下溢。
    pub fn decrement(&mut self, pfn: Pfn) -> u32 {
        let count = &mut self.mapcounts[pfn.as_usize()];
        debug_assert!(*count > 0, "decrement: frame {} has no mappings", pfn);
        if *count == 0 {
            return 0;
        }
        *count -= 1;
        if *count == 0 {
            self.allocated_count -= 1;
        }
        *count
    }

    /// 获取帧的映射计数；帧号越界时返回 0
    pub fn mapcount(&self, pfn: Pfn) -> u32 {
        self.mapcounts.get(pfn.as_usize()).copied().unwrap_or(0)
    }

    /// 帧是否空闲
    pub fn is_free(&self, pfn: Pfn) -> bool {
        self.mapcount(pfn) == 0
    }

    /// 所有帧的映射计数
    pub fn mapcounts(&self) -> &[u32] {
        &self.mapcounts
    }

    /// 获取总的物理帧数
    pub fn total_frames(&self) -> usize {
        self.mapcounts.len()
    }

    /// 获取已分配的帧数
    pub fn allocated_frames(&self) -> usize {
        self.allocated_count
    }

    /// 获取空闲的帧数
    pub fn free_frames(&self) -> usize {
        self.total_frames() - self.allocated_count
    }

    /// 获取帧池的当前状态
    /// # 返回值
    /// - 总帧数
    /// - 已分配的帧数
    /// - 空闲的帧数
    pub fn get_stats(&self) -> (usize, usize, usize) {
        (
            self.total_frames(),
            self.allocated_count,
            self.free_frames(),
        )
    }
}
