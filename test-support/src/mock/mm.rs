//! 内存管理相关的 Mock 配置
//!
//! 注意：这里不直接依赖 `pagesim` crate（避免循环依赖）。
//! `pagesim` 在 `cfg(test)` 下为这些类型实现其 trait（`MmConfig`）。

/// Mock 的内存管理配置
///
/// 默认规模很小（8 个帧，每张表 4 项，共 16 个虚拟页），
/// 便于在测试中耗尽帧池、填满内层表。
pub struct MockMmConfig {
    pub nr_pageframes: usize,
    pub nr_ptes_per_page: usize,
}

impl MockMmConfig {
    pub const fn new() -> Self {
        Self {
            nr_pageframes: 8,
            nr_ptes_per_page: 4,
        }
    }

    /// 指定帧数量，表宽度保持默认
    pub const fn with_frames(nr_pageframes: usize) -> Self {
        Self {
            nr_pageframes,
            nr_ptes_per_page: 4,
        }
    }

    pub fn nr_pageframes(&self) -> usize {
        self.nr_pageframes
    }

    pub fn nr_ptes_per_page(&self) -> usize {
        self.nr_ptes_per_page
    }
}

impl Default for MockMmConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// 全局 Mock 实例
pub static MOCK_MM_CONFIG: MockMmConfig = MockMmConfig::new();
