//! 内存管理配置 trait 定义
//!
//! 模拟器的规模（物理帧数量、每级页表的表项数量）通过 [`MmConfig`] 提供。
//! 配置在创建 [`crate::Vm`] 时被读取一次并固化为 [`MmLayout`]，
//! 之后的所有操作都只依赖该布局，不存在全局注册的配置。

/// 默认物理帧数量
pub const NR_PAGEFRAMES: usize = 128;

/// 默认每张页表（外层目录与内层表）的表项数量
pub const NR_PTES_PER_PAGE: usize = 16;

/// 物理帧数量上限
pub const MAX_PAGEFRAMES: usize = 1 << 20;

/// 每张页表表项数量上限，其平方（可寻址虚拟页数）不会溢出
pub const MAX_PTES_PER_PAGE: usize = 1 << 12;

/// 内存管理配置常量
///
/// 调用方（驱动程序、测试）实现此 trait，并在创建 [`crate::Vm`] 时传入。
pub trait MmConfig {
    /// 物理帧数量
    fn nr_pageframes(&self) -> usize;

    /// 每张页表的表项数量
    ///
    /// 外层目录与内层表使用相同的宽度，因此可寻址的虚拟页数为其平方。
    fn nr_ptes_per_page(&self) -> usize;
}

/// 默认配置：128 个物理帧，每张表 16 项
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultMmConfig;

impl MmConfig for DefaultMmConfig {
    fn nr_pageframes(&self) -> usize {
        NR_PAGEFRAMES
    }

    fn nr_ptes_per_page(&self) -> usize {
        NR_PTES_PER_PAGE
    }
}

/// 由 [`MmConfig`] 固化得到的内存布局
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MmLayout {
    /// 物理帧数量
    pub nr_pageframes: usize,
    /// 每张页表的表项数量
    pub nr_ptes_per_page: usize,
}

impl MmLayout {
    /// 从配置读取布局
    ///
    /// 表宽度被限制在 `1..=MAX_PTES_PER_PAGE`，帧数量不超过 [`MAX_PAGEFRAMES`]。
    pub fn from_config(config: &dyn MmConfig) -> Self {
        let nr_pageframes = config.nr_pageframes();
        let nr_ptes_per_page = config.nr_ptes_per_page();
        let layout = Self {
            nr_pageframes: nr_pageframes.min(MAX_PAGEFRAMES),
            nr_ptes_per_page: nr_ptes_per_page.clamp(1, MAX_PTES_PER_PAGE),
        };
        if layout.nr_pageframes != nr_pageframes || layout.nr_ptes_per_page != nr_ptes_per_page {
            log::warn!(
                "config: layout {} frames / {} ptes clamped to {} / {}",
                nr_pageframes,
                nr_ptes_per_page,
                layout.nr_pageframes,
                layout.nr_ptes_per_page
            );
        }
        layout
    }

    /// 可寻址的虚拟页数量
    ///
    /// 直接构造的布局可能过宽，此时饱和到 `usize::MAX`。
    #[inline]
    pub fn nr_vpns(&self) -> usize {
        self.nr_ptes_per_page
            .checked_mul(self.nr_ptes_per_page)
            .unwrap_or(usize::MAX)
    }
}

impl Default for MmLayout {
    fn default() -> Self {
        Self::from_config(&DefaultMmConfig)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Vpn;

    struct HugeConfig;

    impl MmConfig for HugeConfig {
        fn nr_pageframes(&self) -> usize {
            usize::MAX
        }

        fn nr_ptes_per_page(&self) -> usize {
            usize::MAX / 2
        }
    }

    #[test]
    fn test_from_config_clamps_oversized_layout() {
        let layout = MmLayout::from_config(&HugeConfig);
        assert_eq!(layout.nr_pageframes, MAX_PAGEFRAMES);
        assert_eq!(layout.nr_ptes_per_page, MAX_PTES_PER_PAGE);
        assert_eq!(layout.nr_vpns(), MAX_PTES_PER_PAGE * MAX_PTES_PER_PAGE);
    }

    #[test]
    fn test_wide_layout_does_not_overflow() {
        let layout = MmLayout {
            nr_pageframes: 1,
            nr_ptes_per_page: usize::MAX / 2,
        };
        assert_eq!(layout.nr_vpns(), usize::MAX);

        let idx = Vpn(5).split(&layout).unwrap();
        assert_eq!(idx.pd_index, 0);
        assert_eq!(idx.pte_index, 5);
    }

    #[test]
    fn test_zero_width_becomes_one() {
        let layout = MmLayout::from_config(&ZeroWidth);
        assert_eq!(layout.nr_ptes_per_page, 1);
        assert_eq!(layout.nr_vpns(), 1);
    }

    struct ZeroWidth;

    impl MmConfig for ZeroWidth {
        fn nr_pageframes(&self) -> usize {
            2
        }

        fn nr_ptes_per_page(&self) -> usize {
            0
        }
    }
}
