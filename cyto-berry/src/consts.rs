//! 通用常量与默认参数.

/// 标签图中的背景值.
pub const BACKGROUND: u32 = 0;

/// 前景概率的默认切割阈值.
pub const DEFAULT_PCUT: f64 = 0.8;

/// 细胞核面积占前景面积比例的默认预期值.
pub const DEFAULT_FNUC: f64 = 0.3;

/// 局部阈值滑动窗口的默认边长 (像素). 必须为奇数.
pub const DEFAULT_BLOCK_SIZE: usize = 51;

/// 标签清理时默认的边缘缓冲宽度 (像素).
pub const DEFAULT_EDGE_BUFFER: usize = 5;

/// 默认的最小细胞直径 (像素). 面积下限为其平方.
pub const DEFAULT_MIN_CELL_DIM: usize = 5;

/// 默认的最大细胞直径 (像素). 面积上限为其平方.
pub const DEFAULT_MAX_CELL_DIM: usize = 30;

/// 分类器导出文件中固定的数组条目名.
pub const EXPORTED_DATA: &str = "exported_data";

/// 强度直方图的分箱个数.
pub(crate) const HIST_BINS: usize = 100;

/// 标签是否为背景?
#[inline]
pub const fn is_background(label: u32) -> bool {
    label == BACKGROUND
}

/// 标签是否指向某个区域?
#[inline]
pub const fn is_region(label: u32) -> bool {
    label != BACKGROUND
}
