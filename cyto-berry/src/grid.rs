//! 二维网格索引工具.

use crate::Idx2d;

/// 获得 `(h, w)` 的 4-邻居索引. 不检查越界.
#[inline]
pub(crate) fn neighbour4((h, w): Idx2d) -> [Idx2d; 4] {
    [
        (h.wrapping_sub(1), w),
        (h.saturating_add(1), w),
        (h, w.wrapping_sub(1)),
        (h, w.saturating_add(1)),
    ]
}

/// 获得 `(h, w)` 在形状 `shape` 内的 4-邻居索引. 保证返回的索引都不越界.
#[inline]
pub(crate) fn neighbour4_in(pos: Idx2d, shape: Idx2d) -> impl Iterator<Item = Idx2d> {
    neighbour4(pos)
        .into_iter()
        .filter(move |&(h, w)| h < shape.0 && w < shape.1)
}
