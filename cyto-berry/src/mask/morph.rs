//! 二值掩码的面积形态学操作.

use crate::grid::neighbour4_in;
use crate::{Area2d, Areas2d};
use ndarray::Array2;
use std::collections::VecDeque;

/// 按 4-相邻规则收集掩码中所有值为 `value` 的连通区域.
/// 区域按行优先发现顺序排列.
pub(crate) fn areas(mask: &Array2<bool>, value: bool) -> Areas2d {
    let shape = mask.dim();
    let mut visited = Array2::from_elem(shape, false);
    let mut ans = Areas2d::with_capacity(1);
    let mut bfs_q = VecDeque::with_capacity(4);

    for (pos, &pix) in mask.indexed_iter() {
        if pix != value || visited[pos] {
            continue;
        }
        let mut this_area = Area2d::with_capacity(1);
        visited[pos] = true;
        bfs_q.push_back(pos);
        while let Some(cur) = bfs_q.pop_front() {
            this_area.push(cur);
            for nb in neighbour4_in(cur, shape) {
                if mask[nb] == value && !visited[nb] {
                    visited[nb] = true;
                    bfs_q.push_back(nb);
                }
            }
        }
        ans.push(this_area);
    }
    ans
}

/// 面积开运算: 删除面积严格小于 `area_threshold` 的前景连通区域.
pub fn area_opening(mask: &Array2<bool>, area_threshold: usize) -> Array2<bool> {
    let mut out = mask.clone();
    for area in areas(mask, true) {
        if area.len() < area_threshold {
            for pos in area {
                out[pos] = false;
            }
        }
    }
    out
}

/// 面积闭运算: 填充面积严格小于 `area_threshold` 的背景连通区域.
pub fn area_closing(mask: &Array2<bool>, area_threshold: usize) -> Array2<bool> {
    let mut out = mask.clone();
    for area in areas(mask, false) {
        if area.len() < area_threshold {
            for pos in area {
                out[pos] = true;
            }
        }
    }
    out
}

/// 填充被前景完全包围的背景孔洞 (即未与图像边缘连通的背景区域).
pub fn fill_holes(mask: &Array2<bool>) -> Array2<bool> {
    let shape = mask.dim();
    let mut out = mask.clone();
    for area in areas(mask, false) {
        let sealed = area
            .iter()
            .all(|&(h, w)| h != 0 && w != 0 && h + 1 != shape.0 && w + 1 != shape.1);
        if sealed {
            for pos in area {
                out[pos] = true;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    /// 以 '#' 为前景构造掩码.
    fn mask_of(rows: &[&str]) -> Array2<bool> {
        let h = rows.len();
        let w = rows[0].len();
        Array2::from_shape_fn((h, w), |(i, j)| rows[i].as_bytes()[j] == b'#')
    }

    #[test]
    fn test_areas_count() {
        let m = mask_of(&[
            "##..",
            "....",
            "..##",
        ]);
        assert_eq!(areas(&m, true).len(), 2);
        assert_eq!(areas(&m, false).len(), 1);
    }

    #[test]
    fn test_area_opening_removes_specks() {
        let m = mask_of(&[
            "#....",
            ".....",
            "..###",
            "..###",
        ]);
        let opened = area_opening(&m, 3);
        assert!(!opened[(0, 0)]);
        assert_eq!(opened.iter().filter(|&&b| b).count(), 6);
    }

    #[test]
    fn test_area_closing_fills_small_background() {
        let m = mask_of(&[
            "###",
            "#.#",
            "###",
        ]);
        let closed = area_closing(&m, 2);
        assert!(closed[(1, 1)]);
        // 阈值不够大时不填.
        assert!(!area_closing(&m, 1)[(1, 1)]);
    }

    #[test]
    fn test_fill_holes() {
        let m = mask_of(&[
            "####.",
            "#..#.",
            "####.",
        ]);
        let filled = fill_holes(&m);
        assert!(filled[(1, 1)] && filled[(1, 2)]);
        // 与边缘连通的背景不是孔洞.
        assert!(!filled[(0, 4)]);
    }
}
