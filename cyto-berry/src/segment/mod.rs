//! 细胞核区域标记. 从二值掩码得到带标签的细胞核区域,
//! 可选用分水岭拆分相互粘连的核.

pub mod distance;
pub mod watershed;

pub use distance::distance_transform_edt;
pub use watershed::{local_maxima, watershed};

use crate::error::PrepError;
use crate::grid::neighbour4_in;
use ndarray::Array2;
use std::collections::VecDeque;

/// 对二值掩码的 4-连通区域做标记.
///
/// 标签按行优先发现顺序从 1 起稠密分配, 背景为 0.
pub fn label_areas(mask: &Array2<bool>) -> Array2<u32> {
    let shape = mask.dim();
    let mut labels = Array2::<u32>::zeros(shape);
    let mut next = 0u32;
    let mut bfs_q = VecDeque::with_capacity(4);

    for (pos, &fg) in mask.indexed_iter() {
        if !fg || labels[pos] != 0 {
            continue;
        }
        next += 1;
        labels[pos] = next;
        bfs_q.push_back(pos);
        while let Some(cur) = bfs_q.pop_front() {
            for nb in neighbour4_in(cur, shape) {
                if mask[nb] && labels[nb] == 0 {
                    labels[nb] = next;
                    bfs_q.push_back(nb);
                }
            }
        }
    }
    labels
}

/// 从细胞核二值掩码得到标签图.
///
/// 处理顺序:
///
/// 1. 若给定 `foreground`, 将其背景位置在 `bmask` 上就地抹除.
///   `bmask` 为本阶段私有, 按值传入, 这是流水线中唯一的就地修改;
/// 2. 若 `fill_holes`, 填充前景内部的封闭背景孔洞;
/// 3. 若 `apply_watershed`, 以距离变换的局部极大连通区域为种子标记,
///   对取负的距离变换做标记控制分水岭, 随后抹除不同盆地之间的接缝像素,
///   使粘连的细胞核在掩码上彼此分离;
/// 4. 最后对 (可能被分水岭修改过的) 二值掩码做 4-连通区域标记并返回.
///
/// # 注意
///
/// 分水岭的种子标记在内部由 [`local_maxima`] 掩码经 [`label_areas`]
/// 标记得出, 再显式传给 [`watershed`]; 跳过种子标记直接洪泛在接口上不可表达.
pub fn label_regions(
    mut bmask: Array2<bool>,
    foreground: Option<&Array2<bool>>,
    apply_watershed: bool,
    fill_holes: bool,
) -> Result<Array2<u32>, PrepError> {
    if let Some(fore) = foreground {
        if fore.dim() != bmask.dim() {
            return Err(PrepError::ShapeMismatch(bmask.dim(), fore.dim()));
        }
        bmask.zip_mut_with(fore, |b, &f| *b &= f);
    }
    if fill_holes {
        bmask = crate::mask::morph::fill_holes(&bmask);
    }
    if apply_watershed && bmask.iter().any(|&b| b) {
        let dist = distance_transform_edt(&bmask);
        let seeds = local_maxima(&dist, &bmask);
        let markers = label_areas(&seeds);
        let basins = watershed(&dist.mapv(|v| -v), &markers, &bmask)?;
        erase_ridges(&mut bmask, &basins);
    }
    Ok(label_areas(&bmask))
}

/// 抹除分水岭接缝: 4-邻域中存在更小正标签的像素被清除,
/// 在相邻盆地之间留出一像素宽的缝隙.
fn erase_ridges(bmask: &mut Array2<bool>, basins: &Array2<u32>) {
    let shape = basins.dim();
    for (pos, &lab) in basins.indexed_iter() {
        if lab == 0 {
            continue;
        }
        if neighbour4_in(pos, shape).any(|nb| basins[nb] != 0 && basins[nb] < lab) {
            bmask[pos] = false;
        }
    }
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
    fn test_label_areas_roundtrip() {
        // 4 个互不相交的单连通斑块 => 恰好 4 个标签, 各自覆盖原斑块.
        let m = mask_of(&[
            "##..#",
            "##...",
            "....#",
            "###.#",
        ]);
        let labels = label_areas(&m);
        assert_eq!(*labels.iter().max().unwrap(), 4);
        // 标签与斑块一一对应.
        for (pos, &fg) in m.indexed_iter() {
            assert_eq!(fg, labels[pos] > 0);
        }
        assert_eq!(labels[(0, 0)], labels[(1, 1)]);
        assert_ne!(labels[(0, 4)], labels[(2, 4)]);
        assert_eq!(labels[(2, 4)], labels[(3, 4)]);
    }

    #[test]
    fn test_label_regions_background_suppression() {
        let m = mask_of(&["###", "###"]);
        let fore = mask_of(&["#..", "#.."]);
        let labels = label_regions(m, Some(&fore), false, false).unwrap();
        assert!(labels[(0, 0)] > 0);
        assert_eq!(labels[(0, 2)], 0);
    }

    #[test]
    fn test_label_regions_fill_holes() {
        let m = mask_of(&[
            "#####",
            "#...#",
            "#####",
        ]);
        let labels = label_regions(m, None, false, true).unwrap();
        assert_eq!(*labels.iter().max().unwrap(), 1);
        assert_eq!(labels[(1, 2)], 1);
    }

    #[test]
    fn test_label_regions_shape_mismatch() {
        let m = Array2::from_elem((2, 2), true);
        let fore = Array2::from_elem((2, 3), true);
        assert!(matches!(
            label_regions(m, Some(&fore), false, false),
            Err(PrepError::ShapeMismatch(..))
        ));
    }

    #[test]
    fn test_label_regions_watershed_splits_touching_nuclei() {
        // 两个 5x5 方块经一条细桥粘连; 不开分水岭时是一个区域,
        // 开分水岭后两个方块中心必须分属不同标签.
        let mut bridged = mask_of(&[
            "...............",
            ".#####...#####.",
            ".#####...#####.",
            ".#####...#####.",
            ".#####...#####.",
            ".#####...#####.",
            "...............",
        ]);
        for j in 6..9 {
            bridged[(3, j)] = true;
        }
        let plain = label_regions(bridged.clone(), None, false, false).unwrap();
        assert_eq!(*plain.iter().max().unwrap(), 1);

        let split = label_regions(bridged, None, true, false).unwrap();
        let left = split[(3, 3)];
        let right = split[(3, 11)];
        assert!(left > 0 && right > 0);
        assert_ne!(left, right);
    }
}
