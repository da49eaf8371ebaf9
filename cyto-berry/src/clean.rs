//! 标签图清理: 删除边缘区域与尺寸异常区域, 并做稠密重编号.

use crate::error::PrepError;
use ndarray::Array2;

/// 清理细胞核标签图.
///
/// 1. 求全部正标签像素的紧致包围盒; 全背景输入返回
///   [`PrepError::EmptyMask`];
/// 2. 凡在图像边缘 `edge_buffer` 像素范围内出现过的区域整体清零
///   (不只清除其边缘像素);
/// 3. 按原标签序 (1 到最大标签) 逐区域统计面积, 仅保留面积严格介于
///   `min_cell_dim²` 与 `max_cell_dim²` 之间的区域, 保留者从 1 起
///   重新稠密编号. `verbose` 时为每个被尺寸规则删除的区域记录一条日志.
///
/// # 注意
///
/// 1. 清理不保留标签身份. 依赖标签键的派生数据 (如质心)
///   必须在清理后重新计算.
/// 2. 对自身输出再次清理是恒等操作: 幸存区域远离边缘且尺寸合规.
pub fn clean_labeled(
    labels: &Array2<u32>,
    edge_buffer: usize,
    min_cell_dim: usize,
    max_cell_dim: usize,
    verbose: bool,
) -> Result<Array2<u32>, PrepError> {
    let min_size = min_cell_dim * min_cell_dim;
    let max_size = max_cell_dim * max_cell_dim;
    let (h, w) = labels.dim();

    if !labels.iter().any(|&lab| lab > 0) {
        return Err(PrepError::EmptyMask);
    }
    let max_label = *labels.iter().max().unwrap() as usize;

    // 触边区域: 与图像边缘的距离不超过 edge_buffer 的标签.
    let mut edge = vec![false; max_label + 1];
    for ((i, j), &lab) in labels.indexed_iter() {
        if lab == 0 {
            continue;
        }
        let near = i <= edge_buffer
            || j <= edge_buffer
            || i + edge_buffer + 1 >= h
            || j + edge_buffer + 1 >= w;
        if near {
            edge[lab as usize] = true;
        }
    }

    // 触边区域已整体清零, 不参与面积统计.
    let mut area = vec![0usize; max_label + 1];
    for &lab in labels.iter() {
        if lab > 0 && !edge[lab as usize] {
            area[lab as usize] += 1;
        }
    }

    // 尺寸过滤与稠密重编号.
    let mut renum = vec![0u32; max_label + 1];
    let mut next = 0u32;
    for (ic, &npix) in area.iter().enumerate().skip(1) {
        if npix == 0 {
            continue;
        }
        if npix > min_size && npix < max_size {
            next += 1;
            renum[ic] = next;
        } else if verbose {
            if npix <= min_size {
                log::info!("cell {ic} too small: {npix}");
            } else {
                log::info!("cell {ic} too big: {npix}");
            }
        }
    }

    Ok(labels.mapv(|lab| renum[lab as usize]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    /// 在 `canvas` 上画一个矩形区域.
    fn stamp(canvas: &mut Array2<u32>, top: usize, left: usize, h: usize, w: usize, lab: u32) {
        for i in top..top + h {
            for j in left..left + w {
                canvas[(i, j)] = lab;
            }
        }
    }

    #[test]
    fn test_interior_region_survives_as_one() {
        let mut labels = Array2::<u32>::zeros((32, 32));
        stamp(&mut labels, 10, 10, 4, 4, 7); // 面积 16, 介于 3²=9 与 10²=100.
        let cleaned = clean_labeled(&labels, 2, 3, 10, false).unwrap();
        assert_eq!(*cleaned.iter().max().unwrap(), 1);
        assert_eq!(cleaned[(11, 11)], 1);
        assert_eq!(cleaned.iter().filter(|&&v| v > 0).count(), 16);
    }

    #[test]
    fn test_edge_region_fully_removed() {
        let mut labels = Array2::<u32>::zeros((32, 32));
        stamp(&mut labels, 1, 1, 4, 4, 1); // 触及边缘缓冲区.
        stamp(&mut labels, 14, 14, 4, 4, 2);
        let cleaned = clean_labeled(&labels, 2, 3, 10, false).unwrap();
        // 区域 1 整体消失, 区域 2 重编号为 1.
        assert!(cleaned.indexed_iter().all(|((i, _), &v)| v == 0 || i >= 14));
        assert_eq!(cleaned[(15, 15)], 1);
    }

    #[test]
    fn test_size_violations_removed() {
        let mut labels = Array2::<u32>::zeros((64, 64));
        stamp(&mut labels, 10, 10, 2, 2, 1); // 面积 4 <= 3².
        stamp(&mut labels, 20, 20, 5, 5, 2); // 面积 25, 合规.
        stamp(&mut labels, 40, 10, 12, 12, 3); // 面积 144 >= 10².
        let cleaned = clean_labeled(&labels, 2, 3, 10, true).unwrap();
        assert_eq!(cleaned[(11, 11)], 0);
        assert_eq!(cleaned[(22, 22)], 1);
        assert_eq!(cleaned[(45, 15)], 0);
    }

    #[test]
    fn test_boundary_areas_are_strict() {
        // 面积恰为下限/上限的区域同样被删除.
        let mut labels = Array2::<u32>::zeros((64, 64));
        stamp(&mut labels, 10, 10, 3, 3, 1); // 面积 9 == 3².
        stamp(&mut labels, 30, 30, 10, 10, 2); // 面积 100 == 10².
        assert!(matches!(
            clean_labeled(&labels, 2, 3, 10, false),
            Ok(cleaned) if cleaned.iter().all(|&v| v == 0)
        ));
    }

    #[test]
    fn test_empty_mask_rejected() {
        let labels = Array2::<u32>::zeros((8, 8));
        assert_eq!(
            clean_labeled(&labels, 2, 3, 10, false),
            Err(PrepError::EmptyMask)
        );
    }

    #[test]
    fn test_idempotent_on_own_output() {
        let mut labels = Array2::<u32>::zeros((40, 40));
        stamp(&mut labels, 3, 3, 4, 4, 3); // 触边, 将被删除.
        stamp(&mut labels, 12, 12, 4, 4, 5);
        stamp(&mut labels, 24, 20, 6, 6, 9);
        let once = clean_labeled(&labels, 4, 3, 10, false).unwrap();
        let twice = clean_labeled(&once, 4, 3, 10, false).unwrap();
        assert_eq!(once, twice);
    }
}
