//! 局部极大种子与标记控制分水岭.

use crate::error::PrepError;
use crate::grid::neighbour4_in;
use crate::Idx2d;
use binary_heap_plus::BinaryHeap;
use itertools::iproduct;
use ndarray::Array2;

/// 在 3×3 邻域内寻找受掩码限制的局部极大点.
///
/// 像素入选当且仅当其位于掩码内, 值为正, 且不小于 3×3 邻域内的一切值.
/// 等值平台上的所有像素都会入选, 由调用方对结果做连通域标记归并.
pub fn local_maxima(dist: &Array2<f64>, mask: &Array2<bool>) -> Array2<bool> {
    assert_eq!(dist.dim(), mask.dim());

    let (h, w) = dist.dim();
    Array2::from_shape_fn((h, w), |(i, j)| {
        if !mask[(i, j)] || dist[(i, j)] <= 0.0 {
            return false;
        }
        let v = dist[(i, j)];
        let rows = i.saturating_sub(1)..=(i + 1).min(h - 1);
        let cols = j.saturating_sub(1)..=(j + 1).min(w - 1);
        iproduct!(rows, cols).all(|pos| dist[pos] <= v)
    })
}

/// 洪泛波前上的一个像素.
struct Front {
    prio: f64,
    seq: u64,
    pos: Idx2d,
}

/// 以 `markers` 为种子, 在 `mask` 限制下对 `priority` 做标记控制分水岭.
///
/// 洪泛自种子出发, 按优先级值从小到大推进 (对取负的距离变换,
/// 即从各盆地中心向外), 相同优先级按入堆先后次序处理, 结果确定.
/// 掩码外与不可达像素保持 0.
///
/// # 注意
///
/// `markers` 必须来自对种子点掩码的连通域标记 (如
/// [`super::label_areas`]); 全零的 `markers` 返回
/// [`PrepError::UnseededWatershed`].
pub fn watershed(
    priority: &Array2<f64>,
    markers: &Array2<u32>,
    mask: &Array2<bool>,
) -> Result<Array2<u32>, PrepError> {
    let shape = priority.dim();
    if markers.dim() != shape {
        return Err(PrepError::ShapeMismatch(shape, markers.dim()));
    }
    if mask.dim() != shape {
        return Err(PrepError::ShapeMismatch(shape, mask.dim()));
    }
    if markers.iter().all(|&m| m == 0) {
        return Err(PrepError::UnseededWatershed);
    }

    // 堆顶为优先级最小 (并列时最先入堆) 的波前像素.
    let mut heap: BinaryHeap<Front, _> = BinaryHeap::new_by(|a: &Front, b: &Front| {
        b.prio.total_cmp(&a.prio).then_with(|| b.seq.cmp(&a.seq))
    });

    let mut out = Array2::<u32>::zeros(shape);
    let mut seq = 0u64;
    for (pos, &m) in markers.indexed_iter() {
        if m > 0 && mask[pos] {
            out[pos] = m;
            heap.push(Front {
                prio: priority[pos],
                seq,
                pos,
            });
            seq += 1;
        }
    }

    while let Some(Front { pos, .. }) = heap.pop() {
        let label = out[pos];
        for nb in neighbour4_in(pos, shape) {
            if mask[nb] && out[nb] == 0 {
                out[nb] = label;
                heap.push(Front {
                    prio: priority[nb],
                    seq,
                    pos: nb,
                });
                seq += 1;
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};

    #[test]
    fn test_local_maxima_plateau_and_peak() {
        let dist = array![[0.0, 1.0, 0.0], [1.0, 2.0, 1.0], [0.0, 1.0, 0.0]];
        let mask = dist.mapv(|v| v > 0.0);
        let peaks = local_maxima(&dist, &mask);
        assert!(peaks[(1, 1)]);
        assert_eq!(peaks.iter().filter(|&&b| b).count(), 1);
    }

    #[test]
    fn test_watershed_unseeded() {
        let prio = Array2::from_elem((2, 2), 0.0);
        let markers = Array2::zeros((2, 2));
        let mask = Array2::from_elem((2, 2), true);
        assert_eq!(
            watershed(&prio, &markers, &mask),
            Err(PrepError::UnseededWatershed)
        );
    }

    #[test]
    fn test_watershed_shape_mismatch() {
        let prio = Array2::from_elem((2, 2), 0.0);
        let markers = Array2::zeros((2, 3));
        let mask = Array2::from_elem((2, 2), true);
        assert!(matches!(
            watershed(&prio, &markers, &mask),
            Err(PrepError::ShapeMismatch(..))
        ));
    }

    #[test]
    fn test_watershed_two_basins() {
        // 一行像素, 两端为盆地中心 (高距离), 中间为脊.
        let d = array![[3.0, 2.0, 1.0, 2.0, 3.0]];
        let prio = d.mapv(|v: f64| -v);
        let markers = array![[1u32, 0, 0, 0, 2]];
        let mask = Array2::from_elem((1, 5), true);
        let out = watershed(&prio, &markers, &mask).unwrap();
        // 脊上像素按先到先得划归盆地 1 (先入堆).
        assert_eq!(out, array![[1, 1, 1, 2, 2]]);
    }

    #[test]
    fn test_watershed_respects_mask() {
        let d = array![[1.0, 1.0, 0.0, 1.0]];
        let prio = d.mapv(|v: f64| -v);
        let markers = array![[1u32, 0, 0, 0]];
        let mask = array![[true, true, false, true]];
        let out = watershed(&prio, &markers, &mask).unwrap();
        assert_eq!(out, array![[1, 1, 0, 0]]);
    }
}
