//! 细胞核种子的 Voronoi 胞质划分.

use crate::error::PrepError;
use crate::segment::label_areas;
use crate::{Idx2d, Idx2dF};
use ndarray::{Array2, Zip};
use ordered_float::OrderedFloat;

/// 将前景像素划分给最近的细胞核质心, 并做逐细胞连通性修复.
///
/// 算法:
///
/// 1. 对标签 1..=K 逐一计算质心: 该核落在前景掩码内的像素位置均值;
/// 2. 每个像素归属于欧氏距离最近的质心 (并列时取较小标签),
///   得到覆盖全图的初步划分, 随后将背景像素清零;
/// 3. 对每个 Voronoi 区域做 4-连通区域分解. 若区域分裂为多块,
///   仅保留块质心距核质心最近的一块 (并列时取较小块号), 其余丢弃;
///   当 "最近" 与 "最大" 不是同一块时发出诊断警告, 但不视为错误.
///
/// 返回的标签图取值 0..=K, 其中 0 为背景或被丢弃的碎块.
///
/// # 注意
///
/// 1. 缺省 `foreground` 时以整幅图像为前景, 并发出警告.
/// 2. 全背景的标签图返回 [`PrepError::EmptyMask`].
/// 3. 质心派生自输入标签, 输入应当是 [`crate::clean::clean_labeled`]
///   之后的稠密标签.
pub fn voronoi_cytoplasm(
    labels: &Array2<u32>,
    foreground: Option<&Array2<bool>>,
) -> Result<Array2<u32>, PrepError> {
    let shape = labels.dim();
    if let Some(fore) = foreground {
        if fore.dim() != shape {
            return Err(PrepError::ShapeMismatch(shape, fore.dim()));
        }
    }
    let whole_image;
    let fore: &Array2<bool> = match foreground {
        Some(m) => m,
        None => {
            log::warn!("no foreground mask provided, using entire image");
            whole_image = Array2::from_elem(shape, true);
            &whole_image
        }
    };

    let k = labels.iter().map(|&lab| lab as usize).max().unwrap_or(0);
    if k == 0 {
        return Err(PrepError::EmptyMask);
    }
    let centers = nucleus_centers(labels, fore, k);

    // 最近质心指派, 背景清零.
    let mut vor = Array2::<u32>::zeros(shape);
    cfg_if::cfg_if! {
        if #[cfg(feature = "rayon")] {
            Zip::indexed(&mut vor).par_for_each(|pos, v| {
                *v = if fore[pos] { nearest_center(&centers, pos) } else { 0 };
            });
        } else {
            Zip::indexed(&mut vor).for_each(|pos, v| {
                *v = if fore[pos] { nearest_center(&centers, pos) } else { 0 };
            });
        }
    }

    // 逐细胞连通性修复.
    let mut cyto = Array2::<u32>::zeros(shape);
    for ic in 1..=k as u32 {
        let cell = vor.mapv(|v| v == ic);
        let blobs = label_areas(&cell);
        let nblobs = *blobs.iter().max().unwrap() as usize;
        if nblobs == 0 {
            continue;
        }
        let keep = if nblobs == 1 {
            1
        } else {
            closest_blob(&blobs, nblobs, centers[ic as usize - 1], ic)
        };
        for (pos, &b) in blobs.indexed_iter() {
            if b == keep {
                cyto[pos] = ic;
            }
        }
    }
    Ok(cyto)
}

/// 逐标签计算前景加权质心 (即核与前景掩码交集的位置均值).
/// 某个核与前景掩码无交集时退回其全部像素的位置均值.
fn nucleus_centers(labels: &Array2<u32>, fore: &Array2<bool>, k: usize) -> Vec<Idx2dF> {
    let mut masked = vec![(0usize, 0.0f64, 0.0f64); k + 1];
    let mut plain = vec![(0usize, 0.0f64, 0.0f64); k + 1];
    for ((i, j), &lab) in labels.indexed_iter() {
        if lab == 0 {
            continue;
        }
        let acc = &mut plain[lab as usize];
        acc.0 += 1;
        acc.1 += i as f64;
        acc.2 += j as f64;
        if fore[(i, j)] {
            let acc = &mut masked[lab as usize];
            acc.0 += 1;
            acc.1 += i as f64;
            acc.2 += j as f64;
        }
    }
    (1..=k)
        .map(|lab| {
            let (n, si, sj) = masked[lab];
            if n > 0 {
                return (si / n as f64, sj / n as f64);
            }
            let (n, si, sj) = plain[lab];
            if n > 0 {
                log::debug!("nucleus {lab} has no foreground pixel, using all of its pixels");
                return (si / n as f64, sj / n as f64);
            }
            // 稀疏标签的缺号: 无穷远质心不会吸引任何像素.
            (f64::INFINITY, f64::INFINITY)
        })
        .collect()
}

/// 求像素最近的质心 (1 基标签). 并列时取较小标签.
fn nearest_center(centers: &[Idx2dF], (i, j): Idx2d) -> u32 {
    let mut best = 0usize;
    let mut best_d = f64::INFINITY;
    for (idx, &(ci, cj)) in centers.iter().enumerate() {
        let d = (i as f64 - ci).powi(2) + (j as f64 - cj).powi(2);
        if d < best_d {
            best_d = d;
            best = idx;
        }
    }
    best as u32 + 1
}

/// 在区域的多个连通块中选出质心距核质心 `nuc` 最近的一块,
/// 并在 "最近" 与 "最大" 不一致时发出诊断.
fn closest_blob(blobs: &Array2<u32>, nblobs: usize, nuc: Idx2dF, ic: u32) -> u32 {
    let mut cnt = vec![0usize; nblobs + 1];
    let mut sum = vec![(0.0f64, 0.0f64); nblobs + 1];
    for ((i, j), &b) in blobs.indexed_iter() {
        if b == 0 {
            continue;
        }
        cnt[b as usize] += 1;
        sum[b as usize].0 += i as f64;
        sum[b as usize].1 += j as f64;
    }

    let closest = (1..=nblobs)
        .min_by_key(|&b| {
            let ci = sum[b].0 / cnt[b] as f64;
            let cj = sum[b].1 / cnt[b] as f64;
            OrderedFloat((ci - nuc.0).powi(2) + (cj - nuc.1).powi(2))
        })
        .unwrap() as u32;
    let largest = (1..=nblobs)
        .max_by_key(|&b| (cnt[b], std::cmp::Reverse(b)))
        .unwrap() as u32;
    if closest != largest {
        log::warn!("cell: {ic} nchunks: {nblobs} closest: {closest} largest: {largest}");
    }
    closest
}
