//! 自适应局部阈值. 从强度图像得到细胞核二值掩码.

use crate::consts::{DEFAULT_PCUT, HIST_BINS};
use crate::error::PrepError;
use crate::norm::histogram_stretch;
use ndarray::{Array2, ArrayView2};

/// 对强度图像施加滑动窗口局部阈值, 得到细胞核二值掩码.
///
/// 未给定 `pcut` 时的推断策略: 若 `foreground` 存在, 取
/// `1 - fnuc * 前景像素数 / 总像素数`, 使核强度偏移的目标覆盖面积
/// 约为观测前景的 `fnuc` 倍; 否则退回 [`DEFAULT_PCUT`] 并发出警告.
/// 核强度偏移 `nuc_offset` 取自去均值强度的 100 箱累积直方图中
/// 累积概率最接近 `pcut` 的箱左边界. 像素为前景当且仅当其强度严格大于
/// 以 `block_size` 为边长的邻域均值加 `nuc_offset` (窗口在图像边缘截断).
///
/// # 注意
///
/// 1. `block_size` 必须为正奇数, 否则返回配置错误.
/// 2. 常数图像得到全空掩码 (严格大于不成立).
pub fn local_threshold(
    img: ArrayView2<'_, f32>,
    foreground: Option<&Array2<bool>>,
    pcut: Option<f64>,
    histnorm: bool,
    fnuc: f64,
    block_size: usize,
) -> Result<Array2<bool>, PrepError> {
    if block_size % 2 == 0 || block_size == 0 {
        return Err(PrepError::Configuration(format!(
            "block_size 必须为正奇数, 而不是 {block_size}"
        )));
    }
    let (nx, ny) = img.dim();
    if nx == 0 || ny == 0 {
        return Err(PrepError::Configuration("强度图像不能为空".to_string()));
    }
    if let Some(m) = foreground {
        if m.dim() != (nx, ny) {
            return Err(PrepError::ShapeMismatch((nx, ny), m.dim()));
        }
    }

    let img = if histnorm {
        histogram_stretch(&img.to_owned(), 1.0, 99.0)
    } else {
        img.to_owned()
    };

    let pcut = match (pcut, foreground) {
        (Some(p), _) => p,
        (None, Some(m)) => {
            // 前景像素在核位点上的占比.
            let fore = m.iter().filter(|&&b| b).count();
            1.0 - fnuc * fore as f64 / (nx * ny) as f64
        }
        (None, None) => {
            log::warn!(
                "using a cutoff of {DEFAULT_PCUT}; \
                 provide a cutoff value (pcut) or a foreground mask for threshold estimation"
            );
            DEFAULT_PCUT
        }
    };

    let nuc_offset = nucleus_offset(&img, pcut);
    let local_mean = window_mean(&img, block_size);
    Ok(Array2::from_shape_fn((nx, ny), |pos| {
        f64::from(img[pos]) > local_mean[pos] + nuc_offset
    }))
}

/// 从去均值强度的累积直方图中选取核强度偏移:
/// 取累积概率最接近 `pcut` 的直方图箱的左边界.
fn nucleus_offset(img: &Array2<f32>, pcut: f64) -> f64 {
    let n = img.len() as f64;
    let mean = img.iter().map(|&v| f64::from(v)).sum::<f64>() / n;
    let shifted: Vec<f64> = img.iter().map(|&v| f64::from(v) - mean).collect();

    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for &v in &shifted {
        lo = lo.min(v);
        hi = hi.max(v);
    }
    // 常数数组使用单位宽度的对称区间.
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }

    // 等宽分箱; 最右边界归入末箱.
    let span = hi - lo;
    let mut counts = [0usize; HIST_BINS];
    for &v in &shifted {
        let bin = (((v - lo) / span * HIST_BINS as f64) as usize).min(HIST_BINS - 1);
        counts[bin] += 1;
    }

    let mut cum = 0.0;
    let mut best = (f64::INFINITY, 0usize);
    for (i, &c) in counts.iter().enumerate() {
        cum += c as f64 / n;
        let diff = (cum - pcut).abs();
        if diff < best.0 {
            best = (diff, i);
        }
    }
    lo + span * best.1 as f64 / HIST_BINS as f64
}

/// 以积分图计算每个像素的邻域均值. 窗口在图像边缘截断,
/// 均值按窗口实际覆盖的像素数归一.
fn window_mean(img: &Array2<f32>, block_size: usize) -> Array2<f64> {
    let (h, w) = img.dim();
    // 积分图带一行一列零前缀: acc[(i+1, j+1)] 为左上 (含) 子矩阵之和.
    let mut acc = Array2::<f64>::zeros((h + 1, w + 1));
    for i in 0..h {
        for j in 0..w {
            acc[(i + 1, j + 1)] =
                f64::from(img[(i, j)]) + acc[(i, j + 1)] + acc[(i + 1, j)] - acc[(i, j)];
        }
    }

    let r = block_size / 2;
    Array2::from_shape_fn((h, w), |(i, j)| {
        let i0 = i.saturating_sub(r);
        let j0 = j.saturating_sub(r);
        let i1 = (i + r + 1).min(h);
        let j1 = (j + r + 1).min(w);
        let sum = acc[(i1, j1)] - acc[(i0, j1)] - acc[(i1, j0)] + acc[(i0, j0)];
        sum / ((i1 - i0) * (j1 - j0)) as f64
    })
}
