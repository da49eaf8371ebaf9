//! 强度归一化.

use ndarray::Array2;
use num::Float;

/// 方差归一化 (z-norm). 返回均值为 0, 标准差为 1 的新数组.
///
/// # 注意
///
/// 1. 输入不能为空, 也不允许包含 NaN.
/// 2. 常数图像 (标准差为 0) 返回全 0 数组.
pub fn znorm<F: Float>(img: &Array2<F>) -> Array2<F> {
    assert!(!img.is_empty());

    let n = F::from(img.len()).unwrap();
    let mean = img.iter().fold(F::zero(), |acc, &v| acc + v) / n;
    let var = img
        .iter()
        .fold(F::zero(), |acc, &v| acc + (v - mean) * (v - mean))
        / n;
    let sd = var.sqrt();
    if sd == F::zero() {
        return Array2::from_elem(img.raw_dim(), F::zero());
    }
    img.mapv(|v| (v - mean) / sd)
}

/// 直方图拉伸归一化. 以 `lp`/`hp` 百分位为端点做线性重标定,
/// 将 `lp` 百分位映射到 0, `hp` 百分位映射到 1.
///
/// # 注意
///
/// 1. 输入不能为空, 也不允许包含 NaN. 百分位取值范围为 `0..=100`.
/// 2. 两个百分位相等 (如常数图像) 时只做平移, 不做缩放.
pub fn histogram_stretch<F: Float>(img: &Array2<F>, lp: f64, hp: f64) -> Array2<F> {
    assert!(!img.is_empty());
    assert!(lp <= hp);

    let plow = percentile(img, lp);
    let phigh = percentile(img, hp);
    let span = phigh - plow;
    if span == F::zero() {
        return img.mapv(|v| v - plow);
    }
    img.mapv(|v| (v - plow) / span)
}

/// 线性插值百分位.
fn percentile<F: Float>(img: &Array2<F>, p: f64) -> F {
    debug_assert!((0.0..=100.0).contains(&p));

    let mut v: Vec<F> = img.iter().copied().collect();
    v.sort_by(|a, b| a.partial_cmp(b).expect("强度值不允许为 NaN"));

    let rank = p / 100.0 * (v.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let w = F::from(rank - lo as f64).unwrap();
    v[lo] + (v[hi] - v[lo]) * w
}
