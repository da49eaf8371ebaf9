//! 精确欧氏距离变换.

use ndarray::Array2;

/// 平方距离的无穷大占位. 真实平方距离不会超过图像对角线平方.
const INF: f64 = 1e20;

/// 计算二值掩码的精确欧氏距离变换.
///
/// 每个前景像素的输出为其到最近背景像素的欧氏距离, 背景像素为 0.
/// 实现为平方距离上的两趟一维抛物线下包络变换 (先按列, 再按行).
///
/// # 注意
///
/// 不含任何背景像素的掩码没有距离参照, 其输出值不具意义.
pub fn distance_transform_edt(mask: &Array2<bool>) -> Array2<f64> {
    let (h, w) = mask.dim();
    let mut d = Array2::from_shape_fn((h, w), |pos| if mask[pos] { INF } else { 0.0 });

    let n = h.max(w);
    let mut f = vec![0.0; n];
    let mut out = vec![0.0; n];
    let mut v = vec![0usize; n];
    let mut z = vec![0.0; n + 1];

    // 列方向
    for j in 0..w {
        for i in 0..h {
            f[i] = d[(i, j)];
        }
        edt_1d(&f[..h], &mut out[..h], &mut v[..h], &mut z[..h + 1]);
        for i in 0..h {
            d[(i, j)] = out[i];
        }
    }
    // 行方向
    for i in 0..h {
        for j in 0..w {
            f[j] = d[(i, j)];
        }
        edt_1d(&f[..w], &mut out[..w], &mut v[..w], &mut z[..w + 1]);
        for j in 0..w {
            d[(i, j)] = out[j];
        }
    }
    d.mapv_into(f64::sqrt)
}

/// 一维平方距离变换: 对 `f` 上的抛物线族求下包络, 结果写入 `d`.
/// `v`/`z` 为调用方复用的工作区 (顶点下标与分界点).
fn edt_1d(f: &[f64], d: &mut [f64], v: &mut [usize], z: &mut [f64]) {
    let n = f.len();
    debug_assert!(n >= 1);

    let mut k = 0usize;
    v[0] = 0;
    z[0] = -INF;
    z[1] = INF;
    for q in 1..n {
        loop {
            let p = v[k];
            // 抛物线 q 与 p 的交点横坐标.
            let s = ((f[q] + (q * q) as f64) - (f[p] + (p * p) as f64)) / (2 * (q - p)) as f64;
            if s <= z[k] {
                k -= 1;
                continue;
            }
            k += 1;
            v[k] = q;
            z[k] = s;
            z[k + 1] = INF;
            break;
        }
    }

    k = 0;
    for (q, dst) in d.iter_mut().enumerate() {
        while z[k + 1] < q as f64 {
            k += 1;
        }
        let dq = q as f64 - v[k] as f64;
        *dst = dq * dq + f[v[k]];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn float_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_edt_row() {
        let mask =
            Array2::from_shape_vec((1, 5), vec![false, true, true, true, false]).unwrap();
        let d = distance_transform_edt(&mask);
        for (expect, got) in [0.0, 1.0, 2.0, 1.0, 0.0].into_iter().zip(d.iter()) {
            assert!(float_eq(expect, *got));
        }
    }

    #[test]
    fn test_edt_corner_background() {
        // 唯一背景像素位于左上角, 距离即到该点的欧氏距离.
        let mut mask = Array2::from_elem((4, 4), true);
        mask[(0, 0)] = false;
        let d = distance_transform_edt(&mask);
        for ((i, j), &v) in d.indexed_iter() {
            let expect = ((i * i + j * j) as f64).sqrt();
            assert!(float_eq(v, expect));
        }
    }

    #[test]
    fn test_edt_diagonal_distance() {
        let mut mask = Array2::from_elem((3, 3), true);
        mask[(1, 1)] = false;
        let d = distance_transform_edt(&mask);
        assert!(float_eq(d[(0, 0)], std::f64::consts::SQRT_2));
        assert!(float_eq(d[(0, 1)], 1.0));
        assert!(float_eq(d[(1, 1)], 0.0));
    }

    #[test]
    fn test_edt_all_background() {
        let mask = Array2::from_elem((3, 3), false);
        assert!(distance_transform_edt(&mask).iter().all(|&v| v == 0.0));
    }
}
