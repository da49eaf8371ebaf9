//! 视野拼接. 将网格扫描采集的多幅视野 (tile) 按既定排布拼接为整张玻片图像.

use crate::error::PrepError;
use crate::norm::histogram_stretch;
use ndarray::{s, Array2};

/// 构建与网格扫描显微镜兼容的视野排布网格.
///
/// 返回的网格将 `(行, 列)` 拼图位置映射到线性视野序号: 序号 0 位于玻片
/// 左下角, 序号沿先左后右, 再自下而上的光栅路径递增. 当 `snake` 为
/// `true` 时, 自下而上数第奇数行 (即网格中下标为奇数的行) 的列序反转,
/// 形成蛇形路径.
///
/// # 注意
///
/// 排布必须与采集仪器的物理光栅顺序一致, `snake` 的取值由调用方保证.
pub fn tile_order(nrows: usize, ncols: usize, snake: bool) -> Array2<usize> {
    let mut grid = Array2::zeros((nrows, ncols));
    for ((r, c), v) in grid.indexed_iter_mut() {
        *v = (nrows - 1 - r) * ncols + c;
    }
    if snake {
        for r in (1..nrows).step_by(2) {
            let mut row = grid.row_mut(r);
            for c in 0..ncols / 2 {
                row.swap(c, ncols - 1 - c);
            }
        }
    }
    grid
}

/// 由一组视野拼接整张玻片图像. 排布顺序来自 [`tile_order`] (非蛇形).
///
/// `nrows`/`ncols` 同时缺省时默认方形排布 (视野数必须是完全平方数,
/// 否则返回配置错误; 不做静默截断). `foverlap` 为相邻视野间的重叠比例,
/// 逐轴按 `round(foverlap * 视野边长)` 折算成像素. `histnorm` 控制写入
/// 前是否对每幅视野做 1%/99% 直方图拉伸. 重叠区域不做混合, 序号更大的
/// 视野直接覆盖.
pub fn assemble_slide(
    tiles: &[Array2<f32>],
    nrows: Option<usize>,
    ncols: Option<usize>,
    foverlap: f64,
    histnorm: bool,
) -> Result<Array2<f32>, PrepError> {
    let (nrows, ncols) = infer_layout(tiles.len(), nrows, ncols)?;
    let order = tile_order(nrows, ncols, false);
    assemble_slide_with_order(tiles, &order, foverlap, histnorm)
}

/// 按显式排布网格 `order` 拼接. 网格语义与 [`tile_order`] 的返回值一致,
/// 蛇形采集的玻片应传入 `tile_order(nrows, ncols, true)`.
pub fn assemble_slide_with_order(
    tiles: &[Array2<f32>],
    order: &Array2<usize>,
    foverlap: f64,
    histnorm: bool,
) -> Result<Array2<f32>, PrepError> {
    let (nrows, ncols) = order.dim();
    let slots = slots_of(tiles.len(), order)?;
    if !(0.0..1.0).contains(&foverlap) {
        return Err(PrepError::Configuration(format!(
            "重叠比例必须落在 [0, 1) 内, 而不是 {foverlap}"
        )));
    }

    let (nv, nh) = tiles[0].dim();
    for t in &tiles[1..] {
        if t.dim() != (nv, nh) {
            return Err(PrepError::ShapeMismatch((nv, nh), t.dim()));
        }
    }

    let nfv = (foverlap * nv as f64).round() as usize;
    let nfh = (foverlap * nh as f64).round() as usize;
    let npixv = nrows * nv - (nrows - 1) * nfv;
    let npixh = ncols * nh - (ncols - 1) * nfh;

    let mut canvas = Array2::<f32>::zeros((npixv, npixh));
    for (im, tile) in tiles.iter().enumerate() {
        let (iv, ih) = slots[im];
        let lv = iv * (nv - nfv);
        let lh = ih * (nh - nfh);
        let img = if histnorm {
            histogram_stretch(tile, 1.0, 99.0)
        } else {
            tile.clone()
        };
        canvas.slice_mut(s![lv..lv + nv, lh..lh + nh]).assign(&img);
    }
    Ok(canvas)
}

/// 推断网格行列数. `nrows`/`ncols` 必须同时给定或同时缺省.
fn infer_layout(
    ntiles: usize,
    nrows: Option<usize>,
    ncols: Option<usize>,
) -> Result<(usize, usize), PrepError> {
    match (nrows, ncols) {
        (Some(r), Some(c)) => Ok((r, c)),
        (None, None) => {
            let n = (ntiles as f64).sqrt().round() as usize;
            if n == 0 || n * n != ntiles {
                return Err(PrepError::Configuration(format!(
                    "{ntiles} 幅视野不构成方形排布, 请显式给定 nrows 与 ncols"
                )));
            }
            Ok((n, n))
        }
        _ => Err(PrepError::Configuration(
            "nrows 与 ncols 必须同时给定或同时缺省".to_string(),
        )),
    }
}

/// 将排布网格求逆: 视野序号 -> 画布槽位 `(纵, 横)`.
/// 同时检查 `order` 恰为 `0..ntiles` 的一个置换.
fn slots_of(ntiles: usize, order: &Array2<usize>) -> Result<Vec<(usize, usize)>, PrepError> {
    let (nrows, ncols) = order.dim();
    if nrows * ncols != ntiles || ntiles == 0 {
        return Err(PrepError::Configuration(format!(
            "排布网格 {nrows}x{ncols} 与 {ntiles} 幅视野不匹配"
        )));
    }
    let mut slots = vec![None; ntiles];
    for ((r, c), &im) in order.indexed_iter() {
        match slots.get_mut(im) {
            Some(slot @ None) => *slot = Some(((nrows - 1) - r, c)),
            _ => {
                return Err(PrepError::Configuration(format!(
                    "排布网格不是 0..{ntiles} 的置换 (序号 {im} 越界或重复)"
                )))
            }
        }
    }
    // 以上保证每个槽位恰好被填一次.
    Ok(slots.into_iter().map(Option::unwrap).collect())
}
