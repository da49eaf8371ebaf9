//! 程序运行函数.

use crate::result::{FovOutcome, SegSummary};
use cyto_berry::prelude::*;
use ndarray_npy::WriteNpyExt;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use utils::loader;

/// 前景通道序号. 分类器导出约定通道 0 为前景.
const FORE_CHANNEL: usize = 0;

/// 面积开/闭运算的孔洞面积阈值 (像素).
const HOLEFILL_AREA: usize = 8;

/// 采集协议中相邻视野的重叠比例.
const OVERLAP_FRACTION: f64 = 0.0;

/// 实际运行.
pub fn run() -> SegSummary {
    let prob_dir = loader::prob_dir_from_env_or_home();
    let tile_dir = loader::tile_dir_from_env_or_home();
    let out_dir = loader::out_dir_from_env_or_home();
    assert!(prob_dir.is_dir());
    assert!(tile_dir.is_dir());
    fs::create_dir_all(&out_dir).expect("Output dir error");

    let probs = loader::files_with_ext(&prob_dir, "npz").expect("Listing prob dir error");
    let tiles = loader::files_with_ext(&tile_dir, "png").expect("Listing tile dir error");
    assert_eq!(
        probs.len(),
        tiles.len(),
        "概率体与视野图像的文件个数必须一致"
    );
    log::info!("segmenting {} fields of view", probs.len());

    assemble_overview(&tiles, &out_dir);

    let mut summary = SegSummary::with_capacity(probs.len());
    let fovs = cyto_berry::dataset::tiles::tile_loader(&tiles);
    for ((tile_path, tile), prob_path) in fovs.zip(probs.iter()) {
        let outcome = segment_fov(&tile_path, tile, prob_path, &out_dir);
        summary.push(tile_path, outcome);
    }
    summary
}

/// 拼接整片概览图并写入输出目录. 视野数不构成方形排布时跳过.
fn assemble_overview(tile_paths: &[PathBuf], out_dir: &Path) {
    let mut imgs = Vec::with_capacity(tile_paths.len());
    for (p, r) in cyto_berry::dataset::tiles::tile_loader(tile_paths) {
        match r {
            Ok(t) => imgs.push(t),
            Err(e) => {
                log::warn!("loading {} failed: {e}, skipping slide overview", p.display());
                return;
            }
        }
    }
    let slide = match assemble_slide(&imgs, None, None, OVERLAP_FRACTION, true) {
        Ok(s) => s,
        Err(e) => {
            log::warn!("assembling slide overview failed: {e:?}");
            return;
        }
    };
    let out = out_dir.join("slide.npy");
    let write = File::create(&out)
        .map_err(|e| e.to_string())
        .and_then(|f| slide.write_npy(BufWriter::new(f)).map_err(|e| e.to_string()));
    match write {
        Ok(()) => log::info!("slide overview: {:?} -> {}", slide.dim(), out.display()),
        Err(e) => log::warn!("writing {} failed: {e}", out.display()),
    }
}

/// 处理单个视野, 返回其统计结果.
fn segment_fov(
    tile_path: &Path,
    tile: image::ImageResult<ndarray::Array2<f32>>,
    prob_path: &Path,
    out_dir: &Path,
) -> FovOutcome {
    let tile = match tile {
        Ok(t) => t,
        Err(e) => {
            log::error!("loading {} failed: {e}", tile_path.display());
            return FovOutcome::TileError;
        }
    };
    let prob = match cyto_berry::dataset::classifier::load_exported(prob_path) {
        Ok(p) => p,
        Err(e) => {
            log::error!("loading {} failed: {e:?}", prob_path.display());
            return FovOutcome::ProbError;
        }
    };

    let stage = || -> Result<ndarray::Array2<u32>, PrepError> {
        let fore = extract_foreground(prob.view(), FORE_CHANNEL, DEFAULT_PCUT as f32, HOLEFILL_AREA)?;
        let nuc = local_threshold(
            tile.view(),
            Some(&fore),
            None,
            true,
            DEFAULT_FNUC,
            DEFAULT_BLOCK_SIZE,
        )?;
        let labels = label_regions(nuc, Some(&fore), true, true)?;
        let cleaned = clean_labeled(
            &labels,
            DEFAULT_EDGE_BUFFER,
            DEFAULT_MIN_CELL_DIM,
            DEFAULT_MAX_CELL_DIM,
            true,
        )?;
        voronoi_cytoplasm(&cleaned, Some(&fore))
    };
    let cyto = match stage() {
        Ok(c) => c,
        Err(PrepError::EmptyMask) => {
            // 视野内没有任何细胞核属于正常情况.
            log::info!("{}: no nucleus found", tile_path.display());
            return FovOutcome::Empty;
        }
        Err(e) => {
            log::error!("segmenting {} failed: {e:?}", tile_path.display());
            return FovOutcome::PrepError;
        }
    };

    let ncells = *cyto.iter().max().unwrap() as usize;
    let stem = tile_path
        .file_stem()
        .expect("Tile path error")
        .to_string_lossy();
    let out_path = out_dir.join(format!("labels-{stem}.npy"));
    let file = match File::create(&out_path) {
        Ok(f) => f,
        Err(e) => {
            log::error!("creating {} failed: {e}", out_path.display());
            return FovOutcome::WriteError;
        }
    };
    if let Err(e) = cyto.write_npy(BufWriter::new(file)) {
        log::error!("writing {} failed: {e}", out_path.display());
        return FovOutcome::WriteError;
    }
    log::info!("{}: {ncells} cells", tile_path.display());
    FovOutcome::Done { ncells }
}
