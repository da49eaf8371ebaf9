//! 前景掩码. 将像素分类器输出的概率体转换为二值前景掩码,
//! 并提供批量提取与压缩存储.

pub mod morph;

use crate::dataset::classifier::{self, ClassifierError};
use crate::error::PrepError;
use crate::Idx2d;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use ndarray::{Array2, ArrayView3, Axis};
use std::io::{Read, Write};
use std::path::Path;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 从概率体中提取前景掩码.
///
/// 像素为前景当且仅当其 `fore_channel` 通道的概率严格大于 `pcut`.
/// 当 `holefill_area > 0` 时, 对阈值化结果依次做同阈值的面积开/闭运算,
/// 以删除小前景斑点并填充小背景孔洞. 在阈值分解意义下,
/// 这与先对概率通道做灰度面积开/闭再阈值化等价.
pub fn extract_foreground(
    prob: ArrayView3<'_, f32>,
    fore_channel: usize,
    pcut: f32,
    holefill_area: usize,
) -> Result<Array2<bool>, PrepError> {
    let nc = prob.len_of(Axis(2));
    if fore_channel >= nc {
        return Err(PrepError::Configuration(format!(
            "前景通道 {fore_channel} 越界 (概率体只有 {nc} 个通道)"
        )));
    }
    let channel = prob.index_axis(Axis(2), fore_channel);
    let mut msk = channel.mapv(|p| p > pcut);
    if holefill_area > 0 {
        msk = morph::area_opening(&msk, holefill_area);
        msk = morph::area_closing(&msk, holefill_area);
    }
    Ok(msk)
}

/// 批量提取前景掩码的错误.
#[derive(Debug)]
pub enum MaskBatchError {
    /// 分类器导出文件读取失败.
    Load(ClassifierError),

    /// 概率体内容不符合流水线要求.
    Prep(PrepError),
}

/// 批量提取前景掩码. 依次处理 `paths` 中的每个分类器导出文件,
/// 每处理一个文件记录一条进度日志, 返回与输入一一对应的掩码序列.
pub fn extract_foreground_batch<P: AsRef<Path>>(
    paths: &[P],
    fore_channel: usize,
    pcut: f32,
    holefill_area: usize,
) -> Result<Vec<Array2<bool>>, MaskBatchError> {
    let mut masks = Vec::with_capacity(paths.len());
    for p in paths {
        let p = p.as_ref();
        log::info!("loading {}", p.display());
        let prob = classifier::load_exported(p).map_err(MaskBatchError::Load)?;
        let msk = extract_foreground(prob.view(), fore_channel, pcut, holefill_area)
            .map_err(MaskBatchError::Prep)?;
        masks.push(msk);
    }
    Ok(masks)
}

/// 压缩一幅二值掩码, 获得其不透明的紧凑表示.
///
/// 批量流水线常常需要同时持有数百幅视野的前景掩码,
/// 压缩存储可显著降低驻留内存.
pub fn compress_mask(mask: &Array2<bool>) -> CompactMask {
    let sh = mask.dim();
    let mut e = ZlibEncoder::new(Vec::with_capacity(8), Compression::best());
    let buf: Vec<u8> = mask.iter().map(|&b| b as u8).collect();
    e.write_all(&buf).expect("Compression error");
    CompactMask {
        buf: e.finish().expect("Compression error"),
        sh,
    }
}

/// 压缩存储的二值掩码; 不透明类型.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CompactMask {
    /// 压缩的不透明字节流.
    buf: Vec<u8>,

    /// 形状.
    sh: Idx2d,
}

impl CompactMask {
    /// 解压缩, 还原为二值掩码.
    pub fn decompress(self) -> Array2<bool> {
        let Self { buf, sh: (h, w) } = self;
        let mut d = ZlibDecoder::new(buf.as_slice());
        let mut bytes = Vec::with_capacity(h * w);
        d.read_to_end(&mut bytes).expect("Decompression error");
        debug_assert_eq!(bytes.len(), h * w);
        Array2::from_shape_vec((h, w), bytes.into_iter().map(|b| b != 0).collect()).unwrap()
    }

    /// 掩码形状 (高, 宽).
    #[inline]
    pub fn shape(&self) -> Idx2d {
        self.sh
    }
}

/// 压缩掩码集合的持久化存储.
#[cfg(feature = "serde")]
pub mod cache {
    use super::CompactMask;
    use std::fs::File;
    use std::io::{BufReader, BufWriter};
    use std::path::Path;

    /// 将一组压缩掩码写入 `path`.
    pub fn save_masks<P: AsRef<Path>>(path: P, masks: &[CompactMask]) -> bincode::Result<()> {
        let w = BufWriter::new(File::create(path)?);
        bincode::serialize_into(w, masks)
    }

    /// 从 `path` 读回一组压缩掩码.
    pub fn load_masks<P: AsRef<Path>>(path: P) -> bincode::Result<Vec<CompactMask>> {
        let r = BufReader::new(File::open(path)?);
        bincode::deserialize_from(r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array2, Array3};

    fn prob_volume() -> Array3<f32> {
        // 2 通道: 通道 0 为前景概率, 通道 1 为其补.
        let mut prob = Array3::zeros((4, 4, 2));
        for i in 0..4 {
            for j in 0..4 {
                let p = if j >= 2 { 0.9 } else { 0.1 };
                prob[(i, j, 0)] = p;
                prob[(i, j, 1)] = 1.0 - p;
            }
        }
        prob
    }

    #[test]
    fn test_extract_foreground_threshold() {
        let prob = prob_volume();
        let msk = extract_foreground(prob.view(), 0, 0.8, 0).unwrap();
        for ((_, j), &b) in msk.indexed_iter() {
            assert_eq!(b, j >= 2);
        }
        // 补通道在同一阈值下为全背景.
        let msk = extract_foreground(prob.view(), 1, 0.8, 0).unwrap();
        assert!(msk.iter().all(|&b| !b));
    }

    #[test]
    fn test_extract_foreground_channel_bounds() {
        let prob = prob_volume();
        assert!(matches!(
            extract_foreground(prob.view(), 2, 0.8, 0),
            Err(PrepError::Configuration(_))
        ));
    }

    #[test]
    fn test_extract_foreground_holefill() {
        // 一个孤立亮斑与一个暗孔, 面积均为 1.
        let mut prob = Array3::<f32>::zeros((5, 5, 2));
        for i in 1..4 {
            for j in 1..4 {
                prob[(i, j, 0)] = 0.95;
            }
        }
        prob[(2, 2, 0)] = 0.0; // 暗孔
        prob[(0, 4, 0)] = 0.95; // 亮斑
        let plain = extract_foreground(prob.view(), 0, 0.8, 0).unwrap();
        assert!(plain[(0, 4)] && !plain[(2, 2)]);
        let cleaned = extract_foreground(prob.view(), 0, 0.8, 2).unwrap();
        assert!(!cleaned[(0, 4)] && cleaned[(2, 2)]);
    }

    #[test]
    fn test_compact_mask_roundtrip() {
        let mask = Array2::from_shape_fn((13, 7), |(i, j)| (i * j) % 3 == 0);
        let compact = compress_mask(&mask);
        assert_eq!(compact.shape(), (13, 7));
        assert_eq!(compact.decompress(), mask);
    }
}
