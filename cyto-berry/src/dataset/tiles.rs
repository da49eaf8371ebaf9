//! 原始视野图像读取.

use image::ImageResult;
use ndarray::Array2;
use std::path::{Path, PathBuf};

/// 读取单幅视野图像, 转为灰度强度数组.
///
/// 彩色输入按亮度折算为单通道; 返回数组以 `(高, 宽)` 索引.
pub fn load_tile<P: AsRef<Path>>(p: P) -> ImageResult<Array2<f32>> {
    let img = image::open(p)?.to_luma32f();
    let (w, h) = img.dimensions();
    let buf = img.into_raw();
    // 图像缓冲为行优先, 与 ndarray 默认布局一致.
    Ok(Array2::from_shape_vec((h as usize, w as usize), buf).unwrap())
}

/// 从显式路径列表创建视野加载器. 加载器按列表顺序迭代.
///
/// # 注意
///
/// 文件发现与视野顺序解析由调用方负责, 本函数不对路径做任何排序.
pub fn tile_loader<I, P>(paths: I) -> TileLoader
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut paths_rev: Vec<PathBuf> = paths
        .into_iter()
        .map(|p| p.as_ref().to_owned())
        .collect();
    paths_rev.reverse();
    TileLoader { paths_rev }
}

/// 视野图像数据加载器. 依次产出 `(路径, 读取结果)`.
#[derive(Debug)]
pub struct TileLoader {
    paths_rev: Vec<PathBuf>,
}

impl Iterator for TileLoader {
    type Item = (PathBuf, ImageResult<Array2<f32>>);

    fn next(&mut self) -> Option<Self::Item> {
        let p = self.paths_rev.pop()?;
        let data = load_tile(&p);
        Some((p, data))
    }
}

impl ExactSizeIterator for TileLoader {
    #[inline]
    fn len(&self) -> usize {
        self.paths_rev.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    #[test]
    fn test_load_tile_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tile.png");
        let mut img = GrayImage::new(3, 2);
        img.put_pixel(2, 1, Luma([255]));
        img.save(&path).unwrap();

        let tile = load_tile(&path).unwrap();
        assert_eq!(tile.dim(), (2, 3));
        assert!(tile[(1, 2)] > 0.99);
        assert_eq!(tile[(0, 0)], 0.0);
    }

    #[test]
    fn test_tile_loader_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nothing.png");
        let mut loader = tile_loader([&missing]);
        assert_eq!(loader.len(), 1);
        let (p, r) = loader.next().unwrap();
        assert_eq!(p, missing);
        assert!(r.is_err());
        assert!(loader.next().is_none());
    }
}
