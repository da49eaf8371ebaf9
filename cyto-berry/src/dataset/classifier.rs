//! 像素分类器导出文件读取.
//!
//! 分类器 (像素分类) 的导出内容是逻辑形状为 `(高, 宽, 通道)` 的概率体,
//! 以固定条目名 [`EXPORTED_DATA`] 存放在 `.npz` 压缩包中,
//! 或直接导出为裸 `.npy` 数组.

use crate::consts::EXPORTED_DATA;
use ndarray::{Array3, Ix3, OwnedRepr};
use ndarray_npy::{NpzReader, ReadNpyError, ReadNpyExt, ReadNpzError};
use std::fs::{File, OpenOptions};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// 读取分类器导出内容错误.
#[derive(Debug)]
pub enum ClassifierError {
    /// workers 太大. 最多支持 64.
    TooManyWorkers(u32),

    /// 读取 npz 压缩包错误.
    ReadNpz(ReadNpzError),

    /// 读取裸 npy 数组错误.
    ReadNpy(ReadNpyError),

    /// 其他底层 I/O 错误.
    Io(std::io::Error),
}

/// 从单个导出文件读取概率体.
///
/// 扩展名为 `npz` 的文件按压缩包解析, 以固定条目名
/// `exported_data.npy` 索引; 其余文件按裸 `.npy` 数组解析.
pub fn load_exported<P: AsRef<Path>>(p: P) -> Result<Array3<f32>, ClassifierError> {
    let p = p.as_ref();
    let file = File::open(p).map_err(ClassifierError::Io)?;
    if p.extension().is_some_and(|e| e == "npz") {
        let mut npz = NpzReader::new(file).map_err(ClassifierError::ReadNpz)?;
        npz.by_name::<OwnedRepr<f32>, Ix3>(&format!("{EXPORTED_DATA}.npy"))
            .map_err(ClassifierError::ReadNpz)
    } else {
        Array3::<f32>::read_npy(file).map_err(ClassifierError::ReadNpy)
    }
}

/// 从显式路径列表创建概率体加载器. 加载器按列表顺序迭代.
pub fn prob_loader<I, P>(paths: I) -> ProbLoader
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut paths_rev: Vec<PathBuf> = paths
        .into_iter()
        .map(|p| p.as_ref().to_owned())
        .collect();
    paths_rev.reverse();
    ProbLoader { paths_rev }
}

/// 概率体数据加载器. 依次产出 `(路径, 读取结果)`.
#[derive(Debug)]
pub struct ProbLoader {
    paths_rev: Vec<PathBuf>,
}

impl Iterator for ProbLoader {
    type Item = (PathBuf, Result<Array3<f32>, ClassifierError>);

    fn next(&mut self) -> Option<Self::Item> {
        let p = self.paths_rev.pop()?;
        let data = load_exported(&p);
        Some((p, data))
    }
}

impl ExactSizeIterator for ProbLoader {
    #[inline]
    fn len(&self) -> usize {
        self.paths_rev.len()
    }
}

/// 分类器导出归档.
///
/// 该结构可用于建模硬盘上将整张玻片全部视野的概率体打包存储的单个
/// npz 压缩文件, 并支持多线程并发读取.
pub struct ClassifierArchive {
    entries: Vec<Mutex<NpzReader<File>>>,
    turn: AtomicUsize,
}

impl ClassifierArchive {
    /// 初始化.
    ///
    /// `workers` 指定了底层工作通道的个数, 最大为 64. 系统会从路径 `p`
    /// 打开文件 `workers` 次, 并为每个打开通道指定一个排他入口点
    /// (以期获得更高的并行度).
    pub fn new<P: AsRef<Path>>(workers: NonZeroUsize, p: P) -> Result<Self, ClassifierError> {
        let workers = workers.get();
        if workers > 64 {
            return Err(ClassifierError::TooManyWorkers(64));
        }
        let mut v = Vec::with_capacity(workers);
        for _ in 0..workers {
            let file = OpenOptions::new()
                .read(true)
                .open(p.as_ref())
                .map_err(ClassifierError::Io)?;
            v.push(Mutex::new(
                NpzReader::new(file).map_err(ClassifierError::ReadNpz)?,
            ));
        }
        Ok(Self {
            entries: v,
            turn: AtomicUsize::new(0),
        })
    }

    /// 通过 npz 条目名 `name` 获取对应视野的概率体.
    pub fn prob_by_name(&self, name: &str) -> Result<Array3<f32>, ReadNpzError> {
        let slot = self.next_slot();
        let mut file = self.entries[slot].lock().unwrap();
        file.by_name::<OwnedRepr<f32>, Ix3>(name)
    }

    /// 通过 npz 数值索引获取对应视野的概率体.
    pub fn prob_by_index(&self, index: usize) -> Result<Array3<f32>, ReadNpzError> {
        let slot = self.next_slot();
        let mut file = self.entries[slot].lock().unwrap();
        file.by_index::<OwnedRepr<f32>, Ix3>(index)
    }

    /// 获取底层 npz 文件包含的所有条目名.
    pub fn names(&self) -> Result<Vec<String>, ReadNpzError> {
        let slot = self.next_slot();
        self.entries[slot].lock().unwrap().names()
    }

    /// 工作通道个数.
    #[inline]
    pub fn worker_len(&self) -> usize {
        self.entries.len()
    }

    /// 获取底层 npz 文件包含的概率体个数.
    pub fn prob_len(&self) -> usize {
        let slot = self.next_slot();
        self.entries[slot].lock().unwrap().len()
    }

    fn next_slot(&self) -> usize {
        self.turn.fetch_add(1, Ordering::Relaxed) % self.worker_len()
    }
}
