//! 对 `cyto-berry::dataset` 的更一层封装. 提供更直接的数据目录定位与文件列举.

use std::env;
use std::io;
use std::path::{Path, PathBuf};

/// 获取分类器导出文件的基本路径.
///
/// 1. 若环境变量 `$SLIDE_PROB_DIR` 非空, 则返回其值;
/// 2. 否则, 返回 `$HOME/slides/prob`.
pub fn prob_dir_from_env_or_home() -> PathBuf {
    if let Ok(d) = env::var("SLIDE_PROB_DIR") {
        PathBuf::from(d)
    } else {
        cyto_berry::dataset::home_slide_dir_with(["prob"]).unwrap()
    }
}

/// 获取原始视野图像的基本路径.
///
/// 1. 若环境变量 `$SLIDE_TILE_DIR` 非空, 则返回其值;
/// 2. 否则, 返回 `$HOME/slides/tiles`.
pub fn tile_dir_from_env_or_home() -> PathBuf {
    if let Ok(d) = env::var("SLIDE_TILE_DIR") {
        PathBuf::from(d)
    } else {
        cyto_berry::dataset::home_slide_dir_with(["tiles"]).unwrap()
    }
}

/// 获取标签输出的基本路径.
///
/// 1. 若环境变量 `$SLIDE_OUT_DIR` 非空, 则返回其值;
/// 2. 否则, 返回 `$HOME/slides/labels`.
pub fn out_dir_from_env_or_home() -> PathBuf {
    if let Ok(d) = env::var("SLIDE_OUT_DIR") {
        PathBuf::from(d)
    } else {
        cyto_berry::dataset::home_slide_dir_with(["labels"]).unwrap()
    }
}

/// 列举目录下具有指定扩展名的全部文件, 按文件名升序排列.
///
/// 视野/时间戳等文件名模式解析不在核心库范围内,
/// 运行器默认按字典序对应各数据目录中的文件.
pub fn files_with_ext(dir: &Path, ext: &str) -> io::Result<Vec<PathBuf>> {
    let mut ans: Vec<PathBuf> = dir
        .read_dir()?
        .filter_map(|entry| {
            let p = entry.ok()?.path();
            (p.is_file() && p.extension().is_some_and(|e| e == ext)).then_some(p)
        })
        .collect();
    ans.sort();
    Ok(ans)
}
