//! 数据集操作.

use std::path::{Path, PathBuf};

pub mod classifier;
pub mod tiles;

pub use classifier::{ClassifierArchive, ClassifierError};

/// 获取 `{用户主目录}/slides` 目录.
pub fn home_slide_dir() -> Option<PathBuf> {
    let mut ans = dirs::home_dir()?;
    ans.push("slides");
    Some(ans)
}

/// 获取 `{用户主目录}/slides` 目录下给定继续项组成的全路径.
pub fn home_slide_dir_with<P: AsRef<Path>, I: IntoIterator<Item = P>>(it: I) -> Option<PathBuf> {
    let mut ans = home_slide_dir()?;
    ans.extend(it);
    Some(ans)
}
