#![warn(missing_docs)] // <= 合适时移除它.

//! 核心库. 提供网格扫描荧光显微镜细胞图像的预处理与分割算法:
//! 视野拼接, 前景提取, 自适应局部阈值, 细胞核标记, 标签清理,
//! 以及细胞核种子的 Voronoi 胞质划分.
//!
//! 控制流为 拼接 → 阈值 → 标记 → 清理 → 划分. 各阶段均为同步纯函数,
//! 只读借用输入并返回新数组; 唯一例外是 [`segment::label_regions`]
//! 按值接收其阶段私有的二值掩码并就地抹除背景 (见其文档).
//! 诊断信息一律经 `log` facade 输出, 不影响任何返回值.
//!
//! # 注意
//!
//! 1. 图像一律以 `(高, 宽)` 即 `(行, 列)` 顺序索引.
//! 2. 标签图以 0 为背景; 经过清理的标签从 1 起稠密分布.
//! 3. 文件发现与文件名解析不在本 crate 范围内, 加载器只接受显式路径.
//!
//! # 开发计划
//!
//! ### 视野拼接 ✅
//!
//! 排布网格构建与重叠感知的整片拼接.
//!
//! 实现位于 `cyto-berry/src/mosaic.rs`.
//!
//! ### 前景掩码提取与面积形态学 ✅
//!
//! 概率体阈值化, 面积开/闭运算, 压缩掩码存储.
//!
//! 实现位于 `cyto-berry/src/mask`.
//!
//! ### 自适应局部阈值 ✅
//!
//! 积分图滑动窗口均值 + 累积直方图偏移估计.
//!
//! 实现位于 `cyto-berry/src/threshold.rs`.
//!
//! ### 距离变换, 局部极大与标记控制分水岭 ✅
//!
//! 精确欧氏距离变换 (两趟抛物线下包络), 3×3 局部极大种子,
//! 以及显式标记的优先级洪泛分水岭.
//!
//! 实现位于 `cyto-berry/src/segment`.
//!
//! ### 标签清理与稠密重编号 ✅
//!
//! 实现位于 `cyto-berry/src/clean.rs`.
//!
//! ### Voronoi 胞质划分与连通性修复 ✅
//!
//! 实现位于 `cyto-berry/src/voronoi.rs`.
//!
//! ### 数据集加载 ✅
//!
//! 分类器导出文件 (npz/npy) 与原始视野图像的读取.
//!
//! 实现位于 `cyto-berry/src/dataset`.

/// 二维索引, 同时也可一定程度上用作非负整数向量.
pub type Idx2d = (usize, usize);

/// 高精度二维坐标. 质心以该类型表示, 顺序为 `(行, 列)`.
pub type Idx2dF = (f64, f64);

type Area2d = Vec<Idx2d>;
type Areas2d = Vec<Area2d>;

pub mod clean;
pub mod consts;
pub mod dataset;
mod error;
mod grid;
pub mod mask;
pub mod mosaic;
pub mod norm;
pub mod prelude;
pub mod segment;
pub mod threshold;
pub mod voronoi;

pub use error::PrepError;
pub use mask::CompactMask;
