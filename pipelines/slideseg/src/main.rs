//! 整片分割流水线运行器.
//!
//! 从分类器导出目录与视野图像目录读入一张玻片的数据,
//! 逐视野运行 前景提取 → 局部阈值 → 核标记 → 清理 → 胞质划分,
//! 并把标签图写入输出目录.

mod result;
mod runner;

fn main() {
    simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Info)
        .init()
        .expect("Logger init error");

    let summary = runner::run();
    utils::sep();
    summary.analyze();
}
