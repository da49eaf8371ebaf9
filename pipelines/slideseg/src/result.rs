//! 运行结果统计.

use std::path::PathBuf;

/// 单个视野的处理结局.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FovOutcome {
    /// 分割完成, 记录细胞个数.
    Done {
        /// 划分得到的细胞个数.
        ncells: usize,
    },

    /// 视野内没有任何细胞核.
    Empty,

    /// 视野图像读取失败.
    TileError,

    /// 概率体读取失败.
    ProbError,

    /// 流水线阶段错误.
    PrepError,

    /// 标签输出写入失败.
    WriteError,
}

/// 整张玻片的运行汇总.
pub struct SegSummary {
    data: Vec<(PathBuf, FovOutcome)>,
}

impl SegSummary {
    /// 预留容量初始化.
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            data: Vec::with_capacity(cap),
        }
    }

    /// 记录一个视野的结果.
    pub fn push(&mut self, fov: PathBuf, outcome: FovOutcome) {
        self.data.push((fov, outcome));
    }

    /// 分析运行结果并输出.
    pub fn analyze(&self) {
        const S4: &str = "    ";

        let total = self.data.len();
        let mut cells = 0usize;
        let mut done = 0usize;
        let mut empty = 0usize;
        let mut failed = 0usize;
        for (_, outcome) in &self.data {
            match outcome {
                FovOutcome::Done { ncells } => {
                    done += 1;
                    cells += ncells;
                }
                FovOutcome::Empty => empty += 1,
                _ => failed += 1,
            }
        }

        println!("Slide summary:");
        println!("{S4}Fields of view: {total}");
        println!("{S4}Segmented: {done}");
        println!("{S4}Empty: {empty}");
        println!("{S4}Failed: {failed}");
        println!("{S4}Cells in total: {cells}");
        if done > 0 {
            println!("{S4}Average cells per fov: {:.2}", cells as f64 / done as f64);
        }
        for (fov, outcome) in &self.data {
            if !matches!(outcome, FovOutcome::Done { .. } | FovOutcome::Empty) {
                println!("{S4}{}: {outcome:?}", fov.display());
            }
        }
    }
}
