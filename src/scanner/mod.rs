//! # 扫描模块
//!
//! 在像素网格中寻找由两个哨兵像素界定的标题行，并解析出消息长度与提取窗口。
//!
//! 两种策略：
//! * [`sequential`]：单线程光栅扫描，持有完整的检测状态机；
//! * [`parallel`]：按行划分给多个工作线程，通过共享的 [`record`] 协调。
//!
//! 两种策略在某些输入上会得到不同的消息长度：顺序扫描从闭合哨兵之后的第一个
//! 非哨兵像素读取长度，而并行扫描直接从闭合哨兵本身读取。

pub mod parallel;
pub mod record;
pub mod sequential;

use clap::ValueEnum;

use crate::constants::{MAX_WORKERS, MESSAGE_COL_OFFSET, MESSAGE_ROW_OFFSET};
use crate::grid::Pixel;
use crate::matcher::is_marker_pixel;

/// 扫描完成后确定的提取参数。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    /// 声明的消息长度 (长度像素的蓝色 + 红色)。
    pub message_len: u16,
    /// 提取起始行；输入异常时可能为负数，由提取器拒绝。
    pub start_row: i64,
    pub start_col: u32,
    pub end_col: u32,
    /// 标题行第一个哨兵所在的列。
    pub first_marker_col: u32,
    /// 闭合标题行的哨兵位置 `(row, col)`。
    pub closing_marker: (u32, u32),
    /// 读取长度的像素所在的行。
    pub length_row: u32,
    /// 读取长度的像素所在的列。
    pub length_col: u32,
}

impl Resolution {
    /// 根据长度像素的位置、颜色以及两个哨兵的位置计算提取参数。
    pub fn from_length_pixel(
        row: u32,
        col: u32,
        first_marker_col: u32,
        closing_marker: (u32, u32),
        pixel: Pixel,
    ) -> Self {
        Self {
            message_len: pixel.encoded_length(),
            start_row: i64::from(row) - MESSAGE_ROW_OFFSET,
            start_col: first_marker_col.saturating_add(MESSAGE_COL_OFFSET),
            end_col: col,
            first_marker_col,
            closing_marker,
            length_row: row,
            length_col: col,
        }
    }
}

/// 单次扫描的检测状态机。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetectionState {
    #[default]
    Searching,
    HeaderOpen {
        first_col: u32,
    },
    HeaderClosed {
        first_col: u32,
        second_row: u32,
        second_col: u32,
    },
    Resolved(Resolution),
}

impl DetectionState {
    /// 用 `(row, col)` 处的像素推进状态机。进入 `Resolved` 后不再变化。
    pub fn advance(&mut self, row: u32, col: u32, pixel: Pixel) {
        let marker = is_marker_pixel(pixel);
        let next = match *self {
            Self::Searching if marker => {
                log::debug!("marker found at ({row}, {col})");
                Self::HeaderOpen { first_col: col }
            }
            Self::HeaderOpen { first_col } if marker && col > first_col => {
                log::debug!("header line closed at ({row}, {col}), opened at column {first_col}");
                Self::HeaderClosed {
                    first_col,
                    second_row: row,
                    second_col: col,
                }
            }
            Self::HeaderClosed {
                first_col,
                second_row,
                second_col,
            } if !marker => {
                let resolution = Resolution::from_length_pixel(
                    row,
                    col,
                    first_col,
                    (second_row, second_col),
                    pixel,
                );
                log::debug!(
                    "length pixel ({row}, {col}): B={}, G={}, R={}, message_len={}",
                    pixel.blue,
                    pixel.green,
                    pixel.red,
                    resolution.message_len
                );
                Self::Resolved(resolution)
            }
            state => state,
        };
        *self = next;
    }

    pub fn resolution(&self) -> Option<Resolution> {
        match self {
            Self::Resolved(resolution) => Some(*resolution),
            _ => None,
        }
    }
}

/// 扫描策略。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ScanStrategy {
    /// 单线程光栅扫描。
    #[default]
    Sequential,
    /// 多线程、批量比较的扫描。
    Parallel,
}

/// 扫描配置。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanConfig {
    pub strategy: ScanStrategy,
    /// 并行扫描的工作线程数，总是在 `1..=MAX_WORKERS` 之内。
    pub workers: usize,
    /// 一旦解析出长度，其余工作线程在下一行开始前退出。
    pub cancel_on_resolve: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            strategy: ScanStrategy::default(),
            workers: default_workers(),
            cancel_on_resolve: false,
        }
    }
}

impl ScanConfig {
    pub fn with_strategy(mut self, strategy: ScanStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = clamp_workers(workers);
        self
    }

    pub fn with_cancel_on_resolve(mut self, cancel_on_resolve: bool) -> Self {
        self.cancel_on_resolve = cancel_on_resolve;
        self
    }
}

/// 主机可用并行度，上限为 `MAX_WORKERS`。
pub fn default_workers() -> usize {
    let available = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    clamp_workers(available)
}

pub(crate) fn clamp_workers(workers: usize) -> usize {
    workers.clamp(1, MAX_WORKERS)
}
