//! # 共享检测记录
//!
//! 并行扫描时工作线程之间唯一的共享可变状态。
//!
//! 写入协议：
//! 1. 第一个观察到哨兵的线程写入 `found_header_col`；
//! 2. 之后在更大列上观察到哨兵的线程写入解析结果并返回。
//!
//! 两个字段各自最多写入一次，解析结果一旦写入就不再被覆盖。

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

use super::Resolution;
use crate::grid::Pixel;

/// 一次哨兵观察的结果。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerObservation {
    /// 记录了第一个哨兵的列，继续扫描。
    Opened,
    /// 该列不大于已记录的列，忽略并继续扫描。
    Ignored,
    /// 该哨兵闭合了标题行，并写入了解析结果；工作线程应当返回。
    Closed(Resolution),
    /// 该哨兵闭合了标题行，但其他线程已写入解析结果；工作线程应当返回。
    AlreadyResolved,
}

impl MarkerObservation {
    pub fn ends_worker(&self) -> bool {
        matches!(self, Self::Closed(_) | Self::AlreadyResolved)
    }
}

/// 可注入的共享检测记录。每次 `observe_marker` 都是一个原子的读-改-写。
pub trait DetectionRecord: Sync {
    /// 报告 `(row, col)` 处的哨兵像素。
    fn observe_marker(&self, row: u32, col: u32, pixel: Pixel) -> MarkerObservation;

    fn found_header_col(&self) -> Option<u32>;

    fn resolution(&self) -> Option<Resolution>;

    fn is_resolved(&self) -> bool {
        self.resolution().is_some()
    }
}

#[derive(Debug, Default)]
struct RecordState {
    found_header_col: Option<u32>,
    resolution: Option<Resolution>,
}

/// 用一把互斥锁串行化所有读写的记录。
#[derive(Debug, Default)]
pub struct MutexRecord {
    state: Mutex<RecordState>,
}

impl MutexRecord {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RecordState> {
        // 锁内没有会 panic 的代码，中毒时的数据仍然完整
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DetectionRecord for MutexRecord {
    fn observe_marker(&self, row: u32, col: u32, pixel: Pixel) -> MarkerObservation {
        let mut state = self.lock();
        match state.found_header_col {
            None => {
                state.found_header_col = Some(col);
                MarkerObservation::Opened
            }
            Some(first_col) if col > first_col => {
                if state.resolution.is_some() {
                    return MarkerObservation::AlreadyResolved;
                }
                let resolution =
                    Resolution::from_length_pixel(row, col, first_col, (row, col), pixel);
                state.resolution = Some(resolution);
                MarkerObservation::Closed(resolution)
            }
            Some(_) => MarkerObservation::Ignored,
        }
    }

    fn found_header_col(&self) -> Option<u32> {
        self.lock().found_header_col
    }

    fn resolution(&self) -> Option<Resolution> {
        self.lock().resolution
    }
}

const UNSET: u64 = u64::MAX;

/// 无锁实现：对列做 compare-and-swap，解析结果写入一次性单元。
#[derive(Debug)]
pub struct AtomicRecord {
    found_header_col: AtomicU64,
    resolution: OnceLock<Resolution>,
}

impl Default for AtomicRecord {
    fn default() -> Self {
        Self {
            found_header_col: AtomicU64::new(UNSET),
            resolution: OnceLock::new(),
        }
    }
}

impl AtomicRecord {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DetectionRecord for AtomicRecord {
    fn observe_marker(&self, row: u32, col: u32, pixel: Pixel) -> MarkerObservation {
        match self.found_header_col.compare_exchange(
            UNSET,
            u64::from(col),
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => MarkerObservation::Opened,
            Err(first_col) if u64::from(col) > first_col => {
                // first_col 来自一个 u32 列号
                let resolution =
                    Resolution::from_length_pixel(row, col, first_col as u32, (row, col), pixel);
                match self.resolution.set(resolution) {
                    Ok(()) => MarkerObservation::Closed(resolution),
                    Err(_) => MarkerObservation::AlreadyResolved,
                }
            }
            Err(_) => MarkerObservation::Ignored,
        }
    }

    fn found_header_col(&self) -> Option<u32> {
        match self.found_header_col.load(Ordering::Acquire) {
            UNSET => None,
            col => Some(col as u32),
        }
    }

    fn resolution(&self) -> Option<Resolution> {
        self.resolution.get().copied()
    }
}
