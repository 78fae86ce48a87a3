//! # 并行扫描
//!
//! 把所有行静态划分成若干连续区间，每个工作线程独立扫描自己的区间，
//! 以 `LANES` 个像素为一批做哨兵比较，并通过 [`DetectionRecord`] 协调。
//!
//! 协调线程总是等待所有工作线程结束后才读取记录。默认情况下，
//! 某个线程解析出长度并不会让其他线程提前结束，总工作量不会因此减少。

use std::ops::Range;
use std::thread;

use super::record::{DetectionRecord, MarkerObservation, MutexRecord};
use super::{Resolution, clamp_workers};
use crate::error::DecodeError;
use crate::grid::PixelGrid;
use crate::matcher::{LANES, is_marker_pixel, match_batch};

/// 把 `height` 行划分为 `workers` 个连续区间，最后一个区间吸收余数。
///
/// 行数少于线程数时，前面的区间为空。
pub fn partition_rows(height: u32, workers: usize) -> Vec<Range<u32>> {
    let workers = clamp_workers(workers) as u32;
    let per_worker = height / workers;
    (0..workers)
        .map(|worker| {
            let start = worker * per_worker;
            let end = if worker == workers - 1 {
                height
            } else {
                start + per_worker
            };
            start..end
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParallelScanner {
    workers: usize,
    cancel_on_resolve: bool,
}

impl ParallelScanner {
    pub fn new(workers: usize) -> Self {
        Self {
            workers: clamp_workers(workers),
            cancel_on_resolve: false,
        }
    }

    /// 解析出长度后，其余线程在下一行开始前退出。
    pub fn with_cancel_on_resolve(mut self, cancel_on_resolve: bool) -> Self {
        self.cancel_on_resolve = cancel_on_resolve;
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// 使用默认的互斥锁记录扫描。
    pub fn scan(&self, grid: &PixelGrid<'_>) -> Result<Option<Resolution>, DecodeError> {
        self.scan_with_record(grid, &MutexRecord::new())
    }

    /// 使用调用方提供的记录扫描。记录应当是全新的。
    ///
    /// # Errors
    ///
    /// 无法创建线程时返回 `DecodeError::WorkerSpawn`，
    /// 工作线程 panic 时返回 `DecodeError::WorkerPanicked`。
    pub fn scan_with_record<R: DetectionRecord>(
        &self,
        grid: &PixelGrid<'_>,
        record: &R,
    ) -> Result<Option<Resolution>, DecodeError> {
        let partitions = partition_rows(grid.height(), self.workers);
        let cancel_on_resolve = self.cancel_on_resolve;

        thread::scope(|scope| {
            let mut handles = Vec::with_capacity(partitions.len());
            let mut spawn_error = None;

            for (worker, rows) in partitions.into_iter().enumerate() {
                log::debug!("worker {worker} scans rows {rows:?}");
                let spawned = thread::Builder::new()
                    .name(format!("scan-worker-{worker}"))
                    .spawn_scoped(scope, move || {
                        scan_rows(grid, rows, record, cancel_on_resolve)
                    });
                match spawned {
                    Ok(handle) => handles.push((worker, handle)),
                    Err(err) => {
                        spawn_error = Some(err);
                        break;
                    }
                }
            }

            // 无论结果如何，先等待所有已启动的线程
            let mut panicked = None;
            for (worker, handle) in handles {
                if handle.join().is_err() && panicked.is_none() {
                    panicked = Some(worker);
                }
            }

            if let Some(err) = spawn_error {
                return Err(DecodeError::WorkerSpawn(err));
            }
            if let Some(worker) = panicked {
                return Err(DecodeError::WorkerPanicked { worker });
            }
            Ok(())
        })?;

        Ok(record.resolution())
    }
}

fn scan_rows<R: DetectionRecord>(
    grid: &PixelGrid<'_>,
    rows: Range<u32>,
    record: &R,
    cancel_on_resolve: bool,
) {
    let width = grid.width();
    for row in rows {
        if cancel_on_resolve && record.is_resolved() {
            log::debug!("worker stops before row {row}: message already resolved");
            return;
        }

        let mut col = 0;
        while col < width {
            if let Some(batch) = grid.batch(row, col) {
                for lane in match_batch(batch).lanes() {
                    let marker_col = col + lane as u32;
                    if observe(grid, record, row, marker_col) {
                        return;
                    }
                }
                col += LANES as u32;
            } else {
                if is_marker_pixel(grid.pixel(row, col)) && observe(grid, record, row, col) {
                    return;
                }
                col += 1;
            }
        }
    }
}

/// 返回 `true` 表示该工作线程应当结束。
fn observe<R: DetectionRecord>(grid: &PixelGrid<'_>, record: &R, row: u32, col: u32) -> bool {
    let observation = record.observe_marker(row, col, grid.pixel(row, col));
    match observation {
        MarkerObservation::Opened => log::debug!("marker found at ({row}, {col})"),
        MarkerObservation::Closed(resolution) => log::debug!(
            "header line closed at ({row}, {col}), message_len={}",
            resolution.message_len
        ),
        MarkerObservation::AlreadyResolved => {
            log::debug!("header line closed at ({row}, {col}) after another worker resolved")
        }
        MarkerObservation::Ignored => {}
    }
    observation.ends_worker()
}
