//! # 消息恢复
//!
//! 按配置选择扫描策略，定位标题行并提取消息。

use crate::error::DecodeError;
use crate::extractor::extract;
use crate::grid::PixelGrid;
use crate::scanner::parallel::ParallelScanner;
use crate::scanner::{Resolution, ScanConfig, ScanStrategy, sequential};

/// 定位标题行并解析提取参数，不读取消息本身。
///
/// 宽或高为 0 的图像与没有标题行的图像一样，返回 `Ok(None)`。
pub fn locate(grid: &PixelGrid<'_>, config: &ScanConfig) -> Result<Option<Resolution>, DecodeError> {
    if grid.width() == 0 || grid.height() == 0 {
        log::debug!(
            "degenerate geometry {}x{}, nothing to scan",
            grid.width(),
            grid.height()
        );
        return Ok(None);
    }

    match config.strategy {
        ScanStrategy::Sequential => Ok(sequential::scan(grid)),
        ScanStrategy::Parallel => ParallelScanner::new(config.workers)
            .with_cancel_on_resolve(config.cancel_on_resolve)
            .scan(grid),
    }
}

/// 定位并提取隐藏的消息。
///
/// # Errors
///
/// * 没有找到标题行时返回 `DecodeError::NoMarkerFound`；
/// * 提取窗口无法容纳消息时返回 `DecodeError::ExtractionOutOfBounds`；
/// * 并行扫描的线程错误原样返回。
pub fn recover_message(grid: &PixelGrid<'_>, config: &ScanConfig) -> Result<Vec<u8>, DecodeError> {
    let resolution = locate(grid, config)?.ok_or(DecodeError::NoMarkerFound)?;
    extract(grid, &resolution)
}
