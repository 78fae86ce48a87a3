use super::{DetectionState, Resolution};
use crate::grid::PixelGrid;

/// 单线程光栅扫描：逐行、每行从左到右推进检测状态机，解析出长度后立即停止。
///
/// 宽或高为 0 时不进行任何迭代，返回 `None`。
pub fn scan(grid: &PixelGrid<'_>) -> Option<Resolution> {
    let mut state = DetectionState::default();
    for row in 0..grid.height() {
        for col in 0..grid.width() {
            state.advance(row, col, grid.pixel(row, col));
            if let Some(resolution) = state.resolution() {
                return Some(resolution);
            }
        }
    }
    log::debug!("sequential scan finished in state {state:?}");
    None
}
