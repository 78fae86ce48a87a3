//! # 消息提取模块
//!
//! 从长度像素上方两行开始，逐行向上 (行号递减) 读取 `start_col..=end_col`
//! 范围内的像素，每个像素依次输出蓝、绿、红三个字节，恰好输出声明的长度。

use crate::constants::PAYLOAD_CHANNELS;
use crate::error::DecodeError;
use crate::grid::{Channel, PixelGrid};
use crate::scanner::Resolution;

const PAYLOAD_ORDER: [Channel; PAYLOAD_CHANNELS] = [Channel::Blue, Channel::Green, Channel::Red];

/// 按解析结果提取消息。
///
/// 长度为 0 时直接返回空消息，不做任何读取。
///
/// # Errors
///
/// 在读取任何字节之前检查窗口能否容纳整条消息；起始行为负、列范围为空、
/// 列超出图像宽度或剩余行数不足时，返回 `DecodeError::ExtractionOutOfBounds`。
pub fn extract(grid: &PixelGrid<'_>, resolution: &Resolution) -> Result<Vec<u8>, DecodeError> {
    let message_len = usize::from(resolution.message_len);
    if message_len == 0 {
        return Ok(Vec::new());
    }

    let Some(start_row) = window_start_row(grid, resolution) else {
        return Err(out_of_bounds(resolution));
    };

    let mut message = Vec::with_capacity(message_len);
    'rows: for row in (0..=start_row).rev() {
        for col in resolution.start_col..=resolution.end_col {
            for channel in PAYLOAD_ORDER {
                message.push(grid.channel(row, col, channel));
                if message.len() == message_len {
                    break 'rows;
                }
            }
        }
    }

    log::debug!(
        "extracted {} bytes over {} rows starting at row {start_row}",
        message.len(),
        rows_needed(resolution)
    );
    Ok(message)
}

/// 校验提取窗口，成功时返回起始行。
fn window_start_row(grid: &PixelGrid<'_>, resolution: &Resolution) -> Option<u32> {
    if resolution.start_col > resolution.end_col || resolution.end_col >= grid.width() {
        return None;
    }
    let start_row = u32::try_from(resolution.start_row).ok()?;
    if start_row >= grid.height() {
        return None;
    }
    (rows_needed(resolution) <= start_row as usize + 1).then_some(start_row)
}

fn rows_needed(resolution: &Resolution) -> usize {
    let columns = (resolution.end_col - resolution.start_col) as usize + 1;
    usize::from(resolution.message_len).div_ceil(columns * PAYLOAD_CHANNELS)
}

fn out_of_bounds(resolution: &Resolution) -> DecodeError {
    DecodeError::ExtractionOutOfBounds {
        message_len: resolution.message_len,
        start_row: resolution.start_row,
        start_col: resolution.start_col,
        end_col: resolution.end_col,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmap::ImageGeometry;

    fn resolution(message_len: u16, start_row: i64, start_col: u32, end_col: u32) -> Resolution {
        Resolution {
            message_len,
            start_row,
            start_col,
            end_col,
            first_marker_col: start_col.saturating_sub(2),
            closing_marker: (0, end_col),
            length_row: 0,
            length_col: end_col,
        }
    }

    /// 每个像素的四个字节为 `[row*16 + col*4 + 0..4]`。
    fn counting_grid(data: &mut Vec<u8>, width: u32, height: u32) -> PixelGrid<'_> {
        *data = (0..width * height * 4).map(|i| i as u8).collect();
        PixelGrid::new(
            data,
            ImageGeometry {
                width,
                height,
                bits_per_pixel: 32,
                pixel_data_offset: 0,
            },
        )
        .unwrap()
    }

    #[test]
    fn walks_rows_upward_in_channel_order() {
        let mut data = Vec::new();
        let grid = counting_grid(&mut data, 4, 4);

        // 第 2 行列 1..=2，然后第 1 行列 1
        let message = extract(&grid, &resolution(8, 2, 1, 2)).unwrap();
        assert_eq!(message, vec![36, 37, 38, 40, 41, 42, 20, 21]);
    }

    #[test]
    fn stops_mid_pixel() {
        let mut data = Vec::new();
        let grid = counting_grid(&mut data, 4, 4);
        let message = extract(&grid, &resolution(1, 3, 3, 3)).unwrap();
        assert_eq!(message, vec![60]);
    }

    #[test]
    fn zero_length_skips_validation() {
        let mut data = Vec::new();
        let grid = counting_grid(&mut data, 4, 4);
        assert!(extract(&grid, &resolution(0, -2, 9, 1)).unwrap().is_empty());
    }

    #[test]
    fn negative_start_row_is_out_of_bounds() {
        let mut data = Vec::new();
        let grid = counting_grid(&mut data, 4, 4);
        let err = extract(&grid, &resolution(3, -1, 0, 0)).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::ExtractionOutOfBounds { start_row: -1, .. }
        ));
    }

    #[test]
    fn message_longer_than_window_is_out_of_bounds() {
        let mut data = Vec::new();
        let grid = counting_grid(&mut data, 4, 4);
        // 两行、每行一个像素：最多 6 字节
        assert!(extract(&grid, &resolution(6, 1, 2, 2)).is_ok());
        assert!(matches!(
            extract(&grid, &resolution(7, 1, 2, 2)),
            Err(DecodeError::ExtractionOutOfBounds { message_len: 7, .. })
        ));
    }

    #[test]
    fn empty_column_range_is_out_of_bounds() {
        let mut data = Vec::new();
        let grid = counting_grid(&mut data, 4, 4);
        assert!(extract(&grid, &resolution(2, 3, 3, 2)).is_err());
        assert!(extract(&grid, &resolution(2, 3, 2, 4)).is_err());
        assert!(extract(&grid, &resolution(2, 4, 0, 0)).is_err());
    }
}
