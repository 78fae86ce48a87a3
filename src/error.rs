//! # 错误类型模块
//!
//! 核心算法 (头部解析、像素视图、扫描与提取) 统一返回 `DecodeError`。
//! 命令处理层再用 `anyhow` 为其附加上下文信息。

use std::io;

/// 解码过程中可能出现的全部错误。
///
/// 这些错误都是本地的、不可重试的条件。
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// 文件长度不足以容纳固定布局的 BMP 头部。
    #[error("bitmap header is truncated: {len} bytes available")]
    TruncatedHeader { len: usize },

    /// 像素缓冲区短于几何信息所要求的长度。
    #[error("pixel data is too small: required {required} bytes, found {actual}")]
    InputTooSmall { required: u64, actual: u64 },

    /// 扫描结束，但没有找到完整的标题行。
    #[error("no marker header line was found in the image")]
    NoMarkerFound,

    /// 提取窗口无法容纳声明的消息长度。
    #[error(
        "message of {message_len} bytes does not fit the extraction window \
         (start row {start_row}, columns {start_col}..={end_col})"
    )]
    ExtractionOutOfBounds {
        message_len: u16,
        start_row: i64,
        start_col: u32,
        end_col: u32,
    },

    /// 无法创建扫描工作线程。
    #[error("failed to spawn scan worker")]
    WorkerSpawn(#[from] io::Error),

    /// 某个扫描工作线程发生了 panic。
    #[error("scan worker {worker} panicked")]
    WorkerPanicked { worker: usize },
}
