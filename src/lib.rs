//! # marker_decode 库
//!
//! 本库包含哨兵像素消息提取工具的核心逻辑：
//! BMP 头部解析、像素网格视图、哨兵匹配、顺序与并行扫描以及消息提取。

// 声明库包含的所有模块。

pub mod bitmap;
pub mod cli;
pub mod constants;
pub mod error;
pub mod extractor;
pub mod grid;
pub mod handler;
pub mod matcher;
pub mod scanner;
pub mod steganography;

pub use error::DecodeError;
