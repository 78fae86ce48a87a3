#![allow(dead_code)]

use marker_decode::bitmap::ImageGeometry;
use marker_decode::grid::PixelGrid;
use marker_decode::matcher::{MARKER, is_marker};
use rand::RngCore;
use std::fs;
use std::path::Path;

pub const MARKER_BGR: [u8; 3] = [MARKER.blue, MARKER.green, MARKER.red];

/// 一个自下而上存储的测试画布。
///
/// 无论位深如何，每个像素都按 4 字节读写；位深低于 32 位时，
/// 行末的像素会与下一行开头的像素共享字节。
pub struct Canvas {
    pub width: u32,
    pub height: u32,
    pub bits_per_pixel: u16,
    pub data: Vec<u8>,
}

impl Canvas {
    /// 全零像素的 32 位画布。
    pub fn blank(width: u32, height: u32) -> Self {
        Self::blank_with_depth(width, height, 32)
    }

    pub fn blank_with_depth(width: u32, height: u32, bits_per_pixel: u16) -> Self {
        let mut canvas = Self {
            width,
            height,
            bits_per_pixel,
            data: Vec::new(),
        };
        let len = if canvas.geometry().is_empty() {
            0
        } else {
            let stride = canvas.row_stride();
            (stride * height as usize).max(stride * (height as usize - 1) + width as usize * 4)
        };
        canvas.data = vec![0u8; len];
        canvas
    }

    /// 随机像素的 32 位画布，保证其中没有哨兵像素。
    pub fn noisy(width: u32, height: u32) -> Self {
        Self::noisy_with_depth(width, height, 32)
    }

    pub fn noisy_with_depth(width: u32, height: u32, bits_per_pixel: u16) -> Self {
        let mut canvas = Self::blank_with_depth(width, height, bits_per_pixel);
        rand::rng().fill_bytes(&mut canvas.data);
        canvas.data.chunks_exact_mut(4).for_each(|pixel| {
            if is_marker(pixel[0], pixel[1], pixel[2]) {
                pixel[1] ^= 1;
            }
        });
        canvas
    }

    pub fn row_stride(&self) -> usize {
        self.geometry().row_stride() as usize
    }

    fn offset(&self, row: u32, col: u32) -> usize {
        assert!(row < self.height && col < self.width);
        row as usize * self.row_stride() + col as usize * 4
    }

    pub fn set(&mut self, row: u32, col: u32, bgr: [u8; 3]) {
        let offset = self.offset(row, col);
        self.data[offset..offset + 3].copy_from_slice(&bgr);
    }

    pub fn mark(&mut self, row: u32, col: u32) {
        self.set(row, col, MARKER_BGR);
    }

    /// 按提取顺序写入消息：从 `start_row` 向下递减行号，
    /// 每行 `start_col..=end_col`，每个像素蓝、绿、红。
    pub fn embed(&mut self, start_row: u32, start_col: u32, end_col: u32, message: &[u8]) {
        let mut bytes = message.iter();
        for row in (0..=start_row).rev() {
            for col in start_col..=end_col {
                let offset = self.offset(row, col);
                for channel in 0..3 {
                    match bytes.next() {
                        Some(&byte) => self.data[offset + channel] = byte,
                        None => return,
                    }
                }
            }
        }
        assert!(bytes.next().is_none(), "message does not fit the window");
    }

    pub fn geometry(&self) -> ImageGeometry {
        ImageGeometry {
            width: self.width,
            height: self.height,
            bits_per_pixel: self.bits_per_pixel,
            pixel_data_offset: 54,
        }
    }

    pub fn grid(&self) -> PixelGrid<'_> {
        PixelGrid::new(&self.data, self.geometry()).expect("canvas buffer matches its geometry")
    }

    /// 编码为 54 字节头部 + 像素数据的 BMP 文件内容。
    pub fn to_bmp(&self) -> Vec<u8> {
        let file_size = 54 + self.data.len() as u32;
        let mut bytes = Vec::with_capacity(file_size as usize);
        bytes.extend_from_slice(b"BM");
        bytes.extend_from_slice(&file_size.to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes.extend_from_slice(&54u32.to_le_bytes());
        bytes.extend_from_slice(&40u32.to_le_bytes());
        bytes.extend_from_slice(&self.width.to_le_bytes());
        bytes.extend_from_slice(&self.height.to_le_bytes());
        bytes.extend_from_slice(&1u16.to_le_bytes());
        bytes.extend_from_slice(&self.bits_per_pixel.to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes.extend_from_slice(&(self.data.len() as u32).to_le_bytes());
        bytes.extend_from_slice(&[0u8; 16]);
        bytes.extend_from_slice(&self.data);
        bytes
    }

    pub fn save(&self, path: &Path) {
        fs::write(path, self.to_bmp()).expect("Failed to create test image.");
    }
}

/// 一幅带有标题行的画布：
/// `header_row` 行的 `first_col` 与 `second_col` 处为哨兵，
/// 紧随其后的像素为长度像素 `(blue, 0x55, red)`，
/// 消息从 `header_row - 2` 行开始向上写入 `first_col + 2 ..= second_col + 1` 列。
pub fn sequential_canvas(
    width: u32,
    height: u32,
    header_row: u32,
    first_col: u32,
    second_col: u32,
    message: &[u8],
) -> Canvas {
    sequential_canvas_with_depth(width, height, 32, header_row, first_col, second_col, message)
}

pub fn sequential_canvas_with_depth(
    width: u32,
    height: u32,
    bits_per_pixel: u16,
    header_row: u32,
    first_col: u32,
    second_col: u32,
    message: &[u8],
) -> Canvas {
    let mut canvas = Canvas::noisy_with_depth(width, height, bits_per_pixel);
    canvas.mark(header_row, first_col);
    canvas.mark(header_row, second_col);

    let len = message.len() as u16;
    let blue = len.min(255) as u8;
    let red = (len - u16::from(blue)) as u8;
    canvas.set(header_row, second_col + 1, [blue, 0x55, red]);
    canvas.embed(header_row - 2, first_col + 2, second_col + 1, message);
    canvas
}
