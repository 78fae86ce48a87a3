//! # 像素网格视图模块
//!
//! 对像素缓冲区的只读、带边界检查的视图。
//! 缓冲区长度在构造时一次性校验，之后的每次通道读取都必定落在缓冲区之内。

use crate::bitmap::ImageGeometry;
use crate::constants::BYTES_PER_PIXEL;
use crate::error::DecodeError;
use crate::matcher::{BATCH_BYTES, LANES};

/// 像素中四个字节的含义，按存储顺序排列。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Blue = 0,
    Green = 1,
    Red = 2,
    Unused = 3,
}

/// 一个像素的三个颜色通道。第四个字节不参与任何比较。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pixel {
    pub blue: u8,
    pub green: u8,
    pub red: u8,
}

impl Pixel {
    pub const fn new(blue: u8, green: u8, red: u8) -> Self {
        Self { blue, green, red }
    }

    /// 长度像素的编码：蓝色与红色通道之和，绿色通道不参与。
    pub fn encoded_length(&self) -> u16 {
        u16::from(self.blue) + u16::from(self.red)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PixelGrid<'a> {
    data: &'a [u8],
    width: u32,
    height: u32,
    row_stride: usize,
}

impl<'a> PixelGrid<'a> {
    /// 在像素缓冲区上建立视图。
    ///
    /// 所需长度为 `row_stride * height`；当位深低于 32 位、最后一行按 4 字节读取
    /// 会越过该长度时，以最后一个像素的末尾为准。
    ///
    /// # Errors
    ///
    /// 缓冲区不足时返回 `DecodeError::InputTooSmall`。
    pub fn new(data: &'a [u8], geometry: ImageGeometry) -> Result<Self, DecodeError> {
        let actual = data.len() as u64;
        // 头部中的宽高可以任意取值，乘积溢出时按无法满足处理
        let required = required_len(&geometry).unwrap_or(u64::MAX);
        if actual < required {
            return Err(DecodeError::InputTooSmall { required, actual });
        }

        let row_stride =
            usize::try_from(geometry.row_stride()).map_err(|_| DecodeError::InputTooSmall {
                required,
                actual,
            })?;

        Ok(Self {
            data,
            width: geometry.width,
            height: geometry.height,
            row_stride,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn row_stride(&self) -> usize {
        self.row_stride
    }

    fn offset(&self, row: u32, col: u32) -> usize {
        assert!(
            row < self.height && col < self.width,
            "pixel ({row}, {col}) outside {}x{} grid",
            self.width,
            self.height
        );
        row as usize * self.row_stride + col as usize * BYTES_PER_PIXEL
    }

    pub fn channel(&self, row: u32, col: u32, channel: Channel) -> u8 {
        self.data[self.offset(row, col) + channel as usize]
    }

    pub fn pixel(&self, row: u32, col: u32) -> Pixel {
        let offset = self.offset(row, col);
        Pixel::new(
            self.data[offset],
            self.data[offset + 1],
            self.data[offset + 2],
        )
    }

    /// 返回同一行中从 `col` 开始的连续 `LANES` 个像素；剩余像素不足时返回 `None`。
    pub fn batch(&self, row: u32, col: u32) -> Option<&'a [u8; BATCH_BYTES]> {
        if u64::from(col) + LANES as u64 > u64::from(self.width) {
            return None;
        }
        let offset = self.offset(row, col);
        let data: &'a [u8] = self.data;
        data[offset..offset + BATCH_BYTES].try_into().ok()
    }
}

fn required_len(geometry: &ImageGeometry) -> Option<u64> {
    if geometry.is_empty() {
        return Some(0);
    }
    let stride = geometry.row_stride();
    let height = u64::from(geometry.height);
    let row_bytes = u64::from(geometry.width) * BYTES_PER_PIXEL as u64;
    let last_pixel_end = (height - 1).checked_mul(stride)?.checked_add(row_bytes)?;
    Some(stride.checked_mul(height)?.max(last_pixel_end))
}
