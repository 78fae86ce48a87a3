//! # BMP 头部解析模块
//!
//! 按紧凑的小端布局读取 BMP 文件头与信息头中的几何字段。
//! 除了这些字段之外，不对容器格式做任何校验。

use crate::constants::BMP_HEADER_SIZE;
use crate::error::DecodeError;

fn u16_le(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

fn u32_le(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

/// 图像几何信息。行跨度由宽度与位深推导，不单独存储。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageGeometry {
    pub width: u32,
    pub height: u32,
    pub bits_per_pixel: u16,
    pub pixel_data_offset: u32,
}

impl ImageGeometry {
    /// 每行经过 4 字节对齐后的字节数：`ceil(width * bpp / 32) * 4`。
    pub fn row_stride(&self) -> u64 {
        (u64::from(self.width) * u64::from(self.bits_per_pixel)).div_ceil(32) * 4
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// BMP 文件头与信息头中本程序关心的字段。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitmapHeader {
    pub signature: [u8; 2],
    pub file_size: u32,
    pub pixel_data_offset: u32,
    pub info_header_size: u32,
    pub width: u32,
    pub height: u32,
    pub planes: u16,
    pub bits_per_pixel: u16,
    pub compression: u32,
    pub compressed_size: u32,
}

impl BitmapHeader {
    /// 从文件开头解析头部。
    ///
    /// # Errors
    ///
    /// 如果字节数少于头部长度，返回 `DecodeError::TruncatedHeader`。
    pub fn parse(bytes: &[u8]) -> Result<Self, DecodeError> {
        if bytes.len() < BMP_HEADER_SIZE {
            return Err(DecodeError::TruncatedHeader { len: bytes.len() });
        }

        let header = Self {
            signature: [bytes[0], bytes[1]],
            file_size: u32_le(bytes, 2),
            pixel_data_offset: u32_le(bytes, 10),
            info_header_size: u32_le(bytes, 14),
            width: u32_le(bytes, 18),
            height: u32_le(bytes, 22),
            planes: u16_le(bytes, 26),
            bits_per_pixel: u16_le(bytes, 28),
            compression: u32_le(bytes, 30),
            compressed_size: u32_le(bytes, 34),
        };

        if &header.signature != b"BM" {
            log::warn!(
                "unexpected bitmap signature {:?}, continuing with the declared geometry",
                header.signature
            );
        }

        Ok(header)
    }

    pub fn geometry(&self) -> ImageGeometry {
        ImageGeometry {
            width: self.width,
            height: self.height,
            bits_per_pixel: self.bits_per_pixel,
            pixel_data_offset: self.pixel_data_offset,
        }
    }

    /// 返回从像素数据偏移开始的切片。
    ///
    /// # Errors
    ///
    /// 偏移超出文件末尾时返回 `DecodeError::InputTooSmall`。
    pub fn pixel_data<'a>(&self, file: &'a [u8]) -> Result<&'a [u8], DecodeError> {
        let offset = self.pixel_data_offset as usize;
        file.get(offset..).ok_or(DecodeError::InputTooSmall {
            required: u64::from(self.pixel_data_offset),
            actual: file.len() as u64,
        })
    }
}
