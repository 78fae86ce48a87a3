//! # 哨兵匹配模块
//!
//! 判断像素是否等于固定的哨兵颜色。提供逐像素的标量形式，
//! 以及一次比较 `LANES` 个像素的批量形式。两者的结果必须逐像素完全一致。

use std::sync::OnceLock;

use crate::constants::{BYTES_PER_PIXEL, MARKER_BLUE, MARKER_GREEN, MARKER_RED};
use crate::grid::Pixel;

/// 哨兵颜色。
pub const MARKER: Pixel = Pixel::new(MARKER_BLUE, MARKER_GREEN, MARKER_RED);

/// 一个批次包含的像素数 (一个 256 位寄存器可容纳 8 个 4 字节像素)。
pub const LANES: usize = 8;

/// 一个批次的字节数。
pub const BATCH_BYTES: usize = LANES * BYTES_PER_PIXEL;

/// 标量比较；第四个字节被忽略。
#[inline]
pub fn is_marker(blue: u8, green: u8, red: u8) -> bool {
    blue == MARKER_BLUE && green == MARKER_GREEN && red == MARKER_RED
}

#[inline]
pub fn is_marker_pixel(pixel: Pixel) -> bool {
    is_marker(pixel.blue, pixel.green, pixel.red)
}

/// 批量比较的结果：第 `i` 位表示第 `i` 个像素是否为哨兵。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LaneMask(u8);

impl LaneMask {
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, lane: usize) -> bool {
        lane < LANES && self.0 & (1 << lane) != 0
    }

    /// 按列的升序返回所有命中的通道。
    pub fn lanes(self) -> impl Iterator<Item = usize> {
        (0..LANES).filter(move |&lane| self.contains(lane))
    }
}

type BatchKernel = unsafe fn(&[u8; BATCH_BYTES]) -> LaneMask;

fn batch_kernel() -> BatchKernel {
    static KERNEL: OnceLock<BatchKernel> = OnceLock::new();
    *KERNEL.get_or_init(select_batch_kernel)
}

fn select_batch_kernel() -> BatchKernel {
    #[cfg(target_arch = "x86_64")]
    {
        if std::arch::is_x86_feature_detected!("avx2") {
            log::debug!("marker matcher: using AVX2 kernel");
            return match_batch_avx2;
        }
    }
    log::debug!("marker matcher: using portable kernel");
    match_batch_portable
}

/// 批量比较，在运行时选择可用的最快实现。
#[inline]
pub fn match_batch(batch: &[u8; BATCH_BYTES]) -> LaneMask {
    let kernel = batch_kernel();
    // SAFETY: 只有在检测到对应 CPU 特性后才会选中 SIMD 实现。
    unsafe { kernel(batch) }
}

/// 可移植实现：分别求出蓝、绿、红三个逐通道掩码，再按位与。
pub fn match_batch_portable(batch: &[u8; BATCH_BYTES]) -> LaneMask {
    let mut blue = 0u8;
    let mut green = 0u8;
    let mut red = 0u8;
    for (lane, pixel) in batch.chunks_exact(BYTES_PER_PIXEL).enumerate() {
        blue |= u8::from(pixel[0] == MARKER_BLUE) << lane;
        green |= u8::from(pixel[1] == MARKER_GREEN) << lane;
        red |= u8::from(pixel[2] == MARKER_RED) << lane;
    }
    LaneMask(blue & green & red)
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn match_batch_avx2(batch: &[u8; BATCH_BYTES]) -> LaneMask {
    use std::arch::x86_64::{
        __m256i, _mm256_cmpeq_epi8, _mm256_loadu_si256, _mm256_movemask_epi8, _mm256_set1_epi32,
    };

    // 每个像素的第四个字节与 0 比较，其结果在下面被屏蔽掉
    let target = i32::from_le_bytes([MARKER_BLUE, MARKER_GREEN, MARKER_RED, 0]);
    let bits = unsafe {
        let pixels = _mm256_loadu_si256(batch.as_ptr() as *const __m256i);
        let equal = _mm256_cmpeq_epi8(pixels, _mm256_set1_epi32(target));
        _mm256_movemask_epi8(equal) as u32
    };

    let mut mask = 0u8;
    for lane in 0..LANES {
        if (bits >> (lane * BYTES_PER_PIXEL)) & 0b111 == 0b111 {
            mask |= 1 << lane;
        }
    }
    LaneMask(mask)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch_with_markers(lanes: &[usize]) -> [u8; BATCH_BYTES] {
        let mut batch = [0u8; BATCH_BYTES];
        for &lane in lanes {
            let offset = lane * BYTES_PER_PIXEL;
            batch[offset..offset + 3].copy_from_slice(&[MARKER_BLUE, MARKER_GREEN, MARKER_RED]);
        }
        batch
    }

    #[test]
    fn scalar_ignores_unused_byte() {
        assert!(is_marker(127, 188, 217));
        assert!(!is_marker(127, 188, 216));
        assert!(!is_marker(217, 188, 127));
        assert!(is_marker_pixel(MARKER));
    }

    #[test]
    fn batch_reports_marker_lanes() {
        let mut batch = batch_with_markers(&[0, 3, 7]);
        batch[3] = 0xFF;
        let mask = match_batch(&batch);

        assert_eq!(mask.bits(), 0b1000_1001);
        assert_eq!(mask.lanes().collect::<Vec<_>>(), vec![0, 3, 7]);
        assert_eq!(mask, match_batch_portable(&batch));
    }

    #[test]
    fn partial_channel_matches_do_not_count() {
        let mut batch = [0u8; BATCH_BYTES];
        // 蓝绿匹配但红色不匹配
        batch[0..3].copy_from_slice(&[MARKER_BLUE, MARKER_GREEN, 0]);
        // 颜色跨越两个像素的边界
        batch[6..9].copy_from_slice(&[MARKER_BLUE, MARKER_GREEN, MARKER_RED]);

        assert!(match_batch(&batch).is_empty());
        assert!(match_batch_portable(&batch).is_empty());
    }
}
