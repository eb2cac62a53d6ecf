//! 分支极少的整数位运算工具。
//!
//! # 模块定位（Why）
//! - 视图、写入器与竞技场的所有容量/对齐计算都落在这里，保证扩容策略在各组件间一致；
//! - 最高/最低置位的查找被 [`Slice::common_prefix_len`](crate::Slice::common_prefix_len)
//!   用于按机器字比较键，属于热路径。
//!
//! # 约定（What）
//! - 所有函数对其定义域是全函数，除非返回 `Result`；
//! - 对输入 0，`most_significant_bit`/`least_significant_bit` 返回位宽（32 或 64），
//!   因而 `*_non_zero_byte` 返回字节宽（4 或 8），表示“不存在”；
//! - 对齐函数只提供无符号版本，统一规则为“将 `max(size, minimum)` 向上取整到对齐倍数”，
//!   因此 `align(0, a, 0) == 0`，`align(0, a, a) == a`。

use crate::error::{MAX_SLICE_LEN, Result, SliceError};

const DEBRUIJN_32: u32 = 0x07C4_ACDD;
const DEBRUIJN_64: u64 = 0x03F7_9D71_B4CB_0A89;

const MSB_TABLE_32: [u8; 32] = [
    0, 9, 1, 10, 13, 21, 2, 29, 11, 14, 16, 18, 22, 25, 3, 30, 8, 12, 20, 28, 15, 17, 24, 7, 19,
    27, 23, 6, 26, 5, 4, 31,
];

const MSB_TABLE_64: [u8; 64] = [
    0, 47, 1, 56, 48, 27, 2, 60, 57, 49, 41, 37, 28, 16, 3, 61, 54, 58, 35, 52, 50, 42, 21, 44,
    38, 32, 29, 23, 17, 11, 4, 62, 46, 55, 26, 59, 40, 36, 15, 53, 34, 51, 20, 43, 31, 22, 10, 45,
    25, 39, 14, 33, 19, 30, 9, 24, 13, 18, 8, 12, 7, 6, 5, 63,
];

/// 返回不小于 `x` 的最小 2 的幂；`x == 0` 时返回 1。
///
/// 结果超出 `u32` 表示范围（`x > 2^31`）时返回容量错误。
///
/// ```rust
/// use spark_slice::bits::next_power_of_two;
///
/// assert_eq!(next_power_of_two(0).unwrap(), 1);
/// assert_eq!(next_power_of_two(5).unwrap(), 8);
/// assert!(next_power_of_two(u32::MAX).is_err());
/// ```
pub fn next_power_of_two(x: u32) -> Result<u32> {
    if x == 0 {
        return Ok(1);
    }
    if x > 1 << 31 {
        return Err(SliceError::capacity(format!(
            "{x} 的下一个 2 的幂超出 32 位范围"
        )));
    }
    let mut v = x - 1;
    v |= v >> 1;
    v |= v >> 2;
    v |= v >> 4;
    v |= v >> 8;
    v |= v >> 16;
    Ok(v + 1)
}

/// 64 位版本的 [`next_power_of_two`]。
pub fn next_power_of_two_64(x: u64) -> Result<u64> {
    if x == 0 {
        return Ok(1);
    }
    if x > 1 << 63 {
        return Err(SliceError::capacity(format!(
            "{x} 的下一个 2 的幂超出 64 位范围"
        )));
    }
    let mut v = x - 1;
    v |= v >> 1;
    v |= v >> 2;
    v |= v >> 4;
    v |= v >> 8;
    v |= v >> 16;
    v |= v >> 32;
    Ok(v + 1)
}

/// 面向容量计算的 `usize` 版本。
pub fn next_power_of_two_usize(x: usize) -> Result<usize> {
    let rounded = next_power_of_two_64(x as u64)?;
    usize::try_from(rounded)
        .map_err(|_| SliceError::capacity(format!("{x} 的下一个 2 的幂超出 usize 范围")))
}

/// `x` 是否为 2 的幂（0 不是）。
pub const fn is_power_of_two(x: u32) -> bool {
    x > 0 && x & (x - 1) == 0
}

/// 64 位版本。
pub const fn is_power_of_two_64(x: u64) -> bool {
    x > 0 && x & (x - 1) == 0
}

/// 将 `max(size, minimum)` 向上取整到 `alignment` 的倍数（任意正整数对齐，使用除法）。
///
/// # 契约说明（What）
/// - `alignment == 0` 返回参数错误；
/// - 结果超过 [`MAX_SLICE_LEN`] 返回容量错误，与目标平台整数宽度无关。
pub fn align(size: usize, alignment: usize, minimum: usize) -> Result<usize> {
    if alignment == 0 {
        return Err(SliceError::argument("对齐值不能为 0"));
    }
    let base = size.max(minimum);
    let aligned = base
        .checked_add(alignment - 1)
        .map(|v| v / alignment * alignment);
    match aligned {
        Some(v) if v <= MAX_SLICE_LEN => Ok(v),
        _ => Err(SliceError::capacity(format!(
            "对齐 {base} 到 {alignment} 的结果超过上限"
        ))),
    }
}

/// [`align`] 的掩码版本，`alignment` 必须是 2 的幂，不做除法。
pub fn align_power_of_two(size: usize, alignment: usize, minimum: usize) -> Result<usize> {
    if !alignment.is_power_of_two() {
        return Err(SliceError::argument(format!(
            "对齐值 {alignment} 不是 2 的幂"
        )));
    }
    let mask = alignment - 1;
    let base = size.max(minimum);
    match base.checked_add(mask) {
        Some(v) if (v & !mask) <= MAX_SLICE_LEN => Ok(v & !mask),
        _ => Err(SliceError::capacity(format!(
            "对齐 {base} 到 {alignment} 的结果超过上限"
        ))),
    }
}

/// 距离下一个 `alignment` 边界还差多少字节；已对齐时为 0。
///
/// `alignment` 必须是 2 的幂。
pub const fn padding_power_of_two(size: usize, alignment: usize) -> usize {
    debug_assert!(alignment.is_power_of_two());
    size.wrapping_neg() & (alignment - 1)
}

/// SWAR 方式统计置位数量。
pub const fn count_bits(x: u32) -> u32 {
    let mut v = x;
    v -= (v >> 1) & 0x5555_5555;
    v = (v & 0x3333_3333) + ((v >> 2) & 0x3333_3333);
    v = (v + (v >> 4)) & 0x0F0F_0F0F;
    v.wrapping_mul(0x0101_0101) >> 24
}

/// 64 位置位计数。
pub const fn count_bits_64(x: u64) -> u32 {
    let mut v = x;
    v -= (v >> 1) & 0x5555_5555_5555_5555;
    v = (v & 0x3333_3333_3333_3333) + ((v >> 2) & 0x3333_3333_3333_3333);
    v = (v + (v >> 4)) & 0x0F0F_0F0F_0F0F_0F0F;
    (v.wrapping_mul(0x0101_0101_0101_0101) >> 56) as u32
}

/// 最高置位的位序号；`x == 0` 时返回 32。
///
/// 先把最高位向下“淹没”成全 1，再乘 de Bruijn 常数取高 5 位查表。
pub const fn most_significant_bit(x: u32) -> u32 {
    if x == 0 {
        return 32;
    }
    let mut v = x;
    v |= v >> 1;
    v |= v >> 2;
    v |= v >> 4;
    v |= v >> 8;
    v |= v >> 16;
    MSB_TABLE_32[(v.wrapping_mul(DEBRUIJN_32) >> 27) as usize] as u32
}

/// 最高置位的位序号；`x == 0` 时返回 64。
pub const fn most_significant_bit_64(x: u64) -> u32 {
    if x == 0 {
        return 64;
    }
    let mut v = x;
    v |= v >> 1;
    v |= v >> 2;
    v |= v >> 4;
    v |= v >> 8;
    v |= v >> 16;
    v |= v >> 32;
    MSB_TABLE_64[(v.wrapping_mul(DEBRUIJN_64) >> 58) as usize] as u32
}

/// 最低置位的位序号；`x == 0` 时返回 32。
///
/// `x & -x` 只保留最低位，转成浮点后其指数字段就是位序号（2 的幂在 `f32` 中可精确表示）。
pub fn least_significant_bit(x: u32) -> u32 {
    if x == 0 {
        return 32;
    }
    let isolated = x & x.wrapping_neg();
    ((isolated as f32).to_bits() >> 23) - 127
}

/// 最低置位的位序号；`x == 0` 时返回 64。
pub fn least_significant_bit_64(x: u64) -> u32 {
    if x == 0 {
        return 64;
    }
    let isolated = x & x.wrapping_neg();
    (((isolated as f64).to_bits() >> 52) as u32) - 1023
}

/// 按小端内存顺序，第一个非零字节的下标；全零时返回 4。
pub fn first_non_zero_byte(x: u32) -> u32 {
    least_significant_bit(x) >> 3
}

/// 按小端内存顺序，第一个非零字节的下标；全零时返回 8。
pub fn first_non_zero_byte_64(x: u64) -> u32 {
    least_significant_bit_64(x) >> 3
}

/// 按小端内存顺序，最后一个非零字节的下标；全零时返回 4。
pub const fn last_non_zero_byte(x: u32) -> u32 {
    most_significant_bit(x) >> 3
}

/// 按小端内存顺序，最后一个非零字节的下标；全零时返回 8。
pub const fn last_non_zero_byte_64(x: u64) -> u32 {
    most_significant_bit_64(x) >> 3
}

/// 循环左移，`n` 按 32 取模。
pub const fn rotate_left_32(x: u32, n: u32) -> u32 {
    x.rotate_left(n)
}

/// 循环右移，`n` 按 32 取模。
pub const fn rotate_right_32(x: u32, n: u32) -> u32 {
    x.rotate_right(n)
}

/// 循环左移，`n` 按 64 取模。
pub const fn rotate_left_64(x: u64, n: u32) -> u64 {
    x.rotate_left(n)
}

/// 循环右移，`n` 按 64 取模。
pub const fn rotate_right_64(x: u64, n: u32) -> u64 {
    x.rotate_right(n)
}
