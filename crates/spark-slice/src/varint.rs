//! 无符号变长整数（varint）：每字节 7 位有效载荷，最高位为续位，低位组在前。
//!
//! 16/32/64 位最多分别占 3/5/10 字节。

use crate::bits::most_significant_bit_64;
use crate::error::{Result, SliceError, codes};

mod sealed {
    pub trait Sealed {}
}

/// 可进行 varint 编解码的无符号整数。
pub trait VarInt: sealed::Sealed + Copy + 'static {
    /// 编码后的最大字节数。
    const MAX_BYTES: usize;

    fn to_u64(self) -> u64;

    /// 值超出本类型范围时返回 `None`。
    fn from_u64(value: u64) -> Option<Self>;
}

macro_rules! impl_varint {
    ($($ty:ty => $max:expr),* $(,)?) => {
        $(
            impl sealed::Sealed for $ty {}

            impl VarInt for $ty {
                const MAX_BYTES: usize = $max;

                #[inline(always)]
                fn to_u64(self) -> u64 {
                    self as u64
                }

                #[inline(always)]
                fn from_u64(value: u64) -> Option<Self> {
                    <$ty>::try_from(value).ok()
                }
            }
        )*
    };
}

impl_varint!(u16 => 3, u32 => 5, u64 => 10);

/// `value` 编码后的字节数。
pub fn encoded_len(value: u64) -> usize {
    if value == 0 {
        return 1;
    }
    most_significant_bit_64(value) as usize / 7 + 1
}

/// 将 `value` 编码进 `dst` 开头，返回写入的字节数。调用方保证 `dst.len() >= 10`
/// 或不小于 [`encoded_len`]。
#[inline]
pub fn encode_into(mut value: u64, dst: &mut [u8]) -> usize {
    let mut written = 0;
    while value >= 0x80 {
        dst[written] = (value as u8) | 0x80;
        value >>= 7;
        written += 1;
    }
    dst[written] = value as u8;
    written + 1
}

/// 从 `src` 开头解码一个 `T`，返回 `(值, 消耗字节数)`。
///
/// # 契约说明（What）
/// - 续位链在 `T::MAX_BYTES` 字节内未结束：格式错误 `MALFORMED_VARINT`；
/// - 续位链尚未结束输入就已耗尽：截断错误 `TRUNCATED`；
/// - 解出的值超出 `T` 的范围（例如 3 字节 u16 的高位被置位）：格式错误 `MALFORMED_VARINT`。
pub fn decode<T: VarInt>(src: &[u8]) -> Result<(T, usize)> {
    let mut value: u64 = 0;
    let mut shift = 0u32;
    for index in 0..T::MAX_BYTES {
        let Some(&byte) = src.get(index) else {
            return Err(SliceError::truncated(index + 1, src.len()));
        };
        // 第 10 字节只剩 1 个有效位，更高的载荷位在移位时会被丢弃。
        if shift == 63 && byte & 0x7F > 1 {
            return Err(overflowing(T::MAX_BYTES));
        }
        value |= u64::from(byte & 0x7F) << shift;
        if byte & 0x80 == 0 {
            return T::from_u64(value)
                .map(|v| (v, index + 1))
                .ok_or_else(|| overflowing(T::MAX_BYTES));
        }
        shift += 7;
    }
    Err(SliceError::format(
        codes::MALFORMED_VARINT,
        format!("varint 续位链超过 {} 字节", T::MAX_BYTES),
    ))
}

fn overflowing(max_bytes: usize) -> SliceError {
    SliceError::format(
        codes::MALFORMED_VARINT,
        format!("{max_bytes} 字节 varint 的值超出目标宽度"),
    )
}
