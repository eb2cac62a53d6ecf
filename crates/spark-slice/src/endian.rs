//! 定宽整数/浮点的字节序编解码。
//!
//! # 设计概要（How）
//! - 宽度由 [`FixedWidth`] 关联常量给出，字节序由零尺寸标记类型 [`LittleEndian`]/[`BigEndian`] 给出，
//!   写入器、读取器与可变视图共用同一组 `encode`/`decode`，不再为每种宽度和字节序各写一遍；
//! - 所有类型先映射到 `u64` 原始位模式，再截取低 `WIDTH` 字节，宽度在单态化后是常量，
//!   生成的代码不含分支；
//! - 浮点按 IEEE-754 原始位模式放置，NaN 的载荷原样保留。

mod sealed {
    pub trait Sealed {}
}

/// 字节序策略。
pub trait ByteOrder: sealed::Sealed + Copy + 'static {
    /// 将 `value` 的低 `dst.len()` 字节按本字节序写入 `dst`，`dst.len() <= 8`。
    fn put(value: u64, dst: &mut [u8]);

    /// 从 `src`（`len <= 8`）按本字节序还原无符号值，高位补零。
    fn get(src: &[u8]) -> u64;
}

/// 小端：最低有效字节在前。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LittleEndian;

/// 大端：最高有效字节在前；有序 KV 中整数键使用此序以保持字典序与数值序一致。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BigEndian;

impl sealed::Sealed for LittleEndian {}
impl sealed::Sealed for BigEndian {}

impl ByteOrder for LittleEndian {
    #[inline(always)]
    fn put(value: u64, dst: &mut [u8]) {
        let width = dst.len();
        dst.copy_from_slice(&value.to_le_bytes()[..width]);
    }

    #[inline(always)]
    fn get(src: &[u8]) -> u64 {
        let mut raw = [0u8; 8];
        raw[..src.len()].copy_from_slice(src);
        u64::from_le_bytes(raw)
    }
}

impl ByteOrder for BigEndian {
    #[inline(always)]
    fn put(value: u64, dst: &mut [u8]) {
        let width = dst.len();
        dst.copy_from_slice(&value.to_be_bytes()[8 - width..]);
    }

    #[inline(always)]
    fn get(src: &[u8]) -> u64 {
        let mut raw = [0u8; 8];
        raw[8 - src.len()..].copy_from_slice(src);
        u64::from_be_bytes(raw)
    }
}

/// 可按定宽布局编解码的标量类型。
pub trait FixedWidth: sealed::Sealed + Copy + 'static {
    /// 编码后的字节数。
    const WIDTH: usize;

    /// 映射为原始位模式（零扩展）。
    fn to_raw(self) -> u64;

    /// 从原始位模式还原，只使用低 `WIDTH` 字节。
    fn from_raw(raw: u64) -> Self;
}

macro_rules! impl_fixed_width {
    ($($ty:ty => $unsigned:ty),* $(,)?) => {
        $(
            impl sealed::Sealed for $ty {}

            impl FixedWidth for $ty {
                const WIDTH: usize = core::mem::size_of::<$ty>();

                #[inline(always)]
                fn to_raw(self) -> u64 {
                    self as $unsigned as u64
                }

                #[inline(always)]
                fn from_raw(raw: u64) -> Self {
                    raw as $unsigned as $ty
                }
            }
        )*
    };
}

impl_fixed_width!(
    u8 => u8,
    u16 => u16,
    u32 => u32,
    u64 => u64,
    i8 => u8,
    i16 => u16,
    i32 => u32,
    i64 => u64,
);

impl sealed::Sealed for f32 {}

impl FixedWidth for f32 {
    const WIDTH: usize = 4;

    #[inline(always)]
    fn to_raw(self) -> u64 {
        self.to_bits() as u64
    }

    #[inline(always)]
    fn from_raw(raw: u64) -> Self {
        f32::from_bits(raw as u32)
    }
}

impl sealed::Sealed for f64 {}

impl FixedWidth for f64 {
    const WIDTH: usize = 8;

    #[inline(always)]
    fn to_raw(self) -> u64 {
        self.to_bits()
    }

    #[inline(always)]
    fn from_raw(raw: u64) -> Self {
        f64::from_bits(raw)
    }
}

/// 24 位无符号整数的最大值。
pub const U24_MAX: u32 = 0x00FF_FFFF;

/// 24 位字段的编码宽度。
pub const U24_WIDTH: usize = 3;

/// 将 `value` 写入恰好 `T::WIDTH` 字节的 `dst`。
#[inline(always)]
pub fn encode<O: ByteOrder, T: FixedWidth>(value: T, dst: &mut [u8]) {
    debug_assert_eq!(dst.len(), T::WIDTH);
    O::put(value.to_raw(), dst);
}

/// 从恰好 `T::WIDTH` 字节的 `src` 解码。
#[inline(always)]
pub fn decode<O: ByteOrder, T: FixedWidth>(src: &[u8]) -> T {
    debug_assert_eq!(src.len(), T::WIDTH);
    T::from_raw(O::get(src))
}
