use std::fmt;
use std::ops::{Deref, DerefMut};

use bytes::{Bytes, BytesMut};

use crate::endian::{self, BigEndian, ByteOrder, FixedWidth, LittleEndian};
use crate::error::{Result, SliceError, ensure_within_limit};
use crate::pin::PinnedMut;
use crate::slice::{DEBUG_TEXT_LIMIT, Slice};

/// `MutableSlice` 是对一段字节的独占可写视图。
///
/// # 设计背景（Why）
/// - 竞技场与写入器需要把预留区域交给调用方原地填充，填充完成后再以零拷贝方式发布为只读 [`Slice`]；
/// - 可变视图之间互不重叠由所有权保证：[`split_to`](Self::split_to)/[`split_off`](Self::split_off)
///   得到同一分配上的两个不相交窗口，不存在运行时别名检查。
///
/// # 契约说明（What）
/// - 与 [`Slice`] 一样区分 nil 与 empty；
/// - [`freeze`](Self::freeze) 消耗自身并转为只读视图，之后再无写入路径；
/// - 所有带偏移的写操作先校验范围，越界返回错误而不是 panic。
#[derive(Default)]
pub struct MutableSlice {
    inner: Option<BytesMut>,
}

impl MutableSlice {
    /// 不持有缓冲的 nil 视图。
    pub const fn nil() -> Self {
        Self { inner: None }
    }

    /// 长度为零但非 nil。
    pub fn empty() -> Self {
        Self {
            inner: Some(BytesMut::new()),
        }
    }

    /// 分配 `len` 个零字节。
    pub fn zeroed(len: usize) -> Result<Self> {
        ensure_within_limit(len)?;
        Ok(Self {
            inner: Some(BytesMut::zeroed(len)),
        })
    }

    /// 接管 `data`，唯一持有时不复制。
    pub fn wrap(data: Vec<u8>) -> Self {
        let inner = match Bytes::from(data).try_into_mut() {
            Ok(unique) => unique,
            Err(shared) => BytesMut::from(&shared[..]),
        };
        Self { inner: Some(inner) }
    }

    /// 复制 `data`。
    pub fn copy_from(data: &[u8]) -> Self {
        Self {
            inner: Some(BytesMut::from(data)),
        }
    }

    /// nil 视图（无底层缓冲）。
    pub fn is_nil(&self) -> bool {
        self.inner.is_none()
    }

    /// 视图长度。
    pub fn len(&self) -> usize {
        self.inner.as_ref().map_or(0, BytesMut::len)
    }

    /// 长度为零（含 nil）。
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 只读借出内容。
    pub fn as_bytes(&self) -> &[u8] {
        self.inner.as_deref().unwrap_or(&[])
    }

    /// 可写借出内容；nil 返回空切片。
    pub fn as_mut_bytes(&mut self) -> &mut [u8] {
        match self.inner.as_mut() {
            Some(inner) => &mut inner[..],
            None => &mut [],
        }
    }

    fn check_span(&self, offset: usize, width: usize) -> Result<()> {
        match offset.checked_add(width) {
            Some(end) if end <= self.len() => Ok(()),
            _ => Err(SliceError::out_of_range(format!(
                "写入区间 [{offset}, {offset}+{width}) 超出视图长度 {}",
                self.len()
            ))),
        }
    }

    /// 读取 `index` 处的字节，越界返回错误。
    pub fn get(&self, index: usize) -> Result<u8> {
        self.check_span(index, 1)?;
        Ok(self.as_bytes()[index])
    }

    /// 改写 `index` 处的字节，越界返回错误。
    pub fn set(&mut self, index: usize, byte: u8) -> Result<()> {
        self.check_span(index, 1)?;
        self.as_mut_bytes()[index] = byte;
        Ok(())
    }

    /// 全部写成 `byte`。
    pub fn fill(&mut self, byte: u8) {
        self.as_mut_bytes().fill(byte);
    }

    /// 全部置零，长度不变。
    pub fn clear(&mut self) {
        self.fill(0);
    }

    /// 从 `offset` 开始覆盖写入 `src`。
    pub fn copy_from_at(&mut self, offset: usize, src: &[u8]) -> Result<()> {
        self.check_span(offset, src.len())?;
        self.as_mut_bytes()[offset..offset + src.len()].copy_from_slice(src);
        Ok(())
    }

    /// 在 `offset` 处按 `O` 字节序写入定宽标量。
    pub fn store<O: ByteOrder, T: FixedWidth>(&mut self, offset: usize, value: T) -> Result<()> {
        self.check_span(offset, T::WIDTH)?;
        endian::encode::<O, T>(value, &mut self.as_mut_bytes()[offset..offset + T::WIDTH]);
        Ok(())
    }

    /// 小端写入。
    pub fn store_le<T: FixedWidth>(&mut self, offset: usize, value: T) -> Result<()> {
        self.store::<LittleEndian, T>(offset, value)
    }

    /// 大端写入。
    pub fn store_be<T: FixedWidth>(&mut self, offset: usize, value: T) -> Result<()> {
        self.store::<BigEndian, T>(offset, value)
    }

    /// 在 `offset` 处按 `O` 字节序读取定宽标量。
    pub fn load<O: ByteOrder, T: FixedWidth>(&self, offset: usize) -> Result<T> {
        self.check_span(offset, T::WIDTH)?;
        Ok(endian::decode::<O, T>(
            &self.as_bytes()[offset..offset + T::WIDTH],
        ))
    }

    /// 拆出 `[0, at)`，自身保留 `[at, len)`，两者不相交且共享同一分配。
    pub fn split_to(&mut self, at: usize) -> Result<Self> {
        self.check_span(0, at)?;
        Ok(match self.inner.as_mut() {
            Some(inner) => Self {
                inner: Some(inner.split_to(at)),
            },
            None => Self::nil(),
        })
    }

    /// 拆出 `[at, len)`，自身保留 `[0, at)`。
    pub fn split_off(&mut self, at: usize) -> Result<Self> {
        self.check_span(0, at)?;
        Ok(match self.inner.as_mut() {
            Some(inner) => Self {
                inner: Some(inner.split_off(at)),
            },
            None => Self::nil(),
        })
    }

    /// 把 `other` 接到自身末尾；两者在同一分配中首尾相接时不复制。
    pub fn unsplit(&mut self, other: MutableSlice) {
        let Some(tail) = other.inner else {
            return;
        };
        if let Some(inner) = self.inner.as_mut() {
            inner.unsplit(tail);
        } else {
            self.inner = Some(tail);
        }
    }

    /// 零拷贝转换为只读视图。
    pub fn freeze(self) -> Slice {
        match self.inner {
            Some(inner) => Slice::from_bytes(inner.freeze()),
            None => Slice::nil(),
        }
    }

    /// 复制当前内容为独立的只读视图，自身仍可继续写入。
    pub fn to_slice(&self) -> Slice {
        if self.is_nil() {
            return Slice::nil();
        }
        Slice::copy_from(self.as_bytes())
    }

    /// 固定可写区间，守卫存续期间独占借用自身。
    pub fn pin_mut(&mut self) -> PinnedMut<'_> {
        PinnedMut::new(self.as_mut_bytes())
    }
}

impl From<BytesMut> for MutableSlice {
    fn from(inner: BytesMut) -> Self {
        Self { inner: Some(inner) }
    }
}

impl Deref for MutableSlice {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl DerefMut for MutableSlice {
    fn deref_mut(&mut self) -> &mut [u8] {
        self.as_mut_bytes()
    }
}

impl AsRef<[u8]> for MutableSlice {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl PartialEq for MutableSlice {
    fn eq(&self, other: &Self) -> bool {
        self.is_nil() == other.is_nil() && self.as_bytes() == other.as_bytes()
    }
}

impl Eq for MutableSlice {}

impl PartialEq<Slice> for MutableSlice {
    fn eq(&self, other: &Slice) -> bool {
        self.is_nil() == other.is_nil() && self.as_bytes() == other.as_bytes()
    }
}

impl PartialEq<MutableSlice> for Slice {
    fn eq(&self, other: &MutableSlice) -> bool {
        other == self
    }
}

impl fmt::Debug for MutableSlice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_nil() {
            return f.write_str("MutableSlice::nil");
        }
        write!(
            f,
            "MutableSlice('{}')",
            crate::escape::escape_truncated(self.as_bytes(), DEBUG_TEXT_LIMIT)
        )
    }
}
