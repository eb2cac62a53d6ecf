use std::fmt;

use bytes::BytesMut;

use crate::bits;
use crate::endian::{self, BigEndian, ByteOrder, FixedWidth, LittleEndian, U24_MAX, U24_WIDTH};
use crate::error::{MAX_SLICE_LEN, Result, SliceError, checked_len_add, codes};
use crate::pin::PinnedMut;
use crate::slice::{DEBUG_TEXT_LIMIT, Slice};
use crate::varint::{self, VarInt};

/// 首次分配的最小容量。
pub const MIN_CAPACITY: usize = 64;

/// 扩容后的容量对齐粒度。
const GROWTH_ALIGNMENT: usize = 16;

/// `SliceWriter` 是只追加、自动扩容的二进制编码缓冲。
///
/// # 设计背景（Why）
/// - 协议帧、有序键等二进制负载都由一串定宽字段、varint 与原始字节拼成，写入器让这些编码共享一块
///   按几何级数扩张的缓冲，摊还后每字节 O(1)；
/// - 框架式编码经常需要“先占位、写完正文再回填长度”，回填（patch）不移动游标。
///
/// # 逻辑解析（How）
/// - 底层为 [`BytesMut`]，其长度即游标，容量即已分配大小；
/// - 容量不足时扩张到 `align16(max(2 × capacity, position + n))`，首次至少 [`MIN_CAPACITY`] 字节；
/// - 任何使总长超过 [`MAX_SLICE_LEN`] 的请求返回容量错误，缓冲保持原状。
///
/// # 契约说明（What）
/// - [`as_bytes`](Self::as_bytes) 借出的切片在下一次写入前有效，借用检查器禁止它跨越扩容；
/// - 需要长期保存写入结果时使用 [`split_slice`](Self::split_slice)（零拷贝）或 [`to_slice`](Self::to_slice)（复制）；
/// - 回填只允许整个字段落在游标之前，否则返回越界错误。
#[derive(Default)]
pub struct SliceWriter {
    buffer: BytesMut,
}

impl SliceWriter {
    /// 不预先分配的写入器，首次写入时按最小容量分配。
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::new(),
        }
    }

    /// 预先分配至少 `capacity` 字节（上限为 [`MAX_SLICE_LEN`]）。
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(capacity.min(MAX_SLICE_LEN)),
        }
    }

    /// 当前游标，即已写入字节数。
    pub fn position(&self) -> usize {
        self.buffer.len()
    }

    /// 已分配容量。
    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    /// 尚未写入任何字节。
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// 已写入内容。
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// 保证还能再写入 `n` 字节而不扩容。
    pub fn ensure_capacity(&mut self, n: usize) -> Result<()> {
        let needed = checked_len_add(self.buffer.len(), n)?;
        let current = self.buffer.capacity();
        if needed <= current {
            return Ok(());
        }
        let wanted = current.saturating_mul(2).max(needed).min(MAX_SLICE_LEN);
        let target = bits::align(wanted, GROWTH_ALIGNMENT, MIN_CAPACITY).unwrap_or(MAX_SLICE_LEN);
        self.buffer.reserve(target - self.buffer.len());
        tracing::trace!(
            target: "spark_slice::writer",
            from = current,
            to = self.buffer.capacity(),
            needed,
            "写入器缓冲扩容"
        );
        Ok(())
    }

    /// 按 `O` 字节序追加一个定宽标量。
    pub fn write_fixed<O: ByteOrder, T: FixedWidth>(&mut self, value: T) -> Result<()> {
        self.ensure_capacity(T::WIDTH)?;
        let mut raw = [0u8; 8];
        endian::encode::<O, T>(value, &mut raw[..T::WIDTH]);
        self.buffer.extend_from_slice(&raw[..T::WIDTH]);
        Ok(())
    }

    /// 追加小端定宽标量。
    pub fn write_le<T: FixedWidth>(&mut self, value: T) -> Result<()> {
        self.write_fixed::<LittleEndian, T>(value)
    }

    /// 追加大端定宽标量。
    pub fn write_be<T: FixedWidth>(&mut self, value: T) -> Result<()> {
        self.write_fixed::<BigEndian, T>(value)
    }

    fn write_u24<O: ByteOrder>(&mut self, value: u32) -> Result<()> {
        check_u24(value)?;
        self.ensure_capacity(U24_WIDTH)?;
        let mut raw = [0u8; U24_WIDTH];
        O::put(u64::from(value), &mut raw);
        self.buffer.extend_from_slice(&raw);
        Ok(())
    }

    /// 追加 24 位小端整数，`value` 超过 [`U24_MAX`] 返回参数错误。
    pub fn write_u24_le(&mut self, value: u32) -> Result<()> {
        self.write_u24::<LittleEndian>(value)
    }

    /// 追加 24 位大端整数。
    pub fn write_u24_be(&mut self, value: u32) -> Result<()> {
        self.write_u24::<BigEndian>(value)
    }

    /// 追加单个字节。
    pub fn write_byte(&mut self, byte: u8) -> Result<()> {
        self.ensure_capacity(1)?;
        self.buffer.extend_from_slice(&[byte]);
        Ok(())
    }

    /// 原样追加 `bytes`，不带长度前缀。
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.ensure_capacity(bytes.len())?;
        self.buffer.extend_from_slice(bytes);
        Ok(())
    }

    /// 原样追加视图内容。
    pub fn write_slice(&mut self, slice: &Slice) -> Result<()> {
        self.write_bytes(slice.as_bytes())
    }

    /// 追加 `count` 个 `byte`。
    pub fn write_repeat(&mut self, byte: u8, count: usize) -> Result<()> {
        self.ensure_capacity(count)?;
        let end = self.buffer.len() + count;
        self.buffer.resize(end, byte);
        Ok(())
    }

    /// 追加 varint 编码的无符号整数。
    pub fn write_varint<T: VarInt>(&mut self, value: T) -> Result<()> {
        let mut raw = [0u8; 10];
        let n = varint::encode_into(value.to_u64(), &mut raw);
        self.write_bytes(&raw[..n])
    }

    /// `varint(len) || bytes`。
    pub fn write_var_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        let len = bytes.len() as u64;
        checked_len_add(varint::encoded_len(len), bytes.len())
            .and_then(|total| self.ensure_capacity(total))?;
        self.write_varint(len)?;
        self.buffer.extend_from_slice(bytes);
        Ok(())
    }

    /// 以 UTF-8 写入带长度前缀的字符串。
    pub fn write_var_str(&mut self, text: &str) -> Result<()> {
        self.write_var_bytes(text.as_bytes())
    }

    /// 以 UTF-8 写入带长度前缀的 UTF-16 文本。
    ///
    /// 所有码元都小于 128 时逐个截断为字节，跳过完整的转码；出现孤立代理项返回格式错误。
    pub fn write_var_utf16(&mut self, units: &[u16]) -> Result<()> {
        if units.iter().all(|&unit| unit < 0x80) {
            let len = units.len() as u64;
            checked_len_add(varint::encoded_len(len), units.len())
                .and_then(|total| self.ensure_capacity(total))?;
            self.write_varint(len)?;
            self.buffer.extend(units.iter().map(|&unit| unit as u8));
            return Ok(());
        }
        let text = String::from_utf16(units).map_err(|_| {
            SliceError::format(codes::MALFORMED_TEXT, "UTF-16 文本包含孤立代理项")
        })?;
        self.write_var_str(&text)
    }

    /// 写入纯 ASCII 文本（无长度前缀），含非 ASCII 字符时返回参数错误且不写入任何字节。
    pub fn write_ascii(&mut self, text: &str) -> Result<()> {
        if !text.is_ascii() {
            return Err(SliceError::argument("文本包含非 ASCII 字符"));
        }
        self.write_bytes(text.as_bytes())
    }

    /// 写入以 `0x00` 结尾的字节串，内容中的 `0x00` 写成 `0x00 0xFF`。
    ///
    /// 紧随其后的字段不能以 `0xFF` 开头，否则读取端会把终止符当成转义零。
    pub fn write_byte_string(&mut self, bytes: &[u8]) -> Result<()> {
        let zeros = bytes.iter().filter(|&&b| b == 0).count();
        checked_len_add(bytes.len(), zeros + 1).and_then(|total| self.ensure_capacity(total))?;
        let mut rest = bytes;
        while let Some(index) = rest.iter().position(|&b| b == 0) {
            self.buffer.extend_from_slice(&rest[..index]);
            self.buffer.extend_from_slice(&[0x00, 0xFF]);
            rest = &rest[index + 1..];
        }
        self.buffer.extend_from_slice(rest);
        self.buffer.extend_from_slice(&[0x00]);
        Ok(())
    }

    /// 预留 `n` 个零字节作为回填占位，返回其起始偏移。
    pub fn skip(&mut self, n: usize) -> Result<usize> {
        self.ensure_capacity(n)?;
        let offset = self.buffer.len();
        self.buffer.resize(offset + n, 0);
        Ok(offset)
    }

    /// 预留 `n` 字节并借出可写区域，供调用方原地编码。
    pub fn allocate(&mut self, n: usize) -> Result<&mut [u8]> {
        let offset = self.skip(n)?;
        Ok(&mut self.buffer[offset..])
    }

    fn patch_span(&mut self, offset: usize, width: usize) -> Result<&mut [u8]> {
        let position = self.buffer.len();
        match offset.checked_add(width) {
            Some(end) if end <= position => Ok(&mut self.buffer[offset..end]),
            _ => Err(SliceError::out_of_range(format!(
                "回填区间 [{offset}, {offset}+{width}) 未完全落在游标 {position} 之前"
            ))),
        }
    }

    /// 在既有偏移处按 `O` 字节序覆盖定宽字段，游标不动。
    pub fn patch_fixed<O: ByteOrder, T: FixedWidth>(&mut self, offset: usize, value: T) -> Result<()> {
        let dst = self.patch_span(offset, T::WIDTH)?;
        endian::encode::<O, T>(value, dst);
        Ok(())
    }

    /// 小端回填。
    pub fn patch_le<T: FixedWidth>(&mut self, offset: usize, value: T) -> Result<()> {
        self.patch_fixed::<LittleEndian, T>(offset, value)
    }

    /// 大端回填。
    pub fn patch_be<T: FixedWidth>(&mut self, offset: usize, value: T) -> Result<()> {
        self.patch_fixed::<BigEndian, T>(offset, value)
    }

    fn patch_u24<O: ByteOrder>(&mut self, offset: usize, value: u32) -> Result<()> {
        check_u24(value)?;
        let dst = self.patch_span(offset, U24_WIDTH)?;
        O::put(u64::from(value), dst);
        Ok(())
    }

    /// 回填 24 位小端整数。
    pub fn patch_u24_le(&mut self, offset: usize, value: u32) -> Result<()> {
        self.patch_u24::<LittleEndian>(offset, value)
    }

    /// 回填 24 位大端整数。
    pub fn patch_u24_be(&mut self, offset: usize, value: u32) -> Result<()> {
        self.patch_u24::<BigEndian>(offset, value)
    }

    /// 回填单个字节。
    pub fn patch_byte(&mut self, offset: usize, byte: u8) -> Result<()> {
        self.patch_span(offset, 1)?[0] = byte;
        Ok(())
    }

    /// 复制已写入内容为独立视图。
    pub fn to_slice(&self) -> Slice {
        Slice::copy_from(&self.buffer)
    }

    /// 零拷贝地发布已写入内容；写入器游标归零并在剩余容量上继续写。
    ///
    /// ```rust
    /// use spark_slice::SliceWriter;
    ///
    /// let mut writer = SliceWriter::new();
    /// writer.write_bytes(b"head").unwrap();
    /// let head = writer.split_slice();
    /// writer.write_bytes(b"tail").unwrap();
    /// assert_eq!(head, "head");
    /// assert_eq!(writer.position(), 4);
    /// ```
    pub fn split_slice(&mut self) -> Slice {
        Slice::from_bytes(self.buffer.split().freeze())
    }

    /// 消耗写入器，零拷贝地返回全部内容。
    pub fn into_slice(self) -> Slice {
        Slice::from_bytes(self.buffer.freeze())
    }

    /// 把游标退回到 `position`，丢弃其后的内容。
    pub fn rewind(&mut self, position: usize) -> Result<()> {
        if position > self.buffer.len() {
            return Err(SliceError::out_of_range(format!(
                "回退位置 {position} 超出游标 {}",
                self.buffer.len()
            )));
        }
        self.buffer.truncate(position);
        Ok(())
    }

    /// 清空内容并保留容量。
    pub fn reset(&mut self) {
        self.buffer.clear();
    }

    /// 固定已写入区间，守卫存续期间写入器无法扩容。
    pub fn pin_mut(&mut self) -> PinnedMut<'_> {
        PinnedMut::new(&mut self.buffer[..])
    }
}

fn check_u24(value: u32) -> Result<()> {
    if value > U24_MAX {
        return Err(SliceError::argument(format!(
            "{value:#x} 超出 24 位整数范围"
        )));
    }
    Ok(())
}

impl fmt::Debug for SliceWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SliceWriter")
            .field("position", &self.position())
            .field("capacity", &self.capacity())
            .field(
                "content",
                &crate::escape::escape_truncated(&self.buffer, DEBUG_TEXT_LIMIT),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[test]
    fn growth_follows_doubling_rule() {
        let mut writer = SliceWriter::new();
        assert_eq!(writer.capacity(), 0);
        writer.write_byte(1).unwrap();
        assert!(writer.capacity() >= MIN_CAPACITY);
        let before = writer.capacity();
        writer.write_repeat(0, before).unwrap();
        assert!(writer.capacity() >= 2 * before);
        assert_eq!(writer.position(), before + 1);
    }

    #[test]
    fn fixed_width_layouts() {
        let mut writer = SliceWriter::new();
        writer.write_le::<u16>(0x0102).unwrap();
        writer.write_be::<u16>(0x0102).unwrap();
        writer.write_u24_le(0x0A0B0C).unwrap();
        writer.write_u24_be(0x0A0B0C).unwrap();
        writer.write_le::<i32>(-1).unwrap();
        assert_eq!(
            writer.as_bytes(),
            &[2, 1, 1, 2, 0x0C, 0x0B, 0x0A, 0x0A, 0x0B, 0x0C, 0xFF, 0xFF, 0xFF, 0xFF]
        );
        assert!(writer.write_u24_le(U24_MAX + 1).is_err());
        assert_eq!(writer.position(), 14);
    }

    #[test]
    fn length_prefixed_text() {
        let mut writer = SliceWriter::new();
        writer.write_var_str("hi").unwrap();
        writer.write_var_utf16(&[0x41, 0x42]).unwrap();
        writer.write_var_utf16(&"é".encode_utf16().collect::<Vec<_>>()).unwrap();
        assert_eq!(
            writer.as_bytes(),
            &[2, b'h', b'i', 2, b'A', b'B', 2, 0xC3, 0xA9]
        );
        let err = writer.write_var_utf16(&[0xD800]).unwrap_err();
        assert_eq!(err.code(), codes::MALFORMED_TEXT);
        assert!(writer.write_ascii("naïve").is_err());
        assert_eq!(writer.position(), 9);
    }

    #[test]
    fn byte_string_escapes_zero() {
        let mut writer = SliceWriter::new();
        writer.write_byte_string(b"a\x00b").unwrap();
        assert_eq!(writer.as_bytes(), &[b'a', 0x00, 0xFF, b'b', 0x00]);
    }

    #[test]
    fn reserve_then_backfill() {
        let mut writer = SliceWriter::new();
        let at = writer.skip(4).unwrap();
        writer.write_bytes(b"body").unwrap();
        writer.patch_be::<u32>(at, 4).unwrap();
        assert_eq!(writer.as_bytes(), b"\x00\x00\x00\x04body");
        assert_eq!(writer.position(), 8);
        assert!(writer.patch_le::<u32>(6, 1).is_err());
        writer.patch_u24_be(5, 0x4F_4F_79).unwrap();
        writer.patch_byte(4, b'B').unwrap();
        assert_eq!(&writer.as_bytes()[4..], b"BOOy");
        assert!(writer.patch_byte(8, 0).is_err());
    }

    #[test]
    fn allocate_and_rewind() {
        let mut writer = SliceWriter::with_capacity(4);
        writer.allocate(3).unwrap().copy_from_slice(b"xyz");
        writer.write_byte(b'!').unwrap();
        writer.rewind(2).unwrap();
        assert_eq!(writer.as_bytes(), b"xy");
        assert!(writer.rewind(3).is_err());
        writer.reset();
        assert!(writer.is_empty());
    }

    #[test]
    fn split_slice_survives_further_writes() {
        let mut writer = SliceWriter::new();
        writer.write_bytes(b"first").unwrap();
        let first = writer.split_slice();
        writer.write_repeat(b'x', 4096).unwrap();
        assert_eq!(first, "first");
        assert_eq!(writer.to_slice().len(), 4096);
        assert_eq!(writer.into_slice().len(), 4096);
    }

    #[traced_test]
    #[test]
    fn growth_is_traced() {
        let mut writer = SliceWriter::new();
        writer.write_byte(1).unwrap();
        assert!(logs_contain("写入器缓冲扩容"));
    }
}
