use crate::endian::{self, BigEndian, ByteOrder, FixedWidth, LittleEndian, U24_WIDTH};
use crate::error::{Result, SliceError, codes};
use crate::slice::Slice;
use crate::varint::{self, VarInt};

/// `SliceReader` 是只进不退的解码游标，与 [`SliceWriter`](crate::SliceWriter) 的编码布局逐字节对应。
///
/// # 契约说明（What）
/// - 任何读取先校验 `position + n <= len`，不足时返回截断错误且游标不动，绝不返回半截数据；
/// - 返回 [`Slice`] 的读取都是源视图上的零拷贝子区间，唯一例外是含转义零字节的字节串；
/// - [`head`](Self::head)/[`tail`](Self::tail) 分别是已消费与未消费部分。
#[derive(Debug, Clone, Default)]
pub struct SliceReader {
    source: Slice,
    position: usize,
}

impl SliceReader {
    /// 从 `source` 的起点开始读取。
    pub fn new(source: Slice) -> Self {
        Self {
            source,
            position: 0,
        }
    }

    /// 被读取的完整源视图。
    pub fn source(&self) -> &Slice {
        &self.source
    }

    /// 当前游标，即已消费字节数。
    pub fn position(&self) -> usize {
        self.position
    }

    /// 把游标移到 `position`，允许回退，不能超过源长度。
    pub fn set_position(&mut self, position: usize) -> Result<()> {
        if position > self.source.len() {
            return Err(SliceError::out_of_range(format!(
                "游标 {position} 超出源长度 {}",
                self.source.len()
            )));
        }
        self.position = position;
        Ok(())
    }

    /// 剩余未读字节数。
    pub fn remaining(&self) -> usize {
        self.source.len() - self.position
    }

    /// 是否还有未读字节。
    pub fn has_more(&self) -> bool {
        self.position < self.source.len()
    }

    /// 已消费部分。
    pub fn head(&self) -> Slice {
        self.view(0, self.position)
    }

    /// 未消费部分，不移动游标。
    pub fn tail(&self) -> Slice {
        self.view(self.position, self.remaining())
    }

    fn view(&self, start: usize, count: usize) -> Slice {
        self.source
            .substring_len(start as isize, count)
            .unwrap_or_else(|_| Slice::empty())
    }

    fn unread(&self) -> &[u8] {
        &self.source.as_bytes()[self.position..]
    }

    fn ensure(&self, n: usize) -> Result<()> {
        if n > self.remaining() {
            return Err(SliceError::truncated(n, self.remaining()));
        }
        Ok(())
    }

    fn advance(&mut self, n: usize) -> &[u8] {
        let start = self.position;
        self.position += n;
        &self.source.as_bytes()[start..start + n]
    }

    /// 按 `O` 字节序读取一个定宽标量。
    pub fn read_fixed<O: ByteOrder, T: FixedWidth>(&mut self) -> Result<T> {
        self.ensure(T::WIDTH)?;
        Ok(endian::decode::<O, T>(self.advance(T::WIDTH)))
    }

    /// 读取小端定宽标量。
    pub fn read_le<T: FixedWidth>(&mut self) -> Result<T> {
        self.read_fixed::<LittleEndian, T>()
    }

    /// 读取大端定宽标量。
    pub fn read_be<T: FixedWidth>(&mut self) -> Result<T> {
        self.read_fixed::<BigEndian, T>()
    }

    fn read_u24<O: ByteOrder>(&mut self) -> Result<u32> {
        self.ensure(U24_WIDTH)?;
        Ok(O::get(self.advance(U24_WIDTH)) as u32)
    }

    /// 读取 24 位小端整数。
    pub fn read_u24_le(&mut self) -> Result<u32> {
        self.read_u24::<LittleEndian>()
    }

    /// 读取 24 位大端整数。
    pub fn read_u24_be(&mut self) -> Result<u32> {
        self.read_u24::<BigEndian>()
    }

    /// 读取单个字节。
    pub fn read_byte(&mut self) -> Result<u8> {
        self.ensure(1)?;
        Ok(self.advance(1)[0])
    }

    /// 读取 varint；续位链过长为格式错误，输入耗尽为截断错误。
    pub fn read_varint<T: VarInt>(&mut self) -> Result<T> {
        let (value, consumed) = varint::decode::<T>(self.unread())?;
        self.position += consumed;
        Ok(value)
    }

    /// 零拷贝读取 `n` 字节。
    pub fn read_bytes(&mut self, n: usize) -> Result<Slice> {
        self.ensure(n)?;
        let bytes = self.view(self.position, n);
        self.position += n;
        Ok(bytes)
    }

    /// 读取 `varint(len) || bytes`；正文不足时长度前缀也不被消费。
    pub fn read_var_bytes(&mut self) -> Result<Slice> {
        let start = self.position;
        let len = self.read_varint::<u32>()? as usize;
        self.read_bytes(len).inspect_err(|_| self.position = start)
    }

    /// 读取带长度前缀的 UTF-8 字符串。
    pub fn read_var_str(&mut self) -> Result<String> {
        let start = self.position;
        let bytes = self.read_var_bytes()?;
        match std::str::from_utf8(bytes.as_bytes()) {
            Ok(text) => Ok(text.to_owned()),
            Err(err) => {
                self.position = start;
                Err(SliceError::format(
                    codes::MALFORMED_TEXT,
                    format!("字符串不是合法的 UTF-8: {err}"),
                ))
            }
        }
    }

    /// 读取剩余全部字节。
    pub fn read_to_end(&mut self) -> Slice {
        let rest = self.tail();
        self.position = self.source.len();
        rest
    }

    /// 读取以 `0x00` 结尾的字节串，`0x00 0xFF` 还原为一个字面零字节。
    ///
    /// 内容中没有转义时返回零拷贝子视图；缺少终止符返回 `UNTERMINATED_BYTE_STRING` 且游标不动。
    pub fn read_byte_string(&mut self) -> Result<Slice> {
        let unread = self.unread();
        let mut scan = 0;
        let mut escaped = false;
        let terminator = loop {
            let Some(found) = unread[scan..].iter().position(|&b| b == 0) else {
                return Err(SliceError::format(
                    codes::UNTERMINATED_BYTE_STRING,
                    format!("从偏移 {} 开始的字节串缺少终止符", self.position),
                ));
            };
            let at = scan + found;
            if unread.get(at + 1) == Some(&0xFF) {
                escaped = true;
                scan = at + 2;
            } else {
                break at;
            }
        };
        let value = if escaped {
            let mut decoded = Vec::with_capacity(terminator);
            let mut i = 0;
            while i < terminator {
                decoded.push(unread[i]);
                i += if unread[i] == 0 { 2 } else { 1 };
            }
            Slice::wrap(decoded)
        } else {
            self.view(self.position, terminator)
        };
        self.position += terminator + 1;
        Ok(value)
    }

    /// 查看下一个字节但不消费。
    pub fn peek(&self) -> Result<u8> {
        self.peek_at(0)
    }

    /// 同 [`peek`](Self::peek)，耗尽时返回 `None`。
    pub fn try_peek(&self) -> Option<u8> {
        self.unread().first().copied()
    }

    /// 查看游标后第 `offset` 个字节。
    pub fn peek_at(&self, offset: usize) -> Result<u8> {
        match self.unread().get(offset) {
            Some(&byte) => Ok(byte),
            None => Err(SliceError::truncated(offset.saturating_add(1), self.remaining())),
        }
    }

    /// 跳过 `n` 字节；不足时返回截断错误且游标不动。
    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.ensure(n)?;
        self.position += n;
        Ok(())
    }

    /// 在谓词成立期间持续消费，返回被消费部分的零拷贝视图。
    pub fn read_while(&mut self, mut predicate: impl FnMut(u8) -> bool) -> Slice {
        let count = self
            .unread()
            .iter()
            .position(|&b| !predicate(b))
            .unwrap_or(self.remaining());
        let taken = self.view(self.position, count);
        self.position += count;
        taken
    }
}

impl From<Slice> for SliceReader {
    fn from(source: Slice) -> Self {
        Self::new(source)
    }
}
