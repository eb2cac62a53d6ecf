use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{Bound, Deref, RangeBounds};

use bytes::Bytes;

use crate::bits::first_non_zero_byte_64;
use crate::endian::{self, ByteOrder, FixedWidth};
use crate::error::{
    ErrorKind, Result, SliceError, checked_len_add, codes, ensure_within_limit,
};
use crate::escape;
use crate::pin::{PinnedSet, PinnedSlice};
use crate::varint;

/// `Debug`/`Display` 输出的最大原始字节数，超出部分以省略标记截断。
pub const DEBUG_TEXT_LIMIT: usize = 1024;

static SINGLE_BYTES: [u8; 256] = {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = i as u8;
        i += 1;
    }
    table
};

/// `Slice` 是不可变的字节区间视图 `(底层缓冲, 偏移, 长度)`。
///
/// # 设计背景（Why）
/// - 有序 KV 的键与值在客户端内部被反复截取、比较、拼接，若每次都复制会让热路径被分配器主导；
///   视图通过引用计数共享同一块 [`Bytes`]，子区间只调整偏移与长度。
/// - 区分“无缓冲”（nil）与“空区间”（empty）两个哨兵：前者表示缺失（例如键不存在），
///   后者是合法的零长度值。两者互不相等，`is_empty()` 都为真，排序都早于任何非空视图，且 `nil < empty`。
///
/// # 逻辑解析（How）
/// - `buffer` 保存完整的底层缓冲句柄，`offset`/`len` 描述窗口；同一底层缓冲的两个相邻视图拼接时无需复制；
/// - 所有外部构造入口都校验 `offset + len <= buffer.len()`，违反即返回有效性错误，绝不静默截断；
/// - 零长度结果统一归一化为 empty 哨兵，释放对大缓冲的引用；只有 [`Slice::from_parts_unchecked`] 例外。
///
/// # 契约说明（What）
/// - 视图一经发布即不可变，可在线程间共享并发读取；
/// - 与别的视图共享缓冲是常态，需要隔离时调用 [`Slice::memoize`] 显式复制；
/// - 比较为纯字节字典序（无符号），与有序 KV 的范围扫描顺序一致。
#[derive(Clone)]
pub struct Slice {
    buffer: Option<Bytes>,
    offset: usize,
    len: usize,
}

/// [`Slice::split_by`] 与 [`Slice::split_every`] 对空片段的处理方式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SplitMode {
    /// 保留空片段，`"a,,b"` 得到三段。
    #[default]
    KeepEmpty,
    /// 丢弃空片段。
    RemoveEmpty,
}

impl Slice {
    /// 无缓冲哨兵。
    pub const fn nil() -> Self {
        Self {
            buffer: None,
            offset: 0,
            len: 0,
        }
    }

    /// 空区间哨兵，指向一个真实（静态）的零长度缓冲。
    pub const fn empty() -> Self {
        Self {
            buffer: Some(Bytes::new()),
            offset: 0,
            len: 0,
        }
    }

    /// 接管 `data` 的所有权，不复制。
    pub fn wrap(data: Vec<u8>) -> Self {
        Self::from_bytes(Bytes::from(data))
    }

    /// 引用静态数据，不复制也不分配。
    pub fn from_static(data: &'static [u8]) -> Self {
        Self::from_bytes(Bytes::from_static(data))
    }

    /// 复制 `data` 到一块独立缓冲。
    pub fn copy_from(data: &[u8]) -> Self {
        if data.is_empty() {
            return Self::empty();
        }
        Self::from_bytes(Bytes::copy_from_slice(data))
    }

    /// 以整个 `bytes` 为底层缓冲构造视图，不复制。
    pub fn from_bytes(bytes: Bytes) -> Self {
        if bytes.is_empty() {
            return Self::empty();
        }
        let len = bytes.len();
        Self {
            buffer: Some(bytes),
            offset: 0,
            len,
        }
    }

    /// 由外部三元组构造视图并做完整校验。
    ///
    /// # 契约说明（What）
    /// - `buffer == None` 时只允许 `offset == 0 && len == 0`（得到 nil），否则返回参数错误；
    /// - `offset + len` 超出缓冲长度返回有效性错误；
    /// - `len` 超过 [`MAX_SLICE_LEN`](crate::MAX_SLICE_LEN) 返回容量错误；
    /// - 零长度结果归一化为 empty。
    pub fn from_parts(buffer: Option<Bytes>, offset: usize, len: usize) -> Result<Self> {
        let Some(buffer) = buffer else {
            if offset != 0 || len != 0 {
                return Err(SliceError::argument(format!(
                    "无缓冲的视图不能声明 offset={offset} len={len}"
                )));
            }
            return Ok(Self::nil());
        };
        match offset.checked_add(len) {
            Some(end) if end <= buffer.len() => {}
            _ => return Err(SliceError::invalid_view(offset, len, buffer.len())),
        }
        ensure_within_limit(len)?;
        if len == 0 {
            return Ok(Self::empty());
        }
        Ok(Self {
            buffer: Some(buffer),
            offset,
            len,
        })
    }

    /// 性能路径：跳过校验与零长度归一化。
    ///
    /// 调用方必须保证 `offset + len <= buffer.len()`；违反时调试构建断言失败，
    /// 发布构建在首次访问字节时 panic，不会产生越界读。
    pub fn from_parts_unchecked(buffer: Bytes, offset: usize, len: usize) -> Self {
        debug_assert!(
            offset
                .checked_add(len)
                .is_some_and(|end| end <= buffer.len()),
            "from_parts_unchecked: offset={offset} len={len} capacity={}",
            buffer.len()
        );
        Self {
            buffer: Some(buffer),
            offset,
            len,
        }
    }

    /// 单字节视图，指向静态表，不分配。
    pub fn from_byte(byte: u8) -> Self {
        let index = byte as usize;
        Self::from_static(&SINGLE_BYTES[index..index + 1])
    }

    /// `count` 个 `byte` 组成的视图。
    pub fn repeat(byte: u8, count: usize) -> Result<Self> {
        ensure_within_limit(count)?;
        Ok(Self::wrap(vec![byte; count]))
    }

    /// 按 `O` 字节序编码一个定宽标量。
    pub fn from_fixed<O: ByteOrder, T: FixedWidth>(value: T) -> Self {
        let mut raw = vec![0u8; T::WIDTH];
        endian::encode::<O, T>(value, &mut raw);
        Self::wrap(raw)
    }

    /// 以 varint 编码一个无符号整数。
    pub fn from_varint(value: u64) -> Self {
        let mut raw = [0u8; 10];
        let n = varint::encode_into(value, &mut raw);
        Self::copy_from(&raw[..n])
    }

    /// 解析小写或大写十六进制文本。
    pub fn from_hex(text: &str) -> Result<Self> {
        hex::decode(text).map(Self::wrap).map_err(|err| {
            SliceError::format(
                codes::MALFORMED_TEXT,
                format!("十六进制文本无法解析: {err}"),
            )
        })
    }

    /// 还原 [`Slice::escape`] 生成的调试文本。
    pub fn unescape(text: &str) -> Result<Self> {
        escape::unescape(text)
    }

    /// nil 视图（无底层缓冲）。
    pub fn is_nil(&self) -> bool {
        self.buffer.is_none()
    }

    /// 是否持有真实缓冲（包括 empty 哨兵）。
    pub fn has_buffer(&self) -> bool {
        self.buffer.is_some()
    }

    /// 零长度即为真，nil 与 empty 均满足。
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// 视图长度。
    pub fn len(&self) -> usize {
        self.len
    }

    /// 视图在底层缓冲中的起始偏移。
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// 底层缓冲句柄；nil 返回 `None`。
    pub fn buffer(&self) -> Option<&Bytes> {
        self.buffer.as_ref()
    }

    /// 借出视图内容；nil 返回空切片。
    pub fn as_bytes(&self) -> &[u8] {
        match &self.buffer {
            Some(buffer) => &buffer[self.offset..self.offset + self.len],
            None => &[],
        }
    }

    /// 复制内容为 `Vec<u8>`。
    pub fn to_vec(&self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }

    /// 转换为只覆盖本窗口的 [`Bytes`]，不复制。
    pub fn into_bytes(self) -> Bytes {
        match self.buffer {
            Some(buffer) if self.offset == 0 && self.len == buffer.len() => buffer,
            Some(buffer) => buffer.slice(self.offset..self.offset + self.len),
            None => Bytes::new(),
        }
    }

    /// 复制到一块独立缓冲，切断与其它视图的共享。
    pub fn memoize(&self) -> Self {
        if self.is_nil() {
            return Self::nil();
        }
        Self::copy_from(self.as_bytes())
    }

    /// 读取单个字节，负数下标从末尾计数。
    pub fn at(&self, index: isize) -> Result<u8> {
        let resolved = if index < 0 {
            self.len.checked_sub(index.unsigned_abs())
        } else if (index as usize) < self.len {
            Some(index as usize)
        } else {
            None
        };
        match resolved {
            Some(i) => Ok(self.as_bytes()[i]),
            None => Err(SliceError::out_of_range(format!(
                "下标 {index} 超出视图长度 {}",
                self.len
            ))),
        }
    }

    fn resolve_offset(&self, offset: isize) -> Result<usize> {
        let resolved = if offset < 0 {
            self.len.checked_sub(offset.unsigned_abs())
        } else {
            Some(offset as usize).filter(|&o| o <= self.len)
        };
        resolved.ok_or_else(|| {
            SliceError::out_of_range(format!("偏移 {offset} 超出视图长度 {}", self.len))
        })
    }

    /// 已校验的内部子区间，零长度归一化（nil 仍为 nil）。
    fn sub(&self, start: usize, count: usize) -> Self {
        debug_assert!(start + count <= self.len);
        match &self.buffer {
            None => Self::nil(),
            Some(_) if count == 0 => Self::empty(),
            Some(buffer) => Self {
                buffer: Some(buffer.clone()),
                offset: self.offset + start,
                len: count,
            },
        }
    }

    /// 从 `offset` 到末尾的子视图，负偏移从末尾计数。
    ///
    /// ```rust
    /// use spark_slice::Slice;
    ///
    /// let s = Slice::from("ABCDE");
    /// assert_eq!(s.substring(-2).unwrap(), Slice::from("DE"));
    /// assert!(s.substring(6).is_err());
    /// ```
    pub fn substring(&self, offset: isize) -> Result<Self> {
        let start = self.resolve_offset(offset)?;
        Ok(self.sub(start, self.len - start))
    }

    /// 从 `offset` 开始长度为 `count` 的子视图。
    pub fn substring_len(&self, offset: isize, count: usize) -> Result<Self> {
        let start = self.resolve_offset(offset)?;
        if count > self.len - start {
            return Err(SliceError::out_of_range(format!(
                "子区间 [{start}, {start}+{count}) 超出视图长度 {}",
                self.len
            )));
        }
        Ok(self.sub(start, count))
    }

    /// 以 Rust 区间语法取子视图。
    pub fn range<R: RangeBounds<usize>>(&self, range: R) -> Result<Self> {
        let start = match range.start_bound() {
            Bound::Included(&s) => s,
            Bound::Excluded(&s) => s.saturating_add(1),
            Bound::Unbounded => 0,
        };
        let end = match range.end_bound() {
            Bound::Included(&e) => e.saturating_add(1),
            Bound::Excluded(&e) => e,
            Bound::Unbounded => self.len,
        };
        if start > end || end > self.len {
            return Err(SliceError::out_of_range(format!(
                "区间 [{start}, {end}) 超出视图长度 {}",
                self.len
            )));
        }
        Ok(self.sub(start, end - start))
    }

    /// 前 `count` 字节。
    pub fn take(&self, count: usize) -> Result<Self> {
        self.range(..count)
    }

    /// 跳过前 `count` 字节。
    pub fn skip(&self, count: usize) -> Result<Self> {
        self.range(count..)
    }

    /// 末尾 `count` 字节。
    pub fn tail(&self, count: usize) -> Result<Self> {
        match self.len.checked_sub(count) {
            Some(start) => Ok(self.sub(start, count)),
            None => Err(SliceError::out_of_range(format!(
                "末尾 {count} 字节超出视图长度 {}",
                self.len
            ))),
        }
    }

    /// 内容以 `prefix` 开头。
    pub fn starts_with(&self, prefix: impl AsRef<[u8]>) -> bool {
        self.as_bytes().starts_with(prefix.as_ref())
    }

    /// 内容以 `suffix` 结尾。
    pub fn ends_with(&self, suffix: impl AsRef<[u8]>) -> bool {
        self.as_bytes().ends_with(suffix.as_ref())
    }

    /// 严格前缀：完全相等时为假。
    pub fn prefixed_by(&self, prefix: impl AsRef<[u8]>) -> bool {
        let prefix = prefix.as_ref();
        self.len > prefix.len() && self.starts_with(prefix)
    }

    /// 严格后缀：完全相等时为假。
    pub fn suffixed_by(&self, suffix: impl AsRef<[u8]>) -> bool {
        let suffix = suffix.as_ref();
        self.len > suffix.len() && self.ends_with(suffix)
    }

    /// 与 `other` 的公共前缀长度。
    ///
    /// 按 8 字节一组做异或，非零时用最低置位所在字节定位首个差异（小端装载下即内存中的首字节）。
    pub fn common_prefix_len(&self, other: impl AsRef<[u8]>) -> usize {
        let left = self.as_bytes();
        let right = other.as_ref();
        let n = left.len().min(right.len());
        let mut i = 0;
        while i + 8 <= n {
            let mut a = [0u8; 8];
            let mut b = [0u8; 8];
            a.copy_from_slice(&left[i..i + 8]);
            b.copy_from_slice(&right[i..i + 8]);
            let diff = u64::from_le_bytes(a) ^ u64::from_le_bytes(b);
            if diff != 0 {
                return i + first_non_zero_byte_64(diff) as usize;
            }
            i += 8;
        }
        while i < n && left[i] == right[i] {
            i += 1;
        }
        i
    }

    /// 首次出现 `needle` 的位置；空 `needle` 返回 `Some(0)`。
    pub fn find(&self, needle: impl AsRef<[u8]>) -> Option<usize> {
        find_bytes(self.as_bytes(), needle.as_ref())
    }

    /// 首个 `byte` 的下标。
    pub fn find_byte(&self, byte: u8) -> Option<usize> {
        self.as_bytes().iter().position(|&b| b == byte)
    }

    /// 是否包含 `needle`。
    pub fn contains(&self, needle: impl AsRef<[u8]>) -> bool {
        self.find(needle).is_some()
    }

    /// 字典序后继：不以本视图为前缀的最小字节序列。
    ///
    /// # 逻辑解析（How）
    /// 从末尾向前找到第一个不等于 `0xFF` 的字节，加一并截断其后的所有字节。
    /// 常用于把键前缀转换为范围扫描的开区间上界。
    ///
    /// # 契约说明（What）
    /// - nil 输入返回参数错误；
    /// - 全部为 `0xFF`（含 empty）时不存在后继，返回 `INCREMENT_OVERFLOW`。
    pub fn increment(&self) -> Result<Self> {
        if self.is_nil() {
            return Err(SliceError::argument("nil 视图没有字典序后继"));
        }
        let bytes = self.as_bytes();
        let Some(pos) = bytes.iter().rposition(|&b| b != 0xFF) else {
            return Err(SliceError::new(
                ErrorKind::Argument,
                codes::INCREMENT_OVERFLOW,
                "所有字节均为 0xFF，不存在字典序后继",
            ));
        };
        let mut next = bytes[..=pos].to_vec();
        next[pos] += 1;
        Ok(Self::wrap(next))
    }

    /// 拼接两个视图。
    ///
    /// 两者是同一底层缓冲中首尾相接的窗口时直接扩展窗口，不复制；否则分配一次并各复制一次。
    /// 仅当两侧都是 nil 时结果为 nil。
    pub fn concat(&self, other: &Slice) -> Result<Self> {
        if other.len == 0 {
            return Ok(if self.is_nil() && other.is_nil() {
                Self::nil()
            } else if self.len == 0 {
                Self::empty()
            } else {
                self.clone()
            });
        }
        if self.len == 0 {
            return Ok(other.clone());
        }
        let total = checked_len_add(self.len, other.len)?;
        if let (Some(left), Some(right)) = (&self.buffer, &other.buffer) {
            if same_backing(left, right) && self.offset + self.len == other.offset {
                return Ok(Self {
                    buffer: Some(left.clone()),
                    offset: self.offset,
                    len: total,
                });
            }
        }
        let mut joined = Vec::with_capacity(total);
        joined.extend_from_slice(self.as_bytes());
        joined.extend_from_slice(other.as_bytes());
        Ok(Self::wrap(joined))
    }

    /// 依次拼接所有视图，只分配一次。
    pub fn concat_all(items: &[Slice]) -> Result<Self> {
        Self::join(b"", items)
    }

    /// 按分隔符切分为零拷贝子视图。
    ///
    /// nil 输入得到空数组；empty 输入得到 `[empty]`，除非选择 [`SplitMode::RemoveEmpty`]。
    pub fn split_by(&self, separator: impl AsRef<[u8]>, mode: SplitMode) -> Result<Vec<Self>> {
        let separator = separator.as_ref();
        if separator.is_empty() {
            return Err(SliceError::argument("分隔符不能为空"));
        }
        if self.is_nil() {
            return Ok(Vec::new());
        }
        let bytes = self.as_bytes();
        let mut parts = Vec::new();
        let mut start = 0;
        while let Some(found) = find_bytes(&bytes[start..], separator) {
            push_part(&mut parts, self.sub(start, found), mode);
            start += found + separator.len();
        }
        push_part(&mut parts, self.sub(start, self.len - start), mode);
        Ok(parts)
    }

    /// 按固定步长切分，最后一段可能较短。
    pub fn split_every(&self, stride: usize) -> Result<Vec<Self>> {
        if stride == 0 {
            return Err(SliceError::argument("切分步长不能为 0"));
        }
        if self.is_nil() {
            return Ok(Vec::new());
        }
        if self.len == 0 {
            return Ok(vec![Self::empty()]);
        }
        let mut parts = Vec::with_capacity(self.len.div_ceil(stride));
        let mut start = 0;
        while start < self.len {
            let count = stride.min(self.len - start);
            parts.push(self.sub(start, count));
            start += count;
        }
        Ok(parts)
    }

    /// 以分隔符连接多个视图，结果位于一块新分配的缓冲中。
    ///
    /// 输入为空时返回 empty；只有一项时直接返回该项（nil 归一化为 empty），不复制。
    ///
    /// ```rust
    /// use spark_slice::Slice;
    ///
    /// let joined = Slice::join(b",", &[Slice::from("A"), Slice::from("BB")]).unwrap();
    /// assert_eq!(joined, Slice::from("A,BB"));
    /// ```
    pub fn join(separator: impl AsRef<[u8]>, items: &[Slice]) -> Result<Self> {
        let separator = separator.as_ref();
        match items {
            [] => return Ok(Self::empty()),
            [single] if single.is_nil() => return Ok(Self::empty()),
            [single] => return Ok(single.clone()),
            _ => {}
        }
        let mut total = separator.len().checked_mul(items.len() - 1).ok_or_else(|| {
            SliceError::capacity("分隔符总长度溢出")
        })?;
        for item in items {
            total = checked_len_add(total, item.len)?;
        }
        if total == 0 {
            return Ok(Self::empty());
        }
        let mut joined = Vec::with_capacity(total);
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                joined.extend_from_slice(separator);
            }
            joined.extend_from_slice(item.as_bytes());
        }
        Ok(Self::wrap(joined))
    }

    /// 连接长度未知的序列，缓冲按需增长。
    pub fn join_iter<I, S>(separator: impl AsRef<[u8]>, items: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        let separator = separator.as_ref();
        let mut joined = Vec::new();
        for (i, item) in items.into_iter().enumerate() {
            let item = item.as_ref();
            let extra = if i > 0 { separator.len() } else { 0 };
            checked_len_add(joined.len(), extra + item.len())?;
            if i > 0 {
                joined.extend_from_slice(separator);
            }
            joined.extend_from_slice(item);
        }
        Ok(Self::wrap(joined))
    }

    /// 把多个视图复制进同一块共享缓冲，返回逐一对应的新视图。
    ///
    /// 用于把散落在许多大缓冲中的小键值压实，释放对原缓冲的引用；nil/empty 原样保持。
    pub fn merge(items: &[Slice]) -> Result<Vec<Self>> {
        let mut total = 0usize;
        for item in items {
            total = checked_len_add(total, item.len)?;
        }
        let mut packed = Vec::with_capacity(total);
        for item in items {
            packed.extend_from_slice(item.as_bytes());
        }
        let shared = Bytes::from(packed);
        let mut offset = 0;
        let mut merged = Vec::with_capacity(items.len());
        for item in items {
            let view = if item.is_nil() {
                Self::nil()
            } else if item.len == 0 {
                Self::empty()
            } else {
                Self {
                    buffer: Some(shared.clone()),
                    offset,
                    len: item.len,
                }
            };
            offset += item.len;
            merged.push(view);
        }
        Ok(merged)
    }

    /// 要求长度恰为 `T::WIDTH`，按 `O` 字节序解码。
    pub fn to_fixed<O: ByteOrder, T: FixedWidth>(&self) -> Result<T> {
        if self.len != T::WIDTH {
            return Err(SliceError::argument(format!(
                "视图长度 {} 与定宽 {} 不符",
                self.len,
                T::WIDTH
            )));
        }
        Ok(endian::decode::<O, T>(self.as_bytes()))
    }

    /// 小写十六进制表示。
    pub fn to_hex(&self) -> String {
        hex::encode(self.as_bytes())
    }

    /// 完整的可逆调试文本：可打印 ASCII 原样输出，其余字节（含 `<`）输出为 `<XX>`。
    pub fn escape(&self) -> String {
        escape::escape(self.as_bytes())
    }

    /// 超过 `max_bytes` 时截断并追加省略标记，结果不再可逆。
    pub fn escape_truncated(&self, max_bytes: usize) -> String {
        escape::escape_truncated(self.as_bytes(), max_bytes)
    }

    /// 在非托管调用期间固定底层缓冲。
    pub fn pin(&self) -> PinnedSlice<'_> {
        PinnedSlice::new(self)
    }

    /// 一次性固定多个视图。
    pub fn pin_all(items: &[Slice]) -> PinnedSet<'_> {
        PinnedSet::new(items)
    }
}

fn same_backing(left: &Bytes, right: &Bytes) -> bool {
    left.as_ptr() == right.as_ptr() && left.len() == right.len()
}

fn push_part(parts: &mut Vec<Slice>, part: Slice, mode: SplitMode) {
    if mode == SplitMode::RemoveEmpty && part.is_empty() {
        return;
    }
    parts.push(part);
}

pub(crate) fn find_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    if needle.len() > haystack.len() {
        return None;
    }
    let first = needle[0];
    let last_start = haystack.len() - needle.len();
    let mut i = 0;
    while i <= last_start {
        match haystack[i..=last_start].iter().position(|&b| b == first) {
            Some(p) => i += p,
            None => return None,
        }
        if &haystack[i..i + needle.len()] == needle {
            return Some(i);
        }
        i += 1;
    }
    None
}

impl Default for Slice {
    fn default() -> Self {
        Self::nil()
    }
}

impl Deref for Slice {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl AsRef<[u8]> for Slice {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl PartialEq for Slice {
    fn eq(&self, other: &Self) -> bool {
        self.is_nil() == other.is_nil() && self.as_bytes() == other.as_bytes()
    }
}

impl Eq for Slice {}

impl PartialEq<[u8]> for Slice {
    fn eq(&self, other: &[u8]) -> bool {
        self.has_buffer() && self.as_bytes() == other
    }
}

impl PartialEq<&[u8]> for Slice {
    fn eq(&self, other: &&[u8]) -> bool {
        self == *other
    }
}

impl<const N: usize> PartialEq<[u8; N]> for Slice {
    fn eq(&self, other: &[u8; N]) -> bool {
        self == &other[..]
    }
}

impl<const N: usize> PartialEq<&[u8; N]> for Slice {
    fn eq(&self, other: &&[u8; N]) -> bool {
        self == &other[..]
    }
}

impl PartialEq<Vec<u8>> for Slice {
    fn eq(&self, other: &Vec<u8>) -> bool {
        self == other.as_slice()
    }
}

impl PartialEq<&str> for Slice {
    fn eq(&self, other: &&str) -> bool {
        self == other.as_bytes()
    }
}

impl Ord for Slice {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.is_nil(), other.is_nil()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => self.as_bytes().cmp(other.as_bytes()),
        }
    }
}

impl PartialOrd for Slice {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Hash for Slice {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.is_nil().hash(state);
        self.as_bytes().hash(state);
    }
}

impl fmt::Debug for Slice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_nil() {
            return f.write_str("Slice::nil");
        }
        write!(f, "'{}'", self.escape_truncated(DEBUG_TEXT_LIMIT))
    }
}

impl fmt::Display for Slice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.escape_truncated(DEBUG_TEXT_LIMIT))
    }
}

impl From<Vec<u8>> for Slice {
    fn from(data: Vec<u8>) -> Self {
        Self::wrap(data)
    }
}

impl From<&[u8]> for Slice {
    fn from(data: &[u8]) -> Self {
        Self::copy_from(data)
    }
}

impl From<Bytes> for Slice {
    fn from(bytes: Bytes) -> Self {
        Self::from_bytes(bytes)
    }
}

impl From<String> for Slice {
    fn from(text: String) -> Self {
        Self::wrap(text.into_bytes())
    }
}

impl From<&str> for Slice {
    fn from(text: &str) -> Self {
        Self::copy_from(text.as_bytes())
    }
}

impl From<Slice> for Bytes {
    fn from(slice: Slice) -> Self {
        slice.into_bytes()
    }
}

impl FromIterator<u8> for Slice {
    fn from_iter<I: IntoIterator<Item = u8>>(iter: I) -> Self {
        Self::wrap(iter.into_iter().collect())
    }
}
