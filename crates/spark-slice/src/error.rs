use std::borrow::Cow;

use thiserror::Error;

/// 单个视图、写入器或竞技场页所允许的最大逻辑长度（2 GiB - 1）。
///
/// # 设计背景（Why）
/// - 上游有序 KV 协议以有符号 32 位整数描述长度，跨语言客户端共享同一上限；
/// - 无论目标平台 `usize` 宽度为何，都以该值作为可移植的容量天花板，避免 64 位环境下悄然放大限制。
pub const MAX_SLICE_LEN: usize = i32::MAX as usize;

/// 稳定错误码，遵循 `<域>.<语义>` 命名约定。
///
/// 错误码一经发布即视为契约，新增语义请追加常量而不是复用旧码。
pub mod codes {
    /// 偏移/长度与底层缓冲不一致。
    pub const INVALID_VIEW: &str = "spark.slice.invalid_view";
    /// 索引或子区间超出视图范围。
    pub const OUT_OF_RANGE: &str = "spark.slice.out_of_range";
    /// 计算出的尺寸超过 [`MAX_SLICE_LEN`](super::MAX_SLICE_LEN) 或整数宽度。
    pub const CAPACITY_EXCEEDED: &str = "spark.slice.capacity_exceeded";
    /// 读取所需字节多于剩余可读字节。
    pub const TRUNCATED: &str = "spark.slice.truncated";
    /// 变长整数的续位链超过该宽度允许的字节数。
    pub const MALFORMED_VARINT: &str = "spark.slice.malformed_varint";
    /// 文本不是合法的 UTF-8/UTF-16/ASCII。
    pub const MALFORMED_TEXT: &str = "spark.slice.malformed_text";
    /// 调试转义文本无法还原。
    pub const MALFORMED_ESCAPE: &str = "spark.slice.malformed_escape";
    /// NUL 结尾字节串缺少终止符。
    pub const UNTERMINATED_BYTE_STRING: &str = "spark.slice.unterminated_byte_string";
    /// 参数组合非法。
    pub const INVALID_ARGUMENT: &str = "spark.slice.invalid_argument";
    /// `increment` 的输入没有字典序后继。
    pub const INCREMENT_OVERFLOW: &str = "spark.slice.increment_overflow";
    /// 字节源读取失败。
    pub const IO_FAILED: &str = "spark.slice.io_failed";
    /// 物化过程被调用方取消。
    pub const CANCELLED: &str = "spark.slice.cancelled";
}

/// 错误分类，对应“有效性 / 越界 / 容量 / 格式 / 参数”五类故障以及外部字节源带来的两类。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// 视图三元组自相矛盾，属于内存安全级别的故障。
    Validity,
    /// 索引、子区间或回填位置不在可用字节内。
    OutOfRange,
    /// 尺寸计算溢出或超过 2 GiB 上限。
    Overflow,
    /// 编码格式错误，含截断、非法变长整数、非法转义。
    Format,
    /// 参数非法，例如无缓冲却声明非零长度。
    Argument,
    /// 底层字节源返回 IO 错误。
    Io,
    /// 调用方通过取消令牌终止了操作。
    Cancelled,
}

/// `SliceError` 是本 crate 所有可失败操作的统一错误类型。
///
/// # 设计背景（Why）
/// - 字节层的故障需要被上层协议精确分类（是截断还是越界，是调用方用错还是数据损坏），
///   因此错误同时携带稳定错误码与 [`ErrorKind`]，日志与指标可直接按码聚合。
/// - 纯计算路径没有重试或后台恢复，错误总是同步返回给直接调用者，绝不静默吞掉。
///
/// # 契约说明（What）
/// - `code`：来自 [`codes`] 的 `'static` 字符串；
/// - `kind`：粗粒度分类；
/// - `message`：面向排障人员的描述，不含业务数据本身。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} ({code})")]
pub struct SliceError {
    kind: ErrorKind,
    code: &'static str,
    message: Cow<'static, str>,
}

impl SliceError {
    /// 构造错误。
    pub fn new(kind: ErrorKind, code: &'static str, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind,
            code,
            message: message.into(),
        }
    }

    /// 错误类别。
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// 稳定错误码，形如 `<域>.<原因>`。
    pub fn code(&self) -> &'static str {
        self.code
    }

    /// 人类可读的描述。
    pub fn message(&self) -> &str {
        &self.message
    }

    /// 是否为“数据不足”类错误，流式调用方可据此等待更多字节后重试。
    pub fn is_truncated(&self) -> bool {
        self.code == codes::TRUNCATED
    }

    pub(crate) fn out_of_range(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::OutOfRange, codes::OUT_OF_RANGE, message)
    }

    pub(crate) fn argument(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Argument, codes::INVALID_ARGUMENT, message)
    }

    pub(crate) fn capacity(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Overflow, codes::CAPACITY_EXCEEDED, message)
    }

    pub(crate) fn truncated(needed: usize, available: usize) -> Self {
        Self::new(
            ErrorKind::Format,
            codes::TRUNCATED,
            format!("输入被截断：需要 {needed} 字节，剩余 {available} 字节"),
        )
    }

    pub(crate) fn format(code: &'static str, message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Format, code, message)
    }

    /// 视图有效性故障的唯一构造入口。
    ///
    /// 调试构建下先发出一条 `error` 级事件，便于在内存损坏排查时挂断点或抓取现场；
    /// 发布构建只构造错误，行为不变。
    #[cold]
    #[inline(never)]
    pub(crate) fn invalid_view(offset: usize, len: usize, capacity: usize) -> Self {
        #[cfg(debug_assertions)]
        tracing::error!(
            target: "spark_slice::validity",
            offset,
            len,
            capacity,
            "视图三元组与底层缓冲不一致"
        );
        Self::new(
            ErrorKind::Validity,
            codes::INVALID_VIEW,
            format!("非法视图：offset={offset} len={len} 超出缓冲长度 {capacity}"),
        )
    }
}

/// crate 内统一的 `Result` 别名。
pub type Result<T, E = SliceError> = core::result::Result<T, E>;

/// 校验长度不超过 [`MAX_SLICE_LEN`]。
pub(crate) fn ensure_within_limit(len: usize) -> Result<()> {
    if len > MAX_SLICE_LEN {
        return Err(SliceError::capacity(format!(
            "请求长度 {len} 超过上限 {MAX_SLICE_LEN}"
        )));
    }
    Ok(())
}

/// 以 2 GiB 上限为准的加法，溢出即报容量错误。
pub(crate) fn checked_len_add(a: usize, b: usize) -> Result<usize> {
    match a.checked_add(b) {
        Some(sum) if sum <= MAX_SLICE_LEN => Ok(sum),
        _ => Err(SliceError::capacity(format!(
            "长度 {a} + {b} 超过上限 {MAX_SLICE_LEN}"
        ))),
    }
}
