//! 从外部字节源物化 [`Slice`]。
//!
//! # 设计背景（Why）
//! - 上层协议常以“长度前缀 + 正文”的形式从文件或套接字交付数据，本模块是字节层唯一与外部源打交道的入口；
//! - 声明长度来自不可信输入，超过 [`MAX_SLICE_LEN`] 时在读取前拒绝；缓冲按实际到达的字节增长，
//!   不会因为伪造的长度一次性分配 2 GiB。
//!
//! # 契约说明（What）
//! - 源在声明长度之前结束：截断错误，已读字节被丢弃；
//! - 源返回 IO 错误：`Io` 类错误，原始描述保留在消息中；
//! - 异步变体在每次等待时观察 [`Cancellation`]，被取消时返回 `Cancelled` 类错误。

use std::io::Read;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{ErrorKind, MAX_SLICE_LEN, Result, SliceError, codes};
use crate::slice::Slice;

/// 首次为物化缓冲预留的字节数，之后随读取增长。
const INITIAL_RESERVE: usize = 64 * 1024;

/// 协作式取消令牌，克隆体共享同一原子标记。
#[derive(Clone, Debug, Default)]
pub struct Cancellation {
    flag: Arc<AtomicBool>,
}

impl Cancellation {
    /// 未取消的新令牌。
    pub fn new() -> Self {
        Self::default()
    }

    /// 是否已请求取消。
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// 标记取消；返回 `true` 表示本次调用首次触发。
    pub fn cancel(&self) -> bool {
        self.flag
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// 派生共享同一标记的子令牌。
    pub fn child(&self) -> Self {
        self.clone()
    }
}

fn checked_declared_len(declared_len: u64) -> Result<usize> {
    if declared_len > MAX_SLICE_LEN as u64 {
        return Err(SliceError::capacity(format!(
            "声明长度 {declared_len} 超过上限 {MAX_SLICE_LEN}"
        )));
    }
    Ok(declared_len as usize)
}

fn io_failed(err: std::io::Error) -> SliceError {
    SliceError::new(
        ErrorKind::Io,
        codes::IO_FAILED,
        format!("读取字节源失败: {err}"),
    )
}

fn finish(buffer: Vec<u8>, declared: usize) -> Result<Slice> {
    if buffer.len() < declared {
        return Err(SliceError::truncated(declared, buffer.len()));
    }
    tracing::debug!(target: "spark_slice::source", len = declared, "已从字节源物化视图");
    Ok(Slice::wrap(buffer))
}

/// 同步读取恰好 `declared_len` 字节并包装为视图。
///
/// ```rust
/// use spark_slice::source::read_exact_slice;
///
/// let slice = read_exact_slice(&b"payload-and-more"[..], 7).unwrap();
/// assert_eq!(slice, "payload");
/// ```
pub fn read_exact_slice<R: Read>(reader: R, declared_len: u64) -> Result<Slice> {
    let declared = checked_declared_len(declared_len)?;
    let mut buffer = Vec::with_capacity(declared.min(INITIAL_RESERVE));
    Read::read_to_end(&mut Read::take(reader, declared_len), &mut buffer).map_err(io_failed)?;
    finish(buffer, declared)
}

#[cfg(feature = "runtime-tokio")]
mod runtime {
    use std::time::Duration;

    use tokio::io::{AsyncRead, AsyncReadExt};

    use super::{Cancellation, INITIAL_RESERVE, checked_declared_len, finish, io_failed};
    use crate::error::{ErrorKind, Result, SliceError, codes};
    use crate::slice::Slice;

    const CANCELLATION_POLL_INTERVAL: Duration = Duration::from_millis(5);

    async fn wait_for_cancellation(cancellation: &Cancellation) {
        while !cancellation.is_cancelled() {
            tokio::time::sleep(CANCELLATION_POLL_INTERVAL).await;
        }
    }

    fn cancelled() -> SliceError {
        SliceError::new(ErrorKind::Cancelled, codes::CANCELLED, "物化过程已被取消")
    }

    /// 异步读取恰好 `declared_len` 字节，可通过 `cancellation` 中止。
    pub async fn read_exact_slice_async<R>(
        reader: R,
        declared_len: u64,
        cancellation: &Cancellation,
    ) -> Result<Slice>
    where
        R: AsyncRead + Unpin,
    {
        let declared = checked_declared_len(declared_len)?;
        if cancellation.is_cancelled() {
            return Err(cancelled());
        }
        let mut buffer = Vec::with_capacity(declared.min(INITIAL_RESERVE));
        let mut limited = AsyncReadExt::take(reader, declared_len);
        let outcome = tokio::select! {
            biased;
            _ = wait_for_cancellation(cancellation) => None,
            result = AsyncReadExt::read_to_end(&mut limited, &mut buffer) => Some(result),
        };
        match outcome {
            None => {
                tracing::debug!(target: "spark_slice::source", declared, "物化被取消");
                Err(cancelled())
            }
            Some(Err(err)) => Err(io_failed(err)),
            Some(Ok(_)) => finish(buffer, declared),
        }
    }
}

#[cfg(feature = "runtime-tokio")]
pub use runtime::read_exact_slice_async;
