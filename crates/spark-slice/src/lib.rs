//! `spark-slice` 提供有序 KV 客户端的字节层：零拷贝字节视图、游标式读写器以及它们依赖的位运算工具。
//!
//! # 模块定位（Why）
//! - 所有与存储交换的键和值都以 [`Slice`] 的形式在客户端内部流转，这一层的正确性
//!   （无别名错误、无越界访问、逐字节精确往返）与性能（最少复制与分配）是上层协议的地基；
//! - 把偏移算术、定宽/变长编码与调试文本集中在一个 crate，协议层只组合这些原语，不再各自实现。
//!
//! # 设计概要（How）
//! - [`Slice`]/[`MutableSlice`] 基于 `bytes` 的引用计数缓冲，子区间、拼接与冻结都不复制；
//! - [`SliceWriter`]/[`SliceReader`] 共用 [`endian`] 与 [`varint`] 中的编解码例程，字节序与宽度由类型参数选择；
//! - [`bits`] 提供无分支的位运算，[`escape`](Slice::escape) 提供可逆的调试文本；
//! - [`source`] 是唯一面向外部字节源的入口，异步变体位于 `runtime-tokio` 特性之后。
//!
//! # 契约说明（What）
//! - 所有可失败操作返回 [`Result`]，错误携带稳定错误码（见 [`codes`]）与 [`ErrorKind`]；
//! - 组件本身不加锁：[`Slice`] 发布后可跨线程并发读取，其余类型需要 `&mut` 才能修改。

pub mod bits;
pub mod endian;
mod error;
mod escape;
mod pin;
mod reader;
mod slice;
mod slice_mut;
pub mod source;
pub mod varint;
mod writer;

pub use endian::{BigEndian, ByteOrder, FixedWidth, LittleEndian};
pub use error::{ErrorKind, MAX_SLICE_LEN, Result, SliceError, codes};
pub use escape::TRUNCATION_MARKER;
pub use pin::{PinnedMut, PinnedSet, PinnedSlice};
pub use reader::SliceReader;
pub use slice::{DEBUG_TEXT_LIMIT, Slice, SplitMode};
pub use slice_mut::MutableSlice;
pub use source::Cancellation;
pub use varint::VarInt;
pub use writer::{MIN_CAPACITY, SliceWriter};
