//! `spark-buffer` 提供字节视图的批量分配设施：竞技场与页池。
//!
//! # 模块定位（Why）
//! - 构造大批键值时，为每个小区间单独分配会让全局分配器成为瓶颈；
//!   [`SliceBuffer`] 把这些区间打包进少量页，并以 [`spark_slice::MutableSlice`] 交给调用方填充。
//! - 页的复用策略与竞技场解耦：[`PagePool`] 定义借还契约，[`SlabPagePool`] 是基于自由链表的默认实现。
//!
//! # 设计概要（How）
//! - 页与视图共享 `bytes` 的引用计数，竞技场重置不会让已交出的视图悬垂；
//! - 页池在重置时只接收已无外部引用的页，仍被引用的页随最后一个视图释放；
//! - 页尺寸、上限与对齐由 [`SliceBufferOptions`] 描述，可直接从 TOML 反序列化。
//!
//! # 命名约定（Consistency）
//! - 沿用 `spark-slice` 的错误类型与错误码，竞技场不定义新的错误域。

mod arena;
mod options;
mod pool;

pub use arena::SliceBuffer;
pub use options::SliceBufferOptions;
pub use pool::{PagePool, PoolStats, SlabPagePool};
