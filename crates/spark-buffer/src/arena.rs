use std::fmt;
use std::sync::Arc;

use bytes::BytesMut;
use spark_slice::bits::padding_power_of_two;
use spark_slice::{ErrorKind, MAX_SLICE_LEN, MutableSlice, Result, Slice, SliceError, codes};

use crate::options::SliceBufferOptions;
use crate::pool::PagePool;

/// `SliceBuffer` 把大量小字节区间打包进少量按几何级数增长的页。
///
/// # 设计背景（Why）
/// - 批量构造键值时逐个 `Vec` 分配会让分配器成为瓶颈，竞技场把成百上千个小区间合并进同一页；
/// - 视图通过 `bytes` 的引用计数共享页，竞技场重置后旧视图依旧有效，
///   只是所在页暂时无法被池回收，不存在悬垂访问。
///
/// # 核心机制（How）
/// - 当前页是一段零初始化的 `BytesMut`，每次分配用 `split_to` 从头部切下；
/// - 当前页放不下时翻页：旧页退役，页目标尺寸翻倍（不超过上限），再开新页；
/// - 超过页目标一半的请求走独立分配，避免一个大请求挤掉整页余量；
/// - 挂接 [`PagePool`] 时，重置会把页尾回收成完整页后交还给池。
///
/// # 契约说明（What）
/// - `used()` 是所有请求长度之和，`allocated()` 是背后占用的页与独立分配字节数，二者在重置后归零；
/// - 返回的可变视图互不重叠，初始内容全为零；
/// - 竞技场只允许单线程持有 `&mut` 修改，可在线程间移动。
pub struct SliceBuffer {
    options: SliceBufferOptions,
    pool: Option<Arc<dyn PagePool>>,
    current: Option<Page>,
    retired: Vec<Page>,
    page_target: usize,
    used: usize,
    allocated: usize,
}

struct Page {
    /// 尚未切出的页尾。
    tail: BytesMut,
    size: usize,
    capacity: usize,
}

impl SliceBuffer {
    /// 默认选项、不接池的竞技场。
    pub fn new() -> Self {
        Self::build(SliceBufferOptions::default(), None)
    }

    /// 按给定配置创建，配置不合法时返回参数错误。
    pub fn with_options(options: SliceBufferOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self::build(options, None))
    }

    /// 创建从 `pool` 借页、重置时归还的竞技场。
    pub fn with_pool(options: SliceBufferOptions, pool: Arc<dyn PagePool>) -> Result<Self> {
        options.validate()?;
        Ok(Self::build(options, Some(pool)))
    }

    fn build(options: SliceBufferOptions, pool: Option<Arc<dyn PagePool>>) -> Self {
        Self {
            page_target: options.initial_page_size,
            options,
            pool,
            current: None,
            retired: Vec::new(),
            used: 0,
            allocated: 0,
        }
    }

    /// 构造时的选项。
    pub fn options(&self) -> &SliceBufferOptions {
        &self.options
    }

    /// 已交给调用方的字节总数。
    pub fn used(&self) -> usize {
        self.used
    }

    /// 页与独立分配占用的字节总数。
    pub fn allocated(&self) -> usize {
        self.allocated
    }

    /// 下一次翻页前的页尺寸。
    pub fn page_target(&self) -> usize {
        self.page_target
    }

    /// 当前页与退役页的数量，不含独立分配。
    pub fn page_count(&self) -> usize {
        self.retired.len() + usize::from(self.current.is_some())
    }

    /// 当前页剩余可切分的字节数。
    pub fn remaining(&self) -> usize {
        self.current.as_ref().map_or(0, |page| page.tail.len())
    }

    /// 是否从页池借页。
    pub fn is_pooled(&self) -> bool {
        self.pool.is_some()
    }

    /// 分配 `len` 个零字节并返回独占视图。
    ///
    /// # 契约说明（What）
    /// - `len == 0` 返回 empty 视图，不触碰页；
    /// - `aligned` 为真时，视图起始地址对齐到 `options.alignment`；
    /// - `len` 超过 2 GiB 上限返回容量错误。
    pub fn allocate(&mut self, len: usize, aligned: bool) -> Result<MutableSlice> {
        if len == 0 {
            return Ok(MutableSlice::empty());
        }
        if len > MAX_SLICE_LEN {
            return Err(SliceError::new(
                ErrorKind::Overflow,
                codes::CAPACITY_EXCEEDED,
                format!("竞技场分配 {len} 字节超过上限 {MAX_SLICE_LEN}"),
            ));
        }
        let alignment = if aligned { self.options.alignment } else { 1 };
        if len > self.page_target / 2 {
            return self.allocate_dedicated(len, alignment);
        }

        let fits = self
            .current
            .as_ref()
            .is_some_and(|page| padding_for(&page.tail, alignment) + len <= page.tail.len());
        if !fits {
            self.roll_over();
        }
        let Some(page) = self.current.as_mut() else {
            return Err(SliceError::new(
                ErrorKind::Validity,
                codes::INVALID_VIEW,
                "竞技场缺少当前页",
            ));
        };
        let padding = padding_for(&page.tail, alignment);
        if padding > 0 {
            drop(page.tail.split_to(padding));
        }
        let chunk = page.tail.split_to(len);
        self.used += len;
        Ok(MutableSlice::from(chunk))
    }

    fn allocate_dedicated(&mut self, len: usize, alignment: usize) -> Result<MutableSlice> {
        let reserve = len.checked_add(alignment - 1).filter(|v| *v <= MAX_SLICE_LEN);
        let Some(reserve) = reserve else {
            return Err(SliceError::new(
                ErrorKind::Overflow,
                codes::CAPACITY_EXCEEDED,
                format!("对齐后的独立分配 {len} 字节超过上限"),
            ));
        };
        let mut buf = BytesMut::zeroed(reserve);
        let padding = padding_for(&buf, alignment);
        if padding > 0 {
            drop(buf.split_to(padding));
        }
        buf.truncate(len);
        self.used += len;
        self.allocated += reserve;
        tracing::debug!(
            target: "spark_buffer::arena",
            len,
            page_target = self.page_target,
            "超大请求使用独立分配"
        );
        Ok(MutableSlice::from(buf))
    }

    fn roll_over(&mut self) {
        if let Some(page) = self.current.take() {
            self.retired.push(page);
            self.page_target = self
                .page_target
                .saturating_mul(2)
                .min(self.options.max_page_size);
        }
        let size = self.page_target;
        let mut tail = match &self.pool {
            Some(pool) => pool.acquire(size),
            None => BytesMut::with_capacity(size),
        };
        let capacity = tail.capacity();
        tail.resize(size, 0);
        self.allocated += size;
        tracing::debug!(
            target: "spark_buffer::arena",
            size,
            pages = self.retired.len() + 1,
            used = self.used,
            "竞技场开启新页"
        );
        self.current = Some(Page {
            tail,
            size,
            capacity,
        });
    }

    /// 复制 `data` 到竞技场并返回只读视图。
    pub fn intern(&mut self, data: &[u8]) -> Result<Slice> {
        if data.is_empty() {
            return Ok(Slice::empty());
        }
        let mut target = self.allocate(data.len(), false)?;
        target.copy_from_at(0, data)?;
        Ok(target.freeze())
    }

    /// 同 [`intern`](Self::intern)，保留 nil 语义。
    pub fn intern_slice(&mut self, slice: &Slice) -> Result<Slice> {
        if slice.is_nil() {
            return Ok(Slice::nil());
        }
        self.intern(slice.as_bytes())
    }

    /// 把 `data` 与 `suffix` 连续复制进同一段分配。
    ///
    /// `data` 为空时直接返回 `suffix` 本身，不复制。
    pub fn intern_with_suffix(&mut self, data: &[u8], suffix: &Slice) -> Result<Slice> {
        if data.is_empty() {
            return Ok(suffix.clone());
        }
        let Some(total) = data.len().checked_add(suffix.len()) else {
            return Err(SliceError::new(
                ErrorKind::Overflow,
                codes::CAPACITY_EXCEEDED,
                "拼接长度溢出",
            ));
        };
        let mut target = self.allocate(total, false)?;
        target.copy_from_at(0, data)?;
        target.copy_from_at(data.len(), suffix.as_bytes())?;
        Ok(target.freeze())
    }

    /// 释放全部页并把计数归零，页目标回到初始尺寸。
    ///
    /// 已经交出的视图继续持有各自的页；挂接池时，这些页因仍被引用而不会归还，
    /// 其余页清空后回到池中。
    pub fn reset(&mut self) {
        let pages = self.page_count();
        let (mut returned, mut forfeited) = (0usize, 0usize);
        let drained = self.retired.drain(..).chain(self.current.take());
        match &self.pool {
            Some(pool) => {
                for page in drained {
                    if give_back(pool.as_ref(), page) {
                        returned += 1;
                    } else {
                        forfeited += 1;
                    }
                }
            }
            None => drained.for_each(drop),
        }
        tracing::debug!(
            target: "spark_buffer::arena",
            pages,
            returned,
            forfeited,
            used = self.used,
            allocated = self.allocated,
            "竞技场已重置"
        );
        self.page_target = self.options.initial_page_size;
        self.used = 0;
        self.allocated = 0;
    }
}

impl Default for SliceBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SliceBuffer {
    fn drop(&mut self) {
        if self.pool.is_some() && self.page_count() > 0 {
            self.reset();
        }
    }
}

impl fmt::Debug for SliceBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SliceBuffer")
            .field("used", &self.used)
            .field("allocated", &self.allocated)
            .field("page_target", &self.page_target)
            .field("page_count", &self.page_count())
            .field("pooled", &self.pool.is_some())
            .finish()
    }
}

fn padding_for(buf: &BytesMut, alignment: usize) -> usize {
    padding_power_of_two(buf.as_ptr() as usize, alignment)
}

/// 把页尾回收成完整页交还给池；页仍被视图引用时返回 `false`。
fn give_back(pool: &dyn PagePool, page: Page) -> bool {
    let Page {
        mut tail,
        size,
        capacity,
    } = page;
    tail.clear();
    if tail.try_reclaim(size) {
        pool.release(tail);
        true
    } else {
        pool.forfeit(capacity);
        tracing::trace!(
            target: "spark_buffer::arena",
            size,
            "页仍被存活视图引用，交由引用计数释放"
        );
        false
    }
}
