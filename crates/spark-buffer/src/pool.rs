use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use bytes::BytesMut;
use spin::Mutex;

/// 竞技场页的来源与归宿。
///
/// # 设计背景（Why）
/// - 大量短命竞技场反复创建、重置时，页分配是主要开销；把页交给池复用后，
///   稳态下竞技场不再触达全局分配器；
/// - 以 trait 隔离池策略，竞技场只依赖“借出/归还”两个动作，测试可注入计数实现。
///
/// # 契约说明（What）
/// - [`acquire`](Self::acquire) 返回 `len() == 0` 且 `capacity() >= min_capacity` 的页；
/// - [`release`](Self::release) 归还的页必须是本池借出、且不再被任何视图引用的页；
/// - 页因外部视图仍存活而无法归还时，调用方改用 [`forfeit`](Self::forfeit) 报告其容量，
///   池据此修正统计；
/// - 实现必须线程安全，多个竞技场可以共享同一个池。
pub trait PagePool: Send + Sync {
    fn acquire(&self, min_capacity: usize) -> BytesMut;

    fn release(&self, page: BytesMut);

    fn forfeit(&self, capacity: usize);

    fn statistics(&self) -> PoolStats;

    /// 丢弃空闲页，返回释放的字节数。
    fn shrink_to_fit(&self) -> usize;
}

/// 池状态快照，字段在读取瞬间各自原子地取值，彼此之间不保证一致。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// 池创建且尚未丢失的页容量总和。
    pub allocated_bytes: usize,
    /// 空闲链表中可直接复用的容量。
    pub available_bytes: usize,
    /// 已借出未归还的页数。
    pub active_leases: usize,
    /// 空闲链表长度。
    pub free_slots: usize,
    /// 借出时命中空闲页的次数。
    pub hits: u64,
    /// 借出时需要新分配的次数。
    pub misses: u64,
    /// 成功归还的次数。
    pub recycled: u64,
}

/// `SlabPagePool` 以自由链表复用竞技场页。
///
/// # 核心机制（How）
/// - 内部维护 `spin::Mutex<Vec<BytesMut>>` 作为自由链表，借出时优先复用容量足够的页；
/// - `PoolMetrics` 以原子计数跟踪容量与命中情况，支撑 [`statistics`](PagePool::statistics) 快照；
/// - 克隆得到的句柄共享同一个池。
///
/// # 设计权衡（Trade-offs）
/// - 使用自旋锁而非 `std::sync::Mutex`：临界区只有一次线性扫描与 `swap_remove`，持锁时间极短；
/// - 首次适配（first fit）可能把大页借给小请求，竞技场的页尺寸只有少数几档，实际浪费有限；
/// - `shrink_to_fit` 直接清空自由链表，便于在峰值过后一次性归还内存。
#[derive(Clone, Default)]
pub struct SlabPagePool {
    inner: Arc<PoolInner>,
}

impl SlabPagePool {
    /// 空池，首次借页时才分配。
    pub fn new() -> Self {
        Self::default()
    }
}

impl PagePool for SlabPagePool {
    fn acquire(&self, min_capacity: usize) -> BytesMut {
        self.inner.acquire_page(min_capacity)
    }

    fn release(&self, page: BytesMut) {
        self.inner.release_page(page);
    }

    fn forfeit(&self, capacity: usize) {
        self.inner.metrics.decrease_active_leases();
        self.inner.metrics.decrease_on_loss(capacity);
        tracing::debug!(
            target: "spark_buffer::pool",
            capacity,
            "页仍被外部视图引用，放弃回收"
        );
    }

    fn statistics(&self) -> PoolStats {
        self.inner.snapshot()
    }

    fn shrink_to_fit(&self) -> usize {
        self.inner.shrink_free_list()
    }
}

#[derive(Default)]
struct PoolInner {
    free_list: Mutex<Vec<BytesMut>>,
    metrics: PoolMetrics,
}

impl PoolInner {
    fn acquire_page(&self, min_capacity: usize) -> BytesMut {
        let reused = {
            let mut list = self.free_list.lock();
            list.iter()
                .position(|page| page.capacity() >= min_capacity)
                .map(|index| list.swap_remove(index))
        };

        let mut page = match reused {
            Some(page) => {
                self.metrics.decrease_available(page.capacity());
                self.metrics.hits.fetch_add(1, Ordering::Relaxed);
                tracing::trace!(
                    target: "spark_buffer::pool",
                    min_capacity,
                    capacity = page.capacity(),
                    "复用空闲页"
                );
                page
            }
            None => {
                let page = BytesMut::with_capacity(min_capacity);
                self.metrics.increase_on_new_allocation(page.capacity());
                self.metrics.misses.fetch_add(1, Ordering::Relaxed);
                tracing::trace!(
                    target: "spark_buffer::pool",
                    min_capacity,
                    "空闲链表无可用页，新分配"
                );
                page
            }
        };
        page.clear();
        self.metrics.active_leases.fetch_add(1, Ordering::Relaxed);
        page
    }

    fn release_page(&self, mut page: BytesMut) {
        page.clear();
        self.metrics.decrease_active_leases();
        self.metrics.increase_available(page.capacity());
        self.metrics.recycled.fetch_add(1, Ordering::Relaxed);
        self.free_list.lock().push(page);
    }

    fn shrink_free_list(&self) -> usize {
        let mut list = self.free_list.lock();
        let reclaimed: usize = list.iter().map(BytesMut::capacity).sum();
        list.clear();
        self.metrics.decrease_available(reclaimed);
        self.metrics.decrease_on_loss(reclaimed);
        reclaimed
    }

    fn snapshot(&self) -> PoolStats {
        let free_slots = self.free_list.lock().len();
        PoolStats {
            allocated_bytes: self.metrics.allocated_bytes.load(Ordering::Relaxed),
            available_bytes: self.metrics.available_bytes.load(Ordering::Relaxed),
            active_leases: self.metrics.active_leases.load(Ordering::Relaxed),
            free_slots,
            hits: self.metrics.hits.load(Ordering::Relaxed),
            misses: self.metrics.misses.load(Ordering::Relaxed),
            recycled: self.metrics.recycled.load(Ordering::Relaxed),
        }
    }
}

#[derive(Default)]
struct PoolMetrics {
    allocated_bytes: AtomicUsize,
    available_bytes: AtomicUsize,
    active_leases: AtomicUsize,
    hits: AtomicU64,
    misses: AtomicU64,
    recycled: AtomicU64,
}

impl PoolMetrics {
    fn increase_on_new_allocation(&self, capacity: usize) {
        self.allocated_bytes.fetch_add(capacity, Ordering::Relaxed);
    }

    fn increase_available(&self, capacity: usize) {
        self.available_bytes.fetch_add(capacity, Ordering::Relaxed);
    }

    fn decrease_available(&self, capacity: usize) {
        saturating_sub(&self.available_bytes, capacity);
    }

    fn decrease_on_loss(&self, capacity: usize) {
        saturating_sub(&self.allocated_bytes, capacity);
    }

    fn decrease_active_leases(&self) {
        saturating_sub(&self.active_leases, 1);
    }
}

fn saturating_sub(target: &AtomicUsize, value: usize) {
    let _ = target.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
        Some(current.saturating_sub(value))
    });
}
