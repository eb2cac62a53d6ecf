//! `arena_contract` 集成测试：验证竞技场对外承诺的分配与计数语义。
//!
//! # 测试总览（Why）
//! - 竞技场交出的视图被直接当作键值使用，任何重叠都会让两个键互相覆盖；
//! - `used`/`allocated` 是上层做内存预算的依据，必须与实际请求精确对应；
//! - 重置后计数归零、旧视图仍可读，是“重置不会制造悬垂视图”的外部可见证据。

use std::sync::Arc;

use proptest::prelude::*;
use spark_buffer::{PagePool, SlabPagePool, SliceBuffer, SliceBufferOptions};
use spark_slice::Slice;

fn options() -> SliceBufferOptions {
    SliceBufferOptions::default()
        .with_initial_page_size(128)
        .with_max_page_size(1024)
}

fn span(view: &[u8]) -> (usize, usize) {
    let start = view.as_ptr() as usize;
    (start, start + view.len())
}

/// 填充后的视图冻结为只读键，内容与写入一致且互不干扰。
#[test]
fn filled_views_freeze_into_independent_keys() {
    let mut arena = SliceBuffer::with_options(options()).unwrap();
    let mut first = arena.allocate(4, false).unwrap();
    let mut second = arena.allocate(4, false).unwrap();
    first.copy_from_at(0, b"key1").unwrap();
    second.copy_from_at(0, b"key2").unwrap();
    let (first, second) = (first.freeze(), second.freeze());
    assert_eq!(first, "key1");
    assert_eq!(second, "key2");
    assert!(first < second);
}

/// 构造范围扫描的上下界：前缀与后缀共享同一段分配。
#[test]
fn interned_keys_compose_with_suffixes() {
    let mut arena = SliceBuffer::new();
    let prefix = arena.intern(b"tenant/7/").unwrap();
    let begin = arena.intern_with_suffix(prefix.as_bytes(), &Slice::from("a")).unwrap();
    let end = prefix.increment().unwrap();
    assert!(prefix < begin && begin < end);
    assert_eq!(arena.used(), 9 + 10);
}

/// 共享池的多个竞技场轮流重置，池中的页被循环使用。
#[test]
fn arenas_share_one_pool() {
    let pool = SlabPagePool::new();
    let shared: Arc<dyn PagePool> = Arc::new(pool.clone());
    for round in 0..4 {
        let mut arena = SliceBuffer::with_pool(options(), Arc::clone(&shared)).unwrap();
        for i in 0..10u8 {
            arena.intern(&[round, i]).unwrap();
        }
        arena.reset();
    }
    let stats = pool.statistics();
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hits, 3);
    assert_eq!(stats.active_leases, 0);
    assert_eq!(stats.free_slots, 1);
}

proptest! {
    /// 任意尺寸序列：视图两两不重叠，`used` 等于请求之和，重置后计数归零。
    #[test]
    fn allocations_never_overlap(
        sizes in proptest::collection::vec(0usize..700, 1..64),
        aligned in any::<bool>(),
    ) {
        let mut arena = SliceBuffer::with_options(options()).unwrap();
        let mut views = Vec::with_capacity(sizes.len());
        for &size in &sizes {
            let view = arena.allocate(size, aligned).unwrap();
            prop_assert_eq!(view.len(), size);
            prop_assert!(view.iter().all(|&b| b == 0));
            if aligned && size > 0 {
                prop_assert_eq!(view.as_ptr() as usize % 8, 0);
            }
            views.push(view);
        }
        prop_assert_eq!(arena.used(), sizes.iter().sum::<usize>());
        prop_assert!(arena.allocated() >= arena.used());
        prop_assert!(arena.page_target() <= 1024);

        let mut spans: Vec<(usize, usize)> = views
            .iter()
            .filter(|v| !v.is_empty())
            .map(|v| span(v))
            .collect();
        spans.sort_unstable();
        for pair in spans.windows(2) {
            prop_assert!(pair[0].1 <= pair[1].0, "重叠区间: {:?}", pair);
        }

        for (index, view) in views.iter_mut().enumerate() {
            view.fill(index as u8);
        }
        for (index, view) in views.iter().enumerate() {
            prop_assert!(view.iter().all(|&b| b == index as u8));
        }

        arena.reset();
        prop_assert_eq!(arena.used(), 0);
        prop_assert_eq!(arena.allocated(), 0);
        prop_assert_eq!(arena.page_count(), 0);
        prop_assert_eq!(arena.page_target(), 128);
    }
}
