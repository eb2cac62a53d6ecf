//! 作用域固定守卫：在跨越原生/非托管边界期间保证字节地址稳定且内存存活。
//!
//! # 设计背景（Why）
//! - 把视图交给 C 接口或 DMA 之类的外部消费者时，调用方需要一个“从此刻到释放为止地址不变”的承诺；
//! - 共享缓冲由引用计数持有，守卫额外持有一份句柄，即使原视图在期间被丢弃，内存也不会回收；
//! - 可变缓冲以独占借用固定，借用检查器保证固定期间写入器不会扩容搬迁。
//!
//! # 契约说明（What）
//! - 构造即获得承诺，`Drop` 必然释放，包括错误提前返回与栈展开；
//! - 显式 [`release`](PinnedSlice::release) 可重复调用，第二次起为空操作；
//! - 释放后指针访问器返回空指针，防止把失效承诺继续交给外部。

use bytes::Bytes;

use crate::slice::Slice;

/// 只读视图的固定守卫。
#[must_use = "守卫离开作用域即释放固定"]
pub struct PinnedSlice<'a> {
    view: &'a Slice,
    anchor: Option<Bytes>,
    pinned: bool,
}

impl<'a> PinnedSlice<'a> {
    pub(crate) fn new(view: &'a Slice) -> Self {
        let anchor = view.buffer().cloned();
        tracing::trace!(target: "spark_slice::pin", len = view.len(), "固定只读视图");
        Self {
            view,
            anchor,
            pinned: true,
        }
    }

    /// 视图首字节地址；nil 视图或已释放时为空指针。
    pub fn as_ptr(&self) -> *const u8 {
        if self.pinned && self.anchor.is_some() {
            self.view.as_bytes().as_ptr()
        } else {
            std::ptr::null()
        }
    }

    pub fn len(&self) -> usize {
        self.view.len()
    }

    pub fn is_empty(&self) -> bool {
        self.view.is_empty()
    }

    /// 守卫是否仍持有固定。
    pub fn is_pinned(&self) -> bool {
        self.pinned
    }

    /// 固定期间的字节内容。
    pub fn as_bytes(&self) -> &'a [u8] {
        self.view.as_bytes()
    }

    /// 提前结束固定，可重复调用。
    pub fn release(&mut self) {
        if !self.pinned {
            return;
        }
        self.pinned = false;
        self.anchor = None;
        tracing::trace!(target: "spark_slice::pin", len = self.view.len(), "释放只读视图");
    }
}

impl Drop for PinnedSlice<'_> {
    fn drop(&mut self) {
        self.release();
    }
}

/// 可写字节区间的固定守卫，持有独占借用。
#[must_use = "守卫离开作用域即释放固定"]
pub struct PinnedMut<'a> {
    bytes: &'a mut [u8],
    pinned: bool,
}

impl<'a> PinnedMut<'a> {
    pub(crate) fn new(bytes: &'a mut [u8]) -> Self {
        tracing::trace!(target: "spark_slice::pin", len = bytes.len(), "固定可写区间");
        Self {
            bytes,
            pinned: true,
        }
    }

    /// 可写首字节地址；已释放时为空指针。
    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        if self.pinned {
            self.bytes.as_mut_ptr()
        } else {
            std::ptr::null_mut()
        }
    }

    /// 可写借出被固定的区间。
    pub fn as_mut_bytes(&mut self) -> &mut [u8] {
        &mut *self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// 守卫是否仍持有固定。
    pub fn is_pinned(&self) -> bool {
        self.pinned
    }

    /// 提前释放；重复调用无副作用。
    pub fn release(&mut self) {
        if !self.pinned {
            return;
        }
        self.pinned = false;
        tracing::trace!(target: "spark_slice::pin", len = self.bytes.len(), "释放可写区间");
    }
}

impl Drop for PinnedMut<'_> {
    fn drop(&mut self) {
        self.release();
    }
}

/// 一组视图的固定守卫，释放顺序与获取顺序相反。
#[must_use = "守卫离开作用域即释放固定"]
pub struct PinnedSet<'a> {
    guards: Vec<PinnedSlice<'a>>,
}

impl<'a> PinnedSet<'a> {
    pub(crate) fn new(views: &'a [Slice]) -> Self {
        Self {
            guards: views.iter().map(PinnedSlice::new).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.guards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guards.is_empty()
    }

    /// 第 `index` 个守卫。
    pub fn get(&self, index: usize) -> Option<&PinnedSlice<'a>> {
        self.guards.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PinnedSlice<'a>> {
        self.guards.iter()
    }

    /// 提前释放；重复调用无副作用。
    pub fn release(&mut self) {
        for guard in self.guards.iter_mut().rev() {
            guard.release();
        }
    }
}

impl Drop for PinnedSet<'_> {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn release_is_idempotent() {
        let view = Slice::from("pinned");
        let mut guard = view.pin();
        assert!(guard.is_pinned());
        assert_eq!(guard.as_ptr(), view.as_bytes().as_ptr());
        guard.release();
        guard.release();
        assert!(!guard.is_pinned());
        assert!(guard.as_ptr().is_null());
    }

    #[test]
    fn guard_keeps_backing_alive() {
        let view = Slice::from("abc");
        let guard = view.pin();
        let backing = view.buffer().unwrap().clone();
        // 视图、守卫锚点与本地句柄三份引用，`try_into_mut` 必然失败。
        assert!(backing.try_into_mut().is_err());
        drop(guard);
    }

    fn pinned_handoff(view: &Slice, fail: bool) -> crate::Result<usize> {
        let guard = view.pin();
        if fail {
            Err(crate::SliceError::argument("外部调用失败"))?;
        }
        Ok(guard.len())
    }

    #[test]
    fn early_return_and_unwind_release_the_pin() {
        let view = Slice::wrap(b"native".to_vec());
        assert!(pinned_handoff(&view, true).is_err());
        assert_eq!(pinned_handoff(&view, false).unwrap(), 6);

        let unwound = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = view.pin();
            panic!("外部回调崩溃");
        }));
        assert!(unwound.is_err());

        // 守卫全部释放后，视图是底层缓冲的唯一持有者。
        assert!(view.into_bytes().try_into_mut().is_ok());
    }

    #[test]
    fn nil_view_pins_to_null() {
        let nil = Slice::nil();
        let guard = nil.pin();
        assert!(guard.as_ptr().is_null());
        assert!(guard.is_empty());
    }

    #[test]
    fn set_releases_every_member() {
        let views = vec![Slice::from("a"), Slice::from("bc")];
        let mut set = Slice::pin_all(&views);
        assert_eq!(set.len(), 2);
        assert_eq!(set.get(1).unwrap().len(), 2);
        set.release();
        assert!(set.iter().all(|guard| !guard.is_pinned()));
        set.release();
    }

    #[test]
    fn mutable_guard_writes_through() {
        let mut raw = [0u8; 4];
        {
            let mut guard = PinnedMut::new(&mut raw);
            let ptr = guard.as_mut_ptr();
            assert!(!ptr.is_null());
            guard.as_mut_bytes()[0] = 7;
        }
        assert_eq!(raw[0], 7);
    }
}
