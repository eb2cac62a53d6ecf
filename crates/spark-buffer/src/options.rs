use serde::{Deserialize, Serialize};
use spark_slice::{ErrorKind, MAX_SLICE_LEN, Result, SliceError, codes};

/// 竞技场的页尺寸与对齐配置。
///
/// # 设计背景（Why）
/// - 首页较小，让只分配少量键的短命竞技场不占用大块内存；每次翻页翻倍，直到上限，
///   让长命竞技场的页数保持对数级；
/// - 配置可以从 TOML/JSON 等格式反序列化，缺省字段回落到默认值。
///
/// # 契约说明（What）
/// - `initial_page_size`/`max_page_size` 必须是 2 的幂，且 `initial <= max <= MAX_SLICE_LEN`；
/// - `alignment` 必须是 2 的幂且不超过 `initial_page_size / 2`；
/// - 不合法的组合由 [`validate`](Self::validate) 以参数错误报告。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SliceBufferOptions {
    pub initial_page_size: usize,
    pub max_page_size: usize,
    pub alignment: usize,
}

impl SliceBufferOptions {
    pub const DEFAULT_INITIAL_PAGE_SIZE: usize = 256;
    pub const DEFAULT_MAX_PAGE_SIZE: usize = 64 * 1024;
    pub const DEFAULT_ALIGNMENT: usize = 8;

    /// 设置首页大小。
    pub fn with_initial_page_size(mut self, size: usize) -> Self {
        self.initial_page_size = size;
        self
    }

    /// 设置页大小上限。
    pub fn with_max_page_size(mut self, size: usize) -> Self {
        self.max_page_size = size;
        self
    }

    /// 设置对齐分配的粒度。
    pub fn with_alignment(mut self, alignment: usize) -> Self {
        self.alignment = alignment;
        self
    }

    /// 校验配置组合。
    pub fn validate(&self) -> Result<()> {
        if !self.initial_page_size.is_power_of_two() || !self.max_page_size.is_power_of_two() {
            return Err(invalid(format!(
                "页尺寸必须是 2 的幂：initial={} max={}",
                self.initial_page_size, self.max_page_size
            )));
        }
        if self.initial_page_size > self.max_page_size || self.max_page_size > MAX_SLICE_LEN {
            return Err(invalid(format!(
                "页尺寸需满足 initial <= max <= {MAX_SLICE_LEN}：initial={} max={}",
                self.initial_page_size, self.max_page_size
            )));
        }
        if !self.alignment.is_power_of_two() || self.alignment > self.initial_page_size / 2 {
            return Err(invalid(format!(
                "对齐值 {} 必须是 2 的幂且不超过首页的一半",
                self.alignment
            )));
        }
        Ok(())
    }
}

impl Default for SliceBufferOptions {
    fn default() -> Self {
        Self {
            initial_page_size: Self::DEFAULT_INITIAL_PAGE_SIZE,
            max_page_size: Self::DEFAULT_MAX_PAGE_SIZE,
            alignment: Self::DEFAULT_ALIGNMENT,
        }
    }
}

fn invalid(message: String) -> SliceError {
    SliceError::new(ErrorKind::Argument, codes::INVALID_ARGUMENT, message)
}
