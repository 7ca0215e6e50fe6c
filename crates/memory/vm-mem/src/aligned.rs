//! Aligned native buffers
//!
//! 通过显式的分配器能力 ([`BufferAllocator`]) 获取原生内存，返回带对齐标记的句柄
//! ([`AlignedBuffer`])。调用方根据标记决定是否可以走对齐加载路径，而不是依赖
//! 通用分配器碰巧给出的对齐。
//!
//! ## 分配器
//! - [`SystemAlignedAllocator`]: 使用全局分配器，按请求的对齐分配
//! - [`MisalignedAllocator`]: 故意把返回地址偏离请求的对齐，用于覆盖非对齐路径

use std::alloc::Layout;
use std::fmt;
use std::ptr::NonNull;

use crate::error::MemError;

/// 256-bit 向量的对齐要求（字节）
pub const VECTOR256_ALIGNMENT: usize = 32;

/// 缓冲区对齐标记
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignmentTag {
    /// 起始地址按给定字节数对齐
    Aligned(usize),
    /// 起始地址不满足请求的对齐
    Unaligned,
}

impl AlignmentTag {
    /// 根据实际地址计算标记
    pub fn for_address(address: usize, requested: usize) -> Self {
        if requested.is_power_of_two() && address % requested == 0 {
            AlignmentTag::Aligned(requested)
        } else {
            AlignmentTag::Unaligned
        }
    }

    /// 是否满足 `required` 字节的对齐要求
    pub fn satisfies(self, required: usize) -> bool {
        match self {
            // 两者都是 2 的幂，较大的对齐蕴含较小的对齐
            AlignmentTag::Aligned(align) => required.is_power_of_two() && align >= required,
            AlignmentTag::Unaligned => false,
        }
    }
}

/// 分配器能力
pub trait BufferAllocator: fmt::Debug + Send + Sync {
    /// 分配 `size` 字节、请求 `align` 字节对齐的零初始化缓冲区
    fn allocate(&self, size: usize, align: usize) -> Result<AlignedBuffer, MemError>;

    /// 分配器名称，用于日志
    fn name(&self) -> &'static str;
}

/// 独占的原生缓冲区，drop 时释放
pub struct AlignedBuffer {
    /// 分配基址
    base: NonNull<u8>,
    /// 分配时使用的布局
    layout: Layout,
    /// 可用区域相对基址的偏移
    offset: usize,
    /// 可用区域长度（字节）
    len: usize,
    tag: AlignmentTag,
}

// SAFETY: AlignedBuffer 独占其内存，不共享内部指针。
unsafe impl Send for AlignedBuffer {}
// SAFETY: 共享引用只提供只读访问。
unsafe impl Sync for AlignedBuffer {}

impl AlignedBuffer {
    /// 按 `layout` 分配零初始化内存，向外暴露 `[offset, offset + len)` 区间
    fn allocate_raw(
        layout: Layout,
        offset: usize,
        len: usize,
        requested: usize,
    ) -> Result<Self, MemError> {
        debug_assert!(offset + len <= layout.size());

        // SAFETY: 调用方保证 layout.size() > 0。
        let ptr = unsafe { std::alloc::alloc_zeroed(layout) };
        let base = NonNull::new(ptr).ok_or(MemError::AllocationFailed {
            size: layout.size(),
            align: layout.align(),
        })?;

        let address = base.as_ptr() as usize + offset;
        Ok(Self {
            base,
            layout,
            offset,
            len,
            tag: AlignmentTag::for_address(address, requested),
        })
    }

    pub fn as_ptr(&self) -> *const u8 {
        // SAFETY: offset 在分配区间内。
        unsafe { self.base.as_ptr().add(self.offset) }
    }

    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        // SAFETY: offset 在分配区间内。
        unsafe { self.base.as_ptr().add(self.offset) }
    }

    pub fn as_slice(&self) -> &[u8] {
        // SAFETY: [offset, offset + len) 已分配且零初始化，生命周期绑定 &self。
        unsafe { std::slice::from_raw_parts(self.as_ptr(), self.len) }
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        let len = self.len;
        // SAFETY: 同上，&mut self 保证独占。
        unsafe { std::slice::from_raw_parts_mut(self.as_mut_ptr(), len) }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn tag(&self) -> AlignmentTag {
        self.tag
    }
}

impl fmt::Debug for AlignedBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlignedBuffer")
            .field("ptr", &self.as_ptr())
            .field("len", &self.len)
            .field("tag", &self.tag)
            .finish()
    }
}

impl Drop for AlignedBuffer {
    fn drop(&mut self) {
        // SAFETY: base 由同一个 layout 通过全局分配器分配，且只释放一次。
        unsafe {
            std::alloc::dealloc(self.base.as_ptr(), self.layout);
        }
    }
}

fn checked_layout(size: usize, align: usize) -> Result<Layout, MemError> {
    if size == 0 {
        return Err(MemError::InvalidSize(size));
    }
    Layout::from_size_align(size, align).map_err(|_| MemError::InvalidAlignment { size, align })
}

/// 全局分配器 + 请求的对齐
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemAlignedAllocator;

impl BufferAllocator for SystemAlignedAllocator {
    fn allocate(&self, size: usize, align: usize) -> Result<AlignedBuffer, MemError> {
        let layout = checked_layout(size, align)?;
        AlignedBuffer::allocate_raw(layout, 0, size, align)
    }

    fn name(&self) -> &'static str {
        "system-aligned"
    }
}

/// 返回偏离请求对齐 `offset` 字节的缓冲区
#[derive(Debug, Clone, Copy)]
pub struct MisalignedAllocator {
    offset: usize,
}

impl MisalignedAllocator {
    pub fn new(offset: usize) -> Self {
        Self { offset }
    }
}

impl Default for MisalignedAllocator {
    fn default() -> Self {
        Self::new(1)
    }
}

impl BufferAllocator for MisalignedAllocator {
    fn allocate(&self, size: usize, align: usize) -> Result<AlignedBuffer, MemError> {
        // 先按请求对齐分配，再整体偏移；偏移量为对齐的倍数时结果仍是对齐的，标记如实反映
        let padded = size
            .checked_add(self.offset)
            .ok_or(MemError::InvalidSize(size))?;
        checked_layout(size, align)?;
        let layout = checked_layout(padded, align)?;
        AlignedBuffer::allocate_raw(layout, self.offset, size, align)
    }

    fn name(&self) -> &'static str {
        "misaligned"
    }
}
