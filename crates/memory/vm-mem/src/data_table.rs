//! Two-input data table for binary intrinsic tests
//!
//! 构造时把两组输入复制到新分配的对齐缓冲区，之后只读。表的生命周期即
//! 测试实例的生命周期，drop 时释放两块缓冲区。

use std::marker::PhantomData;
use std::mem::{align_of, size_of};

use crate::aligned::{AlignedBuffer, BufferAllocator, SystemAlignedAllocator};
use crate::error::MemError;

/// 两个输入缓冲区的数据表
#[derive(Debug)]
pub struct AlignedDataTable<T: Copy> {
    in_array1: AlignedBuffer,
    in_array2: AlignedBuffer,
    alignment: usize,
    op1_element_count: usize,
    op2_element_count: usize,
    _element: PhantomData<T>,
}

impl<T: Copy> AlignedDataTable<T> {
    /// 使用系统分配器创建数据表
    pub fn new(in_array1: &[T], in_array2: &[T], alignment: usize) -> Result<Self, MemError> {
        Self::with_allocator(in_array1, in_array2, alignment, &SystemAlignedAllocator)
    }

    /// 使用指定分配器创建数据表
    ///
    /// # 错误
    ///
    /// - `alignment` 不是 2 的幂或小于元素自身的对齐：`MemError::InvalidAlignment`
    /// - 任一输入为空：`MemError::InvalidSize`
    /// - 分配失败：`MemError::AllocationFailed`（不重试）
    pub fn with_allocator(
        in_array1: &[T],
        in_array2: &[T],
        alignment: usize,
        allocator: &dyn BufferAllocator,
    ) -> Result<Self, MemError> {
        if !alignment.is_power_of_two() || alignment < align_of::<T>() {
            return Err(MemError::InvalidAlignment {
                size: std::mem::size_of_val(in_array1),
                align: alignment,
            });
        }

        let buffer1 = Self::copy_into(in_array1, alignment, allocator)?;
        let buffer2 = Self::copy_into(in_array2, alignment, allocator)?;

        log::trace!(
            "Allocated data table via {}: {:?} / {:?}",
            allocator.name(),
            buffer1,
            buffer2
        );

        Ok(Self {
            in_array1: buffer1,
            in_array2: buffer2,
            alignment,
            op1_element_count: in_array1.len(),
            op2_element_count: in_array2.len(),
            _element: PhantomData,
        })
    }

    fn copy_into(
        source: &[T],
        alignment: usize,
        allocator: &dyn BufferAllocator,
    ) -> Result<AlignedBuffer, MemError> {
        let size = source.len() * size_of::<T>();
        let mut buffer = allocator.allocate(size, alignment)?;
        // SAFETY: buffer 恰好 size 字节，source 的字节区间与新分配的内存不重叠。
        unsafe {
            std::ptr::copy_nonoverlapping(source.as_ptr().cast::<u8>(), buffer.as_mut_ptr(), size);
        }
        Ok(buffer)
    }

    /// 第一个输入的起始地址（不保证满足 `T` 的对齐，见 [`Self::is_aligned_to`]）
    pub fn in_array1_ptr(&self) -> *const T {
        self.in_array1.as_ptr().cast()
    }

    /// 第二个输入的起始地址
    pub fn in_array2_ptr(&self) -> *const T {
        self.in_array2.as_ptr().cast()
    }

    pub fn in_array1_bytes(&self) -> &[u8] {
        self.in_array1.as_slice()
    }

    pub fn in_array2_bytes(&self) -> &[u8] {
        self.in_array2.as_slice()
    }

    pub fn op1_element_count(&self) -> usize {
        self.op1_element_count
    }

    pub fn op2_element_count(&self) -> usize {
        self.op2_element_count
    }

    /// 构造时请求的对齐
    pub fn alignment(&self) -> usize {
        self.alignment
    }

    /// 两块缓冲区是否都满足 `required` 字节对齐
    pub fn is_aligned_to(&self, required: usize) -> bool {
        self.in_array1.tag().satisfies(required) && self.in_array2.tag().satisfies(required)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aligned::{MisalignedAllocator, VECTOR256_ALIGNMENT};

    #[test]
    fn test_copies_both_inputs() {
        let left: Vec<u16> = (0..16).collect();
        let right: Vec<u16> = (100..116).collect();
        let table = AlignedDataTable::new(&left, &right, VECTOR256_ALIGNMENT).unwrap();

        assert_eq!(table.op1_element_count(), 16);
        assert_eq!(table.op2_element_count(), 16);
        assert_eq!(table.in_array1_bytes().len(), 32);

        let lane3 = u16::from_ne_bytes([table.in_array1_bytes()[6], table.in_array1_bytes()[7]]);
        assert_eq!(lane3, 3);
        // SAFETY: 系统分配器保证 32 字节对齐，读取位于缓冲区内。
        let first_right = unsafe { table.in_array2_ptr().read() };
        assert_eq!(first_right, 100);
    }

    #[test]
    fn test_alignment_reported() {
        let data = [0u32; 8];
        let table = AlignedDataTable::new(&data, &data, 32).unwrap();
        assert_eq!(table.alignment(), 32);
        assert!(table.is_aligned_to(32));
        assert!(table.is_aligned_to(16));
    }

    #[test]
    fn test_misaligned_table() {
        let data = [0xFFu8; 32];
        let table = AlignedDataTable::with_allocator(
            &data,
            &data,
            VECTOR256_ALIGNMENT,
            &MisalignedAllocator::default(),
        )
        .unwrap();

        assert!(!table.is_aligned_to(VECTOR256_ALIGNMENT));
        assert_eq!(table.in_array2_bytes(), &data[..]);
    }

    #[test]
    fn test_rejects_alignment_below_element_alignment() {
        let data = [0u64; 4];
        let err = AlignedDataTable::new(&data, &data, 2).unwrap_err();
        assert_eq!(err, MemError::InvalidAlignment { size: 32, align: 2 });
    }

    #[test]
    fn test_rejects_empty_input() {
        let empty: [u16; 0] = [];
        let err = AlignedDataTable::new(&empty, &[1u16], 32).unwrap_err();
        assert_eq!(err, MemError::InvalidSize(0));
    }
}
