//! AlignedDataTable integration tests

use proptest::prelude::*;
use vm_mem::{
    AlignedDataTable, BufferAllocator, MemError, MisalignedAllocator, SystemAlignedAllocator,
    VECTOR256_ALIGNMENT,
};

fn lanes_from(bytes: &[u8]) -> Vec<u16> {
    bytes
        .chunks_exact(2)
        .map(|chunk| u16::from_ne_bytes([chunk[0], chunk[1]]))
        .collect()
}

#[test]
fn test_tables_own_independent_buffers() {
    let left = [1u16; 16];
    let right = [2u16; 16];
    let first = AlignedDataTable::new(&left, &right, VECTOR256_ALIGNMENT).unwrap();
    let second = AlignedDataTable::new(&right, &left, VECTOR256_ALIGNMENT).unwrap();

    assert_ne!(first.in_array1_ptr(), second.in_array1_ptr());
    assert_eq!(lanes_from(first.in_array1_bytes()), left);
    assert_eq!(lanes_from(second.in_array1_bytes()), right);
}

#[test]
fn test_dropping_table_releases_buffers() {
    // 反复构造/释放，配合 Miri 或 ASan 检查释放路径
    for seed in 0..64u16 {
        let data = [seed; 16];
        let table = AlignedDataTable::new(&data, &data, VECTOR256_ALIGNMENT).unwrap();
        assert_eq!(table.in_array2_bytes().len(), 32);
    }
}

#[test]
fn test_alignment_must_be_power_of_two() {
    let data = [0u16; 16];
    let err = AlignedDataTable::new(&data, &data, 48).unwrap_err();
    assert!(matches!(err, MemError::InvalidAlignment { align: 48, .. }));
}

#[test]
fn test_allocator_names() {
    assert_eq!(SystemAlignedAllocator.name(), "system-aligned");
    assert_eq!(MisalignedAllocator::default().name(), "misaligned");
}

proptest! {
    #[test]
    fn prop_table_preserves_contents(
        left in prop::collection::vec(any::<u16>(), 1..64),
        right in prop::collection::vec(any::<u16>(), 1..64),
        misaligned in any::<bool>(),
    ) {
        let table = if misaligned {
            AlignedDataTable::with_allocator(&left, &right, VECTOR256_ALIGNMENT, &MisalignedAllocator::default())
        } else {
            AlignedDataTable::new(&left, &right, VECTOR256_ALIGNMENT)
        }
        .unwrap();

        prop_assert_eq!(lanes_from(table.in_array1_bytes()), left.clone());
        prop_assert_eq!(lanes_from(table.in_array2_bytes()), right.clone());
        prop_assert_eq!(table.op1_element_count(), left.len());
        prop_assert_eq!(table.is_aligned_to(VECTOR256_ALIGNMENT), !misaligned);
    }
}
