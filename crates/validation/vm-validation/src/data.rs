//! 随机操作数生成
//!
//! 每个 lane 在 `[MIN, MAX)` 内均匀采样（不含上界）。

use rand::Rng;
use vm_simd::{Lane, Vector256};

/// 可随机生成的 lane 类型
pub trait RandomLane: Lane {
    fn random<R: Rng + ?Sized>(rng: &mut R) -> Self;
}

macro_rules! impl_random_lane {
    ($($ty:ty),* $(,)?) => {
        $(
            impl RandomLane for $ty {
                #[inline]
                fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
                    rng.gen_range(<$ty>::MIN..<$ty>::MAX)
                }
            }
        )*
    };
}

impl_random_lane!(u8, i8, u16, i16, u32, i32, u64, i64);

/// 一个向量宽度的随机 lane 序列
pub fn random_lanes<T: RandomLane, R: Rng + ?Sized>(rng: &mut R) -> Vec<T> {
    (0..Vector256::<T>::ELEMENT_COUNT).map(|_| T::random(rng)).collect()
}

pub fn random_vector<T: RandomLane, R: Rng + ?Sized>(rng: &mut R) -> Vector256<T> {
    let mut bytes = [0u8; vm_simd::VECTOR256_BYTES];
    for chunk in bytes.chunks_exact_mut(T::SIZE) {
        T::random(rng).write_ne(chunk);
    }
    Vector256::from_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_lane_counts() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(random_lanes::<u8, _>(&mut rng).len(), 32);
        assert_eq!(random_lanes::<u16, _>(&mut rng).len(), 16);
        assert_eq!(random_lanes::<i64, _>(&mut rng).len(), 4);
    }

    #[test]
    fn test_seed_is_reproducible() {
        let a = random_vector::<u32, _>(&mut StdRng::seed_from_u64(42));
        let b = random_vector::<u32, _>(&mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn test_upper_bound_excluded() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..4096 {
            assert_ne!(u8::random(&mut rng), u8::MAX);
            assert_ne!(i8::random(&mut rng), i8::MAX);
        }
    }
}
