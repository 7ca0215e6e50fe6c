//! 进程级预置操作数
//!
//! 每次运行只生成一次，之后以 `Arc` 只读共享给所有测试实例。

use rand::Rng;
use vm_simd::Vector256;

use crate::data::{RandomLane, random_vector};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassFixture<T: RandomLane> {
    cls_var1: Vector256<T>,
    cls_var2: Vector256<T>,
}

impl<T: RandomLane> ClassFixture<T> {
    pub fn new(cls_var1: Vector256<T>, cls_var2: Vector256<T>) -> Self {
        Self { cls_var1, cls_var2 }
    }

    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let cls_var1 = random_vector(rng);
        let cls_var2 = random_vector(rng);
        Self::new(cls_var1, cls_var2)
    }

    pub fn operands(&self) -> (Vector256<T>, Vector256<T>) {
        (self.cls_var1, self.cls_var2)
    }
}
