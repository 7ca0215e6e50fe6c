//! 向量元素（lane）类型
//!
//! 256-bit 向量由 `32 / size_of::<T>()` 个等宽整数 lane 组成。

use std::fmt;
use std::hash::Hash;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// lane 类型标识，用于动态调用签名和配置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LaneKind {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    U64,
    I64,
}

impl LaneKind {
    pub const ALL: [LaneKind; 8] = [
        LaneKind::U8,
        LaneKind::I8,
        LaneKind::U16,
        LaneKind::I16,
        LaneKind::U32,
        LaneKind::I32,
        LaneKind::U64,
        LaneKind::I64,
    ];

    /// lane 宽度（字节）
    pub const fn size(self) -> usize {
        match self {
            LaneKind::U8 | LaneKind::I8 => 1,
            LaneKind::U16 | LaneKind::I16 => 2,
            LaneKind::U32 | LaneKind::I32 => 4,
            LaneKind::U64 | LaneKind::I64 => 8,
        }
    }

    /// 256-bit 向量中的 lane 数
    pub const fn element_count(self) -> usize {
        crate::vector::VECTOR256_BYTES / self.size()
    }

    pub const fn name(self) -> &'static str {
        match self {
            LaneKind::U8 => "u8",
            LaneKind::I8 => "i8",
            LaneKind::U16 => "u16",
            LaneKind::I16 => "i16",
            LaneKind::U32 => "u32",
            LaneKind::I32 => "i32",
            LaneKind::U64 => "u64",
            LaneKind::I64 => "i64",
        }
    }
}

impl fmt::Display for LaneKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LaneKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LaneKind::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown lane type '{}'", s))
    }
}

/// 向量 lane 的标量表示
pub trait Lane: Copy + Eq + Hash + fmt::Debug + fmt::Display + Send + Sync + 'static {
    /// 宽度（字节）
    const SIZE: usize;
    const KIND: LaneKind;

    /// 以本机字节序解释 `bytes`（长度必须等于 `SIZE`）
    fn from_ne_slice(bytes: &[u8]) -> Self;

    /// 以本机字节序写入 `out`（长度必须等于 `SIZE`）
    fn write_ne(self, out: &mut [u8]);

    /// `(self & other) == 0`
    fn and_is_zero(self, other: Self) -> bool;
}

macro_rules! impl_lane {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl Lane for $ty {
                const SIZE: usize = std::mem::size_of::<$ty>();
                const KIND: LaneKind = LaneKind::$kind;

                #[inline]
                fn from_ne_slice(bytes: &[u8]) -> Self {
                    let mut raw = [0u8; std::mem::size_of::<$ty>()];
                    raw.copy_from_slice(bytes);
                    <$ty>::from_ne_bytes(raw)
                }

                #[inline]
                fn write_ne(self, out: &mut [u8]) {
                    out.copy_from_slice(&self.to_ne_bytes());
                }

                #[inline]
                fn and_is_zero(self, other: Self) -> bool {
                    (self & other) == 0
                }
            }
        )*
    };
}

impl_lane! {
    u8 => U8,
    i8 => I8,
    u16 => U16,
    i16 => I16,
    u32 => U32,
    i32 => I32,
    u64 => U64,
    i64 => I64,
}
