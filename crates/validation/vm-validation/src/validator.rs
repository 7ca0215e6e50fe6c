//! 结果校验
//!
//! 用标量参考计算重新推导 `test_z` 的结果：每个 lane 的 `left & right` 都为 0 时为 true。
//! 不一致只记录到 [`TestOutcome`]，并输出诊断日志，不返回错误。

use log::error;
use vm_simd::{Avx, Lane, VECTOR256_BYTES, Vector256};

use crate::outcome::{MismatchReport, TestOutcome};
use crate::scenario::Scenario;

/// 标量参考计算
pub fn reference_test_z<T: Lane>(left: &[T], right: &[T]) -> bool {
    left.iter().zip(right).all(|(l, r)| l.and_is_zero(*r))
}

/// `Avx::test_z<u16>(Vector256<u16>, Vector256<u16>)`
pub fn method_descriptor<T: Lane>() -> String {
    format!(
        "{}::{}<{kind}>(Vector256<{kind}>, Vector256<{kind}>)",
        Avx::NAME,
        Avx::TEST_Z,
        kind = T::KIND
    )
}

fn format_lanes<T: Lane>(lanes: &[T]) -> String {
    let items: Vec<String> = lanes.iter().map(ToString::to_string).collect();
    format!("({})", items.join(", "))
}

/// 校验已展开的 lane 序列
///
/// 两侧都必须恰好有一个向量宽度的 lane，否则比较没有意义，直接记为失败。
pub fn validate_lanes<T: Lane>(
    outcome: &mut TestOutcome,
    scenario: Scenario,
    left: &[T],
    right: &[T],
    result: bool,
) {
    let expected_len = Vector256::<T>::ELEMENT_COUNT;
    let method = method_descriptor::<T>();

    if left.len() != expected_len || right.len() != expected_len {
        error!(
            "{}: {} failed: expected {} lanes per operand, got {} and {}",
            method,
            scenario,
            expected_len,
            left.len(),
            right.len()
        );
        outcome.record_mismatch(report(scenario, method, left, right, result));
        return;
    }

    if reference_test_z(left, right) != result {
        error!(
            "{}: {} failed:\n    left: {}\n   right: {}\n  result: ({})",
            method,
            scenario,
            format_lanes(left),
            format_lanes(right),
            result
        );
        outcome.record_mismatch(report(scenario, method, left, right, result));
    }
}

fn report<T: Lane>(
    scenario: Scenario,
    method: String,
    left: &[T],
    right: &[T],
    result: bool,
) -> MismatchReport {
    MismatchReport {
        scenario,
        method,
        left: format_lanes(left),
        right: format_lanes(right),
        result,
    }
}

pub fn validate_vectors<T: Lane>(
    outcome: &mut TestOutcome,
    scenario: Scenario,
    left: &Vector256<T>,
    right: &Vector256<T>,
    result: bool,
) {
    validate_lanes(outcome, scenario, &left.lanes(), &right.lanes(), result);
}

/// 校验原始字节区间
///
/// 按 `T` 的宽度重新解释字节，对区间起始地址没有对齐要求。区间长度必须是一个向量宽度。
pub fn validate_bytes<T: Lane>(
    outcome: &mut TestOutcome,
    scenario: Scenario,
    left: &[u8],
    right: &[u8],
    result: bool,
) {
    if left.len() != VECTOR256_BYTES || right.len() != VECTOR256_BYTES {
        error!(
            "{}: {} failed: expected {}-byte operands, got {} and {}",
            method_descriptor::<T>(),
            scenario,
            VECTOR256_BYTES,
            left.len(),
            right.len()
        );
        outcome.fail();
        return;
    }

    let left: Vec<T> = left.chunks_exact(T::SIZE).map(T::from_ne_slice).collect();
    let right: Vec<T> = right.chunks_exact(T::SIZE).map(T::from_ne_slice).collect();
    validate_lanes(outcome, scenario, &left, &right, result);
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENARIO: Scenario = Scenario::BasicUnsafeRead;

    #[test]
    fn test_descriptor() {
        assert_eq!(
            method_descriptor::<u16>(),
            "Avx::test_z<u16>(Vector256<u16>, Vector256<u16>)"
        );
    }

    #[test]
    fn test_concrete_scenarios() {
        let mut outcome = TestOutcome::new();

        // 全 1 与全 0 -> true
        validate_vectors(
            &mut outcome,
            SCENARIO,
            &Vector256::<u16>::splat(0xFFFF),
            &Vector256::zero(),
            true,
        );

        // lane0 都为 1 -> false
        let mut lanes = [0u16; 16];
        lanes[0] = 1;
        validate_lanes(&mut outcome, SCENARIO, &lanes, &lanes, false);

        // 左侧全 0 -> true
        let right: Vec<u16> = (0..16).map(|i| 0x1111 * i).collect();
        validate_lanes(&mut outcome, SCENARIO, &[0u16; 16], &right, true);

        assert!(outcome.succeeded());
        assert!(outcome.mismatches().is_empty());
    }

    #[test]
    fn test_wrong_result_is_recorded() {
        let mut outcome = TestOutcome::new();
        let mut lanes = [0u16; 16];
        lanes[0] = 1;

        validate_lanes(&mut outcome, Scenario::LocalLoad, &lanes, &lanes, true);

        assert!(!outcome.succeeded());
        let mismatch = &outcome.mismatches()[0];
        assert_eq!(mismatch.scenario, Scenario::LocalLoad);
        assert!(mismatch.result);
        assert!(mismatch.left.starts_with("(1, 0, 0"));

        // 后续正确的结果不会恢复成功标志
        validate_lanes(&mut outcome, SCENARIO, &[0u16; 16], &[0u16; 16], true);
        assert!(!outcome.succeeded());
        assert_eq!(outcome.mismatches().len(), 1);
    }

    #[test]
    fn test_lane_count_mismatch_fails() {
        let mut outcome = TestOutcome::new();
        validate_lanes(&mut outcome, SCENARIO, &[0u16; 8], &[0u16; 16], true);
        assert!(!outcome.succeeded());
    }

    #[test]
    fn test_bytes_from_odd_offset() {
        // 从奇数偏移开始的字节区间
        let mut raw = [0u8; 66];
        let left_lanes: Vec<u16> = (1..=16).collect();
        for (i, lane) in left_lanes.iter().enumerate() {
            raw[1 + i * 2..3 + i * 2].copy_from_slice(&lane.to_ne_bytes());
        }
        let left = &raw[1..33];
        let right = [0u8; 32];

        let mut outcome = TestOutcome::new();
        validate_bytes::<u16>(&mut outcome, SCENARIO, left, &right, true);
        assert!(outcome.succeeded());

        validate_bytes::<u16>(&mut outcome, SCENARIO, left, left, false);
        assert!(outcome.succeeded());

        validate_bytes::<u16>(&mut outcome, SCENARIO, left, left, true);
        assert!(!outcome.succeeded());
        assert_eq!(outcome.mismatches()[0].left, format_lanes(&left_lanes));
    }

    #[test]
    fn test_short_span_fails() {
        let mut outcome = TestOutcome::new();
        validate_bytes::<u32>(&mut outcome, SCENARIO, &[0u8; 16], &[0u8; 32], true);
        assert!(!outcome.succeeded());
    }
}
