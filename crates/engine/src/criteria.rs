//! 성공 기준 평가
//!
//! 관측값이 임계값 이상이면 통과합니다 (경계값 포함). 관측되지 않은 메트릭은
//! 실패로 기록됩니다. 평가기는 측정을 하지 않는 순수 비교 함수이며,
//! 한 기준의 실패가 나머지 기준의 평가를 막지 않습니다.

use tfk8s_core::types::{CriterionResult, SuccessCriterion};
use tracing::debug;

use crate::observed::ObservedMetrics;

/// 평가 결과
#[derive(Debug, Clone, PartialEq)]
pub struct CriteriaOutcome {
    /// 기준 순서대로의 결과
    pub results: Vec<CriterionResult>,
    /// 모든 기준 통과 여부
    pub success: bool,
}

/// 성공 기준 평가기
pub struct CriteriaEvaluator;

impl CriteriaEvaluator {
    /// 단일 기준을 평가합니다.
    pub fn evaluate_one(criterion: &SuccessCriterion, actual: Option<f64>) -> CriterionResult {
        let success = actual.is_some_and(|value| value >= criterion.threshold);
        CriterionResult {
            name: criterion.name.clone(),
            threshold: criterion.threshold,
            actual,
            success,
        }
    }

    /// 모든 기준을 평가합니다.
    pub fn evaluate(criteria: &[SuccessCriterion], observed: &ObservedMetrics) -> CriteriaOutcome {
        let results: Vec<CriterionResult> = criteria
            .iter()
            .map(|criterion| {
                let result = Self::evaluate_one(criterion, observed.lookup(criterion));
                debug!(
                    criterion = %result.name,
                    threshold = result.threshold,
                    actual = ?result.actual,
                    success = result.success,
                    "evaluated criterion"
                );
                result
            })
            .collect();
        let success = results.iter().all(|r| r.success);
        CriteriaOutcome { results, success }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn criterion(name: &str, threshold: f64) -> SuccessCriterion {
        SuccessCriterion {
            name: name.to_owned(),
            metric: name.to_owned(),
            threshold,
        }
    }

    fn observed(pairs: &[(&str, f64)]) -> ObservedMetrics {
        pairs.iter().copied().collect()
    }

    #[test]
    fn exact_threshold_passes() {
        let outcome =
            CriteriaEvaluator::evaluate(&[criterion("x", 10.0)], &observed(&[("x", 10.0)]));
        assert!(outcome.success);
        assert_eq!(outcome.results[0].actual, Some(10.0));
    }

    #[test]
    fn just_below_threshold_fails() {
        let outcome =
            CriteriaEvaluator::evaluate(&[criterion("x", 10.0)], &observed(&[("x", 9.999)]));
        assert!(!outcome.success);
        assert!(!outcome.results[0].success);
    }

    #[test]
    fn missing_metric_fails_without_value() {
        let outcome = CriteriaEvaluator::evaluate(&[criterion("x", 0.0)], &ObservedMetrics::new());
        assert!(!outcome.success);
        assert_eq!(outcome.results[0].actual, None);
    }

    #[test]
    fn all_criteria_are_evaluated_after_a_failure() {
        let criteria = [criterion("a", 5.0), criterion("b", 5.0), criterion("c", 5.0)];
        let outcome =
            CriteriaEvaluator::evaluate(&criteria, &observed(&[("a", 1.0), ("b", 9.0), ("c", 5.0)]));
        assert!(!outcome.success);
        assert_eq!(outcome.results.len(), 3);
        let flags: Vec<bool> = outcome.results.iter().map(|r| r.success).collect();
        assert_eq!(flags, [false, true, true]);
    }

    #[test]
    fn empty_criteria_is_vacuously_successful() {
        let outcome = CriteriaEvaluator::evaluate(&[], &ObservedMetrics::new());
        assert!(outcome.success);
        assert!(outcome.results.is_empty());
    }

    #[test]
    fn nan_observation_fails() {
        let result = CriteriaEvaluator::evaluate_one(&criterion("x", 0.0), Some(f64::NAN));
        assert!(!result.success);
    }
}
