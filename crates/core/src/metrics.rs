//! 메트릭 상수
//!
//! 모든 메트릭의 이름을 중앙에서 정의합니다.
//! 엔진은 이 상수를 사용하여 `metrics::counter!()`, `metrics::histogram!()`
//! 매크로를 호출합니다. 레코더가 설치되지 않으면 호출은 무시됩니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `tfk8s_`
//! - 접미어: `_total` (counter), `_seconds` (histogram)

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 결과 레이블 키 (success, failure, skipped, error)
pub const LABEL_RESULT: &str = "result";

/// 클러스터 종류 레이블 키 (kind, k3d-duo)
pub const LABEL_CLUSTER: &str = "cluster";

// ─── 시나리오 메트릭 ────────────────────────────────────────────────

/// 실행 시도한 시나리오 수 (counter, label: cluster)
pub const SCENARIOS_STARTED_TOTAL: &str = "tfk8s_scenarios_started_total";

/// 시나리오 결과 (counter, label: result)
pub const SCENARIO_OUTCOMES_TOTAL: &str = "tfk8s_scenario_outcomes_total";

/// 실패한 단계 수 (counter)
pub const STEPS_FAILED_TOTAL: &str = "tfk8s_steps_failed_total";

/// critical 단계 실패로 중단된 시나리오 수 (counter)
pub const SCENARIOS_ABORTED_TOTAL: &str = "tfk8s_scenarios_aborted_total";

/// 실패한 성공 기준 수 (counter)
pub const CRITERIA_FAILED_TOTAL: &str = "tfk8s_criteria_failed_total";

/// 단계 실행 시간 (histogram, 초)
pub const STEP_DURATION_SECONDS: &str = "tfk8s_step_duration_seconds";

// ─── 네임스페이스 메트릭 ─────────────────────────────────────────────

/// 네임스페이스 정리 실패 수 (counter)
pub const NAMESPACE_CLEANUP_FAILURES_TOTAL: &str = "tfk8s_namespace_cleanup_failures_total";

/// 사후 분석용으로 보존된 네임스페이스 수 (counter)
pub const NAMESPACES_KEPT_TOTAL: &str = "tfk8s_namespaces_kept_total";
