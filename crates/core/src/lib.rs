//! tfk8s 공통 크레이트
//!
//! 시나리오 엔진과 CLI가 함께 사용하는 데이터 모델, 에러 타입, 설정,
//! 메트릭 이름을 정의합니다.
//!
//! - [`types`]: 시나리오 정의 및 실행 결과 데이터 모델
//! - [`error`]: 도메인 에러 (`Tfk8sError`, `ConfigError`, `DefinitionError`)
//! - [`config`]: `tfk8s.toml` 파싱 및 환경변수 오버라이드
//! - [`metrics`]: 메트릭 이름 상수

pub mod config;
pub mod error;
pub mod metrics;
pub mod types;

// 에러
pub use error::{ConfigError, DefinitionError, Tfk8sError};

// 설정
pub use config::Tfk8sConfig;

// 도메인 타입
pub use types::{
    ClusterType, CriterionResult, ExecutionResult, Requirements, ScenarioDefinition,
    ScenarioMetadata, Step, StepResult, SuccessCriterion,
};
