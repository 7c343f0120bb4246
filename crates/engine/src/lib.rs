//! tfk8s 시나리오 실행 엔진
//!
//! 선언적 컴플라이언스 시나리오를 쿠버네티스 클러스터에서 실행합니다.
//!
//! # 흐름
//!
//! ```text
//! ScenarioCatalog -> ScenarioLoader -> NamespaceManager::setup
//!     -> StepExecutor -> MetricsSource -> CriteriaEvaluator
//!     -> ResultStore -> NamespaceManager::cleanup
//! ```
//!
//! 모든 외부 명령은 [`command::CommandRunner`]를 통해 인자 벡터로 실행되며,
//! 시나리오와 단계는 항상 하나씩 순서대로 처리됩니다.
//!
//! # 모듈
//! - [`catalog`]: 그룹/ID → 정의 파일 위치
//! - [`loader`]: YAML 정의 파싱과 구조 검증
//! - [`template`]: 명령 문자열 → 인자 벡터, 자리표시자 치환
//! - [`namespace`]: 네임스페이스 생성, 매니페스트 적용, 삭제
//! - [`executor`]: 단계 실행과 critical 중단
//! - [`observed`]: 단계 출력에서 관측값 추출
//! - [`criteria`]: 임계값 비교
//! - [`store`]: 결과 JSON 저장
//! - [`runner`]: 전체 실행 드라이버

pub mod catalog;
pub mod command;
pub mod config;
pub mod criteria;
pub mod error;
pub mod executor;
pub mod loader;
pub mod namespace;
pub mod observed;
pub mod runner;
pub mod store;
pub mod template;

pub use catalog::{CatalogWarning, GroupRegistry, MemberStatus, Resolution, ScenarioCatalog};
pub use command::{CommandOutput, CommandRunner, Invocation, ProcessRunner};
pub use config::{EngineConfig, EngineConfigBuilder};
pub use criteria::{CriteriaEvaluator, CriteriaOutcome};
pub use error::EngineError;
pub use executor::{ExecutionOutcome, ScenarioState, StepExecutor, StepState};
pub use loader::ScenarioLoader;
pub use namespace::{Namespace, NamespaceManager, namespace_name};
pub use observed::{MetricsSource, ObservedMetrics, OutputMetricsExtractor};
pub use runner::{RunRequest, RunSummary, ScenarioOutcome, ScenarioRunner, ScenarioStatus};
pub use store::ResultStore;
pub use template::{CommandTemplate, TemplateContext};
