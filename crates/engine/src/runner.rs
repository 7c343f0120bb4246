//! 시나리오 실행 드라이버
//!
//! 카탈로그 해석 → 로드 → 클러스터 확인 → 네임스페이스 준비 → 단계 실행 →
//! 관측값 수집 → 기준 평가 → 결과 저장 → 네임스페이스 정리.
//!
//! 시나리오는 하나씩 순서대로 실행되며, 한 시나리오의 실패는 다음 시나리오의
//! 실행을 막지 않습니다. 한 번의 실행 안에서 `metadata.id`는 유일해야 하며,
//! 이미 실행한 ID를 가진 정의는 클러스터에 닿기 전에 `Invalid`로 기록됩니다. 네임스페이스가 생성된 뒤에는 어떤 경로로 끝나든
//! 정리를 시도합니다. 단, `keep_on_failure`가 켜져 있고 시나리오가 실패한
//! 경우에는 사후 분석을 위해 보존합니다.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tfk8s_core::error::DefinitionError;
use tfk8s_core::metrics as m;
use tfk8s_core::types::{ClusterType, ExecutionResult, ScenarioDefinition};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::catalog::{CatalogWarning, GroupRegistry, ScenarioCatalog};
use crate::command::CommandRunner;
use crate::config::EngineConfig;
use crate::criteria::CriteriaEvaluator;
use crate::error::EngineError;
use crate::executor::StepExecutor;
use crate::loader::ScenarioLoader;
use crate::namespace::NamespaceManager;
use crate::observed::{MetricsSource, OutputMetricsExtractor};
use crate::store::ResultStore;

/// 실행 요청
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    /// 그룹 이름 (알 수 없으면 접두어로 처리)
    pub group: String,
    /// 대상 클러스터 종류
    pub cluster: ClusterType,
    /// 단일 시나리오로 한정
    pub scenario_id: Option<String>,
}

impl RunRequest {
    pub fn new(group: impl Into<String>, cluster: ClusterType) -> Self {
        Self {
            group: group.into(),
            cluster,
            scenario_id: None,
        }
    }

    pub fn scenario(mut self, id: impl Into<String>) -> Self {
        self.scenario_id = Some(id.into());
        self
    }
}

/// 시나리오 하나의 최종 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioStatus {
    /// 실행되어 성공
    Passed,
    /// 실행되었으나 실패 (준비 실패, 단계 또는 기준 실패, 저장 실패)
    Failed,
    /// 클러스터 종류가 달라 건너뜀
    Skipped,
    /// 정의 파일 오류로 실행하지 않음
    Invalid,
}

impl ScenarioStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
            Self::Invalid => "invalid",
        }
    }

    /// 프로세스 결과를 실패로 만드는 상태인지 여부
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed | Self::Invalid)
    }
}

impl fmt::Display for ScenarioStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 시나리오 하나의 실행 요약
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioOutcome {
    /// 정의 파일 경로
    pub location: PathBuf,
    /// 시나리오 ID (정의를 읽지 못했으면 `None`)
    pub scenario_id: Option<String>,
    pub status: ScenarioStatus,
    /// 실행 레코드 (실행하지 않았으면 `None`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ExecutionResult>,
    /// 저장된 결과 파일
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_path: Option<PathBuf>,
    /// 실행하지 못한 사유 또는 저장 실패 사유
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// 정리 실패 사유 (결과에는 영향 없음)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cleanup_error: Option<String>,
    /// 네임스페이스를 보존했는지 여부
    pub namespace_kept: bool,
}

impl ScenarioOutcome {
    fn not_run(
        location: &Path,
        scenario_id: Option<String>,
        status: ScenarioStatus,
        reason: String,
    ) -> Self {
        Self {
            location: location.to_path_buf(),
            scenario_id,
            status,
            result: None,
            result_path: None,
            error: Some(reason),
            cleanup_error: None,
            namespace_kept: false,
        }
    }
}

/// 실행 전체 요약
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub group: String,
    pub cluster: ClusterType,
    /// 카탈로그 해석 경고
    #[serde(serialize_with = "serialize_warnings")]
    pub warnings: Vec<CatalogWarning>,
    pub scenarios: Vec<ScenarioOutcome>,
}

fn serialize_warnings<S: serde::Serializer>(
    warnings: &[CatalogWarning],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(warnings.iter().map(ToString::to_string))
}

impl RunSummary {
    fn count(&self, status: ScenarioStatus) -> usize {
        self.scenarios.iter().filter(|s| s.status == status).count()
    }

    pub fn passed(&self) -> usize {
        self.count(ScenarioStatus::Passed)
    }

    pub fn failed(&self) -> usize {
        self.count(ScenarioStatus::Failed) + self.count(ScenarioStatus::Invalid)
    }

    pub fn skipped(&self) -> usize {
        self.count(ScenarioStatus::Skipped)
    }

    /// 건너뛰지 않은 시나리오 수
    pub fn executed(&self) -> usize {
        self.scenarios.len() - self.skipped()
    }

    /// 하나 이상 실행되었고 실패가 없으면 성공입니다.
    pub fn success(&self) -> bool {
        self.executed() > 0 && self.failed() == 0
    }
}

/// 시나리오 실행기
pub struct ScenarioRunner<R: CommandRunner, M: MetricsSource = OutputMetricsExtractor> {
    catalog: ScenarioCatalog,
    namespaces: NamespaceManager<R>,
    executor: StepExecutor<R>,
    metrics_source: M,
    store: ResultStore,
    keep_on_failure: bool,
}

impl<R: CommandRunner> ScenarioRunner<R, OutputMetricsExtractor> {
    /// 단계 출력에서 관측값을 추출하는 실행기를 만듭니다.
    pub fn new(config: &EngineConfig, registry: GroupRegistry, runner: Arc<R>) -> Self {
        Self {
            catalog: ScenarioCatalog::new(config.scenarios_root.clone(), registry),
            namespaces: NamespaceManager::new(Arc::clone(&runner), config),
            executor: StepExecutor::new(runner),
            metrics_source: OutputMetricsExtractor::new(),
            store: ResultStore::new(config.reports_dir.clone()),
            keep_on_failure: config.keep_on_failure,
        }
    }
}

impl<R: CommandRunner, M: MetricsSource> ScenarioRunner<R, M> {
    /// 관측값 공급원을 교체합니다.
    pub fn with_metrics_source<N: MetricsSource>(self, source: N) -> ScenarioRunner<R, N> {
        ScenarioRunner {
            catalog: self.catalog,
            namespaces: self.namespaces,
            executor: self.executor,
            metrics_source: source,
            store: self.store,
            keep_on_failure: self.keep_on_failure,
        }
    }

    pub fn catalog(&self) -> &ScenarioCatalog {
        &self.catalog
    }

    /// 요청된 그룹 또는 시나리오를 실행합니다.
    ///
    /// 개별 시나리오의 실패는 요약에 기록되며 에러로 전파되지 않습니다.
    ///
    /// # Errors
    /// 카탈로그 디렉토리를 읽을 수 없는 경우.
    pub async fn run(&self, request: &RunRequest) -> Result<RunSummary, EngineError> {
        let resolution = self
            .catalog
            .resolve(&request.group, request.scenario_id.as_deref())?;

        if resolution.is_empty() {
            warn!(group = %request.group, "no enabled scenarios found");
        } else {
            info!(
                group = %request.group,
                cluster = %request.cluster,
                scenarios = resolution.locations.len(),
                "starting scenario run"
            );
        }

        let mut scenarios = Vec::with_capacity(resolution.locations.len());
        let mut seen = HashSet::new();
        for location in &resolution.locations {
            let outcome = self.run_location(location, request.cluster, &mut seen).await;
            metrics::counter!(
                m::SCENARIO_OUTCOMES_TOTAL,
                m::LABEL_RESULT => outcome.status.as_str()
            )
            .increment(1);
            scenarios.push(outcome);
        }

        let summary = RunSummary {
            group: request.group.clone(),
            cluster: request.cluster,
            warnings: resolution.warnings,
            scenarios,
        };
        info!(
            passed = summary.passed(),
            failed = summary.failed(),
            skipped = summary.skipped(),
            success = summary.success(),
            "scenario run finished"
        );
        Ok(summary)
    }

    /// 정의 파일 하나를 실행합니다. 모든 실패는 결과 값으로 돌려줍니다.
    pub async fn run_scenario(&self, location: &Path, cluster: ClusterType) -> ScenarioOutcome {
        self.run_location(location, cluster, &mut HashSet::new()).await
    }

    /// `seen`에 이미 있는 ID의 정의는 실행하지 않고 `Invalid`로 기록합니다.
    async fn run_location(
        &self,
        location: &Path,
        cluster: ClusterType,
        seen: &mut HashSet<String>,
    ) -> ScenarioOutcome {
        let definition = match ScenarioLoader::load(location).await {
            Ok(definition) => definition,
            Err(e) => {
                error!(
                    path = %location.display(),
                    error = %e,
                    "invalid scenario definition, skipping"
                );
                return ScenarioOutcome::not_run(
                    location,
                    None,
                    ScenarioStatus::Invalid,
                    e.to_string(),
                );
            }
        };

        let id = definition.id().to_owned();
        if !seen.insert(id.clone()) {
            let err = DefinitionError::Invalid {
                path: location.display().to_string(),
                reason: format!("duplicate scenario id {id} in this run"),
            };
            error!(
                scenario_id = %id,
                path = %location.display(),
                "duplicate scenario id, skipping"
            );
            return ScenarioOutcome::not_run(
                location,
                Some(id),
                ScenarioStatus::Invalid,
                err.to_string(),
            );
        }

        if definition.cluster_type() != cluster {
            warn!(
                scenario_id = %id,
                required = %definition.cluster_type(),
                cluster = %cluster,
                "scenario requires a different cluster type, skipping"
            );
            return ScenarioOutcome::not_run(
                location,
                Some(id),
                ScenarioStatus::Skipped,
                format!(
                    "requires cluster type {}, run targets {cluster}",
                    definition.cluster_type()
                ),
            );
        }

        metrics::counter!(m::SCENARIOS_STARTED_TOTAL, m::LABEL_CLUSTER => cluster.as_str())
            .increment(1);
        info!(scenario_id = %id, path = %location.display(), "running scenario");

        let (result, namespace_created) = self.execute(&definition, cluster).await;
        let mut outcome = ScenarioOutcome {
            location: location.to_path_buf(),
            scenario_id: Some(id),
            status: if result.success {
                ScenarioStatus::Passed
            } else {
                ScenarioStatus::Failed
            },
            result: None,
            result_path: None,
            error: result.error.clone(),
            cleanup_error: None,
            namespace_kept: false,
        };

        match self.store.save(&result).await {
            Ok(path) => outcome.result_path = Some(path),
            Err(e) => {
                error!(scenario_id = %result.scenario_id, error = %e, "failed to save result");
                outcome.status = ScenarioStatus::Failed;
                outcome.error = Some(e.to_string());
            }
        }

        if namespace_created {
            self.finish_namespace(&result, &mut outcome).await;
        }

        info!(
            scenario_id = %result.scenario_id,
            status = %outcome.status,
            "scenario finished"
        );
        outcome.result = Some(result);
        outcome
    }

    /// 준비, 단계 실행, 평가를 수행해 실행 레코드를 만듭니다.
    ///
    /// 두 번째 값은 네임스페이스가 생성되었는지 여부입니다.
    async fn execute(
        &self,
        definition: &ScenarioDefinition,
        cluster: ClusterType,
    ) -> (ExecutionResult, bool) {
        let start_time = Utc::now();
        let namespace = self.namespaces.name_for(definition);
        let mut result = ExecutionResult {
            run_id: Uuid::new_v4(),
            scenario_id: definition.id().to_owned(),
            namespace: namespace.clone(),
            cluster,
            start_time,
            end_time: start_time,
            steps: Vec::new(),
            criteria: Vec::new(),
            aborted: false,
            error: None,
            success: false,
        };

        let created = match self.namespaces.setup(definition).await {
            Ok(ns) => {
                let outcome = self.executor.execute(definition, ns.name()).await;
                let observed = self.metrics_source.collect(&outcome.steps);
                let criteria =
                    CriteriaEvaluator::evaluate(&definition.success_criteria, &observed);

                let failed_criteria = criteria.results.iter().filter(|c| !c.success).count();
                if failed_criteria > 0 {
                    metrics::counter!(m::CRITERIA_FAILED_TOTAL).increment(failed_criteria as u64);
                }

                result.steps = outcome.steps;
                result.aborted = outcome.aborted;
                result.criteria = criteria.results;
                true
            }
            Err(e) => {
                error!(
                    scenario_id = %definition.id(),
                    namespace = %namespace,
                    error = %e,
                    "scenario setup failed"
                );
                let created = matches!(e, EngineError::Setup { created: true, .. });
                result.error = Some(e.to_string());
                created
            }
        };

        result.end_time = Utc::now();
        result.success = result.compute_success();
        (result, created)
    }

    /// 네임스페이스를 정리하거나 보존합니다.
    async fn finish_namespace(&self, result: &ExecutionResult, outcome: &mut ScenarioOutcome) {
        if self.keep_on_failure && outcome.status.is_failure() {
            warn!(
                scenario_id = %result.scenario_id,
                namespace = %result.namespace,
                "keeping namespace of failed scenario for inspection"
            );
            metrics::counter!(m::NAMESPACES_KEPT_TOTAL).increment(1);
            outcome.namespace_kept = true;
            return;
        }

        if let Err(e) = self.namespaces.cleanup(&result.namespace).await {
            error!(
                scenario_id = %result.scenario_id,
                namespace = %result.namespace,
                error = %e,
                "namespace cleanup failed"
            );
            metrics::counter!(m::NAMESPACE_CLEANUP_FAILURES_TOTAL).increment(1);
            outcome.cleanup_error = Some(e.to_string());
        }
    }
}
