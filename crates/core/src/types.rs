//! 도메인 타입 — 시나리오 정의와 실행 결과
//!
//! 시나리오 정의 문서(`scenario_definition.yaml`)의 구조와
//! 실행 후 저장되는 결과 레코드를 정의합니다.
//! 정의 타입은 로드 이후 변경되지 않습니다.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 시나리오가 요구하는 클러스터 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClusterType {
    /// 단일 노드 kind 클러스터
    #[serde(rename = "kind")]
    Kind,
    /// 2노드 k3d 클러스터
    #[serde(rename = "k3d-duo")]
    K3dDuo,
}

impl ClusterType {
    /// 정의 문서와 CLI에서 사용하는 이름을 반환합니다.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Kind => "kind",
            Self::K3dDuo => "k3d-duo",
        }
    }
}

impl fmt::Display for ClusterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClusterType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "kind" => Ok(Self::Kind),
            "k3d-duo" => Ok(Self::K3dDuo),
            other => Err(format!(
                "unknown cluster type: {other} (expected: kind, k3d-duo)"
            )),
        }
    }
}

/// 시나리오 메타데이터
///
/// `id`만 필수이며 나머지는 정적 검증기의 관심사이므로 기본값을 허용합니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioMetadata {
    /// 시나리오 식별자 (`TF-<CATEGORY>-<NUMBER>_<Name>`)
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// 관련 EIDC 요구사항 참조
    #[serde(default)]
    pub eidc_references: Vec<String>,
}

/// 실행 요구사항
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Requirements {
    /// 필요한 클러스터 종류
    pub cluster_type: ClusterType,
    /// 필요한 컴포넌트 목록 (비어 있으면 안 됨)
    pub components: Vec<String>,
}

/// 시나리오 단계
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// 단계 이름
    pub name: String,
    /// 순서대로 실행할 명령 (`{namespace}` 자리표시자 포함 가능)
    pub commands: Vec<String>,
    /// 실패 시 이후 단계를 중단할지 여부
    #[serde(default = "default_critical")]
    pub critical: bool,
}

fn default_critical() -> bool {
    true
}

/// 성공 기준 — 관측값이 임계값 이상이면 통과
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuccessCriterion {
    /// 기준 이름
    pub name: String,
    /// 관측할 메트릭 식별자
    pub metric: String,
    /// 통과 임계값
    pub threshold: f64,
}

/// 시나리오 정의
///
/// 디스크의 `scenario_definition.yaml` 한 개에 대응합니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioDefinition {
    pub metadata: ScenarioMetadata,
    pub requirements: Requirements,
    pub steps: Vec<Step>,
    pub success_criteria: Vec<SuccessCriterion>,
    /// 정의 파일이 위치한 디렉토리 (리소스 디렉토리 기준점)
    #[serde(skip)]
    pub base_dir: PathBuf,
}

impl ScenarioDefinition {
    /// 시나리오 식별자
    pub fn id(&self) -> &str {
        &self.metadata.id
    }

    /// 필요한 클러스터 종류
    pub fn cluster_type(&self) -> ClusterType {
        self.requirements.cluster_type
    }

    /// 시나리오 디렉토리
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// 네임스페이스에 적용할 매니페스트 디렉토리 (`<base_dir>/k8s`)
    pub fn resource_dir(&self) -> PathBuf {
        self.base_dir.join("k8s")
    }
}

/// 단계 실행 결과
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    /// 단계 이름
    pub name: String,
    /// 성공 여부
    pub success: bool,
    /// 단계의 critical 플래그 (실패 시 전체 결과 반영 여부)
    pub critical: bool,
    /// 실행된 명령마다 하나씩의 출력 (실패 시 에러 표시 포함)
    pub output: Vec<String>,
}

/// 성공 기준 평가 결과
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionResult {
    pub name: String,
    pub threshold: f64,
    /// 관측값 (메트릭이 관측되지 않았으면 `None`)
    pub actual: Option<f64>,
    pub success: bool,
}

/// 시나리오 실행 레코드
///
/// 결과 저장소에 JSON으로 기록됩니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// 실행 ID
    pub run_id: Uuid,
    pub scenario_id: String,
    pub namespace: String,
    pub cluster: ClusterType,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub steps: Vec<StepResult>,
    pub criteria: Vec<CriterionResult>,
    /// critical 단계 실패로 남은 단계가 중단되었는지 여부
    #[serde(default)]
    pub aborted: bool,
    /// 준비 단계 실패 사유
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub success: bool,
}

impl ExecutionResult {
    /// 단계·기준 결과로부터 전체 성공 여부를 계산합니다.
    ///
    /// 단계가 하나라도 실패했거나(critical 여부와 무관), 기준이 하나라도
    /// 실패했거나, 준비 단계 에러가 있으면 실패입니다. `critical`은 남은
    /// 단계를 중단할지만 결정합니다.
    pub fn compute_success(&self) -> bool {
        self.error.is_none()
            && self.steps.iter().all(|s| s.success)
            && self.criteria.iter().all(|c| c.success)
    }

    /// 실패한 단계 수
    pub fn failed_steps(&self) -> usize {
        self.steps.iter().filter(|s| !s.success).count()
    }

    /// 실패한 기준 수
    pub fn failed_criteria(&self) -> usize {
        self.criteria.iter().filter(|c| !c.success).count()
    }
}
