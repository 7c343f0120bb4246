//! 시나리오 카탈로그 — 그룹 이름과 시나리오 ID를 정의 파일 위치로 해석
//!
//! [`GroupRegistry`]는 프로세스 시작 시 한 번 만들어지는 불변 값이며
//! [`ScenarioCatalog`]에 명시적으로 전달됩니다.
//!
//! 디렉토리 구조:
//!
//! ```text
//! <scenarios_root>/
//!   enabled/<id>/scenario_definition.yaml
//!   pending/<id>/scenario_definition.yaml
//! ```
//!
//! 해석 규칙:
//! 1. ID가 주어지면 `enabled`에서 찾고, 없으면 `pending`을 확인해 경고합니다.
//! 2. 알려진 그룹이면 멤버 순서대로 `enabled`에서 찾고, 없는 멤버는 경고 후 생략합니다.
//!    같은 ID가 두 번 이상 나오면 처음 한 번만 실행합니다.
//! 3. 알 수 없는 그룹은 `enabled` 하위 디렉토리 이름에 대한 접두어 매치로 처리합니다.
//!
//! 아무것도 찾지 못해도 에러가 아니라 빈 목록을 반환합니다.
//!
//! ID는 디렉토리 이름 하나여야 합니다. 경로 구분자나 `..`을 포함한 ID는
//! 파일 시스템에 닿기 전에 거부됩니다.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::EngineError;

/// 시나리오 정의 파일 이름
pub const DEFINITION_FILE: &str = "scenario_definition.yaml";

/// 활성 시나리오 디렉토리 이름
pub const ENABLED_DIR: &str = "enabled";

/// 대기 시나리오 디렉토리 이름
pub const PENDING_DIR: &str = "pending";

/// 기본 제공 그룹 테이블
const BUILTIN_GROUPS: &[(&str, &[&str])] = &[
    (
        "slo-core",
        &[
            "TF-SLO-VOL_DataVolumeReduction_SteadyWorkload",
            "TF-SLO-SER_ProcessCardinalityReduction_MixedWorkload",
            "TF-SLO-TOP5_DiagnosticIntegrity_TopCPUProcesses",
        ],
    ),
    (
        "slo-perf",
        &[
            "TF-SLO-CPU_CollectorPerf_LoadTest_10Kdps_cAdvisor",
            "TF-SLO-RAM_CollectorPerf_LoadTest_10Kdps_HighState_cAdvisor",
            "TF-SLO-LAT_CollectorPipelineLatency_SteadyWorkload",
        ],
    ),
    (
        "slo-alert",
        &[
            "TF-SLO-ALR_Recall_CPUSpikeReplay",
            "TF-SLO-ALR_Precision_NoSpikeWindow",
        ],
    ),
    (
        "mfr-basic",
        &[
            "TF-MFR-SC.1_IngestionSources",
            "TF-MFR-SC.3_ExportSchema",
            "TF-MFR-SC.4_AttributeHandling",
        ],
    ),
    (
        "mfr-advanced",
        &[
            "TF-MFR-SC.1.4_PidEnrichment_HostmetricsVariations",
            "TF-MFR-SC.5_Deduplication_MultiSourceMultiNode",
            "TF-MFR-SC.2_AggregationLogic_DiskIONetworkIO",
        ],
    ),
    (
        "mfr-components",
        &["TF-MFR-EP_AllRequirements", "TF-MFR-LA_AllRequirements"],
    ),
    (
        "regression",
        &[
            "TF-REG-Filter_HighCard_Memory_Scale",
            "TF-LINT-OTTL_StrictErrorMode",
        ],
    ),
    (
        "security",
        &[
            "TF-SEC-1_SBOM_Validation",
            "TF-SEC-2_ImageSignature_Validation",
            "TF-SEC-3_EdgeProbeHardening",
        ],
    ),
];

/// 그룹 이름 → 시나리오 ID 목록 (불변)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupRegistry {
    groups: BTreeMap<String, Vec<String>>,
}

impl GroupRegistry {
    /// 기본 제공 그룹으로 레지스트리를 만듭니다.
    pub fn builtin() -> Self {
        let groups = BUILTIN_GROUPS
            .iter()
            .map(|(name, ids)| {
                (
                    (*name).to_owned(),
                    ids.iter().map(|id| (*id).to_owned()).collect(),
                )
            })
            .collect();
        Self { groups }
    }

    /// 주어진 그룹 정의로 레지스트리를 만듭니다.
    pub fn from_groups(groups: BTreeMap<String, Vec<String>>) -> Self {
        Self { groups }
    }

    /// 기본 제공 그룹에 설정의 그룹을 덮어써서 만듭니다.
    ///
    /// 같은 이름의 그룹은 설정 쪽이 대체합니다.
    pub fn with_overrides(overrides: &BTreeMap<String, Vec<String>>) -> Self {
        let mut registry = Self::builtin();
        for (name, ids) in overrides {
            registry.groups.insert(name.clone(), ids.clone());
        }
        registry
    }

    /// 그룹의 멤버 ID 목록
    pub fn members(&self, group: &str) -> Option<&[String]> {
        self.groups.get(group).map(Vec::as_slice)
    }

    /// 그룹 이름과 멤버 목록을 이름 순으로 순회합니다.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.groups
            .iter()
            .map(|(name, ids)| (name.as_str(), ids.as_slice()))
    }

    /// 등록된 그룹 수
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// 등록된 그룹이 없는지 여부
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// 시나리오 디렉토리 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberStatus {
    /// `enabled` 아래에 정의 파일이 있음
    Enabled,
    /// `pending` 아래에만 정의 파일이 있음
    Pending,
    /// 어디에도 없음
    Missing,
}

impl MemberStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Enabled => "enabled",
            Self::Pending => "pending",
            Self::Missing => "missing",
        }
    }
}

impl fmt::Display for MemberStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 해석 중 발생한 비치명적 경고
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogWarning {
    /// 시나리오가 존재하지만 `pending` 상태라 실행되지 않음
    Pending { scenario_id: String },
    /// 요청한 시나리오를 어디에서도 찾을 수 없음
    NotFound { scenario_id: String },
    /// 그룹 멤버가 `enabled`에 없어 생략됨
    MissingMember { group: String, scenario_id: String },
    /// 같은 ID가 다시 나와 한 번만 실행됨
    Duplicate { scenario_id: String },
    /// 디렉토리 이름으로 쓸 수 없는 ID
    InvalidId { scenario_id: String },
}

impl fmt::Display for CatalogWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending { scenario_id } => {
                write!(f, "scenario {scenario_id} is pending and will not be executed")
            }
            Self::NotFound { scenario_id } => write!(f, "scenario {scenario_id} not found"),
            Self::MissingMember { group, scenario_id } => write!(
                f,
                "scenario {scenario_id} of group {group} not found or not enabled"
            ),
            Self::Duplicate { scenario_id } => {
                write!(f, "scenario {scenario_id} listed more than once, running it once")
            }
            Self::InvalidId { scenario_id } => write!(
                f,
                "scenario id {scenario_id:?} is not a plain directory name, ignoring"
            ),
        }
    }
}

/// 해석 결과
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// 정의 파일 경로 (실행 순서)
    pub locations: Vec<PathBuf>,
    /// 비치명적 경고
    pub warnings: Vec<CatalogWarning>,
}

impl Resolution {
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    fn warn(&mut self, warning: CatalogWarning) {
        warn!(warning = %warning, "catalog warning");
        self.warnings.push(warning);
    }
}

/// 시나리오 카탈로그
#[derive(Debug, Clone)]
pub struct ScenarioCatalog {
    root: PathBuf,
    registry: GroupRegistry,
}

impl ScenarioCatalog {
    /// `root`는 `enabled/`와 `pending/`을 포함하는 디렉토리입니다.
    pub fn new(root: impl Into<PathBuf>, registry: GroupRegistry) -> Self {
        Self {
            root: root.into(),
            registry,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn registry(&self) -> &GroupRegistry {
        &self.registry
    }

    fn definition_path(&self, state_dir: &str, scenario_id: &str) -> PathBuf {
        self.root.join(state_dir).join(scenario_id).join(DEFINITION_FILE)
    }

    /// 시나리오 ID의 현재 상태를 확인합니다.
    ///
    /// 디렉토리 이름으로 쓸 수 없는 ID는 항상 [`MemberStatus::Missing`]입니다.
    pub fn status(&self, scenario_id: &str) -> MemberStatus {
        if !is_plain_id(scenario_id) {
            MemberStatus::Missing
        } else if self.definition_path(ENABLED_DIR, scenario_id).is_file() {
            MemberStatus::Enabled
        } else if self.definition_path(PENDING_DIR, scenario_id).is_file() {
            MemberStatus::Pending
        } else {
            MemberStatus::Missing
        }
    }

    /// 그룹 또는 단일 시나리오를 정의 파일 위치 목록으로 해석합니다.
    ///
    /// `scenario_id`가 주어지면 `group`은 사용되지 않습니다.
    ///
    /// # Errors
    /// 접두어 매치를 위해 `enabled` 디렉토리를 읽는 중 I/O 에러가 발생한 경우.
    /// 디렉토리가 없으면 에러가 아니라 빈 결과입니다.
    pub fn resolve(
        &self,
        group: &str,
        scenario_id: Option<&str>,
    ) -> Result<Resolution, EngineError> {
        let mut resolution = Resolution::default();

        if let Some(id) = scenario_id {
            if !is_plain_id(id) {
                resolution.warn(CatalogWarning::InvalidId {
                    scenario_id: id.to_owned(),
                });
                return Ok(resolution);
            }
            match self.status(id) {
                MemberStatus::Enabled => resolution
                    .locations
                    .push(self.definition_path(ENABLED_DIR, id)),
                MemberStatus::Pending => resolution.warn(CatalogWarning::Pending {
                    scenario_id: id.to_owned(),
                }),
                MemberStatus::Missing => resolution.warn(CatalogWarning::NotFound {
                    scenario_id: id.to_owned(),
                }),
            }
            return Ok(resolution);
        }

        if let Some(members) = self.registry.members(group) {
            let mut seen = HashSet::new();
            for id in members {
                if !is_plain_id(id) {
                    resolution.warn(CatalogWarning::InvalidId {
                        scenario_id: id.clone(),
                    });
                    continue;
                }
                if !seen.insert(id.as_str()) {
                    resolution.warn(CatalogWarning::Duplicate {
                        scenario_id: id.clone(),
                    });
                    continue;
                }
                let path = self.definition_path(ENABLED_DIR, id);
                if path.is_file() {
                    resolution.locations.push(path);
                } else {
                    resolution.warn(CatalogWarning::MissingMember {
                        group: group.to_owned(),
                        scenario_id: id.clone(),
                    });
                }
            }
            debug!(
                group,
                found = resolution.locations.len(),
                "resolved catalog group"
            );
            return Ok(resolution);
        }

        resolution.locations = self.prefix_match(group)?;
        debug!(
            prefix = group,
            found = resolution.locations.len(),
            "unknown group, resolved by prefix"
        );
        Ok(resolution)
    }

    /// `enabled/<prefix>*/scenario_definition.yaml`을 이름 순으로 찾습니다.
    fn prefix_match(&self, prefix: &str) -> Result<Vec<PathBuf>, EngineError> {
        let enabled = self.root.join(ENABLED_DIR);
        let entries = match std::fs::read_dir(&enabled) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(EngineError::Catalog {
                    path: enabled.display().to_string(),
                    reason: format!("failed to read directory: {e}"),
                });
            }
        };

        let mut found = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| EngineError::Catalog {
                path: enabled.display().to_string(),
                reason: format!("failed to read directory entry: {e}"),
            })?;
            let matches = entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.starts_with(prefix));
            if !matches {
                continue;
            }
            let definition = entry.path().join(DEFINITION_FILE);
            if definition.is_file() {
                found.push(definition);
            }
        }
        found.sort();
        Ok(found)
    }
}

/// ID가 `enabled/`나 `pending/` 바로 아래의 디렉토리 이름 하나로만 해석되는지 여부
fn is_plain_id(id: &str) -> bool {
    !id.is_empty()
        && id != "."
        && !id.contains("..")
        && !id.contains(['/', '\\'])
        && Path::new(id).is_relative()
}
