//! 설정 관리 — tfk8s.toml 파싱 및 런타임 설정
//!
//! [`Tfk8sConfig`]는 러너 전체의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`TFK8S_CLUSTER_KUBECTL=/usr/local/bin/kubectl` 형식)
//! 3. 설정 파일 (`tfk8s.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), tfk8s_core::error::Tfk8sError> {
//! use tfk8s_core::config::Tfk8sConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = Tfk8sConfig::load("tfk8s.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = Tfk8sConfig::parse("[cluster]\nkeep_on_failure = true")?;
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, Tfk8sError};

/// 네임스페이스 삭제 대기 상한 (초)
pub const MAX_DELETE_TIMEOUT_SECS: u64 = 3600;

/// tfk8s 통합 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Tfk8sConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 경로 설정
    #[serde(default)]
    pub paths: PathsConfig,
    /// 클러스터 상호작용 설정
    #[serde(default)]
    pub cluster: ClusterConfig,
    /// 카탈로그 그룹 오버라이드
    #[serde(default)]
    pub catalog: CatalogConfig,
}

impl Tfk8sConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, Tfk8sError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// 파일이 없으면 기본값을 사용해 로드합니다.
    ///
    /// 기본 경로의 설정 파일은 선택 사항이므로, CLI가 명시하지 않은 경로에 사용합니다.
    pub async fn load_or_default(path: impl AsRef<Path>) -> Result<Self, Tfk8sError> {
        let path = path.as_ref();
        let mut config = match tokio::fs::try_exists(path).await {
            Ok(true) => Self::from_file(path).await?,
            _ => Self::default(),
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, Tfk8sError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Tfk8sError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                Tfk8sError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, Tfk8sError> {
        toml::from_str(toml_str).map_err(|e| {
            Tfk8sError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `TFK8S_{SECTION}_{FIELD}`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "TFK8S_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "TFK8S_GENERAL_LOG_FORMAT");

        // Paths
        override_string(
            &mut self.paths.scenarios_root,
            "TFK8S_PATHS_SCENARIOS_ROOT",
        );
        override_string(&mut self.paths.reports_dir, "TFK8S_PATHS_REPORTS_DIR");

        // Cluster
        override_string(&mut self.cluster.kubectl, "TFK8S_CLUSTER_KUBECTL");
        override_string(
            &mut self.cluster.namespace_prefix,
            "TFK8S_CLUSTER_NAMESPACE_PREFIX",
        );
        override_u64(
            &mut self.cluster.delete_timeout_secs,
            "TFK8S_CLUSTER_DELETE_TIMEOUT_SECS",
        );
        override_bool(
            &mut self.cluster.keep_on_failure,
            "TFK8S_CLUSTER_KEEP_ON_FAILURE",
        );
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), Tfk8sError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        if self.paths.scenarios_root.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "paths.scenarios_root".to_owned(),
                reason: "must not be empty".to_owned(),
            }
            .into());
        }

        if self.paths.reports_dir.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "paths.reports_dir".to_owned(),
                reason: "must not be empty".to_owned(),
            }
            .into());
        }

        if self.cluster.kubectl.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "cluster.kubectl".to_owned(),
                reason: "must not be empty".to_owned(),
            }
            .into());
        }

        // 접두어도 네임스페이스 이름(DNS-1123 label)의 일부가 됨
        let prefix_ok = !self.cluster.namespace_prefix.is_empty()
            && self.cluster.namespace_prefix.len() <= 20
            && self
                .cluster
                .namespace_prefix
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
            && self
                .cluster
                .namespace_prefix
                .starts_with(|c: char| c.is_ascii_lowercase());
        if !prefix_ok {
            return Err(ConfigError::InvalidValue {
                field: "cluster.namespace_prefix".to_owned(),
                reason: "must be 1-20 chars of [a-z0-9-] starting with a letter".to_owned(),
            }
            .into());
        }

        if self.cluster.delete_timeout_secs == 0
            || self.cluster.delete_timeout_secs > MAX_DELETE_TIMEOUT_SECS
        {
            return Err(ConfigError::InvalidValue {
                field: "cluster.delete_timeout_secs".to_owned(),
                reason: format!("must be 1-{MAX_DELETE_TIMEOUT_SECS}"),
            }
            .into());
        }

        for (group, members) in &self.catalog.groups {
            if group.is_empty() || members.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: format!("catalog.groups.{group}"),
                    reason: "group name and member list must not be empty".to_owned(),
                }
                .into());
            }
        }

        Ok(())
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "pretty".to_owned(),
        }
    }
}

/// 경로 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// `enabled/`, `pending/` 디렉토리를 담는 시나리오 루트
    pub scenarios_root: String,
    /// 결과 JSON 출력 디렉토리
    pub reports_dir: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            scenarios_root: "tf-k8s/scenarios".to_owned(),
            reports_dir: "tf-k8s/reports".to_owned(),
        }
    }
}

/// 클러스터 상호작용 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// kubectl 실행 파일
    pub kubectl: String,
    /// 네임스페이스 이름 접두어
    pub namespace_prefix: String,
    /// 네임스페이스 삭제 대기 시간 (초)
    pub delete_timeout_secs: u64,
    /// 실패한 시나리오의 네임스페이스를 사후 분석용으로 보존
    pub keep_on_failure: bool,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            kubectl: "kubectl".to_owned(),
            namespace_prefix: "tf-k8s".to_owned(),
            delete_timeout_secs: 60,
            keep_on_failure: false,
        }
    }
}

/// 카탈로그 설정
///
/// 여기에 정의된 그룹은 내장 그룹 테이블의 같은 이름 항목을 대체합니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub groups: BTreeMap<String, Vec<String>>,
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}
