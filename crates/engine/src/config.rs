//! 엔진 설정
//!
//! [`EngineConfig`]는 core의 [`Tfk8sConfig`]에서 파생되며,
//! CLI 플래그 오버라이드는 [`EngineConfigBuilder`]로 적용합니다.
//!
//! # 사용 예시
//! ```ignore
//! use tfk8s_core::Tfk8sConfig;
//! use tfk8s_engine::config::EngineConfigBuilder;
//!
//! let core = Tfk8sConfig::default();
//! let config = EngineConfigBuilder::from_core(&core)
//!     .keep_on_failure(true)
//!     .build()?;
//! ```

use std::path::PathBuf;
use std::time::Duration;

use tfk8s_core::Tfk8sConfig;
use tfk8s_core::config::MAX_DELETE_TIMEOUT_SECS;

use crate::error::EngineError;

/// 네임스페이스 접두어 최대 길이
const MAX_NAMESPACE_PREFIX_LEN: usize = 20;

/// 시나리오 엔진 설정
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// 시나리오 루트 (`enabled/`, `pending/` 포함)
    pub scenarios_root: PathBuf,
    /// 결과 파일 디렉토리
    pub reports_dir: PathBuf,
    /// kubectl 실행 파일
    pub kubectl: String,
    /// 네임스페이스 이름 접두어
    pub namespace_prefix: String,
    /// 네임스페이스 삭제 대기 시간
    pub delete_timeout: Duration,
    /// 실패한 시나리오의 네임스페이스 보존 여부
    pub keep_on_failure: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            scenarios_root: PathBuf::from("tf-k8s/scenarios"),
            reports_dir: PathBuf::from("tf-k8s/reports"),
            kubectl: "kubectl".to_owned(),
            namespace_prefix: "tf-k8s".to_owned(),
            delete_timeout: Duration::from_secs(60),
            keep_on_failure: false,
        }
    }
}

impl EngineConfig {
    /// core 설정에서 엔진 설정을 생성합니다.
    pub fn from_core(core: &Tfk8sConfig) -> Self {
        Self {
            scenarios_root: PathBuf::from(&core.paths.scenarios_root),
            reports_dir: PathBuf::from(&core.paths.reports_dir),
            kubectl: core.cluster.kubectl.clone(),
            namespace_prefix: core.cluster.namespace_prefix.clone(),
            delete_timeout: Duration::from_secs(core.cluster.delete_timeout_secs),
            keep_on_failure: core.cluster.keep_on_failure,
        }
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.kubectl.trim().is_empty() {
            return Err(EngineError::Config {
                field: "kubectl".to_owned(),
                reason: "must not be empty".to_owned(),
            });
        }

        let prefix = &self.namespace_prefix;
        let prefix_ok = !prefix.is_empty()
            && prefix.len() <= MAX_NAMESPACE_PREFIX_LEN
            && prefix.starts_with(|c: char| c.is_ascii_lowercase())
            && prefix
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
        if !prefix_ok {
            return Err(EngineError::Config {
                field: "namespace_prefix".to_owned(),
                reason: format!(
                    "must be 1-{MAX_NAMESPACE_PREFIX_LEN} chars of [a-z0-9-] starting with a letter"
                ),
            });
        }

        let secs = self.delete_timeout.as_secs();
        if secs == 0 || secs > MAX_DELETE_TIMEOUT_SECS {
            return Err(EngineError::Config {
                field: "delete_timeout".to_owned(),
                reason: format!("must be 1-{MAX_DELETE_TIMEOUT_SECS} seconds"),
            });
        }

        if self.scenarios_root.as_os_str().is_empty() {
            return Err(EngineError::Config {
                field: "scenarios_root".to_owned(),
                reason: "must not be empty".to_owned(),
            });
        }

        if self.reports_dir.as_os_str().is_empty() {
            return Err(EngineError::Config {
                field: "reports_dir".to_owned(),
                reason: "must not be empty".to_owned(),
            });
        }

        Ok(())
    }
}

/// 엔진 설정 빌더
#[derive(Default)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    /// 기본값으로 시작하는 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// core 설정에서 시작하는 빌더를 생성합니다.
    pub fn from_core(core: &Tfk8sConfig) -> Self {
        Self {
            config: EngineConfig::from_core(core),
        }
    }

    pub fn scenarios_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.scenarios_root = root.into();
        self
    }

    pub fn reports_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.reports_dir = dir.into();
        self
    }

    pub fn kubectl(mut self, kubectl: impl Into<String>) -> Self {
        self.config.kubectl = kubectl.into();
        self
    }

    pub fn namespace_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.namespace_prefix = prefix.into();
        self
    }

    pub fn delete_timeout(mut self, timeout: Duration) -> Self {
        self.config.delete_timeout = timeout;
        self
    }

    pub fn keep_on_failure(mut self, keep: bool) -> Self {
        self.config.keep_on_failure = keep;
        self
    }

    /// 설정을 검증하고 `EngineConfig`를 생성합니다.
    pub fn build(self) -> Result<EngineConfig, EngineError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
