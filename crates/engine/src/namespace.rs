//! 네임스페이스 관리 — 시나리오별 격리 네임스페이스의 생성, 매니페스트 적용, 삭제
//!
//! 모든 클러스터 작업은 [`CommandRunner`]를 통한 `kubectl` 호출입니다.
//!
//! - [`NamespaceManager::setup`]: 네임스페이스를 만들고 `<base_dir>/k8s`의
//!   `*.yaml`/`*.yml` 파일을 파일 이름 순서대로 적용합니다. 실패 시 롤백하지 않으며,
//!   정리 여부는 호출자가 [`EngineError::Setup`]의 `created` 값으로 판단합니다.
//! - [`NamespaceManager::cleanup`]: `kubectl delete namespace`를 실행하며,
//!   kubectl의 `--timeout`과 별도로 전체 대기 시간에 상한을 둡니다.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tfk8s_core::types::ScenarioDefinition;
use tracing::{debug, info, warn};

use crate::command::{CommandOutput, CommandRunner, Invocation};
use crate::config::EngineConfig;
use crate::error::EngineError;

/// 네임스페이스 이름 최대 길이 (DNS-1123 label)
pub const MAX_NAMESPACE_LEN: usize = 63;

/// kubectl 자체 타임아웃 이후 추가로 기다리는 시간
pub const CLEANUP_GRACE: Duration = Duration::from_secs(10);

/// 시나리오 ID로부터 네임스페이스 이름을 만듭니다.
///
/// `<prefix>-<id>`를 소문자로 바꾸고 `[a-z0-9-]` 밖의 문자(`_` 포함)를 `-`로
/// 치환한 뒤 63자로 자르고 양 끝의 `-`를 제거합니다.
pub fn namespace_name(prefix: &str, scenario_id: &str) -> String {
    let sanitized: String = format!("{prefix}-{scenario_id}")
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' {
                c
            } else {
                '-'
            }
        })
        .take(MAX_NAMESPACE_LEN)
        .collect();
    sanitized.trim_matches('-').to_owned()
}

/// 준비가 끝난 네임스페이스
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace {
    name: String,
    manifests: Vec<PathBuf>,
}

impl Namespace {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 적용된 매니페스트 (적용 순서)
    pub fn manifests(&self) -> &[PathBuf] {
        &self.manifests
    }
}

/// 네임스페이스 관리자
pub struct NamespaceManager<R: CommandRunner> {
    runner: Arc<R>,
    kubectl: String,
    prefix: String,
    delete_timeout: Duration,
}

impl<R: CommandRunner> NamespaceManager<R> {
    pub fn new(runner: Arc<R>, config: &EngineConfig) -> Self {
        Self {
            runner,
            kubectl: config.kubectl.clone(),
            prefix: config.namespace_prefix.clone(),
            delete_timeout: config.delete_timeout,
        }
    }

    /// 시나리오에 할당될 네임스페이스 이름
    pub fn name_for(&self, definition: &ScenarioDefinition) -> String {
        namespace_name(&self.prefix, definition.id())
    }

    /// 네임스페이스를 생성하고 리소스 디렉토리의 매니페스트를 적용합니다.
    ///
    /// # Errors
    /// `EngineError::Setup`. 네임스페이스 생성 이후의 실패는 `created: true`입니다.
    pub async fn setup(&self, definition: &ScenarioDefinition) -> Result<Namespace, EngineError> {
        let name = self.name_for(definition);

        let create = Invocation::new(&self.kubectl).args(["create", "namespace", name.as_str()]);
        self.run_checked(&create)
            .await
            .map_err(|reason| EngineError::Setup {
                namespace: name.clone(),
                created: false,
                reason,
            })?;
        info!(namespace = %name, scenario_id = %definition.id(), "created namespace");

        let resource_dir = definition.resource_dir();
        let manifests = list_manifests(&resource_dir)
            .await
            .map_err(|e| EngineError::Setup {
                namespace: name.clone(),
                created: true,
                reason: format!("failed to list {}: {e}", resource_dir.display()),
            })?;

        for manifest in &manifests {
            info!(namespace = %name, manifest = %manifest.display(), "applying manifest");
            let apply = Invocation::new(&self.kubectl)
                .arg("apply")
                .arg("-f")
                .arg(manifest.display().to_string())
                .args(["-n", name.as_str()]);
            self.run_checked(&apply)
                .await
                .map_err(|reason| EngineError::Setup {
                    namespace: name.clone(),
                    created: true,
                    reason,
                })?;
        }

        debug!(namespace = %name, manifests = manifests.len(), "namespace ready");
        Ok(Namespace { name, manifests })
    }

    /// 네임스페이스를 삭제합니다.
    ///
    /// # Errors
    /// - `EngineError::Timeout`: 삭제 대기 시간 초과
    /// - `EngineError::Cleanup`: kubectl 실행 불가 또는 실패
    pub async fn cleanup(&self, namespace: &str) -> Result<(), EngineError> {
        let secs = self.delete_timeout.as_secs();
        let delete = Invocation::new(&self.kubectl)
            .args(["delete", "namespace", namespace])
            .arg(format!("--timeout={secs}s"));

        info!(namespace, "deleting namespace");
        let output = match tokio::time::timeout(
            self.delete_timeout + CLEANUP_GRACE,
            self.runner.run(&delete),
        )
        .await
        {
            Ok(result) => result.map_err(|e| EngineError::Cleanup {
                namespace: namespace.to_owned(),
                reason: e.to_string(),
            })?,
            Err(_elapsed) => {
                return Err(EngineError::Timeout {
                    operation: format!("deletion of namespace {namespace}"),
                    secs: (self.delete_timeout + CLEANUP_GRACE).as_secs(),
                });
            }
        };

        if !output.success() {
            return Err(EngineError::Cleanup {
                namespace: namespace.to_owned(),
                reason: failure_reason(&delete, &output),
            });
        }

        info!(namespace, "namespace deleted");
        Ok(())
    }

    /// 명령을 실행하고 실패를 사유 문자열로 돌려줍니다.
    async fn run_checked(&self, invocation: &Invocation) -> Result<CommandOutput, String> {
        let output = self
            .runner
            .run(invocation)
            .await
            .map_err(|e| e.to_string())?;
        if output.success() {
            Ok(output)
        } else {
            warn!(command = %invocation, status = %output.status_text(), "kubectl command failed");
            Err(failure_reason(invocation, &output))
        }
    }
}

fn failure_reason(invocation: &Invocation, output: &CommandOutput) -> String {
    format!(
        "`{invocation}` failed ({}): {}",
        output.status_text(),
        output.combined().trim()
    )
}

/// 디렉토리의 YAML 매니페스트를 파일 이름 순으로 나열합니다.
///
/// 디렉토리가 없으면 빈 목록입니다.
async fn list_manifests(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut manifests = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let is_yaml = path
            .extension()
            .is_some_and(|ext| ext == "yaml" || ext == "yml");
        if is_yaml && entry.file_type().await?.is_file() {
            manifests.push(path);
        }
    }
    manifests.sort();
    Ok(manifests)
}
