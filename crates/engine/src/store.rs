//! 결과 저장소 — 실행 레코드를 JSON 파일로 저장
//!
//! 경로: `<dir>/<scenario_id>_<YYYYMMDD-HHMMSS>.json` (종료 시각, UTC).
//! 파일은 새로 생성할 때만 쓰며 기존 파일을 덮어쓰지 않습니다.

use std::path::{Path, PathBuf};

use tfk8s_core::types::ExecutionResult;
use tokio::io::AsyncWriteExt;

use crate::error::EngineError;

/// 파일 이름의 타임스탬프 형식
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

/// 결과 저장소
#[derive(Debug, Clone)]
pub struct ResultStore {
    dir: PathBuf,
}

impl ResultStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// 결과 레코드의 파일 이름
    pub fn file_name(result: &ExecutionResult) -> String {
        let id: String = result
            .scenario_id
            .chars()
            .map(|c| if c == '/' || c == '\\' { '_' } else { c })
            .collect();
        format!("{id}_{}.json", result.end_time.format(TIMESTAMP_FORMAT))
    }

    /// 결과를 저장하고 파일 경로를 반환합니다.
    ///
    /// # Errors
    /// 디렉토리 생성, 직렬화, 쓰기 실패 또는 같은 경로의 파일이 이미 있는 경우.
    pub async fn save(&self, result: &ExecutionResult) -> Result<PathBuf, EngineError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| store_error(&self.dir, format!("failed to create directory: {e}")))?;

        let path = self.dir.join(Self::file_name(result));
        let json = serde_json::to_string_pretty(result)
            .map_err(|e| store_error(&path, format!("failed to serialize result: {e}")))?;

        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::AlreadyExists {
                    store_error(&path, "result file already exists".to_owned())
                } else {
                    store_error(&path, format!("failed to create file: {e}"))
                }
            })?;
        file.write_all(json.as_bytes())
            .await
            .map_err(|e| store_error(&path, format!("failed to write file: {e}")))?;
        file.write_all(b"\n")
            .await
            .map_err(|e| store_error(&path, format!("failed to write file: {e}")))?;
        file.flush()
            .await
            .map_err(|e| store_error(&path, format!("failed to flush file: {e}")))?;

        tracing::info!(
            scenario_id = %result.scenario_id,
            path = %path.display(),
            success = result.success,
            "saved execution result"
        );
        Ok(path)
    }

    /// 저장된 결과를 읽습니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<ExecutionResult, EngineError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| store_error(path, format!("failed to read file: {e}")))?;
        serde_json::from_str(&content)
            .map_err(|e| store_error(path, format!("failed to parse result: {e}")))
    }
}

fn store_error(path: &Path, reason: String) -> EngineError {
    EngineError::Store {
        path: path.display().to_string(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tfk8s_core::types::{ClusterType, CriterionResult, StepResult};
    use uuid::Uuid;

    fn sample(scenario_id: &str) -> ExecutionResult {
        let start = Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap();
        let end = Utc.with_ymd_and_hms(2026, 3, 14, 9, 31, 5).unwrap();
        ExecutionResult {
            run_id: Uuid::new_v4(),
            scenario_id: scenario_id.to_owned(),
            namespace: "tf-k8s-tf-sec-1-sbom-validation".to_owned(),
            cluster: ClusterType::Kind,
            start_time: start,
            end_time: end,
            steps: vec![StepResult {
                name: "deploy".to_owned(),
                success: true,
                critical: true,
                output: vec!["deployment.apps/collector created\n".to_owned()],
            }],
            criteria: vec![CriterionResult {
                name: "SBOM completeness".to_owned(),
                threshold: 100.0,
                actual: Some(100.0),
                success: true,
            }],
            aborted: false,
            error: None,
            success: true,
        }
    }

    #[test]
    fn file_name_uses_id_and_end_time() {
        assert_eq!(
            ResultStore::file_name(&sample("TF-SEC-1_SBOM_Validation")),
            "TF-SEC-1_SBOM_Validation_20260314-093105.json"
        );
        assert_eq!(
            ResultStore::file_name(&sample("a/b")),
            "a_b_20260314-093105.json"
        );
    }

    #[tokio::test]
    async fn save_then_load_returns_equivalent_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::new(dir.path().join("nested/reports"));
        let result = sample("TF-SEC-1_SBOM_Validation");

        let path = store.save(&result).await.unwrap();
        assert!(path.starts_with(store.dir()));
        assert!(path.is_file());

        let loaded = ResultStore::load(&path).await.unwrap();
        assert_eq!(loaded, result);
    }

    #[tokio::test]
    async fn same_second_different_scenarios_do_not_collide() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::new(dir.path());
        let a = store.save(&sample("TF-SEC-1_SBOM_Validation")).await.unwrap();
        let b = store
            .save(&sample("TF-SEC-2_ImageSignature_Validation"))
            .await
            .unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn existing_file_is_never_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::new(dir.path());
        let first = sample("TF-SEC-1_SBOM_Validation");
        let path = store.save(&first).await.unwrap();

        let mut second = sample("TF-SEC-1_SBOM_Validation");
        second.success = false;
        let err = store.save(&second).await.unwrap_err();
        assert!(err.to_string().contains("already exists"));

        let loaded = ResultStore::load(&path).await.unwrap();
        assert_eq!(loaded.run_id, first.run_id);
    }

    #[tokio::test]
    async fn saved_document_has_expected_shape() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::new(dir.path());
        let path = store.save(&sample("TF-SEC-1_SBOM_Validation")).await.unwrap();

        let raw = tokio::fs::read_to_string(&path).await.unwrap();
        let doc: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(doc["scenario_id"], "TF-SEC-1_SBOM_Validation");
        assert_eq!(doc["steps"][0]["output"][0], "deployment.apps/collector created\n");
        assert_eq!(doc["criteria"][0]["actual"], 100.0);
        assert_eq!(doc["success"], true);
    }

    #[tokio::test]
    async fn load_rejects_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        tokio::fs::write(&path, "{not json").await.unwrap();
        let err = ResultStore::load(&path).await.unwrap_err();
        assert!(matches!(err, EngineError::Store { .. }));
    }
}
