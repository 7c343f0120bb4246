//! 시나리오 로더 — YAML 정의 파일을 [`ScenarioDefinition`]으로 변환
//!
//! 파일 크기를 확인한 뒤 `serde_yaml`로 파싱하고 구조 검증을 수행합니다.
//! 모든 실패는 [`DefinitionError`]로 보고되며, 네임스페이스 준비 전에
//! 해당 시나리오를 건너뛰게 합니다.

use std::collections::HashSet;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tfk8s_core::error::DefinitionError;
use tfk8s_core::types::ScenarioDefinition;

use crate::template::CommandTemplate;

/// 정의 파일 최대 크기
const MAX_DEFINITION_FILE_SIZE: u64 = 1024 * 1024; // 1MB

/// 최소 단계 수
pub const MIN_STEPS: usize = 3;

/// 권장 시나리오 ID 형식
static SCENARIO_ID_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^TF-[A-Z]+-[0-9]+_[A-Za-z0-9_]+$").ok());

/// 시나리오 정의 로더
pub struct ScenarioLoader;

impl ScenarioLoader {
    /// 정의 파일을 읽어 검증된 시나리오를 반환합니다.
    ///
    /// 반환된 정의의 `base_dir`은 파일이 위치한 디렉토리입니다.
    ///
    /// # Errors
    /// - 파일을 읽을 수 없거나 1MB를 초과하는 경우
    /// - YAML 구문 또는 필수 필드 오류
    /// - 구조 검증 실패 (`validate` 참조)
    pub async fn load(path: impl AsRef<Path>) -> Result<ScenarioDefinition, DefinitionError> {
        let path = path.as_ref();
        let source = path.display().to_string();

        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| DefinitionError::Read {
                path: source.clone(),
                reason: format!("failed to read file metadata: {e}"),
            })?;

        if metadata.len() > MAX_DEFINITION_FILE_SIZE {
            return Err(DefinitionError::TooLarge {
                path: source,
                size: metadata.len(),
                max: MAX_DEFINITION_FILE_SIZE,
            });
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| DefinitionError::Read {
                path: source.clone(),
                reason: format!("failed to read file: {e}"),
            })?;

        let mut definition = Self::parse_yaml(&content, &source)?;
        definition.base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        tracing::debug!(
            scenario_id = %definition.id(),
            path = %source,
            steps = definition.steps.len(),
            criteria = definition.success_criteria.len(),
            "loaded scenario definition"
        );

        Ok(definition)
    }

    /// YAML 문자열을 파싱하고 검증합니다. `base_dir`은 비어 있습니다.
    pub fn parse_yaml(yaml_str: &str, source: &str) -> Result<ScenarioDefinition, DefinitionError> {
        let definition: ScenarioDefinition =
            serde_yaml::from_str(yaml_str).map_err(|e| DefinitionError::Parse {
                path: source.to_owned(),
                reason: e.to_string(),
            })?;

        Self::validate(&definition, source)?;

        Ok(definition)
    }

    /// 구조 검증
    ///
    /// 실행에 필요한 최소 조건만 확인합니다. 문서 품질에 관한 검증은
    /// 별도의 정적 검증기가 담당합니다.
    pub fn validate(definition: &ScenarioDefinition, source: &str) -> Result<(), DefinitionError> {
        let invalid = |reason: String| DefinitionError::Invalid {
            path: source.to_owned(),
            reason,
        };

        let id = definition.id();
        if id.trim().is_empty() {
            return Err(invalid("metadata.id must not be empty".to_owned()));
        }
        let id_matches = SCENARIO_ID_PATTERN
            .as_ref()
            .is_some_and(|pattern| pattern.is_match(id));
        if !id_matches {
            tracing::warn!(
                scenario_id = %id,
                path = %source,
                "scenario id does not follow TF-<CATEGORY>-<NUMBER>_<Name>"
            );
        }

        if definition.requirements.components.is_empty() {
            return Err(invalid(
                "requirements.components must not be empty".to_owned(),
            ));
        }

        if definition.steps.len() < MIN_STEPS {
            return Err(invalid(format!(
                "at least {MIN_STEPS} steps required, found {}",
                definition.steps.len()
            )));
        }

        let mut seen = HashSet::new();
        let mut has_apply = false;
        let mut has_verify = false;
        for step in &definition.steps {
            if step.name.trim().is_empty() {
                return Err(invalid("step name must not be empty".to_owned()));
            }
            if !seen.insert(step.name.as_str()) {
                return Err(invalid(format!("duplicate step name: {}", step.name)));
            }
            if step.commands.is_empty() {
                return Err(invalid(format!("step '{}' has no commands", step.name)));
            }
            for command in &step.commands {
                let template = CommandTemplate::parse(command)
                    .map_err(|e| invalid(format!("step '{}': {e}", step.name)))?;
                has_apply |= template.is_resource_apply();
                has_verify |= template.is_verification();
            }
        }

        if !has_apply {
            return Err(invalid(
                "no step applies resources (expected a `kubectl apply` command)".to_owned(),
            ));
        }
        if !has_verify {
            return Err(invalid(
                "no step runs a verification command".to_owned(),
            ));
        }

        if definition.success_criteria.is_empty() {
            return Err(invalid("success_criteria must not be empty".to_owned()));
        }
        for criterion in &definition.success_criteria {
            if !criterion.threshold.is_finite() {
                return Err(invalid(format!(
                    "criterion '{}' has a non-finite threshold",
                    criterion.name
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tfk8s_core::types::ClusterType;

    const VALID: &str = r#"
metadata:
  id: TF-SEC-1_SBOM_Validation
  name: SBOM Validation
  description: Validates the collector SBOM
  version: "1.0"
  tags: [security]
  eidc_references: [EIDC-SEC-1]
requirements:
  cluster_type: kind
  components: [otel-collector]
steps:
  - name: deploy
    commands:
      - kubectl apply -f k8s/collector.yaml -n {namespace}
  - name: wait
    critical: false
    commands:
      - kubectl wait --for=condition=ready pod -l app=collector -n {namespace} --timeout=120s
  - name: verify
    commands:
      - python3 verify_sbom.py sbom.json
success_criteria:
  - name: SBOM completeness
    metric: sbom_completeness
    threshold: 100
"#;

    fn replace(yaml: &str, from: &str, to: &str) -> String {
        assert!(yaml.contains(from), "fixture does not contain {from}");
        yaml.replacen(from, to, 1)
    }

    #[test]
    fn parse_valid_definition() {
        let def = ScenarioLoader::parse_yaml(VALID, "test.yaml").unwrap();
        assert_eq!(def.id(), "TF-SEC-1_SBOM_Validation");
        assert_eq!(def.cluster_type(), ClusterType::Kind);
        assert_eq!(def.steps.len(), 3);
        assert!(def.steps[0].critical);
        assert!(!def.steps[1].critical);
        assert_eq!(def.success_criteria[0].threshold, 100.0);
        assert_eq!(def.metadata.eidc_references, ["EIDC-SEC-1"]);
    }

    #[test]
    fn optional_metadata_defaults() {
        let yaml = replace(
            VALID,
            "  name: SBOM Validation\n  description: Validates the collector SBOM\n  version: \"1.0\"\n  tags: [security]\n  eidc_references: [EIDC-SEC-1]\n",
            "",
        );
        let def = ScenarioLoader::parse_yaml(&yaml, "test.yaml").unwrap();
        assert!(def.metadata.name.is_empty());
        assert!(def.metadata.tags.is_empty());
    }

    #[test]
    fn malformed_yaml_is_parse_error() {
        let err = ScenarioLoader::parse_yaml("not: [valid: yaml: {{{", "bad.yaml").unwrap_err();
        assert!(matches!(err, DefinitionError::Parse { .. }));
    }

    #[test]
    fn missing_required_section_is_parse_error() {
        let yaml = "metadata:\n  id: TF-SEC-1_X\nsteps: []\n";
        let err = ScenarioLoader::parse_yaml(yaml, "x.yaml").unwrap_err();
        assert!(matches!(err, DefinitionError::Parse { .. }));
    }

    #[test]
    fn unknown_cluster_type_is_parse_error() {
        let yaml = replace(VALID, "cluster_type: kind", "cluster_type: minikube");
        let err = ScenarioLoader::parse_yaml(&yaml, "x.yaml").unwrap_err();
        assert!(matches!(err, DefinitionError::Parse { .. }));
    }

    #[test]
    fn scenario_without_apply_step_is_rejected() {
        let yaml = replace(
            VALID,
            "kubectl apply -f k8s/collector.yaml -n {namespace}",
            "kubectl get pods -n {namespace}",
        );
        let err = ScenarioLoader::parse_yaml(&yaml, "x.yaml").unwrap_err();
        assert!(matches!(err, DefinitionError::Invalid { .. }));
        assert!(err.to_string().contains("kubectl apply"));
    }

    #[test]
    fn scenario_without_verify_step_is_rejected() {
        let yaml = replace(VALID, "python3 verify_sbom.py sbom.json", "python3 check.py");
        let err = ScenarioLoader::parse_yaml(&yaml, "x.yaml").unwrap_err();
        assert!(err.to_string().contains("verification"));
    }

    #[test]
    fn too_few_steps_is_rejected() {
        let yaml = replace(
            VALID,
            "  - name: wait\n    critical: false\n    commands:\n      - kubectl wait --for=condition=ready pod -l app=collector -n {namespace} --timeout=120s\n",
            "",
        );
        let err = ScenarioLoader::parse_yaml(&yaml, "x.yaml").unwrap_err();
        assert!(err.to_string().contains("at least 3 steps"));
    }

    #[test]
    fn empty_components_is_rejected() {
        let yaml = replace(VALID, "components: [otel-collector]", "components: []");
        assert!(ScenarioLoader::parse_yaml(&yaml, "x.yaml").is_err());
    }

    #[test]
    fn empty_criteria_is_rejected() {
        let yaml = replace(
            VALID,
            "  - name: SBOM completeness\n    metric: sbom_completeness\n    threshold: 100\n",
            "",
        );
        let yaml = replace(&yaml, "success_criteria:\n", "success_criteria: []\n");
        let err = ScenarioLoader::parse_yaml(&yaml, "x.yaml").unwrap_err();
        assert!(err.to_string().contains("success_criteria"));
    }

    #[test]
    fn duplicate_step_names_are_rejected() {
        let yaml = replace(VALID, "- name: wait", "- name: deploy");
        let err = ScenarioLoader::parse_yaml(&yaml, "x.yaml").unwrap_err();
        assert!(err.to_string().contains("duplicate step name"));
    }

    #[test]
    fn shell_pipeline_is_rejected_at_load_time() {
        let yaml = replace(
            VALID,
            "python3 verify_sbom.py sbom.json",
            "python3 verify_sbom.py sbom.json | tee out.txt",
        );
        let err = ScenarioLoader::parse_yaml(&yaml, "x.yaml").unwrap_err();
        assert!(err.to_string().contains("shell operator"));
    }

    #[test]
    fn nonconforming_id_is_accepted() {
        let yaml = replace(
            VALID,
            "id: TF-SEC-1_SBOM_Validation",
            "id: TF-MFR-EP.6_CommandLineHashing",
        );
        let def = ScenarioLoader::parse_yaml(&yaml, "x.yaml").unwrap();
        assert_eq!(def.id(), "TF-MFR-EP.6_CommandLineHashing");
    }

    #[test]
    fn empty_id_is_rejected() {
        let yaml = replace(VALID, "id: TF-SEC-1_SBOM_Validation", "id: \"\"");
        assert!(ScenarioLoader::parse_yaml(&yaml, "x.yaml").is_err());
    }

    #[tokio::test]
    async fn load_sets_base_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scenario_definition.yaml");
        tokio::fs::write(&path, VALID).await.unwrap();

        let def = ScenarioLoader::load(&path).await.unwrap();
        assert_eq!(def.base_dir(), dir.path());
        assert_eq!(def.resource_dir(), dir.path().join("k8s"));
    }

    #[tokio::test]
    async fn load_missing_file_is_read_error() {
        let err = ScenarioLoader::load("/nonexistent/scenario_definition.yaml")
            .await
            .unwrap_err();
        assert!(matches!(err, DefinitionError::Read { .. }));
    }

    #[tokio::test]
    async fn load_rejects_oversized_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scenario_definition.yaml");
        let padding = "#".repeat((MAX_DEFINITION_FILE_SIZE + 1) as usize);
        tokio::fs::write(&path, padding).await.unwrap();

        let err = ScenarioLoader::load(&path).await.unwrap_err();
        assert!(matches!(err, DefinitionError::TooLarge { .. }));
    }
}
