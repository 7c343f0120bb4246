//! 엔진 에러 타입
//!
//! [`EngineError`]는 시나리오 엔진 내부에서 발생하는 모든 에러를 표현합니다.
//! `From<EngineError> for Tfk8sError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 자연스럽게 전파할 수 있습니다.

use tfk8s_core::error::{DefinitionError, Tfk8sError};

/// 시나리오 엔진 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// 시나리오 정의 에러 (해당 시나리오는 건너뜀)
    #[error(transparent)]
    Definition(#[from] DefinitionError),

    /// 명령 템플릿 파싱 실패
    #[error("invalid command template '{command}': {reason}")]
    Template {
        /// 원본 명령 문자열
        command: String,
        /// 실패 사유
        reason: String,
    },

    /// 네임스페이스 생성 또는 매니페스트 적용 실패
    #[error("setup failed for namespace '{namespace}': {reason}")]
    Setup {
        /// 대상 네임스페이스
        namespace: String,
        /// 네임스페이스가 이미 생성되었는지 여부 (정리 필요 여부)
        created: bool,
        /// 실패 사유
        reason: String,
    },

    /// 외부 프로세스 실행 자체가 불가능함 (실행 파일 없음 등)
    #[error("failed to spawn '{program}': {reason}")]
    Spawn {
        /// 실행하려던 프로그램
        program: String,
        /// 실패 사유
        reason: String,
    },

    /// 제한 시간 초과
    #[error("{operation} timed out after {secs}s")]
    Timeout {
        /// 수행 중이던 작업
        operation: String,
        /// 제한 시간 (초)
        secs: u64,
    },

    /// 네임스페이스 삭제 실패
    #[error("cleanup failed for namespace '{namespace}': {reason}")]
    Cleanup {
        /// 대상 네임스페이스
        namespace: String,
        /// 실패 사유
        reason: String,
    },

    /// 카탈로그 디렉토리 탐색 실패
    #[error("catalog error: {path}: {reason}")]
    Catalog {
        /// 탐색 경로
        path: String,
        /// 실패 사유
        reason: String,
    },

    /// 결과 파일 저장/읽기 실패
    #[error("result store error: {path}: {reason}")]
    Store {
        /// 파일 경로
        path: String,
        /// 실패 사유
        reason: String,
    },

    /// 엔진 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },
}

impl From<EngineError> for Tfk8sError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Definition(e) => Tfk8sError::Definition(e),
            EngineError::Setup { .. } => Tfk8sError::Setup(err.to_string()),
            EngineError::Store { .. } => Tfk8sError::Store(err.to_string()),
            EngineError::Config { field, reason } => {
                Tfk8sError::Config(tfk8s_core::error::ConfigError::InvalidValue { field, reason })
            }
            EngineError::Template { .. }
            | EngineError::Spawn { .. }
            | EngineError::Timeout { .. }
            | EngineError::Cleanup { .. }
            | EngineError::Catalog { .. } => Tfk8sError::Execution(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setup_error_display() {
        let err = EngineError::Setup {
            namespace: "tf-k8s-tf-sec-1-sbom-validation".to_owned(),
            created: true,
            reason: "kubectl apply failed".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("tf-k8s-tf-sec-1-sbom-validation"));
        assert!(msg.contains("kubectl apply failed"));
    }

    #[test]
    fn timeout_display() {
        let err = EngineError::Timeout {
            operation: "namespace deletion".to_owned(),
            secs: 60,
        };
        assert_eq!(err.to_string(), "namespace deletion timed out after 60s");
    }

    #[test]
    fn definition_error_is_transparent() {
        let inner = DefinitionError::Invalid {
            path: "x.yaml".to_owned(),
            reason: "no steps".to_owned(),
        };
        let expected = inner.to_string();
        let err = EngineError::from(inner);
        assert_eq!(err.to_string(), expected);
    }

    #[test]
    fn converts_into_core_error() {
        let err: Tfk8sError = EngineError::Setup {
            namespace: "ns".to_owned(),
            created: false,
            reason: "boom".to_owned(),
        }
        .into();
        assert!(matches!(err, Tfk8sError::Setup(_)));

        let err: Tfk8sError = EngineError::Store {
            path: "/tmp/x.json".to_owned(),
            reason: "exists".to_owned(),
        }
        .into();
        assert!(matches!(err, Tfk8sError::Store(_)));

        let err: Tfk8sError = EngineError::Config {
            field: "delete_timeout".to_owned(),
            reason: "zero".to_owned(),
        }
        .into();
        assert!(matches!(err, Tfk8sError::Config(_)));

        let err: Tfk8sError = EngineError::Spawn {
            program: "kubectl".to_owned(),
            reason: "not found".to_owned(),
        }
        .into();
        assert!(matches!(err, Tfk8sError::Execution(_)));
    }
}
