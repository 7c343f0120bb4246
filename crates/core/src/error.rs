//! 에러 타입 — 도메인별 에러 정의

/// tfk8s 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum Tfk8sError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 시나리오 정의 에러
    #[error("definition error: {0}")]
    Definition(#[from] DefinitionError),

    /// 네임스페이스 준비 실패
    #[error("setup error: {0}")]
    Setup(String),

    /// 명령 실행 실패
    #[error("execution error: {0}")]
    Execution(String),

    /// 결과 저장 실패
    #[error("store error: {0}")]
    Store(String),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 시나리오 정의 에러
///
/// 정의 파일을 읽거나 역직렬화할 수 없거나, 필수 필드가 빠진 경우입니다.
/// 해당 시나리오만 건너뛰고 나머지 실행은 계속됩니다.
#[derive(Debug, thiserror::Error)]
pub enum DefinitionError {
    /// 파일 읽기 실패
    #[error("failed to read {path}: {reason}")]
    Read { path: String, reason: String },

    /// 파일 크기 초과
    #[error("{path}: file too large: {size} bytes (max: {max})")]
    TooLarge { path: String, size: u64, max: u64 },

    /// YAML 역직렬화 실패
    #[error("{path}: YAML parse error: {reason}")]
    Parse { path: String, reason: String },

    /// 필수 구조 누락 또는 잘못된 값
    #[error("{path}: invalid scenario: {reason}")]
    Invalid { path: String, reason: String },
}
