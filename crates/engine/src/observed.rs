//! 관측값 수집 — 단계 출력에서 성공 기준 평가용 메트릭을 추출
//!
//! 검증기는 결과 요약을 `Label: <number>[%]` 형태로 출력합니다.
//! [`OutputMetricsExtractor`]는 이 줄들을 읽어 정규화된 키로 [`ObservedMetrics`]에
//! 기록합니다. 같은 키가 여러 번 나오면 나중 값이 이깁니다.

use std::collections::BTreeMap;

use tfk8s_core::types::{StepResult, SuccessCriterion};

/// 메트릭 키를 정규화합니다.
///
/// 소문자로 바꾸고 영숫자가 아닌 문자 연속을 `_` 하나로 바꾼 뒤
/// 양 끝의 `_`를 제거합니다. (`"Hash Consistency (%)"` → `"hash_consistency"`)
pub fn normalize_key(raw: &str) -> String {
    let mut key = String::with_capacity(raw.len());
    let mut pending_sep = false;
    for c in raw.chars() {
        if c.is_alphanumeric() {
            if pending_sep && !key.is_empty() {
                key.push('_');
            }
            pending_sep = false;
            key.extend(c.to_lowercase());
        } else {
            pending_sep = true;
        }
    }
    key
}

/// 관측된 메트릭 값 (정규화된 키 → 값)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObservedMetrics {
    values: BTreeMap<String, f64>,
}

impl ObservedMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// 값을 기록합니다. 키는 정규화되며 기존 값은 덮어씁니다.
    pub fn insert(&mut self, key: &str, value: f64) {
        self.values.insert(normalize_key(key), value);
    }

    /// 키로 값을 찾습니다.
    pub fn get(&self, key: &str) -> Option<f64> {
        self.values.get(&normalize_key(key)).copied()
    }

    /// 기준의 `metric`으로 찾고, 없으면 `name`으로 찾습니다.
    pub fn lookup(&self, criterion: &SuccessCriterion) -> Option<f64> {
        self.get(&criterion.metric)
            .or_else(|| self.get(&criterion.name))
    }

    /// 다른 관측값을 병합합니다. 같은 키는 `other`가 이깁니다.
    pub fn merge(&mut self, other: ObservedMetrics) {
        self.values.extend(other.values);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl<K: AsRef<str>> FromIterator<(K, f64)> for ObservedMetrics {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        let mut metrics = Self::new();
        for (key, value) in iter {
            metrics.insert(key.as_ref(), value);
        }
        metrics
    }
}

/// 성공 기준 평가에 쓸 관측값 공급원
pub trait MetricsSource: Send + Sync {
    /// 실행된 단계 결과로부터 관측값을 수집합니다.
    fn collect(&self, steps: &[StepResult]) -> ObservedMetrics;
}

/// 고정된 관측값을 그대로 돌려줍니다.
impl MetricsSource for ObservedMetrics {
    fn collect(&self, _steps: &[StepResult]) -> ObservedMetrics {
        self.clone()
    }
}

/// 단계 출력에서 `Label: <number>[%]` 줄을 추출하는 기본 공급원
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputMetricsExtractor;

impl OutputMetricsExtractor {
    pub fn new() -> Self {
        Self
    }

    /// 한 줄을 `(label, value)`로 해석합니다.
    pub fn parse_line(line: &str) -> Option<(String, f64)> {
        let (label, value) = line.split_once(':')?;
        let label = label.trim();
        if !label.chars().any(char::is_alphabetic) {
            return None;
        }

        let value = value.trim();
        let number = value.strip_suffix('%').unwrap_or(value).trim_end();
        let parsed: f64 = number.parse().ok()?;
        if !parsed.is_finite() {
            return None;
        }

        let key = normalize_key(label);
        if key.is_empty() {
            return None;
        }
        Some((key, parsed))
    }
}

impl MetricsSource for OutputMetricsExtractor {
    fn collect(&self, steps: &[StepResult]) -> ObservedMetrics {
        let mut metrics = ObservedMetrics::new();
        for chunk in steps.iter().flat_map(|s| s.output.iter()) {
            for line in chunk.lines() {
                if let Some((key, value)) = Self::parse_line(line) {
                    metrics.values.insert(key, value);
                }
            }
        }
        tracing::debug!(observed = metrics.len(), "extracted metrics from step output");
        metrics
    }
}
