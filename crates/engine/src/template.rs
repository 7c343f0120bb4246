//! 명령 템플릿 — 명령 문자열을 인자 벡터로 변환
//!
//! 시나리오 단계의 명령은 문자열로 작성되지만 셸을 거치지 않고 실행됩니다.
//! [`CommandTemplate::parse`]가 POSIX 규칙과 유사하게 토큰을 나누고
//! (작은따옴표, 큰따옴표, 백슬래시 이스케이프), [`CommandTemplate::render`]가
//! 각 토큰의 자리표시자를 치환해 [`Invocation`]을 만듭니다.
//!
//! 따옴표 밖의 셸 연산자(`|`, `;`, `&`, `<`, `>`)는 거부됩니다.
//!
//! # 자리표시자
//! - `{namespace}`: 실행 네임스페이스
//! - `{scenario_id}`: 시나리오 식별자
//! - `{scenario_dir}`: 시나리오 디렉토리
//!
//! 알 수 없는 자리표시자는 그대로 남습니다.

use crate::command::Invocation;
use crate::error::EngineError;

/// 따옴표 밖에서 허용되지 않는 셸 연산자 문자
const SHELL_OPERATORS: [char; 5] = ['|', ';', '&', '<', '>'];

/// 자리표시자 치환 값
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    pub namespace: String,
    pub scenario_id: String,
    pub scenario_dir: String,
}

impl TemplateContext {
    fn substitute(&self, token: &str) -> String {
        token
            .replace("{namespace}", &self.namespace)
            .replace("{scenario_id}", &self.scenario_id)
            .replace("{scenario_dir}", &self.scenario_dir)
    }
}

/// 파싱된 명령 템플릿
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTemplate {
    raw: String,
    tokens: Vec<String>,
}

impl CommandTemplate {
    /// 명령 문자열을 토큰으로 나눕니다.
    ///
    /// # Errors
    /// - 빈 명령
    /// - 닫히지 않은 따옴표, 끝에 남은 백슬래시
    /// - 따옴표 밖의 셸 연산자
    pub fn parse(raw: &str) -> Result<Self, EngineError> {
        let err = |reason: String| EngineError::Template {
            command: raw.to_owned(),
            reason,
        };

        let mut tokens = Vec::new();
        let mut current = String::new();
        // 빈 따옴표("")도 토큰으로 인정하기 위한 표시
        let mut in_token = false;
        let mut chars = raw.chars();

        while let Some(c) = chars.next() {
            match c {
                c if c.is_whitespace() => {
                    if in_token {
                        tokens.push(std::mem::take(&mut current));
                        in_token = false;
                    }
                }
                '\'' => {
                    in_token = true;
                    loop {
                        match chars.next() {
                            Some('\'') => break,
                            Some(ch) => current.push(ch),
                            None => return Err(err("unterminated single quote".to_owned())),
                        }
                    }
                }
                '"' => {
                    in_token = true;
                    loop {
                        match chars.next() {
                            Some('"') => break,
                            Some('\\') => match chars.next() {
                                Some(ch @ ('"' | '\\')) => current.push(ch),
                                Some(ch) => {
                                    current.push('\\');
                                    current.push(ch);
                                }
                                None => {
                                    return Err(err("unterminated double quote".to_owned()));
                                }
                            },
                            Some(ch) => current.push(ch),
                            None => return Err(err("unterminated double quote".to_owned())),
                        }
                    }
                }
                '\\' => match chars.next() {
                    Some(ch) => {
                        in_token = true;
                        current.push(ch);
                    }
                    None => return Err(err("trailing backslash".to_owned())),
                },
                c if SHELL_OPERATORS.contains(&c) => {
                    return Err(err(format!(
                        "shell operator '{c}' is not supported; commands run without a shell"
                    )));
                }
                c => {
                    in_token = true;
                    current.push(c);
                }
            }
        }
        if in_token {
            tokens.push(current);
        }

        if tokens.is_empty() {
            return Err(err("empty command".to_owned()));
        }

        Ok(Self {
            raw: raw.to_owned(),
            tokens,
        })
    }

    /// 원본 명령 문자열
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// 치환 전 토큰
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// 자리표시자를 치환해 실행 가능한 호출을 만듭니다.
    pub fn render(&self, ctx: &TemplateContext) -> Invocation {
        let mut tokens = self.tokens.iter().map(|t| ctx.substitute(t));
        // parse가 최소 한 개의 토큰을 보장함
        let program = tokens.next().unwrap_or_default();
        Invocation::new(program).args(tokens)
    }

    /// `kubectl ... apply` 형태의 리소스 적용 명령인지 여부
    pub fn is_resource_apply(&self) -> bool {
        self.tokens
            .iter()
            .position(|t| {
                std::path::Path::new(t)
                    .file_name()
                    .is_some_and(|name| name == "kubectl")
            })
            .is_some_and(|idx| self.tokens[idx + 1..].iter().any(|t| t == "apply"))
    }

    /// 검증기 호출을 포함하는지 여부 (`verify`가 들어간 토큰)
    pub fn is_verification(&self) -> bool {
        self.tokens.iter().any(|t| t.contains("verify"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> TemplateContext {
        TemplateContext {
            namespace: "tf-k8s-tf-sec-1-sbom".to_owned(),
            scenario_id: "TF-SEC-1_SBOM".to_owned(),
            scenario_dir: "/scenarios/enabled/TF-SEC-1_SBOM".to_owned(),
        }
    }

    #[test]
    fn splits_on_whitespace() {
        let t = CommandTemplate::parse("kubectl  get pods\t-n {namespace}").unwrap();
        assert_eq!(t.tokens(), ["kubectl", "get", "pods", "-n", "{namespace}"]);
    }

    #[test]
    fn render_substitutes_placeholders_in_every_token() {
        let t = CommandTemplate::parse(
            "python3 {scenario_dir}/verify_hashing.py --label=ns:{namespace} {scenario_id}",
        )
        .unwrap();
        let inv = t.render(&ctx());
        assert_eq!(inv.program, "python3");
        assert_eq!(
            inv.args,
            [
                "/scenarios/enabled/TF-SEC-1_SBOM/verify_hashing.py",
                "--label=ns:tf-k8s-tf-sec-1-sbom",
                "TF-SEC-1_SBOM",
            ]
        );
    }

    #[test]
    fn unknown_placeholder_is_left_verbatim() {
        let t = CommandTemplate::parse("echo {pod}").unwrap();
        assert_eq!(t.render(&ctx()).args, ["{pod}"]);
    }

    #[test]
    fn quotes_group_and_preserve_operators() {
        let t = CommandTemplate::parse(
            r#"kubectl get pods -o 'jsonpath={.items[*].metadata.name}' -l "app=edge probe" "a|b""#,
        )
        .unwrap();
        assert_eq!(
            t.tokens(),
            [
                "kubectl",
                "get",
                "pods",
                "-o",
                "jsonpath={.items[*].metadata.name}",
                "-l",
                "app=edge probe",
                "a|b",
            ]
        );
    }

    #[test]
    fn double_quote_escapes() {
        let t = CommandTemplate::parse(r#"echo "say \"hi\" \\ \n""#).unwrap();
        assert_eq!(t.tokens(), ["echo", r#"say "hi" \ \n"#]);
    }

    #[test]
    fn empty_quotes_form_a_token() {
        let t = CommandTemplate::parse("printf '' x").unwrap();
        assert_eq!(t.tokens(), ["printf", "", "x"]);
    }

    #[test]
    fn backslash_escapes_outside_quotes() {
        let t = CommandTemplate::parse(r"echo a\ b \|").unwrap();
        assert_eq!(t.tokens(), ["echo", "a b", "|"]);
    }

    #[test]
    fn rejects_shell_operators() {
        for raw in [
            "kubectl logs x | grep y",
            "kubectl logs x > out.txt",
            "sleep 1 && echo done",
            "echo a; echo b",
            "run &",
        ] {
            let err = CommandTemplate::parse(raw).unwrap_err();
            assert!(
                err.to_string().contains("shell operator"),
                "expected shell operator error for {raw}"
            );
        }
    }

    #[test]
    fn rejects_unbalanced_quotes() {
        assert!(CommandTemplate::parse("echo 'oops").is_err());
        assert!(CommandTemplate::parse("echo \"oops").is_err());
        assert!(CommandTemplate::parse("echo oops\\").is_err());
    }

    #[test]
    fn rejects_empty_command() {
        assert!(CommandTemplate::parse("").is_err());
        assert!(CommandTemplate::parse("   ").is_err());
    }

    #[test]
    fn detects_resource_apply() {
        let apply = CommandTemplate::parse("kubectl apply -f k8s/edge.yaml -n {namespace}").unwrap();
        assert!(apply.is_resource_apply());
        let flagged = CommandTemplate::parse("/usr/local/bin/kubectl -n x apply -f a.yaml").unwrap();
        assert!(flagged.is_resource_apply());
        let get = CommandTemplate::parse("kubectl get pods").unwrap();
        assert!(!get.is_resource_apply());
        let other = CommandTemplate::parse("helm apply").unwrap();
        assert!(!other.is_resource_apply());
    }

    #[test]
    fn detects_verification() {
        let t = CommandTemplate::parse("python3 verify_hashing.py metrics.txt").unwrap();
        assert!(t.is_verification());
        let t = CommandTemplate::parse("kubectl wait --for=condition=ready pod").unwrap();
        assert!(!t.is_verification());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn parse_arbitrary_input_does_not_panic(raw in ".{0,200}") {
                let _ = CommandTemplate::parse(&raw);
            }

            #[test]
            fn plain_words_round_trip(words in prop::collection::vec("[a-zA-Z0-9_./=:-]{1,12}", 1..8)) {
                let raw = words.join(" ");
                let t = CommandTemplate::parse(&raw).unwrap();
                prop_assert_eq!(t.tokens(), words.as_slice());
            }

            #[test]
            fn single_quoted_token_is_literal(body in "[^']{0,40}") {
                let raw = format!("echo '{body}'");
                let t = CommandTemplate::parse(&raw).unwrap();
                prop_assert_eq!(&t.tokens()[1], &body);
            }
        }
    }
}
