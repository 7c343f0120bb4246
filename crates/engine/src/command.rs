//! External command abstraction for testability.
//!
//! The [`CommandRunner`] trait abstracts process execution, allowing production
//! code to use [`ProcessRunner`] while tests use `MockCommandRunner`.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐   ┌──────────────┐
//! │ NamespaceManager │   │ StepExecutor │
//! └────────┬─────────┘   └──────┬───────┘
//!          └────────┬───────────┘
//!                   ▼
//!           ┌──────────────┐
//!           │CommandRunner │ (trait)
//!           └──────────────┘
//!              │        │
//!              ▼        ▼
//!        ┌─────────┐ ┌──────┐
//!        │ Process │ │ Mock │
//!        └────┬────┘ └──────┘
//!             ▼
//!     kubectl / verifier / ...
//! ```
//!
//! Every invocation is an argument vector. No shell is involved, so quoting and
//! injection hazards of string commands do not apply.

use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::process::Stdio;

use crate::error::EngineError;

/// A single structured process invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Program to execute (looked up on `PATH` when not absolute).
    pub program: String,
    /// Arguments, passed verbatim.
    pub args: Vec<String>,
    /// Working directory; inherits the runner's when `None`.
    pub cwd: Option<PathBuf>,
}

impl Invocation {
    /// Creates an invocation with no arguments.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
        }
    }

    /// Appends one argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Sets the working directory.
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Human-readable command line, quoting arguments that contain whitespace.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .map(|part| {
                if part.is_empty() || part.chars().any(char::is_whitespace) {
                    format!("'{part}'")
                } else {
                    part.to_owned()
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command_line())
    }
}

/// Captured result of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code; `None` when the process was terminated by a signal.
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Successful output with the given stdout.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            status: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Failed output with the given exit code and stderr.
    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            status: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Whether the process exited with status 0.
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    /// stdout followed by stderr.
    pub fn combined(&self) -> String {
        match (self.stdout.is_empty(), self.stderr.is_empty()) {
            (_, true) => self.stdout.clone(),
            (true, false) => self.stderr.clone(),
            (false, false) => {
                let sep = if self.stdout.ends_with('\n') { "" } else { "\n" };
                format!("{}{sep}{}", self.stdout, self.stderr)
            }
        }
    }

    /// Short status description for error messages.
    pub fn status_text(&self) -> String {
        match self.status {
            Some(code) => format!("exit status {code}"),
            None => "terminated by signal".to_owned(),
        }
    }
}

/// Trait abstracting process execution.
///
/// A non-zero exit is reported through [`CommandOutput::status`], not as an
/// error. `Err` is reserved for failures to run the process at all.
pub trait CommandRunner: Send + Sync + 'static {
    /// Runs the invocation to completion and captures its output.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Spawn` if the process cannot be started or awaited.
    fn run(
        &self,
        invocation: &Invocation,
    ) -> impl Future<Output = Result<CommandOutput, EngineError>> + Send;
}

/// Production runner backed by `tokio::process`.
///
/// stdin is closed. The child is killed if the returned future is dropped,
/// so an outer `tokio::time::timeout` also terminates the process.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

impl CommandRunner for ProcessRunner {
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput, EngineError> {
        let mut cmd = tokio::process::Command::new(&invocation.program);
        cmd.args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(ref dir) = invocation.cwd {
            cmd.current_dir(dir);
        }

        let output = cmd.output().await.map_err(|e| EngineError::Spawn {
            program: invocation.program.clone(),
            reason: e.to_string(),
        })?;

        Ok(CommandOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// 테스트용 Mock 명령 실행기
///
/// 명령줄에 특정 문자열이 포함되면 미리 정한 응답을 돌려주고,
/// 모든 호출을 기록합니다. 규칙에 걸리지 않는 호출은 빈 출력으로 성공합니다.
#[cfg(test)]
#[derive(Default)]
pub struct MockCommandRunner {
    rules: Vec<(String, MockResponse)>,
    calls: std::sync::Mutex<Vec<Invocation>>,
}

#[cfg(test)]
#[derive(Clone)]
enum MockResponse {
    Output(CommandOutput),
    SpawnError,
    Hang,
}

#[cfg(test)]
impl MockCommandRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// `pattern`을 포함하는 호출이 `stdout`을 출력하고 성공하도록 합니다.
    pub fn respond(mut self, pattern: &str, stdout: &str) -> Self {
        self.rules
            .push((pattern.to_owned(), MockResponse::Output(CommandOutput::ok(stdout))));
        self
    }

    /// `pattern`을 포함하는 호출이 종료 코드 1로 실패하도록 합니다.
    pub fn fail(mut self, pattern: &str) -> Self {
        self.rules.push((
            pattern.to_owned(),
            MockResponse::Output(CommandOutput::failed(1, "mock failure")),
        ));
        self
    }

    /// `pattern`을 포함하는 호출이 실행 불가 에러를 내도록 합니다.
    pub fn spawn_error(mut self, pattern: &str) -> Self {
        self.rules.push((pattern.to_owned(), MockResponse::SpawnError));
        self
    }

    /// `pattern`을 포함하는 호출이 끝나지 않도록 합니다.
    pub fn hang(mut self, pattern: &str) -> Self {
        self.rules.push((pattern.to_owned(), MockResponse::Hang));
        self
    }

    /// 기록된 호출 목록
    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// 기록된 호출의 명령줄 목록
    pub fn command_lines(&self) -> Vec<String> {
        self.calls().iter().map(Invocation::command_line).collect()
    }
}

#[cfg(test)]
impl CommandRunner for MockCommandRunner {
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput, EngineError> {
        let line = invocation.command_line();
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(invocation.clone());
        }
        let response = self
            .rules
            .iter()
            .find(|(pattern, _)| line.contains(pattern.as_str()))
            .map(|(_, r)| r.clone());

        match response {
            None => Ok(CommandOutput::ok("")),
            Some(MockResponse::Output(output)) => Ok(output),
            Some(MockResponse::SpawnError) => Err(EngineError::Spawn {
                program: invocation.program.clone(),
                reason: "mock spawn failure".to_owned(),
            }),
            Some(MockResponse::Hang) => {
                tokio::time::sleep(std::time::Duration::from_secs(24 * 3600)).await;
                Ok(CommandOutput::ok(""))
            }
        }
    }
}
