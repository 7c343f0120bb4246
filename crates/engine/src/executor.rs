//! 단계 실행기 — 시나리오 단계를 순서대로 실행
//!
//! # 상태 전이
//!
//! ```text
//! 단계:      Pending -> Running -> Succeeded
//!                              \-> Failed
//! 시나리오:  Running -> Completed
//!                   \-> Aborted   (critical 단계 실패)
//! ```
//!
//! - 단계 안의 명령은 순서대로 하나씩 실행되며, 명령이 실패하면 에러 표시를
//!   출력에 추가하고 그 단계의 나머지 명령은 실행하지 않습니다.
//! - critical 단계가 실패하면 이후 단계는 실행하지 않으며 결과 목록에도
//!   나타나지 않습니다. non-critical 단계가 실패하면 이후 단계는 계속
//!   실행하지만 시나리오 결과는 실패입니다.
//! - 단계 명령에는 시간 제한이 없습니다.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use tfk8s_core::metrics as m;
use tfk8s_core::types::{ScenarioDefinition, Step, StepResult};
use tracing::{error, info, warn};

use crate::command::CommandRunner;
use crate::template::{CommandTemplate, TemplateContext};

/// 단계 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepState {
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl fmt::Display for StepState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Running => write!(f, "running"),
            Self::Succeeded => write!(f, "succeeded"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// 시나리오 수준 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioState {
    Running,
    Completed,
    /// critical 단계 실패로 중단됨
    Aborted,
}

impl fmt::Display for ScenarioState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
            Self::Aborted => write!(f, "aborted"),
        }
    }
}

/// 단계 실행 결과 묶음
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionOutcome {
    /// 실행된 단계의 결과 (실행 순서)
    pub steps: Vec<StepResult>,
    /// 실행된 모든 단계가 성공했는지 여부 (critical 여부와 무관)
    pub success: bool,
    /// critical 단계 실패로 중단되었는지 여부
    pub aborted: bool,
}

impl ExecutionOutcome {
    /// 최종 시나리오 상태
    pub fn state(&self) -> ScenarioState {
        if self.aborted {
            ScenarioState::Aborted
        } else {
            ScenarioState::Completed
        }
    }
}

/// 단계 실행기
pub struct StepExecutor<R: CommandRunner> {
    runner: Arc<R>,
}

impl<R: CommandRunner> StepExecutor<R> {
    pub fn new(runner: Arc<R>) -> Self {
        Self { runner }
    }

    /// 시나리오의 모든 단계를 `namespace`에서 실행합니다.
    pub async fn execute(
        &self,
        definition: &ScenarioDefinition,
        namespace: &str,
    ) -> ExecutionOutcome {
        let ctx = TemplateContext {
            namespace: namespace.to_owned(),
            scenario_id: definition.id().to_owned(),
            scenario_dir: definition.base_dir().display().to_string(),
        };

        let mut steps = Vec::with_capacity(definition.steps.len());
        let mut state = ScenarioState::Running;
        let mut success = true;

        for step in &definition.steps {
            let result = self.run_step(step, &ctx).await;

            if !result.success {
                metrics::counter!(m::STEPS_FAILED_TOTAL).increment(1);
                success = false;
                if step.critical {
                    state = ScenarioState::Aborted;
                }
            }
            steps.push(result);

            if state == ScenarioState::Aborted {
                error!(
                    scenario_id = %definition.id(),
                    step = %step.name,
                    remaining = definition.steps.len() - steps.len(),
                    "critical step failed, aborting scenario"
                );
                metrics::counter!(m::SCENARIOS_ABORTED_TOTAL).increment(1);
                break;
            }
        }

        if state == ScenarioState::Running {
            state = ScenarioState::Completed;
        }
        info!(
            scenario_id = %definition.id(),
            namespace,
            state = %state,
            executed = steps.len(),
            success,
            "step execution finished"
        );

        ExecutionOutcome {
            steps,
            success,
            aborted: state == ScenarioState::Aborted,
        }
    }

    /// 단일 단계를 실행합니다. 첫 번째 실패한 명령에서 멈춥니다.
    async fn run_step(&self, step: &Step, ctx: &TemplateContext) -> StepResult {
        let started = Instant::now();
        let mut state = StepState::Pending;
        let mut output = Vec::with_capacity(step.commands.len());

        info!(step = %step.name, critical = step.critical, "executing step");
        state = transition(state, StepState::Running);

        for raw in &step.commands {
            match self.run_command(raw, ctx).await {
                Ok(chunk) => output.push(chunk),
                Err(marker) => {
                    output.push(marker);
                    state = transition(state, StepState::Failed);
                    break;
                }
            }
        }
        if state == StepState::Running {
            state = transition(state, StepState::Succeeded);
        }

        metrics::histogram!(m::STEP_DURATION_SECONDS).record(started.elapsed().as_secs_f64());

        if state == StepState::Failed {
            warn!(step = %step.name, critical = step.critical, "step failed");
        } else {
            info!(step = %step.name, "step succeeded");
        }

        StepResult {
            name: step.name.clone(),
            success: state == StepState::Succeeded,
            critical: step.critical,
            output,
        }
    }

    /// 명령 하나를 실행합니다.
    ///
    /// 성공하면 출력(stdout 뒤에 stderr)을, 실패하면 에러 표시 문자열을 돌려줍니다.
    async fn run_command(&self, raw: &str, ctx: &TemplateContext) -> Result<String, String> {
        let template = CommandTemplate::parse(raw).map_err(|e| format!("ERROR: {e}"))?;
        let invocation = template.render(ctx);
        info!(command = %invocation, "running command");

        let output = self
            .runner
            .run(&invocation)
            .await
            .map_err(|e| format!("ERROR: {e}"))?;

        if output.success() {
            Ok(output.combined())
        } else {
            warn!(command = %invocation, status = %output.status_text(), "command failed");
            Err(format!(
                "ERROR: command `{invocation}` failed ({}): {}",
                output.status_text(),
                output.combined().trim_end()
            ))
        }
    }
}

/// 단계 상태를 전이합니다. 허용되지 않는 전이는 현재 상태를 유지합니다.
fn transition(from: StepState, to: StepState) -> StepState {
    match (from, to) {
        (StepState::Pending, StepState::Running)
        | (StepState::Running, StepState::Succeeded)
        | (StepState::Running, StepState::Failed) => to,
        _ => {
            tracing::debug!(from = %from, to = %to, "ignored invalid step transition");
            from
        }
    }
}
