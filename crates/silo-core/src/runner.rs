//! Pipeline Engine: explicit state machine over the four stages
//!
//! ```text
//! Planning → Retrieving → Reasoning → Auditing ─┬─► Done(Verified)
//!                             ▲                 ├─► Done(Unverified)   (budget exhausted)
//!                             └─────────────────┘   audit failed, revision_count < max
//! ```
//!
//! Only the audit-failure edge loops, and it is bounded by `max_revisions`,
//! so a run makes at most `max_revisions + 1` reasoning passes.
use crate::cancel::CancelSignal;
use crate::context::RequestContext;
use crate::data_model::{
    PipelineRequest, PipelineResponse, PipelineRun, PipelineState, StageProof, StateUpdate,
    Terminal,
};
use crate::error::{PipelineFailure, SiloError};
use crate::stage::{Auditor, Planner, Retriever, StageKind, Synthesizer};
use crate::tenant::current_tenant;
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;

const STAGE_ORDER: [StageKind; 4] = [
    StageKind::Planning,
    StageKind::Retrieving,
    StageKind::Reasoning,
    StageKind::Auditing,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Planning,
    Retrieving,
    Reasoning,
    Auditing,
    Done(Terminal),
}

/// What a stage reported back to the transition table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    Completed,
    AuditPassed,
    AuditFailed,
}

impl Phase {
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done(_))
    }

    /// Transition table. `revisions_used` is the revision count *before* the
    /// stage's update was merged.
    pub fn next(self, outcome: StageOutcome, revisions_used: u32, max_revisions: u32) -> Phase {
        match (self, outcome) {
            (Self::Planning, _) => Self::Retrieving,
            (Self::Retrieving, _) => Self::Reasoning,
            (Self::Reasoning, _) => Self::Auditing,
            (Self::Auditing, StageOutcome::AuditPassed) => Self::Done(Terminal::Verified),
            (Self::Auditing, _) if revisions_used < max_revisions => Self::Reasoning,
            (Self::Auditing, _) => Self::Done(Terminal::Unverified),
            (done @ Self::Done(_), _) => done,
        }
    }
}

pub struct PipelineEngine {
    planner: Arc<dyn Planner>,
    retriever: Arc<dyn Retriever>,
    synthesizer: Arc<dyn Synthesizer>,
    auditor: Arc<dyn Auditor>,
    pipeline_id: String,
}

impl PipelineEngine {
    pub fn new(
        planner: Arc<dyn Planner>,
        retriever: Arc<dyn Retriever>,
        synthesizer: Arc<dyn Synthesizer>,
        auditor: Arc<dyn Auditor>,
    ) -> Self {
        let pipeline_id = STAGE_ORDER
            .iter()
            .map(|s| s.id().split('.').next().unwrap_or("?"))
            .collect::<Vec<_>>()
            .join("→");

        Self {
            planner,
            retriever,
            synthesizer,
            auditor,
            pipeline_id,
        }
    }

    pub fn pipeline_id(&self) -> &str {
        &self.pipeline_id
    }

    /// Run to completion without external cancellation
    pub async fn invoke(
        &self,
        request: PipelineRequest,
        ctx: &RequestContext,
    ) -> Result<PipelineResponse, PipelineFailure> {
        self.run(request, ctx, &CancelSignal::new())
            .await
            .map(PipelineRun::into_response)
    }

    /// Run inside the caller's tenant scope. Fails with `NoActiveTenant` when
    /// no scope is bound.
    pub async fn run(
        &self,
        request: PipelineRequest,
        ctx: &RequestContext,
        cancel: &CancelSignal,
    ) -> Result<PipelineRun, PipelineFailure> {
        let tenant = current_tenant().ok_or_else(|| PipelineFailure {
            stage: StageKind::Planning,
            error: SiloError::NoActiveTenant,
            audit_log: Vec::new(),
            trace_id: ctx.trace_id.clone(),
        })?;

        let span = tracing::info_span!(
            "pipeline",
            trace_id = %ctx.trace_id,
            tenant = %tenant.tenant_id,
            pipeline = %self.pipeline_id,
        );
        self.drive(request, ctx, cancel).instrument(span).await
    }

    async fn drive(
        &self,
        request: PipelineRequest,
        ctx: &RequestContext,
        cancel: &CancelSignal,
    ) -> Result<PipelineRun, PipelineFailure> {
        let max_revisions = request.max_revisions;
        let mut state = PipelineState::new(request.query);
        let mut phase = Phase::Planning;
        let mut proofs = Vec::new();

        loop {
            let stage = match phase {
                Phase::Planning => StageKind::Planning,
                Phase::Retrieving => StageKind::Retrieving,
                Phase::Reasoning => StageKind::Reasoning,
                Phase::Auditing => StageKind::Auditing,
                Phase::Done(terminal) => {
                    tracing::info!(?terminal, revisions = state.revision_count, "pipeline finished");
                    return Ok(self.finish(ctx, terminal, state, proofs));
                }
            };

            if cancel.is_cancelled() {
                return Ok(self.cancelled(ctx, stage, state, proofs));
            }

            let start = Instant::now();
            let in_hash = state.digest();

            let step = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                result = self.execute(stage, &state, ctx, max_revisions) => Some(result),
            };

            let (update, outcome) = match step {
                None => return Ok(self.cancelled(ctx, stage, state, proofs)),
                Some(Ok(done)) => done,
                Some(Err(error)) => {
                    tracing::error!(stage = %stage, %error, "stage failed");
                    state.merge(StateUpdate::log(format!("Stage {} failed: {}", stage, error)));
                    return Err(PipelineFailure {
                        stage,
                        error,
                        audit_log: state.audit_log,
                        trace_id: ctx.trace_id.clone(),
                    });
                }
            };

            let revisions_used = state.revision_count;
            state.merge(update);

            let latency_ms = start.elapsed().as_millis() as u64;
            tracing::info!(stage = %stage, latency_ms, ?outcome, "stage completed");
            proofs.push(StageProof {
                id: stage.id().to_string(),
                in_hash,
                out_hash: state.digest(),
                latency_ms,
                verdict: match outcome {
                    StageOutcome::AuditPassed => Some("pass".to_string()),
                    StageOutcome::AuditFailed => Some("fail".to_string()),
                    StageOutcome::Completed => None,
                },
                audit_entries: state.audit_log.len(),
            });

            phase = phase.next(outcome, revisions_used, max_revisions);
        }
    }

    /// Run one stage against a read-only view of the state
    async fn execute(
        &self,
        stage: StageKind,
        state: &PipelineState,
        ctx: &RequestContext,
        max_revisions: u32,
    ) -> Result<(StateUpdate, StageOutcome), SiloError> {
        match stage {
            StageKind::Planning => {
                let plan = self.planner.plan(state.query(), ctx).await?;
                let entry = format!("Plan created: {}", plan.join(" | "));
                Ok((StateUpdate::log(entry).with_plan(plan), StageOutcome::Completed))
            }
            StageKind::Retrieving => {
                let evidence = self.retriever.gather(state.query(), ctx).await?;
                let entry = format!("Evidence gathered: {} items", evidence.len());
                Ok((StateUpdate::log(entry).with_evidence(evidence), StageOutcome::Completed))
            }
            StageKind::Reasoning => {
                let answer = self.synthesizer.synthesize(state.query(), &state.evidence).await?;
                let entry = format!("Answer drafted: pass {}", state.revision_count + 1);
                Ok((StateUpdate::log(entry).with_answer(answer), StageOutcome::Completed))
            }
            StageKind::Auditing => {
                let verdict = self.auditor.verify(&state.answer, &state.evidence);
                if verdict.passed {
                    return Ok((
                        StateUpdate::log("Audit passed: Verification successful"),
                        StageOutcome::AuditPassed,
                    ));
                }

                let update = if state.revision_count < max_revisions {
                    let revision = state.revision_count + 1;
                    StateUpdate::log(format!(
                        "Audit failed: Revision requested ({}/{}): {}",
                        revision,
                        max_revisions,
                        verdict.summary()
                    ))
                    .with_revision(revision)
                } else {
                    StateUpdate::log(format!(
                        "Audit failed: revision budget exhausted ({}), answer unverified: {}",
                        max_revisions,
                        verdict.summary()
                    ))
                };
                Ok((update, StageOutcome::AuditFailed))
            }
        }
    }

    fn cancelled(
        &self,
        ctx: &RequestContext,
        stage: StageKind,
        mut state: PipelineState,
        proofs: Vec<StageProof>,
    ) -> PipelineRun {
        tracing::warn!(stage = %stage, "pipeline cancelled");
        state.merge(StateUpdate::log(format!("Run cancelled during {}", stage)));
        self.finish(ctx, Terminal::Cancelled(stage), state, proofs)
    }

    fn finish(
        &self,
        ctx: &RequestContext,
        terminal: Terminal,
        state: PipelineState,
        proofs: Vec<StageProof>,
    ) -> PipelineRun {
        PipelineRun {
            trace_id: ctx.trace_id.clone(),
            pipeline_id: self.pipeline_id.clone(),
            terminal,
            state,
            proofs,
        }
    }
}
