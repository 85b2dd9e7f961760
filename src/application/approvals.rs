use crate::config::WorkflowConfig;
use crate::domain::chain::ApprovalChain;
use crate::domain::payment::{PaymentRecord, RecordId};
use crate::domain::people::ActorId;
use crate::domain::ports::{Changeset, DirectoryHandle, StoreHandle};
use crate::domain::stage::{ApprovalStage, Decision, DecisionStatus, Role, StageSettlement};
use crate::error::{Result, ScholarshipError};
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

/// Where a payment record stands in the approval chain.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum WorkflowState {
    NotReleased,
    Pending(Role),
    Approved,
}

/// Which stages `list_stages` returns.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum StageSelector {
    #[default]
    All,
    Latest,
}

impl FromStr for StageSelector {
    type Err = ScholarshipError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "all" => Ok(StageSelector::All),
            "latest" => Ok(StageSelector::Latest),
            other => Err(ScholarshipError::InvalidInput(format!(
                "Unknown filter type '{}'",
                other
            ))),
        }
    }
}

/// A reviewer's submission against a payment record.
#[derive(Debug, PartialEq, Clone)]
pub struct DecisionRequest {
    pub record: RecordId,
    /// Role code as claimed by the caller; checked against the vocabulary.
    pub role: String,
    pub actor: ActorId,
    /// `accept` or `reject`.
    pub decision: String,
    pub comment: Option<String>,
    pub deducted_days: Option<i64>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct DecisionOutcome {
    pub record: PaymentRecord,
    pub accepted: Role,
    /// The stage opened by this decision; `None` once the chain is complete.
    pub opened: Option<Role>,
}

/// Drives a released payment record through its review stages.
pub struct ApprovalStageEngine {
    store: StoreHandle,
    directory: DirectoryHandle,
    config: Arc<WorkflowConfig>,
    chain: ApprovalChain,
}

impl ApprovalStageEngine {
    pub fn new(store: StoreHandle, directory: DirectoryHandle, config: Arc<WorkflowConfig>) -> Self {
        Self {
            store,
            directory,
            config,
            chain: ApprovalChain::standard(),
        }
    }

    pub async fn list_stages(
        &self,
        record: RecordId,
        selector: StageSelector,
    ) -> Result<Vec<ApprovalStage>> {
        let mut stages = self.store.stages(record).await?;
        if stages.is_empty() {
            return Err(ScholarshipError::NotFound(format!(
                "Stages for payment record {}",
                record
            )));
        }
        stages.sort_by_key(|s| s.id);
        if selector == StageSelector::Latest {
            stages = stages.pop().into_iter().collect();
        }
        Ok(stages)
    }

    pub async fn state(&self, record: RecordId) -> Result<WorkflowState> {
        let current = self
            .store
            .get(record)
            .await?
            .ok_or_else(|| ScholarshipError::NotFound(format!("Payment record {}", record)))?;
        if current.is_approved() {
            return Ok(WorkflowState::Approved);
        }
        let stages = self.store.stages(record).await?;
        Ok(stages
            .iter()
            .filter(|s| s.is_pending())
            .max_by_key(|s| s.id)
            .map(|s| WorkflowState::Pending(s.role))
            .unwrap_or(WorkflowState::NotReleased))
    }

    /// Applies a reviewer's decision to the pending stage for the claimed role.
    ///
    /// Every check runs before anything is written; the stage update, the
    /// record update and the next stage are committed together.
    pub async fn submit_decision(&self, request: DecisionRequest) -> Result<DecisionOutcome> {
        let record = self.store.get(request.record).await?.ok_or_else(|| {
            ScholarshipError::NotFound(format!("Payment record {}", request.record))
        })?;
        if !record.released {
            return Err(ScholarshipError::NotReleased(record.id));
        }

        let assigned = self.directory.assigned_roles(request.actor).await?;
        if !self.config.is_valid_role(&request.role) || !assigned.contains(&request.role) {
            return Err(ScholarshipError::RoleNotAuthorized {
                actor: request.actor,
                role: request.role,
            });
        }

        let no_pending = || ScholarshipError::NoPendingStage {
            record: record.id,
            role: request.role.clone(),
        };
        let role = Role::from_str(&request.role).map_err(|_| no_pending())?;
        let rule = *self.chain.rule(role).ok_or_else(no_pending)?;
        let stage = self
            .store
            .stages(record.id)
            .await?
            .into_iter()
            .find(|s| s.role == role && s.is_pending())
            .ok_or_else(no_pending)?;

        if Decision::from_str(&request.decision)? == Decision::Reject {
            return Err(ScholarshipError::Unimplemented("reject decisions"));
        }

        let actor = self
            .directory
            .actor(request.actor)
            .await?
            .ok_or_else(|| ScholarshipError::NotFound(format!("Actor {}", request.actor)))?;
        let subject = self
            .directory
            .subject(record.subject)
            .await?
            .ok_or_else(|| ScholarshipError::NotFound(format!("Subject {}", record.subject)))?;
        if !rule.relationship.holds(&actor, &subject) {
            return Err(ScholarshipError::RelationshipMismatch {
                actor: actor.id,
                role,
                record: record.id,
            });
        }

        let mut updated = record.clone();
        if let Some(days) = request.deducted_days {
            updated.apply_deduction(days)?;
        }
        if rule.next.is_none() {
            updated.finalize();
        }

        self.store
            .commit(Changeset {
                record: updated.clone(),
                releases: false,
                settle: Some(StageSettlement {
                    stage: stage.id,
                    role,
                    status: DecisionStatus::Accepted,
                    comment: request.comment,
                }),
                open: rule.next,
            })
            .await?;

        info!(
            record = record.id,
            actor = actor.id,
            stage = %role,
            days = updated.days,
            total_pay = %updated.total_pay,
            "Stage accepted"
        );
        match rule.next {
            Some(next) => info!(record = record.id, stage = %next, "Next stage opened"),
            None => info!(record = record.id, "Payment record approved"),
        }

        Ok(DecisionOutcome {
            record: updated,
            accepted: role,
            opened: rule.next,
        })
    }
}
