use crate::domain::chain::ApprovalChain;
use crate::domain::payment::{NewPaymentRecord, PaymentRecord, RecordId};
use crate::domain::people::{ActorId, ActorProfile, SubjectId, SubjectProfile};
use crate::domain::period::Period;
use crate::domain::ports::{Changeset, Directory, ScholarshipStore};
use crate::domain::stage::{ApprovalStage, DecisionStatus, Role, StageId};
use crate::error::{Result, ScholarshipError};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct Ledger {
    records: BTreeMap<RecordId, PaymentRecord>,
    stages: BTreeMap<StageId, ApprovalStage>,
    last_record_id: RecordId,
    last_stage_id: StageId,
}

impl Ledger {
    fn stage_exists(&self, record: RecordId, role: Role, status: DecisionStatus) -> bool {
        self.stages
            .values()
            .any(|s| s.record == record && s.role == role && s.status == status)
    }
}

/// A thread-safe in-memory store for payment records and their stages.
///
/// Records and stages sit behind one `RwLock`, so a commit holds the write
/// lock for its whole check-and-apply and concurrent commits serialize.
#[derive(Default, Clone)]
pub struct InMemoryStore {
    ledger: Arc<RwLock<Ledger>>,
}

impl InMemoryStore {
    /// Creates a new, empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ScholarshipStore for InMemoryStore {
    async fn insert(&self, record: NewPaymentRecord) -> Result<PaymentRecord> {
        let mut ledger = self.ledger.write().await;
        ledger.last_record_id += 1;
        let record = record.with_id(ledger.last_record_id);
        ledger.records.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get(&self, id: RecordId) -> Result<Option<PaymentRecord>> {
        let ledger = self.ledger.read().await;
        Ok(ledger.records.get(&id).cloned())
    }

    async fn find_for_period(
        &self,
        subject: SubjectId,
        period: Period,
    ) -> Result<Option<PaymentRecord>> {
        let ledger = self.ledger.read().await;
        Ok(ledger
            .records
            .values()
            .find(|r| r.subject == subject && r.period == period)
            .cloned())
    }

    async fn get_all(&self) -> Result<Vec<PaymentRecord>> {
        let ledger = self.ledger.read().await;
        Ok(ledger.records.values().cloned().collect())
    }

    async fn stages(&self, record: RecordId) -> Result<Vec<ApprovalStage>> {
        let ledger = self.ledger.read().await;
        Ok(ledger
            .stages
            .values()
            .filter(|s| s.record == record)
            .cloned()
            .collect())
    }

    async fn commit(&self, changes: Changeset) -> Result<()> {
        let mut ledger = self.ledger.write().await;
        let record_id = changes.record.id;
        let Some(stored) = ledger.records.get(&record_id) else {
            return Err(ScholarshipError::NotFound(format!(
                "Payment record {}",
                record_id
            )));
        };

        // Validate everything before touching the ledger.
        if changes.releases && stored.released {
            return Err(ScholarshipError::AlreadyReleasedOrNotPending(record_id));
        }
        if let Some(settle) = &changes.settle {
            let current = ledger
                .stages
                .get(&settle.stage)
                .filter(|s| s.record == record_id && s.is_pending());
            if current.is_none() {
                return Err(ScholarshipError::NoPendingStage {
                    record: record_id,
                    role: settle.role.to_string(),
                });
            }
            if ledger.stage_exists(record_id, settle.role, settle.status) {
                return Err(ScholarshipError::DuplicateStage {
                    record: record_id,
                    role: settle.role,
                    status: settle.status,
                });
            }
        }
        if let Some(role) = changes.open {
            if ledger.stage_exists(record_id, role, DecisionStatus::Pending) {
                return Err(ScholarshipError::DuplicateStage {
                    record: record_id,
                    role,
                    status: DecisionStatus::Pending,
                });
            }
        }

        if let Some(settle) = changes.settle {
            if let Some(stage) = ledger.stages.get_mut(&settle.stage) {
                stage.status = settle.status;
                stage.comment = settle.comment;
            }
        }
        if let Some(role) = changes.open {
            ledger.last_stage_id += 1;
            let id = ledger.last_stage_id;
            ledger.stages.insert(
                id,
                ApprovalStage {
                    id,
                    record: record_id,
                    role,
                    status: DecisionStatus::Pending,
                    comment: None,
                },
            );
        }
        ledger.records.insert(record_id, changes.record);
        Ok(())
    }
}

/// An in-memory people directory.
///
/// Scope resolution follows the relationship rules of the approval chain:
/// supervisees for SUPERVISOR, department members for HOD, university members
/// for ASSOC_DEAN and DEAN.
#[derive(Default, Clone)]
pub struct InMemoryDirectory {
    subjects: BTreeMap<SubjectId, SubjectProfile>,
    actors: HashMap<ActorId, ActorProfile>,
    roles: HashMap<ActorId, HashSet<String>>,
    chain: ApprovalChain,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_subject(&mut self, subject: SubjectProfile) {
        self.subjects.insert(subject.id, subject);
    }

    pub fn add_actor(&mut self, actor: ActorProfile) {
        self.actors.insert(actor.id, actor);
    }

    pub fn assign_role(&mut self, actor: ActorId, role: impl Into<String>) {
        self.roles.entry(actor).or_default().insert(role.into());
    }
}

#[async_trait]
impl Directory for InMemoryDirectory {
    async fn assigned_roles(&self, actor: ActorId) -> Result<HashSet<String>> {
        Ok(self.roles.get(&actor).cloned().unwrap_or_default())
    }

    async fn subjects_in_scope(
        &self,
        role: Role,
        actor: ActorId,
    ) -> Result<Option<HashSet<SubjectId>>> {
        let (Some(profile), Some(rule)) = (self.actors.get(&actor), self.chain.rule(role)) else {
            return Ok(None);
        };
        Ok(Some(
            self.subjects
                .values()
                .filter(|subject| rule.relationship.holds(profile, subject))
                .map(|subject| subject.id)
                .collect(),
        ))
    }

    async fn subject(&self, id: SubjectId) -> Result<Option<SubjectProfile>> {
        Ok(self.subjects.get(&id).cloned())
    }

    async fn actor(&self, id: ActorId) -> Result<Option<ActorProfile>> {
        Ok(self.actors.get(&id).cloned())
    }

    async fn subjects(&self) -> Result<Vec<SubjectProfile>> {
        Ok(self.subjects.values().cloned().collect())
    }
}
