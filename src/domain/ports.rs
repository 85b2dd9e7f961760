use super::payment::{NewPaymentRecord, PaymentRecord, RecordId};
use super::people::{ActorId, ActorProfile, SubjectId, SubjectProfile};
use super::period::Period;
use super::stage::{ApprovalStage, Role, StageSettlement};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;

/// Everything one workflow step writes, applied all-or-nothing.
///
/// A store must reject the whole changeset with `AlreadyReleasedOrNotPending`
/// if `releases` is set but the stored record is already released, with
/// `NoPendingStage` if `settle` names a stage that is no longer pending, and
/// with `DuplicateStage` if applying it would give the record two stages with
/// the same role and status.
#[derive(Debug, PartialEq, Clone)]
pub struct Changeset {
    pub record: PaymentRecord,
    pub releases: bool,
    pub settle: Option<StageSettlement>,
    pub open: Option<Role>,
}

#[async_trait]
pub trait ScholarshipStore: Send + Sync {
    async fn insert(&self, record: NewPaymentRecord) -> Result<PaymentRecord>;
    async fn get(&self, id: RecordId) -> Result<Option<PaymentRecord>>;
    async fn find_for_period(
        &self,
        subject: SubjectId,
        period: Period,
    ) -> Result<Option<PaymentRecord>>;
    async fn get_all(&self) -> Result<Vec<PaymentRecord>>;
    /// Stages of a record, ascending by id.
    async fn stages(&self, record: RecordId) -> Result<Vec<ApprovalStage>>;
    async fn commit(&self, changes: Changeset) -> Result<()>;
}

/// Lookups into the people directory that the workflow depends on.
#[async_trait]
pub trait Directory: Send + Sync {
    async fn assigned_roles(&self, actor: ActorId) -> Result<HashSet<String>>;
    /// `None` when the actor is unknown.
    async fn subjects_in_scope(
        &self,
        role: Role,
        actor: ActorId,
    ) -> Result<Option<HashSet<SubjectId>>>;
    async fn subject(&self, id: SubjectId) -> Result<Option<SubjectProfile>>;
    async fn actor(&self, id: ActorId) -> Result<Option<ActorProfile>>;
    async fn subjects(&self) -> Result<Vec<SubjectProfile>>;
}

pub type StoreHandle = Arc<dyn ScholarshipStore>;
pub type DirectoryHandle = Arc<dyn Directory>;
