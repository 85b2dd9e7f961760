use crate::config::WorkflowConfig;
use crate::domain::payment::{ApprovalStatus, PaymentRecord, RecordId};
use crate::domain::people::{ActorId, SubjectId};
use crate::domain::period::month_from_name;
use crate::domain::ports::{DirectoryHandle, StoreHandle};
use crate::domain::stage::{DecisionStatus, Role};
use crate::error::{Result, ScholarshipError};
use std::str::FromStr;
use std::sync::Arc;

/// Narrows a record listing by state or calendar month.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum RecordFilter {
    /// Not yet released by the subject.
    Current,
    /// Released.
    Previous,
    Approved,
    Pending,
    /// Records whose stage for the queried role has been accepted.
    RoleApproved,
    /// Records waiting on the queried role.
    RolePending,
    Month(u32),
}

impl FromStr for RecordFilter {
    type Err = ScholarshipError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "current" => Ok(RecordFilter::Current),
            "previous" => Ok(RecordFilter::Previous),
            "approved" => Ok(RecordFilter::Approved),
            "pending" => Ok(RecordFilter::Pending),
            "role_approved" => Ok(RecordFilter::RoleApproved),
            "role_pending" => Ok(RecordFilter::RolePending),
            other => month_from_name(other)
                .map(RecordFilter::Month)
                .ok_or_else(|| ScholarshipError::InvalidInput(format!("Unknown type '{}'", other))),
        }
    }
}

#[derive(Debug, Default, PartialEq, Clone)]
pub struct RecordQuery {
    pub subject: Option<SubjectId>,
    /// Role code; must be paired with `actor`.
    pub role: Option<String>,
    pub actor: Option<ActorId>,
    pub filter: Option<RecordFilter>,
}

/// Read-only lookups over payment records.
pub struct RecordQueries {
    store: StoreHandle,
    directory: DirectoryHandle,
    config: Arc<WorkflowConfig>,
}

impl RecordQueries {
    pub fn new(store: StoreHandle, directory: DirectoryHandle, config: Arc<WorkflowConfig>) -> Self {
        Self {
            store,
            directory,
            config,
        }
    }

    pub async fn get(&self, id: RecordId) -> Result<PaymentRecord> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| ScholarshipError::NotFound(format!("Payment record {}", id)))
    }

    /// Records matching the query, ascending by id.
    ///
    /// A subject takes precedence over a role/actor pair. With a role/actor
    /// pair, only records of subjects in the actor's scope that have reached
    /// that role's stage are returned.
    pub async fn find(&self, query: &RecordQuery) -> Result<Vec<PaymentRecord>> {
        let all = self.store.get_all().await?;
        let mut records: Vec<PaymentRecord> = match (query.subject, &query.role, query.actor) {
            (Some(subject), _, _) => all.into_iter().filter(|r| r.subject == subject).collect(),
            (None, Some(role), Some(actor)) => self.in_review_scope(all, role, actor).await?,
            (None, None, Some(_)) => {
                return Err(ScholarshipError::InvalidInput("role parameter required".to_string()));
            }
            (None, Some(_), None) => {
                return Err(ScholarshipError::InvalidInput("actor parameter required".to_string()));
            }
            (None, None, None) => all,
        };

        if let Some(filter) = query.filter {
            records = self.apply_filter(records, filter, query.role.as_deref()).await?;
        }
        records.sort_by_key(|r| r.id);
        Ok(records)
    }

    async fn in_review_scope(
        &self,
        records: Vec<PaymentRecord>,
        role: &str,
        actor: ActorId,
    ) -> Result<Vec<PaymentRecord>> {
        let assigned = self.directory.assigned_roles(actor).await?;
        if !self.config.is_valid_role(role) || !assigned.contains(role) {
            return Err(ScholarshipError::RoleNotAuthorized {
                actor,
                role: role.to_string(),
            });
        }
        let scope_missing =
            || ScholarshipError::NotFound(format!("Review scope for actor {} as {}", actor, role));
        let chain_role = Role::from_str(role).map_err(|_| scope_missing())?;
        let scope = self
            .directory
            .subjects_in_scope(chain_role, actor)
            .await?
            .ok_or_else(scope_missing)?;

        let mut matched = Vec::new();
        for record in records.into_iter().filter(|r| scope.contains(&r.subject)) {
            let stages = self.store.stages(record.id).await?;
            if stages.iter().any(|s| s.role == chain_role) {
                matched.push(record);
            }
        }
        Ok(matched)
    }

    async fn apply_filter(
        &self,
        records: Vec<PaymentRecord>,
        filter: RecordFilter,
        role: Option<&str>,
    ) -> Result<Vec<PaymentRecord>> {
        let stage_status = match filter {
            RecordFilter::Current => return Ok(keep(records, |r| !r.released)),
            RecordFilter::Previous => return Ok(keep(records, |r| r.released)),
            RecordFilter::Approved => {
                return Ok(keep(records, |r| r.status == ApprovalStatus::Approved));
            }
            RecordFilter::Pending => {
                return Ok(keep(records, |r| r.status == ApprovalStatus::Pending));
            }
            RecordFilter::Month(month) => {
                return Ok(keep(records, |r| r.period.month() == month));
            }
            RecordFilter::RoleApproved => DecisionStatus::Accepted,
            RecordFilter::RolePending => DecisionStatus::Pending,
        };

        let role = role
            .ok_or_else(|| {
                ScholarshipError::InvalidInput("role parameter required for role filters".to_string())
            })
            .and_then(Role::from_str)?;
        let mut matched = Vec::new();
        for record in records {
            let stages = self.store.stages(record.id).await?;
            if stages.iter().any(|s| s.role == role && s.status == stage_status) {
                matched.push(record);
            }
        }
        Ok(matched)
    }
}

fn keep(records: Vec<PaymentRecord>, predicate: impl Fn(&PaymentRecord) -> bool) -> Vec<PaymentRecord> {
    records.into_iter().filter(|r| predicate(r)).collect()
}
