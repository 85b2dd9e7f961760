use crate::config::WorkflowConfig;
use crate::domain::chain::ApprovalChain;
use crate::domain::payment::{NewPaymentRecord, PaymentRecord, RecordId};
use crate::domain::people::SubjectId;
use crate::domain::period::Period;
use crate::domain::ports::{Changeset, DirectoryHandle, StoreHandle};
use crate::error::{Result, ScholarshipError};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Counts from opening a pay period for every subject in the directory.
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
pub struct PeriodSummary {
    pub created: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Owns the monthly payment record: eligibility, pay computation and release.
pub struct PaymentRecordManager {
    store: StoreHandle,
    directory: DirectoryHandle,
    config: Arc<WorkflowConfig>,
    chain: ApprovalChain,
}

impl PaymentRecordManager {
    pub fn new(store: StoreHandle, directory: DirectoryHandle, config: Arc<WorkflowConfig>) -> Self {
        Self {
            store,
            directory,
            config,
            chain: ApprovalChain::standard(),
        }
    }

    /// Creates a record for a subject's month.
    ///
    /// Does not check for an existing record in the same period; callers that
    /// need one record per period go through [`Self::open_period`].
    pub async fn create(
        &self,
        subject: SubjectId,
        period: Period,
        days: Option<u32>,
    ) -> Result<PaymentRecord> {
        let profile = self
            .directory
            .subject(subject)
            .await?
            .ok_or_else(|| ScholarshipError::NotFound(format!("Subject {}", subject)))?;
        if !profile.is_eligible(self.config.eligible_category()) {
            return Err(ScholarshipError::IneligibleSubject(subject));
        }

        let draft = NewPaymentRecord::compute(subject, period, profile.basic, profile.hra, days)?;
        let record = self.store.insert(draft).await?;
        info!(
            record = record.id,
            subject,
            period = %period,
            total_pay = %record.total_pay,
            "Payment record created"
        );
        Ok(record)
    }

    /// Creates the period's record for every subject that lacks one.
    ///
    /// Individual failures (such as ineligible subjects) are counted and logged
    /// rather than aborting the run.
    pub async fn open_period(&self, period: Period) -> Result<PeriodSummary> {
        let mut summary = PeriodSummary::default();
        for subject in self.directory.subjects().await? {
            if self.store.find_for_period(subject.id, period).await?.is_some() {
                debug!(subject = subject.id, period = %period, "Payment record already exists");
                summary.skipped += 1;
                continue;
            }
            match self.create(subject.id, period, None).await {
                Ok(_) => summary.created += 1,
                Err(e) => {
                    warn!(subject = subject.id, period = %period, "Cannot create payment record: {}", e);
                    summary.failed += 1;
                }
            }
        }
        info!(
            period = %period,
            created = summary.created,
            skipped = summary.skipped,
            failed = summary.failed,
            "Pay period opened"
        );
        Ok(summary)
    }

    pub async fn get(&self, id: RecordId) -> Result<PaymentRecord> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| ScholarshipError::NotFound(format!("Payment record {}", id)))
    }

    /// Opens the record for review and creates its first stage in one commit.
    pub async fn release(&self, id: RecordId, subject: SubjectId) -> Result<PaymentRecord> {
        let mut record = self.get(id).await?;
        record.release(subject)?;

        let first = self.chain.first();
        self.store
            .commit(Changeset {
                record: record.clone(),
                releases: true,
                settle: None,
                open: Some(first),
            })
            .await
            .map_err(|e| match e {
                ScholarshipError::DuplicateStage { .. } => {
                    ScholarshipError::AlreadyReleasedOrNotPending(id)
                }
                other => other,
            })?;

        info!(record = id, subject, stage = %first, "Payment record released");
        Ok(record)
    }
}
