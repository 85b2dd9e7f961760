//! Application layer containing the workflow orchestration.
//!
//! `PaymentRecordManager` owns record creation and release, `ApprovalStageEngine`
//! drives released records through the review chain, and `RecordQueries`
//! serves read-only listings. All three share the same store, directory and
//! configuration handles.

pub mod approvals;
pub mod payments;
pub mod queries;
