use crate::domain::people::{ActorId, SubjectId};
use crate::domain::payment::RecordId;
use crate::domain::stage::{DecisionStatus, Role};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScholarshipError {
    #[error("Subject {0} is not in the eligible admission category")]
    IneligibleSubject(SubjectId),
    #[error("{0} not found")]
    NotFound(String),
    #[error("Payment record {record} does not belong to subject {subject}")]
    NotOwner { record: RecordId, subject: SubjectId },
    #[error("Payment record {0} is already released or no longer pending")]
    AlreadyReleasedOrNotPending(RecordId),
    #[error("Payment record {0} has not been released yet")]
    NotReleased(RecordId),
    #[error("Actor {actor} is not authorized for role '{role}'")]
    RoleNotAuthorized { actor: ActorId, role: String },
    #[error("No pending stage for role '{role}' on payment record {record}")]
    NoPendingStage { record: RecordId, role: String },
    #[error("Actor {actor} does not hold the {role} relationship to the subject of record {record}")]
    RelationshipMismatch {
        actor: ActorId,
        role: Role,
        record: RecordId,
    },
    #[error("Invalid number of deducted days: {requested} (credited: {credited})")]
    InvalidDeduction { requested: i64, credited: u32 },
    #[error("Not implemented: {0}")]
    Unimplemented(&'static str),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Stage ({role}, {status}) already exists on payment record {record}")]
    DuplicateStage {
        record: RecordId,
        role: Role,
        status: DecisionStatus,
    },
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[cfg(feature = "storage-rocksdb")]
    #[error("Storage error: {0}")]
    Storage(#[from] rocksdb::Error),
    #[error("Internal error: {0}")]
    Internal(Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T> = std::result::Result<T, ScholarshipError>;
