use super::payment::RecordId;
use crate::error::{Result, ScholarshipError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type StageId = u64;

/// Review roles, in approval order.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Clone, Copy, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    #[serde(alias = "FAC")]
    Supervisor,
    Hod,
    #[serde(alias = "AD")]
    AssocDean,
    Dean,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Supervisor, Role::Hod, Role::AssocDean, Role::Dean];

    pub fn code(&self) -> &'static str {
        match self {
            Role::Supervisor => "SUPERVISOR",
            Role::Hod => "HOD",
            Role::AssocDean => "ASSOC_DEAN",
            Role::Dean => "DEAN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Role {
    type Err = ScholarshipError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "SUPERVISOR" | "FAC" => Ok(Role::Supervisor),
            "HOD" => Ok(Role::Hod),
            "ASSOC_DEAN" | "AD" => Ok(Role::AssocDean),
            "DEAN" => Ok(Role::Dean),
            other => Err(ScholarshipError::InvalidInput(format!(
                "Unknown role '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Clone, Copy)]
#[serde(rename_all = "UPPERCASE")]
pub enum DecisionStatus {
    Pending,
    Accepted,
    /// Declared for completeness; no transition produces it yet.
    Rejected,
}

impl fmt::Display for DecisionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecisionStatus::Pending => f.write_str("PENDING"),
            DecisionStatus::Accepted => f.write_str("ACCEPTED"),
            DecisionStatus::Rejected => f.write_str("REJECTED"),
        }
    }
}

/// A reviewer's verdict on a pending stage.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Decision {
    Accept,
    Reject,
}

impl FromStr for Decision {
    type Err = ScholarshipError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "accept" => Ok(Decision::Accept),
            "reject" => Ok(Decision::Reject),
            other => Err(ScholarshipError::InvalidInput(format!(
                "Invalid status '{}'. Must be 'accept' or 'reject'",
                other
            ))),
        }
    }
}

/// One role's review of a payment record.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct ApprovalStage {
    pub id: StageId,
    pub record: RecordId,
    pub role: Role,
    pub status: DecisionStatus,
    pub comment: Option<String>,
}

impl ApprovalStage {
    pub fn is_pending(&self) -> bool {
        self.status == DecisionStatus::Pending
    }
}

/// A stage that has been decided on but not yet committed.
#[derive(Debug, PartialEq, Clone)]
pub struct StageSettlement {
    pub stage: StageId,
    pub role: Role,
    pub status: DecisionStatus,
    pub comment: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parsing_accepts_legacy_codes() {
        assert_eq!("FAC".parse::<Role>().unwrap(), Role::Supervisor);
        assert_eq!("AD".parse::<Role>().unwrap(), Role::AssocDean);
        assert_eq!("ASSOC_DEAN".parse::<Role>().unwrap(), Role::AssocDean);
        assert!(matches!(
            "ADMIN".parse::<Role>(),
            Err(ScholarshipError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_role_serde_codes() {
        let json = serde_json::to_string(&Role::AssocDean).unwrap();
        assert_eq!(json, "\"ASSOC_DEAN\"");
        let role: Role = serde_json::from_str("\"FAC\"").unwrap();
        assert_eq!(role, Role::Supervisor);
    }

    #[test]
    fn test_decision_parsing() {
        assert_eq!("accept".parse::<Decision>().unwrap(), Decision::Accept);
        assert_eq!("reject".parse::<Decision>().unwrap(), Decision::Reject);
        assert!(matches!(
            "approve".parse::<Decision>(),
            Err(ScholarshipError::InvalidInput(_))
        ));
    }
}
