//! The fixed approval chain, expressed as an ordered table of stage rules.

use super::people::{ActorProfile, SubjectProfile};
use super::stage::Role;

/// How a reviewer must be related to the subject to act on a stage.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Relationship {
    /// The reviewer is the subject's recorded supervisor.
    Supervises,
    SameDepartment,
    SameUniversity,
}

impl Relationship {
    pub fn holds(&self, actor: &ActorProfile, subject: &SubjectProfile) -> bool {
        match self {
            Relationship::Supervises => subject.supervisor == Some(actor.id),
            Relationship::SameDepartment => {
                actor.department.is_some() && actor.department == subject.department
            }
            Relationship::SameUniversity => actor.university == subject.university,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct StageRule {
    pub role: Role,
    /// `None` marks the terminal stage.
    pub next: Option<Role>,
    pub relationship: Relationship,
}

#[derive(Debug, Clone)]
pub struct ApprovalChain {
    rules: Vec<StageRule>,
}

impl Default for ApprovalChain {
    fn default() -> Self {
        Self::standard()
    }
}

impl ApprovalChain {
    /// SUPERVISOR -> HOD -> ASSOC_DEAN -> DEAN.
    pub fn standard() -> Self {
        let relationships = [
            Relationship::Supervises,
            Relationship::SameDepartment,
            Relationship::SameUniversity,
            Relationship::SameUniversity,
        ];
        let rules = Role::ALL
            .iter()
            .zip(relationships)
            .enumerate()
            .map(|(i, (&role, relationship))| StageRule {
                role,
                next: Role::ALL.get(i + 1).copied(),
                relationship,
            })
            .collect();
        Self { rules }
    }

    pub fn first(&self) -> Role {
        self.rules[0].role
    }

    pub fn rule(&self, role: Role) -> Option<&StageRule> {
        self.rules.iter().find(|rule| rule.role == role)
    }

    pub fn is_terminal(&self, role: Role) -> bool {
        self.rule(role).is_some_and(|rule| rule.next.is_none())
    }

    pub fn roles(&self) -> impl Iterator<Item = Role> + '_ {
        self.rules.iter().map(|rule| rule.role)
    }
}
