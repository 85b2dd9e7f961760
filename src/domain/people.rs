use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

pub type SubjectId = u32;
pub type ActorId = u32;

/// Default monthly basic amount for a junior research fellow.
pub const DEFAULT_BASIC: Decimal = dec!(37000);
/// Basic amount for a senior research fellow.
pub const SENIOR_BASIC: Decimal = dec!(42000);
/// Default house rent allowance, as a fraction of basic.
pub const DEFAULT_HRA: Decimal = dec!(0.18);

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResearchCategory {
    #[default]
    Jrf,
    Srf,
}

/// Attributes of a scholarship subject (a student) as seen by the workflow.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct SubjectProfile {
    pub id: SubjectId,
    pub name: String,
    pub department: Option<String>,
    pub university: String,
    pub supervisor: Option<ActorId>,
    pub admission_category: String,
    pub basic: Decimal,
    pub hra: Decimal,
}

impl SubjectProfile {
    /// Builds a profile, filling in the stipend the way enrolment does:
    /// ineligible subjects carry no stipend, senior fellows always get the
    /// senior basic, and junior fellows take the given basic or the default.
    #[allow(clippy::too_many_arguments)]
    pub fn enrol(
        id: SubjectId,
        name: impl Into<String>,
        department: Option<String>,
        university: impl Into<String>,
        supervisor: Option<ActorId>,
        admission_category: impl Into<String>,
        eligible_category: &str,
        research_category: ResearchCategory,
        basic: Option<Decimal>,
        hra: Option<Decimal>,
    ) -> Self {
        let admission_category = admission_category.into();
        let (basic, hra) = if admission_category != eligible_category {
            (Decimal::ZERO, Decimal::ZERO)
        } else {
            let basic = match research_category {
                ResearchCategory::Srf => SENIOR_BASIC,
                ResearchCategory::Jrf => basic.unwrap_or(DEFAULT_BASIC),
            };
            (basic, hra.unwrap_or(DEFAULT_HRA))
        };
        Self {
            id,
            name: name.into(),
            department,
            university: university.into(),
            supervisor,
            admission_category,
            basic,
            hra,
        }
    }

    pub fn is_eligible(&self, eligible_category: &str) -> bool {
        self.admission_category == eligible_category
    }
}

/// Attributes of a reviewing actor (a faculty member).
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct ActorProfile {
    pub id: ActorId,
    pub name: String,
    pub department: Option<String>,
    pub university: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enrol(category: &str, rc: ResearchCategory, basic: Option<Decimal>) -> SubjectProfile {
        SubjectProfile::enrol(
            1,
            "Asha",
            Some("CSE".to_string()),
            "NITA",
            Some(10),
            category,
            "INST_FEL",
            rc,
            basic,
            None,
        )
    }

    #[test]
    fn test_eligible_defaults() {
        let subject = enrol("INST_FEL", ResearchCategory::Jrf, None);
        assert_eq!(subject.basic, dec!(37000));
        assert_eq!(subject.hra, dec!(0.18));
        assert!(subject.is_eligible("INST_FEL"));
    }

    #[test]
    fn test_senior_fellow_basic() {
        let subject = enrol("INST_FEL", ResearchCategory::Srf, None);
        assert_eq!(subject.basic, dec!(42000));
    }

    #[test]
    fn test_senior_fellow_basic_overrides_given_value() {
        let subject = enrol("INST_FEL", ResearchCategory::Srf, Some(dec!(40000)));
        assert_eq!(subject.basic, dec!(42000));
    }

    #[test]
    fn test_junior_fellow_keeps_given_basic() {
        let subject = enrol("INST_FEL", ResearchCategory::Jrf, Some(dec!(40000)));
        assert_eq!(subject.basic, dec!(40000));
    }

    #[test]
    fn test_ineligible_has_no_stipend() {
        let subject = enrol("SELF", ResearchCategory::Jrf, Some(dec!(40000)));
        assert_eq!(subject.basic, Decimal::ZERO);
        assert_eq!(subject.hra, Decimal::ZERO);
        assert!(!subject.is_eligible("INST_FEL"));
    }
}
