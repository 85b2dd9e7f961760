use crate::domain::stage::Role;
use crate::error::{Result, ScholarshipError};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

pub const DEFAULT_ELIGIBLE_CATEGORY: &str = "INST_FEL";

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct College {
    pub departments: BTreeMap<String, String>,
    pub roles: BTreeMap<String, String>,
    #[serde(rename = "university")]
    pub universities: BTreeMap<String, String>,
}

/// Institution-wide vocabulary, loaded once at startup.
///
/// Constructed only through [`WorkflowConfig::from_json`] or
/// [`WorkflowConfig::load`], both of which validate the content.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct WorkflowConfig {
    college: College,
    status: BTreeMap<String, String>,
    admission_category: BTreeMap<String, String>,
    #[serde(default = "default_eligible_category")]
    eligible_category: String,
}

fn default_eligible_category() -> String {
    DEFAULT_ELIGIBLE_CATEGORY.to_string()
}

impl WorkflowConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ScholarshipError::Config(format!("Cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Err(ScholarshipError::Config(
                "Configuration is empty".to_string(),
            ));
        }
        let config: Self = serde_json::from_str(raw)
            .map_err(|e| ScholarshipError::Config(format!("Malformed configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let missing: Vec<&str> = Role::ALL
            .iter()
            .map(Role::code)
            .filter(|code| !self.college.roles.contains_key(*code))
            .collect();
        if !missing.is_empty() {
            return Err(ScholarshipError::Config(format!(
                "Role vocabulary is missing workflow roles: {}",
                missing.join(", ")
            )));
        }
        if self.college.departments.is_empty() {
            return Err(ScholarshipError::Config("No departments configured".to_string()));
        }
        if self.college.universities.is_empty() {
            return Err(ScholarshipError::Config("No universities configured".to_string()));
        }
        if self.status.is_empty() {
            return Err(ScholarshipError::Config("No statuses configured".to_string()));
        }
        if !self.admission_category.contains_key(&self.eligible_category) {
            return Err(ScholarshipError::Config(format!(
                "Eligible category '{}' is not an admission category",
                self.eligible_category
            )));
        }
        Ok(())
    }

    pub fn valid_roles(&self) -> impl Iterator<Item = &str> {
        self.college.roles.keys().map(String::as_str)
    }

    pub fn is_valid_role(&self, role: &str) -> bool {
        self.college.roles.contains_key(role)
    }

    pub fn eligible_category(&self) -> &str {
        &self.eligible_category
    }

    pub fn has_department(&self, code: &str) -> bool {
        self.college.departments.contains_key(code)
    }

    pub fn has_university(&self, code: &str) -> bool {
        self.college.universities.contains_key(code)
    }

    pub fn has_admission_category(&self, code: &str) -> bool {
        self.admission_category.contains_key(code)
    }
}
