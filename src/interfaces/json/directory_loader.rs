use crate::config::WorkflowConfig;
use crate::domain::people::{ActorId, ActorProfile, ResearchCategory, SubjectId, SubjectProfile};
use crate::domain::stage::Role;
use crate::error::{Result, ScholarshipError};
use crate::infrastructure::in_memory::InMemoryDirectory;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;
use std::str::FromStr;

#[derive(Debug, Deserialize)]
struct SubjectEntry {
    id: SubjectId,
    name: String,
    department: Option<String>,
    university: String,
    supervisor: Option<ActorId>,
    admission_category: String,
    #[serde(default)]
    research_category: ResearchCategory,
    basic: Option<Decimal>,
    hra: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
struct ActorEntry {
    id: ActorId,
    name: String,
    department: Option<String>,
    university: String,
    #[serde(default)]
    roles: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct DirectoryFile {
    #[serde(default)]
    subjects: Vec<SubjectEntry>,
    #[serde(default)]
    actors: Vec<ActorEntry>,
}

/// Builds an [`InMemoryDirectory`] from a JSON document of subjects and actors.
///
/// Codes are checked against the institution vocabulary. Short role aliases
/// such as `FAC` are stored under their canonical code.
pub struct DirectoryLoader<'a> {
    config: &'a WorkflowConfig,
}

impl<'a> DirectoryLoader<'a> {
    pub fn new(config: &'a WorkflowConfig) -> Self {
        Self { config }
    }

    pub fn load<R: Read>(&self, source: R) -> Result<InMemoryDirectory> {
        let file: DirectoryFile = serde_json::from_reader(source)?;
        let mut directory = InMemoryDirectory::new();

        for entry in file.actors {
            self.check_affiliation(entry.department.as_deref(), &entry.university)?;
            for role in entry.roles {
                let role = Role::from_str(&role)
                    .map(|r| r.code().to_string())
                    .unwrap_or(role);
                if !self.config.is_valid_role(&role) {
                    return Err(ScholarshipError::InvalidInput(format!(
                        "Actor {} has unknown role '{}'",
                        entry.id, role
                    )));
                }
                directory.assign_role(entry.id, role);
            }
            directory.add_actor(ActorProfile {
                id: entry.id,
                name: entry.name,
                department: entry.department,
                university: entry.university,
            });
        }

        for entry in file.subjects {
            self.check_affiliation(entry.department.as_deref(), &entry.university)?;
            if !self.config.has_admission_category(&entry.admission_category) {
                return Err(ScholarshipError::InvalidInput(format!(
                    "Subject {} has unknown admission category '{}'",
                    entry.id, entry.admission_category
                )));
            }
            directory.add_subject(SubjectProfile::enrol(
                entry.id,
                entry.name,
                entry.department,
                entry.university,
                entry.supervisor,
                entry.admission_category,
                self.config.eligible_category(),
                entry.research_category,
                entry.basic,
                entry.hra,
            ));
        }

        Ok(directory)
    }

    fn check_affiliation(&self, department: Option<&str>, university: &str) -> Result<()> {
        if let Some(department) = department
            && !self.config.has_department(department)
        {
            return Err(ScholarshipError::InvalidInput(format!(
                "Unknown department '{}'",
                department
            )));
        }
        if !self.config.has_university(university) {
            return Err(ScholarshipError::InvalidInput(format!(
                "Unknown university '{}'",
                university
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::Directory;
    use rust_decimal_macros::dec;

    fn config() -> WorkflowConfig {
        WorkflowConfig::from_json(
            r#"{
                "college": {
                    "departments": {"CSE": "Computer Science", "ME": "Mechanical"},
                    "roles": {"SUPERVISOR": "Supervisor", "HOD": "Head", "ASSOC_DEAN": "Associate Dean", "DEAN": "Dean"},
                    "university": {"NITA": "NIT Agartala"}
                },
                "status": {"PENDING": "Pending", "APPROVED": "Approved"},
                "admission_category": {"INST_FEL": "Institute Fellowship", "SELF": "Self Financed"}
            }"#,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_load_directory() {
        let config = config();
        let raw = r#"{
            "actors": [
                {"id": 10, "name": "Dr. Rao", "department": "CSE", "university": "NITA", "roles": ["FAC", "HOD"]}
            ],
            "subjects": [
                {"id": 1, "name": "Asha", "department": "CSE", "university": "NITA", "supervisor": 10, "admission_category": "INST_FEL"},
                {"id": 2, "name": "Bimal", "department": "CSE", "university": "NITA", "supervisor": 10, "admission_category": "INST_FEL", "research_category": "SRF"},
                {"id": 3, "name": "Chitra", "department": "ME", "university": "NITA", "admission_category": "SELF"}
            ]
        }"#;
        let directory = DirectoryLoader::new(&config).load(raw.as_bytes()).unwrap();

        let roles = directory.assigned_roles(10).await.unwrap();
        assert!(roles.contains("SUPERVISOR"));
        assert!(roles.contains("HOD"));

        let asha = directory.subject(1).await.unwrap().unwrap();
        assert_eq!(asha.basic, dec!(37000));
        assert_eq!(asha.hra, dec!(0.18));
        let bimal = directory.subject(2).await.unwrap().unwrap();
        assert_eq!(bimal.basic, dec!(42000));
        let chitra = directory.subject(3).await.unwrap().unwrap();
        assert_eq!(chitra.basic, Decimal::ZERO);

        let supervised = directory
            .subjects_in_scope(Role::Supervisor, 10)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(supervised.len(), 2);
    }

    #[test]
    fn test_unknown_codes_are_rejected() {
        let config = config();
        let loader = DirectoryLoader::new(&config);

        let bad_department = r#"{"actors": [{"id": 1, "name": "X", "department": "EEE", "university": "NITA"}]}"#;
        assert!(matches!(
            loader.load(bad_department.as_bytes()),
            Err(ScholarshipError::InvalidInput(_))
        ));

        let bad_role = r#"{"actors": [{"id": 1, "name": "X", "university": "NITA", "roles": ["REGISTRAR"]}]}"#;
        assert!(matches!(
            loader.load(bad_role.as_bytes()),
            Err(ScholarshipError::InvalidInput(_))
        ));

        let bad_category = r#"{"subjects": [{"id": 1, "name": "X", "university": "NITA", "admission_category": "GATE"}]}"#;
        assert!(matches!(
            loader.load(bad_category.as_bytes()),
            Err(ScholarshipError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_malformed_json() {
        let config = config();
        assert!(matches!(
            DirectoryLoader::new(&config).load("{".as_bytes()),
            Err(ScholarshipError::Json(_))
        ));
    }
}
