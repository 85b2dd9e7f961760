#![allow(dead_code)]

use scholarflow::application::approvals::{ApprovalStageEngine, DecisionRequest};
use scholarflow::application::payments::PaymentRecordManager;
use scholarflow::application::queries::RecordQueries;
use scholarflow::config::WorkflowConfig;
use scholarflow::domain::ports::{DirectoryHandle, StoreHandle};
use scholarflow::interfaces::json::directory_loader::DirectoryLoader;
use std::fs::File;
use std::io::Error;
use std::path::Path;
use std::sync::Arc;

pub const CONFIG: &str = "tests/fixtures/conf.json";
pub const PEOPLE: &str = "tests/fixtures/people.json";
pub const HEADER: [&str; 11] = [
    "action",
    "record",
    "subject",
    "actor",
    "role",
    "decision",
    "deducted_days",
    "days",
    "month",
    "year",
    "comment",
];

pub struct Services {
    pub manager: PaymentRecordManager,
    pub engine: ApprovalStageEngine,
    pub queries: RecordQueries,
}

pub fn config() -> Arc<WorkflowConfig> {
    Arc::new(WorkflowConfig::load(CONFIG).expect("fixture config"))
}

pub fn directory(config: &WorkflowConfig) -> DirectoryHandle {
    let file = File::open(PEOPLE).expect("fixture directory");
    Arc::new(DirectoryLoader::new(config).load(file).expect("valid directory"))
}

/// Wires the three services around one store and the fixture directory.
pub fn services(store: StoreHandle) -> Services {
    let config = config();
    let directory = directory(&config);
    Services {
        manager: PaymentRecordManager::new(store.clone(), directory.clone(), config.clone()),
        engine: ApprovalStageEngine::new(store.clone(), directory.clone(), config.clone()),
        queries: RecordQueries::new(store, directory, config),
    }
}

pub fn accept(record: u64, role: &str, actor: u32) -> DecisionRequest {
    DecisionRequest {
        record,
        role: role.to_string(),
        actor,
        decision: "accept".to_string(),
        comment: None,
        deducted_days: None,
    }
}

/// Writes a commands CSV with the standard header followed by `rows`.
/// Short rows are written as-is; the reader accepts missing trailing columns.
pub fn write_commands(path: &Path, rows: &[&[&str]]) -> Result<(), Error> {
    let file = File::create(path)?;
    let mut wtr = csv::WriterBuilder::new().flexible(true).from_writer(file);

    wtr.write_record(HEADER)?;
    for row in rows {
        wtr.write_record(*row)?;
    }

    wtr.flush()?;
    Ok(())
}
