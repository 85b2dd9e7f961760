use crate::application::approvals::DecisionRequest;
use crate::domain::payment::RecordId;
use crate::domain::people::{ActorId, SubjectId};
use crate::domain::period::Period;
use crate::error::{Result, ScholarshipError};
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize, PartialEq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    OpenPeriod,
    Create,
    Release,
    Decide,
}

/// One raw CSV row; which columns are required depends on the action.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct CommandRow {
    pub action: Action,
    pub record: Option<RecordId>,
    pub subject: Option<SubjectId>,
    pub actor: Option<ActorId>,
    pub role: Option<String>,
    pub decision: Option<String>,
    pub deducted_days: Option<i64>,
    pub days: Option<u32>,
    pub month: Option<u32>,
    pub year: Option<i32>,
    pub comment: Option<String>,
}

/// A validated workflow command.
#[derive(Debug, PartialEq, Clone)]
pub enum Command {
    OpenPeriod(Period),
    Create {
        subject: SubjectId,
        period: Period,
        days: Option<u32>,
    },
    Release {
        record: RecordId,
        subject: SubjectId,
    },
    Decide(DecisionRequest),
}

fn required<T>(value: Option<T>, action: Action, column: &str) -> Result<T> {
    value.ok_or_else(|| {
        ScholarshipError::InvalidInput(format!("{:?} requires the '{}' column", action, column))
    })
}

impl CommandRow {
    fn period(&self) -> Result<Period> {
        Period::new(
            required(self.month, self.action, "month")?,
            required(self.year, self.action, "year")?,
        )
    }
}

impl TryFrom<CommandRow> for Command {
    type Error = ScholarshipError;

    fn try_from(row: CommandRow) -> Result<Self> {
        let action = row.action;
        match action {
            Action::OpenPeriod => Ok(Command::OpenPeriod(row.period()?)),
            Action::Create => Ok(Command::Create {
                period: row.period()?,
                subject: required(row.subject, action, "subject")?,
                days: row.days,
            }),
            Action::Release => Ok(Command::Release {
                record: required(row.record, action, "record")?,
                subject: required(row.subject, action, "subject")?,
            }),
            Action::Decide => Ok(Command::Decide(DecisionRequest {
                record: required(row.record, action, "record")?,
                role: required(row.role, action, "role")?,
                actor: required(row.actor, action, "actor")?,
                decision: required(row.decision, action, "decision")?,
                comment: row.comment.filter(|c| !c.is_empty()),
                deducted_days: row.deducted_days,
            })),
        }
    }
}

/// Reads workflow commands from a CSV source.
///
/// Wraps `csv::Reader` with whitespace trimming and flexible record lengths,
/// so trailing optional columns may be left off.
pub struct CommandReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> CommandReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily reads, deserializes and validates commands.
    pub fn commands(self) -> impl Iterator<Item = Result<Command>> {
        self.reader.into_deserialize::<CommandRow>().map(|result| {
            result
                .map_err(ScholarshipError::from)
                .and_then(Command::try_from)
        })
    }
}
