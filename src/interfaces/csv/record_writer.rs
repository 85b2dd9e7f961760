use crate::domain::payment::PaymentRecord;
use crate::domain::stage::ApprovalStage;
use crate::error::Result;
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Serialize)]
struct RecordRow {
    id: u64,
    subject: u32,
    month: u32,
    year: i32,
    days: u32,
    daily_rate: Decimal,
    total_pay: Decimal,
    released: bool,
    status: String,
}

impl From<&PaymentRecord> for RecordRow {
    fn from(record: &PaymentRecord) -> Self {
        Self {
            id: record.id,
            subject: record.subject,
            month: record.period.month(),
            year: record.period.year(),
            days: record.days,
            daily_rate: record.daily_rate.value(),
            total_pay: record.total_pay.value(),
            released: record.released,
            status: record.status.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct StageRow<'a> {
    id: u64,
    record: u64,
    role: &'static str,
    status: String,
    comment: &'a str,
}

/// Writes payment records and stage history as CSV.
pub struct RecordWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> RecordWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_records(&mut self, records: &[PaymentRecord]) -> Result<()> {
        if records.is_empty() {
            self.writer.write_record([
                "id",
                "subject",
                "month",
                "year",
                "days",
                "daily_rate",
                "total_pay",
                "released",
                "status",
            ])?;
        }
        for record in records {
            self.writer.serialize(RecordRow::from(record))?;
        }
        self.writer.flush()?;
        Ok(())
    }

    pub fn write_stages(&mut self, stages: &[ApprovalStage]) -> Result<()> {
        if stages.is_empty() {
            self.writer
                .write_record(["id", "record", "role", "status", "comment"])?;
        }
        for stage in stages {
            self.writer.serialize(StageRow {
                id: stage.id,
                record: stage.record,
                role: stage.role.code(),
                status: stage.status.to_string(),
                comment: stage.comment.as_deref().unwrap_or(""),
            })?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::payment::NewPaymentRecord;
    use crate::domain::period::Period;
    use crate::domain::stage::{DecisionStatus, Role};
    use rust_decimal_macros::dec;

    #[test]
    fn test_write_records() {
        let period = Period::new(3, 2025).unwrap();
        let mut record = NewPaymentRecord::compute(7, period, dec!(37000), dec!(0.18), None)
            .unwrap()
            .with_id(1);
        record.apply_deduction(1).unwrap();
        record.released = true;

        let mut out = Vec::new();
        RecordWriter::new(&mut out).write_records(&[record]).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("id,subject,month,year,days,daily_rate,total_pay,released,status")
        );
        assert_eq!(lines.next(), Some("1,7,3,2025,30,1408.39,42251.61,true,PENDING"));
    }

    #[test]
    fn test_write_empty_records_keeps_header() {
        let mut out = Vec::new();
        RecordWriter::new(&mut out).write_records(&[]).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text.trim(),
            "id,subject,month,year,days,daily_rate,total_pay,released,status"
        );
    }

    #[test]
    fn test_write_stages() {
        let stages = vec![
            ApprovalStage {
                id: 1,
                record: 1,
                role: Role::Supervisor,
                status: DecisionStatus::Accepted,
                comment: Some("fine".to_string()),
            },
            ApprovalStage {
                id: 2,
                record: 1,
                role: Role::Hod,
                status: DecisionStatus::Pending,
                comment: None,
            },
        ];
        let mut out = Vec::new();
        RecordWriter::new(&mut out).write_stages(&stages).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "id,record,role,status,comment\n1,1,SUPERVISOR,ACCEPTED,fine\n2,1,HOD,PENDING,\n"
        );
    }
}
