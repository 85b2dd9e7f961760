use crate::domain::payment::{NewPaymentRecord, PaymentRecord, RecordId};
use crate::domain::people::SubjectId;
use crate::domain::period::Period;
use crate::domain::ports::{Changeset, ScholarshipStore};
use crate::domain::stage::{ApprovalStage, DecisionStatus, Role, StageId};
use crate::error::{Result, ScholarshipError};
use async_trait::async_trait;
use rocksdb::{
    ColumnFamily, ColumnFamilyDescriptor, DB, Direction, IteratorMode, Options, WriteBatch,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Column Family for storing payment records.
pub const CF_RECORDS: &str = "records";
/// Column Family for storing approval stages, keyed by record then stage id.
pub const CF_STAGES: &str = "stages";
/// Column Family for id counters.
pub const CF_META: &str = "meta";

const LAST_RECORD_ID: &[u8] = b"last_record_id";
const LAST_STAGE_ID: &[u8] = b"last_stage_id";

/// A persistent store implementation using RocksDB.
///
/// Every write goes through a single `WriteBatch`, and writers are serialized
/// by a mutex so the pending-stage check and the write it guards cannot
/// interleave with another commit.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    writer: Arc<Mutex<()>>,
}

fn stage_key(record: RecordId, stage: StageId) -> [u8; 16] {
    let mut key = [0u8; 16];
    key[..8].copy_from_slice(&record.to_be_bytes());
    key[8..].copy_from_slice(&stage.to_be_bytes());
    key
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    Ok(serde_json::from_slice(bytes)?)
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that the "records", "stages" and "meta" column families exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let families = [CF_RECORDS, CF_STAGES, CF_META]
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect::<Vec<_>>();
        let db = DB::open_cf_descriptors(&opts, path, families)?;

        Ok(Self {
            db: Arc::new(db),
            writer: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db.cf_handle(name).ok_or_else(|| {
            ScholarshipError::Internal(Box::new(std::io::Error::other(format!(
                "{} column family not found",
                name
            ))))
        })
    }

    fn next_id(&self, key: &[u8]) -> Result<u64> {
        let meta = self.cf(CF_META)?;
        let last = match self.db.get_cf(meta, key)? {
            Some(bytes) => {
                let raw: [u8; 8] = bytes.as_slice().try_into().map_err(|_| {
                    ScholarshipError::Internal(Box::new(std::io::Error::other(
                        "Corrupt id counter",
                    )))
                })?;
                u64::from_be_bytes(raw)
            }
            None => 0,
        };
        Ok(last + 1)
    }

    fn read_stages(&self, record: RecordId) -> Result<Vec<ApprovalStage>> {
        let cf = self.cf(CF_STAGES)?;
        let prefix = record.to_be_bytes();
        let mut stages = Vec::new();
        let iter = self
            .db
            .iterator_cf(cf, IteratorMode::From(&prefix, Direction::Forward));
        for item in iter {
            let (key, value) = item?;
            if !key.starts_with(&prefix) {
                break;
            }
            stages.push(decode(&value)?);
        }
        Ok(stages)
    }
}

#[async_trait]
impl ScholarshipStore for RocksDBStore {
    async fn insert(&self, record: NewPaymentRecord) -> Result<PaymentRecord> {
        let _guard = self.writer.lock().await;
        let id = self.next_id(LAST_RECORD_ID)?;
        let record = record.with_id(id);

        let mut batch = WriteBatch::default();
        batch.put_cf(self.cf(CF_RECORDS)?, id.to_be_bytes(), encode(&record)?);
        batch.put_cf(self.cf(CF_META)?, LAST_RECORD_ID, id.to_be_bytes());
        self.db.write(batch)?;

        Ok(record)
    }

    async fn get(&self, id: RecordId) -> Result<Option<PaymentRecord>> {
        let cf = self.cf(CF_RECORDS)?;
        match self.db.get_cf(cf, id.to_be_bytes())? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn find_for_period(
        &self,
        subject: SubjectId,
        period: Period,
    ) -> Result<Option<PaymentRecord>> {
        Ok(self
            .get_all()
            .await?
            .into_iter()
            .find(|r| r.subject == subject && r.period == period))
    }

    async fn get_all(&self) -> Result<Vec<PaymentRecord>> {
        let cf = self.cf(CF_RECORDS)?;
        let mut records = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_key, value) = item?;
            records.push(decode(&value)?);
        }
        Ok(records)
    }

    async fn stages(&self, record: RecordId) -> Result<Vec<ApprovalStage>> {
        self.read_stages(record)
    }

    async fn commit(&self, changes: Changeset) -> Result<()> {
        let _guard = self.writer.lock().await;
        let record_id = changes.record.id;
        let Some(stored) = self.get(record_id).await? else {
            return Err(ScholarshipError::NotFound(format!(
                "Payment record {}",
                record_id
            )));
        };
        if changes.releases && stored.released {
            return Err(ScholarshipError::AlreadyReleasedOrNotPending(record_id));
        }

        let stages = self.read_stages(record_id)?;
        let exists = |role: Role, status: DecisionStatus| {
            stages.iter().any(|s| s.role == role && s.status == status)
        };
        let mut batch = WriteBatch::default();
        let stages_cf = self.cf(CF_STAGES)?;

        if let Some(settle) = &changes.settle {
            let Some(current) = stages.iter().find(|s| s.id == settle.stage && s.is_pending())
            else {
                return Err(ScholarshipError::NoPendingStage {
                    record: record_id,
                    role: settle.role.to_string(),
                });
            };
            if exists(settle.role, settle.status) {
                return Err(ScholarshipError::DuplicateStage {
                    record: record_id,
                    role: settle.role,
                    status: settle.status,
                });
            }
            let settled = ApprovalStage {
                status: settle.status,
                comment: settle.comment.clone(),
                ..current.clone()
            };
            batch.put_cf(stages_cf, stage_key(record_id, settled.id), encode(&settled)?);
        }

        if let Some(role) = changes.open {
            if exists(role, DecisionStatus::Pending) {
                return Err(ScholarshipError::DuplicateStage {
                    record: record_id,
                    role,
                    status: DecisionStatus::Pending,
                });
            }
            let id = self.next_id(LAST_STAGE_ID)?;
            let stage = ApprovalStage {
                id,
                record: record_id,
                role,
                status: DecisionStatus::Pending,
                comment: None,
            };
            batch.put_cf(stages_cf, stage_key(record_id, id), encode(&stage)?);
            batch.put_cf(self.cf(CF_META)?, LAST_STAGE_ID, id.to_be_bytes());
        }

        batch.put_cf(
            self.cf(CF_RECORDS)?,
            record_id.to_be_bytes(),
            encode(&changes.record)?,
        );
        self.db.write(batch)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::stage::StageSettlement;
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    fn new_record(subject: SubjectId) -> NewPaymentRecord {
        let period = Period::new(3, 2025).unwrap();
        NewPaymentRecord::compute(subject, period, dec!(37000), dec!(0.18), None).unwrap()
    }

    #[tokio::test]
    async fn test_rocksdb_open_cf() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).expect("Failed to open RocksDB");

        assert!(store.db.cf_handle(CF_RECORDS).is_some());
        assert!(store.db.cf_handle(CF_STAGES).is_some());
        assert!(store.db.cf_handle(CF_META).is_some());
    }

    #[tokio::test]
    async fn test_rocksdb_record_store() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();

        let first = store.insert(new_record(1)).await.unwrap();
        let second = store.insert(new_record(2)).await.unwrap();
        assert_eq!((first.id, second.id), (1, 2));

        assert_eq!(store.get(1).await.unwrap().unwrap(), first);
        assert!(store.get(3).await.unwrap().is_none());
        assert_eq!(store.get_all().await.unwrap().len(), 2);

        let march = Period::new(3, 2025).unwrap();
        assert_eq!(store.find_for_period(2, march).await.unwrap(), Some(second));
    }

    #[tokio::test]
    async fn test_rocksdb_commit_and_reopen() {
        let dir = tempdir().unwrap();
        let record_id = {
            let store = RocksDBStore::open(dir.path()).unwrap();
            let mut record = store.insert(new_record(1)).await.unwrap();
            record.released = true;
            store
                .commit(Changeset {
                    record: record.clone(),
                    releases: false,
                    settle: None,
                    open: Some(Role::Supervisor),
                })
                .await
                .unwrap();
            let stage = store.stages(record.id).await.unwrap().remove(0);
            store
                .commit(Changeset {
                    record: record.clone(),
                    releases: false,
                    settle: Some(StageSettlement {
                        stage: stage.id,
                        role: Role::Supervisor,
                        status: DecisionStatus::Accepted,
                        comment: None,
                    }),
                    open: Some(Role::Hod),
                })
                .await
                .unwrap();
            record.id
        };

        let store = RocksDBStore::open(dir.path()).unwrap();
        let stages = store.stages(record_id).await.unwrap();
        assert_eq!(stages.len(), 2);
        assert_eq!(stages[0].status, DecisionStatus::Accepted);
        assert_eq!(stages[1].role, Role::Hod);
        assert!(store.get(record_id).await.unwrap().unwrap().released);

        // Counters survive a reopen.
        let next = store.insert(new_record(2)).await.unwrap();
        assert_eq!(next.id, 2);
    }

    #[tokio::test]
    async fn test_rocksdb_commit_rejects_settled_stage() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();
        let record = store.insert(new_record(1)).await.unwrap();
        store
            .commit(Changeset {
                record: record.clone(),
                releases: false,
                settle: None,
                open: Some(Role::Supervisor),
            })
            .await
            .unwrap();
        let stage = store.stages(record.id).await.unwrap().remove(0);
        let accept = Changeset {
            record: record.clone(),
            releases: false,
            settle: Some(StageSettlement {
                stage: stage.id,
                role: Role::Supervisor,
                status: DecisionStatus::Accepted,
                comment: None,
            }),
            open: Some(Role::Hod),
        };
        store.commit(accept.clone()).await.unwrap();
        assert!(matches!(
            store.commit(accept).await,
            Err(ScholarshipError::NoPendingStage { .. })
        ));
        assert_eq!(store.stages(record.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_rocksdb_corrupt_record_is_json_error() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();
        let record = store.insert(new_record(1)).await.unwrap();
        let records = store.cf(CF_RECORDS).unwrap();

        store.db.put_cf(records, 2u64.to_be_bytes(), b"not json").unwrap();
        assert!(matches!(store.get(2).await, Err(ScholarshipError::Json(_))));

        let mut raw: serde_json::Value = serde_json::to_value(&record).unwrap();
        raw["period"]["month"] = serde_json::json!(13);
        store
            .db
            .put_cf(records, 3u64.to_be_bytes(), serde_json::to_vec(&raw).unwrap())
            .unwrap();
        assert!(matches!(store.get(3).await, Err(ScholarshipError::Json(_))));
        assert!(store.get(record.id).await.unwrap().is_some());
    }
}
