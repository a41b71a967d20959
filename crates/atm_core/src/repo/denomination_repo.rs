//! Denomination record store contracts and implementations.
//!
//! # Responsibility
//! - Define the load-all / save-all / save contract the ledger consumes.
//! - Provide a SQLite store and an in-memory store behind that contract.
//!
//! # Invariants
//! - `save` never overwrites an existing denomination.
//! - `save_all` writes every record or none of them.
//! - Read paths reject invalid persisted rows instead of masking them.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::DbError;
use crate::model::denomination::{
    Denomination, DenominationRecord, DenominationValidationError,
};
use rusqlite::{params, Connection, ErrorCode, Row};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Store-level error for denomination persistence.
#[derive(Debug)]
pub enum RepoError {
    Validation(DenominationValidationError),
    Db(DbError),
    /// A record with this denomination already exists.
    DuplicateKey(Denomination),
    InvalidData(String),
    /// Connection schema does not match the version this binary expects.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::DuplicateKey(denomination) => {
                write!(f, "denomination {denomination} already exists")
            }
            Self::InvalidData(message) => {
                write!(f, "invalid persisted denomination data: {message}")
            }
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}"
            ),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::DuplicateKey(_) | Self::InvalidData(_) | Self::UninitializedConnection { .. } => {
                None
            }
        }
    }
}

impl From<DenominationValidationError> for RepoError {
    fn from(value: DenominationValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Persistence contract for denomination records.
pub trait DenominationRepository {
    /// Returns every stored record, highest denomination first.
    fn load_all(&self) -> RepoResult<Vec<DenominationRecord>>;
    /// Upserts all records atomically and returns what was persisted.
    fn save_all(&self, records: &[DenominationRecord]) -> RepoResult<Vec<DenominationRecord>>;
    /// Inserts one new record; fails with `DuplicateKey` when it exists.
    fn save(&self, record: &DenominationRecord) -> RepoResult<DenominationRecord>;
}

impl<R: DenominationRepository + ?Sized> DenominationRepository for &R {
    fn load_all(&self) -> RepoResult<Vec<DenominationRecord>> {
        (**self).load_all()
    }

    fn save_all(&self, records: &[DenominationRecord]) -> RepoResult<Vec<DenominationRecord>> {
        (**self).save_all(records)
    }

    fn save(&self, record: &DenominationRecord) -> RepoResult<DenominationRecord> {
        (**self).save(record)
    }
}

/// SQLite-backed denomination store.
pub struct SqliteDenominationRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteDenominationRepository<'conn> {
    /// Wraps a connection returned by `open_db`/`open_db_in_memory`.
    ///
    /// # Errors
    /// - `UninitializedConnection` when migrations have not been applied.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        let expected_version = latest_version();
        let actual_version = current_user_version(conn)?;
        if actual_version != expected_version {
            return Err(RepoError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }
        Ok(Self { conn })
    }
}

impl DenominationRepository for SqliteDenominationRepository<'_> {
    fn load_all(&self) -> RepoResult<Vec<DenominationRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT denomination, quantity
             FROM denominations
             ORDER BY denomination DESC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut records = Vec::new();

        while let Some(row) = rows.next()? {
            records.push(parse_record_row(row)?);
        }

        Ok(records)
    }

    fn save_all(&self, records: &[DenominationRecord]) -> RepoResult<Vec<DenominationRecord>> {
        for record in records {
            record.validate()?;
        }

        let tx = self.conn.unchecked_transaction()?;
        for record in records {
            tx.execute(
                "INSERT INTO denominations (denomination, quantity)
                 VALUES (?1, ?2)
                 ON CONFLICT(denomination) DO UPDATE SET
                    quantity = excluded.quantity,
                    updated_at = (strftime('%s', 'now') * 1000);",
                params![record.denomination, record.quantity],
            )?;
        }
        tx.commit()?;

        Ok(records.to_vec())
    }

    fn save(&self, record: &DenominationRecord) -> RepoResult<DenominationRecord> {
        record.validate()?;

        match self.conn.execute(
            "INSERT INTO denominations (denomination, quantity) VALUES (?1, ?2);",
            params![record.denomination, record.quantity],
        ) {
            Ok(_) => Ok(*record),
            Err(err) if is_unique_violation(&err) => {
                Err(RepoError::DuplicateKey(record.denomination))
            }
            Err(err) => Err(err.into()),
        }
    }
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(failure, _) => {
            failure.code == ErrorCode::ConstraintViolation
                && (failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                    || failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE)
        }
        _ => false,
    }
}

fn parse_record_row(row: &Row<'_>) -> RepoResult<DenominationRecord> {
    let denomination: i64 = row.get("denomination")?;
    let denomination = u32::try_from(denomination)
        .ok()
        .filter(|value| *value > 0)
        .ok_or_else(|| {
            RepoError::InvalidData(format!(
                "invalid denomination `{denomination}` in denominations.denomination"
            ))
        })?;

    let quantity: i64 = row.get("quantity")?;
    let quantity = u32::try_from(quantity).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid quantity `{quantity}` for denomination {denomination}"
        ))
    })?;

    Ok(DenominationRecord::new(denomination, quantity))
}

/// Map-backed store for tests and embedded use.
#[derive(Debug, Default)]
pub struct InMemoryDenominationRepository {
    records: RefCell<BTreeMap<Denomination, u32>>,
}

impl InMemoryDenominationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store pre-filled with `(denomination, quantity)` pairs.
    pub fn with_records(records: impl IntoIterator<Item = DenominationRecord>) -> Self {
        let store = Self::new();
        store.records.borrow_mut().extend(
            records
                .into_iter()
                .map(|record| (record.denomination, record.quantity)),
        );
        store
    }

    /// Current quantity for one denomination, if stored.
    pub fn quantity_of(&self, denomination: Denomination) -> Option<u32> {
        self.records.borrow().get(&denomination).copied()
    }
}

impl DenominationRepository for InMemoryDenominationRepository {
    fn load_all(&self) -> RepoResult<Vec<DenominationRecord>> {
        Ok(self
            .records
            .borrow()
            .iter()
            .rev()
            .map(|(&denomination, &quantity)| DenominationRecord::new(denomination, quantity))
            .collect())
    }

    fn save_all(&self, records: &[DenominationRecord]) -> RepoResult<Vec<DenominationRecord>> {
        for record in records {
            record.validate()?;
        }

        let mut stored = self.records.borrow_mut();
        for record in records {
            stored.insert(record.denomination, record.quantity);
        }
        Ok(records.to_vec())
    }

    fn save(&self, record: &DenominationRecord) -> RepoResult<DenominationRecord> {
        record.validate()?;

        let mut stored = self.records.borrow_mut();
        if stored.contains_key(&record.denomination) {
            return Err(RepoError::DuplicateKey(record.denomination));
        }
        stored.insert(record.denomination, record.quantity);
        Ok(*record)
    }
}

#[cfg(test)]
mod tests {
    use super::{DenominationRepository, InMemoryDenominationRepository, RepoError};
    use crate::model::denomination::DenominationRecord;

    #[test]
    fn in_memory_load_all_is_descending() {
        let repo = InMemoryDenominationRepository::with_records([
            DenominationRecord::new(20, 1),
            DenominationRecord::new(100, 2),
        ]);

        let keys: Vec<u32> = repo
            .load_all()
            .unwrap()
            .iter()
            .map(|record| record.denomination)
            .collect();
        assert_eq!(keys, vec![100, 20]);
    }

    #[test]
    fn in_memory_save_rejects_duplicates() {
        let repo = InMemoryDenominationRepository::new();
        repo.save(&DenominationRecord::new(50, 1)).unwrap();

        let err = repo.save(&DenominationRecord::new(50, 9)).unwrap_err();
        assert!(matches!(err, RepoError::DuplicateKey(50)));
        assert_eq!(repo.quantity_of(50), Some(1));
    }

    #[test]
    fn in_memory_save_all_validates_before_writing() {
        let repo = InMemoryDenominationRepository::with_records([DenominationRecord::new(10, 1)]);

        let err = repo
            .save_all(&[DenominationRecord::new(10, 5), DenominationRecord::new(0, 1)])
            .unwrap_err();
        assert!(matches!(err, RepoError::Validation(_)));
        assert_eq!(repo.quantity_of(10), Some(1));
    }
}
