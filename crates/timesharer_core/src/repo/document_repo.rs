//! Document collection contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide find/insert/replace/delete over one named collection.
//! - Provide targeted partial updates for identifier reference fields.
//! - Keep SQL and JSON path details inside the persistence boundary.
//!
//! # Invariants
//! - Every successful write refreshes `updated_at` to
//!   `max(now_ms, previous + 1)`, so it strictly increases per document.
//! - Store failures are returned as errors, never folded into empty results.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::{DbError, Store};
use crate::model::document::{Document, DocumentField, EntityDetails, EntityKind, FieldShape};
use crate::model::id::DocumentId;
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::marker::PhantomData;

const DOCUMENT_SELECT_SQL: &str = "SELECT
    id,
    details,
    updated_at
FROM documents";

const NOW_MS_SQL: &str = "CAST((julianday('now') - 2440587.5) * 86400000 AS INTEGER)";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for document persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    Serialization(serde_json::Error),
    InvalidData(String),
    /// Targeted update names a field the entity kind does not carry.
    UnsupportedField {
        kind: EntityKind,
        field: DocumentField,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Serialization(err) => write!(f, "failed to encode details: {err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted document data: {message}"),
            Self::UnsupportedField { kind, field } => write!(
                f,
                "field `{}` is not supported on {} documents",
                field.as_str(),
                kind.as_str()
            ),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Serialization(err) => Some(err),
            Self::InvalidData(_) | Self::UnsupportedField { .. } => None,
        }
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

impl From<serde_json::Error> for RepoError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value)
    }
}

/// Result of a write that targets one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOutcome {
    /// Number of documents the store reports as modified.
    pub modified: usize,
    /// Refreshed timestamp when a document was modified.
    pub updated_at: Option<i64>,
}

impl WriteOutcome {
    fn from_stamps(stamps: Vec<i64>) -> Self {
        Self {
            modified: stamps.len(),
            updated_at: stamps.into_iter().max(),
        }
    }

    pub fn is_modified(&self) -> bool {
        self.modified > 0
    }
}

/// Adapter contract over one entity collection.
pub trait DocumentRepository<D: EntityDetails> {
    /// Returns every document in store order.
    fn list(&self) -> RepoResult<Vec<Document<D>>>;
    fn find_by_id(&self, id: &DocumentId) -> RepoResult<Option<Document<D>>>;
    /// Returns the first document whose text/reference `field` equals `value`.
    fn find_one_by(&self, field: DocumentField, value: &str) -> RepoResult<Option<Document<D>>>;
    /// Stores `details` under a freshly assigned id.
    fn insert(&self, details: &D) -> RepoResult<Document<D>>;
    fn replace_details(&self, id: &DocumentId, details: &D) -> RepoResult<WriteOutcome>;
    /// Returns the number of removed documents.
    fn delete_by_id(&self, id: &DocumentId) -> RepoResult<usize>;
    fn set_reference(
        &self,
        id: &DocumentId,
        field: DocumentField,
        value: Option<&DocumentId>,
    ) -> RepoResult<WriteOutcome>;
    /// Appends `value` unless already present; reports zero modified then.
    fn add_to_list(
        &self,
        id: &DocumentId,
        field: DocumentField,
        value: &DocumentId,
    ) -> RepoResult<WriteOutcome>;
    /// Removes every occurrence of `value`; reports zero modified when absent.
    fn remove_from_list(
        &self,
        id: &DocumentId,
        field: DocumentField,
        value: &DocumentId,
    ) -> RepoResult<WriteOutcome>;
}

impl<D: EntityDetails, R: DocumentRepository<D> + ?Sized> DocumentRepository<D> for &R {
    fn list(&self) -> RepoResult<Vec<Document<D>>> {
        (**self).list()
    }

    fn find_by_id(&self, id: &DocumentId) -> RepoResult<Option<Document<D>>> {
        (**self).find_by_id(id)
    }

    fn find_one_by(&self, field: DocumentField, value: &str) -> RepoResult<Option<Document<D>>> {
        (**self).find_one_by(field, value)
    }

    fn insert(&self, details: &D) -> RepoResult<Document<D>> {
        (**self).insert(details)
    }

    fn replace_details(&self, id: &DocumentId, details: &D) -> RepoResult<WriteOutcome> {
        (**self).replace_details(id, details)
    }

    fn delete_by_id(&self, id: &DocumentId) -> RepoResult<usize> {
        (**self).delete_by_id(id)
    }

    fn set_reference(
        &self,
        id: &DocumentId,
        field: DocumentField,
        value: Option<&DocumentId>,
    ) -> RepoResult<WriteOutcome> {
        (**self).set_reference(id, field, value)
    }

    fn add_to_list(
        &self,
        id: &DocumentId,
        field: DocumentField,
        value: &DocumentId,
    ) -> RepoResult<WriteOutcome> {
        (**self).add_to_list(id, field, value)
    }

    fn remove_from_list(
        &self,
        id: &DocumentId,
        field: DocumentField,
        value: &DocumentId,
    ) -> RepoResult<WriteOutcome> {
        (**self).remove_from_list(id, field, value)
    }
}

/// SQLite-backed collection of one entity kind.
pub struct SqliteDocumentRepository<D> {
    store: Store,
    collection: String,
    _details: PhantomData<fn() -> D>,
}

impl<D: EntityDetails> SqliteDocumentRepository<D> {
    /// Binds the collection configured for `D` on `store`.
    pub fn new(store: &Store) -> Self {
        Self {
            store: store.clone(),
            collection: store.settings().collection_for(D::KIND).to_string(),
            _details: PhantomData,
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    fn run<T>(&self, op: impl FnOnce(&Connection) -> RepoResult<T>) -> RepoResult<T> {
        self.store.with_connection(|conn| op(conn))
    }

    fn check_field(&self, field: DocumentField, allowed: &[FieldShape]) -> RepoResult<()> {
        if field.owner() != D::KIND || !allowed.contains(&field.shape()) {
            return Err(RepoError::UnsupportedField {
                kind: D::KIND,
                field,
            });
        }
        Ok(())
    }

    fn write_returning(
        &self,
        sql: &str,
        bind: &[&dyn rusqlite::ToSql],
    ) -> RepoResult<WriteOutcome> {
        self.run(|conn| {
            let mut stmt = conn.prepare(sql)?;
            let stamps = stmt
                .query_map(bind, |row| row.get::<_, i64>(0))?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(WriteOutcome::from_stamps(stamps))
        })
    }
}

impl<D> Clone for SqliteDocumentRepository<D> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            collection: self.collection.clone(),
            _details: PhantomData,
        }
    }
}

impl<D: EntityDetails> DocumentRepository<D> for SqliteDocumentRepository<D> {
    fn list(&self) -> RepoResult<Vec<Document<D>>> {
        self.run(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{DOCUMENT_SELECT_SQL}
                 WHERE collection = ?1
                 ORDER BY rowid ASC;"
            ))?;
            let mut rows = stmt.query([self.collection.as_str()])?;
            let mut documents = Vec::new();
            while let Some(row) = rows.next()? {
                documents.push(parse_document_row(row)?);
            }
            Ok(documents)
        })
    }

    fn find_by_id(&self, id: &DocumentId) -> RepoResult<Option<Document<D>>> {
        self.run(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{DOCUMENT_SELECT_SQL}
                 WHERE collection = ?1
                   AND id = ?2;"
            ))?;
            let mut rows = stmt.query(params![self.collection, id.as_str()])?;
            if let Some(row) = rows.next()? {
                return Ok(Some(parse_document_row(row)?));
            }
            Ok(None)
        })
    }

    fn find_one_by(&self, field: DocumentField, value: &str) -> RepoResult<Option<Document<D>>> {
        self.check_field(field, &[FieldShape::Text, FieldShape::Reference])?;
        self.run(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{DOCUMENT_SELECT_SQL}
                 WHERE collection = ?1
                   AND json_extract(details, ?2) = ?3
                 ORDER BY rowid ASC
                 LIMIT 1;"
            ))?;
            let mut rows = stmt.query(params![self.collection, field.json_path(), value])?;
            if let Some(row) = rows.next()? {
                return Ok(Some(parse_document_row(row)?));
            }
            Ok(None)
        })
    }

    fn insert(&self, details: &D) -> RepoResult<Document<D>> {
        let encoded = serde_json::to_string(details)?;
        let id = DocumentId::generate();
        let updated_at = self.run(|conn| {
            let stamp = conn.query_row(
                &format!(
                    "INSERT INTO documents (
                        collection,
                        id,
                        details,
                        updated_at
                    ) VALUES (?1, ?2, ?3, {NOW_MS_SQL})
                    RETURNING updated_at;"
                ),
                params![self.collection, id.as_str(), encoded],
                |row| row.get::<_, i64>(0),
            )?;
            Ok(stamp)
        })?;

        Ok(Document {
            id,
            updated_at,
            details: details.clone(),
        })
    }

    fn replace_details(&self, id: &DocumentId, details: &D) -> RepoResult<WriteOutcome> {
        let encoded = serde_json::to_string(details)?;
        self.write_returning(
            &format!(
                "UPDATE documents
                 SET
                    details = ?3,
                    updated_at = MAX({NOW_MS_SQL}, updated_at + 1)
                 WHERE collection = ?1
                   AND id = ?2
                 RETURNING updated_at;"
            ),
            params![self.collection, id.as_str(), encoded],
        )
    }

    fn delete_by_id(&self, id: &DocumentId) -> RepoResult<usize> {
        self.run(|conn| {
            let removed = conn.execute(
                "DELETE FROM documents
                 WHERE collection = ?1
                   AND id = ?2;",
                params![self.collection, id.as_str()],
            )?;
            Ok(removed)
        })
    }

    fn set_reference(
        &self,
        id: &DocumentId,
        field: DocumentField,
        value: Option<&DocumentId>,
    ) -> RepoResult<WriteOutcome> {
        self.check_field(field, &[FieldShape::Reference])?;
        self.write_returning(
            &format!(
                "UPDATE documents
                 SET
                    details = json_set(details, ?3, ?4),
                    updated_at = MAX({NOW_MS_SQL}, updated_at + 1)
                 WHERE collection = ?1
                   AND id = ?2
                 RETURNING updated_at;"
            ),
            params![
                self.collection,
                id.as_str(),
                field.json_path(),
                value.map(DocumentId::as_str),
            ],
        )
    }

    fn add_to_list(
        &self,
        id: &DocumentId,
        field: DocumentField,
        value: &DocumentId,
    ) -> RepoResult<WriteOutcome> {
        self.check_field(field, &[FieldShape::ReferenceList])?;
        self.write_returning(
            &format!(
                "UPDATE documents
                 SET
                    details = json_insert(details, ?3 || '[#]', ?4),
                    updated_at = MAX({NOW_MS_SQL}, updated_at + 1)
                 WHERE collection = ?1
                   AND id = ?2
                   AND NOT EXISTS (
                        SELECT 1
                        FROM json_each(documents.details, ?3)
                        WHERE value = ?4
                   )
                 RETURNING updated_at;"
            ),
            params![self.collection, id.as_str(), field.json_path(), value.as_str()],
        )
    }

    fn remove_from_list(
        &self,
        id: &DocumentId,
        field: DocumentField,
        value: &DocumentId,
    ) -> RepoResult<WriteOutcome> {
        self.check_field(field, &[FieldShape::ReferenceList])?;
        self.write_returning(
            &format!(
                "UPDATE documents
                 SET
                    details = json_set(
                        details,
                        ?3,
                        json((
                            SELECT json_group_array(value)
                            FROM json_each(documents.details, ?3)
                            WHERE value <> ?4
                        ))
                    ),
                    updated_at = MAX({NOW_MS_SQL}, updated_at + 1)
                 WHERE collection = ?1
                   AND id = ?2
                   AND EXISTS (
                        SELECT 1
                        FROM json_each(documents.details, ?3)
                        WHERE value = ?4
                   )
                 RETURNING updated_at;"
            ),
            params![self.collection, id.as_str(), field.json_path(), value.as_str()],
        )
    }
}

fn parse_document_row<D: EntityDetails>(row: &Row<'_>) -> RepoResult<Document<D>> {
    let id_text: String = row.get("id")?;
    let id = DocumentId::parse(&id_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid id value `{id_text}` in documents.id"))
    })?;

    let details_text: String = row.get("details")?;
    let details = serde_json::from_str::<D>(&details_text).map_err(|err| {
        RepoError::InvalidData(format!(
            "invalid {} details for `{id_text}`: {err}",
            D::KIND.as_str()
        ))
    })?;

    Ok(Document {
        id,
        updated_at: row.get("updated_at")?,
        details,
    })
}
