//! Generic document store — the uniform CRUD/query/subscribe surface over
//! named collections.
//!
//! Documents are schemaless JSON objects. The store owns the `id`,
//! `version`, `createdAt` and `updatedAt` fields; callers never write them.
//! Every write bumps `version`, and updates may carry an expected version
//! for compare-and-swap. Batches run in one SQLite transaction.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{SecondsFormat, Utc};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::feed::{ChangeEvent, ChangeFeed, ChangeKind, Subscription};
use super::query::{build_select, Query};
use super::sqlite::{open_database, open_memory_database};
use super::DatabaseError;
use crate::models::enums::Collection;

/// Upper bound on operations in one batch commit.
pub const MAX_BATCH_WRITES: usize = 500;

/// Fields owned by the store; stripped from caller-supplied data.
const RESERVED_FIELDS: [&str; 4] = ["id", "version", "createdAt", "updatedAt"];

/// A stored document: store-managed metadata plus the JSON body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    pub version: i64,
    pub created_at: String,
    pub updated_at: String,
    #[serde(flatten)]
    pub data: Map<String, Value>,
}

/// One write inside a batch commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum WriteOp {
    Create {
        collection: Collection,
        data: Map<String, Value>,
    },
    #[serde(rename_all = "camelCase")]
    Update {
        collection: Collection,
        id: String,
        patch: Map<String, Value>,
        #[serde(default)]
        expected_version: Option<i64>,
    },
    Delete {
        collection: Collection,
        id: String,
    },
}

/// Result of a committed batch: one entry per op, in order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "camelCase")]
pub enum WriteResult {
    Written(Document),
    Deleted { id: String },
}

pub struct DocumentStore {
    conn: Mutex<Connection>,
    feed: ChangeFeed,
}

impl DocumentStore {
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        tracing::info!(path = %path.display(), "Opening document store");
        Ok(Self::from_connection(open_database(path)?))
    }

    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        Ok(Self::from_connection(open_memory_database()?))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
            feed: ChangeFeed::new(),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, DatabaseError> {
        self.conn.lock().map_err(|_| DatabaseError::LockPoisoned)
    }

    // ── Reads ───────────────────────────────────────────────

    pub fn get_all(&self, collection: Collection) -> Result<Vec<Document>, DatabaseError> {
        self.query(collection, &Query::new())
    }

    pub fn get_by_id(&self, collection: Collection, id: &str) -> Result<Document, DatabaseError> {
        let conn = self.lock()?;
        fetch_row(&conn, collection, id)?
            .ok_or_else(|| DatabaseError::not_found(collection.as_str(), id))
    }

    pub fn query(&self, collection: Collection, query: &Query) -> Result<Vec<Document>, DatabaseError> {
        let (sql, values) = build_select(collection.as_str(), query)?;
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values), read_row)?;
        let mut docs = Vec::new();
        for row in rows {
            docs.push(document_from_row(collection, row?)?);
        }
        Ok(docs)
    }

    pub fn count(&self, collection: Collection) -> Result<usize, DatabaseError> {
        let conn = self.lock()?;
        let n: i64 = conn.query_row(
            "SELECT COUNT(*) FROM documents WHERE collection = ?1",
            params![collection.as_str()],
            |row| row.get(0),
        )?;
        Ok(n.max(0) as usize)
    }

    // ── Single writes ───────────────────────────────────────

    pub fn create(&self, collection: Collection, data: Value) -> Result<Document, DatabaseError> {
        let data = into_object(collection, data)?;
        let doc = {
            let conn = self.lock()?;
            insert_row(&conn, collection, &data, &now_timestamp())
        }
        .inspect_err(|e| tracing::warn!(collection = collection.as_str(), "Create failed: {e}"))?;
        tracing::debug!(collection = collection.as_str(), id = %doc.id, "Document created");
        self.publish(collection, ChangeKind::Created, &doc.id);
        Ok(doc)
    }

    /// Merge `patch` into the document's top-level fields.
    ///
    /// With `expected_version`, the write only happens if the stored
    /// version still matches.
    pub fn update(
        &self,
        collection: Collection,
        id: &str,
        patch: Value,
        expected_version: Option<i64>,
    ) -> Result<Document, DatabaseError> {
        let patch = into_object(collection, patch)?;
        let doc = {
            let conn = self.lock()?;
            update_row(&conn, collection, id, &patch, expected_version, &now_timestamp())
        }
        .inspect_err(|e| tracing::warn!(collection = collection.as_str(), id, "Update failed: {e}"))?;
        self.publish(collection, ChangeKind::Updated, id);
        Ok(doc)
    }

    pub fn delete(&self, collection: Collection, id: &str) -> Result<(), DatabaseError> {
        let result = {
            let conn = self.lock()?;
            delete_row(&conn, collection, id)
        };
        result.inspect_err(|e| tracing::warn!(collection = collection.as_str(), id, "Delete failed: {e}"))?;
        self.publish(collection, ChangeKind::Deleted, id);
        Ok(())
    }

    // ── Batches ─────────────────────────────────────────────

    /// Apply all ops atomically. Any failure rolls back the whole batch.
    pub fn commit_batch(&self, ops: Vec<WriteOp>) -> Result<Vec<WriteResult>, DatabaseError> {
        if ops.len() > MAX_BATCH_WRITES {
            return Err(DatabaseError::InvalidQuery(format!(
                "batch of {} writes exceeds the limit of {MAX_BATCH_WRITES}",
                ops.len()
            )));
        }
        if ops.is_empty() {
            return Ok(Vec::new());
        }

        let now = now_timestamp();
        let mut results = Vec::with_capacity(ops.len());
        let mut events = Vec::with_capacity(ops.len());
        {
            let mut conn = self.lock()?;
            let tx = conn.transaction()?;
            for op in ops {
                match op {
                    WriteOp::Create { collection, data } => {
                        let doc = insert_row(&tx, collection, &data, &now)?;
                        events.push((collection, ChangeKind::Created, doc.id.clone()));
                        results.push(WriteResult::Written(doc));
                    }
                    WriteOp::Update {
                        collection,
                        id,
                        patch,
                        expected_version,
                    } => {
                        let doc = update_row(&tx, collection, &id, &patch, expected_version, &now)?;
                        events.push((collection, ChangeKind::Updated, id));
                        results.push(WriteResult::Written(doc));
                    }
                    WriteOp::Delete { collection, id } => {
                        delete_row(&tx, collection, &id)?;
                        events.push((collection, ChangeKind::Deleted, id.clone()));
                        results.push(WriteResult::Deleted { id });
                    }
                }
            }
            tx.commit()?;
        }

        tracing::debug!(writes = events.len(), "Batch committed");
        for (collection, kind, id) in events {
            self.publish(collection, kind, &id);
        }
        Ok(results)
    }

    pub fn batch_create(
        &self,
        collection: Collection,
        items: Vec<Value>,
    ) -> Result<Vec<Document>, DatabaseError> {
        let ops = items
            .into_iter()
            .map(|data| {
                Ok(WriteOp::Create {
                    collection,
                    data: into_object(collection, data)?,
                })
            })
            .collect::<Result<Vec<_>, DatabaseError>>()?;
        Ok(written(self.commit_batch(ops)?))
    }

    /// Each update is `(id, patch, expected_version)`.
    pub fn batch_update(
        &self,
        collection: Collection,
        updates: Vec<(String, Value, Option<i64>)>,
    ) -> Result<Vec<Document>, DatabaseError> {
        let ops = updates
            .into_iter()
            .map(|(id, patch, expected_version)| {
                Ok(WriteOp::Update {
                    collection,
                    id,
                    patch: into_object(collection, patch)?,
                    expected_version,
                })
            })
            .collect::<Result<Vec<_>, DatabaseError>>()?;
        Ok(written(self.commit_batch(ops)?))
    }

    pub fn batch_delete(&self, collection: Collection, ids: Vec<String>) -> Result<(), DatabaseError> {
        let ops = ids
            .into_iter()
            .map(|id| WriteOp::Delete { collection, id })
            .collect();
        self.commit_batch(ops)?;
        Ok(())
    }

    // ── Listeners ───────────────────────────────────────────

    pub fn subscribe(&self, collection: Collection) -> Subscription {
        self.feed.subscribe(collection)
    }

    pub fn unsubscribe(&self, id: &Uuid) -> bool {
        self.feed.unsubscribe(id)
    }

    pub fn unsubscribe_all(&self) -> usize {
        self.feed.unsubscribe_all()
    }

    pub fn active_listeners(&self) -> usize {
        self.feed.active_listeners()
    }

    fn publish(&self, collection: Collection, kind: ChangeKind, id: &str) {
        self.feed.publish(ChangeEvent {
            collection,
            kind,
            id: Some(id.to_string()),
        });
    }
}

fn written(results: Vec<WriteResult>) -> Vec<Document> {
    results
        .into_iter()
        .filter_map(|r| match r {
            WriteResult::Written(doc) => Some(doc),
            WriteResult::Deleted { .. } => None,
        })
        .collect()
}

pub(crate) fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn into_object(collection: Collection, value: Value) -> Result<Map<String, Value>, DatabaseError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(DatabaseError::Validation {
            collection: collection.as_str().to_string(),
            reason: format!("expected a JSON object, got {}", json_kind(&other)),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn strip_reserved(data: &Map<String, Value>) -> Map<String, Value> {
    data.iter()
        .filter(|(k, _)| !RESERVED_FIELDS.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

// ═══════════════════════════════════════════
// Row helpers (shared by single writes and batches)
// ═══════════════════════════════════════════

struct DocumentRow {
    id: String,
    data: String,
    version: i64,
    created_at: String,
    updated_at: String,
}

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<DocumentRow> {
    Ok(DocumentRow {
        id: row.get(0)?,
        data: row.get(1)?,
        version: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

fn document_from_row(collection: Collection, row: DocumentRow) -> Result<Document, DatabaseError> {
    let data = match serde_json::from_str::<Value>(&row.data) {
        Ok(Value::Object(map)) => map,
        Ok(_) => {
            return Err(DatabaseError::CorruptDocument {
                collection: collection.as_str().to_string(),
                id: row.id,
                reason: "body is not an object".into(),
            })
        }
        Err(e) => {
            return Err(DatabaseError::CorruptDocument {
                collection: collection.as_str().to_string(),
                id: row.id,
                reason: e.to_string(),
            })
        }
    };
    Ok(Document {
        id: row.id,
        version: row.version,
        created_at: row.created_at,
        updated_at: row.updated_at,
        data,
    })
}

fn fetch_row(
    conn: &Connection,
    collection: Collection,
    id: &str,
) -> Result<Option<Document>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, data, version, created_at, updated_at
             FROM documents WHERE collection = ?1 AND id = ?2",
            params![collection.as_str(), id],
            read_row,
        )
        .optional()?;
    row.map(|r| document_from_row(collection, r)).transpose()
}

fn insert_row(
    conn: &Connection,
    collection: Collection,
    data: &Map<String, Value>,
    now: &str,
) -> Result<Document, DatabaseError> {
    let id = Uuid::new_v4().to_string();
    let body = strip_reserved(data);
    conn.execute(
        "INSERT INTO documents (collection, id, data, version, created_at, updated_at)
         VALUES (?1, ?2, ?3, 1, ?4, ?4)",
        params![collection.as_str(), id, serde_json::to_string(&body)?, now],
    )
    .map_err(|e| constraint_error(collection, e))?;
    Ok(Document {
        id,
        version: 1,
        created_at: now.to_string(),
        updated_at: now.to_string(),
        data: body,
    })
}

fn update_row(
    conn: &Connection,
    collection: Collection,
    id: &str,
    patch: &Map<String, Value>,
    expected_version: Option<i64>,
    now: &str,
) -> Result<Document, DatabaseError> {
    let current = fetch_row(conn, collection, id)?
        .ok_or_else(|| DatabaseError::not_found(collection.as_str(), id))?;

    if let Some(expected) = expected_version {
        if expected != current.version {
            return Err(DatabaseError::VersionConflict {
                collection: collection.as_str().to_string(),
                id: id.to_string(),
                expected,
                actual: current.version,
            });
        }
    }

    let mut data = current.data;
    for (key, value) in strip_reserved(patch) {
        data.insert(key, value);
    }

    // The version guard in WHERE makes the read-modify-write atomic even
    // for a connection shared across threads.
    let changed = conn.execute(
        "UPDATE documents SET data = ?1, version = version + 1, updated_at = ?2
         WHERE collection = ?3 AND id = ?4 AND version = ?5",
        params![
            serde_json::to_string(&data)?,
            now,
            collection.as_str(),
            id,
            current.version
        ],
    )
    .map_err(|e| constraint_error(collection, e))?;
    if changed == 0 {
        return Err(DatabaseError::VersionConflict {
            collection: collection.as_str().to_string(),
            id: id.to_string(),
            expected: current.version,
            actual: current.version + 1,
        });
    }

    Ok(Document {
        id: id.to_string(),
        version: current.version + 1,
        created_at: current.created_at,
        updated_at: now.to_string(),
        data,
    })
}

/// Unique-index and CHECK failures are rule refusals, not storage faults.
fn constraint_error(collection: Collection, err: rusqlite::Error) -> DatabaseError {
    match err.sqlite_error_code() {
        Some(rusqlite::ErrorCode::ConstraintViolation) => DatabaseError::ConstraintViolation(format!(
            "{} write rejected: {err}",
            collection.as_str()
        )),
        _ => DatabaseError::Sqlite(err),
    }
}

fn delete_row(conn: &Connection, collection: Collection, id: &str) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "DELETE FROM documents WHERE collection = ?1 AND id = ?2",
        params![collection.as_str(), id],
    )?;
    if changed == 0 {
        return Err(DatabaseError::not_found(collection.as_str(), id));
    }
    Ok(())
}
