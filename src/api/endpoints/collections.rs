//! Raw document access over any named collection.
//!
//! The store underneath is schemaless; writes arriving over HTTP are checked
//! against the collection's record type before they are committed, so a
//! client cannot park a document the typed modules would refuse to read.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::api::error::ApiError;
use crate::api::types::{parse_collection, ApiContext, ApiJson, ApiQuery};
use crate::db::{validate_fields, Document, DocumentStore, Query, WriteOp, WriteResult};
use crate::models::enums::Collection;

fn into_fields(collection: Collection, body: Value) -> Result<Map<String, Value>, ApiError> {
    match body {
        Value::Object(map) => Ok(map),
        other => Err(ApiError::BadRequest(format!(
            "{collection} documents must be JSON objects, got {other}"
        ))),
    }
}

/// Validate `patch` as it would look once merged into the stored document,
/// and return the version the write should be guarded by.
fn check_patch(
    store: &DocumentStore,
    collection: Collection,
    id: &str,
    patch: &Map<String, Value>,
    expected_version: Option<i64>,
) -> Result<i64, ApiError> {
    let current = store.get_by_id(collection, id)?;
    let version = current.version;
    let mut merged = current.data;
    merged.extend(patch.iter().map(|(k, v)| (k.clone(), v.clone())));
    validate_fields(collection, &merged)?;
    Ok(expected_version.unwrap_or(version))
}

/// `GET /api/collections/:collection`
pub async fn list(
    State(ctx): State<ApiContext>,
    Path(collection): Path<String>,
) -> Result<Json<Vec<Document>>, ApiError> {
    let collection = parse_collection(&collection)?;
    Ok(Json(ctx.store().get_all(collection)?))
}

/// `POST /api/collections/:collection`
pub async fn create(
    State(ctx): State<ApiContext>,
    Path(collection): Path<String>,
    ApiJson(body): ApiJson<Value>,
) -> Result<(StatusCode, Json<Document>), ApiError> {
    let collection = parse_collection(&collection)?;
    let fields = into_fields(collection, body)?;
    validate_fields(collection, &fields)?;
    let doc = ctx.store().create(collection, Value::Object(fields))?;
    Ok((StatusCode::CREATED, Json(doc)))
}

/// `GET /api/collections/:collection/:id`
pub async fn get(
    State(ctx): State<ApiContext>,
    Path((collection, id)): Path<(String, String)>,
) -> Result<Json<Document>, ApiError> {
    let collection = parse_collection(&collection)?;
    Ok(Json(ctx.store().get_by_id(collection, &id)?))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchParams {
    pub expected_version: Option<i64>,
}

/// `PATCH /api/collections/:collection/:id?expectedVersion=`
///
/// Without `expectedVersion` the write is still guarded by the version read
/// for validation, so a concurrent write between the two surfaces as a 409.
pub async fn patch(
    State(ctx): State<ApiContext>,
    Path((collection, id)): Path<(String, String)>,
    ApiQuery(params): ApiQuery<PatchParams>,
    ApiJson(body): ApiJson<Value>,
) -> Result<Json<Document>, ApiError> {
    let collection = parse_collection(&collection)?;
    let patch = into_fields(collection, body)?;
    let store = ctx.store();
    let version = check_patch(store, collection, &id, &patch, params.expected_version)?;
    Ok(Json(store.update(collection, &id, Value::Object(patch), Some(version))?))
}

/// `DELETE /api/collections/:collection/:id`
pub async fn delete(
    State(ctx): State<ApiContext>,
    Path((collection, id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let collection = parse_collection(&collection)?;
    ctx.store().delete(collection, &id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/collections/:collection/query`
pub async fn query(
    State(ctx): State<ApiContext>,
    Path(collection): Path<String>,
    ApiJson(query): ApiJson<Query>,
) -> Result<Json<Vec<Document>>, ApiError> {
    let collection = parse_collection(&collection)?;
    Ok(Json(ctx.store().query(collection, &query)?))
}

/// One write in a `/batch` body. The collection comes from the path.
#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum BatchWrite {
    Create {
        data: Map<String, Value>,
    },
    #[serde(rename_all = "camelCase")]
    Update {
        id: String,
        patch: Map<String, Value>,
        #[serde(default)]
        expected_version: Option<i64>,
    },
    Delete {
        id: String,
    },
}

#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    pub writes: Vec<BatchWrite>,
}

/// `POST /api/collections/:collection/batch` — all writes commit or none do.
pub async fn batch(
    State(ctx): State<ApiContext>,
    Path(collection): Path<String>,
    ApiJson(request): ApiJson<BatchRequest>,
) -> Result<Json<Vec<WriteResult>>, ApiError> {
    let collection = parse_collection(&collection)?;
    let store = ctx.store();
    let mut ops = Vec::with_capacity(request.writes.len());
    for write in request.writes {
        ops.push(match write {
            BatchWrite::Create { data } => {
                validate_fields(collection, &data)?;
                WriteOp::Create { collection, data }
            }
            BatchWrite::Update {
                id,
                patch,
                expected_version,
            } => {
                let version = check_patch(store, collection, &id, &patch, expected_version)?;
                WriteOp::Update {
                    collection,
                    id,
                    patch,
                    expected_version: Some(version),
                }
            }
            BatchWrite::Delete { id } => WriteOp::Delete { collection, id },
        });
    }
    Ok(Json(store.commit_batch(ops)?))
}
