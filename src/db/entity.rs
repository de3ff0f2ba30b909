//! Typed entity layer over the document store.
//!
//! Each record type is bound to one collection. Reading a document into its
//! type is where status enums and required fields get checked: a document
//! carrying an unknown status fails here instead of leaking into callers.

use std::ops::{Deref, DerefMut};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::query::Query;
use super::store::{now_timestamp, Document, DocumentStore};
use super::DatabaseError;
use crate::models::enums::Collection;
use crate::models::*;

pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const COLLECTION: Collection;
}

/// A record together with its store metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stored<T> {
    pub id: String,
    pub version: i64,
    pub created_at: String,
    pub updated_at: String,
    #[serde(flatten)]
    pub record: T,
}

impl<T: Entity> Stored<T> {
    pub fn from_document(doc: Document) -> Result<Self, DatabaseError> {
        let record = serde_json::from_value(Value::Object(doc.data)).map_err(|e| {
            DatabaseError::CorruptDocument {
                collection: T::COLLECTION.as_str().to_string(),
                id: doc.id.clone(),
                reason: e.to_string(),
            }
        })?;
        Ok(Self {
            id: doc.id,
            version: doc.version,
            created_at: doc.created_at,
            updated_at: doc.updated_at,
            record,
        })
    }

    /// A record that has not been written anywhere (demo data, previews).
    pub fn detached(record: T) -> Self {
        let now = now_timestamp();
        Self {
            id: Uuid::new_v4().to_string(),
            version: 0,
            created_at: now.clone(),
            updated_at: now,
            record,
        }
    }
}

impl<T> Deref for Stored<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.record
    }
}

impl<T> DerefMut for Stored<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.record
    }
}

/// Serialize a record into document fields.
pub fn to_fields<T: Serialize>(record: &T) -> Result<Map<String, Value>, DatabaseError> {
    match serde_json::to_value(record)? {
        Value::Object(map) => Ok(map),
        _ => Err(DatabaseError::ConstraintViolation(
            "record did not serialize to an object".into(),
        )),
    }
}

fn check<T: Entity>(fields: &Map<String, Value>) -> Result<(), DatabaseError> {
    serde_json::from_value::<T>(Value::Object(fields.clone()))
        .map(|_| ())
        .map_err(|e| DatabaseError::Validation {
            collection: T::COLLECTION.as_str().to_string(),
            reason: e.to_string(),
        })
}

/// Check raw document fields against the record type of `collection`.
pub fn validate_fields(collection: Collection, fields: &Map<String, Value>) -> Result<(), DatabaseError> {
    match collection {
        Collection::Patients => check::<Patient>(fields),
        Collection::Appointments => check::<Appointment>(fields),
        Collection::WaitingList => check::<WaitingListItem>(fields),
        Collection::Staff => check::<Staff>(fields),
        Collection::Inventory => check::<InventoryItem>(fields),
        Collection::Medications => check::<Medication>(fields),
        Collection::Prescriptions => check::<Prescription>(fields),
        Collection::LabOrders => check::<LabOrder>(fields),
        Collection::RadiologyStudies => check::<RadiologyStudy>(fields),
        Collection::Invoices => check::<Invoice>(fields),
        Collection::Payments => check::<Payment>(fields),
        Collection::InsuranceClaims => check::<InsuranceClaim>(fields),
    }
}

impl DocumentStore {
    pub fn insert<T: Entity>(&self, record: &T) -> Result<Stored<T>, DatabaseError> {
        let doc = self.create(T::COLLECTION, Value::Object(to_fields(record)?))?;
        Stored::from_document(doc)
    }

    pub fn fetch<T: Entity>(&self, id: &str) -> Result<Stored<T>, DatabaseError> {
        Stored::from_document(self.get_by_id(T::COLLECTION, id)?)
    }

    pub fn fetch_all<T: Entity>(&self) -> Result<Vec<Stored<T>>, DatabaseError> {
        self.get_all(T::COLLECTION)?
            .into_iter()
            .map(Stored::from_document)
            .collect()
    }

    pub fn fetch_where<T: Entity>(&self, query: &Query) -> Result<Vec<Stored<T>>, DatabaseError> {
        self.query(T::COLLECTION, query)?
            .into_iter()
            .map(Stored::from_document)
            .collect()
    }

    /// Write the whole record back, guarded by the version it was read at.
    pub fn replace<T: Entity>(&self, stored: &Stored<T>) -> Result<Stored<T>, DatabaseError> {
        let doc = self.update(
            T::COLLECTION,
            &stored.id,
            Value::Object(to_fields(&stored.record)?),
            Some(stored.version),
        )?;
        Stored::from_document(doc)
    }
}
