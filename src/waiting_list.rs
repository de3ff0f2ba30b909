//! Waiting-list queue — ordered view of patients awaiting care.
//!
//! `WaitingList` is the in-memory queue: entries are kept in `position`
//! order and every structural change renumbers them to a dense 1..N
//! sequence. Sorting and filtering produce views; they never renumber.
//!
//! The store-backed functions at the bottom load the collection, apply one
//! operation and write back only the entries that changed, in one batch
//! guarded by each entry's loaded version. A concurrent edit to any touched
//! entry fails the whole batch with a version conflict.

use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::{to_fields, DatabaseError, DocumentStore, Stored, WriteOp};
use crate::models::enums::{Collection, Priority, WaitingStatus};
use crate::models::filters::{matches_search, WaitingListFilter};
use crate::models::{NewWaitingEntry, WaitingListItem};

pub type WaitingEntry = Stored<WaitingListItem>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveDirection {
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortMode {
    #[default]
    #[serde(rename = "position")]
    Position,
    #[serde(rename = "priority")]
    Priority,
    #[serde(rename = "waitTime")]
    WaitTime,
    #[serde(rename = "addedAt")]
    AddedAt,
}

impl FromStr for SortMode {
    type Err = DatabaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "position" => Ok(Self::Position),
            "priority" => Ok(Self::Priority),
            "waitTime" => Ok(Self::WaitTime),
            "addedAt" => Ok(Self::AddedAt),
            _ => Err(DatabaseError::InvalidEnum {
                field: "SortMode".into(),
                value: s.into(),
            }),
        }
    }
}

/// Queue summary for the dashboard and the queue header.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueStats {
    pub total: usize,
    pub waiting: usize,
    pub called: usize,
    pub no_response: usize,
    pub seen: usize,
    pub urgent_waiting: usize,
    /// Mean `estimatedWaitTime` of waiting entries, in minutes.
    pub average_estimated_wait: u32,
    /// Longest time since `addedAt` among entries not yet seen, in minutes.
    pub longest_wait_minutes: i64,
}

#[derive(Debug, Clone, Default)]
pub struct WaitingList {
    entries: Vec<WaitingEntry>,
}

impl WaitingList {
    /// Build a queue from entries in any order; ties on `position` keep
    /// the oldest `addedAt` first.
    pub fn new(mut entries: Vec<WaitingEntry>) -> Self {
        entries.sort_by(|a, b| {
            a.position
                .cmp(&b.position)
                .then_with(|| a.added_at.cmp(&b.added_at))
        });
        Self { entries }
    }

    pub fn entries(&self) -> &[WaitingEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<WaitingEntry> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&WaitingEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    fn index_of(&self, id: &str) -> Result<usize, DatabaseError> {
        self.entries
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| DatabaseError::not_found(Collection::WaitingList.as_str(), id))
    }

    pub fn next_position(&self) -> Result<u32, DatabaseError> {
        let last = self.entries.iter().map(|e| e.position).max().unwrap_or(0);
        last.checked_add(1).ok_or_else(|| {
            DatabaseError::ConstraintViolation(format!(
                "no queue position after {last}; reorder or remove an entry to renumber"
            ))
        })
    }

    /// Build the record for a patient joining the end of the queue.
    pub fn new_item(&self, entry: NewWaitingEntry, now: DateTime<Utc>) -> Result<WaitingListItem, DatabaseError> {
        Ok(WaitingListItem {
            patient_id: entry.patient_id,
            patient_name: entry.patient_name,
            doctor_id: entry.doctor_id,
            doctor_name: entry.doctor_name,
            department: entry.department,
            reason: entry.reason,
            phone: entry.phone,
            position: self.next_position()?,
            priority: entry.priority,
            estimated_wait_time: entry.estimated_wait_time,
            status: WaitingStatus::Waiting,
            reminders_sent: 0,
            added_at: now,
            called_at: None,
            notes: entry.notes,
        })
    }

    /// Append an entry that is not backed by a store (demo mode).
    pub fn add(&mut self, entry: NewWaitingEntry, now: DateTime<Utc>) -> Result<&WaitingEntry, DatabaseError> {
        let item = self.new_item(entry, now)?;
        self.entries.push(Stored::detached(item));
        Ok(&self.entries[self.entries.len() - 1])
    }

    /// Filtered and sorted view. Sorting is stable; ties keep queue order.
    pub fn view(&self, filter: &WaitingListFilter, sort: SortMode) -> Vec<&WaitingEntry> {
        let mut items: Vec<&WaitingEntry> = self
            .entries
            .iter()
            .filter(|e| filter.status.map_or(true, |s| e.status == s))
            .filter(|e| {
                matches_search(
                    filter.search.as_deref(),
                    [
                        Some(e.patient_name.as_str()),
                        e.doctor_name.as_deref(),
                        e.department.as_deref(),
                        e.reason.as_deref(),
                    ],
                )
            })
            .collect();
        sort_view(&mut items, sort);
        items
    }

    /// Swap an entry with its neighbour in the filtered view, then renumber.
    ///
    /// Returns `Ok(false)` when the move is a no-op: `Up` at position 1 or
    /// at the top of the view, `Down` at the bottom of the view, or an entry
    /// hidden by the filter.
    pub fn reorder(
        &mut self,
        id: &str,
        direction: MoveDirection,
        filter: &WaitingListFilter,
    ) -> Result<bool, DatabaseError> {
        let target = self.index_of(id)?;
        let view: Vec<String> = self
            .view(filter, SortMode::Position)
            .into_iter()
            .map(|e| e.id.clone())
            .collect();
        let Some(view_idx) = view.iter().position(|v| v == id) else {
            return Ok(false);
        };

        let neighbour_id = match direction {
            MoveDirection::Up => {
                if self.entries[target].position == 1 || view_idx == 0 {
                    return Ok(false);
                }
                &view[view_idx - 1]
            }
            MoveDirection::Down => {
                if view_idx + 1 >= view.len() {
                    return Ok(false);
                }
                &view[view_idx + 1]
            }
        };
        let neighbour = self.index_of(neighbour_id)?;

        self.entries.swap(target, neighbour);
        self.renumber();
        tracing::debug!(id, ?direction, "Waiting list entry moved");
        Ok(true)
    }

    /// Rewrite positions as 1..N in current order.
    pub fn renumber(&mut self) {
        for (i, entry) in self.entries.iter_mut().enumerate() {
            entry.position = (i + 1) as u32;
        }
    }

    pub fn remove(&mut self, id: &str) -> Result<WaitingEntry, DatabaseError> {
        let idx = self.index_of(id)?;
        let removed = self.entries.remove(idx);
        self.renumber();
        Ok(removed)
    }

    /// Set any status. No transition is refused based on the current one;
    /// moving to `called` stamps `calledAt`.
    pub fn set_status(
        &mut self,
        id: &str,
        status: WaitingStatus,
        now: DateTime<Utc>,
    ) -> Result<&WaitingEntry, DatabaseError> {
        let idx = self.index_of(id)?;
        let entry = &mut self.entries[idx];
        entry.status = status;
        if status == WaitingStatus::Called {
            entry.called_at = Some(now);
        }
        Ok(&self.entries[idx])
    }

    pub fn call(&mut self, id: &str, now: DateTime<Utc>) -> Result<&WaitingEntry, DatabaseError> {
        self.set_status(id, WaitingStatus::Called, now)
    }

    pub fn mark_no_response(&mut self, id: &str, now: DateTime<Utc>) -> Result<&WaitingEntry, DatabaseError> {
        self.set_status(id, WaitingStatus::NoResponse, now)
    }

    /// Call again after no response.
    pub fn recall(&mut self, id: &str, now: DateTime<Utc>) -> Result<&WaitingEntry, DatabaseError> {
        self.set_status(id, WaitingStatus::Called, now)
    }

    pub fn mark_seen(&mut self, id: &str, now: DateTime<Utc>) -> Result<&WaitingEntry, DatabaseError> {
        self.set_status(id, WaitingStatus::Seen, now)
    }

    /// Count a reminder. Delivery is not modelled.
    pub fn send_reminder(&mut self, id: &str) -> Result<&WaitingEntry, DatabaseError> {
        let idx = self.index_of(id)?;
        self.entries[idx].reminders_sent = self.entries[idx].reminders_sent.saturating_add(1);
        Ok(&self.entries[idx])
    }

    /// Recompute `estimatedWaitTime` for waiting entries from their rank
    /// among waiting entries in queue order. Estimates cap at `u32::MAX`.
    pub fn estimate_wait_times(&mut self, minutes_per_patient: u32) {
        let mut ahead = 0u32;
        for entry in self.entries.iter_mut() {
            if entry.status == WaitingStatus::Waiting {
                ahead = ahead.saturating_add(1);
                entry.estimated_wait_time = ahead.saturating_mul(minutes_per_patient);
            }
        }
    }

    pub fn stats(&self, now: DateTime<Utc>) -> QueueStats {
        let mut stats = QueueStats {
            total: self.entries.len(),
            ..Default::default()
        };
        let mut wait_sum = 0u64;
        for entry in &self.entries {
            match entry.status {
                WaitingStatus::Waiting => {
                    stats.waiting += 1;
                    wait_sum += u64::from(entry.estimated_wait_time);
                    if entry.priority == Priority::Urgent {
                        stats.urgent_waiting += 1;
                    }
                }
                WaitingStatus::Called => stats.called += 1,
                WaitingStatus::NoResponse => stats.no_response += 1,
                WaitingStatus::Seen => stats.seen += 1,
            }
            if entry.status != WaitingStatus::Seen {
                let waited = (now - entry.added_at).num_minutes();
                stats.longest_wait_minutes = stats.longest_wait_minutes.max(waited);
            }
        }
        if stats.waiting > 0 {
            stats.average_estimated_wait = (wait_sum / stats.waiting as u64) as u32;
        }
        stats
    }
}

/// Sort a view in place. Stable, so ties keep their incoming order.
pub fn sort_view(items: &mut [&WaitingEntry], mode: SortMode) {
    match mode {
        SortMode::Position => items.sort_by_key(|e| e.position),
        SortMode::Priority => items.sort_by(|a, b| b.priority.rank().cmp(&a.priority.rank())),
        SortMode::WaitTime => items.sort_by_key(|e| e.estimated_wait_time),
        SortMode::AddedAt => items.sort_by_key(|e| e.added_at),
    }
}

// ═══════════════════════════════════════════
// Store-backed operations
// ═══════════════════════════════════════════

pub fn load_queue(store: &DocumentStore) -> Result<WaitingList, DatabaseError> {
    Ok(WaitingList::new(store.fetch_all::<WaitingListItem>()?))
}

/// Load the queue, run `op`, and persist whatever it changed atomically.
fn apply<T>(
    store: &DocumentStore,
    op: impl FnOnce(&mut WaitingList) -> Result<T, DatabaseError>,
) -> Result<(T, WaitingList), DatabaseError> {
    let mut list = load_queue(store)?;
    let before: HashMap<String, WaitingEntry> = list
        .entries()
        .iter()
        .map(|e| (e.id.clone(), e.clone()))
        .collect();

    let out = op(&mut list)?;

    let mut ops = Vec::new();
    let mut remaining = before.clone();
    for entry in list.entries() {
        match remaining.remove(&entry.id) {
            Some(old) if old.record == entry.record => {}
            Some(old) => ops.push(WriteOp::Update {
                collection: Collection::WaitingList,
                id: entry.id.clone(),
                patch: to_fields(&entry.record)?,
                expected_version: Some(old.version),
            }),
            None => {
                return Err(DatabaseError::ConstraintViolation(
                    "waiting list entries must be inserted through add_to_queue".into(),
                ))
            }
        }
    }
    for (id, _) in remaining {
        ops.push(WriteOp::Delete {
            collection: Collection::WaitingList,
            id,
        });
    }

    if !ops.is_empty() {
        store.commit_batch(ops).inspect_err(|e| {
            tracing::warn!("Waiting list write rejected: {e}");
        })?;
    }
    Ok((out, load_queue(store)?))
}

pub fn add_to_queue(
    store: &DocumentStore,
    entry: NewWaitingEntry,
    now: DateTime<Utc>,
) -> Result<WaitingEntry, DatabaseError> {
    let list = load_queue(store)?;
    let item = list.new_item(entry, now)?;
    let stored = store.insert(&item)?;
    tracing::info!(id = %stored.id, position = stored.position, "Patient added to waiting list");
    Ok(stored)
}

pub fn remove_from_queue(store: &DocumentStore, id: &str) -> Result<WaitingList, DatabaseError> {
    let (_, list) = apply(store, |list| list.remove(id).map(|_| ()))?;
    Ok(list)
}

pub fn move_entry(
    store: &DocumentStore,
    id: &str,
    direction: MoveDirection,
    filter: &WaitingListFilter,
) -> Result<(bool, WaitingList), DatabaseError> {
    apply(store, |list| list.reorder(id, direction, filter))
}

/// Store-backed status change; see `WaitingList::set_status`.
pub fn update_status(
    store: &DocumentStore,
    id: &str,
    status: WaitingStatus,
    now: DateTime<Utc>,
) -> Result<WaitingEntry, DatabaseError> {
    apply(store, |list| list.set_status(id, status, now).map(|_| ()))?;
    store.fetch(id)
}

pub fn send_reminder(store: &DocumentStore, id: &str) -> Result<WaitingEntry, DatabaseError> {
    apply(store, |list| list.send_reminder(id).map(|_| ()))?;
    store.fetch(id)
}

pub fn refresh_wait_estimates(
    store: &DocumentStore,
    minutes_per_patient: u32,
) -> Result<WaitingList, DatabaseError> {
    let (_, list) = apply(store, |list| {
        list.estimate_wait_times(minutes_per_patient);
        Ok(())
    })?;
    Ok(list)
}
