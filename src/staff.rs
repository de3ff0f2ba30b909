//! Staff roster views.

use std::collections::BTreeMap;

use chrono::Weekday;
use serde::Serialize;

use crate::db::{DatabaseError, DocumentStore, Stored};
use crate::format::{format_full_name, get_initials};
use crate::models::enums::EmploymentStatus;
use crate::models::filters::{matches_search, StaffFilter};
use crate::models::Staff;

pub type StoredStaff = Stored<Staff>;

impl Staff {
    pub fn full_name(&self) -> String {
        format_full_name(Some(&self.first_name), Some(&self.last_name))
    }

    pub fn initials(&self) -> String {
        get_initials(Some(&self.first_name), Some(&self.last_name))
    }

    pub fn works_on(&self, day: Weekday) -> bool {
        self.schedule.iter().any(|s| s.day == day)
    }
}

fn matches(member: &Staff, filter: &StaffFilter) -> bool {
    filter.role.map_or(true, |r| member.role == r)
        && filter.status.map_or(true, |s| member.employment_status == s)
        && filter
            .department
            .as_deref()
            .map_or(true, |d| member.department.eq_ignore_ascii_case(d.trim()))
        && matches_search(
            filter.search.as_deref(),
            [
                Some(member.first_name.as_str()),
                Some(member.last_name.as_str()),
                Some(member.email.as_str()),
                member.specialization.as_deref(),
            ],
        )
}

/// Matching staff ordered by last then first name.
pub fn filter_staff<'a>(staff: &'a [StoredStaff], filter: &StaffFilter) -> Vec<&'a StoredStaff> {
    let mut out: Vec<_> = staff.iter().filter(|s| matches(s, filter)).collect();
    out.sort_by(|a, b| {
        a.last_name
            .cmp(&b.last_name)
            .then_with(|| a.first_name.cmp(&b.first_name))
    });
    out
}

pub fn group_by_department<'a>(staff: &[&'a StoredStaff]) -> BTreeMap<String, Vec<&'a StoredStaff>> {
    let mut groups: BTreeMap<String, Vec<&'a StoredStaff>> = BTreeMap::new();
    for &member in staff {
        groups.entry(member.department.clone()).or_default().push(member);
    }
    groups
}

/// Active staff with a shift on `day`, in shift start order.
pub fn scheduled_on(staff: &[StoredStaff], day: Weekday) -> Vec<&StoredStaff> {
    let mut on_shift: Vec<_> = staff
        .iter()
        .filter(|s| s.employment_status == EmploymentStatus::Active && s.works_on(day))
        .collect();
    on_shift.sort_by_key(|s| s.schedule.iter().filter(|sh| sh.day == day).map(|sh| sh.start).min());
    on_shift
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffDirectory {
    pub members: Vec<StoredStaff>,
    pub by_department: BTreeMap<String, usize>,
}

pub fn list_staff(store: &DocumentStore, filter: &StaffFilter) -> Result<StaffDirectory, DatabaseError> {
    let all = store.fetch_all::<Staff>()?;
    let matching = filter_staff(&all, filter);
    let by_department = group_by_department(&matching)
        .into_iter()
        .map(|(dept, members)| (dept, members.len()))
        .collect();
    Ok(StaffDirectory {
        members: matching.into_iter().cloned().collect(),
        by_department,
    })
}
