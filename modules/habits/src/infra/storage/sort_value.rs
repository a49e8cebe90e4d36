//! Typed comparison keys for ordering in-memory rows by storage path.

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, Utc};
use query_core::{OrderBy, SortDir};

/// A comparable column value. `Null` sorts before every other value.
#[derive(Debug, Clone, PartialEq)]
pub enum SortValue {
    Null,
    Bool(bool),
    Int(i64),
    Text(String),
    Date(NaiveDate),
    Time(DateTime<Utc>),
}

impl SortValue {
    fn rank(&self) -> u8 {
        match self {
            SortValue::Null => 0,
            SortValue::Bool(_) => 1,
            SortValue::Int(_) => 2,
            SortValue::Text(_) => 3,
            SortValue::Date(_) => 4,
            SortValue::Time(_) => 5,
        }
    }

    pub fn text(s: &str) -> Self {
        SortValue::Text(s.to_owned())
    }

    pub fn opt_text(s: Option<&str>) -> Self {
        s.map_or(SortValue::Null, SortValue::text)
    }

    pub fn opt_time(t: Option<DateTime<Utc>>) -> Self {
        t.map_or(SortValue::Null, SortValue::Time)
    }

    pub fn opt_date(d: Option<NaiveDate>) -> Self {
        d.map_or(SortValue::Null, SortValue::Date)
    }
}

impl Eq for SortValue {}

impl PartialOrd for SortValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SortValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortValue::Bool(a), SortValue::Bool(b)) => a.cmp(b),
            (SortValue::Int(a), SortValue::Int(b)) => a.cmp(b),
            (SortValue::Text(a), SortValue::Text(b)) => a.cmp(b),
            (SortValue::Date(a), SortValue::Date(b)) => a.cmp(b),
            (SortValue::Time(a), SortValue::Time(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

/// Rows that expose their columns by storage path.
pub trait Sortable {
    /// `None` when `path` is not a column of this row type.
    fn sort_value(&self, path: &str) -> Option<SortValue>;
}

/// Stable sort by `order`, first key most significant.
///
/// Every path is checked up front so an unknown one fails before any row moves.
pub fn sort_rows<T: Sortable>(rows: &mut [T], order: &OrderBy) -> anyhow::Result<()> {
    let Some(first) = rows.first() else {
        return Ok(());
    };
    for key in order.keys() {
        if first.sort_value(&key.field).is_none() {
            anyhow::bail!("unknown storage path '{}' in ordering", key.field);
        }
    }

    rows.sort_by(|a, b| {
        for key in order.keys() {
            let left = a.sort_value(&key.field).unwrap_or(SortValue::Null);
            let right = b.sort_value(&key.field).unwrap_or(SortValue::Null);
            let ord = match key.dir {
                SortDir::Asc => left.cmp(&right),
                SortDir::Desc => right.cmp(&left),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    });
    Ok(())
}
