use async_trait::async_trait;
use parking_lot::RwLock;
use query_core::OrderBy;

use super::sort_value::{sort_rows, SortValue, Sortable};
use crate::contract::model::{Habit, HabitFilter, Ordinal, Tag};
use crate::domain::repo::{HabitsRepository, TagsRepository};

/// In-memory storage for habits and tags.
///
/// Rows keep insertion order; every read clones out of the lock, so no guard is held
/// across an await point.
#[derive(Default)]
pub struct InMemoryStore {
    habits: RwLock<Vec<Habit>>,
    tags: RwLock<Vec<Tag>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Sortable for Habit {
    fn sort_value(&self, path: &str) -> Option<SortValue> {
        let v = match path {
            "id" => SortValue::text(&self.id),
            "name" => SortValue::text(&self.name),
            "description" => SortValue::opt_text(self.description.as_deref()),
            "type" => SortValue::Int(self.habit_type.ordinal()),
            "frequency.type" => SortValue::Int(self.frequency.frequency_type.ordinal()),
            "frequency.times_per_period" => {
                SortValue::Int(i64::from(self.frequency.times_per_period))
            }
            "target.value" => SortValue::Int(i64::from(self.target.value)),
            "target.unit" => SortValue::text(&self.target.unit),
            "status" => SortValue::Int(self.status.ordinal()),
            "is_archived" => SortValue::Bool(self.is_archived),
            "end_date" => SortValue::opt_date(self.end_date),
            "created_at_utc" => SortValue::Time(self.created_at_utc),
            "updated_at_utc" => SortValue::opt_time(self.updated_at_utc),
            "last_completed_at_utc" => SortValue::opt_time(self.last_completed_at_utc),
            _ => return None,
        };
        Some(v)
    }
}

impl Sortable for Tag {
    fn sort_value(&self, path: &str) -> Option<SortValue> {
        let v = match path {
            "id" => SortValue::text(&self.id),
            "name" => SortValue::text(&self.name),
            "description" => SortValue::opt_text(self.description.as_deref()),
            "created_at_utc" => SortValue::Time(self.created_at_utc),
            "updated_at_utc" => SortValue::opt_time(self.updated_at_utc),
            _ => return None,
        };
        Some(v)
    }
}

fn window<T>(rows: Vec<T>, offset: u64, limit: u64) -> Vec<T> {
    let offset = usize::try_from(offset).unwrap_or(usize::MAX);
    let limit = usize::try_from(limit).unwrap_or(usize::MAX);
    rows.into_iter().skip(offset).take(limit).collect()
}

#[async_trait]
impl HabitsRepository for InMemoryStore {
    async fn find_by_id(&self, id: &str) -> anyhow::Result<Option<Habit>> {
        Ok(self.habits.read().iter().find(|h| h.id == id).cloned())
    }

    async fn insert(&self, habit: Habit) -> anyhow::Result<()> {
        let mut habits = self.habits.write();
        if habits.iter().any(|h| h.id == habit.id) {
            anyhow::bail!("habit '{}' already exists", habit.id);
        }
        habits.push(habit);
        Ok(())
    }

    async fn update(&self, habit: Habit) -> anyhow::Result<bool> {
        let mut habits = self.habits.write();
        match habits.iter_mut().find(|h| h.id == habit.id) {
            Some(slot) => {
                *slot = habit;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: &str) -> anyhow::Result<bool> {
        let mut habits = self.habits.write();
        let before = habits.len();
        habits.retain(|h| h.id != id);
        Ok(habits.len() != before)
    }

    async fn count(&self, filter: &HabitFilter) -> anyhow::Result<u64> {
        let n = self.habits.read().iter().filter(|h| filter.matches(h)).count();
        Ok(n as u64)
    }

    async fn list(
        &self,
        filter: &HabitFilter,
        order: &OrderBy,
        offset: u64,
        limit: u64,
    ) -> anyhow::Result<Vec<Habit>> {
        let mut rows: Vec<Habit> = self
            .habits
            .read()
            .iter()
            .filter(|h| filter.matches(h))
            .cloned()
            .collect();
        sort_rows(&mut rows, order)?;
        Ok(window(rows, offset, limit))
    }
}

#[async_trait]
impl TagsRepository for InMemoryStore {
    async fn find_by_id(&self, id: &str) -> anyhow::Result<Option<Tag>> {
        Ok(self.tags.read().iter().find(|t| t.id == id).cloned())
    }

    async fn find_many(&self, ids: &[String]) -> anyhow::Result<Vec<Tag>> {
        let tags = self.tags.read();
        Ok(ids
            .iter()
            .filter_map(|id| tags.iter().find(|t| &t.id == id).cloned())
            .collect())
    }

    async fn name_exists(&self, name: &str, except_id: Option<&str>) -> anyhow::Result<bool> {
        Ok(self
            .tags
            .read()
            .iter()
            .any(|t| t.name == name && Some(t.id.as_str()) != except_id))
    }

    async fn insert(&self, tag: Tag) -> anyhow::Result<()> {
        let mut tags = self.tags.write();
        if tags.iter().any(|t| t.id == tag.id) {
            anyhow::bail!("tag '{}' already exists", tag.id);
        }
        tags.push(tag);
        Ok(())
    }

    async fn update(&self, tag: Tag) -> anyhow::Result<bool> {
        let mut tags = self.tags.write();
        match tags.iter_mut().find(|t| t.id == tag.id) {
            Some(slot) => {
                *slot = tag;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: &str) -> anyhow::Result<bool> {
        let removed = {
            let mut tags = self.tags.write();
            let before = tags.len();
            tags.retain(|t| t.id != id);
            tags.len() != before
        };
        if removed {
            for habit in self.habits.write().iter_mut() {
                habit.tag_ids.retain(|t| t != id);
            }
        }
        Ok(removed)
    }

    async fn list(&self, order: &OrderBy) -> anyhow::Result<Vec<Tag>> {
        let mut rows = self.tags.read().clone();
        sort_rows(&mut rows, order)?;
        Ok(rows)
    }
}
