use async_trait::async_trait;
use query_core::OrderBy;

use crate::contract::model::{Habit, HabitFilter, Tag};

/// Port for habit persistence. Orderings arrive as storage paths built by the
/// sort mapping definitions; an unknown path is a storage error.
#[async_trait]
pub trait HabitsRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> anyhow::Result<Option<Habit>>;
    async fn insert(&self, habit: Habit) -> anyhow::Result<()>;
    /// Replace by `habit.id`. Returns false if no such habit exists.
    async fn update(&self, habit: Habit) -> anyhow::Result<bool>;
    /// Returns true if a habit was deleted.
    async fn delete(&self, id: &str) -> anyhow::Result<bool>;
    async fn count(&self, filter: &HabitFilter) -> anyhow::Result<u64>;
    async fn list(
        &self,
        filter: &HabitFilter,
        order: &OrderBy,
        offset: u64,
        limit: u64,
    ) -> anyhow::Result<Vec<Habit>>;
}

/// Port for tag persistence. Deleting a tag detaches it from every habit.
#[async_trait]
pub trait TagsRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> anyhow::Result<Option<Tag>>;
    /// Tags among `ids`, in the order of `ids`; unknown ids are skipped.
    async fn find_many(&self, ids: &[String]) -> anyhow::Result<Vec<Tag>>;
    /// Exact name match, ignoring the tag `except_id`.
    async fn name_exists(&self, name: &str, except_id: Option<&str>) -> anyhow::Result<bool>;
    async fn insert(&self, tag: Tag) -> anyhow::Result<()>;
    async fn update(&self, tag: Tag) -> anyhow::Result<bool>;
    async fn delete(&self, id: &str) -> anyhow::Result<bool>;
    async fn list(&self, order: &OrderBy) -> anyhow::Result<Vec<Tag>>;
}
