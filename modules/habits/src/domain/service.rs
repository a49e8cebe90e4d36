use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use query_core::{OrderBy, PageRequest, PageSource, PaginationResult};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::contract::model::{
    Habit, HabitFilter, HabitPatch, HabitStatus, HabitWithTags, NewHabit, NewTag, Tag,
    HABIT_ID_PREFIX, TAG_ID_PREFIX,
};
use crate::domain::error::DomainError;
use crate::domain::repo::{HabitsRepository, TagsRepository};

/// Payload bounds checked before anything reaches storage.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub max_name_length: usize,
    pub max_description_length: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            max_name_length: 100,
            max_description_length: 500,
        }
    }
}

/// Domain service with business rules for habits and tags.
/// Depends only on the repository ports, not on infra types.
pub struct Service {
    habits: Arc<dyn HabitsRepository>,
    tags: Arc<dyn TagsRepository>,
    config: ServiceConfig,
}

/// Count + slice view of a filtered, ordered habit query.
struct HabitsPage<'a> {
    repo: &'a dyn HabitsRepository,
    filter: &'a HabitFilter,
    order: &'a OrderBy,
}

#[async_trait]
impl PageSource for HabitsPage<'_> {
    type Item = Habit;
    type Error = DomainError;

    async fn count(&self) -> Result<u64, DomainError> {
        Ok(self.repo.count(self.filter).await?)
    }

    async fn fetch(&self, offset: u64, limit: u64) -> Result<Vec<Habit>, DomainError> {
        Ok(self
            .repo
            .list(self.filter, self.order, offset, limit)
            .await?)
    }
}

impl Service {
    pub fn new(
        habits: Arc<dyn HabitsRepository>,
        tags: Arc<dyn TagsRepository>,
        config: ServiceConfig,
    ) -> Self {
        Self {
            habits,
            tags,
            config,
        }
    }

    #[instrument(name = "habits.service.get_habit", skip(self))]
    pub async fn get_habit(&self, id: &str) -> Result<Habit, DomainError> {
        self.habits
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::habit_not_found(id))
    }

    #[instrument(name = "habits.service.get_habit_with_tags", skip(self))]
    pub async fn get_habit_with_tags(&self, id: &str) -> Result<HabitWithTags, DomainError> {
        let habit = self.get_habit(id).await?;
        let tags = self
            .tags
            .find_many(&habit.tag_ids)
            .await?
            .into_iter()
            .map(|t| t.name)
            .collect();
        Ok(HabitWithTags { habit, tags })
    }

    #[instrument(
        name = "habits.service.list_habits_page",
        skip(self, filter, order),
        fields(order = %order)
    )]
    pub async fn list_habits_page(
        &self,
        filter: &HabitFilter,
        order: &OrderBy,
        page: PageRequest,
    ) -> Result<PaginationResult<Habit>, DomainError> {
        let source = HabitsPage {
            repo: self.habits.as_ref(),
            filter,
            order,
        };
        let result = PaginationResult::create(&source, page).await?;
        debug!(
            total = result.total_count(),
            returned = result.items().len(),
            "listed habits"
        );
        Ok(result)
    }

    #[instrument(name = "habits.service.create_habit", skip(self, new_habit), fields(name = %new_habit.name))]
    pub async fn create_habit(&self, new_habit: NewHabit) -> Result<Habit, DomainError> {
        self.validate_habit(&new_habit)?;

        let habit = Habit {
            id: new_id(HABIT_ID_PREFIX),
            name: new_habit.name,
            description: new_habit.description,
            habit_type: new_habit.habit_type,
            frequency: new_habit.frequency,
            target: new_habit.target,
            status: HabitStatus::Ongoing,
            is_archived: false,
            end_date: new_habit.end_date,
            milestone: new_habit.milestone,
            created_at_utc: Utc::now(),
            updated_at_utc: None,
            last_completed_at_utc: None,
            tag_ids: Vec::new(),
        };
        self.habits.insert(habit.clone()).await?;

        info!(id = %habit.id, "created habit");
        Ok(habit)
    }

    /// Full replace of the client-editable fields.
    #[instrument(name = "habits.service.update_habit", skip(self, update))]
    pub async fn update_habit(&self, id: &str, update: NewHabit) -> Result<(), DomainError> {
        self.validate_habit(&update)?;

        let mut habit = self.get_habit(id).await?;
        habit.name = update.name;
        habit.description = update.description;
        habit.habit_type = update.habit_type;
        habit.frequency = update.frequency;
        habit.target = update.target;
        habit.end_date = update.end_date;
        habit.milestone = update.milestone;
        habit.updated_at_utc = Some(Utc::now());

        self.store_habit(habit).await
    }

    #[instrument(name = "habits.service.patch_habit", skip(self, patch))]
    pub async fn patch_habit(&self, id: &str, patch: HabitPatch) -> Result<(), DomainError> {
        if let Some(name) = patch.name.as_deref() {
            self.validate_name(name)?;
        }
        if let Some(Some(description)) = &patch.description {
            self.validate_description(description)?;
        }

        let mut habit = self.get_habit(id).await?;
        if let Some(name) = patch.name {
            habit.name = name;
        }
        if let Some(description) = patch.description {
            habit.description = description;
        }
        habit.updated_at_utc = Some(Utc::now());

        self.store_habit(habit).await
    }

    #[instrument(name = "habits.service.delete_habit", skip(self))]
    pub async fn delete_habit(&self, id: &str) -> Result<(), DomainError> {
        if !self.habits.delete(id).await? {
            return Err(DomainError::habit_not_found(id));
        }
        info!(id, "deleted habit");
        Ok(())
    }

    /// Replace the tag set of a habit. Every id must name an existing tag.
    #[instrument(name = "habits.service.upsert_habit_tags", skip(self, tag_ids))]
    pub async fn upsert_habit_tags(
        &self,
        id: &str,
        tag_ids: Vec<String>,
    ) -> Result<(), DomainError> {
        let mut habit = self.get_habit(id).await?;

        let mut seen = HashSet::new();
        let tag_ids: Vec<String> = tag_ids
            .into_iter()
            .filter(|t| seen.insert(t.clone()))
            .collect();

        let requested: HashSet<&String> = tag_ids.iter().collect();
        let current: HashSet<&String> = habit.tag_ids.iter().collect();
        if requested == current {
            debug!("tag set unchanged");
            return Ok(());
        }

        let found = self.tags.find_many(&tag_ids).await?;
        if found.len() != tag_ids.len() {
            let known: HashSet<&str> = found.iter().map(|t| t.id.as_str()).collect();
            let ids = tag_ids
                .iter()
                .filter(|t| !known.contains(t.as_str()))
                .cloned()
                .collect();
            return Err(DomainError::UnknownTags { ids });
        }

        habit.tag_ids = tag_ids;
        habit.updated_at_utc = Some(Utc::now());
        self.store_habit(habit).await
    }

    #[instrument(name = "habits.service.get_tag", skip(self))]
    pub async fn get_tag(&self, id: &str) -> Result<Tag, DomainError> {
        self.tags
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::tag_not_found(id))
    }

    #[instrument(name = "habits.service.list_tags", skip(self, order), fields(order = %order))]
    pub async fn list_tags(&self, order: &OrderBy) -> Result<Vec<Tag>, DomainError> {
        Ok(self.tags.list(order).await?)
    }

    #[instrument(name = "habits.service.create_tag", skip(self, new_tag), fields(name = %new_tag.name))]
    pub async fn create_tag(&self, new_tag: NewTag) -> Result<Tag, DomainError> {
        self.validate_tag(&new_tag)?;
        if self.tags.name_exists(&new_tag.name, None).await? {
            return Err(DomainError::tag_name_conflict(new_tag.name));
        }

        let tag = Tag {
            id: new_id(TAG_ID_PREFIX),
            name: new_tag.name,
            description: new_tag.description,
            created_at_utc: Utc::now(),
            updated_at_utc: None,
        };
        self.tags.insert(tag.clone()).await?;

        info!(id = %tag.id, "created tag");
        Ok(tag)
    }

    #[instrument(name = "habits.service.update_tag", skip(self, update))]
    pub async fn update_tag(&self, id: &str, update: NewTag) -> Result<(), DomainError> {
        self.validate_tag(&update)?;

        let mut tag = self.get_tag(id).await?;
        if self.tags.name_exists(&update.name, Some(id)).await? {
            return Err(DomainError::tag_name_conflict(update.name));
        }
        tag.name = update.name;
        tag.description = update.description;
        tag.updated_at_utc = Some(Utc::now());

        if !self.tags.update(tag).await? {
            return Err(DomainError::tag_not_found(id));
        }
        Ok(())
    }

    #[instrument(name = "habits.service.delete_tag", skip(self))]
    pub async fn delete_tag(&self, id: &str) -> Result<(), DomainError> {
        if !self.tags.delete(id).await? {
            return Err(DomainError::tag_not_found(id));
        }
        info!(id, "deleted tag");
        Ok(())
    }

    async fn store_habit(&self, habit: Habit) -> Result<(), DomainError> {
        let id = habit.id.clone();
        if !self.habits.update(habit).await? {
            return Err(DomainError::habit_not_found(id));
        }
        Ok(())
    }

    fn validate_habit(&self, habit: &NewHabit) -> Result<(), DomainError> {
        self.validate_name(&habit.name)?;
        if let Some(description) = habit.description.as_deref() {
            self.validate_description(description)?;
        }
        if habit.target.unit.trim().is_empty() {
            return Err(DomainError::validation("target.unit", "must not be empty"));
        }
        if habit.frequency.times_per_period == 0 {
            return Err(DomainError::validation(
                "frequency.timesPerPeriod",
                "must be greater than zero",
            ));
        }
        Ok(())
    }

    fn validate_tag(&self, tag: &NewTag) -> Result<(), DomainError> {
        self.validate_name(&tag.name)?;
        if let Some(description) = tag.description.as_deref() {
            self.validate_description(description)?;
        }
        Ok(())
    }

    fn validate_name(&self, name: &str) -> Result<(), DomainError> {
        if name.trim().is_empty() {
            return Err(DomainError::validation("name", "must not be empty"));
        }
        let len = name.chars().count();
        if len > self.config.max_name_length {
            return Err(DomainError::validation(
                "name",
                format!(
                    "is {len} characters long (max: {})",
                    self.config.max_name_length
                ),
            ));
        }
        Ok(())
    }

    fn validate_description(&self, description: &str) -> Result<(), DomainError> {
        let len = description.chars().count();
        if len > self.config.max_description_length {
            return Err(DomainError::validation(
                "description",
                format!(
                    "is {len} characters long (max: {})",
                    self.config.max_description_length
                ),
            ));
        }
        Ok(())
    }
}

fn new_id(prefix: &str) -> String {
    format!("{prefix}{}", Uuid::now_v7())
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod service_tests;
