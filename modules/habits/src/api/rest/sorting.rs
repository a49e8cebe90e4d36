use query_core::{Error, SortMappingDefinition, SortMappingRegistry};

use crate::api::rest::dto::{HabitDto, TagDto};
use crate::contract::model::{Habit, Tag};

/// Storage path used when the client gives no `sort`.
pub const DEFAULT_SORT_KEY: &str = "id";

/// Public sort keys of `HabitDto` mapped onto `Habit` storage paths.
pub fn habit_sort_mappings() -> Result<SortMappingDefinition, Error> {
    SortMappingDefinition::builder::<HabitDto, Habit>()
        .map("name", "name")
        .map("description", "description")
        .map("type", "type")
        .map("frequency.type", "frequency.type")
        .map("frequency.timesPerPeriod", "frequency.times_per_period")
        .map("target.value", "target.value")
        .map("target.unit", "target.unit")
        .map("status", "status")
        .map("endDate", "end_date")
        .map("createdAtUtc", "created_at_utc")
        .map("updatedAtUtc", "updated_at_utc")
        .map("lastCompletedAtUtc", "last_completed_at_utc")
        // youngest first when ascending
        .map_reversed("age", "created_at_utc")
        .build()
}

pub fn tag_sort_mappings() -> Result<SortMappingDefinition, Error> {
    SortMappingDefinition::builder::<TagDto, Tag>()
        .map("name", "name")
        .map("description", "description")
        .map("createdAtUtc", "created_at_utc")
        .map("updatedAtUtc", "updated_at_utc")
        .build()
}

/// Registry holding every sort mapping definition of this module.
pub fn sort_registry() -> Result<SortMappingRegistry, Error> {
    Ok(SortMappingRegistry::new()
        .with(habit_sort_mappings()?)
        .with(tag_sort_mappings()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use query_core::{OrderKey, SortDir};

    #[test]
    fn age_is_reversed_creation_time() {
        let registry = sort_registry().unwrap();
        let order = registry
            .build::<HabitDto, Habit>(Some("age"), DEFAULT_SORT_KEY)
            .unwrap();
        assert_eq!(order.keys(), [OrderKey::desc("created_at_utc")]);

        let order = registry
            .build::<HabitDto, Habit>(Some("age desc, Name"), DEFAULT_SORT_KEY)
            .unwrap();
        assert_eq!(order.keys()[0].dir, SortDir::Asc);
        assert_eq!(order.keys()[1], OrderKey::asc("name"));
    }

    #[test]
    fn empty_sort_falls_back_to_id() {
        let registry = sort_registry().unwrap();
        let order = registry.build::<TagDto, Tag>(None, DEFAULT_SORT_KEY).unwrap();
        assert_eq!(order.keys(), [OrderKey::asc("id")]);
    }

    #[test]
    fn tag_keys_do_not_leak_into_habits() {
        let registry = sort_registry().unwrap();
        assert!(registry.validate::<TagDto, Tag>(Some("type")).is_err());
        assert!(registry.validate::<HabitDto, Habit>(Some("type")).is_ok());
        assert!(matches!(
            registry.validate::<HabitDto, Tag>(Some("name")),
            Err(Error::MissingMappingDefinition { .. })
        ));
    }
}
