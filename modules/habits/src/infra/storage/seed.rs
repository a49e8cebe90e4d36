//! Demo data for local runs (`habits.seed: true`).

use chrono::{Duration, NaiveDate, Utc};
use uuid::Uuid;

use crate::contract::model::{
    Frequency, FrequencyType, Habit, HabitStatus, HabitType, Milestone, Tag, Target,
    HABIT_ID_PREFIX, TAG_ID_PREFIX,
};
use crate::domain::repo::{HabitsRepository, TagsRepository};

struct DemoHabit {
    name: &'static str,
    description: Option<&'static str>,
    habit_type: HabitType,
    frequency: (FrequencyType, u32),
    target: (u32, &'static str),
    status: HabitStatus,
    tags: &'static [&'static str],
}

const TAGS: &[(&str, Option<&str>)] = &[
    ("health", Some("Body and sleep")),
    ("learning", Some("Books, courses and practice")),
    ("mindfulness", None),
];

const HABITS: &[DemoHabit] = &[
    DemoHabit {
        name: "Morning run",
        description: Some("Easy pace, no watch"),
        habit_type: HabitType::Measurable,
        frequency: (FrequencyType::Weekly, 3),
        target: (5, "km"),
        status: HabitStatus::Ongoing,
        tags: &["health"],
    },
    DemoHabit {
        name: "Read",
        description: Some("Fiction or technical, anything counts"),
        habit_type: HabitType::Measurable,
        frequency: (FrequencyType::Daily, 1),
        target: (20, "pages"),
        status: HabitStatus::Ongoing,
        tags: &["learning"],
    },
    DemoHabit {
        name: "Meditate",
        description: None,
        habit_type: HabitType::Measurable,
        frequency: (FrequencyType::Daily, 1),
        target: (10, "minutes"),
        status: HabitStatus::Ongoing,
        tags: &["mindfulness", "health"],
    },
    DemoHabit {
        name: "Drink water",
        description: Some("Eight glasses"),
        habit_type: HabitType::Binary,
        frequency: (FrequencyType::Daily, 8),
        target: (1, "glass"),
        status: HabitStatus::Ongoing,
        tags: &["health"],
    },
    DemoHabit {
        name: "Practice Rust",
        description: Some("One small exercise"),
        habit_type: HabitType::Binary,
        frequency: (FrequencyType::Weekly, 5),
        target: (1, "session"),
        status: HabitStatus::Completed,
        tags: &["learning"],
    },
    DemoHabit {
        name: "Call family",
        description: None,
        habit_type: HabitType::Binary,
        frequency: (FrequencyType::Monthly, 2),
        target: (1, "call"),
        status: HabitStatus::Ongoing,
        tags: &[],
    },
];

/// Insert the demo tags and habits. Creation times are spread one hour apart so
/// the `age` and `createdAtUtc` orderings are distinguishable.
pub async fn seed<R>(store: &R) -> anyhow::Result<()>
where
    R: HabitsRepository + TagsRepository,
{
    let now = Utc::now();

    let mut tag_ids = Vec::with_capacity(TAGS.len());
    for (name, description) in TAGS {
        let tag = Tag {
            id: format!("{TAG_ID_PREFIX}{}", Uuid::now_v7()),
            name: (*name).to_owned(),
            description: description.map(str::to_owned),
            created_at_utc: now,
            updated_at_utc: None,
        };
        tag_ids.push((*name, tag.id.clone()));
        TagsRepository::insert(store, tag).await?;
    }

    let hours = i64::try_from(HABITS.len()).unwrap_or(0);
    for (i, demo) in (0_i64..).zip(HABITS) {
        let habit = Habit {
            id: format!("{HABIT_ID_PREFIX}{}", Uuid::now_v7()),
            name: demo.name.to_owned(),
            description: demo.description.map(str::to_owned),
            habit_type: demo.habit_type,
            frequency: Frequency {
                frequency_type: demo.frequency.0,
                times_per_period: demo.frequency.1,
            },
            target: Target {
                value: demo.target.0,
                unit: demo.target.1.to_owned(),
            },
            status: demo.status,
            is_archived: false,
            end_date: (demo.status == HabitStatus::Completed)
                .then(|| NaiveDate::from_ymd_opt(2025, 12, 31))
                .flatten(),
            milestone: (demo.habit_type == HabitType::Measurable).then_some(Milestone {
                target: 100,
                current: 0,
            }),
            created_at_utc: now - Duration::hours(hours - i),
            updated_at_utc: None,
            last_completed_at_utc: None,
            tag_ids: demo
                .tags
                .iter()
                .filter_map(|name| {
                    tag_ids
                        .iter()
                        .find(|(n, _)| n == name)
                        .map(|(_, id)| id.clone())
                })
                .collect(),
        };
        HabitsRepository::insert(store, habit).await?;
    }

    tracing::info!(
        habits = HABITS.len(),
        tags = TAGS.len(),
        "seeded demo data"
    );
    Ok(())
}
