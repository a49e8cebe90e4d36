use chrono::{DateTime, NaiveDate, Utc};
use once_cell::sync::Lazy;
use query_core::{FieldDescriptor, LinkDto, Shape};
use serde::{Deserialize, Deserializer, Serialize};

use crate::contract::model::{
    Frequency, FrequencyType, Habit, HabitFilter, HabitPatch, HabitStatus, HabitType,
    HabitWithTags, Milestone, NewHabit, NewTag, Tag, Target,
};
use crate::domain::error::DomainError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrequencyDto {
    #[serde(rename = "type")]
    pub frequency_type: FrequencyType,
    pub times_per_period: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetDto {
    pub value: u32,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneDto {
    pub target: u32,
    pub current: u32,
}

/// REST representation of a habit. Field order is the order of a fully shaped record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitDto {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub habit_type: HabitType,
    pub frequency: FrequencyDto,
    pub target: TargetDto,
    pub status: HabitStatus,
    pub is_archived: bool,
    pub end_date: Option<NaiveDate>,
    pub milestone: Option<MilestoneDto>,
    pub created_at_utc: DateTime<Utc>,
    pub updated_at_utc: Option<DateTime<Utc>>,
    pub last_completed_at_utc: Option<DateTime<Utc>>,
}

const HABIT_FIELDS: &[&str] = &[
    "id",
    "name",
    "description",
    "type",
    "frequency.type",
    "frequency.timesPerPeriod",
    "target.value",
    "target.unit",
    "status",
    "isArchived",
    "endDate",
    "milestone.target",
    "milestone.current",
    "createdAtUtc",
    "updatedAtUtc",
    "lastCompletedAtUtc",
];

static HABIT_DESCRIPTOR: Lazy<FieldDescriptor> = Lazy::new(|| FieldDescriptor::new(HABIT_FIELDS));

static HABIT_WITH_TAGS_DESCRIPTOR: Lazy<FieldDescriptor> = Lazy::new(|| {
    FieldDescriptor::new(HABIT_FIELDS.iter().copied().chain(std::iter::once("tags")))
});

impl Shape for HabitDto {
    fn descriptor() -> &'static FieldDescriptor {
        &HABIT_DESCRIPTOR
    }

    fn identity(&self) -> String {
        self.id.clone()
    }
}

impl From<Habit> for HabitDto {
    fn from(h: Habit) -> Self {
        Self {
            id: h.id,
            name: h.name,
            description: h.description,
            habit_type: h.habit_type,
            frequency: FrequencyDto {
                frequency_type: h.frequency.frequency_type,
                times_per_period: h.frequency.times_per_period,
            },
            target: TargetDto {
                value: h.target.value,
                unit: h.target.unit,
            },
            status: h.status,
            is_archived: h.is_archived,
            end_date: h.end_date,
            milestone: h.milestone.map(|m| MilestoneDto {
                target: m.target,
                current: m.current,
            }),
            created_at_utc: h.created_at_utc,
            updated_at_utc: h.updated_at_utc,
            last_completed_at_utc: h.last_completed_at_utc,
        }
    }
}

/// A habit with the names of its tags (single-resource read).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HabitWithTagsDto {
    #[serde(flatten)]
    pub habit: HabitDto,
    pub tags: Vec<String>,
}

impl Shape for HabitWithTagsDto {
    fn descriptor() -> &'static FieldDescriptor {
        &HABIT_WITH_TAGS_DESCRIPTOR
    }

    fn identity(&self) -> String {
        self.habit.id.clone()
    }
}

impl From<HabitWithTags> for HabitWithTagsDto {
    fn from(h: HabitWithTags) -> Self {
        Self {
            habit: h.habit.into(),
            tags: h.tags,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagDto {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub created_at_utc: DateTime<Utc>,
    pub updated_at_utc: Option<DateTime<Utc>>,
}

static TAG_DESCRIPTOR: Lazy<FieldDescriptor> = Lazy::new(|| {
    FieldDescriptor::new(["id", "name", "description", "createdAtUtc", "updatedAtUtc"])
});

impl Shape for TagDto {
    fn descriptor() -> &'static FieldDescriptor {
        &TAG_DESCRIPTOR
    }

    fn identity(&self) -> String {
        self.id.clone()
    }
}

impl From<Tag> for TagDto {
    fn from(t: Tag) -> Self {
        Self {
            id: t.id,
            name: t.name,
            description: t.description,
            created_at_utc: t.created_at_utc,
            updated_at_utc: t.updated_at_utc,
        }
    }
}

/// Unpaginated tag collection.
#[derive(Debug, Clone, Serialize)]
pub struct TagsCollectionDto<T> {
    pub data: Vec<T>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<LinkDto>,
}

// ---- requests ----

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateHabitReq {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub habit_type: HabitType,
    pub frequency: FrequencyDto,
    pub target: TargetDto,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub milestone: Option<MilestoneDto>,
}

/// Full replace; same payload as create.
pub type UpdateHabitReq = CreateHabitReq;

impl From<CreateHabitReq> for NewHabit {
    fn from(req: CreateHabitReq) -> Self {
        Self {
            name: req.name,
            description: req.description,
            habit_type: req.habit_type,
            frequency: Frequency {
                frequency_type: req.frequency.frequency_type,
                times_per_period: req.frequency.times_per_period,
            },
            target: Target {
                value: req.target.value,
                unit: req.target.unit,
            },
            end_date: req.end_date,
            milestone: req.milestone.map(|m| Milestone {
                target: m.target,
                current: m.current,
            }),
        }
    }
}

/// Merge patch: absent fields stay, `"description": null` clears the description.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PatchHabitReq {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
}

/// Distinguish an explicit `null` from an absent field.
fn present<'de, D, T>(d: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(d).map(Some)
}

impl From<PatchHabitReq> for HabitPatch {
    fn from(req: PatchHabitReq) -> Self {
        Self {
            name: req.name,
            description: req.description,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertHabitTagsReq {
    pub tag_ids: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTagReq {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

pub type UpdateTagReq = CreateTagReq;

impl From<CreateTagReq> for NewTag {
    fn from(req: CreateTagReq) -> Self {
        Self {
            name: req.name,
            description: req.description,
        }
    }
}

/// Resource filters of `GET /habits`, kept as text until parsed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HabitFilterParams {
    pub q: Option<String>,
    #[serde(rename = "type")]
    pub habit_type: Option<String>,
    pub status: Option<String>,
}

impl HabitFilterParams {
    pub fn to_filter(&self) -> Result<HabitFilter, DomainError> {
        let search = self
            .q
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned);
        let habit_type = parse_opt::<HabitType>("type", self.habit_type.as_deref())?;
        let status = parse_opt::<HabitStatus>("status", self.status.as_deref())?;
        Ok(HabitFilter {
            search,
            habit_type,
            status,
        })
    }

    /// Filters echoed by collection links, absent ones dropped downstream.
    pub fn link_filters(&self) -> [(&'static str, Option<String>); 3] {
        [
            ("q", self.q.clone()),
            ("type", self.habit_type.clone()),
            ("status", self.status.clone()),
        ]
    }
}

fn parse_opt<T>(field: &str, raw: Option<&str>) -> Result<Option<T>, DomainError>
where
    T: std::str::FromStr<Err = String>,
{
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => s
            .parse()
            .map(Some)
            .map_err(|e| DomainError::validation(field, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use query_core::shaping;
    use serde_json::json;

    fn habit_dto() -> HabitDto {
        HabitDto {
            id: "h_1".into(),
            name: "Read".into(),
            description: None,
            habit_type: HabitType::Measurable,
            frequency: FrequencyDto {
                frequency_type: FrequencyType::Daily,
                times_per_period: 1,
            },
            target: TargetDto {
                value: 20,
                unit: "pages".into(),
            },
            status: HabitStatus::Ongoing,
            is_archived: false,
            end_date: None,
            milestone: None,
            created_at_utc: Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap(),
            updated_at_utc: None,
            last_completed_at_utc: None,
        }
    }

    #[test]
    fn descriptor_matches_serialized_keys() {
        let value = serde_json::to_value(habit_dto()).unwrap();
        let obj = value.as_object().unwrap();
        for path in HabitDto::descriptor().paths() {
            let head = path.split('.').next().unwrap();
            assert!(obj.contains_key(head), "{path} is not serialized");
        }
        assert_eq!(obj.len(), 13);
    }

    #[test]
    fn nested_fields_shape_into_sub_records() {
        let shaped = shaping::shape_one(&habit_dto(), Some("NAME, frequency.timesPerPeriod, milestone.target"))
            .unwrap();
        assert_eq!(
            serde_json::Value::Object(shaped),
            json!({
                "name": "Read",
                "frequency": { "timesPerPeriod": 1 },
                "milestone": null
            })
        );
    }

    #[test]
    fn habit_with_tags_flattens() {
        let dto = HabitWithTagsDto {
            habit: habit_dto(),
            tags: vec!["health".into()],
        };
        let shaped = shaping::shape_one(&dto, Some("id,tags")).unwrap();
        assert_eq!(
            serde_json::Value::Object(shaped),
            json!({ "id": "h_1", "tags": ["health"] })
        );
    }

    #[test]
    fn patch_distinguishes_null_from_absent() {
        let p: PatchHabitReq = serde_json::from_str(r#"{"description": null}"#).unwrap();
        assert_eq!(p.description, Some(None));
        let p: PatchHabitReq = serde_json::from_str(r#"{"name": "x"}"#).unwrap();
        assert_eq!(p.description, None);
        assert!(serde_json::from_str::<PatchHabitReq>(r#"{"status": "completed"}"#).is_err());
    }

    #[test]
    fn filter_params_reject_unknown_enum_values() {
        let params = HabitFilterParams {
            habit_type: Some("sometimes".into()),
            ..Default::default()
        };
        let err = params.to_filter().unwrap_err();
        assert!(matches!(err, DomainError::Validation { ref field, .. } if field == "type"));

        let params = HabitFilterParams {
            q: Some("  ".into()),
            status: Some("Completed".into()),
            ..Default::default()
        };
        let filter = params.to_filter().unwrap();
        assert!(filter.search.is_none());
        assert_eq!(filter.status, Some(HabitStatus::Completed));
    }
}
