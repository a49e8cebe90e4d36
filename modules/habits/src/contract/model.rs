use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Prefix of habit identifiers (`h_<uuid v7>`).
pub const HABIT_ID_PREFIX: &str = "h_";
/// Prefix of tag identifiers (`t_<uuid v7>`).
pub const TAG_ID_PREFIX: &str = "t_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HabitType {
    #[default]
    None,
    Binary,
    Measurable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrequencyType {
    #[default]
    None,
    Daily,
    Weekly,
    Monthly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HabitStatus {
    #[default]
    None,
    Ongoing,
    Completed,
}

/// Declaration order, used as the storage ordering of enum columns.
pub trait Ordinal {
    fn ordinal(self) -> i64;
}

macro_rules! text_enum {
    ($ty:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(self) -> &'static str {
                match self {
                    $($ty::$variant => $text,)+
                }
            }
        }

        impl Ordinal for $ty {
            fn ordinal(self) -> i64 {
                self as i64
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($text => Ok($ty::$variant),)+
                    other => Err(format!(
                        "'{}' is not one of: {}",
                        other,
                        [$($text),+].join(", ")
                    )),
                }
            }
        }
    };
}

text_enum!(HabitType { None => "none", Binary => "binary", Measurable => "measurable" });
text_enum!(FrequencyType { None => "none", Daily => "daily", Weekly => "weekly", Monthly => "monthly" });
text_enum!(HabitStatus { None => "none", Ongoing => "ongoing", Completed => "completed" });

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frequency {
    pub frequency_type: FrequencyType,
    pub times_per_period: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub value: u32,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Milestone {
    pub target: u32,
    pub current: u32,
}

/// A tracked habit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Habit {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub habit_type: HabitType,
    pub frequency: Frequency,
    pub target: Target,
    pub status: HabitStatus,
    pub is_archived: bool,
    pub end_date: Option<NaiveDate>,
    pub milestone: Option<Milestone>,
    pub created_at_utc: DateTime<Utc>,
    pub updated_at_utc: Option<DateTime<Utc>>,
    pub last_completed_at_utc: Option<DateTime<Utc>>,
    pub tag_ids: Vec<String>,
}

/// Payload of habit create and full replace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewHabit {
    pub name: String,
    pub description: Option<String>,
    pub habit_type: HabitType,
    pub frequency: Frequency,
    pub target: Target,
    pub end_date: Option<NaiveDate>,
    pub milestone: Option<Milestone>,
}

/// Partial update: only name and description are patchable.
/// `description: Some(None)` clears it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HabitPatch {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
}

/// Collection filters; absent fields do not filter.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HabitFilter {
    /// Case-insensitive substring of name or description.
    pub search: Option<String>,
    pub habit_type: Option<HabitType>,
    pub status: Option<HabitStatus>,
}

impl HabitFilter {
    pub fn matches(&self, habit: &Habit) -> bool {
        if let Some(search) = self.search.as_deref() {
            let needle = search.to_lowercase();
            let in_name = habit.name.to_lowercase().contains(&needle);
            let in_description = habit
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&needle));
            if !in_name && !in_description {
                return false;
            }
        }
        self.habit_type.map_or(true, |t| habit.habit_type == t)
            && self.status.map_or(true, |s| habit.status == s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub created_at_utc: DateTime<Utc>,
    pub updated_at_utc: Option<DateTime<Utc>>,
}

/// Payload of tag create and update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTag {
    pub name: String,
    pub description: Option<String>,
}

/// A habit together with the names of its tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HabitWithTags {
    pub habit: Habit,
    pub tags: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn habit(name: &str, description: Option<&str>) -> Habit {
        Habit {
            id: "h_1".into(),
            name: name.into(),
            description: description.map(str::to_owned),
            habit_type: HabitType::Binary,
            frequency: Frequency {
                frequency_type: FrequencyType::Daily,
                times_per_period: 1,
            },
            target: Target {
                value: 1,
                unit: "sessions".into(),
            },
            status: HabitStatus::Ongoing,
            is_archived: false,
            end_date: None,
            milestone: None,
            created_at_utc: Utc::now(),
            updated_at_utc: None,
            last_completed_at_utc: None,
            tag_ids: Vec::new(),
        }
    }

    #[test]
    fn enums_parse_case_insensitively() {
        assert_eq!("Measurable".parse::<HabitType>(), Ok(HabitType::Measurable));
        assert_eq!(" weekly ".parse::<FrequencyType>(), Ok(FrequencyType::Weekly));
        let err = "done".parse::<HabitStatus>().unwrap_err();
        assert!(err.contains("none, ongoing, completed"));
        assert!(HabitType::None.ordinal() < HabitType::Measurable.ordinal());
    }

    #[test]
    fn search_matches_name_or_description() {
        let h = habit("Morning Run", Some("Easy pace around the park"));
        let by = |s: &str| HabitFilter {
            search: Some(s.into()),
            ..Default::default()
        };
        assert!(by("run").matches(&h));
        assert!(by("PARK").matches(&h));
        assert!(!by("swim").matches(&h));
        assert!(!by("x").matches(&habit("Read", None)));
    }

    #[test]
    fn type_and_status_filters_combine() {
        let h = habit("Read", None);
        let f = HabitFilter {
            habit_type: Some(HabitType::Binary),
            status: Some(HabitStatus::Completed),
            ..Default::default()
        };
        assert!(!f.matches(&h));
        let f = HabitFilter {
            habit_type: Some(HabitType::Binary),
            status: Some(HabitStatus::Ongoing),
            ..Default::default()
        };
        assert!(f.matches(&h));
    }
}
