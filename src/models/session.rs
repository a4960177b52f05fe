//! Placed sessions and timetables.
//!
//! A [`ScheduleSession`] binds one subject, faculty member, room and section
//! to a day and a run of consecutive slots. A [`Timetable`] is a set of
//! sessions with query helpers and an audit of the three uniqueness keys.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use super::{ConstraintPriority, Day, Faculty};

/// Kind of teaching a session delivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionType {
    Lecture,
    Tutorial,
    Lab,
}

impl std::fmt::Display for SessionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            SessionType::Lecture => "lecture",
            SessionType::Tutorial => "tutorial",
            SessionType::Lab => "lab",
        })
    }
}

/// A placed session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleSession {
    pub id: String,
    pub subject_id: String,
    pub subject_code: String,
    pub faculty_id: String,
    pub room_id: String,
    pub section_id: String,
    #[serde(rename = "dayOfWeek", with = "day_index")]
    pub day: Day,
    /// First occupied slot.
    pub time_slot_id: String,
    /// Every occupied slot, in order.
    pub slot_ids: Vec<String>,
    pub session_type: SessionType,
    /// Number of consecutive slots.
    pub duration: usize,
    #[serde(default)]
    pub has_conflict: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conflict_reason: Option<String>,
}

impl ScheduleSession {
    /// Contact hours (one per slot).
    #[inline]
    pub fn hours(&self) -> i32 {
        self.slot_ids.len() as i32
    }

    /// Whether two sessions share a day and at least one slot.
    pub fn overlaps(&self, other: &ScheduleSession) -> bool {
        self.day == other.day && self.slot_ids.iter().any(|s| other.slot_ids.contains(s))
    }
}

mod day_index {
    use super::Day;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(day: &Day, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(day.index() as u8)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Day, D::Error> {
        let index = u8::deserialize(deserializer)?;
        Day::from_index(index as usize)
            .ok_or_else(|| serde::de::Error::custom(format!("dayOfWeek {index} out of range")))
    }
}

/// A rule violation produced by the constraint engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    pub constraint_id: String,
    pub priority: ConstraintPriority,
    pub message: String,
}

impl Violation {
    pub fn new(
        constraint_id: impl Into<String>,
        priority: ConstraintPriority,
        message: impl Into<String>,
    ) -> Self {
        Self {
            constraint_id: constraint_id.into(),
            priority,
            message: message.into(),
        }
    }
}

/// Classification of a detected conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictType {
    FacultyOverlap,
    RoomOverlap,
    SectionOverlap,
    ConstraintViolation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A conflict found in a set of sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictReport {
    pub id: String,
    pub session_id: String,
    #[serde(rename = "type")]
    pub conflict_type: ConflictType,
    pub severity: Severity,
    pub description: String,
    pub affected_entities: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_resolution: Option<String>,
}

/// A set of placed sessions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timetable {
    pub sessions: Vec<ScheduleSession>,
}

impl Timetable {
    pub fn new(sessions: Vec<ScheduleSession>) -> Self {
        Self { sessions }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn for_section(&self, section_id: &str) -> Vec<&ScheduleSession> {
        self.sessions
            .iter()
            .filter(|s| s.section_id == section_id)
            .collect()
    }

    pub fn for_faculty(&self, faculty_id: &str) -> Vec<&ScheduleSession> {
        self.sessions
            .iter()
            .filter(|s| s.faculty_id == faculty_id)
            .collect()
    }

    pub fn for_room(&self, room_id: &str) -> Vec<&ScheduleSession> {
        self.sessions
            .iter()
            .filter(|s| s.room_id == room_id)
            .collect()
    }

    /// Weekly contact hours per faculty.
    pub fn weekly_hours(&self) -> BTreeMap<String, i32> {
        let mut hours = BTreeMap::new();
        for s in &self.sessions {
            *hours.entry(s.faculty_id.clone()).or_insert(0) += s.hours();
        }
        hours
    }

    /// Contact hours per (faculty, day).
    pub fn daily_hours(&self) -> BTreeMap<(String, Day), i32> {
        let mut hours = BTreeMap::new();
        for s in &self.sessions {
            *hours.entry((s.faculty_id.clone(), s.day)).or_insert(0) += s.hours();
        }
        hours
    }

    /// Audits the sessions: double-booking on any of the three keys, and
    /// hour ceilings for the given faculty. Sessions flagged by the solver
    /// with a soft violation are reported as warnings.
    pub fn verify<'a>(&self, faculty: impl IntoIterator<Item = &'a Faculty>) -> Vec<ConflictReport> {
        let mut reports = Vec::new();
        let mut seen: HashMap<(ConflictType, &str, Day, &str), &ScheduleSession> = HashMap::new();

        for s in &self.sessions {
            for slot in &s.slot_ids {
                let keys = [
                    (ConflictType::FacultyOverlap, s.faculty_id.as_str()),
                    (ConflictType::RoomOverlap, s.room_id.as_str()),
                    (ConflictType::SectionOverlap, s.section_id.as_str()),
                ];
                for (kind, id) in keys {
                    if let Some(first) = seen.insert((kind, id, s.day, slot.as_str()), s) {
                        let n = reports.len() + 1;
                        reports.push(ConflictReport {
                            id: format!("conflict-{n}"),
                            session_id: s.id.clone(),
                            conflict_type: kind,
                            severity: Severity::Error,
                            description: format!(
                                "{id} is booked twice on {} at {slot} ({} and {})",
                                s.day, first.id, s.id
                            ),
                            affected_entities: vec![first.id.clone(), s.id.clone(), id.to_string()],
                            suggested_resolution: Some("regenerate the affected sections".into()),
                        });
                    }
                }
            }
        }

        let weekly = self.weekly_hours();
        let daily = self.daily_hours();
        for f in faculty {
            let used = weekly.get(&f.id).copied().unwrap_or(0);
            if used > f.max_hours_per_week {
                reports.push(self.limit_report(
                    reports.len() + 1,
                    f,
                    format!(
                        "{} teaches {used} hours per week, limit {}",
                        f.name, f.max_hours_per_week
                    ),
                ));
            }
            for day in Day::ALL {
                let used = daily.get(&(f.id.clone(), day)).copied().unwrap_or(0);
                if used > f.max_hours_per_day {
                    reports.push(self.limit_report(
                        reports.len() + 1,
                        f,
                        format!(
                            "{} teaches {used} hours on {day}, limit {}",
                            f.name, f.max_hours_per_day
                        ),
                    ));
                }
            }
        }

        for s in self.sessions.iter().filter(|s| s.has_conflict) {
            let n = reports.len() + 1;
            reports.push(ConflictReport {
                id: format!("conflict-{n}"),
                session_id: s.id.clone(),
                conflict_type: ConflictType::ConstraintViolation,
                severity: Severity::Warning,
                description: s.conflict_reason.clone().unwrap_or_default(),
                affected_entities: vec![s.id.clone(), s.faculty_id.clone(), s.section_id.clone()],
                suggested_resolution: None,
            });
        }

        reports
    }

    fn limit_report(&self, n: usize, faculty: &Faculty, description: String) -> ConflictReport {
        let session_id = self
            .sessions
            .iter()
            .find(|s| s.faculty_id == faculty.id)
            .map(|s| s.id.clone())
            .unwrap_or_default();
        ConflictReport {
            id: format!("conflict-{n}"),
            session_id,
            conflict_type: ConflictType::ConstraintViolation,
            severity: Severity::Error,
            description,
            affected_entities: vec![faculty.id.clone()],
            suggested_resolution: Some("move sessions to another eligible faculty".into()),
        }
    }
}
