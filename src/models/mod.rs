//! Timetabling domain models.
//!
//! Plain data types for the entities a timetable is built from and the
//! sessions it is made of. Every entity validates its own fields; whole
//! catalog checks (duplicates, dangling references) live in
//! [`crate::validation`].
//!
//! # Entity Map
//!
//! | Entity | Role |
//! |--------|------|
//! | Faculty | Teaches sessions, bounded by daily/weekly hours |
//! | Subject | Demands lecture/tutorial/lab hours per week |
//! | Room | Hosts one session per day and slot |
//! | Section | Student cohort, attends one session per day and slot |
//! | TimeSlot | Period of the shared institutional day |
//! | Constraint | Rule record interpreted by the constraint engine |
//! | ScheduleSession | Join of all of the above at a day and slot run |

mod constraint;
mod faculty;
mod room;
mod section;
mod session;
mod subject;
mod time_slot;

pub use constraint::{Constraint, ConstraintCategory, ConstraintPriority};
pub use faculty::{Faculty, DEFAULT_MAX_HOURS_PER_DAY, DEFAULT_MAX_HOURS_PER_WEEK};
pub use room::{Room, RoomType};
pub use section::{Section, SectionStatus};
pub use session::{
    ConflictReport, ConflictType, ScheduleSession, SessionType, Severity, Timetable, Violation,
};
pub use subject::Subject;
pub use time_slot::{BreakKind, ClockTime, Day, SlotGrid, TimeSlot, TimeWindow};

use serde::{Deserialize, Deserializer};

pub(crate) fn default_true() -> bool {
    true
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Text(s) => s,
            RawId::Number(n) => n.to_string(),
        }
    }
}

/// Accepts numeric or string identifiers.
pub(crate) fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    RawId::deserialize(deserializer).map(String::from)
}

pub(crate) fn opt_id_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<RawId>::deserialize(deserializer)?.map(String::from))
}
