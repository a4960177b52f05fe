//! Built-in constraint rules.
//!
//! Each rule struct doubles as its parameter schema: the registry
//! deserializes the constraint's parameter bag straight into the struct.
//!
//! # Categories
//!
//! - **Institutional**: working hours, break exclusion, even distribution
//! - **Faculty**: max hours per day and week
//! - **Room**: continuous lab blocks in LAB rooms
//! - **Section**: elective alignment across sections
//!
//! # Result Convention
//! `evaluate` returns `Some(message)` when the candidate violates the rule.

use serde::Deserialize;

use super::{Candidate, ConstraintRule, PartialSchedule};
use crate::models::{ClockTime, RoomType, SessionType, TimeWindow};

// ======================== Institutional rules ========================

/// Every placed slot lies inside the institutional day.
///
/// Parameters: `{"startTime": "09:00", "endTime": "17:00"}`.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkingHours {
    pub start_time: ClockTime,
    pub end_time: ClockTime,
}

impl ConstraintRule for WorkingHours {
    fn name(&self) -> &'static str {
        "working_hours"
    }

    fn evaluate(&self, candidate: &Candidate<'_>, schedule: &PartialSchedule<'_>) -> Option<String> {
        let allowed = TimeWindow::new(self.start_time, self.end_time);
        let window = schedule.window(candidate)?;
        (!allowed.covers(&window)).then(|| {
            format!(
                "{}-{} falls outside working hours {}-{}",
                window.start_time, window.end_time, self.start_time, self.end_time
            )
        })
    }

    fn description(&self) -> &'static str {
        "Sessions stay inside the working-hours window"
    }
}

/// No placed slot overlaps a break window (lunch, short break).
///
/// Parameters: `{"startTime": "12:35", "endTime": "13:30"}`.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakExclusion {
    pub start_time: ClockTime,
    pub end_time: ClockTime,
}

impl ConstraintRule for BreakExclusion {
    fn name(&self) -> &'static str {
        "break_exclusion"
    }

    fn evaluate(&self, candidate: &Candidate<'_>, schedule: &PartialSchedule<'_>) -> Option<String> {
        let blocked = TimeWindow::new(self.start_time, self.end_time);
        candidate
            .slots
            .iter()
            .filter_map(|&i| schedule.grid.get(i))
            .find(|slot| slot.window().overlaps(&blocked))
            .map(|slot| {
                format!(
                    "slot {} overlaps the break {}-{}",
                    slot.id, self.start_time, self.end_time
                )
            })
    }

    fn description(&self) -> &'static str {
        "Sessions never overlap a break"
    }
}

/// Spreads a faculty member's hours across the working week and keeps a
/// section from taking the same subject twice in one day.
///
/// Parameters: `{"maxVariance": 2}` (largest allowed gap between the
/// busiest and the quietest working day).
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvenDistribution {
    #[serde(default = "default_max_variance")]
    pub max_variance: i32,
}

fn default_max_variance() -> i32 {
    2
}

impl ConstraintRule for EvenDistribution {
    fn name(&self) -> &'static str {
        "even_distribution"
    }

    fn evaluate(&self, candidate: &Candidate<'_>, schedule: &PartialSchedule<'_>) -> Option<String> {
        let section = &candidate.section.id;
        let subject = &candidate.subject.id;
        if schedule.section_subject_on_day(section, subject, candidate.day) > 0 {
            return Some(format!(
                "{} already meets {} on {}",
                candidate.section.name, candidate.subject.code, candidate.day
            ));
        }

        let faculty = &candidate.faculty.id;
        let per_day: Vec<i32> = schedule
            .working_days
            .iter()
            .map(|&d| {
                let extra = if d == candidate.day { candidate.hours() } else { 0 };
                schedule.load.daily(faculty, d) + extra
            })
            .collect();
        let max = per_day.iter().copied().max().unwrap_or(0);
        let min = per_day.iter().copied().min().unwrap_or(0);
        (max - min > self.max_variance).then(|| {
            format!(
                "{} daily load would range {min}..{max}, more than {} apart",
                candidate.faculty.name, self.max_variance
            )
        })
    }

    fn description(&self) -> &'static str {
        "Faculty and subject sessions spread across weekdays"
    }
}

// ======================== Faculty rules ========================

/// Caps daily and weekly contact hours.
///
/// The effective limit is the smaller of the parameter and the member's
/// own ceiling. Parameters: `{"maxHours": 6, "maxWeeklyHours": 20}`, both
/// optional.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacultyMaxHours {
    #[serde(default, alias = "maxHoursPerDay")]
    pub max_hours: Option<i32>,
    #[serde(default, alias = "maxHoursPerWeek")]
    pub max_weekly_hours: Option<i32>,
}

impl ConstraintRule for FacultyMaxHours {
    fn name(&self) -> &'static str {
        "faculty_max_hours"
    }

    fn evaluate(&self, candidate: &Candidate<'_>, schedule: &PartialSchedule<'_>) -> Option<String> {
        let f = candidate.faculty;
        let per_day = self
            .max_hours
            .map_or(f.max_hours_per_day, |m| m.min(f.max_hours_per_day));
        let per_week = self
            .max_weekly_hours
            .map_or(f.max_hours_per_week, |m| m.min(f.max_hours_per_week));

        let day_total = schedule.load.daily(&f.id, candidate.day) + candidate.hours();
        if day_total > per_day {
            return Some(format!(
                "{} would teach {day_total} hours on {}, limit {per_day}",
                f.name, candidate.day
            ));
        }
        let week_total = schedule.load.weekly(&f.id) + candidate.hours();
        (week_total > per_week).then(|| {
            format!(
                "{} would teach {week_total} hours this week, limit {per_week}",
                f.name
            )
        })
    }

    fn description(&self) -> &'static str {
        "Faculty daily and weekly hour ceilings"
    }
}

// ======================== Room rules ========================

/// Lab sessions run as one continuous block in a LAB room.
///
/// Parameters: `{"minDuration": 2}` (slots per block).
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabBlock {
    #[serde(default = "default_min_duration")]
    pub min_duration: usize,
}

fn default_min_duration() -> usize {
    2
}

impl ConstraintRule for LabBlock {
    fn name(&self) -> &'static str {
        "lab_block"
    }

    fn evaluate(&self, candidate: &Candidate<'_>, schedule: &PartialSchedule<'_>) -> Option<String> {
        if candidate.session_type != SessionType::Lab {
            return None;
        }
        if candidate.room.room_type != RoomType::Lab {
            return Some(format!(
                "lab for {} placed in non-lab room {}",
                candidate.subject.code, candidate.room.code
            ));
        }
        if candidate.slots.len() < self.min_duration {
            return Some(format!(
                "lab for {} spans {} slots, needs {}",
                candidate.subject.code,
                candidate.slots.len(),
                self.min_duration
            ));
        }
        (!schedule.grid.is_contiguous(candidate.slots)).then(|| {
            format!("lab for {} is not one continuous block", candidate.subject.code)
        })
    }

    fn description(&self) -> &'static str {
        "Labs in LAB rooms as continuous blocks"
    }
}

// ======================== Section rules ========================

/// An elective shared by several sections meets at the same time in each.
///
/// Once any other section holds the elective, a candidate must start at a
/// (day, slot) that section already uses. No parameters.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ElectiveAlignment {}

impl ConstraintRule for ElectiveAlignment {
    fn name(&self) -> &'static str {
        "elective_alignment"
    }

    fn evaluate(&self, candidate: &Candidate<'_>, schedule: &PartialSchedule<'_>) -> Option<String> {
        if !candidate.subject.elective {
            return None;
        }
        let starts =
            schedule.subject_starts_elsewhere(&candidate.subject.id, &candidate.section.id);
        if starts.is_empty() {
            return None;
        }
        let first = candidate
            .slots
            .first()
            .and_then(|&i| schedule.grid.get(i))
            .map(|s| s.id.as_str())?;
        let aligned = starts
            .iter()
            .any(|&(day, slot)| day == candidate.day && slot == first);
        (!aligned).then(|| {
            format!(
                "elective {} for {} is not aligned with other sections",
                candidate.subject.code, candidate.section.name
            )
        })
    }

    fn description(&self) -> &'static str {
        "Electives meet at the same time across sections"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::FacultyLoad;
    use crate::models::{
        Day, Faculty, Room, ScheduleSession, Section, SlotGrid, Subject,
    };

    struct World {
        grid: SlotGrid,
        subject: Subject,
        faculty: Faculty,
        lab: Room,
        hall: Room,
        section: Section,
        load: FacultyLoad,
        sessions: Vec<ScheduleSession>,
    }

    impl World {
        fn new() -> Self {
            Self {
                grid: SlotGrid::institutional(),
                subject: Subject::new("S1", "CS301").with_hours(3, 1, 2),
                faculty: Faculty::new("F1", "Dr. Mitchell", "CSE").with_max_hours(4, 10),
                lab: Room::new("LAB-A1", RoomType::Lab, 40),
                hall: Room::new("LH-102", RoomType::Lecture, 60),
                section: Section::new("SEC1", "CS-3A", 60),
                load: FacultyLoad::new(),
                sessions: Vec::new(),
            }
        }

        fn check<R: ConstraintRule>(
            &self,
            rule: &R,
            room: &Room,
            session_type: SessionType,
            day: Day,
            slots: &[usize],
        ) -> Option<String> {
            let candidate = Candidate {
                subject: &self.subject,
                faculty: &self.faculty,
                room,
                section: &self.section,
                session_type,
                day,
                slots,
            };
            let schedule = PartialSchedule {
                grid: &self.grid,
                working_days: &Day::WEEKDAYS,
                sessions: &self.sessions,
                load: &self.load,
            };
            rule.evaluate(&candidate, &schedule)
        }
    }

    fn placed(section: &str, subject: &str, day: Day, slot: &str) -> ScheduleSession {
        ScheduleSession {
            id: format!("{section}-{subject}-{slot}"),
            subject_id: subject.into(),
            subject_code: subject.into(),
            faculty_id: "F2".into(),
            room_id: "LH-101".into(),
            section_id: section.into(),
            day,
            time_slot_id: slot.into(),
            slot_ids: vec![slot.into()],
            session_type: SessionType::Lecture,
            duration: 1,
            has_conflict: false,
            conflict_reason: None,
        }
    }

    #[test]
    fn test_working_hours() {
        let w = World::new();
        let rule: WorkingHours =
            serde_json::from_str(r#"{"startTime":"09:00","endTime":"17:00"}"#).unwrap();
        assert!(w.check(&rule, &w.hall, SessionType::Lecture, Day::Monday, &[0]).is_none());
        // t11 ends 17:05
        let msg = w.check(&rule, &w.hall, SessionType::Lecture, Day::Monday, &[10]);
        assert!(msg.unwrap().contains("17:05"));
    }

    #[test]
    fn test_break_exclusion() {
        let w = World::new();
        let rule: BreakExclusion =
            serde_json::from_str(r#"{"startTime":"12:35","endTime":"13:30"}"#).unwrap();
        assert!(w.check(&rule, &w.hall, SessionType::Lecture, Day::Monday, &[4]).is_none());
        assert!(w.check(&rule, &w.hall, SessionType::Lecture, Day::Monday, &[6]).is_none());
        assert!(w.check(&rule, &w.hall, SessionType::Lecture, Day::Monday, &[5]).is_some());
    }

    #[test]
    fn test_faculty_max_hours_uses_tighter_limit() {
        let mut w = World::new();
        w.load.add("F1", Day::Monday, 3);
        let from_faculty = FacultyMaxHours::default();
        assert!(w.check(&from_faculty, &w.hall, SessionType::Lecture, Day::Monday, &[6]).is_none());
        assert!(w.check(&from_faculty, &w.lab, SessionType::Lab, Day::Monday, &[6, 7]).is_some());

        let tighter: FacultyMaxHours = serde_json::from_str(r#"{"maxHours":3}"#).unwrap();
        assert!(w.check(&tighter, &w.hall, SessionType::Lecture, Day::Monday, &[6]).is_some());
        assert!(w.check(&tighter, &w.hall, SessionType::Lecture, Day::Tuesday, &[6]).is_none());

        w.load.add("F1", Day::Tuesday, 7);
        let msg = w.check(&from_faculty, &w.hall, SessionType::Lecture, Day::Wednesday, &[0]);
        assert!(msg.unwrap().contains("this week"));
    }

    #[test]
    fn test_lab_block() {
        let w = World::new();
        let rule = LabBlock { min_duration: 2 };
        assert!(w.check(&rule, &w.lab, SessionType::Lab, Day::Monday, &[0, 1]).is_none());
        assert!(w.check(&rule, &w.hall, SessionType::Lab, Day::Monday, &[0, 1]).is_some());
        assert!(w.check(&rule, &w.lab, SessionType::Lab, Day::Monday, &[1]).is_some());
        assert!(w.check(&rule, &w.lab, SessionType::Lab, Day::Monday, &[1, 2]).is_some());
        // lectures are not this rule's concern
        assert!(w.check(&rule, &w.hall, SessionType::Lecture, Day::Monday, &[0]).is_none());
    }

    #[test]
    fn test_elective_alignment() {
        let mut w = World::new();
        w.subject = w.subject.clone().with_elective(true);
        let rule = ElectiveAlignment {};
        // nobody else holds it yet
        assert!(w.check(&rule, &w.hall, SessionType::Lecture, Day::Monday, &[0]).is_none());

        w.sessions.push(placed("SEC2", "S1", Day::Tuesday, "t4"));
        assert!(w.check(&rule, &w.hall, SessionType::Lecture, Day::Tuesday, &[3]).is_none());
        assert!(w.check(&rule, &w.hall, SessionType::Lecture, Day::Monday, &[0]).is_some());

        w.subject.elective = false;
        assert!(w.check(&rule, &w.hall, SessionType::Lecture, Day::Monday, &[0]).is_none());
    }

    #[test]
    fn test_even_distribution() {
        let mut w = World::new();
        let rule: EvenDistribution = serde_json::from_str(r#"{"maxVariance":2}"#).unwrap();
        w.load.add("F1", Day::Monday, 2);
        // Monday would reach 3 while Friday stays 0
        assert!(w.check(&rule, &w.hall, SessionType::Lecture, Day::Monday, &[3]).is_some());
        assert!(w.check(&rule, &w.hall, SessionType::Lecture, Day::Tuesday, &[3]).is_none());

        w.sessions.push(placed("SEC1", "S1", Day::Tuesday, "t1"));
        let msg = w.check(&rule, &w.hall, SessionType::Lecture, Day::Tuesday, &[3]);
        assert!(msg.unwrap().contains("already meets"));
    }

    #[test]
    fn test_parameter_typing() {
        assert!(serde_json::from_str::<FacultyMaxHours>(r#"{"maxHours":"six"}"#).is_err());
        assert!(serde_json::from_str::<WorkingHours>(r#"{"startTime":"9am"}"#).is_err());
        let lab: LabBlock = serde_json::from_str("{}").unwrap();
        assert_eq!(lab.min_duration, 2);
    }
}
