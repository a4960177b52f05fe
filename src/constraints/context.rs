//! Evaluation context for constraint rules.

use std::collections::HashMap;

use crate::models::{
    Day, Faculty, Room, ScheduleSession, Section, SessionType, SlotGrid, Subject, TimeWindow,
};

/// A proposed placement, not yet reserved.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    pub subject: &'a Subject,
    pub faculty: &'a Faculty,
    pub room: &'a Room,
    pub section: &'a Section,
    pub session_type: SessionType,
    pub day: Day,
    /// Grid indices of the occupied slots, ascending.
    pub slots: &'a [usize],
}

impl Candidate<'_> {
    /// Contact hours the placement adds.
    #[inline]
    pub fn hours(&self) -> i32 {
        self.slots.len() as i32
    }
}

/// Running contact-hour totals per faculty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FacultyLoad {
    weekly: HashMap<String, i32>,
    daily: HashMap<(String, Day), i32>,
}

impl FacultyLoad {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_sessions<'a>(sessions: impl IntoIterator<Item = &'a ScheduleSession>) -> Self {
        let mut load = Self::new();
        for s in sessions {
            load.add(&s.faculty_id, s.day, s.hours());
        }
        load
    }

    pub fn add(&mut self, faculty_id: &str, day: Day, hours: i32) {
        *self.weekly.entry(faculty_id.to_string()).or_insert(0) += hours;
        *self.daily.entry((faculty_id.to_string(), day)).or_insert(0) += hours;
    }

    pub fn remove(&mut self, faculty_id: &str, day: Day, hours: i32) {
        if let Some(h) = self.weekly.get_mut(faculty_id) {
            *h = (*h - hours).max(0);
        }
        if let Some(h) = self.daily.get_mut(&(faculty_id.to_string(), day)) {
            *h = (*h - hours).max(0);
        }
    }

    pub fn weekly(&self, faculty_id: &str) -> i32 {
        self.weekly.get(faculty_id).copied().unwrap_or(0)
    }

    pub fn daily(&self, faculty_id: &str, day: Day) -> i32 {
        self.daily
            .get(&(faculty_id.to_string(), day))
            .copied()
            .unwrap_or(0)
    }

    /// Whether `hours` more on `day` keeps the member within both limits.
    pub fn fits(&self, faculty: &Faculty, day: Day, hours: i32, per_day: i32, per_week: i32) -> bool {
        self.daily(&faculty.id, day) + hours <= per_day
            && self.weekly(&faculty.id) + hours <= per_week
    }
}

/// Read-only view of the run state a rule may consult.
#[derive(Debug, Clone, Copy)]
pub struct PartialSchedule<'a> {
    pub grid: &'a SlotGrid,
    pub working_days: &'a [Day],
    /// Every session placed so far in the run, all sections.
    pub sessions: &'a [ScheduleSession],
    pub load: &'a FacultyLoad,
}

impl<'a> PartialSchedule<'a> {
    /// Clock window of a candidate's slot run.
    pub fn window(&self, candidate: &Candidate<'_>) -> Option<TimeWindow> {
        self.grid.span_window(candidate.slots)
    }

    /// Start (day, slot id) of every session of `subject_id` held by
    /// sections other than `section_id`.
    pub fn subject_starts_elsewhere(&self, subject_id: &str, section_id: &str) -> Vec<(Day, &'a str)> {
        self.sessions
            .iter()
            .filter(|s| s.subject_id == subject_id && s.section_id != section_id)
            .map(|s| (s.day, s.time_slot_id.as_str()))
            .collect()
    }

    /// Sessions of `subject_id` the section already has on `day`.
    pub fn section_subject_on_day(&self, section_id: &str, subject_id: &str, day: Day) -> usize {
        self.sessions
            .iter()
            .filter(|s| s.section_id == section_id && s.subject_id == subject_id && s.day == day)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_faculty_load() {
        let mut load = FacultyLoad::new();
        load.add("F1", Day::Monday, 2);
        load.add("F1", Day::Tuesday, 1);
        assert_eq!(load.weekly("F1"), 3);
        assert_eq!(load.daily("F1", Day::Monday), 2);

        let f = Faculty::new("F1", "Dr. Park", "CSE").with_max_hours(3, 4);
        assert!(load.fits(&f, Day::Monday, 1, 3, 4));
        assert!(!load.fits(&f, Day::Monday, 2, 3, 4));
        assert!(!load.fits(&f, Day::Friday, 2, 3, 4));

        load.remove("F1", Day::Monday, 2);
        assert_eq!(load.weekly("F1"), 1);
        assert_eq!(load.daily("F1", Day::Monday), 0);
        assert_eq!(load.weekly("F9"), 0);
    }
}
