//! Mutable state of one generation run.

use tracing::trace;

use crate::availability::AvailabilityIndex;
use crate::constraints::{FacultyLoad, PartialSchedule};
use crate::error::ConflictError;
use crate::models::{Day, ScheduleSession, SlotGrid};

/// Placed sessions together with the occupancy and load tables derived
/// from them.
///
/// The three views are only changed together, through [`RunState::place`]
/// and [`RunState::unplace`].
#[derive(Debug, Clone, Default)]
pub struct RunState {
    index: AvailabilityIndex,
    load: FacultyLoad,
    sessions: Vec<ScheduleSession>,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds run state from persisted sessions.
    pub fn from_sessions(sessions: Vec<ScheduleSession>) -> Result<Self, ConflictError> {
        let index = AvailabilityIndex::from_sessions(&sessions)?;
        let load = FacultyLoad::from_sessions(&sessions);
        Ok(Self {
            index,
            load,
            sessions,
        })
    }

    pub fn index(&self) -> &AvailabilityIndex {
        &self.index
    }

    pub fn load(&self) -> &FacultyLoad {
        &self.load
    }

    pub fn sessions(&self) -> &[ScheduleSession] {
        &self.sessions
    }

    pub fn into_sessions(self) -> Vec<ScheduleSession> {
        self.sessions
    }

    /// Context view for constraint rules.
    pub fn view<'a>(&'a self, grid: &'a SlotGrid, working_days: &'a [Day]) -> PartialSchedule<'a> {
        PartialSchedule {
            grid,
            working_days,
            sessions: &self.sessions,
            load: &self.load,
        }
    }

    /// Reserves and records a session.
    pub fn place(&mut self, session: ScheduleSession) -> Result<(), ConflictError> {
        self.index.reserve_session(&session)?;
        self.load
            .add(&session.faculty_id, session.day, session.hours());
        trace!(session = %session.id, day = %session.day, slot = %session.time_slot_id, "placed");
        self.sessions.push(session);
        Ok(())
    }

    /// Releases and removes the session with the given id.
    pub fn unplace(&mut self, session_id: &str) -> Option<ScheduleSession> {
        let pos = self.sessions.iter().rposition(|s| s.id == session_id)?;
        let session = self.sessions.remove(pos);
        self.index.release_session(&session);
        self.load
            .remove(&session.faculty_id, session.day, session.hours());
        trace!(session = %session.id, "released");
        Some(session)
    }

    /// Removes every session of a section, returning them.
    pub fn clear_section(&mut self, section_id: &str) -> Vec<ScheduleSession> {
        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.sessions)
            .into_iter()
            .partition(|s| s.section_id == section_id);
        self.sessions = kept;
        for s in &removed {
            self.index.release_session(s);
            self.load.remove(&s.faculty_id, s.day, s.hours());
        }
        removed
    }

    pub fn sessions_for_section(&self, section_id: &str) -> Vec<&ScheduleSession> {
        self.sessions
            .iter()
            .filter(|s| s.section_id == section_id)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SessionType;

    fn session(
        id: &str,
        faculty: &str,
        room: &str,
        section: &str,
        day: Day,
        slots: &[&str],
    ) -> ScheduleSession {
        ScheduleSession {
            id: id.into(),
            subject_id: "S1".into(),
            subject_code: "CS301".into(),
            faculty_id: faculty.into(),
            room_id: room.into(),
            section_id: section.into(),
            day,
            time_slot_id: slots[0].into(),
            slot_ids: slots.iter().map(|s| s.to_string()).collect(),
            session_type: if slots.len() > 1 {
                SessionType::Lab
            } else {
                SessionType::Lecture
            },
            duration: slots.len(),
            has_conflict: false,
            conflict_reason: None,
        }
    }

    #[test]
    fn test_place_and_unplace() {
        let mut state = RunState::new();
        state
            .place(session("a", "F1", "LAB-A1", "SEC1", Day::Monday, &["t1", "t2"]))
            .unwrap();
        assert_eq!(state.load().weekly("F1"), 2);
        assert!(!state.index().is_faculty_free(Day::Monday, "t2", "F1"));

        // room clash
        let err = state
            .place(session("b", "F2", "LAB-A1", "SEC2", Day::Monday, &["t2"]))
            .unwrap_err();
        assert_eq!(err.slot_id, "t2");
        assert_eq!(state.len(), 1);

        let removed = state.unplace("a").unwrap();
        assert_eq!(removed.id, "a");
        assert!(state.is_empty());
        assert!(state.index().is_empty());
        assert_eq!(state.load().weekly("F1"), 0);
        assert!(state.unplace("a").is_none());
    }

    #[test]
    fn test_clear_section_keeps_others() {
        let mut state = RunState::from_sessions(vec![
            session("a", "F1", "LH-101", "SEC1", Day::Monday, &["t1"]),
            session("b", "F2", "LH-102", "SEC2", Day::Monday, &["t1"]),
            session("c", "F1", "LH-101", "SEC1", Day::Tuesday, &["t4"]),
        ])
        .unwrap();

        let removed = state.clear_section("SEC1");
        assert_eq!(removed.len(), 2);
        assert_eq!(state.len(), 1);
        assert!(state.index().is_free(Day::Monday, "t1", "F1", "LH-101", "SEC1"));
        assert!(!state.index().is_section_free(Day::Monday, "t1", "SEC2"));
        assert_eq!(state.load().weekly("F1"), 0);
        assert_eq!(state.sessions_for_section("SEC2").len(), 1);
    }

    #[test]
    fn test_from_sessions_rejects_double_booking() {
        let result = RunState::from_sessions(vec![
            session("a", "F1", "LH-101", "SEC1", Day::Monday, &["t1"]),
            session("b", "F1", "LH-102", "SEC2", Day::Monday, &["t1"]),
        ]);
        assert!(result.is_err());
    }
}
