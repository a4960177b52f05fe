//! Availability index.
//!
//! Per (day, slot) occupancy of faculty, rooms and sections for one
//! generation run. A booking is the triple (faculty, room, section) placed
//! at a day and slot; each of the three ids can appear at most once per
//! (day, slot).
//!
//! # Complexity
//! `is_free`, `reserve` and `release` are O(1) expected.

use std::collections::{HashMap, HashSet};

use tracing::trace;

use crate::error::{ConflictError, ResourceKind};
use crate::models::{Day, ScheduleSession};

/// Occupancy of one (day, slot).
#[derive(Debug, Clone, Default)]
struct SlotOccupancy {
    faculty: HashSet<String>,
    rooms: HashSet<String>,
    sections: HashSet<String>,
    bookings: HashSet<(String, String, String)>,
}

impl SlotOccupancy {
    fn is_empty(&self) -> bool {
        self.bookings.is_empty()
    }
}

/// Occupancy tables keyed by (day, slot id).
#[derive(Debug, Clone, Default)]
pub struct AvailabilityIndex {
    slots: HashMap<(Day, String), SlotOccupancy>,
}

impl AvailabilityIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds an index from already placed sessions.
    pub fn from_sessions<'a>(
        sessions: impl IntoIterator<Item = &'a ScheduleSession>,
    ) -> Result<Self, ConflictError> {
        let mut index = Self::new();
        for s in sessions {
            index.reserve_session(s)?;
        }
        Ok(index)
    }

    /// True iff none of the three ids is occupied at (day, slot).
    pub fn is_free(
        &self,
        day: Day,
        slot_id: &str,
        faculty_id: &str,
        room_id: &str,
        section_id: &str,
    ) -> bool {
        match self.slots.get(&(day, slot_id.to_string())) {
            None => true,
            Some(occ) => {
                !occ.faculty.contains(faculty_id)
                    && !occ.rooms.contains(room_id)
                    && !occ.sections.contains(section_id)
            }
        }
    }

    /// Whether a faculty member is free at (day, slot).
    pub fn is_faculty_free(&self, day: Day, slot_id: &str, faculty_id: &str) -> bool {
        self.slots
            .get(&(day, slot_id.to_string()))
            .map_or(true, |occ| !occ.faculty.contains(faculty_id))
    }

    pub fn is_room_free(&self, day: Day, slot_id: &str, room_id: &str) -> bool {
        self.slots
            .get(&(day, slot_id.to_string()))
            .map_or(true, |occ| !occ.rooms.contains(room_id))
    }

    pub fn is_section_free(&self, day: Day, slot_id: &str, section_id: &str) -> bool {
        self.slots
            .get(&(day, slot_id.to_string()))
            .map_or(true, |occ| !occ.sections.contains(section_id))
    }

    /// Whether the booking is free at every slot of a span.
    pub fn is_span_free(
        &self,
        day: Day,
        slot_ids: &[String],
        faculty_id: &str,
        room_id: &str,
        section_id: &str,
    ) -> bool {
        slot_ids
            .iter()
            .all(|slot| self.is_free(day, slot, faculty_id, room_id, section_id))
    }

    /// Books the triple at (day, slot).
    ///
    /// Booking the same triple twice is a no-op. Any other collision is a
    /// [`ConflictError`] naming the first occupied resource.
    pub fn reserve(
        &mut self,
        day: Day,
        slot_id: &str,
        faculty_id: &str,
        room_id: &str,
        section_id: &str,
    ) -> Result<(), ConflictError> {
        let occ = self.slots.entry((day, slot_id.to_string())).or_default();
        let booking = (
            faculty_id.to_string(),
            room_id.to_string(),
            section_id.to_string(),
        );
        if occ.bookings.contains(&booking) {
            return Ok(());
        }

        let conflict = |resource, id: &str| ConflictError {
            day,
            slot_id: slot_id.to_string(),
            resource,
            id: id.to_string(),
        };
        if occ.faculty.contains(faculty_id) {
            return Err(conflict(ResourceKind::Faculty, faculty_id));
        }
        if occ.rooms.contains(room_id) {
            return Err(conflict(ResourceKind::Room, room_id));
        }
        if occ.sections.contains(section_id) {
            return Err(conflict(ResourceKind::Section, section_id));
        }

        occ.faculty.insert(booking.0.clone());
        occ.rooms.insert(booking.1.clone());
        occ.sections.insert(booking.2.clone());
        occ.bookings.insert(booking);
        trace!(%day, slot_id, faculty_id, room_id, section_id, "reserved");
        Ok(())
    }

    /// Removes the triple's booking at (day, slot). Unknown bookings are ignored.
    pub fn release(
        &mut self,
        day: Day,
        slot_id: &str,
        faculty_id: &str,
        room_id: &str,
        section_id: &str,
    ) {
        let key = (day, slot_id.to_string());
        let Some(occ) = self.slots.get_mut(&key) else {
            return;
        };
        let booking = (
            faculty_id.to_string(),
            room_id.to_string(),
            section_id.to_string(),
        );
        if occ.bookings.remove(&booking) {
            occ.faculty.remove(faculty_id);
            occ.rooms.remove(room_id);
            occ.sections.remove(section_id);
            trace!(%day, slot_id, faculty_id, room_id, section_id, "released");
        }
        if occ.is_empty() {
            self.slots.remove(&key);
        }
    }

    /// Books every slot of a span, or none of them.
    pub fn reserve_span(
        &mut self,
        day: Day,
        slot_ids: &[String],
        faculty_id: &str,
        room_id: &str,
        section_id: &str,
    ) -> Result<(), ConflictError> {
        for (i, slot) in slot_ids.iter().enumerate() {
            if let Err(e) = self.reserve(day, slot, faculty_id, room_id, section_id) {
                for done in &slot_ids[..i] {
                    self.release(day, done, faculty_id, room_id, section_id);
                }
                return Err(e);
            }
        }
        Ok(())
    }

    pub fn release_span(
        &mut self,
        day: Day,
        slot_ids: &[String],
        faculty_id: &str,
        room_id: &str,
        section_id: &str,
    ) {
        for slot in slot_ids {
            self.release(day, slot, faculty_id, room_id, section_id);
        }
    }

    pub fn reserve_session(&mut self, s: &ScheduleSession) -> Result<(), ConflictError> {
        self.reserve_span(s.day, &s.slot_ids, &s.faculty_id, &s.room_id, &s.section_id)
    }

    pub fn release_session(&mut self, s: &ScheduleSession) {
        self.release_span(s.day, &s.slot_ids, &s.faculty_id, &s.room_id, &s.section_id);
    }

    /// Total number of (day, slot) bookings.
    pub fn booking_count(&self) -> usize {
        self.slots.values().map(|occ| occ.bookings.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }
}
