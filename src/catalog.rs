//! Entity catalog.
//!
//! In-memory store behind the CRUD surface: faculty, subjects, rooms,
//! sections, constraints and the slot grid. Every write validates the
//! entity's own fields; cross-entity integrity is checked by
//! [`Catalog::validate`] before each generation run.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::constraints::ConstraintRegistry;
use crate::error::ScheduleError;
use crate::models::{
    Constraint, ConstraintCategory, ConstraintPriority, Faculty, Room, RoomType, Section, SlotGrid,
    Subject, TimeSlot,
};
use crate::validation::{
    validate_input, InputRef, ValidationError, ValidationErrorKind, ValidationResult,
};

/// Serialized catalog contents (seed files, exports).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CatalogData {
    pub faculty: Vec<Faculty>,
    pub subjects: Vec<Subject>,
    pub rooms: Vec<Room>,
    pub sections: Vec<Section>,
    pub constraints: Vec<Constraint>,
    /// Slot grid; the institutional default when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_slots: Option<Vec<TimeSlot>>,
}

/// Entities keyed by id.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    faculty: BTreeMap<String, Faculty>,
    subjects: BTreeMap<String, Subject>,
    rooms: BTreeMap<String, Room>,
    sections: BTreeMap<String, Section>,
    constraints: BTreeMap<String, Constraint>,
    grid: SlotGrid,
}

impl Catalog {
    /// An empty catalog on the institutional slot grid.
    pub fn new() -> Self {
        Self {
            grid: SlotGrid::institutional(),
            ..Default::default()
        }
    }

    /// Builds a catalog from raw data, rejecting it as a whole if any
    /// integrity check fails.
    pub fn from_data(data: CatalogData) -> Result<Self, ScheduleError> {
        let grid = data
            .time_slots
            .map(SlotGrid::new)
            .unwrap_or_else(SlotGrid::institutional);
        validate_input(InputRef {
            faculty: &data.faculty,
            subjects: &data.subjects,
            rooms: &data.rooms,
            sections: &data.sections,
            constraints: &data.constraints,
            grid: &grid,
        })?;

        Ok(Self {
            faculty: data.faculty.into_iter().map(|f| (f.id.clone(), f)).collect(),
            subjects: data.subjects.into_iter().map(|s| (s.id.clone(), s)).collect(),
            rooms: data.rooms.into_iter().map(|r| (r.id.clone(), r)).collect(),
            sections: data.sections.into_iter().map(|s| (s.id.clone(), s)).collect(),
            constraints: data
                .constraints
                .into_iter()
                .map(|c| (c.id.clone(), c))
                .collect(),
            grid,
        })
    }

    /// Parses a JSON seed document.
    pub fn from_json(json: &str) -> Result<Self, ScheduleError> {
        let data: CatalogData =
            serde_json::from_str(json).map_err(|e| ScheduleError::Config(e.to_string()))?;
        Self::from_data(data)
    }

    /// Exports the contents.
    pub fn to_data(&self) -> CatalogData {
        CatalogData {
            faculty: self.faculty.values().cloned().collect(),
            subjects: self.subjects.values().cloned().collect(),
            rooms: self.rooms.values().cloned().collect(),
            sections: self.sections.values().cloned().collect(),
            constraints: self.constraints.values().cloned().collect(),
            time_slots: Some(self.grid.slots().to_vec()),
        }
    }

    /// Whole-catalog integrity check.
    pub fn validate(&self) -> ValidationResult {
        let data = self.to_data();
        validate_input(InputRef {
            faculty: &data.faculty,
            subjects: &data.subjects,
            rooms: &data.rooms,
            sections: &data.sections,
            constraints: &data.constraints,
            grid: &self.grid,
        })
    }

    // ---- faculty ----

    pub fn upsert_faculty(&mut self, faculty: Faculty) -> Result<(), ScheduleError> {
        faculty.validate()?;
        self.faculty.insert(faculty.id.clone(), faculty);
        Ok(())
    }

    pub fn get_faculty(&self, id: &str) -> Option<&Faculty> {
        self.faculty.get(id)
    }

    pub fn remove_faculty(&mut self, id: &str) -> Result<Faculty, ScheduleError> {
        self.faculty
            .remove(id)
            .ok_or_else(|| ScheduleError::not_found("faculty", id))
    }

    pub fn list_faculty(&self) -> impl Iterator<Item = &Faculty> {
        self.faculty.values()
    }

    // ---- subjects ----

    pub fn upsert_subject(&mut self, subject: Subject) -> Result<(), ScheduleError> {
        subject.validate()?;
        self.subjects.insert(subject.id.clone(), subject);
        Ok(())
    }

    pub fn get_subject(&self, id: &str) -> Option<&Subject> {
        self.subjects.get(id)
    }

    pub fn remove_subject(&mut self, id: &str) -> Result<Subject, ScheduleError> {
        self.subjects
            .remove(id)
            .ok_or_else(|| ScheduleError::not_found("subject", id))
    }

    pub fn list_subjects(&self) -> impl Iterator<Item = &Subject> {
        self.subjects.values()
    }

    /// Looks a subject up by id, then by code.
    pub fn subject_by_key(&self, key: &str) -> Option<&Subject> {
        self.subjects
            .get(key)
            .or_else(|| self.subjects.values().find(|s| s.code == key))
    }

    // ---- rooms ----

    pub fn upsert_room(&mut self, room: Room) -> Result<(), ScheduleError> {
        room.validate()?;
        self.rooms.insert(room.id.clone(), room);
        Ok(())
    }

    pub fn get_room(&self, id: &str) -> Option<&Room> {
        self.rooms.get(id)
    }

    pub fn remove_room(&mut self, id: &str) -> Result<Room, ScheduleError> {
        self.rooms
            .remove(id)
            .ok_or_else(|| ScheduleError::not_found("room", id))
    }

    pub fn list_rooms(&self) -> impl Iterator<Item = &Room> {
        self.rooms.values()
    }

    pub fn active_rooms(&self) -> impl Iterator<Item = &Room> {
        self.rooms.values().filter(|r| r.active)
    }

    // ---- sections ----

    pub fn upsert_section(&mut self, section: Section) -> Result<(), ScheduleError> {
        section.validate()?;
        self.sections.insert(section.id.clone(), section);
        Ok(())
    }

    pub fn get_section(&self, id: &str) -> Option<&Section> {
        self.sections.get(id)
    }

    pub fn remove_section(&mut self, id: &str) -> Result<Section, ScheduleError> {
        self.sections
            .remove(id)
            .ok_or_else(|| ScheduleError::not_found("section", id))
    }

    pub fn list_sections(&self) -> impl Iterator<Item = &Section> {
        self.sections.values()
    }

    /// ACTIVE sections in id order.
    pub fn active_sections(&self) -> impl Iterator<Item = &Section> {
        self.sections.values().filter(|s| s.is_active())
    }

    // ---- constraints ----

    pub fn upsert_constraint(&mut self, constraint: Constraint) -> Result<(), ScheduleError> {
        constraint.validate()?;
        if let Err(message) = ConstraintRegistry::builtin().compile(&constraint) {
            return Err(ScheduleError::Validation(vec![ValidationError::new(
                ValidationErrorKind::InvalidParameters,
                &constraint.id,
                message,
            )]));
        }
        self.constraints.insert(constraint.id.clone(), constraint);
        Ok(())
    }

    pub fn get_constraint(&self, id: &str) -> Option<&Constraint> {
        self.constraints.get(id)
    }

    pub fn remove_constraint(&mut self, id: &str) -> Result<Constraint, ScheduleError> {
        self.constraints
            .remove(id)
            .ok_or_else(|| ScheduleError::not_found("constraint", id))
    }

    pub fn list_constraints(&self) -> impl Iterator<Item = &Constraint> {
        self.constraints.values()
    }

    /// Flips a constraint's active flag and returns the updated record.
    pub fn toggle_constraint(&mut self, id: &str) -> Result<&Constraint, ScheduleError> {
        let c = self
            .constraints
            .get_mut(id)
            .ok_or_else(|| ScheduleError::not_found("constraint", id))?;
        c.active = !c.active;
        Ok(c)
    }

    // ---- slot grid ----

    pub fn grid(&self) -> &SlotGrid {
        &self.grid
    }

    /// Replaces the slot grid after checking it.
    pub fn set_time_slots(&mut self, slots: Vec<TimeSlot>) -> Result<(), ScheduleError> {
        let grid = SlotGrid::new(slots);
        let mut errors = Vec::new();
        crate::validation::validate_grid(&grid, &mut errors);
        if !errors.is_empty() {
            return Err(ScheduleError::Validation(errors));
        }
        self.grid = grid;
        Ok(())
    }

    // ---- relationships ----

    /// Subjects a section takes.
    ///
    /// Resolves the section's curriculum by id or code. An empty
    /// curriculum falls back to the subjects of the section's department
    /// and year.
    pub fn curriculum(&self, section: &Section) -> Vec<&Subject> {
        if section.curriculum.is_empty() {
            return self
                .subjects
                .values()
                .filter(|s| s.department == section.department && s.year == section.year)
                .collect();
        }
        let mut subjects: Vec<&Subject> = Vec::new();
        for key in &section.curriculum {
            if let Some(s) = self.subject_by_key(key) {
                if !subjects.iter().any(|known| known.id == s.id) {
                    subjects.push(s);
                }
            }
        }
        subjects
    }

    /// Active faculty eligible for a subject, in id order.
    ///
    /// Eligibility is listed on either side of the relationship: in the
    /// subject's `eligible_faculty` or in the member's `eligible_subjects`.
    pub fn eligible_faculty(&self, subject: &Subject) -> Vec<&Faculty> {
        self.faculty
            .values()
            .filter(|f| f.active)
            .filter(|f| {
                subject.eligible_faculty.iter().any(|id| *id == f.id)
                    || f.teaches(&subject.code, &subject.id)
            })
            .collect()
    }

    pub fn counts(&self) -> CatalogCounts {
        CatalogCounts {
            faculty: self.faculty.len(),
            subjects: self.subjects.len(),
            rooms: self.rooms.len(),
            sections: self.sections.len(),
            constraints: self.constraints.len(),
        }
    }

    /// A small computer-science department: five faculty, six subjects,
    /// six rooms, four sections and the stock institutional constraints.
    pub fn demo() -> Self {
        let dept = "Computer Science";
        let faculty = [
            Faculty::new("f1", "Dr. Sarah Mitchell", dept)
                .with_designation("Professor")
                .with_max_hours(6, 20),
            Faculty::new("f2", "Dr. James Chen", dept)
                .with_designation("Associate Professor")
                .with_max_hours(6, 22),
            Faculty::new("f3", "Prof. Emily Watson", dept)
                .with_designation("Assistant Professor")
                .with_max_hours(7, 24),
            Faculty::new("f4", "Dr. Michael Brown", dept)
                .with_designation("Professor")
                .with_max_hours(5, 18),
            Faculty::new("f5", "Dr. Lisa Park", dept)
                .with_designation("Associate Professor")
                .with_max_hours(6, 20)
                .with_active(false),
        ];
        let subject = |id: &str, code: &str, name: &str, hours: (i32, i32, i32), elective: bool, who: &[&str]| {
            let mut s = Subject::new(id, code)
                .with_name(name)
                .with_department(dept, 0)
                .with_credits(if hours.1 > 0 { 4 } else { 3 })
                .with_hours(hours.0, hours.1, hours.2)
                .with_elective(elective);
            s.eligible_faculty = who.iter().map(|f| f.to_string()).collect();
            s
        };
        let subjects = [
            subject("s1", "CS301", "Data Structures & Algorithms", (3, 1, 2), false, &["f1", "f5"]),
            subject("s2", "CS302", "Database Management Systems", (3, 1, 2), false, &["f1", "f4"]),
            subject("s3", "CS401", "Artificial Intelligence", (3, 0, 2), false, &["f2"]),
            subject("s4", "CS402", "Machine Learning", (3, 1, 2), true, &["f2", "f3"]),
            subject("s5", "CS303", "Computer Networks", (3, 1, 0), false, &["f1", "f4"]),
            subject("s6", "CS403", "Human Computer Interaction", (2, 1, 2), true, &["f3", "f5"]),
        ];
        let rooms = [
            Room::new("r1", RoomType::Lecture, 120).with_code("LH-101").with_building("Main Block", "1"),
            Room::new("r2", RoomType::Lecture, 80).with_code("LH-102").with_building("Main Block", "1"),
            Room::new("r3", RoomType::Lab, 40).with_code("LAB-A1").with_building("Tech Block", "2"),
            Room::new("r4", RoomType::Lab, 40).with_code("LAB-A2").with_building("Tech Block", "2"),
            Room::new("r5", RoomType::Seminar, 30).with_code("SR-201").with_building("Main Block", "2"),
            Room::new("r6", RoomType::Lecture, 100)
                .with_code("LH-201")
                .with_building("Science Block", "2")
                .with_active(false),
        ];
        let section = |id: &str, name: &str, size: i32, year: i32, subjects: [&str; 3]| {
            subjects.iter().fold(
                Section::new(id, name, size).with_department(dept, year),
                |s, subject| s.with_subject(*subject),
            )
        };
        let sections = [
            section("sec1", "CS-3A", 60, 3, ["s1", "s2", "s5"]),
            section("sec2", "CS-3B", 55, 3, ["s1", "s2", "s5"]),
            section("sec3", "CS-4A", 50, 4, ["s3", "s4", "s6"]),
            section("sec4", "CS-4B", 48, 4, ["s3", "s4", "s6"]),
        ];

        let mut catalog = Self::new();
        catalog.faculty = faculty.into_iter().map(|f| (f.id.clone(), f)).collect();
        catalog.subjects = subjects.into_iter().map(|s| (s.id.clone(), s)).collect();
        catalog.rooms = rooms.into_iter().map(|r| (r.id.clone(), r)).collect();
        catalog.sections = sections.into_iter().map(|s| (s.id.clone(), s)).collect();
        catalog.constraints = stock_constraints()
            .into_iter()
            .map(|c| (c.id.clone(), c))
            .collect();
        catalog
    }
}

/// The institution's default rule set.
pub fn stock_constraints() -> Vec<Constraint> {
    use ConstraintCategory as Cat;
    use ConstraintPriority::{Mandatory, Preferred};
    vec![
        Constraint::new("c1", "Working Hours", Cat::Institutional, Mandatory)
            .with_description("Classes allowed between 9:00 AM and 5:00 PM only")
            .with_parameters(json!({"startTime": "09:00", "endTime": "17:00"})),
        Constraint::new("c2", "Lunch Break", Cat::Institutional, Mandatory)
            .with_description("No classes during lunch")
            .with_parameters(json!({"startTime": "12:35", "endTime": "13:30"})),
        Constraint::new("c3", "Maximum Daily Hours", Cat::Faculty, Mandatory)
            .with_description("Faculty cannot teach more than 6 hours per day")
            .with_parameters(json!({"maxHours": 6})),
        Constraint::new("c4", "Lab Continuous Sessions", Cat::Room, Mandatory)
            .with_description("Lab sessions must be scheduled as continuous 2-hour blocks")
            .with_parameters(json!({"minDuration": 2})),
        Constraint::new("c5", "Elective Alignment", Cat::Section, Preferred)
            .with_description("Elective subjects should be scheduled at the same time across sections"),
        Constraint::new("c6", "Even Distribution", Cat::Institutional, Preferred)
            .with_description("Distribute sessions evenly across weekdays")
            .with_parameters(json!({"maxVariance": 2})),
    ]
}

/// Entity counts per family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CatalogCounts {
    pub faculty: usize,
    pub subjects: usize,
    pub rooms: usize,
    pub sections: usize,
    pub constraints: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_is_valid() {
        let c = Catalog::demo();
        assert!(c.validate().is_ok());
        let counts = c.counts();
        assert_eq!(counts.faculty, 5);
        assert_eq!(counts.sections, 4);
        assert_eq!(counts.constraints, 6);
    }

    #[test]
    fn test_crud() {
        let mut c = Catalog::new();
        c.upsert_room(Room::new("LH-102", RoomType::Lecture, 80)).unwrap();
        assert_eq!(c.get_room("LH-102").unwrap().capacity, 80);

        c.upsert_room(Room::new("LH-102", RoomType::Lecture, 90)).unwrap();
        assert_eq!(c.list_rooms().count(), 1);
        assert_eq!(c.get_room("LH-102").unwrap().capacity, 90);

        assert!(c.remove_room("LH-102").is_ok());
        assert!(matches!(
            c.remove_room("LH-102"),
            Err(ScheduleError::NotFound { kind: "room", .. })
        ));
    }

    #[test]
    fn test_upsert_rejects_invalid_entity() {
        let mut c = Catalog::new();
        let err = c
            .upsert_subject(Subject::new("S1", "CS301").with_credits(-2))
            .unwrap_err();
        match err {
            ScheduleError::Validation(errors) => {
                assert_eq!(errors[0].kind, ValidationErrorKind::InvalidNumber)
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(c.get_subject("S1").is_none());
    }

    #[test]
    fn test_toggle_constraint() {
        let mut c = Catalog::demo();
        assert!(!c.toggle_constraint("c5").unwrap().active);
        assert!(c.toggle_constraint("c5").unwrap().active);
        assert!(c.toggle_constraint("c99").is_err());
    }

    #[test]
    fn test_eligibility_is_union_of_both_sides() {
        let mut c = Catalog::new();
        c.upsert_subject(Subject::new("S1", "CS301").with_faculty("F1")).unwrap();
        c.upsert_faculty(Faculty::new("F1", "A", "CSE")).unwrap();
        c.upsert_faculty(Faculty::new("F2", "B", "CSE").with_subject("CS301")).unwrap();
        c.upsert_faculty(Faculty::new("F3", "C", "CSE").with_subject("S1").with_active(false))
            .unwrap();
        c.upsert_faculty(Faculty::new("F4", "D", "CSE")).unwrap();

        let subject = c.get_subject("S1").unwrap();
        let ids: Vec<&str> = c.eligible_faculty(subject).iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["F1", "F2"]);
    }

    #[test]
    fn test_curriculum_resolution() {
        let c = Catalog::demo();
        let sec = c.get_section("sec1").unwrap();
        let codes: Vec<&str> = c.curriculum(sec).iter().map(|s| s.code.as_str()).collect();
        assert_eq!(codes, vec!["CS301", "CS302", "CS303"]);

        let mut c = Catalog::new();
        c.upsert_subject(Subject::new("S1", "EE201").with_department("EEE", 2)).unwrap();
        c.upsert_subject(Subject::new("S2", "EE301").with_department("EEE", 3)).unwrap();
        let sec = Section::new("X", "EE-2A", 40).with_department("EEE", 2);
        let codes: Vec<&str> = c.curriculum(&sec).iter().map(|s| s.code.as_str()).collect();
        assert_eq!(codes, vec!["EE201"]);
    }

    #[test]
    fn test_from_json_rejects_duplicates() {
        let json = r#"{
            "faculty": [{"id": "f1", "name": "A"}, {"id": "f1", "name": "B"}],
            "rooms": [{"id": "r1", "code": "LH-101", "type": "LECTURE", "capacity": 60}]
        }"#;
        match Catalog::from_json(json) {
            Err(ScheduleError::Validation(errors)) => {
                assert_eq!(errors[0].kind, ValidationErrorKind::DuplicateId)
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_round_trip_through_data() {
        let c = Catalog::demo();
        let json = serde_json::to_string(&c.to_data()).unwrap();
        let back = Catalog::from_json(&json).unwrap();
        assert_eq!(back.counts(), c.counts());
        assert_eq!(back.grid().len(), 11);
    }

    #[test]
    fn test_set_time_slots_validates() {
        let mut c = Catalog::new();
        assert!(c.set_time_slots(Vec::new()).is_err());
        assert_eq!(c.grid().len(), 11);
    }
}
