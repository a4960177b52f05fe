//! Room model.

use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

use super::{id_string, SessionType};
use crate::validation::{ValidationError, ValidationErrorKind, ValidationResult};

/// Room classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RoomType {
    #[serde(alias = "lecture")]
    Lecture,
    #[serde(alias = "lab")]
    Lab,
    #[serde(alias = "seminar")]
    Seminar,
}

impl RoomType {
    /// Whether a session of the given type may be held in this room type.
    ///
    /// Labs only run in LAB rooms; lectures and tutorials never do.
    pub fn hosts(self, session_type: SessionType) -> bool {
        match session_type {
            SessionType::Lab => self == RoomType::Lab,
            SessionType::Lecture | SessionType::Tutorial => self != RoomType::Lab,
        }
    }

    /// Preference rank for a session type (lower is better).
    pub fn preference(self, session_type: SessionType) -> u8 {
        match (session_type, self) {
            (SessionType::Lecture, RoomType::Lecture) => 0,
            (SessionType::Tutorial, RoomType::Seminar) => 0,
            _ => 1,
        }
    }
}

/// A physical teaching room.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    /// Unique room code (e.g. "LH-102").
    pub code: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub building: String,
    #[serde(default, deserialize_with = "id_string")]
    pub floor: String,
    #[serde(rename = "type")]
    pub room_type: RoomType,
    pub capacity: i32,
    #[serde(default)]
    pub equipment: Vec<String>,
    #[serde(default)]
    pub wheelchair_accessible: bool,
    #[serde(default = "super::default_true", alias = "isActive")]
    pub active: bool,
}

impl Room {
    pub fn new(id: impl Into<String>, room_type: RoomType, capacity: i32) -> Self {
        let id = id.into();
        Self {
            code: id.clone(),
            id,
            name: String::new(),
            building: String::new(),
            floor: String::new(),
            room_type,
            capacity,
            equipment: Vec::new(),
            wheelchair_accessible: false,
            active: true,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = code.into();
        self
    }

    pub fn with_building(mut self, building: impl Into<String>, floor: impl Into<String>) -> Self {
        self.building = building.into();
        self.floor = floor.into();
        self
    }

    pub fn with_equipment(mut self, item: impl Into<String>) -> Self {
        self.equipment.push(item.into());
        self
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Whether the room seats a cohort of the given size.
    #[inline]
    pub fn seats(&self, headcount: i32) -> bool {
        self.capacity >= headcount
    }

    /// Field-level checks.
    pub fn validate(&self) -> ValidationResult {
        let mut errors = Vec::new();
        if self.id.trim().is_empty() || self.code.trim().is_empty() {
            errors.push(ValidationError::new(
                ValidationErrorKind::MissingField,
                &self.id,
                "room id and code are required",
            ));
        }
        if self.capacity <= 0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidNumber,
                &self.id,
                format!("room {} capacity must be positive, got {}", self.code, self.capacity),
            ));
        }
        ValidationError::collect(errors)
    }
}

impl PartialEq for Room {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Room {}

impl Hash for Room {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
