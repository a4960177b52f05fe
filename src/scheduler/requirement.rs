//! Session requirements.
//!
//! A section's curriculum expands into one requirement per weekly unit of
//! teaching: each lecture hour and each tutorial hour is a one-slot
//! requirement, and lab hours are cut into blocks of
//! `lab_block_slots` consecutive slots.
//!
//! # Scarcity order
//!
//! Requirements are placed most-constrained first:
//!
//! 1. lab blocks (contiguity and room-type narrowing),
//! 2. fewer eligible faculty × hostable room combinations,
//! 3. subject code, then ordinal (deterministic).

use serde::Serialize;

use crate::catalog::Catalog;
use crate::config::SchedulerConfig;
use crate::models::{Faculty, Room, Section, SessionType, Subject};

/// One unit of weekly teaching time a section must receive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Requirement {
    /// Stable key, also used as the placed session's id. Unique across
    /// sections: `-` and `%` inside the section and subject ids are escaped.
    pub id: String,
    pub section_id: String,
    pub subject_id: String,
    pub subject_code: String,
    pub session_type: SessionType,
    /// Consecutive slots the session occupies.
    pub slots: usize,
    /// 1-based count within (subject, session type).
    pub ordinal: usize,
    /// Eligible faculty × hostable rooms, the scarcity measure.
    #[serde(skip)]
    pub combinations: usize,
}

impl Requirement {
    fn new(section: &Section, subject: &Subject, session_type: SessionType, slots: usize, ordinal: usize) -> Self {
        Self {
            id: format!(
                "{}-{}-{}-{}",
                escape_id(&section.id),
                escape_id(&subject.id),
                session_type,
                ordinal
            ),
            section_id: section.id.clone(),
            subject_id: subject.id.clone(),
            subject_code: subject.code.clone(),
            session_type,
            slots,
            ordinal,
            combinations: 0,
        }
    }

    /// Sort key for placement order.
    fn scarcity_key(&self) -> (bool, usize, &str, u8, usize) {
        let type_rank = match self.session_type {
            SessionType::Lab => 0,
            SessionType::Lecture => 1,
            SessionType::Tutorial => 2,
        };
        (
            self.session_type != SessionType::Lab,
            self.combinations,
            self.subject_code.as_str(),
            type_rank,
            self.ordinal,
        )
    }
}

/// Percent-escapes the id separator so joined keys stay injective.
fn escape_id(id: &str) -> String {
    id.replace('%', "%25").replace('-', "%2D")
}

/// A section that can't be scheduled at all.
///
/// Detected before search; the section is marked FAILED and nothing is
/// placed for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuralProblem {
    /// Subject the problem concerns, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_code: Option<String>,
    pub message: String,
}

/// Everything the solver needs to know about one section's workload.
#[derive(Debug, Clone, Default)]
pub struct SectionPlan {
    /// Requirements in placement order.
    pub requirements: Vec<Requirement>,
    pub problems: Vec<StructuralProblem>,
}

impl SectionPlan {
    pub fn is_feasible(&self) -> bool {
        self.problems.is_empty()
    }

    /// Total slots the plan demands per week.
    pub fn demanded_slots(&self) -> usize {
        self.requirements.iter().map(|r| r.slots).sum()
    }
}

/// Active rooms that can host a session type for a section.
///
/// Lecture and tutorial rooms must seat the whole section; lab rooms
/// are matched on type only.
pub fn hostable_rooms<'a>(
    catalog: &'a Catalog,
    section: &Section,
    session_type: SessionType,
) -> Vec<&'a Room> {
    let mut rooms: Vec<&Room> = catalog
        .active_rooms()
        .filter(|r| r.room_type.hosts(session_type))
        .filter(|r| session_type == SessionType::Lab || r.seats(section.capacity))
        .collect();
    // preferred type, then tightest fit that still seats the section
    rooms.sort_by(|a, b| {
        a.room_type
            .preference(session_type)
            .cmp(&b.room_type.preference(session_type))
            .then_with(|| {
                let fit = |r: &Room| (!r.seats(section.capacity), r.capacity);
                fit(a).cmp(&fit(b))
            })
            .then_with(|| a.id.cmp(&b.id))
    });
    rooms
}

/// Expands a section's curriculum into ordered requirements and checks
/// for structural impossibilities.
pub fn plan_section(catalog: &Catalog, section: &Section, config: &SchedulerConfig) -> SectionPlan {
    let mut plan = SectionPlan::default();
    let block = config.lab_block_slots.max(1);

    for subject in catalog.curriculum(section) {
        if subject.total_hours() == 0 {
            continue;
        }
        let faculty: Vec<&Faculty> = catalog.eligible_faculty(subject);
        if faculty.is_empty() {
            plan.problems.push(StructuralProblem {
                subject_code: Some(subject.code.clone()),
                message: format!(
                    "{} for {}: no eligible active faculty",
                    subject.code, section.name
                ),
            });
            continue;
        }

        for session_type in [SessionType::Lecture, SessionType::Tutorial, SessionType::Lab] {
            let hours = subject.hours_for(session_type).max(0) as usize;
            if hours == 0 {
                continue;
            }
            let rooms = hostable_rooms(catalog, section, session_type);
            if rooms.is_empty() {
                plan.problems.push(StructuralProblem {
                    subject_code: Some(subject.code.clone()),
                    message: format!(
                        "{} for {}: no active room can host a {} for {} students",
                        subject.code, section.name, session_type, section.capacity
                    ),
                });
                continue;
            }
            let (count, slots) = match session_type {
                SessionType::Lab => {
                    if hours % block != 0 {
                        plan.problems.push(StructuralProblem {
                            subject_code: Some(subject.code.clone()),
                            message: format!(
                                "{} for {}: {} lab hours don't split into {}-slot blocks",
                                subject.code, section.name, hours, block
                            ),
                        });
                        continue;
                    }
                    (hours / block, block)
                }
                _ => (hours, 1),
            };
            let combinations = faculty.len() * rooms.len();
            for ordinal in 1..=count {
                let mut req = Requirement::new(section, subject, session_type, slots, ordinal);
                req.combinations = combinations;
                plan.requirements.push(req);
            }
        }
    }

    let available = config.working_days.len() * catalog.grid().teaching_slot_count();
    let demanded = plan.demanded_slots();
    if plan.problems.is_empty() && demanded > available {
        plan.problems.push(StructuralProblem {
            subject_code: None,
            message: format!(
                "{} needs {} slots per week but only {} teaching slots exist",
                section.name, demanded, available
            ),
        });
    }

    plan.requirements
        .sort_by(|a, b| a.scarcity_key().cmp(&b.scarcity_key()));
    plan
}
