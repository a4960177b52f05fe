//! Backtracking assignment solver.
//!
//! # Algorithm
//!
//! For each section:
//! 1. Expand the curriculum into [`Requirement`]s in scarcity order.
//!    Structural impossibilities fail the section before any search.
//! 2. For the next requirement, enumerate (day, slot run, faculty, room)
//!    tuples. Hard filters: faculty eligibility and own hour limits,
//!    room type and capacity, contiguous non-break slots, availability,
//!    mandatory constraints. Survivors are ranked by soft penalty.
//! 3. Reserve the best candidate and push a choice point.
//! 4. On a dead end, pop the most recent choice point of the section,
//!    release it and take its next candidate. A requirement that dead-ends
//!    more than `max_backtracks_per_requirement` times is recorded as
//!    unresolved and skipped.
//!
//! Search uses an explicit stack, so depth is bounded by the number of
//! requirements and cancellation is checked between choice points.
//!
//! # Tie-break
//!
//! Equal-penalty candidates are ordered by faculty weekly load, day, first
//! slot, faculty id, then room (preferred type, tightest fit, id). With a
//! seed configured, equal-penalty runs are shuffled by a `StdRng` seeded
//! from the seed and the section id.
//!
//! # Complexity
//!
//! Enumeration is O(D × S × F × R × C) per requirement for D days, S slot
//! runs, F eligible faculty, R rooms and C active constraints. The number of
//! dead ends is bounded by requirements × (budget + 1).
//!
//! # Reference
//! Russell & Norvig (2021), "Artificial Intelligence: A Modern Approach",
//! Ch. 6: Constraint Satisfaction Problems

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::requirement::{hostable_rooms, plan_section, Requirement, StructuralProblem};
use super::state::RunState;
use crate::catalog::Catalog;
use crate::config::SchedulerConfig;
use crate::constraints::{Candidate, ConstraintEngine};
use crate::error::ScheduleError;
use crate::models::{Day, Faculty, Room, ScheduleSession, Section, Violation};

/// Cooperative cancellation flag shared between a caller and a run.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Clears the flag for the next run.
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Per-section generation state.
///
/// `Pending → InProgress → {Complete, Partial, Failed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GenerationStatus {
    Pending,
    InProgress,
    /// Every requirement placed.
    Complete,
    /// Some requirements unresolved, or the run was cancelled.
    Partial,
    /// Structurally impossible; nothing placed.
    Failed,
}

/// A requirement the solver could not place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnresolvedRequirement {
    pub requirement: Requirement,
    /// Names the subject, the section and the blocking cause.
    pub reason: String,
}

/// Outcome of generating one section.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionResult {
    pub section_id: String,
    pub section_name: String,
    pub status: GenerationStatus,
    /// Placed sessions in day and slot order.
    pub sessions: Vec<ScheduleSession>,
    pub unresolved: Vec<UnresolvedRequirement>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub problems: Vec<StructuralProblem>,
    /// Preferred and optional rules the placed sessions violate.
    pub soft_violations: Vec<Violation>,
    pub backtracks: usize,
    /// The run stopped before this section was finished.
    pub cancelled: bool,
}

impl SectionResult {
    fn empty(section: &Section, status: GenerationStatus) -> Self {
        Self {
            section_id: section.id.clone(),
            section_name: section.name.clone(),
            status,
            sessions: Vec::new(),
            unresolved: Vec::new(),
            problems: Vec::new(),
            soft_violations: Vec::new(),
            backtracks: 0,
            cancelled: false,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.status == GenerationStatus::Complete
    }
}

/// A ranked admissible candidate.
#[derive(Debug, Clone)]
struct Placement<'a> {
    faculty: &'a Faculty,
    room: &'a Room,
    room_rank: usize,
    day: Day,
    slots: Vec<usize>,
    penalty: u32,
    faculty_load: i32,
    violations: Vec<Violation>,
}

impl Placement<'_> {
    fn rank_key(&self) -> (u32, i32, usize, usize, &str, usize) {
        (
            self.penalty,
            self.faculty_load,
            self.day.index(),
            self.slots.first().copied().unwrap_or(0),
            self.faculty.id.as_str(),
            self.room_rank,
        )
    }
}

/// A placed requirement and the alternatives left for it.
struct ChoicePoint<'a> {
    req: usize,
    candidates: Vec<Placement<'a>>,
    /// Index of the next untried candidate.
    next: usize,
}

/// How far enumeration got before running out of options.
#[derive(Debug, Default)]
struct Diagnosis {
    section_free: bool,
    faculty_capacity: bool,
    faculty_free: bool,
    room_free: bool,
    mandatory: Option<String>,
}

impl Diagnosis {
    fn cause(&self, req: &Requirement) -> String {
        if !self.section_free {
            format!("section has no free {}-slot run left in the week", req.slots)
        } else if !self.faculty_capacity {
            "no eligible faculty with remaining capacity".to_string()
        } else if !self.faculty_free {
            "every eligible faculty member is busy in the section's free slots".to_string()
        } else if !self.room_free {
            format!("no suitable room is free for the {}", req.session_type)
        } else if let Some(message) = &self.mandatory {
            format!("mandatory constraint not satisfiable: {message}")
        } else {
            "alternatives exhausted after backtracking".to_string()
        }
    }
}

/// Places sessions for sections against shared run state.
#[derive(Debug, Clone)]
pub struct Solver<'a> {
    catalog: &'a Catalog,
    engine: &'a ConstraintEngine,
    config: &'a SchedulerConfig,
    cancel: Option<CancelToken>,
}

impl<'a> Solver<'a> {
    pub fn new(catalog: &'a Catalog, engine: &'a ConstraintEngine, config: &'a SchedulerConfig) -> Self {
        Self {
            catalog,
            engine,
            config,
            cancel: None,
        }
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
    }

    /// Generates every active section in id order against one shared state.
    ///
    /// After a cancellation the section in progress is reported PARTIAL and
    /// the remaining ones PENDING.
    pub fn generate_all(&self, state: &mut RunState) -> Result<Vec<SectionResult>, ScheduleError> {
        let mut results = Vec::new();
        let mut cancelled = false;
        for section in self.catalog.active_sections() {
            if cancelled {
                let mut pending = SectionResult::empty(section, GenerationStatus::Pending);
                pending.cancelled = true;
                results.push(pending);
                continue;
            }
            results.push(self.generate_for_section(&section.id, state)?);
            cancelled = self.is_cancelled();
        }
        Ok(results)
    }

    /// Generates one section, replacing any sessions it already has in
    /// `state`. Sessions of other sections stay reserved.
    ///
    /// # Errors
    /// - `NotFound` for an unknown section id
    /// - `Conflict` if a reservation collides, which indicates corrupt state
    pub fn generate_for_section(
        &self,
        section_id: &str,
        state: &mut RunState,
    ) -> Result<SectionResult, ScheduleError> {
        let section = self
            .catalog
            .get_section(section_id)
            .ok_or_else(|| ScheduleError::not_found("section", section_id))?;

        let cleared = state.clear_section(&section.id);
        if !cleared.is_empty() {
            debug!(section = %section.name, sessions = cleared.len(), "previous sessions cleared");
        }
        info!(section = %section.name, status = ?GenerationStatus::InProgress, "section generation started");

        let plan = plan_section(self.catalog, section, self.config);
        if !plan.is_feasible() {
            for problem in &plan.problems {
                warn!(section = %section.name, problem = %problem.message, "structural problem");
            }
            let mut result = SectionResult::empty(section, GenerationStatus::Failed);
            result.unresolved = plan
                .requirements
                .into_iter()
                .map(|requirement| {
                    let reason = plan
                        .problems
                        .iter()
                        .find(|p| p.subject_code.as_deref() == Some(requirement.subject_code.as_str()))
                        .or(plan.problems.first())
                        .map(|p| p.message.clone())
                        .unwrap_or_default();
                    UnresolvedRequirement { requirement, reason }
                })
                .collect();
            result.problems = plan.problems;
            info!(section = %section.name, status = ?result.status, "section generation finished");
            return Ok(result);
        }

        let reqs = plan.requirements;
        let n = reqs.len();
        let budget = self.config.max_backtracks_per_requirement;
        let mut rng = self
            .config
            .seed
            .map(|seed| StdRng::seed_from_u64(seed ^ fnv1a(&section.id)));

        let mut stack: Vec<ChoicePoint<'a>> = Vec::with_capacity(n);
        let mut attempts = vec![0usize; n];
        let mut unresolved: BTreeMap<usize, String> = BTreeMap::new();
        let mut backtracks = 0usize;
        let mut cancelled = false;
        let mut k = 0;

        while k < n {
            if self.is_cancelled() {
                cancelled = true;
                break;
            }
            if unresolved.contains_key(&k) {
                k += 1;
                continue;
            }

            let mut diagnosis = Diagnosis::default();
            let candidates = self.candidates(section, &reqs[k], state, rng.as_mut(), &mut diagnosis);
            if let Some(best) = candidates.first() {
                self.commit(section, &reqs[k], best, state)?;
                stack.push(ChoicePoint {
                    req: k,
                    candidates,
                    next: 1,
                });
                k += 1;
                continue;
            }

            attempts[k] += 1;
            if attempts[k] > budget || stack.is_empty() {
                let reason = format!(
                    "{} for {}: {}",
                    reqs[k].subject_code,
                    section.name,
                    diagnosis.cause(&reqs[k])
                );
                debug!(requirement = %reqs[k].id, %reason, "requirement unresolved");
                unresolved.insert(k, reason);
                k += 1;
                continue;
            }

            backtracks += 1;
            debug!(requirement = %reqs[k].id, attempt = attempts[k], "dead end, backtracking");
            let mut resume = k;
            while let Some(mut point) = stack.pop() {
                state.unplace(&reqs[point.req].id);
                resume = point.req;
                if let Some(alternative) = point.candidates.get(point.next) {
                    self.commit(section, &reqs[point.req], alternative, state)?;
                    point.next += 1;
                    resume = point.req + 1;
                    stack.push(point);
                    break;
                }
            }
            // requirements after the resume point get another try
            unresolved.retain(|&i, _| i < resume);
            k = resume;
        }

        let mut result = SectionResult::empty(section, GenerationStatus::Complete);
        result.backtracks = backtracks;
        result.cancelled = cancelled;
        let mut placed = vec![false; n];
        for point in &stack {
            placed[point.req] = true;
            if let Some(chosen) = point.candidates.get(point.next - 1) {
                result.soft_violations.extend(chosen.violations.iter().cloned());
            }
        }
        for (i, requirement) in reqs.into_iter().enumerate() {
            if placed[i] {
                continue;
            }
            let reason = unresolved.remove(&i).unwrap_or_else(|| {
                format!("{} for {}: run cancelled", requirement.subject_code, section.name)
            });
            result.unresolved.push(UnresolvedRequirement { requirement, reason });
        }

        let grid = self.catalog.grid();
        result.sessions = state
            .sessions_for_section(&section.id)
            .into_iter()
            .cloned()
            .collect();
        result.sessions.sort_by_key(|s| {
            (
                s.day.index(),
                grid.index_of(&s.time_slot_id).unwrap_or(usize::MAX),
            )
        });

        if cancelled || !result.unresolved.is_empty() {
            result.status = GenerationStatus::Partial;
        }
        info!(
            section = %section.name,
            status = ?result.status,
            placed = result.sessions.len(),
            unresolved = result.unresolved.len(),
            backtracks,
            cancelled,
            "section generation finished"
        );
        Ok(result)
    }

    /// Admissible placements for a requirement, best first.
    fn candidates(
        &self,
        section: &'a Section,
        req: &Requirement,
        state: &RunState,
        rng: Option<&mut StdRng>,
        diagnosis: &mut Diagnosis,
    ) -> Vec<Placement<'a>> {
        let catalog = self.catalog;
        let grid = catalog.grid();
        let Some(subject) = catalog.get_subject(&req.subject_id) else {
            return Vec::new();
        };
        let faculty = catalog.eligible_faculty(subject);
        let rooms = hostable_rooms(catalog, section, req.session_type);
        let view = state.view(grid, &self.config.working_days);
        let index = state.index();
        let hours = req.slots as i32;

        let mut out = Vec::new();
        for &day in &self.config.working_days {
            for start in grid.block_starts(req.slots) {
                let slots: Vec<usize> = (start..start + req.slots).collect();
                let slot_ids = grid.ids_for(&slots);
                if !slot_ids
                    .iter()
                    .all(|s| index.is_section_free(day, s, &section.id))
                {
                    continue;
                }
                diagnosis.section_free = true;

                for &member in &faculty {
                    if !state.load().fits(
                        member,
                        day,
                        hours,
                        member.max_hours_per_day,
                        member.max_hours_per_week,
                    ) {
                        continue;
                    }
                    diagnosis.faculty_capacity = true;
                    if !slot_ids
                        .iter()
                        .all(|s| index.is_faculty_free(day, s, &member.id))
                    {
                        continue;
                    }
                    diagnosis.faculty_free = true;

                    for (room_rank, &room) in rooms.iter().enumerate() {
                        if !index.is_span_free(day, &slot_ids, &member.id, &room.id, &section.id) {
                            continue;
                        }
                        diagnosis.room_free = true;

                        let candidate = Candidate {
                            subject,
                            faculty: member,
                            room,
                            section,
                            session_type: req.session_type,
                            day,
                            slots: &slots,
                        };
                        let assessment = self.engine.assess(&candidate, &view, self.config);
                        if !assessment.admissible {
                            if diagnosis.mandatory.is_none() {
                                diagnosis.mandatory =
                                    assessment.violations.last().map(|v| v.message.clone());
                            }
                            continue;
                        }
                        out.push(Placement {
                            faculty: member,
                            room,
                            room_rank,
                            day,
                            slots: slots.clone(),
                            penalty: assessment.penalty,
                            faculty_load: state.load().weekly(&member.id),
                            violations: assessment.violations,
                        });
                    }
                }
            }
        }

        out.sort_by(|a, b| a.rank_key().cmp(&b.rank_key()));
        if let Some(rng) = rng {
            shuffle_ties(&mut out, rng);
        }
        out
    }

    fn commit(
        &self,
        section: &Section,
        req: &Requirement,
        placement: &Placement<'_>,
        state: &mut RunState,
    ) -> Result<(), ScheduleError> {
        let slot_ids = self.catalog.grid().ids_for(&placement.slots);
        let conflict_reason = (!placement.violations.is_empty()).then(|| {
            placement
                .violations
                .iter()
                .map(|v| v.message.as_str())
                .collect::<Vec<_>>()
                .join("; ")
        });
        let session = ScheduleSession {
            id: req.id.clone(),
            subject_id: req.subject_id.clone(),
            subject_code: req.subject_code.clone(),
            faculty_id: placement.faculty.id.clone(),
            room_id: placement.room.id.clone(),
            section_id: section.id.clone(),
            day: placement.day,
            time_slot_id: slot_ids.first().cloned().unwrap_or_default(),
            duration: slot_ids.len(),
            slot_ids,
            session_type: req.session_type,
            has_conflict: conflict_reason.is_some(),
            conflict_reason,
        };
        state.place(session)?;
        Ok(())
    }
}

/// Shuffles each run of equal-penalty candidates in place.
fn shuffle_ties(candidates: &mut [Placement<'_>], rng: &mut StdRng) {
    let mut start = 0;
    while start < candidates.len() {
        let penalty = candidates[start].penalty;
        let len = candidates[start..]
            .iter()
            .take_while(|c| c.penalty == penalty)
            .count();
        candidates[start..start + len].shuffle(rng);
        start += len;
    }
}

/// FNV-1a, for mixing the section id into the seed.
fn fnv1a(s: &str) -> u64 {
    s.bytes().fold(0xcbf2_9ce4_8422_2325, |hash, b| {
        (hash ^ u64::from(b)).wrapping_mul(0x0100_0000_01b3)
    })
}
