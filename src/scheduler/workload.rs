//! Workload balancing and load metrics.
//!
//! Runs after placement. The balancer may hand sessions from heavily
//! loaded faculty to lighter eligible colleagues, then summarizes the
//! realized load.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Weekly hours | Sum of session hours per faculty |
//! | Peak day | Largest single-day hours per faculty |
//! | Load % | weekly hours / `maxHoursPerWeek` × 100 |
//! | Fairness | Variance of session counts across a department's active faculty |
//!
//! # Redistribution
//!
//! A session moves from faculty `f` to an eligible, active faculty `g`
//! only if `g` is free at the same day and slots, stays within both of
//! its hour limits, every mandatory rule still holds, the soft penalty
//! doesn't grow, and `load(g) + h < load(f)`. Each move strictly lowers
//! the sum of squared weekly loads, so the pass terminates.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info};

use super::state::RunState;
use crate::catalog::Catalog;
use crate::config::SchedulerConfig;
use crate::constraints::{Candidate, ConstraintEngine};
use crate::error::ScheduleError;
use crate::models::{Faculty, Room, ScheduleSession, Section, Subject, Timetable, Violation};

/// Realized load of one faculty member.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FacultyWorkload {
    pub faculty_id: String,
    pub name: String,
    pub department: String,
    pub sessions: usize,
    pub weekly_hours: i32,
    pub max_hours_per_week: i32,
    pub peak_daily_hours: i32,
    pub max_hours_per_day: i32,
    /// Weekly hours as a percentage of the weekly limit.
    pub load_percent: f64,
}

/// Spread of session counts within a department.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentFairness {
    pub department: String,
    /// Active faculty counted.
    pub faculty: usize,
    pub mean_sessions: f64,
    /// Population variance of session counts (0 is perfectly even).
    pub variance: f64,
}

/// Load diagnostics attached to a generation result.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadSummary {
    pub faculty: Vec<FacultyWorkload>,
    pub departments: Vec<DepartmentFairness>,
    /// Sessions the balancer reassigned in the run.
    pub reassigned: usize,
}

impl WorkloadSummary {
    /// Computes load metrics for every active faculty member and anyone
    /// holding sessions.
    ///
    /// # Errors
    /// `ConstraintViolation` if any member exceeds a weekly or daily limit.
    pub fn calculate(catalog: &Catalog, sessions: &[ScheduleSession]) -> Result<Self, ScheduleError> {
        let timetable = Timetable::new(sessions.to_vec());
        let weekly = timetable.weekly_hours();
        let daily = timetable.daily_hours();
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for s in sessions {
            *counts.entry(s.faculty_id.as_str()).or_insert(0) += 1;
        }

        let mut faculty = Vec::new();
        for f in catalog.list_faculty() {
            let weekly_hours = weekly.get(&f.id).copied().unwrap_or(0);
            if !f.active && weekly_hours == 0 {
                continue;
            }
            if weekly_hours > f.max_hours_per_week {
                return Err(ScheduleError::ConstraintViolation {
                    faculty_id: f.id.clone(),
                    message: format!(
                        "{} teaches {weekly_hours} hours per week, limit {}",
                        f.name, f.max_hours_per_week
                    ),
                });
            }
            let mut peak_daily_hours = 0;
            for ((id, day), &hours) in &daily {
                if *id != f.id {
                    continue;
                }
                if hours > f.max_hours_per_day {
                    return Err(ScheduleError::ConstraintViolation {
                        faculty_id: f.id.clone(),
                        message: format!(
                            "{} teaches {hours} hours on {day}, limit {}",
                            f.name, f.max_hours_per_day
                        ),
                    });
                }
                peak_daily_hours = peak_daily_hours.max(hours);
            }
            faculty.push(FacultyWorkload {
                faculty_id: f.id.clone(),
                name: f.name.clone(),
                department: f.department.clone(),
                sessions: counts.get(f.id.as_str()).copied().unwrap_or(0),
                weekly_hours,
                max_hours_per_week: f.max_hours_per_week,
                peak_daily_hours,
                max_hours_per_day: f.max_hours_per_day,
                load_percent: weekly_hours as f64 / f.max_hours_per_week as f64 * 100.0,
            });
        }

        let mut by_department: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        for w in &faculty {
            if catalog.get_faculty(&w.faculty_id).is_some_and(|f| f.active) {
                by_department
                    .entry(w.department.as_str())
                    .or_default()
                    .push(w.sessions);
            }
        }
        let departments = by_department
            .into_iter()
            .map(|(department, counts)| {
                let n = counts.len() as f64;
                let mean = counts.iter().sum::<usize>() as f64 / n;
                let variance = counts
                    .iter()
                    .map(|&c| (c as f64 - mean).powi(2))
                    .sum::<f64>()
                    / n;
                DepartmentFairness {
                    department: department.to_string(),
                    faculty: counts.len(),
                    mean_sessions: mean,
                    variance,
                }
            })
            .collect();

        Ok(Self {
            faculty,
            departments,
            reassigned: 0,
        })
    }

    pub fn for_faculty(&self, faculty_id: &str) -> Option<&FacultyWorkload> {
        self.faculty.iter().find(|w| w.faculty_id == faculty_id)
    }

    /// Highest minus lowest load % among the summarized faculty.
    pub fn load_spread(&self) -> f64 {
        let loads = self.faculty.iter().map(|w| w.load_percent);
        let max = loads.clone().fold(f64::MIN, f64::max);
        let min = loads.fold(f64::MAX, f64::min);
        if self.faculty.is_empty() {
            0.0
        } else {
            max - min
        }
    }
}

struct Placed<'a> {
    subject: &'a Subject,
    section: &'a Section,
    room: &'a Room,
    faculty: &'a Faculty,
    slots: Vec<usize>,
}

/// Redistributes sessions between eligible faculty.
#[derive(Debug, Clone)]
pub struct WorkloadBalancer<'a> {
    catalog: &'a Catalog,
    engine: &'a ConstraintEngine,
    config: &'a SchedulerConfig,
}

impl<'a> WorkloadBalancer<'a> {
    pub fn new(catalog: &'a Catalog, engine: &'a ConstraintEngine, config: &'a SchedulerConfig) -> Self {
        Self {
            catalog,
            engine,
            config,
        }
    }

    /// Moves sessions off the most loaded faculty while that lowers the
    /// spread. Only sessions of `section_id` are moved when given.
    ///
    /// Returns the number of sessions reassigned. Does nothing when
    /// `rebalance` is off.
    pub fn rebalance(&self, state: &mut RunState, section_id: Option<&str>) -> Result<usize, ScheduleError> {
        if !self.config.rebalance {
            return Ok(0);
        }
        let limit = state.len();
        let mut moved = 0;
        while moved < limit {
            let mut order: Vec<(i32, String)> = state
                .sessions()
                .iter()
                .filter(|s| section_id.map_or(true, |id| id == s.section_id))
                .map(|s| (state.load().weekly(&s.faculty_id), s.id.clone()))
                .collect();
            // heaviest faculty first
            order.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));

            let mut improved = false;
            for (_, session_id) in order {
                if self.try_move(state, &session_id)? {
                    moved += 1;
                    improved = true;
                    break;
                }
            }
            if !improved {
                break;
            }
        }
        if moved > 0 {
            info!(reassigned = moved, "workload rebalanced");
        }
        Ok(moved)
    }

    /// Re-assesses every session of a section against the final state and
    /// rewrites its soft-conflict fields. Returns the violations found.
    pub fn refresh_violations(
        &self,
        state: &mut RunState,
        section_id: &str,
    ) -> Result<Vec<Violation>, ScheduleError> {
        let ids: Vec<String> = state
            .sessions_for_section(section_id)
            .iter()
            .map(|s| s.id.clone())
            .collect();
        let mut violations = Vec::new();
        for id in ids {
            let Some(mut session) = state.unplace(&id) else {
                continue;
            };
            if let Some(placed) = self.resolve(&session) {
                let view = state.view(self.catalog.grid(), &self.config.working_days);
                let candidate = Candidate {
                    subject: placed.subject,
                    faculty: placed.faculty,
                    room: placed.room,
                    section: placed.section,
                    session_type: session.session_type,
                    day: session.day,
                    slots: &placed.slots,
                };
                let found = self.engine.assess(&candidate, &view, self.config).violations;
                session.has_conflict = !found.is_empty();
                session.conflict_reason = session.has_conflict.then(|| {
                    found
                        .iter()
                        .map(|v| v.message.as_str())
                        .collect::<Vec<_>>()
                        .join("; ")
                });
                violations.extend(found);
            }
            state.place(session)?;
        }
        Ok(violations)
    }

    /// Catalog entities and grid indices behind a placed session.
    fn resolve(&self, session: &ScheduleSession) -> Option<Placed<'a>> {
        let catalog = self.catalog;
        let grid = catalog.grid();
        Some(Placed {
            subject: catalog.get_subject(&session.subject_id)?,
            section: catalog.get_section(&session.section_id)?,
            room: catalog.get_room(&session.room_id)?,
            faculty: catalog.get_faculty(&session.faculty_id)?,
            slots: session
                .slot_ids
                .iter()
                .map(|id| grid.index_of(id))
                .collect::<Option<Vec<usize>>>()?,
        })
    }

    fn try_move(&self, state: &mut RunState, session_id: &str) -> Result<bool, ScheduleError> {
        let catalog = self.catalog;
        let grid = catalog.grid();
        let Some(original) = state.unplace(session_id) else {
            return Ok(false);
        };
        let Some(Placed {
            subject,
            section,
            room,
            faculty: current,
            slots,
        }) = self.resolve(&original)
        else {
            state.place(original)?;
            return Ok(false);
        };

        let hours = original.hours();
        let from_load = state.load().weekly(&current.id) + hours;
        let (session_type, day) = (original.session_type, original.day);
        let slots: &[usize] = &slots;
        let chosen = {
            let view = state.view(grid, &self.config.working_days);
            let candidate = move |faculty: &'a Faculty| Candidate {
                subject,
                faculty,
                room,
                section,
                session_type,
                day,
                slots,
            };
            let before = self.engine.assess(&candidate(current), &view, self.config);

            let mut best: Option<(i32, &Faculty, Vec<String>)> = None;
            for g in catalog.eligible_faculty(subject) {
                if g.id == current.id {
                    continue;
                }
                let to_load = state.load().weekly(&g.id);
                if to_load + hours >= from_load {
                    continue;
                }
                if !state
                    .load()
                    .fits(g, day, hours, g.max_hours_per_day, g.max_hours_per_week)
                {
                    continue;
                }
                if !state.index().is_span_free(
                    day,
                    &original.slot_ids,
                    &g.id,
                    &room.id,
                    &section.id,
                ) {
                    continue;
                }
                let after = self.engine.assess(&candidate(g), &view, self.config);
                if !after.admissible || after.penalty > before.penalty {
                    continue;
                }
                // ties keep the lower id
                if best.as_ref().map_or(true, |(load, ..)| to_load < *load) {
                    let reasons = after.violations.into_iter().map(|v| v.message).collect();
                    best = Some((to_load, g, reasons));
                }
            }
            best
        };

        match chosen {
            Some((_, g, reasons)) => {
                debug!(
                    session = %original.id,
                    from = %original.faculty_id,
                    to = %g.id,
                    "session reassigned"
                );
                let mut moved = original;
                moved.faculty_id = g.id.clone();
                moved.has_conflict = !reasons.is_empty();
                moved.conflict_reason = moved.has_conflict.then(|| reasons.join("; "));
                state.place(moved)?;
                Ok(true)
            }
            None => {
                state.place(original)?;
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Day, Room, RoomType, Section, SessionType, Subject};

    fn lecture(id: &str, faculty: &str, day: Day, slot: &str) -> ScheduleSession {
        ScheduleSession {
            id: id.into(),
            subject_id: "S1".into(),
            subject_code: "CS301".into(),
            faculty_id: faculty.into(),
            room_id: "LH-101".into(),
            section_id: "SEC1".into(),
            day,
            time_slot_id: slot.into(),
            slot_ids: vec![slot.into()],
            session_type: SessionType::Lecture,
            duration: 1,
            has_conflict: false,
            conflict_reason: None,
        }
    }

    fn catalog() -> Catalog {
        let mut c = Catalog::new();
        c.upsert_faculty(Faculty::new("F1", "Dr. Mitchell", "CSE").with_max_hours(6, 20))
            .unwrap();
        c.upsert_faculty(Faculty::new("F2", "Dr. Park", "CSE").with_max_hours(6, 20))
            .unwrap();
        c.upsert_faculty(Faculty::new("F3", "Dr. Chen", "EEE")).unwrap();
        c.upsert_subject(
            Subject::new("S1", "CS301")
                .with_hours(4, 0, 0)
                .with_faculty("F1")
                .with_faculty("F2"),
        )
        .unwrap();
        c.upsert_room(Room::new("LH-101", RoomType::Lecture, 80)).unwrap();
        c.upsert_section(Section::new("SEC1", "CS-3A", 60).with_subject("S1"))
            .unwrap();
        c
    }

    fn heavy_state() -> RunState {
        RunState::from_sessions(vec![
            lecture("a", "F1", Day::Monday, "t1"),
            lecture("b", "F1", Day::Tuesday, "t1"),
            lecture("c", "F1", Day::Wednesday, "t1"),
            lecture("d", "F1", Day::Thursday, "t1"),
        ])
        .unwrap()
    }

    #[test]
    fn test_summary_metrics() {
        let c = catalog();
        let state = heavy_state();
        let summary = WorkloadSummary::calculate(&c, state.sessions()).unwrap();

        let f1 = summary.for_faculty("F1").unwrap();
        assert_eq!(f1.weekly_hours, 4);
        assert_eq!(f1.peak_daily_hours, 1);
        assert!((f1.load_percent - 20.0).abs() < 1e-10);
        assert!((summary.load_spread() - 20.0).abs() < 1e-10);

        let cse = summary
            .departments
            .iter()
            .find(|d| d.department == "CSE")
            .unwrap();
        assert_eq!(cse.faculty, 2);
        // counts 4 and 0
        assert!((cse.mean_sessions - 2.0).abs() < 1e-10);
        assert!((cse.variance - 4.0).abs() < 1e-10);
    }

    #[test]
    fn test_summary_rejects_overload() {
        let mut c = catalog();
        c.upsert_faculty(Faculty::new("F1", "Dr. Mitchell", "CSE").with_max_hours(6, 3))
            .unwrap();
        let err = WorkloadSummary::calculate(&c, heavy_state().sessions()).unwrap_err();
        match err {
            ScheduleError::ConstraintViolation { faculty_id, message } => {
                assert_eq!(faculty_id, "F1");
                assert!(message.contains("limit 3"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_rebalance_evens_out_load() {
        let c = catalog();
        let engine = ConstraintEngine::new();
        let config = SchedulerConfig::default();
        let mut state = heavy_state();

        let moved = WorkloadBalancer::new(&c, &engine, &config)
            .rebalance(&mut state, None)
            .unwrap();
        assert_eq!(moved, 2);
        assert_eq!(state.load().weekly("F1"), 2);
        assert_eq!(state.load().weekly("F2"), 2);
        // F3 isn't eligible
        assert_eq!(state.load().weekly("F3"), 0);
        assert!(Timetable::new(state.sessions().to_vec())
            .verify(c.list_faculty())
            .is_empty());
    }

    #[test]
    fn test_rebalance_respects_availability() {
        let c = catalog();
        let engine = ConstraintEngine::new();
        let config = SchedulerConfig::default();
        let mut state = heavy_state();
        // F2 is busy on Monday and Tuesday at t1
        for (i, day) in [Day::Monday, Day::Tuesday].into_iter().enumerate() {
            let mut s = lecture(&format!("x{i}"), "F2", day, "t1");
            s.room_id = "LH-102".into();
            s.section_id = "SEC2".into();
            state.place(s).unwrap();
        }

        let moved = WorkloadBalancer::new(&c, &engine, &config)
            .rebalance(&mut state, Some("SEC1"))
            .unwrap();
        assert_eq!(moved, 1);
        let owner = |id: &str| {
            state
                .sessions()
                .iter()
                .find(|s| s.id == id)
                .map(|s| s.faculty_id.clone())
                .unwrap()
        };
        assert_eq!(owner("a"), "F1");
        assert_eq!(owner("b"), "F1");
        assert_eq!(owner("c"), "F2");
        assert_eq!(state.load().weekly("F1"), 3);
        assert_eq!(state.load().weekly("F2"), 3);
    }

    #[test]
    fn test_refresh_violations_follows_moved_sessions() {
        use crate::constraints::rules::FacultyMaxHours;
        use crate::models::ConstraintPriority;

        let c = catalog();
        let weekly_cap = |cap| {
            ConstraintEngine::new().with_rule(
                "c3",
                ConstraintPriority::Preferred,
                FacultyMaxHours {
                    max_hours: None,
                    max_weekly_hours: Some(cap),
                },
            )
        };
        let config = SchedulerConfig::default();
        let mut state = RunState::from_sessions(
            heavy_state()
                .into_sessions()
                .into_iter()
                .map(|mut s| {
                    s.has_conflict = true;
                    s.conflict_reason = Some("Dr. Mitchell would teach 4 hours this week".into());
                    s
                })
                .collect(),
        )
        .unwrap();

        let engine = weekly_cap(2);
        let balancer = WorkloadBalancer::new(&c, &engine, &config);
        assert_eq!(balancer.rebalance(&mut state, None).unwrap(), 2);
        // the two sessions left with F1 still carry the placement-time reason
        assert_eq!(state.sessions().iter().filter(|s| s.has_conflict).count(), 2);

        let violations = balancer.refresh_violations(&mut state, "SEC1").unwrap();
        assert!(violations.is_empty());
        assert_eq!(state.len(), 4);
        assert!(state
            .sessions()
            .iter()
            .all(|s| !s.has_conflict && s.conflict_reason.is_none()));

        let engine = weekly_cap(1);
        let violations = WorkloadBalancer::new(&c, &engine, &config)
            .refresh_violations(&mut state, "SEC1")
            .unwrap();
        assert_eq!(violations.len(), 4);
        assert!(violations.iter().all(|v| v.constraint_id == "c3"));
        assert!(state.sessions().iter().all(|s| s
            .conflict_reason
            .as_deref()
            .is_some_and(|r| r.ends_with("limit 1"))));
        assert_eq!(state.load().weekly("F1"), 2);
    }

    #[test]
    fn test_rebalance_disabled() {
        let c = catalog();
        let engine = ConstraintEngine::new();
        let config = SchedulerConfig::default().with_rebalance(false);
        let mut state = heavy_state();
        let moved = WorkloadBalancer::new(&c, &engine, &config)
            .rebalance(&mut state, None)
            .unwrap();
        assert_eq!(moved, 0);
        assert_eq!(state.load().weekly("F1"), 4);
    }
}
