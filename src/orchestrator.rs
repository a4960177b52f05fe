//! Generation orchestrator.
//!
//! Owns the catalog, the persisted session set and the last run report.
//! A generation run works on a snapshot of the catalog and sessions and
//! commits only when it finishes without error, so callers never observe
//! a half-written timetable. At most one run is in flight per
//! orchestrator; a second request is rejected with
//! [`ScheduleError::RunInProgress`]. Removing a faculty member, subject,
//! room or section takes the same lock and drops the persisted sessions
//! that reference it.

use parking_lot::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
use serde::Serialize;
use tracing::{info, warn};

use crate::catalog::Catalog;
use crate::config::SchedulerConfig;
use crate::constraints::{ConstraintEngine, ConstraintRegistry};
use crate::error::ScheduleError;
use crate::models::{ConflictReport, Faculty, Room, ScheduleSession, Section, Subject, Timetable};
use crate::scheduler::{
    CancelToken, RunState, SectionResult, Solver, UnresolvedRequirement, WorkloadBalancer,
    WorkloadSummary,
};

/// What a run covered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "sectionId", rename_all = "camelCase")]
pub enum RunScope {
    Section(String),
    All,
}

/// Structured result of one generation run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationReport {
    pub scope: RunScope,
    pub sections: Vec<SectionResult>,
    pub workload: WorkloadSummary,
    pub cancelled: bool,
    /// Sessions persisted after the run, all sections.
    pub total_sessions: usize,
}

impl GenerationReport {
    pub fn unresolved(&self) -> impl Iterator<Item = &UnresolvedRequirement> {
        self.sections.iter().flat_map(|s| s.unresolved.iter())
    }

    /// Whether every section in scope was fully placed.
    pub fn is_complete(&self) -> bool {
        self.sections.iter().all(SectionResult::is_complete)
    }
}

/// Sessions committed by a run, with its report.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationOutcome {
    pub sessions: Vec<ScheduleSession>,
    pub report: GenerationReport,
}

/// Exclusive claim on the orchestrator for one run.
///
/// Dropping it clears the running flag and releases the run lock.
struct RunGuard<'a> {
    _lock: MutexGuard<'a, ()>,
    running: &'a Mutex<bool>,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        *self.running.lock() = false;
    }
}

#[derive(Debug, Default)]
struct Store {
    sessions: Vec<ScheduleSession>,
    last_report: Option<GenerationReport>,
}

/// Coordinates generation runs over a shared catalog.
pub struct Orchestrator {
    catalog: RwLock<Catalog>,
    config: RwLock<SchedulerConfig>,
    registry: ConstraintRegistry,
    store: RwLock<Store>,
    run_lock: Mutex<()>,
    /// Set while a run is between start and commit. Guards `cancel`.
    running: Mutex<bool>,
    cancel: CancelToken,
}

impl Orchestrator {
    /// Creates an orchestrator with the built-in constraint kinds.
    pub fn new(catalog: Catalog, config: SchedulerConfig) -> Result<Self, ScheduleError> {
        Ok(Self {
            catalog: RwLock::new(catalog),
            config: RwLock::new(config.checked()?),
            registry: ConstraintRegistry::builtin(),
            store: RwLock::new(Store::default()),
            run_lock: Mutex::new(()),
            running: Mutex::new(false),
            cancel: CancelToken::new(),
        })
    }

    /// Replaces the constraint registry.
    pub fn with_registry(mut self, registry: ConstraintRegistry) -> Self {
        self.registry = registry;
        self
    }

    // ---- catalog ----

    pub fn catalog(&self) -> RwLockReadGuard<'_, Catalog> {
        self.catalog.read()
    }

    /// Write access for CRUD. Runs already in flight keep their snapshot.
    pub fn catalog_mut(&self) -> RwLockWriteGuard<'_, Catalog> {
        self.catalog.write()
    }

    pub fn registry(&self) -> &ConstraintRegistry {
        &self.registry
    }

    pub fn config(&self) -> SchedulerConfig {
        self.config.read().clone()
    }

    pub fn set_config(&self, config: SchedulerConfig) -> Result<(), ScheduleError> {
        *self.config.write() = config.checked()?;
        Ok(())
    }

    /// Removes a faculty member and every persisted session they teach.
    ///
    /// # Errors
    /// - `RunInProgress` while a generation run is in flight
    /// - `NotFound` for an unknown id
    pub fn remove_faculty(&self, faculty_id: &str) -> Result<Faculty, ScheduleError> {
        self.remove_cascading(
            |catalog| catalog.remove_faculty(faculty_id),
            |s| s.faculty_id == faculty_id,
        )
    }

    /// Removes a subject and every persisted session of it.
    pub fn remove_subject(&self, subject_id: &str) -> Result<Subject, ScheduleError> {
        self.remove_cascading(
            |catalog| catalog.remove_subject(subject_id),
            |s| s.subject_id == subject_id,
        )
    }

    /// Removes a room and every persisted session held in it.
    pub fn remove_room(&self, room_id: &str) -> Result<Room, ScheduleError> {
        self.remove_cascading(
            |catalog| catalog.remove_room(room_id),
            |s| s.room_id == room_id,
        )
    }

    /// Removes a section together with its persisted sessions.
    pub fn remove_section(&self, section_id: &str) -> Result<Section, ScheduleError> {
        self.remove_cascading(
            |catalog| catalog.remove_section(section_id),
            |s| s.section_id == section_id,
        )
    }

    /// Removes an entity and the sessions referencing it as one step.
    ///
    /// Holds the run lock so a commit cannot reinstate dropped sessions.
    fn remove_cascading<T>(
        &self,
        remove: impl FnOnce(&mut Catalog) -> Result<T, ScheduleError>,
        references: impl Fn(&ScheduleSession) -> bool,
    ) -> Result<T, ScheduleError> {
        let _guard = self.run_lock.try_lock().ok_or(ScheduleError::RunInProgress)?;
        let removed = remove(&mut *self.catalog.write())?;
        let mut store = self.store.write();
        let before = store.sessions.len();
        store.sessions.retain(|s| !references(s));
        let dropped = before - store.sessions.len();
        if dropped > 0 {
            info!(dropped, "sessions referencing a removed entity dropped");
        }
        Ok(removed)
    }

    // ---- runs ----

    /// Regenerates one section, keeping every other section's sessions
    /// reserved. Draft sections may be generated explicitly.
    pub fn regenerate_section(&self, section_id: &str) -> Result<GenerationOutcome, ScheduleError> {
        let run = self.begin_run()?;
        self.run_section(&run, section_id)
    }

    /// Discards the whole timetable and regenerates every active section
    /// in id order.
    pub fn regenerate_all(&self) -> Result<GenerationOutcome, ScheduleError> {
        let run = self.begin_run()?;
        self.run_all(&run)
    }

    /// Claims the run lock and clears any stale cancellation.
    ///
    /// The cancel flag is reset under the same lock `cancel` takes, so a
    /// cancellation accepted for this run is never discarded.
    fn begin_run(&self) -> Result<RunGuard<'_>, ScheduleError> {
        let lock = self.run_lock.try_lock().ok_or(ScheduleError::RunInProgress)?;
        let mut running = self.running.lock();
        self.cancel.reset();
        *running = true;
        Ok(RunGuard {
            _lock: lock,
            running: &self.running,
        })
    }

    fn run_section(
        &self,
        _run: &RunGuard<'_>,
        section_id: &str,
    ) -> Result<GenerationOutcome, ScheduleError> {
        let scope = RunScope::Section(section_id.to_string());
        let (catalog, config) = self.snapshot()?;
        if catalog.get_section(section_id).is_none() {
            return Err(ScheduleError::not_found("section", section_id));
        }
        info!(section = section_id, "generation run started");

        let engine = self.compile(&catalog)?;
        let existing = self.store.read().sessions.clone();
        let mut state = RunState::from_sessions(existing)?;
        let result = Solver::new(&catalog, &engine, &config)
            .with_cancel(self.cancel.clone())
            .generate_for_section(section_id, &mut state)?;
        let balancer = WorkloadBalancer::new(&catalog, &engine, &config);
        let reassigned = balancer.rebalance(&mut state, Some(section_id))?;

        self.commit(&catalog, &balancer, scope, vec![result], state, reassigned)
    }

    fn run_all(&self, _run: &RunGuard<'_>) -> Result<GenerationOutcome, ScheduleError> {
        let (catalog, config) = self.snapshot()?;
        info!(sections = catalog.active_sections().count(), "generation run started");

        let engine = self.compile(&catalog)?;
        let mut state = RunState::new();
        let results = Solver::new(&catalog, &engine, &config)
            .with_cancel(self.cancel.clone())
            .generate_all(&mut state)?;
        let balancer = WorkloadBalancer::new(&catalog, &engine, &config);
        let reassigned = balancer.rebalance(&mut state, None)?;

        self.commit(&catalog, &balancer, RunScope::All, results, state, reassigned)
    }

    /// Validated copies of the catalog and config for one run.
    fn snapshot(&self) -> Result<(Catalog, SchedulerConfig), ScheduleError> {
        let catalog = self.catalog.read().clone();
        catalog.validate()?;
        Ok((catalog, self.config.read().clone()))
    }

    fn compile(&self, catalog: &Catalog) -> Result<ConstraintEngine, ScheduleError> {
        let constraints: Vec<_> = catalog.list_constraints().cloned().collect();
        Ok(ConstraintEngine::from_constraints(&constraints, &self.registry)?)
    }

    fn commit(
        &self,
        catalog: &Catalog,
        balancer: &WorkloadBalancer<'_>,
        scope: RunScope,
        mut sections: Vec<SectionResult>,
        mut state: RunState,
        reassigned: usize,
    ) -> Result<GenerationOutcome, ScheduleError> {
        let mut workload = WorkloadSummary::calculate(catalog, state.sessions())?;
        workload.reassigned = reassigned;

        // moved sessions carry new faculty and possibly new soft violations
        if reassigned > 0 {
            for section in &mut sections {
                section.soft_violations =
                    balancer.refresh_violations(&mut state, &section.section_id)?;
                let current = state.sessions_for_section(&section.section_id);
                for session in &mut section.sessions {
                    if let Some(moved) = current.iter().find(|s| s.id == session.id) {
                        *session = (*moved).clone();
                    }
                }
            }
        }

        let cancelled = sections.iter().any(|s| s.cancelled);
        if cancelled {
            warn!(?scope, "generation run cancelled, committing finished sections");
        }
        let sessions = state.into_sessions();
        let report = GenerationReport {
            scope,
            sections,
            workload,
            cancelled,
            total_sessions: sessions.len(),
        };
        info!(
            sessions = report.total_sessions,
            unresolved = report.unresolved().count(),
            reassigned,
            "generation run committed"
        );

        let mut store = self.store.write();
        store.sessions = sessions.clone();
        store.last_report = Some(report.clone());
        Ok(GenerationOutcome { sessions, report })
    }

    /// Asks the run in flight to stop at its next checkpoint.
    ///
    /// Returns false when no run is in flight.
    pub fn cancel(&self) -> bool {
        let running = self.running.lock();
        if !*running {
            return false;
        }
        self.cancel.cancel();
        true
    }

    pub fn cancel_handle(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn is_running(&self) -> bool {
        *self.running.lock()
    }

    // ---- persisted state ----

    pub fn all_sessions(&self) -> Vec<ScheduleSession> {
        self.store.read().sessions.clone()
    }

    pub fn sessions_for_section(&self, section_id: &str) -> Vec<ScheduleSession> {
        self.store
            .read()
            .sessions
            .iter()
            .filter(|s| s.section_id == section_id)
            .cloned()
            .collect()
    }

    pub fn last_report(&self) -> Option<GenerationReport> {
        self.store.read().last_report.clone()
    }

    /// Load metrics over the persisted sessions.
    pub fn workload(&self) -> Result<WorkloadSummary, ScheduleError> {
        let catalog = self.catalog.read();
        let store = self.store.read();
        WorkloadSummary::calculate(&catalog, &store.sessions)
    }

    /// Audit of the persisted sessions: double bookings, hour overruns and
    /// soft-rule warnings.
    pub fn conflicts(&self) -> Vec<ConflictReport> {
        let catalog = self.catalog.read();
        let timetable = Timetable::new(self.all_sessions());
        timetable.verify(catalog.list_faculty())
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("catalog", &self.catalog.read().counts())
            .field("sessions", &self.store.read().sessions.len())
            .field("running", &self.is_running())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RoomType, SectionStatus, Severity};
    use crate::scheduler::GenerationStatus;

    fn demo() -> Orchestrator {
        Orchestrator::new(Catalog::demo(), SchedulerConfig::default()).unwrap()
    }

    #[test]
    fn test_regenerate_all_commits() {
        let orch = demo();
        let outcome = orch.regenerate_all().unwrap();

        assert!(outcome.report.is_complete());
        assert_eq!(outcome.report.sections.len(), 4);
        assert_eq!(outcome.sessions.len(), orch.all_sessions().len());
        assert_eq!(outcome.report.total_sessions, outcome.sessions.len());
        assert!(orch.last_report().is_some());
        assert!(orch
            .conflicts()
            .iter()
            .all(|c| c.severity == Severity::Warning));

        let workload = orch.workload().unwrap();
        assert!(workload.faculty.iter().all(|w| w.load_percent <= 100.0));
        assert!(workload.for_faculty("f5").is_none());
    }

    #[test]
    fn test_regenerate_section_keeps_other_sections() {
        let orch = demo();
        orch.regenerate_all().unwrap();
        let others: Vec<_> = orch
            .all_sessions()
            .into_iter()
            .filter(|s| s.section_id != "sec2")
            .collect();

        let outcome = orch.regenerate_section("sec2").unwrap();
        assert_eq!(outcome.report.scope, RunScope::Section("sec2".into()));
        assert_eq!(outcome.report.sections.len(), 1);
        assert!(outcome.report.sections[0].is_complete());

        let after: Vec<_> = orch
            .all_sessions()
            .into_iter()
            .filter(|s| s.section_id != "sec2")
            .collect();
        assert_eq!(others, after);
        assert!(!orch.sessions_for_section("sec2").is_empty());
        assert!(orch
            .conflicts()
            .iter()
            .all(|c| c.severity == Severity::Warning));
    }

    #[test]
    fn test_run_in_progress_rejected() {
        let orch = demo();
        let run = orch.begin_run().unwrap();
        assert!(orch.is_running());
        assert!(matches!(
            orch.regenerate_all(),
            Err(ScheduleError::RunInProgress)
        ));
        assert!(matches!(
            orch.regenerate_section("sec1"),
            Err(ScheduleError::RunInProgress)
        ));
        assert!(orch.cancel());

        drop(run);
        assert!(!orch.is_running());
        assert!(!orch.cancel());
    }

    #[test]
    fn test_cancel_after_start_stops_run() {
        let orch = demo();
        let run = orch.begin_run().unwrap();
        assert!(orch.cancel());

        let outcome = orch.run_all(&run).unwrap();
        let report = &outcome.report;
        assert!(report.cancelled);
        assert_eq!(report.sections[0].status, GenerationStatus::Partial);
        assert!(report.sections[1..]
            .iter()
            .all(|s| s.status == GenerationStatus::Pending));
        assert!(outcome.sessions.is_empty());
        drop(run);

        // the next run starts with a clear flag
        let outcome = orch.regenerate_all().unwrap();
        assert!(!outcome.report.cancelled);
        assert!(outcome.report.is_complete());
    }

    #[test]
    fn test_uncancelled_run_reports_not_cancelled() {
        let orch = demo();
        // a stale flag from outside a run is cleared when the run starts
        orch.cancel_handle().cancel();
        let outcome = orch.regenerate_section("sec1").unwrap();
        assert!(!outcome.report.cancelled);
        assert!(outcome.report.sections.iter().all(|s| !s.cancelled));
    }

    #[test]
    fn test_cancel_when_idle() {
        let orch = demo();
        assert!(!orch.is_running());
        assert!(!orch.cancel());
        assert!(!orch.cancel_handle().is_cancelled());
    }

    #[test]
    fn test_unknown_section_not_found() {
        let orch = demo();
        assert!(matches!(
            orch.regenerate_section("sec9"),
            Err(ScheduleError::NotFound { .. })
        ));
        assert!(orch.all_sessions().is_empty());
    }

    #[test]
    fn test_invalid_catalog_is_not_committed() {
        let orch = demo();
        orch.regenerate_all().unwrap();
        let before = orch.all_sessions();

        // subject referencing an unknown faculty
        {
            let mut catalog = orch.catalog_mut();
            let mut subject = catalog.get_subject("s1").unwrap().clone();
            subject.eligible_faculty.push("ghost".into());
            catalog.upsert_subject(subject).unwrap();
        }
        assert!(matches!(
            orch.regenerate_all(),
            Err(ScheduleError::Validation(_))
        ));
        assert_eq!(orch.all_sessions(), before);
    }

    #[test]
    fn test_draft_sections_skipped_by_regenerate_all() {
        let orch = demo();
        {
            let mut catalog = orch.catalog_mut();
            let section = catalog
                .get_section("sec4")
                .unwrap()
                .clone()
                .with_status(SectionStatus::Draft);
            catalog.upsert_section(section).unwrap();
        }
        let outcome = orch.regenerate_all().unwrap();
        assert_eq!(outcome.report.sections.len(), 3);
        assert!(orch.sessions_for_section("sec4").is_empty());

        // but can be generated on request
        let outcome = orch.regenerate_section("sec4").unwrap();
        assert_eq!(outcome.report.sections[0].status, GenerationStatus::Complete);
    }

    #[test]
    fn test_remove_section_drops_sessions() {
        let orch = demo();
        orch.regenerate_all().unwrap();
        orch.remove_section("sec1").unwrap();
        assert!(orch.sessions_for_section("sec1").is_empty());
        assert!(matches!(
            orch.remove_section("sec1"),
            Err(ScheduleError::NotFound { .. })
        ));
    }

    #[test]
    fn test_remove_referenced_entities_drops_sessions() {
        let orch = demo();
        orch.regenerate_all().unwrap();
        assert!(orch.all_sessions().iter().any(|s| s.faculty_id == "f1"));

        orch.remove_faculty("f1").unwrap();
        assert!(orch.all_sessions().iter().all(|s| s.faculty_id != "f1"));

        let room = orch.all_sessions()[0].room_id.clone();
        orch.remove_room(&room).unwrap();
        assert!(orch.all_sessions().iter().all(|s| s.room_id != room));

        let subject = orch.all_sessions()[0].subject_id.clone();
        orch.remove_subject(&subject).unwrap();
        assert!(orch.all_sessions().iter().all(|s| s.subject_id != subject));

        let catalog = orch.catalog();
        assert!(orch.all_sessions().iter().all(|s| {
            catalog.get_faculty(&s.faculty_id).is_some()
                && catalog.get_room(&s.room_id).is_some()
                && catalog.get_subject(&s.subject_id).is_some()
        }));
        drop(catalog);
        assert!(orch.workload().unwrap().for_faculty("f1").is_none());
        assert!(orch
            .conflicts()
            .iter()
            .all(|c| c.severity == Severity::Warning));
    }

    #[test]
    fn test_removal_rejected_during_run() {
        let orch = demo();
        orch.regenerate_all().unwrap();
        let run = orch.begin_run().unwrap();
        assert!(matches!(
            orch.remove_section("sec1"),
            Err(ScheduleError::RunInProgress)
        ));
        assert!(matches!(
            orch.remove_faculty("f1"),
            Err(ScheduleError::RunInProgress)
        ));
        drop(run);

        assert!(orch.catalog().get_section("sec1").is_some());
        assert!(orch.catalog().get_faculty("f1").is_some());
        assert!(!orch.sessions_for_section("sec1").is_empty());
        orch.remove_section("sec1").unwrap();
        assert!(orch.sessions_for_section("sec1").is_empty());
    }

    #[test]
    fn test_session_ids_unique_across_hyphenated_sections() {
        let mut catalog = Catalog::new();
        catalog
            .upsert_faculty(Faculty::new("F1", "Dr. Mitchell", "CSE"))
            .unwrap();
        catalog
            .upsert_room(Room::new("LH-101", RoomType::Lecture, 120))
            .unwrap();
        catalog
            .upsert_subject(Subject::new("X-Y", "XY").with_hours(2, 0, 0).with_faculty("F1"))
            .unwrap();
        catalog
            .upsert_subject(Subject::new("Y", "Y").with_hours(2, 0, 0).with_faculty("F1"))
            .unwrap();
        catalog
            .upsert_section(Section::new("A", "A", 40).with_subject("X-Y"))
            .unwrap();
        catalog
            .upsert_section(Section::new("A-X", "A-X", 40).with_subject("Y"))
            .unwrap();
        let orch = Orchestrator::new(catalog, SchedulerConfig::default()).unwrap();

        let outcome = orch.regenerate_all().unwrap();
        assert!(outcome.report.is_complete());
        let ids: std::collections::BTreeSet<_> =
            outcome.sessions.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids.len(), 4);
        for section in &outcome.report.sections {
            assert_eq!(section.sessions.len(), 2);
            assert!(section
                .sessions
                .iter()
                .all(|s| s.section_id == section.section_id));
        }
    }
}
