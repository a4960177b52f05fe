//! Catalog entities exposed through the generic CRUD handlers.

use serde::{de::DeserializeOwned, Serialize};

use crate::catalog::Catalog;
use crate::error::ScheduleError;
use crate::models::{Constraint, Faculty, Room, Section, Subject};
use crate::orchestrator::Orchestrator;

/// An entity family with list/get/upsert/remove in the catalog.
pub trait Resource: Clone + Serialize + DeserializeOwned + Send + 'static {
    /// Name used in not-found errors.
    const KIND: &'static str;

    fn id(&self) -> &str;
    fn set_id(&mut self, id: String);
    fn list(catalog: &Catalog) -> Vec<Self>;
    fn get(catalog: &Catalog, id: &str) -> Option<Self>;
    fn upsert(catalog: &mut Catalog, item: Self) -> Result<(), ScheduleError>;

    /// Deletes the entity along with any persisted sessions that reference it.
    fn remove(orchestrator: &Orchestrator, id: &str) -> Result<Self, ScheduleError>;
}

impl Resource for Faculty {
    const KIND: &'static str = "faculty";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn list(catalog: &Catalog) -> Vec<Self> {
        catalog.list_faculty().cloned().collect()
    }

    fn get(catalog: &Catalog, id: &str) -> Option<Self> {
        catalog.get_faculty(id).cloned()
    }

    fn upsert(catalog: &mut Catalog, item: Self) -> Result<(), ScheduleError> {
        catalog.upsert_faculty(item)
    }

    fn remove(orchestrator: &Orchestrator, id: &str) -> Result<Self, ScheduleError> {
        orchestrator.remove_faculty(id)
    }
}

impl Resource for Subject {
    const KIND: &'static str = "subject";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn list(catalog: &Catalog) -> Vec<Self> {
        catalog.list_subjects().cloned().collect()
    }

    fn get(catalog: &Catalog, id: &str) -> Option<Self> {
        catalog.get_subject(id).cloned()
    }

    fn upsert(catalog: &mut Catalog, item: Self) -> Result<(), ScheduleError> {
        catalog.upsert_subject(item)
    }

    fn remove(orchestrator: &Orchestrator, id: &str) -> Result<Self, ScheduleError> {
        orchestrator.remove_subject(id)
    }
}

impl Resource for Room {
    const KIND: &'static str = "room";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn list(catalog: &Catalog) -> Vec<Self> {
        catalog.list_rooms().cloned().collect()
    }

    fn get(catalog: &Catalog, id: &str) -> Option<Self> {
        catalog.get_room(id).cloned()
    }

    fn upsert(catalog: &mut Catalog, item: Self) -> Result<(), ScheduleError> {
        catalog.upsert_room(item)
    }

    fn remove(orchestrator: &Orchestrator, id: &str) -> Result<Self, ScheduleError> {
        orchestrator.remove_room(id)
    }
}

impl Resource for Section {
    const KIND: &'static str = "section";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn list(catalog: &Catalog) -> Vec<Self> {
        catalog.list_sections().cloned().collect()
    }

    fn get(catalog: &Catalog, id: &str) -> Option<Self> {
        catalog.get_section(id).cloned()
    }

    fn upsert(catalog: &mut Catalog, item: Self) -> Result<(), ScheduleError> {
        catalog.upsert_section(item)
    }

    fn remove(orchestrator: &Orchestrator, id: &str) -> Result<Self, ScheduleError> {
        orchestrator.remove_section(id)
    }
}

impl Resource for Constraint {
    const KIND: &'static str = "constraint";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn list(catalog: &Catalog) -> Vec<Self> {
        catalog.list_constraints().cloned().collect()
    }

    fn get(catalog: &Catalog, id: &str) -> Option<Self> {
        catalog.get_constraint(id).cloned()
    }

    fn upsert(catalog: &mut Catalog, item: Self) -> Result<(), ScheduleError> {
        catalog.upsert_constraint(item)
    }

    fn remove(orchestrator: &Orchestrator, id: &str) -> Result<Self, ScheduleError> {
        orchestrator.catalog_mut().remove_constraint(id)
    }
}
