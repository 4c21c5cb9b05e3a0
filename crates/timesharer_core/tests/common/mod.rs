#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use timesharer_core::{
    open_store, DatabaseSettings, DbError, Document, DocumentField, DocumentId,
    DocumentRepository, EntityDetails, RepoError, RepoResult, Store, WriteOutcome,
};

pub fn memory_store() -> Store {
    open_store(&DatabaseSettings::in_memory()).unwrap()
}

/// Adapter wrapper that counts every call reaching the store.
pub struct CountingRepository<R> {
    inner: R,
    calls: Cell<usize>,
    writes: Cell<usize>,
}

impl<R> CountingRepository<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            calls: Cell::new(0),
            writes: Cell::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    pub fn writes(&self) -> usize {
        self.writes.get()
    }

    fn read(&self) {
        self.calls.set(self.calls.get() + 1);
    }

    fn write(&self) {
        self.read();
        self.writes.set(self.writes.get() + 1);
    }
}

impl<D: EntityDetails, R: DocumentRepository<D>> DocumentRepository<D> for CountingRepository<R> {
    fn list(&self) -> RepoResult<Vec<Document<D>>> {
        self.read();
        self.inner.list()
    }

    fn find_by_id(&self, id: &DocumentId) -> RepoResult<Option<Document<D>>> {
        self.read();
        self.inner.find_by_id(id)
    }

    fn find_one_by(&self, field: DocumentField, value: &str) -> RepoResult<Option<Document<D>>> {
        self.read();
        self.inner.find_one_by(field, value)
    }

    fn insert(&self, details: &D) -> RepoResult<Document<D>> {
        self.write();
        self.inner.insert(details)
    }

    fn replace_details(&self, id: &DocumentId, details: &D) -> RepoResult<WriteOutcome> {
        self.write();
        self.inner.replace_details(id, details)
    }

    fn delete_by_id(&self, id: &DocumentId) -> RepoResult<usize> {
        self.write();
        self.inner.delete_by_id(id)
    }

    fn set_reference(
        &self,
        id: &DocumentId,
        field: DocumentField,
        value: Option<&DocumentId>,
    ) -> RepoResult<WriteOutcome> {
        self.write();
        self.inner.set_reference(id, field, value)
    }

    fn add_to_list(
        &self,
        id: &DocumentId,
        field: DocumentField,
        value: &DocumentId,
    ) -> RepoResult<WriteOutcome> {
        self.write();
        self.inner.add_to_list(id, field, value)
    }

    fn remove_from_list(
        &self,
        id: &DocumentId,
        field: DocumentField,
        value: &DocumentId,
    ) -> RepoResult<WriteOutcome> {
        self.write();
        self.inner.remove_from_list(id, field, value)
    }
}

/// How a `FaultyRepository` misbehaves on targeted and full writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Writes fail with a store error.
    StoreError,
    /// Writes are accepted but report zero modified documents.
    ZeroModified,
}

/// Adapter wrapper whose write paths fail; reads pass through.
pub struct FaultyRepository<R> {
    inner: R,
    fault: Fault,
    /// Remaining targeted writes allowed through before the fault kicks in.
    allowed_writes: Cell<usize>,
    pub attempted_writes: RefCell<Vec<&'static str>>,
}

impl<R> FaultyRepository<R> {
    pub fn new(inner: R, fault: Fault) -> Self {
        Self::after(inner, fault, 0)
    }

    pub fn after(inner: R, fault: Fault, allowed_writes: usize) -> Self {
        Self {
            inner,
            fault,
            allowed_writes: Cell::new(allowed_writes),
            attempted_writes: RefCell::new(Vec::new()),
        }
    }

    fn gate(&self, op: &'static str) -> Option<RepoResult<WriteOutcome>> {
        self.attempted_writes.borrow_mut().push(op);
        let remaining = self.allowed_writes.get();
        if remaining > 0 {
            self.allowed_writes.set(remaining - 1);
            return None;
        }
        Some(match self.fault {
            Fault::StoreError => Err(RepoError::Db(DbError::ConnectionPoisoned)),
            Fault::ZeroModified => Ok(WriteOutcome {
                modified: 0,
                updated_at: None,
            }),
        })
    }
}

impl<D: EntityDetails, R: DocumentRepository<D>> DocumentRepository<D> for FaultyRepository<R> {
    fn list(&self) -> RepoResult<Vec<Document<D>>> {
        self.inner.list()
    }

    fn find_by_id(&self, id: &DocumentId) -> RepoResult<Option<Document<D>>> {
        self.inner.find_by_id(id)
    }

    fn find_one_by(&self, field: DocumentField, value: &str) -> RepoResult<Option<Document<D>>> {
        self.inner.find_one_by(field, value)
    }

    fn insert(&self, details: &D) -> RepoResult<Document<D>> {
        self.inner.insert(details)
    }

    fn replace_details(&self, id: &DocumentId, details: &D) -> RepoResult<WriteOutcome> {
        match self.gate("replace_details") {
            Some(result) => result,
            None => self.inner.replace_details(id, details),
        }
    }

    fn delete_by_id(&self, id: &DocumentId) -> RepoResult<usize> {
        match self.gate("delete_by_id") {
            Some(result) => result.map(|outcome| outcome.modified),
            None => self.inner.delete_by_id(id),
        }
    }

    fn set_reference(
        &self,
        id: &DocumentId,
        field: DocumentField,
        value: Option<&DocumentId>,
    ) -> RepoResult<WriteOutcome> {
        match self.gate("set_reference") {
            Some(result) => result,
            None => self.inner.set_reference(id, field, value),
        }
    }

    fn add_to_list(
        &self,
        id: &DocumentId,
        field: DocumentField,
        value: &DocumentId,
    ) -> RepoResult<WriteOutcome> {
        match self.gate("add_to_list") {
            Some(result) => result,
            None => self.inner.add_to_list(id, field, value),
        }
    }

    fn remove_from_list(
        &self,
        id: &DocumentId,
        field: DocumentField,
        value: &DocumentId,
    ) -> RepoResult<WriteOutcome> {
        match self.gate("remove_from_list") {
            Some(result) => result,
            None => self.inner.remove_from_list(id, field, value),
        }
    }
}
