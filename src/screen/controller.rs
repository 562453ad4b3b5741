use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use super::entity::{Entity, EntityForm};
use super::filter::passes_select_guard;
use super::source::TableSource;
use crate::error::{FailureKind, ScreenError, ServiceError};
use crate::models::SavedFilter;
use crate::query_log::{Field, OperationRecord, QueryLogStore};
use crate::session::{Role, Session};
use crate::toast::{Toast, Toaster};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
    Loaded,
    LoadError,
    AddPending,
    EditPending,
    DeletePending,
    FilterPending,
}

/// The create/edit form currently open on a screen
#[derive(Debug, Clone)]
pub enum Modal<E: Entity> {
    Add(E::Form),
    Edit { key: E::Key, form: E::Form },
}

impl<E: Entity> Modal<E> {
    pub fn form(&self) -> &E::Form {
        match self {
            Modal::Add(form) | Modal::Edit { form, .. } => form,
        }
    }
}

struct ScreenState<E: Entity> {
    rows: Vec<E>,
    phase: Phase,
    /// Phase a finished sub-flow returns to
    resting: Phase,
    error: Option<String>,
    modal: Option<Modal<E>>,
    pending_delete: Option<E::Key>,
}

/// Captured at request start; a response is applied only while it is still current
#[derive(Debug, Clone, Copy)]
struct Ticket {
    epoch: u64,
    fetch: Option<u64>,
}

/// One screen's row collection and the CRUD flows that change it.
///
/// Every data operation appends a record to the screen's query log before
/// the collaborator call is issued, and fills in the measured duration once
/// the call settles.
pub struct ScreenController<E: Entity, S: TableSource<E>> {
    source: S,
    session: Session,
    log: QueryLogStore,
    toaster: Arc<dyn Toaster>,
    state: Mutex<ScreenState<E>>,
    epoch: AtomicU64,
    fetch_seq: AtomicU64,
}

impl<E: Entity, S: TableSource<E>> ScreenController<E, S> {
    pub fn new(source: S, session: Session, log: QueryLogStore, toaster: Arc<dyn Toaster>) -> Self {
        ScreenController {
            source,
            session,
            log,
            toaster,
            state: Mutex::new(ScreenState {
                rows: Vec::new(),
                phase: Phase::Idle,
                resting: Phase::Idle,
                error: None,
                modal: None,
                pending_delete: None,
            }),
            epoch: AtomicU64::new(0),
            fetch_seq: AtomicU64::new(0),
        }
    }

    fn state(&self) -> MutexGuard<'_, ScreenState<E>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ==================== Snapshot ====================

    pub fn phase(&self) -> Phase {
        self.state().phase
    }

    pub fn rows(&self) -> Vec<E> {
        self.state().rows.clone()
    }

    pub fn error_message(&self) -> Option<String> {
        self.state().error.clone()
    }

    pub fn modal(&self) -> Option<Modal<E>> {
        self.state().modal.clone()
    }

    pub fn pending_delete(&self) -> Option<E::Key> {
        self.state().pending_delete.clone()
    }

    pub fn log(&self) -> &QueryLogStore {
        &self.log
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Rows matching `term` in any searchable column; blank matches everything
    pub fn search(&self, term: &str) -> Vec<E> {
        let needle = term.trim().to_lowercase();
        self.state()
            .rows
            .iter()
            .filter(|row| needle.is_empty() || row.matches(&needle))
            .cloned()
            .collect()
    }

    // ==================== Plumbing ====================

    fn ticket(&self, fetch: bool) -> Ticket {
        Ticket {
            epoch: self.epoch.load(Ordering::SeqCst),
            fetch: fetch.then(|| self.fetch_seq.fetch_add(1, Ordering::SeqCst) + 1),
        }
    }

    fn is_stale(&self, ticket: Ticket) -> bool {
        if self.epoch.load(Ordering::SeqCst) != ticket.epoch {
            log::debug!("Dropping {} response received after unmount", E::PLURAL);
            return true;
        }
        if let Some(seq) = ticket.fetch {
            if self.fetch_seq.load(Ordering::SeqCst) != seq {
                log::debug!("Dropping superseded {} fetch #{}", E::PLURAL, seq);
                return true;
            }
        }
        false
    }

    fn enter(&self, phase: Phase) {
        self.state().phase = phase;
    }

    fn settle(&self) {
        let mut state = self.state();
        state.phase = state.resting;
    }

    /// Log `record`, then issue the call and time it
    async fn logged<T, F, Fut>(
        &self,
        record: OperationRecord,
        source: String,
        call: F,
    ) -> Result<T, ServiceError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ServiceError>>,
    {
        let entry = self.log.append(record, source, None);
        let start = Instant::now();
        let result = call().await;
        entry.finish(start.elapsed());
        result
    }

    /// Surface a failure once: console first, then a destructive toast
    fn fail(&self, attempted: FailureKind, err: ScreenError) -> ScreenError {
        log::error!("{} ({}): {}", err.kind(attempted), E::PLURAL, err);
        self.toaster.show(Toast::error(err.user_message()));
        err
    }

    fn announce(&self, verb: &str) {
        self.toaster.show(Toast::success(
            format!("{} {}", E::LABEL, verb),
            format!("The {} has been {} successfully.", E::LABEL.to_lowercase(), verb),
        ));
    }

    // ==================== Fetch ====================

    pub async fn load(&self) -> Result<(), ScreenError> {
        let ticket = self.ticket(true);
        self.enter(Phase::Loading);

        let result = self
            .logged(
                OperationRecord::Select {
                    statement: E::SELECT_SQL,
                },
                format!("Fetch {}", E::PLURAL),
                || self.source.fetch_all(),
            )
            .await;

        if self.is_stale(ticket) {
            return Ok(());
        }

        match result {
            Ok(rows) => {
                let mut state = self.state();
                state.rows = rows;
                state.phase = Phase::Loaded;
                state.resting = Phase::Loaded;
                state.error = None;
                Ok(())
            }
            Err(e) => {
                let err = ScreenError::service(FailureKind::LoadFailed, e);
                {
                    let mut state = self.state();
                    state.phase = Phase::LoadError;
                    state.resting = Phase::LoadError;
                    state.error = Some(err.user_message());
                }
                Err(self.fail(FailureKind::LoadFailed, err))
            }
        }
    }

    /// Replace the row collection with a filter's result
    fn apply_filtered(
        &self,
        ticket: Ticket,
        result: Result<Vec<E>, ServiceError>,
    ) -> Result<(), ScreenError> {
        if self.is_stale(ticket) {
            return Ok(());
        }

        match result {
            Ok(rows) => {
                let mut state = self.state();
                state.rows = rows;
                state.phase = Phase::Loaded;
                state.resting = Phase::Loaded;
                state.error = None;
                Ok(())
            }
            Err(e) => {
                self.settle();
                Err(self.fail(
                    FailureKind::FilterFailed,
                    ScreenError::service(FailureKind::FilterFailed, e),
                ))
            }
        }
    }

    // ==================== Form modal ====================

    pub fn open_add(&self) {
        self.state().modal = Some(Modal::Add(E::Form::default()));
    }

    /// Open the edit form pre-filled from the row with `key`
    pub fn open_edit(&self, key: &E::Key) -> bool {
        let mut state = self.state();
        let Some(row) = state.rows.iter().find(|r| r.key() == *key) else {
            return false;
        };
        let form = row.to_form();
        state.modal = Some(Modal::Edit {
            key: key.clone(),
            form,
        });
        true
    }

    pub fn edit_form(&self, change: impl FnOnce(&mut E::Form)) -> bool {
        match self.state().modal.as_mut() {
            Some(Modal::Add(form)) | Some(Modal::Edit { form, .. }) => {
                change(form);
                true
            }
            None => false,
        }
    }

    pub fn close_modal(&self) {
        self.state().modal = None;
    }

    /// Submit the open form as an add or an edit
    pub async fn submit(&self) -> Result<(), ScreenError> {
        let modal = self.state().modal.clone();
        match modal {
            Some(Modal::Add(form)) => self.add(form).await,
            Some(Modal::Edit { key, form }) => self.edit(key, form).await,
            None => Ok(()),
        }
    }

    // ==================== Writes ====================

    pub async fn add(&self, form: E::Form) -> Result<(), ScreenError> {
        let mut fields = match form.to_fields() {
            Ok(fields) => fields,
            Err(e) => return Err(self.fail(FailureKind::AddFailed, e.into())),
        };
        E::stamp(&mut fields, &self.session);

        let ticket = self.ticket(false);
        self.enter(Phase::AddPending);

        let result = self
            .logged(
                OperationRecord::Insert {
                    table: E::TABLE,
                    fields: fields.clone(),
                },
                format!("Add {}", E::LABEL),
                || self.source.insert(&fields),
            )
            .await;

        if self.is_stale(ticket) {
            return Ok(());
        }

        match result {
            Ok(inserted) => {
                {
                    let mut state = self.state();
                    let existing = std::mem::take(&mut state.rows);
                    state.rows = inserted.into_iter().chain(existing).collect();
                    if matches!(state.modal, Some(Modal::Add(_))) {
                        state.modal = None;
                    }
                    state.phase = state.resting;
                }
                self.announce("added");
                Ok(())
            }
            Err(e) => {
                self.settle();
                Err(self.fail(
                    FailureKind::AddFailed,
                    ScreenError::service(FailureKind::AddFailed, e),
                ))
            }
        }
    }

    pub async fn edit(&self, key: E::Key, form: E::Form) -> Result<(), ScreenError> {
        let mut fields = match form.to_fields() {
            Ok(fields) => fields,
            Err(e) => return Err(self.fail(FailureKind::EditFailed, e.into())),
        };
        fields.retain(|f| f.column != E::KEY_COLUMN);

        let ticket = self.ticket(false);
        self.enter(Phase::EditPending);

        let result = self
            .logged(
                OperationRecord::Update {
                    table: E::TABLE,
                    fields: fields.clone(),
                    key: Field::new(E::KEY_COLUMN, key.clone()),
                },
                format!("Update {}", E::LABEL),
                || self.source.update(&key, &fields),
            )
            .await;

        if self.is_stale(ticket) {
            return Ok(());
        }

        match result {
            Ok(updated) => {
                {
                    let mut state = self.state();
                    if let Some(slot) = state.rows.iter_mut().find(|r| r.key() == key) {
                        *slot = updated;
                    }
                    if matches!(&state.modal, Some(Modal::Edit { key: open, .. }) if *open == key) {
                        state.modal = None;
                    }
                    state.phase = state.resting;
                }
                self.announce("updated");
                Ok(())
            }
            Err(e) => {
                self.settle();
                Err(self.fail(
                    FailureKind::EditFailed,
                    ScreenError::service(FailureKind::EditFailed, e),
                ))
            }
        }
    }

    /// Open the delete confirmation for the row with `key`
    pub fn request_delete(&self, key: E::Key) -> bool {
        let mut state = self.state();
        if !state.rows.iter().any(|r| r.key() == key) {
            return false;
        }
        state.pending_delete = Some(key);
        true
    }

    pub fn cancel_delete(&self) {
        self.state().pending_delete = None;
    }

    pub async fn confirm_delete(&self) -> Result<(), ScreenError> {
        let key = self.state().pending_delete.take();
        match key {
            Some(key) => self.delete(key).await,
            None => Ok(()),
        }
    }

    /// Delete without a confirmation step
    pub async fn delete(&self, key: E::Key) -> Result<(), ScreenError> {
        let ticket = self.ticket(false);
        self.enter(Phase::DeletePending);

        let result = self
            .logged(
                OperationRecord::Delete {
                    table: E::TABLE,
                    key: Field::new(E::KEY_COLUMN, key.clone()),
                },
                format!("Delete {}", E::LABEL),
                || self.source.delete(&key),
            )
            .await;

        if self.is_stale(ticket) {
            return Ok(());
        }

        match result {
            Ok(()) => {
                {
                    let mut state = self.state();
                    state.rows.retain(|r| r.key() != key);
                    state.phase = state.resting;
                }
                self.announce("deleted");
                Ok(())
            }
            Err(e) => {
                self.settle();
                Err(self.fail(
                    FailureKind::DeleteFailed,
                    ScreenError::service(FailureKind::DeleteFailed, e),
                ))
            }
        }
    }

    // ==================== Filters ====================

    fn reject(&self, reason: String) -> ScreenError {
        self.fail(FailureKind::FilterRejected, ScreenError::FilterRejected(reason))
    }

    /// Run one of the screen's named filter templates
    pub async fn apply_template(&self, name: &str, args: &[String]) -> Result<(), ScreenError> {
        let Some(template) = E::filters().iter().find(|t| t.name == name) else {
            return Err(self.reject(format!(
                "Unknown {} filter: {}",
                E::LABEL.to_lowercase(),
                name
            )));
        };
        if !self.session.allows(template.min_role) {
            return Err(self.reject(format!(
                "The {} filter requires the {} role",
                template.label, template.min_role
            )));
        }
        let conditions = match template.bind(args) {
            Ok(conditions) => conditions,
            Err(e) => return Err(self.reject(e.to_string())),
        };

        let ticket = self.ticket(true);
        self.enter(Phase::FilterPending);

        let result = self
            .logged(
                OperationRecord::Filter {
                    statement: E::SELECT_SQL,
                    template: template.name,
                    conditions: conditions.clone(),
                },
                format!("Filter {}", E::PLURAL),
                || self.source.fetch_filtered(&conditions),
            )
            .await;

        self.apply_filtered(ticket, result)
    }

    pub async fn apply_saved(&self, saved: &SavedFilter) -> Result<(), ScreenError> {
        if saved.screen != E::SCREEN {
            return Err(self.reject(format!(
                "Saved filter \"{}\" belongs to the {} screen",
                saved.name, saved.screen
            )));
        }
        self.apply_template(&saved.template, &saved.args).await
    }

    /// Free-text SQL filter. The text is logged before any check runs.
    pub async fn apply_sql_filter(&self, text: &str) -> Result<(), ScreenError> {
        let entry = self
            .log
            .append(OperationRecord::RawSql(text.to_string()), "Custom Filter", None);

        let rejection = if !E::SQL_FILTER {
            Some(format!(
                "Custom SQL filters are not available for {}",
                E::PLURAL.to_lowercase()
            ))
        } else if !passes_select_guard(text) {
            Some("Only SELECT queries are allowed".to_string())
        } else if !self.session.allows(Role::Admin) {
            Some("Custom SQL filters require the admin role".to_string())
        } else {
            None
        };
        if let Some(reason) = rejection {
            return Err(self.reject(reason));
        }

        let ticket = self.ticket(true);
        self.enter(Phase::FilterPending);

        let start = Instant::now();
        let result = self.source.query_readonly(text.trim()).await;
        entry.finish(start.elapsed());

        self.apply_filtered(ticket, result)
    }

    // ==================== Lifecycle ====================

    /// Leave the screen; responses still in flight are dropped when they arrive
    pub fn unmount(&self) {
        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        log::debug!("{} screen unmounted (epoch {})", E::PLURAL, epoch);
    }
}
