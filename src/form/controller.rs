use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use futures::future::{AbortHandle, Abortable, BoxFuture, FutureExt};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::errors::FieldErrors;
use super::model::{ApplyError, FieldKey, FieldLens, FieldValue, FormModel, InputKind};

static FORM_ID_ALLOCATOR: AtomicU64 = AtomicU64::new(1);

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct FormId(pub u64);

impl FormId {
    pub fn next() -> Self {
        Self(FORM_ID_ALLOCATOR.fetch_add(1, Ordering::SeqCst))
    }
}

impl Display for FormId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "form-{}", self.0)
    }
}

/// What a blur does when the validator reports no error for the blurred field.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BlurValidation {
    /// The field's error always mirrors the validator output, so a passing
    /// check clears a stale message.
    Mirror,
    /// Only failing checks are written; an existing message survives a
    /// passing check.
    FailuresOnly,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReentrantSubmit {
    /// A submit while another one is in flight fails with `AlreadySubmitting`.
    Reject,
    Allow,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FormOptions {
    pub blur_validation: BlurValidation,
    pub reentrant_submit: ReentrantSubmit,
    pub touch_all_on_submit: bool,
}

impl Default for FormOptions {
    fn default() -> Self {
        Self {
            blur_validation: BlurValidation::Mirror,
            reentrant_submit: ReentrantSubmit::Reject,
            touch_all_on_submit: true,
        }
    }
}

/// Derived per-field view of the controller state.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FieldStatus {
    Pristine,
    DirtyNoError,
    DirtyError,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SubmitOutcome {
    /// Validation failed; the submit callback was not called.
    Invalid,
    /// The submit callback completed successfully.
    Submitted,
    /// The form was unmounted before or while the submit callback ran.
    Cancelled,
}

#[derive(Clone, Debug)]
pub struct FormSnapshot<T> {
    pub values: T,
    pub errors: FieldErrors,
    pub touched: BTreeSet<FieldKey>,
    pub submitting: bool,
    pub submit_count: u32,
    pub is_dirty: bool,
    pub is_valid: bool,
}

impl<T> FormSnapshot<T> {
    pub fn is_touched(&self, key: impl AsRef<str>) -> bool {
        let key = key.as_ref();
        self.touched.iter().any(|touched| touched.as_str() == key)
    }
}

/// Failure reported by a submit callback. The controller does not interpret
/// it; it is handed back to the caller of `handle_submit`.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct SubmitError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl SubmitError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[derive(Debug, Error)]
pub enum FormError {
    #[error("form state lock poisoned while {0}")]
    StatePoisoned(&'static str),
    #[error("unknown form field `{0}`")]
    UnknownField(String),
    #[error("field `{field}` expects a {expected} value")]
    TypeMismatch {
        field: String,
        expected: super::model::FieldKind,
    },
    #[error("form submit is already in progress")]
    AlreadySubmitting,
    #[error("form has no submit handler")]
    MissingSubmitHandler,
    #[error("form submit failed: {0}")]
    Submit(#[from] SubmitError),
}

impl FormError {
    fn from_apply(field: &str, error: ApplyError) -> Self {
        match error {
            ApplyError::UnknownField => FormError::UnknownField(field.to_string()),
            ApplyError::TypeMismatch { expected } => FormError::TypeMismatch {
                field: field.to_string(),
                expected,
            },
        }
    }
}

pub type FormResult<T> = Result<T, FormError>;

pub(super) type ValidateFn<T> = Arc<dyn Fn(&T) -> FieldErrors + Send + Sync>;
pub(super) type SubmitFn<T> = Arc<
    dyn Fn(T, ErrorsSetter<T>) -> BoxFuture<'static, Result<(), SubmitError>> + Send + Sync,
>;

/// A raw input event as delivered by the rendering layer.
#[derive(Clone, Copy, Debug)]
pub struct ChangeEvent<'a> {
    pub name: &'a str,
    pub value: &'a str,
    pub kind: InputKind,
    pub checked: bool,
}

impl<'a> ChangeEvent<'a> {
    pub fn text(name: &'a str, value: &'a str) -> Self {
        Self::input(name, value, InputKind::Text)
    }

    pub fn input(name: &'a str, value: &'a str, kind: InputKind) -> Self {
        Self {
            name,
            value,
            kind,
            checked: false,
        }
    }

    pub fn checkbox(name: &'a str, checked: bool) -> Self {
        Self {
            name,
            value: "",
            kind: InputKind::Checkbox,
            checked,
        }
    }
}

pub(super) struct FormState<T> {
    pub(super) id: FormId,
    pub(super) initial: T,
    pub(super) values: T,
    pub(super) errors: FieldErrors,
    pub(super) touched: BTreeSet<FieldKey>,
    pub(super) dirty: BTreeSet<FieldKey>,
    pub(super) submitting: bool,
    pub(super) submit_reserved: bool,
    pub(super) submit_count: u32,
    pub(super) mounted: bool,
    pub(super) next_submit: u64,
    pub(super) pending: Vec<(u64, AbortHandle)>,
}

/// Owns the state of one mounted form and mediates change, blur and submit
/// events between the rendering layer, the validator and the submit callback.
///
/// Clones share the same state.
pub struct FormController<T>
where
    T: FormModel,
{
    pub(super) options: FormOptions,
    pub(super) state: Arc<RwLock<FormState<T>>>,
    pub(super) validator: Option<ValidateFn<T>>,
    pub(super) on_submit: SubmitFn<T>,
}

impl<T> Clone for FormController<T>
where
    T: FormModel,
{
    fn clone(&self) -> Self {
        Self {
            options: self.options,
            state: self.state.clone(),
            validator: self.validator.clone(),
            on_submit: self.on_submit.clone(),
        }
    }
}

pub struct FormBuilder<T>
where
    T: FormModel,
{
    initial: T,
    options: FormOptions,
    validator: Option<ValidateFn<T>>,
    on_submit: Option<SubmitFn<T>>,
}

impl<T> FormBuilder<T>
where
    T: FormModel,
{
    pub fn options(mut self, options: FormOptions) -> Self {
        self.options = options;
        self
    }

    /// The validator must be pure and total: it is called synchronously with
    /// the full current values and must not panic.
    pub fn validator(
        mut self,
        validate: impl Fn(&T) -> FieldErrors + Send + Sync + 'static,
    ) -> Self {
        self.validator = Some(Arc::new(validate));
        self
    }

    pub fn on_submit<F, Fut>(mut self, submit: F) -> Self
    where
        F: Fn(T, ErrorsSetter<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), SubmitError>> + Send + 'static,
    {
        self.on_submit = Some(Arc::new(move |values, setter| {
            submit(values, setter).boxed()
        }));
        self
    }

    pub fn build(self) -> FormResult<FormController<T>> {
        let on_submit = self.on_submit.ok_or(FormError::MissingSubmitHandler)?;
        Ok(FormController {
            options: self.options,
            state: Arc::new(RwLock::new(FormState {
                id: FormId::next(),
                initial: self.initial.clone(),
                values: self.initial,
                errors: FieldErrors::new(),
                touched: BTreeSet::new(),
                dirty: BTreeSet::new(),
                submitting: false,
                submit_reserved: false,
                submit_count: 0,
                mounted: true,
                next_submit: 0,
                pending: Vec::new(),
            })),
            validator: self.validator,
            on_submit,
        })
    }
}

impl<T> FormController<T>
where
    T: FormModel,
{
    pub fn builder(initial: T) -> FormBuilder<T> {
        FormBuilder {
            initial,
            options: FormOptions::default(),
            validator: None,
            on_submit: None,
        }
    }

    pub fn form_id(&self) -> FormResult<FormId> {
        Ok(read_lock(&self.state, "reading form id")?.id)
    }

    pub fn options(&self) -> FormOptions {
        self.options
    }

    /// Stores the value carried by `event` and clears any error on that field
    /// without re-running validation.
    pub fn handle_change(&self, event: ChangeEvent<'_>) -> FormResult<()> {
        let value = event.kind.coerce(event.value, event.checked);
        let mut state = write_lock(&self.state, "applying field change")?;
        let key = resolve_key(&state.values, event.name)?;
        state
            .values
            .apply(key.as_str(), value)
            .map_err(|error| FormError::from_apply(event.name, error))?;
        mark_changed(&mut state, key);
        debug!(form = %state.id, field = %key, "field changed");
        Ok(())
    }

    /// Typed counterpart of `handle_change`.
    pub fn set<L>(&self, lens: L, value: L::Value) -> FormResult<()>
    where
        L: FieldLens<T>,
    {
        let key = lens.key();
        let mut state = write_lock(&self.state, "writing form model")?;
        lens.set(&mut state.values, value);
        mark_changed(&mut state, key);
        debug!(form = %state.id, field = %key, "field set");
        Ok(())
    }

    pub fn handle_blur(&self, field: &str) -> FormResult<()> {
        let (key, values) = {
            let mut state = write_lock(&self.state, "touching field")?;
            let key = resolve_key(&state.values, field)?;
            state.touched.insert(key);
            (key, state.values.clone())
        };

        let Some(validate) = &self.validator else {
            return Ok(());
        };
        let message = validate(&values).get(key).map(str::to_string);

        let mut state = write_lock(&self.state, "writing blur validation result")?;
        match (message, self.options.blur_validation) {
            (Some(message), _) => {
                debug!(form = %state.id, field = %key, %message, "blur validation failed");
                state.errors.set(key, message);
            }
            (None, BlurValidation::Mirror) => {
                state.errors.remove(key);
            }
            (None, BlurValidation::FailuresOnly) => {}
        }
        Ok(())
    }

    /// Validates the whole form and, when it is valid, runs the submit
    /// callback. `submitting` is restored once the callback settles, even if
    /// it fails, panics or the returned future is dropped.
    pub async fn handle_submit(&self) -> FormResult<SubmitOutcome> {
        let (values, reservation) = {
            let mut state = write_lock(&self.state, "preparing submit")?;
            if !state.mounted {
                warn!(form = %state.id, "submit requested after unmount");
                return Ok(SubmitOutcome::Cancelled);
            }
            // Under `Reject` the slot is claimed before the validator runs.
            let reservation = match self.options.reentrant_submit {
                ReentrantSubmit::Reject => {
                    if state.submitting || state.submit_reserved {
                        return Err(FormError::AlreadySubmitting);
                    }
                    state.submit_reserved = true;
                    Some(SubmitReservation {
                        state: self.state.clone(),
                    })
                }
                ReentrantSubmit::Allow => None,
            };
            state.submit_count = state.submit_count.saturating_add(1);
            (state.values.clone(), reservation)
        };

        if let Some(validate) = &self.validator {
            let errors = validate(&values);
            let mut state = write_lock(&self.state, "applying submit validation result")?;
            if self.options.touch_all_on_submit {
                state.touched = state.values.field_keys().into_iter().collect();
            }
            let keys = state.values.field_keys();
            let mut accepted = FieldErrors::new();
            for (key, message) in errors.iter() {
                if keys.contains(&key) {
                    accepted.push(key, message);
                } else {
                    warn!(
                        form = %state.id,
                        field = %key,
                        "validator reported an unknown field"
                    );
                }
            }
            state.errors = accepted;
            if state.errors.has_errors() {
                debug!(
                    form = %state.id,
                    errors = state.errors.len(),
                    "submit blocked by validation"
                );
                return Ok(SubmitOutcome::Invalid);
            }
        }

        let (abort_handle, registration) = AbortHandle::new_pair();
        let guard = {
            let mut state = write_lock(&self.state, "moving submit state to submitting")?;
            if !state.mounted {
                warn!(form = %state.id, "form unmounted during submit validation");
                return Ok(SubmitOutcome::Cancelled);
            }
            state.submitting = true;
            state.submit_reserved = false;
            state.next_submit = state.next_submit.wrapping_add(1);
            let submit_id = state.next_submit;
            state.pending.push((submit_id, abort_handle));
            debug!(form = %state.id, submit = submit_id, "submit started");
            SubmitGuard {
                state: self.state.clone(),
                submit_id,
            }
        };

        drop(reservation);
        let setter = self.errors_setter();
        let result = Abortable::new((self.on_submit)(values, setter), registration).await;
        drop(guard);

        let form = self.form_id()?;
        match result {
            Err(_aborted) => {
                warn!(%form, "submit cancelled by unmount");
                Ok(SubmitOutcome::Cancelled)
            }
            Ok(Ok(())) => {
                info!(%form, "submit completed");
                Ok(SubmitOutcome::Submitted)
            }
            Ok(Err(error)) => {
                warn!(%form, %error, "submit failed");
                Err(FormError::Submit(error))
            }
        }
    }

    pub fn reset(&self) -> FormResult<()> {
        let mut state = write_lock(&self.state, "resetting form")?;
        state.values = state.initial.clone();
        state.errors = FieldErrors::new();
        state.touched.clear();
        state.dirty.clear();
        state.submitting = false;
        state.submit_count = 0;
        debug!(form = %state.id, "form reset");
        Ok(())
    }

    /// Tears the form down: an in-flight submit is cancelled and any later
    /// write through its errors setter is ignored.
    pub fn unmount(&self) -> FormResult<()> {
        let mut state = write_lock(&self.state, "unmounting form")?;
        if !state.mounted {
            return Ok(());
        }
        state.mounted = false;
        state.submitting = false;
        for (_, handle) in state.pending.drain(..) {
            handle.abort();
        }
        debug!(form = %state.id, "form unmounted");
        Ok(())
    }

    /// Setter for errors raised outside the validator, such as a rejected
    /// attachment.
    pub fn errors_setter(&self) -> ErrorsSetter<T> {
        ErrorsSetter {
            state: self.state.clone(),
        }
    }

    pub fn is_mounted(&self) -> FormResult<bool> {
        Ok(read_lock(&self.state, "reading mount state")?.mounted)
    }

    pub fn is_submitting(&self) -> FormResult<bool> {
        Ok(read_lock(&self.state, "reading submitting flag")?.submitting)
    }

    pub fn snapshot(&self) -> FormResult<FormSnapshot<T>> {
        let state = read_lock(&self.state, "creating form snapshot")?;
        Ok(FormSnapshot {
            values: state.values.clone(),
            errors: state.errors.clone(),
            touched: state.touched.clone(),
            submitting: state.submitting,
            submit_count: state.submit_count,
            is_dirty: !state.dirty.is_empty(),
            is_valid: !state.errors.has_errors(),
        })
    }

    pub fn values(&self) -> FormResult<T> {
        Ok(read_lock(&self.state, "reading form values")?.values.clone())
    }

    pub fn value(&self, field: &str) -> FormResult<FieldValue> {
        let state = read_lock(&self.state, "reading field value")?;
        state
            .values
            .value(field)
            .ok_or_else(|| FormError::UnknownField(field.to_string()))
    }

    pub fn error(&self, field: &str) -> FormResult<Option<String>> {
        let state = read_lock(&self.state, "reading field error")?;
        resolve_key(&state.values, field)?;
        Ok(state.errors.get(field).map(str::to_string))
    }

    pub fn errors(&self) -> FormResult<FieldErrors> {
        Ok(read_lock(&self.state, "reading form errors")?.errors.clone())
    }

    pub fn is_touched(&self, field: &str) -> FormResult<bool> {
        let state = read_lock(&self.state, "reading touched flag")?;
        let key = resolve_key(&state.values, field)?;
        Ok(state.touched.contains(&key))
    }

    /// The error a renderer should show: nothing until the field has been
    /// touched or a submit has been attempted.
    pub fn error_for_display(&self, field: &str) -> FormResult<Option<String>> {
        let state = read_lock(&self.state, "reading display error message")?;
        let key = resolve_key(&state.values, field)?;
        if !state.touched.contains(&key) && state.submit_count == 0 {
            return Ok(None);
        }
        Ok(state.errors.get(key).map(str::to_string))
    }

    pub fn field_status(&self, field: &str) -> FormResult<FieldStatus> {
        let state = read_lock(&self.state, "reading field status")?;
        let key = resolve_key(&state.values, field)?;
        Ok(if state.errors.contains(key) {
            FieldStatus::DirtyError
        } else if state.dirty.contains(&key) {
            FieldStatus::DirtyNoError
        } else {
            FieldStatus::Pristine
        })
    }
}

/// Handed to the submit callback so it can report field errors, for example
/// from a rejected remote call.
pub struct ErrorsSetter<T> {
    state: Arc<RwLock<FormState<T>>>,
}

impl<T> Clone for ErrorsSetter<T> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

impl<T> ErrorsSetter<T>
where
    T: FormModel,
{
    /// Replaces every error at once.
    pub fn set_all(&self, errors: FieldErrors) -> FormResult<()> {
        let mut state = write_lock(&self.state, "replacing errors from submit")?;
        if !state.mounted {
            warn!(form = %state.id, "ignoring error write after unmount");
            return Ok(());
        }
        for key in errors.keys() {
            resolve_key(&state.values, key.as_str())?;
        }
        state.errors = errors;
        Ok(())
    }

    pub fn set_field(&self, field: &str, message: impl Into<String>) -> FormResult<()> {
        let message = message.into();
        let mut state = write_lock(&self.state, "setting field error from submit")?;
        if !state.mounted {
            warn!(form = %state.id, field, "ignoring error write after unmount");
            return Ok(());
        }
        let key = resolve_key(&state.values, field)?;
        if message.is_empty() {
            state.errors.remove(key);
        } else {
            state.errors.set(key, message);
        }
        Ok(())
    }

    pub fn clear(&self) -> FormResult<()> {
        self.set_all(FieldErrors::new())
    }
}

/// Held from the re-entrancy check until the submit either stops at
/// validation or has been registered as pending.
struct SubmitReservation<T> {
    state: Arc<RwLock<FormState<T>>>,
}

impl<T> Drop for SubmitReservation<T> {
    fn drop(&mut self) {
        let mut state = match self.state.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        state.submit_reserved = false;
    }
}

struct SubmitGuard<T> {
    state: Arc<RwLock<FormState<T>>>,
    submit_id: u64,
}

impl<T> Drop for SubmitGuard<T> {
    fn drop(&mut self) {
        let mut state = match self.state.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        state.pending.retain(|(id, _)| *id != self.submit_id);
        if state.mounted {
            state.submitting = !state.pending.is_empty();
        }
    }
}

fn mark_changed<T>(state: &mut FormState<T>, key: FieldKey) {
    state.dirty.insert(key);
    state.errors.remove(key);
}

fn resolve_key<T: FormModel>(values: &T, field: &str) -> FormResult<FieldKey> {
    values
        .resolve_key(field)
        .ok_or_else(|| FormError::UnknownField(field.to_string()))
}

pub(super) fn read_lock<'a, T>(
    lock: &'a RwLock<T>,
    context: &'static str,
) -> FormResult<RwLockReadGuard<'a, T>> {
    lock.read().map_err(|_| FormError::StatePoisoned(context))
}

pub(super) fn write_lock<'a, T>(
    lock: &'a RwLock<T>,
    context: &'static str,
) -> FormResult<RwLockWriteGuard<'a, T>> {
    lock.write().map_err(|_| FormError::StatePoisoned(context))
}
