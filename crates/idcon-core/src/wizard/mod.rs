// ── Wizards ──
//
// A wizard edits a working copy of one entity across steps and submits
// the whole object at the end. Whether the submit creates or updates is
// fixed when the wizard opens: an entity read from the server (with its
// key) is updated under the entity tag of that read; anything else is
// created.

mod form;
mod forms;

use std::collections::BTreeMap;
use std::future::Future;

use serde::Serialize;
use tracing::{debug, info};

use crate::error::CoreError;
use crate::model::{Entity, Versioned};
use crate::notification::describe;

pub use form::{Field, FieldKind, FieldValue, Form, Lookup, Step};
pub use forms::{ATTR_SCHEMA_TYPES, ENGINES};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Create,
    Edit,
    ReadOnly,
}

/// Remote operations a wizard needs for one entity kind.
pub trait EntityService<T: Entity>: Send + Sync {
    /// Fresh copy of `entity` with its entity tag.
    fn read(&self, entity: &T) -> impl Future<Output = Result<Versioned<T>, CoreError>> + Send;

    /// Create `entity`; returns it as stored.
    fn create(&self, entity: &T) -> impl Future<Output = Result<T, CoreError>> + Send;

    /// Replace `entity` if it still matches `etag`; returns it as stored.
    fn update(
        &self,
        entity: &T,
        etag: Option<&str>,
    ) -> impl Future<Output = Result<T, CoreError>> + Send;

    fn delete(
        &self,
        entity: &T,
        etag: Option<&str>,
    ) -> impl Future<Output = Result<(), CoreError>> + Send;
}

/// Result of [`Wizard::finish`].
#[derive(Debug, Clone, PartialEq)]
pub enum FinishOutcome<T> {
    /// Submitted; close the wizard and refresh the directory (to the last
    /// page after a create).
    Closed { entity: T, created: bool },
    /// Not submitted or rejected; the wizard stays open on its working copy.
    Open { error: String },
}

impl<T> FinishOutcome<T> {
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed { .. })
    }
}

#[derive(Debug, Clone)]
pub struct Wizard<T> {
    mode: Mode,
    /// Key of the server copy being edited; `None` in create mode.
    key: Option<String>,
    etag: Option<String>,
    working: T,
    step: usize,
    error: Option<String>,
    choices: BTreeMap<Lookup, Vec<String>>,
}

impl<T: Form> Wizard<T> {
    /// Edit `entity` when it has a key (a server copy read with `etag`),
    /// create it otherwise.
    pub fn open(entity: T, etag: Option<String>) -> Self {
        let key = entity.key().map(str::to_owned);
        let mode = if key.is_some() {
            Mode::Edit
        } else {
            Mode::Create
        };
        Self::with_mode(entity, mode, key, etag)
    }

    /// Create from `template`, whatever key it carries.
    pub fn create(template: T) -> Self {
        Self::with_mode(template, Mode::Create, None, None)
    }

    /// Show `entity` without allowing a submit.
    pub fn read_only(entity: T) -> Self {
        let key = entity.key().map(str::to_owned);
        Self::with_mode(entity, Mode::ReadOnly, key, None)
    }

    fn with_mode(working: T, mode: Mode, key: Option<String>, etag: Option<String>) -> Self {
        Self {
            mode,
            key,
            etag,
            working,
            step: 0,
            error: None,
            choices: BTreeMap::new(),
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn working(&self) -> &T {
        &self.working
    }

    pub fn etag(&self) -> Option<&str> {
        self.etag.as_deref()
    }

    /// Error of the last failed finish, shown in place.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn title(&self) -> String {
        let kind = T::KIND.singular();
        match self.mode {
            Mode::Create => format!("New {kind}"),
            Mode::Edit => format!("Edit {kind} {}", self.working.name()),
            Mode::ReadOnly => format!("View {kind} {}", self.working.name()),
        }
    }

    // ── Choices ──────────────────────────────────────────────────────

    /// Lookups the visible fields need, for the front end to fetch.
    pub fn lookups(&self) -> Vec<Lookup> {
        let mut lookups: Vec<Lookup> = T::fields().iter().filter_map(Field::lookup).collect();
        lookups.sort();
        lookups.dedup();
        lookups
    }

    pub fn set_choices(&mut self, lookup: Lookup, values: Vec<String>) {
        self.choices.insert(lookup, values);
    }

    /// Allowed values of `field`, when it is a choice or a loaded lookup.
    pub fn choices(&self, field: &Field) -> Option<Vec<String>> {
        match field.kind {
            FieldKind::Choice(values) => Some(values.iter().map(|v| (*v).to_owned()).collect()),
            _ => field.lookup().and_then(|l| self.choices.get(&l).cloned()),
        }
    }

    // ── Steps ────────────────────────────────────────────────────────

    /// Steps with at least one visible field.
    pub fn visible_steps(&self) -> Vec<&'static Step> {
        T::steps()
            .iter()
            .filter(|s| self.visible_fields_of(s.id).next().is_some())
            .collect()
    }

    pub fn current_step(&self) -> Option<&'static Step> {
        let steps = self.visible_steps();
        steps
            .get(self.step.min(steps.len().saturating_sub(1)))
            .copied()
    }

    pub fn step_index(&self) -> usize {
        self.step.min(self.visible_steps().len().saturating_sub(1))
    }

    pub fn is_last_step(&self) -> bool {
        self.step_index() + 1 >= self.visible_steps().len()
    }

    pub fn next(&mut self) -> bool {
        if self.is_last_step() {
            return false;
        }
        self.step = self.step_index() + 1;
        true
    }

    pub fn previous(&mut self) -> bool {
        let idx = self.step_index();
        if idx == 0 {
            return false;
        }
        self.step = idx - 1;
        true
    }

    fn visible_fields_of(&self, step: &'static str) -> impl Iterator<Item = &'static Field> + '_ {
        T::fields()
            .iter()
            .filter(move |f| f.step == step && self.working.field_visible(f, self.mode))
    }

    /// Visible fields of the current step.
    pub fn fields(&self) -> Vec<&'static Field> {
        match self.current_step() {
            Some(step) => self.visible_fields_of(step.id).collect(),
            None => Vec::new(),
        }
    }

    /// Whether the operator may change `field` now.
    pub fn editable(&self, field: &Field) -> bool {
        match self.mode {
            Mode::ReadOnly => false,
            Mode::Edit => !field.create_only,
            Mode::Create => true,
        }
    }

    pub fn value(&self, field: &str) -> FieldValue {
        self.working.value(field)
    }

    /// Change one field of the working copy. May show or hide steps; the
    /// current step is clamped to the visible ones.
    pub fn set(&mut self, field: &str, value: FieldValue) -> Result<(), CoreError> {
        let spec = T::field(field).ok_or_else(|| form::unknown_field(field))?;
        if self.mode == Mode::ReadOnly {
            return Err(CoreError::ReadOnly);
        }
        if !self.editable(spec) {
            return Err(CoreError::validation(format!(
                "{} cannot be changed after creation",
                spec.label
            )));
        }
        self.working.set_value(field, value)?;
        self.step = self.step_index();
        Ok(())
    }

    // ── Submit ───────────────────────────────────────────────────────

    /// Required visible fields, then entity checks.
    pub fn validate(&self) -> Result<(), CoreError> {
        for field in T::fields() {
            if field.required
                && self.working.field_visible(field, self.mode)
                && self.working.value(field.id).is_empty()
            {
                return Err(CoreError::validation(format!("{} is required", field.label)));
            }
        }
        self.working.check(self.mode)
    }

    /// Submit the working copy: create when the wizard was opened without
    /// a server key, update with the prior entity tag otherwise.
    pub async fn finish<S>(&mut self, service: &S) -> FinishOutcome<T>
    where
        S: EntityService<T>,
    {
        let result = self.submit(service).await;
        match result {
            Ok((entity, created)) => {
                self.error = None;
                info!(kind = %T::KIND, name = entity.name(), created, "wizard submitted");
                FinishOutcome::Closed { entity, created }
            }
            Err(e) => {
                let error = describe(&e);
                debug!(kind = %T::KIND, %error, "wizard stays open");
                self.error = Some(error.clone());
                FinishOutcome::Open { error }
            }
        }
    }

    async fn submit<S>(&self, service: &S) -> Result<(T, bool), CoreError>
    where
        S: EntityService<T>,
    {
        if self.mode == Mode::ReadOnly {
            return Err(CoreError::ReadOnly);
        }
        self.validate()?;
        match self.key {
            None => Ok((service.create(&self.working).await?, true)),
            Some(_) => Ok((
                service.update(&self.working, self.etag.as_deref()).await?,
                false,
            )),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::{AttrSchemaType, PlainSchema, Role, User};

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Create(Option<String>),
        Update(Option<String>, Option<String>),
    }

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<Call>>,
        fail_with: Option<String>,
    }

    impl<T: Entity> EntityService<T> for Recorder {
        async fn read(&self, entity: &T) -> Result<Versioned<T>, CoreError> {
            Ok(Versioned {
                entity: entity.clone(),
                etag: None,
            })
        }

        async fn create(&self, entity: &T) -> Result<T, CoreError> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Create(entity.key().map(str::to_owned)));
            if let Some(ref message) = self.fail_with {
                return Err(CoreError::Conflict {
                    message: message.clone(),
                });
            }
            let mut stored = entity.clone();
            stored.set_key(Some("generated".into()));
            Ok(stored)
        }

        async fn update(&self, entity: &T, etag: Option<&str>) -> Result<T, CoreError> {
            self.calls.lock().unwrap().push(Call::Update(
                entity.key().map(str::to_owned),
                etag.map(str::to_owned),
            ));
            Ok(entity.clone())
        }

        async fn delete(&self, _entity: &T, _etag: Option<&str>) -> Result<(), CoreError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn no_key_issues_create() {
        let service = Recorder::default();
        let mut wizard = Wizard::open(User::default(), None);
        assert_eq!(wizard.mode(), Mode::Create);
        wizard.set("username", FieldValue::text("verdi")).unwrap();
        wizard.set("realm", FieldValue::text("/")).unwrap();

        let outcome = wizard.finish(&service).await;
        match outcome {
            FinishOutcome::Closed { entity, created } => {
                assert!(created);
                assert_eq!(entity.key.as_deref(), Some("generated"));
            }
            FinishOutcome::Open { error } => panic!("unexpected error {error}"),
        }
        assert_eq!(*service.calls.lock().unwrap(), vec![Call::Create(None)]);
    }

    #[tokio::test]
    async fn key_issues_update_with_prior_etag() {
        let service = Recorder::default();
        let user = User {
            key: Some("c9b2dec2".into()),
            username: "vivaldi".into(),
            realm: "/".into(),
            ..User::default()
        };
        let mut wizard = Wizard::open(user, Some("\"1700000000000\"".into()));
        assert_eq!(wizard.mode(), Mode::Edit);
        wizard
            .set("mustChangePassword", FieldValue::Flag(true))
            .unwrap();

        let outcome = wizard.finish(&service).await;
        assert!(matches!(outcome, FinishOutcome::Closed { created: false, .. }));
        assert_eq!(
            *service.calls.lock().unwrap(),
            vec![Call::Update(
                Some("c9b2dec2".into()),
                Some("\"1700000000000\"".into())
            )]
        );
    }

    #[tokio::test]
    async fn typed_key_in_create_wizard_still_creates() {
        let service = Recorder::default();
        let mut wizard = Wizard::<Role>::create(Role::default());
        wizard.set("key", FieldValue::text("Auditor")).unwrap();
        wizard.finish(&service).await;
        assert_eq!(
            *service.calls.lock().unwrap(),
            vec![Call::Create(Some("Auditor".into()))]
        );
    }

    #[tokio::test]
    async fn failure_keeps_wizard_open_with_working_copy() {
        let service = Recorder {
            fail_with: Some("DataIntegrityViolation".into()),
            ..Recorder::default()
        };
        let mut wizard = Wizard::open(User::default(), None);
        wizard.set("username", FieldValue::text("puccini")).unwrap();
        wizard.set("realm", FieldValue::text("/")).unwrap();

        let outcome = wizard.finish(&service).await;
        let FinishOutcome::Open { error } = outcome else {
            panic!("wizard closed on failure");
        };
        assert!(error.contains("DataIntegrityViolation"));
        assert_eq!(wizard.error(), Some(error.as_str()));
        assert_eq!(wizard.working().username, "puccini");
    }

    #[tokio::test]
    async fn missing_required_field_never_reaches_the_server() {
        let service = Recorder::default();
        let mut wizard = Wizard::open(User::default(), None);
        let outcome = wizard.finish(&service).await;
        assert_eq!(
            outcome,
            FinishOutcome::Open {
                error: "Validation failed: Username is required".into()
            }
        );
        assert!(service.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn read_only_cannot_submit() {
        let service = Recorder::default();
        let mut wizard = Wizard::read_only(Role {
            key: Some("Other".into()),
            ..Role::default()
        });
        assert!(matches!(
            wizard.set("entitlements", FieldValue::text("USER_READ")),
            Err(CoreError::ReadOnly)
        ));
        assert!(!wizard.finish(&service).await.is_closed());
        assert!(service.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn type_details_step_follows_discriminant() {
        let mut wizard = Wizard::open(PlainSchema::default(), None);
        let ids = |w: &Wizard<PlainSchema>| -> Vec<&str> {
            w.visible_steps().iter().map(|s| s.id).collect()
        };
        assert_eq!(ids(&wizard), vec!["details"]);
        wizard.set("type", FieldValue::text("Enum")).unwrap();
        assert_eq!(ids(&wizard), vec!["details", "type_details"]);
        assert!(wizard.next());
        let fields: Vec<_> = wizard.fields().iter().map(|f| f.id).collect();
        assert_eq!(fields, vec!["enumValues"]);
        wizard.set("type", FieldValue::text("Boolean")).unwrap();
        assert_eq!(wizard.current_step().map(|s| s.id), Some("details"));
    }

    #[test]
    fn create_only_fields_are_locked_in_edit() {
        let schema = PlainSchema {
            key: Some("firstname".into()),
            kind: AttrSchemaType::String,
            ..PlainSchema::default()
        };
        let mut wizard = Wizard::open(schema, None);
        assert!(wizard.set("type", FieldValue::text("Long")).is_err());
        assert!(wizard.set("uniqueConstraint", FieldValue::Flag(true)).is_err());
        wizard.set("readonly", FieldValue::Flag(true)).unwrap();
        assert!(wizard.working().readonly);
    }

    #[test]
    fn lookups_and_choices() {
        let mut wizard = Wizard::open(PlainSchema::default(), None);
        assert_eq!(
            wizard.lookups(),
            vec![
                Lookup::Implementations("ATTR_VALUE_VALIDATOR"),
                Lookup::Implementations("DROPDOWN_VALUE_PROVIDER"),
            ]
        );
        let validator = PlainSchema::field("validator").unwrap();
        assert_eq!(wizard.choices(validator), None);
        wizard.set_choices(
            Lookup::Implementations("ATTR_VALUE_VALIDATOR"),
            vec!["EmailAddressValidator".into()],
        );
        assert_eq!(
            wizard.choices(validator),
            Some(vec!["EmailAddressValidator".to_owned()])
        );
    }
}
