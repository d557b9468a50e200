// ── Console facade ──
//
// Connection lifecycle and every remote operation the front ends use:
// login, the session, directory providers, wizard services, row and
// batch actions. Cheaply cloneable via `Arc<ConsoleInner>`.

use std::sync::Arc;

use arc_swap::ArcSwap;
use futures::FutureExt;
use idcon_api::{ListQuery, RestClient, SchemaPayload, TlsMode, TransportConfig};
use tracing::{debug, info, warn};

use crate::actions::{self, ActionType};
use crate::batch::{BatchReport, BatchStatus};
use crate::config::{AuthCredentials, ConsoleConfig, TlsVerification};
use crate::directory::{CollectionProvider, DataProvider, DirectoryView, RemoteProvider};
use crate::error::CoreError;
use crate::model::{
    Application, ConfParam, DerSchema, Domain, Entity, EntityKind, Group, Implementation,
    PlainSchema, Privilege, Realm, Role, StatusType, User, Versioned, VirSchema,
};
use crate::notification::{Notification, describe};
use crate::preferences::Preferences;
use crate::session::Session;
use crate::wizard::{EntityService, FinishOutcome, Form, Lookup, Wizard};

/// Page size used when a lookup lists realms.
const LOOKUP_REALMS: u32 = 500;

#[derive(Clone)]
pub struct Console {
    inner: Arc<ConsoleInner>,
}

struct ConsoleInner {
    config: ConsoleConfig,
    client: Arc<RestClient>,
    session: ArcSwap<Session>,
    prefs: Preferences,
}

impl std::fmt::Debug for Console {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Console")
            .field("url", &self.inner.config.url.as_str())
            .field("domain", &self.inner.config.domain)
            .finish_non_exhaustive()
    }
}

fn build_transport(config: &ConsoleConfig) -> TransportConfig {
    TransportConfig {
        tls: match &config.tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        },
        timeout: config.timeout,
        cookie_jar: None,
    }
}

fn required_key<T: Entity>(entity: &T) -> Result<&str, CoreError> {
    entity.key().ok_or_else(|| {
        CoreError::validation(format!("{} has no key", T::KIND.singular()))
    })
}

impl Console {
    // ── Connection lifecycle ─────────────────────────────────────────

    /// Authenticate and load the session. `prefs` opens the preference
    /// store of the user that logged in.
    pub async fn connect<P>(config: ConsoleConfig, prefs: P) -> Result<Self, CoreError>
    where
        P: FnOnce(&Session) -> Preferences,
    {
        let transport = build_transport(&config);
        let client = RestClient::new(config.url.as_str(), &config.domain, &transport)?;

        match &config.auth {
            AuthCredentials::Password { username, password } => {
                client.login(username, password).await?;
            }
            AuthCredentials::Token(token) => {
                debug!("using pre-issued token -- skipping login");
                client.set_token(token.clone());
            }
        }

        let info = client.self_info().await?;
        let session = Session::from_self(info, config.domain.clone());
        info!(
            user = session.username(),
            domain = session.domain(),
            entitlements = session.entitlements().count(),
            "connected"
        );

        let prefs = prefs(&session);
        Ok(Self {
            inner: Arc::new(ConsoleInner {
                config,
                client: Arc::new(client),
                session: ArcSwap::from_pointee(session),
                prefs,
            }),
        })
    }

    /// Connect, run `f`, disconnect. For one-shot CLI commands.
    pub async fn oneshot<P, F, Fut, T>(config: ConsoleConfig, prefs: P, f: F) -> Result<T, CoreError>
    where
        P: FnOnce(&Session) -> Preferences,
        F: FnOnce(Console) -> Fut,
        Fut: std::future::Future<Output = Result<T, CoreError>>,
    {
        let console = Self::connect(config, prefs).await?;
        let result = f(console.clone()).await;
        console.disconnect().await;
        result
    }

    /// Log out when the session came from a password login.
    pub async fn disconnect(&self) {
        if matches!(self.inner.config.auth, AuthCredentials::Password { .. }) {
            if let Err(e) = self.inner.client.logout().await {
                warn!(error = %e, "logout failed (non-fatal)");
            }
        }
        debug!("disconnected");
    }

    /// Reload entitlements, keeping queued notifications.
    pub async fn refresh_session(&self) -> Result<(), CoreError> {
        let info = self.inner.client.self_info().await?;
        let fresh = Session::from_self(info, self.inner.config.domain.clone());
        for pending in self.session().drain_notifications() {
            fresh.notify(pending);
        }
        self.inner.session.store(Arc::new(fresh));
        Ok(())
    }

    pub fn config(&self) -> &ConsoleConfig {
        &self.inner.config
    }

    pub fn session(&self) -> Arc<Session> {
        self.inner.session.load_full()
    }

    pub fn client(&self) -> &Arc<RestClient> {
        &self.inner.client
    }

    pub fn preferences(&self) -> &Preferences {
        &self.inner.prefs
    }

    /// Fail with an access error unless the session may run `action`.
    pub fn ensure_allowed(
        &self,
        kind: EntityKind,
        action: ActionType,
        realm: Option<&str>,
    ) -> Result<(), CoreError> {
        if actions::allowed(&self.session(), kind, action, realm) {
            Ok(())
        } else {
            Err(CoreError::Unauthorized {
                message: format!("{action} on {} not permitted", kind.singular()),
                status: 403,
            })
        }
    }

    // ── Directories ──────────────────────────────────────────────────

    /// A view over `provider` using this user's preferences; checkboxes
    /// are on when the kind has batch actions.
    pub fn directory<P: DataProvider>(&self, kind: EntityKind, provider: P) -> DirectoryView<P> {
        DirectoryView::new(kind, provider, self.inner.prefs.clone())
            .with_checkboxes(!actions::batch_actions(kind).is_empty())
    }

    fn search_query(&self, realm: Option<&str>, fiql: Option<String>) -> ListQuery {
        let mut query = ListQuery::default().realm(self.session().root_realm(realm));
        query.fiql = fiql;
        query
    }

    pub fn users(&self, realm: Option<&str>, fiql: Option<String>) -> RemoteProvider<User> {
        RemoteProvider::new(Arc::clone(&self.inner.client), self.search_query(realm, fiql))
    }

    pub fn groups(&self, realm: Option<&str>, fiql: Option<String>) -> RemoteProvider<Group> {
        RemoteProvider::new(Arc::clone(&self.inner.client), self.search_query(realm, fiql))
    }

    /// Realms below `base` (the root realm by default).
    pub fn realms(&self, base: Option<&str>, keyword: Option<String>) -> RemoteProvider<Realm> {
        let mut query = ListQuery::default().realm(self.session().root_realm(base));
        query.keyword = keyword;
        RemoteProvider::new(Arc::clone(&self.inner.client), query)
    }

    pub fn roles(&self, keyword: Option<String>) -> CollectionProvider<Role> {
        CollectionProvider::new(Arc::clone(&self.inner.client), |client| {
            async move { Ok(client.list_roles().await?) }.boxed()
        })
        .with_keyword(keyword)
    }

    pub fn plain_schemas(&self, keyword: Option<String>) -> CollectionProvider<PlainSchema> {
        schema_provider(Arc::clone(&self.inner.client), keyword)
    }

    pub fn der_schemas(&self, keyword: Option<String>) -> CollectionProvider<DerSchema> {
        schema_provider(Arc::clone(&self.inner.client), keyword)
    }

    pub fn vir_schemas(&self, keyword: Option<String>) -> CollectionProvider<VirSchema> {
        schema_provider(Arc::clone(&self.inner.client), keyword)
    }

    pub fn domains(&self, keyword: Option<String>) -> CollectionProvider<Domain> {
        CollectionProvider::new(Arc::clone(&self.inner.client), |client| {
            async move { Ok(client.list_domains().await?) }.boxed()
        })
        .with_keyword(keyword)
    }

    pub fn applications(&self, keyword: Option<String>) -> CollectionProvider<Application> {
        CollectionProvider::new(Arc::clone(&self.inner.client), |client| {
            async move { Ok(client.list_applications().await?) }.boxed()
        })
        .with_keyword(keyword)
    }

    pub fn implementations(
        &self,
        kind: &str,
        keyword: Option<String>,
    ) -> CollectionProvider<Implementation> {
        let kind = kind.to_ascii_uppercase();
        CollectionProvider::new(Arc::clone(&self.inner.client), move |client| {
            let kind = kind.clone();
            async move { Ok(client.list_implementations(&kind).await?) }.boxed()
        })
        .with_keyword(keyword)
    }

    pub fn params(&self, keyword: Option<String>) -> CollectionProvider<ConfParam> {
        CollectionProvider::new(Arc::clone(&self.inner.client), |client| {
            async move { Ok(client.list_params().await?) }.boxed()
        })
        .with_keyword(keyword)
    }

    // ── Wizards ──────────────────────────────────────────────────────

    /// Edit wizard over a fresh read of `entity`.
    pub async fn edit_wizard<T>(&self, entity: &T) -> Result<Wizard<T>, CoreError>
    where
        T: Form,
        Self: EntityService<T>,
    {
        let Versioned { entity, etag } = self.read(entity).await?;
        let etag = etag.or_else(|| entity.etag());
        Ok(Wizard::open(entity, etag))
    }

    /// Create wizard prefilled from a fresh read of `entity`.
    pub async fn clone_wizard<T>(&self, entity: &T) -> Result<Wizard<T>, CoreError>
    where
        T: Form,
        Self: EntityService<T>,
    {
        let Versioned { entity, .. } = self.read(entity).await?;
        Ok(Wizard::create(entity.clone_for_create()))
    }

    /// Submit a wizard and report the outcome to the session.
    pub async fn finish_wizard<T>(&self, wizard: &mut Wizard<T>) -> FinishOutcome<T>
    where
        T: Form,
        Self: EntityService<T>,
    {
        let outcome = wizard.finish(self).await;
        match &outcome {
            FinishOutcome::Closed { .. } => self.session().success(),
            FinishOutcome::Open { error } => {
                warn!(kind = %T::KIND, %error, "wizard submit failed");
                self.session().notify(Notification::error(error.clone()));
            }
        }
        outcome
    }

    /// Values a lookup field may take.
    pub async fn lookup(&self, lookup: Lookup) -> Result<Vec<String>, CoreError> {
        let client = &self.inner.client;
        let mut values: Vec<String> = match lookup {
            Lookup::Roles => client
                .list_roles()
                .await?
                .into_iter()
                .filter_map(|r| r.key)
                .collect(),
            Lookup::Realms => {
                let query = ListQuery::default()
                    .realm(self.session().root_realm(None))
                    .size(LOOKUP_REALMS);
                client
                    .search_realms(&query)
                    .await?
                    .result
                    .into_iter()
                    .map(|r| r.full_path)
                    .collect()
            }
            Lookup::Implementations(kind) => client
                .list_implementations(kind)
                .await?
                .into_iter()
                .filter_map(|i| i.key)
                .collect(),
        };
        values.sort();
        Ok(values)
    }

    /// Load the choices of every lookup the wizard uses. A failing lookup
    /// leaves its field free-text and is reported as a warning.
    pub async fn load_choices<T: Form>(&self, wizard: &mut Wizard<T>) {
        for lookup in wizard.lookups() {
            match self.lookup(lookup).await {
                Ok(values) => wizard.set_choices(lookup, values),
                Err(e) => {
                    warn!(error = %e, ?lookup, "lookup failed");
                    self.session().warn(describe(&e));
                }
            }
        }
    }

    // ── Row actions ──────────────────────────────────────────────────

    /// Delete `entity` under the entity tag the row carries.
    pub async fn delete<T>(&self, entity: &T) -> Result<(), CoreError>
    where
        T: Entity,
        Self: EntityService<T>,
    {
        let etag = entity.etag();
        EntityService::delete(self, entity, etag.as_deref()).await
    }

    /// Flip the must-change-password flag of a user.
    pub async fn toggle_must_change_password(&self, user: &User) -> Result<User, CoreError> {
        let Versioned { mut entity, etag } = self.read(user).await?;
        entity.must_change_password = !entity.must_change_password;
        let etag = etag.or_else(|| entity.etag());
        self.update(&entity, etag.as_deref()).await
    }

    /// Suspend or reactivate a user.
    pub async fn set_status(&self, user: &User, status: StatusType) -> Result<User, CoreError> {
        let key = required_key(user)?;
        let Versioned { entity, etag } = self.read(user).await?;
        let etag = etag.or_else(|| entity.etag());
        Ok(self
            .inner
            .client
            .set_user_status(key, etag.as_deref(), status)
            .await?
            .entity)
    }

    // ── Batch ────────────────────────────────────────────────────────

    /// Run `action` on each key in turn; failures are recorded, not fatal.
    pub async fn run_batch(
        &self,
        kind: EntityKind,
        action: ActionType,
        keys: &[String],
    ) -> Result<BatchReport, CoreError> {
        if !actions::batch_actions(kind).iter().any(|a| a.kind == action) {
            return Err(CoreError::Unsupported {
                operation: format!("batch {action} on {}", kind.title()),
            });
        }
        let mut report = BatchReport::new(action);
        for key in keys {
            let result = self.batch_one(kind, action, key).await;
            let status = match result {
                Ok(()) => BatchStatus::Success,
                Err(e) => {
                    warn!(%key, %action, error = %e, "batch item failed");
                    BatchStatus::Failure(describe(&e))
                }
            };
            report.record(key.clone(), status);
        }
        info!(%action, kind = %kind, summary = %report.summary(), "batch finished");
        Ok(report)
    }

    async fn batch_one(
        &self,
        kind: EntityKind,
        action: ActionType,
        key: &str,
    ) -> Result<(), CoreError> {
        match kind {
            EntityKind::User => {
                let probe = User {
                    key: Some(key.to_owned()),
                    ..User::default()
                };
                match action {
                    ActionType::MustChangePassword => {
                        self.toggle_must_change_password(&probe).await.map(drop)
                    }
                    ActionType::Suspend => self
                        .set_status(&probe, StatusType::Suspend)
                        .await
                        .map(drop),
                    ActionType::Reactivate => self
                        .set_status(&probe, StatusType::Reactivate)
                        .await
                        .map(drop),
                    _ => {
                        let Versioned { entity, etag } = self.read(&probe).await?;
                        let etag = etag.or_else(|| entity.etag());
                        EntityService::<User>::delete(self, &entity, etag.as_deref()).await
                    }
                }
            }
            _ => {
                let probe = Group {
                    key: Some(key.to_owned()),
                    ..Group::default()
                };
                let Versioned { entity, etag } = self.read(&probe).await?;
                let etag = etag.or_else(|| entity.etag());
                EntityService::<Group>::delete(self, &entity, etag.as_deref()).await
            }
        }
    }
}

fn schema_provider<T>(client: Arc<RestClient>, keyword: Option<String>) -> CollectionProvider<T>
where
    T: SchemaPayload + crate::directory::Tabular,
{
    CollectionProvider::new(client, |client| {
        async move { Ok(client.list_schemas::<T>(&[], None).await?) }.boxed()
    })
    .with_keyword(keyword)
}

// ── Entity services ──────────────────────────────────────────────────

impl EntityService<User> for Console {
    async fn read(&self, entity: &User) -> Result<Versioned<User>, CoreError> {
        Ok(self.inner.client.read_user(required_key(entity)?).await?)
    }

    async fn create(&self, entity: &User) -> Result<User, CoreError> {
        Ok(self.inner.client.create_user(entity).await?.entity)
    }

    async fn update(&self, entity: &User, etag: Option<&str>) -> Result<User, CoreError> {
        let key = required_key(entity)?;
        Ok(self.inner.client.update_user(key, etag, entity).await?.entity)
    }

    async fn delete(&self, entity: &User, etag: Option<&str>) -> Result<(), CoreError> {
        let key = required_key(entity)?;
        self.inner.client.delete_user(key, etag).await?;
        Ok(())
    }
}

impl EntityService<Group> for Console {
    async fn read(&self, entity: &Group) -> Result<Versioned<Group>, CoreError> {
        Ok(self.inner.client.read_group(required_key(entity)?).await?)
    }

    async fn create(&self, entity: &Group) -> Result<Group, CoreError> {
        Ok(self.inner.client.create_group(entity).await?.entity)
    }

    async fn update(&self, entity: &Group, etag: Option<&str>) -> Result<Group, CoreError> {
        let key = required_key(entity)?;
        Ok(self.inner.client.update_group(key, etag, entity).await?.entity)
    }

    async fn delete(&self, entity: &Group, etag: Option<&str>) -> Result<(), CoreError> {
        let key = required_key(entity)?;
        self.inner.client.delete_group(key, etag).await?;
        Ok(())
    }
}

impl EntityService<Realm> for Console {
    async fn read(&self, entity: &Realm) -> Result<Versioned<Realm>, CoreError> {
        let realm = self.inner.client.read_realm(&entity.full_path).await?;
        Ok(Versioned {
            entity: realm,
            etag: None,
        })
    }

    async fn create(&self, entity: &Realm) -> Result<Realm, CoreError> {
        Ok(self.inner.client.create_realm(entity).await?.entity)
    }

    async fn update(&self, entity: &Realm, _etag: Option<&str>) -> Result<Realm, CoreError> {
        Ok(self.inner.client.update_realm(entity).await?.entity)
    }

    async fn delete(&self, entity: &Realm, _etag: Option<&str>) -> Result<(), CoreError> {
        self.inner.client.delete_realm(&entity.full_path).await?;
        Ok(())
    }
}

/// Services for kinds whose create returns only the new key and whose
/// update returns nothing: the stored entity is the submitted one.
macro_rules! keyed_service {
    ($ty:ty, read: $read:ident, create: $create:ident, update: $update:ident, delete: $delete:ident) => {
        impl EntityService<$ty> for Console {
            async fn read(&self, entity: &$ty) -> Result<Versioned<$ty>, CoreError> {
                Ok(self.inner.client.$read(required_key(entity)?).await?)
            }

            async fn create(&self, entity: &$ty) -> Result<$ty, CoreError> {
                let created = self.inner.client.$create(entity).await?;
                let mut stored = entity.clone();
                if created.is_some() {
                    stored.set_key(created);
                }
                Ok(stored)
            }

            async fn update(&self, entity: &$ty, etag: Option<&str>) -> Result<$ty, CoreError> {
                let key = required_key(entity)?;
                self.inner.client.$update(key, etag, entity).await?;
                Ok(entity.clone())
            }

            async fn delete(&self, entity: &$ty, _etag: Option<&str>) -> Result<(), CoreError> {
                let key = required_key(entity)?;
                Ok(self.inner.client.$delete(key).await?)
            }
        }
    };
}

keyed_service!(Role, read: read_role, create: create_role, update: update_role, delete: delete_role);
keyed_service!(
    Application,
    read: read_application,
    create: create_application,
    update: update_application,
    delete: delete_application
);

macro_rules! schema_service {
    ($ty:ty) => {
        impl EntityService<$ty> for Console {
            async fn read(&self, entity: &$ty) -> Result<Versioned<$ty>, CoreError> {
                let key = required_key(entity)?;
                Ok(self.inner.client.read_schema::<$ty>(key).await?)
            }

            async fn create(&self, entity: &$ty) -> Result<$ty, CoreError> {
                let created = self.inner.client.create_schema(entity).await?;
                let mut stored = entity.clone();
                if created.is_some() {
                    stored.set_key(created);
                }
                Ok(stored)
            }

            async fn update(&self, entity: &$ty, etag: Option<&str>) -> Result<$ty, CoreError> {
                let key = required_key(entity)?;
                self.inner.client.update_schema(key, etag, entity).await?;
                Ok(entity.clone())
            }

            async fn delete(&self, entity: &$ty, _etag: Option<&str>) -> Result<(), CoreError> {
                let key = required_key(entity)?;
                Ok(self
                    .inner
                    .client
                    .delete_schema(<$ty as SchemaPayload>::TYPE, key)
                    .await?)
            }
        }
    };
}

schema_service!(PlainSchema);
schema_service!(DerSchema);
schema_service!(VirSchema);

impl EntityService<Implementation> for Console {
    async fn read(&self, entity: &Implementation) -> Result<Versioned<Implementation>, CoreError> {
        let key = required_key(entity)?;
        Ok(self
            .inner
            .client
            .read_implementation(&entity.kind, key)
            .await?)
    }

    async fn create(&self, entity: &Implementation) -> Result<Implementation, CoreError> {
        let key = required_key(entity)?;
        let created = self.inner.client.create_implementation(key, entity).await?;
        let mut stored = entity.clone();
        if created.is_some() {
            stored.key = created;
        }
        Ok(stored)
    }

    async fn update(
        &self,
        entity: &Implementation,
        etag: Option<&str>,
    ) -> Result<Implementation, CoreError> {
        let key = required_key(entity)?;
        self.inner
            .client
            .update_implementation(key, etag, entity)
            .await?;
        Ok(entity.clone())
    }

    async fn delete(&self, entity: &Implementation, _etag: Option<&str>) -> Result<(), CoreError> {
        let key = required_key(entity)?;
        Ok(self
            .inner
            .client
            .delete_implementation(&entity.kind, key)
            .await?)
    }
}

impl EntityService<Domain> for Console {
    async fn read(&self, entity: &Domain) -> Result<Versioned<Domain>, CoreError> {
        Ok(self.inner.client.read_domain(required_key(entity)?).await?)
    }

    async fn create(&self, entity: &Domain) -> Result<Domain, CoreError> {
        let created = self.inner.client.create_domain(entity).await?;
        let mut stored = Domain {
            admin_password: None,
            db_password: None,
            ..entity.clone()
        };
        if created.is_some() {
            stored.key = created;
        }
        Ok(stored)
    }

    /// Domains are not replaced: the pool size is adjusted and, when
    /// given, the admin password changed.
    async fn update(&self, entity: &Domain, _etag: Option<&str>) -> Result<Domain, CoreError> {
        let key = required_key(entity)?;
        let client = &self.inner.client;
        client
            .adjust_domain_pool_size(key, entity.pool_max_active, entity.pool_min_idle)
            .await?;
        if let Some(ref password) = entity.admin_password {
            client
                .change_domain_admin_password(key, password, &entity.admin_cipher_algorithm)
                .await?;
        }
        Ok(Domain {
            admin_password: None,
            ..entity.clone()
        })
    }

    async fn delete(&self, entity: &Domain, _etag: Option<&str>) -> Result<(), CoreError> {
        Ok(self
            .inner
            .client
            .delete_domain(required_key(entity)?)
            .await?)
    }
}

impl EntityService<ConfParam> for Console {
    async fn read(&self, entity: &ConfParam) -> Result<Versioned<ConfParam>, CoreError> {
        let param = self.inner.client.read_param(required_key(entity)?).await?;
        Ok(Versioned {
            entity: param,
            etag: None,
        })
    }

    async fn create(&self, entity: &ConfParam) -> Result<ConfParam, CoreError> {
        self.inner.client.set_param(entity).await?;
        Ok(entity.clone())
    }

    async fn update(&self, entity: &ConfParam, _etag: Option<&str>) -> Result<ConfParam, CoreError> {
        self.inner.client.set_param(entity).await?;
        Ok(entity.clone())
    }

    async fn delete(&self, entity: &ConfParam, _etag: Option<&str>) -> Result<(), CoreError> {
        Ok(self
            .inner
            .client
            .remove_param(required_key(entity)?)
            .await?)
    }
}

impl EntityService<Privilege> for Console {
    async fn read(&self, entity: &Privilege) -> Result<Versioned<Privilege>, CoreError> {
        let privilege = self
            .inner
            .client
            .read_privilege(required_key(entity)?)
            .await?;
        Ok(Versioned {
            entity: privilege,
            etag: None,
        })
    }

    async fn create(&self, _entity: &Privilege) -> Result<Privilege, CoreError> {
        Err(privilege_unsupported())
    }

    async fn update(&self, _entity: &Privilege, _etag: Option<&str>) -> Result<Privilege, CoreError> {
        Err(privilege_unsupported())
    }

    async fn delete(&self, _entity: &Privilege, _etag: Option<&str>) -> Result<(), CoreError> {
        Err(privilege_unsupported())
    }
}

fn privilege_unsupported() -> CoreError {
    CoreError::Unsupported {
        operation: "privileges are edited within their application".into(),
    }
}
