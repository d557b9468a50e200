//! Generic directory and wizard commands shared by every entity kind.
//!
//! Each kind plugs in through [`Resource`]: where its rows come from,
//! how a bare key becomes something the server can read, and the blank
//! template a create starts from.

use serde::Serialize;
use serde::de::DeserializeOwned;
use tabled::builder::Builder;
use tabled::settings::Style;

use idcon_core::actions::row_actions;
use idcon_core::directory::{CollectionProvider, RemoteProvider};
use idcon_core::model::Versioned;
use idcon_core::search::directory_fiql;
use idcon_core::{
    ActionType, Application, BatchReport, BatchStatus, ConfParam, Console, DataProvider,
    DerSchema, Domain, Entity, EntityService, FinishOutcome, Form, Group, Implementation,
    PlainSchema, Realm, Role, Tabular, User, VirSchema, Wizard,
};

use crate::cli::{EditArgs, EntityCommand, GlobalOpts, ListArgs, OutputFormat};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Resource seam ────────────────────────────────────────────────────

pub trait Resource: Sync {
    type Item: Form + Tabular + Serialize + DeserializeOwned + Default;
    type Provider: DataProvider<Item = Self::Item>;

    /// Rows for a list command.
    fn provider(&self, console: &Console, args: &ListArgs) -> Result<Self::Provider, CliError>;

    /// An entity carrying only what a read needs.
    fn probe(&self, key: &str) -> Self::Item {
        let mut item = Self::Item::default();
        item.set_key(Some(key.to_owned()));
        item
    }

    /// Starting point of a create wizard.
    fn template(&self) -> Self::Item {
        Self::Item::default()
    }
}

fn no_search_clauses(args: &ListArgs, kind: &str) -> Result<(), CliError> {
    if args.clauses.is_empty() {
        Ok(())
    } else {
        Err(CliError::Validation {
            field: "where".into(),
            reason: format!("{kind} are filtered by keyword only; use --filter"),
        })
    }
}

pub struct Users;
pub struct Groups;
pub struct Roles;
pub struct Realms;
pub struct PlainSchemas;
pub struct DerSchemas;
pub struct VirSchemas;
pub struct Domains;
pub struct Applications;
pub struct Params;

/// Implementations of one type (`ACCOUNT_RULE`, `LOGIC_ACTIONS`, ...).
pub struct Implementations {
    pub kind: String,
}

impl Resource for Users {
    type Item = User;
    type Provider = RemoteProvider<User>;

    fn provider(&self, console: &Console, args: &ListArgs) -> Result<Self::Provider, CliError> {
        let clauses = util::parse_clauses(&args.clauses)?;
        let fiql = directory_fiql(User::KIND, args.filter.as_deref(), &clauses);
        Ok(console.users(args.realm.as_deref(), fiql))
    }

    fn template(&self) -> User {
        User {
            realm: "/".into(),
            ..User::default()
        }
    }
}

impl Resource for Groups {
    type Item = Group;
    type Provider = RemoteProvider<Group>;

    fn provider(&self, console: &Console, args: &ListArgs) -> Result<Self::Provider, CliError> {
        let clauses = util::parse_clauses(&args.clauses)?;
        let fiql = directory_fiql(Group::KIND, args.filter.as_deref(), &clauses);
        Ok(console.groups(args.realm.as_deref(), fiql))
    }

    fn template(&self) -> Group {
        Group {
            realm: "/".into(),
            ..Group::default()
        }
    }
}

impl Resource for Realms {
    type Item = Realm;
    type Provider = RemoteProvider<Realm>;

    fn provider(&self, console: &Console, args: &ListArgs) -> Result<Self::Provider, CliError> {
        no_search_clauses(args, "realms")?;
        Ok(console.realms(args.realm.as_deref(), args.filter.clone()))
    }

    /// Realms are addressed by full path.
    fn probe(&self, key: &str) -> Realm {
        Realm {
            full_path: key.to_owned(),
            ..Realm::default()
        }
    }

    fn template(&self) -> Realm {
        Realm {
            parent: Some("/".into()),
            ..Realm::default()
        }
    }
}

/// Kinds listed as a whole collection and filtered by keyword.
macro_rules! collection_resource {
    ($resource:ty, $item:ty, $method:ident, $label:literal) => {
        impl Resource for $resource {
            type Item = $item;
            type Provider = CollectionProvider<$item>;

            fn provider(
                &self,
                console: &Console,
                args: &ListArgs,
            ) -> Result<Self::Provider, CliError> {
                no_search_clauses(args, $label)?;
                Ok(console.$method(args.filter.clone()))
            }
        }
    };
}

collection_resource!(Roles, Role, roles, "roles");
collection_resource!(PlainSchemas, PlainSchema, plain_schemas, "schemas");
collection_resource!(DerSchemas, DerSchema, der_schemas, "schemas");
collection_resource!(VirSchemas, VirSchema, vir_schemas, "schemas");
collection_resource!(Domains, Domain, domains, "domains");
collection_resource!(Applications, Application, applications, "applications");
collection_resource!(Params, ConfParam, params, "parameters");

impl Resource for Implementations {
    type Item = Implementation;
    type Provider = CollectionProvider<Implementation>;

    fn provider(&self, console: &Console, args: &ListArgs) -> Result<Self::Provider, CliError> {
        no_search_clauses(args, "implementations")?;
        Ok(console.implementations(&self.kind, args.filter.clone()))
    }

    fn probe(&self, key: &str) -> Implementation {
        Implementation {
            key: Some(key.to_owned()),
            kind: self.kind.to_ascii_uppercase(),
            ..Implementation::default()
        }
    }

    fn template(&self) -> Implementation {
        Implementation {
            kind: self.kind.to_ascii_uppercase(),
            ..Implementation::default()
        }
    }
}

// ── Dispatch ─────────────────────────────────────────────────────────

pub async fn handle<R>(
    resource: &R,
    cmd: EntityCommand,
    console: &Console,
    global: &GlobalOpts,
) -> Result<(), CliError>
where
    R: Resource,
    Console: EntityService<R::Item>,
{
    match cmd {
        EntityCommand::List(args) => list(resource, &args, console, global).await,
        EntityCommand::Get { key } => {
            let Versioned { entity, .. } = console.read(&resource.probe(&key)).await?;
            output::print_output(&output::render_single(&global.output, &entity)?, global.quiet);
            Ok(())
        }
        EntityCommand::Create(edit) => create(resource, &edit, console, global).await,
        EntityCommand::Update { key, edit } => update(resource, &key, &edit, console, global).await,
        EntityCommand::Clone { key, edit } => clone(resource, &key, &edit, console, global).await,
        EntityCommand::Delete { keys } => delete(resource, &keys, console, global).await,
        EntityCommand::Fields => {
            print_fields::<R::Item>(&global.output, global.quiet)?;
            Ok(())
        }
    }
}

// ── List ─────────────────────────────────────────────────────────────

async fn list<R: Resource>(
    resource: &R,
    args: &ListArgs,
    console: &Console,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let kind = R::Item::KIND;
    let sort = util::parse_sort::<R::Item>(args.sort.as_deref())?;
    let mut view = console
        .directory(kind, resource.provider(console, args)?)
        .with_sort(sort);
    if let Some(size) = args.size {
        view = view.with_rows(size)?;
    }
    if let Some(ref columns) = args.columns {
        view.set_columns(columns.clone())?;
    }

    let spinner = output::spinner(&format!("Loading {}", kind.title().to_lowercase()), global.quiet);
    let fetched = view.goto(args.page.saturating_sub(1)).await;
    spinner.finish_and_clear();
    fetched?;

    let rendered = output::render_page(&global.output, &view.visible_columns(), view.rows())?;
    output::print_output(&rendered, global.quiet);
    if matches!(global.output, OutputFormat::Table) {
        output::print_status(&output::page_footer(&view.pagination()), global.quiet);
    }
    Ok(())
}

// ── Wizards ──────────────────────────────────────────────────────────

async fn create<R>(
    resource: &R,
    edit: &EditArgs,
    console: &Console,
    global: &GlobalOpts,
) -> Result<(), CliError>
where
    R: Resource,
    Console: EntityService<R::Item>,
{
    let template = match edit.from_file {
        Some(ref path) => util::read_json_file(path)?,
        None => resource.template(),
    };
    let mut wizard = Wizard::create(template);
    console.load_choices(&mut wizard).await;
    util::apply_assignments(&mut wizard, &edit.assignments)?;
    console.ensure_allowed(R::Item::KIND, ActionType::Create, wizard.working().realm())?;
    finish(console, &mut wizard, global).await
}

async fn update<R>(
    resource: &R,
    key: &str,
    edit: &EditArgs,
    console: &Console,
    global: &GlobalOpts,
) -> Result<(), CliError>
where
    R: Resource,
    Console: EntityService<R::Item>,
{
    let read = console.edit_wizard(&resource.probe(key)).await?;
    let mut wizard = match edit.from_file {
        Some(ref path) => {
            let mut replacement: R::Item = util::read_json_file(path)?;
            replacement.set_key(read.working().key().map(str::to_owned));
            Wizard::open(replacement, read.etag().map(str::to_owned))
        }
        None => read,
    };
    console.ensure_allowed(R::Item::KIND, ActionType::Edit, wizard.working().realm())?;
    console.load_choices(&mut wizard).await;
    util::apply_assignments(&mut wizard, &edit.assignments)?;
    finish(console, &mut wizard, global).await
}

async fn clone<R>(
    resource: &R,
    key: &str,
    edit: &EditArgs,
    console: &Console,
    global: &GlobalOpts,
) -> Result<(), CliError>
where
    R: Resource,
    Console: EntityService<R::Item>,
{
    let kind = R::Item::KIND;
    if !row_actions(kind).iter().any(|a| a.kind == ActionType::Clone) {
        return Err(CliError::Unsupported {
            operation: format!("cloning a {}", kind.singular()),
        });
    }
    let mut wizard = console.clone_wizard(&resource.probe(key)).await?;
    console.ensure_allowed(kind, ActionType::Clone, wizard.working().realm())?;
    console.load_choices(&mut wizard).await;
    util::apply_assignments(&mut wizard, &edit.assignments)?;
    finish(console, &mut wizard, global).await
}

/// Submit a wizard. A rejected submit leaves the error in the wizard and
/// fails the command with it.
async fn finish<T>(
    console: &Console,
    wizard: &mut Wizard<T>,
    global: &GlobalOpts,
) -> Result<(), CliError>
where
    T: Form + Tabular + Serialize,
    Console: EntityService<T>,
{
    let spinner = output::spinner(&wizard.title(), global.quiet);
    let outcome = console.finish_wizard(wizard).await;
    spinner.finish_and_clear();

    match outcome {
        FinishOutcome::Closed { entity, .. } => {
            super::flush_notifications(console, global, false);
            output::print_output(&output::render_single(&global.output, &entity)?, global.quiet);
            Ok(())
        }
        FinishOutcome::Open { error } => {
            super::flush_notifications(console, global, true);
            Err(CliError::Rejected { message: error })
        }
    }
}

// ── Delete ───────────────────────────────────────────────────────────

async fn delete<R>(
    resource: &R,
    keys: &[String],
    console: &Console,
    global: &GlobalOpts,
) -> Result<(), CliError>
where
    R: Resource,
    Console: EntityService<R::Item>,
{
    let kind = R::Item::KIND;
    console.ensure_allowed(kind, ActionType::Delete, None)?;

    let prompt = match keys {
        [key] => format!("Delete {} {key}?", kind.singular()),
        _ => format!("Delete {} {}?", keys.len(), kind.title().to_lowercase()),
    };
    if !util::confirm(&prompt, global.yes)? {
        return Ok(());
    }

    let batchable = idcon_core::actions::batch_actions(kind)
        .iter()
        .any(|a| a.kind == ActionType::Delete);
    let report = if batchable && keys.len() > 1 {
        console.run_batch(kind, ActionType::Delete, keys).await?
    } else {
        let mut report = BatchReport::new(ActionType::Delete);
        for key in keys {
            let status = match delete_one(resource, key, console).await {
                Ok(()) => BatchStatus::Success,
                Err(e) => {
                    tracing::warn!(%key, error = %e, "delete failed");
                    BatchStatus::Failure(idcon_core::notification::describe(&e))
                }
            };
            report.record(key.clone(), status);
        }
        report
    };
    super::print_batch(&report, global)
}

/// Read then delete under the entity tag of that read.
async fn delete_one<R>(resource: &R, key: &str, console: &Console) -> Result<(), idcon_core::CoreError>
where
    R: Resource,
    Console: EntityService<R::Item>,
{
    let Versioned { entity, etag } = console.read(&resource.probe(key)).await?;
    let etag = etag.or_else(|| entity.etag());
    EntityService::delete(console, &entity, etag.as_deref()).await
}

// ── Fields ───────────────────────────────────────────────────────────

#[derive(Serialize)]
struct StepFields {
    step: &'static str,
    title: &'static str,
    fields: Vec<&'static idcon_core::wizard::Field>,
}

/// The wizard layout of `T`: steps in order with their fields.
fn print_fields<T: Form>(format: &OutputFormat, quiet: bool) -> Result<(), CliError> {
    let steps: Vec<StepFields> = T::steps()
        .iter()
        .map(|step| StepFields {
            step: step.id,
            title: step.title,
            fields: T::fields().iter().filter(|f| f.step == step.id).collect(),
        })
        .collect();

    let rendered = match format {
        OutputFormat::Table => {
            let mut builder = Builder::default();
            builder.push_record(["Step", "Field", "Label", "Type", "Required", "Create only"]);
            for step in &steps {
                for field in &step.fields {
                    builder.push_record([
                        step.title.to_owned(),
                        field.id.to_owned(),
                        field.label.to_owned(),
                        field_type(field),
                        if field.required { "yes" } else { "" }.to_owned(),
                        if field.create_only { "yes" } else { "" }.to_owned(),
                    ]);
                }
            }
            builder.build().with(Style::rounded()).to_string()
        }
        OutputFormat::Plain => steps
            .iter()
            .flat_map(|s| s.fields.iter().map(|f| f.id))
            .collect::<Vec<_>>()
            .join("\n"),
        other => output::render_value(other, &steps)?,
    };
    output::print_output(&rendered, quiet);
    Ok(())
}

fn field_type(field: &idcon_core::wizard::Field) -> String {
    use idcon_core::wizard::{FieldKind, Lookup};

    let lookup = |l: Lookup| match l {
        Lookup::Roles => "roles".to_owned(),
        Lookup::Realms => "realms".to_owned(),
        Lookup::Implementations(kind) => format!("{kind} implementations"),
    };
    match field.kind {
        FieldKind::Text => "text".into(),
        FieldKind::Secret => "secret".into(),
        FieldKind::Multiline => "multiline text".into(),
        FieldKind::Flag => "yes/no".into(),
        FieldKind::Number => "number".into(),
        FieldKind::Choice(values) => format!("one of {}", values.join("|")),
        FieldKind::Lookup(l) => format!("one of {}", lookup(l)),
        FieldKind::List(Some(l)) => format!("list of {}", lookup(l)),
        FieldKind::List(None) => "list".into(),
    }
}
