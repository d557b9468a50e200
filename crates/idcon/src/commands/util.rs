//! Shared helpers for command handlers.

use std::io::IsTerminal;
use std::path::Path;

use serde::de::DeserializeOwned;

use idcon_core::search::SearchClause;
use idcon_core::wizard::FieldKind;
use idcon_core::{FieldValue, Form, SortParam, Tabular, Wizard};

use crate::error::CliError;

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: message.into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

/// Read and parse a JSON file for `--from-file` flags.
pub fn read_json_file<T: DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents).map_err(|e| CliError::Validation {
        field: "from-file".into(),
        reason: format!("invalid JSON in {}: {e}", path.display()),
    })
}

/// Parse `column` or `column:asc|desc` against the sortable columns.
pub fn parse_sort<T: Tabular>(raw: Option<&str>) -> Result<Option<SortParam>, CliError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let (property, direction) = raw.split_once(':').unwrap_or((raw, "asc"));
    if !T::column(property).is_some_and(|c| c.sortable) {
        return Err(CliError::Validation {
            field: "sort".into(),
            reason: format!("no sortable column '{property}'"),
        });
    }
    match direction.to_ascii_lowercase().as_str() {
        "asc" => Ok(Some(SortParam::asc(property))),
        "desc" => Ok(Some(SortParam::desc(property))),
        other => Err(CliError::Validation {
            field: "sort".into(),
            reason: format!("direction must be asc or desc, got '{other}'"),
        }),
    }
}

/// Parse `--where` clauses; a leading `|` joins the clause with OR.
pub fn parse_clauses(raw: &[String]) -> Result<Vec<SearchClause>, CliError> {
    raw.iter()
        .map(|expr| match expr.strip_prefix('|') {
            Some(rest) => SearchClause::parse(rest).map(SearchClause::or),
            None => SearchClause::parse(expr),
        })
        .collect::<Result<_, _>>()
        .map_err(CliError::from)
}

/// Apply `FIELD=VALUE` assignments to a wizard's working copy.
///
/// Values are typed by the field: flags accept yes/no, lists split on
/// commas. A secret given as `-` is prompted for without echo. Choice
/// and loaded lookup fields only take their allowed values.
pub fn apply_assignments<T: Form>(
    wizard: &mut Wizard<T>,
    assignments: &[String],
) -> Result<(), CliError> {
    for assignment in assignments {
        let (id, raw) = assignment
            .split_once('=')
            .ok_or_else(|| CliError::Validation {
                field: "set".into(),
                reason: format!("expected FIELD=VALUE, got '{assignment}'"),
            })?;
        let field = T::field(id.trim()).ok_or_else(|| CliError::Validation {
            field: id.into(),
            reason: format!("{} has no such field; see the fields command", T::KIND.singular()),
        })?;

        let value = match field.kind {
            FieldKind::Flag => FieldValue::Flag(FieldValue::text(raw).as_flag()),
            FieldKind::List(_) => FieldValue::List(FieldValue::text(raw).into_list()),
            FieldKind::Secret if raw == "-" => {
                FieldValue::text(rpassword::prompt_password(format!("{}: ", field.label))?)
            }
            _ => FieldValue::text(raw),
        };

        if let Some(allowed) = wizard.choices(field) {
            let entries = match &value {
                FieldValue::List(items) => items.clone(),
                other => vec![other.as_text()],
            };
            if let Some(bad) = entries
                .iter()
                .find(|e| !e.is_empty() && !allowed.contains(e))
            {
                return Err(CliError::Validation {
                    field: field.id.into(),
                    reason: format!("'{bad}' is not one of: {}", allowed.join(", ")),
                });
            }
        }
        wizard.set(field.id, value)?;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use idcon_core::{PlainSchema, User};

    use super::*;

    #[test]
    fn sort_accepts_direction_suffix() {
        let sort = parse_sort::<User>(Some("lastChangeDate:desc")).unwrap().unwrap();
        assert_eq!(sort, SortParam::desc("lastChangeDate"));
        assert!(parse_sort::<User>(Some("shoeSize")).is_err());
        assert!(parse_sort::<User>(Some("username:sideways")).is_err());
    }

    #[test]
    fn pipe_prefix_joins_with_or() {
        let clauses =
            parse_clauses(&["$groups==root".to_owned(), "|$groups==child".to_owned()]).unwrap();
        assert_eq!(
            idcon_core::search::build_fiql(&clauses).as_deref(),
            Some("$groups==root,$groups==child")
        );
    }

    #[test]
    fn assignments_follow_field_kinds() {
        let mut wizard = Wizard::create(User::default());
        apply_assignments(
            &mut wizard,
            &[
                "username=rossini".into(),
                "realm=/".into(),
                "mustChangePassword=yes".into(),
            ],
        )
        .unwrap();
        assert_eq!(wizard.working().username, "rossini");
        assert!(wizard.working().must_change_password);
        assert!(apply_assignments(&mut wizard, &["nope=1".into()]).is_err());
        assert!(apply_assignments(&mut wizard, &["username".into()]).is_err());
    }

    #[test]
    fn choice_fields_reject_unknown_values() {
        let mut wizard = Wizard::create(PlainSchema::default());
        assert!(apply_assignments(&mut wizard, &["type=Banana".into()]).is_err());
    }
}
