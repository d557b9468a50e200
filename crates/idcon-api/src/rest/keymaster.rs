// Keymaster endpoints: domains and configuration parameters
//
// Domains have no update endpoint; only the admin password and the
// connection pool size can be changed after creation. Parameters are a
// flat JSON map on the wire and are exposed here as typed `ConfParam`s.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::debug;

use crate::error::{ClientException, Error};
use crate::rest::client::RestClient;
use crate::rest::models::{AttrSchemaType, ConfParam, Domain, Versioned};

impl RestClient {
    // ── Domains ──────────────────────────────────────────────────────

    /// `GET /keymaster/domains`
    pub async fn list_domains(&self) -> Result<Vec<Domain>, Error> {
        self.get("keymaster/domains").await
    }

    /// `GET /keymaster/domains/{key}`
    pub async fn read_domain(&self, key: &str) -> Result<Versioned<Domain>, Error> {
        self.get_versioned(&format!("keymaster/domains/{key}")).await
    }

    /// `POST /keymaster/domains`; returns the created key.
    pub async fn create_domain(&self, domain: &Domain) -> Result<Option<String>, Error> {
        debug!(key = ?domain.key, "creating domain");
        self.post_created("keymaster/domains", domain).await
    }

    /// `POST /keymaster/domains/{key}/changeAdminPassword`
    pub async fn change_domain_admin_password(
        &self,
        key: &str,
        password: &str,
        cipher_algorithm: &str,
    ) -> Result<(), Error> {
        debug!(key, cipher_algorithm, "changing domain admin password");
        self.post_query(
            &format!("keymaster/domains/{key}/changeAdminPassword"),
            &[
                ("password", password.to_owned()),
                ("cipherAlgorithm", cipher_algorithm.to_owned()),
            ],
        )
        .await
    }

    /// `POST /keymaster/domains/{key}/adjustPoolSize`
    pub async fn adjust_domain_pool_size(
        &self,
        key: &str,
        max_active: u32,
        min_idle: u32,
    ) -> Result<(), Error> {
        debug!(key, max_active, min_idle, "adjusting domain pool size");
        self.post_query(
            &format!("keymaster/domains/{key}/adjustPoolSize"),
            &[
                ("poolMaxActive", max_active.to_string()),
                ("poolMinIdle", min_idle.to_string()),
            ],
        )
        .await
    }

    /// `DELETE /keymaster/domains/{key}`
    pub async fn delete_domain(&self, key: &str) -> Result<(), Error> {
        debug!(key, "deleting domain");
        self.delete(&format!("keymaster/domains/{key}"), None).await
    }

    // ── Parameters ───────────────────────────────────────────────────

    /// `GET /keymaster/params`
    pub async fn list_params(&self) -> Result<Vec<ConfParam>, Error> {
        let raw: BTreeMap<String, Value> = self.get("keymaster/params").await?;
        Ok(raw
            .into_iter()
            .map(|(key, value)| param_from_json(key, &value))
            .collect())
    }

    /// `GET /keymaster/params/{key}`
    pub async fn read_param(&self, key: &str) -> Result<ConfParam, Error> {
        let value: Value = self.get(&format!("keymaster/params/{key}")).await?;
        Ok(param_from_json(key.to_owned(), &value))
    }

    /// Create or replace a parameter.
    ///
    /// `POST /keymaster/params/{key}`
    pub async fn set_param(&self, param: &ConfParam) -> Result<(), Error> {
        let key = param.key.as_deref().ok_or_else(|| {
            Error::Client(vec![ClientException {
                status: 400,
                kind: "RequiredValuesMissing".into(),
                elements: vec!["key".into()],
            }])
        })?;
        debug!(key, "setting parameter");
        self.post_empty(&format!("keymaster/params/{key}"), &param_to_json(param))
            .await
    }

    /// `DELETE /keymaster/params/{key}`
    pub async fn remove_param(&self, key: &str) -> Result<(), Error> {
        debug!(key, "removing parameter");
        self.delete(&format!("keymaster/params/{key}"), None).await
    }
}

/// Infer a typed parameter from its JSON value.
pub fn param_from_json(key: String, value: &Value) -> ConfParam {
    let (multivalue, items): (bool, Vec<&Value>) = match value {
        Value::Array(items) => (true, items.iter().collect()),
        Value::Null => (false, Vec::new()),
        other => (false, vec![other]),
    };
    let kind = items.first().map_or(AttrSchemaType::String, |v| match v {
        Value::Bool(_) => AttrSchemaType::Boolean,
        Value::Number(n) if n.is_i64() || n.is_u64() => AttrSchemaType::Long,
        Value::Number(_) => AttrSchemaType::Double,
        _ => AttrSchemaType::String,
    });
    let values = items
        .into_iter()
        .map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect();

    ConfParam {
        key: Some(key),
        kind,
        multivalue,
        values,
    }
}

/// Render a typed parameter as the JSON value the server stores.
///
/// Values that do not parse as the declared type are sent as strings and
/// left for the server to reject.
pub fn param_to_json(param: &ConfParam) -> Value {
    let convert = |raw: &String| -> Value {
        match param.kind {
            AttrSchemaType::Boolean => raw
                .parse::<bool>()
                .map_or_else(|_| Value::String(raw.clone()), Value::Bool),
            AttrSchemaType::Long => raw
                .parse::<i64>()
                .map_or_else(|_| Value::String(raw.clone()), Value::from),
            AttrSchemaType::Double => raw
                .parse::<f64>()
                .map_or_else(|_| Value::String(raw.clone()), Value::from),
            _ => Value::String(raw.clone()),
        }
    };

    if param.multivalue {
        Value::Array(param.values.iter().map(convert).collect())
    } else {
        param.values.first().map_or(Value::Null, convert)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn infers_types_from_json() {
        let p = param_from_json("password.cipher.algorithm".into(), &json!("SHA1"));
        assert_eq!(p.kind, AttrSchemaType::String);
        assert!(!p.multivalue);
        assert_eq!(p.values, vec!["SHA1"]);

        let p = param_from_json("token.length".into(), &json!(256));
        assert_eq!(p.kind, AttrSchemaType::Long);

        let p = param_from_json("notification.enabled".into(), &json!([true, false]));
        assert_eq!(p.kind, AttrSchemaType::Boolean);
        assert!(p.multivalue);
        assert_eq!(p.values, vec!["true", "false"]);
    }

    #[test]
    fn renders_typed_json() {
        let param = ConfParam {
            key: Some("jwt.lifetime.minutes".into()),
            kind: AttrSchemaType::Long,
            multivalue: false,
            values: vec!["120".into()],
        };
        assert_eq!(param_to_json(&param), json!(120));

        let param = ConfParam {
            key: Some("ratio".into()),
            kind: AttrSchemaType::Double,
            multivalue: true,
            values: vec!["0.5".into(), "oops".into()],
        };
        assert_eq!(param_to_json(&param), json!([0.5, "oops"]));
    }
}
