// Schema endpoints
//
// One path per schema flavor: `/schemas/PLAIN`, `/schemas/DERIVED`,
// `/schemas/VIRTUAL`. The payload type selects the flavor.

use tracing::debug;

use crate::error::Error;
use crate::rest::client::RestClient;
use crate::rest::models::{SchemaPayload, SchemaType, Versioned};

impl RestClient {
    /// List schemas of the payload's flavor, optionally narrowed to
    /// any-type classes and a keyword.
    ///
    /// `GET /schemas/{type}?anyTypeClass=..&keyword=..`
    pub async fn list_schemas<T: SchemaPayload>(
        &self,
        any_type_classes: &[String],
        keyword: Option<&str>,
    ) -> Result<Vec<T>, Error> {
        let mut params: Vec<(&str, String)> = any_type_classes
            .iter()
            .map(|c| ("anyTypeClass", c.clone()))
            .collect();
        if let Some(keyword) = keyword {
            params.push(("keyword", keyword.to_owned()));
        }
        self.get_with_params(&format!("schemas/{}", T::TYPE), &params)
            .await
    }

    /// `GET /schemas/{type}/{key}`
    pub async fn read_schema<T: SchemaPayload>(&self, key: &str) -> Result<Versioned<T>, Error> {
        self.get_versioned(&format!("schemas/{}/{key}", T::TYPE))
            .await
    }

    /// `POST /schemas/{type}`; returns the created key.
    pub async fn create_schema<T: SchemaPayload>(&self, schema: &T) -> Result<Option<String>, Error> {
        debug!(kind = %T::TYPE, key = ?schema.key(), "creating schema");
        self.post_created(&format!("schemas/{}", T::TYPE), schema)
            .await
    }

    /// `PUT /schemas/{type}/{key}`
    pub async fn update_schema<T: SchemaPayload>(
        &self,
        key: &str,
        etag: Option<&str>,
        schema: &T,
    ) -> Result<(), Error> {
        debug!(kind = %T::TYPE, key, "updating schema");
        self.put_empty(&format!("schemas/{}/{key}", T::TYPE), etag, schema)
            .await
    }

    /// `DELETE /schemas/{type}/{key}`
    pub async fn delete_schema(&self, kind: SchemaType, key: &str) -> Result<(), Error> {
        debug!(%kind, key, "deleting schema");
        self.delete(&format!("schemas/{kind}/{key}"), None).await
    }
}
