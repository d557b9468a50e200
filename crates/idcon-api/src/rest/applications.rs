// Application endpoints
//
// Privileges are owned by their application and written along with it.

use tracing::debug;

use crate::error::Error;
use crate::rest::client::RestClient;
use crate::rest::models::{Application, Privilege, Versioned};

impl RestClient {
    /// `GET /applications`
    pub async fn list_applications(&self) -> Result<Vec<Application>, Error> {
        self.get("applications").await
    }

    /// `GET /applications/{key}`
    pub async fn read_application(&self, key: &str) -> Result<Versioned<Application>, Error> {
        self.get_versioned(&format!("applications/{key}")).await
    }

    /// `GET /applications/privileges/{key}`
    pub async fn read_privilege(&self, key: &str) -> Result<Privilege, Error> {
        self.get(&format!("applications/privileges/{key}")).await
    }

    /// `POST /applications`; returns the created key.
    pub async fn create_application(&self, app: &Application) -> Result<Option<String>, Error> {
        debug!(key = ?app.key, "creating application");
        self.post_created("applications", app).await
    }

    /// `PUT /applications/{key}`
    pub async fn update_application(
        &self,
        key: &str,
        etag: Option<&str>,
        app: &Application,
    ) -> Result<(), Error> {
        debug!(key, "updating application");
        self.put_empty(&format!("applications/{key}"), etag, app)
            .await
    }

    /// `DELETE /applications/{key}`
    pub async fn delete_application(&self, key: &str) -> Result<(), Error> {
        debug!(key, "deleting application");
        self.delete(&format!("applications/{key}"), None).await
    }
}
