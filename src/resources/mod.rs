//! Generic typed CRUD over the API's resource collections

mod types;

use std::marker::PhantomData;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::fetch::Api;

pub use types::*;

/// A record stored under one collection path
pub trait Resource: Serialize + DeserializeOwned + Send + Sync {
    /// Collection path, e.g. `/customers`
    const PATH: &'static str;

    /// Server id; `None` until created
    fn id(&self) -> Option<&str>;
}

#[derive(Debug, Serialize)]
struct DeleteRequest<'a> {
    ids: &'a [String],
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeleteReply {
    #[serde(default)]
    ids_with_error: Vec<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Result of a bulk delete
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteOutcome {
    /// Ids that are gone
    pub deleted: Vec<String>,
    /// Ids the server refused to delete
    pub failed: Vec<String>,
    /// Server explanation for the failures
    pub error: Option<String>,
}

impl DeleteOutcome {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.error.is_none()
    }
}

/// CRUD client for one resource type
pub struct ResourceClient<T> {
    api: Api,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for ResourceClient<T> {
    fn clone(&self) -> Self {
        Self {
            api: self.api.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: Resource> ResourceClient<T> {
    pub(crate) fn new(api: Api) -> Self {
        Self {
            api,
            _marker: PhantomData,
        }
    }

    /// Fetch the whole collection
    pub async fn list(&self) -> Result<Vec<T>> {
        self.api.get(T::PATH).execute().await
    }

    /// Fetch one record
    pub async fn get(&self, id: &str) -> Result<T> {
        self.api.get(&item_path::<T>(id)?).execute().await
    }

    /// Create a record; the server's copy (with its id) is returned
    pub async fn create(&self, item: &T) -> Result<T> {
        let created: T = self.api.post(T::PATH).json(item)?.execute().await?;
        info!(path = T::PATH, id = ?created.id(), "created record");
        Ok(created)
    }

    /// Replace an existing record
    pub async fn update(&self, item: &T) -> Result<T> {
        let id = item
            .id()
            .ok_or_else(|| Error::validation("cannot update a record without an id"))?;

        self.api.put(&item_path::<T>(id)?).json(item)?.execute().await
    }

    /// Delete several records at once
    pub async fn delete(&self, ids: &[String]) -> Result<DeleteOutcome> {
        if ids.is_empty() {
            return Err(Error::validation("select at least one record to delete"));
        }

        let reply: DeleteReply = self
            .api
            .delete(T::PATH)
            .json(&DeleteRequest { ids })?
            .execute()
            .await?;

        let deleted: Vec<String> = ids
            .iter()
            .filter(|id| !reply.ids_with_error.contains(*id))
            .cloned()
            .collect();

        if !reply.ids_with_error.is_empty() {
            warn!(path = T::PATH, failed = ?reply.ids_with_error, error = ?reply.error, "some records were not deleted");
        }

        Ok(DeleteOutcome {
            deleted,
            failed: reply.ids_with_error,
            error: reply.error.filter(|e| !e.is_empty()),
        })
    }
}

fn item_path<T: Resource>(id: &str) -> Result<String> {
    if id.is_empty() || id.contains('/') {
        return Err(Error::validation(format!("invalid record id: {:?}", id)));
    }
    Ok(format!("{}/{}", T::PATH, id))
}
