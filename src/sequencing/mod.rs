//! Production-order sequencing
//!
//! [`SequencingBoard`] holds the pending/sequenced partitions and does all
//! reconciliation locally. [`SequencingClient`] is the REST surface for the
//! queue, and [`SequencingView`] ties the two together for a UI shell.

mod board;
mod types;
mod view;

use std::collections::HashSet;

use chrono::NaiveDate;
use tracing::info;

use crate::error::{Error, Result};
use crate::fetch::Api;

pub use board::*;
pub use types::*;
pub use view::*;

const PRODUCTS_PATH: &str = "/products";
const ORDERS_PATH: &str = "/product-orders";

/// Client for the production queue endpoints
#[derive(Clone)]
pub struct SequencingClient {
    api: Api,
}

impl SequencingClient {
    pub(crate) fn new(api: Api) -> Self {
        Self { api }
    }

    /// Products that are pending or in progress
    pub async fn fetch_catalog(&self) -> Result<Vec<Product>> {
        self.api
            .get(PRODUCTS_PATH)
            .query("status", "pending,inProgress")
            .execute()
            .await
    }

    /// The persisted queue entries
    pub async fn fetch_entries(&self) -> Result<Vec<ProductOrderRecord>> {
        self.api.get(ORDERS_PATH).execute().await
    }

    /// Fetch catalog and entries together and build a board
    ///
    /// Either request failing fails the whole load; nothing half-received is kept.
    pub async fn load(&self) -> Result<SequencingBoard> {
        let (catalog, records) = tokio::try_join!(self.fetch_catalog(), self.fetch_entries())?;
        Ok(SequencingBoard::from_server(catalog, records))
    }

    /// Upsert the whole queue in one batch
    pub async fn save(&self, entries: &[SequenceSubmission]) -> Result<Vec<ProductOrderRecord>> {
        check_batch(entries)?;

        let persisted: Vec<ProductOrderRecord> = self
            .api
            .post(ORDERS_PATH)
            .json(&SequenceBatch { entries })?
            .execute()
            .await?;

        info!(submitted = entries.len(), persisted = persisted.len(), "saved production queue");
        Ok(persisted)
    }

    /// Mark one queue entry's product as finished on `date`
    pub async fn finish(&self, entry_id: &str, date: NaiveDate) -> Result<FinishResponse> {
        if entry_id.is_empty() || entry_id.contains('/') {
            return Err(Error::validation(format!("invalid production order id: {:?}", entry_id)));
        }

        let path = format!("{}/{}/finish", ORDERS_PATH, entry_id);
        self.api
            .put(&path)
            .json(&FinishRequest { date })?
            .execute()
            .await
    }
}

/// Positions in a batch must be unique and run from 0 without gaps
fn check_batch(entries: &[SequenceSubmission]) -> Result<()> {
    let mut products = HashSet::with_capacity(entries.len());
    let mut seen = vec![false; entries.len()];

    for entry in entries {
        if !products.insert(entry.product_id.as_str()) {
            return Err(Error::validation(format!(
                "product {} is queued twice",
                entry.product_id
            )));
        }
        match seen.get_mut(entry.sequence_index) {
            Some(slot) if !*slot => *slot = true,
            _ => {
                return Err(Error::validation(format!(
                    "sequence index {} is out of range or repeated",
                    entry.sequence_index
                )))
            }
        }
    }
    Ok(())
}
