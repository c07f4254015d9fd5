//! Headless controller for the production-order screen

use chrono::{Local, NaiveDate};
use reqwest::StatusCode;
use tracing::{info, warn};

use super::board::SequencingBoard;
use super::types::{Priority, Product};
use super::SequencingClient;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// Transient message for the operator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub summary: String,
    pub detail: String,
}

impl Notice {
    fn success(detail: &str) -> Self {
        Self {
            level: NoticeLevel::Success,
            summary: "Success".to_string(),
            detail: detail.to_string(),
        }
    }

    fn error(detail: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            summary: "Error".to_string(),
            detail: detail.into(),
        }
    }
}

/// The production-order screen without its widgets
///
/// Every network action takes `&mut self`, so one view never has two
/// actions in flight. Failed actions raise an error notice and leave local
/// state as it was; retrying is up to the operator.
pub struct SequencingView {
    client: SequencingClient,
    board: SequencingBoard,
    notices: Vec<Notice>,
}

impl SequencingView {
    pub fn new(client: SequencingClient) -> Self {
        Self {
            client,
            board: SequencingBoard::default(),
            notices: Vec::new(),
        }
    }

    pub fn board(&self) -> &SequencingBoard {
        &self.board
    }

    /// Local edits (moves, priorities); none of them reach the server
    pub fn board_mut(&mut self) -> &mut SequencingBoard {
        &mut self.board
    }

    /// Replace the board with fresh server state; empty on failure
    pub async fn load(&mut self) -> Result<()> {
        match self.client.load().await {
            Ok(board) => {
                if !board.orphans().is_empty() {
                    self.notices.push(Notice::error(format!(
                        "{} production order(s) reference products that no longer exist",
                        board.orphans().len()
                    )));
                }
                self.board = board;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "failed to load production queue");
                self.board = SequencingBoard::default();
                self.notices.push(Notice::error(format!("Could not load production orders: {}", e)));
                Err(e)
            }
        }
    }

    /// Apply the lists produced by the transfer widget
    pub fn reorder(&mut self, source: Vec<Product>, target: Vec<Product>) -> Result<()> {
        self.board.reorder(source, target)
    }

    pub fn set_priority(&mut self, product_id: &str, priority: Priority) -> Result<()> {
        self.board.set_priority(product_id, priority)
    }

    /// Send the whole queue as one batch and adopt the ids the server assigned
    pub async fn save_sequence(&mut self) -> Result<()> {
        let batch = self.board.submission();

        match self.client.save(&batch).await {
            Ok(persisted) => {
                let merged = self.board.merge_persisted_ids(&persisted);
                let unsaved = self.board.entries().iter().filter(|e| !e.is_persisted()).count();
                if unsaved > 0 {
                    warn!(merged, unsaved, "server did not return ids for every queued product");
                }
                self.notices.push(Notice::success("Production order updated"));
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, entries = batch.len(), "failed to save production queue");
                self.notices.push(Notice::error(format!("Could not save production order: {}", e)));
                Err(e)
            }
        }
    }

    /// Finish one queued product, dated today unless `date` is given
    ///
    /// Independent of [`save_sequence`](Self::save_sequence), but the entry
    /// needs a server id, so it must have been saved at least once.
    pub async fn finish_entry(&mut self, product_id: &str, date: Option<NaiveDate>) -> Result<()> {
        let entry = self
            .board
            .entry_for(product_id)
            .ok_or_else(|| Error::UnknownProduct(product_id.to_string()))?;

        let Some(entry_id) = entry.id.clone() else {
            let e = Error::validation("save the production order before finishing this item");
            self.notices.push(Notice::error(e.to_string()));
            return Err(e);
        };

        let date = date.unwrap_or_else(|| Local::now().date_naive());

        let outcome = match self.client.finish(&entry_id, date).await {
            Ok(response) if response.success => Ok(response),
            Ok(_) => Err(Error::Api {
                status: StatusCode::OK,
                message: "server declined to finish the production order".to_string(),
            }),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(response) => {
                if let Some(echoed) = response.product_order_id.as_deref() {
                    if echoed != entry_id {
                        warn!(%entry_id, %echoed, "server confirmed a different production order");
                    }
                }
                match self.board.remove_finished(&entry_id) {
                    Some((_, product)) => {
                        info!(product_id = %product.id, %entry_id, %date, "finished production order");
                    }
                    None => warn!(%entry_id, "finished entry is no longer on the board"),
                }
                self.notices.push(Notice::success("Production order finished"));
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, entry_id = %entry_id, "failed to finish production order");
                self.notices.push(Notice::error(format!("Could not finish production order: {}", e)));
                Err(e)
            }
        }
    }

    /// Drain queued notices for display
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }
}
