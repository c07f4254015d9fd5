//! Types for products and the production queue

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Lifecycle of a product order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProductStatus {
    #[default]
    Pending,
    InProgress,
    Finished,
    Canceled,
}

impl ProductStatus {
    /// Statuses that may appear on the sequencing board
    pub fn is_sequenceable(&self) -> bool {
        matches!(self, ProductStatus::Pending | ProductStatus::InProgress)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProductStatus::Pending => "pending",
            ProductStatus::InProgress => "inProgress",
            ProductStatus::Finished => "finished",
            ProductStatus::Canceled => "canceled",
        }
    }
}

/// Production priority of a sequenced product
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[default]
    Low,
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    /// Short code shown on the tri-state toggle
    pub fn code(&self) -> &'static str {
        match self {
            Priority::Low => "B",
            Priority::Medium => "M",
            Priority::High => "A",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Priority::ALL.into_iter().find(|p| p.code() == code)
    }
}

/// A product order as served by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    #[serde(alias = "idCustomer", default)]
    pub customer_id: String,
    #[serde(default)]
    pub reference: String,
    #[serde(alias = "of", default)]
    pub production_order_code: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub quantity: f64,
    #[serde(alias = "unitaryValue", default)]
    pub unit_price: f64,
    #[serde(default)]
    pub status: ProductStatus,
    /// Data URL or bare base64 payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, with = "crate::dates::lenient_option")]
    pub completion_date: Option<NaiveDate>,
}

impl Product {
    pub fn new(id: &str, description: &str, quantity: f64, unit_price: f64) -> Self {
        Self {
            id: id.to_string(),
            customer_id: String::new(),
            reference: String::new(),
            production_order_code: String::new(),
            description: description.to_string(),
            quantity,
            unit_price,
            status: ProductStatus::Pending,
            image: None,
            completion_date: None,
        }
    }

    /// Total value of the order; always derived, never stored
    pub fn amount(&self) -> f64 {
        self.quantity * self.unit_price
    }

    /// Decoded image bytes, if an image is attached and well formed
    pub fn image_bytes(&self) -> Option<Vec<u8>> {
        let raw = self.image.as_deref()?.trim();
        if raw.is_empty() {
            return None;
        }
        let payload = match raw.split_once(";base64,") {
            Some((_, payload)) => payload,
            None => raw,
        };
        STANDARD.decode(payload).ok()
    }
}

/// One product's place in the production queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductOrderEntry {
    /// Absent until the server has persisted the entry
    pub id: Option<String>,
    pub product_id: String,
    pub priority: Priority,
    pub sequence_index: usize,
}

impl ProductOrderEntry {
    pub fn new(product_id: &str, priority: Priority, sequence_index: usize) -> Self {
        Self {
            id: None,
            product_id: product_id.to_string(),
            priority,
            sequence_index,
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }
}

/// A queue entry as served by the API, with the server's product snapshot
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductOrderRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(alias = "idProduct")]
    pub product_id: String,
    #[serde(default)]
    pub product: Option<Product>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(alias = "order", default)]
    pub sequence_index: usize,
}

impl ProductOrderRecord {
    /// Drop the embedded product; entries only keep the id
    pub fn into_entry(self) -> ProductOrderEntry {
        ProductOrderEntry {
            id: self.id.filter(|id| !id.is_empty()),
            product_id: self.product_id,
            priority: self.priority,
            sequence_index: self.sequence_index,
        }
    }
}

/// One element of the batch upsert body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SequenceSubmission {
    pub product_id: String,
    pub priority: Priority,
    pub sequence_index: usize,
}

impl From<&ProductOrderEntry> for SequenceSubmission {
    fn from(entry: &ProductOrderEntry) -> Self {
        Self {
            product_id: entry.product_id.clone(),
            priority: entry.priority,
            sequence_index: entry.sequence_index,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct SequenceBatch<'a> {
    pub entries: &'a [SequenceSubmission],
}

#[derive(Debug, Serialize)]
pub(crate) struct FinishRequest {
    #[serde(with = "crate::dates::lenient")]
    pub date: NaiveDate,
}

/// Reply to finishing one queue entry
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinishResponse {
    pub success: bool,
    #[serde(alias = "productOrder", default)]
    pub product_order_id: Option<String>,
}
