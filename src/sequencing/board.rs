//! Client-side state of the production queue
//!
//! The board splits the catalog into a pending pool and a sequenced list.
//! `entries` runs parallel to `sequenced`: `entries[i]` always belongs to
//! `sequenced[i]`. Every mutation goes through [`SequencingBoard::reorder`] or
//! one of the narrow in-place edits (priority, id merge, finish), none of
//! which talk to the server.

use std::collections::HashSet;

use tracing::{debug, warn};

use super::types::{
    Priority, Product, ProductOrderEntry, ProductOrderRecord, ProductStatus, SequenceSubmission,
};
use crate::error::{Error, Result};

/// Sequenced entries grouped by priority, each lane ascending by position
#[derive(Debug, Default, PartialEq, Eq)]
pub struct PriorityLanes<'a> {
    pub low: Vec<&'a ProductOrderEntry>,
    pub medium: Vec<&'a ProductOrderEntry>,
    pub high: Vec<&'a ProductOrderEntry>,
}

impl<'a> PriorityLanes<'a> {
    pub fn lane(&self, priority: Priority) -> &[&'a ProductOrderEntry] {
        match priority {
            Priority::Low => &self.low,
            Priority::Medium => &self.medium,
            Priority::High => &self.high,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SequencingBoard {
    pending: Vec<Product>,
    sequenced: Vec<Product>,
    entries: Vec<ProductOrderEntry>,
    orphans: Vec<ProductOrderEntry>,
}

impl SequencingBoard {
    /// Build the board from the fetched catalog and queue entries
    ///
    /// Catalog records win over the snapshots embedded in entries. Entries whose
    /// product is missing from the catalog, or that repeat a product already
    /// placed, are set aside as orphans instead of being shown.
    pub fn from_server(catalog: Vec<Product>, mut records: Vec<ProductOrderRecord>) -> Self {
        let mut available: Vec<Product> = catalog
            .into_iter()
            .filter(|product| product.status.is_sequenceable())
            .collect();

        records.sort_by_key(|record| record.sequence_index);

        let mut board = SequencingBoard::default();

        for record in records {
            let entry = record.into_entry();

            match available.iter().position(|p| p.id == entry.product_id) {
                Some(index) => {
                    let mut product = available.remove(index);
                    product.status = ProductStatus::InProgress;
                    board.sequenced.push(product);
                    board.entries.push(entry);
                }
                None => {
                    warn!(
                        product_id = %entry.product_id,
                        entry_id = ?entry.id,
                        "queue entry has no matching product, dropping it"
                    );
                    board.orphans.push(entry);
                }
            }
        }

        board.pending = available;
        debug!(
            pending = board.pending.len(),
            sequenced = board.sequenced.len(),
            orphans = board.orphans.len(),
            "sequencing board loaded"
        );
        board
    }

    /// Products not yet queued
    pub fn pending(&self) -> &[Product] {
        &self.pending
    }

    /// Queued products in on-screen order
    pub fn sequenced(&self) -> &[Product] {
        &self.sequenced
    }

    /// Queue entries in on-screen order
    pub fn entries(&self) -> &[ProductOrderEntry] {
        &self.entries
    }

    /// Entries dropped while loading because their product was gone or repeated
    pub fn orphans(&self) -> &[ProductOrderEntry] {
        &self.orphans
    }

    /// Entries joined with their products for display
    pub fn sequenced_items(&self) -> impl Iterator<Item = (&ProductOrderEntry, &Product)> {
        self.entries.iter().zip(self.sequenced.iter())
    }

    pub fn entry_for(&self, product_id: &str) -> Option<&ProductOrderEntry> {
        self.entries.iter().find(|entry| entry.product_id == product_id)
    }

    pub fn product(&self, product_id: &str) -> Option<&Product> {
        self.pending
            .iter()
            .chain(self.sequenced.iter())
            .find(|product| product.id == product_id)
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty() && self.sequenced.is_empty()
    }

    /// Replace both partitions with the lists produced by the transfer widget
    ///
    /// Source items become pending, target items in-progress. Each target item
    /// keeps the priority and persisted id of its previous entry (low and
    /// unsaved when it had none) and takes its position as sequence index.
    /// The lists must hold exactly the products already on the board.
    pub fn reorder(&mut self, mut source: Vec<Product>, mut target: Vec<Product>) -> Result<()> {
        self.check_conservation(&source, &target)?;

        for product in source.iter_mut() {
            product.status = ProductStatus::Pending;
        }

        let entries: Vec<ProductOrderEntry> = target
            .iter_mut()
            .enumerate()
            .map(|(index, product)| {
                product.status = ProductStatus::InProgress;
                let previous = self.entry_for(&product.id);
                ProductOrderEntry {
                    id: previous.and_then(|entry| entry.id.clone()),
                    product_id: product.id.clone(),
                    priority: previous.map(|entry| entry.priority).unwrap_or_default(),
                    sequence_index: index,
                }
            })
            .collect();

        self.pending = source;
        self.sequenced = target;
        self.entries = entries;
        Ok(())
    }

    /// Move a pending product to the end of the queue
    pub fn enqueue(&mut self, product_id: &str) -> Result<()> {
        let position = self.sequenced.len();
        self.enqueue_at(product_id, position)
    }

    /// Move a pending product into the queue at `position` (clamped)
    pub fn enqueue_at(&mut self, product_id: &str, position: usize) -> Result<()> {
        let (mut source, mut target) = self.snapshot();
        let index = source
            .iter()
            .position(|p| p.id == product_id)
            .ok_or_else(|| Error::UnknownProduct(product_id.to_string()))?;

        let product = source.remove(index);
        target.insert(position.min(target.len()), product);
        self.reorder(source, target)
    }

    /// Move a queued product back to the end of the pending pool
    pub fn dequeue(&mut self, product_id: &str) -> Result<()> {
        let (mut source, mut target) = self.snapshot();
        let index = target
            .iter()
            .position(|p| p.id == product_id)
            .ok_or_else(|| Error::UnknownProduct(product_id.to_string()))?;

        source.push(target.remove(index));
        self.reorder(source, target)
    }

    /// Move a queued product to `position` (clamped) within the queue
    pub fn move_within(&mut self, product_id: &str, position: usize) -> Result<()> {
        let (source, mut target) = self.snapshot();
        let index = target
            .iter()
            .position(|p| p.id == product_id)
            .ok_or_else(|| Error::UnknownProduct(product_id.to_string()))?;

        let product = target.remove(index);
        target.insert(position.min(target.len()), product);
        self.reorder(source, target)
    }

    /// Append every pending product to the queue, keeping pool order
    pub fn enqueue_all(&mut self) -> Result<()> {
        let (source, mut target) = self.snapshot();
        target.extend(source);
        self.reorder(Vec::new(), target)
    }

    /// Return every queued product to the pending pool
    pub fn dequeue_all(&mut self) -> Result<()> {
        let (mut source, target) = self.snapshot();
        source.extend(target);
        self.reorder(source, Vec::new())
    }

    /// Change one entry's priority; positions are left alone
    pub fn set_priority(&mut self, product_id: &str, priority: Priority) -> Result<()> {
        let entry = self
            .entries
            .iter_mut()
            .find(|entry| entry.product_id == product_id)
            .ok_or_else(|| Error::UnknownProduct(product_id.to_string()))?;
        entry.priority = priority;
        Ok(())
    }

    /// Priority lanes for display
    pub fn lanes(&self) -> PriorityLanes<'_> {
        let mut ordered: Vec<&ProductOrderEntry> = self.entries.iter().collect();
        ordered.sort_by_key(|entry| entry.sequence_index);

        let mut lanes = PriorityLanes::default();
        for entry in ordered {
            match entry.priority {
                Priority::Low => lanes.low.push(entry),
                Priority::Medium => lanes.medium.push(entry),
                Priority::High => lanes.high.push(entry),
            }
        }
        lanes
    }

    /// Batch body for saving the queue
    ///
    /// Positions are taken from on-screen order, so gaps left by finished
    /// entries or by the server are closed in what gets sent.
    pub fn submission(&self) -> Vec<SequenceSubmission> {
        self.entries
            .iter()
            .enumerate()
            .map(|(position, entry)| SequenceSubmission {
                sequence_index: position,
                ..SequenceSubmission::from(entry)
            })
            .collect()
    }

    /// Copy server-assigned ids onto entries, matching by product id
    ///
    /// Returns how many entries received an id.
    pub fn merge_persisted_ids(&mut self, persisted: &[ProductOrderRecord]) -> usize {
        let mut merged = 0;
        for entry in self.entries.iter_mut() {
            let saved = persisted
                .iter()
                .find(|record| record.product_id == entry.product_id)
                .and_then(|record| record.id.as_ref())
                .filter(|id| !id.is_empty());

            if let Some(id) = saved {
                entry.id = Some(id.clone());
                merged += 1;
            }
        }
        merged
    }

    /// Drop a finished entry and its product from the queue
    ///
    /// The remaining entries keep their sequence indexes.
    pub fn remove_finished(&mut self, entry_id: &str) -> Option<(ProductOrderEntry, Product)> {
        let index = self
            .entries
            .iter()
            .position(|entry| entry.id.as_deref() == Some(entry_id))?;

        let entry = self.entries.remove(index);
        let mut product = self.sequenced.remove(index);
        product.status = ProductStatus::Finished;
        Some((entry, product))
    }

    fn snapshot(&self) -> (Vec<Product>, Vec<Product>) {
        (self.pending.clone(), self.sequenced.clone())
    }

    fn check_conservation(&self, source: &[Product], target: &[Product]) -> Result<()> {
        let before: HashSet<&str> = self
            .pending
            .iter()
            .chain(self.sequenced.iter())
            .map(|p| p.id.as_str())
            .collect();

        let mut after: HashSet<&str> = HashSet::with_capacity(source.len() + target.len());
        for product in source.iter().chain(target.iter()) {
            if !after.insert(product.id.as_str()) {
                return Err(Error::validation(format!(
                    "product {} appears more than once",
                    product.id
                )));
            }
        }

        if before != after {
            let missing = before.difference(&after).count();
            let added = after.difference(&before).count();
            return Err(Error::validation(format!(
                "reorder must keep the same products ({} missing, {} unknown)",
                missing, added
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: &str) -> Product {
        Product::new(id, &format!("product {}", id), 1.0, 10.0)
    }

    fn record(id: Option<&str>, product_id: &str, priority: Priority, index: usize) -> ProductOrderRecord {
        ProductOrderRecord {
            id: id.map(str::to_string),
            product_id: product_id.to_string(),
            product: None,
            priority,
            sequence_index: index,
        }
    }

    fn ids(products: &[Product]) -> Vec<&str> {
        products.iter().map(|p| p.id.as_str()).collect()
    }

    fn all_ids(board: &SequencingBoard) -> HashSet<String> {
        board
            .pending()
            .iter()
            .chain(board.sequenced())
            .map(|p| p.id.clone())
            .collect()
    }

    fn assert_dense(board: &SequencingBoard) {
        let indexes: Vec<usize> = board.entries().iter().map(|e| e.sequence_index).collect();
        let expected: Vec<usize> = (0..board.entries().len()).collect();
        assert_eq!(indexes, expected);
    }

    #[test]
    fn test_load_without_entries_keeps_everything_pending() {
        let board = SequencingBoard::from_server(
            vec![product("A"), product("B"), product("C")],
            Vec::new(),
        );

        assert_eq!(ids(board.pending()), vec!["A", "B", "C"]);
        assert!(board.sequenced().is_empty());
    }

    #[test]
    fn test_move_b_then_a() {
        let mut board = SequencingBoard::from_server(
            vec![product("A"), product("B"), product("C")],
            Vec::new(),
        );

        board.enqueue("B").unwrap();
        board.enqueue("A").unwrap();

        assert_eq!(board.entry_for("B").unwrap().sequence_index, 0);
        assert_eq!(board.entry_for("A").unwrap().sequence_index, 1);
        assert_eq!(board.entry_for("B").unwrap().priority, Priority::Low);
        assert_eq!(board.entry_for("A").unwrap().priority, Priority::Low);
        assert_eq!(ids(board.pending()), vec!["C"]);
        assert!(board
            .sequenced()
            .iter()
            .all(|p| p.status == ProductStatus::InProgress));
    }

    #[test]
    fn test_load_sorts_entries_and_uses_catalog_record() {
        let mut fresh = product("B");
        fresh.unit_price = 99.0;

        let mut stale = product("B");
        stale.unit_price = 1.0;
        let mut embedded = record(Some("o2"), "B", Priority::High, 0);
        embedded.product = Some(stale);

        let board = SequencingBoard::from_server(
            vec![product("A"), fresh, product("C")],
            vec![record(Some("o1"), "C", Priority::Medium, 1), embedded],
        );

        assert_eq!(ids(board.sequenced()), vec!["B", "C"]);
        assert_eq!(board.sequenced()[0].unit_price, 99.0);
        assert_eq!(ids(board.pending()), vec!["A"]);
        assert!(board.orphans().is_empty());
    }

    #[test]
    fn test_orphans_and_duplicates_are_set_aside() {
        let board = SequencingBoard::from_server(
            vec![product("A")],
            vec![
                record(Some("o1"), "A", Priority::Low, 0),
                record(Some("o2"), "gone", Priority::High, 1),
                record(Some("o3"), "A", Priority::Medium, 2),
            ],
        );

        assert_eq!(ids(board.sequenced()), vec!["A"]);
        assert_eq!(board.entries().len(), 1);
        let orphan_ids: Vec<_> = board.orphans().iter().map(|e| e.id.as_deref()).collect();
        assert_eq!(orphan_ids, vec![Some("o2"), Some("o3")]);
    }

    #[test]
    fn test_finished_products_are_not_loaded() {
        let mut done = product("D");
        done.status = ProductStatus::Finished;

        let board = SequencingBoard::from_server(
            vec![product("A"), done],
            vec![record(Some("o9"), "D", Priority::Low, 0)],
        );

        assert_eq!(ids(board.pending()), vec!["A"]);
        assert!(board.sequenced().is_empty());
        assert_eq!(board.orphans().len(), 1);
    }

    #[test]
    fn test_priority_survives_reorder() {
        let mut board = SequencingBoard::from_server(
            vec![product("A"), product("B"), product("C")],
            vec![
                record(Some("o1"), "A", Priority::High, 0),
                record(Some("o2"), "B", Priority::Medium, 1),
            ],
        );

        board.move_within("B", 0).unwrap();
        board.enqueue_at("C", 1).unwrap();

        assert_eq!(ids(board.sequenced()), vec!["B", "C", "A"]);
        assert_eq!(board.entry_for("A").unwrap().priority, Priority::High);
        assert_eq!(board.entry_for("B").unwrap().priority, Priority::Medium);
        assert_eq!(board.entry_for("C").unwrap().priority, Priority::Low);
        assert_eq!(board.entry_for("A").unwrap().id.as_deref(), Some("o1"));
        assert_dense(&board);
    }

    #[test]
    fn test_reorder_conserves_products_across_moves() {
        let mut board = SequencingBoard::from_server(
            (0..6).map(|i| product(&i.to_string())).collect(),
            Vec::new(),
        );
        let before = all_ids(&board);

        let moves: [(&str, bool); 8] = [
            ("3", true),
            ("0", true),
            ("5", true),
            ("3", false),
            ("1", true),
            ("0", false),
            ("4", true),
            ("2", true),
        ];
        for (id, into_queue) in moves {
            if into_queue {
                board.enqueue(id).unwrap();
            } else {
                board.dequeue(id).unwrap();
            }

            assert_eq!(all_ids(&board), before);
            assert_eq!(board.pending().len() + board.sequenced().len(), before.len());
            assert_dense(&board);
        }

        assert_eq!(ids(board.sequenced()), vec!["5", "1", "4", "2"]);
        assert!(board
            .pending()
            .iter()
            .all(|p| p.status == ProductStatus::Pending));
    }

    #[test]
    fn test_reorder_rejects_lost_or_duplicated_products() {
        let mut board =
            SequencingBoard::from_server(vec![product("A"), product("B")], Vec::new());

        let dropped = board.reorder(vec![product("A")], Vec::new());
        assert!(matches!(dropped, Err(Error::Validation(_))));

        let duplicated = board.reorder(vec![product("A"), product("B")], vec![product("B")]);
        assert!(matches!(duplicated, Err(Error::Validation(_))));

        let foreign = board.reorder(vec![product("A")], vec![product("Z")]);
        assert!(matches!(foreign, Err(Error::Validation(_))));

        assert_eq!(ids(board.pending()), vec!["A", "B"]);
    }

    #[test]
    fn test_unknown_product_moves_fail() {
        let mut board = SequencingBoard::from_server(vec![product("A")], Vec::new());
        assert!(matches!(board.enqueue("Z"), Err(Error::UnknownProduct(_))));
        assert!(matches!(board.dequeue("A"), Err(Error::UnknownProduct(_))));
        assert!(matches!(
            board.set_priority("A", Priority::High),
            Err(Error::UnknownProduct(_))
        ));
    }

    #[test]
    fn test_set_priority_touches_one_entry() {
        let mut board = SequencingBoard::from_server(
            vec![product("A"), product("B")],
            Vec::new(),
        );
        board.enqueue_all().unwrap();

        board.set_priority("B", Priority::High).unwrap();

        assert_eq!(board.entry_for("A").unwrap().priority, Priority::Low);
        assert_eq!(board.entry_for("B").unwrap().priority, Priority::High);
        assert_dense(&board);
    }

    #[test]
    fn test_lanes_are_ordered_by_position() {
        let mut board = SequencingBoard::from_server(
            vec![product("A"), product("B"), product("C"), product("D")],
            vec![
                record(Some("1"), "A", Priority::High, 3),
                record(Some("2"), "B", Priority::Low, 0),
                record(Some("3"), "C", Priority::High, 1),
                record(Some("4"), "D", Priority::Low, 2),
            ],
        );

        let lanes = board.lanes();
        let high: Vec<_> = lanes.high.iter().map(|e| e.product_id.as_str()).collect();
        let low: Vec<_> = lanes.lane(Priority::Low).iter().map(|e| e.product_id.as_str()).collect();
        assert_eq!(high, vec!["C", "A"]);
        assert_eq!(low, vec!["B", "D"]);
        assert!(lanes.medium.is_empty());

        board.dequeue_all().unwrap();
        assert!(board.lanes().high.is_empty());
    }

    #[test]
    fn test_merge_ids_by_product() {
        let mut board = SequencingBoard::from_server(
            vec![product("A"), product("B")],
            Vec::new(),
        );
        board.enqueue("A").unwrap();
        board.enqueue("B").unwrap();

        let merged = board.merge_persisted_ids(&[
            record(Some("o-b"), "B", Priority::Low, 1),
            record(None, "A", Priority::Low, 0),
        ]);

        assert_eq!(merged, 1);
        assert_eq!(board.entry_for("B").unwrap().id.as_deref(), Some("o-b"));
        assert_eq!(board.entry_for("A").unwrap().id, None);
    }

    #[test]
    fn test_remove_finished_keeps_other_indexes() {
        let mut board = SequencingBoard::from_server(
            vec![product("A"), product("B"), product("C")],
            vec![
                record(Some("o1"), "A", Priority::Low, 0),
                record(Some("o2"), "B", Priority::High, 1),
                record(Some("o3"), "C", Priority::Low, 2),
            ],
        );

        let (entry, finished) = board.remove_finished("o2").unwrap();
        assert_eq!(entry.product_id, "B");
        assert_eq!(finished.status, ProductStatus::Finished);

        let remaining: Vec<_> = board
            .entries()
            .iter()
            .map(|e| (e.product_id.as_str(), e.sequence_index))
            .collect();
        assert_eq!(remaining, vec![("A", 0), ("C", 2)]);
        assert!(board.product("B").is_none());
        assert!(board.remove_finished("o2").is_none());
    }

    #[test]
    fn test_submission_matches_entries() {
        let mut board = SequencingBoard::from_server(vec![product("A"), product("B")], Vec::new());
        board.enqueue("B").unwrap();
        board.enqueue("A").unwrap();
        board.set_priority("A", Priority::Medium).unwrap();

        let batch = board.submission();
        assert_eq!(
            batch,
            vec![
                SequenceSubmission {
                    product_id: "B".to_string(),
                    priority: Priority::Low,
                    sequence_index: 0
                },
                SequenceSubmission {
                    product_id: "A".to_string(),
                    priority: Priority::Medium,
                    sequence_index: 1
                },
            ]
        );
    }

    #[test]
    fn test_submission_closes_gaps() {
        let mut board = SequencingBoard::from_server(
            vec![product("A"), product("B"), product("C")],
            vec![
                record(Some("o1"), "A", Priority::Low, 0),
                record(Some("o2"), "B", Priority::Low, 1),
                record(Some("o3"), "C", Priority::Medium, 2),
            ],
        );
        board.remove_finished("o2").unwrap();

        let batch = board.submission();
        let positions: Vec<(&str, usize)> = batch
            .iter()
            .map(|s| (s.product_id.as_str(), s.sequence_index))
            .collect();
        assert_eq!(positions, vec![("A", 0), ("C", 1)]);
        assert_eq!(board.entry_for("C").unwrap().sequence_index, 2);
    }
}
