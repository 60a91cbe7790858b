// Copyright (c) 2025 - Cowboy AI, Inc.
//! Per-item results for batch operations
//!
//! Batches run item by item and stop at the first failure. Items completed
//! before the failure stay in place; items after it are reported as skipped.

/// Result of a single batch item
#[derive(Debug)]
pub enum ItemOutcome<T, E> {
    Completed(T),
    Failed(E),
    Skipped,
}

impl<T, E> ItemOutcome<T, E> {
    pub fn is_completed(&self) -> bool {
        matches!(self, ItemOutcome::Completed(_))
    }
}

/// Ordered outcomes of a batch, one per input item
#[derive(Debug)]
pub struct BatchOutcome<T, E> {
    items: Vec<ItemOutcome<T, E>>,
}

impl<T, E> BatchOutcome<T, E> {
    /// Run `items` through `step` until the first failure
    pub async fn run<I, F, Fut>(items: I, mut step: F) -> Self
    where
        I: IntoIterator,
        F: FnMut(I::Item) -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
    {
        let mut outcomes = Vec::new();
        let mut failed = false;

        for item in items {
            if failed {
                outcomes.push(ItemOutcome::Skipped);
                continue;
            }
            match step(item).await {
                Ok(value) => outcomes.push(ItemOutcome::Completed(value)),
                Err(error) => {
                    failed = true;
                    outcomes.push(ItemOutcome::Failed(error));
                }
            }
        }

        Self { items: outcomes }
    }

    pub fn items(&self) -> &[ItemOutcome<T, E>] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// True when every item completed
    pub fn is_complete(&self) -> bool {
        self.items.iter().all(ItemOutcome::is_completed)
    }

    pub fn completed(&self) -> impl Iterator<Item = &T> {
        self.items.iter().filter_map(|item| match item {
            ItemOutcome::Completed(value) => Some(value),
            _ => None,
        })
    }

    /// The error that stopped the batch, with its index
    pub fn failure(&self) -> Option<(usize, &E)> {
        self.items
            .iter()
            .enumerate()
            .find_map(|(index, item)| match item {
                ItemOutcome::Failed(error) => Some((index, error)),
                _ => None,
            })
    }

    /// Collapse into the values of all items or the first error
    pub fn into_result(self) -> Result<Vec<T>, E> {
        let mut values = Vec::with_capacity(self.items.len());
        for item in self.items {
            match item {
                ItemOutcome::Completed(value) => values.push(value),
                ItemOutcome::Failed(error) => return Err(error),
                ItemOutcome::Skipped => {}
            }
        }
        Ok(values)
    }
}
