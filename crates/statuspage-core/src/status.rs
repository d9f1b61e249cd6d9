//! Per-product status derived from the `current` section.

use crate::event::{Event, Status};
use serde::Serialize;
use std::collections::BTreeMap;

/// Current status of every product mentioned by a current event.
///
/// Never persisted; recomputed from the `current` section on each load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ServiceStatus(BTreeMap<String, Status>);

impl ServiceStatus {
    /// Status of `product`, `operational` when no current event names it.
    pub fn status_of(&self, product: &str) -> Status {
        self.0.get(product).copied().unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Status)> {
        self.0.iter().map(|(product, status)| (product.as_str(), *status))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Products whose derived status is not `operational`.
    pub fn affected(&self) -> impl Iterator<Item = (&str, Status)> {
        self.iter().filter(|(_, status)| *status != Status::Operational)
    }
}

/// Derive per-product status from the `current` section.
///
/// The section is stored newest first, so it is walked back to front and
/// each event overwrites what older events said: for a product named by
/// several events, the front-most (most recently inserted) one wins.
pub fn aggregate(current: &[Event]) -> ServiceStatus {
    let mut statuses = BTreeMap::new();
    for event in current.iter().rev() {
        for product in &event.products {
            statuses.insert(product.clone(), event.status());
        }
    }
    ServiceStatus(statuses)
}
