//! State machines for the long-lived objects a scenario opens.
//!
//! Orders: `NoOrder -> Pending -> (Filled | Cancelled)`.
//! Leases: `NoLease -> Pending -> Cancelled`.

use std::{collections::HashMap, fmt};

use crate::types::AssetPair;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderState {
    NoOrder,
    Pending,
    Filled,
    Cancelled,
}

impl OrderState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderState::Filled | OrderState::Cancelled)
    }
}

#[derive(Debug, Default)]
pub struct OrderTracker {
    orders: HashMap<String, (AssetPair, OrderState)>,
}

impl OrderTracker {
    pub fn state(&self, order_id: &str) -> OrderState {
        self.orders.get(order_id).map_or(OrderState::NoOrder, |(_, state)| *state)
    }

    pub fn placed(&mut self, order_id: &str, pair: &AssetPair) {
        self.orders.insert(order_id.to_string(), (pair.clone(), OrderState::Pending));
    }

    /// Applies a cancel-all on `pair`. Ids the matcher reported become
    /// Cancelled; pending ids that are neither reported nor still open were
    /// matched in the meantime and become Filled.
    pub fn release(&mut self, pair: &AssetPair, reported: &[String], still_open: &[String]) {
        for (id, (order_pair, state)) in self.orders.iter_mut() {
            if order_pair != pair || *state != OrderState::Pending {
                continue;
            }
            if reported.contains(id) {
                *state = OrderState::Cancelled;
            } else if !still_open.contains(id) {
                *state = OrderState::Filled;
            }
        }
    }

    pub fn pending(&self) -> Vec<(String, AssetPair)> {
        let mut pending: Vec<_> = self
            .orders
            .iter()
            .filter(|(_, (_, state))| *state == OrderState::Pending)
            .map(|(id, (pair, _))| (id.clone(), pair.clone()))
            .collect();
        pending.sort_by(|a, b| a.0.cmp(&b.0));
        pending
    }

    pub fn pending_pairs(&self) -> Vec<AssetPair> {
        let mut pairs: Vec<AssetPair> = vec![];
        for (_, pair) in self.pending() {
            if !pairs.contains(&pair) {
                pairs.push(pair);
            }
        }
        pairs
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaseState {
    NoLease,
    Pending,
    Cancelled,
}

impl fmt::Display for LeaseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LeaseState::NoLease => "no lease",
            LeaseState::Pending => "lease pending",
            LeaseState::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Default)]
pub struct LeaseTracker {
    leases: HashMap<String, LeaseState>,
}

impl LeaseTracker {
    pub fn state(&self, lease_id: &str) -> LeaseState {
        self.leases.get(lease_id).copied().unwrap_or(LeaseState::NoLease)
    }

    pub fn opened(&mut self, lease_id: &str) {
        self.leases.insert(lease_id.to_string(), LeaseState::Pending);
    }

    /// Records an accepted cancellation. Only a pending lease can be cancelled.
    pub fn cancelled(&mut self, lease_id: &str) -> Result<(), String> {
        match self.state(lease_id) {
            LeaseState::Pending => {
                self.leases.insert(lease_id.to_string(), LeaseState::Cancelled);
                Ok(())
            }
            other => Err(format!("lease {lease_id} cancelled while in state '{other}'")),
        }
    }
}
