//! # Stock-Transition Math
//!
//! Pure arithmetic behind every stock mutation. The storage layer decides
//! *when* and *atomically how* a transition is applied; this module decides
//! *what* the resulting stock level and ledger entry are.
//!
//! ## The Three Operations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  op        new stock          ledger kind   ledger quantity         │
//! │  ───────   ────────────────   ───────────   ──────────────────      │
//! │  add       previous + qty     in            qty                     │
//! │  subtract  previous - qty     out           qty                     │
//! │  set       qty (as target)    adjustment    |target - previous|     │
//! │                                                                     │
//! │  subtract below zero is rejected, never clamped.                    │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The request-side [`StockOp`] and the ledger-side
//! [`MovementKind`](crate::types::MovementKind) are separate types: callers
//! submit deltas or an absolute target, the ledger records directions, and
//! the set operation is exposed as its own service entry point.

use serde::{Deserialize, Serialize};

use crate::types::MovementKind;

/// A requested stock operation, as submitted by a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockOp {
    /// Increase stock by the given quantity.
    Add,
    /// Decrease stock by the given quantity. Fails below zero.
    Subtract,
    /// Set stock to the given absolute target.
    Set,
}

impl StockOp {
    /// The ledger kind this operation records.
    pub const fn movement_kind(&self) -> MovementKind {
        match self {
            StockOp::Add => MovementKind::In,
            StockOp::Subtract => MovementKind::Out,
            StockOp::Set => MovementKind::Adjustment,
        }
    }
}

/// Computes the stock level after applying `op` with `quantity` to
/// `previous`, or `None` if the result would be negative.
///
/// For [`StockOp::Set`], `quantity` is the absolute target value.
pub fn next_stock(op: StockOp, previous: i64, quantity: i64) -> Option<i64> {
    let next = match op {
        StockOp::Add => previous + quantity,
        StockOp::Subtract => previous - quantity,
        StockOp::Set => quantity,
    };
    if next < 0 {
        None
    } else {
        Some(next)
    }
}

/// The ledger quantity for a transition from `previous` to `new_stock`.
///
/// Delta operations log the submitted quantity; a set logs the absolute
/// value of the applied delta.
pub fn movement_quantity(op: StockOp, quantity: i64, previous: i64, new_stock: i64) -> i64 {
    match op {
        StockOp::Add | StockOp::Subtract => quantity,
        StockOp::Set => (new_stock - previous).abs(),
    }
}
