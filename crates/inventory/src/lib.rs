//! Inventory domain module (stock ledger).
//!
//! This crate contains the stock ledger accessor: staged, validated batch
//! stock adjustment over product records. It performs no IO; the fulfillment
//! engine decides what to stage and when the staged writes are persisted.

pub mod ledger;

pub use ledger::{StockAdjustment, StockLedger};
