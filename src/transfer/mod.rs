// src/transfer/mod.rs

//! Remote transfer: token-authenticated upload/download against an
//! object-store HTTP API with a stage-then-commit transaction protocol.
//!
//! - [`api`] defines the [`TransferApi`] trait and the reqwest-backed
//!   production implementation.
//! - [`mock`] is an in-memory implementation for tests.
//! - [`client`] drives retries, transactions and local file IO.

pub mod api;
pub mod client;
pub mod mock;

pub use api::{ApiConfig, HttpTransferApi, TransferApi};
pub use client::{TransactionState, TransferClient, TransferTransaction};
