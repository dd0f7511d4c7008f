//! Domain core for calhive.
//!
//! Pure types, validation rules, the single-table key scheme and the
//! abstract storage contracts. Nothing in this crate talks to the network;
//! concrete table adapters and the HTTP surface live in the `calhive` crate.

pub mod calendar;
pub mod context;
pub mod error;
pub mod storage;

pub use context::{CancelHandle, OperationContext};
pub use error::{error_kind_to_status_code, ErrorKind, ServiceError};
