//! Table adapters.
//!
//! Concrete implementations of [`calhive_core::storage::Table`], selected at
//! compile time via feature flags.
//!
//! # Feature Flags
//!
//! - `inmemory` (default): process-local table, also used as the test fake
//! - `dynamodb`: AWS DynamoDB single-table adapter using `aws-sdk-dynamodb`
//!
//! Build with DynamoDB:
//! ```bash
//! cargo build -p calhive --no-default-features --features dynamodb
//! ```

#[cfg(all(feature = "inmemory", feature = "dynamodb"))]
compile_error!(
    "Features 'inmemory' and 'dynamodb' are mutually exclusive. \
    Enable only one storage backend at a time."
);

#[cfg(not(any(feature = "inmemory", feature = "dynamodb")))]
compile_error!(
    "No storage backend selected. Enable 'inmemory' or 'dynamodb' feature. \
    Example: cargo build -p calhive --features dynamodb"
);

#[cfg(any(test, feature = "inmemory"))]
pub mod inmemory;

#[cfg(feature = "dynamodb")]
pub mod dynamodb;

#[cfg(any(test, feature = "inmemory"))]
pub use inmemory::InMemoryTable;

#[cfg(feature = "dynamodb")]
pub use dynamodb::DynamoDbTable;
