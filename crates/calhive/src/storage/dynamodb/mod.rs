//! DynamoDB single-table adapter.
//!
//! Table layout: `PK` (partition key), `SK` (sort key), and a `GSI1` index on
//! `GSI1PK`/`GSI1SK` that serves the user-index queries.

mod conversions;
mod error;
mod table;

pub use table::DynamoDbTable;
