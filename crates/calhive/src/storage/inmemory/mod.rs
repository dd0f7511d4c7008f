mod table;

pub use table::InMemoryTable;
