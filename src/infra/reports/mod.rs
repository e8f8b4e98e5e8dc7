// Filesystem implementation of the report store.

pub mod json_store;

pub use json_store::JsonReportStore;
