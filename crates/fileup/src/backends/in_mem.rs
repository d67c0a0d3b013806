//! 🧠 In-memory backends — the service, played by a `Vec` in a trench coat.
//!
//! Used by tests and by `--dry-run`. Both are `Clone` and share their state through
//! `Arc<Mutex<..>>`, so a test can hand one copy to the importer and keep another
//! to peek at what arrived.

pub(crate) mod in_mem_import_sink;
pub(crate) mod in_mem_object_store;

pub use in_mem_import_sink::{InMemoryImportSink, RecordedRequest};
pub use in_mem_object_store::InMemoryObjectStore;
