//! 📡 The Kibana backends — the import route, the index listing and the saved-object API,
//! all reached over plain HTTP with whatever credentials `ServiceConfig` carries.
//!
//! ⚠️ Every mutating call carries `kbn-xsrf`. Kibana rejects POSTs without it with a 400
//! and a message that makes you question your career. Ask us how we know.

pub(crate) mod kibana_import_sink;
pub(crate) mod kibana_object_store;

pub use kibana_import_sink::KibanaImportSink;
pub use kibana_object_store::KibanaObjectStore;

pub(crate) const XSRF_HEADER: &str = "kbn-xsrf";
