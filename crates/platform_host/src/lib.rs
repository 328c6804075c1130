//! Typed host-domain contracts used by the lifecycle runtime.
//!
//! This crate is the API-first boundary for host services: content retrieval, progress display,
//! user-facing alerts, and session-scoped identifier generation. Concrete browser adapters plug in
//! behind these traits; the `Memory*` adapters back tests and headless hosts.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

pub mod alerts;
pub mod fetch;
pub mod host;
pub mod ids;
pub mod progress;

pub use alerts::{AlertService, MemoryAlertService, NoopAlertService};
pub use fetch::{
    check_error_field, fetch_checked_with, fetch_json_with, ContentFetcher, FetchError,
    FetchFuture, MemoryContentFetcher, NoopContentFetcher,
};
pub use host::HostServices;
pub use ids::{generate_object_id, generate_unique_object_id, is_object_id, OBJECT_ID_LEN};
pub use progress::{
    MemoryProgressIndicator, NoopProgressIndicator, ProgressEvent, ProgressHandle,
    ProgressIndicator, ProgressStopCallback,
};
