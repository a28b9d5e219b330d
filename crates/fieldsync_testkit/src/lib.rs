//! # Fieldsync Testkit
//!
//! Test utilities for the fieldsync cache.
//!
//! This crate provides:
//! - A scripted mock remote store with per-field read counters
//! - Mock setters with invocation counters and captured options payloads
//! - Injectable read, invocation, and acknowledgement faults
//! - A gate for deterministically overlapping in-flight operations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use fieldsync_testkit::{MockSetter, MockStore};
//!
//! let store = MockStore::new();
//! store.set_value("owner", "alice".to_string());
//!
//! let binding = FieldBinding::new("owner").with_shared_getter(store.getter_for("owner"));
//! // ... bind, sync, assert on store.read_count("owner")
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod fault;
mod gate;
mod setter;
mod store;

pub use fault::{fault, InjectedFault};
pub use gate::{Gate, GateControl};
pub use setter::MockSetter;
pub use store::MockStore;
