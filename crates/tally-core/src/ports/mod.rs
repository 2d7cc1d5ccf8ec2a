//! Ports - trait definitions for the external counter store.
//! Infrastructure crates implement these against Redis or process memory.

mod store;

pub use store::{Acquired, AtomicWindowStore, StoreError, Ttl, WindowStore};
