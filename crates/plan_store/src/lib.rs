pub mod error;
pub mod service;

pub use crate::error::{StoreError, StoreResult};
pub use crate::service::{StateStore, StateStoreBuilder};
