pub mod client;
pub mod contents;

pub use client::{AddonStoreClient, AddonStoreConfig, StoreError};
