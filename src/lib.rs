//! gcp-plane - control-plane helpers for Google Cloud resources
//!
//! Picks the API surface (GA or beta) each call needs from the fields a
//! resource uses, converts values between the per-version shapes, and manages
//! elements of a parent's list field as resources of their own.

pub mod api;
pub mod collection;
pub mod config;
pub mod convert;
pub mod gcp;
pub mod lock;
pub mod resource;
pub mod version;

pub use collection::{CollectionError, CollectionItemStore, CollectionSpec, DeleteOutcome, ParentRef};
pub use gcp::client::GcpClient;
pub use lock::MutexRegistry;
pub use version::{resolve, ApiVersion, Feature, FeatureSet, ProductLine, ResolveMode};
