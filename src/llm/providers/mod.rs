//! Completion provider implementations.
//!
//! `azure` is the live backend; `demo` is the offline stand-in used when the
//! live client cannot be built or is intentionally disabled.

pub mod azure;
pub mod demo;

pub use azure::AzureProvider;
pub use demo::DemoProvider;
