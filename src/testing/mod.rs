//! Headless testing helpers: Fixture, snapshot helpers.
//!
//! Use the [`Fixture`] to bind test markup and drive it by element id. Use
//! [`markup_to_string`] and [`outline_to_string`] to capture a subtree as
//! plain text for snapshot-style assertions.

pub mod fixture;
pub mod snapshot;

pub use fixture::Fixture;
pub use snapshot::{markup_to_string, outline_to_string};
