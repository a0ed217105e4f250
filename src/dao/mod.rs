/// Tournament field and match results provider.
pub mod bracket;
/// Serialized bracket document definitions.
pub mod models;
