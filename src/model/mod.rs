//! Core data model types for Skype exports: history root, conversations, messages.

pub mod conversation;
pub mod history;
pub mod message;

use serde::{Deserialize, Deserializer};

/// Deserialize `null` as the type's default.
///
/// Skype exports write `null` for empty strings and lists in places where the
/// field is otherwise always present.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
