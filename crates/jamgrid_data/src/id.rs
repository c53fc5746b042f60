use core::fmt::Display;

use serde::{Deserialize, Serialize};

/// Id of a competition entry, as assigned by the backend.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(pub u32);

impl From<u32> for EntryId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl Display for EntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("EntryId({})", self.0))
    }
}
