use serde::Serialize;
use strum::Display;

use crate::error::CoreError;

/// Device-wide status as reported in the `status` field of a snapshot.
///
/// The device sends a bare index. Decoding goes through an explicit table
/// rather than declaration order, and the table is checked at compile time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, Serialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SystemStatus {
    /// Normal operation: the active plugin owns the panel.
    #[default]
    #[serde(rename = "draw")]
    #[strum(serialize = "draw")]
    None,
    WsBinary,
    Update,
    Loading,
}

impl SystemStatus {
    /// Wire index → status, one entry per index.
    const TABLE: [Self; 4] = [Self::None, Self::WsBinary, Self::Update, Self::Loading];

    /// The wire index of this status.
    pub const fn index(self) -> u32 {
        match self {
            Self::None => 0,
            Self::WsBinary => 1,
            Self::Update => 2,
            Self::Loading => 3,
        }
    }

    /// Decode a wire index. Out-of-range indices are an error, never a default.
    pub fn from_index(index: u32) -> Result<Self, CoreError> {
        usize::try_from(index)
            .ok()
            .and_then(|i| Self::TABLE.get(i))
            .copied()
            .ok_or(CoreError::UnknownStatus { index })
    }
}

const _: () = {
    let mut position = 0;
    let mut expected = 0;
    while position < SystemStatus::TABLE.len() {
        assert!(
            SystemStatus::TABLE[position].index() == expected,
            "SystemStatus::TABLE is out of order"
        );
        position += 1;
        expected += 1;
    }
};
