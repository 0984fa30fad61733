//! Opaque player identity.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 128-bit player identity. Only compared, never interpreted.
#[repr(transparent)]
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Pod, Zeroable, Serialize, Deserialize)]
pub struct PlayerId(pub [u8; 16]);

impl PlayerId {
    /// Size in bytes.
    pub const SIZE: usize = 16;

    /// The all-zero id. Marks an unclaimed puppet slot.
    pub const NIL: Self = Self([0; 16]);

    /// Returns true for the all-zero id.
    #[inline]
    #[must_use]
    pub fn is_nil(self) -> bool {
        self == Self::NIL
    }

    /// Builds an id from a `u128`, little-endian.
    #[must_use]
    pub const fn from_u128(value: u128) -> Self {
        Self(value.to_le_bytes())
    }
}

impl fmt::Debug for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PlayerId({self})")
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, byte) in self.0.iter().enumerate() {
            if matches!(i, 4 | 6 | 8 | 10) {
                f.write_str("-")?;
            }
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_id_display() {
        let id = PlayerId::from_u128(1);
        assert_eq!(id.to_string(), "01000000-0000-0000-0000-000000000000");
        assert!(!id.is_nil());
        assert!(PlayerId::default().is_nil());
    }
}
