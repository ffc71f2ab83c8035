//! Type-safe identifier wrappers.
//!
//! Games carry a time-ordered [`Uuid`] so outcome records sort by creation.
//! Users, channels, and guilds are opaque handles handed to us by the chat
//! platform; we never mint them ourselves, only compare and display them.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }
    };
}

/// Generates a newtype wrapper around a platform-issued `u64` handle.
macro_rules! define_handle {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub u64);

        impl $name {
            /// Return the raw platform handle.
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }
    };
}

define_id! {
    /// Unique identifier for one hosted match.
    GameId
}

define_handle! {
    /// A chat-platform user.
    UserId
}

define_handle! {
    /// A chat channel. At most one game runs per channel.
    ChannelId
}

define_handle! {
    /// A chat-platform guild (server) that owns channels.
    GuildId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn game_ids_are_unique() {
        let a = GameId::new();
        let b = GameId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn game_ids_are_time_ordered() {
        let a = GameId::new();
        let b = GameId::new();
        assert!(a < b);
    }

    #[test]
    fn handle_display_is_raw_number() {
        assert_eq!(UserId(42).to_string(), "42");
        assert_eq!(ChannelId::from(7).get(), 7);
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn handle_serializes_transparently_as_tuple() {
        let json = serde_json::to_string(&UserId(9)).unwrap();
        assert_eq!(json, "9");
        let back: UserId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, UserId(9));
    }
}
