//! Type-safe entity identifiers.
//!
//! Every aggregate in the core has its own UUID-v4 newtype so a match id
//! can never be passed where a user id is expected. All four behave the
//! same way; the macro keeps them structurally identical.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            Serialize,
            Deserialize,
            utoipa::ToSchema,
        )]
        #[serde(transparent)]
        pub struct $name(uuid::Uuid);

        impl $name {
            /// Creates a new random identifier (UUID v4).
            #[must_use]
            pub fn new() -> Self {
                Self(uuid::Uuid::new_v4())
            }

            /// Wraps an existing [`uuid::Uuid`].
            #[must_use]
            pub const fn from_uuid(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner [`uuid::Uuid`].
            #[must_use]
            pub const fn as_uuid(&self) -> &uuid::Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<uuid::Uuid> for $name {
            fn from(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for uuid::Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(
    /// Identifier of a marketplace user (host, traveler, or admin).
    ///
    /// Users are owned by the external user service; this core only refers
    /// to them. `Ord` matters: two-user ledger operations lock accounts in
    /// ascending `UserId` order to avoid deadlock.
    UserId
);

define_id!(
    /// Identifier of a booking match between a host and a requester.
    MatchId
);

define_id!(
    /// Identifier of a dispute opened against a match.
    DisputeId
);

define_id!(
    /// Identifier of an immutable wallet ledger entry.
    TxId
);

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn new_generates_unique_ids() {
        assert_ne!(UserId::new(), UserId::new());
        assert_ne!(MatchId::new(), MatchId::new());
    }

    #[test]
    fn display_is_uuid_format() {
        let id = DisputeId::new();
        let s = format!("{id}");
        assert_eq!(s.len(), 36);
        assert!(s.contains('-'));
    }

    #[test]
    fn serde_round_trip() {
        let id = TxId::new();
        let json = serde_json::to_string(&id).ok();
        let Some(json) = json else {
            panic!("serialization failed");
        };
        let Some(back) = serde_json::from_str::<TxId>(&json).ok() else {
            panic!("deserialization failed");
        };
        assert_eq!(id, back);
    }

    #[test]
    fn user_ids_order_deterministically() {
        let a = UserId::new();
        let b = UserId::new();
        // One strict order must hold; which one depends on the random bytes.
        assert!(a < b || b < a);
        assert_eq!(a.min(b), b.min(a));
    }

    #[test]
    fn from_uuid_round_trip() {
        let uuid = uuid::Uuid::new_v4();
        let id = MatchId::from_uuid(uuid);
        assert_eq!(*id.as_uuid(), uuid);
    }

    #[test]
    fn hash_works_in_hashmap() {
        use std::collections::HashMap;
        let id = UserId::new();
        let mut map = HashMap::new();
        map.insert(id, "test");
        assert_eq!(map.get(&id), Some(&"test"));
    }
}
