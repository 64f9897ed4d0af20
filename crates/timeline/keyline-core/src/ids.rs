//! Identifiers for timeline entities.
//!
//! Every persisted entity carries a UUID so ids survive save/load and undo/redo unchanged.
//! Listener ids are process-local and allocated monotonically by the event bus.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::EditorError;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generate a fresh random id
            #[inline]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Parse an id from its hyphenated UUID form
            #[inline]
            pub fn from_string(id: impl AsRef<str>) -> Result<Self, EditorError> {
                Uuid::parse_str(id.as_ref())
                    .map(Self)
                    .map_err(|_| EditorError::InvalidId {
                        kind: $kind.to_string(),
                        value: id.as_ref().to_string(),
                    })
            }

            /// Get the underlying UUID
            #[inline]
            pub fn uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<Uuid> for $name {
            #[inline]
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl TryFrom<&str> for $name {
            type Error = EditorError;

            #[inline]
            fn try_from(s: &str) -> Result<Self, Self::Error> {
                Self::from_string(s)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

uuid_id!(
    /// Stable identity of a shape; shared by the "same" object across keyframes
    ShapeId,
    "shape"
);
uuid_id!(
    /// Identity of a materialized frame slot
    FrameId,
    "frame"
);
uuid_id!(
    /// Identity of a layer, top-level or nested inside a symbol
    LayerId,
    "layer"
);
uuid_id!(
    /// Key of a symbol in the document library
    SymbolId,
    "symbol"
);
uuid_id!(
    /// Identity of a placed symbol instance
    InstanceId,
    "instance"
);

/// Handle returned when subscribing to document events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        assert_ne!(ShapeId::new(), ShapeId::new());
        assert_ne!(LayerId::new(), LayerId::new());
    }

    #[test]
    fn parse_roundtrip() {
        let id = FrameId::new();
        let parsed = FrameId::from_string(id.to_string()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn parse_rejects_garbage() {
        let err = SymbolId::from_string("shape_12").unwrap_err();
        assert_eq!(
            err,
            EditorError::InvalidId {
                kind: "symbol".to_string(),
                value: "shape_12".to_string(),
            }
        );
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = ShapeId::new();
        let json = serde_json::to_value(id).unwrap();
        assert_eq!(json, serde_json::Value::String(id.to_string()));
    }
}
