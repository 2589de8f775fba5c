//! Newtype wrappers for semantic names and numeric ids
//!
//! These types provide compile-time type safety to prevent mixing up
//! different kinds of identifiers (flow names, refresh dependency names,
//! resource URIs, event categories, backend handles).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

macro_rules! name_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Arc<str>);

        impl $name {
            pub fn new(value: impl Into<Arc<str>>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s.into())
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.into())
            }
        }

        impl From<Arc<str>> for $name {
            fn from(s: Arc<str>) -> Self {
                Self(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

name_type!(
    /// The name of a persistent text flow shared across page layouts.
    FlowName
);

name_type!(
    /// A name a layout answers to, or depends on, for refresh coalescing.
    RefreshName
);

name_type!(
    /// A URI for an externally produced resource (images, textures).
    ResourceUri
);

/// A category of host events a layout can subscribe to.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventCategory(pub u32);

impl EventCategory {
    /// Deadline-driven refresh ("refresh by time T").
    pub const TIMER: EventCategory = EventCategory(1);
    pub const MOUSE_MOVE: EventCategory = EventCategory(2);
    pub const MOUSE_BUTTON: EventCategory = EventCategory(3);
    pub const KEY: EventCategory = EventCategory(4);
    pub const RESIZE: EventCategory = EventCategory(5);
    pub const FOCUS: EventCategory = EventCategory(6);
    /// An asynchronously produced resource became available.
    pub const RESOURCE_READY: EventCategory = EventCategory(7);
    /// First id available for host-defined categories.
    pub const USER: EventCategory = EventCategory(256);
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match *self {
            Self::TIMER => "timer",
            Self::MOUSE_MOVE => "mouse-move",
            Self::MOUSE_BUTTON => "mouse-button",
            Self::KEY => "key",
            Self::RESIZE => "resize",
            Self::FOCUS => "focus",
            Self::RESOURCE_READY => "resource-ready",
            EventCategory(n) => return write!(f, "event#{}", n),
        };
        f.write_str(name)
    }
}

/// A key identifying a drawable across frames.
///
/// Keys are handed out in evaluation order, so a deterministic evaluator
/// reproduces the same keys when it rebuilds the tree. Persistent selection
/// state is keyed by these, never by per-pass selection ids.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeKey(pub u64);

/// Abstract texture handle understood by the graphics backend.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TextureId(pub u32);

/// Abstract shader program handle understood by the graphics backend.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShaderId(pub u32);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_creation() {
        let a = FlowName::new("body");
        let b = FlowName::from("body");
        let c = FlowName::from(String::from("body"));

        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(a.as_str(), "body");
    }

    #[test]
    fn test_hash_map_usage() {
        use std::collections::HashMap;

        let mut deps = HashMap::new();
        deps.insert(RefreshName::new("clock"), 1);
        assert_eq!(deps.get(&RefreshName::new("clock")), Some(&1));
    }

    #[test]
    fn test_event_category_display() {
        assert_eq!(EventCategory::TIMER.to_string(), "timer");
        assert_eq!(EventCategory(300).to_string(), "event#300");
    }
}
