//! Identifier newtypes for scene nodes and their representations

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt::{self, Display, Formatter};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap an identifier string
            #[inline]
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the identifier as a string slice
            #[inline]
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume into the underlying string
            #[inline]
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self::new(id)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

string_id!(
    /// Identity of a scene node, unique key of the health record map
    NodeId
);

string_id!(
    /// Identity of one geometric representation on a node
    RepresentationId
);

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn ids_display_their_inner_string() {
        assert_eq!(NodeId::new("abc").to_string(), "abc");
        assert_eq!(RepresentationId::from("mesh-1").as_str(), "mesh-1");
    }

    #[test]
    fn ids_lookup_by_str() {
        let mut map = HashMap::new();
        map.insert(NodeId::new("wall"), 3);
        assert_eq!(map.get("wall"), Some(&3));
    }

    #[test]
    fn ids_serialize_transparently() {
        let json = serde_json::to_string(&NodeId::new("n1")).unwrap();
        assert_eq!(json, "\"n1\"");
    }
}
