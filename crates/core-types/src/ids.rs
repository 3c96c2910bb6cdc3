use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4().to_string())
            }

            pub fn as_str(&self) -> &str {
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
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

string_id!(
    /// Identifier of one exploration session.
    RunId
);
string_id!(
    /// Identifier of a recorded loop iteration.
    StepId
);
string_id!(
    /// Identifier of a detected issue.
    IssueId
);
string_id!(
    /// Opaque handle to a document opened by a navigator.
    DocumentId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_unique() {
        assert_ne!(RunId::new(), RunId::new());
        assert_ne!(DocumentId::new(), DocumentId::new());
    }

    #[test]
    fn ids_serialize_as_plain_strings() {
        let id = StepId::from("step-1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"step-1\"");
        assert_eq!(id.to_string(), "step-1");
    }
}
