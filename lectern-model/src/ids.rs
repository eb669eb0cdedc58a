use uuid::Uuid;

use crate::error::ModelError;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[cfg_attr(
            feature = "serde",
            derive(serde::Serialize, serde::Deserialize)
        )]
        #[cfg_attr(feature = "serde", serde(transparent))]
        pub struct $name(String);

        impl $name {
            /// Fresh time-ordered identifier, as minted by the write API.
            pub fn generate() -> Self {
                Self(Uuid::now_v7().to_string())
            }

            pub fn new(id: impl Into<String>) -> Result<Self, ModelError> {
                let id = id.into();
                if id.trim().is_empty() {
                    return Err(ModelError::EmptyId($label));
                }
                Ok(Self(id))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Store-assigned identifier of a category record.
    CategoryId,
    "category"
);
string_id!(
    /// Store-assigned identifier of a tag; documents reference tags by it.
    TagId,
    "tag"
);
string_id!(
    /// Store-assigned identifier of a document.
    DocumentId,
    "document"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_ids_are_rejected() {
        assert_eq!(TagId::new("  "), Err(ModelError::EmptyId("tag")));
        assert_eq!(DocumentId::new("d1").unwrap().as_str(), "d1");
    }

    #[test]
    fn generated_ids_are_distinct() {
        assert_ne!(CategoryId::generate(), CategoryId::generate());
    }
}
