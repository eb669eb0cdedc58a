use crate::ids::TagId;

/// Free-standing label attached to documents through their tag id list.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tag {
    pub id: TagId,
    pub name: String,
    /// CSS-style color string, passed through untouched.
    pub color: String,
}

impl Tag {
    pub fn new(
        id: TagId,
        name: impl Into<String>,
        color: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            color: color.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TagDraft {
    pub name: String,
    pub color: String,
}

impl TagDraft {
    pub fn into_tag(self, id: TagId) -> Tag {
        Tag {
            id,
            name: self.name,
            color: self.color,
        }
    }
}
