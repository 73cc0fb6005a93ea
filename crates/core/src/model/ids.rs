use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors produced when constructing an [`ItemId`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ItemIdError {
    #[error("item id must not be empty")]
    Empty,
}

/// Opaque identifier of a learning item (flashcard, term) under review.
///
/// Ids are kept and compared exactly as given; `"a"` and `"a "` are
/// different items.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(String);

impl ItemId {
    /// Creates a new `ItemId` for an item entering the tracker.
    ///
    /// # Errors
    ///
    /// Returns `ItemIdError::Empty` if the id is blank.
    pub fn new(id: impl Into<String>) -> Result<Self, ItemIdError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ItemIdError::Empty);
        }
        Ok(Self(id))
    }

    /// Rebuild an id read back from storage, without validation.
    #[must_use]
    pub fn from_persisted(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ItemId({:?})", self.0)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ItemId {
    type Err = ItemIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ItemId {
    type Error = ItemIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for ItemId {
    type Error = ItemIdError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ItemId> for String {
    fn from(id: ItemId) -> Self {
        id.0
    }
}

impl AsRef<str> for ItemId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_id_display() {
        let id = ItemId::new("card-1").unwrap();
        assert_eq!(id.to_string(), "card-1");
    }

    #[test]
    fn test_item_id_keeps_surrounding_whitespace() {
        let id = ItemId::new(" react-hooks ").unwrap();
        assert_eq!(id.as_str(), " react-hooks ");
        assert_ne!(id, ItemId::new("react-hooks").unwrap());
    }

    #[test]
    fn test_item_id_rejects_blank() {
        assert_eq!(ItemId::new("").unwrap_err(), ItemIdError::Empty);
        assert_eq!(ItemId::new("   ").unwrap_err(), ItemIdError::Empty);
    }

    #[test]
    fn test_persisted_id_accepts_anything() {
        assert_eq!(ItemId::from_persisted("").as_str(), "");
        assert_eq!(ItemId::from_persisted("a ").as_str(), "a ");
    }

    #[test]
    fn test_item_id_from_str() {
        let id: ItemId = "term-42".parse().unwrap();
        assert_eq!(id, ItemId::new("term-42").unwrap());
    }

    #[test]
    fn test_item_id_debug_is_quoted() {
        let id = ItemId::new("a").unwrap();
        assert_eq!(format!("{id:?}"), "ItemId(\"a\")");
    }
}
