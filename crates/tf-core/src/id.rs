use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of an entity on the canvas.
///
/// Ids are compact integers handed out by the store in increasing order, so
/// creation order is visible in the id itself. An id is never reused within
/// a session, even after the entity holding it is deleted.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub u32);

impl EntityId {
    /// The first id handed out by an empty store.
    pub const FIRST: EntityId = EntityId(1);

    /// The id that follows the largest id in `existing`, or [`EntityId::FIRST`].
    /// `None` once the id space is exhausted.
    pub fn next_after<I>(existing: I) -> Option<Self>
    where
        I: IntoIterator<Item = EntityId>,
    {
        match existing.into_iter().max() {
            Some(max) => max.0.checked_add(1).map(EntityId),
            None => Some(Self::FIRST),
        }
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u32> for EntityId {
    fn from(raw: u32) -> Self {
        EntityId(raw)
    }
}

/// Identifier of an advisory tip record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TipId(pub u32);

impl TipId {
    pub const FIRST: TipId = TipId(1);

    pub fn next_after<I>(existing: I) -> Option<Self>
    where
        I: IntoIterator<Item = TipId>,
    {
        match existing.into_iter().max() {
            Some(max) => max.0.checked_add(1).map(TipId),
            None => Some(Self::FIRST),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_after_uses_max_not_gap() {
        let next = EntityId::next_after([EntityId(1), EntityId(3)]);
        assert_eq!(next, Some(EntityId(4)));
    }

    #[test]
    fn next_after_empty_is_first() {
        assert_eq!(EntityId::next_after([]), Some(EntityId::FIRST));
        assert_eq!(TipId::next_after([]), Some(TipId::FIRST));
    }

    #[test]
    fn next_after_largest_id_is_none() {
        assert_eq!(EntityId::next_after([EntityId(u32::MAX)]), None);
        assert_eq!(TipId::next_after([TipId(3), TipId(u32::MAX)]), None);
    }

    #[test]
    fn serializes_as_plain_integer() {
        let json = serde_json::to_string(&EntityId(7)).unwrap();
        assert_eq!(json, "7");
        assert_eq!(format!("{}", EntityId(7)), "#7");
    }
}
