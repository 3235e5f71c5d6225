use std::collections::HashMap;

/// Represents the identity of a tile as seen by grid sources and sinks.
///
/// Sample files use one character per tile, so the identity is usually a
/// Unicode scalar value, but the engine treats it as opaque.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TileId(pub u32);

impl TileId {
    /// Creates a tile identity from its display character.
    pub const fn from_char(c: char) -> Self {
        Self(c as u32)
    }

    /// Returns the display character, if the identity is a valid `char`.
    pub fn to_char(self) -> Option<char> {
        char::from_u32(self.0)
    }
}

/// Dense index of a distinct tile appearance inside one catalog.
///
/// Categories are handed out in order of first sighting, so `Category(0)` is
/// always the top-left tile of the first sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Category(pub u16);

impl Category {
    /// Index form used for table lookups.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Bidirectional tile <-> category dictionary.
#[derive(Debug, Clone, Default)]
pub struct TileDictionary {
    tiles: Vec<TileId>,
    categories: HashMap<TileId, Category>,
}

impl TileDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the category of `tile`, assigning the next free one on first sighting.
    ///
    /// Returns `None` once the `u16` category space is exhausted.
    pub fn category_or_insert(&mut self, tile: TileId) -> Option<Category> {
        if let Some(&category) = self.categories.get(&tile) {
            return Some(category);
        }
        let category = Category(u16::try_from(self.tiles.len()).ok()?);
        self.tiles.push(tile);
        self.categories.insert(tile, category);
        Some(category)
    }

    /// Looks up the category of an already known tile.
    pub fn category(&self, tile: TileId) -> Option<Category> {
        self.categories.get(&tile).copied()
    }

    /// Looks up the tile a category stands for.
    pub fn tile(&self, category: Category) -> Option<TileId> {
        self.tiles.get(category.index()).copied()
    }

    /// Number of distinct categories (C).
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Tiles in category order.
    pub fn tiles(&self) -> &[TileId] {
        &self.tiles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_follow_first_sighting() {
        let mut dictionary = TileDictionary::new();
        let b = dictionary.category_or_insert(TileId::from_char('b')).unwrap();
        let a = dictionary.category_or_insert(TileId::from_char('a')).unwrap();
        let b_again = dictionary.category_or_insert(TileId::from_char('b')).unwrap();

        assert_eq!(b, Category(0));
        assert_eq!(a, Category(1));
        assert_eq!(b, b_again);
        assert_eq!(dictionary.len(), 2);
        assert_eq!(dictionary.tile(a), Some(TileId::from_char('a')));
        assert_eq!(dictionary.category(TileId::from_char('z')), None);
    }

    #[test]
    fn tile_char_round_trip() {
        let tile = TileId::from_char('#');
        assert_eq!(tile.to_char(), Some('#'));
        assert_eq!(TileId(0xD800).to_char(), None);
    }
}
