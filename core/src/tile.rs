use serde::{Deserialize, Deserializer, Serialize};

pub const TILE_ID_PREFIX: &str = "tile-";

/// A placeable unit. Grid cells hold value copies, never references into the
/// library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    #[serde(deserialize_with = "deserialize_tile_id")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Tile {
    pub fn image(id: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: None,
            image: Some(image.into()),
            color: None,
        }
    }

    pub fn color(id: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: None,
            image: None,
            color: Some(color.into()),
        }
    }

    pub fn text_only(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: Some(text.into()).filter(|value: &String| !value.trim().is_empty()),
            image: None,
            color: None,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into()).filter(|value: &String| !value.trim().is_empty());
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// True when the tile carries nothing worth rendering.
    pub fn is_blank(&self) -> bool {
        self.text.as_deref().map_or(true, |text| text.trim().is_empty())
            && self.image.is_none()
            && self.color.is_none()
    }

    /// Display label: text when present, otherwise the id.
    pub fn label(&self) -> &str {
        match self.text.as_deref() {
            Some(text) if !text.trim().is_empty() => text,
            _ => &self.id,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTileId {
    Text(String),
    Number(serde_json::Number),
}

// Older saves used numeric timestamps as ids.
fn deserialize_tile_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match RawTileId::deserialize(deserializer)? {
        RawTileId::Text(value) => Ok(value),
        RawTileId::Number(value) => Ok(value.to_string()),
    }
}

/// Ordered tile collection; insertion order is creation order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Library {
    tiles: Vec<Tile>,
}

impl Library {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tiles(tiles: Vec<Tile>) -> Self {
        Self { tiles }
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Tile> {
        self.tiles.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Tile> {
        self.tiles.iter_mut()
    }

    pub fn as_slice(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn get(&self, id: &str) -> Option<&Tile> {
        self.tiles.iter().find(|tile| tile.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Appends unless the id is already taken.
    pub fn push(&mut self, tile: Tile) -> bool {
        if self.contains(&tile.id) {
            return false;
        }
        self.tiles.push(tile);
        true
    }

    pub fn remove(&mut self, id: &str) -> Option<Tile> {
        let index = self.tiles.iter().position(|tile| tile.id == id)?;
        Some(self.tiles.remove(index))
    }

    pub fn clear(&mut self) {
        self.tiles.clear();
    }

    pub fn next_tile_id(&self) -> String {
        let next = self
            .tiles
            .iter()
            .filter_map(|tile| tile.id.strip_prefix(TILE_ID_PREFIX))
            .filter_map(|suffix| suffix.parse::<u64>().ok())
            .max()
            .map_or(1, |max| max.saturating_add(1));
        format!("{TILE_ID_PREFIX}{next}")
    }
}

impl<'a> IntoIterator for &'a Library {
    type Item = &'a Tile;
    type IntoIter = std::slice::Iter<'a, Tile>;

    fn into_iter(self) -> Self::IntoIter {
        self.tiles.iter()
    }
}
