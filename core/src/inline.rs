use std::collections::HashMap;
use std::fmt::Display;
use std::future::Future;

use futures_util::future::join_all;

use crate::state::BoardState;
use crate::tile::Tile;

pub const DATA_URI_PREFIX: &str = "data:";

pub fn is_data_uri(value: &str) -> bool {
    value
        .get(..DATA_URI_PREFIX.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(DATA_URI_PREFIX))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineFailure {
    pub reference: String,
    pub tile_ids: Vec<String>,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InlineReport {
    pub inlined: usize,
    pub failures: Vec<InlineFailure>,
}

impl InlineReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Replaces every external image reference (library and grid copies alike)
/// with the data URI produced by `fetch`. Each distinct reference is fetched
/// once, all concurrently. A failed fetch drops that image and the rest of
/// the board is still returned.
pub async fn inline_images<F, Fut, E>(state: &BoardState, mut fetch: F) -> (BoardState, InlineReport)
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<String, E>>,
    E: Display,
{
    let mut references: Vec<String> = Vec::new();
    let mut owners: HashMap<String, Vec<String>> = HashMap::new();
    let grid_tiles = state.hexes.iter().filter_map(|(_, cell)| cell.tile.as_ref());
    for tile in state.tiles.iter().chain(grid_tiles) {
        let Some(image) = external_image(tile) else {
            continue;
        };
        let entry = owners.entry(image.to_string()).or_default();
        if entry.is_empty() {
            references.push(image.to_string());
        }
        if !entry.contains(&tile.id) {
            entry.push(tile.id.clone());
        }
    }

    let pending: Vec<_> = references.iter().map(|reference| fetch(reference.clone())).collect();
    let results = join_all(pending).await;

    let mut resolved: HashMap<String, Option<String>> = HashMap::with_capacity(results.len());
    let mut report = InlineReport::default();
    for (reference, result) in references.into_iter().zip(results) {
        match result {
            Ok(data_uri) => {
                report.inlined += 1;
                resolved.insert(reference, Some(data_uri));
            }
            Err(err) => {
                report.failures.push(InlineFailure {
                    tile_ids: owners.remove(&reference).unwrap_or_default(),
                    reference: reference.clone(),
                    reason: err.to_string(),
                });
                resolved.insert(reference, None);
            }
        }
    }

    let mut next = state.clone();
    for tile in next.tiles.iter_mut().chain(next.hexes.tiles_mut()) {
        let Some(image) = external_image(tile) else {
            continue;
        };
        if let Some(replacement) = resolved.get(image) {
            tile.image = replacement.clone();
        }
    }
    (next, report)
}

fn external_image(tile: &Tile) -> Option<&str> {
    tile.image
        .as_deref()
        .filter(|image| !image.is_empty() && !is_data_uri(image))
}
