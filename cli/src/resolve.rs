use std::path::{Path, PathBuf};

use hexflower_core::{inline_images, BoardState, InlineReport};
use hexflower_image::inline_bytes;

const REMOTE_SCHEMES: &[&str] = &["http://", "https://", "blob:"];

/// Inlines image references that point at local files. Relative paths are
/// taken from `base_dir`, the directory of the board file.
pub(crate) async fn inline_board(state: &BoardState, base_dir: &Path) -> (BoardState, InlineReport) {
    inline_images(state, |reference| {
        let base_dir = base_dir.to_path_buf();
        async move { read_reference(&reference, &base_dir).await }
    })
    .await
}

async fn read_reference(reference: &str, base_dir: &Path) -> Result<String, String> {
    let lowered = reference.to_ascii_lowercase();
    if REMOTE_SCHEMES.iter().any(|scheme| lowered.starts_with(scheme)) {
        return Err("remote images can only be inlined from the browser".to_string());
    }
    let path = local_path(reference, base_dir);
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|err| format!("{}: {err}", path.display()))?;
    log::debug!("read {} bytes from {}", bytes.len(), path.display());
    Ok(inline_bytes(&bytes, None))
}

fn local_path(reference: &str, base_dir: &Path) -> PathBuf {
    let raw = reference.strip_prefix("file://").unwrap_or(reference);
    let path = PathBuf::from(raw);
    if path.is_absolute() {
        path
    } else {
        base_dir.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hexflower_core::{CellId, Tile};

    #[tokio::test]
    async fn inlines_relative_files_and_reports_remote_ones() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("forest.bin"), b"forest").unwrap();

        let mut state = BoardState::new();
        state.tiles.push(Tile::image("tile-1", "forest.bin"));
        state.tiles.push(Tile::image("tile-2", "https://example.com/sea.png"));
        state
            .hexes
            .set_tile(CellId::new(0, 0), Some(Tile::image("tile-1", "forest.bin")));

        let (next, report) = inline_board(&state, dir.path()).await;
        assert_eq!(report.inlined, 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].tile_ids, vec!["tile-2".to_string()]);

        let library_image = next.tiles.get("tile-1").and_then(|tile| tile.image.clone());
        assert!(library_image.as_deref().is_some_and(|uri| uri.starts_with("data:")));
        assert_eq!(
            next.hexes.tile_at(CellId::new(0, 0)).and_then(|tile| tile.image.clone()),
            library_image
        );
        assert_eq!(next.tiles.get("tile-2").and_then(|tile| tile.image.clone()), None);
    }

    #[tokio::test]
    async fn missing_file_is_a_failure() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = BoardState::new();
        state.tiles.push(Tile::image("tile-1", "file://missing.png"));
        let (next, report) = inline_board(&state, dir.path()).await;
        assert!(!report.is_clean());
        assert_eq!(next.tiles.get("tile-1").and_then(|tile| tile.image.clone()), None);
    }

    #[test]
    fn absolute_paths_ignore_base_dir() {
        let base = Path::new("/boards");
        assert_eq!(local_path("/img/a.png", base), PathBuf::from("/img/a.png"));
        assert_eq!(local_path("file://a.png", base), PathBuf::from("/boards/a.png"));
    }
}
