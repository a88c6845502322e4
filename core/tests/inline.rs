use hexflower_core::{inline_images, reconcile, BoardAction, BoardState, CellId, Tile};

fn state_with_images() -> BoardState {
    let mut state = BoardState::new();
    for tile in [
        Tile::image("tile-1", "blob:http://localhost/a"),
        Tile::image("tile-2", "blob:http://localhost/missing"),
        Tile::image("tile-3", "data:image/png;base64,AAAA"),
        Tile::text_only("tile-4", "plain"),
    ] {
        state = reconcile(&state, &BoardAction::CreateTile { tile });
    }
    for (id, target) in [("tile-1", CellId::new(0, 0)), ("tile-2", CellId::new(1, 1))] {
        let tile = state.tiles.get(id).cloned().unwrap();
        state = reconcile(
            &state,
            &BoardAction::Drop {
                source: None,
                target,
                tile,
            },
        );
    }
    state
}

#[tokio::test]
async fn inlines_library_and_grid_copies() {
    let state = state_with_images();
    let mut requested = Vec::new();
    let (next, report) = inline_images(&state, |reference| {
        requested.push(reference.clone());
        async move {
            if reference.ends_with("/a") {
                Ok("data:image/png;base64,BBBB".to_string())
            } else {
                Err("404 Not Found")
            }
        }
    })
    .await;

    requested.sort();
    assert_eq!(
        requested,
        vec!["blob:http://localhost/a".to_string(), "blob:http://localhost/missing".to_string()]
    );
    assert_eq!(report.inlined, 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].tile_ids, vec!["tile-2".to_string()]);

    let inlined = Some("data:image/png;base64,BBBB");
    assert_eq!(next.tiles.get("tile-1").and_then(|tile| tile.image.as_deref()), inlined);
    assert_eq!(next.hexes.tile_at(CellId::new(0, 0)).and_then(|tile| tile.image.as_deref()), inlined);
    assert!(next.tiles.get("tile-2").unwrap().image.is_none());
    assert!(next.hexes.tile_at(CellId::new(1, 1)).unwrap().image.is_none());
    assert_eq!(
        next.tiles.get("tile-3").and_then(|tile| tile.image.as_deref()),
        Some("data:image/png;base64,AAAA")
    );
    assert_eq!(next.tiles.len(), 4);
}

#[tokio::test]
async fn nothing_to_fetch_leaves_state_alone() {
    let state = BoardState::new();
    let (next, report) =
        inline_images(&state, |_reference| async { Err::<String, &str>("unreachable") }).await;
    assert_eq!(next, state);
    assert!(report.is_clean());
    assert_eq!(report.inlined, 0);
}
