use super::*;
use crate::model::TileColor;

fn tile(title: &str, order_index: i32) -> Tile {
    Tile {
        id: Uuid::new_v4(),
        user_id: Uuid::nil(),
        dashboard_id: Uuid::nil(),
        title: title.into(),
        content: String::new(),
        color: TileColor::Blue,
        order_index,
        created_at: 0,
        updated_at: 0,
    }
}

#[test]
fn toggle_flips_membership() {
    let id = Uuid::new_v4();
    let mut selection = TileSelection::new();
    selection.toggle(id);
    assert!(selection.is_selected(id));
    selection.toggle(id);
    assert!(!selection.is_selected(id));
    assert!(selection.is_empty());
}

#[test]
fn toggle_all_selects_then_clears() {
    let tiles = vec![tile("a", 0), tile("b", 1)];
    let mut selection = TileSelection::new();
    selection.toggle(tiles[0].id);

    selection.toggle_all(&tiles);
    assert!(selection.all_selected(&tiles));
    assert_eq!(selection.len(), 2);

    selection.toggle_all(&tiles);
    assert!(selection.is_empty());
}

#[test]
fn empty_board_is_never_all_selected() {
    assert!(!TileSelection::new().all_selected(&[]));
}

#[test]
fn pick_keeps_board_order_regardless_of_click_order() {
    let tiles = vec![tile("Work", 0), tile("Wifi", 1), tile("Address", 2)];
    let mut selection = TileSelection::new();
    selection.toggle(tiles[2].id);
    selection.toggle(tiles[0].id);
    selection.toggle(Uuid::new_v4());

    let picked: Vec<&str> = selection.pick(&tiles).iter().map(|t| t.title.as_str()).collect();
    assert_eq!(picked, ["Work", "Address"]);
}
