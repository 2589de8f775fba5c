use crate::drawable::Drawable;
use crate::measure;
use crate::table::{CellAlign, Table};
use crate::test_utils::{create_test_tree, TestHarness};
use crate::tree::{DrawableId, LayoutTree};
use crate::LayoutError;
use folio_style::LayoutState;
use folio_types::{Color, Point, Size};

fn two_by_two(tree: &mut LayoutTree, table: Table) -> (DrawableId, Vec<DrawableId>) {
    let root = tree.root();
    let id = tree.add(root, table.into()).unwrap();
    let cells = [(50.0, 20.0), (30.0, 40.0), (60.0, 10.0), (20.0, 20.0)]
        .into_iter()
        .map(|(w, h)| tree.add_cell(id, Drawable::rect(w, h)).unwrap())
        .collect();
    (id, cells)
}

#[test]
fn test_columns_and_rows_take_the_largest_cell() {
    let mut h = TestHarness::new();
    let mut tree = create_test_tree();
    let (table, _) = two_by_two(&mut tree, Table::new(2, 2));

    tree.evaluate(&mut h.measure()).unwrap();

    let t = tree.get(table).unwrap().as_table().unwrap();
    assert_eq!(t.column_width, vec![60.0, 30.0]);
    assert_eq!(t.row_height, vec![40.0, 20.0]);
    assert_eq!(t.size(), Size::new(90.0, 60.0));

    let b = measure::bounds(&tree, table, &LayoutState::default(), &mut h.measure());
    assert_eq!(b.size(), Size::new(90.0, 60.0));
}

#[test]
fn test_bounds_include_cell_margins() {
    let mut h = TestHarness::new();
    let mut tree = create_test_tree();
    let (table, _) = two_by_two(&mut tree, Table::new(2, 2).with_margin(2.0, 3.0));

    tree.evaluate(&mut h.measure()).unwrap();

    let b = measure::bounds(&tree, table, &LayoutState::default(), &mut h.measure());
    assert_eq!(b.size(), Size::new(90.0 + 8.0, 60.0 + 12.0));
    let t = tree.get(table).unwrap().as_table().unwrap();
    assert_eq!(t.placement(3), Point::flat(60.0 + 4.0 + 2.0, 40.0 + 6.0 + 3.0));
}

#[test]
fn test_sizing_is_memoized_until_a_cell_changes() {
    let mut h = TestHarness::new();
    let mut tree = create_test_tree();
    let (_, cells) = two_by_two(&mut tree, Table::new(2, 2));

    let first = tree.evaluate(&mut h.measure()).unwrap();
    let second = tree.evaluate(&mut h.measure()).unwrap();
    assert_eq!(first.tables_sized, 1);
    assert_eq!(second.tables_sized, 0);

    tree.get_mut(cells[0]).unwrap().as_shape_mut().unwrap().set_size(Size::new(80.0, 20.0));
    tree.invalidate(cells[0]);
    let third = tree.evaluate(&mut h.measure()).unwrap();
    assert_eq!(third.tables_sized, 1);
}

#[test]
fn test_resized_cell_changes_column_width() {
    let mut h = TestHarness::new();
    let mut tree = create_test_tree();
    let (table, cells) = two_by_two(&mut tree, Table::new(2, 2));
    tree.evaluate(&mut h.measure()).unwrap();

    tree.get_mut(cells[1]).unwrap().as_shape_mut().unwrap().set_size(Size::new(45.0, 40.0));
    tree.invalidate(cells[1]);
    tree.evaluate(&mut h.measure()).unwrap();

    let t = tree.get(table).unwrap().as_table().unwrap();
    assert_eq!(t.column_width, vec![60.0, 45.0]);
}

#[test]
fn test_full_table_rejects_cells() {
    let mut tree = create_test_tree();
    let root = tree.root();
    let table = tree.add(root, Table::new(1, 1).into()).unwrap();
    tree.add_cell(table, Drawable::rect(1.0, 1.0)).unwrap();

    let err = tree.add_cell(table, Drawable::rect(1.0, 1.0)).unwrap_err();
    assert!(matches!(err, LayoutError::TableFull { rows: 1, columns: 1 }));
}

#[test]
fn test_aligned_cell_takes_share_of_slack() {
    let mut h = TestHarness::new();
    let mut tree = create_test_tree();
    let root = tree.root();
    let table = tree.add(root, Table::new(2, 1).into()).unwrap();
    tree.add_cell(table, Drawable::rect(100.0, 10.0)).unwrap();
    tree.add_cell_aligned(table, Drawable::rect(40.0, 10.0), CellAlign::centered()).unwrap();

    tree.evaluate(&mut h.measure()).unwrap();

    let t = tree.get(table).unwrap().as_table().unwrap();
    assert_eq!(t.placement(1), Point::flat(30.0, 10.0));
}

#[test]
fn test_decorations_match_cell_boxes() {
    let mut h = TestHarness::new();
    let mut tree = create_test_tree();
    let table = Table::new(2, 2).with_fill(Color::WHITE).with_border(Color::BLACK, 1.0);
    let (table, _) = two_by_two(&mut tree, table);

    tree.evaluate(&mut h.measure()).unwrap();

    let t = tree.get(table).unwrap().as_table().unwrap();
    assert_eq!(t.fills.len(), 4);
    assert_eq!(t.borders.len(), 4);
    let fill = t.fills[1];
    let rect = *tree.children(fill).last().unwrap();
    let shape = tree.get(rect).unwrap().as_shape().unwrap();
    assert_eq!(shape.local_bounds().size(), Size::new(30.0, 40.0));
}

#[test]
fn test_clear_drops_cells_and_sizing() {
    let mut h = TestHarness::new();
    let mut tree = create_test_tree();
    let (table, cells) = two_by_two(&mut tree, Table::new(2, 2).with_fill(Color::WHITE));
    tree.evaluate(&mut h.measure()).unwrap();

    tree.clear(table).unwrap();

    let t = tree.get(table).unwrap().as_table().unwrap();
    assert!(t.cells.is_empty());
    assert!(t.fills.is_empty());
    assert!(!t.is_sized());
    assert!(cells.iter().all(|c| !tree.contains(*c)));
}
