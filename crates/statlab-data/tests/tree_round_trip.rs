use std::path::PathBuf;

use statlab_data::tree::{Entry, Leaf, LeafType, Shape, Tree, TreeError, TreeFile, TreeSchema};

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("statlab-{}-{name}", std::process::id()))
}

fn event_tree() -> Tree {
    let schema = TreeSchema::new()
        .with_branch("nHits", LeafType::I32, Shape::Scalar)
        .unwrap()
        .with_branch("amplitude", LeafType::F64, Shape::counted("nHits", 1))
        .unwrap()
        .with_branch("hitCoord", LeafType::F64, Shape::counted("nHits", 3))
        .unwrap()
        .with_branch("outPionEnergies", LeafType::F64, Shape::Fixed(3))
        .unwrap()
        .with_branch("flags", LeafType::I32, Shape::Fixed(2))
        .unwrap();
    let mut tree = Tree::new("test", schema);
    for event in 0..50_i32 {
        let hits = event % 7;
        let n = usize::try_from(hits).unwrap();
        let base = f64::from(event);
        tree.push(Entry::new(vec![
            Leaf::I32(vec![hits]),
            Leaf::F64((0..n).map(|i| base + 0.25 * i as f64).collect()),
            Leaf::F64((0..3 * n).map(|i| -base / 3.0 + i as f64 * 1e-7).collect()),
            Leaf::F64(vec![base.sqrt(), f64::MIN_POSITIVE, -0.0]),
            Leaf::I32(vec![event, i32::MIN]),
        ]))
        .unwrap();
    }
    tree
}

#[test]
fn round_trip_through_file_preserves_every_value() {
    let path = temp_path("round-trip.stl");
    let tree = event_tree();
    let three_pi = {
        let schema = TreeSchema::new()
            .with_branch("outPionEnergies", LeafType::F64, Shape::Fixed(3))
            .unwrap();
        let mut t = Tree::new("threePiTree", schema);
        t.push(Entry::new(vec![Leaf::F64(vec![60.0, 70.0, 59.5])]))
            .unwrap();
        t
    };

    let mut writer = TreeFile::create(&path).unwrap();
    writer.write_tree(&tree).unwrap();
    writer.write_tree(&three_pi).unwrap();
    writer.finish().unwrap();

    let file = TreeFile::open(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    let read_back = file.read_tree("test").unwrap();
    assert_eq!(read_back, &tree);
    for (written, read) in tree.entries().iter().zip(read_back.entries()) {
        let written = written.leaf(3).as_f64().unwrap();
        let read = read.leaf(3).as_f64().unwrap();
        // bit-exact, including the sign of zero
        for (a, b) in written.iter().zip(read) {
            assert_eq!(a.to_bits(), b.to_bits());
        }
    }
    assert_eq!(file.read_tree("threePiTree").unwrap(), &three_pi);
}

#[test]
fn missing_file_and_missing_tree_are_reported() {
    let missing = temp_path("does-not-exist.stl");
    let err = TreeFile::open(&missing).unwrap_err();
    assert!(matches!(err, TreeError::Open { .. }));
    assert!(err.to_string().starts_with("error opening file"));

    let mut bytes = Vec::new();
    TreeFile::write_to(&mut bytes, &[event_tree()]).unwrap();
    let file = TreeFile::read_from(&mut bytes.as_slice()).unwrap();
    assert!(matches!(
        file.read_tree("PT"),
        Err(TreeError::MissingTree { .. })
    ));
}

#[test]
fn truncated_file_is_an_io_error() {
    let mut bytes = Vec::new();
    TreeFile::write_to(&mut bytes, &[event_tree()]).unwrap();
    bytes.truncate(bytes.len() - 3);
    assert!(matches!(
        TreeFile::read_from(&mut bytes.as_slice()),
        Err(TreeError::Io(_))
    ));
}
