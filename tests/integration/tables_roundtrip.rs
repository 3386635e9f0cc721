#![allow(missing_docs)]

use tempfile::TempDir;
use voxgraph::generator::EdgeSink;
use voxgraph::tables::{
    read_edges, read_nodes, read_smoothed_edges, write_edges, write_nodes, write_smoothed_edges,
    EdgeTableWriter, TableError, EDGES_FILE, NODES_FILE, SMOOTHED_EDGES_FILE,
};
use voxgraph::{Edge, Node, Point3, SmoothedEdge};

#[test]
fn nodes_read_back_at_table_precision() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join(NODES_FILE);
    let nodes = vec![
        Node {
            id: 0,
            pos: Point3::new(-100.0, 0.123_449, 12.5),
        },
        Node {
            id: 1,
            pos: Point3::new(99.999_96, -3.0, 7.777_77),
        },
    ];
    assert_eq!(write_nodes(&path, &nodes).expect("write"), 2);

    let read = read_nodes(&path).expect("read");
    assert_eq!(read.len(), 2);
    assert_eq!(read[0].pos, Point3::new(-100.0, 0.1234, 12.5));
    assert_eq!(read[1].pos, Point3::new(100.0, -3.0, 7.7778));
}

#[test]
fn columns_are_found_by_name() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join(NODES_FILE);
    std::fs::write(&path, "z\ty\tid\tx\n3\t2\t7\t1\n").expect("write");
    let nodes = read_nodes(&path).expect("read");
    let expected = Node {
        id: 7,
        pos: Point3::new(1.0, 2.0, 3.0),
    };
    assert_eq!(nodes, vec![expected]);
}

#[test]
fn streamed_edges_match_bulk_write() {
    let dir = TempDir::new().expect("tempdir");
    let edges: Vec<Edge> = (0..50).map(|i| Edge::new(i, (i * 7 + 3) % 50)).collect();

    let streamed = dir.path().join("streamed.tsv");
    let mut writer = EdgeTableWriter::create(&streamed).expect("create");
    for &edge in &edges {
        writer.push(edge).expect("push");
    }
    assert_eq!(writer.finish().expect("finish"), 50);

    let bulk = dir.path().join(EDGES_FILE);
    write_edges(&bulk, &edges).expect("write");

    assert_eq!(
        std::fs::read_to_string(&streamed).expect("streamed"),
        std::fs::read_to_string(&bulk).expect("bulk")
    );
    assert_eq!(read_edges(&bulk).expect("read"), edges);
}

#[test]
fn smoothed_edges_keep_full_precision() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join(SMOOTHED_EDGES_FILE);
    let edges = vec![
        SmoothedEdge {
            source: 4,
            target: 9,
            points: vec![Point3::new(1.0 / 3.0, -2.5, 1e-7), Point3::new(10.0 / 9.0, 0.0, 99.9)],
        },
        SmoothedEdge {
            source: 9,
            target: 4,
            points: vec![Point3::new(0.0, 0.0, 0.0), Point3::new(-1.0, -1.0, -1.0)],
        },
    ];
    write_smoothed_edges(&path, &edges, 2).expect("write");

    let header = std::fs::read_to_string(&path).expect("read");
    assert!(header.starts_with("source_id\ttarget_id\tp0_x\tp0_y\tp0_z\tp1_x\tp1_y\tp1_z\n"));
    assert_eq!(read_smoothed_edges(&path).expect("read back"), edges);
}

#[test]
fn edges_with_non_numeric_ids_are_rejected() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join(EDGES_FILE);
    std::fs::write(&path, "source_id\ttarget_id\n1\t2\n3\t-4\n").expect("write");
    let err = read_edges(&path).unwrap_err();
    assert!(
        matches!(err, TableError::InvalidValue { line: 3, ref column, .. } if column == "target_id"),
        "{err}"
    );
}
