#![forbid(unsafe_code)]

//! Tab-separated tables connecting the two stages.
//!
//! | table | columns |
//! |---|---|
//! | nodes | `id, x, y, z` (coordinates to 4 decimals) |
//! | edges | `source_id, target_id` |
//! | smoothed edges | `source_id, target_id, p0_x, p0_y, p0_z, ...` |

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord, Writer, WriterBuilder};
use thiserror::Error;

use crate::generator::EdgeSink;
use crate::model::{Edge, Node, NodeId, Point3, SmoothedEdge};

/// Default file name of the nodes table.
pub const NODES_FILE: &str = "nodes.tsv";
/// Default file name of the edges table.
pub const EDGES_FILE: &str = "edges.tsv";
/// Default file name of the smoothed edges table.
pub const SMOOTHED_EDGES_FILE: &str = "smoothed_edges.tsv";

const NODE_COLUMNS: [&str; 4] = ["id", "x", "y", "z"];
const EDGE_COLUMNS: [&str; 2] = ["source_id", "target_id"];
const AXES: [&str; 3] = ["x", "y", "z"];

/// Error type for table reads and writes.
#[derive(Error, Debug)]
pub enum TableError {
    /// The file could not be opened or created.
    #[error("failed to open {path}: {source}")]
    Open {
        /// Table path.
        path: PathBuf,
        /// Underlying error.
        source: csv::Error,
    },
    /// A required header is absent.
    #[error("{path}: missing column '{column}'")]
    MissingColumn {
        /// Table path.
        path: PathBuf,
        /// Column name.
        column: String,
    },
    /// A cell could not be parsed.
    #[error("{path}:{line}: invalid {column} value '{value}'")]
    InvalidValue {
        /// Table path.
        path: PathBuf,
        /// 1-based line number.
        line: u64,
        /// Column name.
        column: String,
        /// Raw cell contents.
        value: String,
    },
    /// A smoothed edge carries the wrong number of points for the table header.
    #[error("smoothed edge {source_id}->{target_id} has {found} points, expected {expected}")]
    PointCount {
        /// Source of the offending edge.
        source_id: NodeId,
        /// Target of the offending edge.
        target_id: NodeId,
        /// Points on the edge.
        found: usize,
        /// Points declared by the header.
        expected: usize,
    },
    /// CSV error while reading or writing records.
    #[error(transparent)]
    Csv(#[from] csv::Error),
    /// I/O error while flushing.
    #[error(transparent)]
    Io(#[from] io::Error),
}

fn tsv_writer(path: &Path) -> Result<Writer<File>, TableError> {
    WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(path)
        .map_err(|source| TableError::Open {
            path: path.to_path_buf(),
            source,
        })
}

struct TsvTable {
    path: PathBuf,
    reader: csv::Reader<File>,
    headers: StringRecord,
}

impl TsvTable {
    fn open(path: &Path) -> Result<Self, TableError> {
        let mut reader = ReaderBuilder::new()
            .delimiter(b'\t')
            .from_path(path)
            .map_err(|source| TableError::Open {
                path: path.to_path_buf(),
                source,
            })?;
        let headers = reader.headers()?.clone();
        Ok(Self {
            path: path.to_path_buf(),
            reader,
            headers,
        })
    }

    fn column(&self, name: &str) -> Result<usize, TableError> {
        self.headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| TableError::MissingColumn {
                path: self.path.clone(),
                column: name.to_string(),
            })
    }
}

fn parse_cell<T: std::str::FromStr>(
    path: &Path,
    record: &StringRecord,
    idx: usize,
    column: &str,
) -> Result<T, TableError> {
    let raw = record.get(idx).unwrap_or("").trim();
    raw.parse().map_err(|_| TableError::InvalidValue {
        path: path.to_path_buf(),
        line: record.position().map(|p| p.line()).unwrap_or(0),
        column: column.to_string(),
        value: raw.to_string(),
    })
}

/// Writes the nodes table. Returns the number of rows written.
pub fn write_nodes(path: &Path, nodes: &[Node]) -> Result<u64, TableError> {
    let mut writer = tsv_writer(path)?;
    writer.write_record(NODE_COLUMNS)?;
    for node in nodes {
        writer.write_record([
            node.id.to_string(),
            format!("{:.4}", node.pos.x),
            format!("{:.4}", node.pos.y),
            format!("{:.4}", node.pos.z),
        ])?;
    }
    writer.flush()?;
    Ok(nodes.len() as u64)
}

/// Reads the nodes table in file order.
pub fn read_nodes(path: &Path) -> Result<Vec<Node>, TableError> {
    let mut table = TsvTable::open(path)?;
    let idx = [
        table.column("id")?,
        table.column("x")?,
        table.column("y")?,
        table.column("z")?,
    ];
    let mut nodes = Vec::new();
    for result in table.reader.records() {
        let record = result?;
        let path = table.path.as_path();
        nodes.push(Node {
            id: parse_cell(path, &record, idx[0], "id")?,
            pos: Point3::new(
                parse_cell(path, &record, idx[1], "x")?,
                parse_cell(path, &record, idx[2], "y")?,
                parse_cell(path, &record, idx[3], "z")?,
            ),
        });
    }
    Ok(nodes)
}

/// Streams edges into the edges table as they are drawn.
pub struct EdgeTableWriter {
    writer: Writer<File>,
    written: u64,
}

impl EdgeTableWriter {
    /// Creates the table and writes its header.
    pub fn create(path: &Path) -> Result<Self, TableError> {
        let mut writer = tsv_writer(path)?;
        writer.write_record(EDGE_COLUMNS)?;
        Ok(Self { writer, written: 0 })
    }

    /// Appends one edge.
    pub fn write(&mut self, edge: Edge) -> Result<(), TableError> {
        self.writer
            .write_record([edge.source.to_string(), edge.target.to_string()])?;
        self.written += 1;
        Ok(())
    }

    /// Flushes buffered rows and returns the number written.
    pub fn finish(mut self) -> Result<u64, TableError> {
        self.writer.flush()?;
        Ok(self.written)
    }
}

impl EdgeSink for EdgeTableWriter {
    fn push(&mut self, edge: Edge) -> io::Result<()> {
        Ok(self.write(edge)?)
    }
}

impl From<TableError> for io::Error {
    fn from(err: TableError) -> Self {
        match err {
            TableError::Io(err) => err,
            TableError::Csv(err) => err.into(),
            other => io::Error::other(other),
        }
    }
}

/// Writes a whole edges table. Returns the number of rows written.
pub fn write_edges(path: &Path, edges: &[Edge]) -> Result<u64, TableError> {
    let mut writer = EdgeTableWriter::create(path)?;
    for &edge in edges {
        writer.write(edge)?;
    }
    writer.finish()
}

/// Reads the edges table in file order.
pub fn read_edges(path: &Path) -> Result<Vec<Edge>, TableError> {
    let mut table = TsvTable::open(path)?;
    let source = table.column("source_id")?;
    let target = table.column("target_id")?;
    let mut edges = Vec::new();
    for result in table.reader.records() {
        let record = result?;
        let path = table.path.as_path();
        edges.push(Edge::new(
            parse_cell(path, &record, source, "source_id")?,
            parse_cell(path, &record, target, "target_id")?,
        ));
    }
    Ok(edges)
}

/// Header of a smoothed edges table with `points` interior points.
pub fn smoothed_edge_columns(points: usize) -> Vec<String> {
    let mut columns: Vec<String> = EDGE_COLUMNS.iter().map(|c| c.to_string()).collect();
    for i in 0..points {
        for axis in AXES {
            columns.push(format!("p{i}_{axis}"));
        }
    }
    columns
}

/// Writes the smoothed edges table with `points` interior points per row. Every
/// edge must carry exactly that many points.
pub fn write_smoothed_edges(
    path: &Path,
    edges: &[SmoothedEdge],
    points: usize,
) -> Result<u64, TableError> {
    let mut writer = tsv_writer(path)?;
    writer.write_record(smoothed_edge_columns(points))?;
    let mut row: Vec<String> = Vec::with_capacity(2 + 3 * points);
    for edge in edges {
        if edge.points.len() != points {
            return Err(TableError::PointCount {
                source_id: edge.source,
                target_id: edge.target,
                found: edge.points.len(),
                expected: points,
            });
        }
        row.clear();
        row.push(edge.source.to_string());
        row.push(edge.target.to_string());
        for point in &edge.points {
            row.extend(point.to_array().iter().map(|v| v.to_string()));
        }
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(edges.len() as u64)
}

/// Reads a smoothed edges table. The point count comes from the `pN_x` headers.
pub fn read_smoothed_edges(path: &Path) -> Result<Vec<SmoothedEdge>, TableError> {
    let mut table = TsvTable::open(path)?;
    let source = table.column("source_id")?;
    let target = table.column("target_id")?;
    let mut point_columns: Vec<[(usize, String); 3]> = Vec::new();
    loop {
        let i = point_columns.len();
        let [x, y, z] = AXES.map(|axis| format!("p{i}_{axis}"));
        if table.headers.iter().all(|h| h.trim() != x) {
            break;
        }
        point_columns.push([
            (table.column(&x)?, x),
            (table.column(&y)?, y),
            (table.column(&z)?, z),
        ]);
    }

    let mut edges = Vec::new();
    for result in table.reader.records() {
        let record = result?;
        let path = table.path.as_path();
        let mut points = Vec::with_capacity(point_columns.len());
        for [(xi, xn), (yi, yn), (zi, zn)] in &point_columns {
            points.push(Point3::new(
                parse_cell(path, &record, *xi, xn)?,
                parse_cell(path, &record, *yi, yn)?,
                parse_cell(path, &record, *zi, zn)?,
            ));
        }
        edges.push(SmoothedEdge {
            source: parse_cell(path, &record, source, "source_id")?,
            target: parse_cell(path, &record, target, "target_id")?,
            points,
        });
    }
    Ok(edges)
}
