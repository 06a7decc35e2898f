//! Named tables of numeric records stored in a single binary file.
//!
//! A [`Tree`] is a list of entries that all follow one [`TreeSchema`]. Each branch
//! of the schema holds `i32` or `f64` values in one of three shapes: a scalar, a
//! fixed-size array, or an array whose length is `counter × inner` where
//! `counter` is an earlier scalar `i32` branch of the same entry.
//!
//! # File layout
//!
//! All integers and floats are little-endian.
//!
//! ```text
//! magic "STLTREE\0" | version u16 = 1 | tree_count u32
//! per tree:   name | branch_count u32
//!   per branch: name | leaf u8 (0 = i32, 1 = f64) | shape u8 (0 scalar, 1 fixed, 2 counted)
//!               | fixed: n u32 | counted: counter name, inner u32
//!   entry_count u64
//!   per entry, per branch: the values, no length prefix
//! ```
//!
//! Strings are stored as a `u32` byte length followed by UTF-8 bytes.

use std::{
    fmt::Write as _,
    fs::File,
    io::{self, BufReader, BufWriter, Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
    string::FromUtf8Error,
};

use serde::Serialize;

const MAGIC: &[u8; 8] = b"STLTREE\0";
const VERSION: u16 = 1;
const TREE_COUNT_OFFSET: u64 = 10;

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum TreeError {
    #[display("error opening file '{}'", path.display())]
    Open { path: PathBuf, source: io::Error },
    #[display("I/O error: {_0}")]
    Io(#[error(source)] io::Error),
    #[display("not a tree file (bad magic bytes)")]
    BadMagic,
    #[display("unsupported tree file version {version}")]
    UnsupportedVersion { version: u16 },
    #[display("error finding tree '{name}'")]
    MissingTree { name: String },
    #[display("schema error: {message}")]
    Schema { message: String },
    #[display("invalid UTF-8 in name: {_0}")]
    Utf8(#[error(source)] FromUtf8Error),
}

impl From<io::Error> for TreeError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<FromUtf8Error> for TreeError {
    fn from(err: FromUtf8Error) -> Self {
        Self::Utf8(err)
    }
}

fn schema_error(message: impl Into<String>) -> TreeError {
    TreeError::Schema {
        message: message.into(),
    }
}

/// Element type of a branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, derive_more::Display)]
pub enum LeafType {
    #[display("i32")]
    I32,
    #[display("f64")]
    F64,
}

/// Number of values a branch holds per entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Shape {
    Scalar,
    Fixed(u32),
    /// `counter × inner` values, with `counter` read from a scalar `i32` branch.
    Counted { counter: String, inner: u32 },
}

impl Shape {
    pub fn counted(counter: impl Into<String>, inner: u32) -> Self {
        Self::Counted {
            counter: counter.into(),
            inner,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Branch {
    pub name: String,
    pub leaf: LeafType,
    pub shape: Shape,
}

/// Ordered list of branches.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct TreeSchema {
    branches: Vec<Branch>,
}

impl TreeSchema {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a branch.
    ///
    /// Names must be unique, and the counter of a counted branch must be an
    /// earlier scalar `i32` branch.
    pub fn with_branch(
        mut self,
        name: impl Into<String>,
        leaf: LeafType,
        shape: Shape,
    ) -> Result<Self, TreeError> {
        self.push_branch(Branch {
            name: name.into(),
            leaf,
            shape,
        })?;
        Ok(self)
    }

    fn push_branch(&mut self, branch: Branch) -> Result<(), TreeError> {
        if self.index_of(&branch.name).is_some() {
            return Err(schema_error(format!("duplicate branch '{}'", branch.name)));
        }
        if let Shape::Counted { counter, .. } = &branch.shape {
            let counter_branch = self
                .index_of(counter)
                .map(|idx| &self.branches[idx])
                .ok_or_else(|| {
                    schema_error(format!(
                        "branch '{}' is counted by unknown branch '{counter}'",
                        branch.name
                    ))
                })?;
            if counter_branch.leaf != LeafType::I32 || counter_branch.shape != Shape::Scalar {
                return Err(schema_error(format!(
                    "counter branch '{counter}' must be a scalar i32"
                )));
            }
        }
        self.branches.push(branch);
        Ok(())
    }

    #[must_use]
    pub fn branches(&self) -> &[Branch] {
        &self.branches
    }

    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.branches.iter().position(|b| b.name == name)
    }

    /// Number of values branch `idx` holds in an entry whose earlier leaves are `leaves`.
    fn value_count(&self, idx: usize, leaves: &[Leaf]) -> Result<usize, TreeError> {
        let branch = &self.branches[idx];
        match &branch.shape {
            Shape::Scalar => Ok(1),
            Shape::Fixed(n) => Ok(*n as usize),
            Shape::Counted { counter, inner } => {
                let counter_idx = self
                    .index_of(counter)
                    .ok_or_else(|| schema_error(format!("unknown counter '{counter}'")))?;
                let count = leaves
                    .get(counter_idx)
                    .and_then(Leaf::as_i32)
                    .and_then(|values| values.first().copied())
                    .ok_or_else(|| schema_error(format!("counter '{counter}' has no value")))?;
                let count = usize::try_from(count).map_err(|_| {
                    schema_error(format!("counter '{counter}' is negative ({count})"))
                })?;
                Ok(count * *inner as usize)
            }
        }
    }
}

/// Values of one branch in one entry.
#[derive(Debug, Clone, PartialEq)]
pub enum Leaf {
    I32(Vec<i32>),
    F64(Vec<f64>),
}

impl Leaf {
    #[must_use]
    pub fn leaf_type(&self) -> LeafType {
        match self {
            Self::I32(_) => LeafType::I32,
            Self::F64(_) => LeafType::F64,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::I32(values) => values.len(),
            Self::F64(values) => values.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn as_i32(&self) -> Option<&[i32]> {
        match self {
            Self::I32(values) => Some(values),
            Self::F64(_) => None,
        }
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<&[f64]> {
        match self {
            Self::F64(values) => Some(values),
            Self::I32(_) => None,
        }
    }
}

/// One record: a [`Leaf`] per branch, in schema order.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    leaves: Vec<Leaf>,
}

impl Entry {
    #[must_use]
    pub fn new(leaves: Vec<Leaf>) -> Self {
        Self { leaves }
    }

    #[must_use]
    pub fn leaves(&self) -> &[Leaf] {
        &self.leaves
    }

    #[must_use]
    pub fn leaf(&self, idx: usize) -> &Leaf {
        &self.leaves[idx]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    name: String,
    schema: TreeSchema,
    entries: Vec<Entry>,
}

impl Tree {
    pub fn new(name: impl Into<String>, schema: TreeSchema) -> Self {
        Self {
            name: name.into(),
            schema,
            entries: vec![],
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn schema(&self) -> &TreeSchema {
        &self.schema
    }

    #[must_use]
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Index of the branch called `name`, as a schema error when absent.
    pub fn branch_index(&self, name: &str) -> Result<usize, TreeError> {
        self.schema.index_of(name).ok_or_else(|| {
            schema_error(format!("tree '{}' has no branch '{name}'", self.name))
        })
    }

    /// Appends an entry after checking it against the schema.
    pub fn push(&mut self, entry: Entry) -> Result<(), TreeError> {
        let branches = self.schema.branches();
        if entry.leaves.len() != branches.len() {
            return Err(schema_error(format!(
                "entry has {} leaves, schema has {} branches",
                entry.leaves.len(),
                branches.len()
            )));
        }
        for (idx, (branch, leaf)) in branches.iter().zip(&entry.leaves).enumerate() {
            if leaf.leaf_type() != branch.leaf {
                return Err(schema_error(format!(
                    "branch '{}' expects {} values, got {}",
                    branch.name,
                    branch.leaf,
                    leaf.leaf_type()
                )));
            }
            let expected = self.schema.value_count(idx, &entry.leaves)?;
            if leaf.len() != expected {
                return Err(schema_error(format!(
                    "branch '{}' expects {expected} values, got {}",
                    branch.name,
                    leaf.len()
                )));
            }
        }
        self.entries.push(entry);
        Ok(())
    }

    /// Human-readable overview of the tree: entry count and one line per branch.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut out = format!(
            "tree '{}': {} entries, {} branches\n",
            self.name,
            self.len(),
            self.schema.branches().len()
        );
        for branch in self.schema.branches() {
            let shape = match &branch.shape {
                Shape::Scalar => String::new(),
                Shape::Fixed(n) => format!("[{n}]"),
                Shape::Counted { counter, inner: 1 } => format!("[{counter}]"),
                Shape::Counted { counter, inner } => format!("[{counter}][{inner}]"),
            };
            let _ = writeln!(out, "  {:<24} {:<4} {}", branch.name, branch.leaf, shape);
        }
        out
    }
}

/// An opened tree file: every tree it contains, loaded in memory.
#[derive(Debug, Clone, Default)]
pub struct TreeFile {
    trees: Vec<Tree>,
}

impl TreeFile {
    /// Creates (or truncates) `path` and returns a writer for it.
    pub fn create(path: impl AsRef<Path>) -> Result<TreeWriter<BufWriter<File>>, TreeError> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| TreeError::Open {
            path: path.to_owned(),
            source,
        })?;
        TreeWriter::new(BufWriter::new(file))
    }

    /// Reads every tree stored at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, TreeError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| TreeError::Open {
            path: path.to_owned(),
            source,
        })?;
        let file = Self::read_from(&mut BufReader::new(file))?;
        log::debug!("read {} trees from {}", file.trees.len(), path.display());
        Ok(file)
    }

    /// Writes `trees` as a complete tree file into `writer`.
    pub fn write_to<W: Write>(writer: &mut W, trees: &[Tree]) -> Result<(), TreeError> {
        write_header(writer, trees.len())?;
        for tree in trees {
            write_tree_body(writer, tree)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self, TreeError> {
        let mut magic = [0; 8];
        reader.read_exact(&mut magic)?;
        if &magic != MAGIC {
            return Err(TreeError::BadMagic);
        }
        let version = read_u16(reader)?;
        if version != VERSION {
            return Err(TreeError::UnsupportedVersion { version });
        }
        let tree_count = read_u32(reader)?;
        let trees = (0..tree_count)
            .map(|_| read_tree_body(reader))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { trees })
    }

    pub fn tree_names(&self) -> impl Iterator<Item = &str> {
        self.trees.iter().map(Tree::name)
    }

    #[must_use]
    pub fn trees(&self) -> &[Tree] {
        &self.trees
    }

    pub fn read_tree(&self, name: &str) -> Result<&Tree, TreeError> {
        self.trees
            .iter()
            .find(|tree| tree.name == name)
            .ok_or_else(|| TreeError::MissingTree {
                name: name.to_owned(),
            })
    }
}

/// Streams trees into a file; [`TreeWriter::finish`] patches the tree count.
#[derive(Debug)]
pub struct TreeWriter<W: Write + Seek> {
    writer: W,
    tree_count: u32,
}

impl<W: Write + Seek> TreeWriter<W> {
    pub fn new(mut writer: W) -> Result<Self, TreeError> {
        write_header(&mut writer, 0)?;
        Ok(Self {
            writer,
            tree_count: 0,
        })
    }

    pub fn write_tree(&mut self, tree: &Tree) -> Result<(), TreeError> {
        write_tree_body(&mut self.writer, tree)?;
        self.tree_count += 1;
        log::debug!("wrote tree '{}' with {} entries", tree.name, tree.len());
        Ok(())
    }

    /// Writes the final tree count and flushes, returning the underlying writer.
    pub fn finish(mut self) -> Result<W, TreeError> {
        let end = self.writer.stream_position()?;
        self.writer.seek(SeekFrom::Start(TREE_COUNT_OFFSET))?;
        self.writer.write_all(&self.tree_count.to_le_bytes())?;
        self.writer.seek(SeekFrom::Start(end))?;
        self.writer.flush()?;
        Ok(self.writer)
    }
}

fn write_header<W: Write>(writer: &mut W, tree_count: usize) -> Result<(), TreeError> {
    writer.write_all(MAGIC)?;
    writer.write_all(&VERSION.to_le_bytes())?;
    write_len(writer, tree_count)?;
    Ok(())
}

fn write_len<W: Write>(writer: &mut W, len: usize) -> Result<(), TreeError> {
    let len = u32::try_from(len).map_err(|_| schema_error(format!("length {len} exceeds u32")))?;
    writer.write_all(&len.to_le_bytes())?;
    Ok(())
}

fn write_str<W: Write>(writer: &mut W, s: &str) -> Result<(), TreeError> {
    write_len(writer, s.len())?;
    writer.write_all(s.as_bytes())?;
    Ok(())
}

fn write_tree_body<W: Write>(writer: &mut W, tree: &Tree) -> Result<(), TreeError> {
    write_str(writer, &tree.name)?;
    write_len(writer, tree.schema.branches.len())?;
    for branch in &tree.schema.branches {
        write_str(writer, &branch.name)?;
        let leaf: u8 = match branch.leaf {
            LeafType::I32 => 0,
            LeafType::F64 => 1,
        };
        writer.write_all(&[leaf])?;
        match &branch.shape {
            Shape::Scalar => writer.write_all(&[0])?,
            Shape::Fixed(n) => {
                writer.write_all(&[1])?;
                writer.write_all(&n.to_le_bytes())?;
            }
            Shape::Counted { counter, inner } => {
                writer.write_all(&[2])?;
                write_str(writer, counter)?;
                writer.write_all(&inner.to_le_bytes())?;
            }
        }
    }
    writer.write_all(&(tree.entries.len() as u64).to_le_bytes())?;
    for entry in &tree.entries {
        for leaf in &entry.leaves {
            match leaf {
                Leaf::I32(values) => {
                    for v in values {
                        writer.write_all(&v.to_le_bytes())?;
                    }
                }
                Leaf::F64(values) => {
                    for v in values {
                        writer.write_all(&v.to_le_bytes())?;
                    }
                }
            }
        }
    }
    Ok(())
}

fn read_array<R: Read, const N: usize>(reader: &mut R) -> Result<[u8; N], TreeError> {
    let mut buf = [0; N];
    reader.read_exact(&mut buf)?;
    Ok(buf)
}

fn read_u8<R: Read>(reader: &mut R) -> Result<u8, TreeError> {
    Ok(read_array::<_, 1>(reader)?[0])
}

fn read_u16<R: Read>(reader: &mut R) -> Result<u16, TreeError> {
    Ok(u16::from_le_bytes(read_array(reader)?))
}

fn read_u32<R: Read>(reader: &mut R) -> Result<u32, TreeError> {
    Ok(u32::from_le_bytes(read_array(reader)?))
}

fn read_u64<R: Read>(reader: &mut R) -> Result<u64, TreeError> {
    Ok(u64::from_le_bytes(read_array(reader)?))
}

fn read_str<R: Read>(reader: &mut R) -> Result<String, TreeError> {
    let len = u64::from(read_u32(reader)?);
    let mut bytes = Vec::new();
    reader.by_ref().take(len).read_to_end(&mut bytes)?;
    if bytes.len() as u64 != len {
        return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
    }
    Ok(String::from_utf8(bytes)?)
}

fn read_tree_body<R: Read>(reader: &mut R) -> Result<Tree, TreeError> {
    let name = read_str(reader)?;
    let branch_count = read_u32(reader)?;
    let mut schema = TreeSchema::new();
    for _ in 0..branch_count {
        let branch_name = read_str(reader)?;
        let leaf = match read_u8(reader)? {
            0 => LeafType::I32,
            1 => LeafType::F64,
            other => return Err(schema_error(format!("unknown leaf type {other}"))),
        };
        let shape = match read_u8(reader)? {
            0 => Shape::Scalar,
            1 => Shape::Fixed(read_u32(reader)?),
            2 => {
                let counter = read_str(reader)?;
                let inner = read_u32(reader)?;
                Shape::Counted { counter, inner }
            }
            other => return Err(schema_error(format!("unknown shape tag {other}"))),
        };
        schema.push_branch(Branch {
            name: branch_name,
            leaf,
            shape,
        })?;
    }

    let entry_count = read_u64(reader)?;
    let mut tree = Tree::new(name, schema);
    for _ in 0..entry_count {
        let mut leaves = Vec::with_capacity(tree.schema.branches.len());
        for idx in 0..tree.schema.branches.len() {
            let count = tree.schema.value_count(idx, &leaves)?;
            let leaf = match tree.schema.branches[idx].leaf {
                LeafType::I32 => Leaf::I32(
                    (0..count)
                        .map(|_| read_array(reader).map(i32::from_le_bytes))
                        .collect::<Result<_, _>>()?,
                ),
                LeafType::F64 => Leaf::F64(
                    (0..count)
                        .map(|_| read_array(reader).map(f64::from_le_bytes))
                        .collect::<Result<_, _>>()?,
                ),
            };
            leaves.push(leaf);
        }
        tree.entries.push(Entry::new(leaves));
    }
    Ok(tree)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn hits_schema() -> TreeSchema {
        TreeSchema::new()
            .with_branch("nHits", LeafType::I32, Shape::Scalar)
            .unwrap()
            .with_branch("hitCoord", LeafType::F64, Shape::counted("nHits", 3))
            .unwrap()
    }

    #[test]
    fn test_schema_rejects_bad_counters() {
        assert!(matches!(
            TreeSchema::new().with_branch("x", LeafType::F64, Shape::counted("n", 1)),
            Err(TreeError::Schema { .. })
        ));
        let schema = TreeSchema::new()
            .with_branch("n", LeafType::F64, Shape::Scalar)
            .unwrap();
        assert!(schema.with_branch("x", LeafType::F64, Shape::counted("n", 1)).is_err());
        assert!(
            hits_schema()
                .with_branch("nHits", LeafType::I32, Shape::Scalar)
                .is_err()
        );
    }

    #[test]
    fn test_push_validates_lengths() {
        let mut tree = Tree::new("test", hits_schema());
        assert!(
            tree.push(Entry::new(vec![Leaf::I32(vec![2]), Leaf::F64(vec![0.0; 6])]))
                .is_ok()
        );
        assert!(
            tree.push(Entry::new(vec![Leaf::I32(vec![2]), Leaf::F64(vec![0.0; 5])]))
                .is_err()
        );
        assert!(
            tree.push(Entry::new(vec![Leaf::I32(vec![-1]), Leaf::F64(vec![])]))
                .is_err()
        );
        assert!(
            tree.push(Entry::new(vec![Leaf::F64(vec![2.0]), Leaf::F64(vec![0.0; 6])]))
                .is_err()
        );
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_writer_patches_tree_count() {
        let mut tree = Tree::new("test", hits_schema());
        tree.push(Entry::new(vec![Leaf::I32(vec![1]), Leaf::F64(vec![1.0, 2.0, 3.0])]))
            .unwrap();
        let mut writer = TreeWriter::new(Cursor::new(Vec::new())).unwrap();
        writer.write_tree(&tree).unwrap();
        writer.write_tree(&Tree::new("empty", TreeSchema::new())).unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        let file = TreeFile::read_from(&mut bytes.as_slice()).unwrap();
        assert_eq!(file.tree_names().collect::<Vec<_>>(), ["test", "empty"]);
        assert_eq!(file.read_tree("test").unwrap(), &tree);
        assert!(file.read_tree("empty").unwrap().is_empty());
    }

    #[test]
    fn test_read_errors() {
        assert!(matches!(
            TreeFile::read_from(&mut &b"NOTATREE\x01\x00\x00\x00\x00\x00"[..]),
            Err(TreeError::BadMagic)
        ));
        let mut bytes = MAGIC.to_vec();
        bytes.extend_from_slice(&7u16.to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes());
        assert!(matches!(
            TreeFile::read_from(&mut bytes.as_slice()),
            Err(TreeError::UnsupportedVersion { version: 7 })
        ));
        let empty = TreeFile::default();
        let err = empty.read_tree("PT").unwrap_err();
        assert_eq!(err.to_string(), "error finding tree 'PT'");
    }

    #[test]
    fn test_corrupt_name_length_is_an_io_error() {
        let mut bytes = MAGIC.to_vec();
        bytes.extend_from_slice(&VERSION.to_le_bytes());
        bytes.extend_from_slice(&1u32.to_le_bytes());
        bytes.extend_from_slice(&u32::MAX.to_le_bytes());
        bytes.extend_from_slice(b"test");
        assert!(matches!(
            TreeFile::read_from(&mut bytes.as_slice()),
            Err(TreeError::Io(err)) if err.kind() == io::ErrorKind::UnexpectedEof
        ));
    }

    #[test]
    fn test_summary_lists_branches() {
        let summary = Tree::new("test", hits_schema()).summary();
        assert!(summary.starts_with("tree 'test': 0 entries, 2 branches"));
        assert!(summary.contains("[nHits][3]"));
    }
}
