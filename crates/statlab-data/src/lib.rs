//! Persistent data for the statlab experiments.
//!
//! - [`tree`]: a small little-endian container of named tables ("trees") whose
//!   columns ("branches") hold fixed-size or counted arrays of `i32`/`f64`
//! - [`text`]: whitespace-delimited numeric text files
//!
//! # Examples
//!
//! ```
//! use statlab_data::tree::{Entry, Leaf, LeafType, Shape, Tree, TreeFile, TreeSchema};
//!
//! let schema = TreeSchema::new()
//!     .with_branch("nHits", LeafType::I32, Shape::Scalar)
//!     .unwrap()
//!     .with_branch("amplitude", LeafType::F64, Shape::counted("nHits", 1))
//!     .unwrap();
//! let mut tree = Tree::new("test", schema);
//! tree.push(Entry::new(vec![Leaf::I32(vec![2]), Leaf::F64(vec![1.5, 2.5])]))
//!     .unwrap();
//!
//! let mut bytes = Vec::new();
//! TreeFile::write_to(&mut bytes, &[tree.clone()]).unwrap();
//! let file = TreeFile::read_from(&mut bytes.as_slice()).unwrap();
//! assert_eq!(file.read_tree("test").unwrap(), &tree);
//! ```

pub mod text;
pub mod tree;
