//! Graph model: nodes, edges, field paths and branch traversal

mod model;
mod path;
mod walk;

pub use model::{id_from_value, Graph, Node};
pub use path::{FieldPath, Segment};
pub use walk::{closure, preorder};
