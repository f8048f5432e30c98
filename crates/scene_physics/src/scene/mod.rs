//! Scene graph module
//!
//! A minimal hierarchical transform graph. Nodes carry a local
//! position/rotation/scale and an optional parent; world transforms are
//! composed on demand by walking the parent chain. This is the node
//! abstraction the physics reconciliation path writes into; rendering
//! concerns live entirely outside this crate.

pub mod graph;

pub use graph::{NodeId, SceneError, SceneGraph, SceneNode};
