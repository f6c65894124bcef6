// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Spaceplan Topology
//!
//! The abstract input of the layout engine: a set of spaces (rooms, corridors,
//! stair and elevator cores) with size targets, and two independent kinds of
//! relationship between them.
//!
//! - **Adjacency**: two spaces must share a physical boundary.
//! - **Connection**: two spaces must be traversable (a door), optionally with
//!   opening size hints.
//!
//! Both relationships live on a single merged undirected edge per pair, so a
//! pair can be adjacent, connected, or both. The graph is built once with
//! [`TopologyGraph::from_parts`] and is read-only while a layout is solved.

pub mod circulation;
pub mod error;
pub mod graph;
pub mod model;

pub use error::{Error, Result};
pub use graph::{SpaceEdge, TopologyGraph};
pub use circulation::{CoreSide, CoreType};
pub use model::{
    AdjacencyEdge, ConnectionEdge, SpaceCategory, SpaceSpec, VerticalCoreSpec, DEFAULT_AREA_MIN,
    DEFAULT_AREA_TARGET,
};
