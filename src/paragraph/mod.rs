//! Paragraph-sized node groups and the builder that produces them.

mod builder;
mod group;

pub use builder::build_node_groups;
pub use group::{NodeGroup, NodeGroupItem};
