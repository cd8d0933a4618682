//! Vector layer cleanup
//!
//! - Connectivity: drop line features whose endpoints touch nothing else
//! - Attributes: drop unnamed features, group parcels by owner
//! - Per-layer network cleaning

mod attributes;
mod connectivity;

pub use attributes::{
    clean_network, drop_missing_attribute, group_by_attribute, NetworkKind, NAME_ATTRIBUTE,
    OWNER_ATTRIBUTE,
};
pub use connectivity::{filter_connected, ConnectivityFilter, ConnectivityParams};
