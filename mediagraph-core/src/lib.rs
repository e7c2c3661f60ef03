//! Typed entity graph over media-catalog API payloads.
//!
//! Flat, loosely-typed JSON fragments go in; `Arc`-shared typed nodes with
//! weak parent links come out. Nodes built from abbreviated listing
//! payloads upgrade themselves from the per-item detail endpoint on demand,
//! and a small `field__operator` filter language selects among fragments
//! before or after construction.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(missing_docs)]

pub mod entity;
pub mod envelope;
pub mod error;
pub mod filter;
pub mod materializer;
pub mod operator;
pub mod partial;
pub mod registry;
pub mod server;
pub mod transport;

pub use entity::{
    Entity, EntityCore, EntityRef, Fields, Node, Payload, WeakEntity, downcast,
};
pub use error::{Error, Result};
pub use filter::{FieldSource, Filter, Predicate, evaluate};
pub use materializer::{ItemKey, Paging, find_items, find_items_raw};
pub use operator::Operator;
pub use partial::{DetailsOptions, Flag};
pub use registry::Registry;
pub use server::Server;
pub use transport::{Method, QueryRequest, Transport};

/// Frequently used items for variant crates and callers.
pub mod prelude {
    pub use super::entity::{Entity, EntityRef, Fields, Node, Payload, WeakEntity};
    pub use super::error::{Error, Result};
    pub use super::filter::{FieldSource, Filter};
    pub use super::partial::{DetailsOptions, Flag};
    pub use super::server::Server;
    pub use super::transport::{Method, QueryRequest, Transport};
}
