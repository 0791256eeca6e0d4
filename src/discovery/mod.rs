//! Aggregated discovery.
//!
//! # Data Flow
//! ```text
//! Options::apply_to
//!     → installs ResourceManager under the "apis" root
//! API group registration
//!     → add_group_version / remove_group_version
//! GET /apis
//!     → discovery_document() (APIGroupDiscoveryList JSON)
//! ```
//!
//! # Design Decisions
//! - Registry is shared and concurrent; handlers read while groups register
//! - Ordering is computed on read, writers never re-sort

pub mod manager;

pub use manager::{
    ApiGroupDiscovery, ApiResourceDiscovery, ApiVersionDiscovery, DiscoveryDocument,
    ResourceManager, ResourceScope, DISCOVERY_ROOT,
};
