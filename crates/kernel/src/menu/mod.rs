//! Navigation destinations.
//!
//! The registry provides:
//! - Route matching for the HTTP fallback handler
//! - Navigation entries for the drawer
//! - Page titles and access rules per destination

mod registry;

pub use registry::{Destination, DestinationId, DestinationRegistry};
