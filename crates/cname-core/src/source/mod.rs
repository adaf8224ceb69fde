//! Endpoint source implementations

pub mod cname;
pub mod memory;

pub use cname::{CnameSource, trim_root_label};
pub use memory::MemoryEndpointSource;
