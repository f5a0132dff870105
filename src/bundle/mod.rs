//! Bundle descriptor emission.
//!
//! Turns a resolved module set into the flat record the packaging backend
//! consumes, and writes it out.

mod descriptor;
mod writer;

pub use descriptor::{BundleDescriptor, DescriptorBuilder, emit};
pub use writer::{OutputFormat, render, write_output};
