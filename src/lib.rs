//! Packgen core library.
//!
//! Materialises generated packing headers (binary-layout headers for GPU
//! command packets) for several hardware versions. Each header is either
//! produced by an external generator script reading an XML packet
//! description, or copied from a prebuilt fallback checked into the source
//! tree. The resulting directories are exported as include roots for
//! downstream compilation.
//!
//! [`node::BuildGraphNode`] is the entry point for library users; the
//! [`manifest`] and [`runner`] modules back the `packgen` binary.

pub mod artifact;
pub mod ast;
pub mod cancel;
pub mod cli;
pub mod error;
pub mod fallback;
pub mod generator;
pub mod manifest;
pub mod node;
pub mod resolver;
pub mod runner;
pub mod target;
pub mod toolchain;
