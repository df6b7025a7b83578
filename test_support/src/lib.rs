//! Test utilities for packgen.
//!
//! Provides stub generator scripts that stand in for the real packing-header
//! generator, and throwaway source trees laid out the way a Packfile expects.

pub mod generator;
pub mod workspace;

pub use generator::{GeneratorStub, StubScript, stub_generator};
pub use workspace::Workspace;
