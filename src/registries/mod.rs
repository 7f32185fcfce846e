//! Concrete registry client implementations

pub mod npm;

pub use npm::NpmRegistryClient;
