//! Custom Resource Definitions

pub mod namespacelabel;

pub use namespacelabel::{NamespaceLabel, NamespaceLabelSpec};
