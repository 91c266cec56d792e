//! Integration tests for codepack

mod concatenation;
mod scenario;
mod selection_properties;
mod session_toggles;
mod support;
mod tiered_store;
mod tree_acquisition;
