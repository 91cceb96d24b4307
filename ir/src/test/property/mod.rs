//! Property-based tests for the tensor/axis model.

pub mod generators;

#[cfg(test)]
mod split_props;
