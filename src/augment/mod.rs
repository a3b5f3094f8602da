//! Mixing-based augmentation of a single cube into a fixed-size collection.

pub mod collection;
pub mod mixing;
