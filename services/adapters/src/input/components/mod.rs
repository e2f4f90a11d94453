//! Shared building blocks for venue collectors

pub mod parsing_utils;
