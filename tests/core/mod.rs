//! Core module tests for non-parser functionality
//!
//! Tests for:
//! - Settings persistence
//! - Schema setup
//! - Keyed lookups and upserts
