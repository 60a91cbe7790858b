// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests Module

mod descriptor_parsing;
mod relationship_invariants;
