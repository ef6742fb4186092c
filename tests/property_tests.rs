// Copyright 2025 Cowboy AI, LLC.

//! Property-Based Tests Entry Point
//!
//! This suite uses proptest to verify properties that must hold for all
//! valid inputs: zone allocation purity, logical-id determinism, and
//! CIDR subdivision arithmetic.

mod property;
