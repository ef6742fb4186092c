// Copyright 2025 Cowboy AI, LLC.

//! Property test modules

mod allocation;
mod cidr;
mod naming;
