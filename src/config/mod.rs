// ABOUTME: Configuration module for the turn service
// ABOUTME: Re-exports the environment-driven ServerConfig and its parts
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VoxLoom

/// Environment variable parsing and validation
pub mod environment;

pub use environment::{
    CapabilityTimeouts, DatabaseConfig, DatabaseUrl, Environment, MediaConfig, ServerConfig,
    TtsMode,
};
