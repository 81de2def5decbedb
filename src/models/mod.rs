//! Data models for the gallery server.
//!
//! This module contains all domain models and data transfer objects (DTOs)
//! used throughout the application.

mod media;

pub use media::*;
