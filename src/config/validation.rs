//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (checkers reference existing zones and stores)
//! - Detect duplicate names
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: DaemonConfig → Result<(), Vec<ValidationError>>
//! - Checker option values are validated by the scheduler at spawn time

use std::collections::HashSet;
use thiserror::Error;

use crate::config::schema::DaemonConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("workers must be at least 1")]
    NoWorkers,

    #[error("duplicate store \"{0}\"")]
    DuplicateStore(String),

    #[error("duplicate zone \"{0}\"")]
    DuplicateZone(String),

    #[error("zone \"{0}\" has a peer with an empty name")]
    EmptyPeerName(String),

    #[error("zone \"{zone}\" lists peer \"{peer}\" more than once")]
    DuplicatePeer { zone: String, peer: String },

    #[error("checker #{index} references unknown zone \"{zone}\"")]
    UnknownZone { index: usize, zone: String },

    #[error("checker #{index} references unknown store \"{shm}\"")]
    UnknownStore { index: usize, shm: String },
}

/// Validate a parsed configuration.
pub fn validate_config(config: &DaemonConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.workers == 0 {
        errors.push(ValidationError::NoWorkers);
    }

    let mut stores = HashSet::new();
    for store in &config.stores {
        if !stores.insert(store.name.as_str()) {
            errors.push(ValidationError::DuplicateStore(store.name.clone()));
        }
    }

    let mut zones = HashSet::new();
    for zone in &config.zones {
        if !zones.insert(zone.name.as_str()) {
            errors.push(ValidationError::DuplicateZone(zone.name.clone()));
        }

        let mut peers = HashSet::new();
        for peer in &zone.peers {
            if peer.name.is_empty() {
                errors.push(ValidationError::EmptyPeerName(zone.name.clone()));
            } else if !peers.insert(peer.name.as_str()) {
                errors.push(ValidationError::DuplicatePeer {
                    zone: zone.name.clone(),
                    peer: peer.name.clone(),
                });
            }
        }
    }

    // Missing options are reported by spawn_checker with its own wording.
    for (index, checker) in config.checkers.iter().enumerate() {
        if let Some(zone) = &checker.zone {
            if !zones.contains(zone.as_str()) {
                errors.push(ValidationError::UnknownZone { index, zone: zone.clone() });
            }
        }
        if let Some(shm) = &checker.shm {
            if !stores.contains(shm.as_str()) {
                errors.push(ValidationError::UnknownStore { index, shm: shm.clone() });
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
