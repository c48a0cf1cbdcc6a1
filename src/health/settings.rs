//! Validated checker settings.
//!
//! [`CheckerOptions`] is what the operator wrote; [`CheckerSettings`] is what
//! the scheduler runs with. Conversion happens once, at spawn time.

use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;

use crate::config::CheckerOptions;
use crate::upstream::RegistryError;

/// Default per-operation probe timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(1000);

/// Default cycle interval.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(1000);

/// Shortest cycle interval accepted; smaller values are raised to it.
pub const MIN_INTERVAL: Duration = Duration::from_millis(2);

pub const DEFAULT_FALL: u32 = 5;
pub const DEFAULT_RISE: u32 = 2;
pub const DEFAULT_CONCURRENCY: usize = 1;

/// Errors returned synchronously by `spawn_checker`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckerError {
    /// A required option is absent.
    #[error("\"{0}\" option required")]
    MissingOption(&'static str),

    /// Probe type other than "http".
    #[error("only \"http\" type is supported right now, got \"{0}\"")]
    UnsupportedType(String),

    /// An option is present but unusable.
    #[error("invalid \"{option}\" option: {reason}")]
    InvalidOption { option: &'static str, reason: &'static str },

    /// `shm` names no store owned by the scheduler.
    #[error("shm \"{0}\" not found")]
    UnknownStore(String),

    /// The registry could not list the zone's peers.
    #[error("failed to get peers: {0}")]
    Registry(#[from] RegistryError),

    /// The recurring job could not be armed.
    #[error("failed to create timer: {0}")]
    Timer(String),
}

/// The probe protocols a checker can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeKind {
    /// Send raw request bytes, read one status line.
    Http,
}

/// Fully validated configuration of one checker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckerSettings {
    /// Name of the shared store the checker coordinates through.
    pub shm: String,
    pub zone: String,
    pub kind: ProbeKind,
    /// Raw bytes written to every peer.
    pub request: Vec<u8>,
    /// Shared by connect, send and receive.
    pub timeout: Duration,
    pub interval: Duration,
    pub fall: u32,
    pub rise: u32,
    /// `None` accepts any status line.
    pub valid_statuses: Option<HashSet<u16>>,
    pub concurrency: usize,
}

impl CheckerSettings {
    /// Apply defaults and reject missing or unusable options.
    pub fn from_options(options: &CheckerOptions) -> Result<Self, CheckerError> {
        let kind = match options.kind.as_deref() {
            None => return Err(CheckerError::MissingOption("type")),
            Some("http") => ProbeKind::Http,
            Some(other) => return Err(CheckerError::UnsupportedType(other.to_string())),
        };

        let request = options
            .http_req
            .as_ref()
            .ok_or(CheckerError::MissingOption("http_req"))?
            .clone()
            .into_bytes();
        if request.is_empty() {
            return Err(CheckerError::InvalidOption {
                option: "http_req",
                reason: "must not be empty",
            });
        }

        let shm = options.shm.clone().ok_or(CheckerError::MissingOption("shm"))?;
        let zone = options.zone.clone().ok_or(CheckerError::MissingOption("zone"))?;

        let timeout = options.timeout.map_or(DEFAULT_TIMEOUT, Duration::from_millis);
        let interval = options
            .interval
            .map_or(DEFAULT_INTERVAL, Duration::from_millis)
            .max(MIN_INTERVAL);

        let fall = options.fall.unwrap_or(DEFAULT_FALL);
        if fall == 0 {
            return Err(CheckerError::InvalidOption { option: "fall", reason: "must be at least 1" });
        }
        let rise = options.rise.unwrap_or(DEFAULT_RISE);
        if rise == 0 {
            return Err(CheckerError::InvalidOption { option: "rise", reason: "must be at least 1" });
        }

        let valid_statuses = options
            .valid_statuses
            .as_ref()
            .map(|codes| codes.iter().copied().collect::<HashSet<u16>>());

        Ok(Self {
            shm,
            zone,
            kind,
            request,
            timeout,
            interval,
            fall,
            rise,
            valid_statuses,
            concurrency: options.concurrency.unwrap_or(DEFAULT_CONCURRENCY),
        })
    }
}
