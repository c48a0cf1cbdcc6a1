//! Key construction for the shared store.
//!
//! Every key is `<prefix>:<zone>` or `<prefix>:<zone>:<peer>`. The zone and
//! peer segments are the only namespacing between zones sharing one store.

/// Consecutive success counter of a peer.
pub fn ok_key(zone: &str, peer: &str) -> String {
    format!("ok:{}:{}", zone, peer)
}

/// Consecutive failure counter of a peer.
pub fn nok_key(zone: &str, peer: &str) -> String {
    format!("nok:{}:{}", zone, peer)
}

/// Down flag of a peer (non-zero = down).
pub fn down_key(zone: &str, peer: &str) -> String {
    format!("d:{}:{}", zone, peer)
}

/// Version counter of a zone.
pub fn version_key(zone: &str) -> String {
    format!("v:{}", zone)
}

/// Leader lock of a zone.
pub fn lock_key(zone: &str) -> String {
    format!("l:{}", zone)
}
