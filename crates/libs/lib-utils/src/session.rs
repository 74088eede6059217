//! # Session Ids
//!
//! Client- and server-side session ids have the shape
//! `<prefix>_<epoch millis>_<random base36>`. They correlate turns only and
//! carry no security meaning.

use crate::time::epoch_millis;
use rand::Rng;

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const RANDOM_LEN: usize = 11;

/// Generate a new session id with the given prefix.
pub fn generate_session_id(prefix: &str) -> String {
    let mut rng = rand::rng();
    let random: String = (0..RANDOM_LEN)
        .map(|_| BASE36[rng.random_range(0..BASE36.len())] as char)
        .collect();
    format!("{}_{}_{}", prefix, epoch_millis(), random)
}

/// Check whether `id` looks like a session id generated with `prefix`.
pub fn is_session_id(id: &str, prefix: &str) -> bool {
    let Some(rest) = id.strip_prefix(prefix).and_then(|r| r.strip_prefix('_')) else {
        return false;
    };
    let Some((millis, random)) = rest.split_once('_') else {
        return false;
    };
    !millis.is_empty()
        && millis.chars().all(|c| c.is_ascii_digit())
        && !random.is_empty()
        && random.chars().all(|c| c.is_ascii_alphanumeric())
}
