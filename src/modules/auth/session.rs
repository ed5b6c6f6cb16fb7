use rand::Rng;

use crate::modules::utils::time::get_current_timestamp;
use crate::SESSION_MAX_AGE_SECS;

/// Function to generate an opaque, unguessable session token
///
/// 256 bits from the thread-local CSPRNG, hex-encoded. The token is the
/// client's only proof of a prior authentication, so it must not be
/// derivable from anything the client already knows.
pub fn generate_session_token() -> String {
    let mut rng = rand::thread_rng();
    let bytes: Vec<u8> = (0..32).map(|_| rng.gen()).collect();
    hex::encode(bytes)
}

/// Expiry timestamp for a session created now. Fixed max-age policy,
/// independent of activity.
pub fn session_expiry() -> u64 {
    get_current_timestamp() + SESSION_MAX_AGE_SECS
}
