//! Identifier generation. When a client does not supply a conversation or
//! reference id, the driver generates one: a v4 UUID, or a
//! `gopay-<unix>-<rand8>` form for identifiers that are logged or shown.
//! We standardise on the UUID form for anything
//! synthesised inside the gateway and keep the `gopay-` form available for
//! drivers that want a shorter, grep-friendly id in provider-side logs.

use nanoid::nanoid;

const NANOID_ALPHABET: [char; 36] = [
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i',
    'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z',
];

/// URL-safe, 64-symbol alphabet (`A-Za-z0-9-_`) used where the entropy floor
/// actually matters, e.g. correlator tokens.
const URL_SAFE_ALPHABET: [char; 64] = [
    'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O', 'P', 'Q', 'R', 'S',
    'T', 'U', 'V', 'W', 'X', 'Y', 'Z', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l',
    'm', 'n', 'o', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z', '0', '1', '2', '3', '4',
    '5', '6', '7', '8', '9', '-', '_',
];

/// A v4 UUID, used when the client omitted `conversationId`/`referenceId`.
pub fn generate_uuid() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// `gopay-<unix-seconds>-<rand8>`, used for driver-internal ids that should
/// stay short in provider request logs.
pub fn generate_gopay_id(unix_seconds: i64) -> String {
    format!("gopay-{unix_seconds}-{}", nanoid!(8, &NANOID_ALPHABET))
}

/// A URL-safe opaque id of at least 128 bits of entropy, used by the
/// callback correlator's tokens. 22 characters from a 64-symbol alphabet
/// carries 22 * 6 = 132 bits.
pub fn generate_correlator_token() -> String {
    nanoid!(22, &URL_SAFE_ALPHABET)
}
