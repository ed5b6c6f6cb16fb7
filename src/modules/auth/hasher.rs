use log::warn;
use pbkdf2::pbkdf2;
use rand::Rng;

use crate::{HmacSha256, CREDENTIAL_KEY_LENGTH, CREDENTIAL_SALT_LENGTH, PBKDF2_ITERATIONS};

/// A stored password credential: the derived key plus the salt it was
/// derived with. The plaintext password is never kept.
#[derive(Debug, Clone, PartialEq)]
pub struct CredentialRecord {
    pub derived_key: Vec<u8>,
    pub salt: Vec<u8>,
}

impl CredentialRecord {
    /// Serialize the record to its storage form: `<derivedKeyHex>.<saltHex>`.
    /// This layout matches credentials persisted by earlier deployments.
    pub fn to_storage_string(&self) -> String {
        format!("{}.{}", hex::encode(&self.derived_key), hex::encode(&self.salt))
    }

    /// Parse a record from its storage form. Returns None for anything that
    /// is not two dot-separated hex fields.
    pub fn from_storage_string(stored: &str) -> Option<Self> {
        let mut parts = stored.splitn(2, '.');
        let key_hex = parts.next()?;
        let salt_hex = parts.next()?;
        let derived_key = hex::decode(key_hex).ok()?;
        let salt = hex::decode(salt_hex).ok()?;
        if derived_key.is_empty() || salt.is_empty() {
            return None;
        }
        Some(Self { derived_key, salt })
    }
}

/// Function to generate a fresh random salt for one password-set operation
pub fn generate_credential_salt() -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..CREDENTIAL_SALT_LENGTH).map(|_| rng.gen()).collect()
}

/// Function to derive the fixed-length credential key from a password and salt
fn derive_credential_key(password: &str, salt: &[u8]) -> Vec<u8> {
    let mut key = vec![0u8; CREDENTIAL_KEY_LENGTH];

    pbkdf2::<HmacSha256>(
        password.as_bytes(),
        salt,
        PBKDF2_ITERATIONS,
        &mut key,
    );

    key
}

/// Hash a password into a storable credential record. Every call draws a
/// fresh salt, so hashing the same password twice yields unrelated records.
pub fn hash_password(password: &str) -> CredentialRecord {
    let salt = generate_credential_salt();
    let derived_key = derive_credential_key(password, &salt);
    CredentialRecord { derived_key, salt }
}

/// Verify a supplied password against a stored credential record.
///
/// Re-derives the key with the stored salt and compares in constant time.
/// Returns false for a wrong password or an unparseable record; never errors.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let record = match CredentialRecord::from_storage_string(stored) {
        Some(record) => record,
        None => {
            warn!("Stored credential record is malformed; rejecting login");
            return false;
        }
    };

    let candidate = derive_credential_key(password, &record.salt);
    constant_time_eq(&candidate, &record.derived_key)
}

/// Compare two byte slices in constant time.
///
/// The loop always runs over the full candidate length: when the lengths
/// differ, the candidate is compared against itself so a length mismatch
/// costs the same as a full content mismatch, and the inequality is carried
/// in the initial accumulator instead of an early return.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    let (mut diff, reference) = if a.len() == b.len() {
        (0u8, b)
    } else {
        (1u8, a)
    };

    for (x, y) in a.iter().zip(reference.iter()) {
        diff |= x ^ y;
    }

    diff == 0
}
