use std::io;

use keyring::Entry;
use log::info;
use rand::random;

const SERVICE_NAME: &str = "trade-academy";

/// Secure storage and retrieval of the master key that encrypts the
/// account store file at rest
pub struct SecureMasterKey {
    keyring: Entry,
}

impl SecureMasterKey {
    pub fn new() -> io::Result<Self> {
        let keyring = Entry::new(SERVICE_NAME, "master-key")
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
        Ok(Self { keyring })
    }

    /// Store a master key, hex-encoded, in the system keyring
    pub fn store_key(&self, key: &[u8]) -> io::Result<()> {
        let encoded = hex::encode(key);
        self.keyring
            .set_password(&encoded)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))
    }

    /// Retrieve the master key as raw bytes
    pub fn get_key(&self) -> io::Result<Vec<u8>> {
        let encoded = self
            .keyring
            .get_password()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
        hex::decode(encoded).map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))
    }

    /// Generate and store a fresh 32-byte key if none exists yet
    pub fn initialize_if_needed(&self) -> io::Result<()> {
        if self.keyring.get_password().is_err() {
            let new_key: Vec<u8> = (0..32).map(|_| random::<u8>()).collect();
            self.store_key(&new_key)?;
            info!("New master key generated and stored in system keyring");
        }
        Ok(())
    }
}

/// Keyring slot holding the CLI's active session token between runs.
/// This plays the role a session cookie plays in the web deployment: the
/// continuation credential the client presents on its next request.
pub struct SessionTokenSlot {
    keyring: Entry,
}

impl SessionTokenSlot {
    pub fn new() -> io::Result<Self> {
        let keyring = Entry::new(SERVICE_NAME, "session-token")
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
        Ok(Self { keyring })
    }

    pub fn store(&self, token: &str) -> io::Result<()> {
        self.keyring
            .set_password(token)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))
    }

    /// The stored token, or None when nobody is logged in on this machine
    pub fn get(&self) -> Option<String> {
        self.keyring.get_password().ok()
    }

    /// Drop the stored token. Missing entries are fine — clearing an
    /// already-empty slot mirrors logout idempotence.
    pub fn clear(&self) -> io::Result<()> {
        match self.keyring.delete_password() {
            Ok(()) => Ok(()),
            Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(io::Error::new(io::ErrorKind::Other, e.to_string())),
        }
    }
}
