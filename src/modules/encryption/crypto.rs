use std::io;

use aes::Aes256;
use block_modes::block_padding::Pkcs7;
use block_modes::{BlockMode, Cbc};
use rand::Rng;

type Aes256Cbc = Cbc<Aes256, Pkcs7>;

const IV_LENGTH: usize = 16;

/// Function to generate a random IV for AES encryption
fn generate_random_iv() -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..IV_LENGTH).map(|_| rng.gen()).collect()
}

/// Encrypt a payload under AES-256-CBC with a fresh random IV.
/// The IV is prepended to the ciphertext so the output is self-contained.
pub fn seal_data(plaintext: &[u8], key: &[u8]) -> io::Result<Vec<u8>> {
    let iv = generate_random_iv();
    let cipher = Aes256Cbc::new_from_slices(key, &iv)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;

    let mut sealed = iv;
    sealed.extend_from_slice(&cipher.encrypt_vec(plaintext));
    Ok(sealed)
}

/// Decrypt a payload produced by `seal_data`: the first 16 bytes are the
/// IV, the remainder the ciphertext.
pub fn open_sealed(sealed: &[u8], key: &[u8]) -> io::Result<Vec<u8>> {
    if sealed.len() < IV_LENGTH {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "sealed payload shorter than its IV",
        ));
    }
    let (iv, ciphertext) = sealed.split_at(IV_LENGTH);

    let cipher = Aes256Cbc::new_from_slices(key, iv)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;

    cipher
        .decrypt_vec(ciphertext)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "decryption failed"))
}
