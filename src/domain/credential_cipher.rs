use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use blowfish::Blowfish;
use blowfish::cipher::generic_array::GenericArray;
use blowfish::cipher::{BlockEncrypt, KeyInit};
use thiserror::Error;

pub const BLOCK_SIZE: usize = 8;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid cipher key length: {length} bytes")]
pub struct KeyError {
    pub length: usize,
}

/// Encrypts `plaintext` with Blowfish in ECB mode and returns the base64 encoded ciphertext.
///
/// The login endpoint only accepts this exact construction: blocks are encrypted independently
/// without an IV, and padding is added only when the plaintext is not already block aligned.
pub fn encrypt(plaintext: &[u8], key: &[u8]) -> Result<String, KeyError> {
    let cipher =
        <Blowfish as KeyInit>::new_from_slice(key).map_err(|_| KeyError { length: key.len() })?;

    let mut buffer = plaintext.to_vec();
    if buffer.len() % BLOCK_SIZE != 0 {
        pad(&mut buffer, BLOCK_SIZE);
    }

    for block in buffer.chunks_exact_mut(BLOCK_SIZE) {
        cipher.encrypt_block(GenericArray::from_mut_slice(block));
    }

    Ok(STANDARD.encode(&buffer))
}

fn pad(buffer: &mut Vec<u8>, block_size: usize) {
    let pad_len = block_size - (buffer.len() % block_size);
    buffer.resize(buffer.len() + pad_len, pad_len as u8);
}
