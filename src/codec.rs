//! Authenticated encoding of a full credential collection.
//!
//! Blob layout:
//! ```text
//! MAGIC "PWOB" (4) | VERSION (1) | NONCE (24) | CIPHERTEXT + TAG
//! ```
//! The plaintext is the compact JSON array of entries in collection order.

use crate::crypto::{self, Header};
use crate::entry::Entry;
use crate::error::StoreError;
use crate::keys::SymmetricKey;
use zeroize::Zeroizing;

/// Outcome of decoding a blob.
///
/// `Corrupt` covers a wrong key, tampered bytes and a malformed payload
/// alike; callers cannot and should not tell them apart.
#[derive(Debug, PartialEq, Eq)]
pub enum Decoded {
    Collection(Vec<Entry>),
    Corrupt,
}

/// Serializes and encrypts the whole collection. A fresh nonce is drawn for
/// every call, so equal inputs give different blobs.
pub fn encode(entries: &[Entry], key: &SymmetricKey) -> Result<Vec<u8>, StoreError> {
    let plaintext = Zeroizing::new(serde_json::to_vec(entries)?);

    let (ciphertext, nonce) = crypto::encrypt(key.as_bytes(), &plaintext, &Header::aad())
        .map_err(|e| StoreError::Crypto(e.to_string()))?;

    let mut blob = Header::new(nonce).to_bytes();
    blob.extend_from_slice(&ciphertext);
    Ok(blob)
}

/// Authenticates, decrypts and parses a blob. Never fails loudly.
pub fn decode(blob: &[u8], key: &SymmetricKey) -> Decoded {
    let Ok((header, offset)) = Header::from_bytes(blob) else {
        return Decoded::Corrupt;
    };

    let Ok(plaintext) =
        crypto::decrypt(key.as_bytes(), header.nonce(), &blob[offset..], &Header::aad())
    else {
        return Decoded::Corrupt;
    };

    match serde_json::from_slice::<Vec<Entry>>(&plaintext) {
        Ok(entries) => Decoded::Collection(entries),
        Err(_) => Decoded::Corrupt,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KEY_LEN;

    fn key(byte: u8) -> SymmetricKey {
        SymmetricKey::from_bytes(&[byte; KEY_LEN]).unwrap()
    }

    fn sample() -> Vec<Entry> {
        vec![
            Entry::new("Gmail", "a@b.com", "P@ss1234").unwrap(),
            Entry::new("GitHub", "octocat", "hunter2").unwrap(),
            Entry::new("Bank", "ünïcødé", "  spaced secret  ").unwrap(),
        ]
    }

    #[test]
    fn roundtrip_preserves_order_and_values() {
        let k = key(1);
        let blob = encode(&sample(), &k).unwrap();

        assert_eq!(decode(&blob, &k), Decoded::Collection(sample()));
    }

    #[test]
    fn empty_collection_roundtrips() {
        let k = key(1);
        let blob = encode(&[], &k).unwrap();

        assert_eq!(decode(&blob, &k), Decoded::Collection(Vec::new()));
    }

    #[test]
    fn encoding_is_randomized() {
        let k = key(1);
        assert_ne!(encode(&sample(), &k).unwrap(), encode(&sample(), &k).unwrap());
    }

    #[test]
    fn wrong_key_is_corrupt() {
        let blob = encode(&sample(), &key(1)).unwrap();
        assert_eq!(decode(&blob, &key(2)), Decoded::Corrupt);
    }

    #[test]
    fn any_flipped_bit_is_corrupt() {
        let k = key(7);
        let entries = vec![Entry::new("A", "b", "c").unwrap()];
        let blob = encode(&entries, &k).unwrap();

        for byte in 0..blob.len() {
            for bit in 0..8 {
                let mut tampered = blob.clone();
                tampered[byte] ^= 1 << bit;
                assert_eq!(
                    decode(&tampered, &k),
                    Decoded::Corrupt,
                    "flip of bit {bit} in byte {byte} went undetected"
                );
            }
        }
    }

    #[test]
    fn truncated_and_foreign_bytes_are_corrupt() {
        let k = key(3);
        let blob = encode(&sample(), &k).unwrap();

        assert_eq!(decode(&blob[..blob.len() - 1], &k), Decoded::Corrupt);
        assert_eq!(decode(&blob[..Header::LEN], &k), Decoded::Corrupt);
        assert_eq!(decode(b"", &k), Decoded::Corrupt);
        assert_eq!(decode(b"gAAAAABfernet-token", &k), Decoded::Corrupt);
    }

    #[test]
    fn authentic_but_malformed_payload_is_corrupt() {
        let k = key(4);
        let payloads: [&[u8]; 3] = [
            b"not json",
            br#"{"label":"x"}"#,
            br#"[{"label":"","username":"u","secret":"s"}]"#,
        ];
        for payload in payloads {
            let (ciphertext, nonce) =
                crypto::encrypt(k.as_bytes(), payload, &Header::aad()).unwrap();
            let mut blob = Header::new(nonce).to_bytes();
            blob.extend_from_slice(&ciphertext);

            assert_eq!(decode(&blob, &k), Decoded::Corrupt);
        }
    }
}
