use crate::crypto::{MAGIC_LEN, NONCE_LEN, VER_LEN};
use anyhow::{Context, Result, bail};

pub const VERSION_V1: u8 = 1;
pub const MAGIC: &[u8; MAGIC_LEN] = b"PWOB";

/// Blob prefix: `MAGIC (4) | VERSION (1) | NONCE (24)`.
///
/// Magic and version are fed to the cipher as associated data, so the
/// header is covered by the same tag as the payload.
#[derive(Debug)]
pub struct Header {
    version: u8,
    nonce: [u8; NONCE_LEN],
}

impl Header {
    pub const LEN: usize = MAGIC_LEN + VER_LEN + NONCE_LEN;

    pub fn new(nonce: [u8; NONCE_LEN]) -> Self {
        Self {
            version: VERSION_V1,
            nonce,
        }
    }

    pub fn nonce(&self) -> &[u8; NONCE_LEN] {
        &self.nonce
    }

    /// Associated data bound to every v1 ciphertext.
    pub fn aad() -> [u8; MAGIC_LEN + VER_LEN] {
        let mut aad = [0u8; MAGIC_LEN + VER_LEN];
        aad[..MAGIC_LEN].copy_from_slice(MAGIC);
        aad[MAGIC_LEN] = VERSION_V1;
        aad
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(Self::LEN);

        buf.extend_from_slice(MAGIC);
        buf.push(self.version);
        buf.extend_from_slice(&self.nonce);

        buf
    }

    pub fn from_bytes(data: &[u8]) -> Result<(Self, usize)> {
        if data.len() < Self::LEN {
            bail!("credential blob too short");
        }

        if &data[..MAGIC_LEN] != MAGIC {
            bail!("not a credential blob");
        }

        let version = data[MAGIC_LEN];
        if version != VERSION_V1 {
            bail!("unsupported credential blob version: {version}");
        }

        let offset = MAGIC_LEN + VER_LEN;
        let nonce: [u8; NONCE_LEN] = data[offset..offset + NONCE_LEN]
            .try_into()
            .context("invalid nonce length")?;

        Ok((Header { version, nonce }, offset + NONCE_LEN))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_roundtrip() {
        let header = Header::new([2u8; NONCE_LEN]);

        let bytes = header.to_bytes();
        let (parsed, offset) = Header::from_bytes(&bytes).unwrap();

        assert_eq!(offset, Header::LEN);
        assert_eq!(parsed.version, VERSION_V1);
        assert_eq!(parsed.nonce, header.nonce);
    }

    #[test]
    fn aad_matches_serialized_prefix() {
        let bytes = Header::new([0u8; NONCE_LEN]).to_bytes();
        assert_eq!(&bytes[..MAGIC_LEN + VER_LEN], &Header::aad());
    }

    #[test]
    fn header_invalid_magic_fails() {
        let mut data = vec![0u8; Header::LEN];
        data[..4].copy_from_slice(b"FAIL");

        assert!(Header::from_bytes(&data).is_err());
    }

    #[test]
    fn header_unsupported_version_fails() {
        let mut data = vec![0u8; Header::LEN];
        data[..4].copy_from_slice(MAGIC);
        data[4] = 99;

        assert!(Header::from_bytes(&data).is_err());
    }

    #[test]
    fn header_too_short_fails() {
        let data = vec![0u8; Header::LEN - 1];
        assert!(Header::from_bytes(&data).is_err());
    }
}
