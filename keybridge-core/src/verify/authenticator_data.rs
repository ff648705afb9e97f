//! Authenticator data parsing
//!
//! Layout per the WebAuthn spec: 32-byte rpIdHash, 1 flag byte, 4-byte
//! big-endian counter, then (when the AT flag is set) the attested
//! credential data: 16-byte AAGUID, 2-byte id length, the credential id,
//! and the COSE public key as a CBOR map. Extensions may trail the key, so
//! the key's byte length has to be measured by CBOR decoding, not assumed.

const FLAG_UP: u8 = 1 << 0;
const FLAG_UV: u8 = 1 << 2;
const FLAG_AT: u8 = 1 << 6;

#[derive(Debug, thiserror::Error)]
pub enum AuthDataError {
    #[error("authenticator data truncated ({0} bytes)")]
    Truncated(usize),
    #[error("attested credential data malformed")]
    BadAttestedCredential,
}

/// Attested credential data present in registration responses.
#[derive(Debug, Clone)]
pub struct AttestedCredentialData {
    pub aaguid: [u8; 16],
    pub credential_id: Vec<u8>,
    /// Raw COSE_Key CBOR, exactly as the authenticator produced it. This is
    /// what the credential store persists.
    pub public_key: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct AuthenticatorData {
    pub rp_id_hash: [u8; 32],
    pub flags: u8,
    pub counter: u32,
    pub attested_credential: Option<AttestedCredentialData>,
}

impl AuthenticatorData {
    pub fn parse(bytes: &[u8]) -> Result<Self, AuthDataError> {
        if bytes.len() < 37 {
            return Err(AuthDataError::Truncated(bytes.len()));
        }

        let mut rp_id_hash = [0u8; 32];
        rp_id_hash.copy_from_slice(&bytes[..32]);
        let flags = bytes[32];
        let counter = u32::from_be_bytes(
            bytes[33..37]
                .try_into()
                .map_err(|_| AuthDataError::Truncated(bytes.len()))?,
        );

        let attested_credential = if flags & FLAG_AT != 0 {
            let rest = &bytes[37..];
            if rest.len() < 18 {
                return Err(AuthDataError::BadAttestedCredential);
            }
            let mut aaguid = [0u8; 16];
            aaguid.copy_from_slice(&rest[..16]);
            let id_len = u16::from_be_bytes(
                rest[16..18]
                    .try_into()
                    .map_err(|_| AuthDataError::BadAttestedCredential)?,
            ) as usize;
            if rest.len() < 18 + id_len {
                return Err(AuthDataError::BadAttestedCredential);
            }
            let credential_id = rest[18..18 + id_len].to_vec();
            let key_region = &rest[18 + id_len..];
            let key_len =
                cbor_item_len(key_region).ok_or(AuthDataError::BadAttestedCredential)?;
            let public_key = key_region[..key_len].to_vec();

            Some(AttestedCredentialData {
                aaguid,
                credential_id,
                public_key,
            })
        } else {
            None
        };

        Ok(Self {
            rp_id_hash,
            flags,
            counter,
            attested_credential,
        })
    }

    pub fn user_present(&self) -> bool {
        self.flags & FLAG_UP != 0
    }

    pub fn user_verified(&self) -> bool {
        self.flags & FLAG_UV != 0
    }
}

/// Byte length of the first CBOR item in `bytes`. The deserializer consumes
/// exactly one item, so the remaining reader length gives the boundary.
fn cbor_item_len(bytes: &[u8]) -> Option<usize> {
    let mut reader = bytes;
    let _: ciborium::Value = ciborium::de::from_reader(&mut reader).ok()?;
    Some(bytes.len() - reader.len())
}

#[cfg(test)]
mod tests {
    use sha2::{Digest, Sha256};

    use super::*;

    fn build(flags: u8, counter: u32, attested: Option<(&[u8], &[u8])>) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&Sha256::digest(b"shop.example"));
        data.push(flags);
        data.extend_from_slice(&counter.to_be_bytes());
        if let Some((cred_id, cose_key)) = attested {
            data.extend_from_slice(&[0u8; 16]);
            data.extend_from_slice(&(cred_id.len() as u16).to_be_bytes());
            data.extend_from_slice(cred_id);
            data.extend_from_slice(cose_key);
        }
        data
    }

    fn tiny_cose_map() -> Vec<u8> {
        let map = ciborium::Value::Map(vec![(
            ciborium::Value::Integer(1.into()),
            ciborium::Value::Integer(2.into()),
        )]);
        let mut out = Vec::new();
        ciborium::ser::into_writer(&map, &mut out).unwrap();
        out
    }

    #[test]
    fn parses_assertion_data_without_attested_credential() {
        let raw = build(FLAG_UP | FLAG_UV, 7, None);
        let parsed = AuthenticatorData::parse(&raw).unwrap();

        assert_eq!(parsed.counter, 7);
        assert!(parsed.user_present());
        assert!(parsed.user_verified());
        assert!(parsed.attested_credential.is_none());
    }

    #[test]
    fn parses_attested_credential_with_trailing_bytes_measured_by_cbor() {
        let cose = tiny_cose_map();
        let mut with_extensions = cose.clone();
        // a trailing extensions map must not leak into the key bytes
        with_extensions.extend_from_slice(&tiny_cose_map());

        let raw = build(
            FLAG_UP | FLAG_UV | FLAG_AT,
            0,
            Some((b"credential-id", &with_extensions)),
        );
        let parsed = AuthenticatorData::parse(&raw).unwrap();

        let attested = parsed.attested_credential.unwrap();
        assert_eq!(attested.credential_id, b"credential-id");
        assert_eq!(attested.public_key, cose);
    }

    #[test]
    fn rejects_truncated_input() {
        let raw = build(FLAG_UP, 0, None);
        let err = AuthenticatorData::parse(&raw[..20]).unwrap_err();
        assert!(matches!(err, AuthDataError::Truncated(20)));
    }

    #[test]
    fn rejects_credential_id_length_past_end() {
        let mut raw = build(FLAG_AT | FLAG_UP, 0, None);
        raw.extend_from_slice(&[0u8; 16]);
        raw.extend_from_slice(&u16::MAX.to_be_bytes());
        let err = AuthenticatorData::parse(&raw).unwrap_err();
        assert!(matches!(err, AuthDataError::BadAttestedCredential));
    }
}
