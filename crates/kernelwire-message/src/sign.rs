use std::fmt;
use std::str::FromStr;

use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use sha2::{Sha256, Sha384, Sha512};

use crate::error::{Result, WireError};

/// HMAC digest used to sign message bodies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SignatureScheme {
    #[default]
    HmacSha256,
    HmacSha384,
    HmacSha512,
}

impl SignatureScheme {
    /// Canonical scheme name, e.g. `hmac-sha256`.
    pub fn as_str(self) -> &'static str {
        match self {
            SignatureScheme::HmacSha256 => "hmac-sha256",
            SignatureScheme::HmacSha384 => "hmac-sha384",
            SignatureScheme::HmacSha512 => "hmac-sha512",
        }
    }
}

impl fmt::Display for SignatureScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignatureScheme {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        let digest = lower.strip_prefix("hmac-").unwrap_or(&lower);
        match digest {
            "sha256" => Ok(SignatureScheme::HmacSha256),
            "sha384" => Ok(SignatureScheme::HmacSha384),
            "sha512" => Ok(SignatureScheme::HmacSha512),
            _ => Err(format!("unsupported signature scheme '{s}'")),
        }
    }
}

/// Computes and checks body signatures for one scheme and key.
#[derive(Clone, Copy)]
pub struct Signer<'a> {
    scheme: SignatureScheme,
    key: &'a [u8],
}

impl<'a> Signer<'a> {
    pub fn new(scheme: SignatureScheme, key: &'a [u8]) -> Self {
        Self { scheme, key }
    }

    /// Lowercase hex HMAC over `parts`, fed in order.
    pub fn sign(&self, parts: &[&[u8]]) -> Result<String> {
        let tag = match self.scheme {
            SignatureScheme::HmacSha256 => keyed::<Hmac<Sha256>>(self.key, parts)?
                .finalize()
                .into_bytes()
                .to_vec(),
            SignatureScheme::HmacSha384 => keyed::<Hmac<Sha384>>(self.key, parts)?
                .finalize()
                .into_bytes()
                .to_vec(),
            SignatureScheme::HmacSha512 => keyed::<Hmac<Sha512>>(self.key, parts)?
                .finalize()
                .into_bytes()
                .to_vec(),
        };
        Ok(hex::encode(tag))
    }

    /// Check a hex `signature` against `parts` in constant time.
    ///
    /// A signature that is not valid hex never matches.
    pub fn verify(&self, parts: &[&[u8]], signature: &[u8]) -> Result<bool> {
        let Ok(expected) = hex::decode(signature) else {
            return Ok(false);
        };
        let ok = match self.scheme {
            SignatureScheme::HmacSha256 => keyed::<Hmac<Sha256>>(self.key, parts)?
                .verify_slice(&expected)
                .is_ok(),
            SignatureScheme::HmacSha384 => keyed::<Hmac<Sha384>>(self.key, parts)?
                .verify_slice(&expected)
                .is_ok(),
            SignatureScheme::HmacSha512 => keyed::<Hmac<Sha512>>(self.key, parts)?
                .verify_slice(&expected)
                .is_ok(),
        };
        Ok(ok)
    }
}

impl fmt::Debug for Signer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signer")
            .field("scheme", &self.scheme)
            .field("key", &format_args!("<redacted:{} bytes>", self.key.len()))
            .finish()
    }
}

fn keyed<M: Mac + KeyInit>(key: &[u8], parts: &[&[u8]]) -> Result<M> {
    let mut mac = <M as KeyInit>::new_from_slice(key).map_err(|_| WireError::InvalidKey)?;
    for part in parts {
        Mac::update(&mut mac, part);
    }
    Ok(mac)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheme_parses_with_and_without_prefix() {
        assert_eq!(
            "hmac-sha256".parse::<SignatureScheme>().unwrap(),
            SignatureScheme::HmacSha256
        );
        assert_eq!(
            "SHA512".parse::<SignatureScheme>().unwrap(),
            SignatureScheme::HmacSha512
        );
        assert!("hmac-md5".parse::<SignatureScheme>().is_err());
    }

    #[test]
    fn sha256_matches_known_vector() {
        // RFC 4231 test case 2.
        let signer = Signer::new(SignatureScheme::HmacSha256, b"Jefe");
        let sig = signer.sign(&[b"what do ya want ", b"for nothing?"]).unwrap();
        assert_eq!(
            sig,
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn digest_length_follows_scheme() {
        let key = b"secret";
        for (scheme, hex_len) in [
            (SignatureScheme::HmacSha256, 64),
            (SignatureScheme::HmacSha384, 96),
            (SignatureScheme::HmacSha512, 128),
        ] {
            let sig = Signer::new(scheme, key).sign(&[b"body"]).unwrap();
            assert_eq!(sig.len(), hex_len, "{scheme}");
        }
    }

    #[test]
    fn verify_accepts_own_signature_and_rejects_others() {
        let signer = Signer::new(SignatureScheme::HmacSha256, b"secret");
        let parts: [&[u8]; 2] = [b"{}", b"{\"a\":1}"];
        let sig = signer.sign(&parts).unwrap();

        assert!(signer.verify(&parts, sig.as_bytes()).unwrap());
        assert!(signer.verify(&parts, sig.to_uppercase().as_bytes()).unwrap());

        let other = Signer::new(SignatureScheme::HmacSha256, b"other");
        assert!(!other.verify(&parts, sig.as_bytes()).unwrap());
    }

    #[test]
    fn verify_rejects_malformed_hex_and_truncation() {
        let signer = Signer::new(SignatureScheme::HmacSha256, b"secret");
        let sig = signer.sign(&[b"x"]).unwrap();

        assert!(!signer.verify(&[b"x"], b"not-hex").unwrap());
        assert!(!signer.verify(&[b"x"], &sig.as_bytes()[..32]).unwrap());
        assert!(!signer.verify(&[b"x"], b"").unwrap());
    }

    #[test]
    fn part_boundaries_do_not_matter_only_bytes() {
        let signer = Signer::new(SignatureScheme::HmacSha256, b"k");
        assert_eq!(
            signer.sign(&[b"ab", b"cd"]).unwrap(),
            signer.sign(&[b"abcd"]).unwrap()
        );
    }

    #[test]
    fn any_key_length_is_accepted() {
        let long = vec![0x5a; 1024];
        for key in [&b"k"[..], &long[..]] {
            for scheme in [
                SignatureScheme::HmacSha256,
                SignatureScheme::HmacSha384,
                SignatureScheme::HmacSha512,
            ] {
                let signer = Signer::new(scheme, key);
                let sig = signer.sign(&[b"body"]).unwrap();
                assert!(signer.verify(&[b"body"], sig.as_bytes()).unwrap());
            }
        }
    }

    #[test]
    fn debug_redacts_key() {
        let signer = Signer::new(SignatureScheme::HmacSha256, b"topsecret");
        let dbg = format!("{signer:?}");
        assert!(!dbg.contains("topsecret"));
        assert!(dbg.contains("<redacted:9 bytes>"));
    }
}
