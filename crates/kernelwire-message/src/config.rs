use std::fmt;

use crate::sign::{SignatureScheme, Signer};

/// Signing and diagnostics settings shared by encode and decode.
///
/// The same scheme and key must be used on both ends for signatures to
/// verify. An empty key disables signing entirely.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct WireConfig {
    /// HMAC digest. Default: `hmac-sha256`.
    pub scheme: SignatureScheme,
    /// Shared secret. Empty means unsigned.
    pub key: Vec<u8>,
    /// Log aborted decodes at `warn` instead of `debug`.
    pub verbose: bool,
}

impl WireConfig {
    /// Unsigned configuration.
    pub fn unsigned() -> Self {
        Self::default()
    }

    /// Signed configuration using the default scheme.
    pub fn signed(key: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }

    pub fn with_scheme(mut self, scheme: SignatureScheme) -> Self {
        self.scheme = scheme;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Returns true if a non-empty key is configured.
    pub fn is_signing(&self) -> bool {
        !self.key.is_empty()
    }

    /// Signer for this configuration, or `None` when signing is disabled.
    pub fn signer(&self) -> Option<Signer<'_>> {
        self.is_signing()
            .then(|| Signer::new(self.scheme, &self.key))
    }
}

impl fmt::Debug for WireConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WireConfig")
            .field("scheme", &self.scheme)
            .field("key", &format_args!("<redacted:{} bytes>", self.key.len()))
            .field("verbose", &self.verbose)
            .finish()
    }
}
