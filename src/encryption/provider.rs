use log::warn;
use rand::{CryptoRng, RngCore};
use std::fmt;
use std::sync::Arc;

/// Capabilities of the primitive provider backing the encryption engine.
///
/// A provider is handed to the security handlers and crypt filters when they are constructed,
/// so FIPS restrictions and the source of randomness are decided by the caller rather than by
/// process-wide state.
pub trait CryptoProvider: fmt::Debug + Send + Sync {
    /// Name used in log messages.
    fn name(&self) -> &str;

    /// Whether only FIPS-approved operations may be used.
    fn is_fips(&self) -> bool {
        false
    }

    /// Fill `buf` with cryptographically strong random bytes.
    fn fill_random(&self, buf: &mut [u8]);
}

/// Provider backed by the operating system's random number generator.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultCryptoProvider;

impl CryptoProvider for DefaultCryptoProvider {
    fn name(&self) -> &str {
        "default"
    }

    fn fill_random(&self, buf: &mut [u8]) {
        rand::rngs::OsRng.fill_bytes(buf);
    }
}

/// Provider restricted to FIPS-approved operations.
///
/// MD5-based key derivation still works but is reported, public-key encryption is refused.
#[derive(Clone, Copy, Debug, Default)]
pub struct FipsCryptoProvider;

impl CryptoProvider for FipsCryptoProvider {
    fn name(&self) -> &str {
        "fips"
    }

    fn is_fips(&self) -> bool {
        true
    }

    fn fill_random(&self, buf: &mut [u8]) {
        rand::rngs::OsRng.fill_bytes(buf);
    }
}

pub fn default_provider() -> Arc<dyn CryptoProvider> {
    Arc::new(DefaultCryptoProvider)
}

/// Report MD5 usage when the provider is restricted to FIPS-approved algorithms.
pub(crate) fn note_md5_usage(provider: &dyn CryptoProvider) {
    if provider.is_fips() {
        warn!(
            "MD5 is not a FIPS-approved algorithm; key derivation with provider \"{}\" is not FIPS compliant",
            provider.name()
        );
    }
}

/// Adapts a provider to the `rand` traits expected by the RSA implementation.
pub(crate) struct ProviderRng<'a>(pub(crate) &'a dyn CryptoProvider);

impl RngCore for ProviderRng<'_> {
    fn next_u32(&mut self) -> u32 {
        let mut bytes = [0u8; 4];
        self.0.fill_random(&mut bytes);
        u32::from_le_bytes(bytes)
    }

    fn next_u64(&mut self) -> u64 {
        let mut bytes = [0u8; 8];
        self.0.fill_random(&mut bytes);
        u64::from_le_bytes(bytes)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.0.fill_random(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.0.fill_random(dest);
        Ok(())
    }
}

impl CryptoRng for ProviderRng<'_> {}
