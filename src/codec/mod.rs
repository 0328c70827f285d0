//! Decompression providers.
//!
//! Compressed payloads are decoded by an external codec that is not linked
//! into this crate. Providers are registered under string identifiers in a
//! [`DecompressorRegistry`], and an archive resolves one of them at open
//! time by probing an ordered identifier list (see
//! [`ArchiveOptions`](crate::ArchiveOptions)). Failing to resolve any
//! provider is not an error: stored entries still extract, compressed
//! ones fail with [`Error::InvalidOperation`](crate::Error::InvalidOperation).

mod zlib;

pub use zlib::ZlibDecompressor;

use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::error::Result;

/// Provider identifiers probed when none are configured.
pub const DEFAULT_PROVIDERS: &[&str] = &["oo2core_8_win64.dll"];

/// A block decompressor
pub trait Decompressor: Send + Sync {
    /// Identifier used in logs.
    fn name(&self) -> &str;

    /// Whether the provider can decode right now.
    fn available(&self) -> bool {
        true
    }

    /// Decode `src`, producing at most `dst_capacity` bytes.
    ///
    /// Callers check the returned length against the size they expect.
    fn decompress(&self, src: &[u8], dst_capacity: usize) -> Result<Vec<u8>>;
}

type ProviderFactory = Box<dyn Fn() -> Option<Arc<dyn Decompressor>> + Send + Sync>;

/// Known decompression providers, keyed by identifier
#[derive(Default)]
pub struct DecompressorRegistry {
    providers: Vec<(String, ProviderFactory)>,
}

impl DecompressorRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the providers that ship with this crate.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(ZlibDecompressor::NAME, || {
            Some(Arc::new(ZlibDecompressor) as Arc<dyn Decompressor>)
        });
        registry
    }

    /// Register `factory` under `id`, replacing any previous registration.
    ///
    /// The factory may return `None` when the backing codec cannot be
    /// acquired; probing then moves on to the next identifier.
    pub fn register<F>(&mut self, id: impl Into<String>, factory: F)
    where
        F: Fn() -> Option<Arc<dyn Decompressor>> + Send + Sync + 'static,
    {
        let id = id.into();
        self.providers.retain(|(existing, _)| *existing != id);
        self.providers.push((id, Box::new(factory)));
    }

    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.providers.iter().map(|(id, _)| id.as_str())
    }

    /// Probe `ids` in order and return the first provider that is
    /// registered, acquirable and available.
    pub fn resolve<S: AsRef<str>>(&self, ids: &[S]) -> Option<Arc<dyn Decompressor>> {
        for id in ids.iter().map(AsRef::as_ref) {
            let Some((_, factory)) = self.providers.iter().find(|(known, _)| known == id) else {
                trace!("No decompression provider registered as {id}");
                continue;
            };

            match factory() {
                Some(provider) if provider.available() => {
                    debug!("Using decompression provider {id}");
                    return Some(provider);
                }
                _ => trace!("Decompression provider {id} could not be acquired"),
            }
        }

        None
    }
}

impl fmt::Debug for DecompressorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.identifiers()).finish()
    }
}
