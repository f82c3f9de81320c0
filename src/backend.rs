//! Runtime backend selection for the Bernstein ciphers.
//!
//! Each stream cipher has interchangeable kernels that differ only by the
//! instruction set they use. A [`Selector`] caches the best supported
//! [`Backend`] per cipher, process-wide, using the double-checked pattern:
//! an atomic fast path, a mutex-guarded probe on first use, and a
//! release-store so readers observe a fully published choice.
//!
//! Kernels are stateless; the cached choice is shared by every thread.

use core::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Mutex, PoisonError};

use tracing::debug;

use crate::error::{Error, Result};

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
cpufeatures::new!(cpuid_avx2, "avx2");
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
cpufeatures::new!(cpuid_sse2, "sse2");

/// A cipher kernel identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Backend {
    Scalar = 1,
    Sse2 = 2,
    Avx2 = 3,
    Neon = 4,
}

/// Selection order, best first.
const CANDIDATES: [Backend; 4] = [Backend::Avx2, Backend::Sse2, Backend::Neon, Backend::Scalar];

impl Backend {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Scalar => "scalar",
            Self::Sse2 => "sse2",
            Self::Avx2 => "avx2",
            Self::Neon => "neon",
        }
    }

    /// Selection priority; higher wins.
    #[must_use]
    pub const fn priority(self) -> u32 {
        match self {
            Self::Avx2 => 300,
            Self::Sse2 | Self::Neon => 200,
            Self::Scalar => 100,
        }
    }

    /// Whether this host can run the kernel. Probe failures on foreign
    /// architectures simply demote the backend.
    #[must_use]
    pub fn is_supported(self) -> bool {
        match self {
            Self::Scalar => true,
            Self::Sse2 => {
                #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
                {
                    cpuid_sse2::init().get()
                }
                #[cfg(not(any(target_arch = "x86", target_arch = "x86_64")))]
                {
                    false
                }
            }
            Self::Avx2 => {
                #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
                {
                    cpuid_avx2::init().get()
                }
                #[cfg(not(any(target_arch = "x86", target_arch = "x86_64")))]
                {
                    false
                }
            }
            // NEON is baseline on AArch64.
            Self::Neon => cfg!(target_arch = "aarch64"),
        }
    }

    /// Probes the host and returns the best supported backend.
    #[must_use]
    pub fn detect() -> Self {
        CANDIDATES
            .into_iter()
            .find(|b| b.is_supported())
            .unwrap_or(Backend::Scalar)
    }

    fn from_u8(value: u8) -> Self {
        match value {
            2 => Self::Sse2,
            3 => Self::Avx2,
            4 => Self::Neon,
            _ => Self::Scalar,
        }
    }
}

/// Process-wide cached backend choice for one cipher.
pub struct Selector {
    name: &'static str,
    // 0 means "not yet selected"; otherwise a Backend discriminant.
    cached: AtomicU8,
    init: Mutex<()>,
}

impl Selector {
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self { name, cached: AtomicU8::new(0), init: Mutex::new(()) }
    }

    /// Returns the selected backend, probing the CPU on first use.
    pub fn current(&self) -> Backend {
        match self.cached.load(Ordering::Acquire) {
            0 => self.select_slow(),
            value => Backend::from_u8(value),
        }
    }

    #[cold]
    fn select_slow(&self) -> Backend {
        let _guard = self.init.lock().unwrap_or_else(PoisonError::into_inner);
        // Another thread may have won the race while we waited on the lock.
        match self.cached.load(Ordering::Acquire) {
            0 => {
                let backend = Backend::detect();
                debug!(cipher = self.name, backend = backend.name(), "selected cipher backend");
                self.cached.store(backend as u8, Ordering::Release);
                backend
            }
            value => Backend::from_u8(value),
        }
    }

    /// Forces a specific backend, for tests and benchmarking.
    ///
    /// # Errors
    /// `Unsupported` when the host cannot run the requested kernel.
    pub fn force(&self, backend: Backend) -> Result<()> {
        if !backend.is_supported() {
            return Err(Error::Unsupported(backend.name()));
        }
        self.cached.store(backend as u8, Ordering::Release);
        Ok(())
    }

    /// Clears the cached choice so the next use re-probes the CPU.
    pub fn reset(&self) {
        self.cached.store(0, Ordering::Release);
    }
}

/// Cached backend for ChaCha20 and XChaCha20.
pub static CHACHA: Selector = Selector::new("chacha20");

/// Cached backend for Salsa20.
pub static SALSA: Selector = Selector::new("salsa20");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_is_always_supported() {
        assert!(Backend::Scalar.is_supported());
        assert!(Backend::detect().is_supported());
    }

    #[test]
    fn detection_respects_priority() {
        let best = Backend::detect();
        for candidate in CANDIDATES {
            if candidate.is_supported() {
                assert!(best.priority() >= candidate.priority());
            }
        }
    }

    #[test]
    fn force_and_reset() {
        let selector = Selector::new("test");
        selector.force(Backend::Scalar).unwrap();
        assert_eq!(selector.current(), Backend::Scalar);
        selector.reset();
        assert_eq!(selector.current(), Backend::detect());
    }

    #[test]
    fn force_rejects_unsupported_backend() {
        let selector = Selector::new("test");
        #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
        let foreign = Backend::Neon;
        #[cfg(not(any(target_arch = "x86", target_arch = "x86_64")))]
        let foreign = Backend::Avx2;
        assert!(matches!(selector.force(foreign), Err(Error::Unsupported(_))));
    }
}
