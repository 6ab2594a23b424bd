/*!
 * Fixed-Width Name Buffer
 * Allocation-free signal name storage for the bounded pool backend
 */

use super::SignalName;
use std::fmt;

/// Signal name stored in an `N`-byte inline buffer
///
/// Names longer than `N` are rejected, never truncated.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct FixedName<const N: usize> {
    buf: [u8; N],
    len: u8,
}

impl<const N: usize> FixedName<N> {
    const FITS_LEN: () = assert!(N <= u8::MAX as usize, "FixedName width must fit in u8");

    /// Copy `name` into a fresh buffer, or `None` if it does not fit
    pub fn new(name: &str) -> Option<Self> {
        #[allow(clippy::let_unit_value)]
        let _ = Self::FITS_LEN;

        let bytes = name.as_bytes();
        if bytes.len() > N {
            return None;
        }

        let mut buf = [0u8; N];
        buf[..bytes.len()].copy_from_slice(bytes);
        Some(Self {
            buf,
            len: bytes.len() as u8,
        })
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.len as usize
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        // Only ever filled from a whole &str
        std::str::from_utf8(&self.buf[..self.len as usize]).unwrap_or_default()
    }
}

impl<const N: usize> SignalName for FixedName<N> {
    const MAX_LEN: usize = N;

    fn from_name(name: &str) -> Option<Self> {
        Self::new(name)
    }

    #[inline]
    fn as_str(&self) -> &str {
        FixedName::as_str(self)
    }
}

impl<const N: usize> fmt::Debug for FixedName<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FixedName").field(&self.as_str()).finish()
    }
}

impl<const N: usize> fmt::Display for FixedName<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
