//! HMAC (Hash-based Message Authentication Code) implementation.
//!
//! HMAC provides message authentication using a cryptographic hash function
//! combined with a secret key, as defined in RFC 2104.
//!
//! HMAC(K, m) = H((K' XOR opad) || H((K' XOR ipad) || m))
//!
//! where K' is the key padded/hashed to block size, ipad = 0x36, opad = 0x5c.
//!
//! [`Hmac`] works over any [`Digest`]; [`Sm3Hmac`] is the HMAC-SM3 context
//! with the key length range accepted by the ShangMi MAC interface.

use crate::provider::{Digest, Mac};
use crate::sm3::{Sm3, SM3_OUTPUT_SIZE};
use gmssl_types::CryptoError;
use zeroize::Zeroize;

/// Shortest key accepted by [`Sm3Hmac`].
pub const SM3_HMAC_MIN_KEY_LEN: usize = 16;
/// Longest key accepted by [`Sm3Hmac`] (one SM3 block).
pub const SM3_HMAC_MAX_KEY_LEN: usize = 64;

/// HMAC context using a boxed Digest for the underlying hash.
pub struct Hmac {
    /// Inner hash context (initialized with ipad-xored key).
    inner: Box<dyn Digest>,
    /// Outer hash context (initialized with opad-xored key).
    outer: Box<dyn Digest>,
    /// Factory to create fresh digest instances (for reset).
    factory: Box<dyn Fn() -> Box<dyn Digest> + Send + Sync>,
    /// Processed key block (for reset).
    key_block: Vec<u8>,
}

impl Hmac {
    /// Create a new HMAC instance with the given key and hash factory.
    pub fn new(
        hash_factory: impl Fn() -> Box<dyn Digest> + Send + Sync + 'static,
        key: &[u8],
    ) -> Result<Self, CryptoError> {
        let key_block = Self::key_block(&hash_factory, key)?;
        let inner = Self::keyed(&hash_factory, &key_block, 0x36)?;
        let outer = Self::keyed(&hash_factory, &key_block, 0x5c)?;
        Ok(Self {
            inner,
            outer,
            factory: Box::new(hash_factory),
            key_block,
        })
    }

    /// Pad the key to the block size, hashing it first when too long.
    fn key_block(
        factory: &dyn Fn() -> Box<dyn Digest>,
        key: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        let mut hasher = factory();
        let block_size = hasher.block_size();
        let output_size = hasher.output_size();

        let mut key_block = vec![0u8; block_size];
        if key.len() > block_size {
            hasher.update(key)?;
            hasher.finish(&mut key_block[..output_size])?;
        } else {
            key_block[..key.len()].copy_from_slice(key);
        }
        Ok(key_block)
    }

    /// Fresh digest already fed with `key_block XOR pad`.
    fn keyed(
        factory: &dyn Fn() -> Box<dyn Digest>,
        key_block: &[u8],
        pad: u8,
    ) -> Result<Box<dyn Digest>, CryptoError> {
        let mut ctx = factory();
        let mut padded: Vec<u8> = key_block.iter().map(|b| b ^ pad).collect();
        let res = ctx.update(&padded);
        padded.zeroize();
        res.map(|()| ctx)
    }

    /// Output size of the underlying digest.
    pub fn output_size(&self) -> usize {
        self.inner.output_size()
    }

    /// Feed data into the HMAC computation.
    pub fn update(&mut self, data: &[u8]) -> Result<(), CryptoError> {
        self.inner.update(data)
    }

    /// Finalize the HMAC computation and write the result to `out`.
    ///
    /// A second call without [`reset`](Self::reset) fails with the
    /// digest's state error.
    pub fn finish(&mut self, out: &mut [u8]) -> Result<(), CryptoError> {
        let mut inner_hash = vec![0u8; self.inner.output_size()];
        self.inner.finish(&mut inner_hash)?;

        let res = self.outer.update(&inner_hash);
        inner_hash.zeroize();
        res?;

        self.outer.finish(out)
    }

    /// Reset the HMAC state for reuse with the same key.
    pub fn reset(&mut self) -> Result<(), CryptoError> {
        self.inner = Self::keyed(&*self.factory, &self.key_block, 0x36)?;
        self.outer = Self::keyed(&*self.factory, &self.key_block, 0x5c)?;
        Ok(())
    }

    /// Replace the key and reset the state.
    pub fn rekey(&mut self, key: &[u8]) -> Result<(), CryptoError> {
        let key_block = Self::key_block(&*self.factory, key)?;
        self.inner = Self::keyed(&*self.factory, &key_block, 0x36)?;
        self.outer = Self::keyed(&*self.factory, &key_block, 0x5c)?;
        self.key_block.zeroize();
        self.key_block = key_block;
        Ok(())
    }

    /// One-shot HMAC computation.
    pub fn mac(
        hash_factory: impl Fn() -> Box<dyn Digest> + Send + Sync + 'static,
        key: &[u8],
        data: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        let mut ctx = Self::new(hash_factory, key)?;
        ctx.update(data)?;
        let mut out = vec![0u8; ctx.output_size()];
        ctx.finish(&mut out)?;
        Ok(out)
    }
}

impl Drop for Hmac {
    fn drop(&mut self) {
        self.key_block.zeroize();
    }
}

pub(crate) fn sm3_factory() -> Box<dyn Digest> {
    Box::new(Sm3::new())
}

fn check_sm3_hmac_key(key: &[u8]) -> Result<(), CryptoError> {
    if (SM3_HMAC_MIN_KEY_LEN..=SM3_HMAC_MAX_KEY_LEN).contains(&key.len()) {
        Ok(())
    } else {
        Err(CryptoError::InvalidKeyLength {
            expected: SM3_HMAC_MIN_KEY_LEN,
            got: key.len(),
        })
    }
}

/// HMAC-SM3 context.
///
/// Keys must be 16 to 64 bytes long. Once [`finish`](Sm3Hmac::finish) has
/// produced a tag, the context must be re-keyed with
/// [`reset`](Sm3Hmac::reset) before it accepts more input.
pub struct Sm3Hmac {
    hmac: Hmac,
}

impl Sm3Hmac {
    /// Create a context keyed with `key`.
    pub fn new(key: &[u8]) -> Result<Self, CryptoError> {
        check_sm3_hmac_key(key)?;
        Ok(Self {
            hmac: Hmac::new(sm3_factory, key)?,
        })
    }

    pub fn update(&mut self, data: &[u8]) -> Result<(), CryptoError> {
        self.hmac.update(data)
    }

    /// Produce the 32-byte tag.
    pub fn finish(&mut self) -> Result<[u8; SM3_OUTPUT_SIZE], CryptoError> {
        let mut out = [0u8; SM3_OUTPUT_SIZE];
        self.hmac.finish(&mut out)?;
        Ok(out)
    }

    /// Re-key the context and discard any buffered input.
    pub fn reset(&mut self, key: &[u8]) -> Result<(), CryptoError> {
        check_sm3_hmac_key(key)?;
        self.hmac.rekey(key)
    }

    /// One-shot HMAC-SM3.
    pub fn mac(key: &[u8], data: &[u8]) -> Result<[u8; SM3_OUTPUT_SIZE], CryptoError> {
        let mut ctx = Self::new(key)?;
        ctx.update(data)?;
        ctx.finish()
    }
}

impl Mac for Sm3Hmac {
    fn output_size(&self) -> usize {
        SM3_OUTPUT_SIZE
    }

    fn init(&mut self, key: &[u8]) -> Result<(), CryptoError> {
        Sm3Hmac::reset(self, key)
    }

    fn update(&mut self, data: &[u8]) -> Result<(), CryptoError> {
        self.hmac.update(data)
    }

    fn finish(&mut self, out: &mut [u8]) -> Result<(), CryptoError> {
        if out.len() < SM3_OUTPUT_SIZE {
            return Err(CryptoError::InvalidArg("mac output buffer too small"));
        }
        self.hmac.finish(&mut out[..SM3_OUTPUT_SIZE])
    }

    fn reset(&mut self) -> Result<(), CryptoError> {
        self.hmac.reset()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn hex(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{b:02x}")).collect()
    }

    #[test]
    fn test_hmac_sm3_short_key() {
        let tag = Sm3Hmac::mac(&[b'k'; 16], b"abc").unwrap();
        assert_eq!(
            hex(&tag),
            "92809794eb5b12cf9b7307bc96fc5666156d0ef577a17b0686fdc855cd713925"
        );
    }

    #[test]
    fn test_hmac_sm3_block_sized_key() {
        let key: Vec<u8> = (0u8..64).collect();
        let tag = Sm3Hmac::mac(&key, b"The quick brown fox jumps over the lazy dog").unwrap();
        assert_eq!(
            hex(&tag),
            "448c4af719d877097345305c831b12d8179dbdc87a81f81bc795f9d195eb918f"
        );
    }

    // RFC 4231 test case 1 inputs, SM3 as the hash
    #[test]
    fn test_hmac_sm3_hi_there() {
        let tag = Sm3Hmac::mac(&[0x0b; 20], b"Hi There").unwrap();
        assert_eq!(
            hex(&tag),
            "51b00d1fb49832bfb01c3ce27848e59f871d9ba938dc563b338ca964755cce70"
        );
    }

    #[test]
    fn test_generic_hmac_hashes_long_key() {
        let key: Vec<u8> = (0u8..100).collect();
        let tag = Hmac::mac(sm3_factory, &key, b"abc").unwrap();
        assert_eq!(
            hex(&tag),
            "efa0b8554e9475092d2f978d8855627a45325381b7f478f6e164faa04fd5c844"
        );
    }

    #[test]
    fn test_sm3_hmac_key_length_bounds() {
        assert!(matches!(
            Sm3Hmac::new(&[0u8; 15]),
            Err(CryptoError::InvalidKeyLength { got: 15, .. })
        ));
        assert!(matches!(
            Sm3Hmac::new(&[0u8; 65]),
            Err(CryptoError::InvalidKeyLength { got: 65, .. })
        ));
        assert!(Sm3Hmac::new(&[0u8; 15]).err().unwrap().is_input_error());
        assert!(Sm3Hmac::new(&[0u8; 16]).is_ok());
        assert!(Sm3Hmac::new(&[0u8; 64]).is_ok());

        let mut ctx = Sm3Hmac::new(&[0u8; 32]).unwrap();
        assert!(matches!(
            ctx.reset(&[0u8; 8]),
            Err(CryptoError::InvalidKeyLength { got: 8, .. })
        ));
    }

    #[test]
    fn test_sm3_hmac_streaming_matches_one_shot() {
        let key = [b'k'; 16];
        let mut ctx = Sm3Hmac::new(&key).unwrap();
        ctx.update(b"a").unwrap();
        ctx.update(b"").unwrap();
        ctx.update(b"bc").unwrap();
        assert_eq!(ctx.finish().unwrap(), Sm3Hmac::mac(&key, b"abc").unwrap());
    }

    #[test]
    fn test_sm3_hmac_finish_twice_then_rekey() {
        let key = [b'k'; 16];
        let mut ctx = Sm3Hmac::new(&key).unwrap();
        ctx.update(b"abc").unwrap();
        let first = ctx.finish().unwrap();
        assert!(matches!(ctx.finish(), Err(CryptoError::InvalidState(_))));

        ctx.reset(&key).unwrap();
        ctx.update(b"abc").unwrap();
        assert_eq!(ctx.finish().unwrap(), first);

        // Re-keying with another key changes the tag.
        ctx.reset(&[0x0b; 20]).unwrap();
        ctx.update(b"Hi There").unwrap();
        assert_eq!(
            hex(&ctx.finish().unwrap()),
            "51b00d1fb49832bfb01c3ce27848e59f871d9ba938dc563b338ca964755cce70"
        );
    }

    #[test]
    fn test_sm3_hmac_mac_trait_reset_keeps_key() {
        let mut ctx: Box<dyn Mac> = Box::new(Sm3Hmac::new(&[b'k'; 16]).unwrap());
        assert_eq!(ctx.output_size(), 32);
        ctx.update(b"garbage").unwrap();
        ctx.reset().unwrap();
        ctx.update(b"abc").unwrap();
        let mut out = [0u8; 32];
        ctx.finish(&mut out).unwrap();
        assert_eq!(
            hex(&out),
            "92809794eb5b12cf9b7307bc96fc5666156d0ef577a17b0686fdc855cd713925"
        );

        ctx.init(&[0x0b; 20]).unwrap();
        ctx.update(b"Hi There").unwrap();
        ctx.finish(&mut out).unwrap();
        assert_eq!(
            hex(&out),
            "51b00d1fb49832bfb01c3ce27848e59f871d9ba938dc563b338ca964755cce70"
        );
    }

    /// SM3 wrapper that refuses updates once a shared budget is spent.
    struct BudgetedSm3 {
        inner: Sm3,
        budget: Arc<AtomicUsize>,
    }

    impl Digest for BudgetedSm3 {
        fn output_size(&self) -> usize {
            SM3_OUTPUT_SIZE
        }
        fn block_size(&self) -> usize {
            64
        }
        fn update(&mut self, data: &[u8]) -> Result<(), CryptoError> {
            let left = self.budget.load(Ordering::SeqCst);
            if left == 0 {
                return Err(CryptoError::InvalidState("digest update budget spent"));
            }
            self.budget.store(left - 1, Ordering::SeqCst);
            self.inner.update(data)
        }
        fn finish(&mut self, out: &mut [u8]) -> Result<(), CryptoError> {
            Digest::finish(&mut self.inner, out)
        }
        fn reset(&mut self) {
            self.inner.reset()
        }
    }

    #[test]
    fn test_hmac_reset_reports_digest_failure() {
        let budget = Arc::new(AtomicUsize::new(2));
        let shared = Arc::clone(&budget);
        let factory = move || -> Box<dyn Digest> {
            Box::new(BudgetedSm3 {
                inner: Sm3::new(),
                budget: Arc::clone(&shared),
            })
        };
        // new() keys the inner and outer contexts, spending the budget
        let mut hmac = Hmac::new(factory, &[b'k'; 16]).unwrap();
        assert!(matches!(hmac.reset(), Err(CryptoError::InvalidState(_))));

        // two pads, one message update, one outer update of the inner hash
        budget.store(4, Ordering::SeqCst);
        hmac.reset().unwrap();
        hmac.update(b"abc").unwrap();
        let mut out = [0u8; 32];
        hmac.finish(&mut out).unwrap();
        assert_eq!(
            hex(&out),
            "92809794eb5b12cf9b7307bc96fc5666156d0ef577a17b0686fdc855cd713925"
        );
    }
}
