//! Sources of randomness

use crate::error;

/// A source of cryptographically secure random bytes
///
/// Used when minting JWT identifiers and HMAC secrets. The system source
/// is [`ring::rand::SystemRandom`]; tests may substitute a deterministic
/// source.
pub trait RandomSource {
    /// Fills `dest` with random bytes
    ///
    /// # Errors
    ///
    /// The source was unable to produce random data.
    fn fill(&self, dest: &mut [u8]) -> Result<(), error::Unexpected>;
}

impl RandomSource for ring::rand::SystemRandom {
    fn fill(&self, dest: &mut [u8]) -> Result<(), error::Unexpected> {
        ring::rand::SecureRandom::fill(self, dest)
            .map_err(|_| error::unexpected("random number generator failure"))
    }
}

impl<R> RandomSource for &'_ R
where
    R: RandomSource + ?Sized,
{
    fn fill(&self, dest: &mut [u8]) -> Result<(), error::Unexpected> {
        (**self).fill(dest)
    }
}
