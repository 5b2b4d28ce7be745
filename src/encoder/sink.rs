use std::io::Write;

use crate::booster_errors::BoosterError;

/// An append-only byte destination.
///
/// The encoder hands over exact byte counts; an implementation either stores all of
/// them or fails. Every [`std::io::Write`] is a sink (files, pipes, `Vec<u8>`,
/// `BufWriter`…), a short write surfacing as [`BoosterError::Io`].
pub trait ByteSink {
    fn put(&mut self, bytes: &[u8]) -> Result<(), BoosterError>;
}

impl<W: Write + ?Sized> ByteSink for W {
    fn put(&mut self, bytes: &[u8]) -> Result<(), BoosterError> {
        self.write_all(bytes)?;
        Ok(())
    }
}
