use crate::{booster_errors::BoosterError, value::FieldValue};

use super::{ByteSink, Encoder};

/// A COPY BINARY stream over a [`ByteSink`].
///
/// The header goes out when the writer is created and the trailer on [`finish`](Self::finish),
/// so a stream built through this type carries each exactly once. Tuples written after
/// `finish` are refused.
#[derive(Debug)]
pub struct CopyBinaryWriter<S> {
    sink: S,
    encoder: Encoder,
    tuples: u64,
    finished: bool,
}

impl<S: ByteSink> CopyBinaryWriter<S> {
    pub fn new(sink: S) -> Result<Self, BoosterError> {
        Self::with_encoder(sink, Encoder::default())
    }

    pub fn with_encoder(mut sink: S, encoder: Encoder) -> Result<Self, BoosterError> {
        encoder.write_header(&mut sink)?;
        Ok(CopyBinaryWriter {
            sink,
            encoder,
            tuples: 0,
            finished: false,
        })
    }

    pub fn write_tuple(&mut self, values: &[FieldValue<'_>]) -> Result<(), BoosterError> {
        if self.finished {
            return Err(BoosterError::StreamState(
                "tuple written after the end marker".into(),
            ));
        }
        self.encoder.write_tuple(values, &mut self.sink)?;
        self.tuples += 1;
        Ok(())
    }

    /// Write the end marker.
    pub fn finish(&mut self) -> Result<(), BoosterError> {
        if self.finished {
            return Err(BoosterError::StreamState("end marker already written".into()));
        }
        self.encoder.write_end_marker(&mut self.sink)?;
        self.finished = true;
        tracing::debug!(tuples = self.tuples, "COPY stream closed");
        Ok(())
    }

    pub fn tuples_written(&self) -> u64 {
        self.tuples
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn get_ref(&self) -> &S {
        &self.sink
    }

    pub fn into_inner(self) -> S {
        self.sink
    }
}
