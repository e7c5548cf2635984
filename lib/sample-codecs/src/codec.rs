use bytes::BytesMut;
use snafu::{Snafu, ensure};

use crate::{Sample, SampleBuf, SampleType, Samples, SamplesMut, samples::with_slice};

/// A byte-accounting mismatch between a stream and its buffers.
///
/// These never come from the network: they mean the caller handed the codec
/// a buffer whose length or type it should already have checked. They are
/// fatal and never retried.
#[derive(Debug, Snafu, PartialEq, Eq)]
pub enum BufferContractError {
    /// Samples of one type were handed to a codec of another.
    #[snafu(display("Expected {expected} samples, got {actual} samples."))]
    TypeMismatch {
        /// The codec's type.
        expected: SampleType,
        /// The type that was supplied.
        actual: SampleType,
    },

    /// A byte run does not hold exactly the requested number of samples.
    #[snafu(display(
        "{len} bytes cannot hold exactly {count} {sample_type} samples of {width} bytes each."
    ))]
    LengthMismatch {
        /// Bytes supplied.
        len: usize,
        /// Samples requested.
        count: usize,
        /// The codec's type.
        sample_type: SampleType,
        /// Bytes per sample.
        width: usize,
    },

    /// Decoded samples would not fit in the destination slots.
    #[snafu(display("{count} samples do not fit in {capacity} output slots."))]
    Overflow {
        /// Samples available.
        count: usize,
        /// Slots available.
        capacity: usize,
    },

    /// The stream ended in the middle of a sample.
    #[snafu(display(
        "Stream ended with {remaining} trailing bytes, less than one {sample_type} sample."
    ))]
    PartialSample {
        /// Bytes left over.
        remaining: usize,
        /// The codec's type.
        sample_type: SampleType,
    },
}

/// Packs `items` onto the end of `dst` in host byte order.
pub fn pack<T: Sample>(items: &[T], dst: &mut BytesMut) {
    dst.reserve(items.len() * T::SAMPLE_TYPE.width());
    for item in items {
        item.put_ne(dst);
    }
}

/// Unpacks exactly `count` samples from `src`.
pub fn unpack<T: Sample>(src: &[u8], count: usize) -> Result<Vec<T>, BufferContractError> {
    let width = T::SAMPLE_TYPE.width();
    ensure!(
        src.len() == count * width,
        LengthMismatchSnafu {
            len: src.len(),
            count,
            sample_type: T::SAMPLE_TYPE,
            width,
        }
    );
    Ok(src.chunks_exact(width).map(T::from_ne).collect())
}

fn decode_into<T: Sample>(src: &[u8], dst: &mut [T]) -> usize {
    let width = T::SAMPLE_TYPE.width();
    let mut written = 0;
    for (slot, raw) in dst.iter_mut().zip(src.chunks_exact(width)) {
        *slot = T::from_ne(raw);
        written += 1;
    }
    written
}

/// Codec for one configured sample type.
///
/// The type is resolved once at construction; every call then dispatches on
/// the typed slice it is given rather than inspecting individual samples.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SampleCodec {
    sample_type: SampleType,
}

impl SampleCodec {
    /// Creates a codec for `sample_type`.
    pub const fn new(sample_type: SampleType) -> Self {
        Self { sample_type }
    }

    /// The configured sample type.
    pub const fn sample_type(&self) -> SampleType {
        self.sample_type
    }

    /// Bytes per sample.
    pub const fn width(&self) -> usize {
        self.sample_type.width()
    }

    /// How many whole samples fit in `byte_len` bytes.
    pub const fn whole_samples(&self, byte_len: usize) -> usize {
        byte_len / self.width()
    }

    /// Packs `items` onto the end of `dst`.
    pub fn pack(&self, items: Samples<'_>, dst: &mut BytesMut) -> Result<(), BufferContractError> {
        self.check_type(items.sample_type())?;
        with_slice!(items, Samples, items => pack(items, dst));
        Ok(())
    }

    /// Unpacks exactly `count` samples from `src` into a new buffer.
    pub fn unpack(&self, src: &[u8], count: usize) -> Result<SampleBuf, BufferContractError> {
        Ok(match self.sample_type {
            SampleType::Complex64 => SampleBuf::Complex64(unpack(src, count)?),
            SampleType::Float32 => SampleBuf::Float32(unpack(src, count)?),
            SampleType::Int32 => SampleBuf::Int32(unpack(src, count)?),
            SampleType::Int16 => SampleBuf::Int16(unpack(src, count)?),
            SampleType::Byte => SampleBuf::Byte(unpack(src, count)?),
        })
    }

    /// Unpacks every sample in `src` into the front of `dst`, returning the
    /// number written.
    ///
    /// `src` must be a whole number of samples and must fit in `dst`.
    pub fn unpack_into(
        &self,
        src: &[u8],
        dst: SamplesMut<'_>,
    ) -> Result<usize, BufferContractError> {
        self.check_type(dst.sample_type())?;
        let count = self.whole_samples(src.len());
        ensure!(
            count * self.width() == src.len(),
            LengthMismatchSnafu {
                len: src.len(),
                count,
                sample_type: self.sample_type,
                width: self.width(),
            }
        );
        ensure!(
            count <= dst.len(),
            OverflowSnafu {
                count,
                capacity: dst.len(),
            }
        );
        Ok(with_slice!(dst, SamplesMut, slots => decode_into(src, slots)))
    }

    fn check_type(&self, actual: SampleType) -> Result<(), BufferContractError> {
        ensure!(
            actual == self.sample_type,
            TypeMismatchSnafu {
                expected: self.sample_type,
                actual,
            }
        );
        Ok(())
    }
}
