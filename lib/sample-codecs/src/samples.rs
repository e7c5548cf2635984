use std::ops::Range;

use crate::{Complex32, SampleType};

/// Runs `$body` against the typed slice held by any variant of `$value`.
macro_rules! with_slice {
    ($value:expr, $kind:ident, $inner:ident => $body:expr) => {
        match $value {
            $kind::Complex64($inner) => $body,
            $kind::Float32($inner) => $body,
            $kind::Int32($inner) => $body,
            $kind::Int16($inner) => $body,
            $kind::Byte($inner) => $body,
        }
    };
}

pub(crate) use with_slice;

/// A borrowed run of samples of one type, as handed to a consumer by the
/// scheduler.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Samples<'a> {
    /// Complex samples.
    Complex64(&'a [Complex32]),
    /// Float samples.
    Float32(&'a [f32]),
    /// 32-bit integer samples.
    Int32(&'a [i32]),
    /// 16-bit integer samples.
    Int16(&'a [i16]),
    /// Byte samples.
    Byte(&'a [i8]),
}

impl<'a> Samples<'a> {
    /// The type of every sample in this run.
    pub const fn sample_type(&self) -> SampleType {
        match self {
            Samples::Complex64(_) => SampleType::Complex64,
            Samples::Float32(_) => SampleType::Float32,
            Samples::Int32(_) => SampleType::Int32,
            Samples::Int16(_) => SampleType::Int16,
            Samples::Byte(_) => SampleType::Byte,
        }
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        with_slice!(self, Samples, items => items.len())
    }

    /// Whether the run holds no samples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of bytes the run occupies once packed.
    pub fn byte_len(&self) -> usize {
        self.len() * self.sample_type().width()
    }

    /// A sub-run covering `range`.
    ///
    /// # Panics
    ///
    /// Panics if `range` is out of bounds, like slice indexing.
    pub fn slice(&self, range: Range<usize>) -> Samples<'a> {
        match *self {
            Samples::Complex64(items) => Samples::Complex64(&items[range]),
            Samples::Float32(items) => Samples::Float32(&items[range]),
            Samples::Int32(items) => Samples::Int32(&items[range]),
            Samples::Int16(items) => Samples::Int16(&items[range]),
            Samples::Byte(items) => Samples::Byte(&items[range]),
        }
    }
}

/// A mutable run of samples of one type, as handed to a producer by the
/// scheduler to fill.
#[derive(Debug, PartialEq)]
pub enum SamplesMut<'a> {
    /// Complex samples.
    Complex64(&'a mut [Complex32]),
    /// Float samples.
    Float32(&'a mut [f32]),
    /// 32-bit integer samples.
    Int32(&'a mut [i32]),
    /// 16-bit integer samples.
    Int16(&'a mut [i16]),
    /// Byte samples.
    Byte(&'a mut [i8]),
}

impl SamplesMut<'_> {
    /// The type of every sample in this run.
    pub const fn sample_type(&self) -> SampleType {
        match self {
            SamplesMut::Complex64(_) => SampleType::Complex64,
            SamplesMut::Float32(_) => SampleType::Float32,
            SamplesMut::Int32(_) => SampleType::Int32,
            SamplesMut::Int16(_) => SampleType::Int16,
            SamplesMut::Byte(_) => SampleType::Byte,
        }
    }

    /// Number of sample slots.
    pub fn len(&self) -> usize {
        with_slice!(self, SamplesMut, items => items.len())
    }

    /// Whether there are no slots to fill.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// An owned, type-erased sample buffer.
///
/// This is what a scheduler allocates per stream once the item type of the
/// connected block is known.
#[derive(Clone, Debug, PartialEq)]
pub enum SampleBuf {
    /// Complex samples.
    Complex64(Vec<Complex32>),
    /// Float samples.
    Float32(Vec<f32>),
    /// 32-bit integer samples.
    Int32(Vec<i32>),
    /// 16-bit integer samples.
    Int16(Vec<i16>),
    /// Byte samples.
    Byte(Vec<i8>),
}

impl SampleBuf {
    /// A buffer of `len` zeroed samples of `sample_type`.
    pub fn zeroed(sample_type: SampleType, len: usize) -> Self {
        match sample_type {
            SampleType::Complex64 => SampleBuf::Complex64(vec![Complex32::default(); len]),
            SampleType::Float32 => SampleBuf::Float32(vec![0.0; len]),
            SampleType::Int32 => SampleBuf::Int32(vec![0; len]),
            SampleType::Int16 => SampleBuf::Int16(vec![0; len]),
            SampleType::Byte => SampleBuf::Byte(vec![0; len]),
        }
    }

    /// The type of every sample in this buffer.
    pub fn sample_type(&self) -> SampleType {
        self.as_samples().sample_type()
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        with_slice!(self, SampleBuf, items => items.len())
    }

    /// Whether the buffer holds no samples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Shortens the buffer to `len` samples.
    pub fn truncate(&mut self, len: usize) {
        with_slice!(self, SampleBuf, items => items.truncate(len))
    }

    /// Borrows the contents.
    pub fn as_samples(&self) -> Samples<'_> {
        match self {
            SampleBuf::Complex64(items) => Samples::Complex64(items),
            SampleBuf::Float32(items) => Samples::Float32(items),
            SampleBuf::Int32(items) => Samples::Int32(items),
            SampleBuf::Int16(items) => Samples::Int16(items),
            SampleBuf::Byte(items) => Samples::Byte(items),
        }
    }

    /// Mutably borrows the contents.
    pub fn as_samples_mut(&mut self) -> SamplesMut<'_> {
        match self {
            SampleBuf::Complex64(items) => SamplesMut::Complex64(items),
            SampleBuf::Float32(items) => SamplesMut::Float32(items),
            SampleBuf::Int32(items) => SamplesMut::Int32(items),
            SampleBuf::Int16(items) => SamplesMut::Int16(items),
            SampleBuf::Byte(items) => SamplesMut::Byte(items),
        }
    }
}

macro_rules! impl_conversions {
    ($($ty:ty => $variant:ident),+ $(,)?) => {
        $(
            impl<'a> From<&'a [$ty]> for Samples<'a> {
                fn from(items: &'a [$ty]) -> Self {
                    Samples::$variant(items)
                }
            }

            impl<'a> From<&'a mut [$ty]> for SamplesMut<'a> {
                fn from(items: &'a mut [$ty]) -> Self {
                    SamplesMut::$variant(items)
                }
            }

            impl From<Vec<$ty>> for SampleBuf {
                fn from(items: Vec<$ty>) -> Self {
                    SampleBuf::$variant(items)
                }
            }

            impl TryFrom<SampleBuf> for Vec<$ty> {
                type Error = SampleBuf;

                fn try_from(buf: SampleBuf) -> Result<Self, Self::Error> {
                    match buf {
                        SampleBuf::$variant(items) => Ok(items),
                        other => Err(other),
                    }
                }
            }
        )+
    };
}

impl_conversions! {
    Complex32 => Complex64,
    f32 => Float32,
    i32 => Int32,
    i16 => Int16,
    i8 => Byte,
}
