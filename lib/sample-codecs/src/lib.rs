//! Fixed-width sample codecs used to move typed sample streams over byte
//! oriented transports.
//!
//! Samples are laid out in host byte order. No conversion between platforms
//! is attempted: a stream written on a little-endian host is read back as
//! little-endian.

#![deny(missing_docs)]

mod codec;
mod samples;

use std::{fmt, str::FromStr};

use bytes::{BufMut, BytesMut};
use serde::{Deserialize, Serialize};
use snafu::Snafu;

pub use codec::{BufferContractError, SampleCodec, pack, unpack};
pub use samples::{SampleBuf, Samples, SamplesMut};

/// The item type carried by a sample stream.
///
/// Resolved once when a block is configured; it fixes the codec width and the
/// item size the scheduler allocates for the stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleType {
    /// Interleaved pair of 32-bit floats (real, imaginary).
    #[serde(alias = "complex")]
    Complex64,

    /// 32-bit IEEE float.
    #[serde(alias = "float")]
    Float32,

    /// Signed 32-bit integer.
    #[serde(alias = "int")]
    Int32,

    /// Signed 16-bit integer.
    #[serde(alias = "short")]
    Int16,

    /// Signed 8-bit integer.
    Byte,
}

impl SampleType {
    /// All supported sample types.
    pub const ALL: [SampleType; 5] = [
        SampleType::Complex64,
        SampleType::Float32,
        SampleType::Int32,
        SampleType::Int16,
        SampleType::Byte,
    ];

    /// Number of bytes a single sample occupies on the wire.
    pub const fn width(self) -> usize {
        match self {
            SampleType::Complex64 => 8,
            SampleType::Float32 | SampleType::Int32 => 4,
            SampleType::Int16 => 2,
            SampleType::Byte => 1,
        }
    }

    /// The canonical configuration name.
    pub const fn as_str(self) -> &'static str {
        match self {
            SampleType::Complex64 => "complex64",
            SampleType::Float32 => "float32",
            SampleType::Int32 => "int32",
            SampleType::Int16 => "int16",
            SampleType::Byte => "byte",
        }
    }
}

impl fmt::Display for SampleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a sample type name is not recognized.
#[derive(Debug, Snafu, PartialEq, Eq)]
#[snafu(display("Unknown sample type {name:?}."))]
pub struct UnknownSampleType {
    /// The rejected name.
    pub name: String,
}

impl FromStr for SampleType {
    type Err = UnknownSampleType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "complex64" | "complex" => Ok(SampleType::Complex64),
            "float32" | "float" => Ok(SampleType::Float32),
            "int32" | "int" => Ok(SampleType::Int32),
            "int16" | "short" => Ok(SampleType::Int16),
            "byte" => Ok(SampleType::Byte),
            _ => UnknownSampleTypeSnafu { name: s }.fail(),
        }
    }
}

/// A complex sample made of two 32-bit floats.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[repr(C)]
pub struct Complex32 {
    /// Real part.
    pub re: f32,
    /// Imaginary part.
    pub im: f32,
}

impl Complex32 {
    /// Builds a complex sample from its parts.
    pub const fn new(re: f32, im: f32) -> Self {
        Self { re, im }
    }
}

/// A fixed-width value that can travel in a sample stream.
pub trait Sample: Copy + Default + fmt::Debug + Send + Sync + 'static {
    /// The stream type this value belongs to.
    const SAMPLE_TYPE: SampleType;

    /// Appends the host-order bytes of this sample to `dst`.
    fn put_ne(self, dst: &mut BytesMut);

    /// Reads one sample from exactly `SAMPLE_TYPE.width()` host-order bytes.
    fn from_ne(src: &[u8]) -> Self;
}

macro_rules! impl_scalar_sample {
    ($($ty:ty => $variant:ident),+ $(,)?) => {
        $(
            impl Sample for $ty {
                const SAMPLE_TYPE: SampleType = SampleType::$variant;

                fn put_ne(self, dst: &mut BytesMut) {
                    dst.put_slice(&self.to_ne_bytes());
                }

                fn from_ne(src: &[u8]) -> Self {
                    let mut raw = [0u8; std::mem::size_of::<$ty>()];
                    raw.copy_from_slice(src);
                    <$ty>::from_ne_bytes(raw)
                }
            }
        )+
    };
}

impl_scalar_sample! {
    f32 => Float32,
    i32 => Int32,
    i16 => Int16,
    i8 => Byte,
}

impl Sample for Complex32 {
    const SAMPLE_TYPE: SampleType = SampleType::Complex64;

    fn put_ne(self, dst: &mut BytesMut) {
        self.re.put_ne(dst);
        self.im.put_ne(dst);
    }

    fn from_ne(src: &[u8]) -> Self {
        let (re, im) = src.split_at(4);
        Self {
            re: f32::from_ne(re),
            im: f32::from_ne(im),
        }
    }
}
