//! Pluggable stream compression, selected by a structure's `compression` name.
//!
//! The system is built around the [`CompressionCodec`] trait and a global
//! registry. Built-in codecs are enabled via feature flags:
//! - **gzip** via `flate2` (feature: `compression-gzip`)
//! - **zstd** via `zstd` (feature: `compression-zstd`)
//! - **bzip2** via `bzip2` (feature: `compression-bzip2`)
//! - **xz** via `xz2` (feature: `compression-xz`)
//!
//! Codecs are looked up by name, case-insensitively, including aliases.
//! An unknown name is a construction-time
//! [`Error::UnsupportedCompression`], never a silent pass-through.
//!
//! Writers come back as a [`FinishWrite`]: entry writers call
//! [`FinishWrite::finish`] on `close`, so a failed trailer write is reported
//! instead of being lost in `Drop`.
//!
//! ## Custom codecs
//! ```
//! use entryio::io::compression::{register_codec, CompressionCodec, FinishWrite, PassThrough};
//! use std::io::{Read, Write};
//! use std::sync::Arc;
//!
//! struct Identity;
//! impl CompressionCodec for Identity {
//!     fn name(&self) -> &str { "identity" }
//!     fn aliases(&self) -> &[&str] { &[] }
//!     fn magic_bytes(&self) -> Option<&[u8]> { None }
//!     fn wrap_reader_dyn(&self, r: Box<dyn Read>) -> std::io::Result<Box<dyn Read>> { Ok(r) }
//!     fn wrap_writer_dyn(&self, w: Box<dyn Write>) -> std::io::Result<Box<dyn FinishWrite>> {
//!         Ok(Box::new(PassThrough(w)))
//!     }
//! }
//!
//! register_codec(Arc::new(Identity));
//! assert!(entryio::io::compression::codec_by_name("identity").is_some());
//! ```

use std::io::{self, Read, Write};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

use crate::error::{Error, Result};

/// Global codec registry for pluggable compression support.
static CODEC_REGISTRY: RwLock<Option<Vec<Arc<dyn CompressionCodec>>>> = RwLock::new(None);

/// Initialize the codec registry with built-in codecs.
fn init_registry() -> Vec<Arc<dyn CompressionCodec>> {
    vec![
        #[cfg(feature = "compression-gzip")]
        Arc::new(GzipCodec),
        #[cfg(feature = "compression-zstd")]
        Arc::new(ZstdCodec),
        #[cfg(feature = "compression-bzip2")]
        Arc::new(Bzip2Codec),
        #[cfg(feature = "compression-xz")]
        Arc::new(XzCodec),
    ]
}

/// Get or initialize the global codec registry.
fn get_registry() -> Vec<Arc<dyn CompressionCodec>> {
    let mut lock = CODEC_REGISTRY
        .write()
        .unwrap_or_else(PoisonError::into_inner);
    lock.get_or_insert_with(init_registry).clone()
}

/// Register a custom compression codec globally.
///
/// Later registrations take precedence over earlier ones with the same name.
pub fn register_codec(codec: Arc<dyn CompressionCodec>) {
    let mut lock = CODEC_REGISTRY
        .write()
        .unwrap_or_else(PoisonError::into_inner);
    lock.get_or_insert_with(init_registry).insert(0, codec);
}

/// A compression algorithm that can wrap byte streams.
///
/// Implementations must be `Send + Sync` as they live in a global registry.
pub trait CompressionCodec: Send + Sync {
    /// Canonical codec name (e.g., "gzip", "zstd").
    fn name(&self) -> &str;

    /// Alternative names accepted in a structure (e.g., `&["gz"]`).
    fn aliases(&self) -> &[&str];

    /// Optional magic byte signature used by [`sniff`].
    fn magic_bytes(&self) -> Option<&[u8]>;

    /// Wrap a reader with decompression.
    fn wrap_reader_dyn(&self, reader: Box<dyn Read>) -> std::io::Result<Box<dyn Read>>;

    /// Wrap a writer with compression.
    fn wrap_writer_dyn(&self, writer: Box<dyn Write>) -> std::io::Result<Box<dyn FinishWrite>>;
}

/// An output stream with an explicit end.
pub trait FinishWrite: Write {
    /// Writes any trailer, then flushes the underlying sink.
    ///
    /// # Errors
    /// The first failed write or flush.
    fn finish(self: Box<Self>) -> io::Result<()>;
}

/// Uncompressed output. Finishing only flushes.
pub struct PassThrough<W>(pub W);

impl<W: Write> Write for PassThrough<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.flush()
    }
}

impl<W: Write> FinishWrite for PassThrough<W> {
    fn finish(mut self: Box<Self>) -> io::Result<()> {
        self.0.flush()
    }
}

/// Looks up a registered codec by name or alias.
#[must_use]
pub fn codec_by_name(name: &str) -> Option<Arc<dyn CompressionCodec>> {
    let name = name.trim();
    get_registry().into_iter().find(|codec| {
        codec.name().eq_ignore_ascii_case(name)
            || codec.aliases().iter().any(|a| a.eq_ignore_ascii_case(name))
    })
}

/// Name of the registered codec whose magic bytes prefix `head`, if any.
#[must_use]
pub fn sniff(head: &[u8]) -> Option<String> {
    get_registry().into_iter().find_map(|codec| {
        let magic = codec.magic_bytes()?;
        head.starts_with(magic).then(|| codec.name().to_string())
    })
}

/// Wraps `reader` with the decompressor named `name`; `None` passes through.
///
/// # Errors
/// [`Error::UnsupportedCompression`] for unknown names, or the codec's
/// setup error.
pub fn wrap_reader(name: Option<&str>, reader: Box<dyn Read>) -> Result<Box<dyn Read>> {
    let Some(name) = name else {
        return Ok(reader);
    };
    let codec = codec_by_name(name).ok_or_else(|| Error::UnsupportedCompression(name.to_string()))?;
    debug!(codec = codec.name(), "wrapping reader with decompressor");
    Ok(codec.wrap_reader_dyn(reader)?)
}

/// Wraps `writer` with the compressor named `name`; `None` passes through.
///
/// # Errors
/// [`Error::UnsupportedCompression`] for unknown names, or the codec's
/// setup error.
pub fn wrap_writer(name: Option<&str>, writer: Box<dyn Write>) -> Result<Box<dyn FinishWrite>> {
    let Some(name) = name else {
        return Ok(Box::new(PassThrough(writer)));
    };
    let codec = codec_by_name(name).ok_or_else(|| Error::UnsupportedCompression(name.to_string()))?;
    debug!(codec = codec.name(), "wrapping writer with compressor");
    Ok(codec.wrap_writer_dyn(writer)?)
}

// ============================================================================
// Built-in Codec Implementations
// ============================================================================

#[cfg(feature = "compression-gzip")]
struct GzipCodec;

#[cfg(feature = "compression-gzip")]
impl CompressionCodec for GzipCodec {
    fn name(&self) -> &str {
        "gzip"
    }

    fn aliases(&self) -> &[&str] {
        &["gz"]
    }

    fn magic_bytes(&self) -> Option<&[u8]> {
        Some(&[0x1f, 0x8b])
    }

    fn wrap_reader_dyn(&self, reader: Box<dyn Read>) -> std::io::Result<Box<dyn Read>> {
        use flate2::read::GzDecoder;
        Ok(Box::new(GzDecoder::new(reader)))
    }

    fn wrap_writer_dyn(&self, writer: Box<dyn Write>) -> std::io::Result<Box<dyn FinishWrite>> {
        use flate2::Compression;
        use flate2::write::GzEncoder;
        Ok(Box::new(GzEncoder::new(writer, Compression::default())))
    }
}

#[cfg(feature = "compression-gzip")]
impl FinishWrite for flate2::write::GzEncoder<Box<dyn Write>> {
    fn finish(self: Box<Self>) -> io::Result<()> {
        Self::finish(*self)?.flush()
    }
}

#[cfg(feature = "compression-zstd")]
struct ZstdCodec;

#[cfg(feature = "compression-zstd")]
impl CompressionCodec for ZstdCodec {
    fn name(&self) -> &str {
        "zstd"
    }

    fn aliases(&self) -> &[&str] {
        &["zst"]
    }

    fn magic_bytes(&self) -> Option<&[u8]> {
        Some(&[0x28, 0xb5, 0x2f, 0xfd])
    }

    fn wrap_reader_dyn(&self, reader: Box<dyn Read>) -> std::io::Result<Box<dyn Read>> {
        zstd::stream::read::Decoder::new(reader).map(|d| Box::new(d) as Box<dyn Read>)
    }

    fn wrap_writer_dyn(&self, writer: Box<dyn Write>) -> std::io::Result<Box<dyn FinishWrite>> {
        zstd::stream::write::Encoder::new(writer, 3).map(|e| Box::new(e) as Box<dyn FinishWrite>)
    }
}

#[cfg(feature = "compression-zstd")]
impl FinishWrite for zstd::stream::write::Encoder<'static, Box<dyn Write>> {
    fn finish(self: Box<Self>) -> io::Result<()> {
        Self::finish(*self)?.flush()
    }
}

#[cfg(feature = "compression-bzip2")]
struct Bzip2Codec;

#[cfg(feature = "compression-bzip2")]
impl CompressionCodec for Bzip2Codec {
    fn name(&self) -> &str {
        "bzip2"
    }

    fn aliases(&self) -> &[&str] {
        &["bz2"]
    }

    fn magic_bytes(&self) -> Option<&[u8]> {
        Some(&[0x42, 0x5a, 0x68])
    }

    fn wrap_reader_dyn(&self, reader: Box<dyn Read>) -> std::io::Result<Box<dyn Read>> {
        use bzip2::read::BzDecoder;
        Ok(Box::new(BzDecoder::new(reader)))
    }

    fn wrap_writer_dyn(&self, writer: Box<dyn Write>) -> std::io::Result<Box<dyn FinishWrite>> {
        use bzip2::Compression;
        use bzip2::write::BzEncoder;
        Ok(Box::new(BzEncoder::new(writer, Compression::default())))
    }
}

#[cfg(feature = "compression-bzip2")]
impl FinishWrite for bzip2::write::BzEncoder<Box<dyn Write>> {
    fn finish(self: Box<Self>) -> io::Result<()> {
        Self::finish(*self)?.flush()
    }
}

#[cfg(feature = "compression-xz")]
struct XzCodec;

#[cfg(feature = "compression-xz")]
impl CompressionCodec for XzCodec {
    fn name(&self) -> &str {
        "xz"
    }

    fn aliases(&self) -> &[&str] {
        &["lzma"]
    }

    fn magic_bytes(&self) -> Option<&[u8]> {
        Some(&[0xfd, 0x37, 0x7a, 0x58, 0x5a, 0x00])
    }

    fn wrap_reader_dyn(&self, reader: Box<dyn Read>) -> std::io::Result<Box<dyn Read>> {
        use xz2::read::XzDecoder;
        Ok(Box::new(XzDecoder::new(reader)))
    }

    fn wrap_writer_dyn(&self, writer: Box<dyn Write>) -> std::io::Result<Box<dyn FinishWrite>> {
        use xz2::write::XzEncoder;
        Ok(Box::new(XzEncoder::new(writer, 6)))
    }
}

#[cfg(feature = "compression-xz")]
impl FinishWrite for xz2::write::XzEncoder<Box<dyn Write>> {
    fn finish(self: Box<Self>) -> io::Result<()> {
        Self::finish(*self)?.flush()
    }
}
