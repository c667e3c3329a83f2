//! Stream decompressors.

use std::fmt;
use std::io::{self, Read};

use bzip2::read::BzDecoder;
use flate2::read::MultiGzDecoder;
use xz2::read::XzDecoder;

/// Compression codec applied to a whole byte stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    Gzip,
    Bzip2,
    Xz,
}

const GZIP_MAGIC: &[u8] = &[0x1f, 0x8b];
const XZ_MAGIC: &[u8] = &[0xfd, b'7', b'z', b'X', b'Z', 0x00];

impl Codec {
    pub fn name(self) -> &'static str {
        match self {
            Self::Gzip => "gzip",
            Self::Bzip2 => "bzip2",
            Self::Xz => "xz",
        }
    }

    /// Leading bytes every stream of this codec starts with.
    ///
    /// bzip2 has none here: like its reader, it only fails once data is read.
    pub(crate) fn magic(self) -> &'static [u8] {
        match self {
            Self::Gzip => GZIP_MAGIC,
            Self::Bzip2 => &[],
            Self::Xz => XZ_MAGIC,
        }
    }

    /// Validate the first `magic().len()` bytes of a stream.
    pub(crate) fn check_header(self, header: &[u8]) -> io::Result<()> {
        let magic = self.magic();
        if magic.is_empty() {
            return Ok(());
        }
        if header.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("empty input, expected {} data", self),
            ));
        }
        if header != magic {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("invalid {} header", self),
            ));
        }
        Ok(())
    }

    /// Wrap `source` in the decompressing reader for this codec.
    pub(crate) fn wrap(self, source: Box<dyn Read>) -> Box<dyn Read> {
        match self {
            Self::Gzip => Box::new(MultiGzDecoder::new(source)),
            Self::Bzip2 => Box::new(BzDecoder::new(source)),
            Self::Xz => Box::new(XzDecoder::new(source)),
        }
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gzip_header() {
        assert!(Codec::Gzip.check_header(&[0x1f, 0x8b]).is_ok());
        let err = Codec::Gzip.check_header(b"PK").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        let err = Codec::Gzip.check_header(&[]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn xz_header_must_be_complete() {
        assert!(Codec::Xz.check_header(XZ_MAGIC).is_ok());
        assert!(Codec::Xz.check_header(&XZ_MAGIC[..3]).is_err());
    }

    #[test]
    fn bzip2_defers_to_reader() {
        assert!(Codec::Bzip2.check_header(b"garbage").is_ok());
        assert!(Codec::Bzip2.check_header(&[]).is_ok());
    }
}
