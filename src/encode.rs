// Rust Elements CT Engine
// Written in 2026 by
//   The Elements developers
//
// To the extent possible under law, the author(s) have dedicated all
// copyright and related and neighboring rights to this software to
// the public domain worldwide. This software is distributed without
// any warranty.
//
// You should have received a copy of the CC0 Public Domain Dedication
// along with this software.
// If not, see <http://creativecommons.org/publicdomain/zero/1.0/>.
//

//! Consensus-encodable types
//!
//! Elements serializes transactions the same way Bitcoin does, except that
//! every asset, value and nonce carries a one-byte prefix telling whether it
//! is null, explicit or committed, and that proofs live in the witness.
//!

use std::io::{self, Cursor, Read, Write};
use std::{error, fmt};

use bitcoin::hex::{DisplayHex, FromHex, HexToBytesError};
use bitcoin::ScriptBuf;
use secp256k1_zkp::{self, RangeProof, SurjectionProof};

/// Maximum size, in bytes, of a vector we are allowed to decode
pub const MAX_VEC_SIZE: usize = 4_000_000;

/// Encoding error
#[derive(Debug)]
pub enum Error {
    /// And I/O error
    Io(io::Error),
    /// Tried to allocate an oversized vector
    OversizedVectorAllocation {
        /// The capacity requested
        requested: usize,
        /// The maximum capacity
        max: usize,
    },
    /// A varint was not minimally encoded
    NonMinimalVarInt,
    /// Parsing error
    ParseFailed(&'static str),
    /// Invalid prefix for the confidential type.
    InvalidConfidentialPrefix(u8),
    /// Parsing within libsecp256k1 failed
    Secp256k1(secp256k1_zkp::UpstreamError),
    /// Parsing within libsecp256k1-zkp failed
    Secp256k1zkp(secp256k1_zkp::Error),
    /// Hex parsing errors
    HexError(HexToBytesError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::Io(ref e) => write!(f, "I/O error: {}", e),
            Error::OversizedVectorAllocation {
                requested: ref r,
                max: ref m,
            } => write!(f, "oversized vector allocation: requested {}, maximum {}", r, m),
            Error::NonMinimalVarInt => write!(f, "non-minimal varint"),
            Error::ParseFailed(ref e) => write!(f, "parse failed: {}", e),
            Error::InvalidConfidentialPrefix(p) => {
                write!(f, "invalid confidential prefix: 0x{:02x}", p)
            }
            Error::Secp256k1(ref e) => write!(f, "{}", e),
            Error::Secp256k1zkp(ref e) => write!(f, "{}", e),
            Error::HexError(ref e) => write!(f, "Hex error {}", e),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            Error::Io(ref e) => Some(e),
            Error::Secp256k1zkp(ref e) => Some(e),
            Error::HexError(ref e) => Some(e),
            _ => None,
        }
    }
}

#[doc(hidden)]
impl From<io::Error> for Error {
    fn from(e: io::Error) -> Error {
        Error::Io(e)
    }
}

#[doc(hidden)]
impl From<secp256k1_zkp::UpstreamError> for Error {
    fn from(e: secp256k1_zkp::UpstreamError) -> Self {
        Error::Secp256k1(e)
    }
}

#[doc(hidden)]
impl From<secp256k1_zkp::Error> for Error {
    fn from(e: secp256k1_zkp::Error) -> Self {
        Error::Secp256k1zkp(e)
    }
}

#[doc(hidden)]
impl From<HexToBytesError> for Error {
    fn from(e: HexToBytesError) -> Self {
        Error::HexError(e)
    }
}

/// Data which can be encoded in a consensus-consistent way
pub trait Encodable {
    /// Encode an object with a well-defined format, should only ever error if
    /// the underlying `Write` errors. Returns the number of bytes written on
    /// success
    fn consensus_encode<W: Write>(&self, w: W) -> Result<usize, Error>;
}

/// Data which can be encoded in a consensus-consistent way
pub trait Decodable: Sized {
    /// Decode an object with a well-defined format
    fn consensus_decode<R: Read>(r: R) -> Result<Self, Error>;
}

/// Encode an object into a vector
pub fn serialize<T: Encodable + ?Sized>(data: &T) -> Vec<u8> {
    let mut encoder = Cursor::new(vec![]);
    // Writing into a Vec cannot fail.
    let _ = data.consensus_encode(&mut encoder);
    encoder.into_inner()
}

/// Encode an object into a hex-encoded string
pub fn serialize_hex<T: Encodable + ?Sized>(data: &T) -> String {
    serialize(data).to_lower_hex_string()
}

/// Deserialize an object from a vector, will error if said deserialization
/// doesn't consume the entire vector.
pub fn deserialize<T: Decodable>(data: &[u8]) -> Result<T, Error> {
    let (rv, consumed) = deserialize_partial(data)?;

    // Fail if data are not consumed entirely.
    if consumed == data.len() {
        Ok(rv)
    } else {
        Err(Error::ParseFailed(
            "data not consumed entirely when explicitly deserializing",
        ))
    }
}

/// Deserialize an object from a hex string
pub fn deserialize_hex<T: Decodable>(s: &str) -> Result<T, Error> {
    let bytes = Vec::<u8>::from_hex(s)?;
    deserialize(&bytes)
}

/// Deserialize an object from a vector, but will not report an error if said
/// deserialization doesn't consume the entire vector.
pub fn deserialize_partial<T: Decodable>(data: &[u8]) -> Result<(T, usize), Error> {
    let mut decoder = Cursor::new(data);
    let rv = Decodable::consensus_decode(&mut decoder)?;
    let consumed = decoder.position() as usize;

    Ok((rv, consumed))
}

/// A variable-length unsigned integer
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct VarInt(pub u64);

impl VarInt {
    /// Gets the length of this VarInt when encoded.
    pub fn size(&self) -> usize {
        match self.0 {
            0..=0xFC => 1,
            0xFD..=0xFFFF => 3,
            0x10000..=0xFFFF_FFFF => 5,
            _ => 9,
        }
    }
}

impl Encodable for VarInt {
    fn consensus_encode<W: Write>(&self, mut w: W) -> Result<usize, Error> {
        match self.0 {
            0..=0xFC => {
                (self.0 as u8).consensus_encode(w)?;
                Ok(1)
            }
            0xFD..=0xFFFF => {
                w.write_all(&[0xFD])?;
                (self.0 as u16).consensus_encode(w)?;
                Ok(3)
            }
            0x10000..=0xFFFF_FFFF => {
                w.write_all(&[0xFE])?;
                (self.0 as u32).consensus_encode(w)?;
                Ok(5)
            }
            _ => {
                w.write_all(&[0xFF])?;
                self.0.consensus_encode(w)?;
                Ok(9)
            }
        }
    }
}

impl Decodable for VarInt {
    fn consensus_decode<R: Read>(mut r: R) -> Result<Self, Error> {
        let n = u8::consensus_decode(&mut r)?;
        match n {
            0xFF => {
                let x = u64::consensus_decode(r)?;
                if x < 0x1_0000_0000 {
                    Err(Error::NonMinimalVarInt)
                } else {
                    Ok(VarInt(x))
                }
            }
            0xFE => {
                let x = u32::consensus_decode(r)?;
                if x < 0x1_0000 {
                    Err(Error::NonMinimalVarInt)
                } else {
                    Ok(VarInt(u64::from(x)))
                }
            }
            0xFD => {
                let x = u16::consensus_decode(r)?;
                if x < 0xFD {
                    Err(Error::NonMinimalVarInt)
                } else {
                    Ok(VarInt(u64::from(x)))
                }
            }
            n => Ok(VarInt(u64::from(n))),
        }
    }
}

macro_rules! impl_int_encodable {
    ($ty:ident, $len:expr) => {
        impl Encodable for $ty {
            fn consensus_encode<W: Write>(&self, mut w: W) -> Result<usize, Error> {
                w.write_all(&self.to_le_bytes())?;
                Ok($len)
            }
        }

        impl Decodable for $ty {
            fn consensus_decode<R: Read>(mut r: R) -> Result<Self, Error> {
                let mut buf = [0u8; $len];
                r.read_exact(&mut buf)?;
                Ok($ty::from_le_bytes(buf))
            }
        }
    };
}

impl_int_encodable!(u8, 1);
impl_int_encodable!(u16, 2);
impl_int_encodable!(u32, 4);
impl_int_encodable!(u64, 8);

impl Encodable for [u8; 32] {
    fn consensus_encode<W: Write>(&self, mut w: W) -> Result<usize, Error> {
        w.write_all(&self[..])?;
        Ok(32)
    }
}

impl Decodable for [u8; 32] {
    fn consensus_decode<R: Read>(mut r: R) -> Result<Self, Error> {
        let mut ret = [0u8; 32];
        r.read_exact(&mut ret)?;
        Ok(ret)
    }
}

/// Writes a length-prefixed byte slice
pub(crate) fn consensus_encode_bytes<W: Write>(data: &[u8], mut w: W) -> Result<usize, Error> {
    let vi_len = VarInt(data.len() as u64).consensus_encode(&mut w)?;
    w.write_all(data)?;
    Ok(vi_len + data.len())
}

impl Encodable for Vec<u8> {
    fn consensus_encode<W: Write>(&self, w: W) -> Result<usize, Error> {
        consensus_encode_bytes(self, w)
    }
}

impl Decodable for Vec<u8> {
    fn consensus_decode<R: Read>(mut r: R) -> Result<Self, Error> {
        let len = VarInt::consensus_decode(&mut r)?.0 as usize;
        if len > MAX_VEC_SIZE {
            return Err(Error::OversizedVectorAllocation {
                requested: len,
                max: MAX_VEC_SIZE,
            });
        }
        let mut ret = vec![0; len];
        r.read_exact(&mut ret)?;
        Ok(ret)
    }
}

impl Encodable for Vec<Vec<u8>> {
    fn consensus_encode<W: Write>(&self, mut w: W) -> Result<usize, Error> {
        let mut len = VarInt(self.len() as u64).consensus_encode(&mut w)?;
        for item in self {
            len += item.consensus_encode(&mut w)?;
        }
        Ok(len)
    }
}

impl Decodable for Vec<Vec<u8>> {
    fn consensus_decode<R: Read>(mut r: R) -> Result<Self, Error> {
        let len = VarInt::consensus_decode(&mut r)?.0 as usize;
        // Every element costs at least one byte.
        if len > MAX_VEC_SIZE {
            return Err(Error::OversizedVectorAllocation {
                requested: len,
                max: MAX_VEC_SIZE,
            });
        }
        let mut ret = Vec::with_capacity(len.min(1024));
        for _ in 0..len {
            ret.push(Decodable::consensus_decode(&mut r)?);
        }
        Ok(ret)
    }
}

impl Encodable for ScriptBuf {
    fn consensus_encode<W: Write>(&self, w: W) -> Result<usize, Error> {
        consensus_encode_bytes(self.as_bytes(), w)
    }
}

impl Decodable for ScriptBuf {
    fn consensus_decode<R: Read>(r: R) -> Result<Self, Error> {
        Ok(ScriptBuf::from_bytes(Decodable::consensus_decode(r)?))
    }
}

// Proofs are optional in the witness; an absent proof is written as an
// empty byte vector.
impl Encodable for Option<Box<RangeProof>> {
    fn consensus_encode<W: Write>(&self, w: W) -> Result<usize, Error> {
        match *self {
            Some(ref prf) => consensus_encode_bytes(&prf.serialize(), w),
            None => consensus_encode_bytes(&[], w),
        }
    }
}

impl Decodable for Option<Box<RangeProof>> {
    fn consensus_decode<R: Read>(r: R) -> Result<Self, Error> {
        let v: Vec<u8> = Decodable::consensus_decode(r)?;
        if v.is_empty() {
            Ok(None)
        } else {
            Ok(Some(Box::new(RangeProof::from_slice(&v)?)))
        }
    }
}

impl Encodable for Option<Box<SurjectionProof>> {
    fn consensus_encode<W: Write>(&self, w: W) -> Result<usize, Error> {
        match *self {
            Some(ref prf) => consensus_encode_bytes(&prf.serialize(), w),
            None => consensus_encode_bytes(&[], w),
        }
    }
}

impl Decodable for Option<Box<SurjectionProof>> {
    fn consensus_decode<R: Read>(r: R) -> Result<Self, Error> {
        let v: Vec<u8> = Decodable::consensus_decode(r)?;
        if v.is_empty() {
            Ok(None)
        } else {
            Ok(Some(Box::new(SurjectionProof::from_slice(&v)?)))
        }
    }
}

/// Implements `Encodable`/`Decodable` for a vector of consensus types
macro_rules! impl_vec {
    ($type: ty) => {
        impl $crate::encode::Encodable for Vec<$type> {
            #[inline]
            fn consensus_encode<W: std::io::Write>(
                &self,
                mut w: W,
            ) -> Result<usize, $crate::encode::Error> {
                let mut len = 0;
                len += $crate::encode::VarInt(self.len() as u64).consensus_encode(&mut w)?;
                for c in self.iter() {
                    len += c.consensus_encode(&mut w)?;
                }
                Ok(len)
            }
        }

        impl $crate::encode::Decodable for Vec<$type> {
            #[inline]
            fn consensus_decode<R: std::io::Read>(mut r: R) -> Result<Self, $crate::encode::Error> {
                let len = $crate::encode::VarInt::consensus_decode(&mut r)?.0;
                let byte_size = (len as usize)
                    .checked_mul(std::mem::size_of::<$type>())
                    .ok_or($crate::encode::Error::ParseFailed("Invalid length"))?;
                if byte_size > $crate::encode::MAX_VEC_SIZE {
                    return Err($crate::encode::Error::OversizedVectorAllocation {
                        requested: byte_size,
                        max: $crate::encode::MAX_VEC_SIZE,
                    });
                }
                let mut ret = Vec::with_capacity(len as usize);
                for _ in 0..len {
                    ret.push($crate::encode::Decodable::consensus_decode(&mut r)?);
                }
                Ok(ret)
            }
        }
    };
}
pub(crate) use impl_vec;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn varint_sizes() {
        for (n, len) in [(0u64, 1), (0xFC, 1), (0xFD, 3), (0xFFFF, 3), (0x10000, 5), (0x1_0000_0000, 9)] {
            let v = VarInt(n);
            assert_eq!(serialize(&v).len(), len);
            assert_eq!(v.size(), len);
            assert_eq!(deserialize::<VarInt>(&serialize(&v)).unwrap(), v);
        }
    }

    #[test]
    fn non_minimal_varint() {
        assert!(matches!(
            deserialize::<VarInt>(&[0xFD, 0x10, 0x00]),
            Err(Error::NonMinimalVarInt)
        ));
        assert!(matches!(
            deserialize::<VarInt>(&[0xFE, 0xFF, 0x00, 0x00, 0x00]),
            Err(Error::NonMinimalVarInt)
        ));
    }

    #[test]
    fn trailing_data_rejected() {
        assert!(deserialize::<u32>(&[1, 0, 0, 0]).is_ok());
        assert!(matches!(
            deserialize::<u32>(&[1, 0, 0, 0, 0]),
            Err(Error::ParseFailed(_))
        ));
    }

    #[test]
    fn oversized_bytes() {
        let mut data = serialize(&VarInt(MAX_VEC_SIZE as u64 + 1));
        data.push(0);
        assert!(matches!(
            deserialize::<Vec<u8>>(&data),
            Err(Error::OversizedVectorAllocation { .. })
        ));
    }

    #[test]
    fn hex_helpers() {
        let hex = serialize_hex(&0x0102_0304u32);
        assert_eq!(hex, "04030201");
        assert_eq!(deserialize_hex::<u32>(&hex).unwrap(), 0x0102_0304);
        assert!(deserialize_hex::<u32>("0403020").is_err());
        assert!(matches!(deserialize_hex::<u32>("0403020100"), Err(Error::ParseFailed(_))));
    }

    #[test]
    fn empty_proofs() {
        let none: Option<Box<RangeProof>> = None;
        assert_eq!(serialize(&none), vec![0]);
        let back: Option<Box<RangeProof>> = deserialize(&[0]).unwrap();
        assert!(back.is_none());
    }
}
