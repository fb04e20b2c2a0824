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

//! # Blech32
//!
//! A variation of the bech32 encoding for blinded Elements segwit
//! addresses. Blinded addresses carry a 33-byte blinding key in front of
//! the witness program, which is why blech32 uses a longer checksum and a
//! longer code length than bech32.
//!

use std::convert::TryFrom;
use std::fmt;

use bech32::primitives::decode::{CheckedHrpstring, CheckedHrpstringError};
use bech32::{Fe32, Fe32IterExt, Hrp};

/// The blech32 checksum algorithm, used for witness version 0.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Blech32 {}

impl bech32::Checksum for Blech32 {
    type MidstateRepr = u64;
    const CHECKSUM_LENGTH: usize = 12;
    const GENERATOR_SH: [u64; 5] = [
        0x7d_52fb_a40b_d886,
        0x5e_8dbf_1a03_950c,
        0x1c_3a3c_7407_2a18,
        0x38_5d72_fa0e_5139,
        0x70_93e5_a608_865b,
    ];
    const TARGET_RESIDUE: u64 = 1;

    const CODE_LENGTH: usize = 1024;
}

/// The blech32m checksum algorithm, used for witness versions 1 and up.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Blech32m {}

impl bech32::Checksum for Blech32m {
    type MidstateRepr = u64;
    const CHECKSUM_LENGTH: usize = 12;
    const GENERATOR_SH: [u64; 5] = [
        0x7d_52fb_a40b_d886,
        0x5e_8dbf_1a03_950c,
        0x1c_3a3c_7407_2a18,
        0x38_5d72_fa0e_5139,
        0x70_93e5_a608_865b,
    ];
    const TARGET_RESIDUE: u64 = 0x455_972a_3350_f7a1;

    const CODE_LENGTH: usize = 1024;
}

/// Blech32 decoding errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Neither the blech32 nor the blech32m checksum matches.
    Checksum(CheckedHrpstringError),
    /// The checksum variant does not match the witness version.
    WrongVariant(u8),
    /// No witness version in front of the data.
    MissingWitnessVersion,
    /// The witness version is above 16.
    InvalidWitnessVersion(u8),
    /// Leftover bits were not zero, or more than four of them.
    InvalidPadding,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::Checksum(ref e) => write!(f, "{}", e),
            Error::WrongVariant(v) => {
                write!(f, "witness version {} encoded with the wrong checksum variant", v)
            }
            Error::MissingWitnessVersion => f.write_str("missing witness version"),
            Error::InvalidWitnessVersion(v) => write!(f, "invalid witness version {}", v),
            Error::InvalidPadding => f.write_str("invalid padding"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            Error::Checksum(ref e) => Some(e),
            _ => None,
        }
    }
}

/// Encodes a witness version and data (blinding key followed by the
/// witness program) as a lowercase blech32 string.
pub fn encode(hrp: &Hrp, witness_version: Fe32, data: &[u8]) -> String {
    let fes = std::iter::once(witness_version).chain(bytes_to_fes(data));
    let chars: String = if witness_version == Fe32::Q {
        fes.with_checksum::<Blech32>(hrp).chars().collect()
    } else {
        fes.with_checksum::<Blech32m>(hrp).chars().collect()
    };
    format!("{}1{}", hrp.to_lowercase(), chars)
}

/// Decodes a blech32 string into its hrp, witness version and data.
pub fn decode(s: &str) -> Result<(Hrp, Fe32, Vec<u8>), Error> {
    let (checked, is_blech32m) = match CheckedHrpstring::new::<Blech32>(s) {
        Ok(checked) => (checked, false),
        Err(_) => (CheckedHrpstring::new::<Blech32m>(s).map_err(Error::Checksum)?, true),
    };
    let hrp = checked.hrp();

    // The checked string guarantees a separator and valid characters.
    let sep = s.rfind('1').ok_or(Error::MissingWitnessVersion)?;
    let data_chars = &s[sep + 1..s.len() - 12];
    let mut fes = data_chars.chars().filter_map(|c| Fe32::from_char(c).ok());

    let version = fes.next().ok_or(Error::MissingWitnessVersion)?;
    if version.to_u8() > 16 {
        return Err(Error::InvalidWitnessVersion(version.to_u8()));
    }
    if (version == Fe32::Q) == is_blech32m {
        return Err(Error::WrongVariant(version.to_u8()));
    }
    let data = fes_to_bytes(fes)?;
    Ok((hrp, version, data))
}

fn bytes_to_fes(data: &[u8]) -> Vec<Fe32> {
    let mut ret = Vec::with_capacity((data.len() * 8 + 4) / 5);
    let mut acc: u16 = 0;
    let mut bits = 0;
    for b in data {
        acc = (acc << 8) | u16::from(*b);
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            ret.push(fe((acc >> bits) as u8 & 0x1f));
        }
    }
    if bits > 0 {
        ret.push(fe((acc << (5 - bits)) as u8 & 0x1f));
    }
    ret
}

fn fes_to_bytes<I: Iterator<Item = Fe32>>(fes: I) -> Result<Vec<u8>, Error> {
    let mut ret = vec![];
    let mut acc: u16 = 0;
    let mut bits = 0;
    for fe in fes {
        acc = (acc << 5) | u16::from(fe.to_u8());
        bits += 5;
        if bits >= 8 {
            bits -= 8;
            ret.push((acc >> bits) as u8);
        }
        acc &= (1 << bits) - 1;
    }
    if bits > 4 || acc != 0 {
        return Err(Error::InvalidPadding);
    }
    Ok(ret)
}

fn fe(x: u8) -> Fe32 {
    // Callers mask to five bits.
    Fe32::try_from(x).unwrap_or(Fe32::Q)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_both_variants() {
        let hrp = Hrp::parse("el").unwrap();
        let data: Vec<u8> = (0..53).collect();
        for version in [Fe32::Q, Fe32::P] {
            let s = encode(&hrp, version, &data);
            let (dec_hrp, dec_version, dec_data) = decode(&s).unwrap();
            assert_eq!(dec_hrp, hrp);
            assert_eq!(dec_version, version);
            assert_eq!(dec_data, data);
        }
    }

    #[test]
    fn corrupted_checksum() {
        let hrp = Hrp::parse("lq").unwrap();
        let mut s = encode(&hrp, Fe32::Q, &[7u8; 53]);
        let last = s.pop().unwrap();
        s.push(if last == 'q' { 'p' } else { 'q' });
        assert!(matches!(decode(&s), Err(Error::Checksum(_))));
    }

    #[test]
    fn bit_conversion() {
        let data = [0xffu8, 0x00, 0xa5];
        let fes = bytes_to_fes(&data);
        assert_eq!(fes.len(), 5);
        assert_eq!(fes_to_bytes(fes.into_iter()).unwrap(), data.to_vec());
        // Five non-zero padding bits are rejected.
        assert_eq!(fes_to_bytes([Fe32::L].iter().copied()), Err(Error::InvalidPadding));
    }
}
