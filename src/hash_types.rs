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

//! Hash newtypes, so that hashes of the same format but different meaning
//! do not mix.

use bitcoin::hashes::{hash_newtype, sha256d, Hash};

macro_rules! impl_hashencode {
    ($hashtype:ident) => {
        impl $crate::encode::Encodable for $hashtype {
            fn consensus_encode<W: std::io::Write>(&self, w: W) -> Result<usize, $crate::encode::Error> {
                self.to_byte_array().consensus_encode(w)
            }
        }

        impl $crate::encode::Decodable for $hashtype {
            fn consensus_decode<R: std::io::Read>(r: R) -> Result<Self, $crate::encode::Error> {
                Ok(Self::from_byte_array(<[u8; 32]>::consensus_decode(r)?))
            }
        }
    };
}

hash_newtype! {
    /// An elements transaction ID
    pub struct Txid(sha256d::Hash);
}

use crate::encode::{Decodable, Encodable};

impl_hashencode!(Txid);
