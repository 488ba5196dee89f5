// Copyright 2025 itscheems
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Key schemes and signature tags
//!
//! Two encodings identify how a signature was produced:
//!
//! - **Scheme flag**: one byte prefixed to serialized signatures and to the
//!   public key when deriving an account id (`0x00` Ed25519, `0x01` secp256k1,
//!   `0x02` secp256r1, `0x05` zkLogin).
//! - **Signature tag**: one ASCII digit appended to a hex signature that the
//!   on-chain verifier reads to pick its verification routine.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::SignerError;

/// Signature scheme of a key or serialized signature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SignatureScheme {
	Ed25519,
	Secp256k1,
	Secp256r1,
	ZkLogin,
}

impl SignatureScheme {
	/// Flag byte used in serialized signatures and address derivation
	pub fn flag(self) -> u8 {
		match self {
			SignatureScheme::Ed25519 => 0x00,
			SignatureScheme::Secp256k1 => 0x01,
			SignatureScheme::Secp256r1 => 0x02,
			SignatureScheme::ZkLogin => 0x05,
		}
	}

	pub fn from_flag(flag: u8) -> Option<Self> {
		match flag {
			0x00 => Some(SignatureScheme::Ed25519),
			0x01 => Some(SignatureScheme::Secp256k1),
			0x02 => Some(SignatureScheme::Secp256r1),
			0x05 => Some(SignatureScheme::ZkLogin),
			_ => None,
		}
	}

	/// Length of a public key of this scheme, if it has a fixed one
	pub fn public_key_len(self) -> Option<usize> {
		match self {
			SignatureScheme::Ed25519 => Some(32),
			SignatureScheme::Secp256k1 | SignatureScheme::Secp256r1 => Some(33),
			SignatureScheme::ZkLogin => None,
		}
	}

	/// Infer the scheme from a public key encoding
	///
	/// Ed25519 keys are 32 bytes; secp256k1 SEC1 keys are 33 (compressed)
	/// or 65 (uncompressed) bytes.
	pub fn from_public_key(public_key: &[u8]) -> Option<Self> {
		match public_key.len() {
			32 => Some(SignatureScheme::Ed25519),
			33 | 65 => Some(SignatureScheme::Secp256k1),
			_ => None,
		}
	}

	pub fn as_str(self) -> &'static str {
		match self {
			SignatureScheme::Ed25519 => "ED25519",
			SignatureScheme::Secp256k1 => "Secp256k1",
			SignatureScheme::Secp256r1 => "Secp256r1",
			SignatureScheme::ZkLogin => "ZkLogin",
		}
	}
}

impl fmt::Display for SignatureScheme {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for SignatureScheme {
	type Err = SignerError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let normalized = s.trim().to_ascii_lowercase();
		match normalized.as_str() {
			"ed25519" => Ok(SignatureScheme::Ed25519),
			"secp256k1" | "ecdsa" => Ok(SignatureScheme::Secp256k1),
			"secp256r1" => Ok(SignatureScheme::Secp256r1),
			"zklogin" => Ok(SignatureScheme::ZkLogin),
			other => Err(SignerError::Serialization(format!(
				"Unknown signature scheme: {}",
				other
			))),
		}
	}
}

impl TryFrom<String> for SignatureScheme {
	type Error = SignerError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		value.parse()
	}
}

impl From<SignatureScheme> for String {
	fn from(scheme: SignatureScheme) -> Self {
		scheme.as_str().to_string()
	}
}

/// Trailing digit of a transmitted signature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignatureTag {
	/// `0`: secp256k1 ECDSA, recovery id omitted
	Ecdsa,
	/// `1`: Ed25519 over the SHA-256 digest
	Ed25519,
	/// `2`: produced by a wallet that intent-frames every message
	Wallet,
}

impl SignatureTag {
	pub fn as_char(self) -> char {
		match self {
			SignatureTag::Ecdsa => '0',
			SignatureTag::Ed25519 => '1',
			SignatureTag::Wallet => '2',
		}
	}

	pub fn from_char(c: char) -> Result<Self, SignerError> {
		match c {
			'0' => Ok(SignatureTag::Ecdsa),
			'1' => Ok(SignatureTag::Ed25519),
			'2' => Ok(SignatureTag::Wallet),
			other => Err(SignerError::UnsupportedSignatureTag(other)),
		}
	}
}

/// Split a tagged signature string into its hex body and trailing tag
pub fn split_tag(signature: &str) -> Result<(&str, SignatureTag), SignerError> {
	let tag = signature
		.chars()
		.last()
		.ok_or_else(|| SignerError::SignatureFormat("Empty signature".to_string()))?;
	let body = &signature[..signature.len() - tag.len_utf8()];
	Ok((body, SignatureTag::from_char(tag)?))
}
