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

//! Signing capabilities
//!
//! The signer never touches private key material directly. It asks a
//! [`SigningCapability`] (a local keypair, a hardware key, a browser wallet)
//! for a public key, a key scheme and signatures. The capability call is the
//! only suspension point in this crate.

use std::fmt;

use async_trait::async_trait;
use ed25519_dalek::Signer as _;
use k256::ecdsa::{RecoveryId, Signature as EcdsaSignature, signature::Signer as _};
use rand::rngs::OsRng;

use crate::error::{CapabilityError, SignerError};
use crate::hash::{IntentScope, payload_digest};
use crate::scheme::SignatureScheme;

/// Anything that can produce signatures for one key
#[async_trait]
pub trait SigningCapability: Send + Sync {
	/// Public key bytes (32 bytes Ed25519, 33-byte compressed SEC1 secp256k1)
	fn public_key(&self) -> Vec<u8>;

	fn key_scheme(&self) -> SignatureScheme;

	/// Sign `message` with the scheme's native primitive
	///
	/// secp256k1 hashes the message with SHA-256 internally; Ed25519 signs
	/// the bytes as given. Returns the raw 64-byte signature.
	async fn sign(&self, message: &[u8]) -> Result<Vec<u8>, CapabilityError>;

	/// Sign `message` under the intent-framed personal-message convention
	///
	/// Only wallet-style capabilities support this.
	async fn sign_message(&self, _message: &[u8]) -> Result<Vec<u8>, CapabilityError> {
		Err(CapabilityError::Unsupported(
			"personal message signing".to_string(),
		))
	}
}

/// In-process Ed25519 key
pub struct Ed25519Keypair {
	signing_key: ed25519_dalek::SigningKey,
}

impl Ed25519Keypair {
	/// Generate a fresh key from the OS RNG
	pub fn generate() -> Self {
		Self {
			signing_key: ed25519_dalek::SigningKey::generate(&mut OsRng),
		}
	}

	pub fn from_secret_bytes(secret: &[u8; 32]) -> Self {
		Self {
			signing_key: ed25519_dalek::SigningKey::from_bytes(secret),
		}
	}

	pub fn public_key_bytes(&self) -> [u8; 32] {
		self.signing_key.verifying_key().to_bytes()
	}
}

impl fmt::Debug for Ed25519Keypair {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Ed25519Keypair")
			.field("public_key", &hex::encode(self.public_key_bytes()))
			.finish()
	}
}

#[async_trait]
impl SigningCapability for Ed25519Keypair {
	fn public_key(&self) -> Vec<u8> {
		self.public_key_bytes().to_vec()
	}

	fn key_scheme(&self) -> SignatureScheme {
		SignatureScheme::Ed25519
	}

	async fn sign(&self, message: &[u8]) -> Result<Vec<u8>, CapabilityError> {
		Ok(self.signing_key.sign(message).to_bytes().to_vec())
	}

	async fn sign_message(&self, message: &[u8]) -> Result<Vec<u8>, CapabilityError> {
		let digest = payload_digest(message, IntentScope::PersonalMessage)
			.map_err(|e| CapabilityError::Signing(e.to_string()))?;
		Ok(self.signing_key.sign(&digest).to_bytes().to_vec())
	}
}

/// In-process secp256k1 key
pub struct Secp256k1Keypair {
	signing_key: k256::ecdsa::SigningKey,
}

impl Secp256k1Keypair {
	/// Generate a fresh key from the OS RNG
	pub fn generate() -> Self {
		Self {
			signing_key: k256::ecdsa::SigningKey::random(&mut OsRng),
		}
	}

	pub fn from_secret_bytes(secret: &[u8]) -> Result<Self, SignerError> {
		let signing_key = k256::ecdsa::SigningKey::from_slice(secret)
			.map_err(|e| SignerError::InvalidPublicKey(format!("Invalid secp256k1 secret: {}", e)))?;
		Ok(Self { signing_key })
	}

	/// Compressed SEC1 public key
	pub fn public_key_bytes(&self) -> [u8; 33] {
		let point = self.signing_key.verifying_key().to_encoded_point(true);
		let mut out = [0u8; 33];
		out.copy_from_slice(point.as_bytes());
		out
	}

	/// Sign a 32-byte digest and return `r || s || v`
	///
	/// This is the fixed 65-byte form checked by onboarding verification.
	pub fn sign_prehash_recoverable(&self, digest: &[u8]) -> Result<[u8; 65], SignerError> {
		let (signature, recovery_id): (EcdsaSignature, RecoveryId) = self
			.signing_key
			.sign_prehash_recoverable(digest)
			.map_err(|e| CapabilityError::Signing(e.to_string()))?;
		let mut out = [0u8; 65];
		out[..64].copy_from_slice(&signature.to_bytes());
		out[64] = recovery_id.to_byte();
		Ok(out)
	}
}

impl fmt::Debug for Secp256k1Keypair {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Secp256k1Keypair")
			.field("public_key", &hex::encode(self.public_key_bytes()))
			.finish()
	}
}

#[async_trait]
impl SigningCapability for Secp256k1Keypair {
	fn public_key(&self) -> Vec<u8> {
		self.public_key_bytes().to_vec()
	}

	fn key_scheme(&self) -> SignatureScheme {
		SignatureScheme::Secp256k1
	}

	async fn sign(&self, message: &[u8]) -> Result<Vec<u8>, CapabilityError> {
		let signature: EcdsaSignature = self
			.signing_key
			.try_sign(message)
			.map_err(|e| CapabilityError::Signing(e.to_string()))?;
		Ok(signature.to_bytes().to_vec())
	}

	async fn sign_message(&self, message: &[u8]) -> Result<Vec<u8>, CapabilityError> {
		let digest = payload_digest(message, IntentScope::PersonalMessage)
			.map_err(|e| CapabilityError::Signing(e.to_string()))?;
		let signature: EcdsaSignature = self
			.signing_key
			.try_sign(&digest)
			.map_err(|e| CapabilityError::Signing(e.to_string()))?;
		Ok(signature.to_bytes().to_vec())
	}
}
