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

//! Account identifiers and onboarding signatures
//!
//! An account id is `BLAKE2b-256(flag || public key)`. For zk accounts the
//! preimage is `0x05 || len(iss) || iss || address_seed` instead.

use k256::ecdsa::{RecoveryId, Signature as EcdsaSignature, VerifyingKey as EcdsaVerifyingKey};
use num_bigint::BigUint;
use tracing::debug;

use crate::error::SignerError;
use crate::hash::{blake2b256, message_hash};
use crate::scheme::SignatureScheme;
use crate::types::AccountId;

/// Length of an onboarding signature: `r || s || v`
pub const ONBOARDING_SIGNATURE_LEN: usize = 65;

/// Derive the account id of a public key
pub fn account_id_from_public_key(
	scheme: SignatureScheme,
	public_key: &[u8],
) -> Result<AccountId, SignerError> {
	let key = match scheme {
		SignatureScheme::Ed25519 if public_key.len() == 32 => public_key.to_vec(),
		SignatureScheme::Secp256k1 => EcdsaVerifyingKey::from_sec1_bytes(public_key)
			.map_err(|e| SignerError::InvalidPublicKey(format!("Invalid secp256k1 key: {}", e)))?
			.to_encoded_point(true)
			.as_bytes()
			.to_vec(),
		SignatureScheme::Ed25519 => {
			return Err(SignerError::InvalidPublicKey(format!(
				"Ed25519 key must be 32 bytes, got {}",
				public_key.len()
			)));
		}
		other => return Err(SignerError::UnsupportedKeyScheme(other)),
	};

	let mut preimage = Vec::with_capacity(1 + key.len());
	preimage.push(scheme.flag());
	preimage.extend_from_slice(&key);
	Ok(AccountId(blake2b256(&preimage)))
}

/// Derive the account id of a zk-wrapped identity
pub fn zk_account_id(address_seed: &str, iss: &str) -> Result<AccountId, SignerError> {
	let seed = BigUint::parse_bytes(address_seed.as_bytes(), 10).ok_or_else(|| {
		SignerError::ZkPayloadMalformed(format!("Invalid address seed: {}", address_seed))
	})?;
	let seed_bytes = seed.to_bytes_be();
	if seed_bytes.len() > 32 {
		return Err(SignerError::ZkPayloadMalformed(
			"Address seed exceeds 32 bytes".to_string(),
		));
	}
	let iss_len = u8::try_from(iss.len())
		.map_err(|_| SignerError::ZkPayloadMalformed("Issuer too long".to_string()))?;

	let mut preimage = Vec::with_capacity(2 + iss.len() + 32);
	preimage.push(SignatureScheme::ZkLogin.flag());
	preimage.push(iss_len);
	preimage.extend_from_slice(iss.as_bytes());
	preimage.extend(std::iter::repeat_n(0u8, 32 - seed_bytes.len()));
	preimage.extend_from_slice(&seed_bytes);
	Ok(AccountId(blake2b256(&preimage)))
}

/// Recover the secp256k1 signer of `message_hash` and derive its account id
///
/// `recovery_param` accepts `0`/`1` and the Ethereum-style `27`/`28`.
pub fn recover_address(
	message_hash: &[u8],
	signature: &[u8],
	recovery_param: u8,
) -> Result<AccountId, SignerError> {
	let recovery_byte = match recovery_param {
		27 | 28 => recovery_param - 27,
		other => other,
	};
	let recovery_id = RecoveryId::from_byte(recovery_byte).ok_or_else(|| {
		SignerError::SignatureFormat(format!("Invalid recovery parameter: {}", recovery_param))
	})?;
	let signature = EcdsaSignature::from_slice(signature)
		.map_err(|e| SignerError::SignatureFormat(format!("Invalid signature: {}", e)))?;
	// Recovery only accepts low-S; negating s mirrors R, so flip the y parity
	let (signature, recovery_id) = match signature.normalize_s() {
		Some(low_s) => (
			low_s,
			RecoveryId::new(!recovery_id.is_y_odd(), recovery_id.is_x_reduced()),
		),
		None => (signature, recovery_id),
	};

	let recovered = EcdsaVerifyingKey::recover_from_prehash(message_hash, &signature, recovery_id)
		.map_err(|e| SignerError::SignatureFormat(format!("Key recovery failed: {}", e)))?;

	account_id_from_public_key(
		SignatureScheme::Secp256k1,
		recovered.to_encoded_point(true).as_bytes(),
	)
}

/// Check that `signature` over `message` was produced by `claimed`
///
/// Returns `false` for any malformed input; never errors.
pub fn verify_onboarding(claimed: &AccountId, message: &[u8], signature: &[u8]) -> bool {
	match recover_onboarding_signer(message, signature) {
		Ok(recovered) => recovered == *claimed,
		Err(e) => {
			debug!("Onboarding signature rejected: {}", e);
			false
		}
	}
}

fn recover_onboarding_signer(message: &[u8], signature: &[u8]) -> Result<AccountId, SignerError> {
	if signature.len() != ONBOARDING_SIGNATURE_LEN {
		return Err(SignerError::OnboardingSignatureMalformed(signature.len()));
	}
	let hash = message_hash(message);
	recover_address(&hash, &signature[..64], signature[64])
}
