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

//! Order and payload signing
//!
//! Every signature leaves this module as a [`SigPK`]: hex of the raw
//! 64-byte signature followed by one tag digit, plus the base64 public key.
//!
//! # Signed content
//!
//! For an order, the signed message `M` is the hex text of its canonical
//! buffer and `D = SHA-256(M)` is its order hash. For a generic payload, `M`
//! is its JSON encoding.
//!
//! - **secp256k1** (tag `0`): the key signs `M`; the primitive hashes it to
//!   `D` internally. The recovery id is not transmitted.
//! - **Ed25519** (tag `1`): the key signs `D`.
//! - **Wallet** (tag `2`): the wallet signs `D` under the intent-framed
//!   personal-message convention.
//!
//! Verification always takes `D` as its content.

use ed25519_dalek::{Signature as Ed25519Signature, Verifier as _, VerifyingKey as Ed25519VerifyingKey};
use k256::ecdsa::{
	RecoveryId, Signature as EcdsaSignature, VerifyingKey as EcdsaVerifyingKey,
	signature::Verifier as _,
};
use serde::Serialize;
use tracing::{debug, warn};

use crate::capability::SigningCapability;
use crate::codec::serialized_order_hex;
use crate::error::SignerError;
use crate::hash::{DIGEST_LEN, IntentScope, message_hash, order_hash, payload_digest};
use crate::scheme::{SignatureScheme, SignatureTag, split_tag};
use crate::types::{Order, RAW_SIGNATURE_LEN, SigPK, SignedOrder};

/// Sign a message with the capability's own key scheme
///
/// Fails with [`SignerError::UnsupportedKeyScheme`] for anything other than
/// secp256k1 or Ed25519.
pub async fn sign<C>(message: &[u8], capability: &C) -> Result<SigPK, SignerError>
where
	C: SigningCapability + ?Sized,
{
	let (raw, tag) = match capability.key_scheme() {
		SignatureScheme::Secp256k1 => (capability.sign(message).await?, SignatureTag::Ecdsa),
		SignatureScheme::Ed25519 => {
			let digest = message_hash(message);
			(capability.sign(&digest).await?, SignatureTag::Ed25519)
		}
		other => return Err(SignerError::UnsupportedKeyScheme(other)),
	};
	check_signature_len(&raw)?;

	Ok(SigPK::new(&raw, tag, &capability.public_key()))
}

/// Sign an order's canonical encoding
pub async fn sign_order<C>(order: &Order, capability: &C) -> Result<SigPK, SignerError>
where
	C: SigningCapability + ?Sized,
{
	let message = serialized_order_hex(order)?;
	let sig_pk = sign(message.as_bytes(), capability).await?;
	debug!(
		maker = %order.maker,
		market = %order.market,
		scheme = %capability.key_scheme(),
		"Signed order"
	);
	Ok(sig_pk)
}

/// Sign an order and attach the signature
pub async fn sign_and_attach<C>(order: Order, capability: &C) -> Result<SignedOrder, SignerError>
where
	C: SigningCapability + ?Sized,
{
	let sig_pk = sign_order(&order, capability).await?;
	SignedOrder::from_sig_pk(order, &sig_pk)
}

/// Sign the JSON encoding of a generic payload (onboarding, off-orderbook
/// authorizations)
pub async fn sign_payload<T, C>(payload: &T, capability: &C) -> Result<SigPK, SignerError>
where
	T: Serialize + ?Sized,
	C: SigningCapability + ?Sized,
{
	let message = payload_message(payload)?;
	sign(&message, capability).await
}

/// JSON bytes signed by [`sign_payload`]; hash them with
/// [`message_hash`] to get the verification content.
pub fn payload_message<T: Serialize + ?Sized>(payload: &T) -> Result<Vec<u8>, SignerError> {
	serde_json::to_vec(payload).map_err(|e| SignerError::Serialization(e.to_string()))
}

/// Have a wallet sign a digest under the intent-framed convention (tag `2`)
pub async fn sign_with_wallet<C>(digest: &[u8], wallet: &C) -> Result<SigPK, SignerError>
where
	C: SigningCapability + ?Sized,
{
	let raw = wallet.sign_message(digest).await?;
	check_signature_len(&raw)?;
	Ok(SigPK::new(&raw, SignatureTag::Wallet, &wallet.public_key()))
}

pub async fn sign_order_with_wallet<C>(order: &Order, wallet: &C) -> Result<SigPK, SignerError>
where
	C: SigningCapability + ?Sized,
{
	sign_with_wallet(&order_hash(order)?, wallet).await
}

/// Verify a tagged signature over `content` (a SHA-256 digest)
///
/// Malformed signatures, unknown tags and undecodable public keys verify as
/// `false`. Only an empty signature string is an error.
pub fn verify(signature: &str, content: &[u8], public_key: &[u8]) -> Result<bool, SignerError> {
	if signature.is_empty() {
		return Err(SignerError::SignatureFormat("Empty signature".to_string()));
	}

	let (body, tag) = match split_tag(signature) {
		Ok(parts) => parts,
		Err(e) => {
			warn!("Rejecting signature: {}", e);
			return Ok(false);
		}
	};

	let raw = match hex::decode(body) {
		Ok(raw) if raw.len() == RAW_SIGNATURE_LEN => raw,
		Ok(raw) => {
			debug!("Rejecting signature: {} bytes", raw.len());
			return Ok(false);
		}
		Err(e) => {
			debug!("Rejecting signature: invalid hex: {}", e);
			return Ok(false);
		}
	};

	let valid = match tag {
		SignatureTag::Ecdsa => verify_recoverable(&raw, content, public_key),
		SignatureTag::Ed25519 => verify_ed25519(&raw, content, public_key),
		SignatureTag::Wallet => verify_wallet(&raw, content, public_key)?,
	};

	if !valid {
		debug!(tag = %tag.as_char(), "Signature verification failed");
	}
	Ok(valid)
}

/// Verify a signature against an order's hash
pub fn verify_order(signature: &str, order: &Order, public_key: &[u8]) -> Result<bool, SignerError> {
	let hash = order_hash(order)?;
	verify(signature, &hash, public_key)
}

/// Verify the typed signature embedded in a signed order
pub fn verify_signed_order(signed: &SignedOrder) -> Result<bool, SignerError> {
	let typed = match signed.typed() {
		Ok(typed) => typed,
		Err(e) => {
			debug!("Rejecting typed signature: {}", e);
			return Ok(false);
		}
	};
	verify_order(&typed.tagged_signature(), &signed.order, &typed.public_key)
}

/// Verify a [`SigPK`] over a digest
pub fn verify_sig_pk(sig_pk: &SigPK, content: &[u8]) -> Result<bool, SignerError> {
	let public_key = sig_pk.public_key_bytes()?;
	verify(&sig_pk.signature, content, &public_key)
}

/// secp256k1 without a transmitted recovery id
///
/// Both recovery candidates are always evaluated; the signature is valid if
/// either recovered key equals the claimed key in compressed form.
fn verify_recoverable(raw: &[u8], digest: &[u8], public_key: &[u8]) -> bool {
	let Ok(claimed) = EcdsaVerifyingKey::from_sec1_bytes(public_key) else {
		return false;
	};
	let claimed = claimed.to_encoded_point(true);

	let Ok(signature) = EcdsaSignature::from_slice(raw) else {
		return false;
	};
	// Recovery only accepts low-S; normalizing flips the recovery id, which
	// the two-candidate search covers anyway.
	let signature = signature.normalize_s().unwrap_or(signature);

	let mut matched = false;
	for recovery_byte in [0u8, 1u8] {
		let Some(recovery_id) = RecoveryId::from_byte(recovery_byte) else {
			continue;
		};
		if let Ok(recovered) =
			EcdsaVerifyingKey::recover_from_prehash(digest, &signature, recovery_id)
		{
			matched |= recovered.to_encoded_point(true) == claimed;
		}
	}
	matched
}

fn verify_ed25519(raw: &[u8], content: &[u8], public_key: &[u8]) -> bool {
	let Ok(key_bytes) = <[u8; 32]>::try_from(public_key) else {
		return false;
	};
	let Ok(verifying_key) = Ed25519VerifyingKey::from_bytes(&key_bytes) else {
		return false;
	};
	let Ok(sig_bytes) = <[u8; 64]>::try_from(raw) else {
		return false;
	};
	let signature = Ed25519Signature::from_bytes(&sig_bytes);
	verifying_key.verify(content, &signature).is_ok()
}

/// Plain (non-recoverable) secp256k1 ECDSA; hashes `message` with SHA-256
fn verify_ecdsa(raw: &[u8], message: &[u8], public_key: &[u8]) -> bool {
	let Ok(verifying_key) = EcdsaVerifyingKey::from_sec1_bytes(public_key) else {
		return false;
	};
	let Ok(signature) = EcdsaSignature::from_slice(raw) else {
		return false;
	};
	let signature = signature.normalize_s().unwrap_or(signature);
	verifying_key.verify(message, &signature).is_ok()
}

/// Wallet signatures are over the intent-framed digest of the content
fn verify_wallet(raw: &[u8], content: &[u8], public_key: &[u8]) -> Result<bool, SignerError> {
	let framed: [u8; DIGEST_LEN] = payload_digest(content, IntentScope::PersonalMessage)?;
	Ok(match SignatureScheme::from_public_key(public_key) {
		Some(SignatureScheme::Ed25519) => verify_ed25519(raw, &framed, public_key),
		Some(SignatureScheme::Secp256k1) => verify_ecdsa(raw, &framed, public_key),
		_ => false,
	})
}

fn check_signature_len(raw: &[u8]) -> Result<(), SignerError> {
	if raw.len() != RAW_SIGNATURE_LEN {
		return Err(SignerError::SignatureFormat(format!(
			"Capability returned {} signature bytes, expected {}",
			raw.len(),
			RAW_SIGNATURE_LEN
		)));
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::capability::{Ed25519Keypair, Secp256k1Keypair};
	use crate::error::CapabilityError;
	use crate::types::AccountId;
	use async_trait::async_trait;

	fn test_order() -> Order {
		Order::builder(AccountId([0xaa; 32]), AccountId([0xbb; 32]))
			.is_buy(true)
			.expiration(1_700_000_000_000)
			.salt(42u32)
			.build()
	}

	struct ZkOnlyCapability;

	#[async_trait]
	impl SigningCapability for ZkOnlyCapability {
		fn public_key(&self) -> Vec<u8> {
			vec![0u8; 32]
		}

		fn key_scheme(&self) -> SignatureScheme {
			SignatureScheme::ZkLogin
		}

		async fn sign(&self, _message: &[u8]) -> Result<Vec<u8>, CapabilityError> {
			Ok(vec![0u8; 64])
		}
	}

	struct ShortSignatureCapability;

	#[async_trait]
	impl SigningCapability for ShortSignatureCapability {
		fn public_key(&self) -> Vec<u8> {
			vec![0u8; 32]
		}

		fn key_scheme(&self) -> SignatureScheme {
			SignatureScheme::Ed25519
		}

		async fn sign(&self, _message: &[u8]) -> Result<Vec<u8>, CapabilityError> {
			Ok(vec![0u8; 10])
		}
	}

	#[tokio::test]
	async fn test_secp256k1_tag_and_round_trip() {
		let keypair = Secp256k1Keypair::generate();
		let order = test_order();

		let sig_pk = sign_order(&order, &keypair).await.unwrap();
		assert!(sig_pk.signature.ends_with('0'));
		assert_eq!(sig_pk.signature.len(), 129);
		assert_eq!(sig_pk.public_key_bytes().unwrap(), keypair.public_key());

		assert!(verify_order(&sig_pk.signature, &order, &keypair.public_key()).unwrap());
	}

	#[tokio::test]
	async fn test_ed25519_signs_order_hash() {
		let keypair = Ed25519Keypair::from_secret_bytes(&[1u8; 32]);
		let order = test_order();

		let sig_pk = sign_order(&order, &keypair).await.unwrap();
		assert!(sig_pk.signature.ends_with('1'));

		let expected = keypair.sign(&order_hash(&order).unwrap()).await.unwrap();
		assert_eq!(sig_pk.signature, format!("{}1", hex::encode(expected)));
		assert!(verify_order(&sig_pk.signature, &order, &keypair.public_key()).unwrap());
	}

	#[tokio::test]
	async fn test_unsupported_key_scheme() {
		let result = sign_order(&test_order(), &ZkOnlyCapability).await;
		assert!(matches!(
			result,
			Err(SignerError::UnsupportedKeyScheme(SignatureScheme::ZkLogin))
		));
	}

	#[tokio::test]
	async fn test_short_capability_signature_is_rejected() {
		let result = sign_order(&test_order(), &ShortSignatureCapability).await;
		assert!(matches!(result, Err(SignerError::SignatureFormat(_))));
	}

	#[tokio::test]
	async fn test_capability_without_message_signing() {
		let result = sign_with_wallet(&[0u8; 32], &ZkOnlyCapability).await;
		assert!(matches!(
			result,
			Err(SignerError::Capability(CapabilityError::Unsupported(_)))
		));
	}

	#[tokio::test]
	async fn test_wallet_signatures_verify_for_both_schemes() {
		let order = test_order();

		let ed = Ed25519Keypair::generate();
		let sig_pk = sign_order_with_wallet(&order, &ed).await.unwrap();
		assert!(sig_pk.signature.ends_with('2'));
		assert!(verify_order(&sig_pk.signature, &order, &ed.public_key()).unwrap());

		let secp = Secp256k1Keypair::generate();
		let sig_pk = sign_order_with_wallet(&order, &secp).await.unwrap();
		assert!(verify_order(&sig_pk.signature, &order, &secp.public_key()).unwrap());
	}

	#[tokio::test]
	async fn test_wallet_tag_requires_framing() {
		// A direct Ed25519 signature re-tagged as a wallet signature must fail
		let keypair = Ed25519Keypair::generate();
		let order = test_order();
		let sig_pk = sign_order(&order, &keypair).await.unwrap();
		let retagged = format!("{}2", &sig_pk.signature[..sig_pk.signature.len() - 1]);
		assert!(!verify_order(&retagged, &order, &keypair.public_key()).unwrap());
	}

	#[tokio::test]
	async fn test_unknown_tag_verifies_false() {
		let keypair = Ed25519Keypair::generate();
		let order = test_order();
		let sig_pk = sign_order(&order, &keypair).await.unwrap();
		let retagged = format!("{}9", &sig_pk.signature[..sig_pk.signature.len() - 1]);
		assert!(!verify_order(&retagged, &order, &keypair.public_key()).unwrap());
	}

	#[test]
	fn test_malformed_signatures_verify_false() {
		let digest = [0u8; 32];
		assert!(!verify("zz0", &digest, &[2u8; 33]).unwrap());
		assert!(!verify("abcd1", &digest, &[2u8; 32]).unwrap());
		assert!(!verify(&format!("{}0", "11".repeat(64)), &digest, &[9u8; 4]).unwrap());
		assert!(verify("", &digest, &[2u8; 32]).is_err());
	}

	#[tokio::test]
	async fn test_payload_signing() {
		#[derive(Serialize)]
		struct Onboarding<'a> {
			#[serde(rename = "onboardingUrl")]
			onboarding_url: &'a str,
		}

		let payload = Onboarding {
			onboarding_url: "https://trade.example.com",
		};
		let keypair = Secp256k1Keypair::generate();
		let sig_pk = sign_payload(&payload, &keypair).await.unwrap();

		let digest = message_hash(&payload_message(&payload).unwrap());
		assert!(verify_sig_pk(&sig_pk, &digest).unwrap());
		assert!(!verify_sig_pk(&sig_pk, &message_hash(b"other")).unwrap());
	}

	#[tokio::test]
	async fn test_signed_order_verification() {
		let keypair = Secp256k1Keypair::generate();
		let signed = sign_and_attach(test_order(), &keypair).await.unwrap();
		assert!(verify_signed_order(&signed).unwrap());

		let mut tampered = signed.clone();
		tampered.order.leverage += 1u32;
		assert!(!verify_signed_order(&tampered).unwrap());

		let mut truncated = signed;
		truncated.typed_signature.truncate(10);
		assert!(!verify_signed_order(&truncated).unwrap());
	}
}
