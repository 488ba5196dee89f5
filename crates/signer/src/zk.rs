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

//! zkLogin-style composite signatures
//!
//! A zk-wrapped signature carries a zero-knowledge proof of OpenID claims
//! next to an ephemeral key's own signature. This module only assembles and
//! disassembles that structure; the proof itself is produced by an external
//! prover and checked by the on-chain verifier.
//!
//! Wire format: `base64(0x05 || bcs(ZkLoginSignature))`, where the embedded
//! user signature is a serialized signature `flag || sig || pk`.

use ark_bn254::Fr;
use ark_ff::PrimeField;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use light_poseidon::{Poseidon, PoseidonHasher};
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::capability::SigningCapability;
use crate::error::SignerError;
use crate::scheme::{SignatureScheme, SignatureTag};
use crate::signing::verify;
use crate::types::{RAW_SIGNATURE_LEN, SigPK};

/// Claim whose value the address seed commits to
pub const SUBJECT_CLAIM: &str = "sub";

const MAX_KEY_CLAIM_NAME_LEN: usize = 32;
const MAX_KEY_CLAIM_VALUE_LEN: usize = 115;
const MAX_AUD_VALUE_LEN: usize = 145;

/// Bytes packed into one field element
const PACK_WIDTH: usize = 31;

/// Largest arity supported by the circom Poseidon parameters
const MAX_POSEIDON_INPUTS: usize = 12;

/// Groth16 proof points as decimal strings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofPoints {
	pub a: Vec<String>,
	pub b: Vec<Vec<String>>,
	pub c: Vec<String>,
}

/// Location of the `iss` claim inside the base64 JWT payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssBase64Details {
	pub value: String,
	pub index_mod_4: u8,
}

/// Proof bundle returned by the external prover
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZkProof {
	pub proof_points: ProofPoints,
	pub iss_base64_details: IssBase64Details,
	pub header_base64: String,
}

/// Claims decoded from the identity provider's JWT
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedJwt {
	pub sub: String,
	pub aud: String,
	#[serde(default)]
	pub iss: String,
}

/// Everything needed to wrap a user signature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZkPayload {
	/// User salt as a decimal integer
	pub salt: String,
	pub decoded_jwt: DecodedJwt,
	pub proof: ZkProof,
	/// Last epoch in which the ephemeral key is valid
	pub max_epoch: u64,
}

/// Field order matters: this is BCS-encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZkLoginInputs {
	pub proof_points: ProofPoints,
	pub iss_base64_details: IssBase64Details,
	pub header_base64: String,
	pub address_seed: String,
}

/// Field order matters: this is BCS-encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZkLoginSignature {
	pub inputs: ZkLoginInputs,
	pub max_epoch: u64,
	pub user_signature: Vec<u8>,
}

/// `flag || signature || public key`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializedSignature {
	pub scheme: SignatureScheme,
	pub signature: Vec<u8>,
	pub public_key: Vec<u8>,
}

impl SerializedSignature {
	pub fn new(
		scheme: SignatureScheme,
		signature: Vec<u8>,
		public_key: Vec<u8>,
	) -> Result<Self, SignerError> {
		let Some(pk_len) = scheme.public_key_len() else {
			return Err(SignerError::UnsupportedKeyScheme(scheme));
		};
		if signature.len() != RAW_SIGNATURE_LEN || public_key.len() != pk_len {
			return Err(SignerError::SignatureFormat(format!(
				"{} signature expects {} + {} bytes, got {} + {}",
				scheme,
				RAW_SIGNATURE_LEN,
				pk_len,
				signature.len(),
				public_key.len()
			)));
		}
		Ok(Self {
			scheme,
			signature,
			public_key,
		})
	}

	pub fn to_bytes(&self) -> Vec<u8> {
		let mut out = Vec::with_capacity(1 + self.signature.len() + self.public_key.len());
		out.push(self.scheme.flag());
		out.extend_from_slice(&self.signature);
		out.extend_from_slice(&self.public_key);
		out
	}

	pub fn parse(bytes: &[u8]) -> Result<Self, SignerError> {
		let (&flag, rest) = bytes
			.split_first()
			.ok_or_else(|| SignerError::ZkPayloadMalformed("Empty signature".to_string()))?;
		let scheme = SignatureScheme::from_flag(flag).ok_or_else(|| {
			SignerError::ZkPayloadMalformed(format!("Unknown signature flag: {:#04x}", flag))
		})?;
		let pk_len = scheme.public_key_len().ok_or_else(|| {
			SignerError::ZkPayloadMalformed(format!("Nested {} signature", scheme))
		})?;
		if rest.len() != RAW_SIGNATURE_LEN + pk_len {
			return Err(SignerError::ZkPayloadMalformed(format!(
				"{} signature has {} bytes after the flag, expected {}",
				scheme,
				rest.len(),
				RAW_SIGNATURE_LEN + pk_len
			)));
		}
		let (signature, public_key) = rest.split_at(RAW_SIGNATURE_LEN);
		Ok(Self {
			scheme,
			signature: signature.to_vec(),
			public_key: public_key.to_vec(),
		})
	}
}

/// Result of [`unwrap`]: the user signature re-tagged for verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnwrappedSignature {
	/// `hex(signature) || "2"`
	pub signature: String,
	pub scheme: SignatureScheme,
	pub public_key: Vec<u8>,
}

/// Derive the address seed committed to by the proof
///
/// `Poseidon([H(name), H(value), H(aud), Poseidon([salt])])` where `H` packs
/// the zero-padded ASCII string into 31-byte field elements and hashes them.
/// Returns the seed as a decimal string.
pub fn address_seed(salt: &str, name: &str, value: &str, aud: &str) -> Result<String, SignerError> {
	let salt = BigUint::parse_bytes(salt.trim().as_bytes(), 10)
		.ok_or_else(|| SignerError::ZkPayloadMalformed(format!("Invalid salt: {}", salt)))?;

	let inputs = [
		hash_ascii_str_to_field(name, MAX_KEY_CLAIM_NAME_LEN)?,
		hash_ascii_str_to_field(value, MAX_KEY_CLAIM_VALUE_LEN)?,
		hash_ascii_str_to_field(aud, MAX_AUD_VALUE_LEN)?,
		poseidon_hash(&[Fr::from(salt)])?,
	];
	let seed = poseidon_hash(&inputs)?;
	Ok(BigUint::from(seed).to_str_radix(10))
}

fn hash_ascii_str_to_field(value: &str, max_len: usize) -> Result<Fr, SignerError> {
	if !value.is_ascii() || value.len() > max_len {
		return Err(SignerError::ZkPayloadMalformed(format!(
			"Claim {:?} must be ASCII and at most {} bytes",
			value, max_len
		)));
	}
	let mut padded = value.as_bytes().to_vec();
	padded.resize(max_len, 0);

	// The buffer is one big-endian number cut from the low end, so any short
	// chunk leads.
	let packed: Vec<Fr> = padded
		.rchunks(PACK_WIDTH)
		.rev()
		.map(Fr::from_be_bytes_mod_order)
		.collect();
	poseidon_hash(&packed)
}

fn poseidon_hash(inputs: &[Fr]) -> Result<Fr, SignerError> {
	if inputs.is_empty() || inputs.len() > MAX_POSEIDON_INPUTS {
		return Err(SignerError::ZkPayloadMalformed(format!(
			"Poseidon arity {} out of range",
			inputs.len()
		)));
	}
	let mut hasher = Poseidon::<Fr>::new_circom(inputs.len())
		.map_err(|e| SignerError::ZkPayloadMalformed(format!("Poseidon setup failed: {}", e)))?;
	hasher
		.hash(inputs)
		.map_err(|e| SignerError::ZkPayloadMalformed(format!("Poseidon hash failed: {}", e)))
}

/// Wrap a serialized user signature into a composite zk signature
pub fn wrap(user_signature: &[u8], payload: &ZkPayload) -> Result<String, SignerError> {
	// Refuse to wrap something the verifier could never parse back
	SerializedSignature::parse(user_signature)?;

	let seed = address_seed(
		&payload.salt,
		SUBJECT_CLAIM,
		&payload.decoded_jwt.sub,
		&payload.decoded_jwt.aud,
	)?;
	let composite = ZkLoginSignature {
		inputs: ZkLoginInputs {
			proof_points: payload.proof.proof_points.clone(),
			iss_base64_details: payload.proof.iss_base64_details.clone(),
			header_base64: payload.proof.header_base64.clone(),
			address_seed: seed,
		},
		max_epoch: payload.max_epoch,
		user_signature: user_signature.to_vec(),
	};

	let encoded = bcs::to_bytes(&composite)
		.map_err(|e| SignerError::Serialization(format!("BCS encoding failed: {}", e)))?;
	let mut bytes = Vec::with_capacity(1 + encoded.len());
	bytes.push(SignatureScheme::ZkLogin.flag());
	bytes.extend_from_slice(&encoded);
	Ok(STANDARD.encode(bytes))
}

/// Decode a composite zk signature
///
/// A plain serialized signature passes through. Either way the user
/// signature comes back tagged `2`, since the ephemeral key signed the
/// intent-framed message.
pub fn unwrap(composite: &str) -> Result<UnwrappedSignature, SignerError> {
	let result = decode_composite(composite);
	if let Err(e) = &result {
		warn!("Failed to parse zk signature: {}", e);
	}
	let user = result?;

	Ok(UnwrappedSignature {
		signature: format!(
			"{}{}",
			hex::encode(&user.signature),
			SignatureTag::Wallet.as_char()
		),
		scheme: user.scheme,
		public_key: user.public_key,
	})
}

/// Parse the BCS body of a composite signature
pub fn decode_zk_signature(composite: &str) -> Result<ZkLoginSignature, SignerError> {
	let bytes = decode_base64(composite)?;
	match bytes.split_first() {
		Some((&flag, body)) if flag == SignatureScheme::ZkLogin.flag() => parse_zk_body(body),
		_ => Err(SignerError::ZkPayloadMalformed(
			"Not a zkLogin signature".to_string(),
		)),
	}
}

fn decode_composite(composite: &str) -> Result<SerializedSignature, SignerError> {
	let bytes = decode_base64(composite)?;
	match bytes.split_first() {
		Some((&flag, body)) if flag == SignatureScheme::ZkLogin.flag() => {
			let zk = parse_zk_body(body)?;
			debug!(max_epoch = zk.max_epoch, "Unwrapping zk signature");
			SerializedSignature::parse(&zk.user_signature)
		}
		_ => SerializedSignature::parse(&bytes),
	}
}

fn parse_zk_body(body: &[u8]) -> Result<ZkLoginSignature, SignerError> {
	bcs::from_bytes(body)
		.map_err(|e| SignerError::ZkPayloadMalformed(format!("Invalid BCS body: {}", e)))
}

fn decode_base64(input: &str) -> Result<Vec<u8>, SignerError> {
	STANDARD
		.decode(input.trim())
		.map_err(|e| SignerError::ZkPayloadMalformed(format!("Invalid base64: {}", e)))
}

/// Sign a digest with an ephemeral wallet key and wrap it with the proof
///
/// The returned `SigPK` carries the composite in `signature` and the
/// ephemeral public key in `public_key`. Every failure is returned to the
/// caller.
pub async fn sign_with_zk<C>(
	digest: &[u8],
	wallet: &C,
	payload: &ZkPayload,
) -> Result<SigPK, SignerError>
where
	C: SigningCapability + ?Sized,
{
	let raw = wallet.sign_message(digest).await?;
	let public_key = wallet.public_key();
	let user = SerializedSignature::new(wallet.key_scheme(), raw, public_key.clone())?;
	let composite = wrap(&user.to_bytes(), payload)?;

	Ok(SigPK {
		signature: composite,
		public_key: STANDARD.encode(public_key),
	})
}

/// Check the ephemeral signature inside a composite against `digest`
///
/// The proof is not checked here; that happens on chain.
pub fn verify_zk(composite: &str, digest: &[u8]) -> Result<bool, SignerError> {
	let unwrapped = unwrap(composite)?;
	verify(&unwrapped.signature, digest, &unwrapped.public_key)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::capability::{Ed25519Keypair, Secp256k1Keypair};

	fn test_payload() -> ZkPayload {
		ZkPayload {
			salt: "129390038577185583942388216820280642146".to_string(),
			decoded_jwt: DecodedJwt {
				sub: "106294049240999307923".to_string(),
				aud: "25769832374-famecqrhe2gkebt5fvqms2263046lj96.apps.googleusercontent.com"
					.to_string(),
				iss: "https://accounts.google.com".to_string(),
			},
			proof: ZkProof {
				proof_points: ProofPoints {
					a: vec!["1".to_string(), "2".to_string(), "1".to_string()],
					b: vec![
						vec!["3".to_string(), "4".to_string()],
						vec!["5".to_string(), "6".to_string()],
						vec!["1".to_string(), "0".to_string()],
					],
					c: vec!["7".to_string(), "8".to_string(), "1".to_string()],
				},
				iss_base64_details: IssBase64Details {
					value: "yJpc3MiOiJodHRwczovL2lkLnR3aXRjaC50di9vYXV0aDIiLC".to_string(),
					index_mod_4: 2,
				},
				header_base64: "eyJhbGciOiJSUzI1NiJ9".to_string(),
			},
			max_epoch: 10,
		}
	}

	#[test]
	fn test_address_seed_is_deterministic_decimal() {
		let payload = test_payload();
		let first = address_seed(
			&payload.salt,
			SUBJECT_CLAIM,
			&payload.decoded_jwt.sub,
			&payload.decoded_jwt.aud,
		)
		.unwrap();
		let second = address_seed(
			&payload.salt,
			SUBJECT_CLAIM,
			&payload.decoded_jwt.sub,
			&payload.decoded_jwt.aud,
		)
		.unwrap();

		assert_eq!(first, second);
		assert!(first.chars().all(|c| c.is_ascii_digit()));

		let other_salt =
			address_seed("1", SUBJECT_CLAIM, &payload.decoded_jwt.sub, &payload.decoded_jwt.aud)
				.unwrap();
		assert_ne!(first, other_salt);
	}

	#[test]
	fn test_address_seed_known_vectors() {
		let seed = address_seed(
			"248191903847969014646285995941615069143",
			"sub",
			"904448692",
			"rs1bh065i9ya4ydvifixl4kss0uhpt",
		)
		.unwrap();
		assert_eq!(
			seed,
			"16657007263003735230240998439420301694514420923267872433517882233836276100450"
		);

		let payload = test_payload();
		let seed = address_seed(
			&payload.salt,
			SUBJECT_CLAIM,
			&payload.decoded_jwt.sub,
			&payload.decoded_jwt.aud,
		)
		.unwrap();
		assert_eq!(
			seed,
			"6108066888816152909779260797647401844352456009615316883911918765612489541289"
		);
	}

	#[test]
	fn test_ascii_hash_puts_short_chunk_first() {
		// 32 bytes split as 1 + 31: the leading byte stands alone
		let mut padded = b"sub".to_vec();
		padded.resize(MAX_KEY_CLAIM_NAME_LEN, 0);
		let expected = poseidon_hash(&[
			Fr::from_be_bytes_mod_order(&padded[..1]),
			Fr::from_be_bytes_mod_order(&padded[1..]),
		])
		.unwrap();
		assert_eq!(
			hash_ascii_str_to_field("sub", MAX_KEY_CLAIM_NAME_LEN).unwrap(),
			expected
		);
	}

	#[test]
	fn test_address_seed_rejects_bad_inputs() {
		assert!(address_seed("not-a-number", "sub", "x", "y").is_err());
		assert!(address_seed("1", "sub", &"v".repeat(116), "y").is_err());
		assert!(address_seed("1", "sub", "x", &"a".repeat(146)).is_err());
		assert!(address_seed("1", &"n".repeat(33), "x", "y").is_err());
	}

	#[test]
	fn test_serialized_signature_parse() {
		let bytes = SerializedSignature::new(SignatureScheme::Ed25519, vec![1; 64], vec![2; 32])
			.unwrap()
			.to_bytes();
		assert_eq!(bytes.len(), 97);
		assert_eq!(bytes[0], 0x00);

		let parsed = SerializedSignature::parse(&bytes).unwrap();
		assert_eq!(parsed.scheme, SignatureScheme::Ed25519);
		assert_eq!(parsed.public_key, vec![2; 32]);

		assert!(SerializedSignature::parse(&bytes[..96]).is_err());
		assert!(SerializedSignature::parse(&[0x09; 97]).is_err());
		assert!(SerializedSignature::parse(&[]).is_err());
		assert!(
			SerializedSignature::new(SignatureScheme::ZkLogin, vec![1; 64], vec![2; 32]).is_err()
		);
	}

	#[test]
	fn test_wrap_unwrap() {
		let user = SerializedSignature::new(SignatureScheme::Secp256k1, vec![7; 64], vec![3; 33])
			.unwrap();
		let composite = wrap(&user.to_bytes(), &test_payload()).unwrap();

		let decoded = decode_zk_signature(&composite).unwrap();
		assert_eq!(decoded.max_epoch, 10);
		assert_eq!(decoded.user_signature, user.to_bytes());
		assert_eq!(decoded.inputs.header_base64, "eyJhbGciOiJSUzI1NiJ9");

		let unwrapped = unwrap(&composite).unwrap();
		assert_eq!(unwrapped.scheme, SignatureScheme::Secp256k1);
		assert_eq!(unwrapped.public_key, vec![3; 33]);
		assert_eq!(unwrapped.signature, format!("{}2", "07".repeat(64)));
	}

	#[test]
	fn test_unwrap_plain_signature_passes_through() {
		let user = SerializedSignature::new(SignatureScheme::Ed25519, vec![5; 64], vec![6; 32])
			.unwrap();
		let unwrapped = unwrap(&STANDARD.encode(user.to_bytes())).unwrap();
		assert_eq!(unwrapped.scheme, SignatureScheme::Ed25519);
		assert_eq!(unwrapped.signature, format!("{}2", "05".repeat(64)));
	}

	#[test]
	fn test_unwrap_malformed_input_fails() {
		assert!(matches!(
			unwrap("!!!not base64"),
			Err(SignerError::ZkPayloadMalformed(_))
		));
		assert!(matches!(unwrap(""), Err(SignerError::ZkPayloadMalformed(_))));
		assert!(matches!(
			unwrap(&STANDARD.encode([0x05, 0x01, 0x02])),
			Err(SignerError::ZkPayloadMalformed(_))
		));
	}

	#[test]
	fn test_wrap_rejects_malformed_user_signature() {
		assert!(wrap(&[0x00, 0x01], &test_payload()).is_err());
	}

	#[tokio::test]
	async fn test_sign_with_zk_verifies() {
		let digest = [0x5a; 32];
		for wallet in [
			Box::new(Ed25519Keypair::generate()) as Box<dyn SigningCapability>,
			Box::new(Secp256k1Keypair::generate()),
		] {
			let sig_pk = sign_with_zk(&digest, wallet.as_ref(), &test_payload())
				.await
				.unwrap();
			assert_eq!(sig_pk.public_key_bytes().unwrap(), wallet.public_key());
			assert!(verify_zk(&sig_pk.signature, &digest).unwrap());
			assert!(!verify_zk(&sig_pk.signature, &[0x5b; 32]).unwrap());
		}
	}
}
