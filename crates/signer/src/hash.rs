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

//! Digests fed to the signers
//!
//! - `order_hash`: SHA-256 over the hex *text* of the serialized order.
//!   Hashing the raw 144 bytes instead produces a different digest and
//!   breaks compatibility with the on-chain verifier.
//! - `payload_digest`: BLAKE2b-256 over `intent || bcs(payload)`, the
//!   framing wallets apply to every personal message.

use blake2::{Blake2b, digest::consts::U32};
use sha2::{Digest, Sha256};

use crate::codec::serialized_order_hex;
use crate::error::SignerError;
use crate::types::Order;

type Blake2b256 = Blake2b<U32>;

/// Length of every digest produced here
pub const DIGEST_LEN: usize = 32;

/// Intent version byte
const INTENT_VERSION: u8 = 0;
/// Intent application id byte
const INTENT_APP_ID: u8 = 0;

/// Scope byte of an intent header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum IntentScope {
	TransactionData = 0,
	TransactionEffects = 1,
	CheckpointSummary = 2,
	PersonalMessage = 3,
}

impl IntentScope {
	/// 3-byte header `[scope, version, app_id]`
	pub fn header(self) -> [u8; 3] {
		[self as u8, INTENT_VERSION, INTENT_APP_ID]
	}
}

/// SHA-256 over the hex text of the canonical order buffer
pub fn order_hash(order: &Order) -> Result<[u8; DIGEST_LEN], SignerError> {
	let text = serialized_order_hex(order)?;
	Ok(message_hash(text.as_bytes()))
}

/// Plain SHA-256 over arbitrary bytes
pub fn message_hash(message: &[u8]) -> [u8; DIGEST_LEN] {
	Sha256::digest(message).into()
}

/// Intent-framed message: header followed by the BCS `vector<u8>` encoding
pub fn intent_message(payload: &[u8], scope: IntentScope) -> Result<Vec<u8>, SignerError> {
	let encoded = bcs::to_bytes(payload)
		.map_err(|e| SignerError::Serialization(format!("BCS encoding failed: {}", e)))?;
	let mut message = Vec::with_capacity(3 + encoded.len());
	message.extend_from_slice(&scope.header());
	message.extend_from_slice(&encoded);
	Ok(message)
}

/// BLAKE2b-256 digest of the intent-framed payload
pub fn payload_digest(payload: &[u8], scope: IntentScope) -> Result<[u8; DIGEST_LEN], SignerError> {
	let message = intent_message(payload, scope)?;
	Ok(Blake2b256::digest(&message).into())
}

/// BLAKE2b-256 over raw bytes
pub(crate) fn blake2b256(data: &[u8]) -> [u8; DIGEST_LEN] {
	Blake2b256::digest(data).into()
}
