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

//! Error types shared by the codec, signing, zk and address modules

use thiserror::Error;

use crate::scheme::SignatureScheme;

/// Error types for signing and verification operations
#[derive(Debug, Error)]
pub enum SignerError {
	#[error("Unsupported key scheme: {0}")]
	UnsupportedKeyScheme(SignatureScheme),
	#[error("Configured key scheme {configured} does not match capability scheme {actual}")]
	SchemeMismatch {
		configured: SignatureScheme,
		actual: SignatureScheme,
	},
	#[error("Unsupported signature tag: {0:?}")]
	UnsupportedSignatureTag(char),
	#[error("Field {field} does not fit in {width} bytes")]
	SerializationOverflow { field: &'static str, width: usize },
	#[error("Malformed zk payload: {0}")]
	ZkPayloadMalformed(String),
	#[error("Onboarding signature must be 65 bytes, got {0}")]
	OnboardingSignatureMalformed(usize),
	#[error("Invalid account id: {0}")]
	InvalidAccountId(String),
	#[error("Invalid public key: {0}")]
	InvalidPublicKey(String),
	#[error("Signature format error: {0}")]
	SignatureFormat(String),
	#[error("Serialization error: {0}")]
	Serialization(String),
	#[error(transparent)]
	Capability(#[from] CapabilityError),
}

/// Errors raised at the signing capability boundary (wallets, hardware keys)
#[derive(Debug, Error)]
pub enum CapabilityError {
	#[error("Signing request rejected: {0}")]
	Rejected(String),
	#[error("Operation not supported by this capability: {0}")]
	Unsupported(String),
	#[error("Signing failed: {0}")]
	Signing(String),
}
