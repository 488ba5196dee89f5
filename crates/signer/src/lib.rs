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

//! Anvil Signer - order codec and multi-scheme signature engine
//!
//! This crate produces and verifies signatures over trade orders that the
//! on-chain settlement program accepts byte for byte:
//!
//! - `codec`: canonical 144-byte order encoding
//! - `hash`: SHA-256 order hash and intent-framed BLAKE2b digest
//! - `signing`: tagged secp256k1 / Ed25519 / wallet signatures
//! - `zk`: zkLogin-style composite signatures
//! - `address`: account ids and onboarding signature checks
//!
//! Like the SDK, the library is embeddable:
//! - No background threads
//! - No runtime initialization
//! - Configuration and logging are opt-in (`config`, `logging`)

pub mod address;
pub mod capability;
pub mod codec;
pub mod config;
pub mod error;
pub mod hash;
pub mod logging;
pub mod scheme;
pub mod signer;
pub mod signing;
pub mod types;
pub mod zk;

pub use address::{account_id_from_public_key, recover_address, verify_onboarding};
pub use capability::{Ed25519Keypair, Secp256k1Keypair, SigningCapability};
pub use codec::{serialize_order, serialized_order_hex};
pub use config::SignerConfig;
pub use error::{CapabilityError, SignerError};
pub use hash::{IntentScope, order_hash, payload_digest};
pub use scheme::{SignatureScheme, SignatureTag};
pub use signer::OrderSigner;
pub use signing::{sign, sign_order, verify, verify_order, verify_signed_order};
pub use types::*;
