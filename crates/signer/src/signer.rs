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

use serde::Serialize;
use tracing::info;

use crate::address::account_id_from_public_key;
use crate::capability::SigningCapability;
use crate::config::SignerConfig;
use crate::error::SignerError;
use crate::hash::order_hash;
use crate::signing;
use crate::types::{AccountId, Order, SigPK, SignedOrder};
use crate::zk::{self, ZkPayload};

/// Signs orders and payloads with one capability
///
/// Holds no state beyond its configuration; every call is independent and
/// the signer can be shared across tasks.
pub struct OrderSigner<C> {
	config: SignerConfig,
	capability: C,
}

impl<C: SigningCapability> OrderSigner<C> {
	/// Bind a capability to a configuration
	///
	/// Fails if the capability's key scheme differs from the configured one.
	pub fn new(config: SignerConfig, capability: C) -> Result<Self, SignerError> {
		let actual = capability.key_scheme();
		if actual != config.key_scheme {
			return Err(SignerError::SchemeMismatch {
				configured: config.key_scheme,
				actual,
			});
		}
		info!(
			scheme = %actual,
			wallet_mode = config.wallet_mode,
			"Order signer ready"
		);
		Ok(Self { config, capability })
	}

	pub fn config(&self) -> &SignerConfig {
		&self.config
	}

	pub fn capability(&self) -> &C {
		&self.capability
	}

	/// Account id of the bound key
	pub fn account_id(&self) -> Result<AccountId, SignerError> {
		account_id_from_public_key(self.capability.key_scheme(), &self.capability.public_key())
	}

	/// Sign an order, through the wallet path when `wallet_mode` is set
	pub async fn sign_order(&self, order: &Order) -> Result<SigPK, SignerError> {
		if self.config.wallet_mode {
			signing::sign_order_with_wallet(order, &self.capability).await
		} else {
			signing::sign_order(order, &self.capability).await
		}
	}

	pub async fn sign_and_attach(&self, order: Order) -> Result<SignedOrder, SignerError> {
		let sig_pk = self.sign_order(&order).await?;
		SignedOrder::from_sig_pk(order, &sig_pk)
	}

	pub async fn sign_payload<T: Serialize + ?Sized>(
		&self,
		payload: &T,
	) -> Result<SigPK, SignerError> {
		signing::sign_payload(payload, &self.capability).await
	}

	/// Sign an order with the bound ephemeral key and wrap it with a zk proof
	pub async fn sign_order_zk(
		&self,
		order: &Order,
		payload: &ZkPayload,
	) -> Result<SigPK, SignerError> {
		zk::sign_with_zk(&order_hash(order)?, &self.capability, payload).await
	}
}
