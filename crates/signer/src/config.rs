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

use std::env;

use serde::{Deserialize, Serialize};

use crate::scheme::SignatureScheme;

// Logging configuration constants
/// Default log level (can be overridden by RUST_LOG environment variable)
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Default log directory component name
pub const LOG_COMPONENT_NAME: &str = "signer";

/// Default console output enabled (can be overridden by LOG_TO_CONSOLE environment variable)
pub const DEFAULT_LOG_TO_CONSOLE: bool = false;

// Signing configuration constants
/// Default key scheme (can be overridden by SIGNER_KEY_SCHEME)
pub const DEFAULT_KEY_SCHEME: SignatureScheme = SignatureScheme::Secp256k1;

/// Default wallet mode (can be overridden by SIGNER_WALLET_MODE)
pub const DEFAULT_WALLET_MODE: bool = false;

/// Default number of epochs an ephemeral zk key stays valid (can be overridden by
/// SIGNER_ZK_MAX_EPOCH_MARGIN)
pub const DEFAULT_ZK_MAX_EPOCH_MARGIN: u64 = 2;

/// Environment variable prefix for [`SignerConfig`]
const ENV_PREFIX: &str = "SIGNER";

/// Order signer configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignerConfig {
	/// Scheme the signing capability is expected to use
	pub key_scheme: SignatureScheme,
	/// Sign through the intent-framed wallet path (tag `2`)
	pub wallet_mode: bool,
	/// Epochs added to the current epoch when building a zk payload
	pub zk_max_epoch_margin: u64,
}

impl Default for SignerConfig {
	fn default() -> Self {
		Self {
			key_scheme: DEFAULT_KEY_SCHEME,
			wallet_mode: DEFAULT_WALLET_MODE,
			zk_max_epoch_margin: DEFAULT_ZK_MAX_EPOCH_MARGIN,
		}
	}
}

impl SignerConfig {
	/// Load configuration from environment variables
	pub fn from_env() -> Result<Self, config::ConfigError> {
		dotenv::dotenv().ok();

		let cfg = config::Config::builder()
			.add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
			.build()?;

		cfg.try_deserialize()
	}

	/// Load configuration from file, with environment variables taking precedence
	pub fn from_file(path: &str) -> Result<Self, config::ConfigError> {
		dotenv::dotenv().ok();

		let cfg = config::Config::builder()
			.add_source(config::File::with_name(path))
			.add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
			.build()?;

		cfg.try_deserialize()
	}

	/// Last epoch an ephemeral key created now may sign in
	pub fn zk_max_epoch(&self, current_epoch: u64) -> u64 {
		current_epoch.saturating_add(self.zk_max_epoch_margin)
	}
}

/// Whether console logging was requested via `LOG_TO_CONSOLE`
pub fn log_to_console() -> bool {
	env::var("LOG_TO_CONSOLE")
		.map(|v| v == "true" || v == "1" || v == "yes")
		.unwrap_or(DEFAULT_LOG_TO_CONSOLE)
}
