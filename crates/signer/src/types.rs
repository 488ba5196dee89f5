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

use std::{fmt, str::FromStr};

use base64::{Engine as _, engine::general_purpose::STANDARD};
use num_bigint::BigUint;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::SignerError;
use crate::scheme::{SignatureTag, split_tag};

/// Fixed-point scale of price, quantity and leverage (9 implied decimals)
pub const BASE_UNIT: u64 = 1_000_000_000;

/// Length in bytes of every raw signature this crate produces or accepts
pub const RAW_SIGNATURE_LEN: usize = 64;

/// 32-byte on-chain account identifier
///
/// Rendered as `0x`-prefixed lower-case hex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct AccountId(pub [u8; 32]);

impl AccountId {
	pub const LENGTH: usize = 32;

	pub fn new(bytes: [u8; 32]) -> Self {
		Self(bytes)
	}

	pub fn as_bytes(&self) -> &[u8; 32] {
		&self.0
	}

	pub fn to_hex(&self) -> String {
		format!("0x{}", hex::encode(self.0))
	}
}

impl fmt::Display for AccountId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.to_hex())
	}
}

impl FromStr for AccountId {
	type Err = SignerError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let stripped = s.strip_prefix("0x").unwrap_or(s);
		let bytes = hex::decode(stripped)
			.map_err(|e| SignerError::InvalidAccountId(format!("Invalid hex: {}", e)))?;
		let bytes: [u8; 32] = bytes.try_into().map_err(|v: Vec<u8>| {
			SignerError::InvalidAccountId(format!("Expected 32 bytes, got {}", v.len()))
		})?;
		Ok(Self(bytes))
	}
}

impl From<[u8; 32]> for AccountId {
	fn from(bytes: [u8; 32]) -> Self {
		Self(bytes)
	}
}

impl Serialize for AccountId {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(&self.to_hex())
	}
}

impl<'de> Deserialize<'de> for AccountId {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let s = String::deserialize(deserializer)?;
		s.parse().map_err(serde::de::Error::custom)
	}
}

/// Serde adapter that carries big integers as decimal strings
mod decimal {
	use num_bigint::BigUint;
	use serde::{Deserialize, Deserializer, Serializer};

	pub fn serialize<S: Serializer>(value: &BigUint, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(&value.to_str_radix(10))
	}

	pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BigUint, D::Error> {
		let s = String::deserialize(deserializer)?;
		BigUint::parse_bytes(s.as_bytes(), 10)
			.ok_or_else(|| serde::de::Error::custom(format!("Invalid decimal integer: {}", s)))
	}
}

/// Behavioral flags of an order, packed into one byte on the wire
///
/// Bit layout: bit0 = ioc, bit1 = post_only, bit2 = reduce_only,
/// bit3 = is_buy, bit4 = orderbook_only. Bits 5..7 are always zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct OrderFlags {
	pub ioc: bool,
	pub post_only: bool,
	pub reduce_only: bool,
	pub is_buy: bool,
	pub orderbook_only: bool,
}

impl OrderFlags {
	const IOC: u8 = 1 << 0;
	const POST_ONLY: u8 = 1 << 1;
	const REDUCE_ONLY: u8 = 1 << 2;
	const IS_BUY: u8 = 1 << 3;
	const ORDERBOOK_ONLY: u8 = 1 << 4;
	const MASK: u8 = 0b0001_1111;

	pub fn to_byte(self) -> u8 {
		let mut flags = 0u8;
		if self.ioc {
			flags |= Self::IOC;
		}
		if self.post_only {
			flags |= Self::POST_ONLY;
		}
		if self.reduce_only {
			flags |= Self::REDUCE_ONLY;
		}
		if self.is_buy {
			flags |= Self::IS_BUY;
		}
		if self.orderbook_only {
			flags |= Self::ORDERBOOK_ONLY;
		}
		flags
	}

	/// Unpack a flag byte. Bytes with any of the upper three bits set are rejected.
	pub fn from_byte(byte: u8) -> Result<Self, SignerError> {
		if byte & !Self::MASK != 0 {
			return Err(SignerError::Serialization(format!(
				"Invalid order flags byte: {:#010b}",
				byte
			)));
		}
		Ok(Self {
			ioc: byte & Self::IOC != 0,
			post_only: byte & Self::POST_ONLY != 0,
			reduce_only: byte & Self::REDUCE_ONLY != 0,
			is_buy: byte & Self::IS_BUY != 0,
			orderbook_only: byte & Self::ORDERBOOK_ONLY != 0,
		})
	}
}

/// Trade order as signed by a maker and verified by the settlement program
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
	/// Traded instrument
	pub market: AccountId,
	/// Order originator
	pub maker: AccountId,
	pub is_buy: bool,
	pub reduce_only: bool,
	pub post_only: bool,
	pub orderbook_only: bool,
	pub ioc: bool,
	/// Quantity scaled by 1e9
	#[serde(with = "decimal")]
	pub quantity: BigUint,
	/// Price scaled by 1e9
	#[serde(with = "decimal")]
	pub price: BigUint,
	/// Leverage scaled by 1e9
	#[serde(with = "decimal")]
	pub leverage: BigUint,
	/// Unix epoch milliseconds
	pub expiration: u64,
	/// Nonce distinguishing otherwise identical orders
	#[serde(with = "decimal")]
	pub salt: BigUint,
}

impl Order {
	/// Start a fresh order for `market` placed by `maker`.
	///
	/// Every call returns an independent builder; callers never share a
	/// default order value.
	pub fn builder(market: AccountId, maker: AccountId) -> OrderBuilder {
		OrderBuilder::new(market, maker)
	}

	pub fn flags(&self) -> OrderFlags {
		OrderFlags {
			ioc: self.ioc,
			post_only: self.post_only,
			reduce_only: self.reduce_only,
			is_buy: self.is_buy,
			orderbook_only: self.orderbook_only,
		}
	}

	pub fn set_flags(&mut self, flags: OrderFlags) {
		self.ioc = flags.ioc;
		self.post_only = flags.post_only;
		self.reduce_only = flags.reduce_only;
		self.is_buy = flags.is_buy;
		self.orderbook_only = flags.orderbook_only;
	}
}

/// Builder for [`Order`]
///
/// Defaults: orderbook-only sell order of 1.0 quantity at price 1.0 with
/// 1x leverage, zero expiration and zero salt.
#[derive(Debug, Clone)]
pub struct OrderBuilder {
	order: Order,
}

impl OrderBuilder {
	pub fn new(market: AccountId, maker: AccountId) -> Self {
		Self {
			order: Order {
				market,
				maker,
				is_buy: false,
				reduce_only: false,
				post_only: false,
				orderbook_only: true,
				ioc: false,
				quantity: BigUint::from(BASE_UNIT),
				price: BigUint::from(BASE_UNIT),
				leverage: BigUint::from(BASE_UNIT),
				expiration: 0,
				salt: BigUint::default(),
			},
		}
	}

	pub fn is_buy(mut self, is_buy: bool) -> Self {
		self.order.is_buy = is_buy;
		self
	}

	pub fn reduce_only(mut self, reduce_only: bool) -> Self {
		self.order.reduce_only = reduce_only;
		self
	}

	pub fn post_only(mut self, post_only: bool) -> Self {
		self.order.post_only = post_only;
		self
	}

	pub fn orderbook_only(mut self, orderbook_only: bool) -> Self {
		self.order.orderbook_only = orderbook_only;
		self
	}

	pub fn ioc(mut self, ioc: bool) -> Self {
		self.order.ioc = ioc;
		self
	}

	pub fn quantity(mut self, quantity: impl Into<BigUint>) -> Self {
		self.order.quantity = quantity.into();
		self
	}

	pub fn price(mut self, price: impl Into<BigUint>) -> Self {
		self.order.price = price.into();
		self
	}

	pub fn leverage(mut self, leverage: impl Into<BigUint>) -> Self {
		self.order.leverage = leverage.into();
		self
	}

	pub fn expiration(mut self, expiration: u64) -> Self {
		self.order.expiration = expiration;
		self
	}

	pub fn salt(mut self, salt: impl Into<BigUint>) -> Self {
		self.order.salt = salt.into();
		self
	}

	/// Fill the salt with 128 random bits from the OS RNG
	pub fn random_salt(mut self) -> Self {
		self.order.salt = BigUint::from(rand::random::<u128>());
		self
	}

	pub fn build(self) -> Order {
		self.order
	}
}

/// Signature and public key produced by one signing call
///
/// `signature` is hex of the raw signature followed by the tag digit (or, for
/// zk-wrapped signatures, the base64 composite). `public_key` is base64.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SigPK {
	pub signature: String,
	pub public_key: String,
}

impl SigPK {
	pub fn new(raw_signature: &[u8], tag: SignatureTag, public_key: &[u8]) -> Self {
		Self {
			signature: format!("{}{}", hex::encode(raw_signature), tag.as_char()),
			public_key: STANDARD.encode(public_key),
		}
	}

	pub fn public_key_bytes(&self) -> Result<Vec<u8>, SignerError> {
		STANDARD
			.decode(&self.public_key)
			.map_err(|e| SignerError::InvalidPublicKey(format!("Invalid base64: {}", e)))
	}
}

/// Parts of a typed signature string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedSignature {
	pub signature: Vec<u8>,
	pub public_key: Vec<u8>,
	pub tag: SignatureTag,
}

impl TypedSignature {
	/// Parse `hex(signature) || hex(public key) || tag`
	pub fn parse(typed: &str) -> Result<Self, SignerError> {
		let (body, tag) = split_tag(typed)?;
		let sig_hex_len = RAW_SIGNATURE_LEN * 2;
		if body.len() <= sig_hex_len || !body.is_char_boundary(sig_hex_len) {
			return Err(SignerError::SignatureFormat(format!(
				"Typed signature too short: {} chars",
				typed.len()
			)));
		}
		let (sig_hex, pk_hex) = body.split_at(sig_hex_len);
		let signature = hex::decode(sig_hex)
			.map_err(|e| SignerError::SignatureFormat(format!("Invalid hex: {}", e)))?;
		let public_key = hex::decode(pk_hex)
			.map_err(|e| SignerError::InvalidPublicKey(format!("Invalid hex: {}", e)))?;
		Ok(Self {
			signature,
			public_key,
			tag,
		})
	}

	/// Signature in the `hex || tag` form consumed by verification
	pub fn tagged_signature(&self) -> String {
		format!("{}{}", hex::encode(&self.signature), self.tag.as_char())
	}

	pub fn encode(&self) -> String {
		format!(
			"{}{}{}",
			hex::encode(&self.signature),
			hex::encode(&self.public_key),
			self.tag.as_char()
		)
	}
}

/// Order with its typed signature attached
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedOrder {
	#[serde(flatten)]
	pub order: Order,
	pub typed_signature: String,
}

impl SignedOrder {
	/// Attach a fresh signature to an order
	pub fn from_sig_pk(order: Order, sig_pk: &SigPK) -> Result<Self, SignerError> {
		let (body, tag) = split_tag(&sig_pk.signature)?;
		let signature = hex::decode(body)
			.map_err(|e| SignerError::SignatureFormat(format!("Invalid hex: {}", e)))?;
		if signature.len() != RAW_SIGNATURE_LEN {
			return Err(SignerError::SignatureFormat(format!(
				"Expected {} signature bytes, got {}",
				RAW_SIGNATURE_LEN,
				signature.len()
			)));
		}
		let typed = TypedSignature {
			signature,
			public_key: sig_pk.public_key_bytes()?,
			tag,
		};
		Ok(Self {
			order,
			typed_signature: typed.encode(),
		})
	}

	pub fn typed(&self) -> Result<TypedSignature, SignerError> {
		TypedSignature::parse(&self.typed_signature)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn account(byte: u8) -> AccountId {
		AccountId([byte; 32])
	}

	#[test]
	fn test_flags_round_trip_all_combinations() {
		for byte in 0u8..32 {
			let flags = OrderFlags::from_byte(byte).unwrap();
			assert_eq!(flags.to_byte(), byte);
			assert_eq!(OrderFlags::from_byte(flags.to_byte()).unwrap(), flags);
		}
	}

	#[test]
	fn test_flags_reject_upper_bits() {
		assert!(OrderFlags::from_byte(0b0010_0000).is_err());
		assert!(OrderFlags::from_byte(0xff).is_err());
	}

	#[test]
	fn test_flag_bit_positions() {
		let flags = OrderFlags {
			is_buy: true,
			orderbook_only: true,
			..Default::default()
		};
		assert_eq!(flags.to_byte(), 0b0001_1000);
		assert_eq!(
			OrderFlags {
				ioc: true,
				..Default::default()
			}
			.to_byte(),
			0b0000_0001
		);
		assert_eq!(
			OrderFlags {
				post_only: true,
				..Default::default()
			}
			.to_byte(),
			0b0000_0010
		);
		assert_eq!(
			OrderFlags {
				reduce_only: true,
				..Default::default()
			}
			.to_byte(),
			0b0000_0100
		);
	}

	#[test]
	fn test_account_id_parse() {
		let id = account(0xab);
		let parsed: AccountId = id.to_hex().parse().unwrap();
		assert_eq!(parsed, id);

		let unprefixed: AccountId = hex::encode([0xab; 32]).parse().unwrap();
		assert_eq!(unprefixed, id);

		assert!("0x1234".parse::<AccountId>().is_err());
		assert!("zz".repeat(32).parse::<AccountId>().is_err());
	}

	#[test]
	fn test_builders_are_independent() {
		let mut first = Order::builder(account(1), account(2)).build();
		let second = Order::builder(account(1), account(2)).build();
		first.salt = BigUint::from(7u32);
		first.is_buy = true;

		assert_eq!(second.salt, BigUint::default());
		assert!(!second.is_buy);
		assert!(second.orderbook_only);
		assert_eq!(second.price, BigUint::from(BASE_UNIT));
	}

	#[test]
	fn test_order_json_uses_decimal_strings() {
		let order = Order::builder(account(1), account(2))
			.salt(42u32)
			.expiration(1_700_000_000_000)
			.build();
		let json = serde_json::to_value(&order).unwrap();
		assert_eq!(json["salt"], "42");
		assert_eq!(json["price"], "1000000000");
		assert_eq!(json["expiration"], 1_700_000_000_000u64);
		assert_eq!(json["market"], account(1).to_hex());

		let decoded: Order = serde_json::from_value(json).unwrap();
		assert_eq!(decoded, order);
	}

	#[test]
	fn test_typed_signature_layout() {
		let order = Order::builder(account(1), account(2)).build();
		let sig_pk = SigPK::new(&[0x11; 64], SignatureTag::Ed25519, &[0x22; 32]);
		let signed = SignedOrder::from_sig_pk(order, &sig_pk).unwrap();

		let expected = format!("{}{}1", "11".repeat(64), "22".repeat(32));
		assert_eq!(signed.typed_signature, expected);

		let typed = signed.typed().unwrap();
		assert_eq!(typed.signature, vec![0x11; 64]);
		assert_eq!(typed.public_key, vec![0x22; 32]);
		assert_eq!(typed.tag, SignatureTag::Ed25519);
		assert_eq!(typed.tagged_signature(), format!("{}1", "11".repeat(64)));
	}

	#[test]
	fn test_typed_signature_rejects_short_input() {
		assert!(TypedSignature::parse(&format!("{}0", "11".repeat(64))).is_err());
		assert!(TypedSignature::parse("0").is_err());
	}
}
