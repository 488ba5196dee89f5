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

//! Canonical order encoding
//!
//! Orders are serialized into a fixed 144-byte buffer that the on-chain
//! verifier reproduces bit for bit:
//!
//! | Field      | Offset | Length |
//! |------------|--------|--------|
//! | price      | 0      | 16     |
//! | quantity   | 16     | 16     |
//! | leverage   | 32     | 16     |
//! | salt       | 48     | 16     |
//! | expiration | 64     | 8      |
//! | maker      | 72     | 32     |
//! | market     | 104    | 32     |
//! | flags      | 136    | 1      |
//! | domain tag | 137    | 7      |
//!
//! Numbers are big-endian and left-padded with zeros. Field order, width and
//! padding must never change.

use num_bigint::BigUint;

use crate::error::SignerError;
use crate::types::{Order, OrderFlags};

/// Total length of a serialized order
pub const SERIALIZED_ORDER_LEN: usize = 144;

/// ASCII literal closing every serialized order
pub const ORDER_DOMAIN_TAG: &[u8; 7] = b"Bluefin";

const AMOUNT_WIDTH: usize = 16;
const EXPIRATION_WIDTH: usize = 8;

const PRICE_OFFSET: usize = 0;
const QUANTITY_OFFSET: usize = 16;
const LEVERAGE_OFFSET: usize = 32;
const SALT_OFFSET: usize = 48;
const EXPIRATION_OFFSET: usize = 64;
const MAKER_OFFSET: usize = 72;
const MARKET_OFFSET: usize = 104;
/// Offset of the packed flag byte
pub const FLAGS_OFFSET: usize = 136;
/// Offset of the domain tag
pub const DOMAIN_TAG_OFFSET: usize = 137;

/// Serialize an order into its canonical byte layout
pub fn serialize_order(order: &Order) -> Result<[u8; SERIALIZED_ORDER_LEN], SignerError> {
	let mut buf = [0u8; SERIALIZED_ORDER_LEN];

	write_amount(&mut buf, PRICE_OFFSET, &order.price, "price")?;
	write_amount(&mut buf, QUANTITY_OFFSET, &order.quantity, "quantity")?;
	write_amount(&mut buf, LEVERAGE_OFFSET, &order.leverage, "leverage")?;
	write_amount(&mut buf, SALT_OFFSET, &order.salt, "salt")?;
	buf[EXPIRATION_OFFSET..EXPIRATION_OFFSET + EXPIRATION_WIDTH]
		.copy_from_slice(&order.expiration.to_be_bytes());
	buf[MAKER_OFFSET..MAKER_OFFSET + 32].copy_from_slice(order.maker.as_bytes());
	buf[MARKET_OFFSET..MARKET_OFFSET + 32].copy_from_slice(order.market.as_bytes());
	buf[FLAGS_OFFSET] = encode_flags(&order.flags());
	buf[DOMAIN_TAG_OFFSET..].copy_from_slice(ORDER_DOMAIN_TAG);

	Ok(buf)
}

/// Lower-case hex text of the serialized order
///
/// This text, not the raw buffer, is what gets hashed and what the
/// secp256k1 signer consumes.
pub fn serialized_order_hex(order: &Order) -> Result<String, SignerError> {
	Ok(hex::encode(serialize_order(order)?))
}

pub fn encode_flags(flags: &OrderFlags) -> u8 {
	flags.to_byte()
}

pub fn decode_flags(byte: u8) -> Result<OrderFlags, SignerError> {
	OrderFlags::from_byte(byte)
}

fn write_amount(
	buf: &mut [u8],
	offset: usize,
	value: &BigUint,
	field: &'static str,
) -> Result<(), SignerError> {
	let bytes = value.to_bytes_be();
	if bytes.len() > AMOUNT_WIDTH {
		return Err(SignerError::SerializationOverflow {
			field,
			width: AMOUNT_WIDTH,
		});
	}
	let start = offset + AMOUNT_WIDTH - bytes.len();
	buf[start..offset + AMOUNT_WIDTH].copy_from_slice(&bytes);
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::types::AccountId;

	fn example_order() -> Order {
		Order::builder(AccountId([0x11; 32]), AccountId([0x22; 32]))
			.is_buy(true)
			.orderbook_only(true)
			.price(1_000_000_000u64)
			.quantity(1_000_000_000u64)
			.leverage(1_000_000_000u64)
			.expiration(1_700_000_000_000)
			.salt(42u32)
			.build()
	}

	#[test]
	fn test_example_layout() {
		let buf = serialize_order(&example_order()).unwrap();

		assert_eq!(buf.len(), SERIALIZED_ORDER_LEN);
		assert_eq!(buf[FLAGS_OFFSET], 0b0001_1000);
		assert_eq!(&buf[DOMAIN_TAG_OFFSET..], b"Bluefin");

		let hex = hex::encode(buf);
		assert_eq!(&hex[0..32], "0000000000000000000000003b9aca00");
		assert_eq!(&hex[32..64], "0000000000000000000000003b9aca00");
		assert_eq!(&hex[64..96], "0000000000000000000000003b9aca00");
		assert_eq!(&hex[96..128], "0000000000000000000000000000002a");
		assert_eq!(&hex[128..144], "0000018bcfe56800");
		assert_eq!(&buf[72..104], &[0x22; 32]);
		assert_eq!(&buf[104..136], &[0x11; 32]);
	}

	#[test]
	fn test_serialization_is_deterministic() {
		let order = example_order();
		let first = serialize_order(&order).unwrap();
		let second = serialize_order(&order.clone()).unwrap();
		assert_eq!(first, second);
		assert_eq!(serialized_order_hex(&order).unwrap().len(), 288);
	}

	#[test]
	fn test_every_field_changes_buffer() {
		let base = example_order();
		let original = serialize_order(&base).unwrap();

		let mut variants = Vec::new();
		let mut o = base.clone();
		o.price += 1u32;
		variants.push(o);
		let mut o = base.clone();
		o.quantity += 1u32;
		variants.push(o);
		let mut o = base.clone();
		o.leverage += 1u32;
		variants.push(o);
		let mut o = base.clone();
		o.salt += 1u32;
		variants.push(o);
		let mut o = base.clone();
		o.expiration += 1;
		variants.push(o);
		let mut o = base.clone();
		o.maker.0[31] ^= 1;
		variants.push(o);
		let mut o = base.clone();
		o.market.0[0] ^= 1;
		variants.push(o);
		let mut o = base.clone();
		o.ioc = !o.ioc;
		variants.push(o);
		let mut o = base.clone();
		o.post_only = !o.post_only;
		variants.push(o);
		let mut o = base.clone();
		o.reduce_only = !o.reduce_only;
		variants.push(o);
		let mut o = base.clone();
		o.is_buy = !o.is_buy;
		variants.push(o);
		let mut o = base;
		o.orderbook_only = !o.orderbook_only;
		variants.push(o);

		for variant in &variants {
			assert_ne!(serialize_order(variant).unwrap(), original);
		}
	}

	#[test]
	fn test_amount_overflow_fails() {
		let mut order = example_order();
		order.price = BigUint::from(1u8) << 128usize;
		assert!(matches!(
			serialize_order(&order),
			Err(SignerError::SerializationOverflow {
				field: "price",
				width: 16
			})
		));

		let mut order = example_order();
		order.salt = BigUint::from(u128::MAX);
		assert!(serialize_order(&order).is_ok());
	}

	#[test]
	fn test_flag_byte_round_trip() {
		for byte in 0u8..32 {
			let flags = decode_flags(byte).unwrap();
			assert_eq!(encode_flags(&flags), byte);
		}
	}
}
