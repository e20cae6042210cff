//! Composable encode/decode strategies between typed values and an untyped
//! [`Value`] tree.
//!
//! # Mental Model
//!
//! A [`Codec`] is a pair of functions: `encode: &T -> Value` and
//! `decode: &Value -> DecodeResult<T>`. Leaf codecs ([`int`], [`string`],
//! [`identifier`], ...) are combined into larger ones ([`set_of`], [`map_of`],
//! [`either`], [`dispatch`]) and adapted with [`CodecExt::xmap`].
//!
//! # Failure Policy
//!
//! Codecs never panic. Collection combinators decode leniently: an element
//! that fails is left out and recorded in [`Decoded::failures`], and the
//! caller chooses whether to accept the partial result or call
//! [`Decoded::strict`].
//!
//! # Key Types
//!
//! | Type | Role |
//! |------|------|
//! | [`Value`] | Untyped tree: documents on disk and payloads on the wire. |
//! | [`Codec`] | Two-way strategy for one type. |
//! | [`Decoded`] | Successful decode plus skipped elements. |
//! | [`DecodeError`] | `{path, reason}` for one failure. |
//! | [`WireCodec`] | Binary payloads for a codec. |

mod codec;
mod collections;
mod either;
mod enums;
mod error;
mod primitive;
mod registry;
mod value;
mod wire;

pub use codec::{BoxCodec, Codec, CodecExt, FlatXMap, XMap, copy_via};
pub use collections::{ListOf, MapOf, SetOf, list_of, map_of, set_of};
pub use either::{Dispatch, Either, EitherCodec, dispatch, either};
pub use enums::{EnumWidth, IntEnumCodec, StringEnumCodec, int_enum, int_enum_of, string_enum, string_enum_of};
pub use error::{DecodeError, DecodeResult, Decoded, EncodeError, Failure};
pub use primitive::{
	BoolCodec, DoubleCodec, IdentifierCodec, IntCodec, LongCodec, Passthrough, SerdeCodec, StringCodec, bool, double,
	from_serde, identifier, int, long, passthrough, string,
};
pub use registry::{
	InstanceOrTag, InstanceOrTagCodec, LazyRegistry, MapRegistry, RegistryCodec, RegistryLookup, for_registry,
	instance_or_tag,
};
pub use value::{MAX_DEPTH, Value, ValueKind};
pub use wire::{WireCodec, WireError, read_value, write_value};
