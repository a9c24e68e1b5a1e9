//! Streaming serde deserializer over plist tags (no document tree).
//!
//! Supported:
//! - Scalars: `<string>`, `<integer>` (at the destination's width), `<real>`
//!   (32-bit parse for `f32`), `<date>`, `<data>`, `<true/>`, `<false/>`.
//! - `<dict>` into structs and maps, `<array>` into sequences and tuples.
//! - Empty-element forms (`<dict/>`, `<array/>`, `<string/>`, `<data/>`).
//! - Bytes: `<data>` (base64) or an `<array>` of integers 0..=255.
//! - Externally-tagged enums: `<string>Variant</string>` or a single-entry `<dict>`.
//! - Unknown struct keys: the value is skipped unread.
//!
//! Policies:
//! - `Option<T>` is always `Some`: a present key allocates its value.
//! - A key repeated in a struct's `<dict>`: the last occurrence wins.
//! - Errors carry the location of the innermost value being decoded.

use std::collections::HashSet;

use serde::de::value::{BorrowedStrDeserializer, U8Deserializer};
use serde::de::{self, DeserializeSeed, Deserializer as _, SeqAccess, Visitor};

use crate::date::DATE_NEWTYPE;
use crate::error::Error;
use crate::options::Cfg;
use crate::parse_scalars::{decode_data, parse_date, parse_f32, parse_f64, parse_integer};
use crate::scanner::{Scanner, Token, TokenKind};
use crate::skip::skip_value;

/// The streaming serde deserializer.
///
/// Where do values come from: the tag [`Scanner`] over the input bytes, one
/// token at a time. Where do values go: into the `Visitor` of the caller's
/// `T: Deserialize`, which decides the destination shape.
///
/// Obtain one through [`crate::with_deserializer_from_slice`].
pub struct Deserializer<'a, 'de> {
    sc: &'a mut Scanner<'de>,
    cfg: Cfg,
}

impl<'a, 'de> Deserializer<'a, 'de> {
    /// Construct a deserializer reading the next value from `sc`.
    ///
    /// Called by:
    /// - Top-level entry points and recursively for nested values.
    pub(crate) fn new(sc: &'a mut Scanner<'de>, cfg: Cfg) -> Self {
        Self { sc, cfg }
    }

    fn reborrow(&mut self) -> Deserializer<'_, 'de> {
        Deserializer::new(&mut *self.sc, self.cfg)
    }

    /// Run `f` and attach the start offset of the current value to any error
    /// that has no location yet.
    fn located<T>(mut self, f: impl FnOnce(&mut Self) -> Result<T, Error>) -> Result<T, Error> {
        let start = self.sc.next_offset();
        let res = f(&mut self);
        res.map_err(|err| self.sc.locate(err, start))
    }

    /// Consume the token that starts the next value.
    fn value_token(&mut self) -> Result<Token<'de>, Error> {
        match self.sc.next()? {
            Some(tok) if matches!(tok.kind, TokenKind::Open | TokenKind::Empty) => Ok(tok),
            Some(tok) => Err(self.sc.unexpected_tag(&tok, "where a value was expected")),
            None => Err(self.sc.eof("where a value was expected")),
        }
    }

    /// Read the body of scalar `tok` and convert it with `f`; conversion errors
    /// point at the body.
    fn parse_body<T>(
        &mut self,
        tok: &Token<'de>,
        f: impl FnOnce(&'de str) -> Result<T, Error>,
    ) -> Result<T, Error> {
        let (text, at) = self.sc.scalar_text(tok)?;
        f(text).map_err(|err| self.sc.locate(err, at))
    }

    /// Validated `<date>` text.
    fn date_text(&mut self, tok: &Token<'de>) -> Result<&'de str, Error> {
        self.parse_body(tok, |text| parse_date(text).map(|_| text))
    }

    /// Decode the value started by `tok` by its own kind.
    ///
    /// Typed entry points fall back to this when the tag does not match what
    /// they asked for, so the visitor reports the mismatch in serde's words.
    fn dispatch<V: Visitor<'de>>(&mut self, tok: Token<'de>, visitor: V) -> Result<V::Value, Error> {
        match (tok.kind, tok.name) {
            (_, "dict") => self.visit_dict(&tok, visitor),
            (_, "array") => self.visit_array(&tok, visitor),
            (_, "string") => {
                let (text, _) = self.sc.scalar_text(&tok)?;
                visitor.visit_borrowed_str(text)
            }
            (_, "integer") => {
                let v: i64 = self.parse_body(&tok, |text| parse_integer(text, "i64"))?;
                visitor.visit_i64(v)
            }
            (_, "real") => {
                let v = self.parse_body(&tok, |text| parse_f64("real", text))?;
                visitor.visit_f64(v)
            }
            (_, "date") => {
                let text = self.date_text(&tok)?;
                visitor.visit_newtype_struct(BorrowedStrDeserializer::<Error>::new(text))
            }
            (_, "data") => {
                let data = self.parse_body(&tok, decode_data)?;
                visitor.visit_byte_buf(data)
            }
            (TokenKind::Empty, "true") => visitor.visit_bool(true),
            (TokenKind::Empty, "false") => visitor.visit_bool(false),
            _ => Err(self.sc.unexpected_tag(&tok, "where a value was expected")),
        }
    }

    fn visit_dict<V: Visitor<'de>>(&mut self, tok: &Token<'de>, visitor: V) -> Result<V::Value, Error> {
        if tok.kind == TokenKind::Empty {
            return visitor.visit_map(EmptyAccess);
        }
        self.walk_dict(visitor, Vec::new())
    }

    /// Stream the entries of an open `<dict>`. Keys flagged in `shadowed` (by
    /// position) are skipped together with their value.
    fn walk_dict<V: Visitor<'de>>(&mut self, visitor: V, shadowed: Vec<bool>) -> Result<V::Value, Error> {
        let mut access = DictAccess {
            de: self.reborrow(),
            closed: false,
            shadowed,
            index: 0,
        };
        let value = visitor.visit_map(&mut access)?;
        access.finish()?;
        Ok(value)
    }

    fn visit_array<V: Visitor<'de>>(&mut self, tok: &Token<'de>, visitor: V) -> Result<V::Value, Error> {
        if tok.kind == TokenKind::Empty {
            return visitor.visit_seq(EmptyAccess);
        }
        let mut access = ArrayAccess {
            de: self.reborrow(),
            closed: false,
        };
        let value = visitor.visit_seq(&mut access)?;
        access.finish()?;
        Ok(value)
    }
}

macro_rules! deserialize_integer {
    ($($method:ident => $visit:ident($ty:ty)),* $(,)?) => {$(
        fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
            self.located(|de| {
                let tok = de.value_token()?;
                if tok.name != "integer" {
                    return de.dispatch(tok, visitor);
                }
                let v: $ty = de.parse_body(&tok, |text| parse_integer(text, stringify!($ty)))?;
                visitor.$visit(v)
            })
        }
    )*};
}

impl<'de> de::Deserializer<'de> for Deserializer<'_, 'de> {
    type Error = Error;

    /// Decode the next value by its tag, for destinations without a fixed shape.
    ///
    /// `<date>` reaches the visitor as a newtype around its validated text.
    /// Document text cannot produce a newtype, so [`crate::Value`] and
    /// [`crate::Date`] recover the date kind from it.
    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        self.located(|de| {
            let tok = de.value_token()?;
            de.dispatch(tok, visitor)
        })
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        self.deserialize_any(visitor)
    }

    deserialize_integer! {
        deserialize_i8 => visit_i8(i8),
        deserialize_i16 => visit_i16(i16),
        deserialize_i32 => visit_i32(i32),
        deserialize_i64 => visit_i64(i64),
        deserialize_i128 => visit_i128(i128),
        deserialize_u8 => visit_u8(u8),
        deserialize_u16 => visit_u16(u16),
        deserialize_u32 => visit_u32(u32),
        deserialize_u64 => visit_u64(u64),
        deserialize_u128 => visit_u128(u128),
    }

    /// `<real>` parsed at 32-bit precision; `<integer>` when widening is enabled.
    fn deserialize_f32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        self.located(|de| {
            let tok = de.value_token()?;
            match tok.name {
                "real" => {
                    let v = de.parse_body(&tok, |text| parse_f32("real", text))?;
                    visitor.visit_f32(v)
                }
                "integer" if de.cfg.integers_as_reals => {
                    let v = de.parse_body(&tok, |text| {
                        parse_integer::<i128>(text, "f32")?;
                        parse_f32("integer", text)
                    })?;
                    visitor.visit_f32(v)
                }
                "integer" => Err(Error::type_mismatch("<integer>", "a <real>")),
                _ => de.dispatch(tok, visitor),
            }
        })
    }

    fn deserialize_f64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        self.located(|de| {
            let tok = de.value_token()?;
            match tok.name {
                "real" => {
                    let v = de.parse_body(&tok, |text| parse_f64("real", text))?;
                    visitor.visit_f64(v)
                }
                "integer" if de.cfg.integers_as_reals => {
                    let v = de.parse_body(&tok, |text| {
                        parse_integer::<i128>(text, "f64")?;
                        parse_f64("integer", text)
                    })?;
                    visitor.visit_f64(v)
                }
                "integer" => Err(Error::type_mismatch("<integer>", "a <real>")),
                _ => de.dispatch(tok, visitor),
            }
        })
    }

    fn deserialize_char<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        self.deserialize_str(visitor)
    }

    /// `<string>` bodies are lent out of the input; `<date>` text binds too.
    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        self.located(|de| {
            let tok = de.value_token()?;
            if tok.name == "date" {
                let text = de.date_text(&tok)?;
                return visitor.visit_borrowed_str(text);
            }
            de.dispatch(tok, visitor)
        })
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        self.deserialize_str(visitor)
    }

    /// Bytes from `<data>` or from an `<array>` of integers 0..=255.
    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        self.located(|de| {
            let tok = de.value_token()?;
            match (tok.kind, tok.name) {
                (_, "data") => {
                    let data = de.parse_body(&tok, decode_data)?;
                    visitor.visit_byte_buf(data)
                }
                (TokenKind::Open, "array") => {
                    let mut access = ArrayAccess {
                        de: de.reborrow(),
                        closed: false,
                    };
                    let mut out = Vec::new();
                    while let Some(b) = access.next_element::<u8>()? {
                        out.push(b);
                    }
                    access.finish()?;
                    visitor.visit_byte_buf(out)
                }
                _ => de.dispatch(tok, visitor),
            }
        })
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        self.deserialize_bytes(visitor)
    }

    /// A value that is present is always `Some`; absence is the caller's
    /// `#[serde(default)]` business.
    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_some(self)
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        self.deserialize_any(visitor)
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        self.deserialize_any(visitor)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        if name == DATE_NEWTYPE {
            return self.deserialize_any(visitor);
        }
        visitor.visit_newtype_struct(self)
    }

    /// `<array>` elements in order, or the bytes of a `<data>` body.
    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        self.located(|de| {
            let tok = de.value_token()?;
            if tok.name != "data" {
                return de.dispatch(tok, visitor);
            }
            let data = de.parse_body(&tok, decode_data)?;

            /// `SeqAccess` that iterates over the bytes of a decoded `<data>`.
            struct ByteSeq {
                data: Vec<u8>,
                idx: usize,
            }
            impl<'de> SeqAccess<'de> for ByteSeq {
                type Error = Error;
                fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>, Error>
                where
                    T: DeserializeSeed<'de>,
                {
                    let Some(&b) = self.data.get(self.idx) else {
                        return Ok(None);
                    };
                    self.idx += 1;
                    seed.deserialize(U8Deserializer::<Error>::new(b)).map(Some)
                }

                fn size_hint(&self) -> Option<usize> {
                    Some(self.data.len() - self.idx)
                }
            }
            visitor.visit_seq(ByteSeq { data, idx: 0 })
        })
    }

    fn deserialize_tuple<V: Visitor<'de>>(self, _len: usize, visitor: V) -> Result<V::Value, Self::Error> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        self.deserialize_seq(visitor)
    }

    /// `<dict>` entries as a serde map. An `<array>` is refused here even though
    /// derived structs would accept one positionally.
    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        self.located(|de| {
            let tok = de.value_token()?;
            if tok.name == "array" {
                return Err(<Error as de::Error>::invalid_type(de::Unexpected::Seq, &visitor));
            }
            de.dispatch(tok, visitor)
        })
    }

    /// Like `deserialize_map`, but a key repeated inside the `<dict>` binds
    /// only its last occurrence. Earlier occurrences are skipped unread.
    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        self.located(|de| {
            let tok = de.value_token()?;
            match (tok.kind, tok.name) {
                (TokenKind::Open, "dict") => {
                    let shadowed = shadowed_keys(&de.sc.dict_keys_ahead());
                    de.walk_dict(visitor, shadowed)
                }
                (_, "array") => Err(<Error as de::Error>::invalid_type(de::Unexpected::Seq, &visitor)),
                _ => de.dispatch(tok, visitor),
            }
        })
    }

    /// Externally-tagged enum: `<string>Variant</string>` for unit variants, or
    /// `<dict><key>Variant</key>payload</dict>` for any variant.
    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        self.located(|de| {
            let tok = de.value_token()?;
            match (tok.kind, tok.name) {
                (_, "string") => {
                    let (variant, _) = de.sc.scalar_text(&tok)?;
                    visitor.visit_enum(BorrowedStrDeserializer::<Error>::new(variant))
                }
                (TokenKind::Open, "dict") => {
                    let key = match de.sc.next()? {
                        Some(key) if key.starts("key") => key,
                        Some(other) => {
                            return Err(de.sc.unexpected_tag(&other, "where an enum variant <key> was expected"));
                        }
                        None => return Err(de.sc.eof("inside <dict>")),
                    };
                    let (variant, _) = de.sc.scalar_text(&key)?;
                    visitor.visit_enum(VariantDict {
                        de: de.reborrow(),
                        variant,
                    })
                }
                _ => Err(Error::type_mismatch(
                    &format!("<{}>", tok.name),
                    "a <string> or single-entry <dict> naming an enum variant",
                )),
            }
        })
    }

    fn deserialize_identifier<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        self.deserialize_str(visitor)
    }

    /// Discard the next value unread (unknown keys, `IgnoredAny`).
    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        self.located(|de| {
            skip_value(de.sc)?;
            visitor.visit_unit()
        })
    }
}

/// For each key in order, whether the same key occurs again later.
fn shadowed_keys(keys: &[&str]) -> Vec<bool> {
    let mut seen = HashSet::with_capacity(keys.len());
    let mut shadowed: Vec<bool> = keys.iter().rev().map(|key| !seen.insert(*key)).collect();
    shadowed.reverse();
    shadowed
}

/// Streaming `MapAccess` over the entries of an open `<dict>`.
struct DictAccess<'a, 'de> {
    de: Deserializer<'a, 'de>,
    closed: bool,
    /// Per key position; `true` means a later entry overrides this one.
    shadowed: Vec<bool>,
    index: usize,
}

impl DictAccess<'_, '_> {
    /// Skip entries the visitor did not ask for, through `</dict>`.
    fn finish(&mut self) -> Result<(), Error> {
        while !self.closed {
            match self.de.sc.next()? {
                Some(tok) if tok.is_close("dict") => self.closed = true,
                Some(tok) if tok.starts("key") => {
                    self.de.sc.scalar_text(&tok)?;
                    skip_value(self.de.sc)?;
                }
                Some(tok) => return Err(self.de.sc.unexpected_tag(&tok, "inside <dict>")),
                None => return Err(self.de.sc.eof("inside <dict>")),
            }
        }
        Ok(())
    }
}

impl<'de> de::MapAccess<'de> for DictAccess<'_, 'de> {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>, Error>
    where
        K: DeserializeSeed<'de>,
    {
        if self.closed {
            return Ok(None);
        }
        loop {
            match self.de.sc.next()? {
                Some(tok) if tok.is_close("dict") => {
                    self.closed = true;
                    return Ok(None);
                }
                Some(tok) if tok.starts("key") => {
                    let (key, _) = self.de.sc.scalar_text(&tok)?;
                    let shadowed = self.shadowed.get(self.index).copied().unwrap_or(false);
                    self.index += 1;
                    if shadowed {
                        skip_value(self.de.sc)?;
                        continue;
                    }
                    return seed
                        .deserialize(BorrowedStrDeserializer::<Error>::new(key))
                        .map(Some)
                        .map_err(|err| self.de.sc.locate(err, tok.offset));
                }
                Some(tok) => return Err(self.de.sc.unexpected_tag(&tok, "inside <dict>")),
                None => return Err(self.de.sc.eof("inside <dict>")),
            }
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value, Error>
    where
        V: DeserializeSeed<'de>,
    {
        let at = self.de.sc.next_offset();
        seed.deserialize(self.de.reborrow())
            .map_err(|err| self.de.sc.locate(err, at))
    }
}

/// Streaming `SeqAccess` over the elements of an open `<array>`.
struct ArrayAccess<'a, 'de> {
    de: Deserializer<'a, 'de>,
    closed: bool,
}

impl ArrayAccess<'_, '_> {
    /// Require `</array>` after the last element the visitor took.
    fn finish(&mut self) -> Result<(), Error> {
        if self.closed {
            return Ok(());
        }
        match self.de.sc.next()? {
            Some(tok) if tok.is_close("array") => {
                self.closed = true;
                Ok(())
            }
            Some(tok) => Err(self.de.sc.unexpected_tag(&tok, "where </array> was expected")),
            None => Err(self.de.sc.eof("inside <array>")),
        }
    }
}

impl<'de> SeqAccess<'de> for ArrayAccess<'_, 'de> {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>, Error>
    where
        T: DeserializeSeed<'de>,
    {
        if self.closed {
            return Ok(None);
        }
        match self.de.sc.peek()? {
            Some(tok) if tok.is_close("array") => {
                self.de.sc.next()?;
                self.closed = true;
                Ok(None)
            }
            Some(tok) => seed
                .deserialize(self.de.reborrow())
                .map(Some)
                .map_err(|err| self.de.sc.locate(err, tok.offset)),
            None => Err(self.de.sc.eof("inside <array>")),
        }
    }
}

/// Access for `<dict/>` and `<array/>`.
struct EmptyAccess;

impl<'de> de::MapAccess<'de> for EmptyAccess {
    type Error = Error;

    fn next_key_seed<K>(&mut self, _seed: K) -> Result<Option<K::Value>, Error>
    where
        K: DeserializeSeed<'de>,
    {
        Ok(None)
    }

    fn next_value_seed<V>(&mut self, _seed: V) -> Result<V::Value, Error>
    where
        V: DeserializeSeed<'de>,
    {
        Err(Error::msg("no values in an empty <dict/>"))
    }

    fn size_hint(&self) -> Option<usize> {
        Some(0)
    }
}

impl<'de> SeqAccess<'de> for EmptyAccess {
    type Error = Error;

    fn next_element_seed<T>(&mut self, _seed: T) -> Result<Option<T::Value>, Error>
    where
        T: DeserializeSeed<'de>,
    {
        Ok(None)
    }

    fn size_hint(&self) -> Option<usize> {
        Some(0)
    }
}

/// `EnumAccess` for `<dict><key>Variant</key>payload</dict>`; the opening tag
/// and key are already consumed.
struct VariantDict<'a, 'de> {
    de: Deserializer<'a, 'de>,
    variant: &'de str,
}

impl VariantDict<'_, '_> {
    /// The enum dict holds exactly one entry.
    fn close(&mut self) -> Result<(), Error> {
        match self.de.sc.next()? {
            Some(tok) if tok.is_close("dict") => Ok(()),
            Some(tok) => Err(self
                .de
                .sc
                .unexpected_tag(&tok, "where </dict> was expected after the enum variant")),
            None => Err(self.de.sc.eof("inside <dict>")),
        }
    }
}

impl<'de, 'a> de::EnumAccess<'de> for VariantDict<'a, 'de> {
    type Error = Error;
    type Variant = Self;

    fn variant_seed<V>(self, seed: V) -> Result<(V::Value, Self), Error>
    where
        V: DeserializeSeed<'de>,
    {
        let v = seed.deserialize(BorrowedStrDeserializer::<Error>::new(self.variant))?;
        Ok((v, self))
    }
}

impl<'de> de::VariantAccess<'de> for VariantDict<'_, 'de> {
    type Error = Error;

    /// `<dict><key>Unit</key></dict>`; a payload, if present, is skipped.
    fn unit_variant(mut self) -> Result<(), Error> {
        if !matches!(self.de.sc.peek()?, Some(tok) if tok.is_close("dict")) {
            skip_value(self.de.sc)?;
        }
        self.close()
    }

    fn newtype_variant_seed<T>(mut self, seed: T) -> Result<T::Value, Error>
    where
        T: DeserializeSeed<'de>,
    {
        let value = seed.deserialize(self.de.reborrow())?;
        self.close()?;
        Ok(value)
    }

    fn tuple_variant<V>(mut self, len: usize, visitor: V) -> Result<V::Value, Error>
    where
        V: Visitor<'de>,
    {
        let value = self.de.reborrow().deserialize_tuple(len, visitor)?;
        self.close()?;
        Ok(value)
    }

    fn struct_variant<V>(mut self, fields: &'static [&'static str], visitor: V) -> Result<V::Value, Error>
    where
        V: Visitor<'de>,
    {
        let value = self.de.reborrow().deserialize_struct("", fields, visitor)?;
        self.close()?;
        Ok(value)
    }
}
