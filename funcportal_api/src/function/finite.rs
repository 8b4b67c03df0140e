// SPDX-FileCopyrightText: © 2023 Technical University of Munich, Chair of Connected Mobility
// SPDX-License-Identifier: MIT
use serde::ser::{self, Error as _, Serialize};

/// Walks a serializable value and fails on the first NaN or infinite float.
///
/// serde_json silently encodes those as `null`, which would turn an
/// unrepresentable output into a successful result.
#[derive(Clone, Copy)]
pub(crate) struct FiniteFloats;

type Result = std::result::Result<(), serde_json::Error>;

pub(crate) fn check<T: ?Sized + Serialize>(value: &T) -> Result {
    value.serialize(FiniteFloats)
}

fn float(value: f64) -> Result {
    if value.is_finite() {
        Ok(())
    } else {
        Err(serde_json::Error::custom(format!("{} cannot be represented in JSON", value)))
    }
}

impl ser::Serializer for FiniteFloats {
    type Ok = ();
    type Error = serde_json::Error;
    type SerializeSeq = Self;
    type SerializeTuple = Self;
    type SerializeTupleStruct = Self;
    type SerializeTupleVariant = Self;
    type SerializeMap = Self;
    type SerializeStruct = Self;
    type SerializeStructVariant = Self;

    fn serialize_bool(self, _: bool) -> Result {
        Ok(())
    }

    fn serialize_i8(self, _: i8) -> Result {
        Ok(())
    }

    fn serialize_i16(self, _: i16) -> Result {
        Ok(())
    }

    fn serialize_i32(self, _: i32) -> Result {
        Ok(())
    }

    fn serialize_i64(self, _: i64) -> Result {
        Ok(())
    }

    fn serialize_i128(self, _: i128) -> Result {
        Ok(())
    }

    fn serialize_u8(self, _: u8) -> Result {
        Ok(())
    }

    fn serialize_u16(self, _: u16) -> Result {
        Ok(())
    }

    fn serialize_u32(self, _: u32) -> Result {
        Ok(())
    }

    fn serialize_u64(self, _: u64) -> Result {
        Ok(())
    }

    fn serialize_u128(self, _: u128) -> Result {
        Ok(())
    }

    fn serialize_f32(self, value: f32) -> Result {
        float(value as f64)
    }

    fn serialize_f64(self, value: f64) -> Result {
        float(value)
    }

    fn serialize_char(self, _: char) -> Result {
        Ok(())
    }

    fn serialize_str(self, _: &str) -> Result {
        Ok(())
    }

    fn serialize_bytes(self, _: &[u8]) -> Result {
        Ok(())
    }

    fn serialize_none(self) -> Result {
        Ok(())
    }

    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> Result {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result {
        Ok(())
    }

    fn serialize_unit_struct(self, _: &'static str) -> Result {
        Ok(())
    }

    fn serialize_unit_variant(self, _: &'static str, _: u32, _: &'static str) -> Result {
        Ok(())
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(self, _: &'static str, value: &T) -> Result {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(self, _: &'static str, _: u32, _: &'static str, value: &T) -> Result {
        value.serialize(self)
    }

    fn serialize_seq(self, _: Option<usize>) -> std::result::Result<Self, serde_json::Error> {
        Ok(self)
    }

    fn serialize_tuple(self, _: usize) -> std::result::Result<Self, serde_json::Error> {
        Ok(self)
    }

    fn serialize_tuple_struct(self, _: &'static str, _: usize) -> std::result::Result<Self, serde_json::Error> {
        Ok(self)
    }

    fn serialize_tuple_variant(self, _: &'static str, _: u32, _: &'static str, _: usize) -> std::result::Result<Self, serde_json::Error> {
        Ok(self)
    }

    fn serialize_map(self, _: Option<usize>) -> std::result::Result<Self, serde_json::Error> {
        Ok(self)
    }

    fn serialize_struct(self, _: &'static str, _: usize) -> std::result::Result<Self, serde_json::Error> {
        Ok(self)
    }

    fn serialize_struct_variant(self, _: &'static str, _: u32, _: &'static str, _: usize) -> std::result::Result<Self, serde_json::Error> {
        Ok(self)
    }
}

impl ser::SerializeSeq for FiniteFloats {
    type Ok = ();
    type Error = serde_json::Error;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result {
        check(value)
    }

    fn end(self) -> Result {
        Ok(())
    }
}

impl ser::SerializeTuple for FiniteFloats {
    type Ok = ();
    type Error = serde_json::Error;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result {
        check(value)
    }

    fn end(self) -> Result {
        Ok(())
    }
}

impl ser::SerializeTupleStruct for FiniteFloats {
    type Ok = ();
    type Error = serde_json::Error;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result {
        check(value)
    }

    fn end(self) -> Result {
        Ok(())
    }
}

impl ser::SerializeTupleVariant for FiniteFloats {
    type Ok = ();
    type Error = serde_json::Error;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result {
        check(value)
    }

    fn end(self) -> Result {
        Ok(())
    }
}

impl ser::SerializeMap for FiniteFloats {
    type Ok = ();
    type Error = serde_json::Error;

    fn serialize_key<T: ?Sized + Serialize>(&mut self, key: &T) -> Result {
        check(key)
    }

    fn serialize_value<T: ?Sized + Serialize>(&mut self, value: &T) -> Result {
        check(value)
    }

    fn end(self) -> Result {
        Ok(())
    }
}

impl ser::SerializeStruct for FiniteFloats {
    type Ok = ();
    type Error = serde_json::Error;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, _: &'static str, value: &T) -> Result {
        check(value)
    }

    fn end(self) -> Result {
        Ok(())
    }
}

impl ser::SerializeStructVariant for FiniteFloats {
    type Ok = ();
    type Error = serde_json::Error;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, _: &'static str, value: &T) -> Result {
        check(value)
    }

    fn end(self) -> Result {
        Ok(())
    }
}
