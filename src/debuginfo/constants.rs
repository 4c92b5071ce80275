//! Local constants: typed literal values and their blob encoding.
//!
//! # Blob layout
//!
//! One element type byte followed by the value, little endian:
//!
//! | Type      | Element | Payload                                        |
//! |-----------|---------|------------------------------------------------|
//! | bool      | `0x02`  | 1 byte                                         |
//! | char      | `0x03`  | 2 bytes                                        |
//! | integers  | `0x04`-`0x0B` | 1, 2, 4 or 8 bytes                       |
//! | float     | `0x0C`  | IEEE bits, 4 bytes                             |
//! | double    | `0x0D`  | IEEE bits, 8 bytes                             |
//! | string    | `0x0E`  | UTF-16, NUL terminated                         |
//! | decimal   | `0x11`  | four int32: lo, mid, hi, flags                 |
//! | null      | `0x12`  | type token (u32), then int32 0                 |
//!
//! Decimal flags carry the scale in bits 16-23 and the sign in bit 31.
//!
//! # Examples
//!
//! ```rust
//! use symscope::debuginfo::constants::{decode_constant, encode_constant, ConstantValue, DecimalValue};
//!
//! let value = ConstantValue::Decimal("1.5".parse::<DecimalValue>()?);
//! let blob = encode_constant(&value)?;
//! assert_eq!(decode_constant(&blob)?, value);
//! assert_eq!(value.display_value(), "1.5");
//! # Ok::<(), symscope::Error>(())
//! ```

use std::{fmt, str::FromStr};

use crate::{
    debuginfo::token::Token,
    file::{parser::Parser, writer::BlobWriter},
    utils::{format_general, utf16_len, DOUBLE_PRECISION, SINGLE_PRECISION},
    Error, Result,
};

const ELEMENT_TYPE_BOOLEAN: u8 = 0x02;
const ELEMENT_TYPE_CHAR: u8 = 0x03;
const ELEMENT_TYPE_I1: u8 = 0x04;
const ELEMENT_TYPE_U1: u8 = 0x05;
const ELEMENT_TYPE_I2: u8 = 0x06;
const ELEMENT_TYPE_U2: u8 = 0x07;
const ELEMENT_TYPE_I4: u8 = 0x08;
const ELEMENT_TYPE_U4: u8 = 0x09;
const ELEMENT_TYPE_I8: u8 = 0x0A;
const ELEMENT_TYPE_U8: u8 = 0x0B;
const ELEMENT_TYPE_R4: u8 = 0x0C;
const ELEMENT_TYPE_R8: u8 = 0x0D;
const ELEMENT_TYPE_STRING: u8 = 0x0E;
const ELEMENT_TYPE_VALUETYPE: u8 = 0x11;
const ELEMENT_TYPE_CLASS: u8 = 0x12;

/// Largest decimal scale.
pub const MAX_DECIMAL_SCALE: u8 = 28;

const MAX_DECIMAL_MANTISSA: u128 = (1u128 << 96) - 1;

/// A 96-bit decimal with scale and sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DecimalValue {
    /// Bits 0-31 of the mantissa
    pub lo: u32,
    /// Bits 32-63 of the mantissa
    pub mid: u32,
    /// Bits 64-95 of the mantissa
    pub hi: u32,
    /// Power of ten the mantissa is divided by (0-28)
    pub scale: u8,
    /// Sign
    pub negative: bool,
}

impl DecimalValue {
    /// Build from a mantissa and scale.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConstant`] if the mantissa exceeds 96 bits or the scale 28.
    #[allow(clippy::cast_possible_truncation)]
    pub fn new(mantissa: u128, scale: u8, negative: bool) -> Result<Self> {
        if mantissa > MAX_DECIMAL_MANTISSA {
            return Err(Error::InvalidConstant(format!(
                "Decimal mantissa {mantissa} exceeds 96 bits"
            )));
        }
        if scale > MAX_DECIMAL_SCALE {
            return Err(Error::InvalidConstant(format!(
                "Decimal scale {scale} exceeds {MAX_DECIMAL_SCALE}"
            )));
        }
        Ok(DecimalValue {
            lo: mantissa as u32,
            mid: (mantissa >> 32) as u32,
            hi: (mantissa >> 64) as u32,
            scale,
            negative,
        })
    }

    /// The 96-bit mantissa.
    #[must_use]
    pub fn mantissa(&self) -> u128 {
        u128::from(self.lo) | (u128::from(self.mid) << 32) | (u128::from(self.hi) << 64)
    }

    /// Flags word: scale in bits 16-23, sign in bit 31.
    #[must_use]
    pub fn flags(&self) -> u32 {
        (u32::from(self.scale) << 16) | (u32::from(self.negative) << 31)
    }

    /// The four int32 components as stored: lo, mid, hi, flags.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub fn to_parts(&self) -> [i32; 4] {
        [
            self.lo as i32,
            self.mid as i32,
            self.hi as i32,
            self.flags() as i32,
        ]
    }

    /// Rebuild from the four stored components.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConstant`] if reserved flag bits are set or the scale
    /// exceeds 28.
    #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
    pub fn from_parts(parts: [i32; 4]) -> Result<Self> {
        let flags = parts[3] as u32;
        if flags & 0x7F00_FFFF != 0 {
            return Err(Error::InvalidConstant(format!(
                "Decimal flags 0x{flags:08x} have reserved bits set"
            )));
        }
        let scale = ((flags >> 16) & 0xFF) as u8;
        if scale > MAX_DECIMAL_SCALE {
            return Err(Error::InvalidConstant(format!(
                "Decimal scale {scale} exceeds {MAX_DECIMAL_SCALE}"
            )));
        }
        Ok(DecimalValue {
            lo: parts[0] as u32,
            mid: parts[1] as u32,
            hi: parts[2] as u32,
            scale,
            negative: flags & 0x8000_0000 != 0,
        })
    }
}

impl FromStr for DecimalValue {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self> {
        let invalid = || Error::InvalidConstant(format!("'{text}' is not a decimal literal"));

        let (negative, digits) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text.strip_prefix('+').unwrap_or(text)),
        };
        let (integral, fraction) = digits.split_once('.').unwrap_or((digits, ""));
        if integral.is_empty() && fraction.is_empty() {
            return Err(invalid());
        }

        let mut mantissa: u128 = 0;
        for ch in integral.chars().chain(fraction.chars()) {
            let digit = ch.to_digit(10).ok_or_else(invalid)?;
            mantissa = mantissa
                .checked_mul(10)
                .and_then(|m| m.checked_add(u128::from(digit)))
                .filter(|m| *m <= MAX_DECIMAL_MANTISSA)
                .ok_or_else(|| Error::InvalidConstant(format!("'{text}' exceeds 96 bits")))?;
        }

        let scale = u8::try_from(fraction.len()).map_err(|_| invalid())?;
        DecimalValue::new(mantissa, scale, negative)
    }
}

impl fmt::Display for DecimalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mantissa = self.mantissa();
        let digits = mantissa.to_string();
        let scale = usize::from(self.scale);

        if self.negative && mantissa != 0 {
            f.write_str("-")?;
        }
        if scale == 0 {
            return f.write_str(&digits);
        }
        if digits.len() > scale {
            let (integral, fraction) = digits.split_at(digits.len() - scale);
            write!(f, "{integral}.{fraction}")
        } else {
            write!(f, "0.{}{digits}", "0".repeat(scale - digits.len()))
        }
    }
}

/// Typed literal value of a local constant.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstantValue {
    /// `bool`
    Boolean(bool),
    /// `char` (one UTF-16 unit)
    Char(u16),
    /// `sbyte`
    I1(i8),
    /// `byte`
    U1(u8),
    /// `short`
    I2(i16),
    /// `ushort`
    U2(u16),
    /// `int`
    I4(i32),
    /// `uint`
    U4(u32),
    /// `long`
    I8(i64),
    /// `ulong`
    U8(u64),
    /// `float`
    R4(f32),
    /// `double`
    R8(f64),
    /// `string`
    String(String),
    /// `decimal`
    Decimal(DecimalValue),
    /// `null` of a reference type
    Null {
        /// Token of the constant's static type
        type_token: Token,
    },
}

impl ConstantValue {
    /// Runtime type name shown in symbol dumps.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            ConstantValue::Boolean(_) => "Boolean",
            ConstantValue::Char(_) => "Char",
            ConstantValue::I1(_) => "SByte",
            ConstantValue::U1(_) => "Byte",
            ConstantValue::I2(_) => "Int16",
            ConstantValue::U2(_) => "UInt16",
            ConstantValue::I4(_) => "Int32",
            ConstantValue::U4(_) => "UInt32",
            ConstantValue::I8(_) => "Int64",
            ConstantValue::U8(_) => "UInt64",
            ConstantValue::R4(_) => "Single",
            ConstantValue::R8(_) => "Double",
            ConstantValue::String(_) => "String",
            ConstantValue::Decimal(_) => "Decimal",
            ConstantValue::Null { .. } => "Object",
        }
    }

    /// Value as shown in symbol dumps (culture invariant).
    #[must_use]
    pub fn display_value(&self) -> String {
        match self {
            ConstantValue::Boolean(value) => if *value { "True" } else { "False" }.to_string(),
            ConstantValue::Char(value) => value.to_string(),
            ConstantValue::I1(value) => value.to_string(),
            ConstantValue::U1(value) => value.to_string(),
            ConstantValue::I2(value) => value.to_string(),
            ConstantValue::U2(value) => value.to_string(),
            ConstantValue::I4(value) => value.to_string(),
            ConstantValue::U4(value) => value.to_string(),
            ConstantValue::I8(value) => value.to_string(),
            ConstantValue::U8(value) => value.to_string(),
            ConstantValue::R4(value) => format_general(f64::from(*value), SINGLE_PRECISION),
            ConstantValue::R8(value) => format_general(*value, DOUBLE_PRECISION),
            ConstantValue::String(value) => value.clone(),
            ConstantValue::Decimal(value) => value.to_string(),
            ConstantValue::Null { .. } => "null".to_string(),
        }
    }

    /// Length in UTF-16 units for strings, `None` for other values.
    #[must_use]
    pub fn string_len(&self) -> Option<usize> {
        match self {
            ConstantValue::String(value) => Some(utf16_len(value)),
            _ => None,
        }
    }
}

/// A constant declared in a scope.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantRecord {
    /// Constant name
    pub name: String,
    /// Literal value
    pub value: ConstantValue,
    /// Declared type shown in dumps; defaults to the value's runtime type
    pub declared_type: Option<String>,
    /// Dynamic flags when the declared type involves `dynamic`
    pub dynamic_flags: Option<crate::debuginfo::dynamic::DynamicFlags>,
}

impl ConstantRecord {
    /// Constant with the value's own type.
    pub fn new(name: impl Into<String>, value: ConstantValue) -> Self {
        ConstantRecord {
            name: name.into(),
            value,
            declared_type: None,
            dynamic_flags: None,
        }
    }

    /// Override the declared type shown in dumps.
    #[must_use]
    pub fn with_declared_type(mut self, declared_type: impl Into<String>) -> Self {
        self.declared_type = Some(declared_type.into());
        self
    }

    /// Attach dynamic flags.
    #[must_use]
    pub fn with_dynamic_flags(mut self, flags: crate::debuginfo::dynamic::DynamicFlags) -> Self {
        self.dynamic_flags = Some(flags);
        self
    }

    /// Type name shown in dumps.
    #[must_use]
    pub fn type_name(&self) -> &str {
        self.declared_type
            .as_deref()
            .unwrap_or_else(|| self.value.type_name())
    }

    /// Returns `true` for strings longer than `max_len` UTF-16 units.
    #[must_use]
    pub fn is_oversized(&self, max_len: usize) -> bool {
        self.value.string_len().is_some_and(|len| len > max_len)
    }
}

/// Encode a constant value blob.
///
/// # Errors
///
/// Currently infallible for well-formed values; the `Result` covers future value kinds.
pub fn encode_constant(value: &ConstantValue) -> Result<Vec<u8>> {
    let mut writer = BlobWriter::new();
    match value {
        ConstantValue::Boolean(v) => {
            writer.write_le(ELEMENT_TYPE_BOOLEAN);
            writer.write_le(u8::from(*v));
        }
        ConstantValue::Char(v) => {
            writer.write_le(ELEMENT_TYPE_CHAR);
            writer.write_le(*v);
        }
        ConstantValue::I1(v) => {
            writer.write_le(ELEMENT_TYPE_I1);
            writer.write_le(*v);
        }
        ConstantValue::U1(v) => {
            writer.write_le(ELEMENT_TYPE_U1);
            writer.write_le(*v);
        }
        ConstantValue::I2(v) => {
            writer.write_le(ELEMENT_TYPE_I2);
            writer.write_le(*v);
        }
        ConstantValue::U2(v) => {
            writer.write_le(ELEMENT_TYPE_U2);
            writer.write_le(*v);
        }
        ConstantValue::I4(v) => {
            writer.write_le(ELEMENT_TYPE_I4);
            writer.write_le(*v);
        }
        ConstantValue::U4(v) => {
            writer.write_le(ELEMENT_TYPE_U4);
            writer.write_le(*v);
        }
        ConstantValue::I8(v) => {
            writer.write_le(ELEMENT_TYPE_I8);
            writer.write_le(*v);
        }
        ConstantValue::U8(v) => {
            writer.write_le(ELEMENT_TYPE_U8);
            writer.write_le(*v);
        }
        ConstantValue::R4(v) => {
            writer.write_le(ELEMENT_TYPE_R4);
            writer.write_le(*v);
        }
        ConstantValue::R8(v) => {
            writer.write_le(ELEMENT_TYPE_R8);
            writer.write_le(*v);
        }
        ConstantValue::String(v) => {
            writer.write_le(ELEMENT_TYPE_STRING);
            writer.write_utf16_terminated(v);
        }
        ConstantValue::Decimal(v) => {
            writer.write_le(ELEMENT_TYPE_VALUETYPE);
            for part in v.to_parts() {
                writer.write_le(part);
            }
        }
        ConstantValue::Null { type_token } => {
            writer.write_le(ELEMENT_TYPE_CLASS);
            writer.write_le(type_token.value());
            writer.write_le(0i32);
        }
    }
    Ok(writer.into_inner())
}

/// Decode a constant value blob.
///
/// # Errors
///
/// Returns [`Error::OutOfBounds`] for truncated data, [`Error::InvalidConstant`] for an
/// unknown element type or invalid decimal.
pub fn decode_constant(blob: &[u8]) -> Result<ConstantValue> {
    let mut parser = Parser::new(blob);
    let element = parser.read_le::<u8>()?;

    let value = match element {
        ELEMENT_TYPE_BOOLEAN => ConstantValue::Boolean(parser.read_le::<u8>()? != 0),
        ELEMENT_TYPE_CHAR => ConstantValue::Char(parser.read_le()?),
        ELEMENT_TYPE_I1 => ConstantValue::I1(parser.read_le()?),
        ELEMENT_TYPE_U1 => ConstantValue::U1(parser.read_le()?),
        ELEMENT_TYPE_I2 => ConstantValue::I2(parser.read_le()?),
        ELEMENT_TYPE_U2 => ConstantValue::U2(parser.read_le()?),
        ELEMENT_TYPE_I4 => ConstantValue::I4(parser.read_le()?),
        ELEMENT_TYPE_U4 => ConstantValue::U4(parser.read_le()?),
        ELEMENT_TYPE_I8 => ConstantValue::I8(parser.read_le()?),
        ELEMENT_TYPE_U8 => ConstantValue::U8(parser.read_le()?),
        ELEMENT_TYPE_R4 => ConstantValue::R4(parser.read_le()?),
        ELEMENT_TYPE_R8 => ConstantValue::R8(parser.read_le()?),
        ELEMENT_TYPE_STRING => ConstantValue::String(parser.read_utf16_terminated()?),
        ELEMENT_TYPE_VALUETYPE => {
            let parts = [
                parser.read_le::<i32>()?,
                parser.read_le::<i32>()?,
                parser.read_le::<i32>()?,
                parser.read_le::<i32>()?,
            ];
            ConstantValue::Decimal(DecimalValue::from_parts(parts)?)
        }
        ELEMENT_TYPE_CLASS => {
            let type_token = Token::new(parser.read_le::<u32>()?);
            let sentinel = parser.read_le::<i32>()?;
            if sentinel != 0 {
                return Err(Error::InvalidConstant(format!(
                    "Null constant carries value {sentinel}"
                )));
            }
            ConstantValue::Null { type_token }
        }
        other => {
            return Err(Error::InvalidConstant(format!(
                "Unknown constant element type 0x{other:02x}"
            )))
        }
    };

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debuginfo::token::TABLE_TYPE_REF;

    #[test]
    fn decimal_parts() {
        let value: DecimalValue = "1.5".parse().unwrap();
        assert_eq!(value.mantissa(), 15);
        assert_eq!(value.scale, 1);
        assert_eq!(value.to_parts(), [15, 0, 0, 0x0001_0000]);

        let negative: DecimalValue = "-0.001".parse().unwrap();
        assert_eq!(negative.to_parts()[3] as u32, 0x8003_0000);
        assert_eq!(negative.to_string(), "-0.001");

        let max: DecimalValue = "79228162514264337593543950335".parse().unwrap();
        assert_eq!(max.to_parts(), [-1, -1, -1, 0]);
        assert!("79228162514264337593543950336".parse::<DecimalValue>().is_err());
    }

    #[test]
    fn decimal_display_keeps_scale() {
        assert_eq!("1.50".parse::<DecimalValue>().unwrap().to_string(), "1.50");
        assert_eq!("0".parse::<DecimalValue>().unwrap().to_string(), "0");
        assert_eq!(".25".parse::<DecimalValue>().unwrap().to_string(), "0.25");
        assert!("1.2.3".parse::<DecimalValue>().is_err());
        assert!("".parse::<DecimalValue>().is_err());
        assert!("-".parse::<DecimalValue>().is_err());
    }

    #[test]
    fn decimal_from_parts_validation() {
        assert!(DecimalValue::from_parts([1, 0, 0, 0x0001_0001]).is_err());
        assert!(DecimalValue::from_parts([1, 0, 0, 29 << 16]).is_err());
        let value = DecimalValue::from_parts([15, 0, 0, 0x0001_0000]).unwrap();
        assert_eq!(value.to_string(), "1.5");
    }

    #[test]
    fn double_max_round_trip() {
        let value = ConstantValue::R8(f64::MAX);
        let decoded = decode_constant(&encode_constant(&value).unwrap()).unwrap();
        assert_eq!(decoded, value);
        assert_eq!(decoded.display_value(), "1.79769313486232E+308");
        assert_eq!(decoded.type_name(), "Double");
    }

    #[test]
    fn null_constant_blob() {
        let token = Token::from_parts(TABLE_TYPE_REF, 2);
        let blob = encode_constant(&ConstantValue::Null { type_token: token }).unwrap();
        assert_eq!(blob, vec![0x12, 0x02, 0x00, 0x00, 0x01, 0, 0, 0, 0]);
        assert_eq!(
            decode_constant(&blob).unwrap(),
            ConstantValue::Null { type_token: token }
        );
    }

    #[test]
    fn string_constants() {
        let value = ConstantValue::String("h\u{e9}llo".to_string());
        let blob = encode_constant(&value).unwrap();
        assert_eq!(blob.len(), 1 + 6 * 2);
        assert_eq!(decode_constant(&blob).unwrap(), value);

        let record = ConstantRecord::new("s", ConstantValue::String("x".repeat(10)));
        assert!(!record.is_oversized(10));
        assert!(record.is_oversized(9));
        assert!(!ConstantRecord::new("i", ConstantValue::I4(1)).is_oversized(0));
    }

    #[test]
    fn declared_type_override() {
        let record = ConstantRecord::new("o", ConstantValue::Null {
            type_token: Token::default(),
        })
        .with_declared_type("String");
        assert_eq!(record.type_name(), "String");
        assert_eq!(record.value.display_value(), "null");
    }

    #[test]
    fn unknown_element_type() {
        assert!(matches!(
            decode_constant(&[0x1C]),
            Err(Error::InvalidConstant(_))
        ));
        assert!(matches!(decode_constant(&[0x08, 0x01]), Err(Error::OutOfBounds)));
    }
}
