//! Custom debug information blob reader.
//!
//! Decodes the blobs produced by [`super::encode_custom_debug_info`] back into records.
//! Used by the XML projection and by tooling that inspects emitted symbols.

use crate::{
    debuginfo::{
        customdebuginformation::{
            encoder::{SLOT_MAP_BASELINE_MARKER, SLOT_MAP_HAS_ORDINAL},
            types::{
                CustomDebugInfo, CustomDebugKind, DynamicLocalBucket, HoistedScope, CDI_VERSION,
                DYNAMIC_FLAG_CAPACITY, DYNAMIC_NAME_CAPACITY,
            },
        },
        dynamic::DynamicFlags,
        locals::{LocalSlotKind, SlotInfo},
        token::Token,
    },
    file::parser::Parser,
    Result,
};

/// Reader over one custom debug information blob.
pub struct CustomDebugParser<'a> {
    parser: Parser<'a>,
}

impl<'a> CustomDebugParser<'a> {
    /// Create a reader over `data`.
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        CustomDebugParser {
            parser: Parser::new(data),
        }
    }

    /// Read the global header and every record.
    ///
    /// # Errors
    /// Returns an error on a version mismatch, a record size that does not cover its
    /// header, or a truncated payload.
    pub fn parse_records(&mut self) -> Result<Vec<CustomDebugInfo>> {
        let version = self.parser.read_le::<u8>()?;
        if version != CDI_VERSION {
            return Err(malformed_error!(
                "Unsupported custom debug info version {}",
                version
            ));
        }
        let count = self.parser.read_le::<u8>()?;
        self.parser.advance_by(2)?;

        let mut records = Vec::with_capacity(count as usize);
        for _ in 0..count {
            records.push(self.parse_record()?);
        }
        Ok(records)
    }

    fn parse_record(&mut self) -> Result<CustomDebugInfo> {
        let version = self.parser.read_le::<u8>()?;
        if version != CDI_VERSION {
            return Err(malformed_error!(
                "Unsupported custom debug record version {}",
                version
            ));
        }
        let kind = self.parser.read_le::<u8>()?;
        self.parser.advance_by(1)?;
        let padding = self.parser.read_le::<u8>()? as usize;
        let size = self.parser.read_le::<u32>()? as usize;
        if size < 8 + padding {
            return Err(malformed_error!("Custom debug record size {} too small", size));
        }

        let payload = self.parser.read_bytes(size - 8)?;
        let payload = &payload[..payload.len() - padding];
        parse_payload(kind, payload)
    }
}

fn parse_payload(kind: u8, payload: &[u8]) -> Result<CustomDebugInfo> {
    let mut parser = Parser::new(payload);
    let Some(known) = CustomDebugKind::from_u8(kind) else {
        return Ok(CustomDebugInfo::Unknown {
            kind,
            data: payload.to_vec(),
        });
    };

    let record = match known {
        CustomDebugKind::UsingInfo => {
            let levels = parser.read_le::<u16>()?;
            let mut counts = Vec::with_capacity(levels as usize);
            for _ in 0..levels {
                counts.push(parser.read_le::<u16>()?);
            }
            CustomDebugInfo::UsingInfo { counts }
        }
        CustomDebugKind::ForwardInfo => CustomDebugInfo::ForwardInfo {
            token: Token::new(parser.read_le::<u32>()?),
        },
        CustomDebugKind::ForwardToModuleInfo => CustomDebugInfo::ForwardToModuleInfo {
            token: Token::new(parser.read_le::<u32>()?),
        },
        CustomDebugKind::StateMachineHoistedLocalScopes => {
            let count = parser.read_le::<u32>()?;
            let mut scopes = Vec::new();
            for _ in 0..count {
                let start = parser.read_le::<u32>()?;
                let end = parser.read_le::<u32>()?;
                scopes.push(HoistedScope { start, end });
            }
            CustomDebugInfo::StateMachineHoistedLocalScopes { scopes }
        }
        CustomDebugKind::ForwardIterator => CustomDebugInfo::ForwardIterator {
            name: parser.read_utf16_terminated()?,
        },
        CustomDebugKind::DynamicLocals => {
            let count = parser.read_le::<u32>()?;
            let mut buckets = Vec::new();
            for _ in 0..count {
                buckets.push(parse_dynamic_bucket(&mut parser)?);
            }
            CustomDebugInfo::DynamicLocals { buckets }
        }
        CustomDebugKind::EncLocalSlotMap => CustomDebugInfo::EncLocalSlotMap {
            slots: parse_slot_map(&mut parser)?,
        },
    };
    Ok(record)
}

fn parse_dynamic_bucket(parser: &mut Parser<'_>) -> Result<DynamicLocalBucket> {
    let raw = parser.read_bytes(DYNAMIC_FLAG_CAPACITY)?;
    let flag_count = parser.read_le::<u32>()? as usize;
    if flag_count > DYNAMIC_FLAG_CAPACITY {
        return Err(malformed_error!("Dynamic flag count {} too large", flag_count));
    }
    let slot = parser.read_le::<u32>()?;
    let name = parser.read_utf16_fixed(DYNAMIC_NAME_CAPACITY)?;

    Ok(DynamicLocalBucket {
        flags: DynamicFlags::new(raw[..flag_count].iter().map(|b| *b != 0).collect()),
        slot,
        name,
    })
}

fn parse_slot_map(parser: &mut Parser<'_>) -> Result<Vec<SlotInfo>> {
    let mut slots = Vec::new();
    let mut baseline = 0i64;
    let mut first = true;

    while parser.has_more_data() {
        let lead = parser.read_le::<u8>()?;
        if first && lead == SLOT_MAP_BASELINE_MARKER {
            baseline = -i64::from(parser.read_compressed_uint()?);
            first = false;
            continue;
        }
        first = false;

        if lead == 0 {
            slots.push(SlotInfo::Temp);
            continue;
        }

        let kind = (lead & !SLOT_MAP_HAS_ORDINAL)
            .checked_sub(1)
            .and_then(LocalSlotKind::from_code)
            .ok_or_else(|| malformed_error!("Unknown slot map entry 0x{:02X}", lead))?;
        let relative = i64::from(parser.read_compressed_uint()?);
        let syntax_offset = i32::try_from(relative + baseline)
            .map_err(|_| malformed_error!("Syntax offset out of range"))?;
        let ordinal = if lead & SLOT_MAP_HAS_ORDINAL != 0 {
            parser.read_compressed_uint()?
        } else {
            0
        };

        slots.push(SlotInfo::Named {
            kind,
            syntax_offset,
            ordinal,
        });
    }
    Ok(slots)
}

/// Decode a custom debug information blob.
///
/// An empty blob decodes to no records.
///
/// # Errors
/// Returns an error if the blob is truncated or malformed.
pub fn parse_custom_debug_info(data: &[u8]) -> Result<Vec<CustomDebugInfo>> {
    if data.is_empty() {
        return Ok(Vec::new());
    }

    let mut parser = CustomDebugParser::new(data);
    parser.parse_records()
}
