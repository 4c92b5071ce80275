//! Custom debug information blob writer.

use crate::{
    debuginfo::{
        customdebuginformation::types::{
            CustomDebugInfo, DynamicLocalBucket, HoistedScope, CDI_VERSION,
            DYNAMIC_FLAG_CAPACITY, DYNAMIC_NAME_CAPACITY,
        },
        locals::SlotInfo,
    },
    file::writer::BlobWriter,
    utils::to_u32,
    Result,
};

/// Marker byte introducing the syntax offset baseline of a slot map.
pub const SLOT_MAP_BASELINE_MARKER: u8 = 0xFF;

/// Bit set on a slot map kind byte when an ordinal follows.
pub const SLOT_MAP_HAS_ORDINAL: u8 = 0x80;

/// Encode `records` into one blob with the global header.
///
/// An empty record list produces an empty blob rather than a bare header.
///
/// # Errors
///
/// Returns an error if there are more than 255 records or a value does not fit its
/// field.
pub fn encode_custom_debug_info(records: &[CustomDebugInfo]) -> Result<Vec<u8>> {
    if records.is_empty() {
        return Ok(Vec::new());
    }
    let count = u8::try_from(records.len())
        .map_err(|_| malformed_error!("Too many custom debug records: {}", records.len()))?;

    let mut writer = BlobWriter::new();
    writer.write_le(CDI_VERSION);
    writer.write_le(count);
    writer.write_zeroes(2);

    for record in records {
        write_record(&mut writer, record)?;
    }
    Ok(writer.into_inner())
}

fn write_record(writer: &mut BlobWriter, record: &CustomDebugInfo) -> Result<()> {
    let payload = encode_payload(record)?;
    let padding = (4 - payload.len() % 4) % 4;
    let size = to_u32(8 + payload.len() + padding)?;

    writer.write_le(CDI_VERSION);
    writer.write_le(record.kind());
    writer.write_le(0u8);
    #[allow(clippy::cast_possible_truncation)]
    writer.write_le(padding as u8);
    writer.write_le(size);
    writer.write_bytes(&payload);
    writer.write_zeroes(padding);
    Ok(())
}

fn encode_payload(record: &CustomDebugInfo) -> Result<Vec<u8>> {
    let mut writer = BlobWriter::new();
    match record {
        CustomDebugInfo::UsingInfo { counts } => {
            let levels = u16::try_from(counts.len())
                .map_err(|_| malformed_error!("Too many import levels: {}", counts.len()))?;
            writer.write_le(levels);
            for count in counts {
                writer.write_le(*count);
            }
        }
        CustomDebugInfo::ForwardInfo { token } | CustomDebugInfo::ForwardToModuleInfo { token } => {
            writer.write_le(token.value());
        }
        CustomDebugInfo::StateMachineHoistedLocalScopes { scopes } => {
            writer.write_le(to_u32(scopes.len())?);
            for HoistedScope { start, end } in scopes {
                writer.write_le(*start);
                writer.write_le(*end);
            }
        }
        CustomDebugInfo::ForwardIterator { name } => {
            writer.write_utf16_terminated(name);
        }
        CustomDebugInfo::DynamicLocals { buckets } => {
            writer.write_le(to_u32(buckets.len())?);
            for bucket in buckets {
                write_dynamic_bucket(&mut writer, bucket)?;
            }
        }
        CustomDebugInfo::EncLocalSlotMap { slots } => {
            write_slot_map(&mut writer, slots)?;
        }
        CustomDebugInfo::Unknown { data, .. } => writer.write_bytes(data),
    }
    Ok(writer.into_inner())
}

fn write_dynamic_bucket(writer: &mut BlobWriter, bucket: &DynamicLocalBucket) -> Result<()> {
    let flags = bucket.flags.as_slice();
    if flags.len() > DYNAMIC_FLAG_CAPACITY {
        return Err(malformed_error!(
            "Dynamic flag count {} exceeds bucket capacity",
            flags.len()
        ));
    }

    for flag in flags {
        writer.write_le(u8::from(*flag));
    }
    writer.write_zeroes(DYNAMIC_FLAG_CAPACITY - flags.len());
    writer.write_le(to_u32(flags.len())?);
    writer.write_le(bucket.slot);
    writer.write_utf16_fixed(&bucket.name, DYNAMIC_NAME_CAPACITY);
    Ok(())
}

fn write_slot_map(writer: &mut BlobWriter, slots: &[SlotInfo]) -> Result<()> {
    let baseline = slots
        .iter()
        .filter_map(|slot| match slot {
            SlotInfo::Named { syntax_offset, .. } => Some(*syntax_offset),
            SlotInfo::Temp => None,
        })
        .min()
        .filter(|min| *min < 0)
        .unwrap_or(0);

    if baseline < 0 {
        writer.write_le(SLOT_MAP_BASELINE_MARKER);
        writer.write_compressed_uint(baseline.unsigned_abs())?;
    }

    for slot in slots {
        match slot {
            SlotInfo::Temp => writer.write_le(0u8),
            SlotInfo::Named {
                kind,
                syntax_offset,
                ordinal,
            } => {
                let code = kind
                    .code()
                    .ok_or_else(|| malformed_error!("Slot kind {:?} has no slot map code", kind))?;
                let mut lead = code + 1;
                if *ordinal > 0 {
                    lead |= SLOT_MAP_HAS_ORDINAL;
                }
                writer.write_le(lead);

                let relative = i64::from(*syntax_offset) - i64::from(baseline);
                let relative = u32::try_from(relative)
                    .map_err(|_| malformed_error!("Syntax offset {} out of range", syntax_offset))?;
                writer.write_compressed_uint(relative)?;
                if *ordinal > 0 {
                    writer.write_compressed_uint(*ordinal)?;
                }
            }
        }
    }
    Ok(())
}
