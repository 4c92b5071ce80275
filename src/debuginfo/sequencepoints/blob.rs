//! Portable PDB sequence point blob.
//!
//! # Layout
//!
//! ```text
//! header:          LocalSignature (compressed uint), InitialDocument (compressed uint)
//! document-record: 0, Document (compressed uint)                  - document changes
//! point-record:    δILOffset (compressed uint)
//!                  ΔLines    (compressed uint)                     - end_line - start_line
//!                  ΔColumns  (compressed uint if ΔLines == 0,
//!                             compressed signed int otherwise)     - end_col - start_col
//!                  δStartLine, δStartColumn                        - visible points only
//! ```
//!
//! The first point stores its IL offset absolutely; every later point stores the
//! (non-zero) distance to the previous one. The first visible point stores its start
//! line and column as unsigned values, later visible points as signed deltas to the
//! previous visible point. A hidden point is a point-record with `ΔLines = ΔColumns = 0`.
//!
//! A visible point cannot have zero width on one line in this encoding, so such
//! points are written one column wide.
//!
//! # References
//!
//! - [ECMA-335 II.23.2](https://www.ecma-international.org/publications-and-standards/standards/ecma-335/)
//! - [PortablePDB Spec](https://github.com/dotnet/runtime/blob/main/docs/design/specs/PortablePdb-Metadata.md#sequence-points)

use crate::{
    debuginfo::sequencepoints::{SequencePoint, SequencePoints, HIDDEN_LINE},
    file::{parser::Parser, writer::BlobWriter},
    Result,
};

/// Decoded sequence point blob.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SequencePointBlob {
    /// Row of the method's local signature, 0 if none
    pub local_signature: u32,
    /// The points, with absolute values
    pub points: SequencePoints,
}

fn signed_delta(current: u32, previous: u32) -> Result<i32> {
    i32::try_from(i64::from(current) - i64::from(previous))
        .map_err(|_| malformed_error!("Delta {} - {} out of range", current, previous))
}

/// Encode `points` (ascending by offset, public document ids) into a blob.
///
/// # Errors
///
/// Returns [`crate::Error::Malformed`] if offsets are not strictly increasing, an end
/// position precedes its start, or a value exceeds the compressed integer range.
pub fn encode_sequence_points(points: &[SequencePoint], local_signature: u32) -> Result<Vec<u8>> {
    let mut writer = BlobWriter::new();
    writer.write_compressed_uint(local_signature)?;

    let Some(first) = points.first() else {
        return Ok(writer.into_inner());
    };
    writer.write_compressed_uint(first.document)?;

    let mut document = first.document;
    let mut previous_offset: Option<u32> = None;
    let mut previous_start: Option<(u32, u32)> = None;

    for point in points {
        if point.document != document {
            writer.write_compressed_uint(0)?;
            writer.write_compressed_uint(point.document)?;
            document = point.document;
        }

        let offset_delta = match previous_offset {
            None => point.il_offset,
            Some(previous) => point
                .il_offset
                .checked_sub(previous)
                .filter(|delta| *delta > 0)
                .ok_or_else(|| {
                    malformed_error!(
                        "Sequence point offset 0x{:x} does not follow 0x{:x}",
                        point.il_offset,
                        previous
                    )
                })?,
        };
        writer.write_compressed_uint(offset_delta)?;
        previous_offset = Some(point.il_offset);

        if point.is_hidden {
            writer.write_compressed_uint(0)?;
            writer.write_compressed_uint(0)?;
            continue;
        }

        let line_delta = point.end_line.checked_sub(point.start_line).ok_or_else(|| {
            malformed_error!(
                "Sequence point end line {} precedes start line {}",
                point.end_line,
                point.start_line
            )
        })?;
        writer.write_compressed_uint(line_delta)?;
        if line_delta == 0 {
            let column_delta = point.end_col.checked_sub(point.start_col).ok_or_else(|| {
                malformed_error!(
                    "Sequence point end column {} precedes start column {}",
                    point.end_col,
                    point.start_col
                )
            })?;
            writer.write_compressed_uint(column_delta.max(1))?;
        } else {
            writer.write_compressed_int(signed_delta(point.end_col, point.start_col)?)?;
        }

        match previous_start {
            None => {
                writer.write_compressed_uint(point.start_line)?;
                writer.write_compressed_uint(point.start_col)?;
            }
            Some((line, column)) => {
                writer.write_compressed_int(signed_delta(point.start_line, line)?)?;
                writer.write_compressed_int(signed_delta(point.start_col, column)?)?;
            }
        }
        previous_start = Some((point.start_line, point.start_col));
    }

    Ok(writer.into_inner())
}

fn apply_delta(base: u32, delta: i64) -> Result<u32> {
    u32::try_from(i64::from(base) + delta)
        .map_err(|_| malformed_error!("Sequence point position {} + {} is invalid", base, delta))
}

/// Parses a Portable PDB sequence points blob.
///
/// An empty blob yields an empty result.
///
/// # Errors
///
/// Returns [`crate::Error::OutOfBounds`] for truncated data and
/// [`crate::Error::Malformed`] for values that do not describe valid positions.
pub fn parse_sequence_points(blob: &[u8]) -> Result<SequencePointBlob> {
    let mut parser = Parser::new(blob);
    if !parser.has_more_data() {
        return Ok(SequencePointBlob::default());
    }

    let local_signature = parser.read_compressed_uint()?;
    let mut points = Vec::new();
    if !parser.has_more_data() {
        return Ok(SequencePointBlob {
            local_signature,
            points: SequencePoints(points),
        });
    }

    let mut document = parser.read_compressed_uint()?;
    let mut il_offset = 0u32;
    let mut previous_start: Option<(u32, u32)> = None;

    while parser.has_more_data() {
        let offset_delta = parser.read_compressed_uint()?;
        if offset_delta == 0 && !points.is_empty() {
            document = parser.read_compressed_uint()?;
            continue;
        }
        il_offset = if points.is_empty() {
            offset_delta
        } else {
            il_offset
                .checked_add(offset_delta)
                .ok_or_else(|| malformed_error!("IL offset overflow"))?
        };

        let line_delta = parser.read_compressed_uint()?;
        let column_delta = if line_delta == 0 {
            i64::from(parser.read_compressed_uint()?)
        } else {
            i64::from(parser.read_compressed_int()?)
        };

        if line_delta == 0 && column_delta == 0 {
            points.push(SequencePoint::hidden(il_offset, document));
            continue;
        }

        let (start_line, start_col) = match previous_start {
            None => (parser.read_compressed_uint()?, parser.read_compressed_uint()?),
            Some((line, column)) => {
                let line = apply_delta(line, i64::from(parser.read_compressed_int()?))?;
                let column = apply_delta(column, i64::from(parser.read_compressed_int()?))?;
                (line, column)
            }
        };
        previous_start = Some((start_line, start_col));

        let end_line = apply_delta(start_line, i64::from(line_delta))?;
        let end_col = apply_delta(start_col, column_delta)?;

        points.push(SequencePoint {
            il_offset,
            document,
            start_line,
            start_col,
            end_line,
            end_col,
            is_hidden: start_line == HIDDEN_LINE,
        });
    }

    Ok(SequencePointBlob {
        local_signature,
        points: SequencePoints(points),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debuginfo::sequencepoints::SourceRange;

    fn visible(il_offset: u32, document: u32, lines: (u32, u32), cols: (u32, u32)) -> SequencePoint {
        SequencePoint::visible(
            il_offset,
            document,
            SourceRange {
                start_line: lines.0,
                start_column: cols.0,
                end_line: lines.1,
                end_column: cols.1,
            },
        )
    }

    #[test]
    fn parse_empty_blob() {
        let result = parse_sequence_points(&[]).unwrap();
        assert!(result.points.0.is_empty());
        assert_eq!(result.local_signature, 0);
    }

    #[test]
    fn encode_exact_bytes() {
        let points = [
            visible(0, 1, (1, 1), (1, 10)),
            SequencePoint::hidden(3, 1),
            visible(5, 1, (2, 3), (5, 2)),
        ];
        let blob = encode_sequence_points(&points, 0).unwrap();
        assert_eq!(
            blob,
            vec![
                0x00, 0x01, // header
                0x00, 0x00, 0x09, 0x01, 0x01, // first point, absolute
                0x03, 0x00, 0x00, // hidden
                0x02, 0x01, 0x7B, 0x02, 0x08, // Δ lines 1, Δ cols -3, start (+1, +4)
            ]
        );
    }

    #[test]
    fn parse_hidden_sequence_point() {
        let blob: &[u8] = &[0x05, 0x02, 0x00, 0x00, 0x00];
        let decoded = parse_sequence_points(blob).unwrap();
        assert_eq!(decoded.local_signature, 5);
        let sp = &decoded.points.0[0];
        assert!(sp.is_hidden);
        assert_eq!(sp.start_line, 0xFEEFEE);
        assert_eq!(sp.end_line, 0xFEEFEE);
        assert_eq!(sp.start_col, 0);
        assert_eq!(sp.document, 2);
    }

    #[test]
    fn document_changes_are_recorded() {
        let points = [
            visible(0, 1, (3, 5), (3, 6)),
            visible(2, 2, (10, 1), (10, 4)),
            SequencePoint::hidden(4, 2),
            visible(8, 1, (4, 5), (4, 20)),
        ];
        let blob = encode_sequence_points(&points, 7).unwrap();
        let decoded = parse_sequence_points(&blob).unwrap();
        assert_eq!(decoded.local_signature, 7);
        assert_eq!(decoded.points.0, points.to_vec());
    }

    #[test]
    fn zero_width_point_is_widened() {
        let blob = encode_sequence_points(&[visible(0, 1, (2, 2), (7, 7))], 0).unwrap();
        let decoded = parse_sequence_points(&blob).unwrap();
        assert_eq!(decoded.points.0[0].end_col, 8);
        assert!(!decoded.points.0[0].is_hidden);
    }

    #[test]
    fn rejects_unordered_offsets() {
        let points = [visible(4, 1, (1, 1), (1, 2)), visible(4, 1, (2, 1), (2, 2))];
        assert!(encode_sequence_points(&points, 0).is_err());
    }

    #[test]
    fn truncated_blob() {
        assert!(parse_sequence_points(&[0x00, 0x01, 0x00, 0x01]).is_err());
    }
}
