//! Physical symbol writer seam.
//!
//! [`SymbolWriter`] is what a container format (a classic PDB writer process, a portable
//! PDB builder, ...) implements. [`BlobSymbolWriter`] is the in-memory default: it
//! buffers everything and only hands out the container after a successful
//! [`SymbolWriter::commit`].
//!
//! # Container layout
//!
//! ```text
//! Container ::= magic:u32("SYMS") version:u16(2) reserved:u16
//!               document_count:cu Document* method_count:cu Method*
//! Document  ::= name:str language:guid vendor:guid type:guid
//!               algorithm:guid(zero when absent) checksum:bytes
//! Method    ::= token:u32 sequence_points:bytes custom_debug_info:bytes
//!               import_count:cu import:str* extern_count:cu extern:str* scopes:bytes
//! Scope     ::= start:u32 end:u32 local_count:cu Local* constant_count:cu Constant*
//!               child_count:cu Scope*
//! Local     ::= slot:u32 attributes:u32 name:str
//! Constant  ::= name:str value:bytes
//! ```
//!
//! `cu` is a compressed unsigned integer, `str` and `bytes` are prefixed with their
//! compressed byte length, strings are UTF-8.
//!
//! Imports are the method's flattened import list as legacy strings (`USystem`,
//! `AX UN`, `XLib`, ...), innermost level first, so the counts of the using record
//! index into them. Extern infos are `Z<alias> <assembly>` strings. Both lists are
//! empty for a method that forwards its imports.

use crate::{
    debuginfo::{
        constants::encode_constant,
        customdebuginformation::encode_custom_debug_info,
        importscope::{ExternInfo, ImportRecord},
        scope::Scope,
        sequencepoints::encode_sequence_points,
    },
    emit::document::{FileRecord, MethodRecord},
    file::writer::BlobWriter,
    utils::to_u32,
    Result,
};

/// Magic number at the start of a container (`"SYMS"` little endian).
pub const CONTAINER_MAGIC: u32 = 0x534D_5953;

/// Container format version.
pub const CONTAINER_VERSION: u16 = 2;

/// Sink for the physical symbol file.
///
/// Documents are defined before methods; `commit` is called exactly once after
/// everything was accepted. An error from any call aborts the emit.
pub trait SymbolWriter {
    /// Accept one document.
    ///
    /// # Errors
    /// Implementation defined.
    fn define_document(&mut self, file: &FileRecord) -> Result<()>;

    /// Accept one method.
    ///
    /// # Errors
    /// Implementation defined.
    fn define_method(&mut self, method: &MethodRecord) -> Result<()>;

    /// Finish the container.
    ///
    /// # Errors
    /// Implementation defined.
    fn commit(&mut self) -> Result<()>;
}

/// In-memory container writer.
#[derive(Debug, Default)]
pub struct BlobSymbolWriter {
    documents: Vec<Vec<u8>>,
    methods: Vec<Vec<u8>>,
    output: Option<Vec<u8>>,
}

impl BlobSymbolWriter {
    /// Create an empty writer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The container, available only after a successful commit.
    #[must_use]
    pub fn output(&self) -> Option<&[u8]> {
        self.output.as_deref()
    }

    /// Take the container.
    #[must_use]
    pub fn into_output(self) -> Option<Vec<u8>> {
        self.output
    }
}

fn write_str(writer: &mut BlobWriter, value: &str) -> Result<()> {
    write_bytes(writer, value.as_bytes())
}

fn write_bytes(writer: &mut BlobWriter, value: &[u8]) -> Result<()> {
    writer.write_compressed_uint(to_u32(value.len())?)?;
    writer.write_bytes(value);
    Ok(())
}

fn write_strings<I>(writer: &mut BlobWriter, values: I) -> Result<()>
where
    I: ExactSizeIterator<Item = String>,
{
    writer.write_compressed_uint(to_u32(values.len())?)?;
    for value in values {
        write_str(writer, &value)?;
    }
    Ok(())
}

fn write_scope(writer: &mut BlobWriter, scope: &Scope) -> Result<()> {
    writer.write_le(scope.start_offset);
    writer.write_le(scope.end_offset);

    writer.write_compressed_uint(to_u32(scope.locals.len())?)?;
    for local in &scope.locals {
        writer.write_le(local.slot);
        writer.write_le(local.attributes.bits());
        write_str(writer, &local.name)?;
    }

    writer.write_compressed_uint(to_u32(scope.constants.len())?)?;
    for constant in &scope.constants {
        write_str(writer, &constant.name)?;
        write_bytes(writer, &encode_constant(&constant.value)?)?;
    }

    writer.write_compressed_uint(to_u32(scope.children.len())?)?;
    for child in &scope.children {
        write_scope(writer, child)?;
    }
    Ok(())
}

impl SymbolWriter for BlobSymbolWriter {
    fn define_document(&mut self, file: &FileRecord) -> Result<()> {
        let mut writer = BlobWriter::new();
        write_str(&mut writer, &file.name)?;
        writer.write_bytes(&file.language.to_bytes());
        writer.write_bytes(&file.language_vendor.to_bytes());
        writer.write_bytes(&file.document_type.to_bytes());
        match &file.checksum {
            Some(checksum) => {
                writer.write_bytes(&checksum.algorithm.to_bytes());
                write_bytes(&mut writer, &checksum.bytes)?;
            }
            None => {
                writer.write_zeroes(16);
                write_bytes(&mut writer, &[])?;
            }
        }
        self.documents.push(writer.into_inner());
        Ok(())
    }

    fn define_method(&mut self, method: &MethodRecord) -> Result<()> {
        let mut writer = BlobWriter::new();
        writer.write_le(method.token.value());
        write_bytes(&mut writer, &encode_sequence_points(&method.sequence_points, 0)?)?;
        write_bytes(
            &mut writer,
            &encode_custom_debug_info(&method.custom_debug_info)?,
        )?;
        write_strings(&mut writer, method.imports.iter().map(ImportRecord::to_legacy_string))?;
        write_strings(&mut writer, method.extern_infos.iter().map(ExternInfo::to_legacy_string))?;

        let mut scopes = BlobWriter::new();
        write_scope(&mut scopes, &method.root_scope)?;
        write_bytes(&mut writer, scopes.as_slice())?;

        self.methods.push(writer.into_inner());
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        let mut writer = BlobWriter::new();
        writer.write_le(CONTAINER_MAGIC);
        writer.write_le(CONTAINER_VERSION);
        writer.write_le(0u16);

        writer.write_compressed_uint(to_u32(self.documents.len())?)?;
        for document in &self.documents {
            writer.write_bytes(document);
        }
        writer.write_compressed_uint(to_u32(self.methods.len())?)?;
        for method in &self.methods {
            writer.write_bytes(method);
        }

        tracing::debug!(bytes = writer.len(), "symbol container committed");
        self.output = Some(writer.into_inner());
        Ok(())
    }
}
