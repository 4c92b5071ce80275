//! The emitted debug information document.

use uguid::Guid;

use crate::{
    debuginfo::{
        checksum::DocumentChecksum,
        customdebuginformation::CustomDebugInfo,
        importscope::{ExternInfo, ImportRecord},
        scope::Scope,
        sequencepoints::SequencePoint,
        token::Token,
    },
    emit::{
        writer::{BlobSymbolWriter, SymbolWriter},
        xml,
    },
    Error, Result,
};

/// One source document of the output, with its public id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// 1-based id in first-reference order
    pub id: u32,
    /// Normalized path
    pub name: String,
    /// Language GUID
    pub language: Guid,
    /// Language vendor GUID
    pub language_vendor: Guid,
    /// Document type GUID
    pub document_type: Guid,
    /// Checksum, if known
    pub checksum: Option<DocumentChecksum>,
}

/// One method of the output.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodRecord {
    /// Declaring type
    pub containing_type: String,
    /// Method name
    pub name: String,
    /// Parameter names
    pub parameter_names: Vec<String>,
    /// MethodDef token
    pub token: Token,
    /// Custom debug records in emission order
    pub custom_debug_info: Vec<CustomDebugInfo>,
    /// Sequence points; `document` holds the [`FileRecord::id`], 0 when unknown
    pub sequence_points: Vec<SequencePoint>,
    /// Root scope
    pub root_scope: Scope,
    /// Flattened imports written for this method; empty when forwarded
    pub imports: Vec<ImportRecord>,
    /// Trailing extern alias targets
    pub extern_infos: Vec<ExternInfo>,
}

impl MethodRecord {
    /// Returns `true` if the method forwards its imports to another method.
    #[must_use]
    pub fn forwards(&self) -> bool {
        self.custom_debug_info.iter().any(|record| {
            matches!(
                record,
                CustomDebugInfo::ForwardInfo { .. } | CustomDebugInfo::ForwardToModuleInfo { .. }
            )
        })
    }
}

/// Per-compilation debug information.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DebugInfoDocument {
    /// Documents in id order
    pub files: Vec<FileRecord>,
    /// Methods in emission order
    pub methods: Vec<MethodRecord>,
}

impl DebugInfoDocument {
    /// Method `name` of `containing_type`; the first one when overloaded.
    #[must_use]
    pub fn method(&self, containing_type: &str, name: &str) -> Option<&MethodRecord> {
        self.methods
            .iter()
            .find(|method| method.containing_type == containing_type && method.name == name)
    }

    /// Method with MethodDef `token`.
    #[must_use]
    pub fn method_by_token(&self, token: Token) -> Option<&MethodRecord> {
        self.methods.iter().find(|method| method.token == token)
    }

    /// File with public id `id`.
    #[must_use]
    pub fn file(&self, id: u32) -> Option<&FileRecord> {
        self.files.iter().find(|file| file.id == id)
    }

    /// File named `name`.
    #[must_use]
    pub fn file_by_name(&self, name: &str) -> Option<&FileRecord> {
        self.files.iter().find(|file| file.name == name)
    }

    /// XML projection of the document.
    ///
    /// # Errors
    /// Returns [`Error::Xml`] if the XML writer fails.
    pub fn to_xml(&self) -> Result<String> {
        xml::to_xml(self)
    }

    /// Write the physical form through `writer`.
    ///
    /// Any failure of the writer aborts the whole operation and surfaces as
    /// [`Error::SymWriter`]; `commit` is only called after every document and method
    /// was accepted.
    ///
    /// # Errors
    /// Returns [`Error::SymWriter`] carrying the writer's failure.
    pub fn write_to(&self, writer: &mut dyn SymbolWriter) -> Result<()> {
        let result = self.write_all(writer);
        result.map_err(|error| match error {
            Error::SymWriter { .. } => error,
            other => Error::SymWriter {
                message: other.to_string(),
            },
        })
    }

    fn write_all(&self, writer: &mut dyn SymbolWriter) -> Result<()> {
        for file in &self.files {
            writer.define_document(file)?;
        }
        for method in &self.methods {
            writer.define_method(method)?;
        }
        writer.commit()
    }

    /// Physical form as produced by [`BlobSymbolWriter`].
    ///
    /// # Errors
    /// Returns [`Error::SymWriter`] if encoding fails.
    pub fn to_blob(&self) -> Result<Vec<u8>> {
        let mut writer = BlobSymbolWriter::new();
        self.write_to(&mut writer)?;
        writer.into_output().ok_or_else(|| Error::SymWriter {
            message: "symbol writer produced no output".to_string(),
        })
    }
}
