//! XML projection of a [`DebugInfoDocument`].
//!
//! The projection is what conformance tests compare against; it shows every fact of
//! the document in a stable order:
//!
//! ```text
//! <symbols>
//!   <files>
//!     <file id name language languageVendor documentType [checkSumAlgorithmId checkSum] />
//!   </files>
//!   <methods>
//!     <method containingType name [parameterNames]>
//!       <customDebugInfo> forward | forwardToModule | using | forwardIterator |
//!                         hoistedLocalScopes | dynamicLocals | encLocalSlotMap </customDebugInfo>
//!       <sequencepoints total> <entry il_offset [hidden] start_row start_column
//!                                     end_row end_column [file_ref] /> </sequencepoints>
//!       <locals> <local .../> <constant .../> </locals>
//!       <scope startOffset endOffset> imports, externinfo, locals, constants, scopes </scope>
//!     </method>
//!   </methods>
//! </symbols>
//! ```

use quick_xml::{
    events::{BytesEnd, BytesStart, Event},
    Writer,
};

use crate::{
    debuginfo::{
        constants::ConstantRecord,
        customdebuginformation::CustomDebugInfo,
        importscope::{qualified_type, ExternInfo, ImportRecord},
        locals::{LocalRecord, SlotInfo},
        scope::Scope,
        sequencepoints::SequencePoint,
        token::Token,
    },
    emit::document::{DebugInfoDocument, FileRecord, MethodRecord},
    utils::{hex_bytes, hex_offset},
    Error, Result,
};

type Attributes<'a> = Vec<(&'a str, String)>;

struct XmlOut {
    writer: Writer<Vec<u8>>,
}

impl XmlOut {
    fn new() -> Self {
        XmlOut {
            writer: Writer::new_with_indent(Vec::new(), b' ', 2),
        }
    }

    fn element(name: &str, attributes: &Attributes<'_>) -> BytesStart<'static> {
        let mut element = BytesStart::new(name.to_string());
        for (key, value) in attributes {
            element.push_attribute((*key, value.as_str()));
        }
        element
    }

    fn start(&mut self, name: &str, attributes: &Attributes<'_>) -> Result<()> {
        self.writer
            .write_event(Event::Start(Self::element(name, attributes)))
            .map_err(|e| Error::Xml(e.to_string()))
    }

    fn empty(&mut self, name: &str, attributes: &Attributes<'_>) -> Result<()> {
        self.writer
            .write_event(Event::Empty(Self::element(name, attributes)))
            .map_err(|e| Error::Xml(e.to_string()))
    }

    fn end(&mut self, name: &str) -> Result<()> {
        self.writer
            .write_event(Event::End(BytesEnd::new(name)))
            .map_err(|e| Error::Xml(e.to_string()))
    }

    fn finish(self) -> Result<String> {
        String::from_utf8(self.writer.into_inner()).map_err(|e| Error::Xml(e.to_string()))
    }
}

/// Render `document` as indented XML.
///
/// # Errors
/// Returns [`Error::Xml`] if writing fails.
pub fn to_xml(document: &DebugInfoDocument) -> Result<String> {
    let mut out = XmlOut::new();
    out.start("symbols", &vec![])?;

    if document.files.is_empty() {
        out.empty("files", &vec![])?;
    } else {
        out.start("files", &vec![])?;
        for file in &document.files {
            write_file(&mut out, file)?;
        }
        out.end("files")?;
    }

    if document.methods.is_empty() {
        out.empty("methods", &vec![])?;
    } else {
        out.start("methods", &vec![])?;
        for method in &document.methods {
            write_method(&mut out, document, method)?;
        }
        out.end("methods")?;
    }

    out.end("symbols")?;
    out.finish()
}

fn write_file(out: &mut XmlOut, file: &FileRecord) -> Result<()> {
    let mut attributes: Attributes<'_> = vec![
        ("id", file.id.to_string()),
        ("name", file.name.clone()),
        ("language", file.language.to_string()),
        ("languageVendor", file.language_vendor.to_string()),
        ("documentType", file.document_type.to_string()),
    ];
    if let Some(checksum) = &file.checksum {
        attributes.push(("checkSumAlgorithmId", checksum.algorithm.to_string()));
        attributes.push(("checkSum", hex_bytes(&checksum.bytes)));
    }
    out.empty("file", &attributes)
}

fn write_method(out: &mut XmlOut, document: &DebugInfoDocument, method: &MethodRecord) -> Result<()> {
    let mut attributes: Attributes<'_> = vec![
        ("containingType", method.containing_type.clone()),
        ("name", method.name.clone()),
    ];
    if !method.parameter_names.is_empty() {
        attributes.push(("parameterNames", method.parameter_names.join(", ")));
    }
    out.start("method", &attributes)?;

    if !method.custom_debug_info.is_empty() {
        out.start("customDebugInfo", &vec![])?;
        for record in &method.custom_debug_info {
            write_custom_debug_info(out, document, record)?;
        }
        out.end("customDebugInfo")?;
    }

    write_sequence_points(out, &method.sequence_points)?;

    let locals: Vec<&LocalRecord> = method.root_scope.all_locals().collect();
    let constants: Vec<&ConstantRecord> = method.root_scope.all_constants().collect();
    if !locals.is_empty() || !constants.is_empty() {
        out.start("locals", &vec![])?;
        for local in locals {
            write_local(out, local)?;
        }
        for constant in constants {
            write_constant(out, constant)?;
        }
        out.end("locals")?;
    }

    write_scope(out, &method.root_scope, Some((method.imports.as_slice(), method.extern_infos.as_slice())))?;
    out.end("method")
}

fn forward_attributes(document: &DebugInfoDocument, token: Token) -> Attributes<'static> {
    match document.method_by_token(token) {
        Some(target) => vec![
            ("declaringType", target.containing_type.clone()),
            ("methodName", target.name.clone()),
        ],
        None => vec![("token", token.to_string())],
    }
}

fn write_custom_debug_info(
    out: &mut XmlOut,
    document: &DebugInfoDocument,
    record: &CustomDebugInfo,
) -> Result<()> {
    match record {
        CustomDebugInfo::UsingInfo { counts } => {
            out.start("using", &vec![])?;
            for count in counts {
                out.empty("namespace", &vec![("usingCount", count.to_string())])?;
            }
            out.end("using")
        }
        CustomDebugInfo::ForwardInfo { token } => {
            out.empty("forward", &forward_attributes(document, *token))
        }
        CustomDebugInfo::ForwardToModuleInfo { token } => {
            out.empty("forwardToModule", &forward_attributes(document, *token))
        }
        CustomDebugInfo::ForwardIterator { name } => {
            out.empty("forwardIterator", &vec![("name", name.clone())])
        }
        CustomDebugInfo::StateMachineHoistedLocalScopes { scopes } => {
            out.start("hoistedLocalScopes", &vec![])?;
            for scope in scopes {
                if scope.is_empty() {
                    out.empty("slot", &vec![])?;
                } else {
                    out.empty(
                        "slot",
                        &vec![
                            ("startOffset", hex_offset(scope.start)),
                            ("endOffset", hex_offset(scope.end)),
                        ],
                    )?;
                }
            }
            out.end("hoistedLocalScopes")
        }
        CustomDebugInfo::DynamicLocals { buckets } => {
            out.start("dynamicLocals", &vec![])?;
            for bucket in buckets {
                out.empty(
                    "bucket",
                    &vec![
                        ("flags", bucket.flags.to_string()),
                        ("flagCount", bucket.flags.len().to_string()),
                        ("slotId", bucket.slot.to_string()),
                        ("localName", bucket.name.clone()),
                    ],
                )?;
            }
            out.end("dynamicLocals")
        }
        CustomDebugInfo::EncLocalSlotMap { slots } => {
            out.start("encLocalSlotMap", &vec![])?;
            for slot in slots {
                write_slot(out, slot)?;
            }
            out.end("encLocalSlotMap")
        }
        CustomDebugInfo::Unknown { kind, data } => out.empty(
            "unknown",
            &vec![("kind", kind.to_string()), ("payload", hex_bytes(data))],
        ),
    }
}

fn write_slot(out: &mut XmlOut, slot: &SlotInfo) -> Result<()> {
    match slot {
        SlotInfo::Temp => out.empty("slot", &vec![("kind", "temp".to_string())]),
        SlotInfo::Named {
            kind,
            syntax_offset,
            ordinal,
        } => {
            let code = kind
                .code()
                .ok_or_else(|| malformed_error!("Slot kind {:?} has no slot map code", kind))?;
            let mut attributes: Attributes<'_> = vec![
                ("kind", code.to_string()),
                ("offset", syntax_offset.to_string()),
            ];
            if *ordinal > 0 {
                attributes.push(("ordinal", ordinal.to_string()));
            }
            out.empty("slot", &attributes)
        }
    }
}

fn write_sequence_points(out: &mut XmlOut, points: &[SequencePoint]) -> Result<()> {
    let total = vec![("total", points.len().to_string())];
    if points.is_empty() {
        return out.empty("sequencepoints", &total);
    }

    out.start("sequencepoints", &total)?;
    for point in points {
        let mut attributes: Attributes<'_> = vec![("il_offset", hex_offset(point.il_offset))];
        if point.is_hidden {
            attributes.push(("hidden", "true".to_string()));
        }
        attributes.extend([
            ("start_row", point.start_line.to_string()),
            ("start_column", point.start_col.to_string()),
            ("end_row", point.end_line.to_string()),
            ("end_column", point.end_col.to_string()),
        ]);
        if point.document != 0 {
            attributes.push(("file_ref", point.document.to_string()));
        }
        out.empty("entry", &attributes)?;
    }
    out.end("sequencepoints")
}

fn write_local(out: &mut XmlOut, local: &LocalRecord) -> Result<()> {
    out.empty(
        "local",
        &vec![
            ("name", local.name.clone()),
            ("il_index", local.slot.to_string()),
            ("il_start", hex_offset(local.live_start)),
            ("il_end", hex_offset(local.live_end)),
            ("attributes", local.attributes.bits().to_string()),
        ],
    )
}

fn write_constant(out: &mut XmlOut, constant: &ConstantRecord) -> Result<()> {
    out.empty(
        "constant",
        &vec![
            ("name", constant.name.clone()),
            ("value", constant.value.display_value()),
            ("type", constant.type_name().to_string()),
        ],
    )
}

fn write_import(out: &mut XmlOut, import: &ImportRecord) -> Result<()> {
    match import {
        ImportRecord::Namespace { name, qualifier } => {
            let mut attributes: Attributes<'_> = vec![("name", name.clone())];
            if let Some(qualifier) = qualifier {
                attributes.push(("qualifier", qualifier.clone()));
            }
            out.empty("namespace", &attributes)
        }
        ImportRecord::NamespaceAlias {
            alias,
            target,
            qualifier,
        } => {
            let mut attributes: Attributes<'_> = vec![
                ("name", alias.clone()),
                ("target", target.clone()),
                ("kind", "namespace".to_string()),
            ];
            if let Some(qualifier) = qualifier {
                attributes.push(("qualifier", qualifier.clone()));
            }
            out.empty("alias", &attributes)
        }
        ImportRecord::TypeAlias {
            alias,
            type_name,
            assembly,
        } => out.empty(
            "alias",
            &vec![
                ("name", alias.clone()),
                ("target", qualified_type(type_name, assembly.as_deref())),
                ("kind", "type".to_string()),
            ],
        ),
        ImportRecord::ExternAlias { alias } => {
            out.empty("extern", &vec![("alias", alias.clone())])
        }
        ImportRecord::StaticType {
            type_name,
            assembly,
        } => out.empty(
            "type",
            &vec![("name", qualified_type(type_name, assembly.as_deref()))],
        ),
    }
}

fn write_extern_info(out: &mut XmlOut, info: &ExternInfo) -> Result<()> {
    out.empty(
        "externinfo",
        &vec![
            ("alias", info.alias.clone()),
            ("assembly", info.assembly.clone()),
        ],
    )
}

fn write_scope(
    out: &mut XmlOut,
    scope: &Scope,
    imports: Option<(&[ImportRecord], &[ExternInfo])>,
) -> Result<()> {
    let attributes = vec![
        ("startOffset", hex_offset(scope.start_offset)),
        ("endOffset", hex_offset(scope.end_offset)),
    ];
    let (imports, extern_infos) = imports.unwrap_or((&[], &[]));

    if scope.children.is_empty()
        && scope.locals.is_empty()
        && scope.constants.is_empty()
        && imports.is_empty()
        && extern_infos.is_empty()
    {
        return out.empty("scope", &attributes);
    }

    out.start("scope", &attributes)?;
    for import in imports {
        write_import(out, import)?;
    }
    for info in extern_infos {
        write_extern_info(out, info)?;
    }
    for local in &scope.locals {
        write_local(out, local)?;
    }
    for constant in &scope.constants {
        write_constant(out, constant)?;
    }
    for child in &scope.children {
        write_scope(out, child, None)?;
    }
    out.end("scope")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debuginfo::{
        checksum::{DocumentChecksum, CHECKSUM_SHA1},
        config::{DOCUMENT_TYPE_TEXT, LANGUAGE_CSHARP, LANGUAGE_VENDOR_MICROSOFT},
        scope::ScopeTree,
    };
    use pretty_assertions::assert_eq;

    #[test]
    fn minimal_document() {
        let document = DebugInfoDocument {
            files: vec![FileRecord {
                id: 1,
                name: "a.cs".to_string(),
                language: LANGUAGE_CSHARP,
                language_vendor: LANGUAGE_VENDOR_MICROSOFT,
                document_type: DOCUMENT_TYPE_TEXT,
                checksum: Some(DocumentChecksum {
                    algorithm: CHECKSUM_SHA1,
                    bytes: vec![0xDB, 0xEB],
                }),
            }],
            methods: vec![MethodRecord {
                containing_type: "C".to_string(),
                name: "M".to_string(),
                parameter_names: vec!["a".to_string(), "b".to_string()],
                token: Token::method_def(1),
                custom_debug_info: vec![CustomDebugInfo::UsingInfo { counts: vec![1] }],
                sequence_points: vec![
                    SequencePoint::hidden(0, 1),
                ],
                root_scope: ScopeTree::new().finish(2).unwrap(),
                imports: vec![ImportRecord::namespace("System")],
                extern_infos: vec![],
            }],
        };

        let expected = r#"<symbols>
  <files>
    <file id="1" name="a.cs" language="3f5162f8-07c6-11d3-9053-00c04fa302a1" languageVendor="994b45c4-e6e9-11d2-903f-00c04fa302a1" documentType="5a869d0b-6611-11d3-bd2a-0000f80849bd" checkSumAlgorithmId="ff1816ec-aa5e-4d10-87f7-6f4963833460" checkSum="DB, EB"/>
  </files>
  <methods>
    <method containingType="C" name="M" parameterNames="a, b">
      <customDebugInfo>
        <using>
          <namespace usingCount="1"/>
        </using>
      </customDebugInfo>
      <sequencepoints total="1">
        <entry il_offset="0x0" hidden="true" start_row="16707566" start_column="0" end_row="16707566" end_column="0" file_ref="1"/>
      </sequencepoints>
      <scope startOffset="0x0" endOffset="0x2">
        <namespace name="System"/>
      </scope>
    </method>
  </methods>
</symbols>"#;
        assert_eq!(to_xml(&document).unwrap(), expected);
    }

    #[test]
    fn attribute_values_are_escaped() {
        let document = DebugInfoDocument {
            files: vec![],
            methods: vec![MethodRecord {
                containing_type: "C<T>".to_string(),
                name: "M".to_string(),
                parameter_names: vec![],
                token: Token::method_def(1),
                custom_debug_info: vec![],
                sequence_points: vec![],
                root_scope: ScopeTree::new().finish(0).unwrap(),
                imports: vec![],
                extern_infos: vec![],
            }],
        };
        let xml = to_xml(&document).unwrap();
        assert!(xml.contains(r#"containingType="C&lt;T&gt;""#));
        assert!(xml.contains(r#"<sequencepoints total="0"/>"#));
        assert!(xml.contains("<files/>"));
    }
}
