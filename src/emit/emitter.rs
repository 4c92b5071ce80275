//! Turns finished methods into a [`DebugInfoDocument`].
//!
//! Document ids are public, 1-based and assigned in order of first reference while
//! walking the methods in emission order. Pragma-declared files that no sequence point
//! references follow in source-add order. Documents registered only while resolving
//! spans of methods that are not emitted never reach the output.

use std::collections::HashMap;

use crate::{
    debuginfo::{
        config::TargetPlatform,
        customdebuginformation::{
            CustomDebugInfo, DynamicLocalBucket, DYNAMIC_FLAG_CAPACITY, DYNAMIC_NAME_CAPACITY,
        },
        documents::DocumentId,
        forwarding::{ForwardingResolver, ImportForm},
        method::{MethodDebugInfo, MethodKind},
        scope::Scope,
        sequencepoints::SequencePoint,
        session::DebugInfoSession,
    },
    emit::document::{DebugInfoDocument, FileRecord, MethodRecord},
    utils::utf16_len,
    Result,
};

/// Emits the document of one session.
pub struct DocumentEmitter<'a> {
    session: &'a DebugInfoSession,
}

impl<'a> DocumentEmitter<'a> {
    /// Emitter over `session`.
    #[must_use]
    pub fn new(session: &'a DebugInfoSession) -> Self {
        DocumentEmitter { session }
    }

    /// Emit `methods`, given in emission order.
    ///
    /// # Errors
    /// Returns an error if a method references a document the session never issued or
    /// a record exceeds its encoding limits.
    pub fn emit(&self, methods: &[MethodDebugInfo]) -> Result<DebugInfoDocument> {
        let file_ids = self.assign_file_ids(methods);
        let files = self.file_records(&file_ids)?;

        let forms = ForwardingResolver::new()
            .with_module_method(self.session.module_method())
            .resolve(methods);

        let methods = methods
            .iter()
            .zip(forms)
            .map(|(method, form)| self.emit_method(method, form, &file_ids))
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(files = files.len(), methods = methods.len(), "emitted debug info document");
        Ok(DebugInfoDocument { files, methods })
    }

    fn assign_file_ids(&self, methods: &[MethodDebugInfo]) -> HashMap<DocumentId, u32> {
        let mut order: Vec<DocumentId> = Vec::new();
        for document in methods.iter().flat_map(MethodDebugInfo::documents) {
            if !order.contains(&document) {
                order.push(document);
            }
        }
        for document in self.session.declared_documents() {
            if !order.contains(&document) {
                order.push(document);
            }
        }

        order
            .into_iter()
            .zip(1u32..)
            .collect()
    }

    fn file_records(&self, file_ids: &HashMap<DocumentId, u32>) -> Result<Vec<FileRecord>> {
        let config = self.session.config();
        let mut ordered: Vec<(DocumentId, u32)> = file_ids.iter().map(|(d, id)| (*d, *id)).collect();
        ordered.sort_by_key(|(_, id)| *id);

        ordered
            .into_iter()
            .map(|(document, id)| {
                let snapshot = self
                    .session
                    .documents()
                    .snapshot(document, self.session.checksums())?;
                Ok(FileRecord {
                    id,
                    name: snapshot.path,
                    language: config.language,
                    language_vendor: config.language_vendor,
                    document_type: config.document_type,
                    checksum: snapshot.checksum,
                })
            })
            .collect()
    }

    #[tracing::instrument(level = "debug", skip_all, fields(method = %method.identity))]
    fn emit_method(
        &self,
        method: &MethodDebugInfo,
        form: ImportForm,
        file_ids: &HashMap<DocumentId, u32>,
    ) -> Result<MethodRecord> {
        let config = self.session.config();
        let mut custom_debug_info = Vec::new();

        match form {
            ImportForm::Full => {
                let counts = method
                    .imports
                    .counts()
                    .into_iter()
                    .map(|count| {
                        u16::try_from(count)
                            .map_err(|_| malformed_error!("Import level with {} entries", count))
                    })
                    .collect::<Result<Vec<_>>>()?;
                custom_debug_info.push(CustomDebugInfo::UsingInfo { counts });
            }
            ImportForm::Forward(token) => {
                custom_debug_info.push(CustomDebugInfo::ForwardInfo { token });
            }
            ImportForm::ForwardToModule(token) => {
                custom_debug_info.push(CustomDebugInfo::ForwardToModuleInfo { token });
            }
            ImportForm::None => {}
        }

        if let MethodKind::StateMachineKickoff { state_machine_type } = &method.kind {
            custom_debug_info.push(CustomDebugInfo::ForwardIterator {
                name: state_machine_type.clone(),
            });
        }

        if config.allows_enc_records() && !method.hoisted_scopes.is_empty() {
            custom_debug_info.push(CustomDebugInfo::StateMachineHoistedLocalScopes {
                scopes: method.hoisted_scopes.clone(),
            });
        }

        if config.target != TargetPlatform::WinRt {
            let buckets = self.dynamic_buckets(&method.root_scope);
            if !buckets.is_empty() {
                custom_debug_info.push(CustomDebugInfo::DynamicLocals { buckets });
            }
        }

        if config.allows_enc_records() && !method.slots.is_empty() {
            custom_debug_info.push(CustomDebugInfo::EncLocalSlotMap {
                slots: method.slots.clone(),
            });
        }

        let sequence_points = method
            .sequence_points
            .iter()
            .map(|entry| {
                let document = entry
                    .document
                    .and_then(|document| file_ids.get(&document).copied())
                    .unwrap_or(0);
                match entry.range {
                    Some(range) => SequencePoint::visible(entry.il_offset, document, range),
                    None => SequencePoint::hidden(entry.il_offset, document),
                }
            })
            .collect();

        let (imports, extern_infos) = if form == ImportForm::Full {
            let imports: Vec<_> = method.imports.iter().cloned().collect();
            let infos = method
                .imports
                .extern_infos(|alias| self.session.extern_alias_target(alias));
            (imports, infos)
        } else {
            (Vec::new(), Vec::new())
        };

        Ok(MethodRecord {
            containing_type: method.identity.containing_type.clone(),
            name: method.identity.name.clone(),
            parameter_names: method.identity.parameter_names.clone(),
            token: method.identity.token,
            custom_debug_info,
            sequence_points,
            root_scope: method.root_scope.clone(),
            imports,
            extern_infos,
        })
    }

    /// Dynamic buckets for locals, then constants, in scope order.
    fn dynamic_buckets(&self, root: &Scope) -> Vec<DynamicLocalBucket> {
        // A bucket holds at most 64 flags whatever the configured limit.
        let max = self.session.config().max_dynamic_flags.min(DYNAMIC_FLAG_CAPACITY);

        let locals = root.all_locals().filter_map(|local| {
            let flags = local.dynamic_flags.as_ref().filter(|flags| flags.any())?;
            Some((local.name.as_str(), local.slot, flags))
        });
        let constants = root.all_constants().filter_map(|constant| {
            let flags = constant.dynamic_flags.as_ref().filter(|flags| flags.any())?;
            Some((constant.name.as_str(), 0, flags))
        });

        locals
            .chain(constants)
            .map(|(name, slot, flags)| DynamicLocalBucket {
                flags: flags.capped(max),
                slot,
                name: if utf16_len(name) < DYNAMIC_NAME_CAPACITY {
                    name.to_string()
                } else {
                    String::new()
                },
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debuginfo::{
        config::EmitConfig,
        constants::{ConstantRecord, ConstantValue},
        dynamic::DynamicFlags,
        locals::{LocalDeclaration, LocalSlotKind},
        method::MethodIdentity,
        source::{RawSpan, SourceText},
    };

    #[test]
    fn file_ids_follow_first_reference() {
        let session = DebugInfoSession::new(EmitConfig::default());
        let a = session.add_source(SourceText::new("a.cs", "aaaa"), &[], &[]).unwrap();
        let b = session.add_source(SourceText::new("b.cs", "bbbb"), &[], &[]).unwrap();

        // b is registered first internally
        let mut first = session.method_builder(MethodIdentity::new("C", "F", 1), MethodKind::Ordinary);
        first.sequence_point(0, RawSpan::new(b, 0, 1)).unwrap();
        let first = first.finish(1).unwrap();
        let mut second = session.method_builder(MethodIdentity::new("C", "G", 2), MethodKind::Ordinary);
        second.sequence_point(0, RawSpan::new(a, 0, 1)).unwrap();
        let second = second.finish(1).unwrap();

        let document = session.emit(&[second, first]).unwrap();
        assert_eq!(document.file(1).unwrap().name, "a.cs");
        assert_eq!(document.file(2).unwrap().name, "b.cs");
        assert_eq!(document.method("C", "F").unwrap().sequence_points[0].document, 2);
    }

    #[test]
    fn dynamic_buckets_are_capped_and_named() {
        let session = DebugInfoSession::new(EmitConfig::default());
        let mut builder = session.method_builder(MethodIdentity::new("C", "M", 1), MethodKind::Ordinary);
        builder
            .declare_local(LocalDeclaration::user("d", 0).with_dynamic_flags(DynamicFlags::dynamic()))
            .unwrap();
        builder
            .declare_local(
                LocalDeclaration::user("x".repeat(64), 1).with_dynamic_flags(DynamicFlags::new(vec![true; 65])),
            )
            .unwrap();
        builder
            .declare_local(LocalDeclaration::user("plain", 2))
            .unwrap();
        builder
            .declare_constant(
                ConstantRecord::new("k", ConstantValue::Null { type_token: Default::default() })
                    .with_dynamic_flags(DynamicFlags::dynamic()),
            )
            .unwrap();
        let info = builder.finish(4).unwrap();

        let document = session.emit(&[info]).unwrap();
        let method = document.method("C", "M").unwrap();
        let buckets = method
            .custom_debug_info
            .iter()
            .find_map(|record| match record {
                CustomDebugInfo::DynamicLocals { buckets } => Some(buckets),
                _ => None,
            })
            .unwrap();

        assert_eq!(buckets.len(), 3);
        assert_eq!((buckets[0].name.as_str(), buckets[0].slot), ("d", 0));
        assert_eq!(buckets[1].name, "");
        assert!(buckets[1].flags.is_empty());
        assert_eq!((buckets[2].name.as_str(), buckets[2].slot), ("k", 0));
    }

    #[test]
    fn dynamic_limit_above_bucket_capacity_is_clamped() {
        let config = EmitConfig {
            max_dynamic_flags: 100,
            ..EmitConfig::default()
        };
        let session = DebugInfoSession::new(config);
        let mut builder = session.method_builder(MethodIdentity::new("C", "M", 1), MethodKind::Ordinary);
        builder
            .declare_local(LocalDeclaration::user("wide", 0).with_dynamic_flags(DynamicFlags::new(vec![true; 65])))
            .unwrap();
        builder
            .declare_local(LocalDeclaration::user("full", 1).with_dynamic_flags(DynamicFlags::new(vec![true; 64])))
            .unwrap();
        let info = builder.finish(2).unwrap();

        let document = session.emit(&[info]).unwrap();
        let buckets = document.methods[0]
            .custom_debug_info
            .iter()
            .find_map(|record| match record {
                CustomDebugInfo::DynamicLocals { buckets } => Some(buckets.clone()),
                _ => None,
            })
            .unwrap();
        assert!(buckets[0].flags.is_empty());
        assert_eq!(buckets[1].flags.as_slice().len(), 64);
        assert!(document.to_blob().is_ok());
    }

    #[test]
    fn winrt_suppresses_dynamic_and_enc_records() {
        let session = DebugInfoSession::new(EmitConfig::winrt());
        let mut builder = session.method_builder(MethodIdentity::new("C", "M", 1), MethodKind::Ordinary);
        builder
            .declare_local(LocalDeclaration::user("d", 0).with_dynamic_flags(DynamicFlags::dynamic()))
            .unwrap();
        builder
            .declare_local(LocalDeclaration::new("e", LocalSlotKind::ForEachEnumerator, 5))
            .unwrap();
        builder.hoisted_local_scope(Some((0, 2)));
        let info = builder.finish(4).unwrap();

        let document = session.emit(&[info]).unwrap();
        let method = document.method("C", "M").unwrap();
        assert!(method.custom_debug_info.is_empty());
        assert_eq!(method.root_scope.locals.len(), 2);
    }

    #[test]
    fn release_keeps_dynamic_locals_only() {
        let session = DebugInfoSession::new(EmitConfig::release());
        let mut builder = session.method_builder(MethodIdentity::new("C", "M", 1), MethodKind::Ordinary);
        builder
            .declare_local(LocalDeclaration::user("d", 0).with_dynamic_flags(DynamicFlags::dynamic()))
            .unwrap();
        let info = builder.finish(4).unwrap();

        let document = session.emit(&[info]).unwrap();
        let kinds: Vec<u8> = document.methods[0]
            .custom_debug_info
            .iter()
            .map(CustomDebugInfo::kind)
            .collect();
        assert_eq!(kinds, vec![5]);
    }
}
