// [libs/domain/models/src/decompilation.rs]
//! Stage A output shape — the structured document returned by the
//! external decompiler collaborator.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecompiledFunction {
    pub name: String,
    pub entry_address: String,
    pub size_bytes: u64,
    pub disassembly: String,
    pub pseudocode: Option<String>,
    pub call_targets: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportedSymbol {
    pub library: String,
    pub symbol: String,
    pub bind_address: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StringEncoding {
    Ascii,
    Utf8,
    Utf16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedString {
    pub content: String,
    pub address: String,
    pub encoding: StringEncoding,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileMetadata {
    pub format: String,
    pub architecture: String,
    pub size_bytes: u64,
    pub entry_point: Option<String>,
}

/// The structured document Stage A hands to Stage B.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecompilationDocument {
    pub decompilation_id: uuid::Uuid,
    pub functions: Vec<DecompiledFunction>,
    pub imports: Vec<ImportedSymbol>,
    pub strings: Vec<ExtractedString>,
    pub file_metadata: FileMetadata,
}

impl DecompilationDocument {
    pub fn function_count(&self) -> usize {
        self.functions.len()
    }

    pub fn import_count(&self) -> usize {
        self.imports.len()
    }

    pub fn string_count(&self) -> usize {
        self.strings.len()
    }
}
