//! Loading of compiled contract artifacts produced by `scarb build`.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::DeployError;

/// Name of the optional class hash field in a compiled contract document.
const CLASS_HASH_FIELD: &str = "class_hash";

/// Sierra suffixes and the matching CASM suffixes emitted by scarb.
const CASM_SUFFIXES: &[(&str, &str)] = &[
    (".contract_class.json", ".compiled_contract_class.json"),
    (".sierra.json", ".casm.json"),
];

/// A compiled contract class loaded from disk.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledArtifact {
    /// Where the class definition was read from.
    pub path: PathBuf,
    /// The Sierra class document, without the embedded class hash.
    pub class_definition: Value,
    /// The class hash embedded in the document, if any.
    pub class_hash: Option<String>,
    /// The compiled CASM class, if a companion file was found.
    pub casm: Option<Value>,
}

impl CompiledArtifact {
    /// Load a compiled contract from `path`.
    ///
    /// The CASM companion is read from `casm_path` when given, otherwise from the
    /// sibling file following scarb's naming. A missing companion is not an error.
    pub fn load(path: &Path, casm_path: Option<&Path>) -> Result<Self, DeployError> {
        if !path.is_file() {
            return Err(DeployError::ArtifactNotFound {
                path: path.to_path_buf(),
            });
        }

        let mut document = match read_json(path)? {
            Value::Object(document) => document,
            other => {
                return Err(DeployError::ArtifactParse {
                    path: path.to_path_buf(),
                    reason: format!("expected a JSON object, found {}", json_type(&other)),
                });
            }
        };

        let class_hash = take_class_hash(path, &mut document)?;

        let casm_path = casm_path
            .map(Path::to_path_buf)
            .or_else(|| companion_casm_path(path));
        let casm = match casm_path {
            Some(casm_path) if casm_path.is_file() => {
                tracing::debug!(path = %casm_path.display(), "Found CASM companion");
                Some(read_json(&casm_path)?)
            }
            Some(casm_path) => {
                tracing::debug!(path = %casm_path.display(), "No CASM companion");
                None
            }
            None => None,
        };

        tracing::debug!(
            path = %path.display(),
            class_hash = ?class_hash,
            has_casm = casm.is_some(),
            "Compiled contract loaded"
        );

        Ok(Self {
            path: path.to_path_buf(),
            class_definition: Value::Object(document),
            class_hash,
            casm,
        })
    }
}

/// The CASM file scarb writes next to a Sierra artifact.
pub fn companion_casm_path(path: &Path) -> Option<PathBuf> {
    let file_name = path.file_name()?.to_str()?;

    CASM_SUFFIXES.iter().find_map(|(sierra, casm)| {
        file_name
            .strip_suffix(sierra)
            .map(|stem| path.with_file_name(format!("{stem}{casm}")))
    })
}

fn read_json(path: &Path) -> Result<Value, DeployError> {
    let content = std::fs::read_to_string(path).map_err(|e| DeployError::ArtifactParse {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    serde_json::from_str(&content).map_err(|e| DeployError::ArtifactParse {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Remove the class hash from the document, checking it is a non-empty string.
fn take_class_hash(
    path: &Path,
    document: &mut Map<String, Value>,
) -> Result<Option<String>, DeployError> {
    match document.remove(CLASS_HASH_FIELD) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(hash)) if !hash.trim().is_empty() => Ok(Some(hash)),
        Some(other) => Err(DeployError::ArtifactParse {
            path: path.to_path_buf(),
            reason: format!(
                "`{CLASS_HASH_FIELD}` must be a non-empty string, found {}",
                other
            ),
        }),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FailureKind;
    use tempdir::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_without_class_hash() {
        let dir = TempDir::new("artifact").unwrap();
        let path = write(&dir, "c.sierra.json", r#"{"sierra_program": ["0x1"], "abi": []}"#);

        let artifact = CompiledArtifact::load(&path, None).unwrap();

        assert_eq!(artifact.class_hash, None);
        assert_eq!(artifact.class_definition["sierra_program"][0], "0x1");
        assert!(artifact.casm.is_none());
    }

    #[test]
    fn test_load_strips_class_hash_from_definition() {
        let dir = TempDir::new("artifact").unwrap();
        let path = write(&dir, "c.sierra.json", r#"{"class_hash": "0x42", "abi": []}"#);

        let artifact = CompiledArtifact::load(&path, None).unwrap();

        assert_eq!(artifact.class_hash.as_deref(), Some("0x42"));
        assert!(artifact.class_definition.get(CLASS_HASH_FIELD).is_none());
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new("artifact").unwrap();
        let path = dir.path().join("missing.sierra.json");

        let err = CompiledArtifact::load(&path, None).unwrap_err();

        assert_eq!(err.kind(), FailureKind::ArtifactNotFound);
        let message = err.to_string();
        assert!(message.contains("missing.sierra.json"));
        assert!(message.contains("scarb build"));
    }

    #[test]
    fn test_malformed_documents() {
        let dir = TempDir::new("artifact").unwrap();
        let cases = [
            ("truncated.json", r#"{"abi": ["#),
            ("array.json", "[1, 2, 3]"),
            ("empty_hash.json", r#"{"class_hash": ""}"#),
            ("numeric_hash.json", r#"{"class_hash": 42}"#),
        ];

        for (name, content) in cases {
            let path = write(&dir, name, content);
            let err = CompiledArtifact::load(&path, None).unwrap_err();
            assert_eq!(err.kind(), FailureKind::ArtifactParseError, "case {name}");
        }
    }

    #[test]
    fn test_companion_casm_path() {
        assert_eq!(
            companion_casm_path(Path::new("target/dev/pkg_Rental.contract_class.json")),
            Some(PathBuf::from("target/dev/pkg_Rental.compiled_contract_class.json"))
        );
        assert_eq!(
            companion_casm_path(Path::new("target/dev/pkg_Rental.sierra.json")),
            Some(PathBuf::from("target/dev/pkg_Rental.casm.json"))
        );
        assert_eq!(companion_casm_path(Path::new("target/dev/rental.json")), None);
    }

    #[test]
    fn test_loads_companion_casm() {
        let dir = TempDir::new("artifact").unwrap();
        let path = write(&dir, "pkg_Rental.contract_class.json", r#"{"abi": []}"#);
        write(&dir, "pkg_Rental.compiled_contract_class.json", r#"{"bytecode": []}"#);

        let artifact = CompiledArtifact::load(&path, None).unwrap();

        assert_eq!(artifact.casm, Some(serde_json::json!({"bytecode": []})));
    }

    #[test]
    fn test_malformed_casm_is_a_parse_error() {
        let dir = TempDir::new("artifact").unwrap();
        let path = write(&dir, "c.json", r#"{"abi": []}"#);
        let casm = write(&dir, "c.casm", "not json");

        let err = CompiledArtifact::load(&path, Some(casm.as_path())).unwrap_err();

        assert_eq!(err.kind(), FailureKind::ArtifactParseError);
    }
}
