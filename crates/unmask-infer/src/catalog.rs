use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::backend::BackendKind;
use crate::InferError;

fn default_input_size() -> (usize, usize) {
    (224, 224)
}

/// One named model entry: which backend runs it and where its weights live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSpec {
    pub name: String,
    pub kind: BackendKind,
    pub path: PathBuf,
    /// Model input size as `(width, height)`.
    #[serde(default = "default_input_size")]
    pub input_size: (usize, usize),
}

/// The set of models a registry can serve, keyed by name.
#[derive(Debug, Clone)]
pub struct ModelCatalog {
    specs: Vec<ModelSpec>,
}

impl ModelCatalog {
    pub fn new(specs: Vec<ModelSpec>) -> Self {
        Self { specs }
    }

    /// Catalog with the stock MesoNet checkpoints under `models/`.
    pub fn builtin() -> Self {
        Self::new(vec![
            ModelSpec {
                name: "meso4".to_string(),
                kind: BackendKind::Torch,
                path: PathBuf::from("models/meso4.safetensors"),
                input_size: (224, 224),
            },
            ModelSpec {
                name: "meso4-graph".to_string(),
                kind: BackendKind::Graph,
                path: PathBuf::from("models/meso4.onnx"),
                input_size: (224, 224),
            },
            ModelSpec {
                name: "meso4-onnx".to_string(),
                kind: BackendKind::Onnx,
                path: PathBuf::from("models/meso4.onnx"),
                input_size: (224, 224),
            },
        ])
    }

    /// Load a catalog from a JSON array of model specs.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, InferError> {
        let text = fs::read_to_string(&path)?;
        let specs: Vec<ModelSpec> = serde_json::from_str(&text)
            .map_err(|e| InferError::ModelLoad(format!("invalid model catalog: {e}")))?;
        Ok(Self::new(specs))
    }

    pub fn get(&self, name: &str) -> Option<&ModelSpec> {
        self.specs.iter().find(|spec| spec.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.specs.iter().map(|spec| spec.name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_parses_spec_list() {
        let json = r#"[
            {"name": "meso4", "kind": "torch", "path": "models/meso4.safetensors"},
            {"name": "meso4-onnx", "kind": "onnx", "path": "models/meso4.onnx", "input_size": [256, 256]}
        ]"#;
        let specs: Vec<ModelSpec> = serde_json::from_str(json).unwrap();
        let catalog = ModelCatalog::new(specs);

        let torch = catalog.get("meso4").unwrap();
        assert_eq!(torch.kind, BackendKind::Torch);
        assert_eq!(torch.input_size, (224, 224));

        let onnx = catalog.get("meso4-onnx").unwrap();
        assert_eq!(onnx.kind, BackendKind::Onnx);
        assert_eq!(onnx.path, PathBuf::from("models/meso4.onnx"));
        assert_eq!(onnx.input_size, (256, 256));
    }

    #[test]
    fn test_catalog_rejects_unknown_kind() {
        let json = r#"[{"name": "m", "kind": "tensorflow", "path": "m.pb"}]"#;
        let parsed: Result<Vec<ModelSpec>, _> = serde_json::from_str(json);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_catalog_lookup_misses_return_none() {
        let catalog = ModelCatalog::builtin();
        assert!(catalog.get("nope").is_none());
    }

    #[test]
    fn test_builtin_catalog_names() {
        let catalog = ModelCatalog::builtin();
        let names = catalog.names();
        assert!(names.contains(&"meso4"));
        assert!(names.contains(&"meso4-graph"));
        assert!(names.contains(&"meso4-onnx"));
    }

    #[test]
    fn test_from_json_file_missing_path_is_io_error() {
        let result = ModelCatalog::from_json_file("/nonexistent/catalog.json");
        assert!(matches!(result, Err(InferError::Io(_))));
    }
}
