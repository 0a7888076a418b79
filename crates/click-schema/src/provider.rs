//! Schema providers and the startup-time key/value binding.

use crate::schema::{Schema, SchemaError};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Default identifier of the click key schema.
pub const DEFAULT_KEY_SCHEMA: &str = "clicks_key_v1";

/// Default identifier of the click value schema.
pub const DEFAULT_VALUE_SCHEMA: &str = "clicks_value_v1";

/// Resolves a schema identifier into a loaded [`Schema`].
pub trait SchemaProvider {
    fn load(&self, identifier: &str) -> Result<Schema, SchemaError>;
}

/// Loads `.avsc` files from a directory.
///
/// An identifier such as `clicks_value_v1` resolves to
/// `<root>/clicks_value_v1.avsc`. Identifiers that already carry the `.avsc`
/// extension are joined onto the root as-is, so absolute paths work too.
#[derive(Debug, Clone)]
pub struct FileSchemaProvider {
    root: PathBuf,
}

impl FileSchemaProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, identifier: &str) -> PathBuf {
        if identifier.ends_with(".avsc") {
            self.root.join(identifier)
        } else {
            self.root.join(format!("{identifier}.avsc"))
        }
    }
}

impl SchemaProvider for FileSchemaProvider {
    fn load(&self, identifier: &str) -> Result<Schema, SchemaError> {
        let path = self.resolve(identifier);
        if !path.exists() {
            return Err(SchemaError::NotFound {
                identifier: identifier.to_string(),
                path,
            });
        }

        let source = std::fs::read_to_string(&path).map_err(|source| SchemaError::Io {
            path: path.clone(),
            source,
        })?;
        debug!("Read schema '{}' from {:?}", identifier, path);

        Schema::parse_str(&source)
    }
}

/// Serves the click schemas bundled with this crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinSchemaProvider;

impl SchemaProvider for BuiltinSchemaProvider {
    fn load(&self, identifier: &str) -> Result<Schema, SchemaError> {
        let source = match identifier {
            DEFAULT_KEY_SCHEMA => include_str!("../schemas/clicks_key_v1.avsc"),
            DEFAULT_VALUE_SCHEMA => include_str!("../schemas/clicks_value_v1.avsc"),
            _ => {
                return Err(SchemaError::NotFound {
                    identifier: identifier.to_string(),
                    path: PathBuf::from(format!("builtin:{identifier}")),
                })
            }
        };
        Schema::parse_str(source)
    }
}

/// Key and value schemas bound once at startup.
///
/// Both are held behind `Arc` for the lifetime of the process and shared by
/// every encode call.
#[derive(Debug, Clone)]
pub struct SchemaBinding {
    pub key: Arc<Schema>,
    pub value: Arc<Schema>,
}

impl SchemaBinding {
    /// Load the key and value schemas from `provider`.
    pub fn bind(
        provider: &dyn SchemaProvider,
        key_identifier: &str,
        value_identifier: &str,
    ) -> Result<Self, SchemaError> {
        let key = provider.load(key_identifier)?;
        info!(
            "Loaded key schema '{}' ({})",
            key_identifier,
            key.reference()
        );
        debug!("Key schema canonical form: {}", key.canonical_form());

        let value = provider.load(value_identifier)?;
        info!(
            "Loaded value schema '{}' ({})",
            value_identifier,
            value.reference()
        );
        debug!("Value schema canonical form: {}", value.canonical_form());

        Ok(Self::new(key, value))
    }

    pub fn new(key: Schema, value: Schema) -> Self {
        Self {
            key: Arc::new(key),
            value: Arc::new(value),
        }
    }
}
