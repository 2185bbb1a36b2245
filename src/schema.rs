use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::entity::Entity;
use crate::error::CatalogError;
use crate::raw::RawSchema;

/// Namespace every schema attribute id is declared under.
pub const ATTRIBUTE_NAMESPACE: &str = "bts:";

/// A schema whose attribute ids have been validated and mapped to field
/// names once, so decoding a record is a positional zip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledSchema {
    name: String,
    fields: Vec<String>,
}

impl CompiledSchema {
    pub fn compile(raw: &RawSchema) -> Result<Self, CatalogError> {
        let fields = raw
            .attributes
            .iter()
            .map(|attribute| field_name(&raw.data_schema, &attribute.id))
            .collect::<Result<Vec<_>, CatalogError>>()?;
        Ok(Self {
            name: raw.data_schema.clone(),
            fields,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Positions past the schema are ignored; missing positions leave the
    /// field absent.
    pub fn decode(&self, values: &[Value], atlas_id: &str) -> Entity {
        let fields = self
            .fields
            .iter()
            .zip(values)
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect::<Map<String, Value>>();
        Entity::new(fields, atlas_id)
    }
}

fn field_name(schema: &str, id: &str) -> Result<String, CatalogError> {
    let unknown = || CatalogError::UnknownAttribute {
        schema: schema.to_string(),
        id: id.to_string(),
    };
    let name = id.strip_prefix(ATTRIBUTE_NAMESPACE).ok_or_else(unknown)?;
    if name.is_empty() || name.chars().any(char::is_whitespace) {
        return Err(unknown());
    }
    Ok(name.to_string())
}

#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: HashMap<String, CompiledSchema>,
}

impl SchemaRegistry {
    /// Later declarations of the same schema name replace earlier ones.
    pub fn compile(raw: &[RawSchema]) -> Result<Self, CatalogError> {
        let mut schemas = HashMap::with_capacity(raw.len());
        for schema in raw {
            let compiled = CompiledSchema::compile(schema)?;
            schemas.insert(compiled.name.clone(), compiled);
        }
        Ok(Self { schemas })
    }

    pub fn get(&self, name: &str) -> Option<&CompiledSchema> {
        self.schemas.get(name)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}
