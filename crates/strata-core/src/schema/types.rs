use serde::{Deserialize, Serialize};

/// Type of a collection field together with its type-specific constraints.
///
/// Serialized with a `type` tag and camelCase option keys so that a field
/// round-trips through the platform's schema export format unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FieldOptions {
    Text(TextOptions),
    Number(NumberOptions),
    Bool(BoolOptions),
    Email(DomainOptions),
    Url(DomainOptions),
    Date(DateOptions),
    Select(SelectOptions),
    Relation(RelationOptions),
    File(FileOptions),
    Json(JsonOptions),
    Autodate(AutodateOptions),
}

impl FieldOptions {
    /// Plain text field without constraints.
    pub fn text() -> Self {
        FieldOptions::Text(TextOptions::default())
    }

    /// Unbounded floating point number.
    pub fn number() -> Self {
        FieldOptions::Number(NumberOptions::default())
    }

    /// Single-choice select over the given values.
    pub fn select<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FieldOptions::Select(SelectOptions {
            max_select: 1,
            values: values.into_iter().map(Into::into).collect(),
        })
    }

    /// Relation to `collection_id` holding at most `max_select` references.
    pub fn relation(collection_id: impl Into<String>, max_select: u32) -> Self {
        FieldOptions::Relation(RelationOptions {
            collection_id: collection_id.into(),
            cascade_delete: false,
            min_select: 0,
            max_select,
        })
    }

    /// Type name as used in the `type` tag.
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldOptions::Text(_) => "text",
            FieldOptions::Number(_) => "number",
            FieldOptions::Bool(_) => "bool",
            FieldOptions::Email(_) => "email",
            FieldOptions::Url(_) => "url",
            FieldOptions::Date(_) => "date",
            FieldOptions::Select(_) => "select",
            FieldOptions::Relation(_) => "relation",
            FieldOptions::File(_) => "file",
            FieldOptions::Json(_) => "json",
            FieldOptions::Autodate(_) => "autodate",
        }
    }

    /// Target collection id for relation fields.
    pub fn relation_target(&self) -> Option<&str> {
        match self {
            FieldOptions::Relation(rel) => Some(&rel.collection_id),
            _ => None,
        }
    }

    /// Whether the field holds a set of values rather than a single one.
    pub fn is_multiple(&self) -> bool {
        match self {
            FieldOptions::Select(opts) => opts.max_select > 1,
            FieldOptions::Relation(opts) => opts.max_select > 1,
            FieldOptions::File(opts) => opts.max_select > 1,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextOptions {
    /// Minimum length, 0 means unbounded.
    pub min: u32,
    /// Maximum length, 0 means unbounded.
    pub max: u32,
    pub pattern: String,
    pub autogenerate_pattern: String,
    pub primary_key: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NumberOptions {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub only_int: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoolOptions {}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DomainOptions {
    pub except_domains: Vec<String>,
    pub only_domains: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DateOptions {
    pub min: String,
    pub max: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectOptions {
    #[serde(default = "default_max_select")]
    pub max_select: u32,
    /// Allowed values, in display order.
    #[serde(default)]
    pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationOptions {
    pub collection_id: String,
    #[serde(default)]
    pub cascade_delete: bool,
    #[serde(default)]
    pub min_select: u32,
    #[serde(default = "default_max_select")]
    pub max_select: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileOptions {
    #[serde(default = "default_max_select")]
    pub max_select: u32,
    /// Maximum size in bytes, 0 means the platform default.
    #[serde(default)]
    pub max_size: u64,
    #[serde(default)]
    pub mime_types: Vec<String>,
    #[serde(default)]
    pub thumbs: Vec<String>,
    #[serde(default)]
    pub protected: bool,
}

impl Default for FileOptions {
    fn default() -> Self {
        Self {
            max_select: default_max_select(),
            max_size: 0,
            mime_types: Vec::new(),
            thumbs: Vec::new(),
            protected: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JsonOptions {
    pub max_size: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AutodateOptions {
    pub on_create: bool,
    pub on_update: bool,
}

fn default_max_select() -> u32 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_names() {
        assert_eq!(FieldOptions::text().type_name(), "text");
        assert_eq!(FieldOptions::number().type_name(), "number");
        assert_eq!(FieldOptions::relation("pbc_1", 1).type_name(), "relation");
    }

    #[test]
    fn test_relation_cardinality() {
        assert!(!FieldOptions::relation("pbc_1", 1).is_multiple());
        assert!(FieldOptions::relation("pbc_1", 999).is_multiple());
        assert_eq!(
            FieldOptions::relation("pbc_1", 1).relation_target(),
            Some("pbc_1")
        );
        assert_eq!(FieldOptions::text().relation_target(), None);
    }

    #[test]
    fn test_parse_platform_select() {
        let json = r#"{ "type": "select", "maxSelect": 1, "values": ["M", "F"] }"#;
        let opts: FieldOptions = serde_json::from_str(json).unwrap();
        assert_eq!(opts, FieldOptions::select(["M", "F"]));
    }

    #[test]
    fn test_parse_number_with_null_bounds() {
        let json = r#"{ "type": "number", "max": null, "min": null, "onlyInt": false }"#;
        let opts: FieldOptions = serde_json::from_str(json).unwrap();
        assert_eq!(opts, FieldOptions::number());
    }
}
