use serde::{Deserialize, Serialize};
use validator::Validate;

/// One row of the variable glossary, keyed by `tag`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct VariableMetadata {
    #[serde(alias = "Etiqueta", alias = "etiqueta", alias = "ETIQUETA")]
    #[validate(length(min = 1))]
    pub tag: String,

    #[serde(alias = "Parámetro", alias = "Parametro", alias = "parámetro", alias = "parametro")]
    pub parameter: String,

    #[serde(alias = "Unidad", alias = "unidad", alias = "Unidades")]
    pub unit: String,

    #[serde(alias = "Descripción", alias = "Descripcion", alias = "descripcion", default)]
    pub description: Option<String>,

    #[serde(alias = "Frecuencia", alias = "frecuencia", default)]
    pub frequency: Option<String>,
}

impl VariableMetadata {
    pub fn new(tag: impl Into<String>, parameter: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            parameter: parameter.into(),
            unit: unit.into(),
            description: None,
            frequency: None,
        }
    }

    /// Case- and accent-insensitive substring match on the parameter name.
    pub fn parameter_contains(&self, keyword: &str) -> bool {
        fold(&self.parameter).contains(&fold(keyword))
    }
}

fn fold(text: &str) -> String {
    text.chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'á' | 'à' | 'ä' => 'a',
            'é' | 'è' | 'ë' => 'e',
            'í' | 'ì' | 'ï' => 'i',
            'ó' | 'ò' | 'ö' => 'o',
            'ú' | 'ù' | 'ü' => 'u',
            other => other,
        })
        .collect()
}
