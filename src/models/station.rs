use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::utils::coordinates::deserialize_optional_coordinate;

/// One row of the station registry (CNE), keyed by `code`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct StationMetadata {
    #[serde(alias = "CODIGO", alias = "Codigo", alias = "codigo")]
    pub code: u64,

    #[serde(alias = "nombre", alias = "NOMBRE", alias = "Nombre")]
    #[validate(length(min = 1))]
    pub name: String,

    #[serde(alias = "CATEGORIA", alias = "categoria", default)]
    pub category: Option<String>,

    #[serde(alias = "DEPARTAMENTO", alias = "departamento")]
    pub department: String,

    #[serde(alias = "MUNICIPIO", alias = "municipio")]
    pub municipality: String,

    #[serde(
        alias = "latitud",
        alias = "LATITUD",
        default,
        deserialize_with = "deserialize_optional_coordinate"
    )]
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,

    #[serde(
        alias = "longitud",
        alias = "LONGITUD",
        default,
        deserialize_with = "deserialize_optional_coordinate"
    )]
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,

    #[serde(
        alias = "altitud",
        alias = "ALTITUD",
        default,
        deserialize_with = "csv::invalid_option"
    )]
    pub elevation: Option<f64>,
}

impl StationMetadata {
    pub fn new(
        code: u64,
        name: impl Into<String>,
        department: impl Into<String>,
        municipality: impl Into<String>,
        latitude: Option<f64>,
        longitude: Option<f64>,
    ) -> Self {
        Self {
            code,
            name: name.into(),
            category: None,
            department: department.into(),
            municipality: municipality.into(),
            latitude,
            longitude,
            elevation: None,
        }
    }

    pub fn has_coordinates(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }
}
