use std::collections::HashMap;
use std::sync::Arc;

use crate::models::{StationMetadata, VariableMetadata};

/// The variable glossary and station registry, loaded once per process and
/// shared read-only (`Arc<ReferenceTables>`) by every join of a run.
#[derive(Debug, Clone, Default)]
pub struct ReferenceTables {
    variables: HashMap<String, Arc<VariableMetadata>>,
    stations: HashMap<u64, Arc<StationMetadata>>,
    /// Glossary tags in file order
    variable_order: Vec<String>,
}

impl ReferenceTables {
    /// Build lookup tables; on duplicate keys the first row wins.
    pub fn new(variables: Vec<VariableMetadata>, stations: Vec<StationMetadata>) -> Self {
        let mut tables = Self::default();

        for variable in variables {
            let tag = variable.tag.trim().to_string();
            if !tables.variables.contains_key(&tag) {
                tables.variable_order.push(tag.clone());
                tables.variables.insert(tag, Arc::new(variable));
            }
        }

        for station in stations {
            tables
                .stations
                .entry(station.code)
                .or_insert_with(|| Arc::new(station));
        }

        tables
    }

    pub fn variable(&self, tag: &str) -> Option<&Arc<VariableMetadata>> {
        self.variables.get(tag)
    }

    pub fn station(&self, code: u64) -> Option<&Arc<StationMetadata>> {
        self.stations.get(&code)
    }

    pub fn variable_count(&self) -> usize {
        self.variables.len()
    }

    pub fn station_count(&self) -> usize {
        self.stations.len()
    }

    /// Glossary rows in file order.
    pub fn variables(&self) -> impl Iterator<Item = &Arc<VariableMetadata>> {
        self.variable_order
            .iter()
            .filter_map(|tag| self.variables.get(tag))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_row_wins() {
        let tables = ReferenceTables::new(
            vec![
                VariableMetadata::new("TBS", "Temperatura bulbo seco", "°C"),
                VariableMetadata::new("TBS", "duplicate", "K"),
                VariableMetadata::new("VV", "Velocidad del viento", "m/s"),
            ],
            vec![
                StationMetadata::new(1, "Primera", "CESAR", "VALLEDUPAR", None, None),
                StationMetadata::new(1, "Segunda", "CESAR", "VALLEDUPAR", None, None),
            ],
        );

        assert_eq!(tables.variable_count(), 2);
        assert_eq!(tables.variable("TBS").unwrap().unit, "°C");
        assert_eq!(tables.station_count(), 1);
        assert_eq!(tables.station(1).unwrap().name, "Primera");
        assert!(tables.station(2).is_none());

        let order: Vec<&str> = tables.variables().map(|v| v.tag.as_str()).collect();
        assert_eq!(order, vec!["TBS", "VV"]);
    }
}
