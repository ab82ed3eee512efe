//! Definition lookup by identifier.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::monster_data::MonsterDefinition;
use super::unit_data::UnitDefinition;
use crate::error::ConfigurationError;

/// Serialized shape of a [`Catalog`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogData {
    /// Placeable unit kinds. Ids must be unique; a missing list is empty.
    #[serde(default)]
    pub units: Vec<UnitDefinition>,
    /// Spawnable monster kinds. Ids must be unique; a missing list is empty.
    #[serde(default)]
    pub monsters: Vec<MonsterDefinition>,
}

/// All unit and monster definitions available to a match.
///
/// # Example RON
///
/// ```ron
/// Catalog(
///     units: [UnitDefinition(...), ...],
///     monsters: [MonsterDefinition(...), ...],
/// )
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CatalogData", into = "CatalogData")]
pub struct Catalog {
    units: BTreeMap<String, UnitDefinition>,
    monsters: BTreeMap<String, MonsterDefinition>,
}

impl Catalog {
    /// Build a catalog, rejecting duplicate identifiers.
    pub fn new(
        units: Vec<UnitDefinition>,
        monsters: Vec<MonsterDefinition>,
    ) -> Result<Self, ConfigurationError> {
        let mut catalog = Self::default();
        for unit in units {
            if catalog.units.contains_key(&unit.id) {
                return Err(ConfigurationError::DuplicateDefinition(unit.id));
            }
            catalog.units.insert(unit.id.clone(), unit);
        }
        for monster in monsters {
            if catalog.monsters.contains_key(&monster.id) {
                return Err(ConfigurationError::DuplicateDefinition(monster.id));
            }
            catalog.monsters.insert(monster.id.clone(), monster);
        }
        Ok(catalog)
    }

    /// Parse a catalog from RON text.
    pub fn from_ron_str(text: &str) -> Result<Self, ConfigurationError> {
        let data: CatalogData =
            ron::from_str(text).map_err(|e| ConfigurationError::DataParse(e.to_string()))?;
        Self::try_from(data)
    }

    /// Look up a unit definition.
    #[must_use]
    pub fn unit(&self, id: &str) -> Option<&UnitDefinition> {
        self.units.get(id)
    }

    /// Look up a monster definition.
    #[must_use]
    pub fn monster(&self, id: &str) -> Option<&MonsterDefinition> {
        self.monsters.get(id)
    }

    /// Unit definitions ordered by id.
    pub fn units(&self) -> impl Iterator<Item = &UnitDefinition> {
        self.units.values()
    }

    /// Monster definitions ordered by id.
    pub fn monsters(&self) -> impl Iterator<Item = &MonsterDefinition> {
        self.monsters.values()
    }
}

impl TryFrom<CatalogData> for Catalog {
    type Error = ConfigurationError;

    fn try_from(data: CatalogData) -> Result<Self, Self::Error> {
        Self::new(data.units, data.monsters)
    }
}

impl From<Catalog> for CatalogData {
    fn from(catalog: Catalog) -> Self {
        Self {
            units: catalog.units.into_values().collect(),
            monsters: catalog.monsters.into_values().collect(),
        }
    }
}
