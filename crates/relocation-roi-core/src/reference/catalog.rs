use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::EngineResult;

use super::country::{builtin_countries, CountryProfile};
use super::persona::{builtin_personas, Persona};

/// Ordered persona and country tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub personas: Vec<Persona>,
    pub countries: Vec<CountryProfile>,
}

impl Catalog {
    /// The tables shipped with the engine.
    pub fn builtin() -> Self {
        Catalog {
            personas: builtin_personas(),
            countries: builtin_countries(),
        }
    }

    /// Parse and validate a catalog from JSON.
    pub fn from_json_str(json: &str) -> EngineResult<Self> {
        let catalog: Catalog = serde_json::from_str(json)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Check every record and reject duplicate ids.
    pub fn validate(&self) -> EngineResult<()> {
        if self.personas.is_empty() || self.countries.is_empty() {
            return Err(EngineError::InsufficientData(
                "Catalog needs at least one persona and one country".into(),
            ));
        }
        for (i, p) in self.personas.iter().enumerate() {
            p.validate()?;
            if self.personas[..i].iter().any(|other| other.id == p.id) {
                return Err(EngineError::InvalidInput {
                    field: "personas".into(),
                    reason: format!("Duplicate persona id '{}'", p.id),
                });
            }
        }
        for (i, c) in self.countries.iter().enumerate() {
            c.validate()?;
            if self.countries[..i].iter().any(|other| other.id == c.id) {
                return Err(EngineError::InvalidInput {
                    field: "countries".into(),
                    reason: format!("Duplicate country id '{}'", c.id),
                });
            }
        }
        Ok(())
    }

    pub fn persona(&self, id: &str) -> EngineResult<&Persona> {
        self.personas
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| EngineError::UnknownReference {
                kind: "persona".into(),
                id: id.to_string(),
            })
    }

    /// Look up a country by id, case-insensitively.
    pub fn country(&self, id: &str) -> EngineResult<&CountryProfile> {
        self.countries
            .iter()
            .find(|c| c.id.eq_ignore_ascii_case(id))
            .ok_or_else(|| EngineError::UnknownReference {
                kind: "country".into(),
                id: id.to_string(),
            })
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Catalog::builtin()
    }
}
