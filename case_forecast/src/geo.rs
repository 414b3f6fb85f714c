//! Geographic entity identifiers

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Separator between the country and region parts of a token
pub const GEO_SEPARATOR: &str = "__";

/// A country, optionally narrowed to one of its regions
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GeoId {
    country: String,
    region: Option<String>,
}

impl GeoId {
    /// Create an identifier; an empty region name means the whole country
    pub fn new(country: impl Into<String>, region: Option<impl Into<String>>) -> Self {
        let region = region.map(Into::into).filter(|r: &String| !r.is_empty());
        Self {
            country: country.into(),
            region,
        }
    }

    /// Identifier for a whole country
    pub fn country(country: impl Into<String>) -> Self {
        Self {
            country: country.into(),
            region: None,
        }
    }

    /// Parse a `"{country}__{region}"` token
    pub fn parse(token: &str) -> Result<Self> {
        let (country, region) = token.split_once(GEO_SEPARATOR).ok_or_else(|| {
            ForecastError::DataError(format!(
                "GeoID '{}' has no '{}' separator",
                token, GEO_SEPARATOR
            ))
        })?;

        if country.is_empty() {
            return Err(ForecastError::DataError(format!(
                "GeoID '{}' has an empty country name",
                token
            )));
        }

        Ok(Self::new(country, Some(region)))
    }

    /// Opaque token used as the internal join key
    pub fn token(&self) -> String {
        format!(
            "{}{}{}",
            self.country,
            GEO_SEPARATOR,
            self.region.as_deref().unwrap_or("")
        )
    }

    /// Country name
    pub fn country_name(&self) -> &str {
        &self.country
    }

    /// Region name, if the entity is a region
    pub fn region_name(&self) -> Option<&str> {
        self.region.as_deref()
    }
}

impl fmt::Display for GeoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.token())
    }
}

/// Entities of the requested countries, in request order and then in the
/// order of `entities`. An empty request selects every entity.
pub fn select_entities(entities: &[GeoId], countries: &[String]) -> Vec<GeoId> {
    let mut seen: HashSet<&GeoId> = HashSet::with_capacity(entities.len());

    if countries.is_empty() {
        return entities
            .iter()
            .filter(|geo| seen.insert(*geo))
            .cloned()
            .collect();
    }

    let mut by_country: HashMap<&str, Vec<&GeoId>> = HashMap::new();
    for geo in entities {
        by_country.entry(geo.country_name()).or_default().push(geo);
    }

    let mut selected = Vec::new();
    for country in countries {
        for geo in by_country.get(country.as_str()).into_iter().flatten() {
            if seen.insert(*geo) {
                selected.push((*geo).clone());
            }
        }
    }

    selected
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_round_trip_with_region() {
        let geo = GeoId::new("United States", Some("Texas"));
        assert_eq!(geo.token(), "United States__Texas");
        assert_eq!(GeoId::parse(&geo.token()).unwrap(), geo);
    }

    #[test]
    fn test_country_only_uses_empty_sentinel() {
        let geo = GeoId::country("Italy");
        assert_eq!(geo.token(), "Italy__");
        let parsed = GeoId::parse("Italy__").unwrap();
        assert_eq!(parsed.region_name(), None);
        assert_eq!(parsed, geo);
    }

    #[test]
    fn test_empty_region_is_normalised() {
        assert_eq!(GeoId::new("Italy", Some("")), GeoId::country("Italy"));
    }

    #[test]
    fn test_parse_rejects_malformed_tokens() {
        assert!(GeoId::parse("Italy").is_err());
        assert!(GeoId::parse("__Lazio").is_err());
    }

    #[test]
    fn test_select_entities_by_country() {
        let entities = vec![
            GeoId::country("Italy"),
            GeoId::country("Brazil"),
            GeoId::new("Italy", Some("Lazio")),
        ];

        let selected = select_entities(&entities, &["Brazil".to_string(), "Italy".to_string()]);
        assert_eq!(
            selected,
            vec![
                GeoId::country("Brazil"),
                GeoId::country("Italy"),
                GeoId::new("Italy", Some("Lazio")),
            ]
        );

        assert_eq!(select_entities(&entities, &[]).len(), 3);
        assert!(select_entities(&entities, &["Peru".to_string()]).is_empty());
    }

    #[test]
    fn test_select_entities_never_repeats() {
        let entities = vec![
            GeoId::country("Italy"),
            GeoId::country("Italy"),
            GeoId::country("Spain"),
        ];

        let selected = select_entities(
            &entities,
            &["Italy".to_string(), "Spain".to_string(), "Italy".to_string()],
        );
        assert_eq!(selected, vec![GeoId::country("Italy"), GeoId::country("Spain")]);
        assert_eq!(select_entities(&entities, &[]).len(), 2);
    }
}
