use crate::prelude::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub type ArtworkId = u32;

/// Geographic position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }
}

/// Catalog entry for a point of interest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artwork {
    pub id: ArtworkId,
    pub name: String,
    pub artist: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub coords: Coordinates,
    /// Trigger radius in miles.
    #[serde(rename = "triggerDistance")]
    pub trigger_distance: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub art_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
}

/// Read-only, validated collection of artworks in listing order.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    artworks: Vec<Artwork>,
    index: HashMap<ArtworkId, usize>,
}

impl Catalog {
    /// Builds a catalog, rejecting duplicate ids and unusable coordinates or radii.
    pub fn new(artworks: Vec<Artwork>) -> EngineResult<Self> {
        let mut index = HashMap::with_capacity(artworks.len());
        for (position, artwork) in artworks.iter().enumerate() {
            if !artwork.coords.is_finite() {
                return Err(EngineError::InvalidCatalog(format!(
                    "artwork {} has non-finite coordinates",
                    artwork.id
                )));
            }
            if !artwork.trigger_distance.is_finite() || artwork.trigger_distance < 0.0 {
                return Err(EngineError::InvalidCatalog(format!(
                    "artwork {} has invalid trigger distance {}",
                    artwork.id, artwork.trigger_distance
                )));
            }
            if index.insert(artwork.id, position).is_some() {
                return Err(EngineError::InvalidCatalog(format!(
                    "duplicate artwork id {}",
                    artwork.id
                )));
            }
        }
        Ok(Self { artworks, index })
    }

    /// Parses a JSON array of artworks.
    pub fn from_json(json: &str) -> EngineResult<Self> {
        let artworks: Vec<Artwork> = serde_json::from_str(json)
            .map_err(|err| EngineError::InvalidCatalog(err.to_string()))?;
        Self::new(artworks)
    }

    /// Looks up an artwork; unknown ids resolve to `None`.
    pub fn get(&self, id: ArtworkId) -> Option<&Artwork> {
        self.index.get(&id).map(|&position| &self.artworks[position])
    }

    pub fn artworks(&self) -> &[Artwork] {
        &self.artworks
    }

    pub fn len(&self) -> usize {
        self.artworks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artworks.is_empty()
    }
}

#[cfg(test)]
pub(crate) fn test_artwork(id: ArtworkId, latitude: f64, longitude: f64, radius: f64) -> Artwork {
    Artwork {
        id,
        name: format!("Artwork {}", id),
        artist: "Unknown".into(),
        description: String::new(),
        image: None,
        coords: Coordinates::new(latitude, longitude),
        trigger_distance: radius,
        art_type: None,
        year: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_rejects_duplicate_ids() {
        let err = Catalog::new(vec![
            test_artwork(1, 39.0, -95.0, 0.01),
            test_artwork(1, 39.1, -95.0, 0.01),
        ])
        .unwrap_err();
        assert!(matches!(err, EngineError::InvalidCatalog(_)));
    }

    #[test]
    fn catalog_rejects_negative_radius() {
        assert!(Catalog::new(vec![test_artwork(7, 39.0, -95.0, -1.0)]).is_err());
    }

    #[test]
    fn catalog_rejects_non_finite_coordinates() {
        for (latitude, longitude) in [(f64::NAN, -95.0), (39.0, f64::INFINITY)] {
            let err = Catalog::new(vec![test_artwork(2, latitude, longitude, 0.01)]).unwrap_err();
            assert!(matches!(err, EngineError::InvalidCatalog(_)));
        }
    }

    #[test]
    fn catalog_rejects_non_finite_radius() {
        for radius in [f64::NAN, f64::INFINITY] {
            let err = Catalog::new(vec![test_artwork(5, 39.0, -95.0, radius)]).unwrap_err();
            assert!(matches!(err, EngineError::InvalidCatalog(_)));
        }
    }

    #[test]
    fn unknown_id_resolves_to_none() {
        let catalog = Catalog::new(vec![test_artwork(3, 39.0, -95.0, 0.01)]).unwrap();
        assert_eq!(catalog.get(3).map(|art| art.id), Some(3));
        assert!(catalog.get(4).is_none());
    }

    #[test]
    fn parses_catalog_wire_shape() {
        let json = r#"[
            {
                "id": 12,
                "name": "Keeper of the Plains",
                "artist": "Blackbear Bosin",
                "description": "Steel sculpture at the river confluence",
                "coords": { "latitude": 37.6922, "longitude": -97.3456 },
                "triggerDistance": 0.0095,
                "art_type": "sculpture",
                "year": 1974
            }
        ]"#;
        let catalog = Catalog::from_json(json).unwrap();
        let art = catalog.get(12).unwrap();
        assert_eq!(art.trigger_distance, 0.0095);
        assert_eq!(art.year, Some(1974));
        assert!(art.image.is_none());
    }
}
