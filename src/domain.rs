use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the three classification axes an image is indexed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Species,
    OrganTissue,
    MicroscopeType,
}

impl Dimension {
    /// Fixed message used in 404 bodies. Part of the public API contract;
    /// clients match on these strings.
    pub fn not_found_detail(self) -> &'static str {
        match self {
            Dimension::Species => "Species not found",
            Dimension::OrganTissue => "Organ/Tissue not found",
            Dimension::MicroscopeType => "Microscope Type not found",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dimension::Species => write!(f, "species"),
            Dimension::OrganTissue => write!(f, "organ/tissue"),
            Dimension::MicroscopeType => write!(f, "microscope type"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpeciesId(i64);

impl SpeciesId {
    pub fn new(raw: i64) -> Self {
        Self(raw)
    }

    pub fn as_i64(self) -> i64 {
        self.0
    }
}

impl fmt::Display for SpeciesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrganTissueId(i64);

impl OrganTissueId {
    pub fn new(raw: i64) -> Self {
        Self(raw)
    }

    pub fn as_i64(self) -> i64 {
        self.0
    }
}

impl fmt::Display for OrganTissueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MicroscopeTypeId(i64);

impl MicroscopeTypeId {
    pub fn new(raw: i64) -> Self {
        Self(raw)
    }

    pub fn as_i64(self) -> i64 {
        self.0
    }
}

impl fmt::Display for MicroscopeTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Species {
    pub id: SpeciesId,
    pub name: String,
}

/// An organ or tissue label scoped to one species. Names repeat across
/// species; each row is a distinct entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrganTissue {
    pub id: OrganTissueId,
    pub name: String,
    pub species_id: SpeciesId,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MicroscopeType {
    pub id: MicroscopeTypeId,
    pub name: String,
}

/// A raw image row as stored, foreign keys unresolved.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    pub id: i64,
    pub thumbnail: String,
    pub description: String,
    pub em_image_viewer_url: String,
    pub image_size: String,
    pub species_id: SpeciesId,
    pub organ_tissue_id: OrganTissueId,
    pub microscope_type_id: MicroscopeTypeId,
}

/// An image row awaiting insertion, before the store assigns its id.
#[derive(Debug, Clone)]
pub struct NewImage {
    pub thumbnail: String,
    pub description: String,
    pub em_image_viewer_url: String,
    pub image_size: String,
    pub species_id: SpeciesId,
    pub organ_tissue_id: OrganTissueId,
    pub microscope_type_id: MicroscopeTypeId,
}

/// Optional name filters accepted by the image search endpoint.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ImageFilter {
    pub species_name: Option<String>,
    pub organ_tissue: Option<String>,
    pub microscope_type: Option<String>,
}

impl ImageFilter {
    /// Treat empty-string query values as absent filters. `?species_name=`
    /// means "no species filter", not a species named "".
    pub fn normalized(self) -> Self {
        fn drop_empty(value: Option<String>) -> Option<String> {
            value.filter(|name| !name.is_empty())
        }
        Self {
            species_name: drop_empty(self.species_name),
            organ_tissue: drop_empty(self.organ_tissue),
            microscope_type: drop_empty(self.microscope_type),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.species_name.is_none() && self.organ_tissue.is_none() && self.microscope_type.is_none()
    }
}

/// Conjunctive id predicate over the images table. `None` axes are
/// unconstrained; the default selection matches every image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImageSelection {
    pub species_id: Option<SpeciesId>,
    pub organ_tissue_id: Option<OrganTissueId>,
    pub microscope_type_id: Option<MicroscopeTypeId>,
}

/// A denormalized image row with foreign keys resolved to display names.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedImage {
    pub thumbnail: String,
    pub id: i64,
    pub description: String,
    pub em_image_viewer_url: String,
    pub species: String,
    pub organ_tissue: String,
    pub microscope_type: String,
    pub image_size: String,
}
