use serde::Serialize;
use tracing::debug;

use crate::domain::{
    Dimension, EnrichedImage, Image, ImageFilter, ImageSelection, MicroscopeType,
    MicroscopeTypeId, OrganTissue, OrganTissueId, Species, SpeciesId,
};
use crate::error::CatalogError;
use crate::store::CatalogStore;

/// Every dimension collection in full, for the index payload.
#[derive(Debug, Clone, Serialize)]
pub struct Overview {
    pub species: Vec<Species>,
    pub organs_tissues: Vec<OrganTissue>,
    pub microscope_types: Vec<MicroscopeType>,
}

/// The organ/tissue names under one species, plus the global microscope
/// type list.
#[derive(Debug, Clone, Serialize)]
pub struct SpeciesDetail {
    pub organs_tissues: Vec<String>,
    pub microscope_types: Vec<String>,
}

/// Read-only query engine over a catalog store: resolves filter names to
/// ids, scans the image table, and denormalizes matches for display. Holds
/// no state of its own; every call re-reads the store.
#[derive(Clone)]
pub struct Catalog<S: CatalogStore> {
    store: S,
}

impl<S: CatalogStore> Catalog<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn overview(&self) -> Result<Overview, CatalogError> {
        Ok(Overview {
            species: self.store.all_species()?,
            organs_tissues: self.store.all_organ_tissues()?,
            microscope_types: self.store.all_microscope_types()?,
        })
    }

    pub fn species_detail(&self, species_name: &str) -> Result<SpeciesDetail, CatalogError> {
        let species_id = self.resolve_species(species_name)?;
        let organs = self.store.organ_tissues_of(species_id)?;
        let microscopes = self.store.all_microscope_types()?;
        Ok(SpeciesDetail {
            organs_tissues: organs.into_iter().map(|organ| organ.name).collect(),
            microscope_types: microscopes
                .into_iter()
                .map(|microscope| microscope.name)
                .collect(),
        })
    }

    /// Resolve the supplied filters, scan, and enrich. Fails before touching
    /// the image table when any filter name does not resolve.
    pub fn search_images(&self, filter: &ImageFilter) -> Result<Vec<EnrichedImage>, CatalogError> {
        let selection = self.compose_selection(filter)?;
        let rows = self.store.images_matching(&selection)?;
        debug!(matches = rows.len(), "image scan complete");
        self.enrich(rows)
    }

    pub fn resolve_species(&self, name: &str) -> Result<SpeciesId, CatalogError> {
        self.store
            .species_by_name(name)?
            .map(|species| species.id)
            .ok_or_else(|| CatalogError::UnknownName {
                dimension: Dimension::Species,
                name: name.to_string(),
            })
    }

    pub fn resolve_organ_tissue(
        &self,
        name: &str,
        scope: Option<SpeciesId>,
    ) -> Result<OrganTissueId, CatalogError> {
        self.store
            .organ_tissue_by_name(name, scope)?
            .map(|organ| organ.id)
            .ok_or_else(|| CatalogError::UnknownName {
                dimension: Dimension::OrganTissue,
                name: name.to_string(),
            })
    }

    pub fn resolve_microscope_type(&self, name: &str) -> Result<MicroscopeTypeId, CatalogError> {
        self.store
            .microscope_type_by_name(name)?
            .map(|microscope| microscope.id)
            .ok_or_else(|| CatalogError::UnknownName {
                dimension: Dimension::MicroscopeType,
                name: name.to_string(),
            })
    }

    /// Resolve each present filter left to right (species, then
    /// organ/tissue, then microscope type), failing fast on the first
    /// unknown name. A species id resolved here narrows the organ/tissue
    /// lookup, since organ names are only unique within one species.
    pub fn compose_selection(&self, filter: &ImageFilter) -> Result<ImageSelection, CatalogError> {
        let mut selection = ImageSelection::default();
        if let Some(name) = filter.species_name.as_deref() {
            selection.species_id = Some(self.resolve_species(name)?);
        }
        if let Some(name) = filter.organ_tissue.as_deref() {
            selection.organ_tissue_id =
                Some(self.resolve_organ_tissue(name, selection.species_id)?);
        }
        if let Some(name) = filter.microscope_type.as_deref() {
            selection.microscope_type_id = Some(self.resolve_microscope_type(name)?);
        }
        Ok(selection)
    }

    /// Denormalize matched rows, preserving their order. The three name maps
    /// are bulk-loaded once per call rather than re-queried per row. A
    /// foreign key missing from its map means the store broke referential
    /// consistency; that surfaces as a fatal error, never a blank field.
    fn enrich(&self, rows: Vec<Image>) -> Result<Vec<EnrichedImage>, CatalogError> {
        let species_names = self.store.species_names()?;
        let organ_names = self.store.organ_tissue_names()?;
        let microscope_names = self.store.microscope_type_names()?;

        rows.into_iter()
            .map(|image| {
                let species =
                    species_names
                        .get(&image.species_id)
                        .ok_or(CatalogError::DanglingReference {
                            dimension: Dimension::Species,
                            image_id: image.id,
                            id: image.species_id.as_i64(),
                        })?;
                let organ_tissue = organ_names.get(&image.organ_tissue_id).ok_or(
                    CatalogError::DanglingReference {
                        dimension: Dimension::OrganTissue,
                        image_id: image.id,
                        id: image.organ_tissue_id.as_i64(),
                    },
                )?;
                let microscope_type = microscope_names.get(&image.microscope_type_id).ok_or(
                    CatalogError::DanglingReference {
                        dimension: Dimension::MicroscopeType,
                        image_id: image.id,
                        id: image.microscope_type_id.as_i64(),
                    },
                )?;

                Ok(EnrichedImage {
                    thumbnail: image.thumbnail,
                    id: image.id,
                    description: image.description,
                    em_image_viewer_url: image.em_image_viewer_url,
                    species: species.clone(),
                    organ_tissue: organ_tissue.clone(),
                    microscope_type: microscope_type.clone(),
                    image_size: image.image_size,
                })
            })
            .collect()
    }
}
