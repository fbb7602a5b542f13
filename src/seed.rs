use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::info;

use crate::domain::{MicroscopeTypeId, NewImage, OrganTissueId, SpeciesId};
use crate::error::CatalogError;
use crate::store::SqliteStore;

pub const SPECIES: [&str; 5] = ["Mouse", "Rat", "Human", "Arabidopsis", "Tobacco"];

pub const ORGANS_TISSUES: [&str; 16] = [
    "Brain",
    "Heart",
    "Liver",
    "Kidney",
    "Ileum",
    "Spleen",
    "Pancreas",
    "Lung",
    "Skin",
    "Blood cell",
    "Root",
    "Leaf",
    "Flower",
    "Seed",
    "Stem",
    "Cultured Cell",
];

pub const MICROSCOPE_TYPES: [&str; 4] = [
    "Light Microscope",
    "Electron Microscope",
    "Fluorescence Microscope",
    "Confocal Microscope",
];

/// Fraction of (species, organ, microscope) combinations that get an image.
const IMAGE_DENSITY: f64 = 0.2;

#[derive(Debug, Clone, Serialize)]
pub struct SeedSummary {
    pub species: usize,
    pub organs_tissues: usize,
    pub microscope_types: usize,
    pub images: usize,
}

/// One-time population of an empty catalog with synthetic sample data.
/// Every organ/tissue label is replicated under every species, and each
/// generated image references an organ row belonging to its own species,
/// so seeded stores satisfy the referential-consistency invariant the
/// query engine relies on. The same `rng_seed` always produces the same
/// catalog.
pub fn seed(store: &SqliteStore, rng_seed: u64) -> Result<SeedSummary, CatalogError> {
    if !store.is_empty()? {
        return Err(CatalogError::AlreadySeeded);
    }

    let mut rng = StdRng::seed_from_u64(rng_seed);

    let mut microscope_ids = Vec::with_capacity(MICROSCOPE_TYPES.len());
    for name in MICROSCOPE_TYPES {
        microscope_ids.push(store.insert_microscope_type(name)?);
    }

    let mut organ_total = 0;
    let mut images = 0;
    for species_name in SPECIES {
        let species_id = store.insert_species(species_name)?;

        let mut organ_ids = Vec::with_capacity(ORGANS_TISSUES.len());
        for organ_name in ORGANS_TISSUES {
            organ_ids.push(store.insert_organ_tissue(organ_name, species_id)?);
        }
        organ_total += organ_ids.len();

        for (organ_name, organ_id) in ORGANS_TISSUES.iter().copied().zip(organ_ids.iter().copied())
        {
            for (microscope_name, microscope_id) in MICROSCOPE_TYPES
                .iter()
                .copied()
                .zip(microscope_ids.iter().copied())
            {
                if rng.gen_range(0.0..1.0) < IMAGE_DENSITY {
                    let size_mb = rng.gen_range(1..=10);
                    store.insert_image(&sample_image(
                        species_name,
                        organ_name,
                        microscope_name,
                        species_id,
                        organ_id,
                        microscope_id,
                        size_mb,
                    ))?;
                    images += 1;
                }
            }
        }
    }

    let summary = SeedSummary {
        species: SPECIES.len(),
        organs_tissues: organ_total,
        microscope_types: MICROSCOPE_TYPES.len(),
        images,
    };
    info!(
        species = summary.species,
        organs_tissues = summary.organs_tissues,
        microscope_types = summary.microscope_types,
        images = summary.images,
        "catalog seeded"
    );
    Ok(summary)
}

fn sample_image(
    species_name: &str,
    organ_name: &str,
    microscope_name: &str,
    species_id: SpeciesId,
    organ_tissue_id: OrganTissueId,
    microscope_type_id: MicroscopeTypeId,
    size_mb: u32,
) -> NewImage {
    NewImage {
        thumbnail: format!(
            "https://example.com/images/{species_id}_{organ_tissue_id}_{microscope_type_id}.jpg"
        ),
        description: format!(
            "Image of {organ_name} from {species_name} captured by {microscope_name}"
        ),
        em_image_viewer_url: format!(
            "https://example.com/viewer/{species_id}_{organ_tissue_id}_{microscope_type_id}"
        ),
        image_size: format!("{size_mb}MB"),
        species_id,
        organ_tissue_id,
        microscope_type_id,
    }
}
