use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use assert_matches::assert_matches;

use micrograph_catalog::catalog::Catalog;
use micrograph_catalog::domain::{
    Dimension, Image, ImageFilter, ImageSelection, MicroscopeType, MicroscopeTypeId, OrganTissue,
    OrganTissueId, Species, SpeciesId,
};
use micrograph_catalog::error::CatalogError;
use micrograph_catalog::store::CatalogStore;

#[derive(Default)]
struct MockStore {
    species: Vec<Species>,
    organs_tissues: Vec<OrganTissue>,
    microscope_types: Vec<MicroscopeType>,
    images: Vec<Image>,
    image_scans: Arc<Mutex<usize>>,
}

impl CatalogStore for MockStore {
    fn species_by_name(&self, name: &str) -> Result<Option<Species>, CatalogError> {
        Ok(self
            .species
            .iter()
            .find(|species| species.name == name)
            .cloned())
    }

    fn organ_tissue_by_name(
        &self,
        name: &str,
        scope: Option<SpeciesId>,
    ) -> Result<Option<OrganTissue>, CatalogError> {
        Ok(self
            .organs_tissues
            .iter()
            .filter(|organ| organ.name == name)
            .filter(|organ| scope.is_none_or(|species| organ.species_id == species))
            .min_by_key(|organ| organ.id.as_i64())
            .cloned())
    }

    fn microscope_type_by_name(&self, name: &str) -> Result<Option<MicroscopeType>, CatalogError> {
        Ok(self
            .microscope_types
            .iter()
            .find(|microscope| microscope.name == name)
            .cloned())
    }

    fn all_species(&self) -> Result<Vec<Species>, CatalogError> {
        Ok(self.species.clone())
    }

    fn all_organ_tissues(&self) -> Result<Vec<OrganTissue>, CatalogError> {
        Ok(self.organs_tissues.clone())
    }

    fn organ_tissues_of(&self, species: SpeciesId) -> Result<Vec<OrganTissue>, CatalogError> {
        Ok(self
            .organs_tissues
            .iter()
            .filter(|organ| organ.species_id == species)
            .cloned()
            .collect())
    }

    fn all_microscope_types(&self) -> Result<Vec<MicroscopeType>, CatalogError> {
        Ok(self.microscope_types.clone())
    }

    fn images_matching(&self, selection: &ImageSelection) -> Result<Vec<Image>, CatalogError> {
        *self.image_scans.lock().unwrap() += 1;
        let mut rows: Vec<Image> = self
            .images
            .iter()
            .filter(|image| {
                selection
                    .species_id
                    .is_none_or(|id| image.species_id == id)
                    && selection
                        .organ_tissue_id
                        .is_none_or(|id| image.organ_tissue_id == id)
                    && selection
                        .microscope_type_id
                        .is_none_or(|id| image.microscope_type_id == id)
            })
            .cloned()
            .collect();
        rows.sort_by_key(|image| image.id);
        Ok(rows)
    }

    fn species_names(&self) -> Result<HashMap<SpeciesId, String>, CatalogError> {
        Ok(self
            .species
            .iter()
            .map(|species| (species.id, species.name.clone()))
            .collect())
    }

    fn organ_tissue_names(&self) -> Result<HashMap<OrganTissueId, String>, CatalogError> {
        Ok(self
            .organs_tissues
            .iter()
            .map(|organ| (organ.id, organ.name.clone()))
            .collect())
    }

    fn microscope_type_names(&self) -> Result<HashMap<MicroscopeTypeId, String>, CatalogError> {
        Ok(self
            .microscope_types
            .iter()
            .map(|microscope| (microscope.id, microscope.name.clone()))
            .collect())
    }
}

fn image(
    id: i64,
    species_id: i64,
    organ_tissue_id: i64,
    microscope_type_id: i64,
    size: &str,
) -> Image {
    Image {
        id,
        thumbnail: format!("https://example.com/images/{id}.jpg"),
        description: format!("image {id}"),
        em_image_viewer_url: format!("https://example.com/viewer/{id}"),
        image_size: size.to_string(),
        species_id: SpeciesId::new(species_id),
        organ_tissue_id: OrganTissueId::new(organ_tissue_id),
        microscope_type_id: MicroscopeTypeId::new(microscope_type_id),
    }
}

/// Two species, a "Brain" organ row under each (duplicate label), two
/// microscope types, three images.
fn sample_store() -> MockStore {
    MockStore {
        species: vec![
            Species {
                id: SpeciesId::new(1),
                name: "Mouse".to_string(),
            },
            Species {
                id: SpeciesId::new(2),
                name: "Rat".to_string(),
            },
        ],
        organs_tissues: vec![
            OrganTissue {
                id: OrganTissueId::new(1),
                name: "Brain".to_string(),
                species_id: SpeciesId::new(1),
            },
            OrganTissue {
                id: OrganTissueId::new(2),
                name: "Heart".to_string(),
                species_id: SpeciesId::new(1),
            },
            OrganTissue {
                id: OrganTissueId::new(10),
                name: "Brain".to_string(),
                species_id: SpeciesId::new(2),
            },
        ],
        microscope_types: vec![
            MicroscopeType {
                id: MicroscopeTypeId::new(1),
                name: "Light Microscope".to_string(),
            },
            MicroscopeType {
                id: MicroscopeTypeId::new(2),
                name: "Electron Microscope".to_string(),
            },
        ],
        images: vec![
            image(1, 1, 1, 1, "3MB"),
            image(2, 1, 2, 2, "5MB"),
            image(3, 2, 10, 1, "7MB"),
        ],
        image_scans: Arc::new(Mutex::new(0)),
    }
}

fn species_filter(name: &str) -> ImageFilter {
    ImageFilter {
        species_name: Some(name.to_string()),
        ..ImageFilter::default()
    }
}

#[test]
fn unknown_names_fail_per_dimension() {
    let catalog = Catalog::new(sample_store());

    let err = catalog.resolve_species("Cat").unwrap_err();
    assert_matches!(
        err,
        CatalogError::UnknownName {
            dimension: Dimension::Species,
            ..
        }
    );

    let err = catalog.resolve_organ_tissue("Tail", None).unwrap_err();
    assert_matches!(
        err,
        CatalogError::UnknownName {
            dimension: Dimension::OrganTissue,
            ..
        }
    );

    let err = catalog.resolve_microscope_type("X-Ray").unwrap_err();
    assert_matches!(
        err,
        CatalogError::UnknownName {
            dimension: Dimension::MicroscopeType,
            ..
        }
    );
}

#[test]
fn name_resolution_is_case_sensitive() {
    let catalog = Catalog::new(sample_store());
    let err = catalog.resolve_species("mouse").unwrap_err();
    assert_matches!(
        err,
        CatalogError::UnknownName {
            dimension: Dimension::Species,
            ..
        }
    );
}

#[test]
fn zero_filters_return_every_image_enriched() {
    let catalog = Catalog::new(sample_store());

    let results = catalog.search_images(&ImageFilter::default()).unwrap();
    assert_eq!(results.len(), 3);
    assert_eq!(
        results.iter().map(|row| row.id).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );

    let first = &results[0];
    assert_eq!(first.species, "Mouse");
    assert_eq!(first.organ_tissue, "Brain");
    assert_eq!(first.microscope_type, "Light Microscope");
    assert_eq!(first.image_size, "3MB");
    assert_eq!(first.thumbnail, "https://example.com/images/1.jpg");
    assert_eq!(first.em_image_viewer_url, "https://example.com/viewer/1");
}

#[test]
fn repeated_searches_yield_identical_sequences() {
    let catalog = Catalog::new(sample_store());
    let filter = species_filter("Mouse");

    let first = catalog.search_images(&filter).unwrap();
    let second = catalog.search_images(&filter).unwrap();
    assert_eq!(first, second);
}

#[test]
fn resolving_filters_with_no_joint_match_returns_empty() {
    let catalog = Catalog::new(sample_store());
    let filter = ImageFilter {
        species_name: Some("Rat".to_string()),
        microscope_type: Some("Electron Microscope".to_string()),
        ..ImageFilter::default()
    };

    let results = catalog.search_images(&filter).unwrap();
    assert!(results.is_empty());
}

#[test]
fn unknown_species_short_circuits_before_image_scan() {
    let store = sample_store();
    let catalog = Catalog::new(store);

    let filter = ImageFilter {
        species_name: Some("Cat".to_string()),
        organ_tissue: Some("Bogus".to_string()),
        microscope_type: Some("Bogus".to_string()),
    };
    let err = catalog.search_images(&filter).unwrap_err();
    assert_matches!(
        err,
        CatalogError::UnknownName {
            dimension: Dimension::Species,
            ..
        }
    );
}

#[test]
fn failed_resolution_never_reaches_the_image_table() {
    let store = sample_store();
    let scans = Arc::clone(&store.image_scans);
    let catalog = Catalog::new(store);

    let _ = catalog.search_images(&species_filter("Cat"));
    assert_eq!(*scans.lock().unwrap(), 0);

    catalog.search_images(&species_filter("Mouse")).unwrap();
    assert_eq!(*scans.lock().unwrap(), 1);
}

#[test]
fn organ_errors_take_precedence_over_microscope_errors() {
    let catalog = Catalog::new(sample_store());
    let filter = ImageFilter {
        organ_tissue: Some("Bogus".to_string()),
        microscope_type: Some("Bogus".to_string()),
        ..ImageFilter::default()
    };

    let err = catalog.search_images(&filter).unwrap_err();
    assert_matches!(
        err,
        CatalogError::UnknownName {
            dimension: Dimension::OrganTissue,
            ..
        }
    );
}

#[test]
fn organ_resolution_is_scoped_by_resolved_species() {
    let catalog = Catalog::new(sample_store());

    let filter = ImageFilter {
        species_name: Some("Rat".to_string()),
        organ_tissue: Some("Brain".to_string()),
        ..ImageFilter::default()
    };
    let results = catalog.search_images(&filter).unwrap();
    assert_eq!(results.iter().map(|row| row.id).collect::<Vec<_>>(), vec![3]);

    // Without a species filter the smallest-id "Brain" row wins.
    let filter = ImageFilter {
        organ_tissue: Some("Brain".to_string()),
        ..ImageFilter::default()
    };
    let results = catalog.search_images(&filter).unwrap();
    assert_eq!(results.iter().map(|row| row.id).collect::<Vec<_>>(), vec![1]);
}

#[test]
fn enrichment_round_trips_to_original_foreign_keys() {
    let store = sample_store();
    let raw = store.images_matching(&ImageSelection::default()).unwrap();
    let catalog = Catalog::new(store);

    let enriched = catalog.search_images(&ImageFilter::default()).unwrap();
    assert_eq!(enriched.len(), raw.len());

    for (row, original) in enriched.iter().zip(&raw) {
        let species_id = catalog.resolve_species(&row.species).unwrap();
        assert_eq!(species_id, original.species_id);

        let organ_id = catalog
            .resolve_organ_tissue(&row.organ_tissue, Some(species_id))
            .unwrap();
        assert_eq!(organ_id, original.organ_tissue_id);

        let microscope_id = catalog
            .resolve_microscope_type(&row.microscope_type)
            .unwrap();
        assert_eq!(microscope_id, original.microscope_type_id);
    }
}

#[test]
fn dangling_foreign_key_is_a_fatal_error() {
    let mut store = sample_store();
    store.images.push(image(4, 1, 1, 99, "1MB"));
    let catalog = Catalog::new(store);

    let err = catalog.search_images(&ImageFilter::default()).unwrap_err();
    assert_matches!(
        err,
        CatalogError::DanglingReference {
            dimension: Dimension::MicroscopeType,
            image_id: 4,
            id: 99,
        }
    );
}

#[test]
fn species_detail_lists_scoped_organs_and_global_microscopes() {
    let catalog = Catalog::new(sample_store());

    let detail = catalog.species_detail("Mouse").unwrap();
    assert_eq!(detail.organs_tissues, vec!["Brain", "Heart"]);
    assert_eq!(
        detail.microscope_types,
        vec!["Light Microscope", "Electron Microscope"]
    );

    let err = catalog.species_detail("Cat").unwrap_err();
    assert_matches!(
        err,
        CatalogError::UnknownName {
            dimension: Dimension::Species,
            ..
        }
    );
}

#[test]
fn overview_returns_all_three_collections() {
    let catalog = Catalog::new(sample_store());

    let overview = catalog.overview().unwrap();
    assert_eq!(overview.species.len(), 2);
    assert_eq!(overview.organs_tissues.len(), 3);
    assert_eq!(overview.microscope_types.len(), 2);
}
