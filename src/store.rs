use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use camino::Utf8Path;
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};

use crate::domain::{
    Image, ImageSelection, MicroscopeType, MicroscopeTypeId, NewImage, OrganTissue, OrganTissueId,
    Species, SpeciesId,
};
use crate::error::CatalogError;

/// Read-only lookup surface the query engine consumes. Implemented by
/// [`SqliteStore`]; tests substitute in-memory fakes.
pub trait CatalogStore: Send + Sync {
    fn species_by_name(&self, name: &str) -> Result<Option<Species>, CatalogError>;

    /// Organ/tissue names repeat across species. With a species scope the
    /// lookup is exact within that species; without one, the row with the
    /// smallest id wins.
    fn organ_tissue_by_name(
        &self,
        name: &str,
        scope: Option<SpeciesId>,
    ) -> Result<Option<OrganTissue>, CatalogError>;

    fn microscope_type_by_name(&self, name: &str) -> Result<Option<MicroscopeType>, CatalogError>;

    fn all_species(&self) -> Result<Vec<Species>, CatalogError>;

    fn all_organ_tissues(&self) -> Result<Vec<OrganTissue>, CatalogError>;

    fn organ_tissues_of(&self, species: SpeciesId) -> Result<Vec<OrganTissue>, CatalogError>;

    fn all_microscope_types(&self) -> Result<Vec<MicroscopeType>, CatalogError>;

    /// Filtered scan over the image table. Row order is by ascending id so
    /// repeated scans of an unchanged store return identical sequences.
    fn images_matching(&self, selection: &ImageSelection) -> Result<Vec<Image>, CatalogError>;

    fn species_names(&self) -> Result<HashMap<SpeciesId, String>, CatalogError>;

    fn organ_tissue_names(&self) -> Result<HashMap<OrganTissueId, String>, CatalogError>;

    fn microscope_type_names(&self) -> Result<HashMap<MicroscopeTypeId, String>, CatalogError>;
}

/// SQLite-backed catalog store. One long-lived connection per process,
/// shared read-only across requests.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn open(path: &Utf8Path) -> Result<Self, CatalogError> {
        let conn = Connection::open(path.as_std_path())
            .map_err(|err| CatalogError::Store(err.to_string()))?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, CatalogError> {
        let conn =
            Connection::open_in_memory().map_err(|err| CatalogError::Store(err.to_string()))?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, CatalogError> {
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), CatalogError> {
        self.lock()
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS species (
                    id   INTEGER PRIMARY KEY,
                    name TEXT NOT NULL UNIQUE
                );
                CREATE TABLE IF NOT EXISTS organs_tissues (
                    id         INTEGER PRIMARY KEY,
                    name       TEXT NOT NULL,
                    species_id INTEGER NOT NULL REFERENCES species(id)
                );
                CREATE TABLE IF NOT EXISTS microscope_types (
                    id   INTEGER PRIMARY KEY,
                    name TEXT NOT NULL
                );
                CREATE TABLE IF NOT EXISTS images (
                    id                  INTEGER PRIMARY KEY,
                    thumbnail           TEXT,
                    description         TEXT,
                    em_image_viewer_url TEXT,
                    image_size          TEXT,
                    species_id          INTEGER NOT NULL REFERENCES species(id),
                    organ_tissue_id     INTEGER NOT NULL REFERENCES organs_tissues(id),
                    microscope_type_id  INTEGER NOT NULL REFERENCES microscope_types(id)
                );",
            )
            .map_err(|err| CatalogError::Store(err.to_string()))
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn is_empty(&self) -> Result<bool, CatalogError> {
        let count: i64 = self
            .lock()
            .query_row("SELECT COUNT(*) FROM species", [], |row| row.get(0))
            .map_err(|err| CatalogError::Store(err.to_string()))?;
        Ok(count == 0)
    }

    pub fn insert_species(&self, name: &str) -> Result<SpeciesId, CatalogError> {
        let conn = self.lock();
        conn.execute("INSERT INTO species (name) VALUES (?1)", params![name])
            .map_err(|err| CatalogError::Store(err.to_string()))?;
        Ok(SpeciesId::new(conn.last_insert_rowid()))
    }

    pub fn insert_organ_tissue(
        &self,
        name: &str,
        species: SpeciesId,
    ) -> Result<OrganTissueId, CatalogError> {
        let conn = self.lock();
        conn.execute(
            "INSERT INTO organs_tissues (name, species_id) VALUES (?1, ?2)",
            params![name, species.as_i64()],
        )
        .map_err(|err| CatalogError::Store(err.to_string()))?;
        Ok(OrganTissueId::new(conn.last_insert_rowid()))
    }

    pub fn insert_microscope_type(&self, name: &str) -> Result<MicroscopeTypeId, CatalogError> {
        let conn = self.lock();
        conn.execute(
            "INSERT INTO microscope_types (name) VALUES (?1)",
            params![name],
        )
        .map_err(|err| CatalogError::Store(err.to_string()))?;
        Ok(MicroscopeTypeId::new(conn.last_insert_rowid()))
    }

    pub fn insert_image(&self, image: &NewImage) -> Result<i64, CatalogError> {
        let conn = self.lock();
        conn.execute(
            "INSERT INTO images (thumbnail, description, em_image_viewer_url, image_size,
                                 species_id, organ_tissue_id, microscope_type_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                image.thumbnail,
                image.description,
                image.em_image_viewer_url,
                image.image_size,
                image.species_id.as_i64(),
                image.organ_tissue_id.as_i64(),
                image.microscope_type_id.as_i64(),
            ],
        )
        .map_err(|err| CatalogError::Store(err.to_string()))?;
        Ok(conn.last_insert_rowid())
    }

    fn species_row(row: &Row<'_>) -> rusqlite::Result<Species> {
        Ok(Species {
            id: SpeciesId::new(row.get(0)?),
            name: row.get(1)?,
        })
    }

    fn organ_tissue_row(row: &Row<'_>) -> rusqlite::Result<OrganTissue> {
        Ok(OrganTissue {
            id: OrganTissueId::new(row.get(0)?),
            name: row.get(1)?,
            species_id: SpeciesId::new(row.get(2)?),
        })
    }

    fn microscope_type_row(row: &Row<'_>) -> rusqlite::Result<MicroscopeType> {
        Ok(MicroscopeType {
            id: MicroscopeTypeId::new(row.get(0)?),
            name: row.get(1)?,
        })
    }

    fn image_row(row: &Row<'_>) -> rusqlite::Result<Image> {
        Ok(Image {
            id: row.get(0)?,
            thumbnail: row.get(1)?,
            description: row.get(2)?,
            em_image_viewer_url: row.get(3)?,
            image_size: row.get(4)?,
            species_id: SpeciesId::new(row.get(5)?),
            organ_tissue_id: OrganTissueId::new(row.get(6)?),
            microscope_type_id: MicroscopeTypeId::new(row.get(7)?),
        })
    }
}

impl CatalogStore for SqliteStore {
    fn species_by_name(&self, name: &str) -> Result<Option<Species>, CatalogError> {
        self.lock()
            .query_row(
                "SELECT id, name FROM species WHERE name = ?1",
                params![name],
                Self::species_row,
            )
            .optional()
            .map_err(|err| CatalogError::Store(err.to_string()))
    }

    fn organ_tissue_by_name(
        &self,
        name: &str,
        scope: Option<SpeciesId>,
    ) -> Result<Option<OrganTissue>, CatalogError> {
        let conn = self.lock();
        let row = match scope {
            Some(species) => conn
                .query_row(
                    "SELECT id, name, species_id FROM organs_tissues
                     WHERE name = ?1 AND species_id = ?2
                     ORDER BY id LIMIT 1",
                    params![name, species.as_i64()],
                    Self::organ_tissue_row,
                )
                .optional(),
            None => conn
                .query_row(
                    "SELECT id, name, species_id FROM organs_tissues
                     WHERE name = ?1
                     ORDER BY id LIMIT 1",
                    params![name],
                    Self::organ_tissue_row,
                )
                .optional(),
        };
        row.map_err(|err| CatalogError::Store(err.to_string()))
    }

    fn microscope_type_by_name(&self, name: &str) -> Result<Option<MicroscopeType>, CatalogError> {
        self.lock()
            .query_row(
                "SELECT id, name FROM microscope_types WHERE name = ?1 ORDER BY id LIMIT 1",
                params![name],
                Self::microscope_type_row,
            )
            .optional()
            .map_err(|err| CatalogError::Store(err.to_string()))
    }

    fn all_species(&self) -> Result<Vec<Species>, CatalogError> {
        let conn = self.lock();
        let mut stmt = conn
            .prepare("SELECT id, name FROM species ORDER BY id")
            .map_err(|err| CatalogError::Store(err.to_string()))?;
        let rows = stmt
            .query_map([], Self::species_row)
            .map_err(|err| CatalogError::Store(err.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| CatalogError::Store(err.to_string()))?;
        Ok(rows)
    }

    fn all_organ_tissues(&self) -> Result<Vec<OrganTissue>, CatalogError> {
        let conn = self.lock();
        let mut stmt = conn
            .prepare("SELECT id, name, species_id FROM organs_tissues ORDER BY id")
            .map_err(|err| CatalogError::Store(err.to_string()))?;
        let rows = stmt
            .query_map([], Self::organ_tissue_row)
            .map_err(|err| CatalogError::Store(err.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| CatalogError::Store(err.to_string()))?;
        Ok(rows)
    }

    fn organ_tissues_of(&self, species: SpeciesId) -> Result<Vec<OrganTissue>, CatalogError> {
        let conn = self.lock();
        let mut stmt = conn
            .prepare(
                "SELECT id, name, species_id FROM organs_tissues
                 WHERE species_id = ?1 ORDER BY id",
            )
            .map_err(|err| CatalogError::Store(err.to_string()))?;
        let rows = stmt
            .query_map(params![species.as_i64()], Self::organ_tissue_row)
            .map_err(|err| CatalogError::Store(err.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| CatalogError::Store(err.to_string()))?;
        Ok(rows)
    }

    fn all_microscope_types(&self) -> Result<Vec<MicroscopeType>, CatalogError> {
        let conn = self.lock();
        let mut stmt = conn
            .prepare("SELECT id, name FROM microscope_types ORDER BY id")
            .map_err(|err| CatalogError::Store(err.to_string()))?;
        let rows = stmt
            .query_map([], Self::microscope_type_row)
            .map_err(|err| CatalogError::Store(err.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| CatalogError::Store(err.to_string()))?;
        Ok(rows)
    }

    fn images_matching(&self, selection: &ImageSelection) -> Result<Vec<Image>, CatalogError> {
        let mut sql = String::from(
            "SELECT id, thumbnail, description, em_image_viewer_url, image_size,
                    species_id, organ_tissue_id, microscope_type_id
             FROM images WHERE 1=1",
        );
        let mut bindings: Vec<i64> = Vec::new();

        if let Some(id) = selection.species_id {
            sql.push_str(" AND species_id = ?");
            bindings.push(id.as_i64());
        }
        if let Some(id) = selection.organ_tissue_id {
            sql.push_str(" AND organ_tissue_id = ?");
            bindings.push(id.as_i64());
        }
        if let Some(id) = selection.microscope_type_id {
            sql.push_str(" AND microscope_type_id = ?");
            bindings.push(id.as_i64());
        }
        sql.push_str(" ORDER BY id");

        let conn = self.lock();
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|err| CatalogError::Store(err.to_string()))?;
        let rows = stmt
            .query_map(params_from_iter(bindings.iter()), Self::image_row)
            .map_err(|err| CatalogError::Store(err.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| CatalogError::Store(err.to_string()))?;
        Ok(rows)
    }

    fn species_names(&self) -> Result<HashMap<SpeciesId, String>, CatalogError> {
        let conn = self.lock();
        let mut stmt = conn
            .prepare("SELECT id, name FROM species")
            .map_err(|err| CatalogError::Store(err.to_string()))?;
        let rows = stmt
            .query_map([], |row| Ok((SpeciesId::new(row.get(0)?), row.get(1)?)))
            .map_err(|err| CatalogError::Store(err.to_string()))?
            .collect::<Result<HashMap<_, _>, _>>()
            .map_err(|err| CatalogError::Store(err.to_string()))?;
        Ok(rows)
    }

    fn organ_tissue_names(&self) -> Result<HashMap<OrganTissueId, String>, CatalogError> {
        let conn = self.lock();
        let mut stmt = conn
            .prepare("SELECT id, name FROM organs_tissues")
            .map_err(|err| CatalogError::Store(err.to_string()))?;
        let rows = stmt
            .query_map([], |row| Ok((OrganTissueId::new(row.get(0)?), row.get(1)?)))
            .map_err(|err| CatalogError::Store(err.to_string()))?
            .collect::<Result<HashMap<_, _>, _>>()
            .map_err(|err| CatalogError::Store(err.to_string()))?;
        Ok(rows)
    }

    fn microscope_type_names(&self) -> Result<HashMap<MicroscopeTypeId, String>, CatalogError> {
        let conn = self.lock();
        let mut stmt = conn
            .prepare("SELECT id, name FROM microscope_types")
            .map_err(|err| CatalogError::Store(err.to_string()))?;
        let rows = stmt
            .query_map([], |row| {
                Ok((MicroscopeTypeId::new(row.get(0)?), row.get(1)?))
            })
            .map_err(|err| CatalogError::Store(err.to_string()))?
            .collect::<Result<HashMap<_, _>, _>>()
            .map_err(|err| CatalogError::Store(err.to_string()))?;
        Ok(rows)
    }
}
