use crate::matching::similarity::trigram_similarity;
use crate::model::{
    BodyType, CanonicalEngine, CanonicalMake, CanonicalModelTrim, ClassifiedPost, Color, EngineModelAssociation, Fuel,
    Gearbox, InteriorType, Merchant, PostSource, StorageError, Transmission, YearBound,
};
use crate::storage::{EngineCatalog, ModelCatalog, PostStore};
use chrono::{DateTime, Utc};
use rusqlite::functions::FunctionFlags;
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::de::DeserializeOwned;
use std::collections::HashSet;

const ENGINE_COLUMNS: &str = "id, make_id, model, engine_type, from_year, to_year, engine_name, cylinder, fuel,
    hp, hp_stage1, hp_stage2, torque, torque_stage1, torque_stage2, source_url";

const MODEL_COLUMNS: &str =
    "id, make_id, model, from_year, to_year, displacement, cylinder, body, fuel, hp, torque";

const POST_COLUMNS: &str = "id, source, id_source, url_source, merchant_id, published_at, title, description,
    images, price, make, model, body, variant, engine_type, year, km, fuel, cv, hp, engine, cylinder, color,
    interior_type, interior_color, gearbox, transmission, equipment, options, region_id, region_detail,
    phone_numbers, car_engine_id";

pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens the database (":memory:" works too), registers `similarity()` and creates the schema.
    pub fn new(db_path: &str) -> Result<Self, StorageError> {
        let conn = Connection::open(db_path)?;

        conn.create_scalar_function(
            "similarity",
            2,
            FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
            |ctx| {
                let a: Option<String> = ctx.get(0)?;
                let b: Option<String> = ctx.get(1)?;
                Ok(match (a, b) {
                    (Some(a), Some(b)) => trigram_similarity(&a, &b),
                    _ => 0.0,
                })
            },
        )?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS car_make (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                category TEXT,
                remap_eligible INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS car_engine (
                id TEXT PRIMARY KEY,
                make_id TEXT NOT NULL,
                model TEXT NOT NULL,
                engine_type TEXT,
                from_year TEXT NOT NULL DEFAULT 'unknown',
                to_year TEXT NOT NULL DEFAULT 'unknown',
                engine_name TEXT,
                cylinder TEXT,
                fuel TEXT NOT NULL,
                hp INTEGER,
                hp_stage1 INTEGER,
                torque INTEGER,
                torque_stage1 INTEGER,
                source_url TEXT NOT NULL UNIQUE,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS car_model (
                id TEXT PRIMARY KEY,
                make_id TEXT NOT NULL,
                model TEXT NOT NULL,
                from_year TEXT NOT NULL DEFAULT 'unknown',
                to_year TEXT NOT NULL DEFAULT 'unknown',
                displacement TEXT,
                cylinder TEXT,
                body TEXT,
                fuel TEXT NOT NULL,
                hp INTEGER,
                torque INTEGER
            );

            CREATE TABLE IF NOT EXISTS car_engine_model_association (
                car_engine_id TEXT NOT NULL,
                car_model_id TEXT NOT NULL,
                PRIMARY KEY (car_engine_id, car_model_id)
            );

            CREATE TABLE IF NOT EXISTS merchant (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                avatar TEXT,
                is_shop INTEGER NOT NULL DEFAULT 0,
                phone_numbers TEXT NOT NULL DEFAULT '[]',
                region_id TEXT,
                region_detail TEXT,
                address TEXT,
                website TEXT,
                source_ref TEXT,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS car_post (
                id TEXT PRIMARY KEY,
                source TEXT NOT NULL,
                id_source TEXT NOT NULL,
                url_source TEXT NOT NULL,
                merchant_id TEXT NOT NULL,
                published_at TEXT NOT NULL,
                title TEXT,
                description TEXT,
                images TEXT NOT NULL DEFAULT '[]',
                price INTEGER,
                make TEXT,
                model TEXT,
                body TEXT,
                variant TEXT,
                engine_type TEXT,
                year INTEGER,
                km INTEGER,
                fuel TEXT,
                cv INTEGER,
                hp INTEGER,
                engine TEXT,
                cylinder TEXT,
                color TEXT,
                interior_type TEXT,
                interior_color TEXT,
                gearbox TEXT,
                transmission TEXT,
                equipment TEXT NOT NULL DEFAULT '{}',
                options TEXT NOT NULL DEFAULT '[]',
                region_id TEXT NOT NULL,
                region_detail TEXT,
                phone_numbers TEXT NOT NULL DEFAULT '[]',
                car_engine_id TEXT,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_car_post_merchant ON car_post (merchant_id);
            CREATE INDEX IF NOT EXISTS idx_car_model_make_fuel ON car_model (make_id, fuel);
            ",
        )?;

        // Stage 2 figures only come from Shiftech and were added after the first imports
        Self::migrate_add_column_if_missing(&conn, "car_engine", "hp_stage2", "INTEGER")?;
        Self::migrate_add_column_if_missing(&conn, "car_engine", "torque_stage2", "INTEGER")?;

        Ok(Self { conn })
    }

    /// Adds the column when an older database lacks it.
    fn migrate_add_column_if_missing(
        conn: &Connection,
        table: &str,
        column: &str,
        column_def: &str,
    ) -> Result<(), StorageError> {
        let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
        let existing_columns: Vec<String> = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<Result<_, _>>()?;

        if !existing_columns.iter().any(|c| c == column) {
            let alter_sql = format!("ALTER TABLE {} ADD COLUMN {} {}", table, column, column_def);
            conn.execute(&alter_sql, [])?;
        }

        Ok(())
    }

    pub fn upsert_make(&self, make: &CanonicalMake) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO car_make (id, name, category, remap_eligible) VALUES (?1, ?2, ?3, ?4)",
            params![&make.id, &make.name, &make.category, make.remap_eligible],
        )?;
        Ok(())
    }

    pub fn known_make_ids(&self) -> Result<HashSet<String>, StorageError> {
        let mut stmt = self.conn.prepare("SELECT id FROM car_make")?;
        let ids = stmt.query_map([], |row| row.get::<_, String>(0))?.collect::<Result<_, _>>()?;
        Ok(ids)
    }

    /// Inserts or refreshes an engine keyed on its source url. An existing row keeps its id.
    pub fn upsert_engine(&self, engine: &CanonicalEngine) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT INTO car_engine (
                id, make_id, model, engine_type, from_year, to_year, engine_name, cylinder, fuel,
                hp, hp_stage1, hp_stage2, torque, torque_stage1, torque_stage2, source_url, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)
            ON CONFLICT (source_url) DO UPDATE SET
                make_id = excluded.make_id,
                model = excluded.model,
                engine_type = excluded.engine_type,
                from_year = excluded.from_year,
                to_year = excluded.to_year,
                engine_name = excluded.engine_name,
                cylinder = excluded.cylinder,
                fuel = excluded.fuel,
                hp = excluded.hp,
                hp_stage1 = excluded.hp_stage1,
                hp_stage2 = excluded.hp_stage2,
                torque = excluded.torque,
                torque_stage1 = excluded.torque_stage1,
                torque_stage2 = excluded.torque_stage2,
                updated_at = excluded.updated_at",
            params![
                &engine.id,
                &engine.make_id,
                &engine.model,
                &engine.engine_type,
                engine.from_year.to_string(),
                engine.to_year.to_string(),
                &engine.engine_name,
                &engine.cylinder,
                engine.fuel.label(),
                engine.hp,
                engine.hp_stage1,
                engine.hp_stage2,
                engine.torque,
                engine.torque_stage1,
                engine.torque_stage2,
                &engine.source_url,
                Utc::now(),
            ],
        )?;
        Ok(())
    }

    pub fn all_engines(&self) -> Result<Vec<CanonicalEngine>, StorageError> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM car_engine ORDER BY make_id, model, rowid", ENGINE_COLUMNS))?;
        let engines = stmt.query_map([], Self::map_engine)?.collect::<Result<_, _>>()?;
        Ok(engines)
    }

    pub fn upsert_model(&self, model: &CanonicalModelTrim) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO car_model (
                id, make_id, model, from_year, to_year, displacement, cylinder, body, fuel, hp, torque
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                &model.id,
                &model.make_id,
                &model.model,
                model.from_year.to_string(),
                model.to_year.to_string(),
                &model.displacement,
                &model.cylinder,
                &model.body,
                model.fuel.label(),
                model.hp,
                model.torque,
            ],
        )?;
        Ok(())
    }

    /// Links of an engine, ordered by model id.
    pub fn linked_models(&self, engine_id: &str) -> Result<Vec<EngineModelAssociation>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT car_engine_id, car_model_id FROM car_engine_model_association
             WHERE car_engine_id = ?1 ORDER BY car_model_id",
        )?;
        let links = stmt
            .query_map(params![engine_id], |row| {
                Ok(EngineModelAssociation { car_engine_id: row.get(0)?, car_model_id: row.get(1)? })
            })?
            .collect::<Result<_, _>>()?;
        Ok(links)
    }

    pub fn get_post(&self, id: &str) -> Result<Option<ClassifiedPost>, StorageError> {
        let post = self
            .conn
            .query_row(&format!("SELECT {} FROM car_post WHERE id = ?1", POST_COLUMNS), params![id], Self::map_post)
            .optional()?;
        Ok(post)
    }

    pub fn get_merchant(&self, id: &str) -> Result<Option<Merchant>, StorageError> {
        let merchant = self
            .conn
            .query_row(
                "SELECT id, name, avatar, is_shop, phone_numbers, region_id, region_detail, address, website, source_ref
                 FROM merchant WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Merchant {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        avatar: row.get(2)?,
                        is_shop: row.get(3)?,
                        phone_numbers: json_column(row, 4)?,
                        region_id: row.get(5)?,
                        region_detail: row.get(6)?,
                        address: row.get(7)?,
                        website: row.get(8)?,
                        source_ref: row.get(9)?,
                    })
                },
            )
            .optional()?;
        Ok(merchant)
    }

    pub fn count_posts(&self) -> Result<usize, StorageError> {
        let count: i64 = self.conn.query_row("SELECT COUNT(*) FROM car_post", [], |row| row.get(0))?;
        usize::try_from(count).map_err(|_| StorageError::InvalidValue(format!("negative post count {}", count)))
    }

    fn map_engine(row: &Row) -> Result<CanonicalEngine, rusqlite::Error> {
        Ok(CanonicalEngine {
            id: row.get(0)?,
            make_id: row.get(1)?,
            model: row.get(2)?,
            engine_type: row.get(3)?,
            from_year: YearBound::parse(&row.get::<_, String>(4)?),
            to_year: YearBound::parse(&row.get::<_, String>(5)?),
            engine_name: row.get(6)?,
            cylinder: row.get(7)?,
            fuel: required_label(row, 8, Fuel::from_label)?,
            hp: row.get(9)?,
            hp_stage1: row.get(10)?,
            hp_stage2: row.get(11)?,
            torque: row.get(12)?,
            torque_stage1: row.get(13)?,
            torque_stage2: row.get(14)?,
            source_url: row.get(15)?,
        })
    }

    fn map_model(row: &Row) -> Result<CanonicalModelTrim, rusqlite::Error> {
        Ok(CanonicalModelTrim {
            id: row.get(0)?,
            make_id: row.get(1)?,
            model: row.get(2)?,
            from_year: YearBound::parse(&row.get::<_, String>(3)?),
            to_year: YearBound::parse(&row.get::<_, String>(4)?),
            displacement: row.get(5)?,
            cylinder: row.get(6)?,
            body: row.get(7)?,
            fuel: required_label(row, 8, Fuel::from_label)?,
            hp: row.get(9)?,
            torque: row.get(10)?,
        })
    }

    fn map_post(row: &Row) -> Result<ClassifiedPost, rusqlite::Error> {
        Ok(ClassifiedPost {
            id: row.get(0)?,
            source: required_label(row, 1, PostSource::from_label)?,
            id_source: row.get(2)?,
            url_source: row.get(3)?,
            merchant_id: row.get(4)?,
            published_at: row.get(5)?,
            title: row.get(6)?,
            description: row.get(7)?,
            images: json_column(row, 8)?,
            price: row.get(9)?,
            make: row.get(10)?,
            model: row.get(11)?,
            body: optional_label(row, 12, BodyType::from_label)?,
            variant: row.get(13)?,
            engine_type: row.get(14)?,
            year: row.get(15)?,
            km: row.get(16)?,
            fuel: optional_label(row, 17, Fuel::from_label)?,
            cv: row.get(18)?,
            hp: row.get(19)?,
            engine: row.get(20)?,
            cylinder: row.get(21)?,
            color: optional_label(row, 22, Color::from_label)?,
            interior_type: optional_label(row, 23, InteriorType::from_label)?,
            interior_color: optional_label(row, 24, Color::from_label)?,
            gearbox: optional_label(row, 25, Gearbox::from_label)?,
            transmission: optional_label(row, 26, Transmission::from_label)?,
            equipment: json_column(row, 27)?,
            options: json_column(row, 28)?,
            region_id: row.get(29)?,
            region_detail: row.get(30)?,
            phone_numbers: json_column(row, 31)?,
            car_engine_id: row.get(32)?,
        })
    }
}

fn conversion_error(idx: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, message.into())
}

fn optional_label<T>(row: &Row, idx: usize, parse: fn(&str) -> Option<T>) -> Result<Option<T>, rusqlite::Error> {
    match row.get::<_, Option<String>>(idx)? {
        None => Ok(None),
        Some(label) => parse(&label)
            .map(Some)
            .ok_or_else(|| conversion_error(idx, format!("unknown label '{}'", label))),
    }
}

fn required_label<T>(row: &Row, idx: usize, parse: fn(&str) -> Option<T>) -> Result<T, rusqlite::Error> {
    optional_label(row, idx, parse)?.ok_or_else(|| conversion_error(idx, "missing label".to_string()))
}

fn json_column<T: DeserializeOwned>(row: &Row, idx: usize) -> Result<T, rusqlite::Error> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw).map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

impl EngineCatalog for SqliteStorage {
    fn engine_candidates(&self, make_id: &str, model: &str, fuel: Fuel) -> Result<Vec<CanonicalEngine>, StorageError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM car_engine
             WHERE similarity(make_id, ?1) > 0.8
               AND similarity(fuel, ?2) > 0.4
               AND (similarity(model, ?3) > 0.3
                    OR (model <> '' AND instr(lower(model), lower(?3)) > 0)
                    OR (model <> '' AND instr(lower(?3), lower(model)) > 0))
             ORDER BY rowid",
            ENGINE_COLUMNS
        ))?;
        let engines = stmt
            .query_map(params![make_id, fuel.label(), model], Self::map_engine)?
            .collect::<Result<_, _>>()?;
        Ok(engines)
    }
}

impl ModelCatalog for SqliteStorage {
    fn model_candidates(&self, engine: &CanonicalEngine) -> Result<Vec<CanonicalModelTrim>, StorageError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM car_model
             WHERE make_id = ?1
               AND fuel = ?2
               AND (similarity(model, ?3) > 0.1
                    OR (model <> '' AND instr(lower(model), lower(?3)) > 0)
                    OR (model <> '' AND instr(lower(?3), lower(model)) > 0))
             ORDER BY rowid",
            MODEL_COLUMNS
        ))?;
        let models = stmt
            .query_map(params![&engine.make_id, engine.fuel.label(), &engine.model], Self::map_model)?
            .collect::<Result<_, _>>()?;
        Ok(models)
    }

    fn link_engine_model(&self, link: &EngineModelAssociation) -> Result<bool, StorageError> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO car_engine_model_association (car_engine_id, car_model_id) VALUES (?1, ?2)",
            params![&link.car_engine_id, &link.car_model_id],
        )?;
        Ok(inserted > 0)
    }
}

impl PostStore for SqliteStorage {
    fn post_exists(&self, id: &str) -> Result<bool, StorageError> {
        let mut stmt = self.conn.prepare("SELECT 1 FROM car_post WHERE id = ?1")?;
        let mut rows = stmt.query(params![id])?;
        Ok(rows.next()?.is_some())
    }

    fn find_duplicate(&self, post: &ClassifiedPost) -> Result<Option<ClassifiedPost>, StorageError> {
        let existing = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM car_post
                     WHERE merchant_id = ?1 AND id <> ?2
                       AND (title IS ?3 OR (km IS ?4 AND price IS ?5 AND cv IS ?6 AND year IS ?7))
                     ORDER BY published_at
                     LIMIT 1",
                    POST_COLUMNS
                ),
                params![&post.merchant_id, &post.id, &post.title, post.km, post.price, post.cv, post.year],
                Self::map_post,
            )
            .optional()?;
        Ok(existing)
    }

    fn upsert_post(&self, post: &ClassifiedPost) -> Result<(), StorageError> {
        self.conn.execute(
            &format!(
                "INSERT OR REPLACE INTO car_post ({}, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17,
                         ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26, ?27, ?28, ?29, ?30, ?31, ?32, ?33, ?34)",
                POST_COLUMNS
            ),
            params![
                &post.id,
                post.source.label(),
                &post.id_source,
                &post.url_source,
                &post.merchant_id,
                post.published_at,
                &post.title,
                &post.description,
                serde_json::to_string(&post.images)?,
                post.price,
                &post.make,
                &post.model,
                post.body.map(|b| b.label()),
                &post.variant,
                &post.engine_type,
                post.year,
                post.km,
                post.fuel.map(|f| f.label()),
                post.cv,
                post.hp,
                &post.engine,
                &post.cylinder,
                post.color.map(|c| c.label()),
                post.interior_type.map(|i| i.label()),
                post.interior_color.map(|c| c.label()),
                post.gearbox.map(|g| g.label()),
                post.transmission.map(|t| t.label()),
                serde_json::to_string(&post.equipment)?,
                serde_json::to_string(&post.options)?,
                &post.region_id,
                &post.region_detail,
                serde_json::to_string(&post.phone_numbers)?,
                &post.car_engine_id,
                Utc::now(),
            ],
        )?;
        Ok(())
    }

    fn upsert_merchant(&self, merchant: &Merchant) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO merchant (
                id, name, avatar, is_shop, phone_numbers, region_id, region_detail, address, website, source_ref,
                updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                &merchant.id,
                &merchant.name,
                &merchant.avatar,
                merchant.is_shop,
                serde_json::to_string(&merchant.phone_numbers)?,
                &merchant.region_id,
                &merchant.region_detail,
                &merchant.address,
                &merchant.website,
                &merchant.source_ref,
                Utc::now(),
            ],
        )?;
        Ok(())
    }

    fn delete_posts_before(&self, cutoff: DateTime<Utc>) -> Result<usize, StorageError> {
        let deleted = self.conn.execute("DELETE FROM car_post WHERE published_at < ?1", params![cutoff])?;
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::dedup::tests::post;
    use crate::matching::resolver::{VehicleQuery, resolve_engine};
    use crate::model::EngineSource;
    use crate::parser::keys;

    fn engine(url: &str, model: &str, fuel: Fuel, from: YearBound, to: YearBound, hp: i64, cyl: &str) -> CanonicalEngine {
        CanonicalEngine {
            id: keys::engine_id(EngineSource::BrPerf, url),
            make_id: "volkswagen".to_string(),
            model: model.to_string(),
            engine_type: None,
            from_year: from,
            to_year: to,
            engine_name: Some(format!("{} TSI", cyl)),
            cylinder: Some(cyl.to_string()),
            fuel,
            hp: Some(hp),
            hp_stage1: None,
            hp_stage2: None,
            torque: None,
            torque_stage1: None,
            torque_stage2: None,
            source_url: url.to_string(),
        }
    }

    fn trim(id: &str, model: &str, from: i32) -> CanonicalModelTrim {
        CanonicalModelTrim {
            id: id.to_string(),
            make_id: "volkswagen".to_string(),
            model: model.to_string(),
            from_year: YearBound::Year(from),
            to_year: YearBound::Present,
            displacement: Some("1395".to_string()),
            cylinder: Some("1.4".to_string()),
            body: Some("Compacte".to_string()),
            fuel: Fuel::Essence,
            hp: Some(140),
            torque: None,
        }
    }

    #[test]
    fn similarity_function_is_registered() {
        let storage = SqliteStorage::new(":memory:").unwrap();
        let sim: f64 = storage
            .conn
            .query_row("SELECT similarity('Volkswagen', 'volkswagen')", [], |row| row.get(0))
            .unwrap();
        assert_eq!(sim, 1.0);
        let null_sim: f64 = storage.conn.query_row("SELECT similarity(NULL, 'x')", [], |row| row.get(0)).unwrap();
        assert_eq!(null_sim, 0.0);
    }

    #[test]
    fn engine_upsert_keeps_row_per_url() {
        let storage = SqliteStorage::new(":memory:").unwrap();
        let url = "https://br.test/vw/golf/1-4";
        let mut e = engine(url, "Golf", Fuel::Essence, YearBound::Year(2013), YearBound::Year(2017), 140, "1.4");
        storage.upsert_engine(&e).unwrap();
        e.hp = Some(150);
        storage.upsert_engine(&e).unwrap();

        let engines = storage.all_engines().unwrap();
        assert_eq!(engines.len(), 1);
        assert_eq!(engines[0].hp, Some(150));
        assert_eq!(engines[0].from_year, YearBound::Year(2013));
    }

    #[test]
    fn resolves_through_sqlite_candidates() {
        let storage = SqliteStorage::new(":memory:").unwrap();
        let golf = engine("https://br.test/golf", "Golf", Fuel::Essence, YearBound::Year(2013), YearBound::Year(2017), 140, "1.4");
        let diesel = engine("https://br.test/golf-tdi", "Golf", Fuel::Diesel, YearBound::Year(2013), YearBound::Year(2017), 150, "2.0");
        let polo = engine("https://br.test/polo", "Polo", Fuel::Essence, YearBound::Year(2014), YearBound::Present, 90, "1.0");
        for e in [&golf, &diesel, &polo] {
            storage.upsert_engine(e).unwrap();
        }

        let candidates = storage.engine_candidates("Volkswagen", "Golf VII", Fuel::Essence).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].id, golf.id);

        let query = VehicleQuery {
            make: Some("Volkswagen".to_string()),
            model: Some("Golf".to_string()),
            fuel: Some(Fuel::Essence),
            year: Some(2015),
            cv: Some(9),
            cylinder: Some("1.4".to_string()),
        };
        assert_eq!(resolve_engine(&storage, &query).unwrap(), Some(golf.id.clone()));
    }

    #[test]
    fn model_candidates_and_idempotent_links() {
        let storage = SqliteStorage::new(":memory:").unwrap();
        storage.upsert_model(&trim("golf-7", "Golf VII", 2012)).unwrap();
        storage.upsert_model(&trim("tiguan", "Tiguan", 2016)).unwrap();
        let e = engine("https://br.test/golf", "Golf", Fuel::Essence, YearBound::Year(2013), YearBound::Year(2017), 140, "1.4");

        let candidates = storage.model_candidates(&e).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].id, "golf-7");

        let link = EngineModelAssociation { car_engine_id: e.id.clone(), car_model_id: "golf-7".to_string() };
        assert!(storage.link_engine_model(&link).unwrap());
        assert!(!storage.link_engine_model(&link).unwrap());
        assert_eq!(storage.linked_models(&e.id).unwrap(), vec![link]);
    }

    #[test]
    fn post_round_trip_and_duplicate_lookup() {
        let storage = SqliteStorage::new(":memory:").unwrap();
        let mut stored = post("TAYARA-1", "GOLF 7 TSI", "garage-ali");
        stored.fuel = Some(Fuel::Essence);
        stored.gearbox = Some(Gearbox::Auto);
        stored.equipment.camera = true;
        stored.images = vec!["https://img.test/1.jpg".to_string()];
        stored.phone_numbers = vec![98_123_456];
        storage.upsert_post(&stored).unwrap();

        assert!(storage.post_exists("TAYARA-1").unwrap());
        assert!(!storage.post_exists("TAYARA-2").unwrap());
        assert_eq!(storage.get_post("TAYARA-1").unwrap(), Some(stored.clone()));

        let repost = post("TAYARA-2", "VW GOLF 7 FULL", "garage-ali");
        let found = storage.find_duplicate(&repost).unwrap().unwrap();
        assert_eq!(found.id, "TAYARA-1");

        let mut other = post("TAYARA-3", "VW GOLF 7 FULL", "garage-ali");
        other.cv = None;
        assert!(storage.find_duplicate(&other).unwrap().is_none());
        assert_eq!(storage.count_posts().unwrap(), 1);
    }

    #[test]
    fn null_fields_match_in_duplicate_lookup() {
        let storage = SqliteStorage::new(":memory:").unwrap();
        let mut stored = post("TAYARA-1", "A", "m");
        stored.km = None;
        storage.upsert_post(&stored).unwrap();

        let mut candidate = post("TAYARA-2", "B", "m");
        candidate.km = None;
        assert!(storage.find_duplicate(&candidate).unwrap().is_some());
    }

    #[test]
    fn deletes_posts_published_before_cutoff() {
        let storage = SqliteStorage::new(":memory:").unwrap();
        let old = post("TAYARA-1", "GOLF 7", "m");
        let mut recent = post("TAYARA-2", "CLIO 4", "m");
        recent.published_at = old.published_at + chrono::Duration::days(10);
        storage.upsert_post(&old).unwrap();
        storage.upsert_post(&recent).unwrap();

        assert_eq!(storage.delete_posts_before(old.published_at).unwrap(), 0);
        assert_eq!(storage.delete_posts_before(old.published_at + chrono::Duration::days(1)).unwrap(), 1);
        assert!(!storage.post_exists("TAYARA-1").unwrap());
        assert!(storage.post_exists("TAYARA-2").unwrap());
    }

    #[test]
    fn merchant_upsert() {
        let storage = SqliteStorage::new(":memory:").unwrap();
        let merchant = Merchant {
            id: "garage-ali".to_string(),
            name: "Garage Ali".to_string(),
            avatar: None,
            is_shop: true,
            phone_numbers: vec![98_123_456],
            region_id: Some("tunis".to_string()),
            region_detail: None,
            address: None,
            website: None,
            source_ref: Some("u-42".to_string()),
        };
        storage.upsert_merchant(&merchant).unwrap();
        storage.upsert_merchant(&merchant).unwrap();
        assert_eq!(storage.get_merchant("garage-ali").unwrap(), Some(merchant));
    }

    #[test]
    fn makes_and_migrations() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.db");
        let path = path.to_str().unwrap();
        {
            let storage = SqliteStorage::new(path).unwrap();
            storage
                .upsert_make(&CanonicalMake {
                    id: "mg".to_string(),
                    name: "MG".to_string(),
                    category: None,
                    remap_eligible: true,
                })
                .unwrap();
        }
        let reopened = SqliteStorage::new(path).unwrap();
        assert!(reopened.known_make_ids().unwrap().contains("mg"));
    }
}
