use anyhow::{bail, Context, Result};
use sqlx::{postgres::PgPoolOptions, postgres::PgRow, PgPool, Row};

use crate::model::{City, Id, PointOfInterest};
use crate::store::traits::{CityStore, PendingChange, PointOfInterestStore, UnitOfWorkStore};

#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a new PostgreSQL store with the given database URL
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("Failed to create PostgreSQL connection pool")?;

        Ok(Self { pool })
    }

    /// Create the tables if they are missing. Existing tables are left as they are.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS cities (
                id SERIAL PRIMARY KEY,
                name VARCHAR(50) NOT NULL,
                description VARCHAR(200)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create cities table")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS points_of_interest (
                id SERIAL PRIMARY KEY,
                name VARCHAR(50) NOT NULL,
                description VARCHAR(200),
                city_id INTEGER NOT NULL REFERENCES cities (id) ON DELETE CASCADE
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create points_of_interest table")?;

        Ok(())
    }
}

fn city_from_row(row: &PgRow) -> City {
    City {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        points_of_interest: None,
    }
}

fn point_from_row(row: &PgRow) -> PointOfInterest {
    PointOfInterest {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        city_id: row.get("city_id"),
    }
}

#[async_trait::async_trait]
impl CityStore for PostgresStore {
    async fn city_exists(&self, city_id: Id) -> Result<bool> {
        let row = sqlx::query("SELECT EXISTS (SELECT 1 FROM cities WHERE id = $1) AS found")
            .bind(city_id)
            .fetch_one(&self.pool)
            .await
            .context("Failed to check city")?;

        Ok(row.get("found"))
    }

    async fn get_cities(&self) -> Result<Vec<City>> {
        let rows = sqlx::query("SELECT id, name, description FROM cities ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list cities")?;

        Ok(rows.iter().map(city_from_row).collect())
    }

    async fn get_city(&self, city_id: Id, include_points: bool) -> Result<Option<City>> {
        let row = sqlx::query("SELECT id, name, description FROM cities WHERE id = $1")
            .bind(city_id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch city")?;

        let Some(row) = row else {
            return Ok(None);
        };

        let city = city_from_row(&row);
        if !include_points {
            return Ok(Some(city));
        }

        let points = self.get_points_of_interest(city_id).await?;
        Ok(Some(city.with_points(points)))
    }

    async fn insert_city(&self, city: City) -> Result<City> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        let row = sqlx::query(
            "INSERT INTO cities (name, description) VALUES ($1, $2) RETURNING id, name, description",
        )
        .bind(&city.name)
        .bind(&city.description)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to insert city")?;
        let mut stored = city_from_row(&row);

        let mut points = Vec::new();
        for point in city.points_of_interest.unwrap_or_default() {
            let row = sqlx::query(
                r#"
                INSERT INTO points_of_interest (name, description, city_id)
                VALUES ($1, $2, $3)
                RETURNING id, name, description, city_id
                "#,
            )
            .bind(&point.name)
            .bind(&point.description)
            .bind(stored.id)
            .fetch_one(&mut *tx)
            .await
            .context("Failed to insert point of interest")?;
            points.push(point_from_row(&row));
        }

        tx.commit().await.context("Failed to commit city")?;

        stored.points_of_interest = Some(points);
        Ok(stored)
    }
}

#[async_trait::async_trait]
impl PointOfInterestStore for PostgresStore {
    async fn get_points_of_interest(&self, city_id: Id) -> Result<Vec<PointOfInterest>> {
        let rows = sqlx::query(
            "SELECT id, name, description, city_id FROM points_of_interest WHERE city_id = $1 ORDER BY id",
        )
        .bind(city_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list points of interest")?;

        Ok(rows.iter().map(point_from_row).collect())
    }

    async fn get_point_of_interest(
        &self,
        city_id: Id,
        point_id: Id,
    ) -> Result<Option<PointOfInterest>> {
        let row = sqlx::query(
            "SELECT id, name, description, city_id FROM points_of_interest WHERE city_id = $1 AND id = $2",
        )
        .bind(city_id)
        .bind(point_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch point of interest")?;

        Ok(row.as_ref().map(point_from_row))
    }
}

#[async_trait::async_trait]
impl UnitOfWorkStore for PostgresStore {
    async fn save_changes(&self, changes: &[PendingChange]) -> Result<Vec<PointOfInterest>> {
        // Dropping the transaction on an early return rolls everything back
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;
        let mut inserted = Vec::new();

        for change in changes {
            match change {
                PendingChange::InsertPoint { city_id, point } => {
                    let row = sqlx::query(
                        r#"
                        INSERT INTO points_of_interest (name, description, city_id)
                        VALUES ($1, $2, $3)
                        RETURNING id, name, description, city_id
                        "#,
                    )
                    .bind(&point.name)
                    .bind(&point.description)
                    .bind(city_id)
                    .fetch_one(&mut *tx)
                    .await
                    .context("Failed to insert point of interest")?;
                    inserted.push(point_from_row(&row));
                }
                PendingChange::UpdatePoint(point) => {
                    let result = sqlx::query(
                        "UPDATE points_of_interest SET name = $1, description = $2 WHERE id = $3 AND city_id = $4",
                    )
                    .bind(&point.name)
                    .bind(&point.description)
                    .bind(point.id)
                    .bind(point.city_id)
                    .execute(&mut *tx)
                    .await
                    .context("Failed to update point of interest")?;

                    if result.rows_affected() == 0 {
                        bail!("Point of interest {} no longer exists", point.id);
                    }
                }
                PendingChange::DeletePoint(point) => {
                    let result = sqlx::query(
                        "DELETE FROM points_of_interest WHERE id = $1 AND city_id = $2",
                    )
                    .bind(point.id)
                    .bind(point.city_id)
                    .execute(&mut *tx)
                    .await
                    .context("Failed to delete point of interest")?;

                    if result.rows_affected() == 0 {
                        bail!("Point of interest {} no longer exists", point.id);
                    }
                }
            }
        }

        tx.commit().await.context("Failed to commit changes")?;
        Ok(inserted)
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .context("Failed to reach PostgreSQL")?;
        Ok(())
    }
}
