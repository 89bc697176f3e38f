//! Repository for the `resources` table and its occupancy cache.

use std::collections::HashMap;

use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use clubstay_core::availability::{expected_occupancy, DateRange};
use clubstay_core::booking::{status_texts, BookingStatus, BookingType};
use clubstay_core::types::{DbId, Timestamp};

use crate::models::resource::{
    CreateResource, OccupancyDrift, ReconcileReport, Resource, ResourceListQuery, SeedCounts,
    UpdateResource,
};
use crate::seed::{ROOM_LAYOUT, SERVICES};

/// Column list for `resources` queries.
const COLUMNS: &str = "\
    id, kind, label, category, site, floor, capacity, self_rate, guest_rate, \
    facilities, description, is_blocked, is_occupied, occupied_from, occupied_until, \
    created_at, updated_at";

/// Predicate selecting bookings that currently hold their resource.
const HOLDING: &str = "\
    (status = 'confirmed' OR (status = 'completed' AND checked_out_at IS NULL))";

/// Provides CRUD and occupancy operations for rooms and services.
pub struct ResourceRepo;

impl ResourceRepo {
    pub async fn create(pool: &PgPool, input: &CreateResource) -> Result<Resource, sqlx::Error> {
        let query = format!(
            "INSERT INTO resources \
                 (kind, label, category, site, floor, capacity, self_rate, guest_rate, \
                  facilities, description) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Resource>(&query)
            .bind(input.kind.as_str())
            .bind(input.label.trim())
            .bind(input.category.trim())
            .bind(input.site.trim())
            .bind(&input.floor)
            .bind(input.capacity)
            .bind(input.self_rate)
            .bind(input.guest_rate)
            .bind(input.facilities.clone().unwrap_or_default())
            .bind(&input.description)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Resource>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM resources WHERE id = $1");
        sqlx::query_as::<_, Resource>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List resources, optionally filtered by kind, site and category.
    pub async fn list(
        pool: &PgPool,
        params: &ResourceListQuery,
    ) -> Result<Vec<Resource>, sqlx::Error> {
        let mut qb: QueryBuilder<'_, Postgres> =
            QueryBuilder::new(format!("SELECT {COLUMNS} FROM resources WHERE TRUE"));
        push_resource_filters(&mut qb, params.kind, params.site.as_deref(), params.category.as_deref());
        qb.push(" ORDER BY kind, site, label");
        qb.build_query_as::<Resource>().fetch_all(pool).await
    }

    /// Resources of a kind that are not blocked and have no booking in
    /// `blocking` overlapping `range`.
    pub async fn list_available(
        pool: &PgPool,
        kind: BookingType,
        site: Option<&str>,
        category: Option<&str>,
        range: &DateRange,
        blocking: &[BookingStatus],
    ) -> Result<Vec<Resource>, sqlx::Error> {
        let mut qb: QueryBuilder<'_, Postgres> = QueryBuilder::new(format!(
            "SELECT {COLUMNS} FROM resources r WHERE NOT r.is_blocked"
        ));
        push_resource_filters(&mut qb, Some(kind), site, category);
        qb.push(
            " AND NOT EXISTS (SELECT 1 FROM bookings b WHERE b.resource_id = r.id AND b.status = ANY(",
        );
        qb.push_bind(status_texts(blocking));
        qb.push(") AND b.check_in < ");
        qb.push_bind(range.end);
        qb.push(" AND b.check_out > ");
        qb.push_bind(range.start);
        qb.push(") ORDER BY r.site, r.label");
        qb.build_query_as::<Resource>().fetch_all(pool).await
    }

    /// Patch descriptive fields. Returns `None` when the resource does not exist.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateResource,
    ) -> Result<Option<Resource>, sqlx::Error> {
        let query = format!(
            "UPDATE resources SET \
                 label = COALESCE($2, label), \
                 category = COALESCE($3, category), \
                 floor = COALESCE($4, floor), \
                 capacity = COALESCE($5, capacity), \
                 self_rate = COALESCE($6, self_rate), \
                 guest_rate = COALESCE($7, guest_rate), \
                 facilities = COALESCE($8, facilities), \
                 description = COALESCE($9, description) \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Resource>(&query)
            .bind(id)
            .bind(input.label.as_deref().map(str::trim))
            .bind(input.category.as_deref().map(str::trim))
            .bind(&input.floor)
            .bind(input.capacity)
            .bind(input.self_rate)
            .bind(input.guest_rate)
            .bind(&input.facilities)
            .bind(&input.description)
            .fetch_optional(pool)
            .await
    }

    /// Flip the `is_blocked` flag. Returns `None` when the resource does not exist.
    pub async fn toggle_block(pool: &PgPool, id: DbId) -> Result<Option<Resource>, sqlx::Error> {
        let query = format!(
            "UPDATE resources SET is_blocked = NOT is_blocked WHERE id = $1 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Resource>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Lock a resource row for the rest of the caller's transaction.
    ///
    /// Every operation that binds or releases a resource goes through this
    /// lock before reading availability, which serializes them per resource.
    pub async fn lock_for_update(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<Resource>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM resources WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, Resource>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Write the occupancy cache. `None` clears it.
    ///
    /// Returns `false` when no row was updated.
    pub async fn set_occupancy(
        conn: &mut PgConnection,
        id: DbId,
        range: Option<&DateRange>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE resources \
             SET is_occupied = $2, occupied_from = $3, occupied_until = $4 \
             WHERE id = $1",
        )
        .bind(id)
        .bind(range.is_some())
        .bind(range.map(|r| r.start))
        .bind(range.map(|r| r.end))
        .execute(conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Compare every resource's cache with its bookings; optionally repair.
    ///
    /// When repairing, all resource rows are locked for the caller's
    /// transaction so no booking write interleaves with the fix.
    pub async fn reconcile(
        conn: &mut PgConnection,
        repair: bool,
    ) -> Result<ReconcileReport, sqlx::Error> {
        let lock = if repair { " FOR UPDATE" } else { "" };
        let query = format!("SELECT {COLUMNS} FROM resources ORDER BY id{lock}");
        let resources = sqlx::query_as::<_, Resource>(&query)
            .fetch_all(&mut *conn)
            .await?;

        let query = format!(
            "SELECT resource_id, check_in, check_out FROM bookings \
             WHERE resource_id IS NOT NULL AND {HOLDING}"
        );
        let rows: Vec<(DbId, Timestamp, Timestamp)> =
            sqlx::query_as(&query).fetch_all(&mut *conn).await?;
        let mut holders: HashMap<DbId, Vec<DateRange>> = HashMap::new();
        for (resource_id, start, end) in rows {
            holders
                .entry(resource_id)
                .or_default()
                .push(DateRange { start, end });
        }

        let mut drift = Vec::new();
        for resource in &resources {
            let held = holders.get(&resource.id).map(Vec::as_slice).unwrap_or(&[]);
            let cached = resource.occupied_range();
            let expected = expected_occupancy(cached, held);
            if expected == cached && resource.is_occupied == cached.is_some() {
                continue;
            }
            if repair {
                Self::set_occupancy(&mut *conn, resource.id, expected.as_ref()).await?;
            }
            drift.push(OccupancyDrift {
                resource_id: resource.id,
                label: resource.label.clone(),
                cached,
                expected,
            });
        }

        Ok(ReconcileReport {
            checked: resources.len() as i64,
            drift,
            repaired: repair,
        })
    }

    /// Insert the club's room layout and services in one transaction.
    /// Resources that already exist are left untouched.
    pub async fn seed(pool: &PgPool) -> Result<SeedCounts, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let rooms = Self::seed_rooms(&mut tx).await?;
        let services = Self::seed_services(&mut tx).await?;
        tx.commit().await?;
        Ok(SeedCounts { rooms, services })
    }

    async fn seed_rooms(conn: &mut PgConnection) -> Result<u64, sqlx::Error> {
        let mut inserted = 0;
        for block in ROOM_LAYOUT {
            let room_type = block.room_type;
            let facilities: Vec<String> =
                room_type.facilities.iter().map(|f| f.to_string()).collect();
            for label in block.labels {
                let result = sqlx::query(
                    "INSERT INTO resources \
                         (kind, label, category, site, floor, self_rate, guest_rate, facilities) \
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
                     ON CONFLICT ON CONSTRAINT uq_resources_kind_site_label DO NOTHING",
                )
                .bind(BookingType::Room.as_str())
                .bind(*label)
                .bind(room_type.category)
                .bind(block.site)
                .bind(block.floor)
                .bind(room_type.self_rate)
                .bind(room_type.guest_rate)
                .bind(&facilities)
                .execute(&mut *conn)
                .await?;
                inserted += result.rows_affected();
            }
        }
        Ok(inserted)
    }

    async fn seed_services(conn: &mut PgConnection) -> Result<u64, sqlx::Error> {
        let mut inserted = 0;
        for service in SERVICES {
            let facilities: Vec<String> =
                service.facilities.iter().map(|f| f.to_string()).collect();
            let result = sqlx::query(
                "INSERT INTO resources \
                     (kind, label, category, site, capacity, self_rate, guest_rate, \
                      facilities, description) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
                 ON CONFLICT ON CONSTRAINT uq_resources_kind_site_label DO NOTHING",
            )
            .bind(BookingType::Service.as_str())
            .bind(service.label)
            .bind(service.category)
            .bind(service.site)
            .bind(service.capacity)
            .bind(service.self_rate)
            .bind(service.guest_rate)
            .bind(&facilities)
            .bind(service.description)
            .execute(&mut *conn)
            .await?;
            inserted += result.rows_affected();
        }
        Ok(inserted)
    }
}

fn push_resource_filters(
    qb: &mut QueryBuilder<'_, Postgres>,
    kind: Option<BookingType>,
    site: Option<&str>,
    category: Option<&str>,
) {
    if let Some(kind) = kind {
        qb.push(" AND kind = ");
        qb.push_bind(kind.as_str());
    }
    if let Some(site) = site {
        qb.push(" AND site = ");
        qb.push_bind(site.to_string());
    }
    if let Some(category) = category {
        qb.push(" AND category = ");
        qb.push_bind(category.to_string());
    }
}
