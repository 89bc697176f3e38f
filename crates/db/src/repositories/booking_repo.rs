//! Repository for the `bookings` table.
//!
//! Writes that take part in a booking transition accept `&mut PgConnection`
//! so they run inside the caller's transaction next to the resource lock.

use chrono::Utc;
use sqlx::{Connection, PgConnection, PgPool, Postgres, QueryBuilder};
use clubstay_core::availability::DateRange;
use clubstay_core::booking::{status_texts, BookingStatus, PaymentStatus};
use clubstay_core::booking_code::{generate_application_no, generate_booking_code, MAX_CODE_ATTEMPTS};
use clubstay_core::types::DbId;

use crate::models::booking::{
    Booking, BookingFilter, BookingListQuery, BookingStats, CancellationReport, GroupTotal,
    MonthlyTotal, NewBooking, Page, StatusChange,
};

/// Column list for `bookings` queries.
const COLUMNS: &str = "\
    id, booking_code, application_no, booking_type, resource_id, \
    requested_site, requested_category, requester_id, \
    occupant_name, occupant_phone, occupant_gender, occupant_location, occupant_email, \
    sponsor_name, sponsor_phone, sponsor_designation, sponsor_gender, sponsor_email, \
    check_in, check_out, duration_days, guest_count, \
    occupant_category, relation, total_cost, cost_source, status, payment_status, \
    remarks, checked_in_at, checked_out_at, created_at, updated_at";

/// Maximum page size for booking listing.
const MAX_LIMIT: i64 = 100;

/// Default page size for booking listing.
const DEFAULT_LIMIT: i64 = 10;

/// Highest page number honoured; larger requests land on this page.
const MAX_PAGE: i64 = 100_000;

/// Number of cancelled bookings returned in the cancellation report.
const RECENT_CANCELLATIONS: i64 = 20;

/// Unique constraints on generated identifiers; a violation means "roll again".
const CODE_CONSTRAINTS: [&str; 2] = ["uq_bookings_booking_code", "uq_bookings_application_no"];

/// Provides persistence for bookings and their lifecycle writes.
pub struct BookingRepo;

impl BookingRepo {
    /// Insert a booking with freshly generated public identifiers.
    ///
    /// Each attempt runs in a savepoint so a code collision does not abort
    /// the surrounding transaction; any other error is returned as is.
    pub async fn insert(conn: &mut PgConnection, input: &NewBooking) -> Result<Booking, sqlx::Error> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let now = Utc::now();
            let booking_code = generate_booking_code(now);
            let application_no = generate_application_no(now);

            let mut savepoint = conn.begin().await?;
            let result =
                Self::insert_row(&mut *savepoint, input, &booking_code, &application_no).await;
            match result {
                Ok(booking) => {
                    savepoint.commit().await?;
                    return Ok(booking);
                }
                Err(e) if attempt < MAX_CODE_ATTEMPTS && is_code_collision(&e) => {
                    savepoint.rollback().await?;
                    tracing::debug!(
                        attempt,
                        %booking_code,
                        %application_no,
                        "Booking code collision, retrying"
                    );
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn insert_row(
        conn: &mut PgConnection,
        input: &NewBooking,
        booking_code: &str,
        application_no: &str,
    ) -> Result<Booking, sqlx::Error> {
        let query = format!(
            "INSERT INTO bookings ( \
                 booking_code, application_no, booking_type, resource_id, \
                 requested_site, requested_category, requester_id, \
                 occupant_name, occupant_phone, occupant_gender, occupant_location, occupant_email, \
                 sponsor_name, sponsor_phone, sponsor_designation, sponsor_gender, sponsor_email, \
                 check_in, check_out, duration_days, guest_count, \
                 occupant_category, relation, total_cost, cost_source, status, remarks) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, \
                     $18, $19, $20, $21, $22, $23, $24, $25, $26, $27) \
             RETURNING {COLUMNS}"
        );
        let sponsor = input.sponsor.as_ref();
        sqlx::query_as::<_, Booking>(&query)
            .bind(booking_code)
            .bind(application_no)
            .bind(input.booking_type.as_str())
            .bind(input.resource_id)
            .bind(input.requested_site.trim())
            .bind(input.requested_category.trim())
            .bind(input.requester_id)
            .bind(input.occupant.name.trim())
            .bind(&input.occupant.phone)
            .bind(input.occupant.gender.as_str())
            .bind(input.occupant.location.trim())
            .bind(&input.occupant.email)
            .bind(sponsor.map(|s| s.name.trim()))
            .bind(sponsor.map(|s| s.phone.as_str()))
            .bind(sponsor.map(|s| s.designation.trim()))
            .bind(sponsor.and_then(|s| s.gender).map(|g| g.as_str()))
            .bind(sponsor.and_then(|s| s.email.as_deref()))
            .bind(input.range.start)
            .bind(input.range.end)
            .bind(input.duration_days)
            .bind(input.guest_count)
            .bind(input.occupant_category.as_str())
            .bind(input.relation.as_str())
            .bind(input.total_cost)
            .bind(input.cost_source.as_str())
            .bind(input.status.as_str())
            .bind(&input.remarks)
            .fetch_one(conn)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Booking>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM bookings WHERE id = $1");
        sqlx::query_as::<_, Booking>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Lock a booking row for the rest of the caller's transaction.
    pub async fn lock_for_update(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<Booking>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM bookings WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, Booking>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// First booking of `resource_id` whose status is in `blocking` and whose
    /// range overlaps `range`, ignoring `exclude`.
    ///
    /// Overlap is half-open: `check_in < range.end AND check_out > range.start`.
    pub async fn find_conflict(
        conn: &mut PgConnection,
        resource_id: DbId,
        range: &DateRange,
        blocking: &[BookingStatus],
        exclude: Option<DbId>,
    ) -> Result<Option<DbId>, sqlx::Error> {
        sqlx::query_scalar::<_, DbId>(
            "SELECT id FROM bookings \
             WHERE resource_id = $1 \
               AND status = ANY($2) \
               AND check_in < $4 AND check_out > $3 \
               AND ($5::BIGINT IS NULL OR id <> $5) \
             ORDER BY check_in \
             LIMIT 1",
        )
        .bind(resource_id)
        .bind(status_texts(blocking))
        .bind(range.start)
        .bind(range.end)
        .bind(exclude)
        .fetch_optional(conn)
        .await
    }

    /// Write the outcome of a status transition.
    pub async fn apply_status(
        conn: &mut PgConnection,
        id: DbId,
        change: &StatusChange,
    ) -> Result<Booking, sqlx::Error> {
        let query = format!(
            "UPDATE bookings SET \
                 status = $2, resource_id = $3, total_cost = $4, cost_source = $5, \
                 remarks = COALESCE($6, remarks) \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Booking>(&query)
            .bind(id)
            .bind(change.status.as_str())
            .bind(change.resource_id)
            .bind(change.total_cost)
            .bind(change.cost_source.as_str())
            .bind(&change.remarks)
            .fetch_one(conn)
            .await
    }

    /// Set the payment flag. Returns `None` when the booking does not exist.
    pub async fn set_payment(
        pool: &PgPool,
        id: DbId,
        payment_status: PaymentStatus,
    ) -> Result<Option<Booking>, sqlx::Error> {
        let query = format!(
            "UPDATE bookings SET payment_status = $2 WHERE id = $1 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Booking>(&query)
            .bind(id)
            .bind(payment_status.as_str())
            .fetch_optional(pool)
            .await
    }

    /// Move a confirmed booking to `completed` and stamp the check-in time.
    pub async fn mark_checked_in(conn: &mut PgConnection, id: DbId) -> Result<Booking, sqlx::Error> {
        let query = format!(
            "UPDATE bookings SET status = $2, checked_in_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Booking>(&query)
            .bind(id)
            .bind(BookingStatus::Completed.as_str())
            .fetch_one(conn)
            .await
    }

    /// Stamp the check-out time. A second call keeps the first timestamp.
    pub async fn mark_checked_out(conn: &mut PgConnection, id: DbId) -> Result<Booking, sqlx::Error> {
        let query = format!(
            "UPDATE bookings SET checked_out_at = COALESCE(checked_out_at, NOW()) \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Booking>(&query)
            .bind(id)
            .fetch_one(conn)
            .await
    }

    /// Bookings made by one requester, newest first.
    pub async fn list_by_requester(
        pool: &PgPool,
        requester_id: DbId,
    ) -> Result<Vec<Booking>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM bookings WHERE requester_id = $1 ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, Booking>(&query)
            .bind(requester_id)
            .fetch_all(pool)
            .await
    }

    /// Admin listing with filters, sorting and page-based pagination.
    pub async fn list(pool: &PgPool, params: &BookingListQuery) -> Result<Page<Booking>, sqlx::Error> {
        let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        let page = params.page.unwrap_or(1).clamp(1, MAX_PAGE);
        let offset = (page - 1) * limit;
        let filter = params.filter();

        let mut count_qb: QueryBuilder<'_, Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM bookings WHERE TRUE");
        push_filters(&mut count_qb, &filter);
        let total: i64 = count_qb.build_query_scalar::<i64>().fetch_one(pool).await?;

        let sort = params.sort.unwrap_or_default();
        let order = params.order.unwrap_or_default();
        let mut qb: QueryBuilder<'_, Postgres> =
            QueryBuilder::new(format!("SELECT {COLUMNS} FROM bookings WHERE TRUE"));
        push_filters(&mut qb, &filter);
        qb.push(format!(
            " ORDER BY {} {}, id {}",
            sort.column(),
            order.keyword(),
            order.keyword()
        ));
        qb.push(" LIMIT ");
        qb.push_bind(limit);
        qb.push(" OFFSET ");
        qb.push_bind(offset);
        let items = qb.build_query_as::<Booking>().fetch_all(pool).await?;

        Ok(Page {
            items,
            total,
            page,
            limit,
        })
    }

    /// Aggregate counts and revenue for the admin dashboard.
    pub async fn stats(pool: &PgPool, filter: &BookingFilter) -> Result<BookingStats, sqlx::Error> {
        let mut qb: QueryBuilder<'_, Postgres> = QueryBuilder::new(
            "SELECT COUNT(*), \
                    COALESCE(SUM(total_cost) FILTER (WHERE payment_status = 'paid'), 0)::BIGINT, \
                    COALESCE(AVG(total_cost), 0)::FLOAT8 \
             FROM bookings WHERE TRUE",
        );
        push_filters(&mut qb, filter);
        let (total_bookings, paid_revenue, average_booking_value) =
            qb.build_query_as::<(i64, i64, f64)>().fetch_one(pool).await?;

        Ok(BookingStats {
            total_bookings,
            paid_revenue,
            average_booking_value,
            by_status: Self::group_totals(pool, "status", filter).await?,
            by_type: Self::group_totals(pool, "booking_type", filter).await?,
            by_site: Self::group_totals(pool, "requested_site", filter).await?,
            by_category: Self::group_totals(pool, "occupant_category", filter).await?,
            by_payment_status: Self::group_totals(pool, "payment_status", filter).await?,
            monthly: Self::monthly_totals(pool, filter).await?,
        })
    }

    /// Cancelled bookings: totals, a monthly series and the most recent ones.
    pub async fn cancellations(
        pool: &PgPool,
        filter: &BookingFilter,
    ) -> Result<CancellationReport, sqlx::Error> {
        let filter = BookingFilter {
            status: Some(BookingStatus::Cancelled),
            ..filter.clone()
        };

        let mut qb: QueryBuilder<'_, Postgres> = QueryBuilder::new(
            "SELECT COUNT(*), COALESCE(SUM(total_cost), 0)::BIGINT FROM bookings WHERE TRUE",
        );
        push_filters(&mut qb, &filter);
        let (total_cancelled, lost_revenue) =
            qb.build_query_as::<(i64, i64)>().fetch_one(pool).await?;

        let mut qb: QueryBuilder<'_, Postgres> =
            QueryBuilder::new(format!("SELECT {COLUMNS} FROM bookings WHERE TRUE"));
        push_filters(&mut qb, &filter);
        qb.push(" ORDER BY updated_at DESC, id DESC LIMIT ");
        qb.push_bind(RECENT_CANCELLATIONS);
        let recent = qb.build_query_as::<Booking>().fetch_all(pool).await?;

        Ok(CancellationReport {
            total_cancelled,
            lost_revenue,
            monthly: Self::monthly_totals(pool, &filter).await?,
            recent,
        })
    }

    /// Count and paid revenue grouped by one column.
    ///
    /// `column` is always one of the fixed names passed by [`Self::stats`].
    async fn group_totals(
        pool: &PgPool,
        column: &'static str,
        filter: &BookingFilter,
    ) -> Result<Vec<GroupTotal>, sqlx::Error> {
        let mut qb: QueryBuilder<'_, Postgres> = QueryBuilder::new(format!(
            "SELECT {column} AS key, COUNT(*) AS count, \
                    COALESCE(SUM(total_cost) FILTER (WHERE payment_status = 'paid'), 0)::BIGINT AS revenue \
             FROM bookings WHERE TRUE"
        ));
        push_filters(&mut qb, filter);
        qb.push(format!(" GROUP BY {column} ORDER BY {column}"));
        qb.build_query_as::<GroupTotal>().fetch_all(pool).await
    }

    /// Count and revenue per check-in month.
    async fn monthly_totals(
        pool: &PgPool,
        filter: &BookingFilter,
    ) -> Result<Vec<MonthlyTotal>, sqlx::Error> {
        let mut qb: QueryBuilder<'_, Postgres> = QueryBuilder::new(
            "SELECT to_char(date_trunc('month', check_in AT TIME ZONE 'UTC'), 'YYYY-MM') AS month, \
                    COUNT(*) AS count, \
                    COALESCE(SUM(total_cost), 0)::BIGINT AS revenue \
             FROM bookings WHERE TRUE",
        );
        push_filters(&mut qb, filter);
        qb.push(" GROUP BY 1 ORDER BY 1");
        qb.build_query_as::<MonthlyTotal>().fetch_all(pool).await
    }
}

/// Append `AND ...` clauses for every filter that is set.
fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &BookingFilter) {
    if let Some(status) = filter.status {
        qb.push(" AND status = ");
        qb.push_bind(status.as_str());
    }
    if let Some(booking_type) = filter.booking_type {
        qb.push(" AND booking_type = ");
        qb.push_bind(booking_type.as_str());
    }
    if let Some(site) = &filter.site {
        qb.push(" AND requested_site = ");
        qb.push_bind(site.clone());
    }
    if let Some(payment_status) = filter.payment_status {
        qb.push(" AND payment_status = ");
        qb.push_bind(payment_status.as_str());
    }
    if let Some(category) = filter.occupant_category {
        qb.push(" AND occupant_category = ");
        qb.push_bind(category.as_str());
    }
    match filter.is_member {
        Some(true) => {
            qb.push(" AND requester_id IS NOT NULL");
        }
        Some(false) => {
            qb.push(" AND requester_id IS NULL");
        }
        None => {}
    }
    if let Some(code) = &filter.booking_code {
        qb.push(" AND booking_code = ");
        qb.push_bind(code.trim().to_uppercase());
    }
    if let Some(start) = filter.start_date {
        qb.push(" AND created_at >= ");
        qb.push_bind(start);
    }
    if let Some(end) = filter.end_date {
        qb.push(" AND created_at <= ");
        qb.push_bind(end);
    }
}

fn is_code_collision(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Database(db) => {
            db.code().as_deref() == Some("23505")
                && db
                    .constraint()
                    .is_some_and(|c| CODE_CONSTRAINTS.contains(&c))
        }
        _ => false,
    }
}
