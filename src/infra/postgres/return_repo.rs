use {
    crate::domain::{
        error::CheckoutError,
        returns::{RentalRef, ReturnMethod, ReturnReason, ReturnRequest},
    },
    chrono::{DateTime, Utc},
    sqlx::PgPool,
    uuid::Uuid,
};

#[derive(sqlx::FromRow)]
struct ReturnRow {
    id: Uuid,
    rental_id: Uuid,
    user_id: String,
    book_id: Uuid,
    return_reason: String,
    return_method: String,
    pickup_address: Option<String>,
    customer_notes: Option<String>,
    requires_assessment: bool,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<ReturnRow> for ReturnRequest {
    type Error = CheckoutError;

    fn try_from(row: ReturnRow) -> Result<Self, Self::Error> {
        Ok(ReturnRequest {
            id: row.id,
            rental_id: row.rental_id,
            user_id: row.user_id,
            book_id: row.book_id,
            return_reason: ReturnReason::try_from(row.return_reason.as_str())?,
            return_method: ReturnMethod::try_from(row.return_method.as_str())?,
            pickup_address: row.pickup_address,
            customer_notes: row.customer_notes,
            requires_assessment: row.requires_assessment,
            status: row.status,
            created_at: row.created_at,
        })
    }
}

const RETURN_COLUMNS: &str = r#"
    id, rental_id, user_id, book_id, return_reason, return_method,
    pickup_address, customer_notes, requires_assessment, status, created_at
"#;

pub async fn find_rental(
    pool: &PgPool,
    rental_id: Uuid,
) -> Result<Option<RentalRef>, CheckoutError> {
    let row: Option<(Uuid, String, Uuid)> =
        sqlx::query_as("SELECT id, user_id, book_id FROM rentals WHERE id = $1")
            .bind(rental_id)
            .fetch_optional(pool)
            .await?;
    Ok(row.map(|(id, user_id, book_id)| RentalRef { id, user_id, book_id }))
}

pub struct NewReturnRow<'a> {
    pub id: Uuid,
    pub rental: &'a RentalRef,
    pub reason: ReturnReason,
    pub method: ReturnMethod,
    pub pickup_address: Option<&'a str>,
    pub customer_notes: Option<&'a str>,
}

/// The unique constraint on `rental_id` turns a resubmission into `Conflict`.
pub async fn insert_return(
    pool: &PgPool,
    new: &NewReturnRow<'_>,
) -> Result<ReturnRequest, CheckoutError> {
    let row: ReturnRow = sqlx::query_as(&format!(
        r#"
        INSERT INTO return_requests
            (id, rental_id, user_id, book_id, return_reason, return_method,
             pickup_address, customer_notes, requires_assessment, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 'pending')
        RETURNING {RETURN_COLUMNS}
        "#
    ))
    .bind(new.id)
    .bind(new.rental.id)
    .bind(&new.rental.user_id)
    .bind(new.rental.book_id)
    .bind(new.reason.as_str())
    .bind(new.method.as_str())
    .bind(new.pickup_address)
    .bind(new.customer_notes)
    .bind(new.reason.requires_assessment())
    .fetch_one(pool)
    .await
    .map_err(|e| {
        if CheckoutError::is_unique_violation(&e) {
            CheckoutError::Conflict(format!(
                "a return request already exists for rental {}",
                new.rental.id
            ))
        } else {
            CheckoutError::from(e)
        }
    })?;
    ReturnRequest::try_from(row)
}

pub async fn find_by_rental(
    pool: &PgPool,
    rental_id: Uuid,
) -> Result<Option<ReturnRequest>, CheckoutError> {
    let row: Option<ReturnRow> = sqlx::query_as(&format!(
        "SELECT {RETURN_COLUMNS} FROM return_requests WHERE rental_id = $1"
    ))
    .bind(rental_id)
    .fetch_optional(pool)
    .await?;
    row.map(ReturnRequest::try_from).transpose()
}
