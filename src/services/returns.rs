use {
    crate::domain::{
        error::CheckoutError,
        returns::{ReturnRequest, ReturnSubmission},
    },
    crate::infra::postgres::return_repo::{self, NewReturnRow},
    sqlx::PgPool,
    uuid::Uuid,
};

/// One return request per rental; only the renter may file it.
pub async fn submit_return(
    pool: &PgPool,
    submission: &ReturnSubmission,
) -> Result<ReturnRequest, CheckoutError> {
    submission.validate()?;

    let rental = return_repo::find_rental(pool, submission.rental_id)
        .await?
        .ok_or_else(|| CheckoutError::NotFound(format!("rental {}", submission.rental_id)))?;

    if rental.user_id != submission.user_id {
        return Err(CheckoutError::Forbidden(format!(
            "rental {} does not belong to this user",
            rental.id
        )));
    }
    if let Some(book_id) = submission.book_id.filter(|id| *id != rental.book_id) {
        return Err(CheckoutError::Validation(format!(
            "book {book_id} is not the book on rental {}",
            rental.id
        )));
    }

    let request = return_repo::insert_return(
        pool,
        &NewReturnRow {
            id: Uuid::now_v7(),
            rental: &rental,
            reason: submission.return_reason,
            method: submission.return_method,
            pickup_address: submission.pickup_address.as_deref(),
            customer_notes: submission.customer_notes.as_deref(),
        },
    )
    .await?;

    if request.requires_assessment {
        tracing::warn!(
            return_id = %request.id,
            rental_id = %request.rental_id,
            reason = request.return_reason.as_str(),
            "return flagged for manual assessment"
        );
    } else {
        tracing::info!(
            return_id = %request.id,
            rental_id = %request.rental_id,
            reason = request.return_reason.as_str(),
            "return request submitted"
        );
    }

    Ok(request)
}

pub async fn get_return_by_rental(
    pool: &PgPool,
    rental_id: Uuid,
) -> Result<ReturnRequest, CheckoutError> {
    return_repo::find_by_rental(pool, rental_id)
        .await?
        .ok_or_else(|| CheckoutError::NotFound(format!("return request for rental {rental_id}")))
}
