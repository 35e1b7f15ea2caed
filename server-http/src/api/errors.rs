use super::responses::ErrorResponse;
use axum::{http::StatusCode, Json};
use frontdesk::BackofficeError;
use tracing::{error, warn};

/// Error half of every JSON handler
pub type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;

/// Map a back-office failure to its HTTP status and a JSON body
pub fn backoffice_error(err: BackofficeError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match &err {
        BackofficeError::NotFound(_) => StatusCode::NOT_FOUND,
        BackofficeError::NotUpdated(_)
        | BackofficeError::InvalidPatch(_)
        | BackofficeError::InvalidMonth { .. } => StatusCode::BAD_REQUEST,
        BackofficeError::Store(e) => {
            warn!("record store failure: {}", e);
            StatusCode::BAD_GATEWAY
        }
        BackofficeError::Codec(e) => {
            error!("cache payload failure: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    (status, Json(ErrorResponse::new(err.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use frontdesk::store::StoreError;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (BackofficeError::NotFound("Client 1".into()), StatusCode::NOT_FOUND),
            (BackofficeError::NotUpdated("Client 1".into()), StatusCode::BAD_REQUEST),
            (BackofficeError::InvalidPatch("empty".into()), StatusCode::BAD_REQUEST),
            (
                BackofficeError::InvalidMonth { year: 2025, month: 13 },
                StatusCode::BAD_REQUEST,
            ),
            (
                BackofficeError::Store(StoreError::Transport("refused".into())),
                StatusCode::BAD_GATEWAY,
            ),
            (BackofficeError::Codec("bad".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            let (status, Json(body)) = backoffice_error(err);
            assert_eq!(status, expected);
            assert!(!body.error.is_empty());
        }
    }
}
