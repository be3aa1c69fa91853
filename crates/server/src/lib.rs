use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::EngineError;

use api_types::ErrorBody;
pub use auth::{AuthConfig, Claims, CurrentUser};
pub use server::{ServerState, router, run, run_with_listener, spawn_with_listener};

mod admin;
mod auth;
mod customer;
mod server;
mod views;

pub mod types {
    pub mod account {
        pub use api_types::account::{AccountResponse, AccountView, ProfileUpdate};
    }

    pub mod auth {
        pub use api_types::auth::{Login, LoginStarted, LoginVerify, Register, TokenResponse};
    }

    pub mod transaction {
        pub use api_types::transaction::{
            DepositNew, TransactionConfirm, TransactionListResponse, TransactionResponse,
            TransactionView, WithdrawalNew,
        };
    }

    pub mod loan {
        pub use api_types::loan::{LoanDecide, LoanListResponse, LoanNew, LoanResponse, LoanView};
    }

    pub mod transfer {
        pub use api_types::transfer::{
            AdminTransferNew, Destination, TransferInitiate, TransferInitiated,
            TransferListResponse, TransferResponse, TransferVerify, TransferView,
        };
    }

    pub mod admin {
        pub use api_types::admin::{
            BalanceAdjust, CustomerList, CustomerListResponse, CustomerUpdate, Deleted, Statistic,
        };
    }
}

#[derive(Debug)]
pub enum ServerError {
    Engine(EngineError),
    /// Server-side fault; the detail is logged, never returned.
    Internal(String),
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::Unauthorized => StatusCode::UNAUTHORIZED,
        EngineError::Forbidden(_) | EngineError::InvalidPin => StatusCode::FORBIDDEN,
        EngineError::NotFound(_) => StatusCode::NOT_FOUND,
        EngineError::ExistingKey(_)
        | EngineError::AlreadyProcessed(_)
        | EngineError::InvalidTransition(_) => StatusCode::CONFLICT,
        EngineError::PinNotSet | EngineError::InvalidOrExpiredOtp => StatusCode::BAD_REQUEST,
        EngineError::Validation(_) | EngineError::InsufficientFunds(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        EngineError::LoanApprovalFailed(_)
        | EngineError::Secret(_)
        | EngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        EngineError::Secret(secret_err) => {
            tracing::error!("secret hashing error: {secret_err}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ServerError::Engine(err) => {
                (status_for_engine_error(&err), message_for_engine_error(err))
            }
            ServerError::Internal(err) => {
                tracing::error!("internal error: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        (
            status,
            Json(ErrorBody {
                success: false,
                error,
            }),
        )
            .into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}
