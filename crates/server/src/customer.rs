//! Customer endpoints under `/api/user`.

use api_types::{
    Ack,
    account::{AccountResponse, ProfileUpdate},
    loan::{LoanListResponse, LoanNew, LoanResponse},
    pin::{PinSetup, PinSetupStarted, PinVerify},
    transaction::{DepositNew, TransactionListResponse, TransactionResponse, WithdrawalNew},
    transfer::{TransferInitiate, TransferInitiated, TransferListResponse, TransferVerify},
};
use axum::{Extension, Json, extract::State, http::StatusCode};
use chrono::Utc;
use engine::{LoanApplication, WithdrawalRecipient};

use crate::{CurrentUser, ServerError, server::ServerState, views};

pub async fn profile(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
) -> Result<Json<Ack<AccountResponse>>, ServerError> {
    let account = state.engine.account(user.id).await?;
    Ok(Json(Ack::new(AccountResponse {
        account: views::account(account),
    })))
}

pub async fn update_profile(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Json(payload): Json<ProfileUpdate>,
) -> Result<Json<Ack<AccountResponse>>, ServerError> {
    let account = state.engine.update_profile(user.id, &payload.name).await?;
    Ok(Json(Ack::new(AccountResponse {
        account: views::account(account),
    })))
}

pub async fn deposit(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Json(payload): Json<DepositNew>,
) -> Result<(StatusCode, Json<Ack<TransactionResponse>>), ServerError> {
    let tx = state
        .engine
        .request_deposit(user.id, payload.amount_minor, Utc::now())
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(Ack::new(TransactionResponse {
            transaction: views::transaction(tx),
        })),
    ))
}

pub async fn withdrawal(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Json(payload): Json<WithdrawalNew>,
) -> Result<(StatusCode, Json<Ack<TransactionResponse>>), ServerError> {
    let recipient = WithdrawalRecipient {
        recipient_name: payload.recipient_name,
        account_number: payload.account_number,
        bank: payload.bank,
    };
    let tx = state
        .engine
        .request_withdrawal(user.id, payload.amount_minor, recipient, Utc::now())
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(Ack::new(TransactionResponse {
            transaction: views::transaction(tx),
        })),
    ))
}

pub async fn transactions(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
) -> Result<Json<Ack<TransactionListResponse>>, ServerError> {
    let txs = state.engine.list_transactions(user.id).await?;
    Ok(Json(Ack::new(TransactionListResponse {
        transactions: txs.into_iter().map(views::transaction).collect(),
    })))
}

pub async fn loans(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
) -> Result<Json<Ack<LoanListResponse>>, ServerError> {
    let loans = state.engine.list_loans(user.id).await?;
    Ok(Json(Ack::new(LoanListResponse {
        loans: loans.into_iter().map(views::loan).collect(),
    })))
}

pub async fn loan_new(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Json(payload): Json<LoanNew>,
) -> Result<(StatusCode, Json<Ack<LoanResponse>>), ServerError> {
    let application = LoanApplication {
        amount_minor: payload.amount_minor,
        purpose: payload.purpose,
        duration_months: payload.duration_months,
        employment_status: payload.employment_status,
        monthly_income_minor: payload.monthly_income_minor,
    };
    let loan = state
        .engine
        .submit_loan(user.id, application, Utc::now())
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(Ack::new(LoanResponse {
            loan: views::loan(loan),
        })),
    ))
}

pub async fn transfers(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
) -> Result<Json<Ack<TransferListResponse>>, ServerError> {
    let transfers = state.engine.list_transfers(user.id).await?;
    Ok(Json(Ack::new(TransferListResponse {
        transfers: transfers.into_iter().map(views::transfer).collect(),
    })))
}

pub async fn transfer_initiate(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Json(payload): Json<TransferInitiate>,
) -> Result<(StatusCode, Json<Ack<TransferInitiated>>), ServerError> {
    let initiated = state
        .engine
        .initiate_transfer(
            user.id,
            payload.amount_minor,
            views::destination_from_api(payload.destination),
            &payload.pin,
            Utc::now(),
        )
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(Ack::new(TransferInitiated {
            transfer_id: initiated.transfer_id,
            otp_expires_at: initiated.otp_expires_at,
        })),
    ))
}

pub async fn transfer_verify(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Json(payload): Json<TransferVerify>,
) -> Result<Json<Ack<TransactionResponse>>, ServerError> {
    let tx = state
        .engine
        .verify_transfer(user.id, payload.transfer_id, &payload.otp, Utc::now())
        .await?;
    Ok(Json(Ack::new(TransactionResponse {
        transaction: views::transaction(tx),
    })))
}

pub async fn pin_initiate(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Json(payload): Json<PinSetup>,
) -> Result<Json<Ack<PinSetupStarted>>, ServerError> {
    let otp_expires_at = state
        .engine
        .initiate_pin_setup(user.id, &payload.pin, Utc::now())
        .await?;
    Ok(Json(Ack::new(PinSetupStarted { otp_expires_at })))
}

pub async fn pin_verify(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Json(payload): Json<PinVerify>,
) -> Result<Json<Ack<AccountResponse>>, ServerError> {
    let account = state
        .engine
        .confirm_pin_setup(user.id, &payload.otp, Utc::now())
        .await?;
    Ok(Json(Ack::new(AccountResponse {
        account: views::account(account),
    })))
}
