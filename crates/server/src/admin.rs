//! Back-office endpoints under `/api/admin`. Every route here sits behind
//! the admin-only middleware.

use api_types::{
    Ack,
    account::AccountResponse,
    admin::{
        BalanceAdjust, CustomerList, CustomerListResponse, CustomerUpdate, Deleted, Statistic,
    },
    loan::{LoanDecide, LoanListResponse, LoanResponse},
    transaction::{TransactionConfirm, TransactionListResponse, TransactionResponse},
    transfer::{AdminTransferNew, TransferListResponse, TransferResponse},
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use engine::{AccountUpdate, EngineError, LoanDecision};
use uuid::Uuid;

use crate::{CurrentUser, ServerError, server::ServerState, views};

pub async fn customers(
    State(state): State<ServerState>,
    Query(filter): Query<CustomerList>,
) -> Result<Json<Ack<CustomerListResponse>>, ServerError> {
    let accounts = state
        .engine
        .list_accounts(filter.role.map(views::role_from_api))
        .await?;
    Ok(Json(Ack::new(CustomerListResponse {
        accounts: accounts.into_iter().map(views::account).collect(),
    })))
}

pub async fn customer_update(
    State(state): State<ServerState>,
    Path(account_id): Path<Uuid>,
    Json(payload): Json<CustomerUpdate>,
) -> Result<Json<Ack<AccountResponse>>, ServerError> {
    let update = AccountUpdate {
        status: payload.status.map(views::status_from_api),
        account_type: payload.account_type.map(views::account_type_from_api),
        name: payload.name,
        email: payload.email,
    };
    let account = state.engine.update_account(account_id, update).await?;
    Ok(Json(Ack::new(AccountResponse {
        account: views::account(account),
    })))
}

pub async fn customer_delete(
    Extension(admin): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(account_id): Path<Uuid>,
) -> Result<Json<Ack<Deleted>>, ServerError> {
    if admin.id == account_id {
        return Err(EngineError::Forbidden("cannot delete your own account".to_string()).into());
    }
    state.engine.delete_account(account_id).await?;
    tracing::info!(admin_id = %admin.id, %account_id, "account deleted by admin");
    Ok(Json(Ack::new(Deleted { id: account_id })))
}

pub async fn customer_balance(
    Extension(admin): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(account_id): Path<Uuid>,
    Json(payload): Json<BalanceAdjust>,
) -> Result<Json<Ack<AccountResponse>>, ServerError> {
    let account = state
        .engine
        .adjust_balance(
            account_id,
            payload.balance_minor,
            payload.note.as_deref(),
            Utc::now(),
        )
        .await?;
    tracing::info!(admin_id = %admin.id, %account_id, "balance override applied");
    Ok(Json(Ack::new(AccountResponse {
        account: views::account(account),
    })))
}

pub async fn transactions(
    State(state): State<ServerState>,
) -> Result<Json<Ack<TransactionListResponse>>, ServerError> {
    let txs = state.engine.list_all_transactions().await?;
    Ok(Json(Ack::new(TransactionListResponse {
        transactions: txs.into_iter().map(views::transaction).collect(),
    })))
}

pub async fn account_transactions(
    State(state): State<ServerState>,
    Path(account_id): Path<Uuid>,
) -> Result<Json<Ack<TransactionListResponse>>, ServerError> {
    let txs = state.engine.list_transactions(account_id).await?;
    Ok(Json(Ack::new(TransactionListResponse {
        transactions: txs.into_iter().map(views::transaction).collect(),
    })))
}

pub async fn transaction_confirm(
    State(state): State<ServerState>,
    Path(transaction_id): Path<Uuid>,
    Json(payload): Json<TransactionConfirm>,
) -> Result<Json<Ack<TransactionResponse>>, ServerError> {
    let tx = state
        .engine
        .confirm_transaction(
            transaction_id,
            views::transaction_status_from_api(payload.status),
            Utc::now(),
        )
        .await?;
    Ok(Json(Ack::new(TransactionResponse {
        transaction: views::transaction(tx),
    })))
}

pub async fn loans(
    State(state): State<ServerState>,
) -> Result<Json<Ack<LoanListResponse>>, ServerError> {
    let loans = state.engine.list_all_loans().await?;
    Ok(Json(Ack::new(LoanListResponse {
        loans: loans.into_iter().map(views::loan).collect(),
    })))
}

pub async fn loan_decide(
    State(state): State<ServerState>,
    Path(loan_id): Path<Uuid>,
    Json(payload): Json<LoanDecide>,
) -> Result<Json<Ack<LoanResponse>>, ServerError> {
    let decision = match payload.decision {
        api_types::loan::LoanDecision::Approved => LoanDecision::Approved,
        api_types::loan::LoanDecision::Rejected => LoanDecision::Rejected,
    };
    let loan = state
        .engine
        .decide_loan(loan_id, decision, Utc::now())
        .await?;
    Ok(Json(Ack::new(LoanResponse {
        loan: views::loan(loan),
    })))
}

pub async fn transfers(
    State(state): State<ServerState>,
) -> Result<Json<Ack<TransferListResponse>>, ServerError> {
    let transfers = state.engine.list_all_transfers().await?;
    Ok(Json(Ack::new(TransferListResponse {
        transfers: transfers.into_iter().map(views::transfer).collect(),
    })))
}

pub async fn transfer_new(
    Extension(admin): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Json(payload): Json<AdminTransferNew>,
) -> Result<(StatusCode, Json<Ack<TransferResponse>>), ServerError> {
    let transfer = state
        .engine
        .admin_transfer(
            payload.account_id,
            payload.amount_minor,
            views::destination_from_api(payload.destination),
            payload.scheduled_at,
            Utc::now(),
        )
        .await?;
    tracing::info!(admin_id = %admin.id, transfer_id = %transfer.id, "admin transfer issued");
    Ok((
        StatusCode::CREATED,
        Json(Ack::new(TransferResponse {
            transfer: views::transfer(transfer),
        })),
    ))
}

pub async fn stats(State(state): State<ServerState>) -> Result<Json<Ack<Statistic>>, ServerError> {
    let stats = state.engine.stats().await?;
    Ok(Json(Ack::new(Statistic {
        total_customers: stats.total_customers,
        approved_loans: stats.approved_loans,
        successful_transactions: stats.successful_transactions,
        successful_volume_minor: stats.successful_volume_minor,
    })))
}
