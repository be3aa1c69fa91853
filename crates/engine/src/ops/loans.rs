use chrono::{DateTime, Utc};
use sea_orm::{
    DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*, sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    EngineError, Loan, LoanApplication, LoanDecision, LoanStatus, Money, ResultEngine,
    TransactionKind, TransactionMetadata, TransactionStatus, loans,
};

use super::{Engine, with_tx};

impl Engine {
    /// File a loan application. The loan starts `Pending`.
    pub async fn submit_loan(
        &self,
        account_id: Uuid,
        application: LoanApplication,
        now: DateTime<Utc>,
    ) -> ResultEngine<Loan> {
        application.validate()?;
        with_tx!(self, |db_tx| {
            self.require_active_account(&db_tx, account_id).await?;
            let loan = Loan {
                id: Uuid::new_v4(),
                account_id,
                amount_minor: application.amount_minor,
                purpose: application.purpose.trim().to_string(),
                duration_months: application.duration_months,
                employment_status: application.employment_status.trim().to_string(),
                monthly_income_minor: application.monthly_income_minor,
                status: LoanStatus::Pending,
                credit_transaction_id: None,
                created_at: now,
                decided_at: None,
            };
            let model: loans::ActiveModel = (&loan).into();
            model.insert(&db_tx).await?;
            tracing::info!(loan_id = %loan.id, %account_id, "loan submitted");
            Ok(loan)
        })
    }

    /// Approve or reject a pending loan.
    ///
    /// Approval pays the principal out in one unit: the loan goes through
    /// `Approved`, the borrower is credited, a settled deposit entry is
    /// recorded and the loan ends `Paid`. If any step fails the unit is
    /// rolled back, the loan stays `Pending` and the call fails with
    /// [`EngineError::LoanApprovalFailed`].
    pub async fn decide_loan(
        &self,
        loan_id: Uuid,
        decision: LoanDecision,
        now: DateTime<Utc>,
    ) -> ResultEngine<Loan> {
        with_tx!(self, |db_tx| {
            let model = loans::Entity::find_by_id(loan_id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::NotFound(format!("loan {loan_id}")))?;
            let mut loan = Loan::try_from(model)?;

            let next = match decision {
                LoanDecision::Approved => LoanStatus::Approved,
                LoanDecision::Rejected => LoanStatus::Rejected,
            };
            self.transition_loan(&db_tx, &loan, next, Some(now), None)
                .await?;
            loan.status = next;
            loan.decided_at = Some(now);

            if decision == LoanDecision::Approved {
                let credit_id = match self.pay_out(&db_tx, &loan, now).await {
                    Ok(id) => id,
                    Err(err) => {
                        tracing::error!(%loan_id, "loan payout failed: {err}");
                        return Err(EngineError::LoanApprovalFailed(err.to_string()));
                    }
                };
                loan.status = LoanStatus::Paid;
                loan.credit_transaction_id = Some(credit_id);
            }

            tracing::info!(%loan_id, status = loan.status.as_str(), "loan decided");
            Ok(loan)
        })
    }

    /// Loans of one account, newest first.
    pub async fn list_loans(&self, account_id: Uuid) -> ResultEngine<Vec<Loan>> {
        with_tx!(self, |db_tx| {
            self.require_account(&db_tx, account_id).await?;
            let models = loans::Entity::find()
                .filter(loans::Column::AccountId.eq(account_id.to_string()))
                .order_by_desc(loans::Column::CreatedAt)
                .all(&db_tx)
                .await?;
            models
                .into_iter()
                .map(Loan::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }

    /// Credit the borrower and close the loan as `Paid`. Returns the id of
    /// the credit entry.
    async fn pay_out(
        &self,
        db: &DatabaseTransaction,
        loan: &Loan,
        now: DateTime<Utc>,
    ) -> ResultEngine<Uuid> {
        self.increment(db, loan.account_id, loan.amount_minor)
            .await?;
        let credit = self
            .record(
                db,
                loan.account_id,
                TransactionKind::Deposit,
                TransactionStatus::Success,
                loan.amount_minor,
                format!("Loan approved: {}", loan.id),
                Some(TransactionMetadata::Loan { loan_id: loan.id }),
                now,
            )
            .await?;
        self.transition_loan(db, loan, LoanStatus::Paid, None, Some(credit.id))
            .await?;
        tracing::info!(
            loan_id = %loan.id,
            account_id = %loan.account_id,
            amount = %Money::new(loan.amount_minor),
            "loan paid out"
        );
        Ok(credit.id)
    }

    /// Conditional status write: only succeeds if the stored status is still
    /// `loan.status`.
    async fn transition_loan(
        &self,
        db: &DatabaseTransaction,
        loan: &Loan,
        next: LoanStatus,
        decided_at: Option<DateTime<Utc>>,
        credit_transaction_id: Option<Uuid>,
    ) -> ResultEngine<()> {
        if !loan.status.can_transition_to(next) {
            return Err(EngineError::InvalidTransition(format!(
                "loan {} -> {}",
                loan.status.as_str(),
                next.as_str()
            )));
        }

        let mut update = loans::Entity::update_many()
            .col_expr(loans::Column::Status, Expr::value(next.as_str()))
            .filter(loans::Column::Id.eq(loan.id.to_string()))
            .filter(loans::Column::Status.eq(loan.status.as_str()));
        if let Some(decided_at) = decided_at {
            update = update.col_expr(loans::Column::DecidedAt, Expr::value(decided_at));
        }
        if let Some(credit_id) = credit_transaction_id {
            update = update.col_expr(
                loans::Column::CreditTransactionId,
                Expr::value(credit_id.to_string()),
            );
        }

        let result = update.exec(db).await?;
        if result.rows_affected == 0 {
            return Err(EngineError::InvalidTransition(format!(
                "loan {} is no longer {}",
                loan.id,
                loan.status.as_str()
            )));
        }
        Ok(())
    }
}
