//! The project lifecycle state machine.
//!
//! Every status change on a custom project is expressed as a [`ProjectEvent`] applied to the project's current
//! [`LifecycleView`]. [`apply`] either returns the column updates the event entails, or rejects the event as an
//! [`InvalidTransition`]. Database code never writes status columns directly from handler input.

use thiserror::Error;

use crate::db_types::{ProjectStatus, QuotePaymentStatus};

#[derive(Debug, Clone, Error)]
pub enum InvalidTransition {
    #[error("Cannot send a quote for a project in state '{0}'")]
    QuoteNotApplicable(ProjectStatus),
    #[error("Quote must be a positive amount, got {0}")]
    NonPositiveQuote(i64),
    #[error("Initial payment is not expected for a project in state '{0}'")]
    InitialPaymentNotExpected(ProjectStatus),
    #[error("Final payment is not expected for a project in state '{0}'")]
    FinalPaymentNotExpected(ProjectStatus),
    #[error("Progress can only be set while the project is in progress, not '{0}'")]
    ProgressNotApplicable(ProjectStatus),
    #[error("Completion percentage must be between 0 and 100, got {0}")]
    ProgressOutOfRange(i64),
}

/// The lifecycle-relevant slice of a project row.
#[derive(Debug, Clone, Copy)]
pub struct LifecycleView {
    pub status: ProjectStatus,
    pub payment_status: QuotePaymentStatus,
    pub final_quote: Option<i64>,
    pub completion_percentage: i64,
}

#[derive(Debug, Clone, Copy)]
pub enum ProjectEvent {
    /// Admin sets the agreed price, in whole rupees.
    QuoteSent(i64),
    /// A verified gateway payment for the 50% instalment.
    InitialPaymentVerified,
    /// Admin reports build progress as a percentage.
    ProgressSet(i64),
    /// A verified gateway payment for the remaining balance.
    FinalPaymentVerified,
    /// A delivery file landed. Forces the terminal state regardless of where the project was.
    DeliveryFileAttached,
    /// Admin moves the project to an arbitrary known status. Logged at the call site.
    AdminOverride(ProjectStatus),
}

/// The set of column updates an accepted event produces. `None` fields are left untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct StateChange {
    pub status: Option<ProjectStatus>,
    pub payment_status: Option<QuotePaymentStatus>,
    pub final_quote: Option<i64>,
    pub completion_percentage: Option<i64>,
}

pub fn apply(view: LifecycleView, event: ProjectEvent) -> Result<StateChange, InvalidTransition> {
    use ProjectEvent as E;
    use ProjectStatus as S;
    match event {
        E::QuoteSent(amount) => {
            if amount <= 0 {
                return Err(InvalidTransition::NonPositiveQuote(amount));
            }
            // Re-quoting an already quoted project is allowed as long as no money has moved.
            if !matches!(view.status, S::PendingAdminReview | S::QuoteSent) {
                return Err(InvalidTransition::QuoteNotApplicable(view.status));
            }
            Ok(StateChange {
                status: Some(S::QuoteSent),
                payment_status: Some(QuotePaymentStatus::PendingFifty),
                final_quote: Some(amount),
                ..Default::default()
            })
        },
        E::InitialPaymentVerified => {
            if view.status != S::QuoteSent {
                return Err(InvalidTransition::InitialPaymentNotExpected(view.status));
            }
            Ok(StateChange {
                status: Some(S::InProgress),
                payment_status: Some(QuotePaymentStatus::FiftyPaid),
                ..Default::default()
            })
        },
        E::ProgressSet(pct) => {
            if !(0..=100).contains(&pct) {
                return Err(InvalidTransition::ProgressOutOfRange(pct));
            }
            if !matches!(view.status, S::InProgress | S::AwaitingFinalPayment) {
                return Err(InvalidTransition::ProgressNotApplicable(view.status));
            }
            // Hitting 100% flips the project to awaiting the balance payment.
            let status = if pct == 100 && view.status == S::InProgress {
                Some(S::AwaitingFinalPayment)
            } else {
                None
            };
            Ok(StateChange { status, completion_percentage: Some(pct), ..Default::default() })
        },
        E::FinalPaymentVerified => {
            if !matches!(view.status, S::InProgress | S::AwaitingFinalPayment) {
                return Err(InvalidTransition::FinalPaymentNotExpected(view.status));
            }
            Ok(StateChange {
                status: Some(S::Delivered),
                payment_status: Some(QuotePaymentStatus::HundredPaid),
                ..Default::default()
            })
        },
        E::DeliveryFileAttached => {
            let status = (view.status != S::Delivered).then_some(S::Delivered);
            Ok(StateChange { status, ..Default::default() })
        },
        E::AdminOverride(status) => Ok(StateChange { status: Some(status), ..Default::default() }),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::db_types::{ProjectStatus as S, QuotePaymentStatus as P};

    fn fresh() -> LifecycleView {
        LifecycleView {
            status: S::PendingAdminReview,
            payment_status: P::NotQuoted,
            final_quote: None,
            completion_percentage: 0,
        }
    }

    #[test]
    fn quote_moves_pending_project_to_quoted() {
        let change = apply(fresh(), ProjectEvent::QuoteSent(10_000)).unwrap();
        assert_eq!(change.status, Some(S::QuoteSent));
        assert_eq!(change.payment_status, Some(P::PendingFifty));
        assert_eq!(change.final_quote, Some(10_000));
    }

    #[test]
    fn requote_is_allowed_before_payment() {
        let view = LifecycleView { status: S::QuoteSent, payment_status: P::PendingFifty, final_quote: Some(5000), completion_percentage: 0 };
        let change = apply(view, ProjectEvent::QuoteSent(7500)).unwrap();
        assert_eq!(change.final_quote, Some(7500));
    }

    #[test]
    fn quote_rejected_once_work_started() {
        let view = LifecycleView { status: S::InProgress, payment_status: P::FiftyPaid, final_quote: Some(5000), completion_percentage: 20 };
        let err = apply(view, ProjectEvent::QuoteSent(9000)).unwrap_err();
        assert!(matches!(err, InvalidTransition::QuoteNotApplicable(S::InProgress)));
    }

    #[test]
    fn zero_and_negative_quotes_rejected() {
        assert!(matches!(apply(fresh(), ProjectEvent::QuoteSent(0)), Err(InvalidTransition::NonPositiveQuote(0))));
        assert!(matches!(apply(fresh(), ProjectEvent::QuoteSent(-5)), Err(InvalidTransition::NonPositiveQuote(-5))));
    }

    #[test]
    fn initial_payment_only_from_quoted_state() {
        let view = LifecycleView { status: S::QuoteSent, payment_status: P::PendingFifty, final_quote: Some(5000), completion_percentage: 0 };
        let change = apply(view, ProjectEvent::InitialPaymentVerified).unwrap();
        assert_eq!(change.status, Some(S::InProgress));
        assert_eq!(change.payment_status, Some(P::FiftyPaid));

        let err = apply(fresh(), ProjectEvent::InitialPaymentVerified).unwrap_err();
        assert!(matches!(err, InvalidTransition::InitialPaymentNotExpected(_)));
    }

    #[test]
    fn progress_at_100_awaits_final_payment() {
        let view = LifecycleView { status: S::InProgress, payment_status: P::FiftyPaid, final_quote: Some(5000), completion_percentage: 40 };
        let change = apply(view, ProjectEvent::ProgressSet(100)).unwrap();
        assert_eq!(change.status, Some(S::AwaitingFinalPayment));
        assert_eq!(change.completion_percentage, Some(100));

        let change = apply(view, ProjectEvent::ProgressSet(60)).unwrap();
        assert_eq!(change.status, None);
        assert_eq!(change.completion_percentage, Some(60));
    }

    #[test]
    fn progress_can_be_corrected_after_hitting_100() {
        let view = LifecycleView {
            status: S::AwaitingFinalPayment,
            payment_status: P::FiftyPaid,
            final_quote: Some(5000),
            completion_percentage: 100,
        };
        let change = apply(view, ProjectEvent::ProgressSet(90)).unwrap();
        assert_eq!(change.status, None);
        assert_eq!(change.completion_percentage, Some(90));
    }

    #[test]
    fn progress_bounds_enforced() {
        let view = LifecycleView { status: S::InProgress, payment_status: P::FiftyPaid, final_quote: Some(5000), completion_percentage: 40 };
        assert!(matches!(apply(view, ProjectEvent::ProgressSet(101)), Err(InvalidTransition::ProgressOutOfRange(101))));
        assert!(matches!(apply(view, ProjectEvent::ProgressSet(-1)), Err(InvalidTransition::ProgressOutOfRange(-1))));
    }

    #[test]
    fn final_payment_from_either_working_state() {
        for status in [S::InProgress, S::AwaitingFinalPayment] {
            let view = LifecycleView { status, payment_status: P::FiftyPaid, final_quote: Some(5000), completion_percentage: 100 };
            let change = apply(view, ProjectEvent::FinalPaymentVerified).unwrap();
            assert_eq!(change.status, Some(S::Delivered));
            assert_eq!(change.payment_status, Some(P::HundredPaid));
        }
        let err = apply(fresh(), ProjectEvent::FinalPaymentVerified).unwrap_err();
        assert!(matches!(err, InvalidTransition::FinalPaymentNotExpected(_)));
    }

    #[test]
    fn delivery_file_forces_delivered() {
        let view = LifecycleView { status: S::AwaitingFinalPayment, payment_status: P::FiftyPaid, final_quote: Some(5000), completion_percentage: 100 };
        let change = apply(view, ProjectEvent::DeliveryFileAttached).unwrap();
        assert_eq!(change.status, Some(S::Delivered));

        let view = LifecycleView { status: S::Delivered, ..view };
        let change = apply(view, ProjectEvent::DeliveryFileAttached).unwrap();
        assert_eq!(change.status, None);
    }
}
