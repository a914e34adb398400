//! Pricing and payment-state rules.
//!
//! Every derived amount shown or stored for a project comes from here. The
//! functions take plain values, never touch the store and always return a
//! value, so the project wizard can call them after every keystroke.

use chrono::NaiveDate;

use crate::models::{PaymentStatus, ProjectType};

/// Raw pricing inputs of a project, detached from the rest of the record.
///
/// Missing counts and prices are treated as zero.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PricingInput {
    pub project_type: ProjectType,
    pub total_pages: Option<i32>,
    pub completed_pages: Option<i32>,
    pub price_per_page: Option<f64>,
    pub fixed_price: Option<f64>,
    pub completion_percentage: Option<i32>,
    pub extra_hours: f64,
    pub extra_hour_rate: f64,
}

/// Fields that are recomputed from inputs and never edited directly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Derived {
    pub total_amount: f64,
    pub payment_status: PaymentStatus,
}

/// Total billable amount: the mode-specific base plus extra hours.
pub fn calculate_total_amount(input: &PricingInput) -> f64 {
    let base = match input.project_type {
        ProjectType::Frontend => {
            f64::from(input.completed_pages.unwrap_or(0)) * input.price_per_page.unwrap_or(0.0)
        }
        ProjectType::Backend | ProjectType::Fullstack => {
            let completion_rate = f64::from(input.completion_percentage.unwrap_or(0)) / 100.0;
            input.fixed_price.unwrap_or(0.0) * completion_rate
        }
    };

    let extra = input.extra_hours * input.extra_hour_rate;

    base + extra
}

/// Nothing paid is `Unpaid` even when the total is zero.
pub fn derive_payment_status(paid_amount: f64, total_amount: f64) -> PaymentStatus {
    if paid_amount <= 0.0 {
        PaymentStatus::Unpaid
    } else if paid_amount >= total_amount {
        PaymentStatus::Paid
    } else {
        PaymentStatus::Partial
    }
}

/// Completion in percent, clamped to `0.0..=100.0`.
pub fn calculate_progress(input: &PricingInput) -> f64 {
    let progress = match input.project_type {
        ProjectType::Frontend => match input.total_pages {
            Some(total) if total > 0 => {
                f64::from(input.completed_pages.unwrap_or(0)) / f64::from(total) * 100.0
            }
            _ => 0.0,
        },
        ProjectType::Backend | ProjectType::Fullstack => {
            f64::from(input.completion_percentage.unwrap_or(0))
        }
    };

    progress.clamp(0.0, 100.0)
}

/// Whole calendar days from `today` until `deadline`; negative when overdue.
///
/// Both sides are dates without a time of day, so the difference is already
/// an exact number of days.
pub fn days_remaining(deadline: Option<NaiveDate>, today: NaiveDate) -> Option<i64> {
    deadline.map(|deadline| (deadline - today).num_days())
}

/// Recompute both derived fields; the status always sees the fresh total.
pub fn derive(input: &PricingInput, paid_amount: f64) -> Derived {
    let total_amount = calculate_total_amount(input);

    Derived {
        total_amount,
        payment_status: derive_payment_status(paid_amount, total_amount),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frontend(total: i32, completed: i32, price: f64) -> PricingInput {
        PricingInput {
            project_type: ProjectType::Frontend,
            total_pages: Some(total),
            completed_pages: Some(completed),
            price_per_page: Some(price),
            ..PricingInput::default()
        }
    }

    fn fixed(project_type: ProjectType, price: f64, percent: i32) -> PricingInput {
        PricingInput {
            project_type,
            fixed_price: Some(price),
            completion_percentage: Some(percent),
            ..PricingInput::default()
        }
    }

    #[test]
    fn frontend_total_is_pages_times_rate_plus_extra() {
        let mut input = frontend(10, 4, 250.0);
        input.extra_hours = 3.0;
        input.extra_hour_rate = 100.0;

        assert_eq!(calculate_total_amount(&input), 4.0 * 250.0 + 3.0 * 100.0);
    }

    #[test]
    fn frontend_total_ignores_total_pages_and_fixed_price() {
        let mut input = frontend(50, 2, 10.0);
        input.fixed_price = Some(99_999.0);
        input.completion_percentage = Some(100);

        assert_eq!(calculate_total_amount(&input), 20.0);
    }

    #[test]
    fn missing_frontend_values_count_as_zero() {
        let input = PricingInput {
            project_type: ProjectType::Frontend,
            extra_hours: 1.5,
            extra_hour_rate: 40.0,
            ..PricingInput::default()
        };

        assert_eq!(calculate_total_amount(&input), 60.0);
    }

    #[test]
    fn backend_and_fullstack_scale_fixed_price_by_completion() {
        for project_type in [ProjectType::Backend, ProjectType::Fullstack] {
            let mut input = fixed(project_type, 8000.0, 25);
            input.extra_hours = 2.0;
            input.extra_hour_rate = 150.0;

            assert_eq!(calculate_total_amount(&input), 8000.0 * 25.0 / 100.0 + 300.0);
        }
    }

    #[test]
    fn fixed_price_modes_ignore_page_fields() {
        let mut input = fixed(ProjectType::Backend, 1000.0, 50);
        input.completed_pages = Some(30);
        input.price_per_page = Some(500.0);

        assert_eq!(calculate_total_amount(&input), 500.0);
    }

    #[test]
    fn total_is_idempotent() {
        let input = fixed(ProjectType::Fullstack, 1234.5, 37);

        assert_eq!(calculate_total_amount(&input), calculate_total_amount(&input));
    }

    #[test]
    fn payment_status_thresholds() {
        assert_eq!(derive_payment_status(0.0, 100.0), PaymentStatus::Unpaid);
        assert_eq!(derive_payment_status(50.0, 100.0), PaymentStatus::Partial);
        assert_eq!(derive_payment_status(100.0, 100.0), PaymentStatus::Paid);
        assert_eq!(derive_payment_status(150.0, 100.0), PaymentStatus::Paid);
    }

    #[test]
    fn zero_paid_on_zero_total_is_unpaid() {
        assert_eq!(derive_payment_status(0.0, 0.0), PaymentStatus::Unpaid);
    }

    #[test]
    fn negative_paid_amount_is_unpaid() {
        assert_eq!(derive_payment_status(-5.0, 100.0), PaymentStatus::Unpaid);
    }

    #[test]
    fn frontend_progress_without_pages_is_zero() {
        assert_eq!(calculate_progress(&frontend(0, 7, 10.0)), 0.0);

        let no_pages = PricingInput {
            project_type: ProjectType::Frontend,
            completed_pages: Some(3),
            ..PricingInput::default()
        };
        assert_eq!(calculate_progress(&no_pages), 0.0);
    }

    #[test]
    fn frontend_progress_is_page_ratio() {
        assert_eq!(calculate_progress(&frontend(8, 2, 0.0)), 25.0);
    }

    #[test]
    fn progress_stays_within_range() {
        assert_eq!(calculate_progress(&frontend(4, 6, 0.0)), 100.0);
        assert_eq!(calculate_progress(&fixed(ProjectType::Backend, 0.0, 140)), 100.0);
        assert_eq!(calculate_progress(&fixed(ProjectType::Backend, 0.0, -10)), 0.0);
    }

    #[test]
    fn fixed_price_progress_is_completion_percentage() {
        assert_eq!(calculate_progress(&fixed(ProjectType::Fullstack, 10.0, 65)), 65.0);
    }

    #[test]
    fn days_remaining_counts_calendar_days() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).expect("valid date");

        assert_eq!(days_remaining(None, today), None);
        assert_eq!(days_remaining(Some(today), today), Some(0));
        assert_eq!(days_remaining(today.pred_opt(), today), Some(-1));
        assert_eq!(
            days_remaining(NaiveDate::from_ymd_opt(2024, 4, 1), today),
            Some(22)
        );
    }

    #[test]
    fn derive_uses_fresh_total() {
        let input = frontend(10, 10, 100.0);

        let derived = derive(&input, 1000.0);
        assert_eq!(derived.total_amount, 1000.0);
        assert_eq!(derived.payment_status, PaymentStatus::Paid);

        let derived = derive(&input, 400.0);
        assert_eq!(derived.payment_status, PaymentStatus::Partial);
    }
}
