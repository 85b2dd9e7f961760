use super::people::SubjectId;
use super::period::Period;
use crate::error::{Result, ScholarshipError};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

pub type RecordId = u64;

/// Decimal places kept for stored money amounts.
pub const MONEY_SCALE: u32 = 2;

/// A monetary amount.
///
/// Wraps `rust_decimal::Decimal` so pay figures cannot be mixed up with
/// other decimal quantities such as the HRA fraction.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(pub Decimal);

impl Money {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn to_cents(amount: Decimal) -> Money {
    let mut amount = amount.round_dp(MONEY_SCALE);
    amount.rescale(MONEY_SCALE);
    Money(amount)
}

/// Full monthly entitlement: `basic + basic * hra`, unrounded.
pub fn monthly_pay(basic: Decimal, hra: Decimal) -> Money {
    Money(basic + basic * hra)
}

/// Daily rate for a month: `(basic + basic * hra) / days_in_month`, rounded to
/// cents with banker's rounding. Display figure only; pay is computed from
/// the unrounded rate.
pub fn daily_rate(basic: Decimal, hra: Decimal, period: Period) -> Money {
    let monthly = monthly_pay(basic, hra).value();
    to_cents(monthly / Decimal::from(period.days_in_month()))
}

/// Pay for `days` of a month, `days * monthly / days_in_month` rounded to cents.
pub fn pay_for_days(monthly: Money, days: u32, period: Period) -> Money {
    to_cents(monthly.value() * Decimal::from(days) / Decimal::from(period.days_in_month()))
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum ApprovalStatus {
    #[default]
    Pending,
    Approved,
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApprovalStatus::Pending => f.write_str("PENDING"),
            ApprovalStatus::Approved => f.write_str("APPROVED"),
        }
    }
}

/// Fields of a payment record before the store assigns it an id.
#[derive(Debug, PartialEq, Clone)]
pub struct NewPaymentRecord {
    pub subject: SubjectId,
    pub period: Period,
    pub days: u32,
    pub monthly_pay: Money,
    pub daily_rate: Money,
    pub total_pay: Money,
}

impl NewPaymentRecord {
    /// Computes pay for a subject's month. `days` defaults to the full month.
    pub fn compute(
        subject: SubjectId,
        period: Period,
        basic: Decimal,
        hra: Decimal,
        days: Option<u32>,
    ) -> Result<Self> {
        let days_in_month = period.days_in_month();
        let days = days.unwrap_or(days_in_month);
        if days > days_in_month {
            return Err(ScholarshipError::InvalidInput(format!(
                "{} credited days exceed the {} days of {}",
                days, days_in_month, period
            )));
        }
        let monthly = monthly_pay(basic, hra);
        Ok(Self {
            subject,
            period,
            days,
            monthly_pay: monthly,
            daily_rate: daily_rate(basic, hra, period),
            total_pay: pay_for_days(monthly, days, period),
        })
    }

    pub fn with_id(self, id: RecordId) -> PaymentRecord {
        PaymentRecord {
            id,
            subject: self.subject,
            period: self.period,
            days: self.days,
            monthly_pay: self.monthly_pay,
            daily_rate: self.daily_rate,
            total_pay: self.total_pay,
            released: false,
            status: ApprovalStatus::Pending,
        }
    }
}

/// A subject's scholarship for one month.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct PaymentRecord {
    pub id: RecordId,
    pub subject: SubjectId,
    pub period: Period,
    /// Days credited for pay.
    pub days: u32,
    /// Entitlement for the whole month; fixed at creation.
    pub monthly_pay: Money,
    /// Rounded display figure; fixed at creation.
    pub daily_rate: Money,
    pub total_pay: Money,
    pub released: bool,
    pub status: ApprovalStatus,
}

impl PaymentRecord {
    /// Removes days from the credited total and recomputes pay from the
    /// monthly entitlement.
    pub fn apply_deduction(&mut self, deducted_days: i64) -> Result<()> {
        let remaining = self.remaining_after(deducted_days)?;
        self.days = remaining;
        self.total_pay = pay_for_days(self.monthly_pay, self.days, self.period);
        Ok(())
    }

    /// Validates a deduction without applying it.
    pub fn remaining_after(&self, deducted_days: i64) -> Result<u32> {
        if deducted_days < 0 || deducted_days > i64::from(self.days) {
            return Err(ScholarshipError::InvalidDeduction {
                requested: deducted_days,
                credited: self.days,
            });
        }
        Ok(self.days - deducted_days as u32)
    }

    /// Opens the record for review on behalf of its subject.
    pub fn release(&mut self, subject: SubjectId) -> Result<()> {
        if self.subject != subject {
            return Err(ScholarshipError::NotOwner {
                record: self.id,
                subject,
            });
        }
        if self.released || self.status != ApprovalStatus::Pending {
            return Err(ScholarshipError::AlreadyReleasedOrNotPending(self.id));
        }
        self.released = true;
        Ok(())
    }

    pub fn finalize(&mut self) {
        self.status = ApprovalStatus::Approved;
    }

    pub fn is_approved(&self) -> bool {
        self.status == ApprovalStatus::Approved
    }
}
