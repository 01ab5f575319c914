use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::error::ExtractionError;

/// Lifecycle of a policy. Names match the carrier documents exactly,
/// including their spelling of `pending_cancelation`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Active,
    EndorsementPending,
    PendingCancelation,
    ClaimPending,
    ClaimRejected,
}

impl Status {
    pub const ALL: [Status; 5] = [
        Status::Active,
        Status::EndorsementPending,
        Status::PendingCancelation,
        Status::ClaimPending,
        Status::ClaimRejected,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Status::Active => "active",
            Status::EndorsementPending => "endorsement_pending",
            Status::PendingCancelation => "pending_cancelation",
            Status::ClaimPending => "claim_pending",
            Status::ClaimRejected => "claim_rejected",
        }
    }
}

impl FromStr for Status {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Status::ALL.into_iter().find(|status| status.name() == s).ok_or(())
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A coerced field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Text(String),
    Integer(i64),
    Decimal(Decimal),
    Date(NaiveDate),
    Status(Status),
}

/// The shape of value a record attribute accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Text,
    Integer,
    Decimal,
    Date,
    Status,
}

impl ValueKind {
    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Text => "text",
            ValueKind::Integer => "integer",
            ValueKind::Decimal => "decimal",
            ValueKind::Date => "date",
            ValueKind::Status => "status",
        }
    }
}

/// Turns raw extracted text into a typed [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coercion {
    /// Trimmed text, verbatim.
    Text,
    Integer,
    /// A bare decimal such as `"1200.50"`.
    Decimal,
    /// `"label value"` or `"label value%"`: the second whitespace token.
    LabeledDecimal,
    /// `M/D/YYYY` or `M-D-YYYY`, optionally prefixed with `:`.
    UsDate,
    Status,
}

impl Coercion {
    pub fn name(self) -> &'static str {
        match self {
            Coercion::Text => "text",
            Coercion::Integer => "integer",
            Coercion::Decimal => "decimal",
            Coercion::LabeledDecimal => "labeled decimal",
            Coercion::UsDate => "us date",
            Coercion::Status => "status",
        }
    }

    pub fn produces(self) -> ValueKind {
        match self {
            Coercion::Text => ValueKind::Text,
            Coercion::Integer => ValueKind::Integer,
            Coercion::Decimal | Coercion::LabeledDecimal => ValueKind::Decimal,
            Coercion::UsDate => ValueKind::Date,
            Coercion::Status => ValueKind::Status,
        }
    }

    pub fn apply(self, field: &str, raw: &str) -> Result<Value, ExtractionError> {
        let fail = || ExtractionError::TypeCoercionFailure {
            field: field.to_string(),
            raw: raw.to_string(),
            target: self.name(),
        };

        match self {
            Coercion::Text => Ok(Value::Text(raw.trim().to_string())),
            Coercion::Integer => raw
                .trim()
                .parse::<i64>()
                .map(Value::Integer)
                .map_err(|_| fail()),
            Coercion::Decimal => Decimal::from_str(raw.trim())
                .map(Value::Decimal)
                .map_err(|_| fail()),
            Coercion::LabeledDecimal => labeled_decimal(raw).map(Value::Decimal).ok_or_else(fail),
            Coercion::UsDate => us_date(raw).map(Value::Date).ok_or_else(fail),
            Coercion::Status => raw.parse::<Status>().map(Value::Status).map_err(|_| {
                ExtractionError::UnknownEnumValue {
                    field: field.to_string(),
                    raw: raw.to_string(),
                }
            }),
        }
    }
}

const DATE_SEPARATORS: [char; 2] = ['/', '-'];

/// Parts are read positionally as (month, day, year).
pub fn us_date(raw: &str) -> Option<NaiveDate> {
    let text = raw.trim();
    let text = text.strip_prefix(':').unwrap_or(text);

    let separator = DATE_SEPARATORS.into_iter().find(|sep| text.contains(*sep))?;
    let parts: Vec<&str> = text.split(separator).map(str::trim).collect();
    let [month, day, year] = parts.as_slice() else {
        return None;
    };

    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}

pub fn labeled_decimal(raw: &str) -> Option<Decimal> {
    let text = raw.strip_suffix('%').unwrap_or(raw);
    let token = text.split_whitespace().nth(1)?;
    Decimal::from_str(token).ok()
}
