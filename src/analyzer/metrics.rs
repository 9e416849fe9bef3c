use serde::Serialize;
use serde_json::Number;
use std::collections::HashSet;

use super::{TransactionRecord, UserEngagement, UserRecord};
use crate::error::{AnalyzerError, AnalyzerResult};

/// Average transaction value over the whole history.
pub fn transaction_volume(transactions: &[TransactionRecord]) -> AnalyzerResult<Number> {
    let values: Vec<&Number> = transactions.iter().map(|tx| &tx.value).collect();
    average("transaction_volume", &values)
}

/// Distinct user count and average transactions per user.
///
/// Distinctness is decided on the whole record, not on a wallet address
/// field: two records for the same wallet with different `transactions`
/// counts are counted twice.
pub fn user_engagement(users: &[UserRecord]) -> AnalyzerResult<UserEngagement> {
    let unique_wallets = distinct_count(users)?;
    let counts: Vec<&Number> = users.iter().map(|user| &user.transactions).collect();
    let transactions_per_user = average("transactions_per_user", &counts)?;

    Ok(UserEngagement {
        unique_wallets,
        transactions_per_user,
    })
}

/// Arithmetic mean of `values`.
///
/// When every value is an integer the mean is floor-divided and stays an
/// integer; a single fractional value switches the whole computation to
/// floating point.
pub fn average(metric: &'static str, values: &[&Number]) -> AnalyzerResult<Number> {
    if values.is_empty() {
        return Err(AnalyzerError::DivideByZero { metric });
    }

    let count = values.len();
    let integers: Option<Vec<i128>> = values.iter().map(|n| as_integer(n)).collect();

    if let Some(integers) = integers {
        let sum = integers
            .iter()
            .try_fold(0i128, |acc, v| acc.checked_add(*v))
            .ok_or(AnalyzerError::NonFiniteMetric { metric })?;
        let mean = sum.div_euclid(count as i128);
        return integer_number(mean).ok_or(AnalyzerError::NonFiniteMetric { metric });
    }

    let sum: f64 = values.iter().filter_map(|n| n.as_f64()).sum();
    let mean = sum / count as f64;
    Number::from_f64(mean).ok_or(AnalyzerError::NonFiniteMetric { metric })
}

/// Number of distinct records, compared by their full serialized form.
pub fn distinct_count<T: Serialize>(records: &[T]) -> AnalyzerResult<usize> {
    let mut seen = HashSet::with_capacity(records.len());
    for record in records {
        seen.insert(serde_json::to_string(record)?);
    }
    Ok(seen.len())
}

fn as_integer(n: &Number) -> Option<i128> {
    n.as_i64()
        .map(i128::from)
        .or_else(|| n.as_u64().map(i128::from))
}

fn integer_number(v: i128) -> Option<Number> {
    i64::try_from(v)
        .map(Number::from)
        .ok()
        .or_else(|| u64::try_from(v).map(Number::from).ok())
}
