//! Linear accrual math.
//!
//! Every function here is pure: the result depends only on the stored stream
//! fields and the instant passed in. Amounts are token base units, so the
//! "fully accrued" comparisons made by the ledger are exact.

use crate::Stream;

/// Per-second rate of a schedule, floored. Zero-length schedules count as one second.
pub fn rate_per_second(total_amount: i128, start_time: u64, end_time: u64) -> i128 {
    let duration = end_time.saturating_sub(start_time).max(1);
    total_amount / duration as i128
}

/// Amount released after `elapsed` seconds of a `duration`-second schedule.
///
/// Splits `total = rate * duration + remainder`: `rate * elapsed` is exact and
/// the remainder is released pro rata, so the result is `total * elapsed /
/// duration` rounded down without ever forming that product. Reaches `total`
/// exactly when `elapsed == duration`.
pub fn linear_amount(total_amount: i128, duration: u64, elapsed: u64) -> i128 {
    if total_amount <= 0 {
        return 0;
    }
    let duration = duration.max(1);
    let elapsed = elapsed.min(duration);

    let rate = total_amount / duration as i128;
    let remainder = (total_amount % duration as i128) as u128;
    let spread = remainder * elapsed as u128 / duration as u128;

    rate * elapsed as i128 + spread as i128
}

/// Accrued amount of a schedule at `now`, with accrual stopped at `accrual_stop`.
///
/// Returns 0 up to and including `start_time` and never more than `total_amount`.
pub fn calculate_accrued_amount(
    start_time: u64,
    end_time: u64,
    total_amount: i128,
    accrual_stop: u64,
    now: u64,
) -> i128 {
    if now <= start_time {
        return 0;
    }

    let until = now.min(accrual_stop);
    if until <= start_time {
        return 0;
    }

    let duration = end_time.saturating_sub(start_time);
    linear_amount(total_amount, duration, until - start_time).min(total_amount)
}

/// `end_time`, or `cancelled_at` when the stream was cancelled earlier.
pub fn effective_end(stream: &Stream) -> u64 {
    match stream.cancelled_at {
        Some(cancelled_at) => cancelled_at.min(stream.end_time),
        None => stream.end_time,
    }
}

pub fn accrued(stream: &Stream, now: u64) -> i128 {
    calculate_accrued_amount(
        stream.start_time,
        stream.end_time,
        stream.total_amount,
        effective_end(stream),
        now,
    )
}

/// Accrued amount once accrual has stopped: the principal for a running
/// stream, the frozen balance for a cancelled one.
pub fn final_accrued(stream: &Stream) -> i128 {
    accrued(stream, effective_end(stream))
}

pub fn claimable(stream: &Stream, now: u64) -> i128 {
    (accrued(stream, now) - stream.claimed_amount).max(0)
}

/// Portion of the principal that has not accrued by `now`.
pub fn refundable(stream: &Stream, now: u64) -> i128 {
    stream.total_amount - accrued(stream, now)
}
