//! Stream state machine.
//!
//! ```text
//! Active ──► Cancelled ──► Paid
//!    └────────────────────►┘
//! ```
//!
//! Transitions work on an owned `Stream` value and never touch storage or
//! move funds. The contract settles the amount a transition returns and
//! persists the stream only once settlement succeeded.

use soroban_sdk::Address;

use crate::{accrual, clock::Clock, ContractError, Stream, StreamStatus};

pub fn validate_stream_params(
    sender: &Address,
    recipient: &Address,
    total_amount: i128,
    start_time: u64,
    end_time: u64,
) -> Result<(), ContractError> {
    if total_amount <= 0 || end_time <= start_time || sender == recipient {
        return Err(ContractError::InvalidStreamParameters);
    }
    Ok(())
}

/// Builds a fresh `Active` stream. Parameters must already be validated.
pub fn open(
    stream_id: u64,
    sender: Address,
    recipient: Address,
    total_amount: i128,
    start_time: u64,
    end_time: u64,
    clock: &impl Clock,
) -> Stream {
    Stream {
        stream_id,
        sender,
        recipient,
        total_amount,
        rate_per_second: accrual::rate_per_second(total_amount, start_time, end_time),
        start_time,
        end_time,
        cancelled_at: None,
        claimed_amount: 0,
        status: StreamStatus::Active,
        created_at: clock.now(),
    }
}

/// Books everything claimable at `clock.now()` and returns that amount.
///
/// The stream becomes `Paid` once the claimed total reaches the amount that
/// will ever accrue: the principal, or the frozen balance after a cancel.
pub fn claim(stream: &mut Stream, clock: &impl Clock) -> Result<i128, ContractError> {
    if stream.status == StreamStatus::Paid {
        return Err(ContractError::NothingToClaim);
    }

    let claimable = accrual::claimable(stream, clock.now());
    if claimable <= 0 {
        return Err(ContractError::NothingToClaim);
    }

    stream.claimed_amount += claimable;
    if stream.claimed_amount >= accrual::final_accrued(stream) {
        stream.status = StreamStatus::Paid;
    }
    Ok(claimable)
}

/// Freezes accrual at `clock.now()` and returns the unaccrued principal owed
/// back to the sender. `claimed_amount` is left alone so the recipient can
/// still claim what accrued before the cancel.
pub fn cancel(stream: &mut Stream, clock: &impl Clock) -> Result<i128, ContractError> {
    if stream.status != StreamStatus::Active {
        return Err(ContractError::NotActive);
    }

    let now = clock.now();
    let accrued = accrual::accrued(stream, now);

    stream.cancelled_at = Some(now.max(stream.start_time));
    stream.status = if stream.claimed_amount >= accrued {
        StreamStatus::Paid
    } else {
        StreamStatus::Cancelled
    };

    Ok(stream.total_amount - accrued)
}

/// Settles an `Active` stream whose schedule has run out.
///
/// Returns the unclaimed balance to pay out to the recipient, or `None` when
/// the stream is not due yet.
pub fn mature(stream: &mut Stream, clock: &impl Clock) -> Option<i128> {
    if stream.status != StreamStatus::Active || clock.now() < stream.end_time {
        return None;
    }

    let payout = stream.total_amount - stream.claimed_amount;
    stream.claimed_amount = stream.total_amount;
    stream.status = StreamStatus::Paid;
    Some(payout)
}
