#![no_std]

mod accrual;
mod clock;
mod ledger;
mod settlement;
mod storage;

use soroban_sdk::{contract, contractimpl, contracttype, log, symbol_short, Address, Env, Vec};

use crate::clock::{Clock, LedgerClock};
use crate::settlement::{Settlement, TokenSettlement};

// ---------------------------------------------------------------------------
// Data types
// ---------------------------------------------------------------------------

/// Global configuration of the ledger.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Config {
    /// Token escrowed by every stream and used for all settlements.
    pub token: Address,
}

/// Lifecycle of a stream. Transitions only move forward:
/// `Active` to `Cancelled` or `Paid`, `Cancelled` to `Paid`.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StreamStatus {
    Active = 0,
    Cancelled = 1,
    Paid = 2,
}

#[soroban_sdk::contracterror]
#[derive(Clone, Copy, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum ContractError {
    StreamNotFound = 1,
    InvalidStreamParameters = 2,
    Unauthorized = 3,
    NotActive = 4,
    NothingToClaim = 5,
    SettlementFailed = 6,
    AlreadyInitialised = 7,
    NotInitialised = 8,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum StreamEvent {
    Cancelled(u64),
    Paid(u64),
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Stream {
    pub stream_id: u64,
    pub sender: Address,
    pub recipient: Address,
    pub total_amount: i128,
    pub rate_per_second: i128,
    pub start_time: u64,
    pub end_time: u64,
    pub cancelled_at: Option<u64>,
    pub claimed_amount: i128,
    pub status: StreamStatus,
    pub created_at: u64,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct CreateStreamParams {
    pub recipient: Address,
    pub total_amount: i128,
    pub start_time: u64,
    pub end_time: u64,
}

/// Outcome of one `reconcile` page.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReconcilePage {
    /// Streams moved to `Paid` by this call.
    pub matured: u32,
    /// `from_id` for the next call. Equals the stream count once the sweep
    /// has covered every stream.
    pub next_id: u64,
}

// ---------------------------------------------------------------------------
// Internal Helpers
// ---------------------------------------------------------------------------

impl StreamLedger {
    fn persist_new_stream(
        env: &Env,
        sender: Address,
        recipient: Address,
        total_amount: i128,
        start_time: u64,
        end_time: u64,
    ) -> u64 {
        let stream_id = storage::next_stream_id(env);
        let stream = ledger::open(
            stream_id,
            sender,
            recipient,
            total_amount,
            start_time,
            end_time,
            &LedgerClock::new(env),
        );

        storage::save_stream(env, &stream);

        env.events()
            .publish((symbol_short!("created"), stream_id), total_amount);

        stream_id
    }

    /// `caller` must be `party` and must have signed the invocation.
    fn require_party(caller: &Address, party: &Address) -> Result<(), ContractError> {
        if caller != party {
            return Err(ContractError::Unauthorized);
        }
        caller.require_auth();
        Ok(())
    }

    fn publish_paid(env: &Env, stream: &Stream) {
        if stream.status == StreamStatus::Paid {
            env.events().publish(
                (symbol_short!("paid"), stream.stream_id),
                StreamEvent::Paid(stream.stream_id),
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Contract Implementation
// ---------------------------------------------------------------------------

#[contract]
pub struct StreamLedger;

#[contractimpl]
impl StreamLedger {
    /// Initialise the ledger with the token every stream is denominated in.
    ///
    /// Must be called exactly once before any other operation. Stores
    /// `Config { token }` and resets the stream id counter to 0.
    ///
    /// # Errors
    /// - `AlreadyInitialised` if called a second time
    pub fn init(env: Env, token: Address) -> Result<(), ContractError> {
        if storage::has_config(&env) {
            return Err(ContractError::AlreadyInitialised);
        }
        storage::set_config(&env, &Config { token });
        storage::set_stream_count(&env, 0);

        // Ensure instance storage (Config/ID) doesn't expire quickly
        storage::extend_instance_ttl(&env);
        Ok(())
    }

    /// Create a stream paying `total_amount` from `sender` to `recipient`
    /// linearly over `[start_time, end_time)`.
    ///
    /// The principal is escrowed in the contract before the stream exists; if
    /// the transfer fails no id is allocated and nothing is stored. The rate
    /// is derived as `total_amount / (end_time - start_time)`.
    ///
    /// # Authorization
    /// - Requires authorization from `sender`
    ///
    /// # Errors
    /// - `InvalidStreamParameters` if `total_amount <= 0`, `end_time <= start_time`
    ///   or `sender == recipient`
    /// - `SettlementFailed` if the escrow transfer fails
    /// - `NotInitialised` before `init`
    ///
    /// # Events
    /// - `created(stream_id)` with `total_amount`
    pub fn create_stream(
        env: Env,
        sender: Address,
        recipient: Address,
        total_amount: i128,
        start_time: u64,
        end_time: u64,
    ) -> Result<u64, ContractError> {
        sender.require_auth();

        ledger::validate_stream_params(&sender, &recipient, total_amount, start_time, end_time)?;

        TokenSettlement::new(&env)?.settle(
            &sender,
            &env.current_contract_address(),
            total_amount,
        )?;

        Ok(Self::persist_new_stream(
            &env,
            sender,
            recipient,
            total_amount,
            start_time,
            end_time,
        ))
    }

    /// Create several streams funded by one sender in a single transaction.
    ///
    /// Every entry is validated before anything moves, then the summed
    /// principal is escrowed with one transfer. Either all streams are created
    /// or none is. Ids are returned in input order.
    ///
    /// # Errors
    /// - `InvalidStreamParameters` if any entry is invalid or the sum overflows
    /// - `SettlementFailed` if the escrow transfer fails
    pub fn create_streams(
        env: Env,
        sender: Address,
        streams: Vec<CreateStreamParams>,
    ) -> Result<Vec<u64>, ContractError> {
        sender.require_auth();

        let mut total_escrow: i128 = 0;
        for params in streams.iter() {
            ledger::validate_stream_params(
                &sender,
                &params.recipient,
                params.total_amount,
                params.start_time,
                params.end_time,
            )?;
            total_escrow = total_escrow
                .checked_add(params.total_amount)
                .ok_or(ContractError::InvalidStreamParameters)?;
        }

        TokenSettlement::new(&env)?.settle(
            &sender,
            &env.current_contract_address(),
            total_escrow,
        )?;

        let mut created_ids = Vec::new(&env);
        for params in streams.iter() {
            let stream_id = Self::persist_new_stream(
                &env,
                sender.clone(),
                params.recipient,
                params.total_amount,
                params.start_time,
                params.end_time,
            );
            created_ids.push_back(stream_id);
        }

        Ok(created_ids)
    }

    /// Pay the recipient everything accrued and not yet claimed.
    ///
    /// Works on `Active` and `Cancelled` streams. After a cancel, accrual is
    /// frozen at `cancelled_at`, so only the balance accrued before the cancel
    /// can be claimed. The stream becomes `Paid` once the claimed total
    /// reaches what the stream will ever accrue.
    ///
    /// # Returns
    /// - The amount transferred to the recipient
    ///
    /// # Authorization
    /// - `caller` must be the stream's recipient and must authorize the call
    ///
    /// # Errors
    /// - `StreamNotFound` for an unknown id
    /// - `Unauthorized` if `caller` is not the recipient
    /// - `NothingToClaim` if nothing is claimable (including `Paid` streams)
    /// - `SettlementFailed` if the payout transfer fails; the stream is unchanged
    ///
    /// # Events
    /// - `claimed(stream_id)` with the amount
    /// - `paid(stream_id)` when the claim settles the stream
    ///
    /// # Examples
    /// - 100 tokens over 100 seconds, claim at t=50 → 50, still `Active`
    /// - Claim again at t=60 → 10
    /// - Claim at t=100 → 40, `Paid`
    pub fn claim(env: Env, stream_id: u64, caller: Address) -> Result<i128, ContractError> {
        let mut stream = storage::load_stream(&env, stream_id)?;
        Self::require_party(&caller, &stream.recipient)?;

        let amount = ledger::claim(&mut stream, &LedgerClock::new(&env))?;

        TokenSettlement::new(&env)?.settle(
            &env.current_contract_address(),
            &stream.recipient,
            amount,
        )?;
        storage::save_stream(&env, &stream);

        env.events()
            .publish((symbol_short!("claimed"), stream_id), amount);
        Self::publish_paid(&env, &stream);
        Ok(amount)
    }

    /// Cancel an active stream and refund the unaccrued principal to the sender.
    ///
    /// Accrual stops at the current ledger time. The recipient keeps the right
    /// to claim whatever accrued before the cancel. If everything accrued has
    /// already been claimed the stream goes straight to `Paid`, otherwise it
    /// becomes `Cancelled`.
    ///
    /// # Returns
    /// - The amount refunded to the sender: `total_amount - accrued`
    ///
    /// # Authorization
    /// - `caller` must be the stream's sender and must authorize the call
    ///
    /// # Errors
    /// - `StreamNotFound` for an unknown id
    /// - `Unauthorized` if `caller` is not the sender
    /// - `NotActive` if the stream is `Cancelled` or `Paid`
    /// - `SettlementFailed` if the refund transfer fails; the stream is unchanged
    ///
    /// # Events
    /// - `refunded(stream_id)` with the refund, when non-zero
    /// - `cancelled(stream_id)`, or `paid(stream_id)` when nothing is left to claim
    ///
    /// # Examples
    /// - 100 tokens over 100 seconds, cancel at t=30 → refund 70, recipient can claim 30
    /// - Cancel before start → refund 100, stream `Paid`
    /// - Cancel after end → refund 0, recipient can claim the rest
    pub fn cancel_stream(env: Env, stream_id: u64, caller: Address) -> Result<i128, ContractError> {
        let mut stream = storage::load_stream(&env, stream_id)?;
        Self::require_party(&caller, &stream.sender)?;

        let refund = ledger::cancel(&mut stream, &LedgerClock::new(&env))?;

        TokenSettlement::new(&env)?.settle(
            &env.current_contract_address(),
            &stream.sender,
            refund,
        )?;
        storage::save_stream(&env, &stream);

        if refund > 0 {
            env.events()
                .publish((symbol_short!("refunded"), stream_id), refund);
        }
        if stream.status == StreamStatus::Cancelled {
            env.events().publish(
                (symbol_short!("cancelled"), stream_id),
                StreamEvent::Cancelled(stream_id),
            );
        }
        Self::publish_paid(&env, &stream);
        Ok(refund)
    }

    /// Settle the `Active` streams with ids in `[from_id, from_id + limit)`
    /// whose `end_time` has passed.
    ///
    /// Each matured stream pays its unclaimed balance to the recipient and
    /// becomes `Paid`. A stream whose payout fails stays `Active` and is picked
    /// up by the next sweep. A call reads at most `MAX_RECONCILE_PAGE` streams
    /// (larger limits are clamped), so a full sweep pages through the ids by
    /// feeding `next_id` back in until it equals the stream count. Anyone may
    /// call this; a keeper is expected to do so on a fixed interval. Calling
    /// it again at the same time is a no-op.
    ///
    /// # Returns
    /// - `ReconcilePage` with the number of streams moved to `Paid` and the
    ///   id to resume from
    ///
    /// # Events
    /// - `claimed(stream_id)` with the payout, when non-zero
    /// - `paid(stream_id)` per settled stream
    pub fn reconcile(env: Env, from_id: u64, limit: u32) -> Result<ReconcilePage, ContractError> {
        let clock = LedgerClock::new(&env);
        let settlement = TokenSettlement::new(&env)?;
        let contract = env.current_contract_address();

        let limit = limit.min(storage::MAX_RECONCILE_PAGE);
        let (streams, next_id) = storage::load_range(&env, from_id, limit);

        let mut matured = Vec::new(&env);
        for mut stream in streams.iter() {
            let Some(payout) = ledger::mature(&mut stream, &clock) else {
                continue;
            };
            if settlement
                .settle(&contract, &stream.recipient, payout)
                .is_err()
            {
                log!(&env, "payout failed, stream left active", stream.stream_id);
                continue;
            }
            if payout > 0 {
                env.events()
                    .publish((symbol_short!("claimed"), stream.stream_id), payout);
            }
            matured.push_back(stream);
        }

        storage::save_all(&env, &matured);
        for stream in matured.iter() {
            Self::publish_paid(&env, &stream);
        }
        Ok(ReconcilePage {
            matured: matured.len(),
            next_id,
        })
    }

    /// Total accrued to the recipient at the current ledger time.
    ///
    /// Frozen at `cancelled_at` for cancelled streams, capped at
    /// `total_amount` after `end_time`.
    pub fn calculate_accrued(env: Env, stream_id: u64) -> Result<i128, ContractError> {
        let stream = storage::load_stream(&env, stream_id)?;
        Ok(accrual::accrued(&stream, LedgerClock::new(&env).now()))
    }

    /// Amount `claim` would pay out at the current ledger time.
    pub fn get_claimable(env: Env, stream_id: u64) -> Result<i128, ContractError> {
        let stream = storage::load_stream(&env, stream_id)?;
        if stream.status == StreamStatus::Paid {
            return Ok(0);
        }
        Ok(accrual::claimable(&stream, LedgerClock::new(&env).now()))
    }

    /// Amount `cancel_stream` would refund at the current ledger time.
    /// Zero once the stream is no longer `Active`.
    pub fn get_refundable(env: Env, stream_id: u64) -> Result<i128, ContractError> {
        let stream = storage::load_stream(&env, stream_id)?;
        if stream.status != StreamStatus::Active {
            return Ok(0);
        }
        Ok(accrual::refundable(&stream, LedgerClock::new(&env).now()))
    }

    pub fn get_config(env: Env) -> Result<Config, ContractError> {
        storage::get_config(&env)
    }

    /// Retrieve the stored state of a stream.
    pub fn get_stream_state(env: Env, stream_id: u64) -> Result<Stream, ContractError> {
        storage::load_stream(&env, stream_id)
    }

    /// Number of streams created so far; ids run from 0 to this value, exclusive.
    pub fn get_stream_count(env: Env) -> u64 {
        storage::get_stream_count(&env)
    }
}
