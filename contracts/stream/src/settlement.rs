use soroban_sdk::{token, Address, Env};

use crate::{storage, ContractError};

/// Moves funds between two parties.
///
/// A ledger transition is only persisted after `settle` returns `Ok`, so an
/// implementation must either complete the transfer or report failure.
pub trait Settlement {
    fn settle(&self, from: &Address, to: &Address, amount: i128) -> Result<(), ContractError>;
}

/// Settles through the token contract configured at `init`.
pub struct TokenSettlement<'a> {
    client: token::Client<'a>,
}

impl<'a> TokenSettlement<'a> {
    pub fn new(env: &'a Env) -> Result<Self, ContractError> {
        let config = storage::get_config(env)?;
        Ok(Self {
            client: token::Client::new(env, &config.token),
        })
    }
}

impl Settlement for TokenSettlement<'_> {
    fn settle(&self, from: &Address, to: &Address, amount: i128) -> Result<(), ContractError> {
        if amount <= 0 {
            return Ok(());
        }

        // Insufficient balance or a rejected authorization surfaces here
        // instead of aborting the whole invocation.
        match self.client.try_transfer(from, to, &amount) {
            Ok(Ok(())) => Ok(()),
            _ => Err(ContractError::SettlementFailed),
        }
    }
}
