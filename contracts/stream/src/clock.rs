use soroban_sdk::Env;

/// Source of the current instant, in seconds since the Unix epoch.
pub trait Clock {
    fn now(&self) -> u64;
}

/// Reads the close time of the ledger the invocation runs in.
pub struct LedgerClock<'a> {
    env: &'a Env,
}

impl<'a> LedgerClock<'a> {
    pub fn new(env: &'a Env) -> Self {
        Self { env }
    }
}

impl Clock for LedgerClock<'_> {
    fn now(&self) -> u64 {
        self.env.ledger().timestamp()
    }
}

/// Clock pinned to a single instant.
#[cfg(test)]
pub struct FixedClock(pub u64);

#[cfg(test)]
impl Clock for FixedClock {
    fn now(&self) -> u64 {
        self.0
    }
}
