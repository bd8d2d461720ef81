use super::*;

/// Pool options the registry recognizes. Construction gives defaults;
/// `validate` runs at registry creation so a broken configuration fails
/// before the first template, not at the first submit.
#[derive(Clone, Debug)]
pub struct Settings {
    instance_id: u8,
    reject_stale_shares: bool,
    ntime_age: u64,
    vdiff_float: bool,
    pool_target: f64,
    pool_address: Address,
    pool_signature: String,
}

impl Settings {
    pub fn new(pool_address: Address) -> Self {
        Self {
            instance_id: 0,
            reject_stale_shares: true,
            ntime_age: 7200,
            vdiff_float: false,
            pool_target: 100_000.0,
            pool_address,
            pool_signature: "|riptide|".into(),
        }
    }

    pub fn with_instance_id(mut self, instance_id: u8) -> Self {
        self.instance_id = instance_id;
        self
    }

    pub fn with_reject_stale_shares(mut self, reject_stale_shares: bool) -> Self {
        self.reject_stale_shares = reject_stale_shares;
        self
    }

    pub fn with_ntime_age(mut self, ntime_age: u64) -> Self {
        self.ntime_age = ntime_age;
        self
    }

    pub fn with_vdiff_float(mut self, vdiff_float: bool) -> Self {
        self.vdiff_float = vdiff_float;
        self
    }

    pub fn with_pool_target(mut self, pool_target: f64) -> Self {
        self.pool_target = pool_target;
        self
    }

    pub fn with_pool_signature(mut self, pool_signature: String) -> Self {
        self.pool_signature = pool_signature;
        self
    }

    pub fn validate(&self) -> Result {
        ensure!(
            self.ntime_age > 0,
            "ntime_age must be configured and non-zero"
        );
        ensure!(
            self.pool_target.is_finite() && self.pool_target > 0.0,
            "pool_target must be finite and > 0"
        );
        Ok(())
    }

    pub fn instance_id(&self) -> u8 {
        self.instance_id
    }

    pub fn reject_stale_shares(&self) -> bool {
        self.reject_stale_shares
    }

    pub fn ntime_age(&self) -> u64 {
        self.ntime_age
    }

    pub fn vdiff_float(&self) -> bool {
        self.vdiff_float
    }

    pub fn pool_target(&self) -> f64 {
        self.pool_target
    }

    pub fn pool_address(&self) -> &Address {
        &self.pool_address
    }

    pub fn pool_signature(&self) -> &str {
        &self.pool_signature
    }
}
