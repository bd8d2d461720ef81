use super::*;

/// Clock seam for coinbase timestamps and refresh stall detection.
pub trait Timestamper: Send + Sync + 'static {
    /// Unix seconds.
    fn now(&self) -> u64;
}

pub struct SystemTimestamper;

impl Timestamper for SystemTimestamper {
    fn now(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }
}
