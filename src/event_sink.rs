use super::*;

/// Downstream notifications fired by the registry. `new_block` is invoked
/// once per chain tip, strictly before the `new_template` for the template
/// that opened it, so share accounting observes the block boundary before
/// any share lands on it.
pub trait EventSink: Send + Sync + 'static {
    fn new_block(&self, prevhash: &str, height: u64);

    fn new_template(&self, clean_jobs: bool);
}

/// For embedders that do not care.
pub struct NullSink;

impl EventSink for NullSink {
    fn new_block(&self, _prevhash: &str, _height: u64) {}

    fn new_template(&self, _clean_jobs: bool) {}
}
