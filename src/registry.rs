use super::*;

use snafu::Snafu;

#[derive(Debug, Snafu, PartialEq)]
pub enum RegistryError {
    #[snafu(display("no block template received from upstream yet"))]
    NoTemplateYet,
}

/// Short rolling job ids. Collisions are tolerable because every new block
/// goes out with `clean_jobs`, which invalidates all outstanding ids on the
/// worker side, so the counter just rolls over before 0xffff and never
/// emits zero.
#[derive(Debug)]
struct JobIdGenerator {
    counter: u64,
}

impl JobIdGenerator {
    fn new() -> Self {
        Self { counter: 0 }
    }

    fn next(&mut self) -> JobId {
        self.counter += 1;
        if self.counter % 0xffff == 0 {
            self.counter = 1;
        }
        JobId::new(self.counter)
    }
}

#[derive(Debug)]
enum RefreshState {
    Idle,
    Refreshing {
        seq: u64,
        started_at: u64,
        cancel: CancellationToken,
    },
}

struct Inner {
    prevhashes: HashMap<BlockHash, Vec<Arc<BlockTemplate>>>,
    jobs: HashMap<JobId, Weak<BlockTemplate>>,
    last_template: Option<Arc<BlockTemplate>>,
    extranonce_counter: ExtranonceCounter,
    job_ids: JobIdGenerator,
    refresh: RefreshState,
    refresh_seq: u64,
}

/// The pool's truth-holder. Tracks the mineable templates per chain tip,
/// hands out extranonce space and job ids, validates every submitted share
/// and escalates block candidates upstream.
///
/// All registry state sits behind one coarse lock which is never held across
/// an await; the only suspension points are the two upstream calls.
pub struct TemplateRegistry {
    settings: Arc<Settings>,
    upstream: Arc<dyn UpstreamRpc>,
    hasher: Arc<dyn ChainHasher>,
    events: Arc<dyn EventSink>,
    timestamper: Arc<dyn Timestamper>,
    extranonce2_size: usize,
    inner: Mutex<Inner>,
}

impl TemplateRegistry {
    pub fn new(
        settings: Arc<Settings>,
        upstream: Arc<dyn UpstreamRpc>,
        hasher: Arc<dyn ChainHasher>,
        events: Arc<dyn EventSink>,
        timestamper: Arc<dyn Timestamper>,
    ) -> Result<Self> {
        settings.validate()?;

        let extranonce_counter = ExtranonceCounter::new(settings.instance_id());

        let extranonce2_size = EXTRANONCE_TOTAL_SIZE
            .checked_sub(extranonce_counter.size())
            .filter(|size| *size > 0)
            .context("extranonce1 leaves no room for extranonce2")?;

        Ok(Self {
            settings,
            upstream,
            hasher,
            events,
            timestamper,
            extranonce2_size,
            inner: Mutex::new(Inner {
                prevhashes: HashMap::new(),
                jobs: HashMap::new(),
                last_template: None,
                extranonce_counter,
                job_ids: JobIdGenerator::new(),
                refresh: RefreshState::Idle,
                refresh_seq: 0,
            }),
        })
    }

    /// Unique extranonce1 for a newly subscribed connection.
    pub fn new_extranonce1(&self) -> Result<Extranonce> {
        debug!("Generating unique extranonce1");
        self.inner.lock().extranonce_counter.next()
    }

    pub fn extranonce2_size(&self) -> usize {
        self.extranonce2_size
    }

    /// Arguments for `mining.notify` from the last known template.
    pub fn last_broadcast_args(&self) -> Result<Notify, RegistryError> {
        self.inner
            .lock()
            .last_template
            .as_ref()
            .map(|template| template.broadcast_args())
            .ok_or(RegistryError::NoTemplateYet)
    }

    /// Files a new template and drops every template of obsolete tips, so
    /// exactly one previous-block hash is live at any time. Fires the
    /// new-block sink (for a fresh tip) strictly before the new-template
    /// sink.
    pub fn add_template(&self, template: Arc<BlockTemplate>, height: u64) {
        let prevhash = template.prev_blockhash();

        let new_block = {
            let mut inner = self.inner.lock();

            let new_block = !inner.prevhashes.contains_key(&prevhash);

            // Templates sorted by prevhash, so obsolete ones are easy to
            // drop when the chain tip moves.
            inner
                .prevhashes
                .entry(prevhash)
                .or_default()
                .push(template.clone());

            // Weak reference for fast lookup by job id; liveness stays with
            // the prevhash bucket.
            inner.jobs.insert(template.job_id(), Arc::downgrade(&template));

            inner.last_template = Some(template.clone());

            inner.prevhashes.retain(|hash, _| *hash == prevhash);
            inner.jobs.retain(|_, job| {
                job.upgrade()
                    .is_some_and(|template| template.prev_blockhash() == prevhash)
            });

            new_block
        };

        info!("New template {} for {}", template.job_id(), template.prevhash_hex());

        if new_block {
            // Tell the system about the new block before any share for it
            // can be accounted.
            self.events.new_block(&template.prevhash_hex(), height);
        }

        self.events.new_template(new_block);
    }

    /// Requests a template refresh from the upstream daemon. Returns the
    /// handle of the spawned fetch, or `None` when a refresh is already in
    /// flight and was left to finish.
    pub fn update_block(self: &Arc<Self>, force: bool) -> Option<JoinHandle<()>> {
        info!("A block update has been requested");

        let (seq, cancel) = {
            let mut inner = self.inner.lock();

            if let RefreshState::Refreshing { started_at, cancel, .. } = &inner.refresh {
                if force {
                    warn!("Forcing block update, cancelling in-flight request");
                    cancel.cancel();
                    inner.refresh = RefreshState::Idle;
                } else {
                    let running = self.timestamper.now().saturating_sub(*started_at);
                    warn!("Block update already in progress, running for {running}s");

                    if running >= REFRESH_STALL_SECS {
                        error!(
                            "Block update appears to be hung after {running}s, cancelling"
                        );
                        cancel.cancel();
                        inner.refresh = RefreshState::Idle;
                    }

                    return None;
                }
            }

            inner.refresh_seq += 1;
            let seq = inner.refresh_seq;
            let cancel = CancellationToken::new();

            inner.refresh = RefreshState::Refreshing {
                seq,
                started_at: self.timestamper.now(),
                cancel: cancel.clone(),
            };

            (seq, cancel)
        };

        debug!("Block update started");

        let registry = self.clone();
        Some(tokio::spawn(async move {
            registry.run_refresh(seq, cancel).await;
        }))
    }

    async fn run_refresh(self: Arc<Self>, seq: u64, cancel: CancellationToken) {
        let started = self.timestamper.now();

        let result = tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                debug!("Block update cancelled");
                return;
            }
            result = self.upstream.get_block_template() => result,
        };

        if cancel.is_cancelled() {
            debug!("Block update cancelled");
            return;
        }

        match result {
            Ok(data) => {
                debug!("Block template data received, creating new template");

                let job_id = self.inner.lock().job_ids.next();

                match BlockTemplate::from_rpc(job_id, &data, &self.settings, self.timestamper.now())
                {
                    Ok(template) => {
                        let template = Arc::new(template);
                        let tx_count = template.transactions().len() + 1;

                        self.add_template(template, data.height);

                        info!(
                            "Block update finished, {}s, {tx_count} txes",
                            self.timestamper.now().saturating_sub(started)
                        );
                    }
                    Err(err) => error!("Could not build block template: {err:#}"),
                }
            }
            Err(err) => error!("Could not load block template: {err:#}"),
        }

        let mut inner = self.inner.lock();
        let ours = matches!(&inner.refresh, RefreshState::Refreshing { seq: current, .. } if *current == seq);
        if ours {
            inner.refresh = RefreshState::Idle;
        }
    }

    /// Resolves a job id to its template, defensively: the weak
    /// back-reference may linger briefly after its bucket was dropped, so
    /// membership in the live bucket is what decides.
    pub fn get_job(
        &self,
        job_id: JobId,
        worker: &str,
        ip: Option<IpAddr>,
    ) -> Option<Arc<BlockTemplate>> {
        let inner = self.inner.lock();

        let Some(template) = inner.jobs.get(&job_id).and_then(Weak::upgrade) else {
            info!("Job id '{job_id}' not found, worker '{worker}'");
            if let Some(ip) = ip {
                debug!("Worker submitted invalid job id from {ip}");
            }
            return None;
        };

        let Some(bucket) = inner.prevhashes.get(&template.prev_blockhash()) else {
            debug!("Prevhash of job '{job_id}' is unknown");
            return None;
        };

        if !bucket.iter().any(|live| Arc::ptr_eq(live, &template)) {
            debug!("Job '{job_id}' is unknown");
            return None;
        }

        Some(template)
    }

    /// Checks a submitted share and, when it meets the network target,
    /// finalizes the template and submits the block upstream.
    ///
    /// The check order is fixed: it defines the rejection priority workers
    /// observe and keeps the cheap structural checks ahead of the hashing.
    #[allow(clippy::too_many_arguments)]
    pub async fn submit_share(
        self: &Arc<Self>,
        job_id: &str,
        worker: &str,
        enonce1: &Extranonce,
        enonce2: &str,
        ntime: &str,
        nonce: &str,
        difficulty: f64,
        ip: Option<IpAddr>,
    ) -> Result<ShareOutcome, SubmitError> {
        if difficulty <= 0.0 {
            warn!("Worker {worker} ({ip:?}) submitted a share at difficulty {difficulty}, suspecting fake shares");
            return Err(SubmitError::FraudSuspected {
                worker: worker.into(),
                difficulty,
            });
        }

        if enonce2.len() != self.extranonce2_size * 2 {
            return Err(SubmitError::MalformedExtranonce {
                reason: format!(
                    "expected {} hex chars, got {}",
                    self.extranonce2_size * 2,
                    enonce2.len()
                ),
            });
        }

        let job = job_id
            .parse::<JobId>()
            .ok()
            .and_then(|id| self.get_job(id, worker, ip));

        let Some(template) = job else {
            if self.settings.reject_stale_shares() {
                return Err(SubmitError::StaleJob {
                    job_id: job_id.into(),
                });
            }

            info!("Accepted stale share from {worker}, ({enonce1} {enonce2} {ntime} {nonce})");
            return Ok(ShareOutcome::stale());
        };

        let ntime = ntime
            .parse::<Ntime>()
            .map_err(|_| SubmitError::MalformedNtime { ntime: ntime.into() })?;

        if !template.check_ntime(ntime, self.settings.ntime_age()) {
            return Err(SubmitError::NtimeOutOfRange {
                ntime: ntime.into(),
                curtime: template.curtime().into(),
            });
        }

        let nonce = nonce
            .parse::<Nonce>()
            .map_err(|_| SubmitError::MalformedNonce { nonce: nonce.into() })?;

        let enonce2 = Extranonce::from_hex(enonce2)
            .map_err(|err| SubmitError::MalformedExtranonce {
                reason: err.to_string(),
            })?;

        if !template.register_submit(enonce1, &enonce2, ntime, nonce) {
            info!("Duplicate share from {worker}, ({enonce1} {enonce2} {ntime} {nonce})");
            return Err(SubmitError::DuplicateShare);
        }

        // Now the hard work: rebuild the coinbase, fold the merkle root and
        // hash the candidate header.
        let coinbase = template
            .serialize_coinbase(enonce1, &enonce2)
            .map_err(|err| SubmitError::InternalInconsistency {
                message: err.to_string(),
            })?;
        let coinbase_hash = self.hasher.hash_coinbase(&coinbase);

        let merkle_root = merkle_root_with_first(coinbase_hash, template.merkle_branches());

        let header = template.serialize_header(merkle_root, ntime, nonce);
        let digest = self.hasher.hash_header(&header, ntime, nonce);

        let worker_target = diff_to_target(difficulty);
        if digest.int > worker_target {
            debug!(
                "Hash above worker target: difficulty={difficulty}, hash={}",
                digest.hex
            );
            return Err(SubmitError::LowDifficulty { hash: digest.hex });
        }

        if digest.int <= diff_to_target(self.settings.pool_target()) {
            info!(
                "Yay, share from {worker} proves at least difficulty {}",
                self.settings.pool_target()
            );
        }

        let share_diff = share_difficulty(digest.int, self.settings.vdiff_float());
        debug!("share_diff: {share_diff}");

        let submit = if digest.int <= template.target() {
            info!(
                "We found a block candidate for {}: {} | {}",
                template.height(),
                digest.hex,
                digest.check_hex
            );

            if let Err(err) = template.finalize(merkle_root, enonce1, &enonce2, ntime, nonce) {
                error!("Failed to finalize block candidate: {err:#}");
            }

            if !template.is_valid(difficulty) {
                // Should not happen; submit anyway and let the network judge.
                error!("Final validation failed for template {}", template.job_id());
            }

            Some(self.escalate(&template, &digest).await)
        } else {
            None
        };

        Ok(ShareOutcome {
            header_hex: Some(digest.header_hex),
            solution_hex: Some(digest.solution_hex),
            share_diff: Some(share_diff),
            prevhash: Some(template.prevhash_hex()),
            height: Some(template.height()),
            submit,
        })
    }

    async fn escalate(self: &Arc<Self>, template: &BlockTemplate, digest: &HeaderDigest) -> SubmitOutcome {
        let block_hex = match template.serialize() {
            Ok(block) => hex::encode(block),
            Err(err) => {
                error!("Failed to serialize block candidate: {err:#}");
                return SubmitOutcome::Failed {
                    error: err.to_string(),
                };
            }
        };

        let outcome = match self
            .upstream
            .submit_block(&block_hex, &digest.check_hex, &digest.solution_hex)
            .await
        {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!("Block submission failed: {err:#}");
                SubmitOutcome::Failed {
                    error: err.to_string(),
                }
            }
        };

        if outcome == SubmitOutcome::Accepted {
            info!("Upstream accepted block at height {}", template.height());
            self.update_block(false);
        }

        outcome
    }
}
