use super::*;

/// One mineable block in progress. Everything that does not depend on a
/// worker's extranonce is fixed at construction: the merkle branches, the
/// coinbase halves around the reserved extranonce area, and the broadcast
/// arguments. Submitted extranonce tuples accumulate in `submits` for
/// duplicate rejection, and a winning share fills `finalized` exactly once.
#[derive(Debug)]
pub struct BlockTemplate {
    job_id: JobId,
    previous_block_hash: BlockHash,
    height: u64,
    version: Version,
    nbits: Nbits,
    curtime: Ntime,
    target: U256,
    coinbase_prefix: Vec<u8>,
    coinbase_suffix: Vec<u8>,
    merkle_branches: Vec<MerkleNode>,
    transactions: Vec<Transaction>,
    broadcast_args: Notify,
    submits: Mutex<HashSet<Submission>>,
    finalized: OnceLock<Block>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Submission {
    enonce1: Extranonce,
    enonce2: Extranonce,
    ntime: Ntime,
    nonce: Nonce,
}

impl BlockTemplate {
    /// Builds a template from a `getblocktemplate` response.
    pub fn from_rpc(
        job_id: JobId,
        data: &TemplateData,
        settings: &Settings,
        timestamp: u64,
    ) -> Result<Self> {
        let target = data.network_target()?;

        let (_coinbase, prefix, suffix) = CoinbaseBuilder::new(
            settings.pool_address().clone(),
            EXTRANONCE_TOTAL_SIZE,
            data.height,
            data.coinbase_value,
            data.default_witness_commitment.clone(),
        )
        .with_aux(data.coinbaseaux.clone())
        .with_timestamp(timestamp)
        .with_pool_sig(settings.pool_signature().into())
        .build()
        .context("failed to build coinbase")?;

        let merkle_branches =
            merkle_branches(data.transactions.iter().map(|tx| tx.txid).collect());

        let broadcast_args = Notify {
            job_id,
            prevhash: data.previous_block_hash.into(),
            coinb1: hex::encode(&prefix),
            coinb2: hex::encode(&suffix),
            merkle_branches: merkle_branches.clone(),
            version: data.version,
            nbits: data.bits,
            ntime: data.current_time,
            clean_jobs: true,
        };

        Ok(Self {
            job_id,
            previous_block_hash: data.previous_block_hash,
            height: data.height,
            version: data.version,
            nbits: data.bits,
            curtime: data.current_time,
            target,
            coinbase_prefix: prefix,
            coinbase_suffix: suffix,
            merkle_branches,
            transactions: data
                .transactions
                .iter()
                .map(|tx| tx.transaction.clone())
                .collect(),
            broadcast_args,
            submits: Mutex::new(HashSet::new()),
            finalized: OnceLock::new(),
        })
    }

    pub fn job_id(&self) -> JobId {
        self.job_id
    }

    pub fn prev_blockhash(&self) -> BlockHash {
        self.previous_block_hash
    }

    pub fn prevhash(&self) -> PrevHash {
        self.previous_block_hash.into()
    }

    /// RPC-form hex of the previous block hash, as share accounting wants it.
    pub fn prevhash_hex(&self) -> String {
        self.previous_block_hash.to_string()
    }

    pub fn height(&self) -> u64 {
        self.height
    }

    pub fn target(&self) -> U256 {
        self.target
    }

    pub fn curtime(&self) -> Ntime {
        self.curtime
    }

    pub fn merkle_branches(&self) -> &[MerkleNode] {
        &self.merkle_branches
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Arguments for `mining.notify`.
    pub fn broadcast_args(&self) -> Notify {
        self.broadcast_args.clone()
    }

    /// `prefix ‖ extranonce1 ‖ extranonce2 ‖ suffix`. The extranonces must
    /// fill the reserved area exactly.
    pub fn serialize_coinbase(&self, enonce1: &Extranonce, enonce2: &Extranonce) -> Result<Vec<u8>> {
        ensure!(
            enonce1.len() + enonce2.len() == EXTRANONCE_TOTAL_SIZE,
            "extranonce area must be exactly {EXTRANONCE_TOTAL_SIZE} bytes, got {} + {}",
            enonce1.len(),
            enonce2.len()
        );

        let mut coinbase = Vec::with_capacity(
            self.coinbase_prefix.len() + EXTRANONCE_TOTAL_SIZE + self.coinbase_suffix.len(),
        );
        coinbase.extend_from_slice(&self.coinbase_prefix);
        coinbase.extend_from_slice(enonce1.as_bytes());
        coinbase.extend_from_slice(enonce2.as_bytes());
        coinbase.extend_from_slice(&self.coinbase_suffix);

        Ok(coinbase)
    }

    /// Whether a submitted ntime falls within `max_age` seconds of the
    /// template's curtime, either direction.
    pub fn check_ntime(&self, ntime: Ntime, max_age: u64) -> bool {
        let curtime = u64::from(u32::from(self.curtime));
        let ntime = u64::from(u32::from(ntime));

        curtime.saturating_sub(max_age) <= ntime && ntime <= curtime + max_age
    }

    /// Records a submission tuple, returning whether it was new. The set
    /// only grows for the lifetime of the template.
    pub fn register_submit(
        &self,
        enonce1: &Extranonce,
        enonce2: &Extranonce,
        ntime: Ntime,
        nonce: Nonce,
    ) -> bool {
        self.submits.lock().insert(Submission {
            enonce1: enonce1.clone(),
            enonce2: enonce2.clone(),
            ntime,
            nonce,
        })
    }

    /// The 80-byte header with the given merkle root, ntime and nonce.
    pub fn serialize_header(&self, merkle_root: MerkleNode, ntime: Ntime, nonce: Nonce) -> [u8; 80] {
        let mut header = [0u8; 80];

        LittleEndian::write_i32(&mut header[0..4], self.version.0.to_consensus());
        header[4..36].copy_from_slice(self.previous_block_hash.as_byte_array());
        header[36..68].copy_from_slice(merkle_root.as_byte_array());
        LittleEndian::write_u32(&mut header[68..72], ntime.into());
        LittleEndian::write_u32(&mut header[72..76], self.nbits.to_compact().to_consensus());
        LittleEndian::write_u32(&mut header[76..80], nonce.into());

        header
    }

    /// Assembles the full block for a winning share. A template finalizes at
    /// most once.
    pub fn finalize(
        &self,
        merkle_root: MerkleNode,
        enonce1: &Extranonce,
        enonce2: &Extranonce,
        ntime: Ntime,
        nonce: Nonce,
    ) -> Result {
        let coinbase_bin = self.serialize_coinbase(enonce1, enonce2)?;

        let mut cursor = bitcoin::io::Cursor::new(&coinbase_bin);
        let coinbase = Transaction::consensus_decode_from_finite_reader(&mut cursor)
            .context("failed to decode assembled coinbase")?;

        let header = Header {
            version: self.version.into(),
            prev_blockhash: self.previous_block_hash,
            merkle_root: merkle_root.into(),
            time: ntime.into(),
            bits: self.nbits.to_compact(),
            nonce: nonce.into(),
        };

        let txdata = iter::once(coinbase)
            .chain(self.transactions.iter().cloned())
            .collect();

        self.finalized
            .set(Block { header, txdata })
            .map_err(|_| anyhow!("template {} already finalized", self.job_id))?;

        Ok(())
    }

    /// Wire-format block bytes for submission.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let block = self
            .finalized
            .get()
            .ok_or_else(|| anyhow!("template {} not finalized", self.job_id))?;

        Ok(consensus::serialize(block))
    }

    /// Cross-check after finalize. A failure here is an engineering fault:
    /// it is logged by the caller but does not stop the submission attempt.
    pub fn is_valid(&self, difficulty: f64) -> bool {
        let Some(block) = self.finalized.get() else {
            return false;
        };

        if difficulty <= 0.0 {
            return false;
        }

        if !block.check_merkle_root() {
            return false;
        }

        if self.height > 16 && block.bip34_block_height().is_err() {
            return false;
        }

        block.txdata.len() == self.transactions.len() + 1
    }
}
