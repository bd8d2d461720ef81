use super::*;

/// Assembles the coinbase transaction for a template and splits its
/// serialization around the reserved extranonce area, so every connection can
/// splice in its own extranonce1 and each share its extranonce2.
#[derive(Clone)]
pub(crate) struct CoinbaseBuilder {
    address: Address,
    aux: BTreeMap<String, String>,
    extranonce_size: usize,
    height: u64,
    pool_sig: Option<String>,
    timestamp: Option<u64>,
    value: Amount,
    witness_commitment: ScriptBuf,
}

impl CoinbaseBuilder {
    const MAX_COINBASE_SCRIPT_SIG_SIZE: usize = 100;

    pub(crate) fn new(
        address: Address,
        extranonce_size: usize,
        height: u64,
        value: Amount,
        witness_commitment: ScriptBuf,
    ) -> Self {
        Self {
            address,
            aux: BTreeMap::new(),
            extranonce_size,
            height,
            value,
            witness_commitment,
            timestamp: None,
            pool_sig: None,
        }
    }

    pub(crate) fn with_aux(mut self, aux: BTreeMap<String, String>) -> Self {
        self.aux = aux;
        self
    }

    pub(crate) fn with_timestamp(mut self, timestamp: u64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub(crate) fn with_pool_sig(mut self, pool_sig: String) -> Self {
        self.pool_sig = Some(pool_sig);
        self
    }

    pub(crate) fn build(self) -> Result<(Transaction, Vec<u8>, Vec<u8>)> {
        let mut buf: Vec<u8> = Vec::with_capacity(Self::MAX_COINBASE_SCRIPT_SIG_SIZE);

        // BIP34 encode block height
        let mut minimally_encoded_serialized_cscript = [0u8; 8];
        let len = write_scriptint(
            &mut minimally_encoded_serialized_cscript,
            self.height.try_into().expect("height should always fit"),
        );
        // byte length should be fine for the next 150 years
        buf.push(len as u8);
        buf.extend_from_slice(&minimally_encoded_serialized_cscript[..len]);

        for (_, value) in self.aux.into_iter() {
            buf.extend_from_slice(hex::decode(value)?.as_slice());
        }

        let script_prefix_size = buf.len();

        buf.extend_from_slice(vec![0u8; self.extranonce_size].as_slice());

        if let Some(sig) = self.pool_sig {
            buf.extend_from_slice(sig.as_bytes())
        }

        if let Some(ts) = self.timestamp {
            buf.extend_from_slice(&ts.to_le_bytes());
        }

        let script_sig = ScriptBuf::from_bytes(buf);
        let script_sig_size = script_sig.len();

        ensure!(
            script_sig_size <= Self::MAX_COINBASE_SCRIPT_SIG_SIZE,
            "Script sig too large is {script_sig_size} bytes (max {})",
            Self::MAX_COINBASE_SCRIPT_SIG_SIZE
        );

        let coinbase = Transaction {
            version: bitcoin::transaction::Version::TWO,
            lock_time: LockTime::ZERO,
            input: vec![TxIn {
                previous_output: OutPoint::null(),
                script_sig,
                sequence: Sequence::MAX,
                witness: Witness::new(),
            }],
            output: vec![
                TxOut {
                    value: self.value,
                    script_pubkey: self.address.script_pubkey(),
                },
                TxOut {
                    value: Amount::ZERO,
                    script_pubkey: self.witness_commitment,
                },
            ],
        };

        // offset = size of tx version
        //  + size of #inputs
        //  + size of coinbase outpoint
        //  + size of scriptSig length
        //  + size of everything before the extranonce area
        let offset = 4
            + VarInt(coinbase.input.len().try_into().unwrap()).size()
            + 36
            + VarInt(script_sig_size.try_into().unwrap()).size()
            + script_prefix_size;

        let bin = consensus::serialize(&coinbase);
        let prefix = bin[..offset].to_vec();
        let suffix = bin[offset + self.extranonce_size..].to_vec();

        Ok((coinbase, prefix, suffix))
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*, bitcoin::address::NetworkUnchecked,
        pretty_assertions::assert_eq as pretty_assert_eq,
    };

    const COIN_VALUE: u64 = 100_000_000;

    fn address() -> Address {
        "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4"
            .parse::<Address<NetworkUnchecked>>()
            .unwrap()
            .assume_checked()
    }

    fn reassemble(prefix: &[u8], extranonce: &[u8], suffix: &[u8]) -> Vec<u8> {
        let mut full = prefix.to_vec();
        full.extend_from_slice(extranonce);
        full.extend_from_slice(suffix);
        full
    }

    #[test]
    fn exceed_script_size_limit() {
        let result = CoinbaseBuilder::new(
            address(),
            12,
            0,
            Amount::from_sat(50 * COIN_VALUE),
            ScriptBuf::new(),
        )
        .with_pool_sig("aa".repeat(100))
        .build();

        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Script sig too large")
        );
    }

    #[test]
    fn split_reassembles_with_zero_extranonce() {
        let (tx, prefix, suffix) = CoinbaseBuilder::new(
            address(),
            12,
            500_000,
            Amount::from_sat(50 * COIN_VALUE),
            ScriptBuf::new(),
        )
        .with_pool_sig("|riptide|".into())
        .build()
        .unwrap();

        pretty_assert_eq!(
            reassemble(&prefix, &[0u8; 12], &suffix),
            bitcoin::consensus::serialize(&tx)
        );
    }

    #[test]
    fn split_allows_custom_extranonce() {
        let (tx, prefix, suffix) = CoinbaseBuilder::new(
            address(),
            12,
            0,
            Amount::from_sat(50 * COIN_VALUE),
            ScriptBuf::new(),
        )
        .build()
        .unwrap();

        let joined = reassemble(&prefix, &[0x11u8; 12], &suffix);
        let original = bitcoin::consensus::serialize(&tx);

        assert_eq!(joined.len(), original.len(), "length must match");
        assert_ne!(
            joined, original,
            "bytes should differ when the extranonce is not zero"
        );
    }

    #[test]
    fn deterministic_with_same_inputs() {
        let base = CoinbaseBuilder::new(
            address(),
            12,
            0,
            Amount::from_sat(50 * COIN_VALUE),
            ScriptBuf::new(),
        );

        let (tx1, p1, s1) = base.clone().build().unwrap();
        let (tx2, p2, s2) = base.build().unwrap();

        assert_eq!(
            bitcoin::consensus::serialize(&tx1),
            bitcoin::consensus::serialize(&tx2)
        );
        assert_eq!(p1, p2);
        assert_eq!(s1, s2);
    }

    #[test]
    fn aux_invalid_hex_errors() {
        let mut aux = BTreeMap::new();
        aux.insert("bad".to_string(), "zz".to_string());

        let err = CoinbaseBuilder::new(
            address(),
            12,
            800_000,
            Amount::from_sat(50 * COIN_VALUE),
            ScriptBuf::new(),
        )
        .with_aux(aux)
        .build()
        .unwrap_err()
        .to_string();

        assert!(err.contains("Invalid character"));
    }

    #[test]
    fn hole_is_zeroed_at_the_split_boundary() {
        let (tx, prefix, suffix) = CoinbaseBuilder::new(
            address(),
            12,
            900_000,
            Amount::from_sat(50 * COIN_VALUE),
            ScriptBuf::new(),
        )
        .with_pool_sig("|riptide|".into())
        .build()
        .unwrap();

        let bin = bitcoin::consensus::serialize(&tx);
        pretty_assert_eq!(reassemble(&prefix, &[0u8; 12], &suffix), bin);

        assert_eq!(&bin[prefix.len()..prefix.len() + 12], &[0u8; 12]);
        assert!(suffix.starts_with("|riptide|".as_bytes()));
    }

    #[test]
    fn pool_sig_resides_after_the_hole() {
        let tag = "|riptide|";
        let (_tx, prefix, suffix) = CoinbaseBuilder::new(
            address(),
            12,
            0,
            Amount::from_sat(50 * COIN_VALUE),
            ScriptBuf::new(),
        )
        .with_pool_sig(tag.into())
        .build()
        .unwrap();

        let tag = tag.as_bytes();
        assert!(
            !prefix.windows(tag.len()).any(|w| w == tag),
            "pool sig must not be in the prefix"
        );
        assert!(
            suffix.windows(tag.len()).any(|w| w == tag),
            "pool sig must be in the suffix"
        );
    }

    #[test]
    fn offset_matches_varint_formula() {
        let height = 600_000u64;

        let mut aux = BTreeMap::new();
        aux.insert("k".into(), "cafebabe".into());

        let (tx, prefix, _suffix) = CoinbaseBuilder::new(
            address(),
            12,
            height,
            Amount::from_sat(50 * COIN_VALUE),
            ScriptBuf::new(),
        )
        .with_aux(aux.clone())
        .with_pool_sig("hey".into())
        .with_timestamp(1)
        .build()
        .unwrap();

        let script_sig_len = tx.input[0].script_sig.len();

        let mut tmp = [0u8; 8];
        let hlen = write_scriptint(&mut tmp, height.try_into().unwrap());
        let aux_len: usize = aux.values().map(|h| hex::decode(h).unwrap().len()).sum();
        let script_prefix_len = 1 + hlen + aux_len;

        let expected_offset =
            4 + VarInt(1).size() + 36 + VarInt(script_sig_len as u64).size() + script_prefix_len;

        assert_eq!(
            prefix.len(),
            expected_offset,
            "prefix length must equal computed offset"
        );
    }

    #[test]
    fn aux_bytes_extend_prefix_and_shift_boundary() {
        let base = CoinbaseBuilder::new(
            address(),
            12,
            0,
            Amount::from_sat(50 * COIN_VALUE),
            ScriptBuf::new(),
        );

        let (_, prefix_base, _) = base.clone().build().unwrap();

        let mut aux = BTreeMap::new();
        aux.insert("a".into(), "00112233".into());
        let (_, prefix_aux, _) = base.with_aux(aux).build().unwrap();

        assert_eq!(prefix_aux.len(), prefix_base.len() + 4);
    }

    #[test]
    fn join_roundtrip_various_extranonce_sizes() {
        for size in [1usize, 8, 12, 16, 32] {
            let (tx, prefix, suffix) = CoinbaseBuilder::new(
                address(),
                size,
                0,
                Amount::from_sat(50 * COIN_VALUE),
                ScriptBuf::new(),
            )
            .build()
            .unwrap();

            pretty_assert_eq!(
                reassemble(&prefix, &vec![0u8; size], &suffix),
                bitcoin::consensus::serialize(&tx)
            );
        }
    }

    #[test]
    fn script_sig_too_large_via_extranonce_errors() {
        let err = CoinbaseBuilder::new(
            address(),
            CoinbaseBuilder::MAX_COINBASE_SCRIPT_SIG_SIZE,
            2222,
            Amount::from_sat(50 * COIN_VALUE),
            ScriptBuf::new(),
        )
        .build()
        .unwrap_err()
        .to_string();

        assert!(err.contains("Script sig too large"));
    }
}
