use super::*;

/// The `getblocktemplate` response, as far as the registry cares about it.
#[derive(Clone, PartialEq, Eq, Debug, Deserialize, Serialize)]
pub struct TemplateData {
    pub bits: Nbits,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(rename = "previousblockhash")]
    pub previous_block_hash: BlockHash,
    #[serde(rename = "curtime", deserialize_with = "ntime_from_u64")]
    pub current_time: Ntime,
    pub height: u64,
    #[serde(deserialize_with = "version_from_i32")]
    pub version: Version,
    pub transactions: Vec<TemplateTransaction>,
    #[serde(with = "bitcoin::script::ScriptBuf", default)]
    pub default_witness_commitment: ScriptBuf,
    #[serde(default)]
    pub coinbaseaux: BTreeMap<String, String>,
    #[serde(
        rename = "coinbasevalue",
        with = "bitcoin::amount::serde::as_sat",
        default
    )]
    pub coinbase_value: Amount,
}

#[derive(Clone, PartialEq, Eq, Debug, Deserialize, Serialize)]
pub struct TemplateTransaction {
    pub txid: Txid,
    #[serde(rename = "data", deserialize_with = "tx_from_hex")]
    pub transaction: Transaction,
}

impl TemplateData {
    /// The network difficulty target as a 256-bit integer, from the `target`
    /// hex field when present, otherwise expanded from `bits`.
    pub fn network_target(&self) -> Result<U256> {
        match &self.target {
            Some(target) => {
                let bytes = <[u8; 32]>::from_hex(target)
                    .with_context(|| format!("invalid template target `{target}`"))?;
                Ok(U256::from_big_endian(&bytes))
            }
            None => Ok(U256::from_big_endian(
                &Target::from_compact(self.bits.to_compact()).to_be_bytes(),
            )),
        }
    }
}

fn version_from_i32<'de, D>(d: D) -> Result<Version, D::Error>
where
    D: Deserializer<'de>,
{
    let x = i32::deserialize(d)?;
    Ok(Version::from(x))
}

fn tx_from_hex<'de, D>(d: D) -> Result<Transaction, D::Error>
where
    D: Deserializer<'de>,
{
    let s = <&str>::deserialize(d)?;
    consensus::encode::deserialize_hex(s).map_err(serde::de::Error::custom)
}

fn ntime_from_u64<'de, D>(d: D) -> Result<Ntime, D::Error>
where
    D: Deserializer<'de>,
{
    let v = u64::deserialize(d)?;
    Ntime::try_from(v).map_err(de::Error::custom)
}
