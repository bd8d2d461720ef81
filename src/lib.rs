use {
    anyhow::{Context, Error, anyhow, ensure},
    async_trait::async_trait,
    bitcoin::{
        Address, Amount, Block, BlockHash, CompactTarget, OutPoint, ScriptBuf, Sequence, Target,
        Transaction, TxIn, TxMerkleNode, TxOut, Txid, VarInt, Witness,
        block::{self, Header},
        consensus::{self, Decodable},
        hashes::{Hash, sha256d},
        locktime::absolute::LockTime,
        script::write_scriptint,
    },
    byteorder::{BigEndian, ByteOrder, LittleEndian},
    coinbase_builder::CoinbaseBuilder,
    derive_more::Display,
    difficulty::{diff_to_target, share_difficulty},
    extranonce_counter::ExtranonceCounter,
    hex::FromHex,
    parking_lot::Mutex,
    primitive_types::U256,
    rand::RngCore,
    serde::{
        Deserialize, Serialize, Serializer,
        de::{self, Deserializer},
        ser::SerializeSeq,
    },
    serde_with::{DeserializeFromStr, SerializeDisplay},
    std::{
        collections::{BTreeMap, HashMap, HashSet},
        fmt::{self, Formatter},
        iter,
        net::IpAddr,
        str::FromStr,
        sync::{Arc, LazyLock, OnceLock, Weak},
        time::{SystemTime, UNIX_EPOCH},
    },
    stratum::{
        Extranonce, JobId, MerkleNode, Nbits, Nonce, Notify, Ntime, PrevHash, Version,
        merkle_branches, merkle_root_with_first,
    },
    tokio::task::JoinHandle,
    tokio_util::sync::CancellationToken,
    tracing::{debug, error, info, warn},
};

pub use {
    difficulty::ShareDiff,
    event_sink::{EventSink, NullSink},
    hasher::{ChainHasher, HeaderDigest, Sha256d},
    registry::{RegistryError, TemplateRegistry},
    settings::Settings,
    share::{ShareOutcome, SubmitError},
    template::BlockTemplate,
    template_data::{TemplateData, TemplateTransaction},
    timestamper::{SystemTimestamper, Timestamper},
    upstream::{SubmitOutcome, UpstreamRpc},
};

mod coinbase_builder;
mod difficulty;
mod event_sink;
mod extranonce_counter;
mod hasher;
mod registry;
mod settings;
mod share;
pub mod stratum;
mod template;
mod template_data;
mod timestamper;
mod upstream;

/// Width of the pool-assigned extranonce1 prefix: one instance byte plus a
/// big-endian connection counter.
pub const ENONCE1_SIZE: usize = 4;

/// Bytes reserved for the whole extranonce area in the coinbase scriptSig.
/// Workers own the remainder after extranonce1.
pub const EXTRANONCE_TOTAL_SIZE: usize = 12;

pub(crate) const REFRESH_STALL_SECS: u64 = 30;

type Result<T = (), E = Error> = std::result::Result<T, E>;
