use super::*;

use snafu::Snafu;

mod error;
mod extranonce;
mod job_id;
mod merkle;
mod nbits;
mod nonce;
mod notify;
mod ntime;
mod prevhash;
mod version;

pub use {
    error::InternalError,
    extranonce::Extranonce,
    job_id::JobId,
    merkle::{MerkleNode, merkle_branches, merkle_root_with_first},
    nbits::Nbits,
    nonce::Nonce,
    notify::Notify,
    ntime::Ntime,
    prevhash::PrevHash,
    version::Version,
};
