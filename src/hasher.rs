use super::*;

/// Everything the submit path needs to know about a hashed header: the
/// integer form for target comparisons and the hex forms the upstream
/// `submitblock` call expects.
#[derive(Debug, Clone)]
pub struct HeaderDigest {
    pub int: U256,
    pub hex: String,
    pub header_hex: String,
    pub solution_hex: String,
    pub check_hex: String,
}

/// The proof-of-work hash is the one chain-specific piece of the registry,
/// so it is injected rather than hardcoded. The registry itself performs no
/// hashing beyond comparing the returned integer against targets.
pub trait ChainHasher: Send + Sync + 'static {
    fn hash_header(&self, header: &[u8; 80], ntime: Ntime, nonce: Nonce) -> HeaderDigest;

    fn hash_coinbase(&self, coinbase: &[u8]) -> MerkleNode {
        MerkleNode::from_raw_hash(sha256d::Hash::hash(coinbase))
    }
}

/// Double-SHA256 header hashing. The solution for this family is the header
/// itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256d;

impl ChainHasher for Sha256d {
    fn hash_header(&self, header: &[u8; 80], _ntime: Ntime, _nonce: Nonce) -> HeaderDigest {
        let hash = sha256d::Hash::hash(header);

        let mut be = hash.to_byte_array();
        be.reverse();

        let hash_hex = hex::encode(be);
        let header_hex = hex::encode(header);

        HeaderDigest {
            int: U256::from_big_endian(&be),
            hex: hash_hex.clone(),
            header_hex: header_hex.clone(),
            solution_hex: header_hex,
            check_hex: hash_hex,
        }
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        bitcoin::{Network, blockdata::constants::genesis_block},
        crate::difficulty::DIFFICULTY_1_TARGET,
    };

    #[test]
    fn genesis_header_hashes_to_the_known_block_hash() {
        let genesis = genesis_block(Network::Bitcoin);

        let header: [u8; 80] = consensus::serialize(&genesis.header).try_into().unwrap();

        let digest = Sha256d.hash_header(
            &header,
            Ntime::from(genesis.header.time),
            Nonce::from(genesis.header.nonce),
        );

        assert_eq!(
            digest.hex,
            "000000000019d6689c085ae165831e934ff763ae46a2a6c172b3f1b60a8ce26f"
        );
        assert_eq!(digest.check_hex, digest.hex);
        assert_eq!(digest.header_hex, hex::encode(header));
        assert_eq!(digest.solution_hex, digest.header_hex);
    }

    #[test]
    fn digest_int_matches_hex() {
        let header = [0u8; 80];
        let digest = Sha256d.hash_header(&header, Ntime::from(0), Nonce::from(0));

        let bytes = <[u8; 32]>::from_hex(&digest.hex).unwrap();
        assert_eq!(digest.int, U256::from_big_endian(&bytes));
    }

    #[test]
    fn coinbase_hash_is_sha256d() {
        let coinbase = b"coinbase bytes";
        assert_eq!(
            Sha256d.hash_coinbase(coinbase).to_raw_hash(),
            sha256d::Hash::hash(coinbase)
        );
    }

    #[test]
    fn genesis_meets_its_own_target() {
        let genesis = genesis_block(Network::Bitcoin);
        let header: [u8; 80] = consensus::serialize(&genesis.header).try_into().unwrap();

        let digest = Sha256d.hash_header(
            &header,
            Ntime::from(genesis.header.time),
            Nonce::from(genesis.header.nonce),
        );

        assert!(digest.int <= *DIFFICULTY_1_TARGET);
    }
}
