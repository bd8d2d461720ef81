use super::*;

/// prevhash in the protocol spec is insane: it swaps bytes of every u32 word
/// into big endian.
#[derive(Debug, PartialEq, Eq, Clone, DeserializeFromStr, SerializeDisplay)]
pub struct PrevHash(BlockHash);

impl FromStr for PrevHash {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = <[u8; 32]>::from_hex(s)?;

        let mut reordered = [0u8; 32];
        for (src, dst) in bytes.chunks_exact(4).zip(reordered.chunks_mut(4)) {
            let word = BigEndian::read_u32(src);
            LittleEndian::write_u32(dst, word);
        }

        let inner = BlockHash::from_slice(&reordered)?;
        Ok(PrevHash(inner))
    }
}

impl fmt::Display for PrevHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut swapped = [0u8; 32];
        for (src, dst) in self
            .0
            .as_byte_array()
            .chunks_exact(4)
            .zip(swapped.chunks_mut(4))
        {
            let word = LittleEndian::read_u32(src);
            BigEndian::write_u32(dst, word);
        }

        write!(f, "{}", hex::encode(swapped))
    }
}

impl From<BlockHash> for PrevHash {
    fn from(blockhash: BlockHash) -> Self {
        PrevHash(blockhash)
    }
}

impl From<PrevHash> for BlockHash {
    fn from(prevhash: PrevHash) -> Self {
        prevhash.0
    }
}
