use super::*;

/// Stratum sends merkle branches as hex of the 32 raw hash bytes, unlike
/// Txid and friends which display in reversed hex.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, DeserializeFromStr, SerializeDisplay)]
pub struct MerkleNode(sha256d::Hash);

impl MerkleNode {
    pub fn as_byte_array(&self) -> &[u8; 32] {
        self.0.as_byte_array()
    }

    pub fn from_byte_array(bytes: [u8; 32]) -> Self {
        Self(sha256d::Hash::from_byte_array(bytes))
    }

    pub fn from_raw_hash(hash: sha256d::Hash) -> Self {
        Self(hash)
    }

    pub fn to_raw_hash(self) -> sha256d::Hash {
        self.0
    }
}

impl fmt::Display for MerkleNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0.as_byte_array()))
    }
}

impl FromStr for MerkleNode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ensure!(s.len() == 64, "merkle node hex must be 64 chars");
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes)?;
        Ok(MerkleNode(sha256d::Hash::from_byte_array(bytes)))
    }
}

impl From<sha256d::Hash> for MerkleNode {
    fn from(hash: sha256d::Hash) -> Self {
        Self(hash)
    }
}

impl From<MerkleNode> for sha256d::Hash {
    fn from(node: MerkleNode) -> Self {
        node.0
    }
}

impl From<MerkleNode> for TxMerkleNode {
    fn from(node: MerkleNode) -> Self {
        node.0.into()
    }
}

impl From<Txid> for MerkleNode {
    fn from(txid: Txid) -> Self {
        Self::from_byte_array(txid.to_byte_array())
    }
}

/// Folds the coinbase hash through the precomputed branches to produce the
/// merkle root.
pub fn merkle_root_with_first(first: MerkleNode, branches: &[MerkleNode]) -> MerkleNode {
    let mut root = first.to_raw_hash();

    for branch in branches {
        root = hash_pair(root, branch.to_raw_hash());
    }

    MerkleNode::from_raw_hash(root)
}

/// Constructs the merkle branches from all non-coinbase transactions that
/// should be included in the block. The coinbase occupies index zero, so its
/// sibling chain does not depend on the coinbase hash itself.
pub fn merkle_branches(non_coinbase_txids: Vec<Txid>) -> Vec<MerkleNode> {
    if non_coinbase_txids.is_empty() {
        return Vec::new();
    }

    let mut level = vec![sha256d::Hash::all_zeros()];
    level.extend(non_coinbase_txids.iter().map(|id| id.to_raw_hash()));

    let mut branches = Vec::new();
    let mut coinbase_index = 0;

    while level.len() > 1 {
        // XOR to get sibling (can be right or left sibling)
        let sibling_index = coinbase_index ^ 1;

        let sibling = if sibling_index < level.len() {
            level[sibling_index]
        } else {
            level[coinbase_index]
        };

        branches.push(sibling.into());

        let mut next_level = Vec::with_capacity(level.len() / 2 + 1);
        let mut i = 0;
        while i < level.len() {
            let left = level[i];
            let right = if i + 1 < level.len() { level[i + 1] } else { left };
            next_level.push(hash_pair(left, right));
            i += 2;
        }

        level = next_level;
        coinbase_index /= 2;
    }

    branches
}

fn hash_pair(left: sha256d::Hash, right: sha256d::Hash) -> sha256d::Hash {
    let mut concat = Vec::with_capacity(64);
    concat.extend_from_slice(left.as_byte_array());
    concat.extend_from_slice(right.as_byte_array());
    sha256d::Hash::hash(&concat)
}
