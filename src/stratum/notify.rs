use super::*;

/// Arguments for `mining.notify`, on the wire a 9-element array.
#[derive(Debug, Clone, PartialEq)]
pub struct Notify {
    pub job_id: JobId,
    pub prevhash: PrevHash,
    pub coinb1: String,
    pub coinb2: String,
    pub merkle_branches: Vec<MerkleNode>,
    pub version: Version,
    pub nbits: Nbits,
    pub ntime: Ntime,
    pub clean_jobs: bool,
}

impl Serialize for Notify {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(9))?;
        seq.serialize_element(&self.job_id)?;
        seq.serialize_element(&self.prevhash)?;
        seq.serialize_element(&self.coinb1)?;
        seq.serialize_element(&self.coinb2)?;
        seq.serialize_element(&self.merkle_branches)?;
        seq.serialize_element(&self.version)?;
        seq.serialize_element(&self.nbits)?;
        seq.serialize_element(&self.ntime)?;
        seq.serialize_element(&self.clean_jobs)?;
        seq.end()
    }
}

impl<'de> Deserialize<'de> for Notify {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let (job_id, prevhash, coinb1, coinb2, merkle_branches, version, nbits, ntime, clean_jobs) =
            <(
                JobId,
                PrevHash,
                String,
                String,
                Vec<MerkleNode>,
                Version,
                Nbits,
                Ntime,
                bool,
            )>::deserialize(deserializer)?;

        Ok(Notify {
            job_id,
            prevhash,
            coinb1,
            coinb2,
            merkle_branches,
            version,
            nbits,
            ntime,
            clean_jobs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_notify(clean_jobs: bool) -> Notify {
        Notify {
            job_id: JobId::new(0x1f),
            prevhash: "4d16b6f85af6e2198f44ae2a6de67f78487ae5611b77c6c0440b921e00000000"
                .parse()
                .unwrap(),
            coinb1: "01000000010000000000000000000000000000000000000000000000000000000000000000ffffffff20020862062f503253482f04b8864e5008".into(),
            coinb2: "072f736c7573682f000000000100f2052a010000001976a914d23fcdf86f7e756a64a7a9688ef9903327048ed988ac00000000".into(),
            merkle_branches: Vec::new(),
            version: Version(block::Version::TWO),
            nbits: "1c2ac4af".parse().unwrap(),
            ntime: "504e86b9".parse().unwrap(),
            clean_jobs,
        }
    }

    #[test]
    fn notify_serializes_as_nine_element_array() {
        let notify = sample_notify(true);
        let value = serde_json::to_value(&notify).unwrap();

        let array = value.as_array().unwrap();
        assert_eq!(array.len(), 9);
        assert_eq!(array[0], "1f");
        assert_eq!(
            array[1],
            "4d16b6f85af6e2198f44ae2a6de67f78487ae5611b77c6c0440b921e00000000"
        );
        assert_eq!(array[5], "00000002");
        assert_eq!(array[6], "1c2ac4af");
        assert_eq!(array[7], "504e86b9");
        assert_eq!(array[8], true);
    }

    #[test]
    fn notify_roundtrip() {
        for clean_jobs in [true, false] {
            let notify = sample_notify(clean_jobs);
            let json = serde_json::to_string(&notify).unwrap();
            let back = serde_json::from_str::<Notify>(&json).unwrap();
            assert_eq!(back, notify);
        }
    }
}
