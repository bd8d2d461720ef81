use super::*;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, DeserializeFromStr, SerializeDisplay,
)]
pub struct Ntime(pub u32);

impl FromStr for Ntime {
    type Err = InternalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let time = u32::from_str_radix(s, 16).map_err(|source| InternalError::ParseHexInt {
            input: s.to_string(),
            source,
        })?;
        Ok(Ntime(time))
    }
}

impl fmt::Display for Ntime {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}", self.0)
    }
}

impl From<Ntime> for u32 {
    fn from(n: Ntime) -> u32 {
        n.0
    }
}

impl From<u32> for Ntime {
    fn from(n: u32) -> Ntime {
        Ntime(n)
    }
}

impl TryFrom<u64> for Ntime {
    type Error = <u32 as TryFrom<u64>>::Error;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Ok(Ntime(u32::try_from(value)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ntime_roundtrip() {
        assert_eq!(Ntime::from(0x504e86b9).to_string(), "504e86b9");
        assert_eq!(
            Ntime::from_str("504e86b9").unwrap(),
            Ntime::from(0x504e86b9)
        );
    }

    #[test]
    fn ntime_errors() {
        assert!("".parse::<Ntime>().is_err());
        assert!("xyz".parse::<Ntime>().is_err());
        assert!("fffffffff".parse::<Ntime>().is_err());
    }
}
