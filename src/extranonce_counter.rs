use super::*;

/// Hands out unique extranonce1 prefixes for newly subscribed connections.
///
/// The leading instance byte lets several pool processes share an upstream
/// without coordinating; the remaining bytes are a big-endian counter.
#[derive(Debug)]
pub(crate) struct ExtranonceCounter {
    instance_id: u8,
    counter: u32,
}

impl ExtranonceCounter {
    const COUNTER_SIZE: usize = ENONCE1_SIZE - 1;
    const MAX_COUNTER: u32 = (1 << (8 * Self::COUNTER_SIZE)) - 1;

    pub(crate) fn new(instance_id: u8) -> Self {
        Self {
            instance_id,
            counter: 0,
        }
    }

    pub(crate) fn next(&mut self) -> Result<Extranonce> {
        ensure!(
            self.counter <= Self::MAX_COUNTER,
            "extranonce1 space exhausted for instance {}",
            self.instance_id
        );

        let mut bytes = [0u8; ENONCE1_SIZE];
        bytes[0] = self.instance_id;
        BigEndian::write_u24(&mut bytes[1..], self.counter);

        self.counter += 1;

        Ok(Extranonce::from_bytes(&bytes))
    }

    pub(crate) fn size(&self) -> usize {
        ENONCE1_SIZE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emits_fixed_width_with_instance_prefix() {
        let mut counter = ExtranonceCounter::new(0x17);

        let extranonce = counter.next().unwrap();
        assert_eq!(extranonce.len(), ENONCE1_SIZE);
        assert_eq!(extranonce.as_bytes()[0], 0x17);
    }

    #[test]
    fn values_are_unique_and_monotonic() {
        let mut counter = ExtranonceCounter::new(0);

        let a = counter.next().unwrap();
        let b = counter.next().unwrap();
        let c = counter.next().unwrap();

        assert_eq!(a.as_bytes(), &[0, 0, 0, 0]);
        assert_eq!(b.as_bytes(), &[0, 0, 0, 1]);
        assert_eq!(c.as_bytes(), &[0, 0, 0, 2]);
    }

    #[test]
    fn distinct_instances_never_collide() {
        let mut first = ExtranonceCounter::new(1);
        let mut second = ExtranonceCounter::new(2);

        assert_ne!(first.next().unwrap(), second.next().unwrap());
    }

    #[test]
    fn refuses_to_wrap_on_exhaustion() {
        let mut counter = ExtranonceCounter::new(0);
        counter.counter = ExtranonceCounter::MAX_COUNTER;

        let last = counter.next().unwrap();
        assert_eq!(last.as_bytes(), &[0, 0xff, 0xff, 0xff]);

        assert!(
            counter
                .next()
                .unwrap_err()
                .to_string()
                .contains("extranonce1 space exhausted")
        );
    }

    #[test]
    fn size_matches_emission_width() {
        let mut counter = ExtranonceCounter::new(9);
        assert_eq!(counter.size(), counter.next().unwrap().len());
    }
}
