/// Single-value cache gated by a time-to-live.
///
/// No locking or in-flight tracking: two misses in a row simply fetch twice.
#[derive(Debug, Clone)]
pub struct TtlCache<T> {
    ttl_ms: u64,
    value: Option<(T, u64)>,
}

impl<T> TtlCache<T> {
    pub fn new(ttl_ms: u64) -> Self {
        Self { ttl_ms, value: None }
    }

    pub fn get(&self, now_ms: u64) -> Option<&T> {
        match &self.value {
            Some((v, stored_at)) if now_ms.saturating_sub(*stored_at) < self.ttl_ms => Some(v),
            _ => None,
        }
    }

    pub fn put(&mut self, value: T, now_ms: u64) {
        self.value = Some((value, now_ms));
    }

    pub fn invalidate(&mut self) {
        self.value = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expires_after_ttl() {
        let mut cache = TtlCache::new(1_000);
        assert_eq!(cache.get(0), None);
        cache.put(7, 100);
        assert_eq!(cache.get(1_099), Some(&7));
        assert_eq!(cache.get(1_100), None);
        cache.put(8, 2_000);
        cache.invalidate();
        assert_eq!(cache.get(2_001), None);
    }
}
