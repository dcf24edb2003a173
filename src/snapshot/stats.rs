//! Per-region kilobyte counters and the merge strategies used by the
//! aggregation tables.

use serde::Serialize;

/// Kernel key names of the eleven recognised counters, in field order
pub const STAT_KEYS: [&str; 11] = [
    "Size",
    "Rss",
    "Shared_Clean",
    "Shared_Dirty",
    "Private_Clean",
    "Private_Dirty",
    "Pss",
    "Swap",
    "Referenced",
    "Anonymous",
    "Locked",
];

/// Resident and accounting counters of one region, all in kB
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RegionStats {
    pub size: u64,
    pub rss: u64,
    pub shared_clean: u64,
    pub shared_dirty: u64,
    pub private_clean: u64,
    pub private_dirty: u64,
    pub pss: u64,
    pub swap: u64,
    pub referenced: u64,
    pub anonymous: u64,
    pub locked: u64,
}

impl RegionStats {
    /// Counter values in `STAT_KEYS` order
    pub fn values(&self) -> [u64; 11] {
        [
            self.size,
            self.rss,
            self.shared_clean,
            self.shared_dirty,
            self.private_clean,
            self.private_dirty,
            self.pss,
            self.swap,
            self.referenced,
            self.anonymous,
            self.locked,
        ]
    }

    fn from_values(v: [u64; 11]) -> Self {
        Self {
            size: v[0],
            rss: v[1],
            shared_clean: v[2],
            shared_dirty: v[3],
            private_clean: v[4],
            private_dirty: v[5],
            pss: v[6],
            swap: v[7],
            referenced: v[8],
            anonymous: v[9],
            locked: v[10],
        }
    }

    /// `(kernel key, value)` pairs in `STAT_KEYS` order
    pub fn entries(&self) -> impl Iterator<Item = (&'static str, u64)> {
        STAT_KEYS.into_iter().zip(self.values())
    }

    /// Mutable counter for a kernel key such as `Private_Dirty`
    pub fn field_mut(&mut self, key: &str) -> Option<&mut u64> {
        let field = match key {
            "Size" => &mut self.size,
            "Rss" => &mut self.rss,
            "Shared_Clean" => &mut self.shared_clean,
            "Shared_Dirty" => &mut self.shared_dirty,
            "Private_Clean" => &mut self.private_clean,
            "Private_Dirty" => &mut self.private_dirty,
            "Pss" => &mut self.pss,
            "Swap" => &mut self.swap,
            "Referenced" => &mut self.referenced,
            "Anonymous" => &mut self.anonymous,
            "Locked" => &mut self.locked,
            _ => return None,
        };
        Some(field)
    }

    /// Add every counter of `other`
    pub fn sum_merge(&mut self, other: &RegionStats) {
        self.merge_with(other, |a, b| a.saturating_add(b));
    }

    /// Keep the larger value of every counter
    pub fn max_merge(&mut self, other: &RegionStats) {
        self.merge_with(other, u64::max);
    }

    /// Merge used for per-library tables
    ///
    /// Pages of a shared object are mapped by every sharer, so the size and
    /// shared counters keep the maximum over sharers. The private and
    /// accounted counters add up.
    pub fn library_merge(&mut self, other: &RegionStats) {
        self.size = self.size.max(other.size);
        self.rss = self.rss.max(other.rss);
        self.shared_clean = self.shared_clean.max(other.shared_clean);
        self.shared_dirty = self.shared_dirty.max(other.shared_dirty);

        self.private_clean = self.private_clean.saturating_add(other.private_clean);
        self.private_dirty = self.private_dirty.saturating_add(other.private_dirty);
        self.pss = self.pss.saturating_add(other.pss);
        self.swap = self.swap.saturating_add(other.swap);
        self.referenced = self.referenced.saturating_add(other.referenced);
        self.anonymous = self.anonymous.saturating_add(other.anonymous);
        self.locked = self.locked.saturating_add(other.locked);
    }

    fn merge_with(&mut self, other: &RegionStats, op: impl Fn(u64, u64) -> u64) {
        let mut merged = self.values();
        for (dst, src) in merged.iter_mut().zip(other.values()) {
            *dst = op(*dst, src);
        }
        *self = Self::from_values(merged);
    }

    /// Dirty private memory
    pub fn private(&self) -> u64 {
        self.private_dirty
    }

    /// Dirty shared memory
    pub fn shared(&self) -> u64 {
        self.shared_dirty
    }

    /// Clean memory, shared or private
    pub fn clean(&self) -> u64 {
        self.shared_clean.saturating_add(self.private_clean)
    }

    /// All resident pages split by the kernel into the four
    /// clean/dirty and shared/private buckets
    pub fn resident_split(&self) -> u64 {
        self.shared_clean
            .saturating_add(self.shared_dirty)
            .saturating_add(self.private_clean)
            .saturating_add(self.private_dirty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(seed: u64) -> RegionStats {
        let mut v = [0u64; 11];
        for (i, slot) in v.iter_mut().enumerate() {
            *slot = seed + i as u64;
        }
        RegionStats::from_values(v)
    }

    #[test]
    fn test_field_mut_covers_every_key() {
        let mut s = RegionStats::default();
        for (i, key) in STAT_KEYS.iter().enumerate() {
            *s.field_mut(key).unwrap() = i as u64 + 1;
        }
        assert_eq!(s.values(), [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11]);
        assert!(s.field_mut("KernelPageSize").is_none());
    }

    #[test]
    fn test_sum_and_max_merge() {
        let mut a = stats(1);
        a.sum_merge(&stats(10));
        assert_eq!(a.size, 11);
        assert_eq!(a.locked, 31);

        let mut b = stats(1);
        b.max_merge(&stats(10));
        assert_eq!(b, stats(10));
    }

    #[test]
    fn test_library_merge_dedups_shared_fields() {
        let one = RegionStats {
            size: 100,
            rss: 80,
            shared_clean: 40,
            shared_dirty: 8,
            private_dirty: 4,
            pss: 20,
            swap: 2,
            ..Default::default()
        };
        let mut lib = one;
        lib.library_merge(&one);

        assert_eq!(lib.size, 100);
        assert_eq!(lib.rss, 80);
        assert_eq!(lib.shared_clean, 40);
        assert_eq!(lib.shared_dirty, 8);
        assert_eq!(lib.private_dirty, 8);
        assert_eq!(lib.pss, 40);
        assert_eq!(lib.swap, 4);
    }

    #[test]
    fn test_measures() {
        let s = RegionStats {
            shared_clean: 3,
            shared_dirty: 5,
            private_clean: 7,
            private_dirty: 11,
            ..Default::default()
        };
        assert_eq!(s.private(), 11);
        assert_eq!(s.shared(), 5);
        assert_eq!(s.clean(), 10);
        assert_eq!(s.resident_split(), 26);
    }

    #[test]
    fn test_measures_saturate() {
        let s = RegionStats {
            shared_clean: u64::MAX,
            shared_dirty: 1,
            private_clean: 1,
            private_dirty: 1,
            ..Default::default()
        };
        assert_eq!(s.clean(), u64::MAX);
        assert_eq!(s.resident_split(), u64::MAX);
    }
}
