use glam::Vec2;

/// A reusable scratch buffer that accumulates force per receiver particle.
///
/// For each receiver index, this buffer stores:
///
/// - The sum of all inverse-distance force vectors from the source group.
/// - The number of source particles that were inside the interaction
///   radius.
///
/// It is written by [`crate::phases::force_phase`] while the receiver and
/// source groups are only borrowed immutably, and read afterwards by
/// [`crate::phases::integration_phase`]. Keeping it in a separate buffer is
/// what makes a self-pair update explicit-Euler: no receiver particle is
/// moved until every force has been computed.
#[derive(Debug, Default)]
pub struct ForceBuffer {
    /// Accumulated force per receiver particle.
    pub(crate) force: Vec<Vec2>,
    /// Number of contributing source particles per receiver particle.
    pub(crate) count: Vec<u32>,
}

impl ForceBuffer {
    /// Creates a new [`ForceBuffer`] for `len` receiver particles.
    ///
    /// All forces start at `Vec2::ZERO` and all counts at `0`.
    pub fn with_len(len: usize) -> Self {
        Self {
            force: vec![Vec2::ZERO; len],
            count: vec![0; len],
        }
    }

    /// Ensures the buffer has exactly `len` entries, then clears it.
    ///
    /// Storage is only reallocated when it needs to grow, so calling this
    /// once per pair interaction does not allocate in steady state.
    pub fn ensure_len(&mut self, len: usize) {
        if self.force.len() != len {
            self.force.resize(len, Vec2::ZERO);
            self.count.resize(len, 0);
        }
        self.clear();
    }

    /// Resets every force to zero and every count to `0`.
    pub fn clear(&mut self) {
        self.force.fill(Vec2::ZERO);
        self.count.fill(0);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.force.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.force.is_empty()
    }

    /// Adds one force contribution for receiver particle `i`.
    ///
    /// ### Panics
    /// Panics if `i` is out of bounds.
    #[inline]
    pub fn add(&mut self, i: usize, force: Vec2) {
        self.force[i] += force;
        self.count[i] += 1;
    }

    /// Net accumulated force on receiver particle `i`.
    #[inline]
    pub fn force(&self, i: usize) -> Vec2 {
        self.force[i]
    }

    /// Number of source particles that contributed to receiver particle `i`.
    #[inline]
    pub fn count(&self, i: usize) -> u32 {
        self.count[i]
    }

    /// Total number of contributions across all receiver particles.
    pub fn total_count(&self) -> u64 {
        self.count.iter().map(|&c| u64::from(c)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_len_initializes_zeroed_state() {
        let buf = ForceBuffer::with_len(5);

        assert_eq!(buf.len(), 5);
        assert!(buf.force.iter().all(|&f| f == Vec2::ZERO));
        assert!(buf.count.iter().all(|&c| c == 0));
    }

    #[test]
    fn ensure_len_clears_when_same_length() {
        let mut buf = ForceBuffer::with_len(3);
        buf.add(1, Vec2::new(1.0, 2.0));

        buf.ensure_len(3);

        assert_eq!(buf.len(), 3);
        assert_eq!(buf.force(1), Vec2::ZERO);
        assert_eq!(buf.count(1), 0);
    }

    #[test]
    fn ensure_len_resizes_and_clears() {
        let mut buf = ForceBuffer::with_len(2);
        buf.add(0, Vec2::new(1.0, 0.0));

        buf.ensure_len(4);
        assert_eq!(buf.len(), 4);
        assert_eq!(buf.total_count(), 0);

        buf.ensure_len(1);
        assert_eq!(buf.len(), 1);
        assert_eq!(buf.force(0), Vec2::ZERO);
    }

    #[test]
    fn add_accumulates_force_and_count() {
        let mut buf = ForceBuffer::with_len(2);

        buf.add(1, Vec2::new(1.0, 0.0));
        buf.add(1, Vec2::new(0.5, -2.0));

        assert_eq!(buf.force(1), Vec2::new(1.5, -2.0));
        assert_eq!(buf.count(1), 2);
        assert_eq!(buf.count(0), 0);
        assert_eq!(buf.total_count(), 2);
    }
}
