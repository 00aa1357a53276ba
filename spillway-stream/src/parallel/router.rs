// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

/// Round-robin slot cursor.
#[derive(Debug, Default)]
pub(crate) struct Router {
    next: usize,
}

impl Router {
    /// The slot for the next element; the first element goes to slot 0.
    pub(crate) fn next_slot(&mut self, pool_size: usize) -> usize {
        let slot = self.next;
        self.next = (slot + 1) % pool_size;
        slot
    }
}

#[cfg(test)]
mod tests {
    use super::Router;

    #[test]
    fn test_cycles_through_slots_and_wraps() {
        let mut router = Router::default();
        let slots: Vec<_> = (0..7).map(|_| router.next_slot(3)).collect();
        assert_eq!(slots, vec![0, 1, 2, 0, 1, 2, 0]);
    }

    #[test]
    fn test_single_slot_always_zero() {
        let mut router = Router::default();
        assert!((0..4).all(|_| router.next_slot(1) == 0));
    }
}
