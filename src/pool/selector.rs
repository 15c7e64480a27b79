//! Weighted round-robin uplink selection
//!
//! The pool owns the uplink list and the rotation cursor. The cursor is only
//! reachable through [`UplinkPool::select`], which does O(1) arithmetic under
//! a mutex and never touches the network.

use super::Uplink;
use crate::error::DispatchError;
use std::sync::{Arc, Mutex};

/// Rotation state guarded by the pool mutex
#[derive(Debug, Default)]
struct Cursor {
    /// Uplink that receives the next selection
    index: usize,
    /// Selections already handed to `index` in the current turn.
    /// Every other uplink's count is zero, so one counter suffices.
    used: u32,
}

/// Ordered set of uplinks with a shared rotation cursor
#[derive(Debug)]
pub struct UplinkPool {
    uplinks: Vec<Arc<Uplink>>,
    cursor: Mutex<Cursor>,
}

impl UplinkPool {
    /// Create a pool from validated uplinks
    ///
    /// Fails when the list is empty or any weight is zero.
    pub fn new(uplinks: Vec<Uplink>) -> Result<Self, DispatchError> {
        if uplinks.is_empty() {
            return Err(DispatchError::Config(
                "Please specify one or more uplinks".to_string(),
            ));
        }

        if let Some(uplink) = uplinks.iter().find(|u| u.weight() == 0) {
            return Err(DispatchError::Config(format!(
                "Invalid contention ratio for {}",
                uplink
            )));
        }

        Ok(UplinkPool {
            uplinks: uplinks.into_iter().map(Arc::new).collect(),
            cursor: Mutex::new(Cursor::default()),
        })
    }

    /// Pick the uplink for the next session
    ///
    /// Uplink `i` is returned `weight(i)` times in a row before the cursor
    /// advances to `i + 1`, wrapping at the end of the list.
    pub fn select(&self) -> Arc<Uplink> {
        // The guarded state is two integers, so a poisoned lock is still usable.
        let mut cursor = self.cursor.lock().unwrap_or_else(|e| e.into_inner());

        let uplink = &self.uplinks[cursor.index];
        cursor.used += 1;

        if cursor.used == uplink.weight() {
            cursor.used = 0;
            cursor.index = (cursor.index + 1) % self.uplinks.len();
        }

        Arc::clone(uplink)
    }

    /// Number of uplinks
    pub fn len(&self) -> usize {
        self.uplinks.len()
    }

    /// Always false for a constructed pool
    pub fn is_empty(&self) -> bool {
        self.uplinks.is_empty()
    }

    /// Iterate over the uplinks in rotation order
    pub fn iter(&self) -> impl Iterator<Item = &Uplink> {
        self.uplinks.iter().map(|u| u.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::net::{Ipv4Addr, SocketAddrV4};

    fn uplink(last_octet: u8, weight: u32) -> Uplink {
        Uplink::bind(
            SocketAddrV4::new(Ipv4Addr::new(10, 0, 0, last_octet), 0),
            weight,
        )
    }

    fn last_octet(uplink: &Uplink) -> u8 {
        match uplink.local_addr() {
            Some(std::net::SocketAddr::V4(addr)) => addr.ip().octets()[3],
            _ => panic!("Expected IPv4 local address"),
        }
    }

    #[test]
    fn test_empty_pool_rejected() {
        let result = UplinkPool::new(Vec::new());
        assert!(matches!(result, Err(DispatchError::Config(_))));
    }

    #[test]
    fn test_zero_weight_rejected() {
        let result = UplinkPool::new(vec![uplink(1, 1), uplink(2, 0)]);
        match result {
            Err(DispatchError::Config(msg)) => assert!(msg.contains("10.0.0.2")),
            other => panic!("Expected config error, got {:?}", other),
        }
    }

    #[test]
    fn test_weighted_cycle_order() {
        let pool = UplinkPool::new(vec![uplink(1, 2), uplink(2, 1), uplink(3, 3)]).unwrap();

        let expected = [1, 1, 2, 3, 3, 3];
        for _cycle in 0..3 {
            let picked: Vec<u8> = (0..expected.len())
                .map(|_| last_octet(&pool.select()))
                .collect();
            assert_eq!(picked, expected);
        }
    }

    #[test]
    fn test_equal_weights_alternate() {
        let pool = UplinkPool::new(vec![uplink(1, 1), uplink(2, 1)]).unwrap();

        let picked: Vec<u8> = (0..6).map(|_| last_octet(&pool.select())).collect();
        assert_eq!(picked, vec![1, 2, 1, 2, 1, 2]);
    }

    #[test]
    fn test_single_uplink_always_selected() {
        for weight in [1, 2, 7] {
            let pool = UplinkPool::new(vec![uplink(9, weight)]).unwrap();
            for _ in 0..20 {
                assert_eq!(last_octet(&pool.select()), 9);
            }
        }
    }

    #[test]
    fn test_concurrent_selection_counts() {
        let pool = Arc::new(UplinkPool::new(vec![uplink(1, 3), uplink(2, 1)]).unwrap());

        // 8 threads x 100 selections = 200 full cycles of 4
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let pool = Arc::clone(&pool);
                std::thread::spawn(move || {
                    (0..100)
                        .map(|_| last_octet(&pool.select()))
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut counts: HashMap<u8, usize> = HashMap::new();
        for handle in handles {
            for octet in handle.join().unwrap() {
                *counts.entry(octet).or_default() += 1;
            }
        }

        assert_eq!(counts[&1], 600);
        assert_eq!(counts[&2], 200);

        // Cursor is back at the start of a cycle
        assert_eq!(last_octet(&pool.select()), 1);
    }

    #[test]
    fn test_len_and_iter() {
        let pool = UplinkPool::new(vec![uplink(1, 1), uplink(2, 4)]).unwrap();
        assert_eq!(pool.len(), 2);
        assert!(!pool.is_empty());

        let weights: Vec<u32> = pool.iter().map(|u| u.weight()).collect();
        assert_eq!(weights, vec![1, 4]);
    }
}
