//! Emission buffer free-list.
//!
//! One marshal call owns exactly one buffer from acquisition to release;
//! the free-list only amortizes allocation across calls.

use std::sync::{Mutex, OnceLock};

/// Buffers that grew past this are dropped instead of pooled.
const MAX_POOLED_CAPACITY: usize = 1 << 20;

/// Upper bound on idle pooled buffers.
const MAX_POOLED_BUFFERS: usize = 16;

fn free_list() -> &'static Mutex<Vec<Vec<u8>>> {
    static POOL: OnceLock<Mutex<Vec<Vec<u8>>>> = OnceLock::new();
    POOL.get_or_init(|| Mutex::new(Vec::new()))
}

/// Borrows an empty emission buffer from the process-wide free-list.
pub(crate) fn acquire() -> Vec<u8> {
    if let Ok(mut free) = free_list().lock() {
        if let Some(buf) = free.pop() {
            return buf;
        }
    }
    Vec::with_capacity(512)
}

/// Returns a buffer to the free-list.
pub(crate) fn release(mut buf: Vec<u8>) {
    if buf.capacity() > MAX_POOLED_CAPACITY {
        return;
    }
    buf.clear();
    if let Ok(mut free) = free_list().lock() {
        if free.len() < MAX_POOLED_BUFFERS {
            free.push(buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn released_buffers_come_back_empty() {
        let mut buf = acquire();
        buf.extend_from_slice(b"scratch");
        release(buf);
        let buf = acquire();
        assert!(buf.is_empty());
        release(buf);
    }

    #[test]
    fn oversized_buffers_are_dropped() {
        let buf = Vec::with_capacity(MAX_POOLED_CAPACITY + 1);
        release(buf);
        let buf = acquire();
        assert!(buf.capacity() <= MAX_POOLED_CAPACITY);
        release(buf);
    }
}
