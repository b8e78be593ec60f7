/*
 * Copyright 2026 FramePool Authors
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 * http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

use crate::error::{FramePoolError, Result};
use parking_lot::{Mutex, RwLock};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

const MAX_GLOBAL_DEPTH: usize = 24;

struct BucketState<K, V> {
    entries: Vec<(K, V)>,
    local_depth: usize,
}

struct Bucket<K, V> {
    state: RwLock<BucketState<K, V>>,
}

impl<K, V> Bucket<K, V> {
    fn with_depth(local_depth: usize) -> Arc<Self> {
        Arc::new(Self {
            state: RwLock::new(BucketState {
                entries: Vec::new(),
                local_depth,
            }),
        })
    }
}

struct Directory<K, V> {
    slots: Vec<Arc<Bucket<K, V>>>,
    global_depth: usize,
    num_buckets: usize,
}

// Directory slots whose indices are congruent modulo 2^local_depth share one
// bucket; the directory lock serializes structural change while per-bucket
// rwlocks let point operations on distinct buckets run in parallel. Lock
// order is directory then bucket, never the reverse.
pub struct ExtendibleHashTable<K, V> {
    bucket_capacity: usize,
    directory: Mutex<Directory<K, V>>,
}

impl<K: Hash + Eq, V: Clone> ExtendibleHashTable<K, V> {
    pub fn new(bucket_capacity: usize) -> Self {
        Self {
            bucket_capacity: bucket_capacity.max(1),
            directory: Mutex::new(Directory {
                slots: vec![Bucket::with_depth(0)],
                global_depth: 0,
                num_buckets: 1,
            }),
        }
    }

    pub fn find(&self, key: &K) -> Option<V> {
        let dir = self.directory.lock();
        let bucket = Arc::clone(&dir.slots[dir_index(hash_of(key), dir.global_depth)]);
        let state = bucket.state.read();
        drop(dir);

        state
            .entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }

    pub fn remove(&self, key: &K) -> bool {
        let dir = self.directory.lock();
        let bucket = Arc::clone(&dir.slots[dir_index(hash_of(key), dir.global_depth)]);
        let mut state = bucket.state.write();
        drop(dir);

        match state.entries.iter().position(|(k, _)| k == key) {
            Some(pos) => {
                state.entries.remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn insert(&self, key: K, value: V) -> Result<()> {
        let hash = hash_of(&key);
        loop {
            {
                let dir = self.directory.lock();
                let bucket = Arc::clone(&dir.slots[dir_index(hash, dir.global_depth)]);
                let mut state = bucket.state.write();
                drop(dir);

                if let Some(entry) = state.entries.iter_mut().find(|(k, _)| *k == key) {
                    entry.1 = value;
                    return Ok(());
                }
                if state.entries.len() < self.bucket_capacity {
                    state.entries.push((key, value));
                    return Ok(());
                }
                // No number of splits separates keys whose full hashes
                // collide.
                if state.entries.iter().all(|(k, _)| hash_of(k) == hash) {
                    return Err(FramePoolError::HashTableFull(format!(
                        "bucket capacity {} exceeded by identical-hash keys",
                        self.bucket_capacity
                    )));
                }
            }
            self.split(hash)?;
        }
    }

    pub fn global_depth(&self) -> usize {
        self.directory.lock().global_depth
    }

    pub fn local_depth(&self, dir_index: usize) -> usize {
        let dir = self.directory.lock();
        let bucket = Arc::clone(&dir.slots[dir_index]);
        let state = bucket.state.read();
        drop(dir);
        state.local_depth
    }

    pub fn num_buckets(&self) -> usize {
        self.directory.lock().num_buckets
    }

    fn split(&self, hash: u64) -> Result<()> {
        let mut dir = self.directory.lock();
        let index = dir_index(hash, dir.global_depth);
        let bucket = Arc::clone(&dir.slots[index]);
        let mut state = bucket.state.write();

        if state.entries.len() < self.bucket_capacity {
            // A racing insert split this bucket first; retry the fast path.
            return Ok(());
        }
        if state.local_depth == dir.global_depth && dir.global_depth == MAX_GLOBAL_DEPTH {
            return Err(FramePoolError::HashTableFull(format!(
                "directory growth past global depth {MAX_GLOBAL_DEPTH}"
            )));
        }

        state.local_depth += 1;
        let local_depth = state.local_depth;
        if local_depth > dir.global_depth {
            // Each new slot i + 2^old_global_depth starts as an alias of
            // slot i.
            let old_len = dir.slots.len();
            for i in 0..old_len {
                let alias = Arc::clone(&dir.slots[i]);
                dir.slots.push(alias);
            }
            dir.global_depth += 1;
        }

        let sibling = Bucket::with_depth(local_depth);
        let stride = 1_usize << local_depth;
        let pair = index ^ (1_usize << (local_depth - 1));
        let mut i = pair & (stride - 1);
        while i < dir.slots.len() {
            dir.slots[i] = Arc::clone(&sibling);
            i += stride;
        }
        dir.num_buckets += 1;

        let mut sibling_state = sibling.state.write();
        let moved = std::mem::take(&mut state.entries);
        for (k, v) in moved {
            let target = dir_index(hash_of(&k), dir.global_depth);
            if Arc::ptr_eq(&dir.slots[target], &sibling) {
                sibling_state.entries.push((k, v));
            } else {
                state.entries.push((k, v));
            }
        }

        Ok(())
    }
}

fn hash_of<K: Hash>(key: &K) -> u64 {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    hasher.finish()
}

fn dir_index(hash: u64, global_depth: usize) -> usize {
    (hash & ((1_u64 << global_depth) - 1)) as usize
}
