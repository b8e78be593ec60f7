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

use std::collections::HashMap;
use tracing::{debug, warn};

pub type FrameId = usize;

// Nodes live in an arena and are linked by slot index; list heads hold the
// most recently accessed frame, tails the least recently accessed.
struct Node {
    frame_id: FrameId,
    access_count: usize,
    evictable: bool,
    prev: Option<usize>,
    next: Option<usize>,
}

#[derive(Default)]
struct List {
    head: Option<usize>,
    tail: Option<usize>,
}

pub struct LruKReplacer {
    k: usize,
    capacity: usize,
    slots: Vec<Option<Node>>,
    free_slots: Vec<usize>,
    history: List,
    buffer: List,
    history_index: HashMap<FrameId, usize>,
    buffer_index: HashMap<FrameId, usize>,
    evictable_count: usize,
}

impl LruKReplacer {
    pub fn new(capacity: usize, k: usize) -> Self {
        Self {
            k: k.max(1),
            capacity,
            slots: Vec::with_capacity(capacity),
            free_slots: Vec::new(),
            history: List::default(),
            buffer: List::default(),
            history_index: HashMap::new(),
            buffer_index: HashMap::new(),
            evictable_count: 0,
        }
    }

    pub fn record_access(&mut self, frame_id: FrameId) {
        if frame_id >= self.capacity {
            warn!(frame_id, capacity = self.capacity, "access to frame id outside [0, capacity) ignored");
            return;
        }

        let slot = match self.find_slot(frame_id) {
            Some(slot) => slot,
            None => {
                if self.history_index.len() + self.buffer_index.len() == self.capacity {
                    warn!(frame_id, capacity = self.capacity, "replacer already tracks capacity frames; access dropped");
                    return;
                }
                let slot = self.alloc_slot(frame_id);
                Self::push_front(&mut self.history, &mut self.slots, slot);
                self.history_index.insert(frame_id, slot);
                slot
            }
        };

        let access_count = {
            let node = self.node_mut(slot);
            node.access_count += 1;
            node.access_count
        };

        if access_count == self.k {
            // The kth access migrates the node from history to buffer;
            // it never returns.
            Self::unlink(&mut self.history, &mut self.slots, slot);
            self.history_index.remove(&frame_id);
            Self::push_front(&mut self.buffer, &mut self.slots, slot);
            self.buffer_index.insert(frame_id, slot);
        } else if access_count > self.k {
            Self::unlink(&mut self.buffer, &mut self.slots, slot);
            Self::push_front(&mut self.buffer, &mut self.slots, slot);
        } else if access_count > 1 {
            Self::unlink(&mut self.history, &mut self.slots, slot);
            Self::push_front(&mut self.history, &mut self.slots, slot);
        }
    }

    pub fn set_evictable(&mut self, frame_id: FrameId, evictable: bool) {
        let Some(slot) = self.find_slot(frame_id) else {
            return;
        };
        let node = self.node_mut(slot);
        if node.evictable == evictable {
            return;
        }
        node.evictable = evictable;
        if evictable {
            self.evictable_count += 1;
        } else {
            self.evictable_count -= 1;
        }
    }

    pub fn remove(&mut self, frame_id: FrameId) {
        let Some(slot) = self.find_slot(frame_id) else {
            return;
        };
        if !self.node(slot).evictable {
            debug!(frame_id, "remove of a non-evictable frame ignored");
            return;
        }

        if self.history_index.remove(&frame_id).is_some() {
            Self::unlink(&mut self.history, &mut self.slots, slot);
        } else {
            self.buffer_index.remove(&frame_id);
            Self::unlink(&mut self.buffer, &mut self.slots, slot);
        }
        self.evictable_count -= 1;
        self.release_slot(slot);
    }

    // Frames with fewer than k references have infinite backward k-distance,
    // so the history list is drained before the buffer list; within a list
    // the tail holds the earliest most-recent access.
    pub fn evict(&mut self) -> Option<FrameId> {
        if self.evictable_count == 0 {
            return None;
        }

        let (slot, in_history) = match Self::last_evictable(&self.history, &self.slots) {
            Some(slot) => (slot, true),
            None => (Self::last_evictable(&self.buffer, &self.slots)?, false),
        };

        let frame_id = self.node(slot).frame_id;
        if in_history {
            Self::unlink(&mut self.history, &mut self.slots, slot);
            self.history_index.remove(&frame_id);
        } else {
            Self::unlink(&mut self.buffer, &mut self.slots, slot);
            self.buffer_index.remove(&frame_id);
        }
        self.evictable_count -= 1;
        self.release_slot(slot);
        debug!(frame_id, in_history, "evicted frame");
        Some(frame_id)
    }

    pub fn size(&self) -> usize {
        self.evictable_count
    }

    fn find_slot(&self, frame_id: FrameId) -> Option<usize> {
        self.history_index
            .get(&frame_id)
            .or_else(|| self.buffer_index.get(&frame_id))
            .copied()
    }

    fn alloc_slot(&mut self, frame_id: FrameId) -> usize {
        let node = Node {
            frame_id,
            access_count: 0,
            evictable: false,
            prev: None,
            next: None,
        };
        match self.free_slots.pop() {
            Some(slot) => {
                self.slots[slot] = Some(node);
                slot
            }
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            }
        }
    }

    fn release_slot(&mut self, slot: usize) {
        self.slots[slot] = None;
        self.free_slots.push(slot);
    }

    fn node(&self, slot: usize) -> &Node {
        self.slots[slot].as_ref().expect("occupied slot")
    }

    fn node_mut(&mut self, slot: usize) -> &mut Node {
        self.slots[slot].as_mut().expect("occupied slot")
    }

    fn push_front(list: &mut List, slots: &mut [Option<Node>], slot: usize) {
        let old_head = list.head;
        {
            let node = slots[slot].as_mut().expect("occupied slot");
            node.prev = None;
            node.next = old_head;
        }
        match old_head {
            Some(head) => slots[head].as_mut().expect("occupied slot").prev = Some(slot),
            None => list.tail = Some(slot),
        }
        list.head = Some(slot);
    }

    fn unlink(list: &mut List, slots: &mut [Option<Node>], slot: usize) {
        let (prev, next) = {
            let node = slots[slot].as_ref().expect("occupied slot");
            (node.prev, node.next)
        };
        match prev {
            Some(prev) => slots[prev].as_mut().expect("occupied slot").next = next,
            None => list.head = next,
        }
        match next {
            Some(next) => slots[next].as_mut().expect("occupied slot").prev = prev,
            None => list.tail = prev,
        }
        let node = slots[slot].as_mut().expect("occupied slot");
        node.prev = None;
        node.next = None;
    }

    fn last_evictable(list: &List, slots: &[Option<Node>]) -> Option<usize> {
        let mut cursor = list.tail;
        while let Some(slot) = cursor {
            let node = slots[slot].as_ref().expect("occupied slot");
            if node.evictable {
                return Some(slot);
            }
            cursor = node.prev;
        }
        None
    }
}
