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

use crate::container::extendible_hash::ExtendibleHashTable;
use crate::error::{FramePoolError, Result};
use crate::storage::disk_manager::DiskManager;
use crate::storage::page::{Page, PageId, INVALID_PAGE_ID};
use crate::storage::replacer::{FrameId, LruKReplacer};
use parking_lot::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::debug;

pub const DEFAULT_REPLACER_K: usize = 2;
pub const DEFAULT_BUCKET_CAPACITY: usize = 8;

// Page bytes sit behind a per-frame rwlock shared with handle holders; all
// other frame state is guarded by the coordinator lock.
struct Frame {
    data: Arc<RwLock<Page>>,
    page_id: Option<PageId>,
    pin_count: u32,
    is_dirty: bool,
}

impl Frame {
    fn empty() -> Self {
        Self {
            data: Arc::new(RwLock::new(Page::default())),
            page_id: None,
            pin_count: 0,
            is_dirty: false,
        }
    }
}

struct PoolState {
    frames: Vec<Frame>,
    free_list: VecDeque<FrameId>,
    next_page_id: PageId,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BufferPoolStats {
    pub pool_size: usize,
    pub cached_pages: usize,
    pub pinned_frames: usize,
    pub dirty_frames: usize,
    pub free_frames: usize,
}

pub struct BufferPool {
    pool_size: usize,
    state: Mutex<PoolState>,
    page_table: ExtendibleHashTable<PageId, FrameId>,
    replacer: Mutex<LruKReplacer>,
    disk_manager: Arc<DiskManager>,
}

impl BufferPool {
    pub fn new(pool_size: usize, disk_manager: Arc<DiskManager>) -> Self {
        Self::with_config(
            pool_size,
            disk_manager,
            DEFAULT_REPLACER_K,
            DEFAULT_BUCKET_CAPACITY,
        )
    }

    pub fn with_config(
        pool_size: usize,
        disk_manager: Arc<DiskManager>,
        replacer_k: usize,
        bucket_capacity: usize,
    ) -> Self {
        let mut free_list = VecDeque::with_capacity(pool_size);
        let mut frames = Vec::with_capacity(pool_size);
        for frame_id in 0..pool_size {
            free_list.push_back(frame_id);
            frames.push(Frame::empty());
        }

        Self {
            pool_size,
            state: Mutex::new(PoolState {
                frames,
                free_list,
                next_page_id: 0,
            }),
            page_table: ExtendibleHashTable::new(bucket_capacity),
            replacer: Mutex::new(LruKReplacer::new(pool_size, replacer_k)),
            disk_manager,
        }
    }

    pub fn new_page(&self) -> Result<PageHandle> {
        let mut state = self.state.lock();
        let frame_id = self.acquire_frame(&mut state)?;

        let page_id = state.next_page_id;
        state.next_page_id += 1;

        let frame = &mut state.frames[frame_id];
        frame.page_id = Some(page_id);
        frame.pin_count = 1;
        frame.is_dirty = false;
        let data = Arc::clone(&frame.data);

        if let Err(err) = self.page_table.insert(page_id, frame_id) {
            let frame = &mut state.frames[frame_id];
            frame.page_id = None;
            frame.pin_count = 0;
            state.free_list.push_front(frame_id);
            return Err(err);
        }

        let mut replacer = self.replacer.lock();
        replacer.record_access(frame_id);
        replacer.set_evictable(frame_id, false);
        debug!(page_id, frame_id, "created page");

        Ok(PageHandle { page_id, data })
    }

    pub fn fetch_page(&self, page_id: PageId) -> Result<PageHandle> {
        if page_id == INVALID_PAGE_ID {
            return Err(FramePoolError::PageNotFound(page_id));
        }

        let mut state = self.state.lock();
        if let Some(frame_id) = self.page_table.find(&page_id) {
            let frame = &mut state.frames[frame_id];
            if frame.page_id != Some(page_id) {
                return Err(FramePoolError::Corruption(format!(
                    "page table maps page {page_id} to frame {frame_id} holding {:?}",
                    frame.page_id
                )));
            }

            frame.pin_count += 1;
            let first_pin = frame.pin_count == 1;
            let data = Arc::clone(&frame.data);

            let mut replacer = self.replacer.lock();
            replacer.record_access(frame_id);
            if first_pin {
                replacer.set_evictable(frame_id, false);
            }

            return Ok(PageHandle { page_id, data });
        }

        let frame_id = self.acquire_frame(&mut state)?;
        let read_result = {
            let frame = &state.frames[frame_id];
            let mut page = frame.data.write();
            self.disk_manager.read_page(page_id, &mut page)
        };
        if let Err(err) = read_result {
            state.free_list.push_front(frame_id);
            return Err(err);
        }

        {
            let frame = &mut state.frames[frame_id];
            frame.page_id = Some(page_id);
            frame.pin_count = 1;
            frame.is_dirty = false;
        }

        if let Err(err) = self.page_table.insert(page_id, frame_id) {
            let frame = &mut state.frames[frame_id];
            frame.page_id = None;
            frame.pin_count = 0;
            state.free_list.push_front(frame_id);
            return Err(err);
        }

        let data = Arc::clone(&state.frames[frame_id].data);
        let mut replacer = self.replacer.lock();
        replacer.record_access(frame_id);
        replacer.set_evictable(frame_id, false);
        debug!(page_id, frame_id, "fetched page from disk");

        Ok(PageHandle { page_id, data })
    }

    pub fn unpin_page(&self, page_id: PageId, is_dirty: bool) -> Result<()> {
        let mut state = self.state.lock();
        let frame_id = self
            .page_table
            .find(&page_id)
            .ok_or(FramePoolError::PageNotFound(page_id))?;

        let frame = &mut state.frames[frame_id];
        if frame.pin_count == 0 {
            return Err(FramePoolError::PageNotPinned(page_id));
        }

        if is_dirty {
            frame.is_dirty = true;
        }

        frame.pin_count -= 1;
        if frame.pin_count == 0 {
            self.replacer.lock().set_evictable(frame_id, true);
        }
        Ok(())
    }

    pub fn flush_page(&self, page_id: PageId) -> Result<()> {
        if page_id == INVALID_PAGE_ID {
            return Err(FramePoolError::PageNotFound(page_id));
        }

        let mut state = self.state.lock();
        let frame_id = self
            .page_table
            .find(&page_id)
            .ok_or(FramePoolError::PageNotFound(page_id))?;

        let frame = &mut state.frames[frame_id];
        {
            let page = frame.data.read();
            self.disk_manager.write_page(page_id, &page)?;
        }
        frame.is_dirty = false;
        Ok(())
    }

    pub fn flush_all(&self) -> Result<()> {
        let mut state = self.state.lock();
        for frame in state.frames.iter_mut() {
            if let Some(page_id) = frame.page_id {
                {
                    let page = frame.data.read();
                    self.disk_manager.write_page(page_id, &page)?;
                }
                frame.is_dirty = false;
            }
        }

        self.disk_manager.sync()?;
        Ok(())
    }

    pub fn delete_page(&self, page_id: PageId) -> Result<()> {
        let mut state = self.state.lock();
        let Some(frame_id) = self.page_table.find(&page_id) else {
            return Ok(());
        };

        let frame = &mut state.frames[frame_id];
        if frame.pin_count > 0 {
            return Err(FramePoolError::PagePinned(page_id));
        }
        if frame.is_dirty {
            let page = frame.data.read();
            self.disk_manager.write_page(page_id, &page)?;
        }

        self.page_table.remove(&page_id);
        self.replacer.lock().remove(frame_id);

        let frame = &mut state.frames[frame_id];
        frame.page_id = None;
        frame.is_dirty = false;
        frame.data.write().reset();
        state.free_list.push_back(frame_id);
        debug!(page_id, frame_id, "deleted page");
        Ok(())
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    pub fn stats(&self) -> BufferPoolStats {
        let state = self.state.lock();
        let mut stats = BufferPoolStats {
            pool_size: self.pool_size,
            free_frames: state.free_list.len(),
            ..Default::default()
        };
        for frame in &state.frames {
            if frame.page_id.is_some() {
                stats.cached_pages += 1;
            }
            if frame.pin_count > 0 {
                stats.pinned_frames += 1;
            }
            if frame.is_dirty {
                stats.dirty_frames += 1;
            }
        }
        stats
    }

    pub fn disk_path(&self) -> &std::path::Path {
        self.disk_manager.db_path()
    }

    fn acquire_frame(&self, state: &mut PoolState) -> Result<FrameId> {
        if let Some(frame_id) = state.free_list.pop_front() {
            return Ok(frame_id);
        }

        let victim = self
            .replacer
            .lock()
            .evict()
            .ok_or(FramePoolError::PoolExhausted)?;

        let frame = &mut state.frames[victim];
        if let Some(old_page_id) = frame.page_id {
            if frame.is_dirty {
                let page = frame.data.read();
                if let Err(err) = self.disk_manager.write_page(old_page_id, &page) {
                    drop(page);
                    // The victim is still resident and unpinned; re-register
                    // it so the frame stays visible to the replacer.
                    let mut replacer = self.replacer.lock();
                    replacer.record_access(victim);
                    replacer.set_evictable(victim, true);
                    return Err(err);
                }
            }
            self.page_table.remove(&old_page_id);
            debug!(old_page_id, frame_id = victim, "evicted resident page");
        }

        let frame = &mut state.frames[victim];
        frame.page_id = None;
        frame.pin_count = 0;
        frame.is_dirty = false;
        frame.data.write().reset();
        Ok(victim)
    }
}

// Holders read and write page bytes between a successful fetch and the
// matching unpin; the pin count keeps the frame from being recycled. Every
// successful new_page/fetch_page must be balanced by exactly one unpin_page,
// and guards must be dropped before calling back into the pool.
#[derive(Debug)]
pub struct PageHandle {
    page_id: PageId,
    data: Arc<RwLock<Page>>,
}

impl PageHandle {
    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    pub fn read(&self) -> RwLockReadGuard<'_, Page> {
        self.data.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, Page> {
        self.data.write()
    }
}
