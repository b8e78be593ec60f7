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

pub mod container;
pub mod error;
pub mod fault;
pub mod storage;

pub use container::extendible_hash::ExtendibleHashTable;
pub use error::{FramePoolError, Result};
pub use storage::buffer_pool::{
    BufferPool, BufferPoolStats, PageHandle, DEFAULT_BUCKET_CAPACITY, DEFAULT_REPLACER_K,
};
pub use storage::disk_manager::DiskManager;
pub use storage::page::{Page, PageId, INVALID_PAGE_ID, PAGE_SIZE};
pub use storage::replacer::{FrameId, LruKReplacer};

use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone, Copy)]
pub struct OpenOptions {
    pub pool_size: usize,
    pub replacer_k: usize,
    pub bucket_capacity: usize,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            pool_size: 256,
            replacer_k: DEFAULT_REPLACER_K,
            bucket_capacity: DEFAULT_BUCKET_CAPACITY,
        }
    }
}

pub struct FramePool {
    disk_manager: Arc<DiskManager>,
    buffer_pool: Arc<BufferPool>,
}

impl FramePool {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path, OpenOptions::default())
    }

    pub fn open_with(path: impl AsRef<Path>, opts: OpenOptions) -> Result<Self> {
        let db_file = resolve_db_file(path.as_ref());
        if let Some(parent) = db_file.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let disk_manager = Arc::new(DiskManager::new(&db_file)?);
        let buffer_pool = Arc::new(BufferPool::with_config(
            opts.pool_size,
            Arc::clone(&disk_manager),
            opts.replacer_k,
            opts.bucket_capacity,
        ));
        Ok(Self {
            disk_manager,
            buffer_pool,
        })
    }

    pub fn pool(&self) -> &Arc<BufferPool> {
        &self.buffer_pool
    }

    pub fn disk(&self) -> &Arc<DiskManager> {
        &self.disk_manager
    }
}

impl Drop for FramePool {
    fn drop(&mut self) {
        let _ = self.buffer_pool.flush_all();
    }
}

fn resolve_db_file(path: &Path) -> PathBuf {
    if path.extension().is_some() {
        path.to_path_buf()
    } else {
        path.join("framepool.data")
    }
}
