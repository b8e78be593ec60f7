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
use crate::fault;
use crate::storage::page::{Page, PageId, PAGE_SIZE};
use std::fs::{File, OpenOptions};
use std::os::unix::fs::FileExt;
use std::path::{Path, PathBuf};

pub struct DiskManager {
    db_file: File,
    db_path: PathBuf,
}

impl DiskManager {
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let db_path = path.as_ref().to_path_buf();
        let db_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&db_path)?;

        Ok(Self { db_file, db_path })
    }

    pub fn read_page(&self, page_id: PageId, page: &mut Page) -> Result<()> {
        if fault::should_fail("disk.read_page") {
            return Err(FramePoolError::Io(std::io::Error::other(
                "failpoint: disk.read_page",
            )));
        }
        let offset = page_offset(page_id);
        let buf = page.data_mut();
        let mut read = 0;
        while read < PAGE_SIZE {
            let bytes = self
                .db_file
                .read_at(&mut buf[read..], offset + read as u64)?;
            if bytes == 0 {
                break;
            }
            read += bytes;
        }

        // Pages allocated by the pool but never flushed read back as zeros.
        if read < PAGE_SIZE {
            buf[read..].fill(0);
        }

        Ok(())
    }

    pub fn write_page(&self, page_id: PageId, page: &Page) -> Result<()> {
        if fault::should_fail("disk.write_page") {
            return Err(FramePoolError::Io(std::io::Error::other(
                "failpoint: disk.write_page",
            )));
        }
        let offset = page_offset(page_id);
        let mut written = 0;
        while written < PAGE_SIZE {
            let bytes = self
                .db_file
                .write_at(&page.data()[written..], offset + written as u64)?;
            if bytes == 0 {
                return Err(FramePoolError::Io(std::io::Error::new(
                    std::io::ErrorKind::WriteZero,
                    "failed to write full page",
                )));
            }
            written += bytes;
        }

        Ok(())
    }

    pub fn sync(&self) -> Result<()> {
        if fault::should_fail("disk.sync") {
            return Err(FramePoolError::Io(std::io::Error::other(
                "failpoint: disk.sync",
            )));
        }
        self.db_file.sync_all()?;
        Ok(())
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }
}

fn page_offset(page_id: PageId) -> u64 {
    page_id as u64 * PAGE_SIZE as u64
}
