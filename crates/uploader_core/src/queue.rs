use std::path::{Path, PathBuf};

use crate::{ItemStatus, RunSummary, TransferItem, TransitionError};

/// Ordered upload queue. Membership and order are fixed once built; only the
/// per-item status changes while a run owns the queue.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TransferQueue {
    items: Vec<TransferItem>,
}

impl TransferQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a queue in selection order, deriving each remote path from
    /// `remote_dir` and the local file name.
    pub fn from_paths<I, P>(paths: I, remote_dir: &str) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let mut queue = Self::new();
        for path in paths {
            let local_path = path.into();
            let remote_path = remote_path_for(&local_path, remote_dir);
            queue.push(local_path, remote_path);
        }
        queue
    }

    pub fn push(&mut self, local_path: PathBuf, remote_path: String) -> usize {
        let index = self.items.len();
        self.items.push(TransferItem {
            index,
            local_path,
            remote_path,
            status: ItemStatus::Pending,
        });
        index
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&TransferItem> {
        self.items.get(index)
    }

    pub fn items(&self) -> &[TransferItem] {
        &self.items
    }

    pub fn into_items(self) -> Vec<TransferItem> {
        self.items
    }

    pub fn set_status(
        &mut self,
        index: usize,
        next: ItemStatus,
    ) -> Result<&TransferItem, TransitionError> {
        let item = self
            .items
            .get_mut(index)
            .ok_or(TransitionError::UnknownItem(index))?;
        if !item.status.can_become(next) {
            return Err(TransitionError::Item {
                index,
                from: item.status,
                to: next,
            });
        }
        item.status = next;
        Ok(item)
    }

    /// Marks every unresolved item from `from` onwards as skipped and returns
    /// how many changed.
    pub fn skip_remaining(&mut self, from: usize) -> usize {
        let mut skipped = 0;
        for item in self.items.iter_mut().skip(from) {
            if !item.status.is_resolved() {
                item.status = ItemStatus::Skipped;
                skipped += 1;
            }
        }
        skipped
    }

    pub fn count(&self, status: ItemStatus) -> usize {
        self.items.iter().filter(|item| item.status == status).count()
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            total: self.items.len(),
            succeeded: self.count(ItemStatus::Succeeded),
            failed: self.count(ItemStatus::Failed),
            skipped: self.count(ItemStatus::Skipped),
            pending: self.count(ItemStatus::Pending) + self.count(ItemStatus::InProgress),
        }
    }
}

/// Remote destination for `local`: `remote_dir/<file name>`, or the bare file
/// name when no remote directory is configured.
pub fn remote_path_for(local: &Path, remote_dir: &str) -> String {
    let name = local
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let dir = remote_dir.trim_end_matches('/');
    if dir.is_empty() {
        if remote_dir.starts_with('/') {
            format!("/{name}")
        } else {
            name
        }
    } else {
        format!("{dir}/{name}")
    }
}
