//! Process-wide buffer/interpretation registry: deduplicates buffers by
//! canonical path and interpretations by encoding name, using weak
//! references so the registry never keeps a buffer alive on its own.
//!
//! Grounded on the teacher's `document::manager::DocumentManager` (path
//! dedup via `canonicalize`, integer-id allocation for unnamed documents),
//! generalized from owning `HashMap<DocumentId, Document>` to holding weak
//! references per §4.10 and §9 ("Global state... a single explicit object
//! passed by reference, not a hidden singleton"). There is no `Drop` hook
//! wired back into `Buffer`/`Interpretation` to evict entries eagerly (that
//! would need a back-reference from every buffer to the registry, a cycle
//! this design avoids) — dead weak references are pruned lazily, on the
//! next lookup or explicit [`Registry::collect_garbage`] call.

use std::collections::BTreeSet;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::{Rc, Weak};

use crate::buffer::{Buffer, BufferHandle, Identity};
use crate::encoding::Encoding;
use crate::error::Result;
use crate::interpretation::Interpretation;

pub type InterpretationHandle = Rc<std::cell::RefCell<Interpretation>>;

#[derive(Default)]
pub struct Registry {
    by_path: HashMap<PathBuf, Weak<std::cell::RefCell<Buffer>>>,
    unnamed: Vec<Weak<std::cell::RefCell<Buffer>>>,
    free_unnamed_ids: BTreeSet<u64>,
    interpretations: HashMap<Identity, HashMap<&'static str, Weak<std::cell::RefCell<Interpretation>>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the buffer at `path`, returning the existing shared handle if
    /// one is already live; otherwise reads the file and publishes it.
    pub fn open(&mut self, path: impl AsRef<Path>) -> Result<BufferHandle> {
        let path = path.as_ref();
        let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        if let Some(existing) = self.by_path.get(&canonical).and_then(Weak::upgrade) {
            return Ok(existing);
        }
        let buffer = Buffer::from_path(path)?;
        self.by_path.insert(canonical, Rc::downgrade(&buffer));
        Ok(buffer)
    }

    /// Create a fresh unnamed buffer, recycling the lowest free id if one
    /// is available from a previously-collected unnamed buffer.
    pub fn new_unnamed(&mut self) -> BufferHandle {
        let id = match self.free_unnamed_ids.pop_first() {
            Some(id) => id,
            None => self.unnamed.len() as u64,
        };
        let buffer = Buffer::new_unnamed(id);
        let slot = Rc::downgrade(&buffer);
        if (id as usize) < self.unnamed.len() {
            self.unnamed[id as usize] = slot;
        } else {
            debug_assert_eq!(id as usize, self.unnamed.len());
            self.unnamed.push(slot);
        }
        buffer
    }

    /// Return (or build, deduplicated by `buffer`'s identity and the
    /// encoding's name) the shared interpretation of `buffer` under
    /// `encoding`.
    pub fn interpretation(&mut self, buffer: &BufferHandle, encoding: Box<dyn Encoding>) -> InterpretationHandle {
        let identity = buffer.borrow().identity().clone();
        let name = encoding.name();
        if let Some(existing) = self
            .interpretations
            .get(&identity)
            .and_then(|by_encoding| by_encoding.get(name))
            .and_then(Weak::upgrade)
        {
            return existing;
        }
        let interp = Rc::new(std::cell::RefCell::new(Interpretation::new(buffer.clone(), encoding)));
        self.interpretations
            .entry(identity)
            .or_default()
            .insert(name, Rc::downgrade(&interp));
        interp
    }

    /// Prune dead weak references and recycle the unnamed ids they held.
    pub fn collect_garbage(&mut self) {
        self.by_path.retain(|_, w| w.strong_count() > 0);
        for (id, slot) in self.unnamed.iter_mut().enumerate() {
            if slot.strong_count() == 0 {
                self.free_unnamed_ids.insert(id as u64);
            }
        }
        self.interpretations.retain(|_, by_encoding| {
            by_encoding.retain(|_, w| w.strong_count() > 0);
            !by_encoding.is_empty()
        });
    }

    pub fn open_buffer_count(&self) -> usize {
        self.by_path.values().filter(|w| w.strong_count() > 0).count()
            + self.unnamed.iter().filter(|w| w.strong_count() > 0).count()
    }
}
