
use crossbeam::queue::SegQueue;
use parking_lot::Mutex;
use rand::Rng;
use rand::seq::SliceRandom;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tracing::{debug, info, warn};
use crate::corpus::{Corpus, DocumentTerms};

/// Streams the corpus to the workers in shuffled chunks.
///
/// Chunk start offsets are shuffled once per cycle; documents inside a chunk
/// keep their index order. This gives an approximate random order without
/// shuffling the whole corpus or seeking all over the index.
pub struct DocumentQueue<C> {
    corpus: Arc<C>,
    fields: Vec<String>,
    chunk_size: usize,
    queue: SegQueue<DocumentTerms>,
    start_points: SegQueue<usize>,
    queued: AtomicUsize,
    exhausted: AtomicBool,
    refill: Mutex<()>,
}

/// Chunks shrink to a tenth of a small corpus so it is still read in several shuffled pieces.
pub fn effective_chunk_size(requested: usize, num_docs: usize) -> usize {
    if requested > num_docs {
        (num_docs / 10).max(1)
    } else {
        requested
    }
}

impl<C: Corpus> DocumentQueue<C> {

    pub fn new(corpus: Arc<C>, fields: Vec<String>, requested_chunk_size: usize) -> DocumentQueue<C> {
        let chunk_size = effective_chunk_size(requested_chunk_size, corpus.num_docs());
        DocumentQueue {
            corpus,
            fields,
            chunk_size,
            queue: SegQueue::new(),
            start_points: SegQueue::new(),
            queued: AtomicUsize::new(0),
            exhausted: AtomicBool::new(false),
            refill: Mutex::new(()),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Starts a new cycle: fresh shuffled start points, empty queue, counters reset.
    pub fn reset<R: Rng + ?Sized>(&self, rng: &mut R) {

        let _guard = self.refill.lock();

        while self.queue.pop().is_some() {}
        while self.start_points.pop().is_some() {}

        let num_docs = self.corpus.num_docs();
        let mut starts: Vec<usize> = (0..num_docs).step_by(self.chunk_size).collect();
        starts.shuffle(rng);
        for start in starts {
            self.start_points.push(start);
        }

        self.queued.store(0, Ordering::SeqCst);
        self.exhausted.store(false, Ordering::SeqCst);
    }

    /// Loads the next chunk, or marks the queue exhausted once nothing is left to load or draw.
    pub fn populate(&self) {
        let _guard = self.refill.lock();
        self.populate_locked();
    }

    fn populate_locked(&self) {

        let num_docs = self.corpus.num_docs();
        let start = if self.queued.load(Ordering::SeqCst) >= num_docs {
            None
        } else {
            self.start_points.pop()
        };

        let start = match start {
            Some(start) => start,
            None => {
                if self.queue.is_empty() {
                    self.exhausted.store(true, Ordering::SeqCst);
                }
                return;
            }
        };

        let stop = (start + self.chunk_size).min(num_docs);
        let mut added = 0;
        for doc_id in start..stop {
            self.queued.fetch_add(1, Ordering::SeqCst);
            for field in &self.fields {
                match self.corpus.term_vector(doc_id, field) {
                    Ok(Some(terms)) => {
                        self.queue.push(DocumentTerms { doc_id, field: field.to_owned(), terms });
                        added += 1;
                    }
                    Ok(None) => debug!("no term positions for document {} field {}", doc_id, field),
                    Err(e) => warn!("skipping document {}: {}", doc_id, e),
                }
            }
        }

        if added > 0 {
            info!("queued {} documents from chunk starting at {}", added, start);
        }
    }

    /// Pops a document, refilling first when the queue has run dry.
    /// `None` means nothing could be drawn; check `is_exhausted` to tell a
    /// finished cycle from a momentary gap.
    pub fn take_or_refill(&self) -> Option<DocumentTerms> {

        if let Some(document) = self.queue.pop() {
            return Some(document);
        }

        let _guard = self.refill.lock();
        // another worker may have refilled while this one waited
        if let Some(document) = self.queue.pop() {
            return Some(document);
        }
        self.populate_locked();
        self.queue.pop()
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn remaining_chunks(&self) -> usize {
        self.start_points.len()
    }

    pub fn documents_queued(&self) -> usize {
        self.queued.load(Ordering::SeqCst)
    }
}
