use std::{ops::RangeBounds, sync::Arc, sync::Mutex};

/// A Helper to write values into a shared vector and take them out
/// again.
/// Workers run on their own threads, this is how tests get at what they
/// received. Uses an Arc<Mutex<Vec<T>> internally, so it can be freely
/// cloned
#[derive(Debug)]
pub(crate) struct VecSink<T> {
    inner: Arc<Mutex<Vec<T>>>,
}

impl<T> Clone for VecSink<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for VecSink<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> VecSink<T> {
    pub(crate) fn new() -> Self {
        VecSink {
            inner: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Put a value into this sink
    pub(crate) fn give(&self, value: T) {
        self.inner.lock().unwrap().push(value)
    }

    /// Take the given range out of this sink
    pub(crate) fn drain_vec<R: RangeBounds<usize>>(&self, range: R) -> Vec<T> {
        self.inner.lock().unwrap().drain(range).collect()
    }

    /// Returns the len of the contained vec
    pub(crate) fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.inner.lock().unwrap().is_empty()
    }
}
