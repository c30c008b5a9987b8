//! Layered volume cache.
//!
//! A [`LayerCache`] memoizes decoded layers (one 2D frame per slice) from a
//! [`LayerSource`]. Requests for the same layer are deduplicated: the first
//! caller starts the load and every concurrent caller awaits the same shared
//! future, so a layer is decoded once and all callers receive the same `Arc`.
//!
//! ```text
//!  get_async(i) ──► ready? ──yes──► Arc<DecodedFrame>
//!                     │ no
//!                     ▼
//!                  pending? ──yes──► await shared future
//!                     │ no
//!                     ▼
//!                  cancelled? ──yes──► Err(Cancelled)
//!                     │ no
//!                     ▼
//!                  source.load_layer(i) ──► insert ready, drop pending
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::{join_all, BoxFuture, Shared};
use futures::FutureExt;
use parking_lot::{Mutex, RwLock};
use tracing::debug;

use crate::codec::{DecodedFrame, PixelDecoder};
use crate::error::VolumeError;
use crate::format::dicom::Dataset;

use super::scheduler::{DecodeScheduler, Priority};
use super::thick::ThickSource;

/// A decoded layer shared between the cache and its callers.
pub type Layer = Arc<DecodedFrame>;

type PendingLoad = Shared<BoxFuture<'static, Result<Layer, VolumeError>>>;

// =============================================================================
// LayerSource
// =============================================================================

/// Backing store of a [`LayerCache`].
#[async_trait]
pub trait LayerSource: Send + Sync + 'static {
    /// Number of layers.
    fn layer_count(&self) -> usize;

    /// Produce layer `index`. Called at most once per layer while a result
    /// is pending.
    async fn load_layer(&self, index: usize, priority: Priority) -> Result<Layer, VolumeError>;

    /// Produce layer `index` without waiting, when the source can.
    ///
    /// `None` means the layer needs an asynchronous load.
    fn load_layer_sync(&self, _index: usize) -> Option<Result<Layer, VolumeError>> {
        None
    }

    /// Dataset describing layer `index`.
    fn metadata(&self, index: usize) -> Option<&Dataset>;
}

// =============================================================================
// FrameSource
// =============================================================================

/// Layer source decoding one dataset frame per layer.
pub struct FrameSource {
    frames: Vec<(Arc<Dataset>, usize)>,
    decoder: PixelDecoder,
    scheduler: DecodeScheduler,
}

impl FrameSource {
    /// `frames` lists (dataset, frame index) in layer order.
    pub fn new(
        frames: Vec<(Arc<Dataset>, usize)>,
        decoder: PixelDecoder,
        scheduler: DecodeScheduler,
    ) -> Self {
        Self {
            frames,
            decoder,
            scheduler,
        }
    }
}

impl fmt::Debug for FrameSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameSource")
            .field("layers", &self.frames.len())
            .field("workers", &self.scheduler.workers())
            .finish()
    }
}

#[async_trait]
impl LayerSource for FrameSource {
    fn layer_count(&self) -> usize {
        self.frames.len()
    }

    async fn load_layer(&self, index: usize, priority: Priority) -> Result<Layer, VolumeError> {
        let (dataset, frame) = self
            .frames
            .get(index)
            .cloned()
            .ok_or(VolumeError::LayerOutOfBounds {
                index,
                count: self.frames.len(),
            })?;
        let decoder = self.decoder.clone();

        let decoded = self
            .scheduler
            .run(priority, move || decoder.decode_frame(&dataset, frame))
            .await??;
        Ok(Arc::new(decoded))
    }

    fn metadata(&self, index: usize) -> Option<&Dataset> {
        self.frames.get(index).map(|(dataset, _)| dataset.as_ref())
    }
}

// =============================================================================
// LayerCache
// =============================================================================

struct CacheInner<S> {
    source: S,
    count: usize,
    ready: RwLock<HashMap<usize, Layer>>,
    pending: Mutex<HashMap<usize, PendingLoad>>,
    cancelled: AtomicBool,
    /// Bumped by `clear` so loads started earlier do not repopulate
    generation: AtomicU64,
}

/// Memoizing, deduplicating cache of decoded layers.
///
/// Cloning is cheap and shares the cache.
pub struct LayerCache<S: LayerSource> {
    inner: Arc<CacheInner<S>>,
}

impl<S: LayerSource> Clone for LayerCache<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<S: LayerSource> fmt::Debug for LayerCache<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (ready, total) = self.progress();
        f.debug_struct("LayerCache")
            .field("ready", &ready)
            .field("total", &total)
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

impl<S: LayerSource> LayerCache<S> {
    pub fn new(source: S) -> Self {
        let count = source.layer_count();
        Self {
            inner: Arc::new(CacheInner {
                source,
                count,
                ready: RwLock::new(HashMap::new()),
                pending: Mutex::new(HashMap::new()),
                cancelled: AtomicBool::new(false),
                generation: AtomicU64::new(0),
            }),
        }
    }

    pub fn layer_count(&self) -> usize {
        self.inner.count
    }

    pub fn source(&self) -> &S {
        &self.inner.source
    }

    fn check_bounds(&self, index: usize) -> Result<(), VolumeError> {
        if index >= self.inner.count {
            return Err(VolumeError::LayerOutOfBounds {
                index,
                count: self.inner.count,
            });
        }
        Ok(())
    }

    /// Layer `index` if it is already decoded or the source can produce it
    /// synchronously.
    ///
    /// # Errors
    ///
    /// - [`VolumeError::LayerOutOfBounds`] for `index >= layer_count()`
    /// - [`VolumeError::NotReady`] when the layer needs an async load
    pub fn get_sync(&self, index: usize) -> Result<Layer, VolumeError> {
        self.check_bounds(index)?;
        if let Some(layer) = self.try_get(index) {
            return Ok(layer);
        }

        match self.inner.source.load_layer_sync(index) {
            Some(Ok(layer)) => {
                self.inner.ready.write().insert(index, layer.clone());
                Ok(layer)
            }
            Some(Err(e)) => Err(e),
            None => Err(VolumeError::NotReady(index)),
        }
    }

    /// Layer `index` if it is decoded, `None` otherwise.
    pub fn try_get(&self, index: usize) -> Option<Layer> {
        self.inner.ready.read().get(&index).cloned()
    }

    /// Decode layer `index` if needed and return it.
    ///
    /// Concurrent calls for the same layer share one load.
    pub async fn get_async(&self, index: usize, priority: Priority) -> Result<Layer, VolumeError> {
        self.check_bounds(index)?;
        if let Some(layer) = self.try_get(index) {
            return Ok(layer);
        }

        let load = {
            let mut pending = self.inner.pending.lock();

            // A load may have finished between the check above and the lock
            if let Some(layer) = self.try_get(index) {
                return Ok(layer);
            }

            match pending.get(&index) {
                Some(load) => load.clone(),
                None => {
                    if self.is_cancelled() {
                        return Err(VolumeError::Cancelled(index));
                    }
                    debug!(layer = index, priority = ?priority, "Layer cache miss");
                    let load = self.start_load(index, priority);
                    pending.insert(index, load.clone());
                    load
                }
            }
        };

        load.await
    }

    fn start_load(&self, index: usize, priority: Priority) -> PendingLoad {
        let inner = self.inner.clone();
        let generation = inner.generation.load(Ordering::Acquire);

        async move {
            let result = inner.source.load_layer(index, priority).await;
            if let Ok(layer) = &result {
                if inner.generation.load(Ordering::Acquire) == generation {
                    inner.ready.write().insert(index, layer.clone());
                }
            }
            inner.pending.lock().remove(&index);
            result
        }
        .boxed()
        .shared()
    }

    /// Decode every layer that is not ready yet.
    ///
    /// Returns the first error; layers that loaded stay memoized.
    pub async fn force(&self, priority: Priority) -> Result<(), VolumeError> {
        let missing: Vec<usize> = {
            let ready = self.inner.ready.read();
            (0..self.inner.count)
                .filter(|i| !ready.contains_key(i))
                .collect()
        };
        if missing.is_empty() {
            return Ok(());
        }

        debug!(layers = missing.len(), "Forcing layer decode");
        let results = join_all(missing.into_iter().map(|i| self.get_async(i, priority))).await;
        results.into_iter().try_for_each(|r| r.map(|_| ()))
    }

    /// Whether every layer is decoded.
    pub fn is_ready(&self) -> bool {
        self.inner.ready.read().len() == self.inner.count
    }

    /// (decoded layers, total layers)
    pub fn progress(&self) -> (usize, usize) {
        (self.inner.ready.read().len(), self.inner.count)
    }

    /// Stop starting new loads. In-flight loads complete and are memoized.
    pub fn cancel_loading(&self) {
        debug!("Layer loading cancelled");
        self.inner.cancelled.store(true, Ordering::Release);
    }

    pub fn resume_loading(&self) {
        self.inner.cancelled.store(false, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Drop every decoded layer.
    pub fn clear(&self) {
        self.inner.generation.fetch_add(1, Ordering::AcqRel);
        let dropped = {
            let mut ready = self.inner.ready.write();
            let n = ready.len();
            ready.clear();
            n
        };
        debug!(layers = dropped, "Layer cache cleared");
    }

    /// Dataset describing layer `index`.
    pub fn metadata(&self, index: usize) -> Option<&Dataset> {
        if index >= self.inner.count {
            return None;
        }
        self.inner.source.metadata(index)
    }

    /// Derived cache averaging every `multiplier` consecutive layers.
    ///
    /// # Errors
    ///
    /// [`VolumeError::InvalidMultiplier`] unless `multiplier > 1`.
    pub fn thick(&self, multiplier: usize) -> Result<LayerCache<ThickSource<S>>, VolumeError> {
        let source = ThickSource::new(self.clone(), multiplier)?;
        Ok(LayerCache::new(source))
    }
}
