//! Page cache for loaded atlases
//!
//! [`AtlasCache`] maps an image identity to a shared page build. The first
//! request for an identity starts the build; every later or concurrent
//! request for the same identity awaits that same build. A page handle is
//! only handed out once the page is fully constructed.
//!
//! [`AtlasStore`] owns several named caches and replaces a process-wide table
//! of atlases: the embedding application creates it and drops it.

use crate::diagnostic::{DiagnosticSink, LogSink};
use crate::grouping::FrameOrder;
use crate::hash::compute_hash;
use crate::loader::{AtlasLoader, LoadError};
use crate::models::Definitions;
use crate::page::{Page, Strictness};
use futures::future::{BoxFuture, FutureExt, Shared};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

/// Default atlas id used by [`AtlasStore::default_atlas`].
pub const DEFAULT_ATLAS_ID: &str = "defaultAtlas";

/// Shared handle to a built page.
pub type PageHandle<T> = Arc<Page<T>>;

type PageResult<T> = Result<PageHandle<T>, LoadError>;
type PageFuture<T> = Shared<BoxFuture<'static, PageResult<T>>>;

/// What happens to a cache entry whose build failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Keep the failure; later requests for the key get the same error
    #[default]
    Sticky,
    /// Drop the entry once the failure is observed so the next request rebuilds
    Evict,
}

/// Options applied to every page a cache builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheOptions {
    pub failure_policy: FailurePolicy,
    pub frame_order: FrameOrder,
    pub strictness: Strictness,
}

/// Single-flight cache of atlas pages keyed by image identity.
pub struct AtlasCache<L: AtlasLoader> {
    loader: Arc<L>,
    options: CacheOptions,
    sink: Arc<dyn DiagnosticSink>,
    pages: Mutex<HashMap<u64, PageFuture<L::Texture>>>,
}

impl<L: AtlasLoader> AtlasCache<L> {
    pub fn new(loader: L) -> Self {
        Self::with_options(Arc::new(loader), CacheOptions::default())
    }

    pub fn with_options(loader: Arc<L>, options: CacheOptions) -> Self {
        Self {
            loader,
            options,
            sink: Arc::new(LogSink),
            pages: Mutex::new(HashMap::new()),
        }
    }

    /// Route diagnostics from page builds to `sink` instead of the log.
    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn options(&self) -> CacheOptions {
        self.options
    }

    pub fn loader(&self) -> &Arc<L> {
        &self.loader
    }

    fn lock_pages(&self) -> MutexGuard<'_, HashMap<u64, PageFuture<L::Texture>>> {
        self.pages
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Return the page for `image_identity`, building it on first request.
    ///
    /// `metadata_source` and `definitions` are only used when this call starts
    /// the build. A request that finds an existing entry (finished or still
    /// loading) awaits that entry instead.
    pub async fn get_or_build_page(
        &self,
        image_identity: &str,
        metadata_source: &str,
        definitions: Option<&Definitions>,
    ) -> PageResult<L::Texture> {
        let key = compute_hash(image_identity);

        let build = {
            let mut pages = self.lock_pages();
            match pages.get(&key) {
                Some(existing) => existing.clone(),
                None => {
                    let build = self
                        .build_page(image_identity, metadata_source, definitions)
                        .boxed()
                        .shared();
                    pages.insert(key, build.clone());
                    build
                }
            }
        };

        let result = build.clone().await;

        if result.is_err() && self.options.failure_policy == FailurePolicy::Evict {
            let mut pages = self.lock_pages();
            if pages.get(&key).is_some_and(|current| current.ptr_eq(&build)) {
                log::debug!("evicting failed page '{}'", image_identity);
                pages.remove(&key);
            }
        }

        result
    }

    fn build_page(
        &self,
        image_identity: &str,
        metadata_source: &str,
        definitions: Option<&Definitions>,
    ) -> impl std::future::Future<Output = PageResult<L::Texture>> + Send + 'static {
        let loader = Arc::clone(&self.loader);
        let sink = Arc::clone(&self.sink);
        let options = self.options;
        let identity = image_identity.to_string();
        let metadata_source = metadata_source.to_string();
        let definitions = definitions.cloned();

        async move {
            log::debug!("building page '{}' from '{}'", identity, metadata_source);

            let (metadata, texture) = futures::try_join!(
                loader.load_metadata(&metadata_source),
                loader.load_texture(&identity),
            )?;

            let page = Page::with_options(
                metadata.frames,
                texture,
                options.frame_order,
                options.strictness,
            );

            if let Some(definitions) = definitions {
                page.apply_definitions(&definitions, sink.as_ref())
                    .map_err(|source| LoadError::Definitions {
                        identity: identity.clone(),
                        source,
                    })?;
            }

            log::debug!(
                "built page '{}': {} frames, {} groups",
                identity,
                page.frames().len(),
                page.group_names().len()
            );
            Ok(Arc::new(page))
        }
    }

    /// The finished page for `image_identity`, if its build has succeeded.
    pub fn get(&self, image_identity: &str) -> Option<PageHandle<L::Texture>> {
        let pages = self.lock_pages();
        let build = pages.get(&compute_hash(image_identity))?;
        match build.peek() {
            Some(Ok(page)) => Some(Arc::clone(page)),
            _ => None,
        }
    }

    /// True if an entry exists for `image_identity`, finished or not.
    pub fn contains(&self, image_identity: &str) -> bool {
        self.lock_pages()
            .contains_key(&compute_hash(image_identity))
    }

    /// Remove the entry for `image_identity`. Callers already awaiting it
    /// still receive its result.
    pub fn evict(&self, image_identity: &str) -> bool {
        self.lock_pages()
            .remove(&compute_hash(image_identity))
            .is_some()
    }

    pub fn clear(&self) {
        self.lock_pages().clear();
    }

    pub fn len(&self) -> usize {
        self.lock_pages().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Named atlas caches sharing one loader.
pub struct AtlasStore<L: AtlasLoader> {
    loader: Arc<L>,
    options: CacheOptions,
    sink: Arc<dyn DiagnosticSink>,
    atlases: Mutex<BTreeMap<String, Arc<AtlasCache<L>>>>,
}

impl<L: AtlasLoader> AtlasStore<L> {
    pub fn new(loader: L, options: CacheOptions) -> Self {
        Self {
            loader: Arc::new(loader),
            options,
            sink: Arc::new(LogSink),
            atlases: Mutex::new(BTreeMap::new()),
        }
    }

    /// Sink handed to every cache created after this call.
    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    fn lock_atlases(&self) -> MutexGuard<'_, BTreeMap<String, Arc<AtlasCache<L>>>> {
        self.atlases
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// The cache named `id`, created empty on first use.
    pub fn atlas(&self, id: &str) -> Arc<AtlasCache<L>> {
        let mut atlases = self.lock_atlases();
        let cache = atlases.entry(id.to_string()).or_insert_with(|| {
            Arc::new(
                AtlasCache::with_options(Arc::clone(&self.loader), self.options)
                    .with_sink(Arc::clone(&self.sink)),
            )
        });
        Arc::clone(cache)
    }

    pub fn default_atlas(&self) -> Arc<AtlasCache<L>> {
        self.atlas(DEFAULT_ATLAS_ID)
    }

    /// Drop the cache named `id`. Outstanding handles keep working.
    pub fn remove(&self, id: &str) -> Option<Arc<AtlasCache<L>>> {
        self.lock_atlases().remove(id)
    }

    /// Ids of all caches, sorted.
    pub fn ids(&self) -> Vec<String> {
        self.lock_atlases().keys().cloned().collect()
    }
}
