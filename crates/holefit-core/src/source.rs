//! Photo byte sources and the per-run photo cache.
//!
//! A photo's bytes may live in several places (local upload, remote
//! storage, a pre-rendered thumbnail). [`FallbackSource`] tries them in
//! order. [`PhotoCache`] holds decoded photos for one composite or editing
//! session; it is passed explicitly and frees everything when dropped.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::rc::Rc;

use futures_util::future::LocalBoxFuture;
use thiserror::Error;
use tracing::{error, warn};

use crate::decode::{decode_photo, DecodeError, DecodedImage};
use crate::slot::PhotoId;

/// A single source failed to provide a photo.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("Photo {0} not found")]
    NotFound(PhotoId),

    #[error("Fetch failed: {0}")]
    Fetch(String),
}

/// Every source was tried and none produced the photo.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Photo {photo} unavailable from all {} source(s)", failures.len())]
pub struct SourceExhausted {
    pub photo: PhotoId,
    /// `(source name, failure)` in the order tried
    pub failures: Vec<(String, SourceError)>,
}

/// Provider of encoded photo bytes.
pub trait PhotoSource {
    /// Short name used in logs and error reports.
    fn name(&self) -> &str;

    fn fetch<'a>(&'a self, photo: &'a PhotoId) -> LocalBoxFuture<'a, Result<Vec<u8>, SourceError>>;
}

impl<S: PhotoSource + ?Sized> PhotoSource for Rc<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn fetch<'a>(&'a self, photo: &'a PhotoId) -> LocalBoxFuture<'a, Result<Vec<u8>, SourceError>> {
        (**self).fetch(photo)
    }
}

/// Photos held in memory, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    name: String,
    photos: HashMap<PhotoId, Vec<u8>>,
}

impl MemorySource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            photos: HashMap::new(),
        }
    }

    pub fn insert(&mut self, photo: PhotoId, bytes: Vec<u8>) {
        self.photos.insert(photo, bytes);
    }

    pub fn with_photo(mut self, photo: PhotoId, bytes: Vec<u8>) -> Self {
        self.insert(photo, bytes);
        self
    }

    pub fn contains(&self, photo: &PhotoId) -> bool {
        self.photos.contains_key(photo)
    }

    pub fn remove(&mut self, photo: &PhotoId) -> Option<Vec<u8>> {
        self.photos.remove(photo)
    }

    pub fn len(&self) -> usize {
        self.photos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.photos.is_empty()
    }
}

impl PhotoSource for MemorySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch<'a>(&'a self, photo: &'a PhotoId) -> LocalBoxFuture<'a, Result<Vec<u8>, SourceError>> {
        let result = self
            .photos
            .get(photo)
            .cloned()
            .ok_or_else(|| SourceError::NotFound(photo.clone()));
        Box::pin(async move { result })
    }
}

/// Ordered list of sources, first success wins.
#[derive(Default)]
pub struct FallbackSource {
    sources: Vec<Box<dyn PhotoSource>>,
}

impl std::fmt::Debug for FallbackSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.sources.iter().map(|s| s.name()))
            .finish()
    }
}

impl FallbackSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a source; it is tried after all existing ones.
    pub fn with_source(mut self, source: impl PhotoSource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    pub fn push(&mut self, source: Box<dyn PhotoSource>) {
        self.sources.push(source);
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Fetch from the first source that has the photo.
    ///
    /// # Errors
    ///
    /// `SourceExhausted` listing every failure when no source succeeds
    /// (including when there are no sources at all).
    pub async fn fetch(&self, photo: &PhotoId) -> Result<Vec<u8>, SourceExhausted> {
        let mut failures = Vec::new();
        for source in &self.sources {
            match source.fetch(photo).await {
                Ok(bytes) => return Ok(bytes),
                Err(e) => {
                    warn!(source = source.name(), %photo, error = %e, "photo source failed");
                    failures.push((source.name().to_string(), e));
                }
            }
        }
        error!(%photo, attempts = failures.len(), "all photo sources failed");
        Err(SourceExhausted {
            photo: photo.clone(),
            failures,
        })
    }
}

/// Failure to get a decoded photo into the cache.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Exhausted(#[from] SourceExhausted),

    #[error("Photo {photo} could not be decoded: {source}")]
    Decode {
        photo: PhotoId,
        #[source]
        source: DecodeError,
    },
}

/// Decoded photos for one composite or session.
#[derive(Debug, Default)]
pub struct PhotoCache {
    photos: HashMap<PhotoId, DecodedImage>,
}

impl PhotoCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the decoded photo, fetching and decoding it on first use.
    pub async fn load(
        &mut self,
        photo: &PhotoId,
        source: &FallbackSource,
    ) -> Result<&DecodedImage, LoadError> {
        match self.photos.entry(photo.clone()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let bytes = source.fetch(photo).await?;
                let image = decode_photo(&bytes).map_err(|source| LoadError::Decode {
                    photo: photo.clone(),
                    source,
                })?;
                Ok(entry.insert(image))
            }
        }
    }

    pub fn get(&self, photo: &PhotoId) -> Option<&DecodedImage> {
        self.photos.get(photo)
    }

    /// Store an already decoded photo.
    pub fn insert(&mut self, photo: PhotoId, image: DecodedImage) {
        self.photos.insert(photo, image);
    }

    /// Drop one photo, returning it if it was cached.
    pub fn release(&mut self, photo: &PhotoId) -> Option<DecodedImage> {
        self.photos.remove(photo)
    }

    pub fn len(&self) -> usize {
        self.photos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.photos.is_empty()
    }
}
