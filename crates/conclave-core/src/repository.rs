//! Entity storage
//!
//! Services never touch a map directly; they go through the [`Repository`]
//! trait so a persistent backend can replace [`MemoryRepository`].
//!
//! Read-modify-write goes through [`Repository::update`], which runs the
//! mutation while holding the entity's map guard and bumps its version.
//! Names are reserved through a separate index so two concurrent creates
//! with the same name cannot both succeed.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::error::{Error, Result};

/// A stored entity
pub trait Entity: Clone + Send + Sync + 'static {
    /// Kind used in error messages
    const KIND: &'static str;

    /// Primary key
    fn id(&self) -> Uuid;

    /// Name that must be unique (case-insensitive) across the repository
    fn unique_name(&self) -> Option<&str> {
        None
    }

    /// Creation time, used for list ordering
    fn created_at(&self) -> DateTime<Utc>;

    /// Record a successful update (version bump, timestamp)
    fn touch(&mut self);
}

/// Boxed mutation applied by [`Repository::update`]
pub type Mutation<T> = Box<dyn FnOnce(&mut T) -> Result<()> + Send>;

/// Pagination window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// Items to skip
    pub skip: Option<usize>,
    /// Items to return
    pub take: Option<usize>,
}

/// Page size limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    /// Used when the caller gives no `take`
    pub default_take: usize,
    /// Upper bound on `take`
    pub max_take: usize,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_take: 50,
            max_take: 200,
        }
    }
}

/// A resolved pagination window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// Items to skip
    pub skip: usize,
    /// Items to return
    pub take: usize,
}

impl Page {
    /// Every item
    pub const ALL: Page = Page {
        skip: 0,
        take: usize::MAX,
    };

    /// Apply defaults and clamp `take` to the configured maximum
    #[must_use]
    pub fn resolve(query: PageQuery, limits: PageLimits) -> Self {
        Self {
            skip: query.skip.unwrap_or(0),
            take: query
                .take
                .unwrap_or(limits.default_take)
                .min(limits.max_take),
        }
    }

    /// Slice an already ordered iterator
    pub fn apply<T>(&self, items: impl IntoIterator<Item = T>) -> Vec<T> {
        items.into_iter().skip(self.skip).take(self.take).collect()
    }
}

/// Storage abstraction for entities
#[async_trait]
pub trait Repository<T: Entity>: Send + Sync {
    /// Store a new entity; fails with `Conflict` on a duplicate id or name
    async fn insert(&self, entity: T) -> Result<T>;

    /// Fetch by id
    async fn get(&self, id: Uuid) -> Result<T>;

    /// Whether an entity exists
    async fn exists(&self, id: Uuid) -> Result<bool>;

    /// List ordered by creation time
    async fn list(&self, page: Page) -> Result<Vec<T>>;

    /// Number of stored entities
    async fn count(&self) -> Result<usize>;

    /// Atomically apply a mutation; the entity is unchanged if it fails
    async fn update(&self, id: Uuid, mutation: Mutation<T>) -> Result<T>;

    /// Remove and return an entity
    async fn delete(&self, id: Uuid) -> Result<T>;
}

/// In-memory repository backed by `DashMap`
pub struct MemoryRepository<T: Entity> {
    entities: DashMap<Uuid, T>,
    names: DashMap<String, Uuid>,
}

impl<T: Entity> Default for MemoryRepository<T> {
    fn default() -> Self {
        Self {
            entities: DashMap::new(),
            names: DashMap::new(),
        }
    }
}

impl<T: Entity> MemoryRepository<T> {
    /// Create an empty repository
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn reserve_name(&self, name: &str, id: Uuid) -> Result<()> {
        match self.names.entry(name_key(name)) {
            Entry::Occupied(existing) if *existing.get() != id => Err(Error::Conflict(format!(
                "{} named '{}' already exists",
                T::KIND,
                name
            ))),
            Entry::Occupied(_) => Ok(()),
            Entry::Vacant(slot) => {
                slot.insert(id);
                Ok(())
            }
        }
    }

    fn release_name(&self, name: &str, id: Uuid) {
        self.names
            .remove_if(&name_key(name), |_, owner| *owner == id);
    }
}

fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

#[async_trait]
impl<T: Entity> Repository<T> for MemoryRepository<T> {
    async fn insert(&self, entity: T) -> Result<T> {
        let id = entity.id();
        if let Some(name) = entity.unique_name() {
            self.reserve_name(name, id)?;
        }

        match self.entities.entry(id) {
            Entry::Occupied(_) => {
                if let Some(name) = entity.unique_name() {
                    self.release_name(name, id);
                }
                Err(Error::Conflict(format!("{} {} already exists", T::KIND, id)))
            }
            Entry::Vacant(slot) => {
                slot.insert(entity.clone());
                Ok(entity)
            }
        }
    }

    async fn get(&self, id: Uuid) -> Result<T> {
        self.entities
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| Error::not_found(T::KIND, id))
    }

    async fn exists(&self, id: Uuid) -> Result<bool> {
        Ok(self.entities.contains_key(&id))
    }

    async fn list(&self, page: Page) -> Result<Vec<T>> {
        let mut all: Vec<T> = self
            .entities
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        all.sort_by_key(|e| (e.created_at(), e.id()));
        Ok(page.apply(all))
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.entities.len())
    }

    async fn update(&self, id: Uuid, mutation: Mutation<T>) -> Result<T> {
        let mut guard = self
            .entities
            .get_mut(&id)
            .ok_or_else(|| Error::not_found(T::KIND, id))?;

        let mut draft = guard.value().clone();
        mutation(&mut draft)?;

        let old_name = guard.unique_name().map(str::to_string);
        let new_name = draft.unique_name().map(str::to_string);
        if old_name.as_deref().map(name_key) != new_name.as_deref().map(name_key) {
            if let Some(name) = &new_name {
                self.reserve_name(name, id)?;
            }
            if let Some(name) = &old_name {
                self.release_name(name, id);
            }
        }

        draft.touch();
        *guard.value_mut() = draft.clone();
        Ok(draft)
    }

    async fn delete(&self, id: Uuid) -> Result<T> {
        let (_, entity) = self
            .entities
            .remove(&id)
            .ok_or_else(|| Error::not_found(T::KIND, id))?;
        if let Some(name) = entity.unique_name() {
            self.release_name(name, id);
        }
        Ok(entity)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Repository whose next `get` hands the entity out and then removes it,
    /// as if a concurrent delete landed right after the read.
    pub(crate) struct VanishingRepository<T: Entity> {
        inner: MemoryRepository<T>,
        armed: AtomicBool,
    }

    impl<T: Entity> VanishingRepository<T> {
        pub(crate) fn new() -> Self {
            Self {
                inner: MemoryRepository::new(),
                armed: AtomicBool::new(false),
            }
        }

        pub(crate) fn arm(&self) {
            self.armed.store(true, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl<T: Entity> Repository<T> for VanishingRepository<T> {
        async fn insert(&self, entity: T) -> Result<T> {
            self.inner.insert(entity).await
        }

        async fn get(&self, id: Uuid) -> Result<T> {
            let entity = self.inner.get(id).await?;
            if self.armed.swap(false, Ordering::SeqCst) {
                self.inner.delete(id).await?;
            }
            Ok(entity)
        }

        async fn exists(&self, id: Uuid) -> Result<bool> {
            self.inner.exists(id).await
        }

        async fn list(&self, page: Page) -> Result<Vec<T>> {
            self.inner.list(page).await
        }

        async fn count(&self) -> Result<usize> {
            self.inner.count().await
        }

        async fn update(&self, id: Uuid, mutation: Mutation<T>) -> Result<T> {
            self.inner.update(id, mutation).await
        }

        async fn delete(&self, id: Uuid) -> Result<T> {
            self.inner.delete(id).await
        }
    }
}
