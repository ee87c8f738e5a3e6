//! Key transforms and map configuration.

use core::fmt;
use std::rc::Rc;
use std::sync::Arc;

/// Label given to maps constructed without one.
pub const DEFAULT_LABEL: &str = "unknown";

/// A shared, pure function from a domain key to its storage key.
///
/// Derived maps (`filter`, `map`, ...) share the transform of their source,
/// so it is reference counted rather than owned.
pub struct Transform<K, Tk> {
    f: Rc<dyn Fn(&K) -> Tk>,
}

impl<K, Tk> Transform<K, Tk> {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&K) -> Tk + 'static,
    {
        Self { f: Rc::new(f) }
    }

    #[inline]
    pub fn apply(&self, key: &K) -> Tk {
        (self.f)(key)
    }
}

impl<K: Clone + 'static> Transform<K, K> {
    /// The identity transform: a key is stored as itself.
    pub fn identity() -> Self {
        Self::new(K::clone)
    }
}

impl<K, Tk> Clone for Transform<K, Tk> {
    fn clone(&self) -> Self {
        Self { f: Rc::clone(&self.f) }
    }
}

impl<K, Tk> fmt::Debug for Transform<K, Tk> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transform")
            .field("domain", &core::any::type_name::<K>())
            .field("storage", &core::any::type_name::<Tk>())
            .finish()
    }
}

/// Construction options shared by every map flavor: a diagnostic label and
/// the key transform.
///
/// ```
/// use transform_map::{MapOptions, TransformedMap};
///
/// let opts = MapOptions::with_transform(|s: &String| s.to_lowercase()).label("headers");
/// let mut m: TransformedMap<String, u32, String> = TransformedMap::with_options(opts);
/// m.set("Content-Length".to_string(), 42);
/// assert_eq!(m.get(&"content-length".to_string()).ok(), Some(&42));
/// assert_eq!(m.label(), "headers");
/// ```
pub struct MapOptions<K, Tk> {
    pub(crate) label: Arc<str>,
    pub(crate) transform: Transform<K, Tk>,
}

impl<K: Clone + 'static> MapOptions<K, K> {
    /// Identity transform and the default label.
    pub fn new() -> Self {
        Self::from_transform(Transform::identity())
    }
}

impl<K: Clone + 'static> Default for MapOptions<K, K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, Tk> MapOptions<K, Tk> {
    pub fn with_transform<F>(f: F) -> Self
    where
        F: Fn(&K) -> Tk + 'static,
    {
        Self::from_transform(Transform::new(f))
    }

    pub fn from_transform(transform: Transform<K, Tk>) -> Self {
        Self {
            label: Arc::from(DEFAULT_LABEL),
            transform,
        }
    }

    pub fn label(mut self, label: impl Into<Arc<str>>) -> Self {
        self.label = label.into();
        self
    }

    /// Replace the transform, keeping the label.
    pub fn transform<Tk2, F>(self, f: F) -> MapOptions<K, Tk2>
    where
        F: Fn(&K) -> Tk2 + 'static,
    {
        MapOptions {
            label: self.label,
            transform: Transform::new(f),
        }
    }
}

impl<K, Tk> Clone for MapOptions<K, Tk> {
    fn clone(&self) -> Self {
        Self {
            label: Arc::clone(&self.label),
            transform: self.transform.clone(),
        }
    }
}

impl<K, Tk> fmt::Debug for MapOptions<K, Tk> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapOptions")
            .field("label", &self.label)
            .field("transform", &self.transform)
            .finish()
    }
}
