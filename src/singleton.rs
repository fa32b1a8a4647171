//! Caller-owned lazy singletons.
//!
//! A [`LazySingleton`] defers construction of a shared value until the first
//! call to [`LazySingleton::get`], then hands the same [`Arc`] to every caller
//! on every thread. The owning context creates the singleton and passes it
//! (or something holding it) to whoever needs the shared value; there is no
//! hidden process-wide state.
//!
//! Construction uses double-checked locking:
//!
//! 1. Read the published instance without locking and return it if present.
//! 2. Otherwise take the init lock and check again, since another thread may
//!    have finished while this one waited.
//! 3. Otherwise run the factory, publish the result and return it.
//!
//! A factory error is returned to the caller and leaves the singleton
//! uninitialized, so the next `get` retries. A failed first construction
//! never turns into a permanently cached failure.
//!
//! ```
//! use nexus_link_sdk::LazySingleton;
//!
//! let config = LazySingleton::new(|| "https://example.com".parse::<url::Url>());
//! assert!(!config.is_initialized());
//! let url = config.get().unwrap();
//! assert_eq!(url.host_str(), Some("example.com"));
//! assert!(config.is_initialized());
//! ```

use std::convert::Infallible;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

type Factory<T, E> = dyn Fn() -> Result<T, E> + Send + Sync;

type AsyncFactory<T, E> =
    dyn Fn() -> Pin<Box<dyn Future<Output = Result<T, E>> + Send>> + Send + Sync;

/// Thread-safe, deferred, at-most-once construction of a shared instance.
pub struct LazySingleton<T, E = Infallible> {
    factory: Box<Factory<T, E>>,
    // `get` is an acquire load and `set` a release store, so the fast path
    // never observes a partially constructed value.
    instance: OnceLock<Arc<T>>,
    init_lock: Mutex<()>,
}

impl<T, E> LazySingleton<T, E> {
    /// Create a singleton around a fallible factory. Nothing runs until `get`.
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> Result<T, E> + Send + Sync + 'static,
    {
        Self {
            factory: Box::new(factory),
            instance: OnceLock::new(),
            init_lock: Mutex::new(()),
        }
    }

    /// True once an instance has been produced. Never runs the factory.
    pub fn is_initialized(&self) -> bool {
        self.instance.get().is_some()
    }

    /// The instance if it has already been produced.
    pub fn get_if_initialized(&self) -> Option<Arc<T>> {
        self.instance.get().cloned()
    }

    /// Return the shared instance, constructing it on the first successful call.
    ///
    /// Blocks only while another thread is running the factory.
    pub fn get(&self) -> Result<Arc<T>, E> {
        if let Some(instance) = self.instance.get() {
            return Ok(Arc::clone(instance));
        }

        // A factory panic poisons the lock but leaves the cell unset; the
        // next caller may retry.
        let _guard = self.init_lock.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(instance) = self.instance.get() {
            return Ok(Arc::clone(instance));
        }

        match (self.factory)() {
            Ok(value) => {
                let instance = self.instance.get_or_init(|| Arc::new(value));
                tracing::debug!(
                    instance_type = std::any::type_name::<T>(),
                    "lazy singleton initialized"
                );
                Ok(Arc::clone(instance))
            }
            Err(err) => {
                tracing::debug!(
                    instance_type = std::any::type_name::<T>(),
                    "lazy singleton factory failed; will retry on next access"
                );
                Err(err)
            }
        }
    }
}

impl<T> LazySingleton<T, Infallible> {
    /// Create a singleton around a factory that cannot fail.
    pub fn infallible<F>(factory: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self::new(move || Ok(factory()))
    }

    /// Like `get`, for factories that cannot fail.
    pub fn force(&self) -> Arc<T> {
        match self.get() {
            Ok(instance) => instance,
            Err(never) => match never {},
        }
    }
}

impl<T, E> fmt::Debug for LazySingleton<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazySingleton")
            .field("type", &std::any::type_name::<T>())
            .field("initialized", &self.is_initialized())
            .finish()
    }
}

/// Lazy singleton whose factory is asynchronous.
///
/// Concurrent first callers all await the single in-flight construction and
/// receive the same instance. If the construction fails (or the future doing
/// it is dropped), the cell stays empty and the next caller retries.
pub struct AsyncLazySingleton<T, E = Infallible> {
    factory: Box<AsyncFactory<T, E>>,
    instance: tokio::sync::OnceCell<Arc<T>>,
}

impl<T, E> AsyncLazySingleton<T, E> {
    pub fn is_initialized(&self) -> bool {
        self.instance.initialized()
    }

    pub fn get_if_initialized(&self) -> Option<Arc<T>> {
        self.instance.get().cloned()
    }
}

impl<T, E> AsyncLazySingleton<T, E>
where
    T: 'static,
    E: 'static,
{
    pub fn new<F, Fut>(factory: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        Self {
            factory: Box::new(move || -> Pin<Box<dyn Future<Output = Result<T, E>> + Send>> {
                Box::pin(factory())
            }),
            instance: tokio::sync::OnceCell::new(),
        }
    }

    pub async fn get(&self) -> Result<Arc<T>, E> {
        let instance = self
            .instance
            .get_or_try_init(|| async {
                (self.factory)().await.map(|value| {
                    tracing::debug!(
                        instance_type = std::any::type_name::<T>(),
                        "async lazy singleton initialized"
                    );
                    Arc::new(value)
                })
            })
            .await?;
        Ok(Arc::clone(instance))
    }
}

impl<T, E> fmt::Debug for AsyncLazySingleton<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncLazySingleton")
            .field("type", &std::any::type_name::<T>())
            .field("initialized", &self.is_initialized())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn get_if_initialized_does_not_force() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let singleton = LazySingleton::infallible(move || counter.fetch_add(1, Ordering::SeqCst));

        assert!(singleton.get_if_initialized().is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let first = singleton.force();
        assert!(Arc::ptr_eq(&first, &singleton.get_if_initialized().unwrap()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn factory_panic_does_not_wedge() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let singleton = Arc::new(LazySingleton::infallible(move || {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                panic!("first construction blows up");
            }
            42
        }));

        let shared = singleton.clone();
        assert!(std::thread::spawn(move || shared.force()).join().is_err());
        assert!(!singleton.is_initialized());

        assert_eq!(*singleton.force(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn debug_reports_state() {
        let singleton = LazySingleton::infallible(|| 1u8);
        assert!(format!("{:?}", singleton).contains("initialized: false"));
        singleton.force();
        assert!(format!("{:?}", singleton).contains("initialized: true"));
    }

    #[tokio::test]
    async fn async_debug_reports_state() {
        let singleton: AsyncLazySingleton<u8> = AsyncLazySingleton::new(|| async { Ok(7) });
        assert!(format!("{:?}", singleton).contains("initialized: false"));
        assert_eq!(*singleton.get().await.unwrap(), 7);
        let rendered = format!("{:?}", singleton);
        assert!(rendered.contains("AsyncLazySingleton"));
        assert!(rendered.contains("initialized: true"));
    }
}
