use async_trait::async_trait;
use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use graphbind_common::error::ClientError;
use rustc_hash::FxHashMap;
use std::sync::{Arc, Mutex};

/// Fetches a component implementation resource (script, stylesheet) by URL.
#[async_trait]
pub trait ResourceFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<(), ClientError>;
}

type LoadFuture = Shared<BoxFuture<'static, Result<(), Arc<ClientError>>>>;

/// Deduplicates implementation loads per URL.
///
/// Concurrent requests for the same resource share a single in-flight fetch; completed
/// loads stay cached for the page lifetime, so every URL is fetched at most once. The
/// cache is append-only, matching the platform's no-eviction resource model.
pub struct ScriptLoader {
    fetcher: Arc<dyn ResourceFetcher>,
    loads: Mutex<FxHashMap<String, LoadFuture>>,
}

impl ScriptLoader {
    pub fn new(fetcher: Arc<dyn ResourceFetcher>) -> Self {
        Self {
            fetcher,
            loads: Mutex::new(FxHashMap::default()),
        }
    }

    /// Loads `url`, joining an in-flight or completed load when one exists.
    pub async fn load(&self, url: &str) -> Result<(), Arc<ClientError>> {
        let load = {
            let mut loads = self.loads.lock().unwrap();
            match loads.get(url) {
                Some(load) => load.clone(),
                None => {
                    let fetcher = Arc::clone(&self.fetcher);
                    let owned_url = url.to_owned();
                    let load = async move { fetcher.fetch(&owned_url).await.map_err(Arc::new) }
                        .boxed()
                        .shared();
                    loads.insert(url.to_owned(), load.clone());
                    load
                }
            }
        };
        load.await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingFetcher {
        fetches: AtomicUsize,
    }

    #[async_trait]
    impl ResourceFetcher for CountingFetcher {
        async fn fetch(&self, _url: &str) -> Result<(), ClientError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn concurrent_loads_of_one_url_share_a_single_fetch() {
        let fetcher = Arc::new(CountingFetcher {
            fetches: AtomicUsize::new(0),
        });
        let loader = ScriptLoader::new(Arc::clone(&fetcher) as Arc<dyn ResourceFetcher>);

        let (a, b) = futures::join!(
            loader.load("https://example.com/widget.js"),
            loader.load("https://example.com/widget.js")
        );
        a.unwrap();
        b.unwrap();
        loader.load("https://example.com/widget.js").await.unwrap();

        assert_eq!(fetcher.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn distinct_urls_fetch_separately() {
        let fetcher = Arc::new(CountingFetcher {
            fetches: AtomicUsize::new(0),
        });
        let loader = ScriptLoader::new(Arc::clone(&fetcher) as Arc<dyn ResourceFetcher>);

        loader.load("https://example.com/a.js").await.unwrap();
        loader.load("https://example.com/b.js").await.unwrap();

        assert_eq!(fetcher.fetches.load(Ordering::SeqCst), 2);
    }
}
