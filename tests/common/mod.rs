//! Shared utilities for facade integration tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use forgestore::storage::{
    self, Item, ItemStore, MemoryItemStore, PrimaryKey, PutRequest, QueryOutput, QueryRequest,
    TransactOp, UpdateRequest,
};
use forgestore::{Repositories, StoreContext};

/// Memory store that counts every call made through it.
#[derive(Default)]
pub struct CountingStore {
    inner: MemoryItemStore,
    calls: AtomicUsize,
}

impl CountingStore {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ItemStore for CountingStore {
    async fn get_item(&self, key: &PrimaryKey) -> storage::Result<Option<Item>> {
        self.record();
        self.inner.get_item(key).await
    }

    async fn put_item(&self, request: PutRequest) -> storage::Result<()> {
        self.record();
        self.inner.put_item(request).await
    }

    async fn update_item(&self, request: UpdateRequest) -> storage::Result<Item> {
        self.record();
        self.inner.update_item(request).await
    }

    async fn delete_item(&self, key: &PrimaryKey) -> storage::Result<()> {
        self.record();
        self.inner.delete_item(key).await
    }

    async fn query(&self, request: QueryRequest) -> storage::Result<QueryOutput> {
        self.record();
        self.inner.query(request).await
    }

    async fn transact_write(&self, ops: Vec<TransactOp>) -> storage::Result<()> {
        self.record();
        self.inner.transact_write(ops).await
    }
}

/// Facades over a fresh memory store.
pub fn repositories() -> (Repositories, Arc<CountingStore>) {
    let store = Arc::new(CountingStore::default());
    let ctx = StoreContext::with_default_indexes(store.clone());
    (Repositories::new(ctx), store)
}
