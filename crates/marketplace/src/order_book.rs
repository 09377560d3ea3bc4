use {
    alloy::primitives::B256,
    model::trade::TradeRecord,
    thiserror::Error,
    tokio::sync::Mutex,
};

pub use crate::infra::store::FileOrderBook;

#[derive(Debug, Error)]
pub enum OrderBookError {
    #[error("trade {0} does not exist")]
    NotFound(B256),
    #[error("trade {0} already exists")]
    Duplicate(B256),
    #[error("trade {0} is already finalized")]
    AlreadyFinalized(B256),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Queryable collection of trade records.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait OrderBook: Send + Sync {
    async fn create(&self, record: TradeRecord) -> Result<(), OrderBookError>;

    /// Records that are neither cancelled nor finalized.
    async fn open_orders(&self) -> Result<Vec<TradeRecord>, OrderBookError>;

    async fn find(&self, order_hash: B256) -> Result<Option<TradeRecord>, OrderBookError>;

    /// Marks a record as cancelled or finalized. This can happen only once.
    async fn finalize(&self, order_hash: B256) -> Result<(), OrderBookError>;
}

/// Applies `finalize` to a list of records.
pub(crate) fn finalize_in(records: &mut [TradeRecord], order_hash: B256) -> Result<(), OrderBookError> {
    let record = records
        .iter_mut()
        .find(|record| record.order_hash == order_hash)
        .ok_or(OrderBookError::NotFound(order_hash))?;
    if record.cancelled_or_finalized {
        return Err(OrderBookError::AlreadyFinalized(order_hash));
    }
    record.cancelled_or_finalized = true;
    Ok(())
}

/// Applies `create` to a list of records.
pub(crate) fn create_in(records: &mut Vec<TradeRecord>, record: TradeRecord) -> Result<(), OrderBookError> {
    if records.iter().any(|existing| existing.order_hash == record.order_hash) {
        return Err(OrderBookError::Duplicate(record.order_hash));
    }
    records.push(record);
    Ok(())
}

#[derive(Debug, Default)]
pub struct InMemoryOrderBook {
    records: Mutex<Vec<TradeRecord>>,
}

impl InMemoryOrderBook {
    pub fn new(records: Vec<TradeRecord>) -> Self {
        Self {
            records: Mutex::new(records),
        }
    }
}

#[async_trait::async_trait]
impl OrderBook for InMemoryOrderBook {
    async fn create(&self, record: TradeRecord) -> Result<(), OrderBookError> {
        create_in(&mut *self.records.lock().await, record)
    }

    async fn open_orders(&self) -> Result<Vec<TradeRecord>, OrderBookError> {
        Ok(self
            .records
            .lock()
            .await
            .iter()
            .filter(|record| record.is_open())
            .cloned()
            .collect())
    }

    async fn find(&self, order_hash: B256) -> Result<Option<TradeRecord>, OrderBookError> {
        Ok(self
            .records
            .lock()
            .await
            .iter()
            .find(|record| record.order_hash == order_hash)
            .cloned())
    }

    async fn finalize(&self, order_hash: B256) -> Result<(), OrderBookError> {
        finalize_in(&mut self.records.lock().await, order_hash)
    }
}
