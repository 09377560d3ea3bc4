use {
    crate::order_book::{OrderBook, OrderBookError},
    alloy::primitives::B256,
    model::trade::TradeRecord,
    std::sync::{Arc, PoisonError, RwLock},
};

/// Locally cached open trade records. Entries are only ever removed after a
/// confirmed settlement or when the whole view is invalidated.
#[derive(Clone, Debug, Default)]
pub struct OpenOrders(Arc<RwLock<Vec<TradeRecord>>>);

impl OpenOrders {
    /// Replaces the view with the order book's open records.
    pub async fn refresh(&self, order_book: &dyn OrderBook) -> Result<Vec<TradeRecord>, OrderBookError> {
        let records = order_book.open_orders().await?;
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = records.clone();
        Ok(records)
    }

    pub fn all(&self) -> Vec<TradeRecord> {
        self.0.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn get(&self, order_hash: B256) -> Option<TradeRecord> {
        self.0
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|record| record.order_hash == order_hash)
            .cloned()
    }

    pub fn insert(&self, record: TradeRecord) {
        let mut records = self.0.write().unwrap_or_else(PoisonError::into_inner);
        if !records.iter().any(|existing| existing.order_hash == record.order_hash) {
            records.push(record);
        }
    }

    /// Returns whether the record was part of the view.
    pub fn remove(&self, order_hash: B256) -> bool {
        let mut records = self.0.write().unwrap_or_else(PoisonError::into_inner);
        let before = records.len();
        records.retain(|record| record.order_hash != order_hash);
        records.len() != before
    }

    pub fn clear(&self) {
        self.0.write().unwrap_or_else(PoisonError::into_inner).clear();
    }

    pub fn len(&self) -> usize {
        self.0.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
