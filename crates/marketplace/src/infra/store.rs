use {
    crate::order_book::{OrderBook, OrderBookError, create_in, finalize_in},
    alloy::primitives::B256,
    anyhow::Context,
    model::trade::TradeRecord,
    std::path::{Path, PathBuf},
    tokio::sync::Mutex,
};

/// Order book kept as a JSON array in a single file. Writes go to a sibling
/// temporary file first and replace the original once complete.
#[derive(Debug)]
pub struct FileOrderBook {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileOrderBook {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> anyhow::Result<Vec<TradeRecord>> {
        let contents = match tokio::fs::read(&self.path).await {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => {
                return Err(err).with_context(|| format!("reading {}", self.path.display()));
            }
        };
        serde_json::from_slice(&contents)
            .with_context(|| format!("parsing order book {}", self.path.display()))
    }

    async fn store(&self, records: &[TradeRecord]) -> anyhow::Result<()> {
        let contents = serde_json::to_vec_pretty(records).context("serializing order book")?;
        let temporary = self.path.with_extension("tmp");
        tokio::fs::write(&temporary, contents)
            .await
            .with_context(|| format!("writing {}", temporary.display()))?;
        tokio::fs::rename(&temporary, &self.path)
            .await
            .with_context(|| format!("replacing {}", self.path.display()))
    }
}

#[async_trait::async_trait]
impl OrderBook for FileOrderBook {
    async fn create(&self, record: TradeRecord) -> Result<(), OrderBookError> {
        let _guard = self.lock.lock().await;
        let mut records = self.load().await?;
        let order_hash = record.order_hash;
        create_in(&mut records, record)?;
        self.store(&records).await?;
        tracing::debug!(%order_hash, path = %self.path.display(), "stored trade");
        Ok(())
    }

    async fn open_orders(&self) -> Result<Vec<TradeRecord>, OrderBookError> {
        let _guard = self.lock.lock().await;
        let mut records = self.load().await?;
        records.retain(TradeRecord::is_open);
        Ok(records)
    }

    async fn find(&self, order_hash: B256) -> Result<Option<TradeRecord>, OrderBookError> {
        let _guard = self.lock.lock().await;
        Ok(self
            .load()
            .await?
            .into_iter()
            .find(|record| record.order_hash == order_hash))
    }

    async fn finalize(&self, order_hash: B256) -> Result<(), OrderBookError> {
        let _guard = self.lock.lock().await;
        let mut records = self.load().await?;
        finalize_in(&mut records, order_hash)?;
        self.store(&records).await?;
        tracing::debug!(%order_hash, "finalized trade");
        Ok(())
    }
}
