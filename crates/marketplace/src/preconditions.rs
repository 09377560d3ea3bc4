//! Proxy registration and asset approvals an account needs before the
//! exchange can move its assets.
//!
//! Every check reads the current state first and only writes when something
//! is missing, so running them repeatedly is cheap.

use {
    crate::{
        Error,
        boundary::{ChainRead, ChainWrite, TxOptions, TxReceipt, submit},
    },
    alloy::primitives::{Address, U256},
    std::sync::Arc,
    tracing::instrument,
};

#[derive(Clone)]
pub struct Preconditions {
    read: Arc<dyn ChainRead>,
    write: Arc<dyn ChainWrite>,
    gas_limit: u64,
}

impl Preconditions {
    pub fn new(read: Arc<dyn ChainRead>, write: Arc<dyn ChainWrite>, gas_limit: u64) -> Self {
        Self {
            read,
            write,
            gas_limit,
        }
    }

    fn tx(&self, from: Address) -> TxOptions {
        TxOptions {
            from,
            gas_limit: self.gas_limit,
        }
    }

    /// Returns the proxy of `account`, registering one first if there is
    /// none.
    #[instrument(skip(self))]
    pub async fn ensure_proxy(&self, account: Address) -> Result<Address, Error> {
        let proxy = self.read.proxy_of(account).await?;
        if !proxy.is_zero() {
            tracing::debug!(%proxy, "proxy already registered");
            return Ok(proxy);
        }

        let write = self.write.clone();
        let tx = self.tx(account);
        let receipt = submit("register proxy", async move { write.register_proxy(tx).await }).await?;
        ensure_success("register proxy", receipt)?;

        let proxy = self.read.proxy_of(account).await?;
        if proxy.is_zero() {
            return Err(Error::ProxyMissing(account));
        }
        tracing::info!(%proxy, "registered proxy");
        Ok(proxy)
    }

    /// Makes sure `spender` may move at least `amount` of `token` on behalf
    /// of `account`.
    #[instrument(skip(self))]
    pub async fn ensure_allowance(
        &self,
        account: Address,
        spender: Address,
        token: Address,
        amount: U256,
    ) -> Result<(), Error> {
        let allowance = self.read.allowance(token, account, spender).await?;
        if allowance >= amount {
            tracing::debug!(%allowance, "allowance sufficient");
            return Ok(());
        }

        let write = self.write.clone();
        let tx = self.tx(account);
        let receipt = submit("approve", async move {
            write.approve(token, spender, amount, tx).await
        })
        .await?;
        ensure_success("approve", receipt)
    }

    /// Makes sure `operator` may transfer any token of `collection` owned by
    /// `owner`.
    #[instrument(skip(self))]
    pub async fn ensure_approval_for_all(
        &self,
        owner: Address,
        collection: Address,
        operator: Address,
    ) -> Result<(), Error> {
        if self
            .read
            .is_approved_for_all(collection, owner, operator)
            .await?
        {
            tracing::debug!("operator already approved");
            return Ok(());
        }

        let write = self.write.clone();
        let tx = self.tx(owner);
        let receipt = submit("set approval for all", async move {
            write.set_approval_for_all(collection, operator, tx).await
        })
        .await?;
        ensure_success("set approval for all", receipt)
    }
}

fn ensure_success(action: &'static str, receipt: TxReceipt) -> Result<(), Error> {
    if receipt.success {
        Ok(())
    } else {
        Err(Error::PreconditionReverted {
            action,
            tx: receipt.hash,
        })
    }
}
