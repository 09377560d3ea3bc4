//! The connected account and chain, and notifications when either changes.
//!
//! Handlers are owned by their [`Subscription`]: dropping it unregisters the
//! handler.

use {
    crate::{Error, boundary::ChainRead},
    alloy::primitives::Address,
    std::{
        collections::BTreeMap,
        sync::{Arc, Mutex, PoisonError, Weak},
    },
};

type AccountHandler = Arc<dyn Fn(Option<Address>) + Send + Sync>;
type ChainHandler = Arc<dyn Fn(u64) + Send + Sync>;

#[derive(Default)]
struct Handlers {
    next_id: u64,
    account: BTreeMap<u64, AccountHandler>,
    chain: BTreeMap<u64, ChainHandler>,
}

struct Inner {
    expected_chain_id: u64,
    state: Mutex<State>,
    handlers: Mutex<Handlers>,
}

#[derive(Clone, Copy, Debug)]
struct State {
    account: Option<Address>,
    chain_id: u64,
}

#[derive(Clone)]
pub struct Session {
    inner: Arc<Inner>,
}

impl Session {
    pub fn new(expected_chain_id: u64, chain_id: u64, account: Option<Address>) -> Self {
        Self {
            inner: Arc::new(Inner {
                expected_chain_id,
                state: Mutex::new(State { account, chain_id }),
                handlers: Mutex::default(),
            }),
        }
    }

    /// Starts a session on whatever chain the node is connected to.
    pub async fn connect(
        read: &dyn ChainRead,
        expected_chain_id: u64,
        account: Option<Address>,
    ) -> Result<Self, Error> {
        let chain_id = read.chain_id().await?;
        tracing::info!(chain_id, expected_chain_id, ?account, "session connected");
        Ok(Self::new(expected_chain_id, chain_id, account))
    }

    fn state(&self) -> State {
        *self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn chain_id(&self) -> u64 {
        self.state().chain_id
    }

    pub fn expected_chain_id(&self) -> u64 {
        self.inner.expected_chain_id
    }

    /// The connected account.
    pub fn account(&self) -> Result<Address, Error> {
        self.state().account.ok_or(Error::NoAccount)
    }

    /// Fails unless the session is on the expected chain.
    pub fn ensure_network(&self) -> Result<(), Error> {
        let actual = self.chain_id();
        if actual != self.inner.expected_chain_id {
            return Err(Error::WrongNetwork {
                expected: self.inner.expected_chain_id,
                actual,
            });
        }
        Ok(())
    }

    pub fn set_account(&self, account: Option<Address>) {
        {
            let mut state = self.inner.state.lock().unwrap_or_else(PoisonError::into_inner);
            if state.account == account {
                return;
            }
            state.account = account;
        }
        tracing::info!(?account, "account changed");
        let handlers: Vec<_> = self.handlers().account.values().cloned().collect();
        for handler in handlers {
            handler(account);
        }
    }

    pub fn set_chain_id(&self, chain_id: u64) {
        {
            let mut state = self.inner.state.lock().unwrap_or_else(PoisonError::into_inner);
            if state.chain_id == chain_id {
                return;
            }
            state.chain_id = chain_id;
        }
        tracing::info!(chain_id, "chain changed");
        let handlers: Vec<_> = self.handlers().chain.values().cloned().collect();
        for handler in handlers {
            handler(chain_id);
        }
    }

    #[must_use = "dropping the subscription unregisters the handler"]
    pub fn on_account_changed(
        &self,
        handler: impl Fn(Option<Address>) + Send + Sync + 'static,
    ) -> Subscription {
        let mut handlers = self.handlers();
        let id = handlers.next_id;
        handlers.next_id += 1;
        handlers.account.insert(id, Arc::new(handler));
        self.subscription(Kind::Account, id)
    }

    #[must_use = "dropping the subscription unregisters the handler"]
    pub fn on_chain_changed(&self, handler: impl Fn(u64) + Send + Sync + 'static) -> Subscription {
        let mut handlers = self.handlers();
        let id = handlers.next_id;
        handlers.next_id += 1;
        handlers.chain.insert(id, Arc::new(handler));
        self.subscription(Kind::Chain, id)
    }

    fn handlers(&self) -> std::sync::MutexGuard<'_, Handlers> {
        self.inner
            .handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn subscription(&self, kind: Kind, id: u64) -> Subscription {
        Subscription {
            session: Arc::downgrade(&self.inner),
            kind,
            id,
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum Kind {
    Account,
    Chain,
}

/// Keeps a session handler registered for as long as it lives.
pub struct Subscription {
    session: Weak<Inner>,
    kind: Kind,
    id: u64,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let Some(session) = self.session.upgrade() else {
            return;
        };
        let mut handlers = session
            .handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        // Handlers may own subscriptions themselves, so they are dropped only
        // after the lock is released.
        let removed = match self.kind {
            Kind::Account => (handlers.account.remove(&self.id), None),
            Kind::Chain => (None, handlers.chain.remove(&self.id)),
        };
        drop(handlers);
        drop(removed);
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::boundary::MockChainRead,
        std::sync::atomic::{AtomicU64, AtomicUsize, Ordering},
    };

    #[test]
    fn checks_network_and_account() {
        let session = Session::new(4, 1, None);
        assert!(matches!(
            session.ensure_network(),
            Err(Error::WrongNetwork {
                expected: 4,
                actual: 1
            })
        ));
        assert!(matches!(session.account(), Err(Error::NoAccount)));

        session.set_chain_id(4);
        session.set_account(Some(Address::repeat_byte(1)));
        session.ensure_network().unwrap();
        assert_eq!(session.account().unwrap(), Address::repeat_byte(1));
    }

    #[test]
    fn notifies_until_unsubscribed() {
        let session = Session::new(4, 4, None);
        let calls = Arc::new(AtomicUsize::new(0));
        let last_chain = Arc::new(AtomicU64::new(0));

        let counter = calls.clone();
        let account_subscription = session.on_account_changed(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let last = last_chain.clone();
        let chain_subscription = session.on_chain_changed(move |chain_id| {
            last.store(chain_id, Ordering::SeqCst);
        });

        session.set_account(Some(Address::repeat_byte(1)));
        // unchanged values do not notify
        session.set_account(Some(Address::repeat_byte(1)));
        session.set_chain_id(5);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(last_chain.load(Ordering::SeqCst), 5);

        drop(account_subscription);
        drop(chain_subscription);
        session.set_account(None);
        session.set_chain_id(4);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(last_chain.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn handlers_may_subscribe_while_notified() {
        let session = Session::new(4, 4, None);
        let inner = session.clone();
        let nested = Arc::new(Mutex::new(Vec::new()));
        let keep = nested.clone();
        let _subscription = session.on_chain_changed(move |_| {
            let subscription = inner.on_account_changed(|_| {});
            keep.lock().unwrap().push(subscription);
        });
        session.set_chain_id(1);
        assert_eq!(nested.lock().unwrap().len(), 1);
    }

    #[test]
    fn dropping_a_handler_that_owns_a_subscription() {
        let session = Session::new(4, 4, None);
        let (done, finished) = std::sync::mpsc::channel();

        let inner = session.clone();
        std::thread::spawn(move || {
            let account_subscription = inner.on_account_changed(|_| {});
            let chain_subscription = inner.on_chain_changed(move |_| {
                let _owned = &account_subscription;
            });
            drop(chain_subscription);
            done.send(()).unwrap();
        });

        finished
            .recv_timeout(std::time::Duration::from_secs(3))
            .expect("unsubscribing deadlocked");
        assert!(session.handlers().account.is_empty());
        assert!(session.handlers().chain.is_empty());
    }

    #[tokio::test]
    async fn connects_to_the_node_chain() {
        let mut read = MockChainRead::new();
        read.expect_chain_id().returning(|| Ok(4));
        let session = Session::connect(&read, 4, Some(Address::repeat_byte(1)))
            .await
            .unwrap();
        assert_eq!(session.chain_id(), 4);
        session.ensure_network().unwrap();
    }
}
