//! Command Bus
//!
//! In-process dispatch of account commands to the handler subscribed for
//! their kind. Each subscription processes one command at a time; dropping
//! the `Subscription` removes the route.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, Weak};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::OperationContext;
use crate::error::{AppError, AppResult};
use crate::handlers::{AccountCommand, CommandKind, CommandResponse};

/// Handles commands delivered by the bus
#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn handle(&self, command: AccountCommand, context: OperationContext) -> CommandResponse;
}

struct Route {
    id: u64,
    handler: Arc<dyn CommandHandler>,
    /// Held for the duration of one delivery
    gate: Arc<Mutex<()>>,
}

#[derive(Default)]
struct Routes {
    by_kind: RwLock<HashMap<CommandKind, Route>>,
    next_id: AtomicU64,
}

/// Command bus shared by the HTTP layer and tests
#[derive(Clone, Default)]
pub struct CommandBus {
    routes: Arc<Routes>,
}

impl CommandBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route commands of `kind` to `handler` until the returned
    /// subscription is dropped.
    pub fn subscribe(
        &self,
        kind: CommandKind,
        handler: Arc<dyn CommandHandler>,
    ) -> AppResult<Subscription> {
        let mut by_kind = self
            .routes
            .by_kind
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        if by_kind.contains_key(&kind) {
            return Err(AppError::DuplicateSubscription(kind));
        }

        let id = self.routes.next_id.fetch_add(1, Ordering::Relaxed);
        by_kind.insert(
            kind,
            Route {
                id,
                handler,
                gate: Arc::new(Mutex::new(())),
            },
        );
        tracing::debug!(command = %kind, subscription = id, "Handler subscribed");

        Ok(Subscription {
            kind,
            id,
            routes: Arc::downgrade(&self.routes),
        })
    }

    /// Whether a handler is currently subscribed for `kind`
    pub fn is_routed(&self, kind: CommandKind) -> bool {
        self.routes
            .by_kind
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&kind)
    }

    /// Deliver a command and wait for its outcome.
    ///
    /// The context gets a command id and a correlation id if it lacks them.
    /// A handler that panics yields `AppError::Internal`.
    pub async fn send(&self, command: AccountCommand, mut context: OperationContext) -> CommandResponse {
        let kind = command.kind();

        let route = self
            .routes
            .by_kind
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&kind)
            .map(|route| (route.handler.clone(), route.gate.clone()));

        let Some((handler, gate)) = route else {
            tracing::warn!(command = %kind, "No handler subscribed");
            return Err(AppError::NoHandler(kind));
        };

        let command_id = context.ensure_command_id();
        let correlation_id = context.ensure_correlation_id();
        tracing::debug!(
            command = %kind,
            account_id = %command.account_id(),
            %command_id,
            %correlation_id,
            "Command received"
        );

        // The delivery runs on its own task so the gate is released only
        // when the handler finishes, even if the caller goes away.
        let delivery = tokio::spawn(async move {
            let _guard = gate.lock_owned().await;
            handler.handle(command, context).await
        });

        delivery.await.map_err(|e| {
            tracing::error!(command = %kind, error = %e, "Command handler aborted");
            AppError::Internal(format!("handler for {} aborted: {}", kind, e))
        })?
    }
}

/// Keeps a route alive; dropping it unsubscribes the handler
#[must_use = "dropping the subscription unsubscribes the handler"]
pub struct Subscription {
    kind: CommandKind,
    id: u64,
    routes: Weak<Routes>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let Some(routes) = self.routes.upgrade() else {
            return;
        };
        let mut by_kind = routes
            .by_kind
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        if by_kind.get(&self.kind).is_some_and(|route| route.id == self.id) {
            by_kind.remove(&self.kind);
            tracing::debug!(command = %self.kind, subscription = self.id, "Handler unsubscribed");
        }
    }
}
