//! Common test utilities

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use cqrs_account::aggregate::Account;
use cqrs_account::api::{self, AppState};
use cqrs_account::bus::{CommandBus, Subscription};
use cqrs_account::domain::{AccountEvent, OperationContext};
use cqrs_account::event_store::{load_aggregate, InMemoryEventStore, PgEventStore};
use cqrs_account::handlers::{AccountCommand, AccountCommandHandler, CommandResponse};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Bus + handler wired to a fresh in-memory store
pub struct TestApp {
    pub bus: CommandBus,
    pub store: Arc<InMemoryEventStore>,
    _subscriptions: Vec<Subscription>,
}

impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(InMemoryEventStore::new());
        let bus = CommandBus::new();
        let subscriptions = Arc::new(AccountCommandHandler::new(store.clone()))
            .subscribe(&bus)
            .expect("fresh bus accepts every subscription");
        Self {
            bus,
            store,
            _subscriptions: subscriptions,
        }
    }

    pub fn router(&self) -> Router {
        api::build_router(AppState {
            bus: self.bus.clone(),
            store: self.store.clone(),
        })
    }

    pub async fn send(&self, command: impl Into<AccountCommand>) -> CommandResponse {
        self.bus.send(command.into(), OperationContext::new()).await
    }
}

/// Given/when/then runner for account commands
pub struct Scenario {
    app: TestApp,
}

impl Scenario {
    pub fn new() -> Self {
        Self { app: TestApp::new() }
    }

    /// Commands that must all succeed before the one under test
    pub async fn given(self, commands: Vec<AccountCommand>) -> Self {
        for command in commands {
            let kind = command.kind();
            if let Err(e) = self.app.send(command).await {
                panic!("given {} failed: {}", kind, e);
            }
        }
        self
    }

    pub async fn when(self, command: impl Into<AccountCommand>) -> Then {
        let command = command.into();
        let account_id = command.account_id();
        let response = self.app.send(command).await;
        Then {
            app: self.app,
            account_id,
            response,
        }
    }
}

pub struct Then {
    app: TestApp,
    account_id: uuid::Uuid,
    pub response: CommandResponse,
}

impl Then {
    pub fn then_events(self, expected: Vec<AccountEvent>) -> Self {
        match &self.response {
            Ok(outcome) => assert_eq!(outcome.events, expected),
            Err(e) => panic!("expected events, got error: {}", e),
        }
        self
    }

    pub fn then_error(self, message: &str) -> Self {
        match &self.response {
            Ok(outcome) => panic!("expected error, got events: {:?}", outcome.events),
            Err(e) => assert_eq!(e.to_string(), message),
        }
        self
    }

    /// Account state rebuilt from the store
    pub async fn account(&self) -> Account {
        load_aggregate::<Account, _>(self.app.store.as_ref(), self.account_id)
            .await
            .expect("stream loads")
            .expect("account exists")
    }

    pub async fn stream_version(&self) -> i64 {
        self.app.store.stream_version(self.account_id).await
    }
}

/// Connect to the test database and make sure the event log exists.
/// Tests use fresh account ids, so streams never collide.
pub async fn setup_test_db() -> PgPool {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to DB");

    cqrs_account::db::ensure_schema(&pool)
        .await
        .expect("Failed to create schema");

    pool
}

pub async fn setup_pg_store() -> PgEventStore {
    PgEventStore::new(setup_test_db().await)
}
