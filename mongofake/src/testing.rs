//! Process-wide fake client for test suites.
//!
//! Code that cannot thread a [`Client`] through explicitly can share one here. The
//! slot is empty until [`set_up`] fills it and [`tear_down`] empties it again; every
//! accessor fails with [`MongoFakeError::Configuration`] outside that window.
//!
//! ```ignore
//! use mongofake::{bson::doc, testing};
//!
//! testing::set_up()?;
//! testing::with_test_collection("users", |users| users.insert_one(doc! { "name": "Ann" }))??;
//! testing::tear_down();
//! ```

use parking_lot::{Mutex, MutexGuard, const_mutex};

use mongofake_core::{
    error::{MongoFakeError, MongoFakeResult},
    options::{ClientOptions, DEFAULT_HOST},
};
use mongofake_memory::{Client, Collection, Database};

/// Database every harness helper works in.
pub const TEST_DB_NAME: &str = "mongofake_test_database";

/// Port the harness client claims to be connected to.
pub const TEST_PORT: u16 = 45017;

static TEST_CLIENT: Mutex<Option<Client>> = const_mutex(None);

fn slot() -> MutexGuard<'static, Option<Client>> {
    TEST_CLIENT.lock()
}

fn not_set_up() -> MongoFakeError {
    log::warn!("test harness used before set_up");
    MongoFakeError::Configuration("test harness is not set up".into())
}

/// Installs a fresh client, replacing any previous one and its data.
pub fn set_up() -> MongoFakeResult<()> {
    let options = ClientOptions::builder()
        .host(DEFAULT_HOST)
        .port(TEST_PORT)
        .build();
    let client = Client::connect(options)?;

    log::debug!("test harness set up with {client}");
    *slot() = Some(client);

    Ok(())
}

/// Drops the shared client and all of its data.
pub fn tear_down() {
    if slot().take().is_some() {
        log::debug!("test harness torn down");
    }
}

pub fn is_set_up() -> bool {
    slot().is_some()
}

/// Runs `f` with the shared client.
pub fn with_test_client<R>(f: impl FnOnce(&mut Client) -> R) -> MongoFakeResult<R> {
    let mut guard = slot();
    let client = guard.as_mut().ok_or_else(not_set_up)?;

    Ok(f(client))
}

/// Runs `f` with the [`TEST_DB_NAME`] database of the shared client.
pub fn with_test_database<R>(f: impl FnOnce(&mut Database) -> R) -> MongoFakeResult<R> {
    with_test_client(|client| client.database(TEST_DB_NAME).map(f))?
}

/// Runs `f` with collection `name` of the test database.
pub fn with_test_collection<R>(name: &str, f: impl FnOnce(&mut Collection) -> R) -> MongoFakeResult<R> {
    with_test_database(|database| f(database.collection(name)))
}

/// Drops the test database; returns whether it existed.
pub fn drop_test_database() -> MongoFakeResult<bool> {
    with_test_client(|client| client.drop_database(TEST_DB_NAME))
}
