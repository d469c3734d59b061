use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::Result;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteConnection},
    Connection as SqlConnection,
};
use tokio::sync::{broadcast, Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use tally_data::{Change, Subscribe};

use crate::schema;

/// Capacity of the change channel. Slow subscribers
/// lag behind and skip events beyond this.
const CHANGE_CAPACITY: usize = 64;

/// Removes the database file of a test connection.
struct TestHandle {
    filename: String,
}

impl Drop for TestHandle {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm"] {
            let filename = format!("{}{}", self.filename, suffix);
            let path = Path::new(&filename);
            if path.exists() {
                let _ = fs::remove_file(path);
            }
        }
    }
}

/// A thread safe, cloneable handle to the ledger database.
/// Every write through this handle is announced to
/// subscribers.
#[derive(Clone)]
pub struct Connection {
    conn: Arc<Mutex<SqliteConnection>>,
    changes: broadcast::Sender<Change>,
    _test_handle: Option<Arc<TestHandle>>,
}

impl Connection {
    fn new(conn: SqliteConnection) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CAPACITY);
        Self {
            conn: Arc::new(Mutex::new(conn)),
            changes,
            _test_handle: None,
        }
    }

    /// Open a connection to the database, creating the
    /// file if it does not exist yet.
    pub async fn open(filename: &str) -> Result<Self> {
        let opts = SqliteConnectOptions::from_str(filename)?
            .create_if_missing(true)
            .foreign_keys(true);
        let conn = SqliteConnection::connect_with(&opts).await?;
        debug!(filename, "opened ledger database");
        Ok(Self::new(conn))
    }

    /// Open a new test database connection.
    /// The database will be created on each open and
    /// removed when the last handle is dropped.
    pub async fn open_test() -> Self {
        let filename = format!(
            "{}/tally_test_{}.sqlite3",
            std::env::temp_dir().display(),
            rand::random::<u64>()
        );
        let handle = TestHandle { filename: filename.clone() };

        let mut conn = Self::open(&filename).await.unwrap();
        conn._test_handle = Some(Arc::new(handle));

        // Install the schema
        schema::install(&conn).await.unwrap();
        conn
    }

    /// Acquire the underlying sqlite connection.
    pub async fn lock(&self) -> MutexGuard<'_, SqliteConnection> {
        self.conn.lock().await
    }

    /// Announce a write. Nobody listening is fine.
    pub(crate) fn notify(&self, change: Change) {
        debug!(user_id = %change.user_id, table = ?change.table, "ledger changed");
        let _ = self.changes.send(change);
    }

    /// Register a callback invoked for every change until
    /// the returned task is aborted or the last handle
    /// is dropped.
    pub fn on_change<F>(&self, mut callback: F) -> JoinHandle<()>
    where
        F: FnMut(Change) + Send + 'static,
    {
        let mut changes = self.changes.subscribe();
        tokio::spawn(async move {
            loop {
                match changes.recv().await {
                    Ok(change) => callback(change),
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(skipped = n, "change listener lagged behind");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }
}

impl Subscribe for Connection {
    fn subscribe(&self) -> broadcast::Receiver<Change> {
        self.changes.subscribe()
    }
}
