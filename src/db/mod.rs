//! Database handle
//!
//! A thin pool over a tokio-postgres connection. The [`Backend`] owns the
//! client and supervises its background driver task; [`Backend::acquire`]
//! hands out an exclusive [`Conn`] guard so a caller (notably the query
//! executor, for the duration of its transaction) holds the connection
//! alone.

pub mod executor;
pub mod introspect;
pub mod schema;
pub mod types;

use crate::config::{ConnectionConfig, SslMode};
use crate::error::{EditorError, EditorResult};
use log::error;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio_postgres::Client;

/// Backend connection supervisor
pub struct Backend {
    client: Arc<Mutex<Client>>,
    /// Token for cancelling in-flight queries
    cancel_token: tokio_postgres::CancelToken,
    /// SSL mode (needed to cancel over the right transport)
    ssl_mode: SslMode,
    /// Cleared when the background connection task exits with an error
    alive: Arc<AtomicBool>,
}

/// Exclusive connection guard handed out by [`Backend::acquire`].
///
/// Derefs to the underlying [`Client`]; taking it mutably gives access to
/// `Client::transaction`.
pub struct Conn {
    guard: OwnedMutexGuard<Client>,
}

impl Deref for Conn {
    type Target = Client;

    fn deref(&self) -> &Client {
        &self.guard
    }
}

impl DerefMut for Conn {
    fn deref_mut(&mut self) -> &mut Client {
        &mut self.guard
    }
}

impl Backend {
    /// Connect to a PostgreSQL database.
    ///
    /// Spawns the background connection task and watches it: once the task
    /// exits with an error (server restart, idle timeout), subsequent
    /// `acquire` calls fail with `BackendUnavailable`.
    pub async fn connect(config: &ConnectionConfig) -> EditorResult<Self> {
        let conn_string = config.connection_string_with_password();
        let alive = Arc::new(AtomicBool::new(true));

        let client = match config.ssl_mode {
            SslMode::Disable => {
                let (client, connection) =
                    tokio_postgres::connect(&conn_string, tokio_postgres::NoTls)
                        .await
                        .map_err(|e| EditorError::ConnectionFailed(e.to_string()))?;
                let alive = Arc::clone(&alive);
                tokio::spawn(async move {
                    if let Err(e) = connection.await {
                        error!("database connection lost: {}", e);
                        alive.store(false, Ordering::SeqCst);
                    }
                });
                client
            }
            SslMode::Prefer | SslMode::Require => {
                let tls = tokio_postgres_rustls::MakeRustlsConnect::new(make_tls_config());
                let (client, connection) = tokio_postgres::connect(&conn_string, tls)
                    .await
                    .map_err(|e| EditorError::ConnectionFailed(e.to_string()))?;
                let alive = Arc::clone(&alive);
                tokio::spawn(async move {
                    if let Err(e) = connection.await {
                        error!("database connection lost: {}", e);
                        alive.store(false, Ordering::SeqCst);
                    }
                });
                client
            }
        };

        let cancel_token = client.cancel_token();

        Ok(Self {
            client: Arc::new(Mutex::new(client)),
            cancel_token,
            ssl_mode: config.ssl_mode,
            alive,
        })
    }

    /// Obtain exclusive use of the pooled connection.
    ///
    /// Suspends until the connection is free. Fails with
    /// `BackendUnavailable` once the background connection task has died.
    pub async fn acquire(&self) -> EditorResult<Conn> {
        if !self.alive.load(Ordering::SeqCst) {
            return Err(EditorError::BackendUnavailable(
                "database connection lost".to_string(),
            ));
        }
        let guard = Arc::clone(&self.client).lock_owned().await;
        Ok(Conn { guard })
    }

    /// Send a cancel request for the currently running query.
    pub async fn cancel_query(&self) -> EditorResult<()> {
        match self.ssl_mode {
            SslMode::Disable => self.cancel_token.cancel_query(tokio_postgres::NoTls).await,
            SslMode::Prefer | SslMode::Require => {
                let tls = tokio_postgres_rustls::MakeRustlsConnect::new(make_tls_config());
                self.cancel_token.cancel_query(tls).await
            }
        }
        .map_err(|e| EditorError::BackendUnavailable(format!("Cancel failed: {}", e)))
    }
}

/// Build a rustls ClientConfig that trusts OS certificates (with Mozilla roots as fallback)
fn make_tls_config() -> rustls::ClientConfig {
    let mut root_store = rustls::RootCertStore::empty();

    let native_certs = rustls_native_certs::load_native_certs();
    let mut loaded = 0;
    for cert in native_certs.certs {
        if root_store.add(cert).is_ok() {
            loaded += 1;
        }
    }
    if loaded == 0 {
        root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    }

    rustls::ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth()
}
