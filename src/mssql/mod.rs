// ABOUTME: SQL Server connection handling for data export
// ABOUTME: Parses the positional connection string and opens a tiberius client

pub mod converter;
pub mod reader;

pub use reader::MssqlSource;

use anyhow::{bail, Context, Result};
use std::fmt;
use tiberius::{AuthMethod, Client, Config};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

const CONNECTION_FORMAT: &str = "<username>:<password>@<address>:<port>/<database>";

/// Connection parameters parsed from `<username>:<password>@<address>:<port>/<database>`
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionDetails {
    pub username: String,
    pub password: String,
    pub address: String,
    pub port: u16,
    pub database: String,
}

impl ConnectionDetails {
    /// Parse the positional connection argument
    ///
    /// The username ends at the first `:`, the password at the first `@`
    /// after it, the database starts after the first `/` that follows the
    /// address, and the port is everything after the last `:` of the address.
    ///
    /// # Examples
    ///
    /// ```
    /// # use sqldatadump::mssql::ConnectionDetails;
    /// let details = ConnectionDetails::parse("sa:secret@db.local:1433/shop").unwrap();
    /// assert_eq!(details.username, "sa");
    /// assert_eq!(details.address, "db.local");
    /// assert_eq!(details.port, 1433);
    /// assert_eq!(details.database, "shop");
    ///
    /// assert!(ConnectionDetails::parse("db.local/shop").is_err());
    /// ```
    pub fn parse(connection_string: &str) -> Result<Self> {
        if connection_string.trim().is_empty() {
            bail!(
                "Connection string cannot be empty.\nExpected format: {}",
                CONNECTION_FORMAT
            );
        }

        let invalid = || {
            anyhow::anyhow!(
                "Invalid connection string.\nExpected format: {}",
                CONNECTION_FORMAT
            )
        };

        let (username, rest) = connection_string.split_once(':').ok_or_else(invalid)?;
        let (password, rest) = rest.split_once('@').ok_or_else(invalid)?;
        let (host_and_port, database) = rest.split_once('/').ok_or_else(invalid)?;
        let (address, port) = host_and_port.rsplit_once(':').ok_or_else(invalid)?;

        if username.is_empty() {
            bail!("Connection string is missing a username");
        }
        if address.is_empty() {
            bail!("Connection string is missing a server address");
        }
        if database.is_empty() {
            bail!("Connection string is missing a database name");
        }

        let port = port
            .parse::<u16>()
            .with_context(|| format!("Invalid port number: {}", port))?;

        Ok(Self {
            username: username.to_string(),
            password: password.to_string(),
            address: address.to_string(),
            port,
            database: database.to_string(),
        })
    }
}

impl fmt::Debug for ConnectionDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionDetails")
            .field("username", &self.username)
            .field("password", &"***")
            .field("address", &self.address)
            .field("port", &self.port)
            .field("database", &self.database)
            .finish()
    }
}

/// Open a SQL Server connection
///
/// # Errors
///
/// Returns error if the TCP connection cannot be established or the server
/// rejects the login.
#[tracing::instrument(skip(details), fields(address = %details.address, port = details.port, database = %details.database))]
pub async fn connect(
    details: &ConnectionDetails,
    trust_cert: bool,
) -> Result<Client<Compat<TcpStream>>> {
    tracing::info!("Connecting to SQL Server");

    let mut config = Config::new();
    config.host(&details.address);
    config.port(details.port);
    config.database(&details.database);
    config.authentication(AuthMethod::sql_server(
        &details.username,
        &details.password,
    ));
    if trust_cert {
        config.trust_cert();
    }

    let tcp = TcpStream::connect(config.get_addr())
        .await
        .with_context(|| {
            format!(
                "Failed to reach SQL Server at {}:{}",
                details.address, details.port
            )
        })?;
    tcp.set_nodelay(true)
        .context("Failed to configure SQL Server socket")?;

    let client = Client::connect(config, tcp.compat_write())
        .await
        .with_context(|| {
            format!(
                "Failed to log in to database '{}' as '{}'",
                details.database, details.username
            )
        })?;

    tracing::debug!("Successfully connected to SQL Server");

    Ok(client)
}
