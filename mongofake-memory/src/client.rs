//! The fake client.
//!
//! A [`Client`] validates its connection inputs the way a real driver does, then
//! "connects" to the first seed without any networking. Databases are created on
//! first access and live as long as the client.
//!
//! # Example
//!
//! ```ignore
//! use bson::doc;
//! use mongofake_memory::Client;
//!
//! let mut client = Client::with_uri("mongodb://localhost:27017/app")?;
//! let users = client.database("app")?.collection("users");
//! users.insert_one(doc! { "name": "Ann" })?;
//! ```

use std::fmt;

use mongofake_core::{
    error::{MongoFakeError, MongoFakeResult},
    options::{ClientOptions, ConnectionString, Node},
};

use crate::{
    database::{Database, check_database_name},
    ordered::OrderedStore,
};

/// Largest document a server would accept, echoed for callers that check it.
pub const MAX_BSON_SIZE: usize = 4 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct Client {
    options: ClientOptions,
    seeds: ConnectionString,
    node: Option<Node>,
    databases: OrderedStore<Database>,
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

impl Client {
    /// Creates a client with default options and no selected node.
    ///
    /// Call [`Client::configure`] and [`Client::connect_node`] to validate inputs, or use
    /// [`Client::connect`] to do both at once.
    pub fn new() -> Self {
        Self {
            options: ClientOptions::default(),
            seeds: ConnectionString::default(),
            node: None,
            databases: OrderedStore::new(),
        }
    }

    /// Builds a client from `options`, selecting a node unless `options.connect` is false.
    ///
    /// # Errors
    ///
    /// - [`MongoFakeError::InvalidUri`] for a malformed host entry
    /// - [`MongoFakeError::Configuration`] when no host is given
    /// - [`MongoFakeError::ConnectionFailure`] when no node can be selected
    pub fn connect(options: ClientOptions) -> MongoFakeResult<Self> {
        let mut client = Self::new();
        let connect = options.connect;
        client.configure(options)?;

        if connect {
            client.connect_node()?;
        }

        Ok(client)
    }

    /// Shorthand for [`Client::connect`] with a single host entry or URI.
    pub fn with_uri(uri: &str) -> MongoFakeResult<Self> {
        Self::connect(ClientOptions::builder().host(uri).build())
    }

    /// Validates `options` and adopts them; the selected node is reset.
    pub fn configure(&mut self, options: ClientOptions) -> MongoFakeResult<()> {
        self.seeds = options.seeds()?;
        self.options = options;
        self.node = None;

        log::debug!("configured client with seeds {:?}", self.seeds.nodes);
        Ok(())
    }

    /// Selects the node to talk to, if not already done, and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`MongoFakeError::ConnectionFailure`] when there is no seed to select.
    pub fn connect_node(&mut self) -> MongoFakeResult<&Node> {
        if self.node.is_none() {
            self.node = Some(self.find_node()?);
        }

        self.node
            .as_ref()
            .ok_or_else(|| MongoFakeError::ConnectionFailure("no node selected".into()))
    }

    fn find_node(&self) -> MongoFakeResult<Node> {
        match self.seeds.nodes.first() {
            Some(node) => {
                log::debug!("connected to {node}");
                Ok(node.clone())
            }
            None => {
                log::error!("could not find a node among {} seed(s)", self.seeds.nodes.len());
                Err(MongoFakeError::ConnectionFailure("could not connect to any configured node".into()))
            }
        }
    }

    /// Host of the selected node.
    pub fn host(&self) -> Option<&str> {
        self.node.as_ref().map(|node| node.host.as_str())
    }

    /// Port of the selected node.
    pub fn port(&self) -> Option<u16> {
        self.node.as_ref().map(|node| node.port)
    }

    /// Every configured seed, in first-seen order.
    pub fn nodes(&self) -> &[Node] {
        &self.seeds.nodes
    }

    /// Database named in the connection string, if any.
    pub fn default_database_name(&self) -> Option<&str> {
        self.seeds.database.as_deref()
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Returns the database called `name`, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns [`MongoFakeError::InvalidName`] for an unusable name.
    pub fn database(&mut self, name: &str) -> MongoFakeResult<&mut Database> {
        check_database_name(name)?;

        Ok(self.databases.get_or_insert_with(name, || Database::named(name)))
    }

    /// Returns the database called `name` without creating it.
    pub fn get_database(&self, name: &str) -> Option<&Database> {
        self.databases.get(name)
    }

    /// Drops a database and everything in it; returns whether it existed.
    ///
    /// Accessing the same name again yields a new, empty database.
    pub fn drop_database(&mut self, name: &str) -> bool {
        let dropped = self.databases.delete(name).is_ok();
        if dropped {
            log::debug!("dropped database {name}");
        }
        dropped
    }

    /// Database names in first-creation order.
    pub fn database_names(&self) -> Vec<String> {
        self.databases.keys().map(str::to_string).collect()
    }

    pub fn max_pool_size(&self) -> u32 {
        self.options.max_pool_size
    }

    pub fn document_class(&self) -> &str {
        &self.options.document_class
    }

    pub fn tz_aware(&self) -> bool {
        self.options.tz_aware
    }

    pub fn max_bson_size(&self) -> usize {
        MAX_BSON_SIZE
    }

    /// Always true; there is no server to lose.
    pub fn alive(&self) -> bool {
        true
    }

    /// Accepted for compatibility. Stored data and the selected node are kept.
    pub fn disconnect(&mut self) {
        log::debug!("disconnect requested; nothing to release");
    }

    /// Same as [`Client::disconnect`].
    pub fn close(&mut self) {
        self.disconnect();
    }
}

impl fmt::Display for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.node, self.seeds.nodes.as_slice()) {
            (Some(node), [_]) => write!(f, "Client('{}', {})", node.host, node.port),
            (_, nodes) => {
                let nodes = nodes
                    .iter()
                    .map(|node| format!("'{node}'"))
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "Client([{nodes}])")
            }
        }
    }
}
