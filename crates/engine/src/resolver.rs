//! Cross-reference resolution
//!
//! A reference is local when its `locationUrl` is empty or names this node
//! (the configured `node_url` or one of its aliases, trailing slashes
//! ignored). Local references are looked up in storage; everything else
//! goes through a `RemoteFetcher`.
//!
//! A resolved record must agree with the reference's `type`: a kind
//! reference matches any record of that kind, a class reference only
//! records of that class. Disagreement is reported as `TargetNotFound`.

use crate::validation::check_reference_type;
use serde::Deserialize;
use serde_json::Value as Json;
use std::sync::Arc;
use std::time::Duration;
use thingdb_core::{
    CrossRef, PropertyBag, Record, RecordId, RecordKind, RecordStorage, ReferenceError,
    Result, SchemaRegistry, TargetType,
};
use tracing::debug;

fn normalize(url: &str) -> &str {
    url.trim().trim_end_matches('/')
}

/// The URLs under which this node is reachable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeIdentity {
    node_url: String,
    aliases: Vec<String>,
}

impl NodeIdentity {
    /// Identity with a primary URL and extra aliases
    pub fn new<I, S>(node_url: impl Into<String>, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let node_url: String = node_url.into();
        Self {
            node_url: normalize(&node_url).to_string(),
            aliases: aliases
                .into_iter()
                .map(|a| normalize(&a.into()).to_string())
                .collect(),
        }
    }

    /// Primary URL, without trailing slash
    pub fn node_url(&self) -> &str {
        &self.node_url
    }

    /// Whether `location` refers to this node
    pub fn is_local(&self, location: &str) -> bool {
        let location = normalize(location);
        location.is_empty()
            || location == self.node_url
            || self.aliases.iter().any(|a| a == location)
    }
}

/// Fetches records held by other nodes
pub trait RemoteFetcher: Send + Sync {
    /// Fetch record `id` of `kind` from the node at `location`
    ///
    /// `Ok(None)` means the node answered and has no such record.
    ///
    /// # Errors
    ///
    /// `ReferenceError::Timeout` when the node cannot be reached in time,
    /// `ReferenceError::RemoteFailure` when it answers with something else.
    fn fetch(
        &self,
        location: &str,
        kind: RecordKind,
        id: &RecordId,
    ) -> std::result::Result<Option<Record>, ReferenceError>;
}

/// Fetcher for single-node deployments: every remote lookup times out
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRemote;

impl RemoteFetcher for NoRemote {
    fn fetch(
        &self,
        location: &str,
        _kind: RecordKind,
        id: &RecordId,
    ) -> std::result::Result<Option<Record>, ReferenceError> {
        Err(ReferenceError::Timeout {
            id: *id,
            location: location.to_string(),
        })
    }
}

/// Record as served by a peer's REST interface
#[derive(Debug, Deserialize)]
struct RemoteRecord {
    #[serde(alias = "thingId", alias = "actionId", default)]
    id: Option<String>,
    #[serde(rename = "@class")]
    class: String,
    #[serde(rename = "@context", default)]
    context: String,
    #[serde(default)]
    schema: Json,
    #[serde(rename = "creationTimeUnix", default)]
    created_at: Option<i64>,
    #[serde(rename = "lastUpdateTimeUnix", default)]
    updated_at: Option<i64>,
}

impl RemoteRecord {
    fn into_record(self, kind: RecordKind, requested: &RecordId) -> std::result::Result<Record, String> {
        if let Some(id) = &self.id {
            match RecordId::from_string(id) {
                Some(parsed) if parsed == *requested => {}
                Some(parsed) => return Err(format!("asked for {}, got {}", requested, parsed)),
                None => return Err(format!("malformed id '{}'", id)),
            }
        }
        let schema = PropertyBag::from_json(&self.schema).map_err(|e| e.to_string())?;
        let mut record = Record::with_id(*requested, kind, self.class, self.context, schema);
        if let Some(created) = self.created_at {
            record.created_at = created;
        }
        if let Some(updated) = self.updated_at {
            record.updated_at = updated;
        }
        Ok(record)
    }
}

/// `RemoteFetcher` speaking the REST interface of peer nodes
///
/// Issues `GET {location}/weaviate/v1/{things|actions}/{id}` with a bounded
/// timeout. A 404 is "no such record"; connect failures and timeouts are
/// `Timeout`; any other non-success status or an unparseable body is
/// `RemoteFailure`.
#[derive(Debug, Clone)]
pub struct HttpRemoteFetcher {
    agent: ureq::Agent,
}

impl HttpRemoteFetcher {
    /// Fetcher whose requests give up after `timeout`
    pub fn new(timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build();
        Self {
            agent: ureq::Agent::new_with_config(config),
        }
    }

    /// URL of a record on a peer
    pub fn record_url(location: &str, kind: RecordKind, id: &RecordId) -> String {
        format!("{}/weaviate/v1/{}/{}", normalize(location), kind.plural(), id)
    }
}

impl RemoteFetcher for HttpRemoteFetcher {
    fn fetch(
        &self,
        location: &str,
        kind: RecordKind,
        id: &RecordId,
    ) -> std::result::Result<Option<Record>, ReferenceError> {
        let url = Self::record_url(location, kind, id);
        let timeout = || ReferenceError::Timeout {
            id: *id,
            location: location.to_string(),
        };
        let failure = |reason: String| ReferenceError::RemoteFailure {
            location: location.to_string(),
            reason,
        };

        debug!(target: "thingdb::resolver", url = %url, "Fetching remote record");
        let mut response = match self.agent.get(&url).call() {
            Ok(response) => response,
            Err(ureq::Error::StatusCode(404)) => return Ok(None),
            Err(ureq::Error::StatusCode(status)) => {
                return Err(failure(format!("unexpected status {}", status)))
            }
            Err(
                ureq::Error::Timeout(_)
                | ureq::Error::ConnectionFailed
                | ureq::Error::HostNotFound
                | ureq::Error::Io(_),
            ) => return Err(timeout()),
            Err(e) => return Err(failure(e.to_string())),
        };

        let text = response.body_mut().read_to_string().map_err(|e| match e {
            ureq::Error::Timeout(_) => timeout(),
            other => failure(format!("failed to read body: {}", other)),
        })?;
        let body: RemoteRecord = serde_json::from_str(&text)
            .map_err(|e| failure(format!("malformed body: {}", e)))?;
        body.into_record(kind, id).map(Some).map_err(failure)
    }
}

/// Resolves cross-references against local storage or peer nodes
pub struct Resolver {
    identity: NodeIdentity,
    registry: Arc<dyn SchemaRegistry>,
    remote: Arc<dyn RemoteFetcher>,
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}

impl Resolver {
    /// Create a resolver
    pub fn new(
        identity: NodeIdentity,
        registry: Arc<dyn SchemaRegistry>,
        remote: Arc<dyn RemoteFetcher>,
    ) -> Self {
        Self {
            identity,
            registry,
            remote,
        }
    }

    /// This node's identity
    pub fn identity(&self) -> &NodeIdentity {
        &self.identity
    }

    /// Check the reference `type` without looking anything up
    ///
    /// # Errors
    ///
    /// Returns `Reference(InvalidType)` for a type that is neither a kind
    /// nor a known class.
    pub fn validate(&self, cref: &CrossRef) -> Result<()> {
        check_reference_type(self.registry.as_ref(), cref)
    }

    /// Dereference `cref`
    ///
    /// # Errors
    ///
    /// `Reference(InvalidType)`, `Reference(TargetNotFound)`,
    /// `Reference(Timeout)` or `Reference(RemoteFailure)`; storage errors
    /// from a local lookup are passed through.
    pub fn resolve(&self, storage: &dyn RecordStorage, cref: &CrossRef) -> Result<Record> {
        self.validate(cref)?;

        let found = if self.identity.is_local(&cref.location_url) {
            storage.get(&cref.target_id)?
        } else {
            self.resolve_remote(cref)?
        };

        match found {
            Some(record) if Self::matches(&record, &cref.target_type) => {
                debug!(target: "thingdb::resolver", id = %cref.target_id, location = %cref.location_url, "Resolved reference");
                Ok(record)
            }
            _ => Err(ReferenceError::TargetNotFound {
                id: cref.target_id,
                target_type: cref.target_type.to_string(),
                location: cref.location_url.clone(),
            }
            .into()),
        }
    }

    fn resolve_remote(&self, cref: &CrossRef) -> Result<Option<Record>> {
        let kinds: Vec<RecordKind> = match &cref.target_type {
            TargetType::Kind(kind) => vec![*kind],
            TargetType::Class(class) => match self.registry.kind_of(class) {
                Some(kind) => vec![kind],
                None => RecordKind::ALL.to_vec(),
            },
        };
        for kind in kinds {
            if let Some(record) = self
                .remote
                .fetch(&cref.location_url, kind, &cref.target_id)?
            {
                return Ok(Some(record));
            }
        }
        Ok(None)
    }

    fn matches(record: &Record, target_type: &TargetType) -> bool {
        match target_type {
            TargetType::Kind(kind) => record.kind == *kind,
            TargetType::Class(class) => record.class == *class,
        }
    }
}
