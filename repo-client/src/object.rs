use std::str::FromStr;

use futures::TryStreamExt;
use reqwest::Method;
use tokio::io::{AsyncRead, AsyncWriteExt};
use tokio_util::io::{ReaderStream, StreamReader};
use tracing::{debug, info, instrument};

use crate::client::{is_status_success, RepositoryClient};
use crate::error::{RepositoryError, Result};
use crate::profile::{DatastreamProfile, ObjectProfile};

const RDF_NS: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
const MODEL_NS: &str = "info:fedora/fedora-system:def/model#";

const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Storage mode of a datastream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlGroup {
    Managed,
    InlineXml,
    Redirect,
    ExternalRef,
}

impl ControlGroup {
    pub fn code(&self) -> &'static str {
        match self {
            ControlGroup::Managed => "M",
            ControlGroup::InlineXml => "X",
            ControlGroup::Redirect => "R",
            ControlGroup::ExternalRef => "E",
        }
    }
}

impl FromStr for ControlGroup {
    type Err = RepositoryError;

    fn from_str(s: &str) -> Result<ControlGroup> {
        match s {
            "M" => Ok(ControlGroup::Managed),
            "X" => Ok(ControlGroup::InlineXml),
            "R" => Ok(ControlGroup::Redirect),
            "E" => Ok(ControlGroup::ExternalRef),
            other => Err(RepositoryError::InvalidArgument(format!(
                "invalid control group {:?}, expected one of M, X, R, E",
                other
            ))),
        }
    }
}

/// One lazily fetched view scoped to an [`ObjectHandle`]. A populated slot is
/// authoritative until a mutating call invalidates it; it is never
/// re-validated against the server otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheSlot<T> {
    Unfetched,
    Populated(T),
    Invalidated,
}

impl<T> CacheSlot<T> {
    fn populated(&self) -> Option<&T> {
        match self {
            CacheSlot::Populated(value) => Some(value),
            CacheSlot::Unfetched | CacheSlot::Invalidated => None,
        }
    }

    fn invalidate(&mut self) {
        *self = CacheSlot::Invalidated;
    }
}

/// Cached, mutation-aware view of one remote object.
///
/// The handle is bound to an object id at construction (which validates that
/// the id resolves) and caches the object profile, content-model list and
/// datastream-id list for its lifetime. Mutating calls selectively invalidate
/// or update those caches. After [`purge`](Self::purge) the handle is
/// permanently inert and every operation fails with
/// [`RepositoryError::InvalidState`].
///
/// The caches are instance-scoped and the methods take `&mut self`; a handle
/// is not meant to be shared between tasks.
#[derive(Debug)]
pub struct ObjectHandle<'c> {
    client: &'c RepositoryClient,
    id: Option<String>,
    read_only: bool,
    profile: CacheSlot<ObjectProfile>,
    content_models: CacheSlot<Vec<String>>,
    datastream_ids: CacheSlot<Vec<String>>,
}

impl<'c> ObjectHandle<'c> {
    pub(crate) async fn bind(
        client: &'c RepositoryClient,
        id: &str,
        read_only: bool,
    ) -> Result<ObjectHandle<'c>> {
        match fetch_profile(client, id).await? {
            Some(profile) => Ok(ObjectHandle {
                client,
                id: Some(id.to_string()),
                read_only,
                profile: CacheSlot::Populated(profile),
                content_models: CacheSlot::Unfetched,
                datastream_ids: CacheSlot::Unfetched,
            }),
            None => Err(RepositoryError::NotFound(id.to_string())),
        }
    }

    /// The bound object id, or None once the object has been purged.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    fn bound_id(&self) -> Result<String> {
        self.id.clone().ok_or(RepositoryError::InvalidState)
    }

    fn check_mutable(&self) -> Result<()> {
        if self.read_only {
            return Err(RepositoryError::InvalidArgument(
                "object handle is read-only".to_string(),
            ));
        }
        Ok(())
    }

    /// The object profile, fetched once and cached for the handle's life.
    pub async fn profile(&mut self) -> Result<Option<ObjectProfile>> {
        let id = self.bound_id()?;
        if let Some(profile) = self.profile.populated() {
            return Ok(Some(profile.clone()));
        }
        match fetch_profile(self.client, &id).await? {
            Some(profile) => {
                self.profile = CacheSlot::Populated(profile.clone());
                Ok(Some(profile))
            }
            None => Ok(None),
        }
    }

    /// Ids of the object's datastreams. The first call fetches and parses the
    /// datastream listing; subsequent calls return the cache.
    pub async fn list_datastreams(&mut self) -> Result<Vec<String>> {
        let id = self.bound_id()?;
        if let Some(ids) = self.datastream_ids.populated() {
            return Ok(ids.clone());
        }
        let url = self.client.url(&format!("objects/{}/datastreams", id));
        let response = self
            .client
            .request(Method::GET, &url)
            .query(&[("format", "xml")])
            .send()
            .await?;
        let status = response.status();
        if !is_status_success(status) {
            return Err(RepositoryError::Status { url, status });
        }
        let body = response.text().await?;
        let doc = roxmltree::Document::parse(&body)?;
        let ids: Vec<String> = doc
            .root_element()
            .children()
            .filter(|n| n.is_element() && n.tag_name().name() == "datastream")
            .filter_map(|n| n.attribute("dsid"))
            .map(str::to_string)
            .collect();
        self.datastream_ids = CacheSlot::Populated(ids.clone());
        Ok(ids)
    }

    /// The content of a datastream as a byte stream. Always fetches fresh,
    /// nothing is cached.
    pub async fn datastream(
        &self,
        ds_id: &str,
    ) -> Result<impl AsyncRead + Unpin + Send + std::fmt::Debug> {
        let id = self.bound_id()?;
        let url = self
            .client
            .url(&format!("objects/{}/datastreams/{}/content", id, ds_id));
        let response = self.client.request(Method::GET, &url).send().await?;
        let status = response.status();
        if !is_status_success(status) {
            return Err(RepositoryError::Status { url, status });
        }
        let stream = response.bytes_stream().map_err(|e| {
            let kind = if e.is_timeout() {
                std::io::ErrorKind::TimedOut
            } else {
                std::io::ErrorKind::Other
            };
            tokio::io::Error::new(kind, e)
        });
        Ok(DatastreamReader(StreamReader::new(stream)))
    }

    /// URIs of the content models the object asserts, parsed from its
    /// relationship datastream. Cached until a relationship mutation clears
    /// the cache.
    pub async fn content_model_uris(&mut self) -> Result<Vec<String>> {
        let id = self.bound_id()?;
        if let Some(models) = self.content_models.populated() {
            return Ok(models.clone());
        }
        let url = self.client.url(&format!("get/{}/RELS-EXT", id));
        let response = self.client.request(Method::GET, &url).send().await?;
        let status = response.status();
        if !is_status_success(status) {
            return Err(RepositoryError::Status { url, status });
        }
        let body = response.text().await?;
        let doc = roxmltree::Document::parse(&body)?;
        let description = doc.descendants().find(|n| {
            n.is_element()
                && n.tag_name().name() == "Description"
                && n.tag_name().namespace() == Some(RDF_NS)
        });
        let models: Vec<String> = match description {
            Some(description) => description
                .descendants()
                .filter(|n| {
                    n.is_element()
                        && n.tag_name().name() == "hasModel"
                        && n.tag_name().namespace() == Some(MODEL_NS)
                })
                .filter_map(|n| n.attribute((RDF_NS, "resource")))
                .map(str::to_string)
                .collect(),
            None => Vec::new(),
        };
        self.content_models = CacheSlot::Populated(models.clone());
        Ok(models)
    }

    /// Profile of a single datastream. Not cached.
    pub async fn datastream_profile(&self, ds_id: &str) -> Result<DatastreamProfile> {
        let id = self.bound_id()?;
        let url = self
            .client
            .url(&format!("objects/{}/datastreams/{}", id, ds_id));
        let response = self
            .client
            .request(Method::GET, &url)
            .query(&[("format", "xml")])
            .send()
            .await?;
        let status = response.status();
        if !is_status_success(status) {
            return Err(RepositoryError::Status { url, status });
        }
        let body = response.text().await?;
        DatastreamProfile::from_xml(&body)
    }

    /// Adds or replaces a datastream whose content the repository retrieves
    /// from `ds_location`. Whether this issues a create or a replace request
    /// is decided from the cached datastream-id list (fetching it first if
    /// unfetched); a stale cache can misroute a replace as a create, which is
    /// accepted for compatibility with existing deployments.
    #[instrument(skip(self))]
    pub async fn add_or_replace_datastream_by_reference(
        &mut self,
        ds_id: &str,
        ds_location: &str,
        control_group: &str,
        mime_type: Option<&str>,
    ) -> Result<()> {
        let control_group: ControlGroup = control_group.parse()?;
        self.check_mutable()?;
        let id = self.bound_id()?;
        let mime_type = mime_type.unwrap_or(DEFAULT_MIME_TYPE);
        let exists = self
            .list_datastreams()
            .await?
            .iter()
            .any(|existing| existing == ds_id);
        let method = if exists { Method::PUT } else { Method::POST };
        let url = self
            .client
            .url(&format!("objects/{}/datastreams/{}", id, ds_id));
        let response = self
            .client
            .request(method, &url)
            .query(&[
                ("controlGroup", control_group.code()),
                ("mimeType", mime_type),
                ("dsLocation", ds_location),
            ])
            .send()
            .await?;
        let status = response.status();
        if !is_status_success(status) {
            return Err(RepositoryError::Status { url, status });
        }
        self.record_datastream(ds_id);
        Ok(())
    }

    /// Adds or replaces a datastream with the given content, transmitted as a
    /// multipart body. The content is spooled through a temporary file that
    /// is removed after the call regardless of outcome. Same cache-driven
    /// create-vs-replace branching as
    /// [`add_or_replace_datastream_by_reference`](Self::add_or_replace_datastream_by_reference).
    #[instrument(skip(self, content))]
    pub async fn add_or_replace_datastream<R>(
        &mut self,
        ds_id: &str,
        mut content: R,
        control_group: &str,
        mime_type: Option<&str>,
    ) -> Result<()>
    where
        R: AsyncRead + Unpin + Send,
    {
        let control_group: ControlGroup = control_group.parse()?;
        self.check_mutable()?;
        let id = self.bound_id()?;
        let mime_type = mime_type.unwrap_or(DEFAULT_MIME_TYPE);

        // spool is removed on drop, whether or not the request succeeds
        let spool = tempfile::Builder::new().prefix("repo-client-").tempfile()?;
        let mut spool_file = tokio::fs::File::from_std(spool.reopen()?);
        tokio::io::copy(&mut content, &mut spool_file).await?;
        spool_file.flush().await?;
        let file_name = spool
            .path()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| ds_id.to_string());

        let exists = self
            .list_datastreams()
            .await?
            .iter()
            .any(|existing| existing == ds_id);
        let method = if exists { Method::PUT } else { Method::POST };
        let url = self
            .client
            .url(&format!("objects/{}/datastreams/{}", id, ds_id));
        let body = reqwest::Body::wrap_stream(ReaderStream::new(
            tokio::fs::File::open(spool.path()).await?,
        ));
        let part = reqwest::multipart::Part::stream(body).file_name(file_name.clone());
        let form = reqwest::multipart::Form::new().part(file_name, part);
        let response = self
            .client
            .request(method, &url)
            .query(&[
                ("controlGroup", control_group.code()),
                ("mimeType", mime_type),
            ])
            .multipart(form)
            .send()
            .await?;
        let status = response.status();
        if !is_status_success(status) {
            return Err(RepositoryError::Status { url, status });
        }
        self.record_datastream(ds_id);
        Ok(())
    }

    /// Deletes a datastream and drops its id from the cached listing.
    #[instrument(skip(self))]
    pub async fn purge_datastream(&mut self, ds_id: &str) -> Result<()> {
        self.check_mutable()?;
        let id = self.bound_id()?;
        let url = self
            .client
            .url(&format!("objects/{}/datastreams/{}", id, ds_id));
        let response = self.client.request(Method::DELETE, &url).send().await?;
        let status = response.status();
        if !is_status_success(status) {
            return Err(RepositoryError::Status { url, status });
        }
        if let CacheSlot::Populated(ids) = &mut self.datastream_ids {
            ids.retain(|existing| existing != ds_id);
        }
        Ok(())
    }

    /// Asserts a relationship on the object. Success invalidates the
    /// content-model cache unconditionally, whether or not the predicate is a
    /// model assertion.
    #[instrument(skip(self))]
    pub async fn add_relationship(
        &mut self,
        object_id: &str,
        predicate: &str,
        subject_id: &str,
    ) -> Result<()> {
        self.check_mutable()?;
        let id = self.bound_id()?;
        let url = self.client.url(&format!("objects/{}/relationships/new", id));
        let response = self
            .client
            .request(Method::POST, &url)
            .query(&[
                ("subject", format!("info:fedora/{}", subject_id)),
                ("predicate", predicate.to_string()),
                ("object", format!("info:fedora/{}", object_id)),
                ("isLiteral", "false".to_string()),
            ])
            .send()
            .await?;
        let status = response.status();
        if !is_status_success(status) {
            return Err(RepositoryError::Status { url, status });
        }
        self.content_models.invalidate();
        Ok(())
    }

    /// Retracts a relationship. Same unconditional content-model cache
    /// invalidation as [`add_relationship`](Self::add_relationship).
    #[instrument(skip(self))]
    pub async fn remove_relationship(
        &mut self,
        subject_id: &str,
        predicate: &str,
        object_id: &str,
    ) -> Result<()> {
        self.check_mutable()?;
        let id = self.bound_id()?;
        let url = self.client.url(&format!("objects/{}/relationships", id));
        let response = self
            .client
            .request(Method::DELETE, &url)
            .query(&[
                ("subject", format!("info:fedora/{}", subject_id)),
                ("predicate", predicate.to_string()),
                ("object", format!("info:fedora/{}", object_id)),
            ])
            .send()
            .await?;
        let status = response.status();
        if !is_status_success(status) {
            return Err(RepositoryError::Status { url, status });
        }
        self.content_models.invalidate();
        Ok(())
    }

    /// Deletes the object from the repository. On success the handle becomes
    /// permanently inert: the id is cleared, all caches are invalidated and
    /// every further operation fails with [`RepositoryError::InvalidState`].
    #[instrument(skip(self))]
    pub async fn purge(&mut self) -> Result<()> {
        self.check_mutable()?;
        let id = self.bound_id()?;
        let url = self.client.url(&format!("objects/{}", id));
        let response = self.client.request(Method::DELETE, &url).send().await?;
        let status = response.status();
        if !is_status_success(status) {
            return Err(RepositoryError::Status { url, status });
        }
        info!("purged object {}", id);
        self.id = None;
        self.profile.invalidate();
        self.content_models.invalidate();
        self.datastream_ids.invalidate();
        Ok(())
    }

    fn record_datastream(&mut self, ds_id: &str) {
        if let CacheSlot::Populated(ids) = &mut self.datastream_ids {
            if !ids.iter().any(|existing| existing == ds_id) {
                ids.push(ds_id.to_string());
            }
        }
    }
}

/// Transparent [`AsyncRead`] adapter whose only purpose is to carry a
/// [`Debug`](std::fmt::Debug) impl, which the underlying closure-mapped
/// stream reader cannot derive.
struct DatastreamReader<R>(R);

impl<R> std::fmt::Debug for DatastreamReader<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatastreamReader").finish_non_exhaustive()
    }
}

impl<R: AsyncRead + Unpin> AsyncRead for DatastreamReader<R> {
    fn poll_read(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
        buf: &mut tokio::io::ReadBuf<'_>,
    ) -> std::task::Poll<std::io::Result<()>> {
        std::pin::Pin::new(&mut self.0).poll_read(cx, buf)
    }
}

async fn fetch_profile(client: &RepositoryClient, id: &str) -> Result<Option<ObjectProfile>> {
    let url = client.url(&format!("objects/{}", id));
    let response = client
        .request(Method::GET, &url)
        .query(&[("format", "xml")])
        .send()
        .await?;
    let status = response.status();
    if status == reqwest::StatusCode::NOT_FOUND {
        debug!("object {} not found", id);
        return Ok(None);
    }
    if !is_status_success(status) {
        return Err(RepositoryError::Status { url, status });
    }
    let body = response.text().await?;
    Ok(Some(ObjectProfile::from_xml(&body)?))
}
