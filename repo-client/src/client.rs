use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::{Method, StatusCode};
use tracing::{debug, info, instrument};

use crate::config::RepositoryConfig;
use crate::error::{RepositoryError, Result};
use crate::object::ObjectHandle;

/// Timestamp format used by the repository, e.g. "2010-10-01T19:55:00.808Z".
const REPOSITORY_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

pub fn parse_repository_date(s: &str) -> Result<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(s, REPOSITORY_DATE_FORMAT).map_err(|err| {
        RepositoryError::InvalidArgument(format!("bad repository date {:?}: {}", s, err))
    })?;
    Ok(naive.and_utc())
}

pub fn format_repository_date(date: DateTime<Utc>) -> String {
    date.format(REPOSITORY_DATE_FORMAT).to_string()
}

/// Stateless façade over the repository's REST surface. Owns the HTTP
/// connection and credential configuration; all per-object state lives in
/// [`ObjectHandle`]s handed out by [`lookup_object`](Self::lookup_object).
#[derive(Debug)]
pub struct RepositoryClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Option<(String, Option<String>)>,
    read_only: bool,
}

impl RepositoryClient {
    pub fn new(config: RepositoryConfig) -> Result<RepositoryClient> {
        let http = reqwest::Client::builder().build()?;
        let credentials = config
            .username
            .map(|username| (username, config.password));
        Ok(RepositoryClient {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            credentials,
            read_only: config.read_only,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    pub(crate) fn request(&self, method: Method, url: &str) -> reqwest::RequestBuilder {
        let builder = self.http.request(method, url);
        match &self.credentials {
            Some((username, password)) => builder.basic_auth(username, password.as_deref()),
            None => builder,
        }
    }

    /// Binds a handle to the object with the given id. Fails with
    /// [`RepositoryError::NotFound`] if the id does not resolve.
    #[instrument(skip(self))]
    pub async fn lookup_object(&self, id: &str) -> Result<ObjectHandle<'_>> {
        ObjectHandle::bind(self, id, self.read_only).await
    }

    /// Like [`lookup_object`](Self::lookup_object), but the returned handle
    /// refuses all mutating operations.
    pub async fn lookup_object_read_only(&self, id: &str) -> Result<ObjectHandle<'_>> {
        ObjectHandle::bind(self, id, true).await
    }

    /// Finds objects related to the given subject or object through the given
    /// predicate by issuing an itql triple-pattern query against the
    /// repository's search endpoint. Exactly one of `subject_id` and
    /// `object_id` must be supplied.
    #[instrument(skip(self))]
    pub async fn find_related(
        &self,
        subject_id: Option<&str>,
        predicate: &str,
        object_id: Option<&str>,
    ) -> Result<Vec<ObjectHandle<'_>>> {
        let query = match (subject_id, object_id) {
            (None, None) | (Some(_), Some(_)) => {
                return Err(RepositoryError::InvalidArgument(
                    "either subject or object must be specified".to_string(),
                ))
            }
            (Some(subject), None) => format!(
                "select $child from <#ri>\nwhere <info:fedora/{}> <{}> $child",
                subject, predicate
            ),
            (None, Some(object)) => format!(
                "select $child from <#ri>\nwhere $child <{}> <info:fedora/{}>",
                predicate, object
            ),
        };
        let url = self.url("risearch");
        debug!(%url, %query, "searching for related objects");
        let response = self
            .request(Method::GET, &url)
            .query(&[
                ("type", "tuples"),
                ("lang", "itql"),
                ("format", "Sparql"),
                ("query", &query),
            ])
            .send()
            .await?;
        let status = response.status();
        if !is_status_success(status) {
            return Err(RepositoryError::Status { url, status });
        }
        let body = response.text().await?;
        let doc = roxmltree::Document::parse(&body)?;
        let mut handles = Vec::new();
        for node in doc
            .descendants()
            .filter(|n| n.is_element() && n.tag_name().name() == "child")
        {
            if let Some(uri) = node.attribute("uri") {
                let id = uri.trim_start_matches("info:fedora/");
                handles.push(ObjectHandle::bind(self, id, self.read_only).await?);
            }
        }
        Ok(handles)
    }

    /// Creates a new object and returns its id. Passing `id: None` lets the
    /// repository assign one within `namespace`. Labels longer than 255
    /// characters are truncated to 250 plus an ellipsis marker before
    /// transmission.
    #[instrument(skip(self))]
    pub async fn create_object(
        &self,
        id: Option<&str>,
        label: Option<&str>,
        owner_id: Option<&str>,
        namespace: Option<&str>,
    ) -> Result<String> {
        let url = self.url(&format!("objects/{}", id.unwrap_or("new")));
        let mut query: Vec<(&str, String)> =
            vec![("label", truncate_label(label.unwrap_or_default()))];
        if let Some(namespace) = namespace {
            query.push(("namespace", namespace.to_string()));
        }
        if let Some(owner_id) = owner_id {
            query.push(("ownerId", owner_id.to_string()));
        }
        let response = self
            .request(Method::POST, &url)
            .query(&query)
            .send()
            .await?;
        let status = response.status();
        if status != StatusCode::CREATED {
            return Err(RepositoryError::Status { url, status });
        }
        let id = response.text().await?;
        info!("{}: created object {}", self.base_url, id);
        Ok(id)
    }

    /// URL under which a datastream's content is disseminated. Pure string
    /// construction, no network call.
    pub fn datastream_dissemination_url(&self, id: &str, ds_id: &str) -> String {
        format!("{}/get/{}/{}", self.base_url, id, ds_id)
    }
}

/// Statuses the repository uses to signal success across its REST surface.
pub(crate) fn is_status_success(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::OK | StatusCode::CREATED | StatusCode::ACCEPTED | StatusCode::NO_CONTENT
    )
}

pub(crate) fn truncate_label(label: &str) -> String {
    if label.trim().is_empty() {
        return String::new();
    }
    if label.chars().count() > 255 {
        let kept: String = label.chars().take(250).collect();
        format!("{}...", kept)
    } else {
        label.to_string()
    }
}
