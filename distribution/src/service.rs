use tracing::{debug, info, instrument, trace};

use crate::config::DistributionConfig;
use crate::error::{DistributionError, Result};
use crate::mediapackage::{Element, MediaPackage};

/// Outcome of a retraction request. The video platform has no retraction
/// endpoint, so the only outcome is an explicit not-supported marker carrying
/// the element that would have been retracted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetractOutcome {
    NotSupported { element: Element },
}

/// One-shot push of a single media element to the video platform.
///
/// Each call is an independent request/response exchange; the service keeps
/// no state across calls beyond its configuration.
pub struct DistributionService {
    config: DistributionConfig,
    http: reqwest::Client,
}

impl DistributionService {
    pub fn new(config: DistributionConfig) -> Result<DistributionService> {
        // login success is signalled by a redirect, so the client must not
        // follow them
        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .cookie_store(true)
            .build()?;
        Ok(DistributionService { config, http })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Distributes the element with the given id to the video platform.
    ///
    /// Elements that are not tracks are silently skipped (`Ok(None)`). The
    /// asset is registered under the parent identifier taken from the
    /// mediapackage title. On success the returned element is a copy of the
    /// original with its identifier cleared; no distribution URI is assigned.
    #[instrument(skip(self, mediapackage))]
    pub async fn distribute(
        &self,
        mediapackage: &MediaPackage,
        element_id: &str,
    ) -> Result<Option<Element>> {
        self.config.validate()?;
        let element = mediapackage
            .element_by_id(element_id)
            .ok_or_else(|| DistributionError::ElementNotFound(element_id.to_string()))?;

        // the platform only supports tracks
        if !element.is_track() {
            debug!("element {} is not a track, skipping", element_id);
            return Ok(None);
        }

        let parent_id = mediapackage
            .title
            .as_deref()
            .map(str::trim)
            .filter(|title| !title.is_empty())
            .ok_or(DistributionError::MissingParentId)?;
        trace!("found parent identifier: {}", parent_id);

        self.login().await?;

        let url = self.url(&format!("assets/{}/video_assets", parent_id));
        let response = self
            .http
            .post(&url)
            .query(&[("container_id", parent_id)])
            .form(&[("video_url", element.uri.as_str())])
            .send()
            .await?;
        let status = response.status();
        // the platform's answer is recorded but deliberately not validated
        debug!("asset creation returned status {}", status);
        match response.text().await {
            Ok(body) => trace!("asset creation response body: {}", body),
            Err(err) => debug!("could not read asset creation response body: {}", err),
        }

        info!("distributed {} to the video platform", element_id);
        let mut distributed = element.clone();
        distributed.id = None;
        Ok(Some(distributed))
    }

    /// Removes a previously distributed element from the platform. Not
    /// supported by the remote side; the element is located (so a missing
    /// element still fails) and returned unchanged.
    #[instrument(skip(self, mediapackage))]
    pub fn retract(
        &self,
        mediapackage: &MediaPackage,
        element_id: &str,
    ) -> Result<RetractOutcome> {
        self.config.validate()?;
        let element = mediapackage
            .element_by_id(element_id)
            .ok_or_else(|| DistributionError::ElementNotFound(element_id.to_string()))?;
        info!(
            "the video platform does not support retraction, leaving {} in place",
            element_id
        );
        Ok(RetractOutcome::NotSupported {
            element: element.clone(),
        })
    }

    async fn login(&self) -> Result<()> {
        let url = self.url("users/sign_in");
        let response = self
            .http
            .post(&url)
            .form(&[
                ("user[email]", self.config.admin_username.as_str()),
                ("user[password]", self.config.admin_password.as_str()),
                ("user[remember_me]", "0"),
            ])
            .send()
            .await?;
        let status = response.status();
        debug!("login returned status {}", status);
        if !status.is_redirection() {
            return Err(DistributionError::Login { status });
        }
        Ok(())
    }
}
