use httptest::Server;

use crate::{DistributionConfig, DistributionService};


pub fn config_for(server: &Server) -> DistributionConfig {
    DistributionConfig {
        base_url: server.url_str("/"),
        admin_username: "admin@example.com".to_string(),
        admin_password: "secret".to_string(),
        distribution_dir: None,
    }
}

pub fn service_for(server: &Server) -> DistributionService {
    DistributionService::new(config_for(server)).unwrap()
}

pub const MEDIAPACKAGE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<mediapackage id="mp-1">
  <title>parent-42</title>
  <media>
    <track id="track-1">
      <mimetype>video/mp4</mimetype>
      <url>http://workspace.example.org/files/track-1.mp4</url>
    </track>
  </media>
  <metadata>
    <catalog id="catalog-1">
      <mimetype>text/xml</mimetype>
      <url>http://workspace.example.org/files/catalog-1.xml</url>
    </catalog>
  </metadata>
</mediapackage>"#;

pub const MEDIAPACKAGE_NO_TITLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<mediapackage id="mp-2">
  <media>
    <track id="track-1">
      <url>http://workspace.example.org/files/track-1.mp4</url>
    </track>
  </media>
</mediapackage>"#;
