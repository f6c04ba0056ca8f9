use httptest::Server;

use crate::{RepositoryClient, RepositoryConfig};

mod client;

pub fn client_for(server: &Server) -> RepositoryClient {
    RepositoryClient::new(RepositoryConfig {
        base_url: server.url_str("/"),
        username: None,
        password: None,
        read_only: false,
    })
    .unwrap()
}

pub const OBJECT_PROFILE_NAMESPACED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<objectProfile xmlns="http://www.fedora.info/definitions/1/0/access/" pid="demo:1">
  <objLabel>Test object</objLabel>
  <objOwnerId>admin</objOwnerId>
  <objCreateDate>2010-10-01T19:55:00.808Z</objCreateDate>
  <objLastModDate>2010-10-02T08:15:30.000Z</objLastModDate>
  <objState>A</objState>
</objectProfile>"#;

pub const OBJECT_PROFILE_BARE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<objectProfile pid="demo:1">
  <objLabel>Test object</objLabel>
  <objOwnerId>admin</objOwnerId>
  <objCreateDate>2010-10-01T19:55:00.808Z</objCreateDate>
  <objLastModDate>2010-10-02T08:15:30.000Z</objLastModDate>
  <objState>A</objState>
</objectProfile>"#;

pub const RELS_EXT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"
         xmlns:fedora-model="info:fedora/fedora-system:def/model#">
  <rdf:Description rdf:about="info:fedora/demo:1">
    <fedora-model:hasModel rdf:resource="info:fedora/demo:contentModel"/>
  </rdf:Description>
</rdf:RDF>"#;

pub fn datastream_listing(ds_ids: &[&str]) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<objectDatastreams xmlns="http://www.fedora.info/definitions/1/0/access/" pid="demo:1">"#,
    );
    for ds_id in ds_ids {
        xml.push_str(&format!(
            r#"<datastream dsid="{}" label="{}" mimeType="text/plain"/>"#,
            ds_id, ds_id
        ));
    }
    xml.push_str("</objectDatastreams>");
    xml
}
