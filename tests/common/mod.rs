//! Canned Prismic responses shared by the integration tests.

use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const MASTER_REF: &str = "YGf2ARAAACYAXvHe";

pub fn endpoint(server: &MockServer) -> String {
    format!("{}/api/v2", server.uri())
}

pub fn summary(uid: &str) -> Value {
    json!({
        "uid": uid,
        "first_publication_date": "2021-03-15T19:25:28+0000",
        "data": {
            "title": format!("Title {}", uid),
            "subtitle": format!("Subtitle {}", uid),
            "author": "Joseph Oliveira"
        }
    })
}

pub fn detail(uid: &str) -> Value {
    json!({
        "uid": uid,
        "first_publication_date": "2021-03-25T19:27:35+0000",
        "data": {
            "title": format!("Title {}", uid),
            "subtitle": format!("Subtitle {}", uid),
            "author": "Joseph Oliveira",
            "banner": {"url": "https://images.prismic.io/banner.png", "alt": null},
            "content": [{
                "heading": "Proin et varius",
                "body": [
                    {"type": "paragraph", "text": "Nullam dolor sapien, vulputate eu diam at", "spans": []},
                    {"type": "paragraph", "text": "Read the docs", "spans": [
                        {"start": 9, "end": 13, "type": "hyperlink", "data": {"url": "https://reactjs.org"}}
                    ]}
                ]
            }]
        }
    })
}

pub async fn mount_master_ref(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/v2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "refs": [
                {"id": "preview", "ref": "preview-ref", "isMasterRef": false},
                {"id": "master", "ref": MASTER_REF, "isMasterRef": true}
            ]
        })))
        .mount(server)
        .await;
}

/// First page of the listing: `hello`, `world`, then a second page with `third`
pub async fn mount_listing(server: &MockServer) {
    let next_page = format!(
        "{}/documents/search?ref={}&page=2&pageSize=2",
        endpoint(server),
        MASTER_REF
    );

    Mock::given(method("GET"))
        .and(path("/api/v2/documents/search"))
        .and(query_param("q", "[[at(document.type,\"posts\")]]"))
        .and(query_param("ref", MASTER_REF))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "page": 1,
            "results_size": 2,
            "total_results_size": 3,
            "next_page": next_page,
            "results": [summary("hello"), summary("world")]
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v2/documents/search"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "page": 2,
            "results_size": 1,
            "total_results_size": 3,
            "next_page": null,
            "results": [summary("third")]
        })))
        .mount(server)
        .await;
}

pub async fn mount_post(server: &MockServer, uid: &str) {
    Mock::given(method("GET"))
        .and(path("/api/v2/documents/search"))
        .and(query_param("q", format!("[[at(my.posts.uid,\"{}\")]]", uid)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "next_page": null,
            "results": [detail(uid)]
        })))
        .mount(server)
        .await;
}
