//! Shared fixtures: a mocked Prismic repository and a blog pointing at it.

#![allow(dead_code)]

use serde_json::{json, Value};
use spacetraveling::config::SiteConfig;
use spacetraveling::Blog;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const MASTER_REF: &str = "master-ref";
pub const SEARCH_PATH: &str = "/api/v2/documents/search";
pub const LISTING_FETCH: &str = "post.title,post.subtitle,post.author";

pub fn endpoint(server: &MockServer) -> String {
    format!("{}/api/v2", server.uri())
}

pub fn uid_query(uid: &str) -> String {
    format!(r#"[[at(my.post.uid, "{}")]]"#, uid)
}

/// A blog rooted at `dir` reading from the mocked repository
pub fn blog_for(dir: &std::path::Path, server: &MockServer) -> Blog {
    let mut config = SiteConfig::default();
    config.cms.endpoint = endpoint(server);
    Blog::with_config(dir, config)
}

pub fn summary_doc(uid: &str, title: &str, published: &str) -> Value {
    json!({
        "id": format!("id-{}", uid),
        "uid": uid,
        "type": "post",
        "first_publication_date": published,
        "last_publication_date": published,
        "data": {
            "title": title,
            "subtitle": format!("Sobre {}", title),
            "author": "Joseph Oliveira"
        }
    })
}

pub fn detail_doc(uid: &str, title: &str) -> Value {
    json!({
        "id": format!("id-{}", uid),
        "uid": uid,
        "type": "post",
        "first_publication_date": "2021-03-25T19:25:28+0000",
        "last_publication_date": "2021-03-25T19:27:35+0000",
        "data": {
            "title": title,
            "banner": { "url": "https://images.prismic.io/criando-um-app/banner.png" },
            "author": "Joseph Oliveira",
            "content": [
                {
                    "heading": "Proin et varius",
                    "body": [
                        {
                            "type": "paragraph",
                            "text": "Nullam dolor sapien, vulputate eu diam at",
                            "spans": [{ "start": 0, "end": 6, "type": "strong" }]
                        }
                    ]
                },
                {
                    "heading": "Cras laoreet mi",
                    "body": [
                        { "type": "list-item", "text": "Odio pretium", "spans": [] },
                        { "type": "list-item", "text": "Posuere orci", "spans": [] }
                    ]
                }
            ]
        }
    })
}

pub fn search_page(results: Vec<Value>, next_page: Option<String>, page: u32) -> Value {
    let size = results.len();
    json!({
        "page": page,
        "results_per_page": 1,
        "results_size": size,
        "total_results_size": 2,
        "total_pages": 2,
        "next_page": next_page,
        "prev_page": null,
        "results": results
    })
}

fn empty_page() -> Value {
    json!({
        "page": 1,
        "results_per_page": 1,
        "results_size": 0,
        "total_results_size": 0,
        "total_pages": 0,
        "next_page": null,
        "prev_page": null,
        "results": []
    })
}

/// Mount a repository with two posts, one listed per page
///
/// `hooks` is listed first and enumerated for pre-rendering; `late` is only
/// on the listing's second page and exists for uid lookups; `missing` is
/// unknown to the repository.
pub async fn mount_prismic(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/v2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "refs": [
                { "id": "preview", "ref": "preview-ref", "label": "Preview", "isMasterRef": false },
                { "id": "master", "ref": MASTER_REF, "label": "Master", "isMasterRef": true }
            ]
        })))
        .mount(server)
        .await;

    // Second listing page, reached through the first page's next_page URL
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_page(
            vec![summary_doc("late", "Criando um app CRA do zero", "2021-03-26T10:00:00+0000")],
            None,
            2,
        )))
        .with_priority(1)
        .mount(server)
        .await;

    for (uid, title) in [("hooks", "Como utilizar Hooks"), ("late", "Criando um app CRA do zero")] {
        Mock::given(method("GET"))
            .and(path(SEARCH_PATH))
            .and(query_param("q", uid_query(uid)))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(search_page(vec![detail_doc(uid, title)], None, 1)),
            )
            .mount(server)
            .await;
    }

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(query_param("q", uid_query("missing")))
        .respond_with(ResponseTemplate::new(200).set_body_json(empty_page()))
        .mount(server)
        .await;

    // Listing, first page
    let next_page = format!("{}/documents/search?ref={}&page=2&pageSize=1", endpoint(server), MASTER_REF);
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(query_param("fetch", LISTING_FETCH))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_page(
            vec![summary_doc("hooks", "Como utilizar Hooks", "2021-03-25T19:25:28+0000")],
            Some(next_page),
            1,
        )))
        .mount(server)
        .await;

    // Path enumeration
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(query_param("pageSize", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "page": 1,
            "results_per_page": 100,
            "results_size": 1,
            "total_results_size": 2,
            "total_pages": 1,
            "next_page": null,
            "prev_page": null,
            "results": [
                { "id": "id-hooks", "uid": "hooks", "type": "post", "data": {} }
            ]
        })))
        .mount(server)
        .await;
}
