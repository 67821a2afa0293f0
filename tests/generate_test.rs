//! Integration tests for static generation.

mod common;

use common::{blog_for, mount_prismic};
use spacetraveling::content::{PostDetail, PostPagination};
use spacetraveling::generator::Generator;
use tempfile::TempDir;
use wiremock::MockServer;

#[tokio::test]
async fn test_generate_writes_listing_posts_and_404() {
    let server = MockServer::start().await;
    mount_prismic(&server).await;
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join("static/images")).unwrap();
    std::fs::write(dir.path().join("static/images/logo.svg"), "<svg/>").unwrap();

    let blog = blog_for(dir.path(), &server);
    let generator = Generator::new(&blog, blog.cms_client().unwrap()).unwrap();
    let report = generator.generate().await.unwrap();

    assert_eq!(report.listed, 1);
    assert_eq!(report.posts, 1);
    assert!(report.missing.is_empty());

    let public = dir.path().join("public");
    let index = std::fs::read_to_string(public.join("index.html")).unwrap();
    assert!(index.contains(r#"href="/post/hooks""#));
    assert!(index.contains("Como utilizar Hooks"));
    assert!(index.contains("<time>25 mar 2021</time>"));
    assert!(index.contains("Carregar mais posts"));

    let listing: PostPagination =
        serde_json::from_str(&std::fs::read_to_string(public.join("_data/index.json")).unwrap())
            .unwrap();
    assert_eq!(listing.results.len(), 1);
    assert!(listing.has_next_page());

    let post = std::fs::read_to_string(public.join("post/hooks/index.html")).unwrap();
    assert!(post.contains("<strong>Nullam</strong> dolor sapien"));
    assert!(post.contains("<ul><li>Odio pretium</li><li>Posuere orci</li></ul>"));
    // one minute per block, shown side by side
    assert!(post.contains("11 min"));

    let data: PostDetail = serde_json::from_str(
        &std::fs::read_to_string(public.join("_data/post/hooks.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(data.title, "Como utilizar Hooks");
    assert_eq!(data.first_publication_date.as_deref(), Some("25 mar 2021"));

    // posts past the enumerated page are left for first request
    assert!(!public.join("post/late").exists());
    assert!(public.join("404.html").exists());
    assert!(public.join("images/logo.svg").exists());
}

#[tokio::test]
async fn test_generate_post_unknown_uid_fails_not_found() {
    let server = MockServer::start().await;
    mount_prismic(&server).await;
    let dir = TempDir::new().unwrap();

    let blog = blog_for(dir.path(), &server);
    let generator = Generator::new(&blog, blog.cms_client().unwrap()).unwrap();
    let err = generator.generate_post("missing").await.unwrap_err();

    assert!(spacetraveling::generator::is_not_found(&err));
    assert!(!dir.path().join("public/post/missing").exists());
}

#[tokio::test]
async fn test_generate_without_endpoint_fails() {
    let dir = TempDir::new().unwrap();
    let blog = spacetraveling::Blog::with_config(dir.path(), Default::default());
    assert!(blog.cms_client().is_err());
}
