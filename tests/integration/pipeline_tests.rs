//! Integration tests for the pipeline
//!
//! These tests use wiremock to create mock origin sites and run the full pipeline
//! end-to-end into temporary output directories.

use site_distill::config::{
    AssetsConfig, ClassifierConfig, Config, FragmentMarker, OutputConfig, SiteConfig,
    UserAgentConfig,
};
use site_distill::crawler::{crawl, Pipeline};
use site_distill::model::Route;
use site_distill::storage::{ContentStore, JsonStore};
use site_distill::DistillError;
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LOGO_PATH: &str = "/wp-content/uploads/2024/05/logo.svg";
const LOGO_BODY: &str = r#"<svg xmlns="http://www.w3.org/2000/svg"></svg>"#;
const HEADER_CSS_PATH: &str = "/wp-content/uploads/elementor/css/post-3080.css";

/// Creates a test configuration for the mock origin
fn create_test_config(origin: &str, data_dir: &Path, public_dir: &Path) -> Config {
    Config {
        site: SiteConfig {
            origin: origin.to_string(),
            sitemaps: vec![format!("{}/sitemap.xml", origin)],
            reference_page: None,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        output: OutputConfig {
            data_dir: data_dir.display().to_string(),
            public_dir: public_dir.display().to_string(),
        },
        assets: AssetsConfig {
            timeout_secs: 5,
            ..Default::default()
        },
        classifier: ClassifierConfig::default(),
        header: FragmentMarker::default_header(),
        footer: FragmentMarker::default_footer(),
    }
}

fn sitemap(origin: &str, paths: &[&str]) -> String {
    let urls: String = paths
        .iter()
        .map(|p| format!("<url><loc>{}{}</loc></url>", origin, p))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">{}</urlset>"#,
        urls
    )
}

/// A page with header and footer templates around a single content section
fn page(title: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html><html><head>
<title>{title}</title>
<link rel="stylesheet" id="elementor-post-3080-css" href="../wp-content/uploads/elementor/css/post-3080.css">
<style>.elementor-3080 .elementor-element{{padding:0}}</style>
</head><body>
<div data-elementor-type="wp-post" data-elementor-id="3080" class="elementor elementor-3080">
<div class="elementor-widget-theme-site-logo"><img src="../wp-content/uploads/2024/05/logo.svg" alt="Logo"></div>
<nav class="elementor-nav-menu"><a class="elementor-item" href="../">Home</a><a class="elementor-item" href="../about/">About</a></nav>
</div>
<div data-elementor-type="wp-page" data-elementor-id="42" class="elementor elementor-42">
<section class="e-con">{content}</section>
</div>
<div data-elementor-type="wp-post" data-elementor-id="3084" class="elementor elementor-3084">
<p>Write to hello@example.com</p><p>© 2024 Example. All rights reserved.</p>
</div>
</body></html>"#
    )
}

async fn mount_page(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

/// Mounts a two-page site whose pages and header stylesheet all reference one logo
async fn mount_site(server: &MockServer) {
    let origin = server.uri();

    mount_page(server, "/sitemap.xml", sitemap(&origin, &["/about/", "/"])).await;

    mount_page(
        server,
        "/about/",
        page(
            "About",
            r#"<h1>About us</h1><p>We design careful websites for growing teams.</p><img src="../wp-content/uploads/2024/05/logo.svg" alt="Logo">"#,
        ),
    )
    .await;

    mount_page(
        server,
        "/",
        page(
            "Home",
            r#"<h1>Welcome</h1><p>Every project starts with listening closely.</p><img src="../wp-content/uploads/2024/05/logo.svg" alt="Logo">"#,
        ),
    )
    .await;

    Mock::given(method("GET"))
        .and(path(LOGO_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(LOGO_BODY))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(HEADER_CSS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"@import "missing.css";
.elementor-3080 .logo{background:url("../../2024/05/logo.svg")}"#,
        ))
        .mount(server)
        .await;
}

/// Number of requests the server received for `request_path`
async fn request_count(server: &MockServer, request_path: &str) -> usize {
    server
        .received_requests()
        .await
        .expect("request recording is enabled")
        .iter()
        .filter(|r| r.url.path() == request_path)
        .count()
}

/// Number of requests the server received under the upload directory
async fn asset_request_count(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .expect("request recording is enabled")
        .iter()
        .filter(|r| r.url.path().starts_with("/wp-content/"))
        .count()
}

#[tokio::test]
async fn test_full_run_two_pages() {
    let server = MockServer::start().await;
    mount_site(&server).await;

    let data = TempDir::new().unwrap();
    let public = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), data.path(), public.path());

    let summary = crawl(config).await.expect("Run failed");

    assert_eq!(summary.pages_processed, 2);
    assert_eq!(summary.pages_failed, 0);
    assert_eq!(summary.assets_downloaded, 2);
    assert_eq!(summary.assets_failed, 1);
    assert_eq!(summary.css_imports_synthesized, 1);

    let store = JsonStore::new(data.path());

    // Slugs and routes
    let about = store.load_by_slug("about").unwrap().expect("about page");
    let home = store.load_by_slug("home").unwrap().expect("home page");
    assert_eq!(about.path, "/about");
    assert_eq!(home.path, "/");
    assert_eq!(
        store.list_routes().unwrap(),
        vec![
            Route {
                slug: "home".to_string(),
                path: "/".to_string()
            },
            Route {
                slug: "about".to_string(),
                path: "/about".to_string()
            },
        ]
    );
    assert_eq!(store.load_by_path("/about/").unwrap().unwrap().slug, "about");

    // Content is rewritten and free of boilerplate
    assert!(about
        .content
        .html
        .contains(r#"<img src="/static/images/2024/05/logo.svg" alt="Logo">"#));
    assert!(!about.content.html.contains(&server.uri()));
    assert!(!about.content.html.contains("hello@example.com"));
    assert!(!about.content.html.contains("elementor-nav-menu"));
    assert_eq!(about.content.elementor_id.as_deref(), Some("42"));
    assert_eq!(about.metadata.title, "About");
    assert_eq!(about.navigation.len(), 2);

    // The logo is mirrored once although three documents reference it
    let logo = public.path().join("static/images/2024/05/logo.svg");
    assert_eq!(fs::read_to_string(&logo).unwrap(), LOGO_BODY);
    assert_eq!(request_count(&server, LOGO_PATH).await, 1);

    // The header stylesheet is rewritten in place, its missing import synthesized
    let css = fs::read_to_string(public.path().join("static/images/elementor/css/post-3080.css"))
        .unwrap();
    assert!(css.contains(r#"url("/static/images/2024/05/logo.svg")"#));
    assert!(css.contains(r#"@import "/static/images/elementor/css/missing.css""#));
    let placeholder =
        fs::read_to_string(public.path().join("static/images/elementor/css/missing.css")).unwrap();
    assert!(placeholder.starts_with("/* Empty placeholder for missing CSS import:"));

    // Header and footer
    let header = store.load_header().unwrap().expect("header");
    assert!(header.html.contains(r#"data-elementor-id="3080""#));
    assert!(header.html.contains(r#"<a class="elementor-item" href="/about/">"#));
    assert_eq!(
        header.css_files,
        vec!["/static/images/elementor/css/post-3080.css"]
    );
    assert_eq!(
        header.inline_styles,
        ".elementor-3080 .elementor-element{padding:0}"
    );

    let footer = store.load_footer().unwrap().expect("footer");
    assert!(footer.html.contains("hello@example.com"));
    assert!(footer.css_files.is_empty());

    let navigation = store.load_navigation().unwrap().expect("navigation");
    assert_eq!(navigation.items, home.navigation);
}

#[tokio::test]
async fn test_second_run_is_idempotent() {
    let server = MockServer::start().await;
    mount_site(&server).await;

    let data = TempDir::new().unwrap();
    let public = TempDir::new().unwrap();

    crawl(create_test_config(&server.uri(), data.path(), public.path()))
        .await
        .expect("First run failed");

    let about_before = fs::read(data.path().join("pages/about.json")).unwrap();
    let home_before = fs::read(data.path().join("pages/home.json")).unwrap();
    let routes_before = fs::read(data.path().join("routes.json")).unwrap();
    let header_before = fs::read(data.path().join("header.json")).unwrap();
    let assets_before = asset_request_count(&server).await;

    let pipeline = Pipeline::new(create_test_config(&server.uri(), data.path(), public.path()))
        .expect("Failed to create pipeline");
    let summary = pipeline.run().await.expect("Second run failed");

    assert_eq!(summary.pages_processed, 2);
    assert_eq!(summary.assets_downloaded, 0);
    assert_eq!(summary.assets_failed, 0);
    assert_eq!(asset_request_count(&server).await, assets_before);
    assert_eq!(request_count(&server, LOGO_PATH).await, 1);

    assert_eq!(fs::read(data.path().join("pages/about.json")).unwrap(), about_before);
    assert_eq!(fs::read(data.path().join("pages/home.json")).unwrap(), home_before);
    assert_eq!(fs::read(data.path().join("routes.json")).unwrap(), routes_before);
    assert_eq!(fs::read(data.path().join("header.json")).unwrap(), header_before);
}

#[tokio::test]
async fn test_failed_asset_keeps_remote_url() {
    let server = MockServer::start().await;
    let origin = server.uri();

    mount_page(&server, "/sitemap.xml", sitemap(&origin, &["/team/"])).await;
    mount_page(
        &server,
        "/team/",
        page(
            "Team",
            r#"<h1>Team</h1><img src="../wp-content/uploads/2024/05/gone.jpg" alt="Gone"><img src="../wp-content/uploads/2024/05/logo.svg" alt="Logo">"#,
        ),
    )
    .await;
    Mock::given(method("GET"))
        .and(path(LOGO_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(LOGO_BODY))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/wp-content/uploads/2024/05/gone.jpg"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let data = TempDir::new().unwrap();
    let public = TempDir::new().unwrap();
    let summary = crawl(create_test_config(&origin, data.path(), public.path()))
        .await
        .expect("Run failed");

    assert_eq!(summary.pages_processed, 1);
    assert!(summary.assets_failed >= 1);

    let team = JsonStore::new(data.path())
        .load_by_slug("team")
        .unwrap()
        .expect("team page");

    let remote = format!("{}/wp-content/uploads/2024/05/gone.jpg", origin);
    assert!(team.content.html.contains(&format!(r#"<img src="{}" alt="Gone">"#, remote)));
    assert!(team
        .content
        .html
        .contains(r#"<img src="/static/images/2024/05/logo.svg" alt="Logo">"#));
    assert!(!public.path().join("static/images/2024/05/gone.jpg").exists());
    assert!(!public.path().join("static/images/2024/05/gone.jpg.part").exists());
}

#[tokio::test]
async fn test_redirected_asset_stored_under_original_path() {
    let server = MockServer::start().await;
    let origin = server.uri();

    mount_page(&server, "/sitemap.xml", sitemap(&origin, &["/"])).await;
    mount_page(
        &server,
        "/",
        page("Home", r#"<h1>Home</h1><img src="/wp-content/uploads/photo.jpg" alt="">"#),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/wp-content/uploads/photo.jpg"))
        .respond_with(
            ResponseTemplate::new(301).insert_header("location", "/media/cdn/photo-1.jpg"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/media/cdn/photo-1.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8, 2, 3]))
        .mount(&server)
        .await;

    let data = TempDir::new().unwrap();
    let public = TempDir::new().unwrap();
    crawl(create_test_config(&origin, data.path(), public.path()))
        .await
        .expect("Run failed");

    let stored = public.path().join("static/images/photo.jpg");
    assert_eq!(fs::read(stored).unwrap(), vec![1u8, 2, 3]);
    assert!(!public.path().join("static/media").exists());
}

#[tokio::test]
async fn test_missing_header_fails_run() {
    let server = MockServer::start().await;
    let origin = server.uri();

    mount_page(&server, "/sitemap.xml", sitemap(&origin, &["/plain/"])).await;
    mount_page(
        &server,
        "/plain/",
        "<html><body><main><p>No templates here at all.</p></main></body></html>".to_string(),
    )
    .await;

    let data = TempDir::new().unwrap();
    let public = TempDir::new().unwrap();
    let result = crawl(create_test_config(&origin, data.path(), public.path())).await;

    assert!(matches!(
        result,
        Err(DistillError::FragmentNotFound { ref name }) if name == "header"
    ));

    // Pages and indexes are written before the fragments are located
    let store = JsonStore::new(data.path());
    assert!(store.load_by_slug("plain").unwrap().is_some());
    assert_eq!(store.list_routes().unwrap().len(), 1);
}

#[tokio::test]
async fn test_unreachable_sitemap_yields_empty_run() {
    let server = MockServer::start().await;
    let origin = server.uri();

    // Only the reference page exists; the sitemap is a 404
    mount_page(&server, "/", page("Home", "<h1>Home</h1>")).await;

    let data = TempDir::new().unwrap();
    let public = TempDir::new().unwrap();
    let summary = crawl(create_test_config(&origin, data.path(), public.path()))
        .await
        .expect("Run failed");

    assert_eq!(summary.pages_processed, 0);
    let store = JsonStore::new(data.path());
    assert!(store.list_routes().unwrap().is_empty());
    assert!(store.load_header().unwrap().is_some());
}
