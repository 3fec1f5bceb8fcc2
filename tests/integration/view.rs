//! View layer end to end: themes, function templates, assets and filters.

use anyhow::Result;
use quillkit::config::load_settings;
use quillkit::core::AppKernel;
use quillkit::templating::{View, ViewError};
use quillkit::test_utils::{TestSite, init_test_logging};
use serde_json::{Map, Value, json};
use std::sync::Arc;

use super::fixture_site;

fn map(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap_or_default()
}

fn fixture_view(configure: impl FnOnce(AppKernel) -> AppKernel) -> Result<View> {
    let settings = load_settings(&fixture_site().join("quillkit.toml"))?;
    let kernel = configure(AppKernel::from_settings(&settings));
    Ok(View::new(Arc::new(kernel), settings.view))
}

#[test]
fn test_primary_render_uses_theme_layout() -> Result<()> {
    init_test_logging(None);
    let view = fixture_view(|kernel| kernel)?;

    let html = view.render("home", map(json!({"who": "Ada"})), true)?;

    assert!(html.starts_with("<html><head><title>Fixture Site</title>"), "{}", html);
    assert!(html.contains("<span class=\"badge\">Fixture Site</span>"), "{}", html);
    assert!(html.contains("<main>Welcome Ada</main>"), "{}", html);
    Ok(())
}

#[test]
fn test_assets_queued_by_partials_land_in_head() -> Result<()> {
    let view = fixture_view(|kernel| kernel)?;
    let html = view.render("home", Map::new(), true)?;

    let head_end = html.find("</head>").unwrap_or_default();
    let link = html.find("<link rel=\"stylesheet\" href=\"/assets/site.css\">");
    assert!(matches!(link, Some(pos) if pos < head_end), "{}", html);
    assert_eq!(html.matches("</head>").count(), 1);
    Ok(())
}

#[test]
fn test_page_data_script_is_injected() -> Result<()> {
    let view = fixture_view(|kernel| kernel)?;
    let html = view.render("home", Map::new(), true)?;

    assert!(html.contains("<script>window.pageData = {"), "{}", html);
    assert!(html.contains("\"name\":\"Fixture Site\""), "{}", html);
    assert!(html.contains("\"route\":\"/\""), "{}", html);

    let meta = view.snapshot().get("meta").cloned();
    assert_eq!(meta, Some(json!({"noindex": true})));
    Ok(())
}

#[test]
fn test_output_filter_rewrites_page() -> Result<()> {
    let view = fixture_view(|kernel| {
        kernel
            .with_filter("output.html", |page| match page {
                Value::String(html) => Value::String(html.replace("Welcome", "Hello")),
                other => other,
            })
            .with_filter("output.html", |page| match page {
                Value::String(html) => Value::String(format!("<!doctype html>{}", html)),
                other => other,
            })
    })?;

    let html = view.render("home", Map::new(), true)?;
    assert!(html.starts_with("<!doctype html><html>"), "{}", html);
    assert!(html.contains("<main>Hello guest</main>"), "{}", html);
    Ok(())
}

#[test]
fn test_partial_render_skips_page_processing() -> Result<()> {
    let view = fixture_view(|kernel| kernel.with_filter("output.html", |_| json!("filtered")))?;
    let html = view.render("pages/home", Map::new(), false)?;

    assert_eq!(html.trim(), "<main>Welcome guest</main>");
    assert!(!view.assets().is_empty());
    Ok(())
}

#[test]
fn test_missing_theme_layout() -> Result<()> {
    let site = TestSite::builder()?
        .with_config(json!({"env": "dev", "theme": "ghost"}))
        .with_file("home.tpl", "home")
        .build()?;

    let err = site.view().render("home", Map::new(), true).unwrap_err();
    assert!(matches!(err, ViewError::LayoutNotFound { .. }));
    assert_eq!(err.to_string(), "Theme layout not found: modules/ghost/layout.tpl");
    Ok(())
}

#[test]
fn test_assets_emitted_in_category_and_dependency_order() -> Result<()> {
    let site = TestSite::builder()?
        .with_config(json!({}))
        .with_file(
            "page.tpl",
            concat!(
                "{% set a = queue(type=\"js\", content=\"/js/app.js\", deps=[\"vendor\"]) %}",
                "{% set b = queue(type=\"js\", content=\"/js/vendor.js\") %}",
                "{% set c = queue(type=\"css\", content=\"body { margin: 0 }\") %}",
                "{% set d = queue(type=\"favicon\", content=\"/favicon.ico\") %}",
                "<head></head>"
            ),
        )
        .build()?;

    let html = site.view().render("page", Map::new(), true)?;
    assert_eq!(
        html,
        concat!(
            "<head>",
            "<link rel=\"icon\" href=\"/favicon.ico\">\n",
            "<style>body { margin: 0 }</style>\n",
            "<script defer src=\"/js/vendor.js\"></script>\n",
            "<script defer src=\"/js/app.js\"></script>\n",
            "</head>"
        )
    );
    Ok(())
}

#[test]
fn test_dequeue_from_template() -> Result<()> {
    let site = TestSite::builder()?
        .with_config(json!({}))
        .with_file(
            "page.tpl",
            "{% set a = queue(type=\"css\", content=\"/a.css\") %}{{ dequeue(type=\"css\", id=\"a\") }}<head></head>",
        )
        .build()?;

    let html = site.view().render("page", Map::new(), true)?;
    assert_eq!(html, "<head></head>");
    Ok(())
}

#[test]
fn test_unknown_asset_kind_fails_render() -> Result<()> {
    let site = TestSite::builder()?
        .with_file("page.tpl", "{{ queue(type=\"font\", content=\"/a.woff\") }}")
        .build()?;

    let err = site.view().render("page", Map::new(), false).unwrap_err();
    assert!(err.to_string().contains("Asset queue only supports"), "{}", err);
    Ok(())
}

#[test]
fn test_data_escaping_modes() -> Result<()> {
    let site = TestSite::builder()?
        .with_file(
            "page.tpl",
            concat!(
                "{{ data(key=\"html\") }}|",
                "{{ data(key=\"html\", clean=false) }}|",
                "{{ data(key=\"html\", clean=\"url\") }}|",
                "{{ data(key=\"nested.list.1\") }}|",
                "{{ data(key=\"missing\") }}"
            ),
        )
        .build()?;

    let data = map(json!({"html": "<b>&</b>", "nested": {"list": ["a", "b"]}}));
    let html = site.view().render("page", data, false)?;
    assert_eq!(html, "&lt;b&gt;&amp;&lt;/b&gt;|<b>&</b>|%3Cb%3E%26%3C%2Fb%3E|b|");
    Ok(())
}
