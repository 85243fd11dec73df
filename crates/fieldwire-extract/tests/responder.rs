//! Rendering of replies through the default responsors.

use fieldwire_core::{BindContext, RenderKind, Reply, Response};
use fieldwire_extract::{Responders, APPLICATION_JSON, TEXT_PLAIN_UTF8};
use fieldwire_test::{TestContext, TestRequest};
use http::StatusCode;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

fn context() -> TestContext {
    TestRequest::get("/").build().unwrap()
}

#[test]
fn test_payload_renders_json_ok() {
    let mut ctx = context();
    Responders::new().render(&mut ctx, Reply::json(json!({ "id": 7 })));

    ctx.response
        .assert_status(StatusCode::OK)
        .assert_header("content-type", APPLICATION_JSON);
    assert_eq!(ctx.response.json::<Value>().unwrap(), json!({ "id": 7 }));
}

#[test]
fn test_json_response_keeps_status_and_headers() {
    let mut ctx = context();
    let response = Response::json(vec![1, 2])
        .with_status(StatusCode::CREATED)
        .with_header("Location", "/items/2");
    Responders::new().render(&mut ctx, response.into());

    ctx.response
        .assert_status(StatusCode::CREATED)
        .assert_header("location", "/items/2");
    assert_eq!(ctx.response.body(), b"[1,2]");
}

#[test]
fn test_content_type_wins_over_explicit_header() {
    let mut ctx = context();
    let response = Response::json("x").with_header("Content-Type", "application/problem+json");
    Responders::new().render(&mut ctx, response.into());

    assert_eq!(ctx.response.content_type(), Some(APPLICATION_JSON));
}

#[test]
fn test_json_without_body_is_204() {
    let mut ctx = context();
    Responders::new().render(&mut ctx, Response::empty().into());

    ctx.response.assert_status(StatusCode::NO_CONTENT);
    assert!(ctx.response.body().is_empty());
}

#[test]
fn test_json_encoding_failure_is_500() {
    let mut unencodable = BTreeMap::new();
    unencodable.insert(vec![1_u8], "sequence keys are not JSON");

    let mut ctx = context();
    Responders::new().render(&mut ctx, Reply::json(unencodable));

    ctx.response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert!(ctx.response.body().is_empty());
}

#[test]
fn test_text_response() {
    let mut ctx = context();
    Responders::new().render(&mut ctx, Response::text("plain words").into());

    ctx.response
        .assert_status(StatusCode::OK)
        .assert_header("content-type", TEXT_PLAIN_UTF8);
    assert_eq!(ctx.response.text().unwrap(), "plain words");
}

#[test]
fn test_text_of_non_string_body_is_json() {
    let mut ctx = context();
    let response = Response {
        body: Some(Box::new(vec!["a", "b"])),
        render: RenderKind::Text,
        ..Response::default()
    };
    Responders::new().render(&mut ctx, response.into());

    assert_eq!(ctx.response.text().unwrap(), r#"["a","b"]"#);
}

#[test]
fn test_html_response_delegates_to_template() {
    let mut model = Map::new();
    model.insert("user".into(), Value::from("ann"));

    let mut ctx = context();
    let response = Response::html("profile.html")
        .with_status(StatusCode::ACCEPTED)
        .with_header("x-frame-options", "DENY")
        .with_model(model);
    Responders::new().render(&mut ctx, response.into());

    let html = ctx.response.html().unwrap();
    assert_eq!(html.status, StatusCode::ACCEPTED);
    assert_eq!(html.template, "profile.html");
    assert_eq!(html.model["user"], "ann");
    ctx.response.assert_header("x-frame-options", "DENY");
}

#[test]
fn test_empty_reply_writes_nothing() {
    let mut ctx = context();
    Responders::new().render(&mut ctx, Reply::Empty);
    assert!(ctx.response.is_untouched());
}

#[test]
fn test_missing_responsor_is_500() {
    let mut ctx = context();
    Responders::empty().render(&mut ctx, Response::text("lost").into());

    ctx.response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert!(ctx.response.body().is_empty());
}

#[test]
fn test_closure_responsor() {
    let mut responders = Responders::new();
    responders.register(
        RenderKind::Text,
        Arc::new(|ctx: &mut dyn BindContext, response: Response| {
            let status = response.resolved_status();
            ctx.response().set_status(status);
            ctx.response().set_header("x-rendered-by", "closure");
        }),
    );

    let mut ctx = context();
    responders.render(&mut ctx, Response::text("ignored").into());

    ctx.response
        .assert_status(StatusCode::OK)
        .assert_header("x-rendered-by", "closure");
    assert!(ctx.response.body().is_empty());
}
