// Integration tests for building paths and requests from templates

use axum::http::Method;
use chrono::{TimeZone, Utc};
use uuid::Uuid;
use urit::domain::template::{EncodeVar, PathRegexCheck};
use urit::{BuildError, BuildOptions, Headers, Host, PathValue, PathVars, QueryParams};

mod common;

#[test]
fn test_build_credits_example() {
    let template = common::template("/credits/{year}/{month}");
    let vars = PathVars::from_pairs([("year", "2022"), ("month", "11")]);
    assert_eq!(
        template.path_from(&vars, &BuildOptions::new()).unwrap(),
        "/credits/2022/11"
    );
}

#[test]
fn test_build_then_match_round_trip() {
    let template = common::template("/shop/{category}/{item}.{ext}");
    let vars = PathVars::from_pairs([("category", "books"), ("item", "rust"), ("ext", "html")]);
    let path = template.path_from(&vars, &BuildOptions::new()).unwrap();
    assert_eq!(template.matches(&path).unwrap(), vars);
}

#[test]
fn test_build_coerces_values() {
    let template = common::template("/?/?/?/?");
    let id = Uuid::nil();
    let ts = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
    let vars = PathVars::from_values([
        PathValue::from(42),
        PathValue::from(true),
        PathValue::from(ts),
        PathValue::from(id),
    ]);
    assert_eq!(
        template.path_from(&vars, &BuildOptions::new()).unwrap(),
        "/42/true/2024-01-02T03:04:05Z/00000000-0000-0000-0000-000000000000"
    );
}

#[test]
fn test_build_query_sorting() {
    let template = common::template("/search");
    let mut query = QueryParams::from_pairs([("b", "2"), ("a", "1")]);
    let options = BuildOptions::new().with_query(query.clone());
    assert_eq!(
        template.path_from(&PathVars::named(), &options).unwrap(),
        "/search?a=1&b=2"
    );

    query.sorted(false);
    let options = BuildOptions::new().with_query(query);
    assert_eq!(
        template.path_from(&PathVars::named(), &options).unwrap(),
        "/search?b=2&a=1"
    );
}

#[test]
fn test_build_host_from_url() {
    let template = common::template("/users/{id}");
    let url = url::Url::parse("https://api.example.com/ignored/path").unwrap();
    let options = BuildOptions::new().with_host(Host::from(&url));
    let vars = PathVars::from_pairs([("id", 3)]);
    assert_eq!(
        template.path_from(&vars, &options).unwrap(),
        "https://api.example.com/users/3"
    );
}

#[test]
fn test_build_encode_and_regex_check() {
    let template = common::template("/tags/{tag:[a-z ]+}");
    let options = BuildOptions::new().with_var(PathRegexCheck).with_var(EncodeVar);
    let vars = PathVars::from_pairs([("tag", "big data")]);
    assert_eq!(template.path_from(&vars, &options).unwrap(), "/tags/big%20data");

    let vars = PathVars::from_pairs([("tag", "BIG")]);
    assert!(matches!(
        template.path_from(&vars, &options),
        Err(BuildError::Rejected { .. })
    ));
}

#[test]
fn test_build_missing_reports_name() {
    let template = common::template("/a/{x}");
    let err = template
        .path_from(&PathVars::from_pairs([("y", "1")]), &BuildOptions::new())
        .unwrap_err();
    assert_eq!(err.to_string(), "no var for 'x'");
}

#[test]
fn test_build_null_json_value_is_missing() {
    let template = common::template("/users/{id}");
    let body = serde_json::json!({"id": null});
    let vars = PathVars::from_json_object(body.as_object().unwrap());
    match template.path_from(&vars, &BuildOptions::new()) {
        Err(BuildError::MissingNamed(name)) => assert_eq!(name, "id"),
        other => panic!("Expected missing var, got {:?}", other),
    }

    let mut query = QueryParams::new();
    query.add("expand", serde_json::Value::Null);
    let vars = PathVars::from_pairs([("id", "7")]);
    let options = BuildOptions::new().with_query(query);
    assert_eq!(template.path_from(&vars, &options).unwrap(), "/users/7?expand");
}

#[test]
fn test_request_from_with_headers() {
    let template = common::template("/users/{id}");
    let mut headers = Headers::new();
    headers.set("Accept", "application/json").set("X-Retry", 2);
    let options = BuildOptions::new()
        .with_host("https://example.com")
        .with_query(QueryParams::from_pairs([("fields", "name")]))
        .with_headers(headers);
    let request = template
        .request_from(Method::GET, &PathVars::from_pairs([("id", 1)]), String::new(), &options)
        .unwrap();
    assert_eq!(request.uri().to_string(), "https://example.com/users/1?fields=name");
    assert_eq!(request.headers()["accept"], "application/json");
    assert_eq!(request.headers()["x-retry"], "2");
}

#[test]
fn test_request_from_bad_header() {
    let template = common::template("/");
    let options = BuildOptions::new().with_headers(Headers::from_pairs([("bad header", "x")]));
    let result = template.request_from(Method::GET, &PathVars::named(), (), &options);
    assert!(matches!(result, Err(BuildError::Header(_))));
}
