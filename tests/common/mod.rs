#![allow(dead_code)]

use bindparams::{BindingRequest, PathParams, PathTemplate, QueryMultimap};
use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Install a test subscriber once per test binary. `RUST_LOG=bindparams=debug`
/// shows per-field resolution.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Match `path` (which may carry a query string) against `template` and split
/// it into the path params and a body-less binding request.
pub fn get(template: &str, path: &str) -> (PathParams, BindingRequest<std::io::Empty>) {
    init_tracing();
    let template = PathTemplate::parse(template).expect("template");
    let params = template.match_path(path).expect("path matches template");
    let query = path.split_once('?').map(|(_, q)| q).unwrap_or_default();
    (params, BindingRequest::without_body(QueryMultimap::parse(query)))
}

/// Same as [`get`] with a JSON body.
pub fn post<'a>(
    template: &str,
    path: &str,
    body: &'a str,
) -> (PathParams, BindingRequest<&'a [u8]>) {
    init_tracing();
    let template = PathTemplate::parse(template).expect("template");
    let params = template.match_path(path).expect("path matches template");
    let query = path.split_once('?').map(|(_, q)| q).unwrap_or_default();
    (
        params,
        BindingRequest::new(QueryMultimap::parse(query), body.as_bytes()),
    )
}
