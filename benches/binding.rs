use std::hint::black_box;

use bindparams::{BindingRequest, Binder, FlatShape, PathTemplate, QueryMultimap};
use criterion::{criterion_group, criterion_main, Criterion};
use serde::Deserialize;

#[derive(FlatShape, Debug)]
struct Params {
    id: i64,
    post_id: i64,
    filter_int: i64,
    filter_str: String,
    filter_bool: bool,
    filter_arr_int: Vec<i64>,
}

#[derive(Deserialize, Debug)]
struct User {
    name: String,
    age: u32,
}

const PATH: &str = "/user/1234/post/9876";
const QUERY: &str = "filterInt=20&filterStr=hello&filterBool=true\
                     &filterArrInt[]=1&filterArrInt[]=2&filterArrInt[]=3";
const BODY: &[u8] = br#"{"name":"Ronald","age":27}"#;

fn bench_binding(c: &mut Criterion) {
    let template = PathTemplate::parse("/user/{id}/post/{postId}").expect("template");

    let flat = Binder::new(|p: Params| p.id + p.post_id + p.filter_arr_int.len() as i64)
        .expect("flat binder");
    c.bench_function("bind_path_and_query", |b| {
        b.iter(|| {
            let path = template.match_path(PATH).expect("match");
            let request = BindingRequest::without_body(QueryMultimap::parse(QUERY));
            let out = flat.bind(request, &path);
            black_box(&out);
        })
    });

    let with_body = Binder::new(|p: Params, u: User| (p.id, u.name.len() as u32 + u.age))
        .expect("body binder");
    c.bench_function("bind_with_json_body", |b| {
        b.iter(|| {
            let path = template.match_path(PATH).expect("match");
            let request = BindingRequest::new(QueryMultimap::parse(QUERY), BODY);
            let out = with_body.bind(request, &path);
            black_box(&out);
        })
    });

    c.bench_function("bind_into_uncached", |b| {
        b.iter(|| {
            let path = template.match_path(PATH).expect("match");
            let request = BindingRequest::without_body(QueryMultimap::parse(QUERY));
            let out = bindparams::bind_into(request, &path, |p: Params| p.filter_int);
            black_box(&out);
        })
    });
}

criterion_group!(benches, bench_binding);
criterion_main!(benches);
