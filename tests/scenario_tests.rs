mod common;

use bindparams::{bind_into, FlatShape};
use common::{get, post};
use serde::{Deserialize, Serialize};

#[derive(FlatShape, Debug, PartialEq)]
struct PostParams {
    id: i64,
    post_id: i64,
}

#[test]
fn test_url_parameters() {
    let (path, req) = get("/user/{id}/post/{postId}", "/user/1234/post/9876");
    let params = bind_into(req, &path, |p: PostParams| p).unwrap();
    assert_eq!(params, PostParams { id: 1234, post_id: 9876 });
}

#[derive(FlatShape, Debug, PartialEq)]
struct SimpleFilters {
    id: i64,
    filter_int: i64,
    filter_str: String,
    filter_bool: bool,
}

#[test]
fn test_query_string_of_simple_types() {
    let bind = |path: &str| {
        let (params, req) = get("/user/{id}", path);
        bind_into(req, &params, |p: SimpleFilters| p).unwrap()
    };

    assert_eq!(
        bind("/user/1234"),
        SimpleFilters { id: 1234, filter_int: 0, filter_str: String::new(), filter_bool: false }
    );
    assert_eq!(
        bind("/user/1234?filterInt=10"),
        SimpleFilters { id: 1234, filter_int: 10, filter_str: String::new(), filter_bool: false }
    );
    assert_eq!(
        bind("/user/1234?filterInt=10&filterStr=hello"),
        SimpleFilters { id: 1234, filter_int: 10, filter_str: "hello".into(), filter_bool: false }
    );
    assert_eq!(
        bind("/user/1234?filterInt=20&filterStr=hello&filterBool=true"),
        SimpleFilters { id: 1234, filter_int: 20, filter_str: "hello".into(), filter_bool: true }
    );
}

#[derive(FlatShape, Debug, PartialEq)]
struct ArrayFilters {
    id: i64,
    filter_arr_int: Vec<i64>,
    filter_arr_str: Vec<String>,
    filter_arr_bool: Vec<bool>,
}

#[test]
fn test_query_string_of_sequences() {
    let bind = |path: &str| {
        let (params, req) = get("/user/{id}", path);
        bind_into(req, &params, |p: ArrayFilters| p).unwrap()
    };

    let empty = bind("/user/1234");
    assert_eq!(empty.id, 1234);
    assert!(empty.filter_arr_int.is_empty());
    assert!(empty.filter_arr_str.is_empty());
    assert!(empty.filter_arr_bool.is_empty());

    assert_eq!(bind("/user/1234?filterArrInt=1").filter_arr_int, vec![1]);
    assert_eq!(bind("/user/1234?filterArrInt[]=1").filter_arr_int, vec![1]);
    assert_eq!(bind("/user/1234?filterArrInt=1&filterArrInt=2").filter_arr_int, vec![1, 2]);
    assert_eq!(
        bind("/user/1234?filterArrInt%5B%5D=1&filterArrInt%5B%5D=2").filter_arr_int,
        vec![1, 2]
    );

    let full = bind(
        "/user/1234?filterArrInt[]=1&filterArrInt[]=2&filterArrStr[]=one&filterArrStr[]=two\
         &filterArrBool[]=true&filterArrBool[]=false",
    );
    assert_eq!(
        full,
        ArrayFilters {
            id: 1234,
            filter_arr_int: vec![1, 2],
            filter_arr_str: vec!["one".into(), "two".into()],
            filter_arr_bool: vec![true, false],
        }
    );
}

#[derive(FlatShape, Debug)]
struct IdOnly {
    id: i64,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct User {
    name: String,
    age: i64,
}

#[test]
fn test_request_body() {
    let (path, req) = post("/user/{id}", "/user/1234", r#"{"name":"Ronald","age":27}"#);
    let (id, user) = bind_into(req, &path, |p: IdOnly, u: User| (p.id, u)).unwrap();
    assert_eq!(id, 1234);
    assert_eq!(user, User { name: "Ronald".into(), age: 27 });
}

#[test]
fn test_return_values_are_forwarded_in_order() {
    let (path, req) = get("/user/{id}/post/{postId}", "/user/1234/post/9876");
    let (s, ss) = bind_into(req, &path, |_: PostParams| ("hello", "world")).unwrap();
    assert_eq!(s, "hello");
    assert_eq!(ss, "world");
}

#[test]
fn test_no_return_values() {
    let (path, req) = get("/user/{id}", "/user/1");
    let seen = std::cell::Cell::new(0);
    bind_into(req, &path, |p: IdOnly| seen.set(p.id)).unwrap();
    assert_eq!(seen.get(), 1);
}
