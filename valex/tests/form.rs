use pretty_assertions::assert_eq;
use std::collections::HashMap;
use std::net::IpAddr;
use valex::{
    form::{bind, form_status, validate_form, validate_request, FieldOptions, FormValidator, FormValues},
    ConfigError, ErrorKind, ErrorValue, Namespace, Record,
};

#[derive(Debug, Default, Record)]
struct Signup {
    #[field("user")]
    #[val("min,size=3")]
    name: String,

    #[field("age,required=true")]
    #[val("rangeint,min=18,max=130")]
    age: u32,

    #[field("tags,max=3")]
    tags: Vec<String>,

    #[field("newsletter,default=false")]
    newsletter: bool,

    #[field("")]
    nickname: Option<String>,
}

#[test]
fn binds_and_validates() {
    let mut signup = Signup::default();
    validate_form(
        "user=alice&age=30&tags=a&tags=b&newsletter=on&nickname=al",
        &mut signup,
    )
    .unwrap();

    assert_eq!(signup.name, "alice");
    assert_eq!(signup.age, 30);
    assert_eq!(signup.tags, ["a", "b"]);
    assert!(signup.newsletter);
    assert_eq!(signup.nickname.as_deref(), Some("al"));
}

#[test]
fn missing_optional_values_keep_defaults() {
    let mut signup = Signup {
        newsletter: true,
        ..Default::default()
    };
    validate_form("user=alice&age=30", &mut signup).unwrap();

    assert!(!signup.newsletter);
    assert!(signup.tags.is_empty());
    assert_eq!(signup.nickname, None);
}

#[test]
fn required_field() {
    let err = validate_form("user=alice", &mut Signup::default()).unwrap_err();

    assert_eq!(err.status_code(), 422);
    assert_eq!(err.error().value, ErrorValue::Required);
    assert_eq!(err.to_string(), r#"field "age": field is required"#);

    let err = validate_form("user=alice&age=", &mut Signup::default()).unwrap_err();
    assert_eq!(err.error().value, ErrorValue::Required);
}

#[test]
fn too_many_values() {
    let err = validate_form("user=alice&age=30&tags=a&tags=b&tags=c&tags=d", &mut Signup::default())
        .unwrap_err();

    assert_eq!(err.status_code(), 400);
    assert_eq!(
        err.error().value,
        ErrorValue::TooManyValues { count: 4, max: 3 }
    );

    let err = validate_form("user=alice&user=bob&age=30", &mut Signup::default()).unwrap_err();
    assert_eq!(
        err.into_error().value,
        ErrorValue::TooManyValues { count: 2, max: 1 }
    );
}

#[test]
fn conversion_failures_are_bad_requests() {
    let err = validate_form("user=alice&age=old", &mut Signup::default()).unwrap_err();

    assert_eq!(err.status_code(), 400);
    assert_eq!(err.error().kind(), ErrorKind::Conversion);
}

#[test]
fn validation_after_binding() {
    let err = validate_form("user=al&age=30", &mut Signup::default()).unwrap_err();

    assert_eq!(err.status_code(), 422);
    assert_eq!(err.error().span.as_ref().unwrap().dotted(), "name");

    let err = validate_form("user=alice&age=12", &mut Signup::default()).unwrap_err();
    assert_eq!(err.status_code(), 422);
    assert_eq!(
        err.to_string(),
        r#"field "age": value 12 is out of range [18, 130]"#
    );
}

#[derive(Default, Record)]
struct Lookup {
    #[field("labels")]
    labels: HashMap<String, String>,
}

#[test]
fn unsupported_field_type() {
    let err = validate_form("labels=a", &mut Lookup::default()).unwrap_err();

    assert_eq!(err.status_code(), 400);
    assert!(matches!(
        err.error().value,
        ErrorValue::UnsupportedFieldType { .. }
    ));
}

#[derive(Default, Record)]
struct Server {
    #[field("addr,required=true")]
    #[val("!zeroip")]
    addr: Option<IpAddr>,
}

#[derive(Default, Record)]
struct Deployment {
    #[field("name")]
    #[val("nonempty")]
    name: String,

    #[tag(nested)]
    server: Server,
}

#[test]
fn nested_binding() {
    let mut deployment = Deployment::default();
    validate_form("name=web&addr=10.0.0.1", &mut deployment).unwrap();
    assert_eq!(deployment.server.addr, Some("10.0.0.1".parse().unwrap()));

    let err = validate_form("name=web", &mut Deployment::default()).unwrap_err();
    assert_eq!(err.to_string(), r#"field "server.addr": field is required"#);

    let err = validate_form("name=web&addr=0.0.0.0", &mut Deployment::default()).unwrap_err();
    assert_eq!(err.status_code(), 422);
    assert_eq!(err.to_string(), r#"field "server.addr": ip is zero"#);
}

#[test]
fn field_options() {
    let opts = FieldOptions::parse("user, max=2 ,required=true,default=x", "name").unwrap();
    assert_eq!(
        opts,
        FieldOptions {
            key: "user".into(),
            max: 2,
            required: true,
            default: Some("x".into()),
        }
    );

    let opts = FieldOptions::parse(",,", "name").unwrap();
    assert_eq!(opts.key, "name");
    assert_eq!(opts.max, 1);

    let opts = FieldOptions::parse("user,key=login", "name").unwrap();
    assert_eq!(opts.key, "login");

    let err = FieldOptions::parse("user,max=0", "name").unwrap_err();
    assert_eq!(
        err.value,
        ErrorValue::Config(ConfigError::InvalidParam {
            param: "max",
            reason: "must be positive".into(),
        })
    );

    let err = FieldOptions::parse("user,limit=2", "name").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[test]
fn form_values() {
    let mut values = FormValues::parse("a=1&a=2&b=x%20y&c=");

    assert_eq!(values.len(), 3);
    assert_eq!(values.get("a"), Some("1"));
    assert_eq!(values.get_all("a"), ["1", "2"]);
    assert_eq!(values.get("b"), Some("x y"));
    assert_eq!(values.get("c"), Some(""));
    assert!(values.get_all("missing").is_empty());

    values.set("a", "3");
    values.add("d", "4");
    assert_eq!(values.get_all("a"), ["3"]);
    assert!(values.contains_key("d"));
    assert_eq!(values.remove("d"), Some(vec!["4".to_string()]));

    let url = url::Url::parse("https://example.com/?q=rust&page=2").unwrap();
    let query = FormValues::from_query(&url);
    assert_eq!(query.get("page"), Some("2"));

    let collected: FormValues = vec![("k", "v")].into_iter().collect();
    assert_eq!(collected.get("k"), Some("v"));
}

#[test]
fn request_values() {
    let req = http::Request::post("/signup?user=query&age=40")
        .header("content-type", "application/x-www-form-urlencoded; charset=utf-8")
        .body("user=body&age=30")
        .unwrap();

    let values = FormValues::from_request(&req);
    assert_eq!(values.get_all("user"), ["body", "query"]);

    let get = http::Request::get("/signup?user=query&age=40")
        .body("user=body")
        .unwrap();
    assert_eq!(FormValues::from_request(&get).get_all("user"), ["query"]);

    let json = http::Request::post("/signup?user=alice&age=40")
        .header("content-type", "application/json")
        .body(r#"{"user": "body"}"#)
        .unwrap();
    let mut signup = Signup::default();
    validate_request(&json, &mut signup).unwrap();
    assert_eq!(signup.name, "alice");
    assert_eq!(signup.age, 40);
}

#[derive(Default, Record)]
struct Invite {
    #[field("code")]
    #[tag(ns = "strict", "len,min=6,max=6")]
    code: String,
}

#[test]
fn validator_with_extra_namespace() {
    let strict = Namespace::with_builtins("strict");

    let validator = FormValidator::new(FormValues::parse("code=abc")).with_namespace(&strict);
    assert_eq!(validator.values().get("code"), Some("abc"));

    let mut invite = Invite::default();
    let err = validator.validate(&mut invite).unwrap_err();
    assert!(err.is_validation());
    assert_eq!(invite.code, "abc");

    assert!(FormValidator::new(FormValues::parse("code=abc"))
        .validate(&mut Invite::default())
        .is_ok());
}

#[test]
fn bind_only() {
    let mut signup = Signup::default();
    bind(&FormValues::parse("user=al&age=5"), &mut signup).unwrap();

    assert_eq!(signup.name, "al");
    assert_eq!(signup.age, 5);
}

#[test]
fn statuses() {
    assert_eq!(form_status(None), http::StatusCode::OK);
    assert_eq!(
        form_status(Some(&ErrorValue::Required.into())),
        http::StatusCode::UNPROCESSABLE_ENTITY
    );
    assert_eq!(
        form_status(Some(&valex::Error::invalid("nope"))),
        http::StatusCode::UNPROCESSABLE_ENTITY
    );
    assert_eq!(
        form_status(Some(
            &ErrorValue::UnknownDirective {
                name: "foobar".into()
            }
            .into()
        )),
        http::StatusCode::BAD_REQUEST
    );
}

#[derive(Default, Record)]
struct Upload {
    #[field("size,required=true")]
    #[val("maxint,max=1048576")]
    size: u64,

    #[field("files,max=4")]
    #[val("nonempty")]
    files: Vec<String>,
}

#[test]
fn large_and_collection_values_are_validation_failures() {
    let mut upload = Upload::default();
    validate_form("size=1024&files=a.txt", &mut upload).unwrap();
    assert_eq!(upload.files, ["a.txt"]);

    let err = validate_form("size=18446744073709551615&files=a.txt", &mut Upload::default())
        .unwrap_err();
    assert_eq!(err.status_code(), 422);
    assert_eq!(
        err.to_string(),
        r#"field "size": value 18446744073709551615 exceeds maximum 1048576"#
    );

    let err = validate_form("size=1024", &mut Upload::default()).unwrap_err();
    assert_eq!(err.status_code(), 422);
    assert_eq!(err.to_string(), r#"field "files": sequence is empty"#);
}
