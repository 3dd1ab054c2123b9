use pretty_assertions::assert_eq;
use std::net::IpAddr;
use valex::{
    directive::{DynDirective, TagSpec},
    directives::*,
    ConfigError, Directive, Error, ErrorKind, ErrorValue, Integer, Params, Payload, Validator,
};

fn ip(s: &str) -> IpAddr {
    s.parse().unwrap()
}

fn invoke(tag: &str, payload: Payload<'_>) -> Result<(), Error> {
    let TagSpec { name, mut params } = TagSpec::parse(tag)?;
    let directive = valex::default_namespace()
        .lookup(name)
        .unwrap_or_else(|| panic!("{} is not registered", name));
    directive.invoke(&mut params, &payload).map(|_| ())
}

#[test]
fn int_range_rejects_value_above_max() {
    let err = IntRange::new(0, 120).validate(&200).unwrap_err();

    assert_eq!(
        err.value,
        ErrorValue::OutOfRange {
            value: "200".into(),
            min: "0".into(),
            max: "120".into(),
        }
    );
    assert_eq!(err.to_string(), "value 200 is out of range [0, 120]");
    assert!(err.is_validation());
}

#[test]
fn int_range_inverted_bounds() {
    let err = IntRange::new(10, 1).validate(&5).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);

    let err = invoke("rangeint,min=10,max=1", Payload::Int(5_i64.into())).unwrap_err();
    assert_eq!(
        err.to_string(),
        r#"invalid configuration: value of parameter "min" cannot exceed "max""#
    );
}

#[test]
fn uuid_default_version() {
    assert!(Uuid::default()
        .validate("550e8400-e29b-41d4-a716-446655440000")
        .is_ok());

    let err = Uuid::default()
        .validate("6ba7b810-9dad-11d1-80b4-00c04fd430c8")
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        r#"value "6ba7b810-9dad-11d1-80b4-00c04fd430c8" is not a UUIDv4"#
    );

    assert!(Uuid::new(1)
        .validate("6ba7b810-9dad-11d1-80b4-00c04fd430c8")
        .is_ok());
}

#[test]
fn uuid_rejects_bad_input() {
    assert!(Uuid::default().validate("not-a-uuid").is_err());
    assert!(Uuid::default()
        .validate("550e8400-e29b-41d4-c716-446655440000")
        .is_err());

    let err = Uuid::new(9).validate("550e8400-e29b-41d4-a716-446655440000").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[test]
fn ip_range() {
    let range = IpRange::new(ip("192.168.1.10"), ip("192.168.1.20"));

    assert!(range.validate(&ip("192.168.1.15")).is_ok());
    assert!(range.validate(&ip("192.168.1.10")).is_ok());
    assert!(range.validate(&ip("192.168.1.20")).is_ok());

    let err = range.validate(&ip("192.168.1.30")).unwrap_err();
    assert!(err.is_validation());
    assert_eq!(
        err.to_string(),
        "ip 192.168.1.30 is not in range [192.168.1.10, 192.168.1.20]"
    );
}

#[test]
fn ip_range_family_mismatch() {
    let range = IpRange::new(ip("2001:db8::1"), ip("2001:db8::ff"));
    let err = range.validate(&ip("10.0.0.1")).unwrap_err();

    assert_eq!(
        err.value,
        ErrorValue::Config(ConfigError::IpFamilyMismatch {
            expected: "IPv6",
            found: "IPv4",
        })
    );

    let err = IpRange::new(ip("10.0.0.1"), ip("::1")).validate(&ip("10.0.0.1")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[test]
fn ip_range_treats_mapped_addresses_as_v4() {
    let range = IpRange::new(ip("10.0.0.0"), ip("10.0.0.255"));
    assert!(range.validate(&ip("::ffff:10.0.0.7")).is_ok());
}

#[test]
fn ip_formats() {
    assert!(IpFormat::any().validate("::1").is_ok());
    assert!(IpFormat::v4().validate("127.0.0.1").is_ok());
    assert!(IpFormat::v4().validate("::1").is_err());
    assert!(IpFormat::v6().validate("fe80::1").is_ok());
    assert!(IpFormat::v6().validate("127.0.0.1").is_err());
    assert!(IpFormat::any().validate("localhost").is_err());
}

#[test]
fn string_lengths_count_characters() {
    let err = MinLength::new(3).validate("Al").unwrap_err();
    assert_eq!(
        err.to_string(),
        r#"value "Al" with length 2 is shorter than minimum length 3"#
    );

    assert!(MinLength::new(3).validate("Zoë").is_ok());
    assert!(MaxLength::new(3).validate("Zoë").is_ok());
    assert!(MaxLength::new(3).validate("Zoey").is_err());
    assert!(LengthRange::new(2, 4).validate("abc").is_ok());
    assert!(LengthRange::new(2, 4).validate("a").is_err());
}

#[test]
fn string_length_sizes() {
    let err = invoke("min,size=0", Payload::Str("abc")).unwrap_err();
    assert_eq!(
        err.value,
        ErrorValue::Config(ConfigError::InvalidParam {
            param: "size",
            reason: "cannot be 0".into(),
        })
    );

    let err = invoke("max,size=-1", Payload::Str("abc")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[test]
fn string_formats() {
    assert!(UrlFormat.validate("https://example.com/a?b=c").is_ok());
    assert!(UrlFormat.validate("/relative/path").is_ok());
    assert!(UrlFormat.validate("not a url").is_err());

    assert!(Email.validate("alice@example.com").is_ok());
    assert!(Email.validate("Alice <alice@example.com>").is_ok());
    assert!(Email.validate("alice@").is_err());

    assert!(AlphaNumeric.validate("abc123").is_ok());
    assert!(AlphaNumeric.validate("abc-123").is_err());

    assert!(Json.validate(r#"{"a": [1, 2]}"#).is_ok());
    assert!(Json.validate("{a: 1}").is_err());

    assert!(Xml.validate("<a><b>text</b></a>").is_ok());
    assert!(Xml.validate("<a><b></a>").is_err());
    assert!(Xml.validate("just text").is_err());

    assert!(Base64.validate("aGVsbG8=").is_ok());
    assert!(Base64.validate("aGVsbG8").is_ok());
    assert!(Base64.validate("***").is_err());

    assert!(Hex.validate("0xdeadBEEF").is_ok());
    assert!(Hex.validate("abc").is_err());

    assert!(NonEmpty.validate("x").is_ok());
    assert_eq!(NonEmpty.validate("").unwrap_err().to_string(), "string is empty");
}

#[test]
fn network_strings() {
    assert!(MacAddress.validate("00:1a:2b:3c:4d:5e").is_ok());
    assert!(MacAddress.validate("00-1A-2B-3C-4D-5E").is_ok());
    assert!(MacAddress.validate("001a.2b3c.4d5e").is_ok());
    assert!(MacAddress.validate("00:1a:2b:3c:4d:5e:6f:70").is_ok());
    assert!(MacAddress.validate("00:1a:2b:3c:4d").is_err());
    assert!(MacAddress.validate("00:1a:2b:3c:4d:zz").is_err());

    assert!(Hostname.validate("localhost").is_ok());
    assert!(Hostname.validate("api.example.com").is_ok());
    assert!(Hostname.validate("-bad.example.com").is_err());

    assert!(Cidr.validate("10.0.0.0/8").is_ok());
    assert!(Cidr.validate("2001:db8::/32").is_ok());
    assert!(Cidr.validate("10.0.0.0/33").is_err());
    assert!(Cidr.validate("10.0.0.0").is_err());
}

#[test]
fn string_membership_and_substrings() {
    assert!(invoke("oneof,values=red|green", Payload::Str("green")).is_ok());

    let err = invoke("oneof,values=red|green", Payload::Str("blue")).unwrap_err();
    assert_eq!(err.to_string(), r#"value "blue" is not in allowed set"#);

    let err = invoke("oneof,values=|", Payload::Str("blue")).unwrap_err();
    assert_eq!(
        err.value,
        ErrorValue::Config(ConfigError::EmptySet { param: "values" })
    );

    assert!(invoke("prefix,value=ab", Payload::Str("abc")).is_ok());
    assert!(invoke("suffix,value=bc", Payload::Str("abc")).is_ok());
    assert!(invoke("contains,value=x", Payload::Str("abc")).is_err());
    assert!(invoke(r"regex,pattern=^\d+$", Payload::Str("123")).is_ok());
    assert!(invoke(r"regex,pattern=^\d+$", Payload::Str("12a")).is_err());
}

#[test]
fn time_layouts() {
    assert!(TimeLayout::default().validate("2024-05-01T10:00:00Z").is_ok());
    assert!(TimeLayout::default().validate("2024-05-01").is_err());

    assert!(invoke("time,format=DateOnly", Payload::Str("2024-05-01")).is_ok());
    assert!(invoke("time,format=%d/%m/%Y", Payload::Str("01/05/2024")).is_ok());
    assert!(invoke("time,format=%d/%m/%Y", Payload::Str("2024-05-01")).is_err());

    let err = invoke("time,format=%Q", Payload::Str("x")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conversion);

    assert_eq!(Layout::resolve("RFC3339Nano").unwrap(), Layout::Rfc3339);
}

#[test]
fn time_bounds() {
    let t = |s: &str| {
        chrono::DateTime::parse_from_rfc3339(s)
            .unwrap()
            .with_timezone(&chrono::Utc)
    };

    let noon = t("2024-05-01T12:00:00Z");
    assert!(TimeBefore::new(noon).validate(&t("2024-05-01T11:59:59Z")).is_ok());
    assert!(TimeBefore::new(noon).validate(&noon).is_err());
    assert!(TimeAfter::new(noon).validate(&t("2024-05-01T12:00:01Z")).is_ok());
    assert!(TimeAfter::new(noon).validate(&noon).is_err());

    let between = TimeBetween::new(t("2024-01-01T00:00:00Z"), t("2024-12-31T23:59:59Z"));
    assert!(between.validate(&noon).is_ok());
    assert!(between.validate(&t("2025-01-01T00:00:00Z")).is_err());

    assert!(invoke(
        "betweentime,start=2024-02-01T00:00:00Z,end=2024-01-01T00:00:00Z",
        Payload::Time(noon)
    )
    .unwrap_err()
    .kind()
        == ErrorKind::Configuration);

    assert!(NonZeroTime.validate(&chrono::DateTime::<chrono::Utc>::default()).is_err());
}

#[test]
fn durations() {
    assert!(PositiveDuration.validate(&chrono::TimeDelta::seconds(1)).is_ok());
    assert_eq!(
        PositiveDuration
            .validate(&chrono::TimeDelta::zero())
            .unwrap_err()
            .to_string(),
        "duration is not positive"
    );
    assert_eq!(
        NonZeroDuration
            .validate(&chrono::TimeDelta::zero())
            .unwrap_err()
            .to_string(),
        "duration is zero"
    );
}

#[test]
fn absent_values() {
    assert!(invoke("rangeint,min=0,max=10", Payload::Absent).is_ok());
    assert!(invoke("email", Payload::Absent).is_ok());

    assert_eq!(
        invoke("!zeroint", Payload::Absent).unwrap_err().value,
        ErrorValue::Zero { subject: "value" }
    );
    assert_eq!(
        invoke("nonzeroip", Payload::Absent).unwrap_err().value,
        ErrorValue::Zero { subject: "ip" }
    );
    assert!(invoke("nonempty", Payload::Absent).is_err());
}

#[test]
fn aliases_share_evaluation() {
    let alias = valex::Alias::new("nonzeroint", NonZeroInt);
    assert_eq!(Directive::name(&alias), "nonzeroint");
    assert!(alias.validate(&0).is_err());
    assert!(alias.validate(&3).is_ok());

    assert!(invoke("nonzeroint", Payload::Int(0_i64.into())).is_err());
    assert!(invoke("!zeroint", Payload::Int(0_i64.into())).is_err());
    assert!(invoke("nonzerofloat", Payload::Float(0.5)).is_ok());
}

#[test]
fn tag_parameters() {
    let err = invoke("rangeint,min=0", Payload::Int(1_i64.into())).unwrap_err();
    assert_eq!(
        err.value,
        ErrorValue::Config(ConfigError::MissingParam { param: "max" })
    );

    let err = invoke("rangeint,min=0,max=9,step=2", Payload::Int(1_i64.into())).unwrap_err();
    assert_eq!(
        err.value,
        ErrorValue::Config(ConfigError::UnknownParam {
            directive: "rangeint".into(),
            param: "step".into(),
        })
    );

    let err = invoke("rangeint,min=0,min=1,max=9", Payload::Int(1_i64.into())).unwrap_err();
    assert_eq!(
        err.value,
        ErrorValue::Config(ConfigError::DuplicateParam {
            param: "min".into()
        })
    );

    let err = invoke("rangeint,min=zero,max=9", Payload::Int(1_i64.into())).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conversion);
    assert!(err.to_string().contains(r#"in parameter "min""#));

    let err = invoke("rangeint,min", Payload::Int(1_i64.into())).unwrap_err();
    assert!(matches!(
        err.value,
        ErrorValue::Config(ConfigError::MalformedTag { .. })
    ));

    assert!(TagSpec::parse(" , min=1").is_err());

    let spec = TagSpec::parse(" rangeint , min = 1 , max = 2 ").unwrap();
    assert_eq!(spec.name, "rangeint");
}

#[test]
fn type_mismatch() {
    let err = invoke("email", Payload::Int(5_i64.into())).unwrap_err();
    assert_eq!(
        err.value,
        ErrorValue::TypeMismatch {
            directive: "email".into(),
            expected: "string",
            found: "integer",
        }
    );
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[test]
fn materialize_by_hand() {
    let mut params = Params::new().with("min", "1").with("max", "5");
    let range = IntRange::default().materialize(&mut params).unwrap();

    assert_eq!(range, IntRange::new(1, 5));
    assert!(params.finish("rangeint").is_ok());
}

#[test]
fn transforms() {
    assert_eq!(
        Trim.transform("  a b ").unwrap(),
        Some(valex::Value::Str("a b".into()))
    );
    assert_eq!(Trim.transform("ab").unwrap(), None);
    assert_eq!(
        Uppercase.transform("ab").unwrap(),
        Some(valex::Value::Str("AB".into()))
    );
    assert_eq!(
        ClampInt::new(0, 10).transform(&Integer::from(42_u8)).unwrap(),
        Some(valex::Value::Int(10))
    );
    assert_eq!(
        ClampInt::new(0, 10).transform(&Integer::from(-3_i128)).unwrap(),
        Some(valex::Value::Int(0))
    );
    assert_eq!(ClampInt::new(0, 10).transform(&Integer::from(4_i64)).unwrap(), None);

    assert_eq!(Directive::mode(&Lowercase), valex::Mode::Mut);
}

#[test]
fn builtin_names() {
    let ns = valex::default_namespace();

    for name in [
        "rangeint", "posint", "negint", "minint", "maxint", "!zeroint", "oneofint",
        "rangefloat", "oneoffloat", "url", "email", "!empty", "min", "max", "len", "regex",
        "prefix", "suffix", "contains", "oneof", "alphanum", "xml", "json", "uuid", "base64",
        "hex", "time", "mac", "ip", "ipv4", "ipv6", "hostname", "cidr", "!zerotime",
        "beforetime", "aftertime", "betweentime", "posduration", "!zeroduration", "!zeroip",
        "iprange", "!zerourl", "trim", "lower", "upper", "clampint", "!zero", "nonzero",
    ] {
        assert!(ns.contains(name), "{} is missing", name);
    }

    assert!(!ns.contains("foobar"));
    assert_eq!(ns.lookup("uuid").unwrap().expects(), "string");
    assert_eq!(ns.lookup("rangeint").unwrap().expects(), "integer");
    assert_eq!(ns.lookup("nonempty").unwrap().expects(), "string or collection");
}

#[test]
fn integers_wider_than_64_bits() {
    let err = invoke("maxint,max=100", Payload::Int(u64::MAX.into())).unwrap_err();
    assert_eq!(
        err.value,
        ErrorValue::MoreThanMax {
            value: "18446744073709551615".into(),
            max: "100".into(),
        }
    );
    assert!(err.is_validation());

    let huge = Payload::Int((1_i128 << 100).into());
    let err = invoke("rangeint,min=0,max=9223372036854775807", huge).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(
        err.to_string(),
        "value 1267650600228229401496703205376 is out of range [0, 9223372036854775807]"
    );

    let err = invoke("minint,min=0", Payload::Int(i128::MIN.into())).unwrap_err();
    assert!(err.is_validation());

    assert!(invoke("minint,min=0", Payload::Int(u128::MAX.into())).is_ok());
    assert!(invoke("posint", Payload::Int(u128::MAX.into())).is_ok());
    assert!(invoke("negint", Payload::Int(u128::MAX.into())).is_err());
    assert!(invoke("oneofint,values=1|2", Payload::Int(u64::MAX.into())).is_err());
    assert!(invoke("!zeroint", Payload::Int(u64::MAX.into())).is_ok());
}

#[test]
fn integer_ordering() {
    assert!(Integer::from(u128::MAX) > Integer::from(u64::MAX));
    assert!(Integer::from(u64::MAX) > Integer::from(i64::MAX));
    assert!(Integer::from(i128::MIN) < Integer::from(i64::MIN));
    assert_eq!(Integer::from(7_u8), Integer::from(7_i64));
    assert_eq!(Integer::from(u128::MAX).to_string(), u128::MAX.to_string());
    assert_eq!(Integer::from(u64::MAX).to_i64(), None);
    assert_eq!(Integer::from(-5_i16).to_i64(), Some(-5));
}

#[test]
fn collection_emptiness() {
    assert!(invoke("nonempty", Payload::Seq(2)).is_ok());
    assert!(invoke("!empty", Payload::Map(1)).is_ok());
    assert!(invoke("nonempty", Payload::Str("a")).is_ok());

    assert_eq!(
        invoke("nonempty", Payload::Seq(0)).unwrap_err().to_string(),
        "sequence is empty"
    );
    assert_eq!(
        invoke("!empty", Payload::Map(0)).unwrap_err().to_string(),
        "map is empty"
    );
    assert_eq!(
        invoke("nonempty", Payload::Str("")).unwrap_err().to_string(),
        "string is empty"
    );

    let err = invoke("nonempty", Payload::Bool(true)).unwrap_err();
    assert_eq!(
        err.value,
        ErrorValue::TypeMismatch {
            directive: "nonempty".into(),
            expected: "string or collection",
            found: "bool",
        }
    );
}

#[test]
fn zero_values_of_any_kind() {
    for payload in [
        Payload::Int(3_i64.into()),
        Payload::Float(0.5),
        Payload::Bool(true),
        Payload::Str("x"),
        Payload::Seq(1),
        Payload::Map(4),
    ] {
        assert!(invoke("nonzero", payload).is_ok(), "{:?}", payload);
    }

    assert_eq!(
        invoke("!zero", Payload::Bool(false)).unwrap_err().value,
        ErrorValue::Zero { subject: "bool" }
    );
    assert_eq!(
        invoke("nonzero", Payload::Seq(0)).unwrap_err().to_string(),
        "sequence is zero"
    );
    assert_eq!(
        invoke("nonzero", Payload::Map(0)).unwrap_err().to_string(),
        "map is zero"
    );
    assert_eq!(
        invoke("!zero", Payload::Int(0_i64.into())).unwrap_err().to_string(),
        "integer is zero"
    );
    assert_eq!(
        invoke("nonzero", Payload::Absent).unwrap_err().value,
        ErrorValue::Zero { subject: "value" }
    );
    assert!(invoke("!zero", Payload::Absent).unwrap_err().is_validation());
}
