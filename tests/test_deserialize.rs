use std::collections::{BTreeMap, HashMap};

use pretty_assertions::assert_eq;
use serde::Deserialize;
use serde_qstring::{Config, Error, Value};

#[derive(Debug, Deserialize, PartialEq)]
struct Address {
    city: String,
    postcode: String,
}

#[derive(Debug, Deserialize, PartialEq)]
struct QueryParams {
    id: u8,
    name: String,
    address: Address,
    phone: u32,
    user_ids: Vec<u8>,
}

#[test]
fn deserialize_struct() {
    let params = QueryParams {
        id: 42,
        name: "Acme".to_string(),
        phone: 12345,
        address: Address {
            city: "Carrot City".to_string(),
            postcode: "12345".to_string(),
        },
        user_ids: vec![1, 2, 3, 4],
    };

    // standard parameters
    let rec_params: QueryParams = serde_qstring::from_str(
        "\
        name=Acme&id=42&phone=12345&address[postcode]=12345&\
        address[city]=Carrot+City&user_ids[0]=1&user_ids[1]=2&\
        user_ids[2]=3&user_ids[3]=4",
    )
    .unwrap();
    assert_eq!(rec_params, params);

    // unindexed arrays
    let rec_params: QueryParams = serde_qstring::from_str(
        "\
        name=Acme&id=42&phone=12345&address[postcode]=12345&\
        address[city]=Carrot+City&user_ids[]=1&user_ids[]=2&\
        user_ids[]=3&user_ids[]=4",
    )
    .unwrap();
    assert_eq!(rec_params, params);

    // ordering doesn't matter
    let rec_params: QueryParams = serde_qstring::from_str(
        "\
        address[city]=Carrot+City&user_ids[]=1&user_ids[]=2&\
        name=Acme&id=42&phone=12345&address[postcode]=12345&\
        user_ids[]=3&user_ids[]=4",
    )
    .unwrap();
    assert_eq!(rec_params, params);

    // form-encoded brackets
    let rec_params: QueryParams = serde_qstring::from_str(
        "\
        name=Acme&id=42&phone=12345&address%5Bpostcode%5D=12345&\
        address%5Bcity%5D=Carrot+City&user_ids%5B0%5D=1&user_ids%5B1%5D=2&\
        user_ids%5B2%5D=3&user_ids%5B3%5D=4",
    )
    .unwrap();
    assert_eq!(rec_params, params);
}

#[test]
fn fixed_array_of_appended_values() {
    #[derive(Debug, Deserialize, PartialEq)]
    struct Three {
        hoge: [String; 3],
    }
    #[derive(Debug, Deserialize, PartialEq)]
    struct Two {
        hoge: [String; 2],
    }

    let q: Three = serde_qstring::from_str("hoge[]=a&hoge[]=2&hoge[]=3").unwrap();
    assert_eq!(q.hoge, ["a", "2", "3"]);

    let err = serde_qstring::from_str::<Two>("hoge[]=a&hoge[]=2&hoge[]=3").unwrap_err();
    assert!(
        matches!(
            err,
            Error::ArrayIndexOutOfRange {
                capacity: 2,
                length: 3
            }
        ),
        "got: {err:?}"
    );
    insta::assert_snapshot!(err, @"index out of range [3] with array of length 2");
}

#[test]
fn fixed_array_pads_with_zero() {
    #[derive(Debug, Deserialize, PartialEq)]
    struct Query {
        slots: [u32; 4],
        pair: (String, bool),
    }

    let q: Query = serde_qstring::from_str("slots[0]=7&slots[1]=8&pair[0]=x").unwrap();
    assert_eq!(q.slots, [7, 8, 0, 0]);
    assert_eq!(q.pair, ("x".to_string(), false));
}

#[test]
fn bool_field() {
    #[derive(Debug, Deserialize, PartialEq)]
    struct Query {
        field: bool,
    }

    assert!(serde_qstring::from_str::<Query>("field=1").unwrap().field);
    assert!(serde_qstring::from_str::<Query>("field=true").unwrap().field);
    assert!(!serde_qstring::from_str::<Query>("field=0").unwrap().field);
    assert!(!serde_qstring::from_str::<Query>("field=false").unwrap().field);
    assert!(!serde_qstring::from_str::<Query>("").unwrap().field);

    let err = serde_qstring::from_str::<Query>("field=a").unwrap_err();
    assert!(matches!(err, Error::TypeMismatch { .. }), "got: {err:?}");
    insta::assert_snapshot!(err, @r#""a" can not be assigned to bool"#);
}

#[test]
fn integer_bounds() {
    #[derive(Debug, Deserialize, PartialEq)]
    struct Query {
        small: i8,
        unsigned: u16,
    }

    let q: Query = serde_qstring::from_str("small=-128&unsigned=65535").unwrap();
    assert_eq!(q, Query { small: -128, unsigned: 65535 });

    let err = serde_qstring::from_str::<Query>("small=128").unwrap_err();
    assert!(matches!(err, Error::RangeError { .. }), "got: {err:?}");
    let err = serde_qstring::from_str::<Query>("unsigned=-1").unwrap_err();
    assert!(matches!(err, Error::RangeError { .. }), "got: {err:?}");
    let err = serde_qstring::from_str::<Query>("unsigned=ten").unwrap_err();
    assert!(matches!(err, Error::TypeMismatch { .. }), "got: {err:?}");
}

#[test]
fn optional_fields() {
    #[derive(Debug, Deserialize, PartialEq)]
    struct Query {
        a: Option<u8>,
        b: Option<Vec<String>>,
        c: Option<String>,
    }

    let q: Query = serde_qstring::from_str("a=1&b[]=x").unwrap();
    assert_eq!(
        q,
        Query {
            a: Some(1),
            b: Some(vec!["x".to_string()]),
            c: None,
        }
    );

    let q: Query = serde_qstring::from_str("a=&b=&c=").unwrap();
    assert_eq!(
        q,
        Query {
            a: None,
            b: None,
            c: None,
        }
    );
}

#[test]
fn dictionary_fields() {
    #[derive(Debug, Deserialize, PartialEq)]
    struct Query {
        filters: HashMap<String, String>,
        nested: BTreeMap<String, Vec<u8>>,
    }

    let q: Query =
        serde_qstring::from_str("filters[color]=red&filters[size]=L&nested[a][]=1&nested[b][0]=2")
            .unwrap();
    assert_eq!(q.filters["color"], "red");
    assert_eq!(q.filters["size"], "L");
    assert_eq!(q.nested["a"], vec![1]);
    assert_eq!(q.nested["b"], vec![2]);

    // a plain value where a dictionary is expected is an empty dictionary
    let q: Query = serde_qstring::from_str("filters=x&nested=").unwrap();
    assert!(q.filters.is_empty());
    assert!(q.nested.is_empty());
}

#[test]
fn indices_are_ordered_numerically() {
    #[derive(Debug, Deserialize, PartialEq)]
    struct Query {
        v: Vec<String>,
    }

    let q: Query = serde_qstring::from_str("v[10]=c&v[2]=b&v[0]=a").unwrap();
    assert_eq!(q.v, vec!["a", "b", "c"]);

    // indices naming the same position keep the last value
    let q: Query = serde_qstring::from_str("v[1]=a&v[01]=b").unwrap();
    assert_eq!(q.v, vec!["b"]);
}

#[test]
fn conflicting_keys_keep_nested_values() {
    let map: BTreeMap<String, BTreeMap<String, String>> =
        serde_qstring::from_str("a=1&a[b]=2").unwrap();
    assert_eq!(map["a"]["b"], "2");
}

#[test]
fn decode_to_dynamic_values() {
    let map = serde_qstring::decode_to_map("a[0]=x&a[1]=y&b[k]=v&c=z&c=w").unwrap();
    assert_eq!(
        map["a"],
        Value::List(vec![Value::from("x"), Value::from("y")])
    );
    assert_eq!(map["b"]["k"], Value::from("v"));
    assert_eq!(
        map["c"],
        Value::List(vec![Value::from("z"), Value::from("w")])
    );

    assert_eq!(
        serde_qstring::decode_to_string("?q=caf%C3%A9+au+lait").unwrap(),
        "?q=café au lait"
    );

    let list = serde_qstring::decode_to_list("x[][a]=1&x[][b]=2").unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["a"], Value::from("1"));

    assert!(serde_qstring::decode_to_list("").unwrap().is_empty());
    assert!(matches!(
        serde_qstring::decode_to_list("a=1&b=2&c=3"),
        Err(Error::MultipleRootKeys(3))
    ));
}

#[test]
fn depth_limit() {
    let deep = "a[b][c][d][e]=1";
    let err = Config::new()
        .max_depth(3)
        .deserialize_str::<Value>(deep)
        .unwrap_err();
    assert!(matches!(err, Error::DepthLimitExceeded { max_depth: 3, .. }), "got: {err:?}");

    let value: Value = Config::new().max_depth(4).deserialize_str(deep).unwrap();
    assert_eq!(value["a"]["b"]["c"]["d"]["e"], Value::from("1"));
}

#[test]
fn invalid_utf8() {
    let err = serde_qstring::from_bytes::<Value>(b"a=%E9t%E9").unwrap_err();
    assert!(matches!(err, Error::Utf8(_)), "got: {err:?}");
}

#[test]
fn top_level_primitives_are_rejected() {
    let err = serde_qstring::from_str::<u32>("a=1").unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)), "got: {err:?}");
    insta::assert_snapshot!(err, @"integer at the top level is not supported");
}

#[test]
fn unit_enum_fields() {
    #[derive(Debug, Deserialize, PartialEq)]
    #[serde(rename_all = "snake_case")]
    enum Sort {
        Newest,
        MostPopular,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Query {
        sort: Sort,
        also: Vec<Sort>,
    }

    let q: Query =
        serde_qstring::from_str("sort=most_popular&also[]=newest&also[]=most_popular").unwrap();
    assert_eq!(
        q,
        Query {
            sort: Sort::MostPopular,
            also: vec![Sort::Newest, Sort::MostPopular],
        }
    );
}

#[test]
fn absent_enum_field_is_the_first_variant() {
    #[derive(Debug, Default, Deserialize, PartialEq)]
    #[serde(rename_all = "snake_case")]
    enum Mode {
        #[default]
        Fast,
        Slow,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Query {
        name: String,
        mode: Mode,
        #[serde(default)]
        fallback: Mode,
        modes: [Mode; 2],
    }

    let q: Query = serde_qstring::from_str("name=x&modes[0]=slow").unwrap();
    assert_eq!(
        q,
        Query {
            name: "x".to_string(),
            mode: Mode::Fast,
            fallback: Mode::Fast,
            modes: [Mode::Slow, Mode::Fast],
        }
    );
}

#[test]
fn absent_enum_field_needs_a_unit_first_variant() {
    #[derive(Debug, Deserialize, PartialEq)]
    #[serde(rename_all = "snake_case")]
    enum Limit {
        Count(u32),
        Unbounded,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Query {
        limit: Limit,
    }

    assert_eq!(
        serde_qstring::from_str::<Query>("limit=unbounded").unwrap().limit,
        Limit::Unbounded
    );
    assert!(serde_qstring::from_str::<Query>("").is_err());
}

#[test]
fn serde_defaults_give_way_to_zero_values() {
    fn five() -> u32 {
        5
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Query {
        #[serde(default = "five")]
        page: u32,
        per_page: Option<u32>,
    }

    let q: Query = serde_qstring::from_str("").unwrap();
    assert_eq!(q, Query { page: 0, per_page: None });

    let q: Query = serde_qstring::from_str("page=2&per_page=0").unwrap();
    assert_eq!(q, Query { page: 2, per_page: Some(0) });

    #[derive(Debug, Deserialize, PartialEq)]
    #[serde(default)]
    struct Paging {
        page: u32,
    }

    impl Default for Paging {
        fn default() -> Self {
            Paging { page: 1 }
        }
    }

    let q: Paging = serde_qstring::from_str("").unwrap();
    assert_eq!(q, Paging { page: 0 });
}
