//! Reference document shared by the decode and encode suites.

use chrono::NaiveDate;
use serde_tomlet::{toml, Value};

pub const DOCUMENT: &str = r#"foo = 2
bar = 3.2

[table]
foo = [ 1, 2, 3 ]
bar = -0.3
time = 0432-01-05T05:32:00
list = [ [ 4.1, 0.1 ], [ 3, 4, 1 ], [], [ true, false ] ]

[table.a]
foo = "Hello, I am a string."
abc = [ "a", "b", "c", "d", "e", "f" ]

[table.a.hash]
yes = true
no = false

[table."b.c"]
e = 5

[special]
infinity = inf
neg-inf = -inf
not-a-number = nan"#;

/// The value `DOCUMENT` decodes to, in the order `to_value` would build it.
pub fn mapping() -> Value {
    let time = NaiveDate::from_ymd_opt(432, 1, 5)
        .and_then(|d| d.and_hms_opt(5, 32, 0))
        .unwrap();

    toml!({
        "foo": 2,
        "table": {
            "foo": [1, 2, 3],
            "bar": (-0.3),
            "a": {
                "foo": "Hello, I am a string.",
                "abc": ["a", "b", "c", "d", "e", "f"],
                "hash": { "yes": true, "no": false }
            },
            "b.c": { "e": 5 },
            "time": (time),
            "list": [[4.1, 0.1], [3, 4, 1], [], [true, false]]
        },
        "bar": 3.2,
        "special": {
            "infinity": (f64::INFINITY),
            "neg-inf": (f64::NEG_INFINITY),
            "not-a-number": (f64::NAN)
        }
    })
}
