/// A macro to measure the evaluation time of an expression. Wraps an
/// expression, logs how long it took, and evaluates to the expression's value.
/// The default log level is `Debug`.
#[macro_export]
macro_rules! timed {
    ($label:expr, $ex:expr) => {
        $crate::timed!($label, log::Level::Debug, $ex)
    };
    ($label:expr, $log_level:expr, $ex:expr) => {{
        let now = std::time::Instant::now();
        let value = $ex;
        let elapsed = now.elapsed();
        log::log!($log_level, "{} took {} ms", $label, elapsed.as_millis());
        value
    }};
}

/// Round a float down and convert it to an `i32`, saturating at the bounds.
/// Infinities saturate, NaN becomes zero.
pub fn floor_i32(value: f64) -> i32 {
    value.floor() as i32
}

/// Midpoint of two integer coordinates, truncated towards zero
pub fn midpoint(a: i32, b: i32) -> i32 {
    ((a as i64 + b as i64) / 2) as i32
}

// Serialize a map as a list of `[key, value]` pairs instead of a map. Lattice
// coordinates and chunk positions can't be JSON object keys.
pub mod map_to_vec_serde {
    use indexmap::IndexMap;
    use serde::{ser::SerializeSeq, Serialize, Serializer};

    pub fn serialize<K, V, H, S>(
        map: &IndexMap<K, V, H>,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        K: Serialize,
        V: Serialize,
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(map.len()))?;
        for entry in map {
            seq.serialize_element(&entry)?;
        }
        seq.end()
    }
}
