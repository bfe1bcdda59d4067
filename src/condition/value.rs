//! Raw leaf values as stored in condition trees

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single stored value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Number(f64),
    Text(String),
}

/// Value carried by a leaf: one scalar or a sequence of scalars
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LeafValue {
    Sequence(Vec<Scalar>),
    Scalar(Scalar),
}

impl LeafValue {
    /// The default value of a freshly created leaf
    pub fn blank() -> Self {
        LeafValue::Scalar(Scalar::Text(String::new()))
    }

    pub fn list<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Scalar>,
    {
        LeafValue::Sequence(items.into_iter().map(Into::into).collect())
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Text(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Text(value)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Number(value)
    }
}

impl From<i32> for Scalar {
    fn from(value: i32) -> Self {
        Scalar::Number(f64::from(value))
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

impl From<Scalar> for LeafValue {
    fn from(value: Scalar) -> Self {
        LeafValue::Scalar(value)
    }
}

macro_rules! leaf_value_from {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for LeafValue {
                fn from(value: $ty) -> Self {
                    LeafValue::Scalar(Scalar::from(value))
                }
            }
        )*
    };
}

leaf_value_from!(&str, String, f64, i32, bool);

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Number(n) => write!(f, "{}", n),
            Scalar::Text(s) => write!(f, "{:?}", s),
        }
    }
}

impl fmt::Display for LeafValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LeafValue::Scalar(scalar) => write!(f, "{}", scalar),
            LeafValue::Sequence(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
        }
    }
}
