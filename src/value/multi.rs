//! Multiple values
//!
//! Calls, returns, varargs and every coroutine handoff carry a `Values`
//! list. `Returns` is the host-facing shape of the same list.

use super::Value;
use smallvec::SmallVec;

pub type Values = SmallVec<[Value; 4]>;

/// Host view of a multi-value result: nothing, a single value, or several.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Returns {
    #[default]
    None,
    One(Value),
    Many(Values),
}

impl Returns {
    pub fn len(&self) -> usize {
        match self {
            Returns::None => 0,
            Returns::One(_) => 1,
            Returns::Many(vs) => vs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// First value, or nil.
    pub fn first(&self) -> Value {
        match self {
            Returns::None => Value::Nil,
            Returns::One(v) => v.clone(),
            Returns::Many(vs) => vs.first().cloned().unwrap_or_default(),
        }
    }

    pub fn into_values(self) -> Values {
        match self {
            Returns::None => Values::new(),
            Returns::One(v) => smallvec::smallvec![v],
            Returns::Many(vs) => vs,
        }
    }
}

impl From<Values> for Returns {
    fn from(mut values: Values) -> Self {
        match values.len() {
            0 => Returns::None,
            1 => Returns::One(values.remove(0)),
            _ => Returns::Many(values),
        }
    }
}

/// The value at `i`, or nil past the end.
pub fn arg(values: &[Value], i: usize) -> Value {
    values.get(i).cloned().unwrap_or_default()
}
