//! RuntimeValue - the dynamically-typed value LogCon expressions
//! evaluate to.
//!
//! Grounded on `Runtime/RuntimeValue.h`/`.cpp`: a small tagged union
//! with three conversion traits (`AsNumber`/`AsBool`/`AsString`) that
//! every operator and builtin goes through instead of matching on the
//! variant directly, so coercion rules live in one place. Arrays are
//! reference-counted and interior-mutable (`Rc<RefCell<..>>`) because
//! LogCon arrays have value-type syntax but reference semantics -
//! `push`/`pop`/`shuffle`/`sort` mutate in place and every binding that
//! captured the array observes it.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

pub type SharedArray = Rc<RefCell<Vec<RuntimeValue>>>;

/// Arrays longer than this are truncated with a trailing `[...]`
/// marker by `AsString`.
pub const ARRAY_DISPLAY_CAP: usize = 100;

#[derive(Clone)]
pub enum RuntimeValue {
    Unit,
    Number(f64),
    Bool(bool),
    String(String),
    Array(SharedArray),
}

impl RuntimeValue {
    pub fn array(values: Vec<RuntimeValue>) -> Self {
        RuntimeValue::Array(Rc::new(RefCell::new(values)))
    }

    pub fn as_number(&self) -> f64 {
        match self {
            RuntimeValue::Unit => 0.0,
            RuntimeValue::Number(n) => *n,
            RuntimeValue::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            RuntimeValue::String(s) => s.trim().parse().unwrap_or(0.0),
            RuntimeValue::Array(a) => a.borrow().len() as f64,
        }
    }

    /// `"0"`, `"false"`, and `"нет"` ("no") are treated as falsy
    /// regardless of non-emptiness, matching the original's
    /// special-cased string literals for a boolean-ish "no".
    pub fn as_bool(&self) -> bool {
        match self {
            RuntimeValue::Unit => false,
            RuntimeValue::Number(n) => *n != 0.0,
            RuntimeValue::Bool(b) => *b,
            RuntimeValue::String(s) => !s.is_empty() && !matches!(s.as_str(), "0" | "false" | "нет"),
            RuntimeValue::Array(a) => !a.borrow().is_empty(),
        }
    }

    pub fn as_string(&self) -> String {
        match self {
            RuntimeValue::Unit => String::new(),
            RuntimeValue::Number(n) => format_number(*n),
            RuntimeValue::Bool(b) => if *b { "true" } else { "false" }.to_string(),
            RuntimeValue::String(s) => s.clone(),
            RuntimeValue::Array(a) => {
                let items = a.borrow();
                let truncated = items.len() > ARRAY_DISPLAY_CAP;
                let shown = items.iter().take(ARRAY_DISPLAY_CAP).map(RuntimeValue::as_string);
                let mut parts: Vec<String> = shown.collect();
                if truncated {
                    parts.push("[...]".to_string());
                }
                format!("[{}]", parts.join(", "))
            }
        }
    }

    pub fn is_truthy(&self) -> bool {
        self.as_bool()
    }
}

/// Mirrors the original's `%g`-ish formatting: integral floats print
/// without a trailing `.0`.
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

impl fmt::Debug for RuntimeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_string())
    }
}

impl PartialEq for RuntimeValue {
    fn eq(&self, other: &Self) -> bool {
        self.as_string() == other.as_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn as_number_parses_numeric_strings() {
        assert_eq!(RuntimeValue::String("42".to_string()).as_number(), 42.0);
        assert_eq!(RuntimeValue::String("abc".to_string()).as_number(), 0.0);
    }

    #[test]
    fn as_bool_treats_russian_no_as_falsy() {
        assert!(!RuntimeValue::String("нет".to_string()).as_bool());
        assert!(RuntimeValue::String("yes".to_string()).as_bool());
        assert!(!RuntimeValue::String(String::new()).as_bool());
    }

    #[test]
    fn as_bool_treats_zero_and_false_strings_as_falsy() {
        assert!(!RuntimeValue::String("0".to_string()).as_bool());
        assert!(!RuntimeValue::String("false".to_string()).as_bool());
        assert!(RuntimeValue::String("1".to_string()).as_bool());
    }

    #[test]
    fn as_string_formats_integral_floats_without_fraction() {
        assert_eq!(RuntimeValue::Number(5.0).as_string(), "5");
        assert_eq!(RuntimeValue::Number(5.5).as_string(), "5.5");
    }

    #[test]
    fn as_string_truncates_large_arrays() {
        let values: Vec<RuntimeValue> = (0..150).map(|i| RuntimeValue::Number(i as f64)).collect();
        let array = RuntimeValue::array(values);
        let rendered = array.as_string();
        assert!(rendered.ends_with("[...]]"));
    }

    #[test]
    fn arrays_share_mutations_across_clones() {
        let array = RuntimeValue::array(vec![RuntimeValue::Number(1.0)]);
        let clone = array.clone();
        if let RuntimeValue::Array(shared) = &array {
            shared.borrow_mut().push(RuntimeValue::Number(2.0));
        }
        if let RuntimeValue::Array(shared) = &clone {
            assert_eq!(shared.borrow().len(), 2);
        } else {
            panic!("expected array");
        }
    }
}
