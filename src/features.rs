//! Patient input schema and the fixed-order feature vector.
//!
//! Request bodies arrive as loosely typed JSON (the browser form posts every
//! value as a string), so every field is coerced through an explicit schema
//! table instead of ad-hoc lookups. A failed coercion is a [`FieldError`], never
//! a panic.

use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

use crate::error::{CardioError, Result};

/// Number of features the classifier consumes.
pub const FEATURE_COUNT: usize = 13;

/// Column order of the training frame. Artifacts were fit on exactly this order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "id",
    "age",
    "gender",
    "height",
    "weight",
    "ap_hi",
    "ap_lo",
    "cholesterol",
    "gluc",
    "smoke",
    "alco",
    "active",
    "bmi",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Float,
    Int,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Float => write!(f, "a number"),
            FieldKind::Int => write!(f, "an integer"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Required,
    /// Absent keys take this value. An explicit `null` is still an error.
    Defaulted(i64),
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub presence: Presence,
}

const fn required(name: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec {
        name,
        kind,
        presence: Presence::Required,
    }
}

/// Input fields in feature-vector order (everything except the derived `bmi`).
///
/// `id` is a row identifier that leaked into the training frame; it stays in
/// position 0 so existing artifacts keep lining up.
pub const PATIENT_SCHEMA: [FieldSpec; FEATURE_COUNT - 1] = [
    FieldSpec {
        name: "id",
        kind: FieldKind::Int,
        presence: Presence::Defaulted(0),
    },
    required("age", FieldKind::Float),
    required("gender", FieldKind::Int),
    required("height", FieldKind::Float),
    required("weight", FieldKind::Float),
    required("ap_hi", FieldKind::Float),
    required("ap_lo", FieldKind::Float),
    required("cholesterol", FieldKind::Int),
    required("gluc", FieldKind::Int),
    required("smoke", FieldKind::Int),
    required("alco", FieldKind::Int),
    required("active", FieldKind::Int),
];

/// Structured coercion failure for a single request.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FieldError {
    #[error("request body must be a JSON object, got {found}")]
    NotAnObject { found: String },

    #[error("missing required field '{field}'")]
    Missing { field: &'static str },

    #[error("field '{field}' must be {expected}, got {found}")]
    NotNumeric {
        field: &'static str,
        expected: FieldKind,
        found: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Coerced {
    Float(f64),
    Int(i64),
}

impl Coerced {
    fn as_f64(self) -> f64 {
        match self {
            Coerced::Float(v) => v,
            Coerced::Int(v) => v as f64,
        }
    }

    fn as_i64(self) -> i64 {
        match self {
            Coerced::Float(v) => v.trunc() as i64,
            Coerced::Int(v) => v,
        }
    }
}

/// A validated patient record, typed per [`PATIENT_SCHEMA`].
#[derive(Debug, Clone, PartialEq)]
pub struct PatientRecord {
    pub id: i64,
    pub age: f64,
    pub gender: i64,
    pub height: f64,
    pub weight: f64,
    pub ap_hi: f64,
    pub ap_lo: f64,
    pub cholesterol: i64,
    pub gluc: i64,
    pub smoke: i64,
    pub alco: i64,
    pub active: i64,
}

impl PatientRecord {
    /// Coerce a decoded JSON body into a typed record.
    pub fn from_json(body: &Value) -> std::result::Result<Self, FieldError> {
        let obj = body.as_object().ok_or_else(|| FieldError::NotAnObject {
            found: describe(body),
        })?;

        let mut values = [Coerced::Int(0); FEATURE_COUNT - 1];
        for (slot, spec) in values.iter_mut().zip(PATIENT_SCHEMA.iter()) {
            *slot = coerce_field(obj, spec)?;
        }

        let [id, age, gender, height, weight, ap_hi, ap_lo, cholesterol, gluc, smoke, alco, active] =
            values;

        Ok(Self {
            id: id.as_i64(),
            age: age.as_f64(),
            gender: gender.as_i64(),
            height: height.as_f64(),
            weight: weight.as_f64(),
            ap_hi: ap_hi.as_f64(),
            ap_lo: ap_lo.as_f64(),
            cholesterol: cholesterol.as_i64(),
            gluc: gluc.as_i64(),
            smoke: smoke.as_i64(),
            alco: alco.as_i64(),
            active: active.as_i64(),
        })
    }

    /// Body mass index from centimetres and kilograms.
    ///
    /// No guard on height: zero yields a non-finite value, which
    /// [`FeatureVector::assemble`] rejects.
    pub fn bmi(&self) -> f64 {
        let metres = self.height / 100.0;
        self.weight / (metres * metres)
    }
}

fn coerce_field(obj: &Map<String, Value>, spec: &FieldSpec) -> std::result::Result<Coerced, FieldError> {
    let Some(raw) = obj.get(spec.name) else {
        return match spec.presence {
            Presence::Required => Err(FieldError::Missing { field: spec.name }),
            Presence::Defaulted(default) => Ok(Coerced::Int(default)),
        };
    };

    let coerced = match spec.kind {
        FieldKind::Float => coerce_float(raw).map(Coerced::Float),
        FieldKind::Int => coerce_int(raw).map(Coerced::Int),
    };

    coerced.ok_or_else(|| FieldError::NotNumeric {
        field: spec.name,
        expected: spec.kind,
        found: describe(raw),
    })
}

fn coerce_float(raw: &Value) -> Option<f64> {
    match raw {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Truncated floats must land in `[-2^63, 2^63)`; anything else would saturate.
const I64_LOWER: f64 = -9_223_372_036_854_775_808.0;
const I64_UPPER: f64 = 9_223_372_036_854_775_808.0;

fn coerce_int(raw: &Value) -> Option<i64> {
    match raw {
        Value::Number(n) if n.is_u64() || n.is_i64() => n.as_i64(),
        Value::Number(n) => n
            .as_f64()
            .map(f64::trunc)
            .filter(|t| (I64_LOWER..I64_UPPER).contains(t))
            .map(|t| t as i64),
        Value::Bool(b) => Some(i64::from(*b)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Short rendering of a JSON value for error messages.
fn describe(value: &Value) -> String {
    const MAX: usize = 32;
    match value {
        Value::Null => "null".to_string(),
        Value::Array(_) => "an array".to_string(),
        Value::Object(_) => "an object".to_string(),
        other => {
            let text = other.to_string();
            if text.chars().count() > MAX {
                let cut: String = text.chars().take(MAX).collect();
                format!("{cut}...")
            } else {
                text
            }
        }
    }
}

/// Fixed-order numeric input for one prediction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    /// Build the vector from a record and its derived BMI.
    ///
    /// Every entry must be finite; tree and linear models both reject NaN/inf input.
    pub fn assemble(record: &PatientRecord, bmi: f64) -> Result<Self> {
        let values = [
            record.id as f64,
            record.age,
            record.gender as f64,
            record.height,
            record.weight,
            record.ap_hi,
            record.ap_lo,
            record.cholesterol as f64,
            record.gluc as f64,
            record.smoke as f64,
            record.alco as f64,
            record.active as f64,
            bmi,
        ];
        Self::from_values(values)
    }

    pub fn from_values(values: [f64; FEATURE_COUNT]) -> Result<Self> {
        if let Some((idx, v)) = values.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(CardioError::Validation(format!(
                "feature '{}' is not finite: {}",
                FEATURE_NAMES[idx], v
            )));
        }
        Ok(Self(values))
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        FEATURE_NAMES
            .iter()
            .position(|n| *n == name)
            .map(|idx| self.0[idx])
    }

    pub fn bmi(&self) -> f64 {
        self.0[FEATURE_COUNT - 1]
    }
}
