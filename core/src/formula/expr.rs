use crate::prelude::{CalibrationError, CalibrationResult};
use evalexpr::{build_operator_tree, ContextWithMutableVariables, HashMapContext, Node, Value};

/// Variable the calibration formulas are expressed in (jet pT).
const PT_VARIABLE: &str = "x";

/// A compiled scale-factor formula in ROOT TF1 notation.
#[derive(Debug, Clone)]
pub struct Formula {
    source: String,
    tree: Node,
}

impl Formula {
    pub fn compile(source: &str) -> CalibrationResult<Self> {
        let invalid = |reason: String| CalibrationError::InvalidFormula {
            formula: source.to_string(),
            reason,
        };
        let normalized = normalize(source).map_err(invalid)?;
        let tree = build_operator_tree(&normalized).map_err(|err| invalid(err.to_string()))?;
        Ok(Self {
            source: source.to_string(),
            tree,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn eval(&self, x: f64) -> CalibrationResult<f64> {
        let invalid = |reason: String| CalibrationError::InvalidFormula {
            formula: self.source.clone(),
            reason,
        };
        let mut context = HashMapContext::new();
        context
            .set_value(PT_VARIABLE.into(), Value::Float(x))
            .map_err(|err| invalid(err.to_string()))?;
        self.tree
            .eval_number_with_context(&context)
            .map_err(|err| invalid(err.to_string()))
    }
}

/// Rewrites TF1 syntax into the evaluator's dialect.
///
/// Every numeric literal is re-emitted as a plain decimal float so that
/// `1/2` stays a floating-point division, and TF1 function names are mapped
/// onto the evaluator's builtins.
fn normalize(source: &str) -> Result<String, String> {
    let chars: Vec<char> = source.chars().collect();
    let mut out = String::with_capacity(source.len() + 16);
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let starts_number = c.is_ascii_digit()
            || (c == '.' && chars.get(i + 1).is_some_and(|next| next.is_ascii_digit()));

        if starts_number {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                i += 1;
            }
            if i < chars.len() && matches!(chars[i], 'e' | 'E') {
                let mut j = i + 1;
                if j < chars.len() && matches!(chars[j], '+' | '-') {
                    j += 1;
                }
                if j < chars.len() && chars[j].is_ascii_digit() {
                    while j < chars.len() && chars[j].is_ascii_digit() {
                        j += 1;
                    }
                    i = j;
                }
            }
            let literal: String = chars[start..i].iter().collect();
            let value: f64 = literal
                .parse()
                .map_err(|_| format!("malformed number `{}`", literal))?;
            out.push_str(&float_literal(value));
        } else if c.is_ascii_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len()
                && (chars[i].is_ascii_alphanumeric() || chars[i] == '_' || chars[i] == ':')
            {
                i += 1;
            }
            let ident: String = chars[start..i].iter().collect();
            out.push_str(function_alias(&ident).unwrap_or(&ident));
        } else {
            out.push(c);
            i += 1;
        }
    }

    Ok(out)
}

fn float_literal(value: f64) -> String {
    let mut text = format!("{}", value);
    if !text.contains('.') {
        text.push_str(".0");
    }
    text
}

fn function_alias(ident: &str) -> Option<&'static str> {
    let alias = match ident {
        "log" | "TMath::Log" => "math::ln",
        "log10" | "TMath::Log10" => "math::log10",
        "exp" | "TMath::Exp" => "math::exp",
        "sqrt" | "TMath::Sqrt" => "math::sqrt",
        "pow" | "TMath::Power" => "math::pow",
        "abs" | "fabs" | "TMath::Abs" => "math::abs",
        "TMath::Max" => "max",
        "TMath::Min" => "min",
        _ => return None,
    };
    Some(alias)
}
