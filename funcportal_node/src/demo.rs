// SPDX-FileCopyrightText: © 2023 Technical University of Munich, Chair of Connected Mobility
// SPDX-License-Identifier: MIT

//! Functions served by `funcportal_node_d` out of the box.

use funcportal_api::{FunctionAdapter, Signature};

/// Integers stay integers, anything else is computed as a float.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum Numeric {
    Integer(i64),
    Float(f64),
}

/// `multiply(x, y)`, on numbers.
pub fn multiply() -> anyhow::Result<FunctionAdapter> {
    FunctionAdapter::new("multiply", Signature::new().param("x").param("y"), |args| {
        let x = args.get::<serde_json::Number>("x")?;
        let y = args.get::<serde_json::Number>("y")?;
        match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => match x.checked_mul(y) {
                Some(product) => Ok(Numeric::Integer(product)),
                None => anyhow::bail!("integer overflow in {} * {}", x, y),
            },
            _ => Ok(Numeric::Float(as_f64(&x) * as_f64(&y))),
        }
    })
}

/// `exponent(base, power=2)`, on numbers.
pub fn exponent() -> anyhow::Result<FunctionAdapter> {
    FunctionAdapter::new("exponent", Signature::new().param("base").param_with_default("power", 2), |args| {
        let base = args.get::<serde_json::Number>("base")?;
        let power = args.get::<serde_json::Number>("power")?;
        match (base.as_i64(), power.as_u64().and_then(|p| u32::try_from(p).ok())) {
            (Some(base), Some(power)) => match base.checked_pow(power) {
                Some(value) => Ok(Numeric::Integer(value)),
                None => anyhow::bail!("integer overflow in {} ** {}", base, power),
            },
            _ => Ok(Numeric::Float(as_f64(&base).powf(as_f64(&power)))),
        }
    })
}

fn as_f64(number: &serde_json::Number) -> f64 {
    number.as_f64().unwrap_or(f64::NAN)
}
