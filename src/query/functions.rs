//! Custom JMESPath functions

use jmespath::functions::Function;
use jmespath::{Context, ErrorReason, JmespathError, Rcvar, RuntimeError, ToJmespath, Variable};

/// `sum` that also accepts an array of arrays of numbers.
///
/// Generated queries often project a list of amounts per account before
/// asking for a total (`sum(bankAccounts[].transactions[].amount)` vs
/// `sum(bankAccounts[].transactions[*].amount)`). Nested arrays are
/// flattened one level, then every element must be a number.
pub struct FlatSum;

impl Function for FlatSum {
    fn evaluate(&self, args: &[Rcvar], ctx: &mut Context<'_>) -> Result<Rcvar, JmespathError> {
        if args.len() != 1 {
            let reason = if args.is_empty() {
                RuntimeError::NotEnoughArguments {
                    expected: 1,
                    actual: 0,
                }
            } else {
                RuntimeError::TooManyArguments {
                    expected: 1,
                    actual: args.len(),
                }
            };
            return Err(runtime_error(ctx, reason));
        }

        let items = args[0].as_array().ok_or_else(|| {
            runtime_error(
                ctx,
                RuntimeError::InvalidType {
                    expected: "array[number] or array[array[number]]".to_string(),
                    actual: type_name(&args[0]).to_string(),
                    position: 0,
                },
            )
        })?;

        let mut total = 0.0;
        for item in items {
            match item.as_array() {
                Some(inner) => {
                    for nested in inner {
                        total += number(nested, ctx)?;
                    }
                }
                None => total += number(item, ctx)?,
            }
        }

        if !total.is_finite() {
            return Err(runtime_error(
                ctx,
                RuntimeError::InvalidType {
                    expected: "finite sum".to_string(),
                    actual: "overflow".to_string(),
                    position: 0,
                },
            ));
        }

        serde_json::json!(total).to_jmespath()
    }
}

fn number(value: &Rcvar, ctx: &Context<'_>) -> Result<f64, JmespathError> {
    value.as_number().ok_or_else(|| {
        runtime_error(
            ctx,
            RuntimeError::InvalidType {
                expected: "number".to_string(),
                actual: type_name(value).to_string(),
                position: 0,
            },
        )
    })
}

fn runtime_error(ctx: &Context<'_>, reason: RuntimeError) -> JmespathError {
    JmespathError::new(ctx.expression, ctx.offset, ErrorReason::Runtime(reason))
}

fn type_name(value: &Variable) -> &'static str {
    if value.is_array() {
        "array"
    } else if value.is_object() {
        "object"
    } else if value.is_string() {
        "string"
    } else if value.is_number() {
        "number"
    } else if value.is_boolean() {
        "boolean"
    } else if value.is_null() {
        "null"
    } else {
        "expref"
    }
}
