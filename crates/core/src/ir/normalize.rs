//! Normalize a registry entry into a [`CompiledOperation`].
//!
//! Attributes are classified one at a time, then stable-partitioned so that
//! required attributes precede defaulted ones. Inputs keep declared order.

use std::collections::HashMap;

use super::api::{CompiledInput, CompiledOperation, OutputArity};
use super::attr::compile_attribute;
use super::docs::Documentation;
use super::naming::{function_name, input_var_name};
use crate::error::{GenerateError, GenerateResult};
use crate::registry::{OperationDefinition, OutputArg};

/// Compile one operation with its segmented documentation.
///
/// Any attribute failure is wrapped in [`GenerateError::Compile`] naming the
/// operation.
pub fn compile_operation(
    op: &OperationDefinition,
    doc: Documentation,
) -> GenerateResult<CompiledOperation> {
    let inputs: Vec<CompiledInput> = op
        .input_args
        .iter()
        .map(|arg| CompiledInput {
            name: arg.name.clone(),
            var_name: input_var_name(&arg.name),
            variadic: arg.is_variadic(),
        })
        .collect();

    // first input declaring a count attribute owns it
    let mut count_refs: HashMap<String, String> = HashMap::new();
    for (arg, input) in op.input_args.iter().zip(&inputs) {
        if let Some(attr) = &arg.number_attr {
            count_refs
                .entry(attr.clone())
                .or_insert_with(|| input.var_name.clone());
        }
    }

    let mut attrs = Vec::with_capacity(op.attrs.len());
    for attr in &op.attrs {
        let compiled =
            compile_attribute(&op.name, attr, &count_refs).map_err(|e| GenerateError::Compile {
                op: op.name.clone(),
                source: Box::new(e),
            })?;
        if let Some(compiled) = compiled {
            attrs.push(compiled);
        }
    }
    let (required, defaulted): (Vec<_>, Vec<_>) = attrs.into_iter().partition(|a| !a.optional);
    let attrs = required.into_iter().chain(defaulted).collect();

    Ok(CompiledOperation {
        op_name: op.name.clone(),
        fn_name: function_name(&op.name),
        inputs,
        attrs,
        doc,
        arity: output_arity(&op.output_args),
    })
}

fn output_arity(outputs: &[OutputArg]) -> OutputArity {
    match outputs {
        [] => OutputArity::None,
        [single] if !single.is_variadic() => OutputArity::Single,
        _ => OutputArity::Many,
    }
}
