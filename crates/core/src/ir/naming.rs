//! Identifier handling for the generated Lua module.
//!
//! Operation names are CamelCase with embedded acronyms (`Conv2D`,
//! `BatchToSpaceND`, `CTCLoss`). They are mapped to snake_case by a fixed,
//! ordered pipeline tuned to the engine's operation set.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Lua reserved words that cannot be used as identifiers.
pub static LUA_RESERVED_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "and", "break", "do", "else", "elseif", "end", "false", "for", "function", "goto", "if",
        "in", "local", "nil", "not", "or", "repeat", "return", "then", "true", "until", "while",
    ]
    .into_iter()
    .collect()
});

/// Acronym fixups applied before the generic splitter, in this order.
///
/// Later entries overlap earlier ones (`IFFT2D` before `IFFT` before `FFT`),
/// so the order is significant.
const ACRONYM_FIXUPS: [(&str, &str); 17] = [
    ("Conv2D", "Conv2d"),
    ("Conv3D", "Conv3d"),
    ("Dilation2D", "Dilation2d"),
    ("TPU", "Tpu"),
    ("TopK", "Topk"),
    ("LMDB", "Lmdb"),
    ("LRN", "Lrn"),
    ("Pool3D", "Pool3d"),
    ("IFFT2D", "Ifft2d"),
    ("IFFT3D", "Ifft3d"),
    ("IFFT", "Ifft"),
    ("FFT2D", "Fft2d"),
    ("FFT3D", "Fft3d"),
    ("FFT", "Fft"),
    ("LSTM", "Lstm"),
    ("BatchToSpaceND", "BatchToSpaceNd"),
    ("ApplyAdagradDA", "ApplyAdagradDa"),
];

// Patterns are literals; construction cannot fail.
#[allow(clippy::expect_used)]
static TRAILING_ACRONYM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Z])([A-Z]+)$").expect("valid regex"));
#[allow(clippy::expect_used)]
static LEADING_ACRONYM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Z])([A-Z]+)([A-Z][a-z0-9])").expect("valid regex"));
#[allow(clippy::expect_used)]
static INNER_ACRONYM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Z])([A-Z]+)([A-Z][a-z0-9])").expect("valid regex"));

/// Append `_` to identifiers that collide with a Lua reserved word.
pub fn escape_reserved(name: &str) -> String {
    if LUA_RESERVED_WORDS.contains(name) {
        format!("{name}_")
    } else {
        name.to_string()
    }
}

/// Convert an operation name to its snake_case Lua function name.
///
/// The result is not yet checked against reserved words; see
/// [`function_name`].
pub fn normalize_op_name(name: &str) -> String {
    if name == name.to_uppercase() {
        return name.to_lowercase();
    }

    let mut name = name.to_string();
    for (from, to) in ACRONYM_FIXUPS {
        name = name.replace(from, to);
    }

    let name = TRAILING_ACRONYM.replace_all(&name, |c: &Captures<'_>| {
        format!("_{}{}", c[1].to_lowercase(), c[2].to_lowercase())
    });
    let name = LEADING_ACRONYM.replace_all(&name, |c: &Captures<'_>| {
        format!("{}{}{}", c[1].to_lowercase(), c[2].to_lowercase(), &c[3])
    });
    let name = INNER_ACRONYM.replace_all(&name, |c: &Captures<'_>| {
        format!("_{}{}{}", c[1].to_lowercase(), c[2].to_lowercase(), &c[3])
    });

    split_camel_case(&name)
}

/// Insert `_` before every upper-case letter except at the start, then lower-case.
fn split_camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if i > 0 && c.is_ascii_uppercase() {
            out.push('_');
        }
        out.push(c);
    }
    out.to_lowercase()
}

/// Exported function name for an operation.
pub fn function_name(op_name: &str) -> String {
    escape_reserved(&normalize_op_name(op_name))
}

/// Parameter name for an input argument.
///
/// `tensor` would shadow the wrapper's own type name in generated code.
pub fn input_var_name(name: &str) -> String {
    if name == "tensor" {
        return "input_tensor".to_string();
    }
    escape_reserved(name)
}

/// Parameter name for an attribute.
pub fn attr_var_name(name: &str) -> String {
    if name == "template" {
        return "template_arg".to_string();
    }
    escape_reserved(name)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_acronym_table() {
        assert_eq!(normalize_op_name("Conv2D"), "conv2d");
        assert_eq!(normalize_op_name("Conv3DBackpropInputV2"), "conv3d_backprop_input_v2");
        assert_eq!(normalize_op_name("TopK"), "topk");
        assert_eq!(normalize_op_name("TopKV2"), "topk_v2");
        assert_eq!(normalize_op_name("BatchToSpaceND"), "batch_to_space_nd");
        assert_eq!(normalize_op_name("ApplyAdagradDA"), "apply_adagrad_da");
        assert_eq!(normalize_op_name("IRFFT2D"), "irfft2d");
        assert_eq!(normalize_op_name("BatchIFFT3D"), "batch_ifft3d");
        assert_eq!(normalize_op_name("LRNGrad"), "lrn_grad");
        assert_eq!(normalize_op_name("MaxPool3DGrad"), "max_pool3d_grad");
        assert_eq!(normalize_op_name("BlockLSTM"), "block_lstm");
        assert_eq!(normalize_op_name("TPUEmbeddingActivations"), "tpu_embedding_activations");
    }

    #[test]
    fn test_all_upper_is_lowered() {
        assert_eq!(normalize_op_name("IFFT2D"), "ifft2d");
        assert_eq!(normalize_op_name("LMDB"), "lmdb");
        assert_eq!(normalize_op_name("FFT"), "fft");
        assert_eq!(normalize_op_name("A"), "a");
    }

    #[test]
    fn test_generic_split() {
        assert_eq!(normalize_op_name("AddV2"), "add_v2");
        assert_eq!(normalize_op_name("ConcatV2"), "concat_v2");
        assert_eq!(normalize_op_name("MatMul"), "mat_mul");
        assert_eq!(normalize_op_name("Abs"), "abs");
    }

    #[test]
    fn test_acronym_passes() {
        // trailing run
        assert_eq!(normalize_op_name("DecodeCSV"), "decode_csv");
        // leading run followed by a word
        assert_eq!(normalize_op_name("CTCLoss"), "ctc_loss");
        // inner run followed by a word
        assert_eq!(normalize_op_name("DecodeJSONExample"), "decode_json_example");
        assert_eq!(normalize_op_name("RGBToHSV"), "rgb_to_hsv");
    }

    #[test]
    fn test_reserved_words() {
        assert_eq!(escape_reserved("end"), "end_");
        assert_eq!(escape_reserved("goto"), "goto_");
        assert_eq!(escape_reserved("x"), "x");
        assert_eq!(function_name("While"), "while_");
        assert_eq!(function_name("AddN"), "add_n");
    }

    #[test]
    fn test_var_names() {
        assert_eq!(input_var_name("tensor"), "input_tensor");
        assert_eq!(input_var_name("tensor_names"), "tensor_names");
        assert_eq!(input_var_name("and"), "and_");
        assert_eq!(attr_var_name("template"), "template_arg");
        assert_eq!(attr_var_name("repeat"), "repeat_");
    }
}
