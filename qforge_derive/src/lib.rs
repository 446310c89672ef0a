use proc_macro::TokenStream;

mod operator;

/// Generates arity, precedence and naming metadata for a unit-only operator enum.
///
/// Every variant must carry either `#[op(arity = N)]` or `#[op(min_arity = N)]`;
/// `#[op(precedence = N)]` is optional and defaults to `-1` (never parenthesize).
#[proc_macro_derive(Operator, attributes(op))]
pub fn operator_metadata(input: TokenStream) -> TokenStream {
    operator::operator_metadata_impl(input)
}
