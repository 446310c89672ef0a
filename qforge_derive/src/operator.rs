use darling::{FromDeriveInput, FromVariant, ast};
use heck::ToShoutySnakeCase;
use proc_macro::TokenStream;
use quote::quote;
use syn::{DeriveInput, parse_macro_input};

#[derive(Debug, FromDeriveInput)]
#[darling(supports(enum_unit))]
struct OperatorDeriveInput {
    ident: syn::Ident,
    data: ast::Data<OperatorVariant, ()>,
}

#[derive(Debug, FromVariant)]
#[darling(attributes(op))]
struct OperatorVariant {
    ident: syn::Ident,
    #[darling(default)]
    arity: Option<usize>,
    #[darling(default)]
    min_arity: Option<usize>,
    #[darling(default)]
    precedence: Option<i32>,
}

pub fn operator_metadata_impl(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let enum_info = match OperatorDeriveInput::from_derive_input(&input) {
        Ok(v) => v,
        Err(e) => return e.write_errors().into(),
    };

    let enum_name = &enum_info.ident;
    let variants = match enum_info.data.take_enum() {
        Some(variants) => variants,
        None => {
            return syn::Error::new_spanned(&input.ident, "Operator can only be derived for enums")
                .to_compile_error()
                .into();
        }
    };

    let mut errors = darling::Error::accumulator();
    let mut all = Vec::with_capacity(variants.len());
    let mut arities = Vec::with_capacity(variants.len());
    let mut precedences = Vec::with_capacity(variants.len());
    let mut names = Vec::with_capacity(variants.len());

    for var in &variants {
        let var_name = &var.ident;
        let arity = match (var.arity, var.min_arity) {
            (Some(n), None) => quote! { crate::operator::Arity::Exact(#n) },
            (None, Some(n)) => quote! { crate::operator::Arity::AtLeast(#n) },
            _ => {
                errors.push(
                    darling::Error::custom("expected exactly one of `arity` or `min_arity`")
                        .with_span(var_name),
                );
                continue;
            }
        };
        let precedence = var.precedence.unwrap_or(-1);
        let name = var_name.to_string().to_shouty_snake_case();

        all.push(quote! { #enum_name::#var_name });
        arities.push(quote! { #enum_name::#var_name => #arity });
        precedences.push(quote! { #enum_name::#var_name => #precedence });
        names.push(quote! { #enum_name::#var_name => #name });
    }

    if let Err(e) = errors.finish() {
        return e.write_errors().into();
    }

    quote! {
        impl #enum_name {
            pub const ALL: &'static [#enum_name] = &[#(#all),*];

            pub const fn arity(self) -> crate::operator::Arity {
                match self {
                    #(#arities,)*
                }
            }

            pub const fn precedence(self) -> i32 {
                match self {
                    #(#precedences,)*
                }
            }

            pub const fn name(self) -> &'static str {
                match self {
                    #(#names,)*
                }
            }
        }
    }
    .into()
}
