use proc_macro::TokenStream;
use quote::quote;
use syn::{DeriveInput, parse_macro_input};

pub fn derive_component(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);
    let struct_name = &ast.ident;

    // Uses ::ecs_core::component::Component, which works both inside and outside the
    // crate. Inside the crate this resolves via `extern crate self as ecs_core;` in lib.rs.
    TokenStream::from(quote! {
        impl ::ecs_core::component::Component for #struct_name {
        }
    })
}
