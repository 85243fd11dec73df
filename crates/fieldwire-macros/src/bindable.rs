//! Code generation for `#[derive(Bindable)]`.

use crate::parse::{is_option, not_a_struct, ContainerAttrs, FieldAttrs};
use proc_macro2::{Literal, TokenStream};
use quote::quote;
use syn::{spanned::Spanned, Data, DeriveInput, Fields, Ident, Type};

/// One field of the deriving struct.
struct BindField {
    ident: Ident,
    ty: Type,
    attrs: FieldAttrs,
}

/// Expands the derive.
pub fn expand_bindable(input: &DeriveInput) -> syn::Result<TokenStream> {
    let container = ContainerAttrs::from_attrs(&input.attrs)?;
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => named
                .named
                .iter()
                .map(|field| {
                    Ok(BindField {
                        ident: field.ident.clone().ok_or_else(|| not_a_struct(field.span()))?,
                        ty: field.ty.clone(),
                        attrs: FieldAttrs::from_attrs(&field.attrs)?,
                    })
                })
                .collect::<syn::Result<Vec<_>>>()?,
            Fields::Unit => Vec::new(),
            Fields::Unnamed(_) => return Err(not_a_struct(input.ident.span())),
        },
        _ => return Err(not_a_struct(input.ident.span())),
    };

    let krate = &container.krate;
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let count = fields.len();

    let descriptors = fields.iter().map(|field| descriptor(krate, field));

    let assign_arms = fields.iter().enumerate().map(|(index, field)| {
        let index = Literal::usize_unsuffixed(index);
        let ident = &field.ident;
        let ty = &field.ty;
        quote! { #index => self.#ident = *value.downcast::<#ty>()?, }
    });

    let shared_arms = fields
        .iter()
        .enumerate()
        .filter(|(_, field)| field.attrs.is_shared())
        .map(|(index, field)| {
            let index = Literal::usize_unsuffixed(index);
            let ident = &field.ident;
            let ty = &field.ty;
            quote! {
                #index => match value.downcast_ref::<#ty>() {
                    ::std::option::Option::Some(value) => {
                        self.#ident = ::std::clone::Clone::clone(value);
                        true
                    }
                    ::std::option::Option::None => false,
                },
            }
        });

    let field_arms = fields.iter().enumerate().map(|(index, field)| {
        let index = Literal::usize_unsuffixed(index);
        let ident = &field.ident;
        quote! { #index => ::std::option::Option::Some(&self.#ident), }
    });

    let share_arms = fields
        .iter()
        .enumerate()
        .filter(|(_, field)| field.attrs.autowire.is_some())
        .map(|(index, field)| {
            let index = Literal::usize_unsuffixed(index);
            let ident = &field.ident;
            let share = quote! {
                ::std::sync::Arc::new(::std::clone::Clone::clone(&self.#ident)) as #krate::SharedValue
            };
            if is_option(&field.ty) {
                quote! { #index => self.#ident.as_ref().map(|_| #share), }
            } else {
                quote! { #index => ::std::option::Option::Some(#share), }
            }
        });

    Ok(quote! {
        #[automatically_derived]
        #[allow(unreachable_code, clippy::match_single_binding)]
        impl #impl_generics #krate::Bindable for #name #ty_generics #where_clause {
            fn descriptors() -> ::std::vec::Vec<#krate::FieldDescriptor> {
                ::std::vec![#(#descriptors),*]
            }

            fn field_count() -> usize {
                #count
            }

            fn assign(
                &mut self,
                index: usize,
                value: ::std::boxed::Box<dyn ::std::any::Any + ::std::marker::Send>,
            ) -> ::std::result::Result<(), ::std::boxed::Box<dyn ::std::any::Any + ::std::marker::Send>> {
                match index {
                    #(#assign_arms)*
                    _ => return ::std::result::Result::Err(value),
                }
                ::std::result::Result::Ok(())
            }

            fn assign_shared(
                &mut self,
                index: usize,
                value: &(dyn ::std::any::Any + ::std::marker::Send + ::std::marker::Sync),
            ) -> bool {
                match index {
                    #(#shared_arms)*
                    _ => false,
                }
            }

            fn field(&self, index: usize) -> ::std::option::Option<&dyn ::std::any::Any> {
                match index {
                    #(#field_arms)*
                    _ => ::std::option::Option::None,
                }
            }

            fn share_field(&self, index: usize) -> ::std::option::Option<#krate::SharedValue> {
                match index {
                    #(#share_arms)*
                    _ => ::std::option::Option::None,
                }
            }
        }
    })
}

/// `FieldDescriptor::new::<T>("name")` followed by one call per tag.
fn descriptor(krate: &syn::Path, field: &BindField) -> TokenStream {
    let ty = &field.ty;
    let name = field.ident.to_string();
    let name = name.strip_prefix("r#").unwrap_or(&name);
    let attrs = &field.attrs;

    let mut tokens = quote! { #krate::FieldDescriptor::new::<#ty>(#name) };
    for (method, value) in [
        ("param", &attrs.param),
        ("checker", &attrs.checker),
        ("default", &attrs.default),
        ("resolver", &attrs.resolver),
        ("autowire", &attrs.autowire),
    ] {
        if let Some(value) = value {
            let method = Ident::new(method, value.span());
            tokens = quote! { #tokens.#method(#value) };
        }
    }
    if attrs.is_recursive() {
        tokens = quote! { #tokens.nested(#krate::BindableVTable::of::<#ty>()) };
    }
    if attrs.wants_json() {
        tokens = quote! { #tokens.json_decoder(#krate::json_decoder::<#ty>()) };
    }
    tokens
}
