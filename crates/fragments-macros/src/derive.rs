//! `#[derive(Fragment)]` implementation.
//!
//! Generates the [`Fragment`] and `FragmentType` impls for a struct that embeds a
//! `FragmentState`. The state field is the one marked `#[fragment(state)]`,
//! or failing that the only field whose type is named `FragmentState`.
//!
//! The class name reported at runtime is the struct identifier, so
//! `TagCloudFragment` renders from `Fragment/TagCloud/`.
//!
//! [`Fragment`]: ../fragments/trait.Fragment.html

use proc_macro2::TokenStream;
use quote::quote;
use syn::{spanned::Spanned, Data, DeriveInput, Error, Field, Fields, Type};

fn is_marked_state(field: &Field) -> syn::Result<bool> {
    let mut marked = false;
    for attr in &field.attrs {
        if !attr.path().is_ident("fragment") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("state") {
                marked = true;
                Ok(())
            } else {
                Err(meta.error("unknown fragment attribute, expected `state`"))
            }
        })?;
    }
    Ok(marked)
}

fn is_state_type(ty: &Type) -> bool {
    if let Type::Path(type_path) = ty {
        if let Some(segment) = type_path.path.segments.last() {
            return segment.ident == "FragmentState";
        }
    }
    false
}

fn find_state_field(input: &DeriveInput) -> syn::Result<&syn::Ident> {
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            _ => {
                return Err(Error::new(
                    input.ident.span(),
                    "Fragment can only be derived for structs with named fields",
                ))
            }
        },
        _ => {
            return Err(Error::new(
                input.ident.span(),
                "Fragment can only be derived for structs",
            ))
        }
    };

    let mut marked = Vec::new();
    for field in fields {
        if is_marked_state(field)? {
            marked.push(field);
        }
    }
    let candidates: Vec<&Field> = if marked.is_empty() {
        fields.iter().filter(|f| is_state_type(&f.ty)).collect()
    } else {
        marked
    };

    match candidates.as_slice() {
        [field] => field
            .ident
            .as_ref()
            .ok_or_else(|| Error::new(field.span(), "state field must be named")),
        [] => Err(Error::new(
            input.ident.span(),
            "no FragmentState field found; add one or mark it with #[fragment(state)]",
        )),
        [_, second, ..] => Err(Error::new(
            second.span(),
            "more than one state field; mark the right one with #[fragment(state)]",
        )),
    }
}

/// Main implementation of #[derive(Fragment)]
pub fn fragment_derive_impl(input: DeriveInput) -> syn::Result<TokenStream> {
    let state = find_state_field(&input)?;
    let ident = &input.ident;
    let class_name = ident.to_string();
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::fragments::FragmentType for #ident #ty_generics #where_clause {
            const CLASS_NAME: &'static str = #class_name;
        }

        impl #impl_generics ::fragments::Fragment for #ident #ty_generics #where_clause {
            fn state(&self) -> &::fragments::FragmentState {
                &self.#state
            }

            fn state_mut(&mut self) -> &mut ::fragments::FragmentState {
                &mut self.#state
            }

            fn class_name(&self) -> &'static str {
                <Self as ::fragments::FragmentType>::CLASS_NAME
            }

            fn action_names(&self) -> &'static [&'static str] {
                <Self as ::fragments::FragmentActions>::ACTIONS
            }

            fn invoke(
                &mut self,
                action: &str,
                args: ::std::vec::Vec<::fragments::__private::serde_json::Value>,
            ) -> ::std::result::Result<(), ::fragments::ActionError> {
                <Self as ::fragments::FragmentActions>::invoke_action(self, action, args)
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
                self
            }
        }
    })
}
