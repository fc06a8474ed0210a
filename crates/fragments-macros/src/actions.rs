//! `#[actions]` attribute macro for fragment action tables.
//!
//! Turns the public methods of an impl block into a checked dispatch table:
//! each action is looked up by name and called with positional arguments
//! decoded from JSON values.
//!
//! # Example
//!
//! ```rust,ignore
//! use fragments::actions;
//!
//! #[actions]
//! impl TagCloudFragment {
//!     pub fn display(&mut self) -> anyhow::Result<()> { ... }
//!
//!     pub fn small_list(&mut self, limit: usize, sort: Option<String>) -> anyhow::Result<()> { ... }
//!
//!     #[action(skip)]
//!     pub fn helper(&self) -> usize { ... }
//! }
//!
//! // Generates:
//! // impl ::fragments::FragmentActions for TagCloudFragment {
//! //     const ACTIONS: &'static [&'static str] = &["display", "small_list"];
//! //     fn invoke_action(&mut self, action, args) -> Result<(), ActionError> {
//! //         match action {
//! //             "small_list" => {
//! //                 let __arg0: usize = __args.required(0usize)?;
//! //                 let __arg1: Option<String> = __args.optional(1usize)?;
//! //                 ...
//! //             }
//! //         }
//! //     }
//! // }
//! ```
//!
//! # Method Annotations
//!
//! | Annotation | Effect |
//! |------------|--------|
//! | (none) | `pub fn` with a `self` receiver becomes an action named after the method |
//! | `#[action(name = "x")]` | Registers the action as `x` |
//! | `#[action(skip)]` | Keeps the method out of the table |
//!
//! # Parameter Handling
//!
//! | Parameter Type | Missing Position | Extraction |
//! |----------------|------------------|------------|
//! | `T` | `ActionError::MissingArgument` | `__args.required::<T>(i)` |
//! | `Option<T>` | `None` | `__args.optional::<T>(i)` |
//!
//! # Return Type Handling
//!
//! | Return Type | Generated Call |
//! |-------------|----------------|
//! | `()` | call, then `Ok(())` |
//! | `Result<_, E>` | errors converted into `anyhow::Error` as `ActionError::Failed` |

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{
    parse::{Parse, ParseStream},
    punctuated::Punctuated,
    spanned::Spanned,
    Error, Expr, FnArg, ImplItem, ImplItemFn, ItemImpl, Meta, ReturnType, Token, Type,
    Visibility,
};

/// Arguments of `#[action(...)]`
#[derive(Default)]
struct ActionAttrs {
    name: Option<String>,
    skip: bool,
}

impl Parse for ActionAttrs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut attrs = ActionAttrs::default();

        let content: Punctuated<Meta, Token![,]> = Punctuated::parse_terminated(input)?;

        for meta in content {
            match meta {
                Meta::NameValue(nv) if nv.path.is_ident("name") => {
                    if let Expr::Lit(expr_lit) = &nv.value {
                        if let syn::Lit::Str(lit_str) = &expr_lit.lit {
                            attrs.name = Some(lit_str.value());
                            continue;
                        }
                    }
                    return Err(Error::new(nv.value.span(), "expected string literal"));
                }
                Meta::Path(p) if p.is_ident("skip") => {
                    attrs.skip = true;
                }
                other => {
                    return Err(Error::new(
                        other.span(),
                        "unknown attribute, expected one of: name, skip",
                    ));
                }
            }
        }

        Ok(attrs)
    }
}

fn parse_action_attrs(method: &ImplItemFn) -> syn::Result<ActionAttrs> {
    for attr in &method.attrs {
        if attr.path().is_ident("action") {
            return attr.parse_args::<ActionAttrs>();
        }
    }
    Ok(ActionAttrs::default())
}

/// Check if a type is Option<T>
fn is_option_type(ty: &Type) -> bool {
    if let Type::Path(type_path) = ty {
        if let Some(segment) = type_path.path.segments.last() {
            return segment.ident == "Option";
        }
    }
    false
}

/// Extract the inner type from Option<T>
fn extract_inner_type(ty: &Type) -> Option<&Type> {
    if let Type::Path(type_path) = ty {
        if let Some(segment) = type_path.path.segments.last() {
            if let syn::PathArguments::AngleBracketed(args) = &segment.arguments {
                if let Some(syn::GenericArgument::Type(inner)) = args.args.first() {
                    return Some(inner);
                }
            }
        }
    }
    None
}

/// One method that made it into the table
struct ActionInfo {
    name: String,
    ident: syn::Ident,
    params: Vec<Type>,
    returns_unit: bool,
}

fn collect_action(method: &ImplItemFn, attrs: ActionAttrs) -> syn::Result<Option<ActionInfo>> {
    if attrs.skip || !matches!(method.vis, Visibility::Public(_)) {
        return Ok(None);
    }

    let mut has_receiver = false;
    let mut params = Vec::new();

    for input in &method.sig.inputs {
        match input {
            FnArg::Receiver(receiver) => {
                if receiver.reference.is_none() {
                    return Err(Error::new(
                        receiver.span(),
                        "actions must take `&self` or `&mut self`",
                    ));
                }
                has_receiver = true;
            }
            FnArg::Typed(pat_type) => {
                if matches!(*pat_type.ty, Type::Reference(_)) {
                    return Err(Error::new(
                        pat_type.ty.span(),
                        "action parameters must be owned types",
                    ));
                }
                params.push((*pat_type.ty).clone());
            }
        }
    }

    // Associated functions are constructors and utilities, not actions.
    if !has_receiver {
        return Ok(None);
    }

    if !method.sig.generics.params.is_empty() {
        return Err(Error::new(
            method.sig.generics.span(),
            "actions cannot be generic",
        ));
    }

    let name = attrs
        .name
        .unwrap_or_else(|| method.sig.ident.to_string());

    Ok(Some(ActionInfo {
        name,
        ident: method.sig.ident.clone(),
        params,
        returns_unit: matches!(method.sig.output, ReturnType::Default),
    }))
}

/// Generate the match arm for one action
fn generate_arm(action: &ActionInfo) -> TokenStream {
    let name = &action.name;
    let ident = &action.ident;

    let mut extractions = Vec::new();
    let mut call_args = Vec::new();

    for (i, ty) in action.params.iter().enumerate() {
        let var = format_ident!("__arg{}", i);
        let extraction = if is_option_type(ty) {
            let inner = extract_inner_type(ty).unwrap_or(ty);
            quote! {
                let #var: #ty = __args.optional::<#inner>(#i)?;
            }
        } else {
            quote! {
                let #var: #ty = __args.required::<#ty>(#i)?;
            }
        };
        extractions.push(extraction);
        call_args.push(var);
    }

    let call = if action.returns_unit {
        quote! {
            self.#ident(#(#call_args),*);
            ::std::result::Result::Ok(())
        }
    } else {
        quote! {
            self.#ident(#(#call_args),*)
                .map(|_| ())
                .map_err(|e| ::fragments::ActionError::Failed(
                    ::fragments::__private::anyhow::Error::from(e),
                ))
        }
    };

    quote! {
        #name => {
            #(#extractions)*
            #call
        }
    }
}

/// Main implementation of the #[actions] macro
pub fn actions_impl(attr: TokenStream, item: TokenStream) -> syn::Result<TokenStream> {
    if !attr.is_empty() {
        return Err(Error::new(attr.span(), "#[actions] takes no arguments"));
    }

    let mut item_impl: ItemImpl = syn::parse2(item)?;

    if let Some((_, path, _)) = &item_impl.trait_ {
        return Err(Error::new(
            path.span(),
            "#[actions] must be placed on an inherent impl block",
        ));
    }

    let mut actions: Vec<ActionInfo> = Vec::new();

    for impl_item in &mut item_impl.items {
        if let ImplItem::Fn(method) = impl_item {
            let attrs = parse_action_attrs(method)?;
            if let Some(action) = collect_action(method, attrs)? {
                if actions.iter().any(|a| a.name == action.name) {
                    return Err(Error::new(
                        method.sig.ident.span(),
                        format!("duplicate action name `{}`", action.name),
                    ));
                }
                actions.push(action);
            }
            // Strip our attribute from the emitted method
            method.attrs.retain(|attr| !attr.path().is_ident("action"));
        }
    }

    let self_ty = &item_impl.self_ty;
    let (impl_generics, _, where_clause) = item_impl.generics.split_for_impl();
    let names: Vec<&str> = actions.iter().map(|a| a.name.as_str()).collect();
    let arms: Vec<TokenStream> = actions.iter().map(generate_arm).collect();
    let args_binding = if actions.iter().any(|a| !a.params.is_empty()) {
        quote! { let __args = ::fragments::ActionArgs::new(__values); }
    } else {
        quote! { let _ = __values; }
    };

    Ok(quote! {
        #item_impl

        impl #impl_generics ::fragments::FragmentActions for #self_ty #where_clause {
            const ACTIONS: &'static [&'static str] = &[#(#names),*];

            fn invoke_action(
                &mut self,
                __action: &str,
                __values: ::std::vec::Vec<::fragments::__private::serde_json::Value>,
            ) -> ::std::result::Result<(), ::fragments::ActionError> {
                #args_binding
                match __action {
                    #(#arms)*
                    _ => ::std::result::Result::Err(::fragments::ActionError::Unknown),
                }
            }
        }
    })
}
