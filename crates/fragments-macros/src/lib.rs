//! Proc macros for fragments.
//!
//! # Available Macros
//!
//! - [`Fragment`] - Derive the `Fragment` trait for a struct embedding a
//!   `FragmentState`
//! - [`actions`] - Turn an impl block's public methods into the fragment's
//!   action table
//!
//! Both expand to paths under `::fragments`, so they are meant to be used
//! through the re-exports of the `fragments` crate.
//!
//! # Example
//!
//! ```rust,ignore
//! use fragments::{actions, Fragment, FragmentState};
//!
//! #[derive(Fragment)]
//! pub struct TagCloudFragment {
//!     state: FragmentState,
//! }
//!
//! #[actions]
//! impl TagCloudFragment {
//!     pub fn display(&mut self) {
//!         self.state.set("tags", vec!["rust", "web"]);
//!     }
//!
//!     pub fn small_list(&mut self, limit: usize) {
//!         self.state.set("limit", limit);
//!     }
//! }
//! ```

mod actions;
mod derive;

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

/// Derives the `Fragment` and `FragmentType` traits.
///
/// The struct must have named fields, one of which holds the fragment's
/// `FragmentState`. That field is found by type name, or explicitly with
/// `#[fragment(state)]` when the struct has several candidates.
///
/// The generated impl delegates action calls to `FragmentActions`, so every
/// derived fragment also needs an [`actions`] impl block (it may be empty).
///
/// # Compile-Time Errors
///
/// - Enums, unions, and tuple structs
/// - No state field, or more than one unmarked candidate
#[proc_macro_derive(Fragment, attributes(fragment))]
pub fn fragment_derive(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    derive::fragment_derive_impl(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

/// Builds a fragment's action table from an inherent impl block.
///
/// Every `pub fn` taking `&self` or `&mut self` becomes an action named after
/// the method. Parameters are decoded positionally from JSON values;
/// `Option<T>` parameters may be omitted by the caller.
///
/// # Method Attributes
///
/// - `#[action(name = "...")]` - Register under a different name
/// - `#[action(skip)]` - Leave the method out of the table
///
/// # Compile-Time Errors
///
/// - Trait impl blocks
/// - Actions taking `self` by value, reference parameters, or generics
/// - Two actions with the same name
#[proc_macro_attribute]
pub fn actions(attr: TokenStream, item: TokenStream) -> TokenStream {
    let attr = proc_macro2::TokenStream::from(attr);
    let item = proc_macro2::TokenStream::from(item);
    actions::actions_impl(attr, item)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
