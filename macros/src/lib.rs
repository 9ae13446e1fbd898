//! Derive macros for Daybook action enums
//!
//! Daybook reducers take a single action enum that mixes two kinds of input:
//! commands issued by the user (load, create, toggle, remove) and outcomes
//! produced when a remote call settles. Marking each variant lets the
//! runtime and logs tell them apart without hand-written match tables.
//!
//! # Available Macros
//!
//! - `#[derive(Action)]` - Generates `is_command()`, `is_outcome()` and `name()`
//!
//! # Example
//!
//! ```ignore
//! use daybook_macros::Action;
//!
//! #[derive(Action, Clone, Debug)]
//! enum TodoAction {
//!     #[command]
//!     Remove { id: String },
//!
//!     #[outcome]
//!     Removed { id: String },
//! }
//!
//! assert!(TodoAction::Remove { id: "1".into() }.is_command());
//! assert!(TodoAction::Removed { id: "1".into() }.is_outcome());
//! assert_eq!(TodoAction::Removed { id: "1".into() }.name(), "Removed");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use proc_macro::TokenStream;
use quote::quote;
use syn::{Attribute, Data, DeriveInput, Fields, Ident, parse_macro_input};

/// Derive macro for action enums.
///
/// Variants may carry `#[command]` or `#[outcome]` (not both). Unmarked
/// variants answer `false` to both predicates.
///
/// Generates:
///
/// - `is_command(&self) -> bool`
/// - `is_outcome(&self) -> bool`
/// - `name(&self) -> &'static str`: the variant name, for log fields and
///   metric labels
#[proc_macro_derive(Action, attributes(command, outcome))]
pub fn derive_action(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;

    let Data::Enum(data_enum) = &input.data else {
        return syn::Error::new_spanned(input, "#[derive(Action)] can only be used on enums")
            .to_compile_error()
            .into();
    };

    let mut command_arms = Vec::new();
    let mut outcome_arms = Vec::new();
    let mut name_arms = Vec::new();

    for variant in &data_enum.variants {
        let is_command = has_attribute(&variant.attrs, "command");
        let is_outcome = has_attribute(&variant.attrs, "outcome");

        if is_command && is_outcome {
            return syn::Error::new_spanned(
                variant,
                "Variant cannot be both #[command] and #[outcome]",
            )
            .to_compile_error()
            .into();
        }

        let pattern = variant_pattern(&variant.ident, &variant.fields);
        let label = variant.ident.to_string();

        if is_command {
            command_arms.push(quote! { #pattern => true, });
        }
        if is_outcome {
            outcome_arms.push(quote! { #pattern => true, });
        }
        name_arms.push(quote! { #pattern => #label, });
    }

    // An enum without variants has no arms; `match *self {}` still type-checks.
    let name_body = if name_arms.is_empty() {
        quote! { match *self {} }
    } else {
        quote! { match self { #(#name_arms)* } }
    };

    let expanded = quote! {
        impl #name {
            /// Returns true if this action is a user command
            #[must_use]
            #[allow(unreachable_patterns)]
            pub const fn is_command(&self) -> bool {
                match self {
                    #(#command_arms)*
                    _ => false,
                }
            }

            /// Returns true if this action reports the outcome of an effect
            #[must_use]
            #[allow(unreachable_patterns)]
            pub const fn is_outcome(&self) -> bool {
                match self {
                    #(#outcome_arms)*
                    _ => false,
                }
            }

            /// Variant name of this action
            #[must_use]
            pub const fn name(&self) -> &'static str {
                #name_body
            }
        }
    };

    TokenStream::from(expanded)
}

/// Wildcard pattern matching any payload of a variant
fn variant_pattern(ident: &Ident, fields: &Fields) -> proc_macro2::TokenStream {
    match fields {
        Fields::Named(_) => quote! { Self::#ident { .. } },
        Fields::Unnamed(_) => quote! { Self::#ident(..) },
        Fields::Unit => quote! { Self::#ident },
    }
}

/// Check if an attribute with the given name exists
fn has_attribute(attrs: &[Attribute], name: &str) -> bool {
    attrs.iter().any(|attr| attr.path().is_ident(name))
}
