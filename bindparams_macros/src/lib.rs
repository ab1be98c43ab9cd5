//! Derive macro for `bindparams` flat shapes.
//!
//! `#[derive(FlatShape)]` emits two things for a struct:
//!
//! - a runtime [`ShapeDescriptor`] listing every field, its external name and
//!   its classified kind, which the shape inspector validates once when a
//!   handler is registered;
//! - a `from_resolved` constructor that pulls each field out of the
//!   resolver's output with the right coercion.
//!
//! Field kinds are classified from the declared type's syntax. Anything that
//! is not a primitive or a `Vec` of primitives is still accepted here and
//! reported as unsupported in the descriptor, so the mistake surfaces as a
//! `ConfigurationError` at registration time.
//!
//! ```ignore
//! use bindparams::FlatShape;
//!
//! #[derive(FlatShape, Debug, Default)]
//! struct Params {
//!     id: i64,
//!     #[bind(rename = "postId")]
//!     post: i64,
//!     filter_arr_int: Vec<i32>,
//! }
//! ```
//!
//! [`ShapeDescriptor`]: ../bindparams/shape/struct.ShapeDescriptor.html

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    parse_macro_input, Attribute, Data, DeriveInput, Fields, GenericArgument, LitStr,
    PathArguments, Type,
};

/// Primitive identifiers and the `PrimitiveKind` variant they map to.
const PRIMITIVES: &[(&str, &str)] = &[
    ("bool", "Bool"),
    ("i8", "I8"),
    ("i16", "I16"),
    ("i32", "I32"),
    ("i64", "I64"),
    ("isize", "Isize"),
    ("u8", "U8"),
    ("u16", "U16"),
    ("u32", "U32"),
    ("u64", "U64"),
    ("usize", "Usize"),
    ("f32", "F32"),
    ("f64", "F64"),
    ("String", "String"),
];

const POINTER_LIKE: &[&str] = &["Option", "Box", "Rc", "Arc", "Cell", "RefCell", "Cow"];
const MAP_LIKE: &[&str] = &["HashMap", "BTreeMap", "IndexMap"];

enum Classified {
    Scalar(&'static str),
    Sequence(&'static str, Type),
    Unsupported(&'static str),
}

#[proc_macro_derive(FlatShape, attributes(bind))]
pub fn derive_flat_shape(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            input,
            "#[derive(FlatShape)] can only be used on structs with named fields",
        ));
    };

    let mut descriptors = Vec::new();
    let mut builders = Vec::new();

    match &data.fields {
        Fields::Named(named) => {
            for (index, field) in named.named.iter().enumerate() {
                let Some(ident) = field.ident.as_ref() else {
                    continue;
                };
                let ident_str = ident.to_string();
                let ident_str = ident_str.trim_start_matches("r#").to_string();
                let external = match rename_of(&field.attrs)? {
                    Some(rename) => rename,
                    None => lower_camel(&ident_str),
                };
                let ty = &field.ty;
                let ty_str = quote!(#ty).to_string().replace(' ', "");

                let (kind, builder) = match classify(ty) {
                    Classified::Scalar(variant) => {
                        let variant = syn::Ident::new(variant, proc_macro2::Span::call_site());
                        (
                            quote! {
                                ::bindparams::FieldKind::Scalar(::bindparams::PrimitiveKind::#variant)
                            },
                            quote! { #ident: fields.scalar::<#ty>(#index)?, },
                        )
                    }
                    Classified::Sequence(variant, elem) => {
                        let variant = syn::Ident::new(variant, proc_macro2::Span::call_site());
                        (
                            quote! {
                                ::bindparams::FieldKind::Sequence(::bindparams::PrimitiveKind::#variant)
                            },
                            quote! { #ident: fields.sequence::<#elem>(#index)?, },
                        )
                    }
                    Classified::Unsupported(reason) => {
                        let reason = syn::Ident::new(reason, proc_macro2::Span::call_site());
                        (
                            quote! {
                                ::bindparams::FieldKind::Unsupported(::bindparams::UnsupportedKind::#reason)
                            },
                            quote! { #ident: fields.unsupported(#index)?, },
                        )
                    }
                };

                descriptors.push(quote! {
                    ::bindparams::FieldDescriptor::new(#ident_str, #external, #ty_str, #kind)
                });
                builders.push(builder);
            }
        }
        Fields::Unit => {}
        Fields::Unnamed(_) => {
            return Err(syn::Error::new_spanned(
                input,
                "#[derive(FlatShape)] requires named fields; tuple structs have no field names to bind",
            ));
        }
    }

    let construct = match &data.fields {
        Fields::Unit => quote! { Self },
        _ => quote! { Self { #(#builders)* } },
    };

    Ok(quote! {
        impl #impl_generics ::bindparams::FlatShape for #name #ty_generics #where_clause {
            fn shape() -> ::bindparams::ShapeDescriptor {
                ::bindparams::ShapeDescriptor::record(
                    ::std::any::type_name::<Self>(),
                    ::std::vec![#(#descriptors),*],
                )
            }

            #[allow(unused_variables)]
            fn from_resolved(
                fields: &mut ::bindparams::ResolvedFields,
            ) -> ::std::result::Result<Self, ::bindparams::BindError> {
                ::std::result::Result::Ok(#construct)
            }
        }
    })
}

/// Reads `#[bind(rename = "...")]`.
fn rename_of(attrs: &[Attribute]) -> syn::Result<Option<String>> {
    let mut rename = None;
    for attr in attrs.iter().filter(|a| a.path().is_ident("bind")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                let value: LitStr = meta.value()?.parse()?;
                rename = Some(value.value());
                Ok(())
            } else {
                Err(meta.error("unsupported bind attribute, expected `rename = \"...\"`"))
            }
        })?;
    }
    Ok(rename)
}

/// `post_id` -> `postId`. Leading underscores are dropped.
fn lower_camel(ident: &str) -> String {
    let mut out = String::with_capacity(ident.len());
    let mut upper_next = false;
    for ch in ident.chars() {
        if ch == '_' {
            upper_next = !out.is_empty();
            continue;
        }
        if upper_next {
            out.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }
    if out.is_empty() {
        ident.to_string()
    } else {
        out
    }
}

fn primitive_variant(ty: &Type) -> Option<&'static str> {
    let Type::Path(path) = ty else {
        return None;
    };
    if path.qself.is_some() {
        return None;
    }
    let last = path.path.segments.last()?;
    if !matches!(last.arguments, PathArguments::None) {
        return None;
    }
    let ident = last.ident.to_string();
    PRIMITIVES
        .iter()
        .find(|(name, _)| *name == ident)
        .map(|(_, variant)| *variant)
}

fn single_type_argument(arguments: &PathArguments) -> Option<&Type> {
    let PathArguments::AngleBracketed(args) = arguments else {
        return None;
    };
    let mut types = args.args.iter().filter_map(|arg| match arg {
        GenericArgument::Type(ty) => Some(ty),
        _ => None,
    });
    let first = types.next()?;
    types.next().is_none().then_some(first)
}

fn classify(ty: &Type) -> Classified {
    if let Some(variant) = primitive_variant(ty) {
        return Classified::Scalar(variant);
    }

    match ty {
        Type::Paren(inner) => classify(&inner.elem),
        Type::Group(inner) => classify(&inner.elem),
        Type::Reference(_) | Type::Ptr(_) => Classified::Unsupported("Pointer"),
        Type::Array(_) | Type::Slice(_) => Classified::Unsupported("Array"),
        Type::Tuple(_) => Classified::Unsupported("Tuple"),
        Type::Path(path) => {
            let Some(last) = path.path.segments.last() else {
                return Classified::Unsupported("Other");
            };
            let ident = last.ident.to_string();
            if ident == "Vec" {
                return match single_type_argument(&last.arguments) {
                    Some(elem) => match classify(elem) {
                        Classified::Scalar(variant) => Classified::Sequence(variant, elem.clone()),
                        Classified::Sequence(..) => Classified::Unsupported("NestedSequence"),
                        unsupported => unsupported,
                    },
                    None => Classified::Unsupported("Other"),
                };
            }
            if POINTER_LIKE.contains(&ident.as_str()) {
                Classified::Unsupported("Pointer")
            } else if MAP_LIKE.contains(&ident.as_str()) {
                Classified::Unsupported("Map")
            } else {
                Classified::Unsupported("Record")
            }
        }
        _ => Classified::Unsupported("Other"),
    }
}
