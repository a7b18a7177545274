// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Enum-descriptor generation for unit-variant enums: the wire value is the
//! underlying integer. The underlying kind is read from `#[repr(...)]`,
//! defaulting to `i32`; discriminants follow Rust's rules (explicit value,
//! else previous + 1, starting at 0).

use proc_macro2::TokenStream;
use quote::quote;
use syn::{DataEnum, DeriveInput, Error, Expr, ExprLit, ExprUnary, Fields, Lit, UnOp};

const REPR_KINDS: &[(&str, &str)] = &[
    ("i8", "I8"),
    ("i16", "I16"),
    ("i32", "I32"),
    ("i64", "I64"),
    ("u8", "U8"),
    ("u16", "U16"),
    ("u32", "U32"),
    ("u64", "U64"),
];

fn underlying_kind(input: &DeriveInput) -> syn::Result<&'static str> {
    for attr in &input.attrs {
        if !attr.path().is_ident("repr") {
            continue;
        }
        let mut found = None;
        attr.parse_nested_meta(|nested| {
            for (repr, kind) in REPR_KINDS {
                if nested.path.is_ident(repr) {
                    found = Some(*kind);
                }
            }
            Ok(())
        })?;
        if let Some(kind) = found {
            return Ok(kind);
        }
    }
    Ok("I32")
}

fn discriminant_value(expr: &Expr) -> syn::Result<i64> {
    match expr {
        Expr::Lit(ExprLit {
            lit: Lit::Int(lit), ..
        }) => lit.base10_parse(),
        Expr::Unary(ExprUnary {
            op: UnOp::Neg(_),
            expr,
            ..
        }) => Ok(-discriminant_value(expr)?),
        _ => Err(Error::new_spanned(
            expr,
            "enum discriminants must be integer literals",
        )),
    }
}

pub fn expand(input: &DeriveInput, data: &DataEnum) -> syn::Result<TokenStream> {
    let name = &input.ident;
    let name_str = name.to_string();
    let mismatch = format!("value is not a {}", name_str);
    let kind = quote::format_ident!("{}", underlying_kind(input)?);

    let mut idents = Vec::new();
    let mut values = Vec::new();
    let mut next = 0i64;
    for variant in &data.variants {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(Error::new_spanned(
                variant,
                "#[derive(Described)] supports unit variants only; \
                 model data-carrying variants as a union over structs",
            ));
        }
        if let Some((_, expr)) = &variant.discriminant {
            next = discriminant_value(expr)?;
        }
        idents.push(&variant.ident);
        values.push(next);
        next += 1;
    }
    if idents.is_empty() {
        return Err(Error::new_spanned(
            name,
            "#[derive(Described)] requires at least one variant",
        ));
    }

    Ok(quote! {
        #[automatically_derived]
        impl ::wirepack_core::descriptor::Described for #name {
            fn descriptor() -> ::wirepack_core::descriptor::Descriptor {
                fn __wirepack_to_int(
                    value: &dyn ::std::any::Any,
                ) -> ::std::result::Result<i64, ::wirepack_core::error::Error> {
                    let value = value
                        .downcast_ref::<#name>()
                        .ok_or_else(|| ::wirepack_core::error::Error::type_error(#mismatch))?;
                    ::std::result::Result::Ok(match value {
                        #(#name::#idents => #values,)*
                    })
                }

                fn __wirepack_from_int(
                    value: i64,
                ) -> ::std::result::Result<
                    ::std::boxed::Box<dyn ::std::any::Any>,
                    ::wirepack_core::error::Error,
                > {
                    match value {
                        #(#values => ::std::result::Result::Ok(
                            ::std::boxed::Box::new(#name::#idents),
                        ),)*
                        other => ::std::result::Result::Err(
                            ::wirepack_core::error::Error::unknown_enum(::std::format!(
                                "no variant of `{}` has discriminant {}",
                                #name_str,
                                other
                            )),
                        ),
                    }
                }

                ::wirepack_core::descriptor::Descriptor::Enum(
                    ::wirepack_core::descriptor::EnumDescriptor::new(
                        #name_str,
                        ::wirepack_core::types::IntKind::#kind,
                        __wirepack_to_int,
                        __wirepack_from_int,
                    ),
                )
            }
        }
    })
}
