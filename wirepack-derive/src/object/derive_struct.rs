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

//! Object-descriptor generation for structs with named fields.
//!
//! Each serialized field becomes a member with generated getter/setter
//! functions; the constructor takes every serialized field, ordered by
//! ascending int key where keys are declared (constructor parameters bind
//! positionally in int-key schemas) and by declaration otherwise, with
//! skipped fields default-initialized. Key-uniqueness and mode-consistency
//! checks stay in the engine's schema builder so they run through the same
//! error path as hand-written descriptors.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{DataStruct, DeriveInput, Error, Fields, Ident, Type};

use super::field_meta::{parse_field_meta, PackFieldMeta};

struct FieldPlan<'a> {
    ident: &'a Ident,
    ty: &'a Type,
    meta: PackFieldMeta,
}

/// Struct-level `#[pack(default)]`: registers a default-construct fallback
/// (the type must implement `Default`), which is what sparse int-key
/// schemas fall back to when no constructor binds.
fn parse_container_default(input: &DeriveInput) -> syn::Result<bool> {
    let mut with_default = false;
    for attr in &input.attrs {
        if !attr.path().is_ident("pack") {
            continue;
        }
        attr.parse_nested_meta(|nested| {
            if nested.path.is_ident("default") {
                with_default = true;
                Ok(())
            } else {
                Err(nested.error("unknown struct-level #[pack(...)] attribute"))
            }
        })?;
    }
    Ok(with_default)
}

pub fn expand(input: &DeriveInput, data: &DataStruct) -> syn::Result<TokenStream> {
    let fields = match &data.fields {
        Fields::Named(fields) => &fields.named,
        _ => {
            return Err(Error::new_spanned(
                &input.ident,
                "#[derive(Described)] requires named fields",
            ))
        }
    };

    let name = &input.ident;
    let name_str = name.to_string();
    let mismatch = format!("value is not a {}", name_str);
    let with_default = parse_container_default(input)?;

    let mut plans = Vec::new();
    for field in fields {
        let ident = field.ident.as_ref().expect("named field has an ident");
        plans.push(FieldPlan {
            ident,
            ty: &field.ty,
            meta: parse_field_meta(field)?,
        });
    }
    // constructor parameters bind by position in int-key schemas, so emit
    // them in ascending key order; declaration order is already correct for
    // contractless and string-key schemas
    let mut ctor_order: Vec<&FieldPlan> = plans.iter().filter(|p| !p.meta.skip).collect();
    ctor_order.sort_by_key(|p| p.meta.int_key.unwrap_or(0));

    let mut accessor_fns = Vec::new();
    let mut member_calls = Vec::new();
    let mut param_defs = Vec::new();
    let mut make_lets = Vec::new();
    let mut make_fields = Vec::new();

    for plan in &plans {
        let ident = plan.ident;
        let ty = plan.ty;
        if plan.meta.skip {
            make_fields.push(quote! { #ident: ::std::default::Default::default() });
            continue;
        }
        let field_str = ident.to_string();
        let getter = format_ident!("__wirepack_get_{}", ident);
        let setter = format_ident!("__wirepack_set_{}", ident);

        accessor_fns.push(quote! {
            fn #getter(
                value: &dyn ::std::any::Any,
            ) -> ::std::result::Result<&dyn ::std::any::Any, ::wirepack_core::error::Error> {
                ::std::result::Result::Ok(
                    &value
                        .downcast_ref::<#name>()
                        .ok_or_else(|| ::wirepack_core::error::Error::type_error(#mismatch))?
                        .#ident,
                )
            }

            fn #setter(
                object: &mut dyn ::std::any::Any,
                value: ::std::boxed::Box<dyn ::std::any::Any>,
            ) -> ::std::result::Result<(), ::wirepack_core::error::Error> {
                let object = object
                    .downcast_mut::<#name>()
                    .ok_or_else(|| ::wirepack_core::error::Error::type_error(#mismatch))?;
                let value = value.downcast::<#ty>().map_err(|_| {
                    ::wirepack_core::error::Error::type_error(::std::concat!(
                        "decoded value for `", #field_str, "` has the wrong type"
                    ))
                })?;
                object.#ident = *value;
                ::std::result::Result::Ok(())
            }
        });

        let key_call = if let Some(key) = plan.meta.int_key {
            quote! { .with_int_key(#key) }
        } else if let Some(key) = plan.meta.str_key.as_deref() {
            quote! { .with_str_key(#key) }
        } else {
            quote! {}
        };
        let formatter_call = if let Some(path) = &plan.meta.formatter {
            let wrapper = format_ident!("__wirepack_fmt_{}", ident);
            accessor_fns.push(quote! {
                fn #wrapper(
                    resolver: &::wirepack_core::resolver::Resolver,
                ) -> ::std::result::Result<
                    ::std::sync::Arc<::wirepack_core::formatter::Formatter>,
                    ::wirepack_core::error::Error,
                > {
                    ::std::result::Result::Ok(::std::sync::Arc::new(#path(resolver)?))
                }
            });
            quote! { .with_formatter(#wrapper) }
        } else {
            quote! {}
        };

        member_calls.push(quote! {
            .member(
                ::wirepack_core::descriptor::MemberDef::new::<#ty>(#field_str)
                    #key_call
                    .with_getter(#getter)
                    .with_setter(#setter)
                    #formatter_call,
            )
        });
        make_fields.push(quote! { #ident });
    }

    for plan in &ctor_order {
        let ident = plan.ident;
        let ty = plan.ty;
        let field_str = ident.to_string();
        param_defs.push(quote! {
            ::wirepack_core::descriptor::ParamDef::new::<#ty>(#field_str)
        });
        make_lets.push(quote! {
            let #ident = *args
                .next()
                .ok_or_else(|| {
                    ::wirepack_core::error::Error::decode(::std::concat!(
                        "missing constructor argument for `", #field_str, "`"
                    ))
                })?
                .downcast::<#ty>()
                .map_err(|_| {
                    ::wirepack_core::error::Error::type_error(::std::concat!(
                        "constructor argument for `", #field_str, "` has the wrong type"
                    ))
                })?;
        });
    }

    let default_call = if with_default {
        quote! {
            .with_default(__wirepack_default)
        }
    } else {
        quote! {}
    };
    let default_fn = if with_default {
        quote! {
            fn __wirepack_default() -> ::std::boxed::Box<dyn ::std::any::Any> {
                ::std::boxed::Box::new(<#name as ::std::default::Default>::default())
            }
        }
    } else {
        quote! {}
    };

    Ok(quote! {
        #[automatically_derived]
        impl ::wirepack_core::descriptor::Described for #name {
            fn descriptor() -> ::wirepack_core::descriptor::Descriptor {
                #(#accessor_fns)*
                #default_fn

                fn __wirepack_make(
                    args: ::std::vec::Vec<::std::boxed::Box<dyn ::std::any::Any>>,
                ) -> ::std::result::Result<
                    ::std::boxed::Box<dyn ::std::any::Any>,
                    ::wirepack_core::error::Error,
                > {
                    let mut args = args.into_iter();
                    #(#make_lets)*
                    ::std::result::Result::Ok(::std::boxed::Box::new(#name {
                        #(#make_fields),*
                    }))
                }

                ::wirepack_core::descriptor::Descriptor::Object(
                    ::wirepack_core::descriptor::ObjectDescriptor::new(#name_str)
                        #(#member_calls)*
                        .constructor(::wirepack_core::descriptor::ConstructorDef::new(
                            ::std::vec![#(#param_defs),*],
                            __wirepack_make,
                        ))
                        #default_call,
                )
            }
        }
    })
}
