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

use proc_macro2::TokenStream;
use syn::{Data, DeriveInput, Error};

mod derive_enum;
mod derive_struct;
mod field_meta;

pub fn derive_described(input: &DeriveInput) -> syn::Result<TokenStream> {
    if !input.generics.params.is_empty() {
        return Err(Error::new_spanned(
            &input.generics,
            "#[derive(Described)] does not support generic types; \
             implement Described by hand or describe a concrete alias",
        ));
    }
    match &input.data {
        Data::Struct(data) => derive_struct::expand(input, data),
        Data::Enum(data) => derive_enum::expand(input, data),
        Data::Union(_) => Err(Error::new_spanned(
            &input.ident,
            "#[derive(Described)] does not support untagged unions",
        )),
    }
}
