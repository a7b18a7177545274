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

//! Field-level `#[pack(...)]` attribute parsing.
//!
//! - `key = N` / `key = "name"`: explicit wire key; the kind of key picks
//!   the schema's layout (engine-validated)
//! - `skip`: exclude the field from serialization
//! - `formatter = "path"`: per-field formatter override

use syn::{Field, LitInt, LitStr};

/// Parsed `#[pack(...)]` attributes of one field.
#[derive(Default)]
pub struct PackFieldMeta {
    pub int_key: Option<u32>,
    pub str_key: Option<String>,
    pub skip: bool,
    pub formatter: Option<syn::Path>,
}

pub fn parse_field_meta(field: &Field) -> syn::Result<PackFieldMeta> {
    let mut meta = PackFieldMeta::default();

    for attr in &field.attrs {
        if !attr.path().is_ident("pack") {
            continue;
        }

        attr.parse_nested_meta(|nested| {
            if nested.path.is_ident("key") {
                let value = nested.value()?;
                if value.peek(LitStr) {
                    let lit: LitStr = value.parse()?;
                    meta.str_key = Some(lit.value());
                } else {
                    let lit: LitInt = value.parse()?;
                    meta.int_key = Some(lit.base10_parse()?);
                }
            } else if nested.path.is_ident("skip") {
                meta.skip = true;
            } else if nested.path.is_ident("formatter") {
                let lit: LitStr = nested.value()?.parse()?;
                meta.formatter = Some(lit.parse()?);
            } else {
                return Err(nested.error("unknown #[pack(...)] attribute"));
            }
            Ok(())
        })?;
    }

    if meta.int_key.is_some() && meta.str_key.is_some() {
        return Err(syn::Error::new_spanned(
            field,
            "a field declares at most one key",
        ));
    }
    Ok(meta)
}
