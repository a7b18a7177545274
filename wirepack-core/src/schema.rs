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

//! Object schema construction.
//!
//! Runs once per object type, on first formatter request. Validates keys,
//! fixes the keying mode, and selects a constructor; every violation is a
//! schema error that is fatal for the type and never retried.

use std::collections::HashSet;

use crate::descriptor::{
    AfterDecodeFn, BeforeEncodeFn, ConstructorDef, DefaultFn, FieldType, GetFn, KeyDef, MakeFn,
    MemberDef, ObjectDescriptor, SetFn,
};
use crate::error::Error;
use crate::formatter::ResolveFn;

/// Wire layout of an object schema: positional array or named map. Uniform
/// across the whole schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyMode {
    Int,
    Str,
}

/// Validated wire key of one member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKey {
    Int(u32),
    Str(&'static str),
}

/// One validated member of an object schema.
#[derive(Debug)]
pub struct MemberSchema {
    pub name: &'static str,
    pub key: MemberKey,
    pub value: FieldType,
    pub getter: Option<GetFn>,
    pub setter: Option<SetFn>,
    pub formatter: Option<ResolveFn>,
}

impl MemberSchema {
    pub fn is_readable(&self) -> bool {
        self.getter.is_some()
    }
}

/// How decoded values become an instance.
#[derive(Debug)]
pub enum CtorPlan {
    /// Invoke the selected constructor with the decoded values bound to its
    /// parameters, then assign the remaining writable members.
    Invoke {
        make: MakeFn,
        /// Member index per constructor parameter, in parameter order.
        param_members: Vec<usize>,
    },
    /// Default-construct, then assign every decoded writable member.
    DefaultFill { default_fn: DefaultFn },
}

/// Per-type computed metadata feeding the code synthesizer.
#[derive(Debug)]
pub struct ObjectSchema {
    pub name: &'static str,
    pub key_mode: KeyMode,
    pub members: Vec<MemberSchema>,
    pub ctor: CtorPlan,
    pub before_encode: Option<BeforeEncodeFn>,
    pub after_decode: Option<AfterDecodeFn>,
}

/// Builds and validates the schema for one object descriptor.
///
/// Keying mode discovery: if no member declares a key the schema is
/// contractless — every member gets its name as a string key, in
/// declaration order. Otherwise every member must declare exactly one key,
/// and the kind of the first member's key fixes the mode for the schema.
pub fn build(desc: ObjectDescriptor) -> Result<ObjectSchema, Error> {
    let ObjectDescriptor {
        name,
        members,
        constructors,
        default_fn,
        before_encode,
        after_decode,
    } = desc;

    let kept: Vec<MemberDef> = members.into_iter().filter(|m| !m.skip).collect();
    let declared = kept.iter().filter(|m| m.key.is_some()).count();

    let (key_mode, members) = if declared == 0 {
        let members = kept
            .into_iter()
            .map(|m| MemberSchema {
                name: m.name,
                key: MemberKey::Str(m.name),
                value: m.value,
                getter: m.getter,
                setter: m.setter,
                formatter: m.formatter,
            })
            .collect::<Vec<_>>();
        (KeyMode::Str, members)
    } else {
        build_attributed(name, kept)?
    };

    validate_unique_keys(name, &members)?;
    let ctor = select_constructor(name, key_mode, &members, constructors, default_fn)?;

    Ok(ObjectSchema {
        name,
        key_mode,
        members,
        ctor,
        before_encode,
        after_decode,
    })
}

fn build_attributed(
    name: &'static str,
    kept: Vec<MemberDef>,
) -> Result<(KeyMode, Vec<MemberSchema>), Error> {
    let mut key_mode: Option<KeyMode> = None;
    let mut members = Vec::with_capacity(kept.len());
    for m in kept {
        let key = match m.key {
            Some(key) => key,
            None => {
                return Err(Error::schema(format!(
                    "member `{}` of `{}` declares no key while other members do",
                    m.name, name
                )))
            }
        };
        let kind = match key {
            KeyDef::Int(_) => KeyMode::Int,
            KeyDef::Str(_) => KeyMode::Str,
        };
        match key_mode {
            None => key_mode = Some(kind),
            Some(mode) if mode != kind => {
                return Err(Error::schema(format!(
                    "member `{}` of `{}` mixes integer and string keys in one schema",
                    m.name, name
                )))
            }
            Some(_) => {}
        }
        members.push(MemberSchema {
            name: m.name,
            key: match key {
                KeyDef::Int(k) => MemberKey::Int(k),
                KeyDef::Str(k) => MemberKey::Str(k),
            },
            value: m.value,
            getter: m.getter,
            setter: m.setter,
            formatter: m.formatter,
        });
    }
    // `declared > 0` guarantees at least one member fixed the mode
    Ok((key_mode.expect("attributed schema has members"), members))
}

fn validate_unique_keys(name: &'static str, members: &[MemberSchema]) -> Result<(), Error> {
    let mut int_keys = HashSet::new();
    let mut str_keys = HashSet::new();
    for m in members {
        let fresh = match m.key {
            MemberKey::Int(k) => int_keys.insert(k),
            MemberKey::Str(k) => str_keys.insert(k),
        };
        if !fresh {
            return Err(Error::schema(format!(
                "duplicate key on member `{}` of `{}`",
                m.name, name
            )));
        }
    }
    Ok(())
}

/// Binds one constructor against the members: every parameter must map to
/// exactly one readable member of the same declared type — by integer
/// position in int-key mode, by case-insensitive name in string-key mode.
/// Returns the member index per parameter, or `None` if the constructor
/// does not match.
fn bind_constructor(
    name: &'static str,
    key_mode: KeyMode,
    members: &[MemberSchema],
    ctor: &ConstructorDef,
) -> Result<Option<Vec<usize>>, Error> {
    let mut bound = Vec::with_capacity(ctor.params.len());
    for (position, param) in ctor.params.iter().enumerate() {
        let member_index = match key_mode {
            KeyMode::Int => members
                .iter()
                .position(|m| m.key == MemberKey::Int(position as u32)),
            KeyMode::Str => {
                let mut matches = members
                    .iter()
                    .enumerate()
                    .filter(|(_, m)| m.name.eq_ignore_ascii_case(param.name))
                    .map(|(i, _)| i);
                let first = matches.next();
                if matches.next().is_some() {
                    return Err(Error::schema(format!(
                        "constructor parameter `{}` of `{}` matches more than one member",
                        param.name, name
                    )));
                }
                first
            }
        };
        let member_index = match member_index {
            Some(i) => i,
            None => return Ok(None),
        };
        let member = &members[member_index];
        if !member.is_readable() || member.value.type_id != param.ty.type_id {
            return Ok(None);
        }
        bound.push(member_index);
    }
    Ok(Some(bound))
}

fn select_constructor(
    name: &'static str,
    key_mode: KeyMode,
    members: &[MemberSchema],
    constructors: Vec<ConstructorDef>,
    default_fn: Option<DefaultFn>,
) -> Result<CtorPlan, Error> {
    let marked: Vec<&ConstructorDef> = constructors.iter().filter(|c| c.marked).collect();
    if marked.len() > 1 {
        return Err(Error::schema(format!(
            "`{}` marks more than one constructor for deserialization",
            name
        )));
    }
    if let Some(ctor) = marked.first() {
        return match bind_constructor(name, key_mode, members, ctor)? {
            Some(param_members) => Ok(CtorPlan::Invoke {
                make: ctor.make,
                param_members,
            }),
            None => Err(Error::schema(format!(
                "the constructor marked for deserialization on `{}` does not bind to the members",
                name
            ))),
        };
    }

    // ascending parameter count; a tie between fully-matching candidates of
    // equal arity is an error rather than an arbitrary pick
    let mut by_arity: Vec<&ConstructorDef> = constructors.iter().collect();
    by_arity.sort_by_key(|c| c.params.len());
    let mut i = 0;
    while i < by_arity.len() {
        let arity = by_arity[i].params.len();
        let mut matched: Option<&ConstructorDef> = None;
        let mut bound: Option<Vec<usize>> = None;
        while i < by_arity.len() && by_arity[i].params.len() == arity {
            if let Some(b) = bind_constructor(name, key_mode, members, by_arity[i])? {
                if matched.is_some() {
                    return Err(Error::schema(format!(
                        "two constructors of `{}` with {} parameters both match",
                        name, arity
                    )));
                }
                matched = Some(by_arity[i]);
                bound = Some(b);
            }
            i += 1;
        }
        if let (Some(ctor), Some(param_members)) = (matched, bound) {
            return Ok(CtorPlan::Invoke {
                make: ctor.make,
                param_members,
            });
        }
    }

    if let Some(default_fn) = default_fn {
        return Ok(CtorPlan::DefaultFill { default_fn });
    }
    Err(Error::schema(format!(
        "no constructor of `{}` matches its members and the type provides no default",
        name
    )))
}
