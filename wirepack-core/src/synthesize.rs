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

//! Code synthesis: turns one [`ObjectSchema`] into its compiled
//! encode/decode pair.
//!
//! Runs exactly once per type. The output closes over a precomputed plan —
//! ordered member descriptors, encoded key bytes, the key automaton, the
//! constructor binding — so the hot path performs no reflection and no
//! name hashing. Member formatters are resolved lazily on first touch,
//! which keeps self-referential member types from recursing during
//! synthesis.

use std::any::Any;
use std::sync::Arc;

use crate::automaton::KeyAutomaton;
use crate::buffer::{Reader, Writer};
use crate::descriptor::{GetFn, SetFn};
use crate::error::Error;
use crate::formatter::{Formatter, LazyFormatter};
use crate::resolver::Resolver;
use crate::schema::{CtorPlan, KeyMode, MemberKey, MemberSchema, ObjectSchema};
use crate::types::FastKind;
use crate::wire::skip_value;
use crate::ensure;

struct MemberPlan {
    name: &'static str,
    /// Encoded UTF-8 key bytes (string-key mode only).
    key_bytes: &'static [u8],
    fast: Option<FastKind>,
    fmt: LazyFormatter,
    getter: Option<GetFn>,
    setter: Option<SetFn>,
}

impl MemberPlan {
    fn of(member: &MemberSchema) -> MemberPlan {
        MemberPlan {
            name: member.name,
            key_bytes: match member.key {
                MemberKey::Str(k) => k.as_bytes(),
                MemberKey::Int(_) => &[],
            },
            // the fast fixed-primitive path wins over any per-member
            // override; overrides apply to non-blittable members only
            fast: member.value.fast,
            fmt: LazyFormatter::new(member.formatter.unwrap_or(member.value.resolve)),
            getter: member.getter,
            setter: member.setter,
        }
    }

    fn encode_value(
        &self,
        object: &dyn Any,
        type_name: &'static str,
        writer: &mut Writer,
        resolver: &Resolver,
    ) -> Result<(), Error> {
        let getter = self.getter.ok_or_else(|| {
            Error::type_error(format!(
                "member `{}` of `{}` is not readable",
                self.name, type_name
            ))
        })?;
        let value = getter(object)?;
        match self.fast {
            Some(kind) => kind.write(value, writer),
            None => self.fmt.get(resolver)?.encode_erased(value, writer, resolver),
        }
    }

    fn decode_value(
        &self,
        reader: &mut Reader<'_>,
        resolver: &Resolver,
    ) -> Result<Box<dyn Any>, Error> {
        match self.fast {
            Some(kind) => kind.read_boxed(reader),
            None => self.fmt.get(resolver)?.decode_erased(reader, resolver),
        }
    }
}

struct ObjectPlan {
    schema: ObjectSchema,
    members: Vec<MemberPlan>,
    /// Int-key encode: wire slot -> readable member index; `None` slots are
    /// gaps written as Nil placeholders.
    encode_slots: Vec<Option<usize>>,
    /// Int-key decode: wire slot -> member index, over all members.
    decode_slots: Vec<Option<usize>>,
    /// String-key decode: raw key bytes -> member index.
    automaton: KeyAutomaton,
    /// Number of members written in string-key mode.
    readable: usize,
}

fn build_plan(schema: ObjectSchema) -> Result<ObjectPlan, Error> {
    let members: Vec<MemberPlan> = schema.members.iter().map(MemberPlan::of).collect();
    let readable = schema.members.iter().filter(|m| m.is_readable()).count();

    let mut encode_slots = Vec::new();
    let mut decode_slots = Vec::new();
    let mut automaton = KeyAutomaton::default();
    match schema.key_mode {
        KeyMode::Int => {
            for (index, member) in schema.members.iter().enumerate() {
                let MemberKey::Int(key) = member.key else {
                    return Err(Error::schema(format!(
                        "member `{}` of `{}` lacks an integer key in an int-keyed schema",
                        member.name, schema.name
                    )));
                };
                let slot = key as usize;
                if decode_slots.len() <= slot {
                    decode_slots.resize(slot + 1, None);
                }
                decode_slots[slot] = Some(index);
            }
            // array sized max key + 1; slots without a readable member are
            // Nil-placeholder gaps
            encode_slots = decode_slots
                .iter()
                .map(|slot| slot.filter(|&index| schema.members[index].is_readable()))
                .collect();
        }
        KeyMode::Str => {
            automaton = KeyAutomaton::build(schema.members.iter().enumerate().map(
                |(index, member)| {
                    let MemberKey::Str(key) = member.key else {
                        unreachable!("string-keyed schema holds string keys");
                    };
                    (key.as_bytes(), index)
                },
            ))?;
        }
    }

    Ok(ObjectPlan {
        schema,
        members,
        encode_slots,
        decode_slots,
        automaton,
        readable,
    })
}

impl ObjectPlan {
    fn encode(&self, value: &dyn Any, writer: &mut Writer, resolver: &Resolver) -> Result<(), Error> {
        if let Some(hook) = self.schema.before_encode {
            hook(value)?;
        }
        match self.schema.key_mode {
            KeyMode::Int => {
                writer.write_array_header(self.encode_slots.len())?;
                for slot in &self.encode_slots {
                    match slot {
                        Some(index) => self.members[*index].encode_value(
                            value,
                            self.schema.name,
                            writer,
                            resolver,
                        )?,
                        // unused key below the maximum: Nil placeholder
                        None => writer.write_nil(),
                    }
                }
            }
            KeyMode::Str => {
                writer.write_map_header(self.readable)?;
                for member in &self.members {
                    if member.getter.is_none() {
                        continue;
                    }
                    writer.write_str_header(member.key_bytes.len())?;
                    writer.write_bytes(member.key_bytes);
                    member.encode_value(value, self.schema.name, writer, resolver)?;
                }
            }
        }
        Ok(())
    }

    fn decode(&self, reader: &mut Reader<'_>, resolver: &Resolver) -> Result<Box<dyn Any>, Error> {
        ensure!(
            !reader.peek_is_nil()?,
            Error::decode(format!(
                "nil cannot decode into non-nullable `{}`",
                self.schema.name
            ))
        );
        let mut slots: Vec<Option<Box<dyn Any>>> =
            (0..self.members.len()).map(|_| None).collect();
        match self.schema.key_mode {
            KeyMode::Int => {
                let count = reader.read_array_len()?;
                for wire_slot in 0..count {
                    match self.decode_slots.get(wire_slot).copied().flatten() {
                        Some(index) => {
                            slots[index] = Some(self.members[index].decode_value(reader, resolver)?)
                        }
                        None => skip_value(reader)?,
                    }
                }
            }
            KeyMode::Str => {
                let count = reader.read_map_len()?;
                for _ in 0..count {
                    let key = reader.read_str_bytes()?;
                    match self.automaton.get(key) {
                        Some(index) => {
                            slots[index] = Some(self.members[index].decode_value(reader, resolver)?)
                        }
                        None => skip_value(reader)?,
                    }
                }
            }
        }
        self.construct(slots)
    }

    fn construct(&self, mut slots: Vec<Option<Box<dyn Any>>>) -> Result<Box<dyn Any>, Error> {
        let mut object = match &self.schema.ctor {
            CtorPlan::Invoke {
                make,
                param_members,
            } => {
                let mut args = Vec::with_capacity(param_members.len());
                for &index in param_members {
                    let value = slots[index].take().ok_or_else(|| {
                        Error::decode(format!(
                            "no value decoded for member `{}` bound to a constructor parameter of `{}`",
                            self.members[index].name, self.schema.name
                        ))
                    })?;
                    args.push(value);
                }
                make(args)?
            }
            CtorPlan::DefaultFill { default_fn } => default_fn(),
        };
        for (index, slot) in slots.iter_mut().enumerate() {
            if let Some(value) = slot.take() {
                if let Some(setter) = self.members[index].setter {
                    setter(&mut *object, value)?;
                }
                // decoded but neither constructor-bound nor writable: the
                // bytes were consumed, the value is dropped
            }
        }
        if let Some(hook) = self.schema.after_decode {
            hook(&mut *object)?;
        }
        Ok(object)
    }
}

/// Compiles the schema into its formatter. The result is what the resolver
/// caches; no separate schema cache exists beyond this point.
pub fn compile(type_name: &'static str, schema: ObjectSchema) -> Result<Formatter, Error> {
    let plan = Arc::new(build_plan(schema)?);
    let encode_plan = Arc::clone(&plan);
    let decode_plan = plan;
    Ok(Formatter::new(
        type_name,
        Box::new(move |value, writer, resolver| encode_plan.encode(value, writer, resolver)),
        Box::new(move |reader, resolver| decode_plan.decode(reader, resolver)),
    ))
}
