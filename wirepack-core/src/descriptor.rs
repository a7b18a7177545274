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

//! Per-type descriptors: the compile-time-supplied stand-in for runtime
//! reflection.
//!
//! A serializable type implements [`Described`] (usually via
//! `#[derive(Described)]`) and hands the engine a [`Descriptor`]. Object
//! descriptors enumerate members, constructors and hooks; the schema
//! builder and code synthesizer run over them at first use. Accessors are
//! plain fn pointers over `dyn Any`, so a descriptor carries no generics
//! and no allocation beyond its member list.

use std::any::{Any, TypeId};
use std::sync::Arc;

use crate::error::Error;
use crate::formatter::{Formatter, ResolveFn};
use crate::resolver::Resolver;
use crate::types::{FastKind, IntKind};

/// A type the engine can resolve a formatter for.
pub trait Described: Any + Sized {
    fn descriptor() -> Descriptor;
}

/// Object-safe bridge from a trait object to `&dyn Any`; union base traits
/// take it as a supertrait so the engine can recover the runtime type of a
/// boxed value.
pub trait AsAny: Any {
    fn as_dyn_any(&self) -> &dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_dyn_any(&self) -> &dyn Any {
        self
    }
}

/// Monomorphized resolver entry captured into descriptors as a fn pointer.
pub fn resolve_described<T: Described>(resolver: &Resolver) -> Result<Arc<Formatter>, Error> {
    resolver.formatter::<T>()
}

/// How a type participates in resolution.
pub enum Descriptor {
    /// Members + constructors; goes through the schema builder and code
    /// synthesizer.
    Object(ObjectDescriptor),
    /// Underlying-integer enum.
    Enum(EnumDescriptor),
    /// Closed polymorphic set over a boxed trait object.
    Union(UnionDescriptor),
    /// The type declares its own formatter; bypasses schema building. Also
    /// the hook the generic container support plugs into.
    Custom(fn(&Resolver) -> Result<Formatter, Error>),
    /// Served by the native-extension or primitive tables; carries no
    /// descriptor data of its own.
    Builtin,
}

/// Reference to a member's declared type: identity, display name, fast-path
/// classification and the resolver entry for recursion.
#[derive(Clone, Copy)]
pub struct FieldType {
    pub type_id: TypeId,
    pub type_name: &'static str,
    pub resolve: ResolveFn,
    pub fast: Option<FastKind>,
}

impl FieldType {
    pub fn of<T: Described>() -> FieldType {
        FieldType {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            resolve: resolve_described::<T>,
            fast: FastKind::of(TypeId::of::<T>()),
        }
    }
}

impl std::fmt::Debug for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldType")
            .field("type_name", &self.type_name)
            .finish()
    }
}

/// Borrowing accessor: object -> member value.
pub type GetFn = fn(&dyn Any) -> Result<&dyn Any, Error>;
/// Assigning accessor: object <- decoded member value.
pub type SetFn = fn(&mut dyn Any, Box<dyn Any>) -> Result<(), Error>;
/// Constructor invocation over decoded values in parameter order.
pub type MakeFn = fn(Vec<Box<dyn Any>>) -> Result<Box<dyn Any>, Error>;
/// Default construction for the set-writable-members fallback.
pub type DefaultFn = fn() -> Box<dyn Any>;
/// Pre-serialize hook, invoked before any bytes are written.
pub type BeforeEncodeFn = fn(&dyn Any) -> Result<(), Error>;
/// Post-deserialize hook, invoked on the constructed value before return.
pub type AfterDecodeFn = fn(&mut dyn Any) -> Result<(), Error>;

/// Explicit wire key declared on a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDef {
    Int(u32),
    Str(&'static str),
}

/// One candidate member of an object descriptor.
pub struct MemberDef {
    pub name: &'static str,
    pub value: FieldType,
    pub key: Option<KeyDef>,
    pub skip: bool,
    pub getter: Option<GetFn>,
    pub setter: Option<SetFn>,
    pub formatter: Option<ResolveFn>,
}

impl MemberDef {
    pub fn new<T: Described>(name: &'static str) -> MemberDef {
        MemberDef {
            name,
            value: FieldType::of::<T>(),
            key: None,
            skip: false,
            getter: None,
            setter: None,
            formatter: None,
        }
    }

    /// Declares an integer wire key (positional-array layout).
    pub fn with_int_key(mut self, key: u32) -> MemberDef {
        self.key = Some(KeyDef::Int(key));
        self
    }

    /// Declares a string wire key (named-map layout).
    pub fn with_str_key(mut self, key: &'static str) -> MemberDef {
        self.key = Some(KeyDef::Str(key));
        self
    }

    pub fn with_getter(mut self, getter: GetFn) -> MemberDef {
        self.getter = Some(getter);
        self
    }

    pub fn with_setter(mut self, setter: SetFn) -> MemberDef {
        self.setter = Some(setter);
        self
    }

    /// Per-member formatter override; bypasses recursive resolution for
    /// this member only.
    pub fn with_formatter(mut self, resolve: ResolveFn) -> MemberDef {
        self.formatter = Some(resolve);
        self
    }

    pub fn skipped(mut self) -> MemberDef {
        self.skip = true;
        self
    }
}

/// One constructor parameter: name plus declared type.
pub struct ParamDef {
    pub name: &'static str,
    pub ty: FieldType,
}

impl ParamDef {
    pub fn new<T: Described>(name: &'static str) -> ParamDef {
        ParamDef {
            name,
            ty: FieldType::of::<T>(),
        }
    }
}

/// One candidate constructor.
pub struct ConstructorDef {
    pub params: Vec<ParamDef>,
    pub make: MakeFn,
    /// Explicitly marked for deserialization; wins over heuristic matching.
    pub marked: bool,
}

impl ConstructorDef {
    pub fn new(params: Vec<ParamDef>, make: MakeFn) -> ConstructorDef {
        ConstructorDef {
            params,
            make,
            marked: false,
        }
    }

    pub fn marked(mut self) -> ConstructorDef {
        self.marked = true;
        self
    }
}

/// Everything the schema builder needs to know about an object type.
pub struct ObjectDescriptor {
    pub name: &'static str,
    pub members: Vec<MemberDef>,
    pub constructors: Vec<ConstructorDef>,
    pub default_fn: Option<DefaultFn>,
    pub before_encode: Option<BeforeEncodeFn>,
    pub after_decode: Option<AfterDecodeFn>,
}

impl ObjectDescriptor {
    pub fn new(name: &'static str) -> ObjectDescriptor {
        ObjectDescriptor {
            name,
            members: Vec::new(),
            constructors: Vec::new(),
            default_fn: None,
            before_encode: None,
            after_decode: None,
        }
    }

    pub fn member(mut self, member: MemberDef) -> ObjectDescriptor {
        self.members.push(member);
        self
    }

    pub fn constructor(mut self, ctor: ConstructorDef) -> ObjectDescriptor {
        self.constructors.push(ctor);
        self
    }

    pub fn with_default(mut self, default_fn: DefaultFn) -> ObjectDescriptor {
        self.default_fn = Some(default_fn);
        self
    }

    pub fn with_before_encode(mut self, hook: BeforeEncodeFn) -> ObjectDescriptor {
        self.before_encode = Some(hook);
        self
    }

    pub fn with_after_decode(mut self, hook: AfterDecodeFn) -> ObjectDescriptor {
        self.after_decode = Some(hook);
        self
    }
}

/// Enum type: wire value is always the underlying integer.
pub struct EnumDescriptor {
    pub name: &'static str,
    pub underlying: IntKind,
    pub to_int: fn(&dyn Any) -> Result<i64, Error>,
    pub from_int: fn(i64) -> Result<Box<dyn Any>, Error>,
}

impl EnumDescriptor {
    pub fn new(
        name: &'static str,
        underlying: IntKind,
        to_int: fn(&dyn Any) -> Result<i64, Error>,
        from_int: fn(i64) -> Result<Box<dyn Any>, Error>,
    ) -> EnumDescriptor {
        EnumDescriptor {
            name,
            underlying,
            to_int,
            from_int,
        }
    }
}

/// Re-boxing of a decoded concrete payload into the base trait object.
pub type WrapFn = fn(Box<dyn Any>) -> Result<Box<dyn Any>, Error>;

/// One registered subtype of a union.
pub struct UnionVariant {
    pub key: u32,
    pub type_id: TypeId,
    pub type_name: &'static str,
    pub resolve: ResolveFn,
    pub wrap: WrapFn,
}

impl UnionVariant {
    pub fn new<T: Described>(key: u32, wrap: WrapFn) -> UnionVariant {
        UnionVariant {
            key,
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            resolve: resolve_described::<T>,
            wrap,
        }
    }
}

/// Closed `(key, subtype)` set for one boxed trait-object base type.
pub struct UnionDescriptor {
    pub name: &'static str,
    /// Projects the boxed base value to its concrete payload as `&dyn Any`.
    pub project: GetFn,
    pub variants: Vec<UnionVariant>,
}

impl UnionDescriptor {
    pub fn new(name: &'static str, project: GetFn, variants: Vec<UnionVariant>) -> UnionDescriptor {
        UnionDescriptor {
            name,
            project,
            variants,
        }
    }
}
