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

//! Error type and helper macros.
//!
//! Error constructors sit on every buffer read and type check, so they are
//! kept `#[inline(always)] #[cold] #[track_caller]`: the constructors
//! themselves are rarely executed, but their inlining behavior affects how
//! the hot paths around them are optimized.

use std::borrow::Cow;

use thiserror::Error;

/// Compile-time flag: set `WIREPACK_PANIC_ON_ERROR=1` when building to make
/// every error constructor panic at its creation site instead of returning,
/// which surfaces the full stack trace of the failure origin.
pub const PANIC_ON_ERROR: bool = option_env!("WIREPACK_PANIC_ON_ERROR").is_some();

/// Error type for wirepack serialization and deserialization operations.
///
/// Construct variants through the static constructor functions
/// ([`Error::schema`], [`Error::decode`], ...) rather than the enum syntax;
/// the constructors handle `Into<Cow<'static, str>>` conversion and the
/// `WIREPACK_PANIC_ON_ERROR` debug hook.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// A type's schema failed to build: missing/duplicate/inconsistent key,
    /// or no/ambiguous matching constructor. Fatal at first use of the type.
    #[error("{0}")]
    Schema(Cow<'static, str>),

    /// No resolver in the chain produced a formatter for the type.
    #[error("no formatter found for type `{type_name}` (resolver chain: {chain})")]
    FormatterNotFound {
        type_name: &'static str,
        chain: String,
    },

    /// The encoded value does not have the shape the decoder requires.
    #[error("{0}")]
    Decode(Cow<'static, str>),

    /// A runtime downcast or type identity check failed.
    #[error("{0}")]
    TypeError(Cow<'static, str>),

    /// Buffer boundary violation during a read.
    #[error("buffer out of bound: {0} + {1} > {2}")]
    BufferOutOfBound(usize, usize, usize),

    /// Registration was attempted after the first formatter lookup froze the
    /// global registry.
    #[error("{0}")]
    RegistryFrozen(Cow<'static, str>),

    /// Decoded integer matches no variant of the target enum.
    #[error("{0}")]
    UnknownEnum(Cow<'static, str>),

    /// Decoded union discriminant matches no registered subtype.
    #[error("{0}")]
    UnknownUnionKey(Cow<'static, str>),

    /// A value's runtime type is absent from its union's subtype map.
    #[error("{0}")]
    UnregisteredUnionType(Cow<'static, str>),

    /// Invalid or corrupted wire data.
    #[error("{0}")]
    InvalidData(Cow<'static, str>),
}

macro_rules! constructor {
    ($(#[$doc:meta])* $name:ident => $variant:ident) => {
        $(#[$doc])*
        #[inline(always)]
        #[cold]
        #[track_caller]
        pub fn $name<S: Into<Cow<'static, str>>>(s: S) -> Self {
            let err = Error::$variant(s.into());
            if PANIC_ON_ERROR {
                panic!("WIREPACK_PANIC_ON_ERROR: {}", err);
            }
            err
        }
    };
}

impl Error {
    constructor!(
        /// Creates a new [`Error::Schema`].
        schema => Schema
    );
    constructor!(
        /// Creates a new [`Error::Decode`].
        decode => Decode
    );
    constructor!(
        /// Creates a new [`Error::TypeError`].
        type_error => TypeError
    );
    constructor!(
        /// Creates a new [`Error::RegistryFrozen`].
        registry_frozen => RegistryFrozen
    );
    constructor!(
        /// Creates a new [`Error::UnknownEnum`].
        unknown_enum => UnknownEnum
    );
    constructor!(
        /// Creates a new [`Error::UnknownUnionKey`].
        unknown_union_key => UnknownUnionKey
    );
    constructor!(
        /// Creates a new [`Error::UnregisteredUnionType`].
        unregistered_union_type => UnregisteredUnionType
    );
    constructor!(
        /// Creates a new [`Error::InvalidData`].
        invalid_data => InvalidData
    );

    /// Creates a new [`Error::BufferOutOfBound`] with the given bounds.
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn buffer_out_of_bound(offset: usize, length: usize, capacity: usize) -> Self {
        let err = Error::BufferOutOfBound(offset, length, capacity);
        if PANIC_ON_ERROR {
            panic!("WIREPACK_PANIC_ON_ERROR: {}", err);
        }
        err
    }

    /// Creates a new [`Error::FormatterNotFound`] carrying the identity of
    /// the chain that was consulted.
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn formatter_not_found(type_name: &'static str, chain: String) -> Self {
        let err = Error::FormatterNotFound { type_name, chain };
        if PANIC_ON_ERROR {
            panic!("WIREPACK_PANIC_ON_ERROR: {}", err);
        }
        err
    }
}

/// Ensures a condition holds; otherwise returns the given [`enum@Error`].
///
/// ```
/// use wirepack_core::ensure;
/// use wirepack_core::error::Error;
///
/// fn check(n: i32) -> Result<(), Error> {
///     ensure!(n > 0, Error::invalid_data("value must be positive"));
///     Ok(())
/// }
/// ```
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $err:expr) => {
        if !$cond {
            return Err($err);
        }
    };
}

/// Returns early with the given [`enum@Error`].
#[macro_export]
macro_rules! bail {
    ($err:expr) => {
        return Err($err)
    };
}
