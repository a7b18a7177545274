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

//! Allocation-free UTF-8 key matching for string-keyed schemas.
//!
//! Built once per schema from the declared member keys. A key is consumed
//! in chunks of up to 8 bytes packed into a `u64`; at each node the chunk
//! is binary-searched among the children. Lookup touches no heap and does
//! exact byte comparison — no case folding. Unknown keys fall through to
//! `None`, which the decode path treats as skip-and-discard.

use crate::error::Error;

#[derive(Debug, Default)]
struct Node {
    /// Member index if a key terminates here.
    value: Option<usize>,
    /// Sorted by `(chunk, len)`; the length disambiguates terminal chunks
    /// shorter than 8 bytes from longer keys sharing a prefix.
    children: Vec<(u64, u8, Node)>,
}

/// Maps raw UTF-8 key bytes to a member index.
#[derive(Debug, Default)]
pub struct KeyAutomaton {
    root: Node,
}

#[inline]
fn pack_chunk(bytes: &[u8]) -> u64 {
    debug_assert!(bytes.len() <= 8);
    let mut v = 0u64;
    for (i, b) in bytes.iter().enumerate() {
        v |= (*b as u64) << (8 * i);
    }
    v
}

impl KeyAutomaton {
    /// Builds the automaton from `(key, member index)` pairs.
    pub fn build<'k>(keys: impl IntoIterator<Item = (&'k [u8], usize)>) -> Result<KeyAutomaton, Error> {
        let mut automaton = KeyAutomaton::default();
        for (key, index) in keys {
            automaton.insert(key, index)?;
        }
        Ok(automaton)
    }

    fn insert(&mut self, key: &[u8], index: usize) -> Result<(), Error> {
        let mut node = &mut self.root;
        let mut rest = key;
        while !rest.is_empty() {
            let take = rest.len().min(8);
            let chunk = pack_chunk(&rest[..take]);
            let pos = node
                .children
                .binary_search_by(|(c, l, _)| (*c, *l).cmp(&(chunk, take as u8)));
            let pos = match pos {
                Ok(pos) => pos,
                Err(pos) => {
                    node.children.insert(pos, (chunk, take as u8, Node::default()));
                    pos
                }
            };
            node = &mut node.children[pos].2;
            rest = &rest[take..];
        }
        if node.value.is_some() {
            return Err(Error::schema(format!(
                "duplicate key `{}`",
                String::from_utf8_lossy(key)
            )));
        }
        node.value = Some(index);
        Ok(())
    }

    /// Member index for the given raw key bytes, or `None` for an
    /// unrecognized key.
    #[inline]
    pub fn get(&self, key: &[u8]) -> Option<usize> {
        let mut node = &self.root;
        let mut rest = key;
        loop {
            if rest.is_empty() {
                return node.value;
            }
            let take = rest.len().min(8);
            let chunk = pack_chunk(&rest[..take]);
            match node
                .children
                .binary_search_by(|(c, l, _)| (*c, *l).cmp(&(chunk, take as u8)))
            {
                Ok(pos) => {
                    node = &node.children[pos].2;
                    rest = &rest[take..];
                }
                Err(_) => return None,
            }
        }
    }
}
