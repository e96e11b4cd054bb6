// SPDX-FileCopyrightText: 2026 Etymon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prefix autocomplete for the etymon word list.

pub mod index;

pub use index::{AutocompleteIndex, WORDS_KEY};
