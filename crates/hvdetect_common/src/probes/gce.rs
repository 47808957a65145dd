//! Google Compute Engine, from facts resolved elsewhere.
//!
//! Never touches the metadata server itself.

use super::contains_word;
use crate::facts::{self, is_truthy, FactCollection};
use crate::vm;

pub fn probe(facts: &dyn FactCollection) -> String {
    if facts.get(facts::GCE).is_some_and(|value| is_truthy(&value)) {
        return vm::GCE.to_string();
    }
    if facts
        .get_str(facts::BIOS_VENDOR)
        .is_some_and(|vendor| contains_word(&vendor, "Google"))
    {
        return vm::GCE.to_string();
    }
    String::new()
}
