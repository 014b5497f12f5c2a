// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

static ATTR_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([A-Za-z_][A-Za-z0-9_-]*)="([^"]*)""#).expect("attribute pattern is valid")
});

/// Collect `key="value"` pairs from a descriptor line.
///
/// Keys are lowercased and a repeated key keeps the value seen last. Values
/// are returned exactly as captured.
pub fn parse_attributes(line: &str) -> HashMap<String, String> {
    let mut attributes = HashMap::new();

    for caps in ATTR_REGEX.captures_iter(line) {
        attributes.insert(caps[1].to_lowercase(), caps[2].to_string());
    }

    attributes
}
