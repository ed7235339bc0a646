//! The builtin name table: the resolver's fallback after the scope
//! chain is exhausted.

/// A builtin callable or type the analysis knows by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Builtin {
    pub name: &'static str,
    /// The type a call to it returns, when fixed.
    pub returns: Option<&'static str>,
}

// Small on purpose: only the names the inference layer can say
// something useful about, plus common lookups.
const BUILTINS: &[Builtin] = &[
    Builtin { name: "abs", returns: None },
    Builtin { name: "bool", returns: Some("bool") },
    Builtin { name: "dict", returns: Some("dict") },
    Builtin { name: "enumerate", returns: Some("list") },
    Builtin { name: "float", returns: Some("float") },
    Builtin { name: "frozenset", returns: Some("frozenset") },
    Builtin { name: "getattr", returns: None },
    Builtin { name: "hasattr", returns: Some("bool") },
    Builtin { name: "int", returns: Some("int") },
    Builtin { name: "isinstance", returns: Some("bool") },
    Builtin { name: "issubclass", returns: Some("bool") },
    Builtin { name: "iter", returns: None },
    Builtin { name: "len", returns: Some("int") },
    Builtin { name: "list", returns: Some("list") },
    Builtin { name: "max", returns: None },
    Builtin { name: "min", returns: None },
    Builtin { name: "object", returns: Some("object") },
    Builtin { name: "open", returns: Some("file") },
    Builtin { name: "print", returns: None },
    Builtin { name: "range", returns: Some("list") },
    Builtin { name: "repr", returns: Some("str") },
    Builtin { name: "reversed", returns: Some("list") },
    Builtin { name: "set", returns: Some("set") },
    Builtin { name: "sorted", returns: Some("list") },
    Builtin { name: "str", returns: Some("str") },
    Builtin { name: "sum", returns: None },
    Builtin { name: "super", returns: None },
    Builtin { name: "tuple", returns: Some("tuple") },
    Builtin { name: "type", returns: Some("type") },
    Builtin { name: "zip", returns: Some("list") },
];

pub fn lookup(name: &str) -> Option<&'static Builtin> {
    BUILTINS.iter().find(|b| b.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_known_and_unknown() {
        assert_eq!(lookup("len").unwrap().returns, Some("int"));
        assert!(lookup("definitely_not_builtin").is_none());
    }
}
