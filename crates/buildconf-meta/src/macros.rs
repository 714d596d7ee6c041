//! Preprocessor macro naming.

/// Upper-case `name` and replace anything that cannot appear in a C
/// identifier with `_`.
pub fn macro_ident(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idents() {
        assert_eq!(macro_ident("x86_64"), "X86_64");
        assert_eq!(macro_ident("cortex-a9"), "CORTEX_A9");
        assert_eq!(macro_ident("ppc7.4"), "PPC7_4");
    }
}
