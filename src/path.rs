//! Name-to-path conversion used by every namespace query (spec §4.5):
//! the containing path of symbol `a.b.c.Foo` is `a/b/c`.

/// Maps a dotted symbol name to the slash-separated path `PathFilter`s
/// are evaluated against.
pub fn symbol_container_path(symbol_name: &str) -> String {
    match symbol_name.rsplit_once('.') {
        Some((container, _last)) => container.replace('.', "/"),
        None => String::new(),
    }
}

/// Maps a resource path to the same directory-granularity token
/// `symbol_container_path` produces for symbols: `exportedPaths` and every
/// `PathFilter` are keyed by directory, not by the individual file within
/// it (spec §4.4 `exportedPaths`, §4.1 filters operate on "paths" meaning
/// directories). `"p/q/data.txt"` resolves against the same entry as
/// `"p/q/Other.txt"`.
pub fn resource_container_path(resource_path: &str) -> String {
    match resource_path.rsplit_once('/') {
        Some((container, _last)) => container.to_string(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_the_final_segment_and_replaces_dots() {
        assert_eq!(symbol_container_path("a.b.c.Foo"), "a/b/c");
    }

    #[test]
    fn top_level_symbol_has_empty_container() {
        assert_eq!(symbol_container_path("Foo"), "");
    }

    #[test]
    fn resource_path_strips_the_final_segment() {
        assert_eq!(resource_container_path("p/q/data.txt"), "p/q");
    }

    #[test]
    fn top_level_resource_has_empty_container() {
        assert_eq!(resource_container_path("data.txt"), "");
    }
}
