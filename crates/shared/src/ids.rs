//! Identifier generation.
//!
//! Entity ids are readable strings built from a prefix, the current time in
//! milliseconds and a short random base36 suffix, e.g. `tile-1718000000000-k3j9xa`.

use chrono::Utc;
use rand::Rng;

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Length of the random part appended to generated ids.
pub const ID_SUFFIX_LEN: usize = 6;

/// Returns `len` random lowercase base36 characters.
pub fn random_suffix(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect()
}

/// Builds `{prefix}-{millis}-{random}`.
pub fn prefixed_id(prefix: &str) -> String {
    format!(
        "{}-{}-{}",
        prefix,
        Utc::now().timestamp_millis(),
        random_suffix(ID_SUFFIX_LEN)
    )
}

/// Lowercases a string and collapses everything outside `[a-z0-9]` into single
/// hyphens. Returns `"asset"` when nothing usable remains.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut last_hyphen = true;
    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_hyphen = false;
        } else if !last_hyphen {
            slug.push('-');
            last_hyphen = true;
        }
    }
    let slug = slug.trim_end_matches('-');
    if slug.is_empty() {
        "asset".to_string()
    } else {
        slug.chars().take(40).collect::<String>().trim_end_matches('-').to_string()
    }
}

/// Inserts a random suffix before the extension of a path name:
/// `tiles/a.jpg` becomes `tiles/a-x8d0qk.jpg`.
pub fn with_random_suffix(pathname: &str) -> String {
    let suffix = random_suffix(ID_SUFFIX_LEN);
    let (dir, file) = match pathname.rfind('/') {
        Some(idx) => (&pathname[..=idx], &pathname[idx + 1..]),
        None => ("", pathname),
    };
    match file.rfind('.') {
        Some(dot) if dot > 0 => format!("{}{}-{}{}", dir, &file[..dot], suffix, &file[dot..]),
        _ => format!("{}{}-{}", dir, file, suffix),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_suffix_charset() {
        let s = random_suffix(32);
        assert_eq!(s.len(), 32);
        assert!(s.bytes().all(|b| BASE36.contains(&b)));
    }

    #[test]
    fn test_prefixed_id_shape() {
        let id = prefixed_id("tile");
        let parts: Vec<&str> = id.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "tile");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), ID_SUFFIX_LEN);
    }

    #[test]
    fn test_prefixed_ids_differ() {
        let ids: std::collections::HashSet<String> =
            (0..200).map(|_| prefixed_id("group")).collect();
        assert_eq!(ids.len(), 200);
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Summer Sale 2024"), "summer-sale-2024");
        assert_eq!(slugify("  --hello__world--  "), "hello-world");
        assert_eq!(slugify("!!!"), "asset");
        assert_eq!(slugify(""), "asset");
    }

    #[test]
    fn test_slugify_truncates() {
        let long = "a".repeat(100);
        assert_eq!(slugify(&long).len(), 40);
    }

    #[test]
    fn test_with_random_suffix_keeps_extension() {
        let name = with_random_suffix("tiles/tile-0-poster.jpg");
        assert!(name.starts_with("tiles/tile-0-poster-"));
        assert!(name.ends_with(".jpg"));
        assert_eq!(name.len(), "tiles/tile-0-poster.jpg".len() + ID_SUFFIX_LEN + 1);
    }

    #[test]
    fn test_with_random_suffix_without_extension() {
        let name = with_random_suffix("README");
        assert!(name.starts_with("README-"));
        assert_eq!(name.len(), "README".len() + ID_SUFFIX_LEN + 1);
    }

    #[test]
    fn test_with_random_suffix_dotfile() {
        let name = with_random_suffix(".hidden");
        assert!(name.starts_with(".hidden-"));
    }
}
